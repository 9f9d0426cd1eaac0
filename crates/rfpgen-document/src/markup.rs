//! Lightweight markup emitted by the section prompts.
//!
//! The text is read line by line after trimming; blank lines never produce a
//! block. Rules, in precedence order:
//!
//! 1. A line starting with `|` opens a table. Consecutive `|` lines (blank
//!    lines in between are ignored) belong to it. The first is the header row,
//!    with cells trimmed of spaces and `*`; the second is the separator row and
//!    is skipped whatever it contains; the rest are data rows with cells
//!    trimmed of whitespace. Rows are kept ragged: a data row may have more or
//!    fewer cells than the header.
//! 2. A line starting with `**` or `###` is a heading. Leading and trailing
//!    `*`, `#`, spaces and a trailing `:` are removed. A heading left with no
//!    text (a bare `**`) is dropped.
//! 3. A line starting with `- ` or `• ` is a bullet item; the marker and the
//!    whitespace after it are removed.
//! 4. A title-like plain line followed directly (no blank line) by a bullet
//!    item is the list's lead-in and becomes a heading, with a trailing `:`
//!    removed. Title-like means at most six words and no sentence punctuation
//!    (`.`, `,`, `;`, `!`, `?`, or a `:` before the end). Sentence lead-ins
//!    stay paragraphs, colon included.
//! 5. Any other line is a paragraph.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading(String),
    Bullet(String),
    Paragraph(String),
    Table(Table),
}

struct Line<'a> {
    text: &'a str,
    after_blank: bool,
}

#[must_use]
pub fn parse(text: &str) -> Vec<Block> {
    let mut lines = Vec::new();
    let mut after_blank = false;
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            after_blank = true;
            continue;
        }
        lines.push(Line {
            text: line,
            after_blank,
        });
        after_blank = false;
    }

    let mut blocks = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].text;

        if line.starts_with('|') {
            let start = i;
            while i < lines.len() && lines[i].text.starts_with('|') {
                i += 1;
            }
            blocks.push(Block::Table(parse_table(&lines[start..i])));
            continue;
        }

        let lead_in = lines
            .get(i + 1)
            .is_some_and(|next| !next.after_blank && bullet_item(next.text).is_some());
        let block = if line.starts_with("**") || line.starts_with("###") {
            Some(heading_text(line))
                .filter(|t| !t.is_empty())
                .map(Block::Heading)
        } else if let Some(item) = bullet_item(line) {
            Some(Block::Bullet(item.to_owned()))
        } else if lead_in && is_title_like(line) {
            Some(Block::Heading(heading_text(line)))
        } else {
            Some(Block::Paragraph(line.to_owned()))
        };
        blocks.extend(block);
        i += 1;
    }
    blocks
}

fn parse_table(lines: &[Line<'_>]) -> Table {
    let header = split_row(lines[0].text)
        .map(|cell| cell.trim_matches(|c| c == '*' || c == ' ').to_owned())
        .collect();
    let rows = lines
        .iter()
        .skip(2)
        .map(|line| split_row(line.text).map(|c| c.trim().to_owned()).collect())
        .collect();
    Table { header, rows }
}

fn split_row(line: &str) -> impl Iterator<Item = &str> {
    line.trim_matches('|').split('|')
}

fn heading_text(line: &str) -> String {
    let markers = |c: char| c == '*' || c == '#' || c == ' ';
    line.trim_matches(markers)
        .trim_end_matches(':')
        .trim_matches(markers)
        .to_owned()
}

const MAX_TITLE_WORDS: usize = 6;

fn is_title_like(line: &str) -> bool {
    let text = heading_text(line);
    !text.is_empty()
        && text.split_whitespace().count() <= MAX_TITLE_WORDS
        && !text.contains(['.', ',', ';', '!', '?', ':'])
}

fn bullet_item(line: &str) -> Option<&str> {
    line.strip_prefix("- ")
        .or_else(|| line.strip_prefix("• "))
        .map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(s: &str) -> Block {
        Block::Heading(s.into())
    }
    fn bullet(s: &str) -> Block {
        Block::Bullet(s.into())
    }
    fn para(s: &str) -> Block {
        Block::Paragraph(s.into())
    }
    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| (*c).to_owned()).collect()
    }

    #[test]
    fn lead_in_bullets_and_table() {
        let blocks = parse("Header\n- item one\n- item two\n\n| A | B |\n|---|---|\n| 1 | 2 |");
        assert_eq!(
            blocks,
            vec![
                heading("Header"),
                bullet("item one"),
                bullet("item two"),
                Block::Table(Table {
                    header: row(&["A", "B"]),
                    rows: vec![row(&["1", "2"])],
                }),
            ]
        );
    }

    #[test]
    fn emphasis_and_hash_headings_drop_markers_and_colon() {
        assert_eq!(
            parse("**In Scope:**\n### Assumptions\n**Note**:"),
            vec![heading("In Scope"), heading("Assumptions"), heading("Note")]
        );
    }

    #[test]
    fn bare_emphasis_line_is_dropped() {
        assert_eq!(parse("**\ntext"), vec![para("text")]);
    }

    #[test]
    fn bullet_markers() {
        assert_eq!(
            parse("- dash item\n•  dot item\n-not a bullet"),
            vec![bullet("dash item"), bullet("dot item"), para("-not a bullet")]
        );
    }

    #[test]
    fn lead_in_requires_adjacency() {
        assert_eq!(
            parse("Intro text\n\n- item"),
            vec![para("Intro text"), bullet("item")]
        );
        assert_eq!(
            parse("Assumptions:\n- item"),
            vec![heading("Assumptions"), bullet("item")]
        );
    }

    #[test]
    fn sentence_lead_in_stays_a_paragraph() {
        assert_eq!(
            parse(
                "Crave InfoTech brings the following SAP competencies to the client:\n\
                 - Integration Suite"
            ),
            vec![
                para("Crave InfoTech brings the following SAP competencies to the client:"),
                bullet("Integration Suite"),
            ]
        );
        assert_eq!(
            parse("Note: the list below is indicative.\n- item"),
            vec![para("Note: the list below is indicative."), bullet("item")]
        );
    }

    #[test]
    fn short_title_lead_in_becomes_heading() {
        assert_eq!(
            parse("Key Deliverables:\n- Migration runbook\n- Test evidence"),
            vec![
                heading("Key Deliverables"),
                bullet("Migration runbook"),
                bullet("Test evidence"),
            ]
        );
    }

    #[test]
    fn blank_lines_never_produce_blocks() {
        assert_eq!(parse("\n\n  \n\t\n"), vec![]);
        assert_eq!(parse("one\n\n\ntwo"), vec![para("one"), para("two")]);
    }

    #[test]
    fn header_cells_strip_emphasis() {
        let blocks = parse("| **Role** | **Count** |\n|---|---|");
        assert_eq!(
            blocks,
            vec![Block::Table(Table {
                header: row(&["Role", "Count"]),
                rows: vec![],
            })]
        );
    }

    #[test]
    fn ragged_rows_are_kept_as_is() {
        let blocks = parse("| A | B |\n|---|---|\n| 1 |\n| 1 | 2 | 3 |");
        let Block::Table(t) = &blocks[0] else {
            panic!("expected table, got {blocks:?}");
        };
        assert_eq!(t.rows, vec![row(&["1"]), row(&["1", "2", "3"])]);
    }

    #[test]
    fn second_table_line_is_always_skipped() {
        let blocks = parse("| A | B |\n| x | y |\n| 1 | 2 |");
        let Block::Table(t) = &blocks[0] else {
            panic!("expected table");
        };
        assert_eq!(t.rows, vec![row(&["1", "2"])]);
    }

    #[test]
    fn table_ends_at_first_non_pipe_line() {
        let blocks = parse("| A |\n|---|\n| 1 |\nAfter");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1], para("After"));
    }

    #[test]
    fn blank_line_inside_table_is_ignored() {
        let blocks = parse("| A |\n|---|\n\n| 1 |");
        assert_eq!(
            blocks,
            vec![Block::Table(Table {
                header: row(&["A"]),
                rows: vec![row(&["1"])],
            })]
        );
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn no_block_is_empty_text(text in "[a-z |*#:•\\-\n]{0,200}") {
            for block in parse(&text) {
                match block {
                    Block::Paragraph(s) | Block::Bullet(s) | Block::Heading(s) => {
                        prop_assert!(!s.trim().is_empty(), "empty block text");
                    }
                    Block::Table(_) => {}
                }
            }
        }

        #[test]
        fn plain_words_become_paragraphs(words in proptest::collection::vec("[a-z]{1,10}", 1..10)) {
            let text = words.join("\n\n");
            let blocks = parse(&text);
            prop_assert_eq!(blocks.len(), words.len());
            for (block, word) in blocks.iter().zip(&words) {
                prop_assert_eq!(block, &Block::Paragraph(word.clone()));
            }
        }
    }
}
