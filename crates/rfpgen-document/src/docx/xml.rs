use std::ops::Range;

use crate::error::DocumentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TagKind {
    Open,
    Close,
    Empty,
}

/// One markup tag in a WordprocessingML fragment.
#[derive(Debug, Clone)]
pub(crate) struct Tag<'a> {
    pub kind: TagKind,
    pub name: &'a str,
    /// Everything between `<` and `>`, excluding the leading `/` and trailing `/`.
    pub inner: &'a str,
    /// Byte range of the whole tag including angle brackets.
    pub span: Range<usize>,
}

impl Tag<'_> {
    /// Value of attribute `name` (e.g. `w:val`), unescaped.
    pub fn attr(&self, name: &str) -> Option<String> {
        let mut rest = self.inner;
        while let Some(pos) = rest.find(name) {
            let after = &rest[pos + name.len()..];
            let preceded_ok = pos == 0 || rest.as_bytes()[pos - 1].is_ascii_whitespace();
            let trimmed = after.trim_start();
            if preceded_ok && let Some(value) = trimmed.strip_prefix('=') {
                let value = value.trim_start();
                let quote = value.chars().next()?;
                if quote != '"' && quote != '\'' {
                    return None;
                }
                let body = &value[1..];
                let end = body.find(quote)?;
                return Some(unescape(&body[..end]));
            }
            rest = after;
        }
        None
    }
}

/// Iterate over element tags, skipping declarations, comments and processing
/// instructions.
pub(crate) fn tags(xml: &str) -> impl Iterator<Item = Tag<'_>> {
    let mut pos = 0;
    std::iter::from_fn(move || {
        loop {
            let start = pos + xml[pos..].find('<')?;
            let rest = &xml[start..];
            if rest.starts_with("<!--") {
                pos = start + rest.find("-->").map_or(rest.len(), |e| e + 3);
                continue;
            }
            if rest.starts_with("<![CDATA[") {
                pos = start + rest.find("]]>").map_or(rest.len(), |e| e + 3);
                continue;
            }
            let end = start + rest.find('>')? + 1;
            pos = end;
            let raw = &xml[start + 1..end - 1];
            if raw.starts_with('?') || raw.starts_with('!') {
                continue;
            }
            let (kind, inner) = if let Some(stripped) = raw.strip_prefix('/') {
                (TagKind::Close, stripped.trim())
            } else if let Some(stripped) = raw.strip_suffix('/') {
                (TagKind::Empty, stripped.trim())
            } else {
                (TagKind::Open, raw.trim())
            };
            let name_end = inner
                .find(|c: char| c.is_ascii_whitespace())
                .unwrap_or(inner.len());
            return Some(Tag {
                kind,
                name: &inner[..name_end],
                inner,
                span: start..end,
            });
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Table,
    /// Anything else at body level (`w:sectPr`, `w:sdt`, bookmarks, ...).
    Other,
}

/// A top-level element of `w:body` and its byte range in `document.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpan {
    pub kind: BlockKind,
    pub range: Range<usize>,
}

/// Split the body of `document.xml` into top-level blocks in document order.
///
/// # Errors
///
/// Returns `DocumentError::Xml` if there is no `w:body` element or a body-level
/// element is left unclosed.
pub fn body_blocks(xml: &str) -> Result<Vec<BlockSpan>, DocumentError> {
    let mut blocks = Vec::new();
    let mut in_body = false;
    let mut depth = 0usize;
    let mut current: Option<(BlockKind, usize)> = None;

    for tag in tags(xml) {
        if !in_body {
            if tag.name == "w:body" && tag.kind == TagKind::Open {
                in_body = true;
            }
            continue;
        }
        match tag.kind {
            TagKind::Open => {
                if depth == 0 {
                    current = Some((kind_of(tag.name), tag.span.start));
                }
                depth += 1;
            }
            TagKind::Empty => {
                if depth == 0 {
                    blocks.push(BlockSpan {
                        kind: kind_of(tag.name),
                        range: tag.span.clone(),
                    });
                }
            }
            TagKind::Close => {
                if depth == 0 {
                    if tag.name == "w:body" {
                        return Ok(blocks);
                    }
                    return Err(DocumentError::Xml(format!(
                        "unexpected </{}> in body",
                        tag.name
                    )));
                }
                depth -= 1;
                if depth == 0
                    && let Some((kind, start)) = current.take()
                {
                    blocks.push(BlockSpan {
                        kind,
                        range: start..tag.span.end,
                    });
                }
            }
        }
    }

    if in_body {
        Err(DocumentError::Xml("unterminated w:body".into()))
    } else {
        Err(DocumentError::Xml("document has no w:body".into()))
    }
}

fn kind_of(name: &str) -> BlockKind {
    match name {
        "w:p" => BlockKind::Paragraph,
        "w:tbl" => BlockKind::Table,
        _ => BlockKind::Other,
    }
}

/// Concatenated run text of a fragment: `w:t` content, `w:tab` as `\t`,
/// `w:br`/`w:cr` as `\n`.
pub(crate) fn run_text(fragment: &str) -> String {
    let mut out = String::new();
    let mut text_start: Option<usize> = None;
    for tag in tags(fragment) {
        match (tag.kind, tag.name) {
            (TagKind::Open, "w:t") => text_start = Some(tag.span.end),
            (TagKind::Close, "w:t") => {
                if let Some(start) = text_start.take() {
                    out.push_str(&unescape(&fragment[start..tag.span.start]));
                }
            }
            (TagKind::Empty | TagKind::Open, "w:tab") => out.push('\t'),
            (TagKind::Empty | TagKind::Open, "w:br" | "w:cr") => out.push('\n'),
            _ => {}
        }
    }
    out
}

/// Style id from the paragraph's `w:pStyle`, if any.
pub(crate) fn paragraph_style(fragment: &str) -> Option<String> {
    tags(fragment)
        .find(|t| t.name == "w:pStyle" && t.kind != TagKind::Close)
        .and_then(|t| t.attr("w:val"))
}

/// Cell texts of a `w:tbl` fragment, row by row. Paragraphs within a cell are
/// joined with `\n`.
pub(crate) fn table_rows(fragment: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell: Vec<String> = Vec::new();
    let mut para_start: Option<usize> = None;
    let mut nested = 0usize;

    for tag in tags(fragment) {
        match (tag.kind, tag.name) {
            (TagKind::Open, "w:tbl") => nested += 1,
            (TagKind::Close, "w:tbl") => nested = nested.saturating_sub(1),
            _ if nested > 1 => {}
            (TagKind::Open, "w:tr") => row.clear(),
            (TagKind::Close, "w:tr") => rows.push(std::mem::take(&mut row)),
            (TagKind::Open, "w:tc") => cell.clear(),
            (TagKind::Close, "w:tc") => row.push(std::mem::take(&mut cell).join("\n")),
            (TagKind::Open, "w:p") => para_start = Some(tag.span.start),
            (TagKind::Empty, "w:p") => cell.push(String::new()),
            (TagKind::Close, "w:p") => {
                if let Some(start) = para_start.take() {
                    cell.push(run_text(&fragment[start..tag.span.end]));
                }
            }
            _ => {}
        }
    }
    rows
}

#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // Control characters other than tab/newline are not allowed in XML 1.0.
            c if c.is_control() && c != '\t' && c != '\n' && c != '\r' => {}
            c => out.push(c),
        }
    }
    out
}

#[must_use]
pub fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_owned();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };
        let entity = &tail[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                .and_then(char::from_u32),
        };
        if let Some(c) = decoded {
            out.push(c);
            rest = &tail[semi + 1..];
        } else {
            out.push('&');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Intro</w:t></w:r></w:p><!-- note --><w:tbl><w:tr><w:tc><w:p><w:r><w:t>A</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>B</w:t></w:r></w:p></w:tc></w:tr></w:tbl><w:p/><w:sectPr><w:pgSz w:w="12240"/></w:sectPr></w:body></w:document>"#;

    #[test]
    fn body_blocks_in_order() {
        let blocks = body_blocks(DOC).unwrap();
        let kinds: Vec<_> = blocks.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BlockKind::Paragraph,
                BlockKind::Table,
                BlockKind::Paragraph,
                BlockKind::Other
            ]
        );
        assert!(DOC[blocks[0].range.clone()].starts_with("<w:p>"));
        assert!(DOC[blocks[1].range.clone()].ends_with("</w:tbl>"));
        assert_eq!(&DOC[blocks[2].range.clone()], "<w:p/>");
    }

    #[test]
    fn body_missing_is_error() {
        assert!(body_blocks("<w:document></w:document>").is_err());
        assert!(body_blocks("<w:document><w:body><w:p>").is_err());
    }

    #[test]
    fn run_text_joins_runs_and_specials() {
        let p = r#"<w:p><w:r><w:t>&lt;&lt;EXEC_</w:t></w:r><w:r><w:t xml:space="preserve">SUMMARY&gt;&gt; </w:t><w:tab/><w:t>x</w:t><w:br/><w:t>y</w:t></w:r></w:p>"#;
        assert_eq!(run_text(p), "<<EXEC_SUMMARY>> \tx\ny");
    }

    #[test]
    fn run_text_ignores_table_tags_with_t_prefix() {
        let p = r#"<w:tbl><w:tblPr><w:tblW w:w="0"/></w:tblPr><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#;
        assert_eq!(run_text(p), "cell");
    }

    #[test]
    fn paragraph_style_reads_val() {
        let blocks = body_blocks(DOC).unwrap();
        let p = &DOC[blocks[0].range.clone()];
        assert_eq!(paragraph_style(p).as_deref(), Some("Heading1"));
        assert_eq!(paragraph_style("<w:p/>"), None);
    }

    #[test]
    fn table_rows_collects_cells() {
        let blocks = body_blocks(DOC).unwrap();
        let rows = table_rows(&DOC[blocks[1].range.clone()]);
        assert_eq!(rows, vec![vec!["A".to_owned(), "B".to_owned()]]);
    }

    #[test]
    fn attr_requires_exact_name() {
        let tag = tags(r#"<w:shd w:val="clear" w:fill="008FD3"/>"#).next().unwrap();
        assert_eq!(tag.attr("w:fill").as_deref(), Some("008FD3"));
        assert_eq!(tag.attr("w:val").as_deref(), Some("clear"));
        assert_eq!(tag.attr("fill"), None);
    }

    #[test]
    fn tag_spans_skip_comments_and_declarations() {
        let xml = r#"<?xml version="1.0"?><!-- note --><w:p><w:br/></w:p>"#;
        let found: Vec<_> = tags(xml).map(|t| (t.kind, t.name, t.span)).collect();
        assert_eq!(
            found,
            vec![
                (TagKind::Open, "w:p", 34..39),
                (TagKind::Empty, "w:br", 39..46),
                (TagKind::Close, "w:p", 46..52),
            ]
        );
        assert_eq!(&xml[found[1].2.clone()], "<w:br/>");
    }

    #[test]
    fn escape_unescape() {
        assert_eq!(escape(r#"R&D <"x"> 'y'"#), "R&amp;D &lt;&quot;x&quot;&gt; &apos;y&apos;");
        assert_eq!(unescape("R&amp;D &#169; &#xA9; &bogus; &"), "R&D © © &bogus; &");
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn unescape_inverts_escape(s in "[^\\p{Cc}]{0,64}") {
            prop_assert_eq!(unescape(&escape(&s)), s);
        }
    }
}
