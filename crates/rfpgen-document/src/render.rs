use std::fmt::Write as _;

use crate::docx::xml::escape;
use crate::markup::{Block, Table};

/// Paragraph styles and table formatting applied to generated blocks.
///
/// Style ids must exist in the template's `styles.xml`; Word falls back to
/// `Normal` for unknown ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSheet {
    pub heading_style: String,
    pub bullet_style: String,
    /// `w:numId` of the bullet list definition, when the bullet style does not
    /// carry its own numbering.
    pub bullet_num_id: Option<u32>,
    pub table_style: String,
    pub header_fill: String,
    pub header_text_color: String,
    pub row_fill: String,
    pub border_color: String,
    /// Fixed column width in twentieths of a point (1440 per inch).
    pub column_width_twips: u32,
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self {
            heading_style: "TableColumnHeading".into(),
            bullet_style: "ListBullet2".into(),
            bullet_num_id: None,
            table_style: "TableGrid".into(),
            header_fill: "008FD3".into(),
            header_text_color: "FFFFFF".into(),
            row_fill: "E7EEF7".into(),
            border_color: "FFFFFF".into(),
            column_width_twips: 4320,
        }
    }
}

// Spacing is in twips: 4pt after headings, 2pt after bullets, 18pt bullet indent.
const HEADING_SPACE_AFTER: u32 = 80;
const BULLET_SPACE_AFTER: u32 = 40;
const BULLET_INDENT: u32 = 360;

/// Render blocks as body-level WordprocessingML, in order.
#[must_use]
pub fn render_blocks(blocks: &[Block], styles: &StyleSheet) -> String {
    let mut out = String::new();
    for block in blocks {
        match block {
            Block::Heading(text) => {
                let ppr = format!(
                    r#"<w:pPr><w:pStyle w:val="{}"/><w:spacing w:after="{HEADING_SPACE_AFTER}"/></w:pPr>"#,
                    escape(&styles.heading_style)
                );
                paragraph(&mut out, &ppr, text);
            }
            Block::Bullet(text) => {
                let num = styles.bullet_num_id.map_or_else(String::new, |id| {
                    format!(r#"<w:numPr><w:ilvl w:val="0"/><w:numId w:val="{id}"/></w:numPr>"#)
                });
                let ppr = format!(
                    r#"<w:pPr><w:pStyle w:val="{}"/>{num}<w:spacing w:after="{BULLET_SPACE_AFTER}"/><w:ind w:left="{BULLET_INDENT}"/></w:pPr>"#,
                    escape(&styles.bullet_style)
                );
                paragraph(&mut out, &ppr, text);
            }
            Block::Paragraph(text) => paragraph(&mut out, "", text),
            Block::Table(table) => render_table(&mut out, table, styles),
        }
    }
    out
}

fn paragraph(out: &mut String, ppr: &str, text: &str) {
    let _ = write!(
        out,
        r#"<w:p>{ppr}<w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        escape(text)
    );
}

fn render_table(out: &mut String, table: &Table, styles: &StyleSheet) {
    let border = format!(
        r#"w:val="single" w:sz="4" w:space="0" w:color="{}""#,
        escape(&styles.border_color)
    );
    let _ = write!(
        out,
        r#"<w:tbl><w:tblPr><w:tblStyle w:val="{}"/><w:tblW w:w="0" w:type="auto"/><w:tblBorders>"#,
        escape(&styles.table_style)
    );
    for side in ["top", "left", "bottom", "right", "insideH", "insideV"] {
        let _ = write!(out, "<w:{side} {border}/>");
    }
    out.push_str("</w:tblBorders></w:tblPr><w:tblGrid>");
    for _ in &table.header {
        let _ = write!(out, r#"<w:gridCol w:w="{}"/>"#, styles.column_width_twips);
    }
    out.push_str("</w:tblGrid>");

    row(out, &table.header, styles, true);
    for cells in &table.rows {
        row(out, cells, styles, false);
    }
    out.push_str("</w:tbl>");
}

fn row(out: &mut String, cells: &[String], styles: &StyleSheet, header: bool) {
    out.push_str("<w:tr>");
    // A row must hold at least one cell.
    let empty = [String::new()];
    let cells = if cells.is_empty() { &empty[..] } else { cells };
    for cell in cells {
        let fill = if header {
            &styles.header_fill
        } else {
            &styles.row_fill
        };
        let _ = write!(
            out,
            r#"<w:tc><w:tcPr><w:tcW w:w="{}" w:type="dxa"/><w:shd w:val="clear" w:color="auto" w:fill="{}"/><w:vAlign w:val="center"/></w:tcPr><w:p><w:pPr><w:jc w:val="left"/></w:pPr><w:r>"#,
            styles.column_width_twips,
            escape(fill)
        );
        if header {
            let _ = write!(
                out,
                r#"<w:rPr><w:b/><w:color w:val="{}"/></w:rPr>"#,
                escape(&styles.header_text_color)
            );
        }
        let _ = write!(
            out,
            r#"<w:t xml:space="preserve">{}</w:t></w:r></w:p></w:tc>"#,
            escape(cell)
        );
    }
    out.push_str("</w:tr>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::xml::{paragraph_style, run_text, table_rows};

    fn table() -> Block {
        Block::Table(Table {
            header: vec!["Role".into(), "Count".into()],
            rows: vec![vec!["Architect".into(), "1".into()]],
        })
    }

    #[test]
    fn heading_uses_heading_style() {
        let xml = render_blocks(&[Block::Heading("In Scope".into())], &StyleSheet::default());
        assert_eq!(paragraph_style(&xml).as_deref(), Some("TableColumnHeading"));
        assert!(xml.contains(r#"<w:spacing w:after="80"/>"#));
        assert_eq!(run_text(&xml), "In Scope");
    }

    #[test]
    fn bullet_numbering_is_optional() {
        let plain = render_blocks(&[Block::Bullet("x".into())], &StyleSheet::default());
        assert!(!plain.contains("w:numPr"));
        assert!(plain.contains(r#"<w:ind w:left="360"/>"#));

        let styles = StyleSheet {
            bullet_num_id: Some(7),
            ..StyleSheet::default()
        };
        let numbered = render_blocks(&[Block::Bullet("x".into())], &styles);
        assert!(numbered.contains(r#"<w:numId w:val="7"/>"#));
        assert_eq!(paragraph_style(&numbered).as_deref(), Some("ListBullet2"));
    }

    #[test]
    fn paragraph_text_is_escaped() {
        let xml = render_blocks(&[Block::Paragraph("T&M <rates>".into())], &StyleSheet::default());
        assert!(xml.contains("T&amp;M &lt;rates&gt;"));
        assert_eq!(run_text(&xml), "T&M <rates>");
        assert_eq!(paragraph_style(&xml), None);
    }

    #[test]
    fn table_styling() {
        let xml = render_blocks(&[table()], &StyleSheet::default());
        assert!(xml.contains(r#"<w:tblStyle w:val="TableGrid"/>"#));
        assert_eq!(xml.matches(r#"<w:gridCol w:w="4320"/>"#).count(), 2);
        assert_eq!(xml.matches(r#"w:fill="008FD3""#).count(), 2);
        assert_eq!(xml.matches(r#"w:fill="E7EEF7""#).count(), 2);
        assert_eq!(xml.matches("<w:b/>").count(), 2);
        assert_eq!(xml.matches(r#"w:color="FFFFFF""#).count(), 6);
        assert_eq!(
            table_rows(&xml),
            vec![
                vec!["Role".to_owned(), "Count".to_owned()],
                vec!["Architect".to_owned(), "1".to_owned()],
            ]
        );
    }

    #[test]
    fn empty_row_gets_one_cell() {
        let t = Block::Table(Table {
            header: vec!["A".into()],
            rows: vec![vec![]],
        });
        let xml = render_blocks(&[t], &StyleSheet::default());
        assert_eq!(table_rows(&xml)[1], vec![String::new()]);
    }
}
