use crate::docx::xml::{body_blocks, paragraph_style, run_text, table_rows};
use crate::docx::{BlockKind, DocxPackage};
use crate::error::DocumentError;
use crate::render::StyleSheet;

/// A body-level block read back from a DOCX document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocBlock {
    Heading(String),
    Bullet(String),
    Paragraph(String),
    /// Cell texts row by row; the first row is the header.
    Table(Vec<Vec<String>>),
}

/// Ordered block view of a document, classified by the styles in `StyleSheet`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalDocument {
    pub blocks: Vec<DocBlock>,
}

impl ProposalDocument {
    /// # Errors
    ///
    /// Returns an error if `bytes` is not a DOCX package with a scannable body.
    pub fn from_bytes(bytes: &[u8], styles: &StyleSheet) -> Result<Self, DocumentError> {
        let xml = DocxPackage::from_bytes(bytes)?.document_xml()?;
        Self::from_xml(&xml, styles)
    }

    /// # Errors
    ///
    /// Returns `DocumentError::Xml` if the body cannot be scanned.
    pub fn from_xml(xml: &str, styles: &StyleSheet) -> Result<Self, DocumentError> {
        let mut blocks = Vec::new();
        for span in body_blocks(xml)? {
            let fragment = &xml[span.range];
            let block = match span.kind {
                BlockKind::Paragraph => {
                    let text = run_text(fragment);
                    match paragraph_style(fragment) {
                        Some(s) if s == styles.heading_style => DocBlock::Heading(text),
                        Some(s) if s == styles.bullet_style => DocBlock::Bullet(text),
                        _ => DocBlock::Paragraph(text),
                    }
                }
                BlockKind::Table => DocBlock::Table(table_rows(fragment)),
                BlockKind::Other => continue,
            };
            blocks.push(block);
        }
        Ok(Self { blocks })
    }

    /// Plain text of every block, one line per paragraph and per table row
    /// (cells separated by ` | `).
    #[must_use]
    pub fn text(&self) -> String {
        let mut lines = Vec::new();
        for block in &self.blocks {
            match block {
                DocBlock::Heading(t) | DocBlock::Bullet(t) | DocBlock::Paragraph(t) => {
                    lines.push(t.clone());
                }
                DocBlock::Table(rows) => {
                    lines.extend(rows.iter().map(|r| r.join(" | ")));
                }
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::docx_with_paragraphs;

    #[test]
    fn reads_plain_paragraphs() {
        let bytes = docx_with_paragraphs(&["one", "two"]);
        let doc = ProposalDocument::from_bytes(&bytes, &StyleSheet::default()).unwrap();
        assert_eq!(
            doc.blocks,
            vec![DocBlock::Paragraph("one".into()), DocBlock::Paragraph("two".into())]
        );
        assert_eq!(doc.text(), "one\ntwo");
    }

    #[test]
    fn classifies_by_style_and_skips_section_properties() {
        let xml = r#"<w:document><w:body><w:p><w:pPr><w:pStyle w:val="ListBullet2"/></w:pPr><w:r><w:t>b</w:t></w:r></w:p><w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>h</w:t></w:r></w:p><w:sectPr/></w:body></w:document>"#;
        let doc = ProposalDocument::from_xml(xml, &StyleSheet::default()).unwrap();
        assert_eq!(
            doc.blocks,
            vec![DocBlock::Bullet("b".into()), DocBlock::Paragraph("h".into())]
        );
    }
}
