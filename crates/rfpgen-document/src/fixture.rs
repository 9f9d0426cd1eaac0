//! Minimal DOCX packages for tests.

use crate::docx::DocxPackage;
use crate::docx::xml::escape;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// A document whose body holds one plain paragraph per entry of `paragraphs`.
///
/// # Panics
///
/// Panics if the in-memory archive cannot be written.
#[must_use]
pub fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
    let mut body = String::new();
    for p in paragraphs {
        body.push_str("<w:p><w:r><w:t xml:space=\"preserve\">");
        body.push_str(&escape(p));
        body.push_str("</w:t></w:r></w:p>");
    }
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}<w:sectPr><w:pgSz w:w="12240" w:h="15840"/></w:sectPr></w:body></w:document>"#
    );
    DocxPackage::from_entries(vec![
        ("[Content_Types].xml".into(), CONTENT_TYPES.as_bytes().to_vec()),
        ("_rels/.rels".into(), ROOT_RELS.as_bytes().to_vec()),
        ("word/document.xml".into(), document.into_bytes()),
    ])
    .to_bytes()
    .expect("in-memory zip write must not fail")
}

/// The five-placeholder proposal template surrounded by fixed boilerplate.
#[must_use]
pub fn proposal_template() -> Vec<u8> {
    docx_with_paragraphs(&[
        "Proposal for SAP PI/PO to Integration Suite Migration",
        "Executive Summary",
        "<<EXEC_SUMMARY>>",
        "Objective",
        "<<OBJECTIVE>>",
        "Scope and Assumptions",
        "<<SCOPE_TEXT>>",
        "Resource Schedule and Commercials",
        "<<RESOURCE_SCHEDULE>>",
        "Communication Plan",
        "<<COMMUNICATION_PLAN>>",
    ])
}
