use std::path::Path;

use crate::docx::xml::{body_blocks, run_text};
use crate::docx::{BlockKind, DocxPackage};
use crate::error::DocumentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Pdf,
    Docx,
    Unsupported,
}

impl SourceFormat {
    /// Format declared by the file extension, case-insensitively.
    #[must_use]
    pub fn from_file_name(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("pdf") => Self::Pdf,
            Some("docx") => Self::Docx,
            _ => Self::Unsupported,
        }
    }

    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Unsupported => "application/octet-stream",
        }
    }
}

/// An uploaded file, alive for one generation request.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub file_name: String,
    pub format: SourceFormat,
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let format = SourceFormat::from_file_name(&file_name);
        Self {
            file_name,
            format,
            bytes,
        }
    }

    /// # Errors
    ///
    /// See [`extract_text`].
    pub fn extract_text(&self) -> Result<String, DocumentError> {
        extract_text(self.format, &self.bytes)
    }
}

/// Plain text of a document in reading order.
///
/// PDF text comes out page by page; DOCX yields every body-level paragraph
/// joined with `\n` (tables are skipped). Unsupported formats yield an empty
/// string rather than an error. This is CPU-bound; call it from a blocking
/// task in async code.
///
/// # Errors
///
/// Returns an error if a PDF or DOCX payload cannot be parsed.
pub fn extract_text(format: SourceFormat, bytes: &[u8]) -> Result<String, DocumentError> {
    match format {
        SourceFormat::Pdf => {
            pdf_extract::extract_text_from_mem(bytes).map_err(|e| DocumentError::Pdf(e.to_string()))
        }
        SourceFormat::Docx => docx_text(bytes),
        SourceFormat::Unsupported => Ok(String::new()),
    }
}

fn docx_text(bytes: &[u8]) -> Result<String, DocumentError> {
    let xml = DocxPackage::from_bytes(bytes)?.document_xml()?;
    let paragraphs: Vec<String> = body_blocks(&xml)?
        .into_iter()
        .filter(|b| b.kind == BlockKind::Paragraph)
        .map(|b| run_text(&xml[b.range]))
        .collect();
    Ok(paragraphs.join("\n"))
}
