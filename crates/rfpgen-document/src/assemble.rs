use crate::docx::xml::{body_blocks, run_text};
use crate::docx::{BlockKind, DocxPackage};
use crate::error::DocumentError;
use crate::markup;
use crate::render::{StyleSheet, render_blocks};

/// Generated text bound to a placeholder token such as `<<SCOPE_TEXT>>`.
#[derive(Debug, Clone, Copy)]
pub struct Binding<'a> {
    pub placeholder: &'a str,
    pub text: &'a str,
}

impl<'a> Binding<'a> {
    #[must_use]
    pub fn new(placeholder: &'a str, text: &'a str) -> Self {
        Self { placeholder, text }
    }
}

/// Replaces placeholder paragraphs of a DOCX template with rendered markup.
#[derive(Debug, Clone, Default)]
pub struct DocumentAssembler {
    styles: StyleSheet,
}

impl DocumentAssembler {
    #[must_use]
    pub fn new(styles: StyleSheet) -> Self {
        Self { styles }
    }

    #[must_use]
    pub fn styles(&self) -> &StyleSheet {
        &self.styles
    }

    /// Render `bindings` into the template package and return the new package.
    ///
    /// # Errors
    ///
    /// Returns an error if the template is not a readable DOCX package.
    pub fn render(&self, template: &[u8], bindings: &[Binding<'_>]) -> Result<Vec<u8>, DocumentError> {
        let mut package = DocxPackage::from_bytes(template)?;
        let xml = self.render_xml(&package.document_xml()?, bindings)?;
        package.set_document_xml(xml);
        package.to_bytes()
    }

    /// Apply `bindings` to the main document part, in binding order.
    ///
    /// For each binding with non-blank text, the first body-level paragraph
    /// whose run text contains the placeholder is removed and the parsed
    /// blocks are inserted at its position. Later occurrences of the same
    /// placeholder stay as they are. A blank binding leaves its placeholder
    /// paragraph untouched.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Xml` if the document body cannot be scanned.
    pub fn render_xml(&self, xml: &str, bindings: &[Binding<'_>]) -> Result<String, DocumentError> {
        let mut xml = xml.to_owned();
        for binding in bindings {
            if binding.text.trim().is_empty() {
                tracing::debug!(placeholder = binding.placeholder, "empty binding, placeholder kept");
                continue;
            }
            let target = body_blocks(&xml)?.into_iter().find(|b| {
                b.kind == BlockKind::Paragraph && run_text(&xml[b.range.clone()]).contains(binding.placeholder)
            });
            let Some(target) = target else {
                tracing::warn!(placeholder = binding.placeholder, "placeholder not found in template");
                continue;
            };
            let blocks = markup::parse(binding.text);
            tracing::debug!(
                placeholder = binding.placeholder,
                blocks = blocks.len(),
                "replacing placeholder"
            );
            xml.replace_range(target.range, &render_blocks(&blocks, &self.styles));
        }
        Ok(xml)
    }
}
