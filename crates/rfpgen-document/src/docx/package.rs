use std::io::{Cursor, Read, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::DOCUMENT_PART;
use crate::error::DocumentError;

/// An opened `.docx` package. Entries keep their archive order so that
/// `[Content_Types].xml` stays first when the package is written back.
#[derive(Debug, Clone)]
pub struct DocxPackage {
    entries: Vec<(String, Vec<u8>)>,
}

impl DocxPackage {
    /// Read every file entry of the archive into memory.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Zip` if `bytes` is not a zip archive and
    /// `DocumentError::MissingPart` if it has no main document part.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_owned();
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            entries.push((name, data));
        }
        if !entries.iter().any(|(name, _)| name == DOCUMENT_PART) {
            return Err(DocumentError::MissingPart(DOCUMENT_PART));
        }
        Ok(Self { entries })
    }

    /// Build a package from raw `(path, contents)` pairs, in archive order.
    #[must_use]
    pub fn from_entries(entries: Vec<(String, Vec<u8>)>) -> Self {
        Self { entries }
    }

    /// Contents of the main document part.
    ///
    /// # Errors
    ///
    /// Returns an error if the part is absent or not valid UTF-8.
    pub fn document_xml(&self) -> Result<String, DocumentError> {
        let data = self
            .part(DOCUMENT_PART)
            .ok_or(DocumentError::MissingPart(DOCUMENT_PART))?;
        String::from_utf8(data.to_vec())
            .map_err(|e| DocumentError::Xml(format!("{DOCUMENT_PART} is not UTF-8: {e}")))
    }

    pub fn set_document_xml(&mut self, xml: String) {
        let data = xml.into_bytes();
        match self.entries.iter_mut().find(|(name, _)| name == DOCUMENT_PART) {
            Some((_, existing)) => *existing = data,
            None => self.entries.push((DOCUMENT_PART.to_owned(), data)),
        }
    }

    #[must_use]
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    /// Serialize the package back into a deflated zip archive.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be written.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, data) in &self.entries {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(data)?;
        }
        Ok(writer.finish()?.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::docx_with_paragraphs;

    #[test]
    fn round_trip_preserves_entry_order_and_parts() {
        let bytes = docx_with_paragraphs(&["alpha"]);
        let pkg = DocxPackage::from_bytes(&bytes).unwrap();
        let names: Vec<_> = pkg.entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names[0], "[Content_Types].xml");

        let again = DocxPackage::from_bytes(&pkg.to_bytes().unwrap()).unwrap();
        assert_eq!(again.document_xml().unwrap(), pkg.document_xml().unwrap());
        assert_eq!(again.entries.len(), pkg.entries.len());
    }

    #[test]
    fn missing_document_part_is_rejected() {
        let pkg = DocxPackage::from_entries(vec![("readme.txt".into(), b"hi".to_vec())]);
        let bytes = pkg.to_bytes().unwrap();
        let err = DocxPackage::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, DocumentError::MissingPart(DOCUMENT_PART)));
    }

    #[test]
    fn not_a_zip_is_rejected() {
        let err = DocxPackage::from_bytes(b"%PDF-1.4 not a zip").unwrap_err();
        assert!(matches!(err, DocumentError::Zip(_)));
    }

    #[test]
    fn set_document_xml_replaces_in_place() {
        let bytes = docx_with_paragraphs(&["alpha"]);
        let mut pkg = DocxPackage::from_bytes(&bytes).unwrap();
        let count = pkg.entries.len();
        pkg.set_document_xml("<w:document/>".into());
        assert_eq!(pkg.entries.len(), count);
        assert_eq!(pkg.document_xml().unwrap(), "<w:document/>");
    }
}
