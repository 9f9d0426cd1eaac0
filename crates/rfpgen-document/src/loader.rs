use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use crate::error::DocumentError;
use crate::extract::{SourceFormat, extract_text};

/// Default maximum file size: 50 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    /// File name relative to the scanned folder.
    pub source: String,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub content: String,
    pub metadata: DocumentMetadata,
}

pub trait DocumentLoader: Send + Sync {
    fn load(
        &self,
        path: &Path,
    ) -> Pin<Box<dyn Future<Output = Result<Document, DocumentError>> + Send + '_>>;

    fn supported_extensions(&self) -> &[&str];
}

/// Loads PDF and DOCX files whole, extracting text on the blocking pool.
pub struct FileLoader {
    pub max_file_size: u64,
}

impl Default for FileLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl DocumentLoader for FileLoader {
    fn load(
        &self,
        path: &Path,
    ) -> Pin<Box<dyn Future<Output = Result<Document, DocumentError>> + Send + '_>> {
        let path = path.to_path_buf();
        let max_size = self.max_file_size;
        Box::pin(async move {
            let source = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_owned();
            let format = SourceFormat::from_file_name(&source);
            if format == SourceFormat::Unsupported {
                return Err(DocumentError::UnsupportedFormat(source));
            }

            let meta = tokio::fs::metadata(&path).await?;
            if meta.len() > max_size {
                return Err(DocumentError::FileTooLarge(meta.len()));
            }

            let bytes = tokio::fs::read(&path).await?;
            let content = tokio::task::spawn_blocking(move || extract_text(format, &bytes))
                .await
                .map_err(|e| DocumentError::Io(std::io::Error::other(e)))??;

            Ok(Document {
                content,
                metadata: DocumentMetadata {
                    source,
                    content_type: format.content_type().to_owned(),
                },
            })
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf", "docx"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::docx_with_paragraphs;

    #[tokio::test]
    async fn load_docx_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Past Proposal.docx");
        std::fs::write(&file, docx_with_paragraphs(&["hello", "world"])).unwrap();

        let doc = FileLoader::default().load(&file).await.unwrap();
        assert_eq!(doc.content, "hello\nworld");
        assert_eq!(doc.metadata.source, "Past Proposal.docx");
        assert!(doc.metadata.content_type.contains("wordprocessingml"));
    }

    #[tokio::test]
    async fn load_nonexistent_file() {
        let result = FileLoader::default()
            .load(Path::new("/nonexistent/file.pdf"))
            .await;
        assert!(matches!(result, Err(DocumentError::Io(_))));
    }

    #[tokio::test]
    async fn unsupported_extension_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "plain").unwrap();

        let result = FileLoader::default().load(&file).await;
        assert!(matches!(result, Err(DocumentError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn file_too_large_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("big.docx");
        std::fs::write(&file, vec![0u8; 64]).unwrap();

        let loader = FileLoader { max_file_size: 10 };
        let result = loader.load(&file).await;
        assert!(matches!(result, Err(DocumentError::FileTooLarge(64))));
    }

    #[test]
    fn supported_extensions_list() {
        let loader = FileLoader::default();
        assert_eq!(loader.supported_extensions(), &["pdf", "docx"]);
    }
}
