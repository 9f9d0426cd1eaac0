use std::path::Path;

use rfpgen_document::{Document, DocumentLoader};

use crate::error::IndexError;

/// Load every supported file directly under `folder`, sorted by file name.
///
/// Files that fail to load or yield no text are skipped with a warning.
///
/// # Errors
///
/// Returns `IndexError::Folder` if the folder cannot be listed and
/// `IndexError::EmptyCorpus` if nothing readable remains.
pub async fn load_corpus(
    folder: &Path,
    loader: &(dyn DocumentLoader + '_),
) -> Result<Vec<Document>, IndexError> {
    let folder_err = |source| IndexError::Folder {
        path: folder.to_path_buf(),
        source,
    };
    let mut entries = tokio::fs::read_dir(folder).await.map_err(folder_err)?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(folder_err)? {
        let path = entry.path();
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                loader
                    .supported_extensions()
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(ext))
            });
        if supported && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        match loader.load(&path).await {
            Ok(doc) if doc.content.trim().is_empty() => {
                tracing::warn!(path = %path.display(), "skipping corpus file with no text");
            }
            Ok(doc) => documents.push(doc),
            Err(e) => {
                tracing::warn!(path = %path.display(), "skipping unreadable corpus file: {e}");
            }
        }
    }

    if documents.is_empty() {
        return Err(IndexError::EmptyCorpus(folder.to_path_buf()));
    }
    tracing::info!(count = documents.len(), folder = %folder.display(), "loaded corpus");
    Ok(documents)
}
