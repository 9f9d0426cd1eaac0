use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::IndexError;

const MANIFEST_FILE: &str = "manifest.json";

/// Description of the live index version, persisted next to the vector data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub version: u64,
    /// Concrete collection holding this version, `<base>_v<version>`.
    pub collection: String,
    pub vector_size: u64,
    /// Source file names, in indexing order.
    pub documents: Vec<String>,
    pub built_at_secs: u64,
}

impl IndexManifest {
    #[must_use]
    pub fn path(dir: &Path) -> PathBuf {
        dir.join(MANIFEST_FILE)
    }

    /// Read the manifest from `dir`; `Ok(None)` if there is none yet.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Manifest` if the file exists but cannot be read or parsed.
    pub async fn load(dir: &Path) -> Result<Option<Self>, IndexError> {
        let path = Self::path(dir);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(IndexError::Manifest(format!("{}: {e}", path.display()))),
        };
        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|e| IndexError::Manifest(format!("{}: {e}", path.display())))
    }

    /// Write the manifest into `dir` via a temp file and rename, so readers
    /// never observe a partial file.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Manifest` on any IO or serialization failure.
    pub async fn store(&self, dir: &Path) -> Result<(), IndexError> {
        let io_err = |e: std::io::Error| IndexError::Manifest(format!("{}: {e}", dir.display()));
        tokio::fs::create_dir_all(dir).await.map_err(io_err)?;
        let data =
            serde_json::to_vec_pretty(self).map_err(|e| IndexError::Manifest(e.to_string()))?;
        let tmp = dir.join(format!("{MANIFEST_FILE}.tmp"));
        tokio::fs::write(&tmp, data).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, Self::path(dir)).await.map_err(io_err)?;
        Ok(())
    }
}
