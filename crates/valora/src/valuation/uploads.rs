use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

/// Writes valuation images to a local directory.
#[derive(Debug, Clone)]
pub struct ImageUploadStore {
    dir: PathBuf,
}

/// Body returned once an image is on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub status: String,
    pub path: String,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Only images allowed")]
    UnsupportedMediaType,
    #[error("invalid upload name: {0}")]
    InvalidName(String),
    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

impl ImageUploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Accepts only `image/*` content types.
    pub fn ensure_image(content_type: Option<&str>) -> Result<(), UploadError> {
        let mime = content_type
            .and_then(|raw| raw.parse::<mime::Mime>().ok())
            .ok_or(UploadError::UnsupportedMediaType)?;
        if mime.type_() == mime::IMAGE {
            Ok(())
        } else {
            Err(UploadError::UnsupportedMediaType)
        }
    }

    /// Persists `bytes` as `<dir>/<valuation_id>_<file name>`.
    pub async fn store(
        &self,
        valuation_id: &str,
        file_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<UploadReceipt, UploadError> {
        let valuation_id = single_component(valuation_id)
            .ok_or_else(|| UploadError::InvalidName(valuation_id.to_string()))?;
        let file_name = match file_name {
            Some(name) => {
                single_component(name).ok_or_else(|| UploadError::InvalidName(name.to_string()))?
            }
            None => "upload".to_string(),
        };

        tokio::fs::create_dir_all(&self.dir).await?;
        let destination = self.dir.join(format!("{valuation_id}_{file_name}"));
        tokio::fs::write(&destination, bytes).await?;

        info!(
            valuation_id = %valuation_id,
            path = %destination.display(),
            size = bytes.len(),
            "stored valuation image"
        );

        Ok(UploadReceipt {
            status: "stored".to_string(),
            path: destination.display().to_string(),
        })
    }
}

/// Final path component of `raw`, rejecting empty names and parent references.
fn single_component(raw: &str) -> Option<String> {
    let normalized = raw.replace('\\', "/");
    let name = Path::new(&normalized).file_name()?.to_str()?.trim();
    if name.is_empty() || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_image_types_pass() {
        assert!(ImageUploadStore::ensure_image(Some("image/jpeg")).is_ok());
        assert!(ImageUploadStore::ensure_image(Some("image/png; charset=binary")).is_ok());
        assert!(matches!(
            ImageUploadStore::ensure_image(Some("application/pdf")),
            Err(UploadError::UnsupportedMediaType)
        ));
        assert!(matches!(
            ImageUploadStore::ensure_image(None),
            Err(UploadError::UnsupportedMediaType)
        ));
    }

    #[test]
    fn path_components_are_stripped() {
        assert_eq!(single_component("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(single_component("C:\\photos\\front.jpg").as_deref(), Some("front.jpg"));
        assert_eq!(single_component(".."), None);
        assert_eq!(single_component(""), None);
    }

    #[tokio::test]
    async fn store_writes_prefixed_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = ImageUploadStore::new(dir.path().join("uploads"));

        let receipt = store
            .store("val_123", Some("front.jpg"), b"jpeg-bytes")
            .await
            .expect("upload stored");

        assert_eq!(receipt.status, "stored");
        let expected = dir.path().join("uploads").join("val_123_front.jpg");
        assert_eq!(receipt.path, expected.display().to_string());
        assert_eq!(std::fs::read(expected).expect("file exists"), b"jpeg-bytes");
    }
}
