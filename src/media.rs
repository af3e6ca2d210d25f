//! File storage for payment slips and product photos.
//!
//! Uploads are validated before any byte leaves the handler: wrong MIME type
//! or an oversized file is a user-facing validation error, not a storage
//! error. Storage failures propagate — an earlier revision of this shop
//! substituted a placeholder URL when the backend was down, which silently
//! produced orders without reviewable slips; we fail the whole submission
//! instead.

use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub const ALLOWED_IMAGE_TYPES: [&str; 4] =
    ["image/jpeg", "image/png", "image/webp", "image/jpg"];

#[derive(Debug, Error)]
pub enum UploadConstraintError {
    #[error("unsupported file type {0:?}; use jpeg, png or webp")]
    UnsupportedType(String),

    #[error("file is {size} bytes; the limit is {MAX_UPLOAD_BYTES}")]
    TooLarge { size: usize },

    #[error("file is empty")]
    Empty,
}

pub fn check_image_upload(content_type: &str, size: usize) -> Result<(), UploadConstraintError> {
    if !ALLOWED_IMAGE_TYPES.contains(&content_type) {
        return Err(UploadConstraintError::UnsupportedType(
            content_type.to_string(),
        ));
    }
    if size == 0 {
        return Err(UploadConstraintError::Empty);
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(UploadConstraintError::TooLarge { size });
    }
    Ok(())
}

/// Timestamped destination path, e.g. `payment-slips/1700000000000_slip.jpg`.
/// The file name is sanitized down to a safe character set.
pub fn destination_hint(prefix: &str, file_name: &str) -> String {
    // Basename only; clients must not steer the destination directory.
    let base = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");
    let safe: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{prefix}/{}_{safe}", Utc::now().timestamp_millis())
}

/// Local-disk media store. Files land under `root` and are served back from
/// `public_base` (a `ServeDir` mount in `main`).
#[derive(Debug, Clone)]
pub struct FsMediaStore {
    root: PathBuf,
    public_base: String,
}

impl FsMediaStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn store(&self, bytes: &[u8], hint: &str) -> anyhow::Result<String> {
        let path = self.root.join(hint);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(format!("{}/{hint}", self.public_base.trim_end_matches('/')))
    }
}

impl crate::checkout::SlipStorage for FsMediaStore {
    async fn upload(&self, bytes: &[u8], hint: &str) -> anyhow::Result<String> {
        self.store(bytes, hint).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_every_allowed_image_type() {
        for mime in ALLOWED_IMAGE_TYPES {
            check_image_upload(mime, 1024).unwrap();
        }
    }

    #[test]
    fn rejects_wrong_type_and_oversized_files() {
        assert!(matches!(
            check_image_upload("application/pdf", 1024),
            Err(UploadConstraintError::UnsupportedType(_))
        ));
        assert!(matches!(
            check_image_upload("image/png", MAX_UPLOAD_BYTES + 1),
            Err(UploadConstraintError::TooLarge { .. })
        ));
        assert!(matches!(
            check_image_upload("image/png", 0),
            Err(UploadConstraintError::Empty)
        ));
        // exactly at the limit is fine
        check_image_upload("image/png", MAX_UPLOAD_BYTES).unwrap();
    }

    #[test]
    fn destination_hint_sanitizes_names() {
        let hint = destination_hint("payment-slips", "../evil name?.jpg");
        assert!(hint.starts_with("payment-slips/"));
        assert!(hint.ends_with("_evil_name_.jpg"));
        assert!(!hint.contains(".."));
    }

    #[tokio::test]
    async fn store_writes_and_returns_public_url() {
        let dir = std::env::temp_dir().join(format!("media-test-{}", uuid::Uuid::new_v4()));
        let store = FsMediaStore::new(&dir, "/media");

        let url = store.store(b"fake image", "products/1_a.png").await.unwrap();
        assert_eq!(url, "/media/products/1_a.png");

        let on_disk = tokio::fs::read(dir.join("products/1_a.png")).await.unwrap();
        assert_eq!(on_disk, b"fake image");

        tokio::fs::remove_dir_all(&dir).await.ok();
    }
}
