//! Disk-backed image storage provider.
//!
//! The core only needs `upload(bytes, filename) -> public URL`. Objects are
//! written under a configured root and served back at
//! `{public_base}/uploads/{name}` by a static file service.

use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("unsupported image type")]
    UnsupportedType,
    #[error("failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

pub struct ImageStore {
    root: PathBuf,
    public_base: String,
}

impl ImageStore {
    pub fn new(root: PathBuf, public_base: &str) -> Self {
        Self {
            root,
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }

    /// Directory the static file service should serve at `/uploads`.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn upload(&self, data: &[u8], filename: &str) -> Result<String, ImageError> {
        let ext = extension_of(filename).ok_or(ImageError::UnsupportedType)?;
        let object = format!("{}.{}", Uuid::new_v4(), ext);
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&object), data).await?;
        Ok(format!("{}/uploads/{}", self.public_base, object))
    }
}

fn extension_of(filename: &str) -> Option<String> {
    let ext = filename.rsplit_once('.')?.1.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_allow_list() {
        assert_eq!(extension_of("dish.JPG").as_deref(), Some("jpg"));
        assert_eq!(extension_of("dish.webp").as_deref(), Some("webp"));
        assert_eq!(extension_of("dish.gif"), None);
        assert_eq!(extension_of("no-extension"), None);
    }

    #[tokio::test]
    async fn test_upload_writes_file_and_returns_public_url() {
        let dir = std::env::temp_dir().join(format!("forchetta-test-{}", Uuid::new_v4()));
        let store = ImageStore::new(dir.clone(), "https://img.example/");

        let url = store.upload(b"not really a png", "dish.png").await.unwrap();
        assert!(url.starts_with("https://img.example/uploads/"));
        assert!(url.ends_with(".png"));

        let object = url.rsplit_once('/').unwrap().1;
        let on_disk = tokio::fs::read(dir.join(object)).await.unwrap();
        assert_eq!(on_disk, b"not really a png");

        tokio::fs::remove_dir_all(dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_upload_rejects_unsupported_type() {
        let store = ImageStore::new(std::env::temp_dir(), "https://img.example");
        let err = store.upload(b"data", "script.sh").await.unwrap_err();
        assert!(matches!(err, ImageError::UnsupportedType));
    }
}
