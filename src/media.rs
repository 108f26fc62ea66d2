//! Uploaded image storage on the local filesystem.
//!
//! Files land under `<media_root>/<folder>/<uuid>.<ext>`; the database only
//! keeps the relative path, which [`MediaStore::url_for`] turns into a public
//! URL or the entity's default image.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::ServiceError;

const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

pub const PRODUCT_IMAGE_FOLDER: &str = "product_images";
pub const CUSTOMER_PICTURE_FOLDER: &str = "profile_pics";
pub const MEMBER_PICTURE_FOLDER: &str = "member_profile_pics";

/// Fallback image shown when an entity has no stored picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultImage {
    Product,
    CustomerProfile,
    MemberProfile,
}

impl DefaultImage {
    pub fn url(self) -> &'static str {
        match self {
            DefaultImage::Product => "/static/images/default_product.png",
            DefaultImage::CustomerProfile => "/static/images/default_profile.png",
            DefaultImage::MemberProfile => "/static/images/default_member_profile.png",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    base_url: String,
    max_bytes: usize,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
            max_bytes,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.media_root, &config.media_url, config.max_upload_bytes)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` under `folder` with a fresh name and returns the stored
    /// relative path, e.g. `product_images/2f1c...png`.
    pub async fn save(
        &self,
        folder: &str,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<String, ServiceError> {
        let extension = allowed_extension(original_name).ok_or_else(|| {
            ServiceError::field(
                "image",
                "Upload a valid image. Allowed types: jpg, jpeg, png, gif, webp.",
            )
        })?;
        if bytes.is_empty() {
            return Err(ServiceError::field("image", "The submitted file is empty."));
        }
        if bytes.len() > self.max_bytes {
            return Err(ServiceError::field(
                "image",
                format!("Image is larger than {} bytes.", self.max_bytes),
            ));
        }

        let dir = self.root.join(folder);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create media directory at {:?}", dir))?;

        let relative = format!("{}/{}.{}", folder, Uuid::new_v4(), extension);
        let target = self.root.join(&relative);
        tokio::fs::write(&target, bytes)
            .await
            .with_context(|| format!("failed to write upload to {:?}", target))?;

        metrics::counter!("media.uploads", 1);
        info!(path = %relative, size = bytes.len(), "stored uploaded image");
        Ok(relative)
    }

    /// Removes a previously stored file. A file that is already gone is not an error.
    pub async fn delete(&self, relative: &str) -> Result<(), ServiceError> {
        let Some(path) = self.resolve(relative) else {
            warn!(path = %relative, "refusing to delete path outside media root");
            return Ok(());
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %relative, "deleted stored image");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(anyhow::Error::new(err)
                .context(format!("failed to delete {:?}", path))
                .into()),
        }
    }

    /// Cleanup after the owning row is already gone or replaced. A failure only
    /// leaves an orphaned file behind, so it is logged instead of returned.
    pub async fn discard(&self, relative: &str) {
        if let Err(err) = self.delete(relative).await {
            metrics::counter!("media.cleanup_failures", 1);
            warn!(path = %relative, error = %err, "failed to remove stored image");
        }
    }

    /// Public URL of a stored path, or the default image when there is none.
    pub fn url_for(&self, stored: Option<&str>, fallback: DefaultImage) -> String {
        match stored.map(str::trim).filter(|path| !path.is_empty()) {
            Some(path) => format!("{}{}", self.base_url, path.trim_start_matches('/')),
            None => fallback.url().to_string(),
        }
    }

    fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let path = Path::new(relative);
        let escapes = path.components().any(|component| {
            !matches!(component, std::path::Component::Normal(_))
        });
        if escapes || relative.is_empty() {
            None
        } else {
            Some(self.root.join(path))
        }
    }
}

fn allowed_extension(name: &str) -> Option<String> {
    let extension = Path::new(name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &Path) -> MediaStore {
        MediaStore::new(dir, "/media/", 1024)
    }

    #[test]
    fn urls_fall_back_to_defaults() {
        let media = MediaStore::new("media", "/media/", 1024);
        assert_eq!(
            media.url_for(None, DefaultImage::Product),
            "/static/images/default_product.png"
        );
        assert_eq!(
            media.url_for(Some(""), DefaultImage::MemberProfile),
            "/static/images/default_member_profile.png"
        );
        assert_eq!(
            media.url_for(Some("profile_pics/a.png"), DefaultImage::CustomerProfile),
            "/media/profile_pics/a.png"
        );
    }

    #[test]
    fn only_image_extensions_are_accepted() {
        assert_eq!(allowed_extension("photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(allowed_extension("photo.webp").as_deref(), Some("webp"));
        assert!(allowed_extension("script.sh").is_none());
        assert!(allowed_extension("noext").is_none());
    }

    #[tokio::test]
    async fn save_then_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let media = store(dir.path());

        let stored = media
            .save(PRODUCT_IMAGE_FOLDER, "shirt.png", b"png-bytes")
            .await
            .unwrap();
        assert!(stored.starts_with("product_images/"));
        assert!(stored.ends_with(".png"));
        assert!(dir.path().join(&stored).exists());

        media.delete(&stored).await.unwrap();
        assert!(!dir.path().join(&stored).exists());
        // second delete is a no-op
        media.delete(&stored).await.unwrap();
    }

    #[tokio::test]
    async fn discard_swallows_removal_failures() {
        let dir = tempfile::tempdir().unwrap();
        let media = store(dir.path());
        // a directory where the file should be makes remove_file fail
        let blocked = "product_images/blocked.png";
        std::fs::create_dir_all(dir.path().join(blocked)).unwrap();

        assert!(media.delete(blocked).await.is_err());
        media.discard(blocked).await;
        assert!(dir.path().join(blocked).is_dir());
    }

    #[tokio::test]
    async fn oversized_and_wrong_type_uploads_are_field_errors() {
        let dir = tempfile::tempdir().unwrap();
        let media = store(dir.path());

        let err = media
            .save(PRODUCT_IMAGE_FOLDER, "big.png", &[0u8; 2048])
            .await
            .unwrap_err();
        assert!(err.field_errors().unwrap().contains("image"));

        let err = media
            .save(PRODUCT_IMAGE_FOLDER, "notes.txt", b"hello")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationFailed(_)));
    }

    #[test]
    fn paths_outside_root_are_not_resolved() {
        let media = MediaStore::new("media", "/media/", 1024);
        assert!(media.resolve("../etc/passwd").is_none());
        assert!(media.resolve("/etc/passwd").is_none());
        assert!(media.resolve("profile_pics/a.png").is_some());
    }
}
