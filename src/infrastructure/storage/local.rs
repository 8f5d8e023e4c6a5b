use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{FileCategory, FileStore, Upload};
use crate::shared::error::AppError;

/// Stores files under `<root>/<avatars|messages>/<uuid><ext>` and hands out
/// URLs under `public_prefix`.
pub struct LocalFileStore {
    root: PathBuf,
    public_prefix: String,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a URL issued by this store back to its path. `None` for foreign URLs.
    fn path_for(&self, url: &str) -> Option<PathBuf> {
        let relative = url.strip_prefix(&self.public_prefix)?.trim_start_matches('/');
        let relative = Path::new(relative);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn store(&self, category: FileCategory, upload: &Upload) -> Result<String, AppError> {
        let dir = self.root.join(category.dir_name());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create upload directory: {}", e)))?;

        let file_name = format!("{}{}", Uuid::new_v4(), upload.extension());
        tokio::fs::write(dir.join(&file_name), &upload.bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write upload: {}", e)))?;

        let url = format!("{}/{}/{}", self.public_prefix, category.dir_name(), file_name);
        tracing::debug!(url = %url, size = upload.bytes.len(), "File stored");
        Ok(url)
    }

    async fn remove(&self, url: &str) -> Result<(), AppError> {
        let Some(path) = self.path_for(url) else {
            return Err(AppError::BadRequest(format!("Not a stored file: {}", url)));
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(format!("Failed to remove file: {}", e))),
        }
    }
}

/// File store that keeps nothing; for tests that don't exercise storage.
#[cfg(test)]
pub struct DiscardFileStore;

#[cfg(test)]
#[async_trait]
impl FileStore for DiscardFileStore {
    async fn store(&self, category: FileCategory, upload: &Upload) -> Result<String, AppError> {
        Ok(format!(
            "/uploads/{}/{}{}",
            category.dir_name(),
            Uuid::new_v4(),
            upload.extension()
        ))
    }

    async fn remove(&self, _url: &str) -> Result<(), AppError> {
        Ok(())
    }
}
