// service/file_storage.rs
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

const MAX_STORED_NAME_LEN: usize = 100;

/// Byte storage for attachments. Callers only ever see opaque handles.
#[async_trait]
pub trait ContentStore: std::fmt::Debug + Send + Sync {
    /// Stores `bytes` and returns the handle to fetch them with.
    async fn put(&self, original_name: &str, bytes: &[u8]) -> Result<String, std::io::Error>;

    /// `Ok(None)` when nothing is stored under `handle`.
    async fn get(&self, handle: &str) -> Result<Option<Vec<u8>>, std::io::Error>;

    async fn delete(&self, handle: &str) -> Result<(), std::io::Error>;
}

/// Stores each upload as `<uuid>_<sanitized name>` under one directory.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub async fn init(root: impl AsRef<Path>) -> Result<Self, std::io::Error> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        tracing::info!("📁 Attachment storage at {}", root.display());
        Ok(Self { root })
    }

    fn resolve(&self, handle: &str) -> Option<PathBuf> {
        if handle.is_empty()
            || handle.starts_with('.')
            || handle.contains(['/', '\\'])
            || handle.contains("..")
        {
            return None;
        }
        Some(self.root.join(handle))
    }
}

/// Keeps the last path component of a client-supplied name and replaces
/// anything outside `[A-Za-z0-9._-]`.
pub fn sanitize_file_name(original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();

    let cleaned = cleaned.trim_start_matches('.').replace("..", "_");
    let cleaned: String = cleaned.chars().take(MAX_STORED_NAME_LEN).collect();

    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

#[async_trait]
impl ContentStore for DiskStore {
    async fn put(&self, original_name: &str, bytes: &[u8]) -> Result<String, std::io::Error> {
        let handle = format!("{}_{}", Uuid::new_v4(), sanitize_file_name(original_name));
        let path = self.root.join(&handle);
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!("Stored {} bytes as {}", bytes.len(), handle);
        Ok(handle)
    }

    async fn get(&self, handle: &str) -> Result<Option<Vec<u8>>, std::io::Error> {
        let Some(path) = self.resolve(handle) else {
            tracing::warn!("Rejected malformed storage handle: {}", handle);
            return Ok(None);
        };

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, handle: &str) -> Result<(), std::io::Error> {
        let Some(path) = self.resolve(handle) else {
            return Ok(());
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
