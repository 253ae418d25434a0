use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;

/// Blob storage seam for uploaded assets. The production implementation
/// writes to the local upload directory that `/uploads` serves; tests swap
/// in an in-memory map.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<()>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
}

pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl StorageClient for LocalStorage {
    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .context("create upload dir")?;
        tokio::fs::write(self.path_for(key), &body)
            .await
            .with_context(|| format!("write upload {}", key))?;
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            // Deleting a file that is already gone is not an error.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("delete upload {}", key)),
        }
    }
}

/// In-memory storage used by `AppState::fake()` and the integration tests.
#[derive(Default)]
pub struct MemoryStorage {
    objects: std::sync::Mutex<std::collections::HashMap<String, Bytes>>,
}

impl MemoryStorage {
    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }
}

#[async_trait]
impl StorageClient for MemoryStorage {
    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<()> {
        self.objects.lock().unwrap().insert(key.to_string(), body);
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Disk key for an upload: `{unix_millis}-{sanitized original name}`.
pub fn upload_key(original_name: &str) -> String {
    let millis = time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    format!("{}-{}", millis, sanitize_file_name(original_name))
}

fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "upload".into()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_safe_chars() {
        assert_eq!(sanitize_file_name("my photo (1).png"), "my_photo__1_.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".._.._etc_passwd");
    }

    #[test]
    fn sanitize_never_empty() {
        assert_eq!(sanitize_file_name(""), "upload");
    }

    #[test]
    fn upload_key_has_timestamp_prefix() {
        let key = upload_key("a.png");
        let (prefix, rest) = key.split_once('-').expect("dash separator");
        assert!(prefix.parse::<i128>().is_ok());
        assert_eq!(rest, "a.png");
    }

    #[tokio::test]
    async fn memory_storage_put_delete() {
        let storage = MemoryStorage::default();
        storage
            .put_object("k.png", Bytes::from_static(b"123"))
            .await
            .unwrap();
        assert!(storage.contains("k.png"));
        storage.delete_object("k.png").await.unwrap();
        assert!(!storage.contains("k.png"));
    }
}
