use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;

/// URL prefix under which stored objects are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;

    fn public_path(&self, key: &str) -> String {
        format!("{}/{}", PUBLIC_PREFIX, key)
    }
}

/// Maps a stored public path (`/uploads/<key>`) back to its key.
pub fn key_from_public_path(path: &str) -> Option<&str> {
    path.strip_prefix(PUBLIC_PREFIX)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|k| !k.is_empty())
}

/// Files on the local disk, under `root`.
#[derive(Clone)]
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub async fn new(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("create upload dir {}", root.display()))?;
        Ok(Self { root })
    }

    fn resolve(&self, key: &str) -> anyhow::Result<PathBuf> {
        let rel = Path::new(key);
        let safe = rel
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        anyhow::ensure!(safe && !key.is_empty(), "invalid storage key {:?}", key);
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl StorageClient for DiskStorage {
    async fn put_object(&self, key: &str, body: Bytes, _content_type: &str) -> anyhow::Result<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create dir {}", parent.display()))?;
        }
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_path_round_trips_to_key() {
        assert_eq!(key_from_public_path("/uploads/programs/a.png"), Some("programs/a.png"));
        assert_eq!(key_from_public_path("/uploads/"), None);
        assert_eq!(key_from_public_path("https://elsewhere/a.png"), None);
    }

    #[tokio::test]
    async fn disk_storage_writes_and_deletes() {
        let root = std::env::temp_dir().join(format!("solvia-storage-{}", uuid::Uuid::new_v4()));
        let storage = DiskStorage::new(&root).await.unwrap();

        storage
            .put_object("users/pic.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();
        let written = tokio::fs::read(root.join("users/pic.png")).await.unwrap();
        assert_eq!(written, b"png");
        assert_eq!(storage.public_path("users/pic.png"), "/uploads/users/pic.png");

        storage.delete_object("users/pic.png").await.unwrap();
        assert!(!root.join("users/pic.png").exists());
        // deleting twice is fine
        storage.delete_object("users/pic.png").await.unwrap();

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn disk_storage_rejects_escaping_keys() {
        let root = std::env::temp_dir().join(format!("solvia-storage-{}", uuid::Uuid::new_v4()));
        let storage = DiskStorage::new(&root).await.unwrap();
        let err = storage
            .put_object("../outside.png", Bytes::from_static(b"x"), "image/png")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid storage key"));
        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
