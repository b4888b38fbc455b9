//! Active-identity key storage.
//!
//! The protocol only ever reads keys; writes come from tools such as the
//! key generator. Absent values always read back as empty strings.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pearid_crypto::KeyPair;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Partial update of the stored pair. `None` leaves that half untouched.
#[derive(Debug, Clone, Default)]
pub struct KeyUpdate {
    pub public_key: Option<String>,
    pub private_key: Option<String>,
}

impl KeyUpdate {
    /// Replace both halves.
    pub fn pair(pair: &KeyPair) -> Self {
        Self {
            public_key: Some(pair.public_key.clone()),
            private_key: Some(pair.private_key.clone()),
        }
    }

    fn apply(self, pair: &mut KeyPair) {
        if let Some(public_key) = self.public_key {
            pair.public_key = public_key;
        }
        if let Some(private_key) = self.private_key {
            pair.private_key = private_key;
        }
    }
}

/// Persistent key-pair storage.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Current pair; empty strings for anything unset.
    async fn get(&self) -> Result<KeyPair>;

    /// Merge an update into the stored pair.
    async fn set(&self, update: KeyUpdate) -> Result<()>;
}

/// In-process key store.
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    pair: RwLock<KeyPair>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pair(pair: KeyPair) -> Self {
        Self {
            pair: RwLock::new(pair),
        }
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn get(&self) -> Result<KeyPair> {
        Ok(self.pair.read().await.clone())
    }

    async fn set(&self, update: KeyUpdate) -> Result<()> {
        let mut pair = self.pair.write().await;
        update.apply(&mut pair);
        Ok(())
    }
}

/// On-disk record.
#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoredKeys {
    #[serde(flatten)]
    pair: KeyPair,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

/// JSON file key store: `{"publicKey", "privateKey", "updatedAt"}`.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    path: PathBuf,
}

impl FileKeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Time of the last write, if the file records one.
    pub async fn updated_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.load().await?.updated_at)
    }

    async fn load(&self) -> Result<StoredKeys> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(StoredKeys::default()),
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                Error::KeyStore(format!("{}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Key store file absent, reading as empty");
                Ok(StoredKeys::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl KeyStore for FileKeyStore {
    async fn get(&self) -> Result<KeyPair> {
        Ok(self.load().await?.pair)
    }

    async fn set(&self, update: KeyUpdate) -> Result<()> {
        let mut stored = self.load().await?;
        update.apply(&mut stored.pair);
        stored.updated_at = Some(Utc::now());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(&stored)?;
        tokio::fs::write(&self.path, json).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&self.path, perms).await?;
        }

        info!(path = %self.path.display(), "Key store updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_store_partial_update() {
        let store = MemoryKeyStore::new();
        assert!(store.get().await.unwrap().is_empty());

        store
            .set(KeyUpdate {
                public_key: Some("pub".into()),
                private_key: None,
            })
            .await
            .unwrap();
        let pair = store.get().await.unwrap();
        assert_eq!(pair.public_key, "pub");
        assert_eq!(pair.private_key, "");
    }

    #[tokio::test]
    async fn test_file_store_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyStore::new(dir.path().join("keys.json"));
        let pair = store.get().await.unwrap();
        assert_eq!(pair.public_key, "");
        assert_eq!(pair.private_key, "");
        assert!(store.updated_at().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_merges_and_stamps() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyStore::new(dir.path().join("nested").join("keys.json"));

        store.set(KeyUpdate::pair(&KeyPair::new("pub", "priv"))).await.unwrap();
        store
            .set(KeyUpdate {
                public_key: None,
                private_key: Some("priv2".into()),
            })
            .await
            .unwrap();

        let pair = store.get().await.unwrap();
        assert_eq!(pair.public_key, "pub");
        assert_eq!(pair.private_key, "priv2");
        assert!(store.updated_at().await.unwrap().is_some());

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"publicKey\""));
        assert!(raw.contains("\"updatedAt\""));
    }

    #[tokio::test]
    async fn test_file_store_partial_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keys.json");
        std::fs::write(&path, r#"{"publicKey":"only-public"}"#).unwrap();

        let pair = FileKeyStore::new(&path).get().await.unwrap();
        assert_eq!(pair.public_key, "only-public");
        assert_eq!(pair.private_key, "");
    }

    #[tokio::test]
    async fn test_file_store_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keys.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FileKeyStore::new(&path).get().await.unwrap_err();
        assert!(matches!(err, Error::KeyStore(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_store_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = FileKeyStore::new(dir.path().join("keys.json"));
        store.set(KeyUpdate::pair(&KeyPair::new("a", "b"))).await.unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
