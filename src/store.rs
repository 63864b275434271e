//! Persistent settings store
//!
//! The pipeline only ever touches a handful of fixed keys: the user's own
//! certificate, the credential produced by the last scan, and the preferred
//! camera. Values are arbitrary JSON.

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// The user's own HC1 certificate
pub const MY_CERTIFICATE_KEY: &str = "MYEUDCC";
/// Credential produced by the last successful decode
pub const CURRENT_CREDENTIAL_KEY: &str = "currentCredential";
/// Device id of the camera the user picked
pub const SELECTED_CAMERA_KEY: &str = "selectedCamera";

#[async_trait::async_trait]
pub trait SettingsStore: Send + Sync {
    async fn put(&self, key: &str, value: Value) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<Value>>;
}

/// In-memory store, lost on exit
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SettingsStore for MemoryStore {
    async fn put(&self, key: &str, value: Value) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().await.get(key).cloned())
    }
}

/// Store backed by a single JSON object on disk
///
/// Every `put` rewrites the whole file through a temporary sibling and a
/// rename, so a crash never leaves a truncated file behind.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, Value>>,
}

impl JsonFileStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create store directory {:?}", parent))?;
            }
        }

        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => HashMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("Failed to parse store file {:?}", path))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read store file {:?}", path))
            }
        };

        info!("Settings store opened: {} ({} keys)", path.display(), entries.len());

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self, entries: &HashMap<String, Value>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");

        tokio::fs::write(&tmp, bytes)
            .await
            .with_context(|| format!("Failed to write {:?}", tmp))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {:?}", self.path))?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl SettingsStore for JsonFileStore {
    async fn put(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value);
        self.flush(&entries).await?;

        debug!("Stored key {} in {}", key, self.path.display());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().await.get(key).cloned())
    }
}
