// JSON-file store for the guild -> log channel mapping.

use crate::core::audit::{AuditConfigStore, AuditError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

pub struct JsonAuditStore {
    path: PathBuf,
    cache: RwLock<HashMap<u64, u64>>,
}

impl JsonAuditStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            cache: RwLock::new(load(&path)),
            path,
        }
    }

    async fn persist(&self) -> Result<(), AuditError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AuditError::Storage(e.to_string()))?;
        }

        let cache = self.cache.read().await;
        let text = serde_json::to_string_pretty(&*cache)
            .map_err(|e| AuditError::Storage(e.to_string()))?;
        drop(cache);

        tokio::fs::write(&self.path, text)
            .await
            .map_err(|e| AuditError::Storage(e.to_string()))
    }
}

fn load(path: &Path) -> HashMap<u64, u64> {
    match std::fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text).unwrap_or_else(|error| {
            tracing::warn!(path = %path.display(), %error, "corrupt log channel document, using defaults");
            HashMap::new()
        }),
        Err(_) => HashMap::new(),
    }
}

#[async_trait]
impl AuditConfigStore for JsonAuditStore {
    async fn log_channel(&self, guild_id: u64) -> Result<Option<u64>, AuditError> {
        Ok(self.cache.read().await.get(&guild_id).copied())
    }

    async fn set_log_channel(&self, guild_id: u64, channel_id: u64) -> Result<(), AuditError> {
        self.cache.write().await.insert(guild_id, channel_id);
        self.persist().await
    }

    async fn reload(&self) -> Result<(), AuditError> {
        *self.cache.write().await = load(&self.path);
        Ok(())
    }
}
