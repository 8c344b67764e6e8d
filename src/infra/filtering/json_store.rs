// JSON-file implementation of the filter configuration store.
//
// One human-editable document per feature under the data directory. Each
// document is cached in memory, written back on every mutation, and
// re-read wholesale by `reload`. A corrupt or missing document is treated
// as its default value, never as a fatal error.

use crate::core::filtering::{
    BadWordConfig, FilterConfigStore, LinkChannelConfig, SpamConfig, StickyConfig, StoreError,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

const BAD_WORDS_FILE: &str = "bad_words.json";
const LINK_FILTER_FILE: &str = "link_filter.json";
const SPAM_FILTER_FILE: &str = "spam_filter.json";
const STICKY_FILE: &str = "sticky_channels.json";

pub struct JsonFilterStore {
    dir: PathBuf,
    bad_words: RwLock<HashMap<u64, BadWordConfig>>,
    links: RwLock<HashMap<u64, LinkChannelConfig>>,
    spam: RwLock<HashMap<u64, SpamConfig>>,
    sticky: RwLock<StickyConfig>,
}

impl JsonFilterStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            bad_words: RwLock::new(load_document(&dir.join(BAD_WORDS_FILE))),
            links: RwLock::new(load_document(&dir.join(LINK_FILTER_FILE))),
            spam: RwLock::new(load_document(&dir.join(SPAM_FILTER_FILE))),
            sticky: RwLock::new(load_document(&dir.join(STICKY_FILE))),
            dir,
        }
    }

    async fn persist<T: Serialize>(&self, file: &str, value: &T) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        let text =
            serde_json::to_string_pretty(value).map_err(|e| StoreError::Storage(e.to_string()))?;
        tokio::fs::write(self.dir.join(file), text)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))
    }
}

/// Read a document from disk, falling back to the default on any failure.
fn load_document<T: DeserializeOwned + Default>(path: &Path) -> T {
    match std::fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text).unwrap_or_else(|error| {
            tracing::warn!(path = %path.display(), %error, "corrupt config document, using defaults");
            T::default()
        }),
        Err(_) => T::default(),
    }
}

#[async_trait]
impl FilterConfigStore for JsonFilterStore {
    async fn bad_word_config(&self, guild_id: u64) -> Result<BadWordConfig, StoreError> {
        Ok(self
            .bad_words
            .read()
            .await
            .get(&guild_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_bad_word_config(
        &self,
        guild_id: u64,
        config: BadWordConfig,
    ) -> Result<(), StoreError> {
        let mut cache = self.bad_words.write().await;
        cache.insert(guild_id, config);
        let snapshot = cache.clone();
        drop(cache);
        self.persist(BAD_WORDS_FILE, &snapshot).await
    }

    async fn link_config(&self, channel_id: u64) -> Result<Option<LinkChannelConfig>, StoreError> {
        Ok(self.links.read().await.get(&channel_id).cloned())
    }

    async fn save_link_config(
        &self,
        channel_id: u64,
        config: LinkChannelConfig,
    ) -> Result<(), StoreError> {
        let mut cache = self.links.write().await;
        cache.insert(channel_id, config);
        let snapshot = cache.clone();
        drop(cache);
        self.persist(LINK_FILTER_FILE, &snapshot).await
    }

    async fn spam_config(&self, guild_id: u64) -> Result<SpamConfig, StoreError> {
        Ok(self
            .spam
            .read()
            .await
            .get(&guild_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_spam_config(&self, guild_id: u64, config: SpamConfig) -> Result<(), StoreError> {
        let mut cache = self.spam.write().await;
        cache.insert(guild_id, config);
        let snapshot = cache.clone();
        drop(cache);
        self.persist(SPAM_FILTER_FILE, &snapshot).await
    }

    async fn sticky_channels(&self) -> Result<StickyConfig, StoreError> {
        Ok(self.sticky.read().await.clone())
    }

    async fn save_sticky_channels(&self, config: StickyConfig) -> Result<(), StoreError> {
        let mut cache = self.sticky.write().await;
        *cache = config;
        let snapshot = cache.clone();
        drop(cache);
        self.persist(STICKY_FILE, &snapshot).await
    }

    async fn reload(&self) -> Result<(), StoreError> {
        *self.bad_words.write().await = load_document(&self.dir.join(BAD_WORDS_FILE));
        *self.links.write().await = load_document(&self.dir.join(LINK_FILTER_FILE));
        *self.spam.write().await = load_document(&self.dir.join(SPAM_FILTER_FILE));
        *self.sticky.write().await = load_document(&self.dir.join(STICKY_FILE));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn saved_config_survives_a_fresh_store() {
        let dir = tempfile::tempdir().unwrap();

        let store = JsonFilterStore::new(dir.path());
        store
            .save_bad_word_config(
                1,
                BadWordConfig {
                    words: vec!["spam".to_string()],
                    ignored_channels: vec![5],
                },
            )
            .await
            .unwrap();

        let reopened = JsonFilterStore::new(dir.path());
        let config = reopened.bad_word_config(1).await.unwrap();
        assert_eq!(config.words, vec!["spam".to_string()]);
        assert_eq!(config.ignored_channels, vec![5]);
    }

    #[tokio::test]
    async fn missing_documents_read_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFilterStore::new(dir.path());

        assert!(store.bad_word_config(1).await.unwrap().words.is_empty());
        assert!(store.link_config(2).await.unwrap().is_none());
        assert!(!store.spam_config(1).await.unwrap().enabled);
        assert!(store.sticky_channels().await.unwrap().channels.is_empty());
    }

    #[tokio::test]
    async fn corrupt_document_reads_as_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SPAM_FILTER_FILE), "{not json").unwrap();

        let store = JsonFilterStore::new(dir.path());
        assert!(!store.spam_config(1).await.unwrap().enabled);
    }

    #[tokio::test]
    async fn reload_picks_up_out_of_band_edits() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFilterStore::new(dir.path());

        store
            .save_spam_config(
                1,
                SpamConfig {
                    enabled: false,
                    ignored_channels: Vec::new(),
                    alert_role_id: None,
                },
            )
            .await
            .unwrap();

        // Edit the document behind the store's back.
        std::fs::write(
            dir.path().join(SPAM_FILTER_FILE),
            r#"{"1": {"enabled": true, "ignored_channels": [9], "alert_role_id": 42}}"#,
        )
        .unwrap();

        assert!(!store.spam_config(1).await.unwrap().enabled);
        store.reload().await.unwrap();

        let config = store.spam_config(1).await.unwrap();
        assert!(config.enabled);
        assert_eq!(config.ignored_channels, vec![9]);
        assert_eq!(config.alert_role_id, Some(42));
    }

    #[tokio::test]
    async fn sticky_channels_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFilterStore::new(dir.path());

        store
            .save_sticky_channels(StickyConfig {
                channels: vec![10, 20],
            })
            .await
            .unwrap();

        let reopened = JsonFilterStore::new(dir.path());
        assert!(reopened.sticky_channels().await.unwrap().is_sticky(10));
        assert!(!reopened.sticky_channels().await.unwrap().is_sticky(30));
    }
}
