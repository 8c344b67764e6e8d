// Configuration access for the filter features.
//
// The store trait is the port; the JSON implementation lives in infra.
// Command adapters go through the mutation helpers here so membership
// checks and persistence stay in one place.

use super::filter_models::{
    BadWordConfig, FilterPolicy, LinkChannelConfig, SpamConfig, StickyConfig,
};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(String),
}

/// Persistence port for every filter feature's settings.
///
/// Readers must treat a corrupt or missing backing document as the default
/// value, never as a fatal error. Writers persist before returning.
#[async_trait]
pub trait FilterConfigStore: Send + Sync {
    async fn bad_word_config(&self, guild_id: u64) -> Result<BadWordConfig, StoreError>;
    async fn save_bad_word_config(
        &self,
        guild_id: u64,
        config: BadWordConfig,
    ) -> Result<(), StoreError>;

    /// `None` means the channel has never been configured.
    async fn link_config(&self, channel_id: u64) -> Result<Option<LinkChannelConfig>, StoreError>;
    async fn save_link_config(
        &self,
        channel_id: u64,
        config: LinkChannelConfig,
    ) -> Result<(), StoreError>;

    async fn spam_config(&self, guild_id: u64) -> Result<SpamConfig, StoreError>;
    async fn save_spam_config(&self, guild_id: u64, config: SpamConfig) -> Result<(), StoreError>;

    async fn sticky_channels(&self) -> Result<StickyConfig, StoreError>;
    async fn save_sticky_channels(&self, config: StickyConfig) -> Result<(), StoreError>;

    /// Re-read every document from disk, discarding in-memory state.
    async fn reload(&self) -> Result<(), StoreError>;
}

pub struct FilterService<S: FilterConfigStore> {
    store: S,
}

impl<S: FilterConfigStore> FilterService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Resolve every feature's settings for the scope a message arrived in.
    pub async fn resolve_policy(
        &self,
        guild_id: u64,
        channel_id: u64,
    ) -> Result<FilterPolicy, StoreError> {
        Ok(FilterPolicy {
            bad_words: self.store.bad_word_config(guild_id).await?,
            link: self.store.link_config(channel_id).await?,
            spam: self.store.spam_config(guild_id).await?,
            sticky: self.store.sticky_channels().await?,
        })
    }

    pub async fn reload(&self) -> Result<(), StoreError> {
        self.store.reload().await
    }

    // ------------------------------------------------------------------
    // Bad word filter administration
    // ------------------------------------------------------------------

    pub async fn bad_words(&self, guild_id: u64) -> Result<BadWordConfig, StoreError> {
        self.store.bad_word_config(guild_id).await
    }

    /// Returns `false` when the word was already listed.
    pub async fn add_bad_word(&self, guild_id: u64, word: &str) -> Result<bool, StoreError> {
        let word = word.to_lowercase();
        let mut config = self.store.bad_word_config(guild_id).await?;
        if config.words.contains(&word) {
            return Ok(false);
        }
        config.words.push(word);
        self.store.save_bad_word_config(guild_id, config).await?;
        Ok(true)
    }

    /// Returns `false` when the word was not listed.
    pub async fn remove_bad_word(&self, guild_id: u64, word: &str) -> Result<bool, StoreError> {
        let word = word.to_lowercase();
        let mut config = self.store.bad_word_config(guild_id).await?;
        let before = config.words.len();
        config.words.retain(|w| w != &word);
        if config.words.len() == before {
            return Ok(false);
        }
        self.store.save_bad_word_config(guild_id, config).await?;
        Ok(true)
    }

    /// Returns `false` when the channel was already in the requested state.
    pub async fn set_bad_word_channel_ignored(
        &self,
        guild_id: u64,
        channel_id: u64,
        ignored: bool,
    ) -> Result<bool, StoreError> {
        let mut config = self.store.bad_word_config(guild_id).await?;
        let listed = config.ignored_channels.contains(&channel_id);
        if ignored == listed {
            return Ok(false);
        }
        if ignored {
            config.ignored_channels.push(channel_id);
        } else {
            config.ignored_channels.retain(|id| *id != channel_id);
        }
        self.store.save_bad_word_config(guild_id, config).await?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Link filter administration
    // ------------------------------------------------------------------

    pub async fn link_settings(&self, channel_id: u64) -> Result<LinkChannelConfig, StoreError> {
        Ok(self.store.link_config(channel_id).await?.unwrap_or_default())
    }

    pub async fn set_link_filter_enabled(
        &self,
        channel_id: u64,
        enabled: bool,
    ) -> Result<(), StoreError> {
        let mut config = self.link_settings(channel_id).await?;
        config.enabled = enabled;
        self.store.save_link_config(channel_id, config).await
    }

    /// Returns `false` when the domain was already whitelisted.
    pub async fn add_whitelisted_domain(
        &self,
        channel_id: u64,
        domain: &str,
    ) -> Result<bool, StoreError> {
        let domain = domain.to_lowercase();
        let mut config = self.link_settings(channel_id).await?;
        if config.whitelisted_domains.contains(&domain) {
            return Ok(false);
        }
        config.whitelisted_domains.push(domain);
        self.store.save_link_config(channel_id, config).await?;
        Ok(true)
    }

    /// Returns `false` when the domain was not whitelisted.
    pub async fn remove_whitelisted_domain(
        &self,
        channel_id: u64,
        domain: &str,
    ) -> Result<bool, StoreError> {
        let domain = domain.to_lowercase();
        let mut config = self.link_settings(channel_id).await?;
        let before = config.whitelisted_domains.len();
        config.whitelisted_domains.retain(|d| d != &domain);
        if config.whitelisted_domains.len() == before {
            return Ok(false);
        }
        self.store.save_link_config(channel_id, config).await?;
        Ok(true)
    }

    /// Returns `false` when the role was already whitelisted.
    pub async fn add_whitelisted_role(
        &self,
        channel_id: u64,
        role_id: u64,
    ) -> Result<bool, StoreError> {
        let mut config = self.link_settings(channel_id).await?;
        if config.whitelisted_roles.contains(&role_id) {
            return Ok(false);
        }
        config.whitelisted_roles.push(role_id);
        self.store.save_link_config(channel_id, config).await?;
        Ok(true)
    }

    /// Returns `false` when the role was not whitelisted.
    pub async fn remove_whitelisted_role(
        &self,
        channel_id: u64,
        role_id: u64,
    ) -> Result<bool, StoreError> {
        let mut config = self.link_settings(channel_id).await?;
        let before = config.whitelisted_roles.len();
        config.whitelisted_roles.retain(|id| *id != role_id);
        if config.whitelisted_roles.len() == before {
            return Ok(false);
        }
        self.store.save_link_config(channel_id, config).await?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Spam filter administration
    // ------------------------------------------------------------------

    pub async fn spam_settings(&self, guild_id: u64) -> Result<SpamConfig, StoreError> {
        self.store.spam_config(guild_id).await
    }

    pub async fn set_spam_enabled(&self, guild_id: u64, enabled: bool) -> Result<(), StoreError> {
        let mut config = self.store.spam_config(guild_id).await?;
        config.enabled = enabled;
        self.store.save_spam_config(guild_id, config).await
    }

    /// Returns `false` when the channel was already in the requested state.
    pub async fn set_spam_channel_ignored(
        &self,
        guild_id: u64,
        channel_id: u64,
        ignored: bool,
    ) -> Result<bool, StoreError> {
        let mut config = self.store.spam_config(guild_id).await?;
        let listed = config.ignored_channels.contains(&channel_id);
        if ignored == listed {
            return Ok(false);
        }
        if ignored {
            config.ignored_channels.push(channel_id);
        } else {
            config.ignored_channels.retain(|id| *id != channel_id);
        }
        self.store.save_spam_config(guild_id, config).await?;
        Ok(true)
    }

    pub async fn set_spam_alert_role(
        &self,
        guild_id: u64,
        role_id: Option<u64>,
    ) -> Result<(), StoreError> {
        let mut config = self.store.spam_config(guild_id).await?;
        config.alert_role_id = role_id;
        self.store.save_spam_config(guild_id, config).await
    }

    // ------------------------------------------------------------------
    // Sticky channel administration
    // ------------------------------------------------------------------

    pub async fn sticky_channels(&self) -> Result<StickyConfig, StoreError> {
        self.store.sticky_channels().await
    }

    /// Returns `false` when the channel was already in the requested state.
    pub async fn set_sticky(&self, channel_id: u64, sticky: bool) -> Result<bool, StoreError> {
        let mut config = self.store.sticky_channels().await?;
        let listed = config.is_sticky(channel_id);
        if sticky == listed {
            return Ok(false);
        }
        if sticky {
            config.channels.push(channel_id);
        } else {
            config.channels.retain(|id| *id != channel_id);
        }
        self.store.save_sticky_channels(config).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::RwLock;

    #[derive(Default)]
    struct MemoryStore {
        bad_words: RwLock<std::collections::HashMap<u64, BadWordConfig>>,
        links: RwLock<std::collections::HashMap<u64, LinkChannelConfig>>,
        spam: RwLock<std::collections::HashMap<u64, SpamConfig>>,
        sticky: RwLock<StickyConfig>,
    }

    #[async_trait]
    impl FilterConfigStore for MemoryStore {
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
            self.bad_words.write().await.insert(guild_id, config);
            Ok(())
        }

        async fn link_config(
            &self,
            channel_id: u64,
        ) -> Result<Option<LinkChannelConfig>, StoreError> {
            Ok(self.links.read().await.get(&channel_id).cloned())
        }

        async fn save_link_config(
            &self,
            channel_id: u64,
            config: LinkChannelConfig,
        ) -> Result<(), StoreError> {
            self.links.write().await.insert(channel_id, config);
            Ok(())
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

        async fn save_spam_config(
            &self,
            guild_id: u64,
            config: SpamConfig,
        ) -> Result<(), StoreError> {
            self.spam.write().await.insert(guild_id, config);
            Ok(())
        }

        async fn sticky_channels(&self) -> Result<StickyConfig, StoreError> {
            Ok(self.sticky.read().await.clone())
        }

        async fn save_sticky_channels(&self, config: StickyConfig) -> Result<(), StoreError> {
            *self.sticky.write().await = config;
            Ok(())
        }

        async fn reload(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn duplicate_bad_word_is_not_added_twice() {
        let service = FilterService::new(MemoryStore::default());

        assert!(service.add_bad_word(1, "Spam").await.unwrap());
        assert!(!service.add_bad_word(1, "spam").await.unwrap());

        let config = service.bad_words(1).await.unwrap();
        assert_eq!(config.words, vec!["spam".to_string()]);
    }

    #[tokio::test]
    async fn removing_an_unlisted_word_reports_false() {
        let service = FilterService::new(MemoryStore::default());
        assert!(!service.remove_bad_word(1, "missing").await.unwrap());
    }

    #[tokio::test]
    async fn ignored_channel_toggling_round_trips() {
        let service = FilterService::new(MemoryStore::default());

        assert!(service.set_bad_word_channel_ignored(1, 5, true).await.unwrap());
        assert!(!service.set_bad_word_channel_ignored(1, 5, true).await.unwrap());
        assert!(service.set_bad_word_channel_ignored(1, 5, false).await.unwrap());

        let config = service.bad_words(1).await.unwrap();
        assert!(config.ignored_channels.is_empty());
    }

    #[tokio::test]
    async fn link_domains_are_stored_lowercase() {
        let service = FilterService::new(MemoryStore::default());

        service.set_link_filter_enabled(5, true).await.unwrap();
        assert!(service.add_whitelisted_domain(5, "YouTube.com").await.unwrap());
        assert!(!service.add_whitelisted_domain(5, "youtube.com").await.unwrap());

        let config = service.link_settings(5).await.unwrap();
        assert!(config.enabled);
        assert_eq!(config.whitelisted_domains, vec!["youtube.com".to_string()]);
    }

    #[tokio::test]
    async fn resolved_policy_reflects_each_scope() {
        let service = FilterService::new(MemoryStore::default());

        service.add_bad_word(1, "spam").await.unwrap();
        service.set_link_filter_enabled(5, true).await.unwrap();
        service.set_spam_enabled(1, true).await.unwrap();
        service.set_sticky(5, true).await.unwrap();

        let policy = service.resolve_policy(1, 5).await.unwrap();
        assert_eq!(policy.bad_words.words, vec!["spam".to_string()]);
        assert!(policy.link.as_ref().is_some_and(|c| c.enabled));
        assert!(policy.spam.enabled);
        assert!(policy.sticky.is_sticky(5));

        let elsewhere = service.resolve_policy(1, 6).await.unwrap();
        assert!(elsewhere.link.is_none());
        assert!(!elsewhere.sticky.is_sticky(6));
    }

    #[tokio::test]
    async fn spam_alert_role_can_be_set_and_cleared() {
        let service = FilterService::new(MemoryStore::default());

        service.set_spam_alert_role(1, Some(99)).await.unwrap();
        assert_eq!(service.spam_settings(1).await.unwrap().alert_role_id, Some(99));

        service.set_spam_alert_role(1, None).await.unwrap();
        assert_eq!(service.spam_settings(1).await.unwrap().alert_role_id, None);
    }
}
