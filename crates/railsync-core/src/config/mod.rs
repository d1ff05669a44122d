//! Configuration value objects handed to the transport and the orchestrator.

use std::fmt;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::EntityId;
use crate::util::{is_http_url, normalize_text_option};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Connection settings for the TestRail HTTP API
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Instance base URL without trailing slash, e.g. `https://acme.testrail.io`
    pub url: String,
    pub username: String,
    /// Password or API key
    pub password: String,
    pub timeout: Duration,
    /// Retries after HTTP 429 before giving up
    pub max_retries: u32,
}

impl ClientConfig {
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let url = normalize_text_option(Some(url.into()))
            .ok_or_else(|| Error::config("url must not be empty"))?;
        if !is_http_url(&url) {
            return Err(Error::config("url must include http:// or https://"));
        }
        let username = normalize_text_option(Some(username.into()))
            .ok_or_else(|| Error::config("username must not be empty"))?;
        let password = password.into();
        if password.trim().is_empty() {
            return Err(Error::config("password must not be empty"));
        }

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            username,
            password,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// Which projects to sync and whether orphans may be deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    pub source_project: EntityId,
    pub destination_project: EntityId,
    /// When false, orphaned destination records are reported but kept
    pub delete_enabled: bool,
}

impl SyncConfig {
    pub const fn new(source_project: EntityId, destination_project: EntityId) -> Self {
        Self {
            source_project,
            destination_project,
            delete_enabled: false,
        }
    }

    #[must_use]
    pub const fn with_delete(mut self, delete_enabled: bool) -> Self {
        self.delete_enabled = delete_enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.source_project == self.destination_project {
            return Err(Error::config(format!(
                "source and destination projects must differ (both are {})",
                self.source_project
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_config_normalizes_url() {
        let config = ClientConfig::new(" https://acme.testrail.io/ ", "qa@acme.io", "key").unwrap();
        assert_eq!(config.url, "https://acme.testrail.io");
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn client_config_rejects_invalid_values() {
        assert!(ClientConfig::new("", "user", "key").is_err());
        assert!(ClientConfig::new("acme.testrail.io", "user", "key").is_err());
        assert!(ClientConfig::new("https://acme.testrail.io", " ", "key").is_err());
        assert!(ClientConfig::new("https://acme.testrail.io", "user", "  ").is_err());
    }

    #[test]
    fn client_config_redacts_password() {
        let config =
            ClientConfig::new("https://acme.testrail.io", "qa@acme.io", "sensitive-api-key").unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sensitive-api-key"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn sync_config_requires_distinct_projects() {
        assert!(SyncConfig::new(EntityId(1), EntityId(2)).validate().is_ok());
        let error = SyncConfig::new(EntityId(4), EntityId(4))
            .validate()
            .unwrap_err();
        assert!(error.to_string().contains("must differ"));
    }

    #[test]
    fn delete_is_disabled_unless_requested() {
        let config = SyncConfig::new(EntityId(1), EntityId(2));
        assert!(!config.delete_enabled);
        assert!(config.with_delete(true).delete_enabled);
    }
}
