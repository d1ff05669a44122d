//! Settings resolution: command-line flags, then environment, then config file.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use railsync_core::config::{DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS};
use railsync_core::util::normalize_text_option;
use railsync_core::{ClientConfig, EntityId, SyncConfig};
use serde::{Deserialize, Serialize};

use crate::error::CliError;

const CONFIG_DIR_NAME: &str = "railsync";
const CONFIG_FILE_NAME: &str = "config.json";
const ENV_PREFIX: &str = "RAILSYNC_";

pub const ENV_URL: &str = "RAILSYNC_URL";
pub const ENV_USERNAME: &str = "RAILSYNC_USERNAME";
pub const ENV_PASSWORD: &str = "RAILSYNC_PASSWORD";
pub const ENV_SOURCE: &str = "RAILSYNC_SOURCE";
pub const ENV_DESTINATION: &str = "RAILSYNC_DESTINATION";
pub const ENV_DELETE: &str = "RAILSYNC_DELETE";
pub const ENV_LOG: &str = "RAILSYNC_LOG";
pub const ENV_TIMEOUT_SECS: &str = "RAILSYNC_TIMEOUT_SECS";
pub const ENV_MAX_RETRIES: &str = "RAILSYNC_MAX_RETRIES";

/// One layer of settings; the JSON config file has exactly this shape
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
}

pub fn default_config_path() -> Result<PathBuf, CliError> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or_else(|| CliError::Config("Failed to resolve the config directory".to_string()))
}

impl FileConfig {
    pub fn load_from_path(path: &Path) -> Result<Self, CliError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|error| {
            CliError::Config(format!("Failed to read config at {}: {error}", path.display()))
        })?;
        let mut config = serde_json::from_str::<Self>(&raw).map_err(|error| {
            CliError::Config(format!("Failed to parse config at {}: {error}", path.display()))
        })?;
        config.normalize();
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), CliError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        std::fs::write(path, serde_json::to_string_pretty(&normalized)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    pub fn from_env() -> Result<Self, CliError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CliError> {
        Ok(Self {
            url: trimmed(&lookup, ENV_URL),
            username: trimmed(&lookup, ENV_USERNAME),
            password: lookup(ENV_PASSWORD).filter(|value| !value.trim().is_empty()),
            source: parsed(&lookup, ENV_SOURCE)?,
            destination: parsed(&lookup, ENV_DESTINATION)?,
            delete: trimmed(&lookup, ENV_DELETE)
                .map(|raw| parse_bool(ENV_DELETE, &raw))
                .transpose()?,
            log: trimmed(&lookup, ENV_LOG).map(PathBuf::from),
            timeout_secs: parsed(&lookup, ENV_TIMEOUT_SECS)?,
            max_retries: parsed(&lookup, ENV_MAX_RETRIES)?,
        })
    }

    /// Values set in `other` replace ours
    pub fn overlay(&mut self, other: Self) {
        prefer(&mut self.url, other.url);
        prefer(&mut self.username, other.username);
        prefer(&mut self.password, other.password);
        prefer(&mut self.source, other.source);
        prefer(&mut self.destination, other.destination);
        prefer(&mut self.delete, other.delete);
        prefer(&mut self.log, other.log);
        prefer(&mut self.timeout_secs, other.timeout_secs);
        prefer(&mut self.max_retries, other.max_retries);
    }

    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            password: self.password.as_ref().map(|_| "[REDACTED]".to_string()),
            ..self.clone()
        }
    }

    fn normalize(&mut self) {
        self.url = normalize_text_option(self.url.take());
        self.username = normalize_text_option(self.username.take());
        self.password = self.password.take().filter(|value| !value.trim().is_empty());
    }
}

/// Everything a sync run needs, validated
#[derive(Debug, Clone)]
pub struct Settings {
    pub client: ClientConfig,
    pub sync: SyncConfig,
    pub log: Option<PathBuf>,
}

impl Settings {
    /// Config file, overlaid by environment, overlaid by `flags`
    pub fn load(config_path: &Path, flags: FileConfig) -> Result<Self, CliError> {
        let mut merged = FileConfig::load_from_path(config_path)?;
        merged.overlay(FileConfig::from_env()?);
        merged.overlay(flags);
        Self::from_config(merged)
    }

    pub fn from_config(config: FileConfig) -> Result<Self, CliError> {
        let url = required(config.url, "url")?;
        let username = required(config.username, "username")?;
        let password = required(config.password, "password")?;
        let source = required(config.source, "source")?;
        let destination = required(config.destination, "destination")?;

        let client = ClientConfig::new(url, username, password)?
            .with_timeout(Duration::from_secs(
                config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ))
            .with_max_retries(config.max_retries.unwrap_or(DEFAULT_MAX_RETRIES));
        let sync = SyncConfig::new(EntityId(source), EntityId(destination))
            .with_delete(config.delete.unwrap_or(false));
        sync.validate()?;

        Ok(Self {
            client,
            sync,
            log: config.log,
        })
    }
}

fn required<T>(value: Option<T>, key: &str) -> Result<T, CliError> {
    value.ok_or_else(|| {
        CliError::Config(format!(
            "missing required setting `{key}` (pass --{key}, set {ENV_PREFIX}{}, or add it to the config file)",
            key.to_uppercase()
        ))
    })
}

fn prefer<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn trimmed(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    normalize_text_option(lookup(name))
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, CliError> {
    trimmed(lookup, name)
        .map(|raw| {
            raw.parse::<T>().map_err(|_| {
                CliError::Config(format!("{name} must be a non-negative integer, got `{raw}`"))
            })
        })
        .transpose()
}

pub fn parse_bool(name: &str, raw: &str) -> Result<bool, CliError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CliError::Config(format!(
            "{name} must be true or false, got `{raw}`"
        ))),
    }
}
