use serde::Deserialize;
use std::path::Path;

use crate::error::BotError;

/// Canned texts returned for the recognised commands
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct DescriptionConfig {
    pub start: String,
    pub about: String,
    pub feedback: String,
    pub ad: String,
    pub suggest: String,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct WebhookConfig {
    /// Public base URL including the scheme, e.g. `https://bot.example.com`
    pub host: String,
    pub port: String,
    pub listen: String,
    #[serde(rename = "certificate")]
    pub cert: String,
    #[serde(rename = "private_ssl_key")]
    pub private_key: String,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct LinksConfig {
    #[serde(rename = "ads")]
    pub ad: String,
    #[serde(rename = "web")]
    pub website: String,
    pub medium: String,
    pub vk: String,
}

/// SOCKS5 proxy credentials. An empty `url` means "connect directly".
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ProxyConfig {
    pub url: String,
    pub login: String,
    pub port: String,
    pub password: String,
}

impl ProxyConfig {
    pub fn is_enabled(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub description: DescriptionConfig,
    pub webhook: WebhookConfig,
    pub links: LinksConfig,
    pub proxy: ProxyConfig,
    pub token: String,
    pub group_id: i64,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, BotError> {
        let content = std::fs::read_to_string(path).map_err(|source| BotError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse a configuration document. Absent keys keep their zero values.
    pub fn from_json(content: &str) -> Result<Self, BotError> {
        Ok(serde_json::from_str(content)?)
    }
}
