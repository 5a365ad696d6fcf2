//! Configuration loaded from TOML and the environment.

use crate::PLATFORM_MESSAGE_LIMIT;
use herald_error::{ConfigError, ConfigErrorKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding `discord.token`.
pub const TOKEN_ENV: &str = "DISCORD_TOKEN";

/// Top-level configuration.
///
/// ```toml
/// [discord]
/// token = "..."
/// initial_intents = "default"
/// intents = ["GUILD_MEMBERS", "-GUILD_PRESENCES", 9]
/// message_size_limit = 2000
/// command_prefix = "!"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeraldConfig {
    /// Discord connection settings
    #[serde(default)]
    pub discord: DiscordConfig,
}

impl HeraldConfig {
    /// Load configuration from a TOML file.
    ///
    /// The result is not validated; call [`validate`](Self::validate) after
    /// applying any environment overrides.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::new(ConfigErrorKind::Read {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::new(ConfigErrorKind::Parse(e.to_string())))
    }

    /// Overlay settings from the process environment.
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            self.discord.token = Some(token);
        }
    }

    /// Check the settings the backend cannot start without.
    ///
    /// # Errors
    ///
    /// - missing or blank token
    /// - `message_size_limit` of zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.discord.token()?;
        if self.discord.message_size_limit == Some(0) {
            return Err(ConfigError::new(ConfigErrorKind::InvalidSetting {
                setting: "discord.message_size_limit",
                reason: "must be positive".to_string(),
            }));
        }
        Ok(())
    }

    /// Discord settings.
    pub fn discord(&self) -> &DiscordConfig {
        &self.discord
    }
}

/// Discord connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Bot authentication token
    #[serde(default)]
    pub token: Option<String>,
    /// Intent preset the toggles are applied to
    #[serde(default)]
    pub initial_intents: IntentPreset,
    /// Intent toggles: names (`"-name"` disables) or bit positions (negative disables)
    #[serde(default)]
    pub intents: Vec<IntentToggle>,
    /// Per-message character limit, clamped to the platform cap
    #[serde(default)]
    pub message_size_limit: Option<usize>,
    /// Prefix marking a message as a command
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
}

fn default_command_prefix() -> String {
    "!".to_string()
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: None,
            initial_intents: IntentPreset::default(),
            intents: Vec::new(),
            message_size_limit: None,
            command_prefix: default_command_prefix(),
        }
    }
}

impl DiscordConfig {
    /// Authentication token.
    ///
    /// # Errors
    ///
    /// Returns error if the token is absent or blank.
    pub fn token(&self) -> Result<&str, ConfigError> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ConfigError::new(ConfigErrorKind::MissingToken(TOKEN_ENV)))
    }

    /// Effective per-message character limit.
    pub fn effective_message_size_limit(&self) -> usize {
        self.message_size_limit
            .unwrap_or(PLATFORM_MESSAGE_LIMIT)
            .clamp(1, PLATFORM_MESSAGE_LIMIT)
    }
}

/// Base set of gateway intents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentPreset {
    /// No intents
    None,
    /// All non-privileged intents
    #[default]
    Default,
    /// Every intent, privileged ones included
    All,
}

/// One intent adjustment applied on top of the preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntentToggle {
    /// Bit position; negative clears the bit
    Bit(i64),
    /// Intent name; a leading `-` disables
    Name(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        let config = DiscordConfig {
            message_size_limit: Some(5000),
            ..DiscordConfig::default()
        };
        assert_eq!(config.effective_message_size_limit(), PLATFORM_MESSAGE_LIMIT);
    }

    #[test]
    fn blank_token_is_missing() {
        let config = DiscordConfig {
            token: Some("   ".to_string()),
            ..DiscordConfig::default()
        };
        assert!(config.token().is_err());
    }
}
