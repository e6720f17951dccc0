//! Config schema types.

use std::{path::PathBuf, time::Duration};

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

use crate::{ConfigError, Result};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CourierConfig {
    pub telegram: TelegramConfig,
    pub store: StoreConfig,
    pub pairing: PairingConfig,
    pub relay: RelayConfig,
}

impl CourierConfig {
    /// Check the values that would make the bot misbehave at runtime.
    /// The token is checked separately by [`TelegramConfig::require_token`].
    pub fn validate(&self) -> Result<()> {
        if self.pairing.ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "pairing.ttl_secs must be greater than 0".into(),
            ));
        }
        if self.relay.tag.trim().is_empty() {
            return Err(ConfigError::Invalid("relay.tag must not be empty".into()));
        }
        if self.telegram.poll_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "telegram.poll_timeout_secs must be greater than 0".into(),
            ));
        }
        let prefix = self.telegram.auto_claim_prefix.trim();
        if prefix.is_empty() || prefix.starts_with('/') {
            return Err(ConfigError::Invalid(
                "telegram.auto_claim_prefix must be non-empty and must not start with '/'".into(),
            ));
        }
        Ok(())
    }
}

/// Telegram bot settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Text prefix a channel post uses to claim a pending link.
    pub auto_claim_prefix: String,

    /// Long-poll timeout for `getUpdates`, in seconds.
    pub poll_timeout_secs: u32,
}

impl TelegramConfig {
    pub fn has_token(&self) -> bool {
        !self.token.expose_secret().trim().is_empty()
    }

    /// The token, or [`ConfigError::MissingToken`] when it is blank.
    pub fn require_token(&self) -> Result<&Secret<String>> {
        if self.has_token() {
            Ok(&self.token)
        } else {
            Err(ConfigError::MissingToken)
        }
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("auto_claim_prefix", &self.auto_claim_prefix)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            auto_claim_prefix: "!request_channel".into(),
            poll_timeout_secs: 30,
        }
    }
}

/// Where the link document lives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the JSON document. Defaults to `<data dir>/request_data.json`.
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    pub const FILE_NAME: &str = "request_data.json";

    #[must_use]
    pub fn resolve(&self, data_dir: &std::path::Path) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| data_dir.join(Self::FILE_NAME))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
    /// Seconds a first half waits for its peer. Defaults to one hour.
    pub ttl_secs: u64,
}

impl PairingConfig {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self { ttl_secs: 3600 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Marker that flags a message as a request (matched case-insensitively).
    pub tag: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self { tag: "#req".into() }
    }
}
