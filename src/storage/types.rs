use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bbstats::{ClientConfig, SessionTokens};

/// Top-level config file (no secrets). Stored as config.toml.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Used by `login` when `--username` is omitted.
    pub default_username: Option<String>,
    #[serde(default)]
    pub client: ClientConfig,
}

/// Session kept between invocations. Stored as session.json with 0600 perms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedSession {
    pub username: String,
    pub tokens: SessionTokens,
    pub saved_at: DateTime<Utc>,
}

impl SavedSession {
    pub fn new(username: impl Into<String>, tokens: SessionTokens) -> Self {
        Self {
            username: username.into(),
            tokens,
            saved_at: Utc::now(),
        }
    }
}
