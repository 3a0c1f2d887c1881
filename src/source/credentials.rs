//! Tournament API credentials

use crate::config::ChallongeSettings;
use crate::error::{RankingError, Result};
use std::path::Path;
use tracing::info;

/// Username and API key for the tournament service
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Parse a credential file: first non-blank line is the username, second the key
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
        match (lines.next(), lines.next()) {
            (Some(username), Some(api_key)) => Ok(Self {
                username: username.to_string(),
                api_key: api_key.to_string(),
            }),
            _ => Err(RankingError::CredentialsMissing {
                message: "expected a username line and an API key line".to_string(),
            }
            .into()),
        }
    }

    /// Load from a credential file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| RankingError::CredentialsMissing {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::parse(&text)
    }

    /// Resolve credentials: configured values win, then the credential file
    pub fn resolve(settings: &ChallongeSettings, path: &Path) -> Result<Self> {
        if let (Some(username), Some(api_key)) = (&settings.username, &settings.api_key) {
            if !username.is_empty() && !api_key.is_empty() {
                info!("Using tournament API credentials from configuration");
                return Ok(Self {
                    username: username.clone(),
                    api_key: api_key.clone(),
                });
            }
        }
        Self::load(path)
    }
}
