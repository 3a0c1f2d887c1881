//! Static alias table mapping raw display names to canonical player ids

use crate::error::{RankingError, Result};
use crate::types::PlayerId;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Separator between raw and canonical name on each line
pub const ALIAS_SEPARATOR: &str = " * ";

/// Raw name -> canonical name lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasTable {
    aliases: HashMap<String, PlayerId>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `raw * canonical` lines; blank lines and `#` comments are skipped
    pub fn parse(text: &str) -> Result<Self> {
        let mut aliases = HashMap::new();

        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (raw, canonical) =
                line.split_once(ALIAS_SEPARATOR)
                    .ok_or_else(|| RankingError::MalformedInput {
                        reason: format!(
                            "alias line {} has no '{}' separator: {:?}",
                            number + 1,
                            ALIAS_SEPARATOR.trim(),
                            line
                        ),
                    })?;
            let (raw, canonical) = (raw.trim(), canonical.trim());
            if raw.is_empty() || canonical.is_empty() {
                return Err(RankingError::MalformedInput {
                    reason: format!("alias line {} has an empty name", number + 1),
                }
                .into());
            }

            if let Some(previous) = aliases.insert(raw.to_string(), canonical.to_string()) {
                debug!(
                    "Alias for '{}' redefined: '{}' -> '{}'",
                    raw, previous, canonical
                );
            }
        }

        Ok(Self { aliases })
    }

    /// Load the alias file; a missing file yields an empty table
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "Alias file {} not found, names will be used as-is",
                    path.display()
                );
                Ok(Self::new())
            }
            Err(e) => Err(RankingError::persistence(path, e).into()),
        }
    }

    /// Add or replace a single alias
    pub fn insert(&mut self, raw: impl Into<String>, canonical: impl Into<PlayerId>) {
        self.aliases.insert(raw.into(), canonical.into());
    }

    /// Canonical id for `raw`, or `raw` itself when it has no alias
    pub fn resolve(&self, raw: &str) -> PlayerId {
        self.aliases
            .get(raw)
            .cloned()
            .unwrap_or_else(|| raw.to_string())
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
