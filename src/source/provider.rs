//! Tournament source interface and in-memory implementation
//!
//! This module defines the narrow, strongly typed interface to the remote
//! tournament service, along with a static source for tests and offline runs.

use crate::error::{RankingError, Result};
use crate::types::{TournamentData, TournamentId};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::RwLock;
use tracing::debug;

/// Trait for fetching one tournament's metadata, participants and matches
#[async_trait]
pub trait TournamentSource: Send + Sync {
    /// Fetch everything known about `tournament`
    ///
    /// Any failure is reported as `RankingError::FetchFailure`.
    async fn fetch_tournament(&self, tournament: &str) -> Result<TournamentData>;
}

/// Static tournament source backed by a map of prepared tournaments
#[derive(Debug, Default)]
pub struct StaticTournamentSource {
    tournaments: HashMap<TournamentId, TournamentData>,
    failing: RwLock<HashSet<TournamentId>>,
    fetch_log: RwLock<Vec<TournamentId>>,
}

impl StaticTournamentSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from prepared tournaments
    pub fn with_tournaments(tournaments: HashMap<TournamentId, TournamentData>) -> Self {
        Self {
            tournaments,
            ..Self::default()
        }
    }

    /// Load a JSON object mapping tournament id -> tournament data
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read(path).map_err(|e| RankingError::persistence(path, e))?;
        let tournaments: HashMap<TournamentId, TournamentData> = serde_json::from_slice(&raw)
            .map_err(|e| RankingError::MalformedInput {
                reason: format!("invalid fixture file {}: {}", path.display(), e),
            })?;
        Ok(Self::with_tournaments(tournaments))
    }

    /// Add or replace a tournament
    pub fn add_tournament(&mut self, tournament: impl Into<TournamentId>, data: TournamentData) {
        self.tournaments.insert(tournament.into(), data);
    }

    /// Make fetches of `tournament` fail (for testing)
    pub fn fail_tournament(&self, tournament: &str) {
        if let Ok(mut failing) = self.failing.write() {
            failing.insert(tournament.to_string());
        }
    }

    /// Get every fetch made, in order (for testing)
    pub fn get_fetch_log(&self) -> Vec<TournamentId> {
        self.fetch_log
            .read()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TournamentSource for StaticTournamentSource {
    async fn fetch_tournament(&self, tournament: &str) -> Result<TournamentData> {
        if let Ok(mut log) = self.fetch_log.write() {
            log.push(tournament.to_string());
        }

        let failing = self
            .failing
            .read()
            .map(|f| f.contains(tournament))
            .unwrap_or(false);
        if failing {
            return Err(RankingError::fetch(tournament, "simulated failure").into());
        }

        debug!("Serving tournament '{}' from static source", tournament);
        self.tournaments
            .get(tournament)
            .cloned()
            .ok_or_else(|| RankingError::fetch(tournament, "tournament not found").into())
    }
}
