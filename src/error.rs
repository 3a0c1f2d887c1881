//! Error types for the ranking pipeline
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application. Callers that need to branch on a specific failure
//! use `downcast_ref::<RankingError>()`.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific ranking scenarios
#[derive(Debug, thiserror::Error)]
pub enum RankingError {
    #[error("Tournament API credentials missing: {message}")]
    CredentialsMissing { message: String },

    #[error("Failed to fetch tournament '{tournament}': {reason}")]
    FetchFailure { tournament: String, reason: String },

    #[error("Invalid data for tournament '{tournament}': {reason}")]
    InvalidTournamentData { tournament: String, reason: String },

    #[error("Player not found: {player_id}")]
    UnknownPlayer { player_id: String },

    #[error("Malformed input: {reason}")]
    MalformedInput { reason: String },

    #[error("Tournament already imported: {tournament}")]
    DuplicateTournament { tournament: String },

    #[error("Persistence failure at {path}: {reason}")]
    PersistenceFailure { path: String, reason: String },

    #[error("Rating calculation failed: {reason}")]
    RatingCalculationFailed { reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },
}

impl RankingError {
    /// Shorthand for a fetch failure on the given tournament
    pub fn fetch(tournament: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::FetchFailure {
            tournament: tournament.into(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for a persistence failure on the given path
    pub fn persistence(path: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        Self::PersistenceFailure {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Returns the ranking error carried by `err`, if any
pub fn ranking_error(err: &anyhow::Error) -> Option<&RankingError> {
    err.downcast_ref::<RankingError>()
}
