//! Bracket Rank - TrueSkill leaderboards from tournament brackets
//!
//! This crate fetches completed brackets from a tournament service, folds
//! their match results into a persisted per-player rating state, and writes
//! CSV leaderboards.

pub mod config;
pub mod error;
pub mod metrics;
pub mod rating;
pub mod report;
pub mod roster;
pub mod service;
pub mod source;
pub mod types;

// Re-export commonly used types and traits
pub use error::{RankingError, Result};
pub use types::*;

// Re-export key components
pub use rating::{AggregationState, StateStore};
pub use service::RankingService;
pub use source::{StaticTournamentSource, TournamentSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
