//! Rating system integration using the TrueSkill algorithm
//!
//! This module provides rating calculations, the aggregated per-player state,
//! storage interfaces, and integration with the skillratings crate.

pub mod calculator;
pub mod state;
pub mod storage;
pub mod trueskill;

// Re-export commonly used types
pub use calculator::RatingCalculator;
pub use state::{AggregationState, FoldSummary, PlayerRecord, StateError};
pub use storage::{InMemoryStateStore, JsonFileStateStore, StateStore};
pub use trueskill::{TrueSkillRatingCalculator, TrueSkillSettings};
