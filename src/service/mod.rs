//! Service layer for bracket-rank
//!
//! This module contains the ranking workflows and the interactive menu that
//! drives them.

pub mod app;
pub mod menu;

pub use app::{ImportOutcome, RankingService, RebuildOutcome};
pub use menu::{InteractiveMenu, MenuChoice, MenuState};
