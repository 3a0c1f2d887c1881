//! Leaderboard generation
//!
//! Derives the rankings and wins tables from the aggregation state and writes
//! them as CSV files.

pub mod render;
pub mod writer;

pub use render::{
    player_summary, render, PlayerSummary, RankingOrder, RankingRow, RenderedReport, WinRow,
};
pub use writer::ReportWriter;
