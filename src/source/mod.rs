//! Tournament data sources
//!
//! This module wraps the remote tournament service behind a narrow trait,
//! provides the HTTP and in-memory implementations, and extracts
//! alias-resolved win/loss edges from fetched records.

pub mod challonge;
pub mod credentials;
pub mod extractor;
pub mod provider;

// Re-export commonly used types
pub use challonge::ChallongeClient;
pub use credentials::Credentials;
pub use extractor::MatchExtractor;
pub use provider::{StaticTournamentSource, TournamentSource};
