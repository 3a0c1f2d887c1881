//! Known-tournament list used by a full rebuild

use crate::error::{RankingError, Result};
use crate::types::TournamentId;
use std::path::Path;

/// Parse one tournament identifier per line, keeping file order
pub fn parse_tournament_list(text: &str) -> Vec<TournamentId> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Load the known-tournament file
pub fn load_tournament_list(path: &Path) -> Result<Vec<TournamentId>> {
    let text = std::fs::read_to_string(path).map_err(|e| RankingError::persistence(path, e))?;
    Ok(parse_tournament_list(&text))
}
