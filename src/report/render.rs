//! Leaderboard rendering from the aggregation state

use crate::error::RankingError;
use crate::rating::AggregationState;
use crate::types::{PlayerId, PlayerRating, TournamentId};
use serde::{Deserialize, Serialize};

/// Row order of the rankings table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankingOrder {
    /// Order in which players were first seen
    #[default]
    FirstSeen,
    /// Highest conservative score first; ties keep first-seen order
    ScoreDescending,
}

/// One row of `scores.csv`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRow {
    pub player: PlayerId,
    pub tournament_count: usize,
    pub mean: f64,
    pub sigma: f64,
    pub score: f64,
}

/// One row of `wins.csv`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinRow {
    pub player: PlayerId,
    pub win_count: usize,
    /// Every defeated opponent, chronologically, repeats included
    pub losers: Vec<PlayerId>,
}

/// Both tables derived from one state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderedReport {
    pub rankings: Vec<RankingRow>,
    pub wins: Vec<WinRow>,
}

/// Detailed view of one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub player: PlayerId,
    pub rating: PlayerRating,
    pub score: f64,
    /// 1-based position by conservative score
    pub rank: usize,
    pub total_players: usize,
    pub tournaments: Vec<TournamentId>,
    pub wins: Vec<PlayerId>,
    pub losses: Vec<PlayerId>,
}

impl std::fmt::Display for PlayerSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.player)?;
        writeln!(f, "  Rank:        {} of {}", self.rank, self.total_players)?;
        writeln!(f, "  Score:       {:.3}", self.score)?;
        writeln!(
            f,
            "  Rating:      {:.3} (sigma {:.3})",
            self.rating.rating, self.rating.uncertainty
        )?;
        writeln!(f, "  Tournaments: {}", self.tournaments.len())?;
        writeln!(
            f,
            "  Record:      {}-{}",
            self.wins.len(),
            self.losses.len()
        )?;
        if !self.wins.is_empty() {
            writeln!(f, "  Wins over:   {}", self.wins.join(", "))?;
        }
        if !self.losses.is_empty() {
            writeln!(f, "  Losses to:   {}", self.losses.join(", "))?;
        }
        Ok(())
    }
}

/// Build the rankings and wins tables
pub fn render(state: &AggregationState, order: RankingOrder) -> RenderedReport {
    let mut rankings: Vec<RankingRow> = state
        .players()
        .map(|p| RankingRow {
            player: p.player_id.clone(),
            tournament_count: p.tournaments.len(),
            mean: p.rating.rating,
            sigma: p.rating.uncertainty,
            score: p.rating.conservative_score(),
        })
        .collect();

    if order == RankingOrder::ScoreDescending {
        // Stable sort keeps first-seen order among equal scores
        rankings.sort_by(|a, b| b.score.total_cmp(&a.score));
    }

    let wins = state
        .players()
        .map(|p| WinRow {
            player: p.player_id.clone(),
            win_count: p.wins.len(),
            losers: p.wins.clone(),
        })
        .collect();

    RenderedReport { rankings, wins }
}

/// Summarize one canonical player, or `UnknownPlayer`
pub fn player_summary(
    state: &AggregationState,
    player: &str,
) -> crate::error::Result<PlayerSummary> {
    let record = state
        .player(player)
        .ok_or_else(|| RankingError::UnknownPlayer {
            player_id: player.to_string(),
        })?;

    let score = record.rating.conservative_score();
    let rank = 1 + state
        .players()
        .filter(|p| p.rating.conservative_score() > score)
        .count();

    let losses = state
        .players()
        .flat_map(|p| {
            p.wins
                .iter()
                .filter(move |loser| loser.as_str() == player)
                .map(move |_| p.player_id.clone())
        })
        .collect();

    Ok(PlayerSummary {
        player: record.player_id.clone(),
        rating: record.rating,
        score,
        rank,
        total_players: state.len(),
        tournaments: record.tournaments.clone(),
        wins: record.wins.clone(),
        losses,
    })
}
