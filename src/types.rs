//! Common types used throughout the ranking pipeline

use serde::{Deserialize, Serialize};
use skillratings::trueskill::TrueSkillRating;

/// Canonical identifier for a player (alias-resolved display name)
pub type PlayerId = String;

/// Identifier for a tournament (its url slug on the hosting service)
pub type TournamentId = String;

/// Identifier the hosting service assigns to a participant entry
pub type ParticipantId = u64;

/// Multiplier on sigma in the conservative leaderboard score
pub const CONSERVATIVE_SIGMAS: f64 = 3.0;

/// Rating information for a player: skill mean and its uncertainty (sigma)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerRating {
    pub rating: f64,
    pub uncertainty: f64,
}

impl PlayerRating {
    /// Lower confidence bound used for ranking: `mean - 3 * sigma`
    pub fn conservative_score(&self) -> f64 {
        self.rating - CONSERVATIVE_SIGMAS * self.uncertainty
    }
}

impl Default for PlayerRating {
    fn default() -> Self {
        Self {
            rating: 25.0,
            uncertainty: 25.0 / 3.0,
        }
    }
}

impl From<TrueSkillRating> for PlayerRating {
    fn from(rating: TrueSkillRating) -> Self {
        Self {
            rating: rating.rating,
            uncertainty: rating.uncertainty,
        }
    }
}

impl From<PlayerRating> for TrueSkillRating {
    fn from(rating: PlayerRating) -> Self {
        Self {
            rating: rating.rating,
            uncertainty: rating.uncertainty,
        }
    }
}

/// A single recorded outcome: `winner` beat `loser`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchEdge {
    pub winner: PlayerId,
    pub loser: PlayerId,
}

impl MatchEdge {
    pub fn new(winner: impl Into<PlayerId>, loser: impl Into<PlayerId>) -> Self {
        Self {
            winner: winner.into(),
            loser: loser.into(),
        }
    }
}

/// Tournament metadata as reported by the hosting service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentInfo {
    pub id: u64,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub state: Option<String>,
}

/// One entry in a tournament's participant list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
}

/// One bracket match; `winner_id` is absent for byes and pending matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: u64,
    #[serde(default)]
    pub winner_id: Option<ParticipantId>,
    #[serde(default)]
    pub loser_id: Option<ParticipantId>,
}

/// Everything fetched for one tournament
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentData {
    pub tournament: TournamentInfo,
    pub participants: Vec<Participant>,
    pub matches: Vec<MatchRecord>,
}

/// Canonical players and ordered edges drawn from one tournament
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTournament {
    pub players: Vec<PlayerId>,
    pub edges: Vec<MatchEdge>,
}
