//! Rating system configuration

use crate::rating::trueskill::TrueSkillSettings;
use serde::{Deserialize, Serialize};

/// Rating engine and leaderboard settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// TrueSkill parameters and prior
    pub trueskill: TrueSkillSettings,
    /// Sort the rankings table by conservative score instead of first-seen order
    pub sort_by_score: bool,
}
