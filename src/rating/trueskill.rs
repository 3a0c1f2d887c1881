//! TrueSkill rating system implementation
//!
//! This module provides the concrete rating calculator, a one-versus-one
//! TrueSkill update from the skillratings crate.

use crate::error::RankingError;
use crate::rating::calculator::RatingCalculator;
use crate::types::PlayerRating;
use serde::{Deserialize, Serialize};
use skillratings::trueskill::{trueskill, TrueSkillConfig, TrueSkillRating};
use skillratings::Outcomes;

/// TrueSkill parameters plus the prior assigned to new players
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrueSkillSettings {
    /// Performance spread: skill difference giving ~76% win chance
    pub beta: f64,
    /// Assumed draw rate; sets the draw margin
    pub draw_probability: f64,
    /// Additive dynamics factor (tau) applied before each update.
    /// Any value above zero lets uncertainty grow for well-known players.
    pub dynamics: f64,
    /// Initial rating for new players
    pub initial_rating: f64,
    /// Initial uncertainty for new players
    pub initial_uncertainty: f64,
}

impl Default for TrueSkillSettings {
    fn default() -> Self {
        Self {
            beta: 25.0 / 6.0,
            draw_probability: 0.1,
            dynamics: 0.0,
            initial_rating: 25.0,
            initial_uncertainty: 25.0 / 3.0,
        }
    }
}

impl TrueSkillSettings {
    /// Validate configuration parameters
    pub fn validate(&self) -> crate::error::Result<()> {
        if !(self.beta > 0.0) {
            return Err(RankingError::ConfigurationError {
                message: "Beta must be positive".to_string(),
            }
            .into());
        }

        if !(0.0..1.0).contains(&self.draw_probability) {
            return Err(RankingError::ConfigurationError {
                message: "Draw probability must be in [0, 1)".to_string(),
            }
            .into());
        }

        if self.dynamics < 0.0 {
            return Err(RankingError::ConfigurationError {
                message: "Dynamics must be non-negative".to_string(),
            }
            .into());
        }

        if !(self.initial_uncertainty > 0.0) {
            return Err(RankingError::ConfigurationError {
                message: "Initial uncertainty must be positive".to_string(),
            }
            .into());
        }

        Ok(())
    }

    fn library_config(&self) -> TrueSkillConfig {
        TrueSkillConfig {
            draw_probability: self.draw_probability,
            beta: self.beta,
            default_dynamics: self.dynamics,
        }
    }
}

/// TrueSkill rating calculator implementation
#[derive(Debug)]
pub struct TrueSkillRatingCalculator {
    settings: TrueSkillSettings,
    config: TrueSkillConfig,
}

impl TrueSkillRatingCalculator {
    /// Create a new TrueSkill rating calculator
    pub fn new(settings: TrueSkillSettings) -> crate::error::Result<Self> {
        settings.validate()?;

        let config = settings.library_config();
        Ok(Self { settings, config })
    }

    pub fn settings(&self) -> &TrueSkillSettings {
        &self.settings
    }
}

impl RatingCalculator for TrueSkillRatingCalculator {
    fn rate_win(
        &self,
        winner: &PlayerRating,
        loser: &PlayerRating,
    ) -> crate::error::Result<(PlayerRating, PlayerRating)> {
        for rating in [winner, loser] {
            if !rating.rating.is_finite() || !rating.uncertainty.is_finite() || rating.uncertainty < 0.0 {
                return Err(RankingError::RatingCalculationFailed {
                    reason: format!(
                        "invalid input rating (mean {}, sigma {})",
                        rating.rating, rating.uncertainty
                    ),
                }
                .into());
            }
        }

        let winner_trueskill: TrueSkillRating = (*winner).into();
        let loser_trueskill: TrueSkillRating = (*loser).into();

        let (new_winner, new_loser) = trueskill(
            &winner_trueskill,
            &loser_trueskill,
            &Outcomes::WIN,
            &self.config,
        );

        Ok((new_winner.into(), new_loser.into()))
    }

    fn win_probability(&self, player: &PlayerRating, opponent: &PlayerRating) -> f64 {
        let (expected_player, _expected_opponent) = skillratings::trueskill::expected_score(
            &TrueSkillRating::from(*player),
            &TrueSkillRating::from(*opponent),
            &self.config,
        );
        expected_player
    }

    fn get_initial_rating(&self) -> PlayerRating {
        PlayerRating {
            rating: self.settings.initial_rating,
            uncertainty: self.settings.initial_uncertainty,
        }
    }

    fn config(&self) -> serde_json::Value {
        serde_json::to_value(&self.settings).unwrap_or(serde_json::Value::Null)
    }
}
