//! Rating calculator trait and test implementations
//!
//! This module defines the interface the aggregation state uses to fold a
//! single win/loss outcome into two players' ratings.

use crate::types::PlayerRating;

/// Trait for calculating rating changes after a one-versus-one result
pub trait RatingCalculator: Send + Sync {
    /// Apply one observed result and return the updated ratings
    ///
    /// # Arguments
    /// * `winner` - Current rating of the player who won
    /// * `loser` - Current rating of the player who lost
    ///
    /// # Returns
    /// `(winner', loser')`, in that order
    fn rate_win(
        &self,
        winner: &PlayerRating,
        loser: &PlayerRating,
    ) -> crate::error::Result<(PlayerRating, PlayerRating)>;

    /// Probability that `player` beats `opponent`
    fn win_probability(&self, player: &PlayerRating, opponent: &PlayerRating) -> f64;

    /// Get the initial rating for new players
    fn get_initial_rating(&self) -> PlayerRating;

    /// Get current configuration as JSON
    fn config(&self) -> serde_json::Value;
}

/// Mock rating calculator for testing
///
/// Moves the winner up and the loser down by a fixed step and records every call.
#[derive(Debug)]
pub struct MockRatingCalculator {
    calls: std::sync::Mutex<Vec<(PlayerRating, PlayerRating)>>,
    step: f64,
    initial_rating: PlayerRating,
}

impl MockRatingCalculator {
    pub fn new(step: f64) -> Self {
        Self {
            calls: std::sync::Mutex::new(Vec::new()),
            step,
            initial_rating: PlayerRating::default(),
        }
    }

    /// Get all calls made (for testing)
    pub fn get_calls(&self) -> Vec<(PlayerRating, PlayerRating)> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl Default for MockRatingCalculator {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl RatingCalculator for MockRatingCalculator {
    fn rate_win(
        &self,
        winner: &PlayerRating,
        loser: &PlayerRating,
    ) -> crate::error::Result<(PlayerRating, PlayerRating)> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((*winner, *loser));
        }

        Ok((
            PlayerRating {
                rating: winner.rating + self.step,
                uncertainty: winner.uncertainty,
            },
            PlayerRating {
                rating: loser.rating - self.step,
                uncertainty: loser.uncertainty,
            },
        ))
    }

    fn win_probability(&self, player: &PlayerRating, opponent: &PlayerRating) -> f64 {
        if player.rating > opponent.rating {
            1.0
        } else if player.rating < opponent.rating {
            0.0
        } else {
            0.5
        }
    }

    fn get_initial_rating(&self) -> PlayerRating {
        self.initial_rating
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "mock",
            "step": self.step,
        })
    }
}
