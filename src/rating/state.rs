//! Aggregated per-player rating state
//!
//! One strongly typed record per player carries the rating, the chronological
//! list of defeated opponents and the attended tournaments, so the three views
//! (scores, wins, tourneys) always share the same key set.

use crate::error::RankingError;
use crate::rating::calculator::RatingCalculator;
use crate::types::{ExtractedTournament, PlayerId, PlayerRating, TournamentId, TournamentInfo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

/// Structural problems found in a stored state
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    #[error("player '{0}' appears more than once")]
    DuplicatePlayer(PlayerId),

    #[error("index holds {keys} keys for {players} players")]
    IndexMismatch { keys: usize, players: usize },

    #[error("player '{0}' is not indexed")]
    UnindexedPlayer(PlayerId),

    #[error("player '{player}' has invalid uncertainty {uncertainty}")]
    InvalidUncertainty { player: PlayerId, uncertainty: f64 },

    #[error("player '{player}' has a win over unknown player '{loser}'")]
    UnknownLoser { player: PlayerId, loser: PlayerId },
}

/// Everything accumulated for a single player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub player_id: PlayerId,
    pub rating: PlayerRating,
    /// Defeated opponents, in the order the wins were recorded
    pub wins: Vec<PlayerId>,
    /// Attended tournaments, in import order
    pub tournaments: Vec<TournamentId>,
}

impl PlayerRecord {
    /// Create a new record for a first-seen player
    pub fn new(player_id: PlayerId, initial_rating: PlayerRating) -> Self {
        Self {
            player_id,
            rating: initial_rating,
            wins: Vec::new(),
            tournaments: Vec::new(),
        }
    }
}

/// Result of folding one tournament into the state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldSummary {
    pub tournament: TournamentId,
    pub players_seen: usize,
    pub new_players: usize,
    pub edges_applied: usize,
}

/// Serialized form; the lookup index is rebuilt on load
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StateSnapshot {
    players: Vec<PlayerRecord>,
    imported_tournaments: Vec<TournamentId>,
    last_updated: Option<DateTime<Utc>>,
}

/// The global mapping player -> (rating, wins, tournaments)
///
/// Players keep the order in which they were first seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StateSnapshot", into = "StateSnapshot")]
pub struct AggregationState {
    players: Vec<PlayerRecord>,
    index: HashMap<PlayerId, usize>,
    imported_tournaments: Vec<TournamentId>,
    last_updated: Option<DateTime<Utc>>,
}

impl TryFrom<StateSnapshot> for AggregationState {
    type Error = StateError;

    fn try_from(snapshot: StateSnapshot) -> Result<Self, Self::Error> {
        let mut state = AggregationState {
            players: Vec::with_capacity(snapshot.players.len()),
            index: HashMap::with_capacity(snapshot.players.len()),
            imported_tournaments: snapshot.imported_tournaments,
            last_updated: snapshot.last_updated,
        };
        for record in snapshot.players {
            if state.index.contains_key(&record.player_id) {
                return Err(StateError::DuplicatePlayer(record.player_id));
            }
            state.index.insert(record.player_id.clone(), state.players.len());
            state.players.push(record);
        }
        Ok(state)
    }
}

impl From<AggregationState> for StateSnapshot {
    fn from(state: AggregationState) -> Self {
        Self {
            players: state.players,
            imported_tournaments: state.imported_tournaments,
            last_updated: state.last_updated,
        }
    }
}

impl AggregationState {
    /// Create an empty state, the starting point of a rebuild
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Look up a player by canonical id
    pub fn player(&self, player_id: &str) -> Option<&PlayerRecord> {
        self.index.get(player_id).map(|&i| &self.players[i])
    }

    /// All players in first-seen order
    pub fn players(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.players.iter()
    }

    /// Tournaments folded into this state, in import order
    pub fn imported_tournaments(&self) -> &[TournamentId] {
        &self.imported_tournaments
    }

    pub fn has_tournament(&self, tournament: &str) -> bool {
        self.imported_tournaments.iter().any(|t| t == tournament)
    }

    /// Find an earlier import of the same tournament under its URL slug or
    /// numeric id
    pub fn imported_as(&self, info: &TournamentInfo) -> Option<&TournamentId> {
        let numeric = info.id.to_string();
        self.imported_tournaments
            .iter()
            .find(|t| **t == info.url || **t == numeric)
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Scores view: player -> rating
    pub fn scores(&self) -> Vec<(&str, PlayerRating)> {
        self.players
            .iter()
            .map(|p| (p.player_id.as_str(), p.rating))
            .collect()
    }

    /// Wins view: player -> defeated opponents
    pub fn wins(&self) -> Vec<(&str, &[PlayerId])> {
        self.players
            .iter()
            .map(|p| (p.player_id.as_str(), p.wins.as_slice()))
            .collect()
    }

    /// Tourneys view: player -> attended tournaments
    pub fn tourneys(&self) -> Vec<(&str, &[TournamentId])> {
        self.players
            .iter()
            .map(|p| (p.player_id.as_str(), p.tournaments.as_slice()))
            .collect()
    }

    /// Verify the structural invariants of the state
    pub fn check_consistency(&self) -> Result<(), StateError> {
        if self.index.len() != self.players.len() {
            return Err(StateError::IndexMismatch {
                keys: self.index.len(),
                players: self.players.len(),
            });
        }

        for (position, record) in self.players.iter().enumerate() {
            if self.index.get(&record.player_id) != Some(&position) {
                return Err(StateError::UnindexedPlayer(record.player_id.clone()));
            }
            if !(record.rating.uncertainty >= 0.0) {
                return Err(StateError::InvalidUncertainty {
                    player: record.player_id.clone(),
                    uncertainty: record.rating.uncertainty,
                });
            }
            if let Some(missing) = record.wins.iter().find(|l| !self.index.contains_key(*l)) {
                return Err(StateError::UnknownLoser {
                    player: record.player_id.clone(),
                    loser: missing.clone(),
                });
            }
        }

        Ok(())
    }

    fn ensure_player(&mut self, player_id: &str, initial_rating: PlayerRating) -> (usize, bool) {
        if let Some(&i) = self.index.get(player_id) {
            return (i, false);
        }
        let i = self.players.len();
        self.players
            .push(PlayerRecord::new(player_id.to_string(), initial_rating));
        self.index.insert(player_id.to_string(), i);
        (i, true)
    }

    /// Fold one tournament's players and edges into the state
    ///
    /// Edges are applied strictly in the given order. A tournament id that was
    /// already folded is rejected with `DuplicateTournament`. On error the state
    /// may be partially updated, so callers must discard it rather than persist.
    pub fn fold_tournament(
        &mut self,
        tournament: &str,
        extracted: &ExtractedTournament,
        calculator: &dyn RatingCalculator,
    ) -> crate::error::Result<FoldSummary> {
        if self.has_tournament(tournament) {
            return Err(RankingError::DuplicateTournament {
                tournament: tournament.to_string(),
            }
            .into());
        }

        let initial_rating = calculator.get_initial_rating();
        let mut new_players = 0;

        // Edge endpoints are normally participants too; register them anyway
        let endpoints = extracted
            .edges
            .iter()
            .flat_map(|edge| [&edge.winner, &edge.loser]);
        let mut attended: Vec<usize> = Vec::with_capacity(extracted.players.len());
        for player_id in extracted.players.iter().chain(endpoints) {
            let (i, created) = self.ensure_player(player_id, initial_rating);
            if created {
                new_players += 1;
                debug!("New player '{}' in tournament '{}'", player_id, tournament);
            }
            if !attended.contains(&i) {
                attended.push(i);
            }
        }
        for &i in &attended {
            self.players[i].tournaments.push(tournament.to_string());
        }

        for edge in &extracted.edges {
            let winner = self.index[&edge.winner];
            let loser = self.index[&edge.loser];

            let (new_winner, new_loser) =
                calculator.rate_win(&self.players[winner].rating, &self.players[loser].rating)?;

            self.players[winner].wins.push(edge.loser.clone());
            self.players[winner].rating = new_winner;
            self.players[loser].rating = new_loser;
        }

        self.imported_tournaments.push(tournament.to_string());
        self.last_updated = Some(Utc::now());

        let summary = FoldSummary {
            tournament: tournament.to_string(),
            players_seen: attended.len(),
            new_players,
            edges_applied: extracted.edges.len(),
        };
        info!(
            "Folded tournament '{}': {} players ({} new), {} edges",
            tournament, summary.players_seen, summary.new_players, summary.edges_applied
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::calculator::MockRatingCalculator;
    use crate::rating::trueskill::{TrueSkillRatingCalculator, TrueSkillSettings};
    use crate::types::MatchEdge;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn extracted(players: &[&str], edges: &[(&str, &str)]) -> ExtractedTournament {
        ExtractedTournament {
            players: players.iter().map(|p| p.to_string()).collect(),
            edges: edges.iter().map(|(w, l)| MatchEdge::new(*w, *l)).collect(),
        }
    }

    fn trueskill() -> TrueSkillRatingCalculator {
        TrueSkillRatingCalculator::new(TrueSkillSettings::default()).unwrap()
    }

    fn key_sets(state: &AggregationState) -> (BTreeSet<&str>, BTreeSet<&str>, BTreeSet<&str>) {
        (
            state.scores().into_iter().map(|(k, _)| k).collect(),
            state.wins().into_iter().map(|(k, _)| k).collect(),
            state.tourneys().into_iter().map(|(k, _)| k).collect(),
        )
    }

    #[test]
    fn test_fold_single_win() {
        let mut state = AggregationState::new();
        let calculator = trueskill();
        let prior = calculator.get_initial_rating();

        let summary = state
            .fold_tournament("weekly-1", &extracted(&["A", "B"], &[("A", "B")]), &calculator)
            .unwrap();

        assert_eq!(summary.players_seen, 2);
        assert_eq!(summary.new_players, 2);
        assert_eq!(summary.edges_applied, 1);

        let a = state.player("A").unwrap();
        let b = state.player("B").unwrap();
        assert!(a.rating.rating > prior.rating);
        assert!(a.rating.uncertainty < prior.uncertainty);
        assert!(b.rating.rating < prior.rating);
        assert!(b.rating.uncertainty < prior.uncertainty);
        assert!(a.rating.conservative_score() > b.rating.conservative_score());
        assert_eq!(a.wins, vec!["B".to_string()]);
        assert!(b.wins.is_empty());
        assert_eq!(a.tournaments, vec!["weekly-1".to_string()]);
        assert_eq!(state.imported_tournaments(), ["weekly-1".to_string()]);
        assert!(state.last_updated().is_some());
    }

    #[test]
    fn test_players_without_matches_get_prior_and_attendance() {
        let mut state = AggregationState::new();
        let calculator = trueskill();

        state
            .fold_tournament("weekly-1", &extracted(&["A", "B", "C"], &[("A", "B")]), &calculator)
            .unwrap();

        let c = state.player("C").unwrap();
        assert_eq!(c.rating, calculator.get_initial_rating());
        assert_eq!(c.tournaments.len(), 1);
        assert!(c.wins.is_empty());
    }

    #[test]
    fn test_duplicate_tournament_rejected() {
        let mut state = AggregationState::new();
        let calculator = MockRatingCalculator::default();
        let data = extracted(&["A", "B"], &[("A", "B")]);

        state.fold_tournament("weekly-1", &data, &calculator).unwrap();
        let before = state.clone();

        let err = state
            .fold_tournament("weekly-1", &data, &calculator)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RankingError>(),
            Some(RankingError::DuplicateTournament { .. })
        ));
        assert_eq!(state, before);
        assert_eq!(calculator.get_calls().len(), 1);
    }

    #[test]
    fn test_edges_applied_in_order() {
        let mut state = AggregationState::new();
        let calculator = MockRatingCalculator::new(1.0);

        state
            .fold_tournament(
                "weekly-1",
                &extracted(&["A", "B", "C"], &[("A", "B"), ("C", "A"), ("A", "C")]),
                &calculator,
            )
            .unwrap();

        let calls = calculator.get_calls();
        assert_eq!(calls.len(), 3);
        // Second call sees A after its first win, third after its loss
        assert_eq!(calls[1].1.rating, 26.0);
        assert_eq!(calls[2].0.rating, 25.0);
        assert_eq!(
            state.player("A").unwrap().wins,
            vec!["B".to_string(), "C".to_string()]
        );
    }

    #[test]
    fn test_order_sensitivity() {
        let calculator = trueskill();
        let mut forward = AggregationState::new();
        let mut reverse = AggregationState::new();

        forward
            .fold_tournament("t", &extracted(&["A", "B"], &[("A", "B"), ("B", "A")]), &calculator)
            .unwrap();
        reverse
            .fold_tournament("t", &extracted(&["A", "B"], &[("B", "A"), ("A", "B")]), &calculator)
            .unwrap();

        assert_ne!(
            forward.player("A").unwrap().rating,
            reverse.player("A").unwrap().rating
        );
    }

    #[test]
    fn test_alias_collision_attendance_recorded_once() {
        let mut state = AggregationState::new();
        let calculator = MockRatingCalculator::default();

        state
            .fold_tournament("weekly-1", &extracted(&["A", "A", "B"], &[]), &calculator)
            .unwrap();

        assert_eq!(state.player("A").unwrap().tournaments.len(), 1);
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut state = AggregationState::new();
        let calculator = MockRatingCalculator::default();

        state
            .fold_tournament("t1", &extracted(&["Zed", "Amy"], &[]), &calculator)
            .unwrap();
        state
            .fold_tournament("t2", &extracted(&["Bob", "Amy"], &[]), &calculator)
            .unwrap();

        let order: Vec<&str> = state.players().map(|p| p.player_id.as_str()).collect();
        assert_eq!(order, vec!["Zed", "Amy", "Bob"]);
    }

    #[test]
    fn test_serde_round_trip_rebuilds_index() {
        let mut state = AggregationState::new();
        state
            .fold_tournament("t1", &extracted(&["A", "B"], &[("A", "B")]), &trueskill())
            .unwrap();

        let json = serde_json::to_string(&state).unwrap();
        let restored: AggregationState = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, state);
        assert!(restored.player("B").is_some());
        assert!(restored.check_consistency().is_ok());
    }

    #[test]
    fn test_consistency_flags_negative_uncertainty() {
        let json = r#"{
            "players": [{"player_id": "A", "rating": {"rating": 25.0, "uncertainty": -1.0}, "wins": [], "tournaments": []}],
            "imported_tournaments": [],
            "last_updated": null
        }"#;
        let state: AggregationState = serde_json::from_str(json).unwrap();
        assert!(matches!(
            state.check_consistency(),
            Err(StateError::InvalidUncertainty { .. })
        ));
    }

    #[test]
    fn test_imported_as_matches_slug_or_numeric_id() {
        let mut state = AggregationState::new();
        state
            .fold_tournament("weekly-1", &extracted(&["A"], &[]), &MockRatingCalculator::default())
            .unwrap();
        state
            .fold_tournament("4243", &extracted(&["A"], &[]), &MockRatingCalculator::default())
            .unwrap();

        let info = |id: u64, url: &str| TournamentInfo {
            id,
            name: "Weekly".to_string(),
            url: url.to_string(),
            state: None,
        };
        assert_eq!(
            state.imported_as(&info(4242, "weekly-1")).map(String::as_str),
            Some("weekly-1")
        );
        assert_eq!(
            state.imported_as(&info(4243, "weekly-2")).map(String::as_str),
            Some("4243")
        );
        assert!(state.imported_as(&info(4244, "weekly-3")).is_none());
    }

    #[test]
    fn test_duplicate_player_records_rejected() {
        let json = r#"{
            "players": [
                {"player_id": "A", "rating": {"rating": 25.0, "uncertainty": 8.0}, "wins": [], "tournaments": []},
                {"player_id": "A", "rating": {"rating": 30.0, "uncertainty": 5.0}, "wins": [], "tournaments": []}
            ],
            "imported_tournaments": [],
            "last_updated": null
        }"#;
        let err = serde_json::from_str::<AggregationState>(json).unwrap_err();
        assert!(err.to_string().contains("player 'A' appears more than once"));
    }

    proptest! {
        #[test]
        fn prop_key_sets_equal_after_every_pass(
            tournaments in proptest::collection::vec(
                proptest::collection::vec((0usize..6, 0usize..6), 0..12),
                1..5,
            )
        ) {
            let names = ["A", "B", "C", "D", "E", "F"];
            let calculator = trueskill();
            let mut state = AggregationState::new();

            for (n, edges) in tournaments.iter().enumerate() {
                let edges: Vec<(&str, &str)> = edges
                    .iter()
                    .filter(|(w, l)| w != l)
                    .map(|(w, l)| (names[*w], names[*l]))
                    .collect();
                let data = extracted(&names[..2], &edges);
                state.fold_tournament(&format!("t{}", n), &data, &calculator).unwrap();

                let (scores, wins, tourneys) = key_sets(&state);
                prop_assert_eq!(&scores, &wins);
                prop_assert_eq!(&scores, &tourneys);
                prop_assert!(state.check_consistency().is_ok());
            }
        }

        #[test]
        fn prop_fold_is_deterministic(
            edges in proptest::collection::vec((0usize..4, 0usize..4), 0..20)
        ) {
            let names = ["A", "B", "C", "D"];
            let edges: Vec<(&str, &str)> = edges
                .iter()
                .filter(|(w, l)| w != l)
                .map(|(w, l)| (names[*w], names[*l]))
                .collect();
            let data = extracted(&names, &edges);

            let mut first = AggregationState::new();
            let mut second = AggregationState::new();
            first.fold_tournament("t", &data, &trueskill()).unwrap();
            second.fold_tournament("t", &data, &trueskill()).unwrap();

            for (a, b) in first.players().zip(second.players()) {
                prop_assert_eq!(a.rating.rating.to_bits(), b.rating.rating.to_bits());
                prop_assert_eq!(a.rating.uncertainty.to_bits(), b.rating.uncertainty.to_bits());
            }
        }
    }
}
