//! Test fixtures and mock implementations for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use bracket_rank::error::Result;
use bracket_rank::metrics::MetricsCollector;
use bracket_rank::rating::storage::MockStateStore;
use bracket_rank::rating::{StateStore, TrueSkillRatingCalculator, TrueSkillSettings};
use bracket_rank::report::ReportWriter;
use bracket_rank::service::RankingService;
use bracket_rank::source::{StaticTournamentSource, TournamentSource};
use bracket_rank::types::{MatchRecord, Participant, TournamentData, TournamentInfo};
use mockall::mock;
use std::sync::Arc;
use tempfile::TempDir;

mock! {
    pub Source {}

    #[async_trait]
    impl TournamentSource for Source {
        async fn fetch_tournament(&self, tournament: &str) -> Result<TournamentData>;
    }
}

/// Build tournament data from participant names and (winner, loser) pairs
///
/// Participant ids are 1-based positions in `names`; `None` leaves a match
/// side undecided.
pub fn tournament(
    id: u64,
    url: &str,
    names: &[&str],
    matches: &[(Option<u64>, Option<u64>)],
) -> TournamentData {
    TournamentData {
        tournament: TournamentInfo {
            id,
            name: format!("Tournament {}", url),
            url: url.to_string(),
            state: Some("complete".to_string()),
        },
        participants: names
            .iter()
            .enumerate()
            .map(|(i, name)| Participant {
                id: i as u64 + 1,
                name: name.to_string(),
            })
            .collect(),
        matches: matches
            .iter()
            .enumerate()
            .map(|(i, (winner_id, loser_id))| MatchRecord {
                id: 100 + i as u64,
                winner_id: *winner_id,
                loser_id: *loser_id,
            })
            .collect(),
    }
}

/// Shorthand for fully decided matches
pub fn decided(pairs: &[(u64, u64)]) -> Vec<(Option<u64>, Option<u64>)> {
    pairs.iter().map(|(w, l)| (Some(*w), Some(*l))).collect()
}

/// Two small weeklies with an overlapping roster
pub fn weekly_source() -> StaticTournamentSource {
    let mut source = StaticTournamentSource::new();
    source.add_tournament(
        "weekly-1",
        tournament(
            1,
            "weekly-1",
            &["Alice", "Bob", "Carol"],
            &decided(&[(1, 2), (3, 2), (1, 3)]),
        ),
    );
    source.add_tournament(
        "weekly-2",
        tournament(
            2,
            "weekly-2",
            &["Bob", "Carol", "Dave", "Alice"],
            &decided(&[(1, 3), (2, 4), (1, 2), (4, 1)]),
        ),
    );
    source
}

pub fn known_tournaments() -> Vec<String> {
    vec!["weekly-1".to_string(), "weekly-2".to_string()]
}

/// Service with the production calculator writing reports under `dir`
pub fn create_service<S: TournamentSource, T: StateStore>(
    source: S,
    store: T,
    dir: &TempDir,
) -> RankingService<S, T> {
    let calculator = TrueSkillRatingCalculator::new(TrueSkillSettings::default()).unwrap();
    RankingService::new(
        source,
        store,
        Box::new(calculator),
        ReportWriter::new(dir.path().join("stats")),
        Arc::new(MetricsCollector::new().unwrap()),
    )
    .with_tournaments(known_tournaments())
}

pub fn mock_store() -> MockStateStore {
    MockStateStore::new()
}
