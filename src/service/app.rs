//! Ranking workflows and service coordination
//!
//! This module contains the `RankingService` that ties a tournament source,
//! the state store, the rating calculator and the report writer together
//! into the add-one, rebuild and player lookup workflows.

use crate::config::AppConfig;
use crate::error::{ranking_error, RankingError, Result};
use crate::metrics::{MetricsCollector, Workflow};
use crate::rating::{
    AggregationState, FoldSummary, RatingCalculator, StateStore, TrueSkillRatingCalculator,
};
use crate::report::{player_summary, render, PlayerSummary, RankingOrder, RenderedReport, ReportWriter};
use crate::roster::{load_tournament_list, AliasTable};
use crate::source::{MatchExtractor, TournamentSource};
use crate::types::{ExtractedTournament, TournamentId, TournamentInfo};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Result of importing a single tournament
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub summary: FoldSummary,
    pub total_players: usize,
    pub report: RenderedReport,
}

/// Result of re-aggregating every known tournament
#[derive(Debug, Clone)]
pub struct RebuildOutcome {
    /// One summary per folded tournament, in list order
    pub tournaments: Vec<FoldSummary>,
    pub total_players: usize,
    pub report: RenderedReport,
}

/// Coordinates fetching, folding, persisting and reporting
pub struct RankingService<S: TournamentSource, T: StateStore> {
    source: S,
    store: T,
    extractor: MatchExtractor,
    tournaments: Vec<TournamentId>,
    calculator: Box<dyn RatingCalculator>,
    writer: ReportWriter,
    order: RankingOrder,
    metrics: Arc<MetricsCollector>,
}

impl<S: TournamentSource, T: StateStore> RankingService<S, T> {
    /// Create a service with an empty alias table and tournament list
    pub fn new(
        source: S,
        store: T,
        calculator: Box<dyn RatingCalculator>,
        writer: ReportWriter,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            source,
            store,
            extractor: MatchExtractor::default(),
            tournaments: Vec::new(),
            calculator,
            writer,
            order: RankingOrder::default(),
            metrics,
        }
    }

    /// Build a service from configuration, loading aliases and the known
    /// tournament list from disk
    pub fn from_config(
        config: &AppConfig,
        source: S,
        store: T,
        metrics: Arc<MetricsCollector>,
    ) -> Result<Self> {
        let calculator = TrueSkillRatingCalculator::new(config.rating.trueskill.clone())?;
        let aliases = AliasTable::load(&config.paths.alias_file)?;

        let tournaments = if config.paths.tournaments_file.exists() {
            load_tournament_list(&config.paths.tournaments_file)?
        } else {
            warn!(
                "Tournament list {} not found, rebuild has nothing to replay",
                config.paths.tournaments_file.display()
            );
            Vec::new()
        };

        let order = if config.rating.sort_by_score {
            RankingOrder::ScoreDescending
        } else {
            RankingOrder::FirstSeen
        };

        info!(
            "Ranking service ready: {} aliases, {} known tournaments, order {:?}",
            aliases.len(),
            tournaments.len(),
            order
        );

        Ok(Self::new(
            source,
            store,
            Box::new(calculator),
            ReportWriter::new(&config.paths.stats_dir),
            metrics,
        )
        .with_aliases(aliases)
        .with_tournaments(tournaments)
        .with_order(order))
    }

    pub fn with_aliases(mut self, aliases: AliasTable) -> Self {
        self.extractor = MatchExtractor::new(aliases);
        self
    }

    pub fn with_tournaments(mut self, tournaments: Vec<TournamentId>) -> Self {
        self.tournaments = tournaments;
        self
    }

    pub fn with_order(mut self, order: RankingOrder) -> Self {
        self.order = order;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn store(&self) -> &T {
        &self.store
    }

    pub fn writer(&self) -> &ReportWriter {
        &self.writer
    }

    pub fn tournaments(&self) -> &[TournamentId] {
        &self.tournaments
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    /// Fold one new tournament into the persisted state
    pub async fn add_tournament(&self, tournament: &str) -> Result<ImportOutcome> {
        let timer = self.metrics.start_timer();
        let result = self.run_add(tournament.trim()).await;
        self.metrics
            .record_workflow(Workflow::AddTournament, result.is_ok(), timer.stop());
        result
    }

    async fn run_add(&self, tournament: &str) -> Result<ImportOutcome> {
        if tournament.is_empty() {
            return Err(RankingError::MalformedInput {
                reason: "tournament identifier is empty".to_string(),
            }
            .into());
        }

        info!("Adding tournament '{}'", tournament);

        let mut state = match self.store.load()? {
            Some(state) => state,
            None => {
                info!("No saved state found, starting from an empty state");
                AggregationState::new()
            }
        };

        if state.has_tournament(tournament) {
            self.metrics.record_duplicate_import();
            warn!("Tournament '{}' was already imported", tournament);
            return Err(RankingError::DuplicateTournament {
                tournament: tournament.to_string(),
            }
            .into());
        }

        let (info, extracted) = self.fetch(tournament).await?;
        if let Some(previous) = state.imported_as(&info) {
            self.metrics.record_duplicate_import();
            warn!(
                "Tournament '{}' was already imported as '{}'",
                tournament, previous
            );
            return Err(RankingError::DuplicateTournament {
                tournament: tournament.to_string(),
            }
            .into());
        }

        let summary = self.fold(&mut state, tournament, &extracted, Workflow::AddTournament)?;
        let report = self.commit(&state)?;

        info!(
            "Tournament '{}' added: {} edges applied, {} new players, {} players total",
            tournament,
            summary.edges_applied,
            summary.new_players,
            state.len()
        );

        Ok(ImportOutcome {
            summary,
            total_players: state.len(),
            report,
        })
    }

    /// Recompute the state from scratch over every known tournament
    ///
    /// Nothing is saved unless every tournament was fetched and folded.
    pub async fn rebuild_all(&self) -> Result<RebuildOutcome> {
        let timer = self.metrics.start_timer();
        let result = self.run_rebuild().await;
        self.metrics
            .record_workflow(Workflow::RebuildAll, result.is_ok(), timer.stop());
        result
    }

    async fn run_rebuild(&self) -> Result<RebuildOutcome> {
        if self.tournaments.is_empty() {
            return Err(RankingError::ConfigurationError {
                message: "no known tournaments to rebuild from".to_string(),
            }
            .into());
        }

        info!("Rebuilding state from {} tournaments", self.tournaments.len());

        let mut state = AggregationState::new();
        let mut summaries = Vec::with_capacity(self.tournaments.len());

        for tournament in &self.tournaments {
            if state.has_tournament(tournament) {
                warn!("Tournament '{}' is listed twice, skipping repeat", tournament);
                continue;
            }

            let (info, extracted) = self.fetch(tournament).await.map_err(|e| {
                error!("Rebuild aborted at '{}', nothing saved", tournament);
                e
            })?;
            if let Some(previous) = state.imported_as(&info) {
                warn!(
                    "Tournament '{}' is listed again as '{}', skipping repeat",
                    previous, tournament
                );
                continue;
            }
            summaries.push(self.fold(&mut state, tournament, &extracted, Workflow::RebuildAll)?);
        }

        let report = self.commit(&state)?;

        info!(
            "Rebuild complete: {} tournaments, {} players",
            summaries.len(),
            state.len()
        );

        Ok(RebuildOutcome {
            tournaments: summaries,
            total_players: state.len(),
            report,
        })
    }

    /// Look up a player by raw or canonical name
    pub fn player_summary(&self, name: &str) -> Result<PlayerSummary> {
        let canonical = self.extractor.aliases().resolve(name.trim());
        let state = self.store.load()?.unwrap_or_default();
        debug!("Looking up '{}' as '{}'", name, canonical);
        player_summary(&state, &canonical)
    }

    /// Regenerate the leaderboards from the saved state without importing
    pub fn refresh_reports(&self) -> Result<RenderedReport> {
        let state = self.store.load()?.unwrap_or_default();
        let report = render(&state, self.order);
        self.writer.write(&report)?;
        info!("Leaderboards refreshed for {} players", state.len());
        Ok(report)
    }

    async fn fetch(&self, tournament: &str) -> Result<(TournamentInfo, ExtractedTournament)> {
        let result = match self.source.fetch_tournament(tournament).await {
            Ok(data) => self
                .extractor
                .extract(tournament, &data)
                .map(|extracted| (data.tournament, extracted)),
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            if matches!(ranking_error(e), Some(RankingError::FetchFailure { .. })) {
                self.metrics.record_fetch_failure();
            }
            error!("Failed to load tournament '{}': {}", tournament, e);
        }
        result
    }

    fn fold(
        &self,
        state: &mut AggregationState,
        tournament: &str,
        extracted: &ExtractedTournament,
        workflow: Workflow,
    ) -> Result<FoldSummary> {
        let timer = self.metrics.start_timer();
        let summary = state.fold_tournament(tournament, extracted, self.calculator.as_ref())?;
        self.metrics.record_fold(workflow, &summary, timer.stop());
        Ok(summary)
    }

    fn commit(&self, state: &AggregationState) -> Result<RenderedReport> {
        self.store.save(state)?;
        self.metrics.update_players_tracked(state.len());

        let report = render(state, self.order);
        self.writer.write(&report).map_err(|e| {
            error!("State saved but leaderboards were not written: {}", e);
            e.context("state was saved but leaderboards are stale; run `bracket-rank report` to regenerate them")
        })?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::calculator::MockRatingCalculator;
    use crate::rating::storage::MockStateStore;
    use crate::source::StaticTournamentSource;
    use crate::types::{MatchRecord, Participant, TournamentData, TournamentInfo};
    use tempfile::TempDir;

    fn data(id: u64, names: &[&str], matches: &[(u64, u64)]) -> TournamentData {
        TournamentData {
            tournament: TournamentInfo {
                id,
                name: format!("Weekly {}", id),
                url: format!("weekly-{}", id),
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
                .map(|(i, (w, l))| MatchRecord {
                    id: i as u64 + 1,
                    winner_id: Some(*w),
                    loser_id: Some(*l),
                })
                .collect(),
        }
    }

    fn service(dir: &TempDir) -> RankingService<StaticTournamentSource, MockStateStore> {
        let mut source = StaticTournamentSource::new();
        source.add_tournament("t1", data(1, &["A", "B"], &[(1, 2)]));
        source.add_tournament("t2", data(2, &["B", "C"], &[(2, 1)]));

        RankingService::new(
            source,
            MockStateStore::new(),
            Box::new(MockRatingCalculator::new(1.0)),
            ReportWriter::new(dir.path()),
            Arc::new(MetricsCollector::new().unwrap()),
        )
        .with_tournaments(vec!["t1".to_string(), "t2".to_string()])
    }

    #[tokio::test]
    async fn test_add_tournament_saves_and_reports() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);

        let outcome = service.add_tournament("t1").await.unwrap();

        assert_eq!(outcome.summary.edges_applied, 1);
        assert_eq!(outcome.total_players, 2);
        assert_eq!(service.store().get_save_calls().len(), 1);
        assert!(service.writer().scores_path().exists());
        assert!(service.writer().wins_path().exists());
    }

    #[tokio::test]
    async fn test_duplicate_add_is_rejected_without_fetch() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);

        service.add_tournament("t1").await.unwrap();
        let err = service.add_tournament("t1").await.unwrap_err();

        assert!(matches!(
            ranking_error(&err),
            Some(RankingError::DuplicateTournament { .. })
        ));
        assert_eq!(service.source().get_fetch_log(), vec!["t1"]);
        assert_eq!(service.store().get_save_calls().len(), 1);
        assert_eq!(service.metrics().import().duplicate_imports_total.get(), 1);
    }

    #[tokio::test]
    async fn test_empty_identifier_is_malformed() {
        let dir = TempDir::new().unwrap();
        let err = service(&dir).add_tournament("  ").await.unwrap_err();
        assert!(matches!(
            ranking_error(&err),
            Some(RankingError::MalformedInput { .. })
        ));
    }

    #[tokio::test]
    async fn test_rebuild_failure_saves_nothing() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        service.source().fail_tournament("t2");

        let err = service.rebuild_all().await.unwrap_err();

        assert!(matches!(
            ranking_error(&err),
            Some(RankingError::FetchFailure { .. })
        ));
        assert!(service.store().get_save_calls().is_empty());
        assert!(!service.writer().scores_path().exists());
        assert_eq!(service.metrics().import().fetch_failures_total.get(), 1);
    }

    #[tokio::test]
    async fn test_rebuild_without_tournaments_is_rejected() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir).with_tournaments(Vec::new());
        let err = service.rebuild_all().await.unwrap_err();
        assert!(matches!(
            ranking_error(&err),
            Some(RankingError::ConfigurationError { .. })
        ));
    }

    #[tokio::test]
    async fn test_player_summary_resolves_aliases() {
        let dir = TempDir::new().unwrap();
        let mut aliases = AliasTable::new();
        aliases.insert("The A", "A");
        let service = service(&dir).with_aliases(aliases);

        service.add_tournament("t1").await.unwrap();

        let summary = service.player_summary("The A").unwrap();
        assert_eq!(summary.player, "A");
        assert_eq!(summary.wins, vec!["B"]);
    }

    #[tokio::test]
    async fn test_player_summary_without_state_is_unknown() {
        let dir = TempDir::new().unwrap();
        let err = service(&dir).player_summary("A").unwrap_err();
        assert!(matches!(
            ranking_error(&err),
            Some(RankingError::UnknownPlayer { .. })
        ));
    }

    #[tokio::test]
    async fn test_same_tournament_by_numeric_id_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut source = StaticTournamentSource::new();
        source.add_tournament("weekly-1", data(4242, &["A", "B"], &[(1, 2)]));
        source.add_tournament("4242", data(4242, &["A", "B"], &[(1, 2)]));
        let service = RankingService::new(
            source,
            MockStateStore::new(),
            Box::new(MockRatingCalculator::new(1.0)),
            ReportWriter::new(dir.path()),
            Arc::new(MetricsCollector::new().unwrap()),
        );

        service.add_tournament("weekly-1").await.unwrap();
        let err = service.add_tournament("4242").await.unwrap_err();

        assert!(matches!(
            ranking_error(&err),
            Some(RankingError::DuplicateTournament { tournament }) if tournament == "4242"
        ));
        assert_eq!(service.store().get_save_calls().len(), 1);
        let state = service.store().load().unwrap().unwrap();
        assert_eq!(state.player("A").unwrap().wins, vec!["B"]);
    }

    #[tokio::test]
    async fn test_rebuild_skips_tournament_listed_under_two_names() {
        let dir = TempDir::new().unwrap();
        let mut source = StaticTournamentSource::new();
        source.add_tournament("t1", data(1, &["A", "B"], &[(1, 2)]));
        source.add_tournament("1", data(1, &["A", "B"], &[(1, 2)]));
        let service = RankingService::new(
            source,
            MockStateStore::new(),
            Box::new(MockRatingCalculator::new(1.0)),
            ReportWriter::new(dir.path()),
            Arc::new(MetricsCollector::new().unwrap()),
        )
        .with_tournaments(vec!["t1".to_string(), "1".to_string()]);

        let outcome = service.rebuild_all().await.unwrap();
        assert_eq!(outcome.tournaments.len(), 1);
    }

    #[tokio::test]
    async fn test_report_failure_after_save_points_to_refresh() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("stats");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let mut source = StaticTournamentSource::new();
        source.add_tournament("t1", data(1, &["A", "B"], &[(1, 2)]));
        let service = RankingService::new(
            source,
            MockStateStore::new(),
            Box::new(MockRatingCalculator::new(1.0)),
            ReportWriter::new(&blocker),
            Arc::new(MetricsCollector::new().unwrap()),
        );

        let err = service.add_tournament("t1").await.unwrap_err();

        assert!(err.to_string().contains("bracket-rank report"));
        assert!(matches!(
            ranking_error(&err),
            Some(RankingError::PersistenceFailure { .. })
        ));
        assert_eq!(service.store().get_save_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_reports_rewrites_leaderboards() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        service.add_tournament("t1").await.unwrap();
        std::fs::remove_file(service.writer().scores_path()).unwrap();

        let report = service.refresh_reports().unwrap();

        assert_eq!(report.rankings.len(), 2);
        let scores = std::fs::read_to_string(service.writer().scores_path()).unwrap();
        assert_eq!(scores.lines().count(), 2);
    }
}
