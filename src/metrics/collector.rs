//! Metrics collection using Prometheus
//!
//! This module provides metrics for the import pipeline: tournaments folded,
//! edges applied, fetch failures and workflow timings.

use crate::rating::FoldSummary;
use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Workflow labels used on per-workflow metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    AddTournament,
    RebuildAll,
}

impl Workflow {
    fn label(self) -> &'static str {
        match self {
            Workflow::AddTournament => "add",
            Workflow::RebuildAll => "rebuild",
        }
    }
}

/// Main metrics collector for the ranking pipeline
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Import-related metrics
    import_metrics: ImportMetrics,

    /// Workflow-level metrics
    workflow_metrics: WorkflowMetrics,
}

/// Import-related metrics
#[derive(Clone)]
pub struct ImportMetrics {
    /// Tournaments folded into the state, by workflow
    pub tournaments_imported_total: IntCounterVec,

    /// Win/loss edges applied to ratings
    pub edges_applied_total: IntCounter,

    /// Players first seen during imports
    pub players_created_total: IntCounter,

    /// Players in the most recently saved state
    pub players_tracked: IntGauge,

    /// Failed tournament fetches
    pub fetch_failures_total: IntCounter,

    /// Imports rejected because the tournament was already folded
    pub duplicate_imports_total: IntCounter,

    /// Time spent folding one tournament
    pub fold_duration_seconds: Histogram,
}

/// Workflow-level metrics
#[derive(Clone)]
pub struct WorkflowMetrics {
    /// Completed or failed workflow runs
    pub runs_total: IntCounterVec,

    /// Wall time of workflow runs, including fetches
    pub duration_seconds: HistogramVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let import_metrics = ImportMetrics::new(&registry)?;
        let workflow_metrics = WorkflowMetrics::new(&registry)?;

        Ok(Self {
            registry,
            import_metrics,
            workflow_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get import metrics
    pub fn import(&self) -> &ImportMetrics {
        &self.import_metrics
    }

    /// Get workflow metrics
    pub fn workflow(&self) -> &WorkflowMetrics {
        &self.workflow_metrics
    }

    /// Record one tournament folded into the state
    pub fn record_fold(&self, workflow: Workflow, summary: &FoldSummary, duration: Duration) {
        self.import_metrics
            .tournaments_imported_total
            .with_label_values(&[workflow.label()])
            .inc();
        self.import_metrics
            .edges_applied_total
            .inc_by(summary.edges_applied as u64);
        self.import_metrics
            .players_created_total
            .inc_by(summary.new_players as u64);
        self.import_metrics
            .fold_duration_seconds
            .observe(duration.as_secs_f64());
    }

    /// Record a failed fetch
    pub fn record_fetch_failure(&self) {
        self.import_metrics.fetch_failures_total.inc();
    }

    /// Record a rejected duplicate import
    pub fn record_duplicate_import(&self) {
        self.import_metrics.duplicate_imports_total.inc();
    }

    /// Record the size of the state that was just saved
    pub fn update_players_tracked(&self, players: usize) {
        self.import_metrics.players_tracked.set(players as i64);
    }

    /// Record the end of a workflow run
    pub fn record_workflow(&self, workflow: Workflow, success: bool, duration: Duration) {
        let status = if success { "success" } else { "error" };

        self.workflow_metrics
            .runs_total
            .with_label_values(&[workflow.label(), status])
            .inc();
        self.workflow_metrics
            .duration_seconds
            .with_label_values(&[workflow.label()])
            .observe(duration.as_secs_f64());
    }

    /// Render every metric in the Prometheus text exposition format
    pub fn render_text(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ImportMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let tournaments_imported_total = IntCounterVec::new(
            Opts::new(
                "bracket_rank_tournaments_imported_total",
                "Tournaments folded into the rating state",
            ),
            &["workflow"],
        )?;
        registry.register(Box::new(tournaments_imported_total.clone()))?;

        let edges_applied_total = IntCounter::new(
            "bracket_rank_edges_applied_total",
            "Win/loss edges applied to ratings",
        )?;
        registry.register(Box::new(edges_applied_total.clone()))?;

        let players_created_total = IntCounter::new(
            "bracket_rank_players_created_total",
            "Players first seen during imports",
        )?;
        registry.register(Box::new(players_created_total.clone()))?;

        let players_tracked = IntGauge::new(
            "bracket_rank_players_tracked",
            "Players in the most recently saved state",
        )?;
        registry.register(Box::new(players_tracked.clone()))?;

        let fetch_failures_total = IntCounter::new(
            "bracket_rank_fetch_failures_total",
            "Failed tournament fetches",
        )?;
        registry.register(Box::new(fetch_failures_total.clone()))?;

        let duplicate_imports_total = IntCounter::new(
            "bracket_rank_duplicate_imports_total",
            "Imports rejected because the tournament was already folded",
        )?;
        registry.register(Box::new(duplicate_imports_total.clone()))?;

        let fold_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "bracket_rank_fold_duration_seconds",
                "Time spent folding one tournament",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        )?;
        registry.register(Box::new(fold_duration_seconds.clone()))?;

        Ok(Self {
            tournaments_imported_total,
            edges_applied_total,
            players_created_total,
            players_tracked,
            fetch_failures_total,
            duplicate_imports_total,
            fold_duration_seconds,
        })
    }
}

impl WorkflowMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let runs_total = IntCounterVec::new(
            Opts::new("bracket_rank_workflow_runs_total", "Workflow runs by outcome"),
            &["workflow", "status"],
        )?;
        registry.register(Box::new(runs_total.clone()))?;

        let duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "bracket_rank_workflow_duration_seconds",
                "Wall time of workflow runs",
            )
            .buckets(vec![0.01, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0]),
            &["workflow"],
        )?;
        registry.register(Box::new(duration_seconds.clone()))?;

        Ok(Self {
            runs_total,
            duration_seconds,
        })
    }
}
