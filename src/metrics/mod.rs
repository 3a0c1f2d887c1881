//! Metrics and monitoring for bracket-rank
//!
//! This module provides Prometheus metrics for imports and workflow runs.

pub mod collector;

pub use collector::{ImportMetrics, MetricsCollector, MetricsTimer, Workflow, WorkflowMetrics};
