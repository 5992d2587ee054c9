//! Batch Summary - cross-run statistics for resolved experiments

use serde::{Deserialize, Serialize};

use crate::config::RegionThresholds;
use crate::experiment::ExperimentLog;

/// Aggregate view over many runs.
///
/// A run counts as resolved when its last region fraction is at or beyond
/// either threshold. Averages cover resolved runs only and are `None` when
/// no run resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Runs whose final region fraction crossed a threshold.
    pub resolved_runs: usize,
    /// Runs that produced a log but did not resolve.
    pub unresolved_runs: usize,
    /// Runs that failed before producing a log.
    pub failed_runs: usize,
    /// Mean final cumulative sample size of resolved runs.
    pub average_sample_size: Option<f64>,
    /// Mean days between first and last processed date of resolved runs.
    pub average_days: Option<f64>,
    /// Final cumulative sample size of every unresolved run.
    pub unresolved_sample_sizes: Vec<f64>,
}

impl BatchSummary {
    /// Summarize completed logs.
    ///
    /// Empty logs (no processed day) count as unresolved with sample size 0.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_logs<'a>(
        logs: impl IntoIterator<Item = &'a ExperimentLog>,
        failed_runs: usize,
        thresholds: RegionThresholds,
    ) -> Self {
        let mut sizes = Vec::new();
        let mut days = Vec::new();
        let mut unresolved_sample_sizes = Vec::new();

        for log in logs {
            if log.is_resolved(thresholds) {
                sizes.push(log.total_sample_size());
                days.push(log.days_elapsed().unwrap_or(0) as f64);
            } else {
                unresolved_sample_sizes.push(log.total_sample_size());
            }
        }

        let average = |values: &[f64]| {
            (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
        };

        Self {
            resolved_runs: sizes.len(),
            unresolved_runs: unresolved_sample_sizes.len(),
            failed_runs,
            average_sample_size: average(&sizes),
            average_days: average(&days),
            unresolved_sample_sizes,
        }
    }
}
