//! Experiment Log - ordered daily results and the terminal decision
//!
//! This is the final, immutable output of one sequential run. The reporting
//! layer reads it as a time series (one row per processed day) and the batch
//! layer aggregates many logs into summary statistics.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::daily_result::DailyResult;
use super::snapshot::PosteriorSnapshot;
use super::stopping::StoppingDecision;
use crate::config::RegionThresholds;
use crate::Result;

/// Output of one sequential run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentLog {
    results: Vec<DailyResult>,
    decision: StoppingDecision,
    skipped_dates: Vec<NaiveDate>,
    snapshots: Vec<PosteriorSnapshot>,
}

impl ExperimentLog {
    /// Assemble a finished log.
    #[must_use]
    pub const fn new(
        results: Vec<DailyResult>,
        decision: StoppingDecision,
        skipped_dates: Vec<NaiveDate>,
        snapshots: Vec<PosteriorSnapshot>,
    ) -> Self {
        Self {
            results,
            decision,
            skipped_dates,
            snapshots,
        }
    }

    /// Daily results in date order.
    #[must_use]
    pub fn results(&self) -> &[DailyResult] {
        &self.results
    }

    /// Terminal stopping decision.
    #[must_use]
    pub const fn decision(&self) -> StoppingDecision {
        self.decision
    }

    /// Dates skipped because an arm had no record.
    #[must_use]
    pub fn skipped_dates(&self) -> &[NaiveDate] {
        &self.skipped_dates
    }

    /// Per-day posterior snapshots (empty unless capture was enabled).
    #[must_use]
    pub fn snapshots(&self) -> &[PosteriorSnapshot] {
        &self.snapshots
    }

    /// Number of processed days.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// True when no day was processed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Last processed day, if any.
    #[must_use]
    pub fn last(&self) -> Option<&DailyResult> {
        self.results.last()
    }

    /// Cumulative sample size at the last processed day (0 if none).
    #[must_use]
    pub fn total_sample_size(&self) -> f64 {
        self.last().map_or(0.0, DailyResult::cumulative_sample_size)
    }

    /// Calendar days between the first and last processed dates.
    #[must_use]
    pub fn days_elapsed(&self) -> Option<i64> {
        let first = self.results.first()?;
        let last = self.results.last()?;
        Some((last.date() - first.date()).num_days())
    }

    /// Region fraction per processed day, for trend rendering.
    #[must_use]
    pub fn region_fraction_series(&self) -> Vec<(NaiveDate, f64)> {
        self.results
            .iter()
            .map(|r| (r.date(), r.region_fraction()))
            .collect()
    }

    /// Whether the final region fraction is at or beyond either threshold.
    ///
    /// Independent of the processed-day floor: an exhausted run whose last
    /// day crossed a threshold counts as resolved.
    #[must_use]
    pub fn is_resolved(&self, thresholds: RegionThresholds) -> bool {
        self.last().is_some_and(|r| {
            r.region_fraction() >= thresholds.upper || r.region_fraction() <= thresholds.lower
        })
    }

    /// Serialize to a JSON string for the reporting layer.
    ///
    /// # Errors
    ///
    /// Returns `Error::Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a log previously produced by [`ExperimentLog::to_json`].
    ///
    /// # Errors
    ///
    /// Returns `Error::Serialization` on malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
