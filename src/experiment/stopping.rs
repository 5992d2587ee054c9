//! Stopping Rule - ROPE-based early stopping after a processed-day floor

use serde::{Deserialize, Serialize};

use crate::config::{ExperimentConfig, RegionThresholds};

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Difference confidently inside the region of practical equivalence.
    RegionResolvedEquivalent,
    /// Difference confidently outside the region.
    RegionResolvedDifferent,
    /// Input dates ran out before the rule fired.
    Exhausted,
    /// Cancelled between days by the caller.
    Cancelled,
}

/// Terminal decision of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoppingDecision {
    /// True only when the stopping rule fired.
    pub stopped: bool,
    /// 0-based processed-day index at which the rule fired.
    pub day_index: Option<usize>,
    /// Terminal reason.
    pub reason: StopReason,
}

impl StoppingDecision {
    /// Decision for a run whose input dates ran out.
    #[must_use]
    pub const fn exhausted() -> Self {
        Self {
            stopped: false,
            day_index: None,
            reason: StopReason::Exhausted,
        }
    }

    /// Decision for a run cancelled between days.
    #[must_use]
    pub const fn cancelled() -> Self {
        Self {
            stopped: false,
            day_index: None,
            reason: StopReason::Cancelled,
        }
    }
}

/// Stopping rule state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoppingState {
    /// Keep processing days.
    Running,
    /// The rule fired; no further days are processed.
    Stopped(StopReason),
}

/// Two-state stopping rule.
///
/// Fires once the 0-based processed-day index exceeds `min_processed_days`
/// and the region fraction is at or beyond one of the thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoppingRule {
    min_processed_days: usize,
    thresholds: RegionThresholds,
    state: StoppingState,
}

impl StoppingRule {
    /// Create a rule in the `Running` state.
    #[must_use]
    pub const fn new(min_processed_days: usize, thresholds: RegionThresholds) -> Self {
        Self {
            min_processed_days,
            thresholds,
            state: StoppingState::Running,
        }
    }

    /// Create a rule from an experiment config.
    #[must_use]
    pub const fn from_config(config: &ExperimentConfig) -> Self {
        Self::new(config.min_processed_days(), config.thresholds())
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> StoppingState {
        self.state
    }

    /// Evaluate one processed day. Once stopped, stays stopped.
    pub fn evaluate(&mut self, day_index: usize, region_fraction: f64) -> StoppingState {
        if self.state != StoppingState::Running || day_index <= self.min_processed_days {
            return self.state;
        }
        if region_fraction >= self.thresholds.upper {
            self.state = StoppingState::Stopped(StopReason::RegionResolvedEquivalent);
        } else if region_fraction <= self.thresholds.lower {
            self.state = StoppingState::Stopped(StopReason::RegionResolvedDifferent);
        }
        self.state
    }
}
