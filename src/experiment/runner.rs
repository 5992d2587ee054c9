//! Sequential Runner - the day-by-day update/decision loop
//!
//! ```text
//! for date in sorted distinct dates:
//!     ingest (aggregator)          -> skip? continue
//!     estimate (posterior)         -> DailyResult appended
//!     advance (prior update rule)
//!     evaluate (stopping rule)     -> stopped? break
//! ```
//!
//! All loop-carried state lives in [`RunState`], which is moved through
//! [`SequentialRunner::step`] one day at a time. The RNG is seeded per run
//! from the config, so identical inputs give identical logs.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, info_span, warn};

use super::aggregator::{Ingest, ObservationAggregator};
use super::daily_result::DailyResult;
use super::log::ExperimentLog;
use super::posterior::PosteriorEstimator;
use super::prior::PriorParameters;
use super::snapshot::PosteriorSnapshot;
use super::stopping::{StoppingDecision, StoppingRule, StoppingState};
use crate::config::ExperimentConfig;
use crate::observation::{Arm, ExperimentObservation};
use crate::{Error, Result};

/// Cooperative cancellation flag, checked between days.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Runs finish the day in progress first.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// The records of one date, at most one per arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayGroup {
    /// Date shared by the records.
    pub date: NaiveDate,
    /// Control record, if present.
    pub control: Option<ExperimentObservation>,
    /// Treatment record, if present.
    pub treatment: Option<ExperimentObservation>,
}

/// Group observations by date, ascending.
///
/// # Errors
///
/// Returns `Error::DuplicateObservation` if an arm has two records on one date.
pub fn group_by_date(observations: &[ExperimentObservation]) -> Result<Vec<DayGroup>> {
    let mut days: BTreeMap<NaiveDate, DayGroup> = BTreeMap::new();
    for obs in observations {
        let date = obs.date();
        let group = days.entry(date).or_insert(DayGroup {
            date,
            control: None,
            treatment: None,
        });
        let slot = match obs.arm() {
            Arm::Control => &mut group.control,
            Arm::Treatment => &mut group.treatment,
        };
        if slot.is_some() {
            return Err(Error::DuplicateObservation {
                date,
                arm: obs.arm(),
            });
        }
        *slot = Some(*obs);
    }
    Ok(days.into_values().collect())
}

/// Loop-carried state of one run.
#[derive(Debug, Clone)]
pub struct RunState {
    aggregator: ObservationAggregator,
    prior: PriorParameters,
    stopping: StoppingRule,
    processed_days: usize,
    cumulative_sample_size: f64,
}

impl RunState {
    /// Fresh state for a config: zero totals, initial prior, rule running.
    #[must_use]
    pub fn new(config: &ExperimentConfig) -> Self {
        Self {
            aggregator: ObservationAggregator::new(),
            prior: PriorParameters::new(config.initial_prior()),
            stopping: StoppingRule::from_config(config),
            processed_days: 0,
            cumulative_sample_size: 0.0,
        }
    }

    /// Cumulative totals so far.
    #[must_use]
    pub const fn aggregator(&self) -> &ObservationAggregator {
        &self.aggregator
    }

    /// Carried prior.
    #[must_use]
    pub const fn prior(&self) -> PriorParameters {
        self.prior
    }

    /// Number of processed (non-skipped) days.
    #[must_use]
    pub const fn processed_days(&self) -> usize {
        self.processed_days
    }

    /// Running sum of mean daily sample size.
    #[must_use]
    pub const fn cumulative_sample_size(&self) -> f64 {
        self.cumulative_sample_size
    }

    /// Stopping rule state.
    #[must_use]
    pub const fn stopping_state(&self) -> StoppingState {
        self.stopping.state()
    }
}

/// Result of stepping one date.
#[derive(Debug, Clone, PartialEq)]
pub enum DayOutcome {
    /// An arm had no record on this date.
    Skipped(NaiveDate),
    /// The date was processed.
    Processed {
        /// Row to append to the log.
        result: DailyResult,
        /// Difference draws, when snapshot capture is enabled.
        snapshot: Option<PosteriorSnapshot>,
        /// Stopping rule state after this day.
        stopping: StoppingState,
    },
}

/// Drives one sequential experiment.
#[derive(Debug, Clone)]
pub struct SequentialRunner {
    config: ExperimentConfig,
    estimator: PosteriorEstimator,
}

impl SequentialRunner {
    /// Create a runner for a validated config.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if the config fails validation.
    pub fn new(config: ExperimentConfig) -> Result<Self> {
        config.validate()?;
        let estimator = PosteriorEstimator::from_config(&config);
        Ok(Self { config, estimator })
    }

    /// Get the config.
    #[must_use]
    pub const fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Run over all observations until the rule fires or dates run out.
    ///
    /// # Errors
    ///
    /// Invalid, duplicate or out-of-order observations and invalid
    /// posterior shapes abort the run.
    pub fn run(&self, observations: &[ExperimentObservation]) -> Result<ExperimentLog> {
        self.run_with_cancellation(observations, &CancellationToken::new())
    }

    /// Like [`SequentialRunner::run`], checking `token` before each date.
    ///
    /// A cancelled run returns the days processed so far with
    /// `StopReason::Cancelled`.
    ///
    /// # Errors
    ///
    /// Same as [`SequentialRunner::run`].
    pub fn run_with_cancellation(
        &self,
        observations: &[ExperimentObservation],
        token: &CancellationToken,
    ) -> Result<ExperimentLog> {
        let span = info_span!("sequential_run", seed = self.config.seed());
        let _guard = span.enter();

        let days = group_by_date(observations)?;
        let mut rng = StdRng::seed_from_u64(self.config.seed());
        let mut state = RunState::new(&self.config);
        let mut results = Vec::new();
        let mut skipped = Vec::new();
        let mut snapshots = Vec::new();
        let mut decision = StoppingDecision::exhausted();

        for day in &days {
            if token.is_cancelled() {
                info!(date = %day.date, "run cancelled");
                decision = StoppingDecision::cancelled();
                break;
            }

            let (next, outcome) = self.step(state, day, &mut rng)?;
            state = next;

            match outcome {
                DayOutcome::Skipped(date) => skipped.push(date),
                DayOutcome::Processed {
                    result,
                    snapshot,
                    stopping,
                } => {
                    results.push(result);
                    snapshots.extend(snapshot);
                    if let StoppingState::Stopped(reason) = stopping {
                        info!(
                            date = %result.date(),
                            day_index = result.day_index(),
                            ?reason,
                            region_fraction = result.region_fraction(),
                            "stopping rule fired"
                        );
                        decision = StoppingDecision {
                            stopped: true,
                            day_index: Some(result.day_index()),
                            reason,
                        };
                        break;
                    }
                }
            }
        }

        info!(
            processed = results.len(),
            skipped = skipped.len(),
            reason = ?decision.reason,
            "run complete"
        );
        Ok(ExperimentLog::new(results, decision, skipped, snapshots))
    }

    /// Process one date, consuming and returning the run state.
    ///
    /// All statistics for the day are final before the prior advances.
    ///
    /// # Errors
    ///
    /// Propagates aggregator and estimator errors.
    pub fn step<R: Rng + ?Sized>(
        &self,
        mut state: RunState,
        day: &DayGroup,
        rng: &mut R,
    ) -> Result<(RunState, DayOutcome)> {
        let ingest =
            state
                .aggregator
                .ingest(day.date, day.control.as_ref(), day.treatment.as_ref())?;

        let Ingest::Accumulated { day: counts, totals } = ingest else {
            warn!(date = %day.date, "skipping date due to missing arm data");
            return Ok((state, DayOutcome::Skipped(day.date)));
        };

        let day_index = state.processed_days;
        info!(date = %day.date, day = day_index + 1, "processing date");

        let estimate = self.estimator.estimate(&totals, &state.prior, rng)?;
        let result = DailyResult::new(day_index, &counts, &estimate, state.cumulative_sample_size);
        let snapshot = self.config.capture_snapshots().then(|| {
            PosteriorSnapshot::capture(
                day.date,
                day_index + 1,
                &estimate.samples,
                self.config.hdi_mass(),
                self.config.rope(),
            )
        });

        state.prior = state.prior.advance(&counts);
        state.processed_days += 1;
        state.cumulative_sample_size = result.cumulative_sample_size();
        let stopping = state.stopping.evaluate(day_index, result.region_fraction());
        debug!(
            day_index,
            cumulative_sample_size = state.cumulative_sample_size,
            ?stopping,
            "day finalized"
        );

        Ok((
            state,
            DayOutcome::Processed {
                result,
                snapshot,
                stopping,
            },
        ))
    }
}
