//! Batch execution of independent sequential runs
//!
//! Runs share nothing mutable: each gets its own copy of the config with a
//! derived seed, its own run state and its own RNG. Work is spread over the
//! `rayon` pool; finished runs land in a [`BatchStore`]. A failing run is
//! recorded as `Failed` and never aborts its siblings.
//!
//! ## Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use trueno_ab::batch::BatchRunner;
//! use trueno_ab::config::ExperimentConfig;
//! use trueno_ab::synthetic::SyntheticExperiment;
//!
//! let config = ExperimentConfig::builder().samples_per_day(500).build()?;
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let sim = SyntheticExperiment::null_effect(0.10, 100, start).with_days(5);
//!
//! let outcome = BatchRunner::new(config)?.simulate(&sim, 3);
//! assert_eq!(outcome.entries().len(), 3);
//! let summary = outcome.summary();
//! assert_eq!(summary.resolved_runs + summary.unresolved_runs, 3);
//! # Ok::<(), trueno_ab::Error>(())
//! ```

mod run_record;
mod store;
mod summary;

pub use run_record::{RunRecord, RunStatus};
pub use store::{BatchEntry, BatchStore};
pub use summary::BatchSummary;

use std::borrow::Cow;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::ExperimentConfig;
use crate::experiment::{CancellationToken, ExperimentLog, SequentialRunner, StopReason};
use crate::observation::ExperimentObservation;
use crate::synthetic::SyntheticExperiment;
use crate::Result;

/// Number of simulated runs the web front end requests per calculation.
pub const DEFAULT_SIMULATION_RUNS: usize = 10;

/// Derive the seed of run `index` from a base seed (SplitMix64 finalizer).
#[must_use]
pub const fn derive_seed(base: u64, index: usize) -> u64 {
    let mut z = base.wrapping_add((index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// All finished runs of a batch, ordered by index.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    entries: Vec<BatchEntry>,
    config: ExperimentConfig,
}

impl BatchOutcome {
    /// Every run, successful or not.
    #[must_use]
    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    /// Logs of runs that produced one (success or cancelled).
    pub fn logs(&self) -> impl Iterator<Item = &ExperimentLog> {
        self.entries.iter().filter_map(|e| e.log.as_ref())
    }

    /// Records of failed runs.
    pub fn failures(&self) -> impl Iterator<Item = &RunRecord> {
        self.entries
            .iter()
            .filter(|e| e.record.status() == RunStatus::Failed)
            .map(|e| &e.record)
    }

    /// Cross-run summary using the batch config's thresholds.
    #[must_use]
    pub fn summary(&self) -> BatchSummary {
        BatchSummary::from_logs(
            self.logs(),
            self.failures().count(),
            self.config.thresholds(),
        )
    }
}

/// Runs many independent experiments in parallel.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    config: ExperimentConfig,
    token: CancellationToken,
}

impl BatchRunner {
    /// Create a batch runner. Run `i` uses `derive_seed(config.seed(), i)`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if the config fails validation.
    pub fn new(config: ExperimentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            token: CancellationToken::new(),
        })
    }

    /// Token shared by every run of this batch; cancelling stops all runs
    /// at their next day boundary.
    #[must_use]
    pub const fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// Run one experiment per dataset.
    #[must_use]
    pub fn run(&self, datasets: &[Vec<ExperimentObservation>]) -> BatchOutcome {
        let store = BatchStore::with_capacity(datasets.len());
        datasets
            .par_iter()
            .enumerate()
            .for_each(|(index, observations)| {
                store.insert(self.execute(index, Ok(Cow::Borrowed(observations.as_slice()))));
            });
        self.finish(store)
    }

    /// Generate and run `runs` synthetic experiments.
    ///
    /// Run `i` draws its data with `derive_seed(sim.seed, i)`.
    #[must_use]
    pub fn simulate(&self, sim: &SyntheticExperiment, runs: usize) -> BatchOutcome {
        let store = BatchStore::with_capacity(runs);
        (0..runs).into_par_iter().for_each(|index| {
            let data_seed = derive_seed(sim.seed, index);
            let observations: Result<Cow<'_, [ExperimentObservation]>> =
                sim.with_seed(data_seed).generate().map(Cow::Owned);
            store.insert(self.execute(index, observations));
        });
        self.finish(store)
    }

    fn execute(
        &self,
        index: usize,
        observations: Result<Cow<'_, [ExperimentObservation]>>,
    ) -> BatchEntry {
        let seed = derive_seed(self.config.seed(), index);
        let mut record = RunRecord::new(index, seed);
        record.start();

        let outcome = observations.and_then(|observations| {
            SequentialRunner::new(self.config.with_seed(seed))?
                .run_with_cancellation(&observations, &self.token)
        });

        match outcome {
            Ok(log) => {
                let status = if log.decision().reason == StopReason::Cancelled {
                    RunStatus::Cancelled
                } else {
                    RunStatus::Success
                };
                record.complete(status);
                BatchEntry {
                    record,
                    log: Some(log),
                }
            }
            Err(error) => {
                warn!(run_id = record.run_id(), %error, "run failed");
                record.fail(error.to_string());
                BatchEntry { record, log: None }
            }
        }
    }

    fn finish(&self, store: BatchStore) -> BatchOutcome {
        let entries = store.into_sorted();
        info!(runs = entries.len(), "batch complete");
        BatchOutcome {
            entries,
            config: self.config.clone(),
        }
    }
}
