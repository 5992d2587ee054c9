//! Sequential Bayesian A/B experiment engine
//!
//! Two independent Beta-Binomial arms, updated one day at a time, with an
//! early-stopping rule based on the region of practical equivalence (ROPE).
//!
//! ## Component Overview
//!
//! ```text
//! SequentialRunner
//!   ├── ObservationAggregator   cumulative counts per arm
//!   ├── PosteriorEstimator      Beta draws -> means, HDIs, P(T > C), ROPE %, loss
//!   ├── PriorParameters         carried prior, advanced by each day's increment
//!   └── StoppingRule            RUNNING -> STOPPED after the processed-day floor
//!            │
//!            ▼
//!       ExperimentLog (DailyResult*, StoppingDecision)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use trueno_ab::config::ExperimentConfig;
//! use trueno_ab::experiment::SequentialRunner;
//! use trueno_ab::observation::{Arm, ExperimentObservation};
//!
//! let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let observations = vec![
//!     ExperimentObservation::new(date, Arm::Control, 10, 100),
//!     ExperimentObservation::new(date, Arm::Treatment, 12, 100),
//! ];
//!
//! let runner = SequentialRunner::new(ExperimentConfig::default())?;
//! let log = runner.run(&observations)?;
//! assert_eq!(log.len(), 1);
//! # Ok::<(), trueno_ab::Error>(())
//! ```

mod aggregator;
mod daily_result;
mod log;
mod posterior;
mod prior;
mod runner;
mod snapshot;
mod stopping;

pub use aggregator::{ArmCounts, CumulativeCounts, DailyCounts, Ingest, ObservationAggregator};
pub use daily_result::DailyResult;
pub use log::ExperimentLog;
pub use posterior::{
    expected_loss, hdi, hdi_sorted, mean, CredibleInterval, ExpectedLoss, PosteriorEstimate,
    PosteriorEstimator, PosteriorSampleSet, PosteriorSummary,
};
pub use prior::{BetaShape, PriorParameters};
pub use runner::{
    group_by_date, CancellationToken, DayGroup, DayOutcome, RunState, SequentialRunner,
};
pub use snapshot::PosteriorSnapshot;
pub use stopping::{StopReason, StoppingDecision, StoppingRule, StoppingState};
