//! # Trueno-AB: Sequential Bayesian A/B Testing
//!
//! **Version**: 0.1.0
//!
//! Trueno-AB runs a day-by-day Bayesian A/B test over two conversion arms,
//! each modelled as an independent Beta-Binomial pair. Every processed day it
//! reports posterior means, 94% highest-density intervals, the probability
//! that treatment beats control, the share of the difference posterior inside
//! a region of practical equivalence (ROPE), and the expected loss of each
//! arm. The run stops early once the ROPE share is decisive.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Muda elimination**: Closed-form Beta posteriors, no MCMC warm-up
//! - **Poka-Yoke safety**: Invalid or duplicate observations abort the run
//! - **Genchi Genbutsu**: Every statistic is computed from the same seeded draws
//! - **Jidoka**: Independent runs never share mutable state or RNG streams
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use trueno_ab::config::ExperimentConfig;
//! use trueno_ab::experiment::SequentialRunner;
//! use trueno_ab::synthetic::SyntheticExperiment;
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let observations = SyntheticExperiment::null_effect(0.10, 100, start)
//!     .with_seed(1)
//!     .generate()?;
//!
//! let config = ExperimentConfig::builder().rope(-0.02, 0.02).seed(7).build()?;
//! let log = SequentialRunner::new(config)?.run(&observations)?;
//!
//! for day in log.results() {
//!     println!("{}: ROPE {:.2}", day.date(), day.region_fraction());
//! }
//! println!("decision: {:?}", log.decision());
//! # Ok::<(), trueno_ab::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod batch;
pub mod config;
pub mod error;
pub mod experiment;
pub mod observation;
pub mod synthetic;

pub use error::{Error, Result};
