//! Error types for Trueno-AB
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use chrono::NaiveDate;
use thiserror::Error;

use crate::observation::{Arm, ObservationField};

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Trueno-AB error types
///
/// A missing arm on some date is not an error: the runner skips that date
/// and records it in the experiment log.
#[derive(Error, Debug)]
pub enum Error {
    /// Observation failed validation (fatal to the current run)
    #[error("Invalid observation on {date} ({arm}): {field} {reason}")]
    InvalidObservation {
        /// Date of the offending record
        date: NaiveDate,
        /// Arm of the offending record
        arm: Arm,
        /// Field that failed validation
        field: ObservationField,
        /// Human-readable description of the violation
        reason: String,
    },

    /// More than one record for the same arm on the same date
    #[error("Duplicate observation on {date} ({arm}): expected at most one record per arm per date")]
    DuplicateObservation {
        /// Date carrying the duplicate
        date: NaiveDate,
        /// Arm carrying the duplicate
        arm: Arm,
    },

    /// Dates must be ingested in strictly ascending order
    #[error("Out-of-order date: {date} ingested after {previous}")]
    OutOfOrderDate {
        /// Date that was rejected
        date: NaiveDate,
        /// Last date that was accepted
        previous: NaiveDate,
    },

    /// Effective Beta shape is non-positive (internal consistency failure)
    #[error("Invalid prior for {arm}: Beta({alpha}, {beta}) requires positive finite shapes\nThis should be unreachable with valid inputs. Please report this issue.")]
    InvalidPrior {
        /// Arm whose posterior could not be formed
        arm: Arm,
        /// Effective alpha shape
        alpha: f64,
        /// Effective beta shape
        beta: f64,
    },

    /// Configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON (de)serialization of configs or logs
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
