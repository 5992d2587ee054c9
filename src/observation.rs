//! Daily observation records supplied by the data source
//!
//! One record per arm per date. Counts are unsigned, so the only
//! representable violation is `conversions > trials`.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One side of the experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arm {
    /// Baseline experience.
    Control,
    /// Variant under test.
    Treatment,
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Control => f.write_str("control"),
            Self::Treatment => f.write_str("treatment"),
        }
    }
}

/// Observation field named in validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationField {
    /// Number of converting units.
    Conversions,
    /// Number of exposed units.
    Trials,
    /// Observation arm.
    Arm,
    /// Observation date.
    Date,
}

impl fmt::Display for ObservationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conversions => f.write_str("conversions"),
            Self::Trials => f.write_str("trials"),
            Self::Arm => f.write_str("arm"),
            Self::Date => f.write_str("date"),
        }
    }
}

/// Conversion counts for one arm on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentObservation {
    date: NaiveDate,
    arm: Arm,
    conversions: u64,
    trials: u64,
}

impl ExperimentObservation {
    /// Create a new observation record.
    ///
    /// The record is not validated here; see [`ExperimentObservation::validate`].
    #[must_use]
    pub const fn new(date: NaiveDate, arm: Arm, conversions: u64, trials: u64) -> Self {
        Self {
            date,
            arm,
            conversions,
            trials,
        }
    }

    /// Get the observation date.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Get the arm.
    #[must_use]
    pub const fn arm(&self) -> Arm {
        self.arm
    }

    /// Get the number of conversions.
    #[must_use]
    pub const fn conversions(&self) -> u64 {
        self.conversions
    }

    /// Get the number of trials.
    #[must_use]
    pub const fn trials(&self) -> u64 {
        self.trials
    }

    /// Get the number of trials that did not convert.
    #[must_use]
    pub const fn failures(&self) -> u64 {
        self.trials.saturating_sub(self.conversions)
    }

    /// Check `conversions <= trials`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidObservation` naming the date, arm and field.
    pub fn validate(&self) -> Result<()> {
        if self.conversions > self.trials {
            return Err(Error::InvalidObservation {
                date: self.date,
                arm: self.arm,
                field: ObservationField::Conversions,
                reason: format!("{} exceeds trials {}", self.conversions, self.trials),
            });
        }
        Ok(())
    }
}
