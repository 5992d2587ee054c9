//! Observation Aggregator - running cumulative totals per arm

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::observation::{Arm, ExperimentObservation, ObservationField};
use crate::{Error, Result};

/// Conversions and trials for one arm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmCounts {
    /// Converting units.
    pub conversions: u64,
    /// Exposed units.
    pub trials: u64,
}

impl ArmCounts {
    /// Create counts for one arm.
    #[must_use]
    pub const fn new(conversions: u64, trials: u64) -> Self {
        Self {
            conversions,
            trials,
        }
    }

    /// Trials that did not convert.
    #[must_use]
    pub const fn failures(&self) -> u64 {
        self.trials.saturating_sub(self.conversions)
    }

    fn checked_plus(self, other: Self) -> Option<Self> {
        Some(Self {
            conversions: self.conversions.checked_add(other.conversions)?,
            trials: self.trials.checked_add(other.trials)?,
        })
    }
}

impl From<&ExperimentObservation> for ArmCounts {
    fn from(obs: &ExperimentObservation) -> Self {
        Self::new(obs.conversions(), obs.trials())
    }
}

/// Running totals for both arms within one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CumulativeCounts {
    /// Control totals.
    pub control: ArmCounts,
    /// Treatment totals.
    pub treatment: ArmCounts,
}

impl CumulativeCounts {
    /// Totals for one arm.
    #[must_use]
    pub const fn arm(&self, arm: Arm) -> ArmCounts {
        match arm {
            Arm::Control => self.control,
            Arm::Treatment => self.treatment,
        }
    }
}

/// One date's own increment for both arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCounts {
    /// Date of the increment.
    pub date: NaiveDate,
    /// Control increment.
    pub control: ArmCounts,
    /// Treatment increment.
    pub treatment: ArmCounts,
}

impl DailyCounts {
    /// Mean of the two arms' trials for this date.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_sample_size(&self) -> f64 {
        (self.control.trials as f64 + self.treatment.trials as f64) / 2.0
    }
}

/// Outcome of ingesting one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingest {
    /// One or both arms had no record; nothing was accumulated.
    Skipped,
    /// Both arms were present and added to the running totals.
    Accumulated {
        /// The date's own increment.
        day: DailyCounts,
        /// Totals after the increment.
        totals: CumulativeCounts,
    },
}

/// Merges each date's per-arm counts into cumulative totals.
///
/// Dates must arrive in strictly ascending order. Totals only grow.
#[derive(Debug, Clone, Default)]
pub struct ObservationAggregator {
    totals: CumulativeCounts,
    last_date: Option<NaiveDate>,
}

impl ObservationAggregator {
    /// Create an aggregator with zero totals.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cumulative totals.
    #[must_use]
    pub const fn totals(&self) -> CumulativeCounts {
        self.totals
    }

    /// Last date accepted, skipped or not.
    #[must_use]
    pub const fn last_date(&self) -> Option<NaiveDate> {
        self.last_date
    }

    /// Ingest the records for one date.
    ///
    /// A missing arm skips the date without touching the totals.
    ///
    /// # Errors
    ///
    /// - `Error::OutOfOrderDate` if `date` is not after the previous date
    /// - `Error::InvalidObservation` if a record fails validation, does not
    ///   belong to the slot it was passed in, or would overflow the running
    ///   totals (the totals are left unchanged)
    pub fn ingest(
        &mut self,
        date: NaiveDate,
        control: Option<&ExperimentObservation>,
        treatment: Option<&ExperimentObservation>,
    ) -> Result<Ingest> {
        if let Some(previous) = self.last_date {
            if date <= previous {
                return Err(Error::OutOfOrderDate { date, previous });
            }
        }

        for (obs, arm) in [(control, Arm::Control), (treatment, Arm::Treatment)] {
            if let Some(obs) = obs {
                check_slot(obs, date, arm)?;
                obs.validate()?;
            }
        }

        let (Some(control), Some(treatment)) = (control, treatment) else {
            self.last_date = Some(date);
            return Ok(Ingest::Skipped);
        };

        let day = DailyCounts {
            date,
            control: control.into(),
            treatment: treatment.into(),
        };
        let totals = CumulativeCounts {
            control: accumulate(self.totals.control, day.control, date, Arm::Control)?,
            treatment: accumulate(self.totals.treatment, day.treatment, date, Arm::Treatment)?,
        };
        self.totals = totals;
        self.last_date = Some(date);

        Ok(Ingest::Accumulated {
            day,
            totals: self.totals,
        })
    }
}

fn accumulate(
    total: ArmCounts,
    increment: ArmCounts,
    date: NaiveDate,
    arm: Arm,
) -> Result<ArmCounts> {
    total
        .checked_plus(increment)
        .ok_or_else(|| Error::InvalidObservation {
            date,
            arm,
            field: ObservationField::Trials,
            reason: format!(
                "adding {} trials to a running total of {} overflows",
                increment.trials, total.trials
            ),
        })
}

fn check_slot(obs: &ExperimentObservation, date: NaiveDate, arm: Arm) -> Result<()> {
    if obs.arm() != arm {
        return Err(Error::InvalidObservation {
            date: obs.date(),
            arm: obs.arm(),
            field: ObservationField::Arm,
            reason: format!("passed as the {arm} record"),
        });
    }
    if obs.date() != date {
        return Err(Error::InvalidObservation {
            date: obs.date(),
            arm: obs.arm(),
            field: ObservationField::Date,
            reason: format!("does not match ingested date {date}"),
        });
    }
    Ok(())
}
