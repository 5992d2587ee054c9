//! Prior Update Rule - carried Beta shapes per arm
//!
//! After each processed day the carried prior absorbs that day's own
//! conversions and non-conversions. The estimator separately adds the
//! cumulative totals on top of this carried prior, so observed data is
//! counted again on every later day. Both tracks are kept as-is.

use serde::{Deserialize, Serialize};

use super::aggregator::{ArmCounts, DailyCounts};
use crate::observation::Arm;
use crate::{Error, Result};

/// Beta distribution shape pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaShape {
    /// Pseudo-count of successes.
    pub alpha: f64,
    /// Pseudo-count of failures.
    pub beta: f64,
}

impl BetaShape {
    /// The uniform prior `Beta(1, 1)`.
    #[must_use]
    pub const fn uniform() -> Self {
        Self {
            alpha: 1.0,
            beta: 1.0,
        }
    }

    /// Both shapes are finite and strictly positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.alpha.is_finite() && self.beta.is_finite() && self.alpha > 0.0 && self.beta > 0.0
    }

    /// Analytic mean `alpha / (alpha + beta)`.
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    /// Shape after adding `counts` as successes and failures.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn plus_counts(self, counts: ArmCounts) -> Self {
        Self {
            alpha: self.alpha + counts.conversions as f64,
            beta: self.beta + counts.failures() as f64,
        }
    }

    /// Fail with `Error::InvalidPrior` unless the shape is usable.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPrior` naming `arm` if either shape is non-positive.
    pub fn ensure_valid(self, arm: Arm) -> Result<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(Error::InvalidPrior {
                arm,
                alpha: self.alpha,
                beta: self.beta,
            })
        }
    }
}

impl Default for BetaShape {
    fn default() -> Self {
        Self::uniform()
    }
}

/// Carried prior for both arms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorParameters {
    /// Control prior.
    pub control: BetaShape,
    /// Treatment prior.
    pub treatment: BetaShape,
}

impl PriorParameters {
    /// Same starting shape for both arms.
    #[must_use]
    pub const fn new(initial: BetaShape) -> Self {
        Self {
            control: initial,
            treatment: initial,
        }
    }

    /// Prior for one arm.
    #[must_use]
    pub const fn arm(&self, arm: Arm) -> BetaShape {
        match arm {
            Arm::Control => self.control,
            Arm::Treatment => self.treatment,
        }
    }

    /// Advance by one processed day's own increment (not the cumulative total).
    #[must_use]
    pub fn advance(self, day: &DailyCounts) -> Self {
        Self {
            control: self.control.plus_counts(day.control),
            treatment: self.treatment.plus_counts(day.treatment),
        }
    }
}

impl Default for PriorParameters {
    fn default() -> Self {
        Self::new(BetaShape::uniform())
    }
}
