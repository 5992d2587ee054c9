//! Experiment configuration
//!
//! All knobs of a sequential run: the region of practical equivalence, the
//! Monte Carlo budget, the stopping floor and thresholds, and the RNG seed.
//! Every field has a default, so partial JSON documents deserialize cleanly.
//!
//! ```rust
//! use trueno_ab::config::ExperimentConfig;
//!
//! let config = ExperimentConfig::builder()
//!     .rope(-0.01, 0.01)
//!     .samples_per_day(2000)
//!     .seed(7)
//!     .build()?;
//! assert_eq!(config.samples_per_day(), 2000);
//! # Ok::<(), trueno_ab::Error>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::experiment::BetaShape;
use crate::{Error, Result};

/// Default Monte Carlo draws per arm per day.
pub const DEFAULT_SAMPLES_PER_DAY: usize = 4000;

/// Default highest-density interval mass.
pub const DEFAULT_HDI_MASS: f64 = 0.94;

/// Default number of processed days that must pass before stopping is allowed.
pub const DEFAULT_MIN_PROCESSED_DAYS: usize = 14;

/// Region of practical equivalence around zero difference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rope {
    /// Lower bound (exclusive).
    pub lower: f64,
    /// Upper bound (exclusive).
    pub upper: f64,
}

impl Rope {
    /// Symmetric region `(-half_width, half_width)`.
    #[must_use]
    pub fn symmetric(half_width: f64) -> Self {
        Self {
            lower: -half_width.abs(),
            upper: half_width.abs(),
        }
    }

    /// Strict containment test.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value > self.lower && value < self.upper
    }
}

impl Default for Rope {
    fn default() -> Self {
        Self::symmetric(0.02)
    }
}

/// Region-fraction thresholds that resolve the experiment.
///
/// A fraction at or below `lower` means the arms are confidently different;
/// at or above `upper` means confidently practically equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionThresholds {
    /// Resolved-different threshold.
    pub lower: f64,
    /// Resolved-equivalent threshold.
    pub upper: f64,
}

impl Default for RegionThresholds {
    fn default() -> Self {
        Self {
            lower: 0.05,
            upper: 0.95,
        }
    }
}

/// Configuration for one sequential run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    rope: Rope,
    min_difference_delta: f64,
    samples_per_day: usize,
    hdi_mass: f64,
    min_processed_days: usize,
    thresholds: RegionThresholds,
    seed: u64,
    initial_prior: BetaShape,
    capture_snapshots: bool,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            rope: Rope::default(),
            min_difference_delta: 0.0,
            samples_per_day: DEFAULT_SAMPLES_PER_DAY,
            hdi_mass: DEFAULT_HDI_MASS,
            min_processed_days: DEFAULT_MIN_PROCESSED_DAYS,
            thresholds: RegionThresholds::default(),
            seed: 42,
            initial_prior: BetaShape::uniform(),
            capture_snapshots: false,
        }
    }
}

impl ExperimentConfig {
    /// Create a builder starting from the defaults.
    #[must_use]
    pub fn builder() -> ExperimentConfigBuilder {
        ExperimentConfigBuilder::default()
    }

    /// Parse and validate a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `Error::Serialization` on malformed JSON and
    /// `Error::InvalidConfig` if the values fail validation.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns `Error::Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Region of practical equivalence.
    #[must_use]
    pub const fn rope(&self) -> Rope {
        self.rope
    }

    /// Minimum difference of interest used by the expected-loss computation.
    #[must_use]
    pub const fn min_difference_delta(&self) -> f64 {
        self.min_difference_delta
    }

    /// Monte Carlo draws per arm per day.
    #[must_use]
    pub const fn samples_per_day(&self) -> usize {
        self.samples_per_day
    }

    /// Highest-density interval mass.
    #[must_use]
    pub const fn hdi_mass(&self) -> f64 {
        self.hdi_mass
    }

    /// Processed-day floor before stopping is allowed.
    #[must_use]
    pub const fn min_processed_days(&self) -> usize {
        self.min_processed_days
    }

    /// Region-fraction stopping thresholds.
    #[must_use]
    pub const fn thresholds(&self) -> RegionThresholds {
        self.thresholds
    }

    /// Seed for the per-run random-number source.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Prior shape each arm starts from.
    #[must_use]
    pub const fn initial_prior(&self) -> BetaShape {
        self.initial_prior
    }

    /// Whether the runner keeps per-day difference draws for rendering.
    #[must_use]
    pub const fn capture_snapshots(&self) -> bool {
        self.capture_snapshots
    }

    /// Copy of this config with a different seed.
    #[must_use]
    pub fn with_seed(&self, seed: u64) -> Self {
        Self {
            seed,
            ..self.clone()
        }
    }

    /// Check all invariants.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` describing the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        let Rope { lower, upper } = self.rope;
        if !lower.is_finite() || !upper.is_finite() || lower >= upper {
            return Err(Error::InvalidConfig(format!(
                "rope bounds must be finite with lower < upper (got {lower}, {upper})"
            )));
        }
        if !self.min_difference_delta.is_finite() {
            return Err(Error::InvalidConfig(
                "min_difference_delta must be finite".to_string(),
            ));
        }
        if self.samples_per_day == 0 {
            return Err(Error::InvalidConfig(
                "samples_per_day must be at least 1".to_string(),
            ));
        }
        if !(self.hdi_mass > 0.0 && self.hdi_mass <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "hdi_mass must be in (0, 1] (got {})",
                self.hdi_mass
            )));
        }
        let RegionThresholds { lower, upper } = self.thresholds;
        if !(0.0..=1.0).contains(&lower) || !(0.0..=1.0).contains(&upper) || lower >= upper {
            return Err(Error::InvalidConfig(format!(
                "thresholds must satisfy 0 <= lower < upper <= 1 (got {lower}, {upper})"
            )));
        }
        if !self.initial_prior.is_valid() {
            return Err(Error::InvalidConfig(format!(
                "initial prior shapes must be positive (got {}, {})",
                self.initial_prior.alpha, self.initial_prior.beta
            )));
        }
        Ok(())
    }
}

/// Builder for `ExperimentConfig`.
#[derive(Debug, Default)]
pub struct ExperimentConfigBuilder {
    config: ExperimentConfig,
}

impl ExperimentConfigBuilder {
    /// Set the region of practical equivalence.
    #[must_use]
    pub const fn rope(mut self, lower: f64, upper: f64) -> Self {
        self.config.rope = Rope { lower, upper };
        self
    }

    /// Set the minimum difference of interest.
    #[must_use]
    pub const fn min_difference_delta(mut self, delta: f64) -> Self {
        self.config.min_difference_delta = delta;
        self
    }

    /// Set the Monte Carlo draws per arm per day.
    #[must_use]
    pub const fn samples_per_day(mut self, samples: usize) -> Self {
        self.config.samples_per_day = samples;
        self
    }

    /// Set the highest-density interval mass.
    #[must_use]
    pub const fn hdi_mass(mut self, mass: f64) -> Self {
        self.config.hdi_mass = mass;
        self
    }

    /// Set the processed-day floor before stopping.
    #[must_use]
    pub const fn min_processed_days(mut self, days: usize) -> Self {
        self.config.min_processed_days = days;
        self
    }

    /// Set the region-fraction thresholds.
    #[must_use]
    pub const fn thresholds(mut self, lower: f64, upper: f64) -> Self {
        self.config.thresholds = RegionThresholds { lower, upper };
        self
    }

    /// Set the RNG seed.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Set the initial prior shape for both arms.
    #[must_use]
    pub const fn initial_prior(mut self, alpha: f64, beta: f64) -> Self {
        self.config.initial_prior = BetaShape { alpha, beta };
        self
    }

    /// Keep per-day difference draws for external rendering.
    #[must_use]
    pub const fn capture_snapshots(mut self, capture: bool) -> Self {
        self.config.capture_snapshots = capture;
        self
    }

    /// Validate and build the config.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if any value is out of range.
    pub fn build(self) -> Result<ExperimentConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExperimentConfig::default();
        assert_eq!(config.samples_per_day(), 4000);
        assert!((config.hdi_mass() - 0.94).abs() < f64::EPSILON);
        assert_eq!(config.min_processed_days(), 14);
        assert_eq!(config.rope(), Rope::symmetric(0.02));
        assert_eq!(config.thresholds(), RegionThresholds::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rope_contains_is_strict() {
        let rope = Rope::symmetric(0.02);
        assert!(rope.contains(0.0));
        assert!(!rope.contains(0.02));
        assert!(!rope.contains(-0.02));
    }

    #[test]
    fn test_builder_rejects_inverted_rope() {
        let err = ExperimentConfig::builder().rope(0.1, -0.1).build().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_builder_rejects_zero_samples() {
        assert!(ExperimentConfig::builder().samples_per_day(0).build().is_err());
    }

    #[test]
    fn test_builder_rejects_bad_mass_and_thresholds() {
        assert!(ExperimentConfig::builder().hdi_mass(0.0).build().is_err());
        assert!(ExperimentConfig::builder().hdi_mass(1.5).build().is_err());
        assert!(ExperimentConfig::builder().thresholds(0.9, 0.1).build().is_err());
        assert!(ExperimentConfig::builder().initial_prior(0.0, 1.0).build().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            ExperimentConfig::from_json(r#"{"rope": {"lower": -0.01, "upper": 0.01}, "seed": 9}"#)
                .unwrap();
        assert_eq!(config.seed(), 9);
        assert_eq!(config.rope(), Rope::symmetric(0.01));
        assert_eq!(config.samples_per_day(), DEFAULT_SAMPLES_PER_DAY);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = ExperimentConfig::builder().seed(11).build().unwrap();
        let json = config.to_json().unwrap();
        assert_eq!(ExperimentConfig::from_json(&json).unwrap(), config);
    }
}
