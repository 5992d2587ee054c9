//! Posterior Estimator - closed-form Beta draws and Monte Carlo statistics
//!
//! Each arm is an independent Beta-Binomial model, so the posterior is
//! `Beta(alpha_prior + conversions, beta_prior + trials - conversions)` and
//! is sampled directly. No MCMC chain is involved.
//!
//! ## Statistics per day
//!
//! ```text
//! control[i]    ~ Beta(a_c, b_c)          i = 0..N
//! treatment[i]  ~ Beta(a_t, b_t)
//! difference[i] = treatment[i] - control[i]
//!
//! P(T > C)        = #{difference[i] > 0} / N
//! region_fraction = #{rope.lower < difference[i] < rope.upper} / N
//! ```
//!
//! Randomness comes from the caller's RNG so runs stay reproducible and
//! independent runs never share a stream.

use rand::Rng;
use rand_distr::{Beta, Distribution};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::aggregator::CumulativeCounts;
use super::prior::{BetaShape, PriorParameters};
use crate::config::{ExperimentConfig, Rope};
use crate::observation::Arm;
use crate::{Error, Result};

/// Interval bounds over posterior draws.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CredibleInterval {
    /// Lower bound.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
}

impl CredibleInterval {
    /// `upper - lower`.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Inclusive containment test.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Posterior mean and highest-density interval of one quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PosteriorSummary {
    /// Sample mean.
    pub mean: f64,
    /// Highest-density interval.
    pub hdi: CredibleInterval,
}

impl PosteriorSummary {
    /// Summarize a set of draws at the given interval mass.
    #[must_use]
    pub fn from_samples(samples: &[f64], mass: f64) -> Self {
        Self {
            mean: mean(samples),
            hdi: hdi(samples, mass),
        }
    }
}

/// Expected regret of shipping each arm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpectedLoss {
    /// Loss of keeping control when treatment is better.
    pub control: f64,
    /// Loss of shipping treatment when control is better.
    pub treatment: f64,
}

/// Index-paired posterior draws for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct PosteriorSampleSet {
    control: Vec<f64>,
    treatment: Vec<f64>,
    difference: Vec<f64>,
}

impl PosteriorSampleSet {
    /// Draw `n` samples per arm: all control draws first, then all treatment draws.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPrior` if either shape is not strictly positive.
    pub fn draw<R: Rng + ?Sized>(
        control: BetaShape,
        treatment: BetaShape,
        n: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let control = draw_arm(Arm::Control, control, n, rng)?;
        let treatment = draw_arm(Arm::Treatment, treatment, n, rng)?;
        Ok(Self::from_draws(control, treatment))
    }

    /// Pair existing draws by index.
    ///
    /// Extra draws on the longer side are dropped.
    #[must_use]
    pub fn from_draws(mut control: Vec<f64>, mut treatment: Vec<f64>) -> Self {
        let n = control.len().min(treatment.len());
        control.truncate(n);
        treatment.truncate(n);
        let difference = control
            .iter()
            .zip(&treatment)
            .map(|(c, t)| t - c)
            .collect();
        Self {
            control,
            treatment,
            difference,
        }
    }

    /// Number of paired draws.
    #[must_use]
    pub fn len(&self) -> usize {
        self.difference.len()
    }

    /// True when no draws are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.difference.is_empty()
    }

    /// Control draws.
    #[must_use]
    pub fn control(&self) -> &[f64] {
        &self.control
    }

    /// Treatment draws.
    #[must_use]
    pub fn treatment(&self) -> &[f64] {
        &self.treatment
    }

    /// `treatment[i] - control[i]`.
    #[must_use]
    pub fn difference(&self) -> &[f64] {
        &self.difference
    }

    /// Fraction of difference draws satisfying `predicate`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn difference_fraction(&self, predicate: impl Fn(f64) -> bool) -> f64 {
        if self.difference.is_empty() {
            return f64::NAN;
        }
        let hits = self.difference.iter().filter(|&&d| predicate(d)).count();
        hits as f64 / self.difference.len() as f64
    }

    /// `P(treatment > control)`.
    #[must_use]
    pub fn probability_treatment_better(&self) -> f64 {
        self.difference_fraction(|d| d > 0.0)
    }

    /// `P(control >= treatment)`, counted over the same draws.
    #[must_use]
    pub fn probability_control_better_or_equal(&self) -> f64 {
        self.difference_fraction(|d| d <= 0.0)
    }

    /// Fraction of difference draws strictly inside the region.
    #[must_use]
    pub fn region_fraction(&self, rope: Rope) -> f64 {
        self.difference_fraction(|d| rope.contains(d))
    }

    /// Expected loss per arm with minimum difference of interest `delta`.
    #[must_use]
    pub fn expected_loss(&self, delta: f64) -> ExpectedLoss {
        expected_loss(&self.control, &self.treatment, delta)
    }
}

/// Everything the estimator derives for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct PosteriorEstimate {
    /// Effective control shape used for sampling.
    pub control_shape: BetaShape,
    /// Effective treatment shape used for sampling.
    pub treatment_shape: BetaShape,
    /// Control posterior summary.
    pub control: PosteriorSummary,
    /// Treatment posterior summary.
    pub treatment: PosteriorSummary,
    /// Difference (treatment - control) summary.
    pub difference: PosteriorSummary,
    /// `P(treatment > control)`.
    pub probability_treatment_better: f64,
    /// Fraction of difference draws inside the region of practical equivalence.
    pub region_fraction: f64,
    /// Expected loss per arm.
    pub expected_loss: ExpectedLoss,
    /// The draws everything above was computed from.
    pub samples: PosteriorSampleSet,
}

/// Per-day posterior estimation for the two-arm Beta-Binomial model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PosteriorEstimator {
    samples_per_day: usize,
    hdi_mass: f64,
    rope: Rope,
    min_difference_delta: f64,
}

impl PosteriorEstimator {
    /// Create an estimator.
    #[must_use]
    pub const fn new(samples_per_day: usize, hdi_mass: f64, rope: Rope, min_difference_delta: f64) -> Self {
        Self {
            samples_per_day,
            hdi_mass,
            rope,
            min_difference_delta,
        }
    }

    /// Create an estimator from an experiment config.
    #[must_use]
    pub const fn from_config(config: &ExperimentConfig) -> Self {
        Self::new(
            config.samples_per_day(),
            config.hdi_mass(),
            config.rope(),
            config.min_difference_delta(),
        )
    }

    /// Effective posterior shape: carried prior plus cumulative counts.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPrior` if the result is not strictly positive.
    pub fn effective_shape(
        arm: Arm,
        prior: &PriorParameters,
        totals: &CumulativeCounts,
    ) -> Result<BetaShape> {
        prior.arm(arm).plus_counts(totals.arm(arm)).ensure_valid(arm)
    }

    /// Estimate one day's posterior statistics.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidPrior` if an effective shape is non-positive
    /// - `Error::InvalidConfig` if the estimator was built with zero samples
    pub fn estimate<R: Rng + ?Sized>(
        &self,
        totals: &CumulativeCounts,
        prior: &PriorParameters,
        rng: &mut R,
    ) -> Result<PosteriorEstimate> {
        if self.samples_per_day == 0 {
            return Err(Error::InvalidConfig(
                "samples_per_day must be at least 1".to_string(),
            ));
        }

        let control_shape = Self::effective_shape(Arm::Control, prior, totals)?;
        let treatment_shape = Self::effective_shape(Arm::Treatment, prior, totals)?;
        let samples =
            PosteriorSampleSet::draw(control_shape, treatment_shape, self.samples_per_day, rng)?;

        let estimate = PosteriorEstimate {
            control_shape,
            treatment_shape,
            control: PosteriorSummary::from_samples(samples.control(), self.hdi_mass),
            treatment: PosteriorSummary::from_samples(samples.treatment(), self.hdi_mass),
            difference: PosteriorSummary::from_samples(samples.difference(), self.hdi_mass),
            probability_treatment_better: samples.probability_treatment_better(),
            region_fraction: samples.region_fraction(self.rope),
            expected_loss: samples.expected_loss(self.min_difference_delta),
            samples,
        };

        debug!(
            alpha_control = control_shape.alpha,
            beta_control = control_shape.beta,
            alpha_treatment = treatment_shape.alpha,
            beta_treatment = treatment_shape.beta,
            p_better = estimate.probability_treatment_better,
            region_fraction = estimate.region_fraction,
            "posterior estimated"
        );

        Ok(estimate)
    }
}

fn draw_arm<R: Rng + ?Sized>(arm: Arm, shape: BetaShape, n: usize, rng: &mut R) -> Result<Vec<f64>> {
    let shape = shape.ensure_valid(arm)?;
    let dist = Beta::new(shape.alpha, shape.beta).map_err(|_| Error::InvalidPrior {
        arm,
        alpha: shape.alpha,
        beta: shape.beta,
    })?;
    Ok((0..n).map(|_| dist.sample(rng)).collect())
}

/// Arithmetic mean; NaN for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return f64::NAN;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Highest-density interval of `samples` at `mass`.
///
/// Sorts a copy and returns the narrowest window holding `ceil(mass * N)`
/// draws. Ties keep the lowest window. NaN bounds for an empty slice.
#[must_use]
pub fn hdi(samples: &[f64], mass: f64) -> CredibleInterval {
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    hdi_sorted(&sorted, mass)
}

/// [`hdi`] over draws that are already sorted ascending.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn hdi_sorted(sorted: &[f64], mass: f64) -> CredibleInterval {
    let n = sorted.len();
    if n == 0 {
        return CredibleInterval {
            lower: f64::NAN,
            upper: f64::NAN,
        };
    }

    let window = ((mass * n as f64).ceil() as usize).clamp(1, n);
    let mut best = 0;
    let mut best_width = f64::INFINITY;
    for start in 0..=(n - window) {
        let width = sorted[start + window - 1] - sorted[start];
        if width < best_width {
            best_width = width;
            best = start;
        }
    }

    CredibleInterval {
        lower: sorted[best],
        upper: sorted[best + window - 1],
    }
}

/// Expected loss over index-paired draws.
///
/// `treatment_won[i] = control[i] < treatment[i]`. Control's loss only counts
/// draws treatment won; treatment's loss only counts the rest. Both are means
/// of non-negative terms.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn expected_loss(control: &[f64], treatment: &[f64], delta: f64) -> ExpectedLoss {
    let n = control.len().min(treatment.len());
    if n == 0 {
        return ExpectedLoss {
            control: f64::NAN,
            treatment: f64::NAN,
        };
    }

    let (loss_control, loss_treatment) = control.iter().zip(treatment).fold(
        (0.0_f64, 0.0_f64),
        |(acc_c, acc_t), (&c, &t)| {
            let shifted = t - delta;
            if c < t {
                (acc_c + (shifted - c).max(0.0), acc_t)
            } else {
                (acc_c, acc_t + (c - shifted).max(0.0))
            }
        },
    );

    ExpectedLoss {
        control: loss_control / n as f64,
        treatment: loss_treatment / n as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::aggregator::ArmCounts;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn estimator() -> PosteriorEstimator {
        PosteriorEstimator::from_config(&ExperimentConfig::default())
    }

    #[test]
    fn test_hdi_picks_narrowest_window() {
        // Nine tightly packed values and one outlier: a nine-draw window excludes the outlier.
        let samples = [0.10, 0.11, 0.12, 0.13, 0.14, 0.15, 0.16, 0.17, 0.18, 0.90];
        let interval = hdi(&samples, 0.85);
        assert!((interval.lower - 0.10).abs() < 1e-12);
        assert!((interval.upper - 0.18).abs() < 1e-12);
    }

    #[test]
    fn test_hdi_full_mass_spans_all() {
        let interval = hdi(&[3.0, 1.0, 2.0], 1.0);
        assert_eq!(interval, CredibleInterval { lower: 1.0, upper: 3.0 });
    }

    #[test]
    fn test_hdi_single_sample() {
        let interval = hdi(&[0.4], 0.94);
        assert_eq!(interval, CredibleInterval { lower: 0.4, upper: 0.4 });
        assert!(hdi(&[], 0.94).lower.is_nan());
    }

    #[test]
    fn test_expected_loss_hand_computed() {
        let control = [0.10, 0.30, 0.20];
        let treatment = [0.20, 0.10, 0.20];
        // draw 0: treatment won, loss_control = 0.10
        // draw 1: control won, loss_treatment = 0.20
        // draw 2: tie counts as control win, loss_treatment = 0
        let loss = expected_loss(&control, &treatment, 0.0);
        assert!((loss.control - 0.10 / 3.0).abs() < 1e-12);
        assert!((loss.treatment - 0.20 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_expected_loss_delta_shifts_treatment() {
        let loss = expected_loss(&[0.10], &[0.15], 0.10);
        // treatment won, but (0.15 - 0.10) - 0.10 < 0 so control loses nothing
        assert!(loss.control.abs() < f64::EPSILON);
        assert!(loss.treatment.abs() < f64::EPSILON);
    }

    #[test]
    fn test_uniform_prior_mean_near_half() {
        let mut rng = StdRng::seed_from_u64(1);
        let estimate = estimator()
            .estimate(&CumulativeCounts::default(), &PriorParameters::default(), &mut rng)
            .unwrap();
        assert!((estimate.control.mean - 0.5).abs() < 0.03);
        assert!((estimate.treatment.mean - 0.5).abs() < 0.03);
        assert_eq!(estimate.samples.len(), 4000);
    }

    #[test]
    fn test_effective_shape_adds_cumulative_counts() {
        let totals = CumulativeCounts {
            control: ArmCounts::new(10, 100),
            treatment: ArmCounts::new(0, 0),
        };
        let shape =
            PosteriorEstimator::effective_shape(Arm::Control, &PriorParameters::default(), &totals)
                .unwrap();
        assert_eq!(shape, BetaShape { alpha: 11.0, beta: 91.0 });
    }

    #[test]
    fn test_invalid_prior_is_rejected() {
        let prior = PriorParameters::new(BetaShape { alpha: -1.0, beta: 1.0 });
        let mut rng = StdRng::seed_from_u64(0);
        let err = estimator()
            .estimate(&CumulativeCounts::default(), &prior, &mut rng)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPrior { arm: Arm::Control, .. }));
    }

    #[test]
    fn test_probabilities_are_complementary() {
        let set = PosteriorSampleSet::from_draws(vec![0.1, 0.2, 0.3, 0.4], vec![0.2, 0.2, 0.1, 0.5]);
        let sum = set.probability_treatment_better() + set.probability_control_better_or_equal();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!((set.probability_treatment_better() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_region_fraction_is_strict() {
        let set = PosteriorSampleSet::from_draws(vec![0.0, 0.0, 0.0], vec![0.02, 0.01, -0.02]);
        assert!((set.region_fraction(Rope::symmetric(0.02)) - 1.0 / 3.0).abs() < 1e-12);
    }
}
