//! Daily Result - one processed day's posterior summary

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::aggregator::DailyCounts;
use super::posterior::{CredibleInterval, ExpectedLoss, PosteriorEstimate, PosteriorSummary};

/// Posterior summary for one processed day.
///
/// Rows are appended to the experiment log in date order and never change
/// afterwards. `cumulative_sample_size` is the running sum of
/// `mean_sample_size` over all processed days up to and including this one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyResult {
    date: NaiveDate,
    day_index: usize,
    mean_sample_size: f64,
    control: PosteriorSummary,
    treatment: PosteriorSummary,
    difference: PosteriorSummary,
    probability_treatment_better: f64,
    region_fraction: f64,
    expected_loss: ExpectedLoss,
    cumulative_sample_size: f64,
}

impl DailyResult {
    /// Build a row from the day's counts and posterior estimate.
    ///
    /// # Arguments
    ///
    /// * `day_index` - 0-based index among processed (non-skipped) days
    /// * `day` - The date's own per-arm counts
    /// * `estimate` - Posterior statistics for the date
    /// * `previous_cumulative` - Cumulative sample size before this day
    #[must_use]
    pub fn new(
        day_index: usize,
        day: &DailyCounts,
        estimate: &PosteriorEstimate,
        previous_cumulative: f64,
    ) -> Self {
        let mean_sample_size = day.mean_sample_size();
        Self {
            date: day.date,
            day_index,
            mean_sample_size,
            control: estimate.control,
            treatment: estimate.treatment,
            difference: estimate.difference,
            probability_treatment_better: estimate.probability_treatment_better,
            region_fraction: estimate.region_fraction,
            expected_loss: estimate.expected_loss,
            cumulative_sample_size: previous_cumulative + mean_sample_size,
        }
    }

    /// Get the date.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Get the 0-based processed-day index.
    #[must_use]
    pub const fn day_index(&self) -> usize {
        self.day_index
    }

    /// Mean of the two arms' trials on this date.
    #[must_use]
    pub const fn mean_sample_size(&self) -> f64 {
        self.mean_sample_size
    }

    /// Control posterior mean and HDI.
    #[must_use]
    pub const fn control(&self) -> PosteriorSummary {
        self.control
    }

    /// Treatment posterior mean and HDI.
    #[must_use]
    pub const fn treatment(&self) -> PosteriorSummary {
        self.treatment
    }

    /// Difference (treatment - control) posterior mean and HDI.
    #[must_use]
    pub const fn difference(&self) -> PosteriorSummary {
        self.difference
    }

    /// HDI of the difference.
    #[must_use]
    pub const fn difference_hdi(&self) -> CredibleInterval {
        self.difference.hdi
    }

    /// `P(treatment > control)`.
    #[must_use]
    pub const fn probability_treatment_better(&self) -> f64 {
        self.probability_treatment_better
    }

    /// Fraction of difference draws inside the region of practical equivalence.
    #[must_use]
    pub const fn region_fraction(&self) -> f64 {
        self.region_fraction
    }

    /// Expected loss per arm.
    #[must_use]
    pub const fn expected_loss(&self) -> ExpectedLoss {
        self.expected_loss
    }

    /// Running sum of mean daily sample size.
    #[must_use]
    pub const fn cumulative_sample_size(&self) -> f64 {
        self.cumulative_sample_size
    }

    /// Element-wise comparison with an absolute tolerance on every float.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() <= tolerance;
        let summary_close = |a: PosteriorSummary, b: PosteriorSummary| {
            close(a.mean, b.mean) && close(a.hdi.lower, b.hdi.lower) && close(a.hdi.upper, b.hdi.upper)
        };

        self.date == other.date
            && self.day_index == other.day_index
            && close(self.mean_sample_size, other.mean_sample_size)
            && summary_close(self.control, other.control)
            && summary_close(self.treatment, other.treatment)
            && summary_close(self.difference, other.difference)
            && close(self.probability_treatment_better, other.probability_treatment_better)
            && close(self.region_fraction, other.region_fraction)
            && close(self.expected_loss.control, other.expected_loss.control)
            && close(self.expected_loss.treatment, other.expected_loss.treatment)
            && close(self.cumulative_sample_size, other.cumulative_sample_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExperimentConfig;
    use crate::experiment::aggregator::{ArmCounts, CumulativeCounts};
    use crate::experiment::posterior::PosteriorEstimator;
    use crate::experiment::prior::PriorParameters;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_daily_result_from_estimate() {
        let day = DailyCounts {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            control: ArmCounts::new(10, 100),
            treatment: ArmCounts::new(12, 120),
        };
        let totals = CumulativeCounts {
            control: day.control,
            treatment: day.treatment,
        };
        let config = ExperimentConfig::builder().samples_per_day(500).build().unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let estimate = PosteriorEstimator::from_config(&config)
            .estimate(&totals, &PriorParameters::default(), &mut rng)
            .unwrap();

        let row = DailyResult::new(2, &day, &estimate, 200.0);
        assert_eq!(row.day_index(), 2);
        assert_eq!(row.date(), day.date);
        assert!((row.mean_sample_size() - 110.0).abs() < f64::EPSILON);
        assert!((row.cumulative_sample_size() - 310.0).abs() < f64::EPSILON);
        assert!((row.region_fraction() - estimate.region_fraction).abs() < f64::EPSILON);
        assert!(row.approx_eq(&row, 0.0));
    }
}
