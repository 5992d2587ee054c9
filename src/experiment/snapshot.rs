//! Posterior Snapshot - per-day difference draws for external rendering
//!
//! The core only guarantees that a snapshot is reproducible from the run's
//! seed. How it is drawn (density plot, histogram) is up to the consumer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::posterior::{hdi_sorted, CredibleInterval, PosteriorSampleSet};
use crate::config::Rope;

/// Difference draws for one processed day, sorted ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorSnapshot {
    date: NaiveDate,
    day: usize,
    difference: Vec<f64>,
    hdi: CredibleInterval,
    rope: Rope,
    reference_value: f64,
}

impl PosteriorSnapshot {
    /// Capture the difference draws of one day.
    ///
    /// `day` is the 1-based processed-day number shown to readers.
    #[must_use]
    pub fn capture(
        date: NaiveDate,
        day: usize,
        samples: &PosteriorSampleSet,
        hdi_mass: f64,
        rope: Rope,
    ) -> Self {
        let mut difference = samples.difference().to_vec();
        difference.sort_by(f64::total_cmp);
        let hdi = hdi_sorted(&difference, hdi_mass);
        Self {
            date,
            day,
            difference,
            hdi,
            rope,
            reference_value: 0.0,
        }
    }

    /// Get the date.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// 1-based processed-day number.
    #[must_use]
    pub const fn day(&self) -> usize {
        self.day
    }

    /// Sorted difference draws.
    #[must_use]
    pub fn difference(&self) -> &[f64] {
        &self.difference
    }

    /// HDI of the difference draws.
    #[must_use]
    pub const fn hdi(&self) -> CredibleInterval {
        self.hdi
    }

    /// Region of practical equivalence to overlay.
    #[must_use]
    pub const fn rope(&self) -> Rope {
        self.rope
    }

    /// Reference value (no difference) to overlay.
    #[must_use]
    pub const fn reference_value(&self) -> f64 {
        self.reference_value
    }

    /// Title a renderer can put above the plot.
    #[must_use]
    pub fn title(&self) -> String {
        format!("Posterior Difference on {}", self.date.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_sorts_and_keeps_overlays() {
        let samples = PosteriorSampleSet::from_draws(vec![0.1, 0.1, 0.1], vec![0.3, 0.0, 0.1]);
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let snapshot = PosteriorSnapshot::capture(date, 4, &samples, 1.0, Rope::symmetric(0.02));

        assert_eq!(snapshot.day(), 4);
        assert_eq!(snapshot.difference().len(), 3);
        assert!(snapshot.difference().windows(2).all(|w| w[0] <= w[1]));
        assert!((snapshot.hdi().lower - snapshot.difference()[0]).abs() < f64::EPSILON);
        assert!(snapshot.reference_value().abs() < f64::EPSILON);
        assert_eq!(snapshot.title(), "Posterior Difference on 2024-02-29");
    }
}
