//! Synthetic daily observations for simulations and tests
//!
//! Each day both arms receive `daily_trials` units; conversions are drawn
//! from `Binomial(daily_trials, rate)` with a seeded RNG.

use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Binomial, Distribution};
use serde::{Deserialize, Serialize};

use crate::observation::{Arm, ExperimentObservation};
use crate::{Error, Result};

/// Parameters of a simulated experiment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyntheticExperiment {
    /// True control conversion rate.
    pub control_rate: f64,
    /// True treatment conversion rate.
    pub treatment_rate: f64,
    /// Units per arm per day.
    pub daily_trials: u64,
    /// Number of days to generate.
    pub days: u32,
    /// First date.
    pub start_date: NaiveDate,
    /// RNG seed for the conversion draws.
    pub seed: u64,
}

impl SyntheticExperiment {
    /// Both arms share `rate` (no real effect), 30 days.
    #[must_use]
    pub fn null_effect(rate: f64, daily_trials: u64, start_date: NaiveDate) -> Self {
        Self {
            control_rate: rate,
            treatment_rate: rate,
            daily_trials,
            days: 30,
            start_date,
            seed: 0,
        }
    }

    /// Treatment rate shifted by `lift` (absolute), clamped to `[0, 1]`.
    #[must_use]
    pub fn with_lift(mut self, lift: f64) -> Self {
        self.treatment_rate = (self.control_rate + lift).clamp(0.0, 1.0);
        self
    }

    /// Override the number of days.
    #[must_use]
    pub const fn with_days(mut self, days: u32) -> Self {
        self.days = days;
        self
    }

    /// Override the seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Generate one control and one treatment record per day.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if a rate is outside `[0, 1]`.
    pub fn generate(&self) -> Result<Vec<ExperimentObservation>> {
        let control = binomial(self.daily_trials, self.control_rate)?;
        let treatment = binomial(self.daily_trials, self.treatment_rate)?;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut observations = Vec::with_capacity(self.days as usize * 2);
        for offset in 0..self.days {
            let date = self.start_date + Days::new(u64::from(offset));
            observations.push(ExperimentObservation::new(
                date,
                Arm::Control,
                control.sample(&mut rng),
                self.daily_trials,
            ));
            observations.push(ExperimentObservation::new(
                date,
                Arm::Treatment,
                treatment.sample(&mut rng),
                self.daily_trials,
            ));
        }
        Ok(observations)
    }
}

fn binomial(trials: u64, rate: f64) -> Result<Binomial> {
    Binomial::new(trials, rate)
        .map_err(|e| Error::InvalidConfig(format!("conversion rate {rate} is invalid: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn test_generates_one_record_per_arm_per_day() {
        let obs = SyntheticExperiment::null_effect(0.1, 100, start())
            .with_days(5)
            .generate()
            .unwrap();
        assert_eq!(obs.len(), 10);
        assert!(obs.iter().all(|o| o.trials() == 100 && o.validate().is_ok()));
        assert_eq!(obs[9].date(), NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    }

    #[test]
    fn test_same_seed_same_data() {
        let sim = SyntheticExperiment::null_effect(0.3, 50, start()).with_seed(8);
        assert_eq!(sim.generate().unwrap(), sim.generate().unwrap());
    }

    #[test]
    fn test_invalid_rate_rejected() {
        let mut sim = SyntheticExperiment::null_effect(0.1, 10, start());
        sim.treatment_rate = 1.5;
        assert!(matches!(sim.generate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_with_lift_clamps() {
        let sim = SyntheticExperiment::null_effect(0.9, 10, start()).with_lift(0.5);
        assert!((sim.treatment_rate - 1.0).abs() < f64::EPSILON);
    }
}
