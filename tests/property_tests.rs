//! Property-based tests for trueno-ab
//!
//! Following ruchy/trueno/aprender pattern:
//! - Test mathematical invariants
//! - Test data integrity properties
//! - Run with ProptestConfig::with_cases(..)
//! - Must complete in <30 seconds for pre-commit hook

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use trueno_ab::config::ExperimentConfig;
use trueno_ab::experiment::{
    expected_loss, hdi, Ingest, ObservationAggregator, PosteriorSampleSet, PriorParameters,
    SequentialRunner,
};
use trueno_ab::observation::{Arm, ExperimentObservation};

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

/// Generate paired draws in [0, 1]
fn arb_draws(max_len: usize) -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (1..=max_len).prop_flat_map(|n| {
        (
            proptest::collection::vec(0.0f64..=1.0, n),
            proptest::collection::vec(0.0f64..=1.0, n),
        )
    })
}

/// Generate one valid (conversions, trials) pair
fn arb_counts() -> impl Strategy<Value = (u64, u64)> {
    (0u64..500).prop_flat_map(|trials| (0..=trials, Just(trials)))
}

/// Generate daily records for both arms, some dates missing an arm
fn arb_days(max_days: usize) -> impl Strategy<Value = Vec<Option<((u64, u64), (u64, u64))>>> {
    proptest::collection::vec(
        prop_oneof![
            4 => (arb_counts(), arb_counts()).prop_map(Some),
            1 => Just(None),
        ],
        1..=max_days,
    )
}

fn date(offset: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Days::new(offset as u64)
}

fn observations(days: &[Option<((u64, u64), (u64, u64))>]) -> Vec<ExperimentObservation> {
    days.iter()
        .enumerate()
        .flat_map(|(offset, day)| match day {
            Some((c, t)) => vec![
                ExperimentObservation::new(date(offset), Arm::Control, c.0, c.1),
                ExperimentObservation::new(date(offset), Arm::Treatment, t.0, t.1),
            ],
            None => vec![ExperimentObservation::new(date(offset), Arm::Control, 0, 1)],
        })
        .collect()
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: expected losses are means of non-negative terms
    #[test]
    fn prop_expected_loss_non_negative(
        (control, treatment) in arb_draws(200),
        delta in -0.1f64..0.1
    ) {
        let loss = expected_loss(&control, &treatment, delta);
        prop_assert!(loss.control >= 0.0);
        prop_assert!(loss.treatment >= 0.0);
    }

    /// Property: P(T > C) and P(C >= T) are complementary
    #[test]
    fn prop_probabilities_complementary((control, treatment) in arb_draws(200)) {
        let set = PosteriorSampleSet::from_draws(control, treatment);
        let sum = set.probability_treatment_better() + set.probability_control_better_or_equal();
        prop_assert!((sum - 1.0).abs() < 1e-9);
    }

    /// Property: HDI holds at least ceil(mass * N) draws and lies within the sample range
    #[test]
    fn prop_hdi_covers_mass(
        (samples, _) in arb_draws(300),
        mass in 0.05f64..=1.0
    ) {
        let interval = hdi(&samples, mass);
        let inside = samples
            .iter()
            .filter(|&&x| x >= interval.lower && x <= interval.upper)
            .count();
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let required = ((mass * samples.len() as f64).ceil() as usize).clamp(1, samples.len());

        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(interval.lower <= interval.upper);
        prop_assert!(inside >= required);
        prop_assert!(interval.lower >= min && interval.upper <= max);
    }

    /// Property: cumulative totals never decrease and never exceed trials
    #[test]
    fn prop_aggregator_totals_monotone(days in arb_days(40)) {
        let mut aggregator = ObservationAggregator::new();
        let mut prior = PriorParameters::default();
        let mut previous = aggregator.totals();

        for (offset, day) in days.iter().enumerate() {
            let records = day.map(|(c, t)| (
                ExperimentObservation::new(date(offset), Arm::Control, c.0, c.1),
                ExperimentObservation::new(date(offset), Arm::Treatment, t.0, t.1),
            ));
            let outcome = aggregator
                .ingest(date(offset), records.as_ref().map(|r| &r.0), records.as_ref().map(|r| &r.1))
                .unwrap();
            if let Ingest::Accumulated { day, .. } = outcome {
                prior = prior.advance(&day);
            }

            let totals = aggregator.totals();
            for arm in [Arm::Control, Arm::Treatment] {
                prop_assert!(totals.arm(arm).conversions >= previous.arm(arm).conversions);
                prop_assert!(totals.arm(arm).trials >= previous.arm(arm).trials);
                prop_assert!(totals.arm(arm).conversions <= totals.arm(arm).trials);
                prop_assert!(prior.arm(arm).is_valid());
            }
            previous = totals;
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(25))]

    /// Property: log rows are date-ordered with a running cumulative sample size
    #[test]
    fn prop_runner_log_consistent(days in arb_days(25), seed in any::<u64>()) {
        let config = ExperimentConfig::builder()
            .samples_per_day(200)
            .seed(seed)
            .build()
            .unwrap();
        let log = SequentialRunner::new(config).unwrap().run(&observations(&days)).unwrap();

        let processed = days.iter().filter(|d| d.is_some()).count();
        prop_assert!(log.len() <= processed);
        if !log.decision().stopped {
            prop_assert_eq!(log.len(), processed);
            prop_assert_eq!(log.skipped_dates().len(), days.len() - processed);
        }

        let mut running = 0.0;
        for (index, row) in log.results().iter().enumerate() {
            running += row.mean_sample_size();
            prop_assert_eq!(row.day_index(), index);
            prop_assert!((row.cumulative_sample_size() - running).abs() < 1e-9);
            prop_assert!((0.0..=1.0).contains(&row.region_fraction()));
            prop_assert!(row.expected_loss().control >= 0.0);
            prop_assert!(row.expected_loss().treatment >= 0.0);
        }
        for pair in log.results().windows(2) {
            prop_assert!(pair[0].date() < pair[1].date());
        }
    }
}
