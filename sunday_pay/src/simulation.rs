//! Monte-Carlo shift-allocation simulator.
//!
//! Each trial simulates a year of Sunday "swap market": every month a
//! fixed quota of shifts is handed out across the pool by weighted
//! random draws.  The simulator reports, per trial, the average number
//! of Sundays per month worked by the pool's representative member.
//!
//! Trials are independent and run in parallel with [`rayon`].  Every
//! trial draws from its own ChaCha8 stream, selected by trial index on
//! top of the caller's seed, so results do not depend on scheduling.

use crate::error::{ensure_range, PayError, Result};
use crate::staffing::{StaffPoolConfig, TargetSelection};
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const MONTHS_PER_TRIAL: usize = 12;

/// Percentiles reported for a run: low, median, high.
pub const REPORTED_PERCENTILES: [f64; 3] = [10.0, 50.0, 90.0];

/// How a month's shifts are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMode {
    /// One shift at a time, skipping anyone already at the monthly cap.
    /// When everybody eligible is at the cap the cap is lifted for the
    /// rest of the month.
    #[default]
    Capped,
    /// All of the month's shifts in one multinomial draw over the
    /// weights.  Ignores the cap.
    Multinomial,
}

/// Shifts allocated in one trial, indexed `[month][staff]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialRun {
    pub months: Vec<Vec<u32>>,
}

impl TrialRun {
    pub fn month_totals(&self) -> Vec<u32> {
        self.months.iter().map(|m| m.iter().sum()).collect()
    }

    /// Average shifts per month for one staff member.
    pub fn average_for(&self, index: usize) -> f64 {
        if self.months.is_empty() {
            return 0.0;
        }
        let total: u32 = self
            .months
            .iter()
            .map(|m| m.get(index).copied().unwrap_or(0))
            .sum();
        total as f64 / self.months.len() as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Outcomes of a run together with the parameters that shaped it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub target: TargetSelection,
    pub monthly_quota: u32,
    pub monthly_cap: u32,
    pub allocation: AllocationMode,
    pub outcomes: Vec<f64>,
    pub summary: SimulationSummary,
}

/// Allocates one month of shifts.
///
/// Returns a per-staff count.  If no one has positive weight the month
/// is left unfilled and every count is zero.
pub fn allocate_month<R: Rng + ?Sized>(
    weights: &[f64],
    quota: u32,
    cap: u32,
    mode: AllocationMode,
    rng: &mut R,
) -> Vec<u32> {
    let mut counts = vec![0u32; weights.len()];
    let Ok(uncapped) = WeightedIndex::new(weights) else {
        return counts;
    };

    match mode {
        AllocationMode::Multinomial => {
            for _ in 0..quota {
                counts[uncapped.sample(rng)] += 1;
            }
        }
        AllocationMode::Capped => {
            let mut eligible = weights.to_vec();
            // None once everyone eligible has reached the cap.
            let mut capped = WeightedIndex::new(&eligible).ok();
            for _ in 0..quota {
                let pick = match &capped {
                    Some(dist) => dist.sample(rng),
                    None => uncapped.sample(rng),
                };
                counts[pick] += 1;
                if capped.is_some() && counts[pick] >= cap {
                    eligible[pick] = 0.0;
                    capped = WeightedIndex::new(&eligible).ok();
                }
            }
        }
    }
    counts
}

/// Simulates [`MONTHS_PER_TRIAL`] months for a pool.
pub fn run_trial<R: Rng + ?Sized>(pool: &StaffPoolConfig, rng: &mut R) -> TrialRun {
    let weights = pool.weights();
    let quota = pool.monthly_quota();
    let cap = pool.cap();
    let months = (0..MONTHS_PER_TRIAL)
        .map(|_| allocate_month(&weights, quota, cap, pool.allocation, rng))
        .collect();
    TrialRun { months }
}

/// Number of single-shift draws a run of `trials` trials makes.
pub fn shift_draws(pool: &StaffPoolConfig, trials: usize) -> u64 {
    (trials as u64)
        .saturating_mul(MONTHS_PER_TRIAL as u64)
        .saturating_mul(u64::from(pool.monthly_quota()))
}

/// Random stream for one trial.
pub fn trial_rng(seed: u64, trial: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(trial);
    rng
}

/// Average Sundays per month for the representative worker, one value
/// per trial, in trial order.
pub fn simulate_shift_allocation(
    pool: &StaffPoolConfig,
    trials: usize,
    seed: u64,
) -> Result<Vec<f64>> {
    pool.validate()?;
    if trials == 0 {
        return Err(PayError::TrialsZero);
    }
    let target = pool.resolve_target();
    debug!(
        trials,
        seed,
        quota = pool.monthly_quota(),
        cap = pool.cap(),
        target = target.index,
        mode = ?pool.allocation,
        "simulating shift allocation"
    );
    let outcomes = (0..trials)
        .into_par_iter()
        .map(|trial| {
            let mut rng = trial_rng(seed, trial as u64);
            run_trial(pool, &mut rng).average_for(target.index)
        })
        .collect();
    Ok(outcomes)
}

/// Runs the simulator and summarises the outcome distribution.
pub fn run_simulation(
    pool: &StaffPoolConfig,
    trials: usize,
    seed: u64,
) -> Result<SimulationReport> {
    let outcomes = simulate_shift_allocation(pool, trials, seed)?;
    let summary = summarise(&outcomes)?;
    Ok(SimulationReport {
        target: pool.resolve_target(),
        monthly_quota: pool.monthly_quota(),
        monthly_cap: pool.cap(),
        allocation: pool.allocation,
        outcomes,
        summary,
    })
}

pub fn summarise(outcomes: &[f64]) -> Result<SimulationSummary> {
    let points = percentiles(outcomes, &REPORTED_PERCENTILES)?;
    let (min, max) = outcomes
        .iter()
        .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            None => Some((v, v)),
        })
        .unwrap_or((0.0, 0.0));
    let mean = if outcomes.is_empty() {
        0.0
    } else {
        outcomes.iter().sum::<f64>() / outcomes.len() as f64
    };
    Ok(SimulationSummary {
        p10: points[0],
        p50: points[1],
        p90: points[2],
        mean,
        min,
        max,
    })
}

/// Percentiles by linear interpolation between closest ranks.  Every
/// point must lie in `[0, 100]`; an empty input yields zeros.
pub fn percentiles(values: &[f64], points: &[f64]) -> Result<Vec<f64>> {
    for &p in points {
        ensure_range("percentile", p, 0.0, 100.0, "between 0 and 100")?;
    }
    if values.is_empty() {
        return Ok(vec![0.0; points.len()]);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Ok(points.iter().map(|&p| percentile(&sorted, p)).collect())
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let rank = (p / 100.0) * (n as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        sorted[lower]
    } else {
        let w = rank - lower as f64;
        sorted[lower] * (1.0 - w) + sorted[upper] * w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staffing::PersonType;
    use proptest::prelude::*;

    fn pool() -> StaffPoolConfig {
        StaffPoolConfig::default()
    }

    #[test]
    fn same_seed_reproduces_outcomes() {
        let a = simulate_shift_allocation(&pool(), 64, 42).unwrap();
        let b = simulate_shift_allocation(&pool(), 64, 42).unwrap();
        assert_eq!(a, b);
        let c = simulate_shift_allocation(&pool(), 64, 43).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn trial_outcomes_do_not_depend_on_trial_count() {
        let short = simulate_shift_allocation(&pool(), 5, 7).unwrap();
        let long = simulate_shift_allocation(&pool(), 20, 7).unwrap();
        assert_eq!(short[..], long[..5]);
    }

    #[test]
    fn uncapped_month_fills_quota_exactly() {
        let weights = [0.0, 1.0, 1.0, 2.0, 1.0];
        let mut rng = trial_rng(1, 0);
        for mode in [AllocationMode::Capped, AllocationMode::Multinomial] {
            let counts = allocate_month(&weights, 9, 100, mode, &mut rng);
            assert_eq!(counts.iter().sum::<u32>(), 9);
            assert_eq!(counts[0], 0);
        }
    }

    #[test]
    fn capped_month_respects_cap_when_capacity_allows() {
        let p = pool();
        let mut rng = trial_rng(11, 3);
        let run = run_trial(&p, &mut rng);
        assert_eq!(run.months.len(), MONTHS_PER_TRIAL);
        for month in &run.months {
            // 18 eligible staff at a cap of 4 cover the quota of 22.
            assert!(month.iter().all(|&c| c <= p.cap()));
            assert_eq!(month.iter().sum::<u32>(), p.monthly_quota());
        }
    }

    #[test]
    fn cap_is_relaxed_once_everyone_is_capped() {
        let weights = [0.0, 1.0, 1.0];
        let mut rng = trial_rng(5, 0);
        let counts = allocate_month(&weights, 10, 2, AllocationMode::Capped, &mut rng);
        assert_eq!(counts.iter().sum::<u32>(), 10);
        assert_eq!(counts[0], 0);
        assert!(counts[1] >= 2 && counts[2] >= 2);
    }

    #[test]
    fn opt_outs_never_work() {
        for allocation in [AllocationMode::Capped, AllocationMode::Multinomial] {
            let p = StaffPoolConfig {
                allocation,
                ..pool()
            };
            for trial in 0..20 {
                let run = run_trial(&p, &mut trial_rng(99, trial));
                for month in &run.months {
                    assert!(month[..p.opt_out].iter().all(|&c| c == 0));
                }
            }
        }
    }

    #[test]
    fn all_opt_out_pool_leaves_shifts_unfilled() {
        let p = StaffPoolConfig {
            total_staff: 5,
            opt_out: 5,
            ..pool()
        };
        let run = run_trial(&p, &mut trial_rng(3, 0));
        assert!(run.month_totals().iter().all(|&t| t == 0));

        let outcomes = simulate_shift_allocation(&p, 10, 3).unwrap();
        assert_eq!(outcomes, vec![0.0; 10]);
    }

    #[test]
    fn keen_workers_take_more_shifts() {
        let keen = StaffPoolConfig {
            keen: 2,
            keen_weight: 3.0,
            target: PersonType::Keen,
            ..pool()
        };
        let average = StaffPoolConfig {
            target: PersonType::Average,
            ..keen.clone()
        };
        let keen_summary = run_simulation(&keen, 200, 8).unwrap().summary;
        let average_summary = run_simulation(&average, 200, 8).unwrap().summary;
        assert!(keen_summary.p50 > average_summary.p50);
        assert!(keen_summary.max <= keen.cap() as f64);
    }

    #[test]
    fn simulate_rejects_zero_trials_and_bad_pools() {
        assert_eq!(
            simulate_shift_allocation(&pool(), 0, 1),
            Err(PayError::TrialsZero)
        );
        let bad = StaffPoolConfig {
            opt_out: 30,
            ..pool()
        };
        assert!(matches!(
            simulate_shift_allocation(&bad, 10, 1),
            Err(PayError::InvalidStaffPool(_))
        ));
    }

    #[test]
    fn shift_draws_counts_every_month() {
        // 22 shifts a month for the default pool.
        assert_eq!(shift_draws(&pool(), 10), 10 * 12 * 22);
        assert_eq!(shift_draws(&pool(), 0), 0);
    }

    #[test]
    fn report_carries_target_and_summary() {
        let report = run_simulation(&pool(), 50, 2).unwrap();
        assert_eq!(report.target.index, 4);
        assert_eq!(report.monthly_quota, 22);
        assert_eq!(report.monthly_cap, 4);
        assert_eq!(report.outcomes.len(), 50);
        assert!(report.summary.min <= report.summary.p10);
        assert!(report.summary.p90 <= report.summary.max);
    }

    #[test]
    fn percentile_interpolates_between_points() {
        let values = [4.0, 1.0, 3.0, 2.0];
        let points = percentiles(&values, &[0.0, 25.0, 50.0, 100.0]).unwrap();
        assert_eq!(points, vec![1.0, 1.75, 2.5, 4.0]);
    }

    #[test]
    fn percentiles_of_empty_input_are_zero() {
        assert_eq!(percentiles(&[], &REPORTED_PERCENTILES).unwrap(), vec![0.0; 3]);
        assert_eq!(percentiles(&[2.5], &REPORTED_PERCENTILES).unwrap(), vec![2.5; 3]);
    }

    #[test]
    fn percentile_points_outside_0_to_100_are_rejected() {
        let values = [1.0, 2.0, 3.0];
        for p in [-1.0, 100.5, f64::NAN] {
            assert!(matches!(
                percentiles(&values, &[50.0, p]),
                Err(PayError::OutOfRange { field: "percentile", .. })
            ));
        }
        assert!(percentiles(&[], &[150.0]).is_err());
    }

    proptest! {
        #[test]
        fn prop_percentiles_are_ordered(values in proptest::collection::vec(0.0f64..5.0, 1..200)) {
            let p = percentiles(&values, &REPORTED_PERCENTILES).unwrap();
            prop_assert!(p[0] <= p[1]);
            prop_assert!(p[1] <= p[2]);
        }

        #[test]
        fn prop_multinomial_conserves_quota(seed in any::<u64>(), quota in 0u32..60) {
            let weights = [0.0, 1.0, 2.5, 1.0];
            let counts = allocate_month(&weights, quota, 1, AllocationMode::Multinomial, &mut trial_rng(seed, 0));
            prop_assert_eq!(counts.iter().sum::<u32>(), quota);
            prop_assert_eq!(counts[0], 0);
        }
    }
}
