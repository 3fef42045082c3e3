//! Optimal time allocation for a fixed visiting order.
//!
//! Solves
//!
//! ```text
//! max_t  Σ w_i (1 - m_i)(1 - exp(-a_i t_i))
//! s.t.   Σ t_i = T,   t_i >= t_min
//! ```
//!
//! Stationarity of the Lagrangian gives the closed form
//! `t_i(λ) = max(t_min, ln(c_i / λ) / a_i)` with `c_i = w_i (1 - m_i) a_i`.
//! `Σ t_i(λ)` is non-increasing in `λ`, so `λ*` is found by bisection on
//! the budget equality.

use crate::config::PlanConfig;
use crate::error::{PlanError, Result};
use crate::learning_curve::learning_rate;
use crate::types::{LearnerState, Topic, TopicId};
use std::collections::BTreeMap;

const BISECTION_ITERATIONS: usize = 80;
const MAX_BRACKET_DOUBLINGS: usize = 50;
const RESIDUAL_TOLERANCE: f64 = 1e-9;
const GAP_TOLERANCE: f64 = 1e-8;
const LAMBDA_FLOOR: f64 = 1e-12;

/// Result of the allocator.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAllocation {
    /// Time per path position.
    pub times: Vec<f64>,
    /// Multiplier `λ*` of the budget constraint.
    pub lambda: f64,
}

impl TimeAllocation {
    /// Keys the allocation by topic id.
    pub fn by_topic(&self, path: &[&Topic]) -> BTreeMap<TopicId, f64> {
        path.iter()
            .zip(&self.times)
            .map(|(topic, &t)| (topic.id, t))
            .collect()
    }

    pub fn total(&self) -> f64 {
        self.times.iter().sum()
    }
}

/// Curve coefficients of every topic on the path.
struct Coefficients {
    rate: Vec<f64>,
    marginal: Vec<f64>,
}

impl Coefficients {
    fn new(path: &[&Topic], learner: &LearnerState, config: &PlanConfig) -> Self {
        let rate: Vec<f64> = path
            .iter()
            .map(|t| learning_rate(config.k, learner.ability, t.difficulty, config.eps))
            .collect();
        let marginal = path
            .iter()
            .zip(&rate)
            .map(|(t, &a)| (t.weight * (1.0 - t.mastery) * a).max(0.0))
            .collect();
        Self { rate, marginal }
    }

    fn time_at(&self, i: usize, lambda: f64, config: &PlanConfig) -> f64 {
        let lambda = lambda.max(f64::MIN_POSITIVE);
        // c_i = 0 maps to ln(0) = -inf, i.e. pinned at the floor
        let unconstrained = (self.marginal[i] / lambda).ln() / self.rate[i];
        unconstrained.max(config.min_time)
    }

    fn times_at(&self, lambda: f64, config: &PlanConfig) -> Vec<f64> {
        (0..self.rate.len())
            .map(|i| self.time_at(i, lambda, config))
            .collect()
    }

    fn total_at(&self, lambda: f64, config: &PlanConfig) -> f64 {
        (0..self.rate.len())
            .map(|i| self.time_at(i, lambda, config))
            .sum()
    }
}

/// Computes the optimal time split for `path`.
///
/// # Errors
/// [`PlanError::InfeasibleBudget`] when `T < |P| · t_min`.
pub fn allocate_time(
    path: &[&Topic],
    learner: &LearnerState,
    config: &PlanConfig,
) -> Result<TimeAllocation> {
    let n = path.len();
    if n == 0 {
        return Ok(TimeAllocation {
            times: Vec::new(),
            lambda: 0.0,
        });
    }

    let budget = config.total_time;
    let required = n as f64 * config.min_time;
    if budget < required - 1e-12 {
        return Err(PlanError::InfeasibleBudget {
            budget,
            required,
            topics: n,
        });
    }

    let coeffs = Coefficients::new(path, learner, config);

    // At lambda_hi every unconstrained optimum is <= t_min.
    let mut lambda_lo = LAMBDA_FLOOR;
    let mut lambda_hi = coeffs
        .marginal
        .iter()
        .zip(&coeffs.rate)
        .map(|(&c, &a)| c * (-a * config.min_time).exp())
        .fold(0.0, f64::max)
        + LAMBDA_FLOOR;

    if coeffs.total_at(lambda_hi, config) > budget + RESIDUAL_TOLERANCE {
        for _ in 0..MAX_BRACKET_DOUBLINGS {
            lambda_hi *= 2.0;
            if coeffs.total_at(lambda_hi, config) <= budget + RESIDUAL_TOLERANCE {
                break;
            }
        }
    }

    // Large budgets put λ* below the floor; shrink until it is bracketed.
    if coeffs.total_at(lambda_lo, config) < budget - RESIDUAL_TOLERANCE {
        for _ in 0..MAX_BRACKET_DOUBLINGS {
            lambda_lo *= 0.5;
            if coeffs.total_at(lambda_lo, config) >= budget - RESIDUAL_TOLERANCE {
                break;
            }
        }
    }

    for _ in 0..BISECTION_ITERATIONS {
        let mid = 0.5 * (lambda_lo + lambda_hi);
        let total = coeffs.total_at(mid, config);

        if (total - budget).abs() <= RESIDUAL_TOLERANCE {
            lambda_lo = mid;
            lambda_hi = mid;
            break;
        }
        if total > budget {
            lambda_lo = mid;
        } else {
            lambda_hi = mid;
        }
    }

    let lambda = 0.5 * (lambda_lo + lambda_hi);
    let mut times = coeffs.times_at(lambda, config);
    distribute_gap(&mut times, budget, config.min_time);

    Ok(TimeAllocation { times, lambda })
}

/// Spreads the residual `budget - Σ t` over topics above the floor, or
/// over all topics when every one is pinned at `t_min`.
fn distribute_gap(times: &mut [f64], budget: f64, min_time: f64) {
    let gap = budget - times.iter().sum::<f64>();
    if gap.abs() <= GAP_TOLERANCE {
        return;
    }

    let free: Vec<usize> = (0..times.len())
        .filter(|&i| times[i] > min_time + 1e-12)
        .collect();
    let targets: Vec<usize> = if free.is_empty() {
        (0..times.len()).collect()
    } else {
        free
    };

    let share = gap / targets.len() as f64;
    for i in targets {
        times[i] = (times[i] + share).max(min_time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics(masteries: &[f64]) -> Vec<Topic> {
        masteries
            .iter()
            .enumerate()
            .map(|(i, &m)| Topic::new(i as TopicId + 1, format!("t{i}"), 1.0, 1.0, 1.0, m))
            .collect()
    }

    fn refs(topics: &[Topic]) -> Vec<&Topic> {
        topics.iter().collect()
    }

    #[test]
    fn test_infeasible_budget() {
        let ts = topics(&[0.0, 0.0]);
        let config = PlanConfig::default().with_total_time(5.0).with_min_time(3.0);
        let err = allocate_time(&refs(&ts), &LearnerState::new(1.0), &config).unwrap_err();
        assert_eq!(
            err,
            PlanError::InfeasibleBudget {
                budget: 5.0,
                required: 6.0,
                topics: 2,
            }
        );
    }

    #[test]
    fn test_exact_budget_pins_everything() {
        let ts = topics(&[0.0, 0.5, 0.9]);
        let config = PlanConfig::default().with_total_time(6.0).with_min_time(2.0);
        let alloc = allocate_time(&refs(&ts), &LearnerState::new(1.0), &config).unwrap();
        for &t in &alloc.times {
            assert!((t - 2.0).abs() < 1e-6, "expected pinned time, got {t}");
        }
    }

    #[test]
    fn test_symmetric_topics_split_evenly() {
        let ts = topics(&[0.0, 0.0, 0.0]);
        let config = PlanConfig::default()
            .with_k(1.0)
            .with_total_time(30.0)
            .with_min_time(1.0);
        let alloc = allocate_time(&refs(&ts), &LearnerState::new(1.0), &config).unwrap();
        for &t in &alloc.times {
            assert!((t - 10.0).abs() < 1e-6, "expected 10, got {t}");
        }
        // t = ln(c / λ) / a with a = c = 1
        assert!((alloc.lambda - (-10.0f64).exp()).abs() < 1e-8);
    }

    #[test]
    fn test_budget_equality_and_floor() {
        let ts = vec![
            Topic::new(1, "a", 13.5, 4.5, 27.0, 0.3),
            Topic::new(2, "b", 3.0, 1.0, 6.0, 0.9),
            Topic::new(3, "c", 17.0, 4.5, 27.0, 0.4),
            Topic::new(4, "d", 2.0, 2.5, 15.0, 0.5),
        ];
        let config = PlanConfig::default()
            .with_k(0.35)
            .with_total_time(40.0)
            .with_min_time(3.0);
        let alloc = allocate_time(&refs(&ts), &LearnerState::new(1.2), &config).unwrap();
        assert!((alloc.total() - 40.0).abs() < 1e-6, "sum {}", alloc.total());
        for &t in &alloc.times {
            assert!(t >= 3.0 - 1e-6);
        }
        assert!(alloc.lambda > 0.0);
    }

    #[test]
    fn test_more_mastery_gets_less_time() {
        let ts = topics(&[0.1, 0.6]);
        let config = PlanConfig::default()
            .with_k(0.5)
            .with_total_time(20.0)
            .with_min_time(1.0);
        let alloc = allocate_time(&refs(&ts), &LearnerState::new(1.0), &config).unwrap();
        assert!(alloc.times[0] > alloc.times[1]);
    }

    #[test]
    fn test_degenerate_all_mastered_spreads_uniformly() {
        let ts = topics(&[1.0, 1.0, 1.0, 1.0]);
        let config = PlanConfig::default().with_total_time(20.0).with_min_time(2.0);
        let alloc = allocate_time(&refs(&ts), &LearnerState::new(1.0), &config).unwrap();
        for &t in &alloc.times {
            assert!((t - 5.0).abs() < 1e-9, "expected uniform 5, got {t}");
        }
    }

    #[test]
    fn test_empty_path() {
        let alloc = allocate_time(&[], &LearnerState::new(1.0), &PlanConfig::default()).unwrap();
        assert!(alloc.times.is_empty());
        assert_eq!(alloc.lambda, 0.0);
    }

    #[test]
    fn test_by_topic_keys() {
        let ts = topics(&[0.0, 0.0]);
        let config = PlanConfig::default().with_total_time(10.0).with_min_time(1.0);
        let path = refs(&ts);
        let alloc = allocate_time(&path, &LearnerState::new(1.0), &config).unwrap();
        let map = alloc.by_topic(&path);
        assert_eq!(map.len(), 2);
        assert!((map[&1] + map[&2] - 10.0).abs() < 1e-6);
    }

    /// Two free topics with rates 1 and 1/2 and `c = (1, 1/2)`:
    /// `t_1 = ln(1/λ)`, `t_2 = 2 ln(1/(2λ))`, so `3 ln(1/λ) = T + 2 ln 2`.
    fn unequal_rates(budget: f64, eps: f64) -> (Vec<Topic>, PlanConfig, f64) {
        let ts = vec![
            Topic::new(1, "a", 1.0, 1.0, 1.0, 0.0),
            Topic::new(2, "b", 1.0, 2.0, 1.0, 0.0),
        ];
        let config = PlanConfig::default()
            .with_k(1.0)
            .with_total_time(budget)
            .with_min_time(0.0)
            .with_eps(eps);
        let log_inv_lambda = (budget + 2.0 * 2.0f64.ln()) / 3.0;
        (ts, config, log_inv_lambda)
    }

    fn assert_equal_marginals(ts: &[Topic], alloc: &TimeAllocation, config: &PlanConfig) {
        let learner = LearnerState::new(1.0);
        let marginals: Vec<f64> = ts
            .iter()
            .zip(&alloc.times)
            .map(|(t, &time)| {
                let a = learning_rate(config.k, learner.ability, t.difficulty, config.eps);
                t.weight * (1.0 - t.mastery) * a * (-a * time).exp()
            })
            .collect();
        for m in &marginals {
            let rel = (m - alloc.lambda).abs() / alloc.lambda;
            assert!(rel < 1e-6, "marginal {m} vs lambda {}", alloc.lambda);
        }
    }

    #[test]
    fn test_lambda_below_eps_is_exact() {
        let (ts, config, log_inv_lambda) = unequal_rates(40.0, 1e-3);
        let alloc = allocate_time(&refs(&ts), &LearnerState::new(1.0), &config).unwrap();

        assert!(alloc.lambda < config.eps);
        assert!((alloc.times[0] - log_inv_lambda).abs() < 1e-6, "t1 {}", alloc.times[0]);
        assert!((alloc.times[1] - (40.0 - log_inv_lambda)).abs() < 1e-6, "t2 {}", alloc.times[1]);
        assert!((alloc.lambda.ln() + log_inv_lambda).abs() < 1e-6);
        assert_equal_marginals(&ts, &alloc, &config);
    }

    #[test]
    fn test_lambda_below_initial_bracket_is_found() {
        // λ* ≈ 2e-15, under the starting lower bracket
        let (ts, config, log_inv_lambda) = unequal_rates(100.0, 1e-9);
        let alloc = allocate_time(&refs(&ts), &LearnerState::new(1.0), &config).unwrap();

        assert!(alloc.lambda < LAMBDA_FLOOR);
        assert!((alloc.times[0] - log_inv_lambda).abs() < 1e-6, "t1 {}", alloc.times[0]);
        assert!((alloc.total() - 100.0).abs() < 1e-6);
        assert_equal_marginals(&ts, &alloc, &config);
    }

    #[test]
    fn test_distribute_gap_prefers_free_topics() {
        let mut times = vec![1.0, 3.0, 5.0];
        distribute_gap(&mut times, 11.0, 1.0);
        assert_eq!(times, vec![1.0, 4.0, 6.0]);
    }
}
