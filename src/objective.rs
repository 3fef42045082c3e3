//! Utility, loss and pheromone quality of a (path, time split) pair.

use crate::config::PlanConfig;
use crate::learning_curve::{delta_mastery, learning_rate, mastery_after};
use crate::types::{LearnerState, Topic};

/// Weighted mastery gain `g_i = w_i · Δm_i(t_i)` of one topic.
pub fn contribution(topic: &Topic, time: f64, learner: &LearnerState, config: &PlanConfig) -> f64 {
    let rate = learning_rate(config.k, learner.ability, topic.difficulty, config.eps);
    topic.weight * delta_mastery(topic.mastery, rate, time)
}

/// Mastery of `topic` after studying it for `time`.
pub fn projected_mastery(topic: &Topic, time: f64, learner: &LearnerState, config: &PlanConfig) -> f64 {
    let rate = learning_rate(config.k, learner.ability, topic.difficulty, config.eps);
    mastery_after(topic.mastery, delta_mastery(topic.mastery, rate, time))
}

/// Utility `U = Σ g_i` over the path. `times` is aligned with `path`.
pub fn utility(path: &[&Topic], times: &[f64], learner: &LearnerState, config: &PlanConfig) -> f64 {
    path.iter()
        .zip(times)
        .map(|(topic, &t)| contribution(topic, t, learner, config))
        .sum()
}

/// Sum of upward difficulty steps between consecutive topics.
///
/// Only increases count; moving to an easier topic costs nothing.
pub fn difficulty_jump_penalty(path: &[&Topic]) -> f64 {
    path.windows(2)
        .map(|w| (w[1].difficulty - w[0].difficulty).max(0.0))
        .sum()
}

/// `L = -U + beta_jump · J`; lower is better.
pub fn loss(utility: f64, penalty: f64, beta_jump: f64) -> f64 {
    -utility + beta_jump * penalty
}

/// Deposit quality `Q = max(0, -L) + eps`.
///
/// Non-increasing in `L` and strictly positive, also for `L >= 0`.
pub fn quality_from_loss(loss: f64, eps: f64) -> f64 {
    (-loss).max(0.0) + eps
}

/// Full evaluation of one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub utility: f64,
    pub penalty: f64,
    pub loss: f64,
    pub quality: f64,
    /// `g_i` per path position.
    pub gains: Vec<f64>,
}

/// Scores a path with its time split.
pub fn evaluate(path: &[&Topic], times: &[f64], learner: &LearnerState, config: &PlanConfig) -> Score {
    let gains: Vec<f64> = path
        .iter()
        .zip(times)
        .map(|(topic, &t)| contribution(topic, t, learner, config))
        .collect();
    let utility: f64 = gains.iter().sum();
    let penalty = difficulty_jump_penalty(path);
    let loss = loss(utility, penalty, config.beta_jump);
    Score {
        utility,
        penalty,
        loss,
        quality: quality_from_loss(loss, config.eps),
        gains,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(id: u32, d: f64) -> Topic {
        Topic::new(id, format!("t{id}"), 1.0, d, 1.0, 0.0)
    }

    #[test]
    fn test_penalty_only_upward() {
        let (a, b, c) = (topic(1, 1.0), topic(2, 3.0), topic(3, 2.0));
        assert_eq!(difficulty_jump_penalty(&[&a, &b, &c]), 2.0);
        assert_eq!(difficulty_jump_penalty(&[&b, &c, &a]), 0.0);
        assert_eq!(difficulty_jump_penalty(&[&a, &c, &b]), 2.0);
    }

    #[test]
    fn test_penalty_single_topic() {
        assert_eq!(difficulty_jump_penalty(&[&topic(1, 5.0)]), 0.0);
        assert_eq!(difficulty_jump_penalty(&[]), 0.0);
    }

    #[test]
    fn test_quality_monotone() {
        let eps = 1e-9;
        assert!(quality_from_loss(-5.0, eps) > quality_from_loss(-1.0, eps));
        assert_eq!(quality_from_loss(3.0, eps), eps);
        assert_eq!(quality_from_loss(0.0, eps), eps);
    }

    #[test]
    fn test_utility_matches_closed_form() {
        let config = PlanConfig::default().with_k(1.0);
        let learner = LearnerState::new(1.0);
        let a = topic(1, 1.0);
        let u = utility(&[&a], &[2.0], &learner, &config);
        assert!((u - (1.0 - (-2.0f64).exp())).abs() < 1e-12);
    }

    #[test]
    fn test_projected_mastery_bounds() {
        let config = PlanConfig::default();
        let learner = LearnerState::new(1.0);
        let t = Topic::new(1, "a", 1.0, 2.0, 1.0, 0.4);
        let m = projected_mastery(&t, 10.0, &learner, &config);
        assert!(m > 0.4 && m <= 1.0);
        assert_eq!(projected_mastery(&t, 0.0, &learner, &config), 0.4);
    }

    #[test]
    fn test_evaluate_consistency() {
        let config = PlanConfig::default().with_k(0.5).with_beta_jump(0.8);
        let learner = LearnerState::new(1.5);
        let (a, b) = (topic(1, 1.0), topic(2, 2.5));
        let path = [&a, &b];
        let times = [4.0, 6.0];
        let score = evaluate(&path, &times, &learner, &config);

        assert!((score.utility - utility(&path, &times, &learner, &config)).abs() < 1e-12);
        assert!((score.gains.iter().sum::<f64>() - score.utility).abs() < 1e-12);
        assert!((score.penalty - 1.5).abs() < 1e-12);
        assert!((score.loss - (-score.utility + 0.8 * 1.5)).abs() < 1e-12);
        assert_eq!(score.quality, quality_from_loss(score.loss, config.eps));
    }
}
