//! Static desirability used to bias path construction.

use crate::types::{Topic, TopicSet};

/// Desirability `η = w (1 - m) / max(t_base · d, eps)`.
pub fn desirability(topic: &Topic, eps: f64) -> f64 {
    let denom = (topic.base_time * topic.difficulty).max(eps);
    topic.weight * (1.0 - topic.mastery) / denom
}

/// Desirability of every topic, indexed by position in the set.
pub fn build_desirability(topics: &TopicSet, eps: f64) -> Vec<f64> {
    topics
        .topics()
        .iter()
        .map(|t| desirability(t, eps))
        .collect()
}
