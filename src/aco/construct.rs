//! Stochastic construction of one topological visiting order.

use super::pheromone::PheromoneField;
use crate::config::PlanConfig;
use crate::error::{PlanError, Result};
use crate::types::TopicSet;
use rand::Rng;

/// Positions of unvisited topics whose prerequisites are all visited.
pub fn feasible_candidates(topics: &TopicSet, visited: &[bool]) -> Vec<usize> {
    (0..topics.len())
        .filter(|&j| !visited[j] && topics.prerequisites_of(j).iter().all(|&p| visited[p]))
        .collect()
}

/// Roulette-wheel selection over `items` with the given weights.
///
/// Consumes exactly one draw. Infinite weights win outright and share the
/// draw among themselves; a finite sum that overflows is rescaled by the
/// largest weight. Falls back to a uniform pick when the weights sum to
/// zero or contain NaN.
///
/// # Panics
/// Panics if `items` is empty.
pub fn roulette_choice<R: Rng>(items: &[usize], weights: &[f64], rng: &mut R) -> usize {
    assert!(!items.is_empty(), "cannot choose from an empty candidate set");

    let dominant: Vec<usize> = items
        .iter()
        .zip(weights)
        .filter(|(_, &w)| w == f64::INFINITY)
        .map(|(&item, _)| item)
        .collect();
    if !dominant.is_empty() {
        return dominant[rng.random_range(0..dominant.len())];
    }

    let mut scale = 1.0;
    let mut total: f64 = weights.iter().sum();
    if total == f64::INFINITY {
        scale = weights.iter().copied().fold(0.0, f64::max);
        total = weights.iter().map(|w| w / scale).sum();
    }
    if !total.is_finite() || total <= 0.0 {
        return items[rng.random_range(0..items.len())];
    }

    let roll = rng.random::<f64>() * total;
    let mut acc = 0.0;
    for (&item, &w) in items.iter().zip(weights) {
        acc += w / scale;
        if acc > roll {
            return item;
        }
    }
    // Rounding can leave `roll` at `total`; take the last weighted item.
    items
        .iter()
        .zip(weights)
        .rev()
        .find(|(_, &w)| w > 0.0)
        .map_or(items[items.len() - 1], |(&item, _)| item)
}

/// Builds one full visiting order starting from the virtual START node.
///
/// The weight of candidate `j` from the current position is
/// `τ[cur, j]^alpha · η_j^beta`. Returns topic positions.
///
/// # Errors
/// [`PlanError::CyclicPrerequisites`] when no candidate is feasible
/// before every topic has been visited.
pub fn construct_path<R: Rng>(
    topics: &TopicSet,
    field: &PheromoneField,
    eta: &[f64],
    config: &PlanConfig,
    rng: &mut R,
) -> Result<Vec<usize>> {
    let n = topics.len();
    let mut visited = vec![false; n];
    let mut path = Vec::with_capacity(n);
    let mut current: Option<usize> = None;

    while path.len() < n {
        let candidates = feasible_candidates(topics, &visited);
        if candidates.is_empty() {
            let blocked = (0..n)
                .filter(|&j| !visited[j])
                .map(|j| topics.topics()[j].id)
                .collect();
            return Err(PlanError::CyclicPrerequisites {
                visited: path.len(),
                total: n,
                blocked,
            });
        }

        let weights: Vec<f64> = candidates
            .iter()
            .map(|&j| field.get(current, j).powf(config.alpha) * eta[j].powf(config.beta))
            .collect();

        let next = roulette_choice(&candidates, &weights, rng);
        path.push(next);
        visited[next] = true;
        current = Some(next);
    }

    Ok(path)
}
