//! Domain value types.
//!
//! All records are immutable once built for a run. Per-learner variants
//! are produced with the `with_*` copy-with-override constructors rather
//! than by mutating a shared value.

use crate::error::{PlanError, Result};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Topic identifier.
pub type TopicId = u32;

/// A knowledge point with its learner-specific mastery snapshot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Topic {
    pub id: TopicId,
    pub name: String,
    /// Importance weight `w > 0`.
    pub weight: f64,
    /// Difficulty `d > 0`.
    pub difficulty: f64,
    /// Base time unit `t_base > 0`.
    pub base_time: f64,
    /// Current mastery in `[0, 1]`.
    pub mastery: f64,
    /// Ids of the topics that must be visited first.
    #[cfg_attr(feature = "serde", serde(default))]
    pub prerequisites: Vec<TopicId>,
}

impl Topic {
    /// Creates a topic without prerequisites.
    pub fn new(
        id: TopicId,
        name: impl Into<String>,
        weight: f64,
        difficulty: f64,
        base_time: f64,
        mastery: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            weight,
            difficulty,
            base_time,
            mastery,
            prerequisites: Vec::new(),
        }
    }

    /// Returns a copy with the given prerequisites.
    pub fn with_prerequisites(&self, prerequisites: impl Into<Vec<TopicId>>) -> Self {
        Self {
            prerequisites: prerequisites.into(),
            ..self.clone()
        }
    }

    /// Returns a copy with the given mastery.
    pub fn with_mastery(&self, mastery: f64) -> Self {
        Self {
            mastery,
            ..self.clone()
        }
    }

    fn validate(&self) -> Result<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.weight) {
            return Err(PlanError::InvalidTopic(format!(
                "topic {} weight must be positive, got {}",
                self.id, self.weight
            )));
        }
        if !positive(self.difficulty) {
            return Err(PlanError::InvalidTopic(format!(
                "topic {} difficulty must be positive, got {}",
                self.id, self.difficulty
            )));
        }
        if !positive(self.base_time) {
            return Err(PlanError::InvalidTopic(format!(
                "topic {} base_time must be positive, got {}",
                self.id, self.base_time
            )));
        }
        if !(0.0..=1.0).contains(&self.mastery) {
            return Err(PlanError::InvalidTopic(format!(
                "topic {} mastery must be in [0, 1], got {}",
                self.id, self.mastery
            )));
        }
        Ok(())
    }
}

/// Learner-level state for one run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LearnerState {
    /// Overall learning-rate ability `A > 0`.
    pub ability: f64,
}

impl LearnerState {
    pub fn new(ability: f64) -> Self {
        Self { ability }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.ability.is_finite() || self.ability <= 0.0 {
            return Err(PlanError::InvalidLearner(format!(
                "ability must be positive, got {}",
                self.ability
            )));
        }
        Ok(())
    }
}

/// A validated problem instance: topics ordered by id, with prerequisite
/// ids resolved to positions.
///
/// Construction checks per-topic values, id uniqueness and that every
/// prerequisite refers to a topic in the set. Acyclicity is not checked
/// here; path construction reports it.
#[derive(Debug, Clone)]
pub struct TopicSet {
    topics: Vec<Topic>,
    index: HashMap<TopicId, usize>,
    prerequisite_indices: Vec<Vec<usize>>,
}

impl TopicSet {
    pub fn new(topics: impl IntoIterator<Item = Topic>) -> Result<Self> {
        let mut topics: Vec<Topic> = topics.into_iter().collect();
        topics.sort_by_key(|t| t.id);

        let mut index = HashMap::with_capacity(topics.len());
        for (i, topic) in topics.iter().enumerate() {
            topic.validate()?;
            if index.insert(topic.id, i).is_some() {
                return Err(PlanError::InvalidTopic(format!(
                    "duplicate topic id {}",
                    topic.id
                )));
            }
        }

        let mut prerequisite_indices = Vec::with_capacity(topics.len());
        for topic in &topics {
            let mut seen = HashSet::new();
            let mut resolved = Vec::with_capacity(topic.prerequisites.len());
            for pre in &topic.prerequisites {
                let &j = index.get(pre).ok_or_else(|| {
                    PlanError::InvalidTopic(format!(
                        "topic {} has dangling prerequisite {}",
                        topic.id, pre
                    ))
                })?;
                if seen.insert(j) {
                    resolved.push(j);
                }
            }
            prerequisite_indices.push(resolved);
        }

        Ok(Self {
            topics,
            index,
            prerequisite_indices,
        })
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Topics in ascending id order.
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn get(&self, id: TopicId) -> Option<&Topic> {
        self.index.get(&id).map(|&i| &self.topics[i])
    }

    /// Position of `id` in [`topics`](Self::topics).
    pub fn index_of(&self, id: TopicId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Prerequisite positions of the topic at position `i`.
    pub fn prerequisites_of(&self, i: usize) -> &[usize] {
        &self.prerequisite_indices[i]
    }

    /// Looks up a topic id by display name.
    pub fn id_by_name(&self, name: &str) -> Option<TopicId> {
        self.topics.iter().find(|t| t.name == name).map(|t| t.id)
    }

    /// Maps a path of positions to topic ids.
    pub fn ids_of(&self, path: &[usize]) -> Vec<TopicId> {
        path.iter().map(|&i| self.topics[i].id).collect()
    }

    /// Resolves a path of ids to topic references.
    pub fn resolve(&self, path: &[TopicId]) -> Result<Vec<&Topic>> {
        path.iter()
            .map(|id| {
                self.get(*id)
                    .ok_or_else(|| PlanError::InvalidTopic(format!("unknown topic id {id}")))
            })
            .collect()
    }

    /// Returns a new set where each topic named in `masteries` takes the
    /// given mastery; other topics keep theirs.
    pub fn with_masteries(&self, masteries: &HashMap<String, f64>) -> Result<Self> {
        Self::new(self.topics.iter().map(|t| match masteries.get(&t.name) {
            Some(&m) => t.with_mastery(m),
            None => t.clone(),
        }))
    }
}

/// One evaluated study plan.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Solution {
    /// Topological order covering every topic once.
    pub path: Vec<TopicId>,
    /// Allocated study time per topic.
    pub times: BTreeMap<TopicId, f64>,
    /// Expected weighted mastery gain `U`.
    pub utility: f64,
    /// `L = -U + beta_jump * J`; lower is better.
    pub loss: f64,
    /// Pheromone deposit quality `Q`.
    pub quality: f64,
    /// KKT multiplier at the optimum.
    pub lambda: f64,
}

impl Solution {
    pub fn total_time(&self) -> f64 {
        self.times.values().sum()
    }

    pub fn time_of(&self, id: TopicId) -> Option<f64> {
        self.times.get(&id).copied()
    }

    /// Consecutive `(from, to)` transitions along the path.
    pub fn edges(&self) -> impl Iterator<Item = (TopicId, TopicId)> + '_ {
        self.path.windows(2).map(|w| (w[0], w[1]))
    }

    /// Position of `id` along the path.
    pub fn position_of(&self, id: TopicId) -> Option<usize> {
        self.path.iter().position(|&p| p == id)
    }
}
