//! Reference topic metadata and per-learner topic sets.
//!
//! A [`Catalog`] is the fixed reference table (name, weight, difficulty,
//! base time, prerequisite names). It is turned into a validated
//! [`TopicSet`] for one learner by attaching that learner's mastery
//! snapshot and resolving prerequisite names to ids.

mod math;

pub use math::default_prerequisites;

use crate::error::{PlanError, Result};
use crate::types::{Topic, TopicId, TopicSet};
use std::collections::HashMap;
use tracing::warn;

/// One row of the reference table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReferenceTopic {
    pub name: String,
    pub weight: f64,
    pub difficulty: f64,
    pub base_time: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub prerequisites: Vec<String>,
}

/// What to do with a prerequisite name that matches no topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrerequisitePolicy {
    /// Drop the edge and log a warning.
    #[default]
    Drop,
    /// Fail with [`PlanError::UnknownPrerequisite`].
    Reject,
}

/// Options for building a learner's topic set.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CatalogOptions {
    /// Scale weights so they sum to 1.
    pub normalize_weights: bool,
    /// Mastery used for topics absent from the learner's snapshot.
    pub fill_mastery: f64,
    pub prerequisite_policy: PrerequisitePolicy,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            normalize_weights: false,
            fill_mastery: 0.5,
            prerequisite_policy: PrerequisitePolicy::Drop,
        }
    }
}

impl CatalogOptions {
    pub fn with_normalized_weights(mut self, normalize: bool) -> Self {
        self.normalize_weights = normalize;
        self
    }

    pub fn with_fill_mastery(mut self, m: f64) -> Self {
        self.fill_mastery = m;
        self
    }

    pub fn with_prerequisite_policy(mut self, policy: PrerequisitePolicy) -> Self {
        self.prerequisite_policy = policy;
        self
    }
}

/// Ordered reference table. Topic ids are `1..=n` in table order.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Catalog {
    topics: Vec<ReferenceTopic>,
}

impl Catalog {
    pub fn new(topics: impl IntoIterator<Item = ReferenceTopic>) -> Self {
        Self {
            topics: topics.into_iter().collect(),
        }
    }

    /// The built-in 17-topic mathematics table with `t_base = base_unit · d`.
    pub fn high_school_math(base_unit: f64) -> Self {
        math::build(base_unit)
    }

    pub fn topics(&self) -> &[ReferenceTopic] {
        &self.topics
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Id assigned to the topic at table position `i`.
    pub fn id_at(i: usize) -> TopicId {
        i as TopicId + 1
    }

    /// Maps each topic name to its id.
    pub fn name_index(&self) -> HashMap<&str, TopicId> {
        self.topics
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.as_str(), Self::id_at(i)))
            .collect()
    }

    /// Resolves prerequisite names to ids, per table position.
    pub fn resolve_prerequisites(&self, policy: PrerequisitePolicy) -> Result<Vec<Vec<TopicId>>> {
        let index = self.name_index();
        let mut resolved = Vec::with_capacity(self.topics.len());

        for topic in &self.topics {
            let mut ids = Vec::with_capacity(topic.prerequisites.len());
            for name in &topic.prerequisites {
                match index.get(name.as_str()) {
                    Some(&id) => ids.push(id),
                    None => match policy {
                        PrerequisitePolicy::Drop => {
                            warn!(
                                topic = %topic.name,
                                prerequisite = %name,
                                "dropping unknown prerequisite"
                            );
                        }
                        PrerequisitePolicy::Reject => {
                            return Err(PlanError::UnknownPrerequisite {
                                topic: topic.name.clone(),
                                prerequisite: name.clone(),
                            });
                        }
                    },
                }
            }
            resolved.push(ids);
        }

        Ok(resolved)
    }

    /// Builds the topic set of one learner.
    ///
    /// `masteries` maps topic name to mastery; missing topics take
    /// `options.fill_mastery`.
    pub fn topic_set(
        &self,
        masteries: &HashMap<String, f64>,
        options: &CatalogOptions,
    ) -> Result<TopicSet> {
        let prerequisites = self.resolve_prerequisites(options.prerequisite_policy)?;

        let scale = if options.normalize_weights {
            let total: f64 = self.topics.iter().map(|t| t.weight).sum();
            if total > 0.0 {
                1.0 / total
            } else {
                1.0
            }
        } else {
            1.0
        };

        let topics = self
            .topics
            .iter()
            .zip(prerequisites)
            .enumerate()
            .map(|(i, (reference, pre))| Topic {
                id: Self::id_at(i),
                name: reference.name.clone(),
                weight: reference.weight * scale,
                difficulty: reference.difficulty,
                base_time: reference.base_time,
                mastery: masteries
                    .get(&reference.name)
                    .copied()
                    .unwrap_or(options.fill_mastery),
                prerequisites: pre,
            });

        TopicSet::new(topics)
    }
}
