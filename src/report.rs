//! Row-oriented export of planning results.
//!
//! Each solved learner contributes one summary row, one time allocation
//! row per topic and one edge row per consecutive pair on the path.

use crate::config::PlanConfig;
use crate::error::Result;
use crate::objective::projected_mastery;
use crate::types::{LearnerState, Solution, TopicSet};

/// One row per learner.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlanSummaryRow {
    pub student_id: String,
    pub ability: f64,
    pub utility: f64,
    pub loss: f64,
    pub quality: f64,
    pub lambda: f64,
    /// Path as ids joined with `->`.
    pub path_ids: String,
    /// Path as names joined with `->`.
    pub path_names: String,
}

/// One row per (learner, topic).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeAllocationRow {
    pub student_id: String,
    /// Position along the path, from 1.
    pub step: usize,
    pub topic_id: u32,
    pub topic_name: String,
    pub time: f64,
    pub weight: f64,
    pub difficulty: f64,
    pub mastery: f64,
    pub projected_mastery: f64,
}

/// One row per (learner, traversed transition).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathEdgeRow {
    pub student_id: String,
    pub from_id: u32,
    pub to_id: u32,
    pub from_name: String,
    pub to_name: String,
}

/// Accumulated rows of one or more learners.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlanReport {
    pub summaries: Vec<PlanSummaryRow>,
    pub allocations: Vec<TimeAllocationRow>,
    pub edges: Vec<PathEdgeRow>,
}

impl PlanReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the rows of one learner's solution.
    ///
    /// # Errors
    /// [`crate::PlanError::InvalidTopic`] when the path names a topic
    /// missing from `topics`. Nothing is appended in that case.
    pub fn push(
        &mut self,
        student_id: &str,
        learner: &LearnerState,
        topics: &TopicSet,
        solution: &Solution,
        config: &PlanConfig,
    ) -> Result<()> {
        let path = topics.resolve(&solution.path)?;

        self.summaries.push(PlanSummaryRow {
            student_id: student_id.to_string(),
            ability: learner.ability,
            utility: solution.utility,
            loss: solution.loss,
            quality: solution.quality,
            lambda: solution.lambda,
            path_ids: path
                .iter()
                .map(|t| t.id.to_string())
                .collect::<Vec<_>>()
                .join("->"),
            path_names: path
                .iter()
                .map(|t| t.name.as_str())
                .collect::<Vec<_>>()
                .join("->"),
        });

        for (step, topic) in path.iter().enumerate() {
            let time = solution.time_of(topic.id).unwrap_or(0.0);
            self.allocations.push(TimeAllocationRow {
                student_id: student_id.to_string(),
                step: step + 1,
                topic_id: topic.id,
                topic_name: topic.name.clone(),
                time,
                weight: topic.weight,
                difficulty: topic.difficulty,
                mastery: topic.mastery,
                projected_mastery: projected_mastery(topic, time, learner, config),
            });
        }

        for pair in path.windows(2) {
            self.edges.push(PathEdgeRow {
                student_id: student_id.to_string(),
                from_id: pair[0].id,
                to_id: pair[1].id,
                from_name: pair[0].name.clone(),
                to_name: pair[1].name.clone(),
            });
        }

        Ok(())
    }

    /// Appends all rows of `other`.
    pub fn extend(&mut self, other: PlanReport) {
        self.summaries.extend(other.summaries);
        self.allocations.extend(other.allocations);
        self.edges.extend(other.edges);
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}
