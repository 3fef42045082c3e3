//! Error taxonomy for study path planning.
//!
//! Two conditions are fatal to a planning run and always surface to the
//! caller: an infeasible time budget and a prerequisite graph that is not
//! a DAG over the topic set. The remaining variants report invalid input
//! data or configuration before any search starts.

use crate::types::TopicId;
use thiserror::Error;

/// Errors produced by the planner and its data preparation layers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    /// The total budget cannot cover the minimum time of every topic.
    #[error("infeasible time budget: T={budget} < |P|*t_min={required} ({topics} topics)")]
    InfeasibleBudget {
        budget: f64,
        required: f64,
        topics: usize,
    },

    /// Path construction ran out of feasible candidates before visiting
    /// every topic.
    #[error(
        "prerequisite graph is not a valid DAG over the topic set: \
         visited {visited} of {total} topics, blocked topics {blocked:?}"
    )]
    CyclicPrerequisites {
        visited: usize,
        total: usize,
        blocked: Vec<TopicId>,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid topic: {0}")]
    InvalidTopic(String),

    #[error("invalid learner state: {0}")]
    InvalidLearner(String),

    /// A prerequisite name in the reference table matches no topic.
    #[error("topic '{topic}' lists unknown prerequisite '{prerequisite}'")]
    UnknownPrerequisite { topic: String, prerequisite: String },

    #[error("invalid exam record: {0}")]
    InvalidRecord(String),
}

impl PlanError {
    /// Whether the error is one of the two run-fatal data integrity
    /// conditions (budget infeasibility or a non-DAG prerequisite graph).
    pub fn is_data_integrity(&self) -> bool {
        matches!(
            self,
            PlanError::InfeasibleBudget { .. } | PlanError::CyclicPrerequisites { .. }
        )
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PlanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infeasible_budget_message() {
        let err = PlanError::InfeasibleBudget {
            budget: 5.0,
            required: 6.0,
            topics: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("T=5"), "unexpected message: {msg}");
        assert!(msg.contains("6"), "unexpected message: {msg}");
        assert!(err.is_data_integrity());
    }

    #[test]
    fn test_cyclic_message_names_dag() {
        let err = PlanError::CyclicPrerequisites {
            visited: 0,
            total: 2,
            blocked: vec![1, 2],
        };
        assert!(err.to_string().contains("not a valid DAG"));
        assert!(err.is_data_integrity());
    }

    #[test]
    fn test_config_error_is_not_data_integrity() {
        assert!(!PlanError::InvalidConfig("rho".into()).is_data_integrity());
    }
}
