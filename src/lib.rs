//! Study path optimization for prerequisite-constrained curricula.
//!
//! Given a set of topics (exam weight, difficulty, base study time,
//! current mastery, prerequisites), a learner ability and a total study
//! budget, the planner finds:
//!
//! - a study **order** that respects every prerequisite, sampled by an
//!   ant colony over the prerequisite DAG
//! - a **time split** along that order, solved exactly from the KKT
//!   conditions of the concave learning-gain objective
//!
//! Orders are scored by expected weighted mastery gain minus a penalty
//! on upward difficulty jumps, and the colony is reinforced toward the
//! transitions of high-scoring plans.
//!
//! Around the core sit a reference [`catalog`], learner [`profile`]
//! building from exam records, row-oriented [`report`]s and [`batch`]
//! planning across many learners.
//!
//! # Features
//!
//! - `serde`: `Serialize`/`Deserialize` on configs, inputs and results
//! - `parallel`: rayon evaluation of ants and of batch learners
//! - `wasm`: `wasm-bindgen` entry point
//! - `cli`: the `studyplan` binary

pub mod aco;
pub mod batch;
pub mod catalog;
pub mod config;
pub mod error;
pub mod heuristics;
pub mod kkt;
pub mod learning_curve;
pub mod objective;
pub mod profile;
pub mod report;
pub mod runner;
pub mod types;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use batch::{plan_batch, BatchOutcome, FailurePolicy};
pub use catalog::{Catalog, CatalogOptions, PrerequisitePolicy, ReferenceTopic};
pub use config::PlanConfig;
pub use error::{PlanError, Result};
pub use kkt::{allocate_time, TimeAllocation};
pub use profile::{build_profiles, ExamRecord, LearnerProfile, ProfileConfig};
pub use report::PlanReport;
pub use runner::{PlanResult, PlanRunner};
pub use types::{LearnerState, Solution, Topic, TopicId, TopicSet};
