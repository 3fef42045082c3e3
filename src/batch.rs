//! Multi-learner planning.
//!
//! Every learner is planned independently against the same catalog and
//! configuration, with the same seed, so a learner's plan does not
//! depend on who else is in the batch.

use crate::catalog::{Catalog, CatalogOptions};
use crate::config::PlanConfig;
use crate::error::{PlanError, Result};
use crate::profile::LearnerProfile;
use crate::report::PlanReport;
use crate::runner::PlanRunner;
use crate::types::{LearnerState, Solution, TopicSet};
use tracing::{info, warn};

/// What to do when one learner cannot be planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FailurePolicy {
    /// Record the failure and continue with the next learner.
    #[default]
    Skip,
    /// Return the first failure.
    Abort,
}

/// Result of [`plan_batch`].
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Rows of every planned learner, in input order.
    pub report: PlanReport,
    /// Skipped learners with the reason, in input order.
    pub failures: Vec<(String, PlanError)>,
}

impl BatchOutcome {
    /// Number of learners that produced a plan.
    pub fn planned(&self) -> usize {
        self.report.summaries.len()
    }
}

struct Planned {
    learner: LearnerState,
    topics: TopicSet,
    solution: Solution,
}

fn plan_one(
    catalog: &Catalog,
    profile: &LearnerProfile,
    options: &CatalogOptions,
    config: &PlanConfig,
) -> Result<Planned> {
    let learner = LearnerState::new(profile.ability);
    let topics = catalog.topic_set(&profile.mastery_map(), options)?;
    let solution = PlanRunner::plan(&topics, &learner, config)?;
    Ok(Planned {
        learner,
        topics,
        solution,
    })
}

#[cfg(feature = "parallel")]
fn plan_all(
    catalog: &Catalog,
    profiles: &[LearnerProfile],
    options: &CatalogOptions,
    config: &PlanConfig,
) -> Vec<Result<Planned>> {
    use rayon::prelude::*;

    if config.parallel {
        profiles
            .par_iter()
            .map(|p| plan_one(catalog, p, options, config))
            .collect()
    } else {
        profiles
            .iter()
            .map(|p| plan_one(catalog, p, options, config))
            .collect()
    }
}

#[cfg(not(feature = "parallel"))]
fn plan_all(
    catalog: &Catalog,
    profiles: &[LearnerProfile],
    options: &CatalogOptions,
    config: &PlanConfig,
) -> Vec<Result<Planned>> {
    profiles
        .iter()
        .map(|p| plan_one(catalog, p, options, config))
        .collect()
}

/// Plans every learner of `profiles` and collects the report rows.
///
/// An invalid `config` fails before any learner is planned. Other errors
/// belong to a single learner and are handled according to `policy`.
pub fn plan_batch(
    catalog: &Catalog,
    profiles: &[LearnerProfile],
    options: &CatalogOptions,
    config: &PlanConfig,
    policy: FailurePolicy,
) -> Result<BatchOutcome> {
    config.validate().map_err(PlanError::InvalidConfig)?;

    let mut outcome = BatchOutcome::default();

    for (profile, planned) in profiles.iter().zip(plan_all(catalog, profiles, options, config)) {
        let rows = planned.and_then(|p| {
            let mut rows = PlanReport::new();
            rows.push(&profile.student_id, &p.learner, &p.topics, &p.solution, config)?;
            Ok(rows)
        });
        match rows {
            Ok(rows) => outcome.report.extend(rows),
            Err(e) => match policy {
                FailurePolicy::Abort => return Err(e),
                FailurePolicy::Skip => {
                    warn!(student = %profile.student_id, error = %e, "skipping learner");
                    outcome.failures.push((profile.student_id.clone(), e));
                }
            },
        }
    }

    info!(
        learners = profiles.len(),
        planned = outcome.planned(),
        skipped = outcome.failures.len(),
        "batch planning finished"
    );

    Ok(outcome)
}
