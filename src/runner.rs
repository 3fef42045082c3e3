//! Study path optimization loop.
//!
//! [`PlanRunner`] alternates ant colony construction with exact time
//! allocation:
//!
//! 1. each of `n_ants` ants builds a topological order from the current
//!    pheromone field and the static desirability
//! 2. the KKT allocator splits the budget optimally along that order
//! 3. the pair is scored (utility, jump penalty, loss, quality)
//! 4. after the whole batch, the field evaporates and is reinforced
//!
//! The best-by-loss candidate over the run is returned. Ties keep the
//! first one found.

use crate::aco::{construct_path, AntTrail, PheromoneField};
use crate::config::PlanConfig;
use crate::error::{PlanError, Result};
use crate::heuristics::build_desirability;
use crate::kkt::allocate_time;
use crate::objective::{evaluate, Score};
use crate::types::{LearnerState, Solution, Topic, TopicSet};
use tracing::{debug, info};
use u_numflow::random::create_rng;

/// Result of a planning run.
#[derive(Debug, Clone)]
pub struct PlanResult {
    /// Best plan found over all iterations.
    pub best: Solution,

    /// Iterations executed.
    pub iterations: usize,

    /// Candidates evaluated (`n_ants · n_iters`).
    pub evaluations: usize,

    /// Iteration (1-based) in which `best` was sampled.
    pub best_iteration: usize,

    /// Best loss after each iteration. Non-increasing.
    pub loss_history: Vec<f64>,

    /// Pheromone field after the last update.
    pub pheromone: PheromoneField,
}

/// One evaluated ant.
struct Candidate {
    path: Vec<usize>,
    times: Vec<f64>,
    lambda: f64,
    score: Score,
}

impl Candidate {
    fn evaluate(
        topics: &TopicSet,
        path: Vec<usize>,
        learner: &LearnerState,
        config: &PlanConfig,
    ) -> Result<Self> {
        let ordered: Vec<&Topic> = path.iter().map(|&i| &topics.topics()[i]).collect();
        let allocation = allocate_time(&ordered, learner, config)?;
        let score = evaluate(&ordered, &allocation.times, learner, config);
        Ok(Self {
            path,
            times: allocation.times,
            lambda: allocation.lambda,
            score,
        })
    }

    fn solution(&self, topics: &TopicSet) -> Solution {
        let ids = topics.ids_of(&self.path);
        let times = ids.iter().copied().zip(self.times.iter().copied()).collect();
        Solution {
            path: ids,
            times,
            utility: self.score.utility,
            loss: self.score.loss,
            quality: self.score.quality,
            lambda: self.lambda,
        }
    }

    fn into_trail(self) -> AntTrail {
        AntTrail {
            path: self.path,
            quality: self.score.quality,
            gains: self.score.gains,
        }
    }
}

/// Executes the study path search.
///
/// # Usage
///
/// ```
/// use u_studyplan::{LearnerState, PlanConfig, PlanRunner, Topic, TopicSet};
///
/// let topics = TopicSet::new(vec![
///     Topic::new(1, "sets", 1.0, 1.0, 1.0, 0.2),
///     Topic::new(2, "functions", 2.0, 2.0, 1.0, 0.1).with_prerequisites(vec![1]),
/// ])
/// .unwrap();
/// let config = PlanConfig::default().with_total_time(20.0).with_iterations(10);
///
/// let result = PlanRunner::run(&topics, &LearnerState::new(1.0), &config).unwrap();
/// assert_eq!(result.best.path, vec![1, 2]);
/// ```
pub struct PlanRunner;

impl PlanRunner {
    /// Runs the optimizer and returns the best plan with run statistics.
    ///
    /// # Errors
    /// - [`PlanError::InvalidConfig`] / [`PlanError::InvalidLearner`] on bad input
    /// - [`PlanError::InfeasibleBudget`] when `T < |topics| · t_min`
    /// - [`PlanError::CyclicPrerequisites`] when the prerequisites are not a DAG
    pub fn run(topics: &TopicSet, learner: &LearnerState, config: &PlanConfig) -> Result<PlanResult> {
        config.validate().map_err(PlanError::InvalidConfig)?;
        learner.validate()?;

        let mut rng = create_rng(config.seed);
        let eta = build_desirability(topics, config.eps);
        let mut field = PheromoneField::new(topics.len(), config.tau0);

        debug!(
            topics = topics.len(),
            ants = config.n_ants,
            iterations = config.n_iters,
            seed = config.seed,
            "starting study path search"
        );

        let mut best: Option<Solution> = None;
        let mut best_iteration = 0;
        let mut loss_history = Vec::with_capacity(config.n_iters);
        let report_every = config.report_every();

        for iteration in 1..=config.n_iters {
            // Paths share one random stream, so construction stays sequential.
            let paths = (0..config.n_ants)
                .map(|_| construct_path(topics, &field, &eta, config, &mut rng))
                .collect::<Result<Vec<_>>>()?;

            let candidates = evaluate_batch(topics, paths, learner, config)?;

            let mut trails = Vec::with_capacity(candidates.len());
            for candidate in candidates {
                if best
                    .as_ref()
                    .is_none_or(|b| candidate.score.loss < b.loss)
                {
                    best = Some(candidate.solution(topics));
                    best_iteration = iteration;
                }
                trails.push(candidate.into_trail());
            }

            field.update(&trails, config);

            if let Some(b) = &best {
                loss_history.push(b.loss);
                if iteration % report_every == 0 {
                    info!(
                        iteration,
                        total = config.n_iters,
                        best_loss = b.loss,
                        best_utility = b.utility,
                        best_quality = b.quality,
                        lambda = b.lambda,
                        "study path search progress"
                    );
                }
            }
        }

        let best = best.ok_or_else(|| PlanError::InvalidConfig("no candidates sampled".into()))?;

        debug!(
            best_loss = best.loss,
            best_iteration,
            "study path search finished"
        );

        Ok(PlanResult {
            best,
            iterations: config.n_iters,
            evaluations: config.n_iters * config.n_ants,
            best_iteration,
            loss_history,
            pheromone: field,
        })
    }

    /// Runs the optimizer and returns only the best plan.
    pub fn plan(topics: &TopicSet, learner: &LearnerState, config: &PlanConfig) -> Result<Solution> {
        Self::run(topics, learner, config).map(|r| r.best)
    }
}

/// Allocates and scores every path of one iteration, in sampling order.
#[cfg(feature = "parallel")]
fn evaluate_batch(
    topics: &TopicSet,
    paths: Vec<Vec<usize>>,
    learner: &LearnerState,
    config: &PlanConfig,
) -> Result<Vec<Candidate>> {
    use rayon::prelude::*;

    if config.parallel {
        paths
            .into_par_iter()
            .map(|path| Candidate::evaluate(topics, path, learner, config))
            .collect()
    } else {
        evaluate_sequential(topics, paths, learner, config)
    }
}

#[cfg(not(feature = "parallel"))]
fn evaluate_batch(
    topics: &TopicSet,
    paths: Vec<Vec<usize>>,
    learner: &LearnerState,
    config: &PlanConfig,
) -> Result<Vec<Candidate>> {
    evaluate_sequential(topics, paths, learner, config)
}

fn evaluate_sequential(
    topics: &TopicSet,
    paths: Vec<Vec<usize>>,
    learner: &LearnerState,
    config: &PlanConfig,
) -> Result<Vec<Candidate>> {
    paths
        .into_iter()
        .map(|path| Candidate::evaluate(topics, path, learner, config))
        .collect()
}
