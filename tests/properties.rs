//! Property tests over random prerequisite DAGs.

use proptest::prelude::*;
use u_studyplan::objective::quality_from_loss;
use u_studyplan::{allocate_time, LearnerState, PlanConfig, PlanRunner, Topic, TopicId, TopicSet};

/// `(weight, difficulty, base_time, mastery, prerequisite mask)` per topic.
/// Bit `j` of the mask makes topic `j` a prerequisite, for `j < i` only.
fn topic_rows() -> impl Strategy<Value = Vec<(f64, f64, f64, f64, u8)>> {
    prop::collection::vec(
        (0.5f64..5.0, 0.5f64..5.0, 0.5f64..10.0, 0.0f64..0.95, any::<u8>()),
        1..8,
    )
}

fn build(rows: &[(f64, f64, f64, f64, u8)]) -> Vec<Topic> {
    rows.iter()
        .enumerate()
        .map(|(i, &(w, d, t, m, mask))| {
            let pre: Vec<TopicId> = (0..i)
                .filter(|j| mask & (1 << j) != 0)
                .map(|j| j as TopicId + 1)
                .collect();
            Topic::new(i as TopicId + 1, format!("t{i}"), w, d, t, m).with_prerequisites(pre)
        })
        .collect()
}

fn small_run(seed: u64, budget: f64) -> PlanConfig {
    PlanConfig::default()
        .with_total_time(budget)
        .with_min_time(1.0)
        .with_ants(4)
        .with_iterations(3)
        .with_seed(seed)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_path_is_topological_permutation(rows in topic_rows(), seed in 0u64..1000) {
        let topics = TopicSet::new(build(&rows)).unwrap();
        let budget = topics.len() as f64 * 3.0;
        let best = PlanRunner::plan(&topics, &LearnerState::new(1.0), &small_run(seed, budget)).unwrap();

        let mut sorted = best.path.clone();
        sorted.sort_unstable();
        let ids: Vec<TopicId> = topics.topics().iter().map(|t| t.id).collect();
        prop_assert_eq!(sorted, ids);

        for topic in topics.topics() {
            let at = best.position_of(topic.id).unwrap();
            for pre in &topic.prerequisites {
                prop_assert!(best.position_of(*pre).unwrap() < at, "{} before {}", pre, topic.id);
            }
        }
    }

    #[test]
    fn test_allocation_meets_budget_and_floor(
        rows in topic_rows(),
        min_time in 0.0f64..3.0,
        slack in 0.0f64..60.0,
        ability in 0.2f64..3.0,
    ) {
        let topics = build(&rows);
        let path: Vec<&Topic> = topics.iter().collect();
        let budget = path.len() as f64 * min_time + slack;
        let config = PlanConfig::default().with_total_time(budget).with_min_time(min_time);

        let allocation = allocate_time(&path, &LearnerState::new(ability), &config).unwrap();

        prop_assert!((allocation.total() - budget).abs() < 1e-6, "total {} vs {}", allocation.total(), budget);
        for &t in &allocation.times {
            prop_assert!(t >= min_time - 1e-6, "time {} below floor {}", t, min_time);
        }
    }

    #[test]
    fn test_more_mastery_never_more_time(
        rows in topic_rows(),
        pick in any::<prop::sample::Index>(),
        bump in 0.0f64..0.5,
        slack in 0.0f64..40.0,
    ) {
        let topics = build(&rows);
        let i = pick.index(topics.len());
        let mut raised = topics.clone();
        raised[i] = raised[i].with_mastery((raised[i].mastery + bump).min(0.99));

        let config = PlanConfig::default()
            .with_total_time(topics.len() as f64 + slack)
            .with_min_time(1.0);
        let learner = LearnerState::new(1.0);

        let before = allocate_time(&topics.iter().collect::<Vec<_>>(), &learner, &config).unwrap();
        let after = allocate_time(&raised.iter().collect::<Vec<_>>(), &learner, &config).unwrap();

        prop_assert!(
            after.times[i] <= before.times[i] + 1e-6,
            "time rose from {} to {}", before.times[i], after.times[i]
        );
    }

    #[test]
    fn test_quality_monotone_and_positive(a in -1e6f64..1e6, b in -1e6f64..1e6) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let eps = 1e-9;
        prop_assert!(quality_from_loss(lo, eps) >= quality_from_loss(hi, eps));
        prop_assert!(quality_from_loss(hi, eps) > 0.0);
    }

    #[test]
    fn test_seeded_runs_repeat(rows in topic_rows(), seed in 0u64..1000) {
        let topics = TopicSet::new(build(&rows)).unwrap();
        let learner = LearnerState::new(0.8);
        let config = small_run(seed, topics.len() as f64 * 2.5);

        let a = PlanRunner::run(&topics, &learner, &config).unwrap();
        let b = PlanRunner::run(&topics, &learner, &config).unwrap();
        prop_assert_eq!(a.best, b.best);
        prop_assert_eq!(a.loss_history, b.loss_history);
    }
}
