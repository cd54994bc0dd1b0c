use std::sync::Arc;

use tercet_planner::index::IndexOrder;
use tercet_planner::pattern::TriplePattern;
use tercet_planner::store::InMemoryRangeSizes;
use tercet_planner::variable::Variable;
use tercet_planner::{JoinAlgorithm, JoinStrategy, PlanError, PlannerOptions, QueryPlanner};

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn planner(algorithm: JoinAlgorithm, store: &Arc<InMemoryRangeSizes>) -> QueryPlanner {
    QueryPlanner::new(
        PlannerOptions {
            join_algorithm: algorithm,
        },
        store.clone(),
    )
}

#[tokio::test]
async fn a_single_predicate_pattern_probes_pos() {
    init_tracing();
    let store = Arc::new(
        InMemoryRangeSizes::new().with_size("pos::friend::", "pos::friend\u{ff}", 10),
    );
    let query = vec![TriplePattern::new().with_predicate("friend")];
    let plan = planner(JoinAlgorithm::Basic, &store)
        .plan(&query)
        .await
        .expect("plan succeeds");

    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].pattern, query[0]);
    assert_eq!(plan[0].stream, JoinStrategy::NestedLoop);
    assert_eq!(plan[0].index, None);
    assert_eq!(
        store.requests(),
        vec![("pos::friend::".to_string(), "pos::friend\u{ff}".to_string())]
    );
}

#[tokio::test]
async fn basic_plans_reorder_by_ascending_estimate() {
    init_tracing();
    let store = Arc::new(
        InMemoryRangeSizes::new()
            .with_size("pos::friend::", "pos::friend\u{ff}", 10)
            .with_size("pso::friend::matteo::", "pso::friend::matteo\u{ff}", 1),
    );
    let broad = TriplePattern::new().with_predicate("friend");
    let narrow = TriplePattern::new()
        .with_subject("matteo")
        .with_predicate("friend");
    let plan = planner(JoinAlgorithm::Basic, &store)
        .plan(&[broad.clone(), narrow.clone()])
        .await
        .expect("plan succeeds");

    assert_eq!(plan.len(), 2);
    assert_eq!(plan[0].pattern, narrow);
    assert_eq!(plan[1].pattern, broad);
    for planned in &plan {
        assert_eq!(planned.stream, JoinStrategy::NestedLoop);
        assert_eq!(planned.index, None);
    }
    // Estimates go out in input order even though the plan is reordered.
    assert_eq!(
        store.requests(),
        vec![
            ("pos::friend::".to_string(), "pos::friend\u{ff}".to_string()),
            (
                "pso::friend::matteo::".to_string(),
                "pso::friend::matteo\u{ff}".to_string()
            ),
        ]
    );
}

#[tokio::test]
async fn equal_estimates_keep_their_input_order() {
    let store = Arc::new(
        InMemoryRangeSizes::new()
            .with_size("pos::friend::", "pos::friend\u{ff}", 5)
            .with_size("pos::abc::", "pos::abc\u{ff}", 5),
    );
    let first = TriplePattern::new().with_predicate("friend");
    let second = TriplePattern::new().with_predicate("abc");
    let plan = planner(JoinAlgorithm::Basic, &store)
        .plan(&[first.clone(), second.clone()])
        .await
        .expect("plan succeeds");

    assert_eq!(plan[0].pattern, first);
    assert_eq!(plan[1].pattern, second);
}

#[tokio::test]
async fn sort_pairs_adjacent_patterns_on_a_shared_index() {
    init_tracing();
    let store = Arc::new(
        InMemoryRangeSizes::new()
            .with_size("pos::friend::", "pos::friend\u{ff}", 10)
            .with_size("pso::friend::matteo::", "pso::friend::matteo\u{ff}", 1),
    );
    let broad = TriplePattern::new().with_predicate("friend");
    let narrow = TriplePattern::new()
        .with_subject("matteo")
        .with_predicate("friend");
    let plan = planner(JoinAlgorithm::Sort, &store)
        .plan(&[broad.clone(), narrow.clone()])
        .await
        .expect("plan succeeds");

    assert_eq!(plan.len(), 2);
    // pso serves both the subject+predicate scan and the predicate scan.
    assert_eq!(plan[0].pattern, narrow);
    assert_eq!(plan[0].stream, JoinStrategy::NestedLoop);
    assert_eq!(plan[0].index, Some(IndexOrder::Pso));
    assert_eq!(plan[1].pattern, broad);
    assert_eq!(plan[1].stream, JoinStrategy::SortedMerge);
    assert_eq!(plan[1].index, Some(IndexOrder::Pso));
}

#[tokio::test]
async fn sort_merges_same_shape_patterns_with_different_predicates() {
    let store = Arc::new(
        InMemoryRangeSizes::new()
            .with_size("pos::friend::", "pos::friend\u{ff}", 1)
            .with_size("pos::abc::", "pos::abc\u{ff}", 10),
    );
    let x = Variable::new("x");
    let c = Variable::new("c");
    let friends = TriplePattern::new()
        .with_subject(x.clone())
        .with_predicate("friend")
        .with_object(c.clone());
    let abc = TriplePattern::new()
        .with_subject(x)
        .with_predicate("abc")
        .with_object(c);
    let plan = planner(JoinAlgorithm::Sort, &store)
        .plan(&[friends.clone(), abc.clone()])
        .await
        .expect("plan succeeds");

    assert_eq!(plan.len(), 2);
    assert_eq!(plan[0].pattern, friends);
    assert_eq!(plan[0].stream, JoinStrategy::NestedLoop);
    assert_eq!(plan[0].index, Some(IndexOrder::Pos));
    assert_eq!(plan[1].pattern, abc);
    assert_eq!(plan[1].stream, JoinStrategy::SortedMerge);
    assert_eq!(plan[1].index, Some(IndexOrder::Pos));
}

#[tokio::test]
async fn sort_leaves_incompatible_neighbors_unpaired() {
    let store = Arc::new(
        InMemoryRangeSizes::new()
            .with_size("pos::friend::", "pos::friend\u{ff}", 1)
            .with_size("pos::abc::", "pos::abc\u{ff}", 10),
    );
    // One pattern binds a subject variable, the other does not; their scan
    // rows are keyed by different unknowns.
    let plain = TriplePattern::new().with_predicate("friend");
    let with_var = TriplePattern::new()
        .with_subject(Variable::new("x"))
        .with_predicate("abc");
    let plan = planner(JoinAlgorithm::Sort, &store)
        .plan(&[plain, with_var])
        .await
        .expect("plan succeeds");

    for planned in &plan {
        assert_eq!(planned.stream, JoinStrategy::NestedLoop);
        assert_eq!(planned.index, None);
    }
}

#[tokio::test]
async fn sort_chains_three_patterns_over_one_index() {
    let store = Arc::new(
        InMemoryRangeSizes::new()
            .with_size("pos::friend::", "pos::friend\u{ff}", 1)
            .with_size("pos::abc::", "pos::abc\u{ff}", 5)
            .with_size("pos::xyz::", "pos::xyz\u{ff}", 9),
    );
    let shape = |predicate: &str| {
        TriplePattern::new()
            .with_subject(Variable::new("x"))
            .with_predicate(predicate)
            .with_object(Variable::new("c"))
    };
    let plan = planner(JoinAlgorithm::Sort, &store)
        .plan(&[shape("friend"), shape("abc"), shape("xyz")])
        .await
        .expect("plan succeeds");

    assert_eq!(plan[0].stream, JoinStrategy::NestedLoop);
    assert_eq!(plan[1].stream, JoinStrategy::SortedMerge);
    assert_eq!(plan[2].stream, JoinStrategy::SortedMerge);
    assert!(plan.iter().all(|p| p.index == Some(IndexOrder::Pos)));
}

#[tokio::test]
async fn a_chain_breaks_when_the_pinned_index_cannot_serve() {
    let store = Arc::new(
        InMemoryRangeSizes::new()
            .with_size("pso::friend::matteo::", "pso::friend::matteo\u{ff}", 1)
            .with_size("pos::friend::", "pos::friend\u{ff}", 10)
            .with_size("pos::friend::lucio::", "pos::friend::lucio\u{ff}", 100),
    );
    let narrow = TriplePattern::new()
        .with_subject("matteo")
        .with_predicate("friend");
    let broad = TriplePattern::new().with_predicate("friend");
    let by_object = TriplePattern::new()
        .with_predicate("friend")
        .with_object("lucio");
    let plan = planner(JoinAlgorithm::Sort, &store)
        .plan(&[narrow, broad, by_object.clone()])
        .await
        .expect("plan succeeds");

    // The first two pair on pso; a predicate+object scan cannot run on pso,
    // so the third falls back to a nested-loop probe.
    assert_eq!(plan[0].index, Some(IndexOrder::Pso));
    assert_eq!(plan[1].index, Some(IndexOrder::Pso));
    assert_eq!(plan[1].stream, JoinStrategy::SortedMerge);
    assert_eq!(plan[2].pattern, by_object);
    assert_eq!(plan[2].stream, JoinStrategy::NestedLoop);
    assert_eq!(plan[2].index, None);
}

#[tokio::test]
async fn a_single_pattern_with_variables_still_gets_a_strategy() {
    let store = Arc::new(
        InMemoryRangeSizes::new().with_size("pos::friend::", "pos::friend\u{ff}", 10),
    );
    let pattern = TriplePattern::new()
        .with_subject(Variable::new("x"))
        .with_predicate("friend");
    let plan = planner(JoinAlgorithm::Sort, &store)
        .plan(&[pattern.clone()])
        .await
        .expect("plan succeeds");

    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].pattern, pattern);
    assert_eq!(plan[0].stream, JoinStrategy::NestedLoop);
    assert_eq!(plan[0].index, None);
}

#[tokio::test]
async fn patterns_with_no_bound_fields_scan_all_of_spo() {
    let store = Arc::new(InMemoryRangeSizes::new().with_size("spo::", "spo\u{ff}", 1000));
    let plan = planner(JoinAlgorithm::Basic, &store)
        .plan(&[TriplePattern::new()])
        .await
        .expect("plan succeeds");

    assert_eq!(plan.len(), 1);
    assert_eq!(
        store.requests(),
        vec![("spo::".to_string(), "spo\u{ff}".to_string())]
    );
}

#[tokio::test]
async fn estimate_failures_abort_planning() {
    let store = Arc::new(
        InMemoryRangeSizes::new()
            .with_size("pos::friend::", "pos::friend\u{ff}", 10)
            .with_failure("pos::abc::", "pos::abc\u{ff}", "backend unavailable"),
    );
    let err = planner(JoinAlgorithm::Basic, &store)
        .plan(&[
            TriplePattern::new().with_predicate("friend"),
            TriplePattern::new().with_predicate("abc"),
        ])
        .await
        .expect_err("failed estimate aborts the plan");

    assert!(matches!(err, PlanError::Storage(_)));
    assert_eq!(
        err.to_string(),
        "range size estimate failed: backend unavailable"
    );
}

#[tokio::test]
async fn empty_queries_plan_without_touching_storage() {
    let store = Arc::new(InMemoryRangeSizes::new());
    let plan = planner(JoinAlgorithm::Sort, &store)
        .plan(&[])
        .await
        .expect("empty plan succeeds");

    assert!(plan.is_empty());
    assert!(store.requests().is_empty());
}

#[tokio::test]
async fn one_planner_serves_concurrent_plans() {
    let store = Arc::new(
        InMemoryRangeSizes::new()
            .with_size("pos::friend::", "pos::friend\u{ff}", 10)
            .with_size("pos::abc::", "pos::abc\u{ff}", 2),
    );
    let planner = planner(JoinAlgorithm::Basic, &store);
    assert_eq!(planner.options().join_algorithm, JoinAlgorithm::Basic);
    let friends = vec![TriplePattern::new().with_predicate("friend")];
    let abc = vec![TriplePattern::new().with_predicate("abc")];

    let (left, right) = tokio::join!(planner.plan(&friends), planner.plan(&abc));
    let left = left.expect("left plan succeeds");
    let right = right.expect("right plan succeeds");

    assert_eq!(left[0].pattern, friends[0]);
    assert_eq!(right[0].pattern, abc[0]);
    assert_eq!(store.requests().len(), 2);
}
