//! Query engine behavior over small hand-built graphs: the literal
//! acceptance scenarios plus the cross-variant laws.

mod common;

use common::{edge, edge_with_res, graph, sc};
use hexroute::{
    query_bidijkstra, query_classic, query_classic_penalized, query_dijkstra, query_multi,
    query_pruned, query_unidirectional, Algorithm, ShortcutGraph,
};

/// One climb shortcut (1 -> 2, cost 10), both edges cost 1.
fn single_hop() -> ShortcutGraph {
    graph(
        vec![sc(1, 2, 10.0, 0, 1)],
        vec![edge(1, 1.0), edge(2, 1.0)],
    )
}

#[test]
fn test_single_shortcut_classic_and_pruned() {
    let g = single_hop();

    let classic = query_classic(&g, 1, 2);
    assert!(classic.reachable);
    assert_eq!(classic.distance, 11.0);
    assert_eq!(classic.path, vec![1, 2]);

    let pruned = query_pruned(&g, 1, 2);
    assert!(pruned.reachable);
    assert_eq!(pruned.distance, 11.0);
    assert_eq!(pruned.path, vec![1, 2]);
}

#[test]
fn test_self_query_all_variants() {
    let g = graph(
        vec![sc(5, 6, 2.0, 0, 1)],
        vec![edge(5, 3.5), edge(6, 1.0)],
    );

    for result in [
        query_classic(&g, 5, 5),
        query_pruned(&g, 5, 5),
        query_bidijkstra(&g, 5, 5),
        query_unidirectional(&g, 5, 5),
        query_dijkstra(&g, 5, 5),
    ] {
        assert!(result.reachable);
        assert_eq!(result.distance, 3.5);
        assert_eq!(result.path, vec![5]);
        assert!(result.error.is_empty());
    }
}

#[test]
fn test_missing_endpoints() {
    let g = single_hop();

    let result = query_classic(&g, 1, 9999);
    assert!(!result.reachable);
    assert_eq!(result.error, "Target edge 9999 not found");

    let result = query_pruned(&g, 9999, 2);
    assert!(!result.reachable);
    assert_eq!(result.error, "Source edge 9999 not found");
}

#[test]
fn test_two_hop_climb_with_descend() {
    // 1 -(+1,4)-> 2 -(+1,5)-> 3 -(-1,6)-> 4, edge costs all 1
    let g = graph(
        vec![sc(1, 2, 4.0, 0, 1), sc(2, 3, 5.0, 0, 1), sc(3, 4, 6.0, 0, -1)],
        vec![edge(1, 1.0), edge(2, 1.0), edge(3, 1.0), edge(4, 1.0)],
    );

    let result = query_classic(&g, 1, 4);
    assert!(result.reachable);
    assert_eq!(result.distance, 16.0);
    assert_eq!(result.path, vec![1, 2, 3, 4]);
}

#[test]
fn test_multi_source_multi_target() {
    // Climb-only pairwise shortcuts; the best pair is 10 -> 21 at cost 5.
    let g = graph(
        vec![
            sc(10, 20, 7.0, 0, 1),
            sc(10, 21, 5.0, 0, 1),
            sc(11, 20, 9.0, 0, 1),
            sc(11, 21, 8.0, 0, 1),
        ],
        vec![edge(10, 1.0), edge(11, 1.0), edge(20, 4.0), edge(21, 2.0)],
    );

    let result = query_multi(&g, &[10, 11], &[20, 21]);
    assert!(result.reachable);
    assert_eq!(result.distance, 5.0 + 2.0);
    assert_eq!(result.path, vec![10, 21]);
}

#[test]
fn test_multi_rejects_unusable_candidates() {
    let g = single_hop();
    let result = query_multi(&g, &[999], &[2]);
    assert!(!result.reachable);
}

#[test]
fn test_agreement_on_trivial_hierarchy() {
    // Flat hierarchy (all lca_res = -1), uniform edge costs. Classic, pruned,
    // full bidirectional and plain Dijkstra must agree on total cost.
    let g = graph(
        vec![
            sc(1, 2, 3.0, 0, 1),
            sc(2, 3, 2.0, 0, 1),
            sc(3, 4, 4.0, 0, -1),
            sc(4, 5, 1.0, 0, -1),
            sc(1, 3, 6.0, 0, 1),
            sc(3, 5, 6.0, 0, -1),
            sc(2, 4, 9.0, 0, 0),
        ],
        (1..=5).map(|id| edge(id, 1.0)).collect(),
    );

    for (s, t) in [(1u32, 5u32), (1, 4), (2, 5), (1, 3)] {
        let classic = query_classic(&g, s, t);
        let pruned = query_pruned(&g, s, t);
        let bidi = query_bidijkstra(&g, s, t);
        let dijkstra = query_dijkstra(&g, s, t);
        assert!(classic.reachable, "classic {s}->{t}");
        assert_eq!(classic.distance, pruned.distance, "pruned {s}->{t}");
        assert_eq!(classic.distance, bidi.distance, "bidijkstra {s}->{t}");
        assert_eq!(classic.distance, dijkstra.distance, "dijkstra {s}->{t}");
    }
}

#[test]
fn test_classic_cost_decomposition() {
    // distance = sum of shortcut costs + target edge cost
    let g = graph(
        vec![sc(1, 2, 4.0, 0, 1), sc(2, 3, 5.0, 0, 1)],
        vec![edge(1, 1.5), edge(2, 1.0), edge(3, 2.5)],
    );
    let result = query_classic(&g, 1, 3);
    assert!(result.reachable);
    assert_eq!(result.distance, 4.0 + 5.0 + 2.5);

    // Plain Dijkstra decomposes identically
    let dijkstra = query_dijkstra(&g, 1, 3);
    assert_eq!(dijkstra.distance, result.distance);
}

#[test]
fn test_no_path() {
    let g = graph(
        vec![sc(1, 2, 1.0, 0, 1), sc(3, 4, 1.0, 0, 1)],
        (1..=4).map(|id| edge(id, 1.0)).collect(),
    );
    for result in [
        query_classic(&g, 1, 4),
        query_pruned(&g, 1, 4),
        query_bidijkstra(&g, 1, 4),
        query_unidirectional(&g, 1, 4),
        query_dijkstra(&g, 1, 4),
    ] {
        assert!(!result.reachable);
        assert!(!result.error.is_empty());
    }
}

#[test]
fn test_unidirectional_climb_then_descend() {
    // Edges 1 and 3 sit above the high resolution (lca_res 0 > high_res -1),
    // edge 2 at the boundary. Climb while clean, descend after the turn.
    let g = graph(
        vec![sc(1, 2, 10.0, 0, 1), sc(2, 3, 5.0, 0, -1)],
        vec![
            edge_with_res(1, 1.0, 0),
            edge_with_res(2, 1.0, -1),
            edge_with_res(3, 1.0, 0),
        ],
    );

    let result = query_unidirectional(&g, 1, 3);
    assert!(result.reachable);
    // Popped distance; the target edge cost is not added
    assert_eq!(result.distance, 15.0);
    assert_eq!(result.path, vec![1, 2, 3]);
}

#[test]
fn test_unidirectional_descend_locks_state() {
    // Below the peak a lateral move sets the descend lock: a second lateral
    // must be rejected, a descend may follow.
    let lateral_twice = graph(
        vec![sc(1, 2, 1.0, 0, 0), sc(2, 3, 1.0, 0, 0)],
        (1..=3).map(|id| edge(id, 1.0)).collect(),
    );
    assert!(!query_unidirectional(&lateral_twice, 1, 3).reachable);

    let lateral_then_descend = graph(
        vec![sc(1, 2, 1.0, 0, 0), sc(2, 3, 1.0, 0, -1)],
        (1..=3).map(|id| edge(id, 1.0)).collect(),
    );
    let result = query_unidirectional(&lateral_then_descend, 1, 3);
    assert!(result.reachable);
    assert_eq!(result.distance, 2.0);
}

#[test]
fn test_unidirectional_no_climb_after_descend_above_peak() {
    // Above the peak, a clean state may climb but a locked state may not.
    let g = graph(
        vec![
            sc(1, 2, 1.0, 0, -1), // descend below peak locks the state
            sc(2, 3, 1.0, 0, 1),  // climb afterwards must be rejected
        ],
        vec![
            edge_with_res(1, 1.0, -1),
            edge_with_res(2, 1.0, 0),
            edge_with_res(3, 1.0, 0),
        ],
    );
    assert!(!query_unidirectional(&g, 1, 3).reachable);
}

#[test]
fn test_penalty_preservation() {
    // Two climb-only routes 1->4; penalizing the losing route leaves the
    // answer unchanged.
    let g = graph(
        vec![
            sc(1, 2, 3.0, 0, 1),
            sc(2, 4, 3.0, 0, 1),
            sc(1, 3, 10.0, 0, 1),
            sc(3, 4, 10.0, 0, 1),
        ],
        (1..=4).map(|id| edge(id, 1.0)).collect(),
    );

    let base = query_classic(&g, 1, 4);
    assert_eq!(base.path, vec![1, 2, 4]);

    let unaffected = query_classic_penalized(&g, 1, 4, &[3], 10.0);
    assert!(unaffected.reachable);
    assert_eq!(unaffected.path, vec![1, 2, 4]);
    assert_eq!(unaffected.distance, base.distance);

    // Penalizing the optimal route diverts the search, and the reported
    // distance is the true cost of the detour, not the penalized key.
    let diverted = query_classic_penalized(&g, 1, 4, &[2], 10.0);
    assert!(diverted.reachable);
    assert_eq!(diverted.path, vec![1, 3, 4]);
    assert_eq!(diverted.distance, 1.0 + 10.0 + 10.0);
}

#[test]
fn test_penalty_never_hits_endpoints() {
    let g = single_hop();
    let result = query_classic_penalized(&g, 1, 2, &[1, 2], 100.0);
    assert!(result.reachable);
    assert_eq!(result.distance, 1.0 + 10.0);
}

#[test]
fn test_pop_budget_exhaustion() {
    let mut g = graph(
        vec![sc(1, 2, 4.0, 0, 1), sc(2, 3, 5.0, 0, 1), sc(3, 4, 6.0, 0, -1)],
        (1..=4).map(|id| edge(id, 1.0)).collect(),
    );
    g.set_pop_budget(Some(1));

    for result in [
        query_classic(&g, 1, 4),
        query_pruned(&g, 1, 4),
        query_bidijkstra(&g, 1, 4),
        query_unidirectional(&g, 1, 4),
        query_dijkstra(&g, 1, 4),
    ] {
        assert!(!result.reachable);
        assert_eq!(result.error, "budget exhausted");
    }

    // Self queries bypass the budget entirely
    g.set_pop_budget(Some(0));
    assert!(query_classic(&g, 2, 2).reachable);
}

#[test]
fn test_csr_invariants_hold() {
    let g = graph(
        vec![
            sc(3, 1, 1.0, 0, 1),
            sc(1, 2, 1.0, 0, 0),
            sc(1, 3, 1.0, 0, -1),
            sc(2, 3, 1.0, 0, -2),
        ],
        (1..=3).map(|id| edge(id, 1.0)).collect(),
    );
    g.validate().unwrap();
}

#[test]
fn test_algorithm_dispatch() {
    let g = single_hop();
    for algorithm in [
        Algorithm::Classic,
        Algorithm::Pruned,
        Algorithm::BiDijkstra,
        Algorithm::Dijkstra,
    ] {
        let result = hexroute::route_by_edges(&g, 1, 2, algorithm);
        assert!(result.reachable, "{algorithm:?}");
        assert_eq!(result.path, vec![1, 2]);
    }
}
