//! Classic bidirectional search with the inside-filter: the forward frontier
//! climbs (+1 shortcuts only), the backward frontier descends or moves
//! laterally (-1 / 0). The backward frontier starts at the target edge's own
//! cost, so the meeting total already covers the target edge.

use rustc_hash::FxHashSet;

use super::{check_endpoints, stitch_path, Frontier, PopBudget, QueryResult, BUDGET_EXHAUSTED};
use crate::graph::{Inside, ShortcutGraph};

pub fn query_classic(graph: &ShortcutGraph, source_edge: u32, target_edge: u32) -> QueryResult {
    classic_impl(graph, source_edge, target_edge, None)
}

/// Penalized variant: shortcuts touching an edge in `penalized` (target,
/// source-side, or via) cost `penalty_factor` times more during the search.
/// The returned distance is the recomputed, unpenalized cost of the chosen
/// path. Endpoints are never penalized.
pub fn query_classic_penalized(
    graph: &ShortcutGraph,
    source_edge: u32,
    target_edge: u32,
    penalized_edges: &[u32],
    penalty_factor: f64,
) -> QueryResult {
    let mut penalty_set: FxHashSet<u32> = penalized_edges.iter().copied().collect();
    penalty_set.remove(&source_edge);
    penalty_set.remove(&target_edge);
    classic_impl(
        graph,
        source_edge,
        target_edge,
        Some((&penalty_set, penalty_factor)),
    )
}

fn classic_impl(
    graph: &ShortcutGraph,
    source_edge: u32,
    target_edge: u32,
    penalty: Option<(&FxHashSet<u32>, f64)>,
) -> QueryResult {
    if let Some(early) = check_endpoints(graph, source_edge, target_edge) {
        return early;
    }

    let mut budget = PopBudget::new(graph);
    let mut fwd = Frontier::new();
    let mut bwd = Frontier::new();
    fwd.seed(source_edge, 0.0);
    bwd.seed(target_edge, graph.edge_cost(target_edge));

    let mut best = f64::INFINITY;
    let mut meeting = 0u32;
    let mut found = false;

    loop {
        if let Some((d, u)) = fwd.pop() {
            if !budget.consume() {
                return QueryResult::not_found(BUDGET_EXHAUSTED);
            }
            if d < best {
                for sc in graph.fwd_shortcuts(u) {
                    if sc.inside() != Inside::Climb {
                        continue;
                    }
                    let mut cost = sc.cost as f64;
                    if let Some((set, factor)) = penalty {
                        if set.contains(&sc.to)
                            || (sc.via_edge() != 0 && set.contains(&sc.via_edge()))
                        {
                            cost *= factor;
                        }
                    }
                    let nd = d + cost;
                    if fwd.improve(sc.to, nd, u) {
                        if let Some(bd) = bwd.dist_of(sc.to) {
                            if nd + bd < best {
                                best = nd + bd;
                                meeting = sc.to;
                                found = true;
                            }
                        }
                    }
                }
            }
        }

        if let Some((d, u)) = bwd.pop() {
            if !budget.consume() {
                return QueryResult::not_found(BUDGET_EXHAUSTED);
            }
            if d < best {
                for sc in graph.bwd_shortcuts(u) {
                    let inside = sc.inside();
                    if inside != Inside::Descend && inside != Inside::Lateral {
                        continue;
                    }
                    let mut cost = sc.cost as f64;
                    if let Some((set, factor)) = penalty {
                        if set.contains(&sc.from)
                            || (sc.via_edge() != 0 && set.contains(&sc.via_edge()))
                        {
                            cost *= factor;
                        }
                    }
                    let nd = d + cost;
                    let from = sc.from;
                    if bwd.improve(from, nd, u) {
                        if let Some(fd) = fwd.dist_of(from) {
                            if fd + nd < best {
                                best = fd + nd;
                                meeting = from;
                                found = true;
                            }
                        }
                    }
                }
            }
        }

        match (fwd.peek_key(), bwd.peek_key()) {
            (Some(f), Some(b)) if f >= best && b >= best => break,
            (None, None) => break,
            _ => {}
        }
    }

    if !found {
        return QueryResult::not_found("No path found");
    }

    let path = stitch_path(&fwd.parent, &bwd.parent, meeting);

    if penalty.is_some() {
        // Report the real cost of the detour, not the penalized key values.
        let mut true_total = graph.edge_cost(path[0]);
        for pair in path.windows(2) {
            match graph.find_shortcut(pair[0], pair[1]) {
                Some(sc) => true_total += sc.cost as f64,
                None => return QueryResult::not_found("Path reconstruction error"),
            }
        }
        return QueryResult::found(true_total, path);
    }

    QueryResult::found(best, path)
}
