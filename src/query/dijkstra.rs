//! Plain forward Dijkstra - relaxes every outgoing shortcut regardless of
//! its hierarchy role. The baseline the pruned variants are checked against.

use super::{check_endpoints, Frontier, PopBudget, QueryResult, BUDGET_EXHAUSTED};
use crate::graph::ShortcutGraph;

pub fn query_dijkstra(graph: &ShortcutGraph, source_edge: u32, target_edge: u32) -> QueryResult {
    if let Some(early) = check_endpoints(graph, source_edge, target_edge) {
        return early;
    }

    let mut budget = PopBudget::new(graph);
    let mut frontier = Frontier::new();
    frontier.seed(source_edge, 0.0);

    let mut best_dist = None;

    while let Some((d, u)) = frontier.pop() {
        if !budget.consume() {
            return QueryResult::not_found(BUDGET_EXHAUSTED);
        }

        if u == target_edge {
            best_dist = Some(d);
            break;
        }

        for sc in graph.fwd_shortcuts(u) {
            frontier.improve(sc.to, d + sc.cost as f64, u);
        }
    }

    let Some(dist) = best_dist else {
        return QueryResult::not_found("Path not found");
    };

    let mut path = Vec::new();
    let mut curr = target_edge;
    while curr != source_edge {
        path.push(curr);
        curr = frontier.parent[&curr];
    }
    path.push(source_edge);
    path.reverse();

    // Popped distance covers the shortcut chain; the target edge itself is
    // paid on top.
    QueryResult::found(dist + graph.edge_cost(target_edge), path)
}
