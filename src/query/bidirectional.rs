//! Full bidirectional Dijkstra - no inside-filter, alternating on the
//! smaller queue top, standard sum-of-tops termination. The backward
//! frontier starts at zero; the first edge of the final path is paid at the
//! end.

use super::{check_endpoints, stitch_path, Frontier, PopBudget, QueryResult, BUDGET_EXHAUSTED};
use crate::graph::ShortcutGraph;

pub fn query_bidijkstra(graph: &ShortcutGraph, source_edge: u32, target_edge: u32) -> QueryResult {
    if let Some(early) = check_endpoints(graph, source_edge, target_edge) {
        return early;
    }

    let mut budget = PopBudget::new(graph);
    let mut fwd = Frontier::new();
    let mut bwd = Frontier::new();
    fwd.seed(source_edge, 0.0);
    bwd.seed(target_edge, 0.0);

    let mut best = f64::INFINITY;
    let mut meeting = 0u32;
    let mut found = false;

    while let (Some(ft), Some(bt)) = (fwd.peek_key(), bwd.peek_key()) {
        if ft + bt >= best {
            break;
        }

        if ft <= bt {
            let Some((d, u)) = fwd.pop() else { break };
            if !budget.consume() {
                return QueryResult::not_found(BUDGET_EXHAUSTED);
            }
            for sc in graph.fwd_shortcuts(u) {
                let nd = d + sc.cost as f64;
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
        } else {
            let Some((d, u)) = bwd.pop() else { break };
            if !budget.consume() {
                return QueryResult::not_found(BUDGET_EXHAUSTED);
            }
            for sc in graph.bwd_shortcuts(u) {
                let nd = d + sc.cost as f64;
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

    if !found {
        return QueryResult::not_found("No path found between source and target");
    }

    let path = stitch_path(&fwd.parent, &bwd.parent, meeting);
    QueryResult::found(best + graph.edge_cost(path[0]), path)
}
