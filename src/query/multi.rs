//! Multi-source / multi-target bidirectional search with the classic
//! inside-filter. Every candidate seeds its frontier directly; the snap
//! distances supplied by the spatial lookup are informational and never
//! enter the key values.

use super::{stitch_path, Frontier, PopBudget, QueryResult, BUDGET_EXHAUSTED};
use crate::graph::{Inside, ShortcutGraph};

pub fn query_multi(graph: &ShortcutGraph, source_edges: &[u32], target_edges: &[u32]) -> QueryResult {
    let mut budget = PopBudget::new(graph);
    let mut fwd = Frontier::new();
    let mut bwd = Frontier::new();

    for &src in source_edges {
        if graph.is_known_edge(src) {
            fwd.seed(src, 0.0);
        }
    }
    for &tgt in target_edges {
        if graph.is_known_edge(tgt) {
            bwd.seed(tgt, graph.edge_cost(tgt));
        }
    }
    if fwd.is_exhausted() || bwd.is_exhausted() {
        return QueryResult::not_found("No usable source or target candidates");
    }

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
    QueryResult::found(best, path)
}
