//! Hierarchy-pruned bidirectional search. The LCA of the endpoint cells (the
//! "high cell") bounds how far either frontier may climb: forward expansion
//! stops below the high resolution, backward expansion switches between
//! descend/lateral/boundary shortcuts depending on which side of the
//! boundary the settled vertex sits. Arrival minima at the boundary feed the
//! termination bound.

use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;

use super::{check_endpoints, stitch_path, HeapEntry, PopBudget, QueryResult, BUDGET_EXHAUSTED};
use crate::graph::{Inside, ShortcutGraph};

pub fn query_pruned(graph: &ShortcutGraph, source_edge: u32, target_edge: u32) -> QueryResult {
    if let Some(early) = check_endpoints(graph, source_edge, target_edge) {
        return early;
    }

    let high = graph.high_cell(source_edge, target_edge);

    let mut dist_fwd: FxHashMap<u32, f64> = FxHashMap::default();
    let mut dist_bwd: FxHashMap<u32, f64> = FxHashMap::default();
    let mut parent_fwd: FxHashMap<u32, u32> = FxHashMap::default();
    let mut parent_bwd: FxHashMap<u32, u32> = FxHashMap::default();
    let mut pq_fwd: BinaryHeap<HeapEntry<(u32, i8)>> = BinaryHeap::new();
    let mut pq_bwd: BinaryHeap<HeapEntry<(u32, i8)>> = BinaryHeap::new();

    dist_fwd.insert(source_edge, 0.0);
    parent_fwd.insert(source_edge, source_edge);
    pq_fwd.push(HeapEntry {
        dist: 0.0,
        item: (source_edge, graph.edge_res(source_edge)),
    });

    let target_cost = graph.edge_cost(target_edge);
    dist_bwd.insert(target_edge, target_cost);
    parent_bwd.insert(target_edge, target_edge);
    pq_bwd.push(HeapEntry {
        dist: target_cost,
        item: (target_edge, graph.edge_res(target_edge)),
    });

    let mut budget = PopBudget::new(graph);
    let mut best = f64::INFINITY;
    let mut meeting = 0u32;
    let mut found = false;
    // Cheapest arrivals at (or below) the high resolution, per side. These
    // bound what the opposite frontier could still contribute.
    let mut min_arrival_fwd = f64::INFINITY;
    let mut min_arrival_bwd = f64::INFINITY;

    while !pq_fwd.is_empty() || !pq_bwd.is_empty() {
        // Forward step
        if let Some(HeapEntry { dist: d, item: (u, u_res) }) = pq_fwd.pop() {
            if !budget.consume() {
                return QueryResult::not_found(BUDGET_EXHAUSTED);
            }

            if let Some(&bd) = dist_bwd.get(&u) {
                min_arrival_fwd = min_arrival_fwd.min(dist_fwd[&u]);
                min_arrival_bwd = min_arrival_bwd.min(bd);
                if d + bd < best {
                    best = d + bd;
                    meeting = u;
                    found = true;
                }
            }

            let stale = dist_fwd.get(&u).is_some_and(|&cur| d > cur);
            if !stale && d < best {
                if u_res < high.res {
                    // Fell below the boundary: record the arrival, stop
                    // expanding this vertex.
                    min_arrival_fwd = min_arrival_fwd.min(dist_fwd[&u]);
                } else {
                    if u_res == high.res {
                        min_arrival_fwd = min_arrival_fwd.min(dist_fwd[&u]);
                    }
                    for sc in graph.fwd_shortcuts(u) {
                        if sc.inside() != Inside::Climb {
                            continue;
                        }
                        let nd = d + sc.cost as f64;
                        if dist_fwd.get(&sc.to).is_none_or(|&cur| nd < cur) {
                            dist_fwd.insert(sc.to, nd);
                            parent_fwd.insert(sc.to, u);
                            pq_fwd.push(HeapEntry {
                                dist: nd,
                                item: (sc.to, sc.cell_res()),
                            });
                        }
                    }
                }
            }
        }

        // Backward step
        if let Some(HeapEntry { dist: d, item: (u, u_res) }) = pq_bwd.pop() {
            if !budget.consume() {
                return QueryResult::not_found(BUDGET_EXHAUSTED);
            }

            if let Some(&fd) = dist_fwd.get(&u) {
                min_arrival_fwd = min_arrival_fwd.min(fd);
                min_arrival_bwd = min_arrival_bwd.min(dist_bwd[&u]);
                if fd + d < best {
                    best = fd + d;
                    meeting = u;
                    found = true;
                }
            }

            let stale = dist_bwd.get(&u).is_some_and(|&cur| d > cur);
            if !stale && d < best {
                let check = u_res >= high.res;
                if u_res == high.res || !check {
                    min_arrival_bwd = min_arrival_bwd.min(dist_bwd[&u]);
                }

                for sc in graph.bwd_shortcuts(u) {
                    let allowed = match sc.inside() {
                        Inside::Descend => check,
                        Inside::Lateral => u_res <= high.res,
                        Inside::Boundary => !check,
                        Inside::Climb => false,
                    };
                    if !allowed {
                        continue;
                    }
                    let nd = d + sc.cost as f64;
                    let from = sc.from;
                    if dist_bwd.get(&from).is_none_or(|&cur| nd < cur) {
                        dist_bwd.insert(from, nd);
                        parent_bwd.insert(from, u);
                        pq_bwd.push(HeapEntry {
                            dist: nd,
                            item: (from, sc.cell_res()),
                        });
                    }
                }
            }
        }

        // Neither side can beat the incumbent even through the other side's
        // cheapest boundary arrival: stop.
        if best.is_finite() {
            let top_fwd = pq_fwd.peek().map(|e| e.dist);
            let top_bwd = pq_bwd.peek().map(|e| e.dist);
            let bound_fwd = top_fwd.map_or(min_arrival_fwd, |t| t.min(min_arrival_fwd));
            let bound_bwd = top_bwd.map_or(min_arrival_bwd, |t| t.min(min_arrival_bwd));
            let fwd_good = top_fwd.is_some_and(|t| t + bound_bwd < best);
            let bwd_good = top_bwd.is_some_and(|t| t + bound_fwd < best);
            if !fwd_good && !bwd_good {
                break;
            }
        }
    }

    if !found {
        return QueryResult::not_found("No path found");
    }

    let path = stitch_path(&parent_fwd, &parent_bwd, meeting);
    QueryResult::found(best, path)
}
