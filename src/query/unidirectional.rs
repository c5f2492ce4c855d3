//! Unidirectional pruned search. A small state machine rides along with each
//! frontier vertex: above the high resolution only climbs are allowed until
//! the first descend; at or below it, lateral and boundary moves are rationed
//! to two and the first descend locks the search into descending.
//!
//! The state is packed into one word: `(edge << 4) | (counter << 1) |
//! used_minus1`, so the distance map can key on it directly.

use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;

use super::{check_endpoints, HeapEntry, PopBudget, QueryResult, BUDGET_EXHAUSTED};
use crate::graph::{Inside, ShortcutGraph};

/// Lateral/boundary moves allowed at or below the high resolution.
const MAX_LATERAL_USES: u32 = 2;

#[inline]
fn pack(edge: u32, counter: u32, used_minus1: bool) -> u64 {
    ((edge as u64) << 4) | ((counter as u64) << 1) | used_minus1 as u64
}

#[inline]
fn unpack(state: u64) -> (u32, u32, bool) {
    ((state >> 4) as u32, ((state >> 1) & 0b11) as u32, state & 1 != 0)
}

pub fn query_unidirectional(
    graph: &ShortcutGraph,
    source_edge: u32,
    target_edge: u32,
) -> QueryResult {
    if let Some(early) = check_endpoints(graph, source_edge, target_edge) {
        return early;
    }

    let high = graph.high_cell(source_edge, target_edge);

    let mut pq: BinaryHeap<HeapEntry<u64>> = BinaryHeap::new();
    let mut dist: FxHashMap<u64, f64> = FxHashMap::default();
    let mut parent: FxHashMap<u64, u64> = FxHashMap::default();

    let start_state = pack(source_edge, 0, false);
    dist.insert(start_state, 0.0);
    parent.insert(start_state, start_state);
    pq.push(HeapEntry {
        dist: 0.0,
        item: start_state,
    });

    let mut budget = PopBudget::new(graph);
    let mut end_state = None;
    let mut best_dist = 0.0;

    while let Some(HeapEntry { dist: d, item: state }) = pq.pop() {
        if dist.get(&state).is_some_and(|&cur| d > cur) {
            continue;
        }
        if !budget.consume() {
            return QueryResult::not_found(BUDGET_EXHAUSTED);
        }

        let (u, counter, used_minus1) = unpack(state);
        if u == target_edge {
            best_dist = d;
            end_state = Some(state);
            break;
        }

        let u_res = graph.edge_res(u);

        for sc in graph.fwd_shortcuts(u) {
            let mut next_counter = counter;
            let mut next_used = used_minus1;

            let allowed = if u_res > high.res {
                // Above the peak: climb until the first descend, descend
                // afterwards.
                match sc.inside() {
                    Inside::Climb => !used_minus1,
                    Inside::Descend => used_minus1,
                    _ => false,
                }
            } else if used_minus1 {
                sc.inside() == Inside::Descend
            } else {
                match sc.inside() {
                    Inside::Lateral | Inside::Boundary if counter < MAX_LATERAL_USES => {
                        next_counter += 1;
                        next_used = true;
                        true
                    }
                    Inside::Descend => {
                        next_used = true;
                        true
                    }
                    _ => false,
                }
            };
            if !allowed {
                continue;
            }

            let nd = d + sc.cost as f64;
            let next_state = pack(sc.to, next_counter, next_used);
            if dist.get(&next_state).is_none_or(|&cur| nd < cur) {
                dist.insert(next_state, nd);
                parent.insert(next_state, state);
                pq.push(HeapEntry {
                    dist: nd,
                    item: next_state,
                });
            }
        }
    }

    let Some(end) = end_state else {
        return QueryResult::not_found("No path found");
    };

    let mut path = Vec::new();
    let mut curr = end;
    loop {
        path.push(unpack(curr).0);
        match parent.get(&curr) {
            Some(&prev) if prev != curr => curr = prev,
            _ => break,
        }
    }
    path.reverse();

    QueryResult::found(best_dist, path)
}
