//! Path expansion - unrolls shortcut edges into base-edge sequences by
//! following `via_edge` links.

use rustc_hash::FxHashSet;

use crate::graph::ShortcutGraph;

/// Recursion cap guarding against malformed shortcut graphs.
const MAX_EXPAND_DEPTH: u32 = 50;

/// Expand a shortcut path into the underlying base-edge path. Consecutive
/// pairs are expanded independently; the shared junction edge is emitted
/// once.
pub fn expand_path(graph: &ShortcutGraph, shortcut_path: &[u32]) -> Vec<u32> {
    if shortcut_path.len() <= 1 {
        return shortcut_path.to_vec();
    }

    let mut expanded = Vec::new();
    for (i, pair) in shortcut_path.windows(2).enumerate() {
        let mut visited = FxHashSet::default();
        let segment = expand_pair(graph, pair[0], pair[1], &mut visited, 0);
        if i == 0 {
            expanded.extend(segment);
        } else {
            expanded.extend(segment.into_iter().skip(1));
        }
    }
    expanded
}

/// Expand one pair (u, v) to [u, ..., v]. A pair is a base edge when no
/// shortcut connects it, its via edge is degenerate, or it reappears on the
/// current recursion stack.
fn expand_pair(
    graph: &ShortcutGraph,
    u: u32,
    v: u32,
    visited: &mut FxHashSet<u64>,
    depth: u32,
) -> Vec<u32> {
    let key = ((u as u64) << 32) | v as u64;
    if depth > MAX_EXPAND_DEPTH || !visited.insert(key) {
        return vec![u, v];
    }

    let via = match graph.find_shortcut(u, v) {
        Some(sc) => sc.via_edge(),
        None => return vec![u, v],
    };
    if via == 0 || via == u || via == v {
        return vec![u, v];
    }

    let mut left = expand_pair(graph, u, via, visited, depth + 1);
    let right = expand_pair(graph, via, v, visited, depth + 1);
    left.pop();
    left.extend(right);
    left
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Inside;
    use crate::load::{build_graph, EdgeRecord, MemorySource, ShortcutRecord};

    fn sc(from: u32, to: u32, via: u32) -> ShortcutRecord {
        ShortcutRecord {
            from_edge: from,
            to_edge: to,
            cost: 1.0,
            via_edge: via,
            cell: 0,
            inside: Inside::Climb,
        }
    }

    fn edge(id: u32) -> EdgeRecord {
        EdgeRecord {
            id,
            from_cell: 0,
            to_cell: 0,
            lca_res: -1,
            length: 1.0,
            cost: 1.0,
            geometry: Vec::new(),
        }
    }

    fn graph_of(shortcuts: Vec<ShortcutRecord>, max_edge: u32) -> ShortcutGraph {
        let edges = (1..=max_edge).map(edge).collect();
        build_graph(&mut MemorySource::new(shortcuts, edges)).unwrap()
    }

    #[test]
    fn test_expand_single_level() {
        // (1,3) via 2, with base shortcuts (1,2) and (2,3)
        let graph = graph_of(vec![sc(1, 3, 2), sc(1, 2, 0), sc(2, 3, 0)], 3);
        assert_eq!(expand_path(&graph, &[1, 3]), vec![1, 2, 3]);
    }

    #[test]
    fn test_expand_nested() {
        // (1,5) via 3; (1,3) via 2; (3,5) via 4; all lower pairs base
        let graph = graph_of(
            vec![
                sc(1, 5, 3),
                sc(1, 3, 2),
                sc(3, 5, 4),
                sc(1, 2, 0),
                sc(2, 3, 0),
                sc(3, 4, 0),
                sc(4, 5, 0),
            ],
            5,
        );
        assert_eq!(expand_path(&graph, &[1, 5]), vec![1, 2, 3, 4, 5]);
        // Soundness: expand([u,v]) == expand([u,w]) + tail(expand([w,v]))
        let left = expand_path(&graph, &[1, 3]);
        let right = expand_path(&graph, &[3, 5]);
        let mut stitched = left;
        stitched.extend(right.into_iter().skip(1));
        assert_eq!(expand_path(&graph, &[1, 5]), stitched);
    }

    #[test]
    fn test_expand_degenerate_via() {
        // via == from and via == to are base edges
        let graph = graph_of(vec![sc(1, 2, 1), sc(2, 3, 3)], 3);
        assert_eq!(expand_path(&graph, &[1, 2, 3]), vec![1, 2, 3]);
    }

    #[test]
    fn test_expand_multi_pair_stitching() {
        let graph = graph_of(vec![sc(1, 3, 2), sc(1, 2, 0), sc(2, 3, 0), sc(3, 4, 0)], 4);
        assert_eq!(expand_path(&graph, &[1, 3, 4]), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_expand_cycle_guard() {
        // Mutually recursive vias: (1,2) via 3 and (1,3) via 2 would recurse
        // forever without the visited set.
        let graph = graph_of(vec![sc(1, 2, 3), sc(1, 3, 2), sc(3, 2, 0), sc(2, 3, 0)], 3);
        let out = expand_path(&graph, &[1, 2]);
        assert_eq!(out.first(), Some(&1));
        assert_eq!(out.last(), Some(&2));
        assert!(out.len() <= 8);
    }

    #[test]
    fn test_expand_trivial_inputs() {
        let graph = graph_of(vec![sc(1, 2, 0)], 2);
        assert_eq!(expand_path(&graph, &[]), Vec::<u32>::new());
        assert_eq!(expand_path(&graph, &[7]), vec![7]);
        // Unknown pair passes through untouched
        assert_eq!(expand_path(&graph, &[8, 9]), vec![8, 9]);
    }
}
