//! Shared builders for the integration tests.

use hexroute::{build_graph, EdgeRecord, Inside, MemorySource, ShortcutGraph, ShortcutRecord};

pub fn sc(from: u32, to: u32, cost: f64, via: u32, inside: i8) -> ShortcutRecord {
    ShortcutRecord {
        from_edge: from,
        to_edge: to,
        cost,
        via_edge: via,
        cell: 0,
        inside: Inside::from_i8(inside).expect("valid inside flag"),
    }
}

pub fn edge(id: u32, cost: f64) -> EdgeRecord {
    EdgeRecord {
        id,
        from_cell: 0,
        to_cell: 0,
        lca_res: -1,
        length: 1.0,
        cost,
        geometry: Vec::new(),
    }
}

pub fn edge_with_res(id: u32, cost: f64, lca_res: i8) -> EdgeRecord {
    EdgeRecord {
        lca_res,
        ..edge(id, cost)
    }
}

pub fn graph(shortcuts: Vec<ShortcutRecord>, edges: Vec<EdgeRecord>) -> ShortcutGraph {
    build_graph(&mut MemorySource::new(shortcuts, edges)).expect("test graph builds")
}
