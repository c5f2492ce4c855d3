//! Query facade - coordinates in, route out
//!
//! Maps the query points to candidate edges, dispatches the selected
//! algorithm, expands the shortcut path, assembles and trims the geometry,
//! and reports per-stage timings.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::Dataset;
use crate::expand::expand_path;
use crate::geo::trim_polyline;
use crate::graph::ShortcutGraph;
use crate::hierarchy;
use crate::query::{
    query_bidijkstra, query_classic, query_classic_penalized, query_dijkstra, query_multi,
    query_pruned, query_unidirectional, QueryResult,
};

pub const DEFAULT_MAX_CANDIDATES: usize = 5;
pub const DEFAULT_SEARCH_RADIUS_M: f64 = 500.0;
pub const DEFAULT_PENALTY_FACTOR: f64 = 2.0;

/// Shortest-path algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    #[default]
    Classic,
    Pruned,
    #[serde(alias = "bidijkstra")]
    BiDijkstra,
    Unidirectional,
    Dijkstra,
}

impl std::str::FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "classic" => Ok(Algorithm::Classic),
            "pruned" => Ok(Algorithm::Pruned),
            "bidijkstra" | "bi_dijkstra" => Ok(Algorithm::BiDijkstra),
            "unidirectional" | "uni_lca" => Ok(Algorithm::Unidirectional),
            "dijkstra" => Ok(Algorithm::Dijkstra),
            other => Err(format!("unknown algorithm '{other}'")),
        }
    }
}

/// Candidate handling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// All candidates seed a multi-source/multi-target search.
    #[default]
    Knn,
    /// First candidate on each side, algorithm as selected.
    OneToOne,
    /// First candidate on each side, pruned search forced.
    OneToOneV2,
}

impl std::str::FromStr for QueryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "knn" => Ok(QueryMode::Knn),
            "one_to_one" => Ok(QueryMode::OneToOne),
            "one_to_one_v2" => Ok(QueryMode::OneToOneV2),
            other => Err(format!("unknown mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouteOptions {
    pub mode: QueryMode,
    pub algorithm: Algorithm,
    pub max_candidates: usize,
    pub radius_m: f64,
    pub expand: bool,
    /// Also compute an alternative route penalizing the shortest path.
    pub alternative: bool,
    pub penalty_factor: f64,
}

impl Default for RouteOptions {
    fn default() -> RouteOptions {
        RouteOptions {
            mode: QueryMode::default(),
            algorithm: Algorithm::default(),
            max_candidates: DEFAULT_MAX_CANDIDATES,
            radius_m: DEFAULT_SEARCH_RADIUS_M,
            expand: true,
            alternative: false,
            penalty_factor: DEFAULT_PENALTY_FACTOR,
        }
    }
}

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("No edges found near {0}")]
    NoCandidates(&'static str),

    #[error("{0}")]
    NoPath(String),
}

/// Wall-clock stage breakdown, microseconds per stage.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StageTimings {
    pub find_nearest_us: f64,
    pub search_us: f64,
    pub expand_us: f64,
    pub geojson_us: f64,
    pub total_ms: f64,
}

/// H3 cell with its closed boundary, for map overlays.
#[derive(Debug, Clone, Serialize)]
pub struct CellInfo {
    pub id: u64,
    pub res: i8,
    /// Closed polygon, (lat, lon) degrees.
    pub boundary: Vec<(f64, f64)>,
}

impl CellInfo {
    fn of(cell: u64) -> Option<CellInfo> {
        if cell == 0 {
            return None;
        }
        Some(CellInfo {
            id: cell,
            res: hierarchy::resolution(cell),
            boundary: hierarchy::cell_boundary(cell),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CellDebug {
    pub source: Option<CellInfo>,
    pub target: Option<CellInfo>,
    pub high: Option<CellInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlternativeRoute {
    pub distance: f64,
    pub shortcut_path: Vec<u32>,
    pub path: Vec<u32>,
}

/// A successful routing answer.
#[derive(Debug, Clone, Serialize)]
pub struct RouteSuccess {
    /// Total cost in the graph's metric.
    pub distance: f64,
    /// Sum of edge lengths over the expanded path, meters.
    pub distance_meters: f64,
    pub shortcut_path: Vec<u32>,
    /// Expanded base-edge path; None when expansion was not requested.
    pub path: Option<Vec<u32>>,
    /// Trimmed route polyline, (lon, lat) degrees; None without expansion.
    pub geometry: Option<Vec<(f64, f64)>>,
    pub alternative: Option<AlternativeRoute>,
    pub timings: StageTimings,
    pub cells: CellDebug,
}

/// Run one algorithm between two explicit edge ids.
pub fn route_by_edges(
    graph: &ShortcutGraph,
    source_edge: u32,
    target_edge: u32,
    algorithm: Algorithm,
) -> QueryResult {
    match algorithm {
        Algorithm::Classic => query_classic(graph, source_edge, target_edge),
        Algorithm::Pruned => query_pruned(graph, source_edge, target_edge),
        Algorithm::BiDijkstra => query_bidijkstra(graph, source_edge, target_edge),
        Algorithm::Unidirectional => query_unidirectional(graph, source_edge, target_edge),
        Algorithm::Dijkstra => query_dijkstra(graph, source_edge, target_edge),
    }
}

/// Full coordinate-to-route pipeline.
pub fn route_by_coords(
    dataset: &Dataset,
    start: (f64, f64),
    end: (f64, f64),
    options: &RouteOptions,
) -> Result<RouteSuccess, RouteError> {
    let t_total = Instant::now();
    let graph = &dataset.graph;

    let t_nearest = Instant::now();
    let start_edges =
        dataset.nearest_edges(start.0, start.1, options.max_candidates, options.radius_m);
    let end_edges = dataset.nearest_edges(end.0, end.1, options.max_candidates, options.radius_m);
    let find_nearest_us = t_nearest.elapsed().as_secs_f64() * 1e6;

    if start_edges.is_empty() {
        return Err(RouteError::NoCandidates("start"));
    }
    if end_edges.is_empty() {
        return Err(RouteError::NoCandidates("end"));
    }

    let t_search = Instant::now();
    let result = match options.mode {
        QueryMode::OneToOne | QueryMode::OneToOneV2 => {
            let source = start_edges[0].0;
            let target = end_edges[0].0;
            let algorithm = if options.mode == QueryMode::OneToOneV2 {
                Algorithm::Pruned
            } else {
                options.algorithm
            };
            route_by_edges(graph, source, target, algorithm)
        }
        QueryMode::Knn => {
            let sources: Vec<u32> = start_edges.iter().map(|&(id, _)| id).collect();
            let targets: Vec<u32> = end_edges.iter().map(|&(id, _)| id).collect();
            query_multi(graph, &sources, &targets)
        }
    };
    let search_us = t_search.elapsed().as_secs_f64() * 1e6;

    if !result.reachable {
        return Err(RouteError::NoPath(result.error));
    }

    let mut expand_us = 0.0;
    let mut geojson_us = 0.0;
    let mut distance_meters = 0.0;
    let mut expanded = None;
    let mut geometry = None;

    if options.expand {
        let t_expand = Instant::now();
        let base_path = expand_path(graph, &result.path);
        expand_us = t_expand.elapsed().as_secs_f64() * 1e6;

        let t_geojson = Instant::now();
        let coords = assemble_geometry(graph, &base_path);
        let trimmed = trim_polyline(&coords, start.0, start.1, end.0, end.1);
        geojson_us = t_geojson.elapsed().as_secs_f64() * 1e6;

        distance_meters = base_path
            .iter()
            .filter_map(|&e| graph.edge_meta(e))
            .map(|m| m.length)
            .sum();
        expanded = Some(base_path);
        geometry = Some(trimmed);
    }

    let alternative = if options.alternative {
        compute_alternative(graph, &result, expanded.as_deref(), options.penalty_factor)
    } else {
        None
    };

    let source_edge = *result.path.first().unwrap_or(&start_edges[0].0);
    let target_edge = *result.path.last().unwrap_or(&end_edges[0].0);
    let cells = CellDebug {
        source: CellInfo::of(resolve_display_cell(graph, source_edge)),
        target: CellInfo::of(resolve_display_cell(graph, target_edge)),
        high: CellInfo::of(graph.high_cell(source_edge, target_edge).cell),
    };

    Ok(RouteSuccess {
        distance: result.distance,
        distance_meters,
        shortcut_path: result.path,
        path: expanded,
        geometry,
        alternative,
        timings: StageTimings {
            find_nearest_us,
            search_us,
            expand_us,
            geojson_us,
            total_ms: t_total.elapsed().as_secs_f64() * 1e3,
        },
        cells,
    })
}

/// Concatenate edge polylines along the expanded path, dropping duplicate
/// consecutive vertices.
fn assemble_geometry(graph: &ShortcutGraph, path: &[u32]) -> Vec<(f64, f64)> {
    let mut coords: Vec<(f64, f64)> = Vec::new();
    for &edge_id in path {
        if let Some(meta) = graph.edge_meta(edge_id) {
            for &p in &meta.geometry {
                if coords.last() != Some(&p) {
                    coords.push(p);
                }
            }
        }
    }
    coords
}

/// Penalize the shortest path and search again; the detour is reported with
/// its true, unpenalized cost.
fn compute_alternative(
    graph: &ShortcutGraph,
    shortest: &QueryResult,
    expanded: Option<&[u32]>,
    penalty_factor: f64,
) -> Option<AlternativeRoute> {
    let source = *shortest.path.first()?;
    let target = *shortest.path.last()?;
    let penalized: Vec<u32> = match expanded {
        Some(p) => p.to_vec(),
        None => shortest.path.clone(),
    };
    let alt = query_classic_penalized(graph, source, target, &penalized, penalty_factor);
    if !alt.reachable {
        return None;
    }
    let path = expand_path(graph, &alt.path);
    Some(AlternativeRoute {
        distance: alt.distance,
        shortcut_path: alt.path,
        path,
    })
}

/// Cell shown for an endpoint in debug output: endpoint cell coarsened to
/// the edge's hierarchy resolution (8 when unknown).
fn resolve_display_cell(graph: &ShortcutGraph, edge_id: u32) -> u64 {
    let Some(meta) = graph.edge_meta(edge_id) else {
        return 0;
    };
    let cell = if meta.to_cell != 0 {
        meta.to_cell
    } else {
        meta.from_cell
    };
    if cell == 0 {
        return 0;
    }
    let res = if meta.lca_res == -1 { 8 } else { meta.lca_res };
    if hierarchy::resolution(cell) > res {
        hierarchy::cell_to_parent(cell, res)
    } else {
        cell
    }
}
