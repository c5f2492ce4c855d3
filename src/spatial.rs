//! Spatial index - coordinate to candidate-edge lookup
//!
//! Two interchangeable variants behind one build-time choice: an H3
//! cell-bucket map and an R-tree over edge bounding rectangles. Both refine
//! their coarse candidate set with exact point-to-polyline distances.

use rstar::{RStarInsertionStrategy, RTree, RTreeObject, RTreeParams, AABB};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::geo::point_to_polyline_distance;
use crate::graph::ShortcutGraph;
use crate::hierarchy;

/// H3 resolution the cell-bucket variant indexes at.
pub const DEFAULT_INDEX_RESOLUTION: i8 = 9;

/// Meters per degree of latitude, used to turn a radius into a query
/// rectangle.
const METERS_PER_DEGREE: f64 = 111_000.0;

/// Build-time choice of spatial index variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpatialIndexKind {
    #[serde(alias = "h3")]
    CellBucket,
    #[serde(alias = "rtree")]
    RectTree,
}

impl std::str::FromStr for SpatialIndexKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "h3" | "cell" | "cell_bucket" => Ok(SpatialIndexKind::CellBucket),
            "rtree" | "rect" | "rect_tree" => Ok(SpatialIndexKind::RectTree),
            other => Err(format!("unknown spatial index kind '{other}'")),
        }
    }
}

/// Bounding rectangle of one edge's geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeRect {
    lower: [f64; 2],
    upper: [f64; 2],
    edge_id: u32,
}

impl RTreeObject for EdgeRect {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.lower, self.upper)
    }
}

/// R-tree parameters sized for bulk-loaded, read-only use.
pub struct IndexParams;

impl RTreeParams for IndexParams {
    const MIN_SIZE: usize = 4;
    const MAX_SIZE: usize = 16;
    const REINSERTION_COUNT: usize = 3;
    type DefaultInsertionStrategy = RStarInsertionStrategy;
}

/// The per-dataset spatial index.
pub enum SpatialIndex {
    CellBucket {
        buckets: FxHashMap<u64, Vec<u32>>,
        res: i8,
    },
    RectTree {
        tree: RTree<EdgeRect, IndexParams>,
    },
}

impl SpatialIndex {
    /// Build the selected variant from the loaded edge metadata.
    pub fn build(kind: SpatialIndexKind, graph: &ShortcutGraph, index_res: i8) -> SpatialIndex {
        match kind {
            SpatialIndexKind::CellBucket => {
                let mut buckets: FxHashMap<u64, Vec<u32>> = FxHashMap::default();
                for (edge_id, meta) in graph.edge_metas() {
                    if meta.from_cell != 0 {
                        let indexed = hierarchy::cell_to_parent(meta.from_cell, index_res);
                        if indexed != 0 {
                            buckets.entry(indexed).or_default().push(edge_id);
                        }
                    }
                    if meta.to_cell != 0 && meta.to_cell != meta.from_cell {
                        let indexed = hierarchy::cell_to_parent(meta.to_cell, index_res);
                        if indexed != 0 {
                            buckets.entry(indexed).or_default().push(edge_id);
                        }
                    }
                }
                for ids in buckets.values_mut() {
                    ids.sort_unstable();
                    ids.dedup();
                }
                info!(cells = buckets.len(), res = index_res, "cell-bucket index built");
                SpatialIndex::CellBucket {
                    buckets,
                    res: index_res,
                }
            }
            SpatialIndexKind::RectTree => {
                let mut rects = Vec::with_capacity(graph.edge_count());
                for (edge_id, meta) in graph.edge_metas() {
                    if meta.geometry.is_empty() {
                        continue;
                    }
                    let mut lower = [f64::INFINITY, f64::INFINITY];
                    let mut upper = [f64::NEG_INFINITY, f64::NEG_INFINITY];
                    for &(lon, lat) in &meta.geometry {
                        lower[0] = lower[0].min(lon);
                        lower[1] = lower[1].min(lat);
                        upper[0] = upper[0].max(lon);
                        upper[1] = upper[1].max(lat);
                    }
                    rects.push(EdgeRect {
                        lower,
                        upper,
                        edge_id,
                    });
                }
                info!(edges = rects.len(), "rectangle-tree index built");
                SpatialIndex::RectTree {
                    tree: RTree::bulk_load_with_params(rects),
                }
            }
        }
    }

    pub fn kind(&self) -> SpatialIndexKind {
        match self {
            SpatialIndex::CellBucket { .. } => SpatialIndexKind::CellBucket,
            SpatialIndex::RectTree { .. } => SpatialIndexKind::RectTree,
        }
    }

    /// Up to `k_max` edges within `radius_m` meters of (lat, lng), sorted by
    /// ascending point-to-polyline distance.
    pub fn nearest(
        &self,
        graph: &ShortcutGraph,
        lat: f64,
        lng: f64,
        k_max: usize,
        radius_m: f64,
    ) -> Vec<(u32, f64)> {
        let candidates = match self {
            SpatialIndex::CellBucket { buckets, res } => {
                cell_bucket_candidates(buckets, *res, lat, lng, k_max)
            }
            SpatialIndex::RectTree { tree } => rect_tree_candidates(tree, lat, lng, radius_m),
        };

        let mut results: Vec<(u32, f64)> = candidates
            .into_iter()
            .filter_map(|edge_id| {
                let meta = graph.edge_meta(edge_id)?;
                let dist = point_to_polyline_distance(lat, lng, &meta.geometry);
                (dist <= radius_m).then_some((edge_id, dist))
            })
            .collect();

        results.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(k_max);
        results
    }
}

/// Ring sweep around the coarsened query cell. Always covers at least two
/// rings, stops after five or once twice the requested candidate count has
/// been gathered.
fn cell_bucket_candidates(
    buckets: &FxHashMap<u64, Vec<u32>>,
    res: i8,
    lat: f64,
    lng: f64,
    k_max: usize,
) -> Vec<u32> {
    let origin = hierarchy::latlng_to_cell(lat, lng, res);
    if origin == 0 {
        return Vec::new();
    }

    let mut seen = FxHashSet::default();
    let mut candidates = Vec::new();
    for k in 0..5 {
        for cell in hierarchy::grid_ring(origin, k) {
            if let Some(ids) = buckets.get(&cell) {
                for &id in ids {
                    if seen.insert(id) {
                        candidates.push(id);
                    }
                }
            }
        }
        if k >= 1 && candidates.len() >= 2 * k_max {
            break;
        }
    }
    candidates
}

/// All edges whose bounding rectangle intersects the degree-approximate
/// query rectangle.
fn rect_tree_candidates(
    tree: &RTree<EdgeRect, IndexParams>,
    lat: f64,
    lng: f64,
    radius_m: f64,
) -> Vec<u32> {
    let deg_radius = radius_m / METERS_PER_DEGREE;
    let envelope = AABB::from_corners(
        [lng - deg_radius, lat - deg_radius],
        [lng + deg_radius, lat + deg_radius],
    );
    tree.locate_in_envelope_intersecting(&envelope)
        .map(|r| r.edge_id)
        .collect()
}
