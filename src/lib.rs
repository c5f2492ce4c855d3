//! Hexroute: hierarchical shortest-path engine over H3 shortcut graphs
//!
//! The routing graph is a set of *shortcuts* between base road edges,
//! produced by an offline builder and annotated with H3 cells. Each shortcut
//! carries a direction flag (climb / lateral / descend / edge-of-hierarchy)
//! that the pruned query variants use to restrict the search to legal
//! climb-then-descend sequences between the endpoint cells.
//!
//! Pipeline for one query:
//! - Spatial index: coordinates -> candidate edges
//! - Query engine: one of five Dijkstra variants over the CSR store
//! - Path expander: shortcut sequence -> base-edge sequence via `via_edge`
//! - Facade: geometry assembly, endpoint trimming, stage timings
//!
//! Datasets are immutable after load and shared by reference count; the
//! registry supports load/replace/unload at runtime.

pub mod cli;
pub mod config;
pub mod dataset;
pub mod expand;
pub mod geo;
pub mod graph;
pub mod hierarchy;
pub mod load;
pub mod query;
pub mod route;
pub mod server;
pub mod spatial;

pub use dataset::{Dataset, DatasetOptions, DatasetRegistry};
pub use expand::expand_path;
pub use graph::{EdgeMeta, HighCell, Inside, Shortcut, ShortcutGraph};
pub use load::{build_graph, CsvSource, EdgeRecord, GraphSource, LoadError, MemorySource, ShortcutRecord};
pub use query::{
    query_bidijkstra, query_classic, query_classic_penalized, query_dijkstra, query_multi,
    query_pruned, query_unidirectional, QueryResult,
};
pub use route::{route_by_coords, route_by_edges, Algorithm, QueryMode, RouteOptions};
pub use spatial::{SpatialIndex, SpatialIndexKind};
