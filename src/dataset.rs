//! Datasets and the shared registry
//!
//! A dataset is one loaded graph plus its spatial index, published as an
//! `Arc` value: queries hold a cheap shared handle and never touch the
//! registry lock while running. Load replaces the published handle, unload
//! drops it; the memory returns to the allocator once the last in-flight
//! query releases its handle.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::graph::ShortcutGraph;
use crate::load::{build_graph, GraphSource, LoadError};
use crate::spatial::{SpatialIndex, SpatialIndexKind, DEFAULT_INDEX_RESOLUTION};

/// Build-time knobs applied to every dataset loaded through a registry.
#[derive(Debug, Clone, Copy)]
pub struct DatasetOptions {
    pub index_kind: SpatialIndexKind,
    pub index_resolution: i8,
    /// Priority-queue pop budget per query; None = unbounded.
    pub pop_budget: Option<u64>,
}

impl Default for DatasetOptions {
    fn default() -> DatasetOptions {
        DatasetOptions {
            index_kind: SpatialIndexKind::CellBucket,
            index_resolution: DEFAULT_INDEX_RESOLUTION,
            pop_budget: None,
        }
    }
}

/// One immutable, queryable dataset.
pub struct Dataset {
    pub name: String,
    pub graph: ShortcutGraph,
    pub index: SpatialIndex,
    pub info: HashMap<String, String>,
}

impl Dataset {
    /// Load a dataset from a source: graph first, spatial index on top.
    /// Fails without leaving partial state behind.
    pub fn load(
        name: &str,
        source: &mut dyn GraphSource,
        options: &DatasetOptions,
    ) -> Result<Dataset, LoadError> {
        let mut graph = build_graph(source)?;
        graph.set_pop_budget(options.pop_budget);
        let index = SpatialIndex::build(options.index_kind, &graph, options.index_resolution);
        let info = source.dataset_info()?;
        info!(
            name,
            shortcuts = graph.shortcut_count(),
            edges = graph.edge_count(),
            index = ?options.index_kind,
            "dataset loaded"
        );
        Ok(Dataset {
            name: name.to_string(),
            graph,
            index,
            info,
        })
    }

    /// Direct spatial lookup, exposed through the management API.
    pub fn nearest_edges(&self, lat: f64, lng: f64, k: usize, radius_m: f64) -> Vec<(u32, f64)> {
        self.index.nearest(&self.graph, lat, lng, k, radius_m)
    }
}

/// Name -> dataset map shared by all worker threads. The lock is held only
/// for map operations, never across a query.
#[derive(Default)]
pub struct DatasetRegistry {
    inner: Mutex<HashMap<String, Arc<Dataset>>>,
}

impl DatasetRegistry {
    pub fn new() -> DatasetRegistry {
        DatasetRegistry::default()
    }

    /// Load from a source and publish under `name`, replacing any previous
    /// dataset of that name.
    pub fn load(
        &self,
        name: &str,
        source: &mut dyn GraphSource,
        options: &DatasetOptions,
    ) -> Result<Arc<Dataset>, LoadError> {
        let dataset = Arc::new(Dataset::load(name, source, options)?);
        self.inner
            .lock()
            .expect("registry lock poisoned")
            .insert(name.to_string(), Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Shared handle to a dataset, if loaded.
    pub fn get(&self, name: &str) -> Option<Arc<Dataset>> {
        self.inner
            .lock()
            .expect("registry lock poisoned")
            .get(name)
            .cloned()
    }

    /// Drop a dataset and hand freed memory back to the allocator. Returns
    /// whether the name was loaded.
    pub fn unload(&self, name: &str) -> bool {
        let removed = self
            .inner
            .lock()
            .expect("registry lock poisoned")
            .remove(name)
            .is_some();
        if removed {
            info!(name, "dataset unloaded");
            release_memory();
        }
        removed
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .lock()
            .expect("registry lock poisoned")
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

/// Ask glibc to return freed pages to the OS. No-op elsewhere.
pub fn release_memory() {
    #[cfg(target_os = "linux")]
    unsafe {
        libc::malloc_trim(0);
    }
}
