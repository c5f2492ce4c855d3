//! Server configuration - JSON file deserialized with serde, CLI flags
//! override individual fields.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::dataset::DatasetOptions;
use crate::spatial::{SpatialIndexKind, DEFAULT_INDEX_RESOLUTION};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub index_type: SpatialIndexKind,
    pub index_resolution: i8,
    /// Priority-queue pop budget per query; absent = unbounded.
    pub pop_budget: Option<u64>,
    /// Datasets loaded at startup.
    pub datasets: Vec<DatasetConfig>,
}

impl Default for ServerConfig {
    fn default() -> ServerConfig {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            index_type: SpatialIndexKind::CellBucket,
            index_resolution: DEFAULT_INDEX_RESOLUTION,
            pop_budget: None,
            datasets: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    pub name: String,
    pub shortcuts_path: PathBuf,
    pub edges_path: PathBuf,
}

impl ServerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<ServerConfig> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn dataset_options(&self) -> DatasetOptions {
        DatasetOptions {
            index_kind: self.index_type,
            index_resolution: self.index_resolution,
            pop_budget: self.pop_budget,
        }
    }
}
