//! CLI commands for hexroute

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::route::{Algorithm, QueryMode};
use crate::spatial::SpatialIndexKind;

#[derive(Parser)]
#[command(name = "hexroute")]
#[command(about = "Hierarchical shortest-path engine over H3 shortcut graphs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// JSON config file (host, port, index, datasets)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Bind host (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Shortcuts CSV for an initial dataset
        #[arg(long)]
        shortcuts: Option<PathBuf>,

        /// Edges CSV for an initial dataset
        #[arg(long)]
        edges: Option<PathBuf>,

        /// Name of the initial dataset
        #[arg(long, default_value = "default")]
        name: String,

        /// Spatial index: h3 or rtree (overrides config)
        #[arg(long)]
        index: Option<SpatialIndexKind>,
    },

    /// Compute one route between two coordinates
    Route {
        /// Shortcuts CSV
        #[arg(long)]
        shortcuts: PathBuf,

        /// Edges CSV
        #[arg(long)]
        edges: PathBuf,

        /// Start coordinate (lat,lng)
        #[arg(long)]
        from: String,

        /// End coordinate (lat,lng)
        #[arg(long)]
        to: String,

        /// classic | pruned | bidijkstra | unidirectional | dijkstra
        #[arg(long, default_value = "classic")]
        algorithm: Algorithm,

        /// knn | one_to_one | one_to_one_v2
        #[arg(long, default_value = "knn")]
        mode: QueryMode,

        /// Spatial index: h3 or rtree
        #[arg(long, default_value = "h3")]
        index: SpatialIndexKind,

        /// Skip path expansion
        #[arg(long)]
        no_expand: bool,
    },

    /// Look up the nearest edges to a coordinate
    Nearest {
        /// Shortcuts CSV
        #[arg(long)]
        shortcuts: PathBuf,

        /// Edges CSV
        #[arg(long)]
        edges: PathBuf,

        /// Coordinate (lat,lng)
        #[arg(long)]
        at: String,

        /// Max candidates
        #[arg(short, long, default_value = "5")]
        k: usize,

        /// Search radius in meters
        #[arg(long, default_value = "500")]
        radius: f64,

        /// Spatial index: h3 or rtree
        #[arg(long, default_value = "h3")]
        index: SpatialIndexKind,
    },
}

/// Parse a "lat,lng" pair.
pub fn parse_coord(s: &str) -> anyhow::Result<(f64, f64)> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 2 {
        anyhow::bail!("Coordinate must be in format 'lat,lng'");
    }
    let lat = parts[0].trim().parse::<f64>()?;
    let lng = parts[1].trim().parse::<f64>()?;
    Ok((lat, lng))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coord() {
        assert_eq!(parse_coord("50.85, 4.35").unwrap(), (50.85, 4.35));
        assert!(parse_coord("50.85").is_err());
        assert!(parse_coord("a,b").is_err());
    }
}
