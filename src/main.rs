use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use hexroute::cli::{parse_coord, Cli, Commands};
use hexroute::config::{DatasetConfig, ServerConfig};
use hexroute::dataset::{Dataset, DatasetOptions};
use hexroute::load::CsvSource;
use hexroute::route::{route_by_coords, RouteOptions};
use hexroute::server::run_server;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            host,
            port,
            shortcuts,
            edges,
            name,
            index,
        } => {
            let mut config = match config {
                Some(path) => ServerConfig::from_file(path)?,
                None => ServerConfig::default(),
            };
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(index) = index {
                config.index_type = index;
            }
            if let (Some(shortcuts), Some(edges)) = (shortcuts, edges) {
                config.datasets.push(DatasetConfig {
                    name,
                    shortcuts_path: shortcuts,
                    edges_path: edges,
                });
            }
            run_server(config).await
        }

        Commands::Route {
            shortcuts,
            edges,
            from,
            to,
            algorithm,
            mode,
            index,
            no_expand,
        } => {
            let start = parse_coord(&from)?;
            let end = parse_coord(&to)?;

            let options = DatasetOptions {
                index_kind: index,
                ..DatasetOptions::default()
            };
            let mut source = CsvSource::new(&shortcuts, &edges);
            let dataset = Dataset::load("cli", &mut source, &options)?;

            let route_options = RouteOptions {
                mode,
                algorithm,
                expand: !no_expand,
                ..RouteOptions::default()
            };
            match route_by_coords(&dataset, start, end, &route_options) {
                Ok(success) => {
                    println!("{}", serde_json::to_string_pretty(&success)?);
                    Ok(())
                }
                Err(e) => {
                    anyhow::bail!("routing failed: {e}");
                }
            }
        }

        Commands::Nearest {
            shortcuts,
            edges,
            at,
            k,
            radius,
            index,
        } => {
            let (lat, lng) = parse_coord(&at)?;

            let options = DatasetOptions {
                index_kind: index,
                ..DatasetOptions::default()
            };
            let mut source = CsvSource::new(&shortcuts, &edges);
            let dataset = Dataset::load("cli", &mut source, &options)?;

            for (edge_id, distance) in dataset.nearest_edges(lat, lng, k, radius) {
                println!("{edge_id}\t{distance:.1}m");
            }
            Ok(())
        }
    }
}
