//! HTTP API - axum handlers over the dataset registry, with OpenAPI docs.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::ServerConfig;
use crate::dataset::{DatasetOptions, DatasetRegistry};
use crate::load::CsvSource;
use crate::route::{
    route_by_coords, route_by_edges, Algorithm, CellInfo, QueryMode, RouteError, RouteOptions,
    RouteSuccess, DEFAULT_MAX_CANDIDATES, DEFAULT_PENALTY_FACTOR, DEFAULT_SEARCH_RADIUS_M,
};

pub struct AppState {
    pub registry: DatasetRegistry,
    pub options: DatasetOptions,
}

#[derive(OpenApi)]
#[openapi(
    paths(route_get, route_post, route_by_edge, nearest_edges, load_dataset, unload_dataset, health),
    components(schemas(
        RouteParams,
        RouteResponse,
        RouteByEdgeRequest,
        NearestParams,
        NearestResponse,
        NearestEdge,
        LoadRequest,
        LoadResponse,
        UnloadRequest,
        UnloadResponse,
        HealthResponse,
        ErrorResponse
    )),
    info(
        title = "Hexroute API",
        version = "1.0.0",
        description = "Hierarchical shortest-path queries over H3-annotated shortcut graphs"
    )
)]
struct ApiDoc;

/// Build the axum router over a shared registry.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/route", get(route_get).post(route_post))
        .route("/route_by_edge", post(route_by_edge))
        .route("/nearest_edges", get(nearest_edges))
        .route("/load_dataset", post(load_dataset))
        .route("/unload_dataset", post(unload_dataset))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Load configured datasets and serve until shutdown.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let state = Arc::new(AppState {
        registry: DatasetRegistry::new(),
        options: config.dataset_options(),
    });

    for ds in &config.datasets {
        let mut source = CsvSource::new(&ds.shortcuts_path, &ds.edges_path);
        match state.registry.load(&ds.name, &mut source, &state.options) {
            Ok(_) => info!(name = %ds.name, "startup dataset loaded"),
            Err(e) => error!(name = %ds.name, error = %e, "startup dataset failed to load"),
        }
    }

    let app = build_router(Arc::clone(&state));
    let addr = format!("{}:{}", config.host, config.port);
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            success: false,
            error: error.into(),
        }),
    )
}

// ============ Route ============

fn default_dataset() -> String {
    "default".to_string()
}
fn default_max_candidates() -> usize {
    DEFAULT_MAX_CANDIDATES
}
fn default_radius() -> f64 {
    DEFAULT_SEARCH_RADIUS_M
}
fn default_true() -> bool {
    true
}
fn default_penalty() -> f64 {
    DEFAULT_PENALTY_FACTOR
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RouteParams {
    #[serde(default = "default_dataset")]
    dataset: String,
    /// Start latitude, degrees
    #[serde(alias = "source_lat")]
    start_lat: f64,
    /// Start longitude, degrees
    #[serde(alias = "source_lon")]
    start_lng: f64,
    /// End latitude, degrees
    #[serde(alias = "target_lat")]
    end_lat: f64,
    /// End longitude, degrees
    #[serde(alias = "target_lon")]
    end_lng: f64,
    /// knn | one_to_one | one_to_one_v2
    #[serde(default, alias = "search_mode")]
    #[schema(value_type = String)]
    mode: QueryMode,
    /// classic | pruned | bidijkstra | unidirectional | dijkstra
    #[serde(default)]
    #[schema(value_type = String)]
    algorithm: Algorithm,
    #[serde(default = "default_max_candidates", alias = "num_candidates")]
    max_candidates: usize,
    #[serde(default = "default_radius", alias = "search_radius")]
    search_radius_m: f64,
    /// Expand the shortcut path to base edges
    #[serde(default = "default_true")]
    expand: bool,
    /// Also compute a penalized alternative route
    #[serde(default)]
    alternative: bool,
    #[serde(default = "default_penalty")]
    penalty_factor: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RouteResponse {
    pub success: bool,
    pub dataset: String,
    /// Total cost in the graph metric
    pub distance: f64,
    /// Geodesic length of the expanded path, meters
    pub distance_meters: f64,
    pub shortcut_path: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<u32>>,
    /// GeoJSON LineString Feature, trimmed to the query points
    #[schema(value_type = Object)]
    pub geojson: Option<Value>,
    pub runtime_ms: f64,
    #[schema(value_type = Object)]
    pub timing_breakdown: Value,
    #[schema(value_type = Object)]
    pub debug: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub alternative_route: Option<Value>,
}

#[utoipa::path(
    get,
    path = "/route",
    params(
        ("dataset" = Option<String>, Query, description = "Dataset name"),
        ("start_lat" = f64, Query, description = "Start latitude"),
        ("start_lng" = f64, Query, description = "Start longitude"),
        ("end_lat" = f64, Query, description = "End latitude"),
        ("end_lng" = f64, Query, description = "End longitude")
    ),
    responses(
        (status = 200, description = "Route result", body = RouteResponse),
        (status = 400, description = "Malformed request or no candidates", body = ErrorResponse),
        (status = 503, description = "Dataset not loaded", body = ErrorResponse)
    ),
    tag = "routing"
)]
async fn route_get(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RouteParams>,
) -> Result<Json<RouteResponse>, (StatusCode, Json<ErrorResponse>)> {
    handle_route(state, params)
}

#[utoipa::path(
    post,
    path = "/route",
    request_body = RouteParams,
    responses(
        (status = 200, description = "Route result", body = RouteResponse),
        (status = 400, description = "Malformed request or no candidates", body = ErrorResponse),
        (status = 503, description = "Dataset not loaded", body = ErrorResponse)
    ),
    tag = "routing"
)]
async fn route_post(
    State(state): State<Arc<AppState>>,
    Json(params): Json<RouteParams>,
) -> Result<Json<RouteResponse>, (StatusCode, Json<ErrorResponse>)> {
    handle_route(state, params)
}

fn handle_route(
    state: Arc<AppState>,
    params: RouteParams,
) -> Result<Json<RouteResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Some(dataset) = state.registry.get(&params.dataset) else {
        return Err(error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            format!("Dataset '{}' not loaded", params.dataset),
        ));
    };

    let options = RouteOptions {
        mode: params.mode,
        algorithm: params.algorithm,
        max_candidates: params.max_candidates,
        radius_m: params.search_radius_m,
        expand: params.expand,
        alternative: params.alternative,
        penalty_factor: params.penalty_factor,
    };

    let outcome = route_by_coords(
        &dataset,
        (params.start_lat, params.start_lng),
        (params.end_lat, params.end_lng),
        &options,
    );

    match outcome {
        Ok(success) => Ok(Json(route_response(&params.dataset, success))),
        Err(RouteError::NoCandidates(side)) => Err(error_response(
            StatusCode::BAD_REQUEST,
            format!("No edges found near {side}"),
        )),
        // Exhaustion without a meeting is a well-formed negative answer
        Err(RouteError::NoPath(msg)) => Err(error_response(StatusCode::OK, msg)),
    }
}

fn route_response(dataset: &str, success: RouteSuccess) -> RouteResponse {
    let geojson = success.geometry.as_ref().map(|coords| {
        json!({
            "type": "Feature",
            "geometry": {
                "type": "LineString",
                "coordinates": coords,
            },
            "properties": {
                "edge_count": success.path.as_ref().map_or(0, |p| p.len()),
            }
        })
    });

    let debug = json!({
        "cells": {
            "source": cell_json(&success.cells.source),
            "target": cell_json(&success.cells.target),
            "high": cell_json(&success.cells.high),
        }
    });

    RouteResponse {
        success: true,
        dataset: dataset.to_string(),
        distance: success.distance,
        distance_meters: success.distance_meters,
        shortcut_path: success.shortcut_path,
        path: success.path,
        geojson,
        runtime_ms: success.timings.total_ms,
        timing_breakdown: serde_json::to_value(success.timings).unwrap_or(Value::Null),
        debug,
        alternative_route: success
            .alternative
            .map(|alt| serde_json::to_value(alt).unwrap_or(Value::Null)),
    }
}

/// Cell debug entry with the boundary in GeoJSON [lon, lat] order.
fn cell_json(cell: &Option<CellInfo>) -> Value {
    match cell {
        None => Value::Null,
        Some(info) => json!({
            "id": info.id,
            "res": info.res,
            "boundary": info
                .boundary
                .iter()
                .map(|&(lat, lon)| json!([lon, lat]))
                .collect::<Vec<_>>(),
        }),
    }
}

// ============ Route by edge ids ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct RouteByEdgeRequest {
    #[serde(default = "default_dataset")]
    dataset: String,
    source_edge: u32,
    target_edge: u32,
    #[serde(default)]
    #[schema(value_type = String)]
    algorithm: Algorithm,
}

#[utoipa::path(
    post,
    path = "/route_by_edge",
    request_body = RouteByEdgeRequest,
    responses(
        (status = 200, description = "Route between explicit edge ids"),
        (status = 503, description = "Dataset not loaded", body = ErrorResponse)
    ),
    tag = "routing"
)]
async fn route_by_edge(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RouteByEdgeRequest>,
) -> Result<Json<Value>, (StatusCode, Json<ErrorResponse>)> {
    let Some(dataset) = state.registry.get(&req.dataset) else {
        return Err(error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            format!("Dataset '{}' not loaded", req.dataset),
        ));
    };

    let start = std::time::Instant::now();
    let result = route_by_edges(&dataset.graph, req.source_edge, req.target_edge, req.algorithm);
    let runtime_ms = start.elapsed().as_secs_f64() * 1e3;

    if result.reachable {
        Ok(Json(json!({
            "success": true,
            "dataset": req.dataset,
            "distance": result.distance,
            "shortcut_path": result.path,
            "runtime_ms": runtime_ms,
        })))
    } else {
        Ok(Json(json!({
            "success": false,
            "error": result.error,
            "runtime_ms": runtime_ms,
        })))
    }
}

// ============ Nearest edges ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct NearestParams {
    #[serde(default = "default_dataset")]
    dataset: String,
    lat: f64,
    #[serde(alias = "lng")]
    lon: f64,
    #[serde(default = "default_max_candidates")]
    k: usize,
    #[serde(default = "default_radius")]
    radius_m: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NearestEdge {
    pub edge_id: u32,
    /// Point-to-polyline distance, meters
    pub distance: f64,
    pub cost: f64,
    pub length: f64,
    pub from_cell: u64,
    pub to_cell: u64,
    pub lca_res: i8,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NearestResponse {
    pub dataset: String,
    pub lat: f64,
    pub lon: f64,
    pub k: usize,
    pub edges: Vec<NearestEdge>,
}

#[utoipa::path(
    get,
    path = "/nearest_edges",
    params(
        ("dataset" = Option<String>, Query, description = "Dataset name"),
        ("lat" = f64, Query, description = "Latitude"),
        ("lon" = f64, Query, description = "Longitude"),
        ("k" = Option<usize>, Query, description = "Max candidates")
    ),
    responses(
        (status = 200, description = "Nearest edges", body = NearestResponse),
        (status = 404, description = "Unknown dataset", body = ErrorResponse)
    ),
    tag = "management"
)]
async fn nearest_edges(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NearestParams>,
) -> Result<Json<NearestResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Some(dataset) = state.registry.get(&params.dataset) else {
        return Err(error_response(
            StatusCode::NOT_FOUND,
            format!("Dataset '{}' not found", params.dataset),
        ));
    };

    let edges = dataset
        .nearest_edges(params.lat, params.lon, params.k, params.radius_m)
        .into_iter()
        .map(|(edge_id, distance)| {
            let meta = dataset.graph.edge_meta(edge_id);
            NearestEdge {
                edge_id,
                distance,
                cost: meta.map_or(0.0, |m| m.cost),
                length: meta.map_or(0.0, |m| m.length),
                from_cell: meta.map_or(0, |m| m.from_cell),
                to_cell: meta.map_or(0, |m| m.to_cell),
                lca_res: meta.map_or(-1, |m| m.lca_res),
            }
        })
        .collect();

    Ok(Json(NearestResponse {
        dataset: params.dataset,
        lat: params.lat,
        lon: params.lon,
        k: params.k,
        edges,
    }))
}

// ============ Dataset management ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoadRequest {
    #[serde(alias = "dataset")]
    name: String,
    shortcuts_path: String,
    edges_path: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoadResponse {
    pub success: bool,
    pub dataset: String,
    pub shortcuts: usize,
    pub edges: usize,
}

#[utoipa::path(
    post,
    path = "/load_dataset",
    request_body = LoadRequest,
    responses(
        (status = 200, description = "Dataset loaded", body = LoadResponse),
        (status = 500, description = "Load failed", body = ErrorResponse)
    ),
    tag = "management"
)]
async fn load_dataset(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoadRequest>,
) -> Result<Json<LoadResponse>, (StatusCode, Json<ErrorResponse>)> {
    let mut source = CsvSource::new(&req.shortcuts_path, &req.edges_path);
    match state.registry.load(&req.name, &mut source, &state.options) {
        Ok(dataset) => Ok(Json(LoadResponse {
            success: true,
            dataset: req.name,
            shortcuts: dataset.graph.shortcut_count(),
            edges: dataset.graph.edge_count(),
        })),
        Err(e) => {
            error!(name = %req.name, error = %e, "dataset load failed");
            Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UnloadRequest {
    #[serde(alias = "dataset")]
    name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnloadResponse {
    pub success: bool,
    pub dataset: String,
    pub was_loaded: bool,
}

#[utoipa::path(
    post,
    path = "/unload_dataset",
    request_body = UnloadRequest,
    responses((status = 200, description = "Dataset unloaded", body = UnloadResponse)),
    tag = "management"
)]
async fn unload_dataset(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UnloadRequest>,
) -> Json<UnloadResponse> {
    let was_loaded = state.registry.unload(&req.name);
    Json(UnloadResponse {
        success: true,
        dataset: req.name,
        was_loaded,
    })
}

// ============ Health ============

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub engine: &'static str,
    pub datasets_loaded: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Liveness and loaded datasets", body = HealthResponse)),
    tag = "management"
)]
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        engine: "csr",
        datasets_loaded: state.registry.names(),
    })
}
