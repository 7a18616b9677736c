//! API routes for the parsing server

pub mod formats;
pub mod parse;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use std::collections::BTreeMap;

use crate::server::state::AppState;
use crate::types::InfoResponse;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Parsing - with larger body limit for file uploads
        .route(
            "/parse",
            post(parse::parse_document).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/supported-formats", get(formats::supported_formats))
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<InfoResponse> {
    let pipeline = state.pipeline();

    let endpoints = BTreeMap::from([
        ("POST /parse", "Upload a document (multipart field 'file') and get its content"),
        ("GET /supported-formats", "List accepted file extensions"),
        ("GET /health", "Liveness check"),
        ("GET /ready", "Readiness check"),
        ("GET /info", "Service info and scratch file counters"),
    ]);

    Json(InfoResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        description: "Document parsing service",
        endpoints,
        supported_formats: formats::extension_list(pipeline.registry()),
        scratch: pipeline.scratch().stats(),
    })
}
