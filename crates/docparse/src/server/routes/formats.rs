//! Supported formats endpoint

use axum::{extract::State, Json};

use crate::ingestion::ParserRegistry;
use crate::server::state::AppState;
use crate::types::SupportedFormatsResponse;

/// GET /supported-formats - Extensions accepted by `/parse`
pub async fn supported_formats(State(state): State<AppState>) -> Json<SupportedFormatsResponse> {
    Json(SupportedFormatsResponse {
        supported_formats: extension_list(state.pipeline().registry()),
    })
}

pub(crate) fn extension_list(registry: &ParserRegistry) -> Vec<String> {
    registry
        .supported_extensions()
        .into_iter()
        .map(str::to_string)
        .collect()
}
