//! Document parsing endpoint

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::ingestion::UploadRequest;
use crate::server::state::AppState;
use crate::types::ParseResponse;

/// Multipart field carrying the upload
const FILE_FIELD: &str = "file";

/// POST /parse - Upload one file and return its extracted content
pub async fn parse_document(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ParseResponse>> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("parse", %request_id);

    async move {
        let multipart = multipart
            .map_err(|e| Error::invalid_upload(format!("Invalid multipart body: {}", e)))?;
        let upload = read_upload(multipart, state.config().server.max_upload_size).await?;

        tracing::info!("Received {} ({} bytes)", upload.filename, upload.data.len());

        let content = state.pipeline().process(upload).await?;
        Ok(Json(ParseResponse::success(content)))
    }
    .instrument(span)
    .await
}

/// Pull the `file` field out of the body, skipping any other fields
async fn read_upload(mut multipart: Multipart, limit: usize) -> Result<UploadRequest> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit, "Failed to read multipart field"))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| Error::invalid_upload("Field 'file' must be a file upload"))?;

        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, limit, "Failed to read file"))?;

        return Ok(UploadRequest { filename, data });
    }

    Err(Error::invalid_upload("No file provided in field 'file'"))
}

/// Body-limit rejections keep their 413, everything else is a bad upload
fn multipart_error(err: MultipartError, limit: usize, context: &str) -> Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!("Upload rejected: {}", err.body_text());
        Error::PayloadTooLarge { limit }
    } else {
        Error::invalid_upload(format!("{}: {}", context, err.body_text()))
    }
}
