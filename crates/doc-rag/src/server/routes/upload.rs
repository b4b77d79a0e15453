//! PDF upload endpoint

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use std::path::Path;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::UploadOutcome;

/// POST /upload - Upload a PDF in the multipart field `file`
///
/// The file is written under a fresh temporary directory with its original
/// name, so chunks cite the name the user uploaded. The directory is removed
/// once processing finishes.
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadOutcome>)> {
    let max_size = state.config().server.max_upload_size;
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        Error::InvalidRequest(format!("Failed to read multipart field: {}", e))
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .and_then(|name| Path::new(name).file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::InvalidRequest("Uploaded file has no name".into()))?;

        if !is_pdf(&filename) {
            return Err(Error::UnsupportedFileType(format!(
                "{} (only PDF files are supported)",
                filename
            )));
        }

        let data = field.bytes().await.map_err(|e| {
            Error::InvalidRequest(format!("Failed to read file {}: {}", filename, e))
        })?;

        if data.len() > max_size {
            return Err(Error::InvalidRequest(format!(
                "File size exceeds maximum limit ({} > {} bytes)",
                data.len(),
                max_size
            )));
        }

        upload = Some((filename, data));
        break;
    }

    let (filename, data) =
        upload.ok_or_else(|| Error::InvalidRequest("Missing multipart field 'file'".into()))?;

    tracing::info!("Received upload: {} ({} bytes)", filename, data.len());

    let dir = tempfile::tempdir()?;
    let path = dir.path().join(&filename);
    tokio::fs::write(&path, &data).await?;

    let outcome = state.rag().upload(&path).await;

    if let Err(e) = dir.close() {
        tracing::warn!("Failed to remove temporary upload directory: {}", e);
    }

    let status = if outcome.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok((status, Json(outcome)))
}

fn is_pdf(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}
