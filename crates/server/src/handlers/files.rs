//! Artifact registry endpoints: listing, deletion, download.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use serde::Serialize;
use time::OffsetDateTime;

/// Listing response.
#[derive(Debug, Serialize)]
pub struct FilesResponse {
    pub success: bool,
    pub files: Vec<ArtifactEntry>,
}

/// One artifact in the listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactEntry {
    pub name: String,
    pub size: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    pub download_url: String,
}

/// GET /api/files
pub async fn list_artifacts(State(state): State<AppState>) -> ApiResult<Json<FilesResponse>> {
    let base = state.config.server.public_base();
    let files = state
        .artifacts
        .list()
        .await?
        .into_iter()
        .map(|meta| ArtifactEntry {
            download_url: format!("{base}/output/{}", meta.name),
            name: meta.name,
            size: meta.size,
            created: meta.created,
        })
        .collect();

    Ok(Json(FilesResponse {
        success: true,
        files,
    }))
}

/// Deletion response.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// DELETE /api/files/{filename}
pub async fn delete_artifact(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    state.artifacts.delete(&filename).await?;
    Ok(Json(DeleteResponse {
        success: true,
        message: format!("deleted {filename}"),
    }))
}

/// GET /output/{filename} - Serve a produced artifact.
pub async fn download_artifact(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    // Stat first for the Content-Length header, then stream from disk.
    let meta = state.artifacts.stat(&filename).await?;
    let stream = state.artifacts.get_stream(&filename).await?;
    let body_stream = stream.map(|result| result.map_err(|e| std::io::Error::other(e.to_string())));

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, "application/octet-stream"),
            (CONTENT_LENGTH, &meta.size.to_string()),
        ],
        Body::from_stream(body_stream),
    )
        .into_response())
}
