//! OTA install manifest endpoint.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use emboss_core::InstallManifest;
use emboss_core::manifest::MEDIA_TYPE;

/// GET /api/manifest/{filename}
///
/// Devices fetch this through the itms-services install trigger; the XML
/// media type is required for the install prompt to appear.
pub async fn get_manifest(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    let meta = state.artifacts.stat(&filename).await?;

    let base = state.config.server.public_base();
    let download_url = format!("{base}/output/{}", meta.name);
    let title = meta
        .name
        .strip_suffix(".ipa")
        .unwrap_or(&meta.name)
        .to_string();
    let manifest = InstallManifest::for_artifact(download_url, title);

    Ok((
        StatusCode::OK,
        [(CONTENT_TYPE, MEDIA_TYPE)],
        manifest.to_xml(),
    )
        .into_response())
}
