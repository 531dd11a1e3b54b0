//! Signing pipeline handler: upload intake, tool invocation, publication.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::extract::multipart::{Field, Multipart, MultipartError};
use emboss_core::artifact::signed_artifact_name;
use emboss_core::upload::{SignParams, UploadKind};
use emboss_signer::{SignJob, SignerError};
use emboss_storage::SessionDir;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;
use std::path::PathBuf;
use time::OffsetDateTime;

/// Successful signing response.
#[derive(Debug, Serialize)]
pub struct SignResponse {
    pub success: bool,
    pub message: String,
    pub data: SignData,
}

/// Published artifact description.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignData {
    pub file_name: String,
    pub download_url: String,
    pub install_url: String,
    pub size: u64,
}

/// One staged upload inside the session directory.
struct StagedFile {
    path: PathBuf,
    original_name: String,
}

/// Everything collected from the multipart body.
#[derive(Default)]
struct Intake {
    package: Option<StagedFile>,
    certificate: Option<StagedFile>,
    profile: Option<StagedFile>,
    params: SignParams,
}

impl Intake {
    fn slot(&mut self, kind: UploadKind) -> &mut Option<StagedFile> {
        match kind {
            UploadKind::Package => &mut self.package,
            UploadKind::Certificate => &mut self.certificate,
            UploadKind::Profile => &mut self.profile,
        }
    }
}

/// POST /api/sign
pub async fn sign_package(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<SignResponse>> {
    let session = state.sessions.create().await?;

    // Inputs are deleted after the attempt no matter how it went; only the
    // response (and on failure, the tool's diagnostics) survives.
    let result = sign_in_session(&state, &session, multipart).await;
    session.teardown().await;
    result.map(Json)
}

async fn sign_in_session(
    state: &AppState,
    session: &SessionDir,
    mut multipart: Multipart,
) -> ApiResult<SignResponse> {
    let intake = stage_uploads(state, session, &mut multipart).await?;

    let Intake {
        package,
        certificate,
        profile,
        params,
    } = intake;
    let (package, certificate, profile) = match (package, certificate, profile) {
        (Some(p), Some(c), Some(m)) => (p, c, m),
        (p, c, m) => {
            let mut missing = Vec::new();
            if p.is_none() {
                missing.push(UploadKind::Package.field_name());
            }
            if c.is_none() {
                missing.push(UploadKind::Certificate.field_name());
            }
            if m.is_none() {
                missing.push(UploadKind::Profile.field_name());
            }
            return Err(ApiError::BadRequest(format!(
                "missing required files: {}",
                missing.join(", ")
            )));
        }
    };

    let output_name = signed_artifact_name(&package.original_name, OffsetDateTime::now_utc());
    let output_path = state.artifacts.staging_path(&output_name)?;

    let _permit = state
        .sign_permits
        .acquire()
        .await
        .map_err(|_| ApiError::Internal("signing capacity unavailable".to_string()))?;

    let job = SignJob {
        package: &package.path,
        certificate: &certificate.path,
        profile: &profile.path,
        output: &output_path,
        params: &params,
    };
    let outcome = state.signer.sign(&job).await.map_err(|e| match e {
        SignerError::ToolFailed { diagnostics, .. } => ApiError::SignFailed { diagnostics },
        other => ApiError::Signer(other),
    })?;

    tracing::info!(
        session_id = %session.id(),
        artifact = %output_name,
        size = outcome.size,
        "package signed"
    );

    let base = state.config.server.public_base();
    let download_url = format!("{base}/output/{output_name}");
    let manifest_url = format!("{base}/api/manifest/{output_name}");
    let install_url = format!(
        "itms-services://?action=download-manifest&url={}",
        utf8_percent_encode(&manifest_url, NON_ALPHANUMERIC)
    );

    Ok(SignResponse {
        success: true,
        message: "package signed successfully".to_string(),
        data: SignData {
            file_name: output_name,
            download_url,
            install_url,
            size: outcome.size,
        },
    })
}

/// Parse the multipart body, persisting file parts into the session
/// directory as they stream in.
async fn stage_uploads(
    state: &AppState,
    session: &SessionDir,
    multipart: &mut Multipart,
) -> ApiResult<Intake> {
    let mut intake = Intake::default();

    while let Some(mut field) = multipart.next_field().await.map_err(bad_multipart)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "password" => {
                intake.params.password = non_empty(field.text().await.map_err(bad_multipart)?);
            }
            "bundleId" => {
                intake.params.bundle_id = non_empty(field.text().await.map_err(bad_multipart)?);
            }
            other => {
                let Some(kind) = UploadKind::from_field(other) else {
                    return Err(ApiError::BadRequest(format!("unexpected field: {other}")));
                };
                if intake.slot(kind).is_some() {
                    return Err(ApiError::BadRequest(format!(
                        "duplicate field: {}",
                        kind.field_name()
                    )));
                }

                let original_name = field.file_name().unwrap_or_default().to_string();
                kind.check_filename(&original_name)
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

                let path = stage_file(state, session, kind, &mut field).await?;
                *intake.slot(kind) = Some(StagedFile {
                    path,
                    original_name,
                });
            }
        }
    }

    Ok(intake)
}

/// Stream one file part to disk, enforcing the per-file size limit as the
/// body is consumed rather than after it.
async fn stage_file(
    state: &AppState,
    session: &SessionDir,
    kind: UploadKind,
    field: &mut Field<'_>,
) -> ApiResult<PathBuf> {
    let max_bytes = state.config.server.max_upload_bytes;
    let mut writer = session.begin_file(kind.stored_name()).await?;

    while let Some(chunk) = field.chunk().await.map_err(bad_multipart)? {
        if writer.bytes_written() + chunk.len() as u64 > max_bytes {
            return Err(ApiError::BadRequest(format!(
                "file '{}' exceeds the maximum upload size of {} bytes",
                kind.field_name(),
                max_bytes
            )));
        }
        writer.write(&chunk).await?;
    }

    let (path, size) = writer.finish().await?;
    tracing::debug!(
        session_id = %session.id(),
        field = kind.field_name(),
        size,
        "upload staged"
    );
    Ok(path)
}

fn bad_multipart(err: MultipartError) -> ApiError {
    ApiError::BadRequest(format!("malformed multipart body: {err}"))
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
