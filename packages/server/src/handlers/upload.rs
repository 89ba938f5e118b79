use std::str::FromStr;

use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::models::channel::validate_channel_name;
use crate::models::upload::{Platform, UploadParams, UploadResponse};
use crate::services::upload::process_upload;
use crate::state::AppState;

/// Maximum accepted size of an uploaded export archive (256 MB).
pub const MAX_UPLOAD_BODY_SIZE: usize = 256 * 1024 * 1024;

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim().to_string();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

/// Accepts an export archive plus release metadata and creates an active
/// release from it.
#[utoipa::path(
    post,
    path = "/releases/upload",
    tag = "Releases",
    operation_id = "uploadRelease",
    summary = "Upload an export archive as a new release",
    description = "Multipart form with text fields `platform`, `runtime_version`, optional `channel` (defaults to `production`), `git_commit`, `git_branch`, `message`, and the export archive as the `bundle` file field. The new release is activated atomically, replacing any active release for the same platform, channel and runtime version.",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Release created and activated", body = UploadResponse),
        (status = 400, description = "Invalid parameters or archive (VALIDATION_ERROR, INVALID_EXPORT, UNSUPPORTED_PLATFORM)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_release(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let mut platform = None;
    let mut runtime_version = None;
    let mut channel = None;
    let mut git_commit = None;
    let mut git_branch = None;
    let mut message = None;
    let mut archive: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "bundle" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read archive: {e}")))?;
                archive = Some(bytes.to_vec());
            }
            _ => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read field '{name}': {e}")))?;
                match name.as_str() {
                    "platform" => platform = non_empty(text),
                    "runtime_version" => runtime_version = non_empty(text),
                    "channel" => channel = non_empty(text),
                    "git_commit" => git_commit = non_empty(text),
                    "git_branch" => git_branch = non_empty(text),
                    "message" => message = non_empty(text),
                    _ => {}
                }
            }
        }
    }

    let platform = platform
        .ok_or_else(|| AppError::Validation("Missing required field 'platform'".to_string()))?;
    let platform = Platform::from_str(&platform)?;
    let runtime_version = runtime_version.ok_or_else(|| {
        AppError::Validation("Missing required field 'runtime_version'".to_string())
    })?;
    let channel = channel.unwrap_or_else(|| "production".to_string());
    validate_channel_name(&channel)?;
    let archive = archive
        .ok_or_else(|| AppError::Validation("Missing required file field 'bundle'".to_string()))?;

    let params = UploadParams {
        platform,
        runtime_version,
        channel,
        git_commit,
        git_branch,
        message,
    };
    let release_id = process_upload(&state, params, archive).await?;

    Ok((StatusCode::CREATED, Json(UploadResponse { release_id })))
}
