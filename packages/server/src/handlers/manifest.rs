use std::str::FromStr;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use sea_orm::{ActiveValue::Set, EntityTrait};
use tracing::instrument;
use uuid::Uuid;

use crate::entity::deployment_event;
use crate::error::{AppError, ErrorBody};
use crate::extractors::AppJson;
use crate::manifest::build_manifest;
use crate::models::event::ClientEventRequest;
use crate::models::upload::Platform;
use crate::services::release::find_active_release;
use crate::state::AppState;

pub const PROTOCOL_VERSION: &str = "1";

pub const HEADER_PLATFORM: &str = "update-platform";
pub const HEADER_RUNTIME_VERSION: &str = "update-runtime-version";
pub const HEADER_CHANNEL: &str = "update-channel";
pub const HEADER_CURRENT_ID: &str = "update-current-id";
pub const HEADER_PROTOCOL_VERSION: &str = "update-protocol-version";
pub const HEADER_SIGNATURE: &str = "update-signature";
pub const HEADER_CERTIFICATE_CHAIN: &str = "update-certificate-chain";

const DEFAULT_CHANNEL: &str = "production";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn required_header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    header_str(headers, name)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("Missing required header '{name}'")))
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn record_event(
    state: &AppState,
    event_type: &str,
    release_id: Option<Uuid>,
    headers: &HeaderMap,
    platform: Option<String>,
    runtime_version: Option<String>,
    error_message: Option<String>,
) {
    let event = deployment_event::ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        release_id: Set(release_id),
        event_type: Set(event_type.to_string()),
        client_ip: Set(client_ip(headers)),
        user_agent: Set(header_str(headers, "user-agent").map(str::to_string)),
        platform: Set(platform),
        runtime_version: Set(runtime_version),
        error_message: Set(error_message),
        created_at: Set(Utc::now()),
    };
    if let Err(e) = deployment_event::Entity::insert(event)
        .exec_without_returning(&state.db)
        .await
    {
        // Telemetry must never fail a client request.
        tracing::warn!(error = %e, event_type, "failed to record deployment event");
    }
}

/// Serves the signed manifest of the active release for the client's
/// deployment key, or 204 when the client is already up to date.
#[utoipa::path(
    get,
    path = "/api/manifest",
    tag = "Update Protocol",
    operation_id = "getManifest",
    summary = "Resolve the current update manifest",
    description = "Looks up the active release for the platform, runtime version and channel sent in request headers and returns its signed manifest. Responds 204 when no update is available or the client already runs the active release.",
    params(
        ("update-platform" = String, Header, description = "Client platform: `ios` or `android`"),
        ("update-runtime-version" = String, Header, description = "Native runtime version of the installed app"),
        ("update-channel" = Option<String>, Header, description = "Deployment channel, defaults to `production`"),
        ("update-current-id" = Option<String>, Header, description = "Id of the release the client currently runs"),
    ),
    responses(
        (status = 200, description = "Signed manifest for the active release", body = crate::manifest::UpdateManifest),
        (status = 204, description = "No update available"),
        (status = 400, description = "Missing or invalid protocol headers (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers))]
pub async fn get_manifest(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let platform_raw = required_header(&headers, HEADER_PLATFORM)?;
    let platform = Platform::from_str(platform_raw)?;
    let runtime_version = required_header(&headers, HEADER_RUNTIME_VERSION)?;
    let channel = header_str(&headers, HEADER_CHANNEL)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_CHANNEL);

    let Some(release) =
        find_active_release(&state.db, platform.as_str(), channel, runtime_version).await?
    else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    // The client already runs the active release.
    if let Some(current) = header_str(&headers, HEADER_CURRENT_ID) {
        if Uuid::parse_str(current.trim()).is_ok_and(|id| id == release.id) {
            return Ok(StatusCode::NO_CONTENT.into_response());
        }
    }

    let manifest = build_manifest(&state.db, &release, &state.config.server.base_url).await?;
    // The signature must cover the exact bytes sent on the wire.
    let body = serde_json::to_vec(&manifest)
        .map_err(|e| AppError::Internal(format!("Failed to serialize manifest: {e}")))?;
    let signature = state.signer.sign(&body);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CACHE_CONTROL, "private, max-age=0")
        .header(HEADER_PROTOCOL_VERSION, PROTOCOL_VERSION)
        .header(HEADER_SIGNATURE, state.signer.signature_header(&signature))
        .header(HEADER_CERTIFICATE_CHAIN, state.signer.certificate_chain_header())
        .body(Body::from(body))
        .map_err(|e| AppError::Internal(e.to_string()))?;

    record_event(
        &state,
        "manifest_request",
        Some(release.id),
        &headers,
        Some(platform.as_str().to_string()),
        Some(runtime_version.to_string()),
        None,
    )
    .await;

    Ok(response)
}

/// Records an update failure reported by a client.
#[utoipa::path(
    post,
    path = "/api/events",
    tag = "Update Protocol",
    operation_id = "reportClientEvent",
    summary = "Report a client-side update error",
    request_body = ClientEventRequest,
    responses(
        (status = 204, description = "Event recorded"),
        (status = 400, description = "Malformed request body (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers, request))]
pub async fn report_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(request): AppJson<ClientEventRequest>,
) -> StatusCode {
    record_event(
        &state,
        "update_error",
        request.release_id,
        &headers,
        request.platform,
        request.runtime_version,
        request.error_message,
    )
    .await;
    StatusCode::NO_CONTENT
}
