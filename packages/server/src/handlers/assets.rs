use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use common::storage::ContentHash;
use sea_orm::EntityTrait;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::entity::asset;
use crate::error::{AppError, ErrorBody};
use crate::state::AppState;
use crate::utils::paths::is_valid_hash_param;

/// Streams a stored asset by its content hash.
///
/// Content-addressed responses never change, so they are served with an
/// aggressive immutable cache policy and the hash itself as ETag.
#[utoipa::path(
    get,
    path = "/assets/{hash}",
    tag = "Update Protocol",
    operation_id = "downloadAsset",
    summary = "Download an asset by content hash",
    params(("hash" = String, Path, description = "SHA-256 content hash of the asset")),
    responses(
        (status = 200, description = "Asset contents", body = Vec<u8>),
        (status = 400, description = "Malformed hash (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Unknown asset (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn download_asset(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Response, AppError> {
    if !is_valid_hash_param(&hash) {
        return Err(AppError::Validation("Malformed asset hash".to_string()));
    }

    let record = asset::Entity::find_by_id(hash.clone())
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Asset {hash} not found")))?;

    let content_hash = ContentHash::from_hex(&record.hash)
        .map_err(|_| AppError::IntegrityFault(format!("Malformed stored hash {}", record.hash)))?;
    let reader = state.assets.get_stream(&content_hash).await?;
    let stream = ReaderStream::new(reader);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, record.content_type)
        .header(header::CONTENT_LENGTH, record.size_bytes)
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .header(header::ETAG, format!("\"{}\"", record.hash))
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::Internal(e.to_string()))
}
