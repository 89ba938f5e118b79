use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{deployment_event, release};
use crate::error::{AppError, ErrorBody};
use crate::models::event::DeploymentEventResponse;
use crate::models::release::{ReleaseListQuery, ReleaseListResponse, ReleaseResponse};
use crate::models::shared::ListMeta;
use crate::services;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u64 = 10;
const MAX_PAGE_SIZE: u64 = 100;

async fn find_release(state: &AppState, id: Uuid) -> Result<release::Model, AppError> {
    release::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Release {id} not found")))
}

#[utoipa::path(
    get,
    path = "/releases",
    tag = "Releases",
    operation_id = "listReleases",
    summary = "List releases, newest first",
    params(ReleaseListQuery),
    responses(
        (status = 200, description = "Page of releases", body = ReleaseListResponse),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_releases(
    State(state): State<AppState>,
    Query(query): Query<ReleaseListQuery>,
) -> Result<Json<ReleaseListResponse>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);

    let mut finder = release::Entity::find();
    if let Some(platform) = &query.platform {
        finder = finder.filter(release::Column::Platform.eq(platform));
    }
    if let Some(channel) = &query.channel {
        finder = finder.filter(release::Column::Channel.eq(channel));
    }

    let total = finder.clone().count(&state.db).await?;
    let data = finder
        .order_by_desc(release::Column::CreatedAt)
        .offset(offset)
        .limit(limit)
        .all(&state.db)
        .await?
        .into_iter()
        .map(ReleaseResponse::from)
        .collect();

    Ok(Json(ReleaseListResponse {
        data,
        meta: ListMeta {
            total,
            limit,
            offset,
        },
    }))
}

#[utoipa::path(
    get,
    path = "/releases/{id}",
    tag = "Releases",
    operation_id = "getRelease",
    summary = "Get a single release",
    params(("id" = Uuid, Path, description = "Release id")),
    responses(
        (status = 200, description = "The release", body = ReleaseResponse),
        (status = 404, description = "Unknown release (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_release(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReleaseResponse>, AppError> {
    let model = find_release(&state, id).await?;
    Ok(Json(ReleaseResponse::from(model)))
}

#[utoipa::path(
    delete,
    path = "/releases/{id}",
    tag = "Releases",
    operation_id = "deleteRelease",
    summary = "Delete a release and its asset mappings",
    description = "Removes the release row, its asset mappings and its events. Shared asset blobs stay in storage until the garbage collector finds them unreferenced.",
    params(("id" = Uuid, Path, description = "Release id")),
    responses(
        (status = 204, description = "Release deleted"),
        (status = 404, description = "Unknown release (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_release(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    services::release::delete_release(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/releases/{id}/activate",
    tag = "Releases",
    operation_id = "activateRelease",
    summary = "Activate a release",
    description = "Makes the release the active one for its platform, channel and runtime version, deactivating any other release for that key in the same transaction.",
    params(("id" = Uuid, Path, description = "Release id")),
    responses(
        (status = 200, description = "The activated release", body = ReleaseResponse),
        (status = 404, description = "Unknown release (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn activate_release(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReleaseResponse>, AppError> {
    let model = services::release::activate(&state.db, id).await?;
    Ok(Json(ReleaseResponse::from(model)))
}

#[utoipa::path(
    post,
    path = "/releases/{id}/deactivate",
    tag = "Releases",
    operation_id = "deactivateRelease",
    summary = "Deactivate a release",
    description = "Deactivates the release, leaving its deployment key without an active release. Clients asking for updates on that key receive 204 until another release is activated.",
    params(("id" = Uuid, Path, description = "Release id")),
    responses(
        (status = 200, description = "The deactivated release", body = ReleaseResponse),
        (status = 404, description = "Unknown release (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn deactivate_release(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReleaseResponse>, AppError> {
    let model = services::release::deactivate(&state.db, id).await?;
    Ok(Json(ReleaseResponse::from(model)))
}

#[utoipa::path(
    post,
    path = "/releases/{id}/rollback",
    tag = "Releases",
    operation_id = "rollbackToRelease",
    summary = "Roll back to a release",
    description = "Creates a new release that is a copy of the given one (fresh id, same assets) and activates it, so the deployment history records the rollback as its own release.",
    params(("id" = Uuid, Path, description = "Release id to roll back to")),
    responses(
        (status = 201, description = "The newly created rollback release", body = ReleaseResponse),
        (status = 404, description = "Unknown release (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn rollback_release(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ReleaseResponse>), AppError> {
    let model = services::release::rollback(&state, id).await?;
    Ok((StatusCode::CREATED, Json(ReleaseResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/releases/{id}/events",
    tag = "Releases",
    operation_id = "listReleaseEvents",
    summary = "List recent deployment events for a release",
    params(("id" = Uuid, Path, description = "Release id")),
    responses(
        (status = 200, description = "Most recent events, newest first", body = Vec<DeploymentEventResponse>),
        (status = 404, description = "Unknown release (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_release_events(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<DeploymentEventResponse>>, AppError> {
    find_release(&state, id).await?;
    let events = deployment_event::Entity::find()
        .filter(deployment_event::Column::ReleaseId.eq(id))
        .order_by_desc(deployment_event::Column::CreatedAt)
        .limit(100)
        .all(&state.db)
        .await?
        .into_iter()
        .map(DeploymentEventResponse::from)
        .collect();
    Ok(Json(events))
}
