use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    sea_query::OnConflict,
};
use tracing::instrument;

use crate::entity::{channel, release};
use crate::error::{AppError, ErrorBody};
use crate::extractors::AppJson;
use crate::models::channel::{ChannelResponse, CreateChannelRequest};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/channels",
    tag = "Channels",
    operation_id = "listChannels",
    summary = "List deployment channels",
    responses(
        (status = 200, description = "All channels, ordered by name", body = Vec<ChannelResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_channels(
    State(state): State<AppState>,
) -> Result<Json<Vec<ChannelResponse>>, AppError> {
    let channels = channel::Entity::find()
        .order_by_asc(channel::Column::Name)
        .all(&state.db)
        .await?
        .into_iter()
        .map(ChannelResponse::from)
        .collect();
    Ok(Json(channels))
}

#[utoipa::path(
    post,
    path = "/channels",
    tag = "Channels",
    operation_id = "createChannel",
    summary = "Create a deployment channel",
    request_body = CreateChannelRequest,
    responses(
        (status = 201, description = "Channel created", body = ChannelResponse),
        (status = 400, description = "Invalid channel name (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Channel already exists (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, request))]
pub async fn create_channel(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateChannelRequest>,
) -> Result<(StatusCode, Json<ChannelResponse>), AppError> {
    request.validate()?;

    let now = Utc::now();
    let model = channel::ActiveModel {
        name: Set(request.name.clone()),
        description: Set(request.description.clone()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    // On conflict the insert is a no-op reporting zero affected rows.
    let rows_inserted = channel::Entity::insert(model)
        .on_conflict(OnConflict::column(channel::Column::Name).do_nothing().to_owned())
        .exec_without_returning(&state.db)
        .await?;
    if rows_inserted == 0 {
        return Err(AppError::Conflict(format!(
            "Channel '{}' already exists",
            request.name
        )));
    }

    let created = channel::Entity::find_by_id(request.name.clone())
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal("Created channel vanished".into()))?;
    Ok((StatusCode::CREATED, Json(ChannelResponse::from(created))))
}

#[utoipa::path(
    delete,
    path = "/channels/{name}",
    tag = "Channels",
    operation_id = "deleteChannel",
    summary = "Delete an empty deployment channel",
    params(("name" = String, Path, description = "Channel name")),
    responses(
        (status = 204, description = "Channel deleted"),
        (status = 404, description = "Unknown channel (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Channel still has releases (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_channel(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    let releases = release::Entity::find()
        .filter(release::Column::Channel.eq(name.clone()))
        .count(&state.db)
        .await?;
    if releases > 0 {
        return Err(AppError::Conflict(format!(
            "Channel '{name}' still has {releases} release(s)"
        )));
    }

    let result = channel::Entity::delete_by_id(name.clone()).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound(format!("Channel '{name}' not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
