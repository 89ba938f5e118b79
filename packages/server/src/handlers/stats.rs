use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{Duration, Utc};
use common::storage::ContentHash;
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use tracing::instrument;

use crate::entity::{asset, deployment_event, release};
use crate::error::AppError;
use crate::models::event::DeploymentEventResponse;
use crate::models::stats::{
    ErrorStats, HealthResponse, ManifestRequestStats, ReleaseStats, StatsResponse, StorageStats,
};
use crate::state::AppState;

async fn count_events_since(
    state: &AppState,
    event_type: &str,
    since: chrono::DateTime<Utc>,
) -> Result<u64, AppError> {
    let count = deployment_event::Entity::find()
        .filter(deployment_event::Column::EventType.eq(event_type))
        .filter(deployment_event::Column::CreatedAt.gte(since))
        .count(&state.db)
        .await?;
    Ok(count)
}

#[utoipa::path(
    get,
    path = "/stats",
    tag = "Stats",
    operation_id = "getStats",
    summary = "Deployment and storage statistics",
    responses(
        (status = 200, description = "Aggregate statistics", body = StatsResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, AppError> {
    let now = Utc::now();

    let total_releases = release::Entity::find().count(&state.db).await?;
    let active_releases = release::Entity::find()
        .filter(release::Column::IsActive.eq(true))
        .count(&state.db)
        .await?;

    let manifest_total = deployment_event::Entity::find()
        .filter(deployment_event::Column::EventType.eq("manifest_request"))
        .count(&state.db)
        .await?;
    let manifest_24h =
        count_events_since(&state, "manifest_request", now - Duration::hours(24)).await?;
    let manifest_7d =
        count_events_since(&state, "manifest_request", now - Duration::days(7)).await?;
    let errors_24h = count_events_since(&state, "update_error", now - Duration::hours(24)).await?;

    let asset_count = asset::Entity::find().count(&state.db).await?;
    let total_bytes: Option<i64> = asset::Entity::find()
        .select_only()
        .column_as(asset::Column::SizeBytes.sum(), "total")
        .into_tuple()
        .one(&state.db)
        .await?
        .flatten();

    Ok(Json(StatsResponse {
        releases: ReleaseStats {
            total: total_releases,
            active: active_releases,
        },
        manifest_requests: ManifestRequestStats {
            total: manifest_total,
            last_24h: manifest_24h,
            last_7d: manifest_7d,
        },
        update_errors: ErrorStats {
            last_24h: errors_24h,
        },
        storage: StorageStats {
            asset_count,
            total_bytes: total_bytes.unwrap_or(0),
        },
    }))
}

#[utoipa::path(
    get,
    path = "/stats/activity",
    tag = "Stats",
    operation_id = "getRecentActivity",
    summary = "Most recent deployment events",
    responses(
        (status = 200, description = "Recent events, newest first", body = Vec<DeploymentEventResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn get_recent_activity(
    State(state): State<AppState>,
) -> Result<Json<Vec<DeploymentEventResponse>>, AppError> {
    let events = deployment_event::Entity::find()
        .order_by_desc(deployment_event::Column::CreatedAt)
        .limit(50)
        .all(&state.db)
        .await?
        .into_iter()
        .map(DeploymentEventResponse::from)
        .collect();
    Ok(Json(events))
}

/// Liveness probe covering the database and the asset store.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Stats",
    operation_id = "getHealth",
    summary = "Service health check",
    responses(
        (status = 200, description = "All subsystems healthy", body = HealthResponse),
        (status = 503, description = "A subsystem is unavailable", body = HealthResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn get_health(State(state): State<AppState>) -> Response {
    let database_ok = state.db.ping().await.is_ok();
    // A lookup of an arbitrary hash exercises the store without mutating it.
    let storage_ok = state
        .assets
        .exists(&ContentHash::compute(b"health-probe"))
        .await
        .is_ok();

    let body = HealthResponse {
        status: if database_ok && storage_ok { "ok" } else { "degraded" },
        database: if database_ok { "ok" } else { "unavailable" },
        storage: if storage_ok { "ok" } else { "unavailable" },
    };
    let status = if database_ok && storage_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body)).into_response()
}
