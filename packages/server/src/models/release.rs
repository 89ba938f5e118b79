use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::release;
use crate::models::shared::ListMeta;

#[derive(Serialize, utoipa::ToSchema)]
pub struct ReleaseResponse {
    pub id: Uuid,
    pub runtime_version: String,
    pub platform: String,
    pub channel: String,
    pub git_commit: Option<String>,
    pub git_branch: Option<String>,
    pub message: Option<String>,
    pub is_active: bool,
    pub is_rollback: bool,
    pub rollback_from_id: Option<Uuid>,
    pub launch_asset_hash: String,
    pub created_at: DateTime<Utc>,
    pub activated_at: Option<DateTime<Utc>>,
    pub deactivated_at: Option<DateTime<Utc>>,
}

impl From<release::Model> for ReleaseResponse {
    fn from(model: release::Model) -> Self {
        Self {
            id: model.id,
            runtime_version: model.runtime_version,
            platform: model.platform,
            channel: model.channel,
            git_commit: model.git_commit,
            git_branch: model.git_branch,
            message: model.message,
            is_active: model.is_active,
            is_rollback: model.is_rollback,
            rollback_from_id: model.rollback_from_id,
            launch_asset_hash: model.launch_asset_hash,
            created_at: model.created_at,
            activated_at: model.activated_at,
            deactivated_at: model.deactivated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ReleaseListResponse {
    pub data: Vec<ReleaseResponse>,
    pub meta: ListMeta,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct ReleaseListQuery {
    /// Page size, capped at 100. Defaults to 10.
    pub limit: Option<u64>,
    /// Number of items to skip. Defaults to 0.
    pub offset: Option<u64>,
    /// Restrict to a single platform ("ios" or "android").
    pub platform: Option<String>,
    /// Restrict to a single channel.
    pub channel: Option<String>,
}
