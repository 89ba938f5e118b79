use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One uploaded (or rolled-back) bundle for a (runtime, platform, channel)
/// key. Never mutated after creation except for activation bookkeeping.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "release")]
pub struct Model {
    /// UUIDv4 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub runtime_version: String,
    #[sea_orm(belongs_to, from = "runtime_version", to = "version")]
    pub runtime: HasOne<super::runtime_version::Entity>,

    /// "ios" or "android".
    pub platform: String,

    pub channel: String,
    #[sea_orm(belongs_to, from = "channel", to = "name")]
    pub channel_ref: HasOne<super::channel::Entity>,

    pub git_commit: Option<String>,
    pub git_branch: Option<String>,
    pub message: Option<String>,

    /// At most one active release per (runtime_version, platform, channel).
    pub is_active: bool,

    pub is_rollback: bool,
    /// Non-owning historical pointer; the referenced release may be deleted.
    pub rollback_from_id: Option<Uuid>,

    /// Content hash of the launch bundle.
    pub launch_asset_hash: String,

    /// Raw metadata/extra JSON carried from the original export.
    #[sea_orm(column_type = "JsonBinary")]
    pub manifest_json: serde_json::Value,

    pub created_at: DateTimeUtc,
    pub activated_at: Option<DateTimeUtc>,
    pub deactivated_at: Option<DateTimeUtc>,

    #[sea_orm(has_many)]
    pub assets: HasMany<super::release_asset::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
