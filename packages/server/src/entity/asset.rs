use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Metadata for one content-addressed blob. Immutable once created; the row
/// exists at most once per distinct content (insert-if-absent).
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "asset")]
pub struct Model {
    /// SHA-256 content hash (64 hex chars).
    #[sea_orm(primary_key, auto_increment = false)]
    pub hash: String,

    /// Stored file path relative to the asset root (== hash by convention).
    pub file_path: String,

    pub content_type: String,
    pub file_extension: String,
    pub size_bytes: i64,

    pub created_at: DateTimeUtc,

    #[sea_orm(has_many)]
    pub release_assets: HasMany<super::release_asset::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
