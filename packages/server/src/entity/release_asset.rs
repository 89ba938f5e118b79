use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Join of a release and a content-addressed asset under a per-release
/// logical key. Exactly one row per release has `is_launch_asset = true`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "release_asset")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub release_id: Uuid,
    #[sea_orm(belongs_to, from = "release_id", to = "id")]
    pub release: HasOne<super::release::Entity>,

    #[sea_orm(primary_key, auto_increment = false)]
    pub asset_hash: String,
    #[sea_orm(belongs_to, from = "asset_hash", to = "hash")]
    pub asset: HasOne<super::asset::Entity>,

    /// Logical key within the release, e.g. "bundle" or a file name.
    pub asset_key: String,

    pub is_launch_asset: bool,
}

impl ActiveModelBehavior for ActiveModel {}
