use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Compatibility key ensuring a client only receives updates built for
/// compatible native code.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "runtime_version")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub version: String,

    pub min_app_version: Option<String>,

    pub deprecated_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,

    #[sea_orm(has_many)]
    pub releases: HasMany<super::release::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
