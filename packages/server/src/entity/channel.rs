use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A named deployment lane (e.g. "production", "staging").
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "channel")]
pub struct Model {
    /// Lowercase alphanumeric/hyphen name.
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,

    pub description: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,

    #[sea_orm(has_many)]
    pub releases: HasMany<super::release::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
