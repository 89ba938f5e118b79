use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only log of manifest requests and client-reported update errors.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "deployment_event")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub release_id: Option<Uuid>,
    #[sea_orm(belongs_to, from = "release_id", to = "id")]
    pub release: HasOne<super::release::Entity>,

    /// "manifest_request" or "update_error".
    pub event_type: String,

    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub platform: Option<String>,
    pub runtime_version: Option<String>,
    pub error_message: Option<String>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
