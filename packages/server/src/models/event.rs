use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::deployment_event;

/// Error report posted by a client after a failed update attempt.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ClientEventRequest {
    /// Release the client was attempting to apply, when known.
    pub release_id: Option<Uuid>,
    pub error_message: Option<String>,
    pub platform: Option<String>,
    pub runtime_version: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DeploymentEventResponse {
    pub id: i32,
    pub release_id: Option<Uuid>,
    pub event_type: String,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub platform: Option<String>,
    pub runtime_version: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<deployment_event::Model> for DeploymentEventResponse {
    fn from(model: deployment_event::Model) -> Self {
        Self {
            id: model.id,
            release_id: model.release_id,
            event_type: model.event_type,
            client_ip: model.client_ip,
            user_agent: model.user_agent,
            platform: model.platform,
            runtime_version: model.runtime_version,
            error_message: model.error_message,
            created_at: model.created_at,
        }
    }
}
