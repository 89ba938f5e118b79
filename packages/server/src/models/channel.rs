use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::channel;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateChannelRequest {
    /// Channel name: lowercase alphanumerics and hyphens, at most 50 chars.
    #[schema(example = "staging")]
    pub name: String,
    pub description: Option<String>,
}

impl CreateChannelRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_channel_name(&self.name)
    }
}

pub fn validate_channel_name(name: &str) -> Result<(), AppError> {
    if name.is_empty() || name.len() > 50 {
        return Err(AppError::Validation(
            "Channel name must be between 1 and 50 characters".to_string(),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(AppError::Validation(
            "Channel name may only contain lowercase letters, digits and hyphens".to_string(),
        ));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ChannelResponse {
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<channel::Model> for ChannelResponse {
    fn from(model: channel::Model) -> Self {
        Self {
            name: model.name,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
