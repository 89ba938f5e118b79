use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Client platform a release targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ios" => Ok(Platform::Ios),
            "android" => Ok(Platform::Android),
            other => Err(AppError::Validation(format!(
                "Unsupported platform '{other}': expected 'ios' or 'android'"
            ))),
        }
    }
}

/// Validated parameters accompanying an upload archive.
#[derive(Debug, Clone)]
pub struct UploadParams {
    pub platform: Platform,
    pub runtime_version: String,
    pub channel: String,
    pub git_commit: Option<String>,
    pub git_branch: Option<String>,
    pub message: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    /// Id of the newly created release.
    pub release_id: Uuid,
}
