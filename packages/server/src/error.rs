use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `NOT_FOUND`,
    /// `CONFLICT`, `INVALID_EXPORT`, `UNSUPPORTED_PLATFORM`,
    /// `INTEGRITY_FAULT`, `STORAGE_ERROR`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Channel name must be 1-50 lowercase alphanumeric/hyphen characters")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    NotFound(String),
    Conflict(String),
    /// The uploaded archive is not a valid export bundle.
    InvalidExport(String),
    /// The export contains no entry for the requested platform.
    UnsupportedPlatform(String),
    /// A release violates a data invariant (e.g. missing its launch asset).
    IntegrityFault(String),
    Storage(StorageError),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "CONFLICT",
                    message: msg,
                },
            ),
            AppError::InvalidExport(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "INVALID_EXPORT",
                    message: msg,
                },
            ),
            AppError::UnsupportedPlatform(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "UNSUPPORTED_PLATFORM",
                    message: msg,
                },
            ),
            AppError::IntegrityFault(detail) => {
                tracing::error!("Integrity fault: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTEGRITY_FAULT",
                        message: detail,
                    },
                )
            }
            AppError::Storage(err) => {
                tracing::error!("Storage error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "STORAGE_ERROR",
                        message: "Asset storage operation failed".into(),
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(hash) => AppError::NotFound(format!("Asset {hash} not found")),
            other => AppError::Storage(other),
        }
    }
}
