use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rusqlite::ErrorCode;
use serde_json::json;
use tracing::{error, warn};

use rendezvous_types::validation::ValidationError;

/// Error type for HTTP handlers. Every variant renders as
/// `{"error": ..., "code": ...}`; validation failures and rejected requests
/// add `fields`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The request could not be parsed into the handler's input type.
    /// `field` names the part that failed: `body`, `query` or `id`.
    #[error("{message}")]
    Rejected {
        status: StatusCode,
        field: &'static str,
        message: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            field: "body",
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Rejected {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            field: "query",
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            field: "id",
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::NotFound { entity, id } => {
                warn!(entity, id, "Not found");
                (
                    StatusCode::NOT_FOUND,
                    json!({ "error": self.to_string(), "code": "NOT_FOUND" }),
                )
            }
            ApiError::Validation(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": err.to_string(),
                    "code": "VALIDATION_ERROR",
                    "fields": err.errors,
                }),
            ),
            ApiError::Rejected {
                status,
                field,
                message,
            } => {
                let code = if *status == StatusCode::UNPROCESSABLE_ENTITY {
                    "VALIDATION_ERROR"
                } else {
                    "BAD_REQUEST"
                };
                let fields = ValidationError::single(*field, message.as_str()).errors;
                (
                    *status,
                    json!({ "error": message, "code": code, "fields": fields }),
                )
            }
            ApiError::Database(err) => classify_db_error(err),
            ApiError::Internal(msg) => {
                error!(error = %msg, "Internal error");
                internal()
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Constraint violations mean the input slipped past validation; anything
/// else is a server fault and is not echoed to the caller.
fn classify_db_error(err: &anyhow::Error) -> (StatusCode, serde_json::Value) {
    if let Some(rusqlite::Error::SqliteFailure(e, msg)) = err.downcast_ref::<rusqlite::Error>() {
        if e.code == ErrorCode::ConstraintViolation {
            warn!(error = ?msg, "Constraint violation");
            let detail = msg.as_deref().unwrap_or("constraint failed");
            let err = ValidationError::single(constrained_field(detail), detail);
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": "Input violates a stored constraint",
                    "code": "VALIDATION_ERROR",
                    "fields": err.errors,
                }),
            );
        }
    }

    error!(error = %format!("{err:#}"), "Database error");
    internal()
}

const STORED_FIELDS: [&str; 7] = [
    "name",
    "age",
    "gender",
    "contact",
    "profile_id",
    "author_name",
    "content",
];

/// First stored column named in a SQLite constraint message such as
/// `CHECK constraint failed: length(name) BETWEEN 1 AND 100`.
fn constrained_field(detail: &str) -> &'static str {
    detail
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .find_map(|word| STORED_FIELDS.into_iter().find(|field| *field == word))
        .unwrap_or("body")
}

fn internal() -> (StatusCode, serde_json::Value) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": "An internal error occurred", "code": "INTERNAL_ERROR" }),
    )
}
