use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::auth::{AuthError, TokenError};
use crate::pagination::PaginationError;

pub type FieldErrors = BTreeMap<&'static str, String>;

#[derive(Debug)]
pub enum AppError {
    Sqlx(sqlx::Error),
    PasswordHash(argon2::password_hash::Error),
    Token(TokenError),
    Pagination(PaginationError),
    Unauthenticated,
    LoginFail,
    Validation(FieldErrors),
    NotFound(&'static str),
    Forbidden(&'static str),
    Internal,
}

impl From<sqlx::Error> for AppError {
    fn from(inner: sqlx::Error) -> Self {
        AppError::Sqlx(inner)
    }
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(inner: argon2::password_hash::Error) -> Self {
        AppError::PasswordHash(inner)
    }
}

impl From<TokenError> for AppError {
    fn from(inner: TokenError) -> Self {
        AppError::Token(inner)
    }
}

impl From<PaginationError> for AppError {
    fn from(inner: PaginationError) -> Self {
        AppError::Pagination(inner)
    }
}

impl From<AuthError> for AppError {
    fn from(inner: AuthError) -> Self {
        match inner {
            AuthError::Unauthenticated => AppError::Unauthenticated,
            AuthError::Store(e) => AppError::Sqlx(e),
        }
    }
}

fn internal() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Sqlx(sqlx::Error::RowNotFound) => {
                (StatusCode::NOT_FOUND, "Record not found".to_string())
            }
            AppError::Sqlx(e) => {
                if let Some(db_err) = e.as_database_error() {
                    if db_err.is_unique_violation() {
                        return (
                            StatusCode::CONFLICT,
                            Json(json!({"error": "Record already exists"})),
                        )
                            .into_response();
                    }
                }
                tracing::error!("Database error: {}", e);
                internal()
            }
            AppError::PasswordHash(e) => {
                tracing::error!("Password hashing error: {}", e);
                internal()
            }
            AppError::Token(e) => {
                tracing::error!("Token error: {}", e);
                internal()
            }
            AppError::Pagination(e) => {
                tracing::error!("{}", e);
                internal()
            }
            AppError::Internal => internal(),
            AppError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::LoginFail => (
                StatusCode::BAD_REQUEST,
                "Invalid email or password".to_string(),
            ),
            AppError::Validation(fields) => {
                return (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "validation": fields })),
                )
                    .into_response();
            }
            AppError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, format!("Forbidden: {msg}")),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
