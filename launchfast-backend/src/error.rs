// src/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),

    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Multiple validation errors")]
    ValidationErrors(Vec<String>),

    #[error("Validation failed")]
    ValidationFailure(#[from] ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::DbErr(DbErr::RecordNotFound(_)) => StatusCode::NOT_FOUND,
            AppError::DbErr(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_)
            | AppError::ValidationErrors(_)
            | AppError::ValidationFailure(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ExternalServiceError(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

// axum でエラーをHTTPレスポンスに変換するための実装
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = match self {
            AppError::DbErr(db_err) => {
                // サーバーログには詳細を出す
                tracing::error!(error = ?db_err, "Database error");

                let (message, details) = match &db_err {
                    DbErr::RecordNotFound(entity) => (
                        "The requested resource was not found",
                        Some(json!({ "entity": entity })),
                    ),
                    DbErr::Exec(_) => (
                        "A database operation failed",
                        Some(json!({ "operation": "exec" })),
                    ),
                    DbErr::Query(_) => (
                        "A database query failed",
                        Some(json!({ "operation": "query" })),
                    ),
                    _ => ("A database error occurred", None),
                };
                ErrorResponse::new(message, "database_error").with_details(details)
            }
            AppError::NotFound(message) => ErrorResponse::new(message, "not_found"),
            AppError::ValidationError(message) => ErrorResponse::new(message, "validation_error"),
            AppError::ValidationErrors(errors) => {
                let mut field_errors: HashMap<String, Vec<String>> = HashMap::new();
                for error in &errors {
                    if let Some((field, message)) = error.split_once(": ") {
                        field_errors
                            .entry(field.to_string())
                            .or_default()
                            .push(message.to_string());
                    }
                }
                ErrorResponse::validation(field_errors, errors)
            }
            AppError::ValidationFailure(errors) => {
                let field_errors: HashMap<String, Vec<String>> = errors
                    .field_errors()
                    .into_iter()
                    .map(|(field, errors)| {
                        let messages = errors
                            .iter()
                            .map(|e| {
                                e.message
                                    .as_ref()
                                    .map_or_else(|| "Invalid value".to_string(), |m| m.to_string())
                            })
                            .collect();
                        (field.to_string(), messages)
                    })
                    .collect();
                let flat = field_errors
                    .iter()
                    .flat_map(|(field, messages)| {
                        messages.iter().map(move |msg| format!("{}: {}", field, msg))
                    })
                    .collect();
                ErrorResponse::validation(field_errors, flat)
            }
            AppError::BadRequest(message) => ErrorResponse::new(message, "bad_request"),
            AppError::Unauthorized(message) => ErrorResponse::new(message, "unauthorized"),
            AppError::Forbidden(message) => ErrorResponse::new(message, "forbidden"),
            AppError::Conflict(message) => ErrorResponse::new(message, "conflict"),
            AppError::InternalServerError(message) => {
                tracing::error!(error = %message, "Internal server error");
                ErrorResponse::new("An internal server error occurred", "internal_server_error")
            }
            AppError::ExternalServiceError(message) => {
                tracing::error!(error = %message, "External service error");
                ErrorResponse {
                    error: "External service error".to_string(),
                    ..ErrorResponse::new(message, "external_service_error")
                }
            }
        };

        (status, Json(error_response)).into_response()
    }
}

// Result 型のエイリアス
pub type AppResult<T> = Result<T, AppError>;

/// 統一的なエラーレスポンス構造
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<HashMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<serde_json::Value>>,
    pub error_type: String,
}

impl ErrorResponse {
    fn new(message: impl Into<String>, error_type: &str) -> Self {
        let message = message.into();
        Self {
            success: false,
            error: message.clone(),
            message,
            details: None,
            validation_errors: None,
            errors: None,
            error_type: error_type.to_string(),
        }
    }

    fn with_details(mut self, details: Option<serde_json::Value>) -> Self {
        self.details = details;
        self
    }

    fn validation(field_errors: HashMap<String, Vec<String>>, messages: Vec<String>) -> Self {
        Self {
            validation_errors: Some(field_errors),
            errors: Some(
                messages
                    .into_iter()
                    .map(|m| json!({ "message": m }))
                    .collect(),
            ),
            ..Self::new("Validation failed", "validation_errors")
        }
    }
}
