use anyhow::Error as AnyhowError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Json parse error: {0}")]
    JsonParseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    #[error("Port parse error: {0}")]
    PortParseError(#[from] std::num::ParseIntError),

    #[error("{0}")]
    Generic(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            AppError::JsonParseError(message) => (StatusCode::BAD_REQUEST, message),
            AppError::ConfigError(message) => (StatusCode::BAD_REQUEST, message),
            AppError::ServerError(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
            AppError::WebSocketError(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
            AppError::PortParseError(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::Generic(err) => (StatusCode::INTERNAL_SERVER_ERROR, err),
        };

        (status, Json(json!({ "error": error_message }))).into_response()
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::JsonParseError(err.to_string())
    }
}

impl From<AnyhowError> for AppError {
    fn from(err: AnyhowError) -> Self {
        AppError::ServerError(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for AppError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        AppError::WebSocketError(err.to_string())
    }
}

impl From<axum::Error> for AppError {
    fn from(err: axum::Error) -> Self {
        AppError::WebSocketError(err.to_string())
    }
}
