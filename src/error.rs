use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Network failure or non-2xx status from the catalog API.
    #[error("{}", fetch_failed_message(.status, .message))]
    FetchFailed {
        status: Option<u16>,
        message: String,
    },

    /// The catalog answered 2xx but the payload did not have the expected shape.
    #[error("Unexpected catalog response from {path}: {message}")]
    InvalidResponse { path: String, message: String },

    /// Stored favorites blob is not a valid JSON array of movies.
    #[error("Stored favorites are malformed: {0}")]
    ParseFailed(String),

    #[error("Storage operation failed: {0}")]
    StoreFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;

fn fetch_failed_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("Failed to fetch data (status {code}): {message}"),
        None => format!("Failed to fetch data: {message}"),
    }
}

impl Error {
    pub fn fetch(status: Option<u16>, message: impl Into<String>) -> Self {
        Error::FetchFailed {
            status,
            message: message.into(),
        }
    }

    pub fn store(err: impl std::fmt::Display) -> Self {
        Error::StoreFailed(err.to_string())
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Error::FetchFailed { status, .. } => *status,
            _ => None,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::FetchFailed { .. } | Error::InvalidResponse { .. } => StatusCode::BAD_GATEWAY,
            Error::ParseFailed(_) | Error::StoreFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
