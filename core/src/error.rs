//! Error types for the todo API client.
//!
//! # Design
//! Non-2xx responses are classified by status family so the host can tell a
//! dead session (`Unauthorized`) from a rejected input (`Rejected`) or a
//! broken server (`Server`). Every variant renders to a message a user can
//! read; `ApiError::message` is what a view should display.

use serde::Deserialize;
use thiserror::Error;

/// Errors returned by `ApiClient` parse methods, transports and session
/// operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received (connection refused, DNS, broken pipe).
    #[error("network error: {0}")]
    Transport(String),

    /// The server returned 401. The session is no longer valid.
    #[error("{message}")]
    Unauthorized { message: String },

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server rejected the request with a 4xx other than 401/404,
    /// e.g. wrong password, duplicate email or invalid input.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The server returned a 5xx.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// A status outside the success and error ranges, e.g. a redirect.
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Error envelope used by the remote API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "ErrorMessageEN")]
    message_en: Option<String>,
    #[serde(rename = "ErrorMessageJP")]
    message_jp: Option<String>,
}

/// Pull the human-readable message out of an error body, falling back to the
/// raw text when it is not the API's JSON envelope.
fn extract_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.message_en.or(parsed.message_jp) {
            return message;
        }
    }
    body.trim().to_string()
}

impl ApiError {
    /// Classify a response whose status is not a success.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 => ApiError::Unauthorized {
                message: non_empty(extract_message(body), "authentication required"),
            },
            404 => ApiError::NotFound,
            400..=499 => ApiError::Rejected {
                status,
                message: non_empty(extract_message(body), "request rejected"),
            },
            500..=599 => ApiError::Server {
                status,
                message: non_empty(extract_message(body), "internal server error"),
            },
            _ => ApiError::UnexpectedStatus {
                status,
                body: body.to_string(),
            },
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// Message suitable for showing to the user.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

fn non_empty(message: String, fallback: &str) -> String {
    if message.is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
