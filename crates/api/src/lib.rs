//! HTTP protocol models for the VectorVista service.
//!
//! Both endpoints take and return JSON over `POST`. Field names follow the
//! service exactly (`userData`, `session_id`), so these structs are the
//! single source of truth for the wire format. The transport lives in
//! [`client`]; the workflow only depends on the [`Backend`] trait.

use core_types::{Record, SessionId};
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

pub mod client;

pub use client::HttpClient;

/// Prefix shared by every route of the service.
pub const API_PREFIX: &str = "/api/v1";
pub const EMBEDDING_PATH: &str = "/embedding";
pub const SEARCH_PATH: &str = "/search";
pub const HEALTH_PATH: &str = "/";

/// Shown when the service gave no message of its own.
pub const GENERIC_NETWORK_ERROR: &str = "Network error: could not reach the server";
/// Shown when the service answered but the body was not the expected JSON.
pub const UNEXPECTED_RESPONSE: &str = "Unexpected response from the server";

/// Body of `POST /api/v1/embedding`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    #[serde(rename = "userData")]
    pub user_data: serde_json::Value,
    /// `null` on the first import; the service then mints a new session.
    pub session_id: Option<SessionId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `POST /api/v1/search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub session_id: Option<SessionId>,
    pub limit: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Option<Vec<Record>>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Reply of `GET /api/v1/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Failure body used by every route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Errors surfaced by a [`Backend`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("server returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status { status: u16, message: Option<String> },
    #[error("malformed response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Build a status error from a raw failure body, keeping the envelope
    /// message when the body has one.
    pub fn from_body(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<ErrorEnvelope>(body)
            .ok()
            .and_then(|env| env.message)
            .filter(|m| !m.trim().is_empty());
        Self::Status { status, message }
    }

    /// Text suitable for a user-facing notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status {
                message: Some(message),
                ..
            } => message.clone(),
            Self::Status {
                status,
                message: None,
            } => format!("Request failed with status code {status}"),
            Self::Transport(_) => GENERIC_NETWORK_ERROR.to_string(),
            Self::Decode(_) => UNEXPECTED_RESPONSE.to_string(),
        }
    }
}

/// Remote side of the workflow. Implemented by [`HttpClient`] and by fakes
/// in tests.
pub trait Backend: Send + Sync {
    fn embed(
        &self,
        req: EmbeddingRequest,
    ) -> impl Future<Output = Result<EmbeddingResponse, RemoteError>> + Send;

    fn search(
        &self,
        req: SearchRequest,
    ) -> impl Future<Output = Result<SearchResponse, RemoteError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn embedding_request_uses_service_field_names() {
        let req = EmbeddingRequest {
            user_data: json!([{"a": 1}]),
            session_id: None,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value, json!({"userData": [{"a": 1}], "session_id": null}));
    }

    #[test]
    fn search_request_shape() {
        let req = SearchRequest {
            query: "pending orders".into(),
            session_id: Some(SessionId::new("S1")),
            limit: 5,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({"query": "pending orders", "session_id": "S1", "limit": 5})
        );
    }

    #[test]
    fn search_response_tolerates_missing_and_null_fields() {
        let resp: SearchResponse = serde_json::from_str(r#"{"summary": null}"#).unwrap();
        assert!(resp.results.is_none());
        assert!(resp.summary.is_none());
        assert!(resp.message.is_none());
    }

    #[test]
    fn envelope_message_is_surfaced_verbatim() {
        let err = RemoteError::from_body(404, br#"{"message":"session not found","success":false}"#);
        assert_eq!(err.user_message(), "session not found");
    }

    #[test]
    fn missing_envelope_message_falls_back() {
        let err = RemoteError::from_body(500, b"<html>oops</html>");
        assert_eq!(err.user_message(), "Request failed with status code 500");
        let err = RemoteError::Transport("connection refused".into());
        assert_eq!(err.user_message(), GENERIC_NETWORK_ERROR);
    }

    #[test]
    fn undecodable_reply_is_not_a_network_error() {
        let err = RemoteError::Decode("expected value at line 1 column 1".into());
        assert_eq!(err.user_message(), UNEXPECTED_RESPONSE);
    }
}
