//! Clients for the server under test
//!
//! [`HttpClient`] exposes raw request/response pairs for checks that care
//! about status codes and error bodies. [`ChatClient`] sits on top of it and
//! speaks the chat completions API, including streaming over SSE.

pub mod chat;
pub mod http;
pub mod sse;
pub mod types;

pub use chat::{ChatClient, ChunkStream};
pub use http::{HttpClient, HttpResponse};
pub use types::{ChatRequest, Chunk, Completion};

use serde_json::Value;
use thiserror::Error;

use crate::testing::CheckError;

/// Errors raised by the clients
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
        body: Value,
    },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Stream error: {0}")]
    Stream(String),
}

impl ClientError {
    /// Short category name, used as the fault kind in reports
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Transport { .. } => "http",
            ClientError::Api { .. } => "api",
            ClientError::Decode(_) => "decode",
            ClientError::Stream(_) => "stream",
        }
    }

    /// HTTP status for API errors
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Build an API error from a non-success response body
    ///
    /// Uses `error.message` from an OpenAI-style error object when present,
    /// otherwise the raw body text.
    pub fn from_api_response(status: u16, body_text: &str) -> Self {
        let body: Value = serde_json::from_str(body_text).unwrap_or(Value::Null);
        let message = body
            .pointer("/error/message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| body_text.trim().to_string());
        ClientError::Api {
            status,
            message,
            body,
        }
    }
}

impl From<ClientError> for CheckError {
    fn from(e: ClientError) -> Self {
        CheckError::fault(e.kind(), e)
    }
}
