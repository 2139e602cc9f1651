//! Plain HTTP access to the server under test
//!
//! Status codes are data here: a 4xx or 5xx response is returned like any
//! other so checks can assert on it.

use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::ClientError;
use crate::testing::check::HasStatus;

/// A fully-read HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpResponse {
    /// Parse the body as JSON
    pub fn json(&self) -> Result<Value, ClientError> {
        serde_json::from_str(&self.body).map_err(|e| {
            ClientError::Decode(format!("HTTP {} body is not JSON: {}", self.status, e))
        })
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl HasStatus for HttpResponse {
    fn status_code(&self) -> u16 {
        self.status
    }
}

/// HTTP client bound to a base URL
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    /// Create a client; `timeout` bounds each request
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent())
            .build()
            .map_err(|source| ClientError::Transport {
                url: base_url.to_string(),
                source,
            })?;

        Ok(Self {
            inner,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path such as `/health`
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> Result<HttpResponse, ClientError> {
        self.send(Method::GET, path, None::<&Value>).await
    }

    /// POST with an empty body
    pub async fn post(&self, path: &str) -> Result<HttpResponse, ClientError> {
        self.send(Method::POST, path, None::<&Value>).await
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<HttpResponse, ClientError> {
        self.send(Method::POST, path, Some(body)).await
    }

    async fn send<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&T>,
    ) -> Result<HttpResponse, ClientError> {
        let response = self.request(method, path, body).await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|source| ClientError::Transport { url, source })?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    /// Send a request and return the response with its body unread
    pub(crate) async fn request<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&T>,
    ) -> Result<reqwest::Response, ClientError> {
        let url = self.url(path);
        debug!(%method, %url, "Sending request");

        let mut builder = self.inner.request(method, &url);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        builder
            .send()
            .await
            .map_err(|source| ClientError::Transport { url, source })
    }
}

/// `compat-check/<version> (<os> <version>; <arch>)`
pub fn user_agent() -> String {
    let info = os_info::get();
    format!(
        "compat-check/{} ({} {}; {})",
        env!("CARGO_PKG_VERSION"),
        sanitize_header_value(&info.os_type().to_string()),
        sanitize_header_value(&info.version().to_string()),
        sanitize_header_value(std::env::consts::ARCH),
    )
}

/// Replace characters that are awkward in a header token with `_`
fn sanitize_header_value(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_header_value() {
        assert_eq!(sanitize_header_value("Mac OS"), "Mac_OS");
        assert_eq!(sanitize_header_value("22.04.1-lts/x"), "22.04.1-lts/x");
        assert_eq!(sanitize_header_value("ü"), "_");
    }

    #[test]
    fn test_user_agent_shape() {
        let ua = user_agent();
        assert!(ua.starts_with("compat-check/"));
        assert!(ua.ends_with(&format!("; {})", std::env::consts::ARCH)));
        assert!(ua.is_ascii());
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = HttpClient::new("http://127.0.0.1:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("/health"), "http://127.0.0.1:8080/health");
    }

    #[test]
    fn test_response_json() {
        let response = HttpResponse {
            status: 400,
            headers: HeaderMap::new(),
            body: r#"{"error":{"message":"model is required"}}"#.to_string(),
        };
        assert!(!response.is_success());
        assert_eq!(
            response.json().unwrap()["error"]["message"],
            "model is required"
        );
        assert_eq!(response.status_code(), 400);
    }
}
