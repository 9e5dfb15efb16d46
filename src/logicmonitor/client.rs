// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, trace, warn};

use super::auth::Credentials;
use super::endpoints::{self, ResourceRequest};
use crate::config::PluginSettings;

/// Timeout for connecting to the REST API
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for a whole request, including reading the body
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// REST root, `{}` is the company (account) name
const ROOT_URL: &str = "https://{company}.logicmonitor.com/santaba/rest/";

pub const INVALID_COMPANY_NAME: &str = "Invalid company name configured";
pub const NETWORK_ERROR: &str = "Network Error";
pub const CONNECTION_TIMEOUT: &str = "Connection Timeout, please try again";
pub const SERVICE_UNAVAILABLE: &str = "Service Temporarily Unavailable";
pub const RATE_LIMIT_EXCEEDED: &str = "rate limit exceeded";
pub const AUTH_SUCCESS: &str = "Authentication Success";

/// Uniform failure shape returned by every transport call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub status: String,
    pub message: String,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ErrorEnvelope {}

/// One outbound GET per call; failures come back as [`ErrorEnvelope`], never panic
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: &ResourceRequest) -> Result<Value, ErrorEnvelope>;
}

/// HTTP client for the LogicMonitor REST API
pub struct SantabaClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl SantabaClient {
    /// Create a client from plugin settings (no I/O)
    pub fn new(settings: &PluginSettings) -> Result<Self> {
        if settings.path.trim().is_empty() {
            return Err(anyhow!("Company name not entered"));
        }
        let base_url = ROOT_URL.replace("{company}", settings.path.trim());
        Self::with_base_url(settings, base_url)
    }

    /// Create a client against an explicit REST root (proxies, on-prem collectors)
    pub fn with_base_url(settings: &PluginSettings, base_url: impl Into<String>) -> Result<Self> {
        let credentials = settings.credentials()?;
        let user_agent = format!("LM-Grafana-{}:{}", settings.path, settings.version);

        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(READ_TIMEOUT)
            .danger_accept_invalid_certs(settings.skip_tls_verify)
            .user_agent(user_agent)
            .build()
            .context("Failed to build HTTP client")?;

        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }
}

#[async_trait]
impl Transport for SantabaClient {
    async fn get(&self, request: &ResourceRequest) -> Result<Value, ErrorEnvelope> {
        let url = format!("{}{}", self.base_url, request.path);
        let authorization = self
            .credentials
            .authorization(&request.resource_path())
            .map_err(|e| ErrorEnvelope::new(e.to_string()))?;

        let mut builder = self
            .http
            .get(&url)
            .query(&request.query)
            .header(AUTHORIZATION, authorization);
        if request.kind.is_autocomplete() {
            builder = builder.header("x-version", "3");
        }

        debug!(kind = %request.kind, path = %request.path, "Sending request");
        trace!(request = %request, "Full request");

        let response = builder.send().await.map_err(|e| {
            let envelope = map_transport_error(&e);
            warn!(kind = %request.kind, error = %error_chain(&e), "Request failed");
            envelope
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            warn!(kind = %request.kind, error = %e, "Failed to read response body");
            ErrorEnvelope::new(format!("error reading response body: {}", e))
        })?;

        if !status.is_success() {
            let envelope = map_status_error(status.as_u16(), status.canonical_reason(), &body);
            warn!(
                kind = %request.kind,
                status = status.as_u16(),
                message = %envelope.message,
                "API returned an error"
            );
            return Err(envelope);
        }

        // A body that is not JSON is treated as an empty listing
        Ok(serde_json::from_str(&body).unwrap_or_else(|e| {
            debug!(kind = %request.kind, error = %e, "Response body is not JSON");
            Value::Null
        }))
    }
}

/// Render an error with all of its sources
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

/// Map a connection-level failure to a user-facing message
fn map_transport_error(err: &reqwest::Error) -> ErrorEnvelope {
    if err.is_timeout() {
        return ErrorEnvelope::new(CONNECTION_TIMEOUT);
    }
    let chain = error_chain(err);
    if err.is_connect() {
        return ErrorEnvelope::new(classify_connect_error(&chain));
    }
    ErrorEnvelope::new(chain)
}

/// Unknown DNS name means a mistyped company name
fn classify_connect_error(chain: &str) -> &'static str {
    let lower = chain.to_lowercase();
    if lower.contains("no such host")
        || lower.contains("dns error")
        || lower.contains("failed to lookup address")
    {
        INVALID_COMPANY_NAME
    } else {
        NETWORK_ERROR
    }
}

/// Map a non-2xx answer to a user-facing message
pub fn map_status_error(status: u16, reason: Option<&str>, body: &str) -> ErrorEnvelope {
    match status {
        503 => return ErrorEnvelope::new(SERVICE_UNAVAILABLE),
        429 => return ErrorEnvelope::new(RATE_LIMIT_EXCEEDED),
        _ => {}
    }

    let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let field = |key: &str| {
        parsed
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let message = if let Some(errmsg) = field("errmsg") {
        errmsg
    } else if let Some(message) = field("message") {
        if status == 502 {
            format!("{}: Host not reachable", message)
        } else {
            message
        }
    } else if let Some(reason) = reason {
        reason.to_string()
    } else if let Some(message) = field("errorMessage") {
        message
    } else {
        format!("Unknown error occurred (status {})", status)
    };

    ErrorEnvelope::new(message)
}

/// Verify credentials with the smallest authenticated call
pub async fn health_check(transport: &dyn Transport) -> Result<&'static str, ErrorEnvelope> {
    let body = transport.get(&endpoints::health_check()).await?;
    match body.get("errmsg").and_then(Value::as_str) {
        Some(errmsg) if !errmsg.is_empty() && errmsg != "OK" => Err(ErrorEnvelope::new(errmsg)),
        _ => Ok(AUTH_SUCCESS),
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockTransport;
    use super::*;
    use crate::logicmonitor::endpoints::RequestKind;
    use serde_json::json;

    #[test]
    fn test_envelope_shape() {
        let envelope = ErrorEnvelope::new("boom");
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json, json!({"status": "error", "message": "boom"}));
        assert_eq!(envelope.to_string(), "boom");
    }

    #[test]
    fn test_status_503_and_429() {
        assert_eq!(map_status_error(503, Some("x"), "").message, SERVICE_UNAVAILABLE);
        assert_eq!(map_status_error(429, Some("x"), "").message, RATE_LIMIT_EXCEEDED);
    }

    #[test]
    fn test_status_errmsg_wins() {
        let body = r#"{"errmsg": "Authentication failed", "message": "other"}"#;
        assert_eq!(
            map_status_error(401, Some("Unauthorized"), body).message,
            "Authentication failed"
        );
    }

    #[test]
    fn test_status_502_message_suffix() {
        let body = r#"{"message": "Bad gateway"}"#;
        assert_eq!(
            map_status_error(502, Some("Bad Gateway"), body).message,
            "Bad gateway: Host not reachable"
        );
    }

    #[test]
    fn test_status_falls_back_to_reason_then_error_message() {
        assert_eq!(map_status_error(404, Some("Not Found"), "").message, "Not Found");
        assert_eq!(
            map_status_error(499, None, r#"{"errorMessage": "odd"}"#).message,
            "odd"
        );
        assert_eq!(
            map_status_error(499, None, "").message,
            "Unknown error occurred (status 499)"
        );
    }

    #[test]
    fn test_classify_connect_error() {
        assert_eq!(
            classify_connect_error("error sending request: dns error: failed to lookup address"),
            INVALID_COMPANY_NAME
        );
        assert_eq!(classify_connect_error("connection refused"), NETWORK_ERROR);
    }

    #[test]
    fn test_error_chain_renders_sources() {
        let inner = std::io::Error::other("root cause");
        let outer = anyhow::Error::new(inner).context("outer");
        let chain = error_chain(outer.as_ref());
        assert!(chain.contains("outer"));
        assert!(chain.contains("root cause"));
    }

    #[test]
    fn test_client_requires_company() {
        let settings = PluginSettings {
            is_bearer_enabled: true,
            bearer_token: Some("t".to_string()),
            ..Default::default()
        };
        assert!(SantabaClient::new(&settings).is_err());
    }

    #[test]
    fn test_client_base_url_gets_trailing_slash() {
        let settings = PluginSettings {
            path: "acme".to_string(),
            is_bearer_enabled: true,
            bearer_token: Some("t".to_string()),
            ..Default::default()
        };
        let client = SantabaClient::with_base_url(&settings, "http://localhost:8080/rest").unwrap();
        assert_eq!(client.base_url, "http://localhost:8080/rest/");

        let client = SantabaClient::new(&settings).unwrap();
        assert_eq!(client.base_url, "https://acme.logicmonitor.com/santaba/rest/");
    }

    #[tokio::test]
    async fn test_health_check_success() {
        let transport = MockTransport::new();
        transport.respond(RequestKind::HealthCheck, json!({"errmsg": "OK", "status": 200}));
        assert_eq!(health_check(&transport).await, Ok(AUTH_SUCCESS));
    }

    #[tokio::test]
    async fn test_health_check_reports_errmsg() {
        let transport = MockTransport::new();
        transport.respond(
            RequestKind::HealthCheck,
            json!({"errmsg": "Authentication failed", "status": 1401}),
        );
        let err = health_check(&transport).await.unwrap_err();
        assert_eq!(err.message, "Authentication failed");
    }

    #[tokio::test]
    async fn test_health_check_transport_failure() {
        let transport = MockTransport::new();
        transport.fail(RequestKind::HealthCheck, NETWORK_ERROR);
        let err = health_check(&transport).await.unwrap_err();
        assert_eq!(err.status, "error");
        assert_eq!(err.message, NETWORK_ERROR);
    }
}
