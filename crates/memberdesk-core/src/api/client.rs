//! API client for communicating with the membership backend.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! API requests against the pending-change, member and dashboard endpoints.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::{ChangeKind, Decision, PendingChangeRecord, SystemHealth};
use crate::workflow::ChangeBackend;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

const MEMBER_PATH: &str = "member/get_member";
const UPDATE_MEMBER_PATH: &str = "member/update_member";
const SYSTEM_HEALTH_PATH: &str = "dashboard/system_health";

/// API client for the membership backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Arc<str>,
    token: Option<Arc<String>>,
    initial_backoff: Duration,
}

impl ApiClient {
    /// Create a new API client for the given base URL
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim().trim_end_matches('/')),
            token: None,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    /// Create a client from configuration, carrying its token if one is set
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut client = Self::new(config.backend_url()?)?;
        if let Some(ref token) = config.api_token {
            client.set_token(token.clone());
        }
        Ok(client)
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(Arc::new(token));
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: reqwest::Response) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Send a request, retrying with exponential backoff while rate limited.
    async fn execute<T, F>(&self, method: &str, url: &str, build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn() -> Result<RequestBuilder>,
    {
        let mut retries = 0;

        loop {
            let response = build()?
                .send()
                .await
                .map_err(ApiError::NetworkError)
                .with_context(|| format!("Failed to send {} request to {}", method, url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    let text = response
                        .text()
                        .await
                        .with_context(|| format!("Failed to read response body from {}", url))?;
                    return parse_body(&text)
                        .with_context(|| format!("Failed to parse JSON response from {}", url));
                }
                None => {
                    retries += 1;
                    let Some(backoff) = rate_limit_backoff(self.initial_backoff, retries) else {
                        return Err(ApiError::RateLimited.into());
                    };
                    warn!(url = url, retry = retries, backoff_ms = backoff.as_millis() as u64, "Rate limited, backing off");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.execute("GET", url, || Ok(self.client.get(url).headers(self.auth_headers()?)))
            .await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, url: &str, body: &B) -> Result<T> {
        self.execute("POST", url, || {
            Ok(self.client.post(url).headers(self.auth_headers()?).json(body))
        })
        .await
    }

    // ===== Pending Changes =====

    /// Fetch every pending-change record of one family
    pub async fn fetch_pending_changes(&self, kind: ChangeKind) -> Result<Vec<PendingChangeRecord>> {
        let url = self.endpoint(kind.fetch_path());
        let body: Value = self.get(&url).await?;
        let records = parse_pending_response(kind, body)?;
        debug!(kind = %kind, count = records.len(), "Pending changes fetched");
        Ok(records)
    }

    /// Submit an approve or decline decision for one pending change
    pub async fn submit_decision(&self, kind: ChangeKind, decision: &Decision) -> Result<()> {
        let url = self.endpoint(kind.decision_path());
        let body = decision.to_request_body(kind);
        let _: Value = self
            .post(&url, &body)
            .await
            .with_context(|| format!("Failed to submit decision for {} change {}", kind, decision.id))?;
        info!(kind = %kind, id = %decision.id, action = ?decision.action, "Decision submitted");
        Ok(())
    }

    // ===== Member Records =====

    /// Load a member record, used as the original snapshot for editing
    pub async fn fetch_member(&self, membership_id: &str) -> Result<Value> {
        let url = self.endpoint(&format!("{}/{}", MEMBER_PATH, membership_id));
        let body: Value = self.get(&url).await?;
        unwrap_data(body).ok_or_else(|| {
            ApiError::InvalidResponse(format!("member {} response held no record", membership_id)).into()
        })
    }

    /// Send a partial member patch and return the updated record
    pub async fn update_member(&self, patch: &Map<String, Value>) -> Result<Value> {
        let url = self.endpoint(UPDATE_MEMBER_PATH);
        let body: Value = self.post(&url, patch).await.context("Failed to update member")?;
        info!(fields = patch.len(), "Member patch submitted");
        Ok(unwrap_data(body).unwrap_or(Value::Null))
    }

    // ===== Dashboard =====

    pub async fn fetch_system_health(&self) -> Result<SystemHealth> {
        let url = self.endpoint(SYSTEM_HEALTH_PATH);
        let body: Value = self.get(&url).await?;
        let health = unwrap_data(body).unwrap_or(Value::Null);
        serde_json::from_value(health).context("Failed to parse system health response")
    }
}

impl ChangeBackend for ApiClient {
    async fn fetch_pending(&self, kind: ChangeKind) -> Result<Vec<PendingChangeRecord>> {
        self.fetch_pending_changes(kind).await
    }

    async fn submit_decision(&self, kind: ChangeKind, decision: &Decision) -> Result<()> {
        ApiClient::submit_decision(self, kind, decision).await
    }

    async fn fetch_member(&self, membership_id: &str) -> Result<Value> {
        ApiClient::fetch_member(self, membership_id).await
    }

    async fn update_member(&self, patch: &Map<String, Value>) -> Result<Value> {
        ApiClient::update_member(self, patch).await
    }

    async fn fetch_system_health(&self) -> Result<SystemHealth> {
        ApiClient::fetch_system_health(self).await
    }
}

/// Delay before retry `retry` (1-based) of a rate-limited request, doubling
/// each time. None once the retries are used up.
fn rate_limit_backoff(initial: Duration, retry: u32) -> Option<Duration> {
    (1..=MAX_RATE_LIMIT_RETRIES)
        .contains(&retry)
        .then(|| initial * 2u32.pow(retry - 1))
}

// ============================================================================
// Response parsing
// ============================================================================

/// Parse a body that may be empty; an empty 200 reads as JSON null
fn parse_body<T: DeserializeOwned>(text: &str) -> serde_json::Result<T> {
    if text.trim().is_empty() {
        serde_json::from_str("null")
    } else {
        serde_json::from_str(text)
    }
}

/// Unwrap a `{ "data": ... }` envelope if present; null bodies yield None
fn unwrap_data(body: Value) -> Option<Value> {
    match body {
        Value::Null => None,
        Value::Object(mut map) if map.contains_key("data") => match map.remove("data") {
            Some(Value::Null) | None => None,
            data => data,
        },
        other => Some(other),
    }
}

/// Pull the record list out of a pending-change response.
///
/// Each family wraps its list differently; a bare array is accepted for all of
/// them. Records that fail to parse are skipped with a warning so one bad row
/// does not hide the rest of the queue.
fn parse_pending_response(kind: ChangeKind, body: Value) -> Result<Vec<PendingChangeRecord>> {
    let list = match (body, kind.envelope_key()) {
        (Value::Array(items), _) => items,
        (Value::Object(mut map), None) if map.get("data").is_some_and(Value::is_array) => {
            match map.remove("data") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            }
        }
        (Value::Object(mut map), Some(key)) => match map.remove(key) {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => {
                debug!(kind = %kind, envelope = key, "Response held no pending changes");
                Vec::new()
            }
            Some(other) => {
                return Err(ApiError::InvalidResponse(format!(
                    "{} envelope '{}' is not a list: {}",
                    kind, key, other
                ))
                .into())
            }
        },
        (Value::Null, _) => Vec::new(),
        (other, _) => {
            return Err(ApiError::InvalidResponse(format!(
                "unexpected {} pending-change response: {}",
                kind,
                crate::utils::truncate_string(&other.to_string(), 200)
            ))
            .into())
        }
    };

    let mut records = Vec::with_capacity(list.len());
    for item in list {
        match serde_json::from_value::<PendingChangeRecord>(item) {
            Ok(record) => records.push(record),
            Err(e) => warn!(kind = %kind, error = %e, "Skipping malformed pending change"),
        }
    }
    Ok(records)
}
