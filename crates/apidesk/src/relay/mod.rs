// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authorized, measured and audited relay of arbitrary downstream calls.
//!
//! Every invocation writes exactly one audit entry, whichever way it exits.
//! A failed audit write is logged and never replaces the caller's result.

pub mod audit;

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::credential::cache::{CachedToken, TokenCache};
use crate::relay::audit::{AuditDraft, STATUS_RELAY_FAILED, STATUS_TOKEN_MISSING};
use crate::store::AuditStore;

/// Audit message for the missing-token path.
pub const TOKEN_MISSING: &str = "Token expired or not found";

/// A fully-formed outbound call plus the labels it is audited under.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayRequest {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: Option<serde_json::Value>,
    pub environment: String,
    pub collection: String,
    pub endpoint: String,
}

/// Result of a downstream call that completed, whatever its status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    pub success: bool,
    pub status_code: u16,
    pub data: serde_json::Value,
    pub headers: BTreeMap<String, String>,
    pub duration: u64,
}

/// Why a relay produced no downstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// No valid cached token for the aliased partition. No call was made.
    TokenUnavailable,
    /// Building, sending or reading the call failed.
    Failed(String),
}

impl RelayError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::TokenUnavailable => STATUS_TOKEN_MISSING,
            Self::Failed(_) => STATUS_RELAY_FAILED,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::TokenUnavailable => format!("{TOKEN_MISSING}. Please refresh the token."),
            Self::Failed(msg) => msg.clone(),
        }
    }
}

impl std::fmt::Display for RelayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for RelayError {}

/// Downstream response as read off the wire.
struct Exchange {
    status: u16,
    success: bool,
    headers: BTreeMap<String, String>,
    data: serde_json::Value,
    raw: String,
    duration: u64,
}

/// The request relay. Cheap to clone; holds no per-call state.
#[derive(Clone)]
pub struct Relay {
    tokens: TokenCache,
    audit: Arc<dyn AuditStore>,
    client: reqwest::Client,
}

impl Relay {
    pub fn new(tokens: TokenCache, audit: Arc<dyn AuditStore>, client: reqwest::Client) -> Self {
        Self { tokens, audit, client }
    }

    /// Authorize, execute, measure and audit one downstream call.
    pub async fn relay(&self, req: RelayRequest) -> Result<RelayResponse, RelayError> {
        let started = Instant::now();
        let mut draft = AuditDraft {
            collection: req.collection.clone(),
            endpoint: req.endpoint.clone(),
            method: req.method.clone(),
            url: req.url.clone(),
            request_body: present_body(req.body.as_ref()).map(|b| b.to_string()),
            ..AuditDraft::default()
        };

        let token = match self.tokens.valid_token(&req.environment).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                draft.fail(TOKEN_MISSING, STATUS_TOKEN_MISSING);
                draft.duration = elapsed_ms(started);
                self.record(draft).await;
                tracing::warn!(
                    environment = %req.environment,
                    endpoint = %req.endpoint,
                    "relay rejected: no valid token"
                );
                return Err(RelayError::TokenUnavailable);
            }
            Err(e) => return Err(self.fail(draft, started, format!("{e:#}")).await),
        };

        match self.execute(&req, &token, started).await {
            Ok(exchange) => {
                draft.status_code = exchange.status;
                draft.response_body = Some(exchange.raw);
                draft.duration = exchange.duration;
                self.record(draft).await;
                tracing::info!(
                    method = %req.method,
                    url = %req.url,
                    status = exchange.status,
                    duration_ms = exchange.duration,
                    "relayed"
                );
                Ok(RelayResponse {
                    success: exchange.success,
                    status_code: exchange.status,
                    data: exchange.data,
                    headers: exchange.headers,
                    duration: exchange.duration,
                })
            }
            Err(e) => Err(self.fail(draft, started, format!("{e:#}")).await),
        }
    }

    async fn fail(&self, mut draft: AuditDraft, started: Instant, message: String) -> RelayError {
        draft.fail(message.clone(), STATUS_RELAY_FAILED);
        draft.duration = elapsed_ms(started);
        tracing::warn!(url = %draft.url, err = %message, "relay failed");
        self.record(draft).await;
        RelayError::Failed(message)
    }

    /// Write the audit entry; failures are diagnostics only.
    async fn record(&self, draft: AuditDraft) {
        let endpoint = draft.endpoint.clone();
        if let Err(e) = self.audit.insert(draft).await {
            tracing::warn!(endpoint = %endpoint, err = %e, "failed to write audit entry");
        }
    }

    async fn execute(
        &self,
        req: &RelayRequest,
        token: &CachedToken,
        started: Instant,
    ) -> anyhow::Result<Exchange> {
        let method = Method::from_bytes(req.method.to_ascii_uppercase().as_bytes())?;
        let headers = outbound_headers(token, &req.headers)?;

        let mut builder = self.client.request(method.clone(), &req.url).headers(headers);
        if let Some(body) = outbound_body(&method, req.body.as_ref()) {
            builder = builder.body(body);
        }

        let resp = builder.send().await?;
        let duration = elapsed_ms(started);
        let status = resp.status();
        let headers = flatten_headers(resp.headers());
        let is_json =
            headers.get("content-type").is_some_and(|ct| ct.contains("application/json"));

        let text = resp.text().await?;
        let (data, raw) = if is_json {
            let data = if text.trim().is_empty() {
                serde_json::Value::Null
            } else {
                serde_json::from_str::<serde_json::Value>(&text)?
            };
            let raw = data.to_string();
            (data, raw)
        } else {
            (serde_json::Value::String(text.clone()), text)
        };

        Ok(Exchange {
            status: status.as_u16(),
            success: status.is_success(),
            headers,
            data,
            raw,
            duration,
        })
    }
}

/// Token and JSON defaults, overridden by caller headers on collision.
pub fn outbound_headers(
    token: &CachedToken,
    extra: &HashMap<String, String>,
) -> anyhow::Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&token.authorization())?);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    for (name, value) in extra {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        headers.insert(name, HeaderValue::from_str(value)?);
    }
    Ok(headers)
}

/// Body to send: strings pass through, anything else is JSON-encoded.
///
/// Only POST, PUT and PATCH carry a body.
pub fn outbound_body(method: &Method, body: Option<&serde_json::Value>) -> Option<String> {
    if !matches!(*method, Method::POST | Method::PUT | Method::PATCH) {
        return None;
    }
    match present_body(body)? {
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// The caller's body, unless it is `null` or an empty string.
fn present_body(body: Option<&serde_json::Value>) -> Option<&serde_json::Value> {
    body.filter(|b| !b.is_null() && b.as_str() != Some(""))
}

/// Collapse a header map to one string per name, joining repeats with `, `.
pub fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut flat: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        match flat.entry(name.as_str().to_owned()) {
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                existing.push_str(", ");
                existing.push_str(&value);
            }
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
        }
    }
    flat
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
