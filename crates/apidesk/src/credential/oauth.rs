// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OAuth helper types and the shared token request transport.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize};

/// Standard OAuth2 token response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Some identity servers report `expires_in` as a string.
fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => {
            n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
        }
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// A fully-formed token endpoint call: target, headers, form fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub form: Vec<(&'static str, String)>,
}

impl TokenRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// `Basic base64(id:secret)` authorization header value.
pub fn basic_auth(id: &str, secret: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{id}:{secret}")))
}

/// Join a host with an endpoint path, tolerating a trailing slash on the host.
pub fn endpoint(host: &str, path: &str) -> String {
    format!("{}{path}", host.trim_end_matches('/'))
}

/// POST a form-encoded token request and decode the token response.
///
/// Non-2xx responses fail with the status and raw body. Transport and
/// decoding errors propagate unchanged.
pub async fn send_token_request(
    client: &reqwest::Client,
    request: &TokenRequest,
) -> anyhow::Result<TokenResponse> {
    let mut builder = client.post(&request.url).form(&request.form);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    let resp = builder.send().await?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        tracing::error!(url = %request.url, status, body = %text, "token request rejected");
        anyhow::bail!("Token request failed: {status} - {text}");
    }

    let token: TokenResponse = resp.json().await?;
    Ok(token)
}

#[cfg(test)]
#[path = "oauth_tests.rs"]
mod tests;
