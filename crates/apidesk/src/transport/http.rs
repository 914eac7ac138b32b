// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the console API.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::credential::cache::TokenInfo;
use crate::credential::flow::TokenFlow;
use crate::credential::CredentialBag;
use crate::environment::KNOWN_ENVIRONMENTS;
use crate::error::ConsoleError;
use crate::relay::audit::{AuditLogEntry, AuditQuery};
use crate::relay::{RelayError, RelayRequest, TOKEN_MISSING};
use crate::state::ConsoleState;
use crate::store::AuditStore;

// -- Request/Response types ---------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub environments: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenIssueRequest {
    pub environment: String,
    #[serde(default)]
    pub credentials: CredentialBag,
}

#[derive(Debug, Serialize)]
pub struct TokenIssueResponse {
    pub success: bool,
    pub token: TokenInfo,
}

#[derive(Debug, Deserialize)]
pub struct TokenStatusQuery {
    #[serde(default)]
    pub environment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenStatusResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuditLogParams {
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub collection: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuditLogResponse {
    pub logs: Vec<AuditLogEntry>,
}

// -- Handlers -----------------------------------------------------------------

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "running".to_owned(),
        environments: KNOWN_ENVIRONMENTS.iter().map(|e| (*e).to_owned()).collect(),
    })
}

/// `POST /token-issue` — run the environment's token flow and cache the result.
pub async fn token_issue(
    State(s): State<Arc<ConsoleState>>,
    body: Result<Json<TokenIssueRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = match body {
        Ok(body) => body,
        Err(e) => return ConsoleError::BadRequest.to_http_response(e.body_text()).into_response(),
    };

    let Some(flow) = TokenFlow::for_environment(&req.environment) else {
        return ConsoleError::BadRequest.to_http_response("Unknown environment").into_response();
    };

    let token = match flow.acquire(&s.http, &req.credentials).await {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(environment = %req.environment, err = %e, "token fetch failed");
            return ConsoleError::TokenServer.to_http_response(format!("{e:#}")).into_response();
        }
    };

    match s.tokens.upsert(&req.environment, &token).await {
        Ok(record) => {
            Json(TokenIssueResponse { success: true, token: record.info() }).into_response()
        }
        Err(e) => {
            tracing::error!(environment = %req.environment, err = %e, "token cache write failed");
            ConsoleError::Internal.to_http_response(format!("{e:#}")).into_response()
        }
    }
}

/// `GET /token-status?environment=<id>` — whether a valid token is cached.
pub async fn token_status(
    State(s): State<Arc<ConsoleState>>,
    Query(q): Query<TokenStatusQuery>,
) -> impl IntoResponse {
    let Some(environment) = q.environment.filter(|e| !e.is_empty()) else {
        return ConsoleError::BadRequest.to_http_response("Environment required").into_response();
    };

    match s.tokens.valid_token(&environment).await {
        Ok(Some(record)) => {
            Json(TokenStatusResponse { valid: true, token: Some(record.info()), message: None })
                .into_response()
        }
        Ok(None) => Json(TokenStatusResponse {
            valid: false,
            token: None,
            message: Some(TOKEN_MISSING.to_owned()),
        })
        .into_response(),
        Err(e) => ConsoleError::Internal.to_http_response(format!("{e:#}")).into_response(),
    }
}

/// `POST /proxy` — relay one call with the cached token.
pub async fn proxy(
    State(s): State<Arc<ConsoleState>>,
    body: Result<Json<RelayRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = match body {
        Ok(body) => body,
        Err(e) => return ConsoleError::BadRequest.to_http_response(e.body_text()).into_response(),
    };

    match s.relay.relay(req).await {
        Ok(resp) => Json(resp).into_response(),
        Err(e @ RelayError::TokenUnavailable) => {
            ConsoleError::Unauthorized.to_http_response(e.message()).into_response()
        }
        Err(e @ RelayError::Failed(_)) => {
            ConsoleError::RelayFailed.to_http_response(e.message()).into_response()
        }
    }
}

/// `GET /audit-log?limit=<n>&collection=<name>` — most recent entries first.
pub async fn audit_log(
    State(s): State<Arc<ConsoleState>>,
    Query(params): Query<AuditLogParams>,
) -> impl IntoResponse {
    let limit = match params.limit.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        None => s.config.audit_default_limit,
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) => n,
            Err(_) => {
                return ConsoleError::BadRequest
                    .to_http_response(format!("invalid limit: {raw}"))
                    .into_response()
            }
        },
    };
    let query = AuditQuery { collection: params.collection.filter(|c| !c.is_empty()), limit };

    match s.audit.query(&query).await {
        Ok(logs) => Json(AuditLogResponse { logs }).into_response(),
        Err(e) => ConsoleError::Internal.to_http_response(format!("{e:#}")).into_response(),
    }
}

/// `DELETE /audit-log` — remove every audit entry.
pub async fn clear_audit_log(State(s): State<Arc<ConsoleState>>) -> impl IntoResponse {
    match s.audit.clear().await {
        Ok(removed) => {
            tracing::info!(removed, "audit log cleared");
            Json(serde_json::json!({
                "success": true,
                "message": "Logs cleared",
                "removed": removed,
            }))
            .into_response()
        }
        Err(e) => ConsoleError::Internal.to_http_response(format!("{e:#}")).into_response(),
    }
}
