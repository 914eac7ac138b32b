// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport for the console.

pub mod auth;
pub mod http;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::ConsoleState;

/// Build the axum `Router` with all console routes.
pub fn build_router(state: Arc<ConsoleState>) -> Router {
    Router::new()
        // Health (no auth)
        .route("/health", get(http::health))
        // Token acquisition and status
        .route("/token-issue", post(http::token_issue))
        .route("/token-status", get(http::token_status))
        // Relay
        .route("/proxy", post(http::proxy))
        // Audit log
        .route("/audit-log", get(http::audit_log).delete(http::clear_audit_log))
        // Middleware
        .layer(middleware::from_fn_with_state(state.clone(), auth::auth_layer))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
