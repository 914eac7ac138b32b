// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use crate::config::ConsoleConfig;
use crate::credential::cache::TokenCache;
use crate::relay::Relay;
use crate::store::{AuditStore, Stores};

/// Shared console state.
///
/// Holds no per-request data; every token fetch and relay call owns its own
/// timer and audit draft.
pub struct ConsoleState {
    pub config: ConsoleConfig,
    pub tokens: TokenCache,
    pub audit: Arc<dyn AuditStore>,
    pub relay: Relay,
    /// Outbound client for token flows and relayed calls, bounded by
    /// `request_timeout_ms`.
    pub http: reqwest::Client,
}

impl ConsoleState {
    pub fn new(config: ConsoleConfig, stores: Stores) -> anyhow::Result<Self> {
        let http = build_http_client(config.request_timeout())?;
        let tokens = TokenCache::new(stores.tokens);
        let relay = Relay::new(tokens.clone(), Arc::clone(&stores.audit), http.clone());
        Ok(Self { config, tokens, audit: stores.audit, relay, http })
    }
}

/// Outbound client with a bounded per-request timeout.
///
/// reqwest is built without a bundled crypto provider, so install ring's
/// before the first client is constructed. Repeat installs are no-ops.
pub fn build_http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    let _ = rustls::crypto::ring::default_provider().install_default();
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}
