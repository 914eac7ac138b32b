// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the apidesk console server.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "apidesk", version, about = "OAuth2 token cache and audited request relay")]
pub struct ConsoleConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "APIDESK_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 9810, env = "APIDESK_PORT")]
    pub port: u16,

    /// Bearer token guarding the console API. If unset, auth is disabled.
    #[arg(long, env = "APIDESK_AUTH_TOKEN")]
    pub auth_token: Option<String>,

    /// Directory for persisted tokens and audit log. In-memory when unset.
    #[arg(long, env = "APIDESK_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Timeout for every outbound HTTP call, in milliseconds.
    #[arg(long, default_value_t = 30_000, env = "APIDESK_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: u64,

    /// Number of audit entries returned when `limit` is omitted.
    #[arg(long, default_value_t = 50, env = "APIDESK_AUDIT_DEFAULT_LIMIT")]
    pub audit_default_limit: usize,
}

impl ConsoleConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 9810,
            auth_token: None,
            state_dir: None,
            request_timeout_ms: 30_000,
            audit_default_limit: 50,
        }
    }
}
