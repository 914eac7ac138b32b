// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Apidesk: OAuth2 token cache and audited request relay for API testing.

pub mod config;
pub mod credential;
pub mod environment;
pub mod error;
pub mod relay;
pub mod state;
pub mod store;
pub mod transport;
pub mod url_template;

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::ConsoleConfig;
use crate::state::ConsoleState;
use crate::store::Stores;
use crate::transport::build_router;

/// Run the console server until ctrl-c.
pub async fn run(config: ConsoleConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr();

    let stores = match config.state_dir {
        Some(ref dir) => Stores::open(dir)?,
        None => Stores::in_memory(),
    };
    let persistent = config.state_dir.is_some();
    let state = Arc::new(ConsoleState::new(config, stores)?);

    if persistent {
        tracing::info!("apidesk listening on {addr} (persistent store)");
    } else {
        tracing::info!("apidesk listening on {addr} (in-memory store)");
    }
    let router = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(err = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
