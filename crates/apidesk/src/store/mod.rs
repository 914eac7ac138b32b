// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable record store for cached tokens and the audit log.
//!
//! The console only needs upsert-by-key and point lookup for tokens, and
//! insert / ordered query / bulk delete for audit entries. [`memory`] keeps
//! everything in process; [`file`] persists the same data under a state
//! directory.

pub mod file;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::credential::cache::CachedToken;
use crate::relay::audit::{AuditDraft, AuditLogEntry, AuditQuery};

/// Token records keyed uniquely by partition.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Replace the whole record for `token.environment`, or create it.
    async fn upsert(&self, token: CachedToken) -> anyhow::Result<()>;

    async fn find(&self, environment: &str) -> anyhow::Result<Option<CachedToken>>;
}

/// Append-only audit log.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn insert(&self, draft: AuditDraft) -> anyhow::Result<AuditLogEntry>;

    /// Matching entries, most recent first, at most `query.limit`.
    async fn query(&self, query: &AuditQuery) -> anyhow::Result<Vec<AuditLogEntry>>;

    /// Remove every entry. Returns how many were removed.
    async fn clear(&self) -> anyhow::Result<usize>;
}

/// Pair of store handles shared by the console.
#[derive(Clone)]
pub struct Stores {
    pub tokens: Arc<dyn TokenStore>,
    pub audit: Arc<dyn AuditStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryStore::new());
        Self { tokens: store.clone(), audit: store }
    }

    /// Open a file-backed store in `dir`, creating it if needed.
    pub fn open(dir: &std::path::Path) -> anyhow::Result<Self> {
        let store = Arc::new(file::FileStore::open(dir)?);
        Ok(Self { tokens: store.clone(), audit: store })
    }
}
