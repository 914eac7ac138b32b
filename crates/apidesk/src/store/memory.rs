// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::credential::cache::CachedToken;
use crate::relay::audit::{AuditDraft, AuditLogEntry, AuditQuery};
use crate::store::{AuditStore, TokenStore};

/// Token map plus insertion-ordered audit log, both behind async locks.
#[derive(Default)]
pub struct MemoryStore {
    tokens: RwLock<HashMap<String, CachedToken>>,
    audit: RwLock<Vec<AuditLogEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from previously persisted data.
    pub fn with_contents(tokens: HashMap<String, CachedToken>, audit: Vec<AuditLogEntry>) -> Self {
        Self { tokens: RwLock::new(tokens), audit: RwLock::new(audit) }
    }

    pub async fn token_count(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn audit_len(&self) -> usize {
        self.audit.read().await.len()
    }

    pub async fn tokens_snapshot(&self) -> HashMap<String, CachedToken> {
        self.tokens.read().await.clone()
    }

    /// Append an already-sealed entry.
    pub async fn push_entry(&self, entry: AuditLogEntry) {
        self.audit.write().await.push(entry);
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn upsert(&self, token: CachedToken) -> anyhow::Result<()> {
        self.tokens.write().await.insert(token.environment.clone(), token);
        Ok(())
    }

    async fn find(&self, environment: &str) -> anyhow::Result<Option<CachedToken>> {
        Ok(self.tokens.read().await.get(environment).cloned())
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn insert(&self, draft: AuditDraft) -> anyhow::Result<AuditLogEntry> {
        let entry = draft.into_entry(Utc::now());
        self.push_entry(entry.clone()).await;
        Ok(entry)
    }

    async fn query(&self, query: &AuditQuery) -> anyhow::Result<Vec<AuditLogEntry>> {
        let audit = self.audit.read().await;
        Ok(audit.iter().rev().filter(|e| query.matches(e)).take(query.limit).cloned().collect())
    }

    async fn clear(&self) -> anyhow::Result<usize> {
        let mut audit = self.audit.write().await;
        let removed = audit.len();
        audit.clear();
        Ok(removed)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
