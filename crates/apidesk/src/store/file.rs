// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed store: `tokens.json` plus an append-only `audit.jsonl`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::credential::cache::CachedToken;
use crate::relay::audit::{AuditDraft, AuditLogEntry, AuditQuery};
use crate::store::memory::MemoryStore;
use crate::store::{AuditStore, TokenStore};

const TOKENS_FILE: &str = "tokens.json";
const AUDIT_FILE: &str = "audit.jsonl";
const TOKENS_TMP_FILE: &str = "tokens.json.tmp";

/// Persistent store mirroring its files in a [`MemoryStore`] for reads.
pub struct FileStore {
    dir: PathBuf,
    inner: MemoryStore,
    /// Serializes file writes; reads go straight to `inner`. Every write path
    /// holds it, so a single fixed temp file is enough for `tokens.json`.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (or create) the store in `dir` and load existing contents.
    pub fn open(dir: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let tokens = load_tokens(&dir.join(TOKENS_FILE))?;
        let audit = load_audit(&dir.join(AUDIT_FILE))?;
        tracing::info!(
            dir = %dir.display(),
            tokens = tokens.len(),
            audit_entries = audit.len(),
            "opened file store"
        );
        Ok(Self {
            dir: dir.to_path_buf(),
            inner: MemoryStore::with_contents(tokens, audit),
            write_lock: Mutex::new(()),
        })
    }

    fn tokens_path(&self) -> PathBuf {
        self.dir.join(TOKENS_FILE)
    }

    fn audit_path(&self) -> PathBuf {
        self.dir.join(AUDIT_FILE)
    }
}

#[async_trait]
impl TokenStore for FileStore {
    async fn upsert(&self, token: CachedToken) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut snapshot = self.inner.tokens_snapshot().await;
        snapshot.insert(token.environment.clone(), token.clone());
        save_atomic(&self.tokens_path(), &self.dir.join(TOKENS_TMP_FILE), &snapshot).await?;
        TokenStore::upsert(&self.inner, token).await
    }

    async fn find(&self, environment: &str) -> anyhow::Result<Option<CachedToken>> {
        self.inner.find(environment).await
    }
}

#[async_trait]
impl AuditStore for FileStore {
    async fn insert(&self, draft: AuditDraft) -> anyhow::Result<AuditLogEntry> {
        let _guard = self.write_lock.lock().await;
        let entry = draft.into_entry(Utc::now());
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.audit_path())
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        self.inner.push_entry(entry.clone()).await;
        Ok(entry)
    }

    async fn query(&self, query: &AuditQuery) -> anyhow::Result<Vec<AuditLogEntry>> {
        self.inner.query(query).await
    }

    async fn clear(&self) -> anyhow::Result<usize> {
        let _guard = self.write_lock.lock().await;
        tokio::fs::write(self.audit_path(), b"").await?;
        self.inner.clear().await
    }
}

fn load_tokens(path: &Path) -> anyhow::Result<HashMap<String, CachedToken>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let contents = std::fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(HashMap::new());
    }
    Ok(serde_json::from_str(&contents)?)
}

fn load_audit(path: &Path) -> anyhow::Result<Vec<AuditLogEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = std::fs::read_to_string(path)?;
    let mut entries = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<AuditLogEntry>(line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!(line = idx + 1, err = %e, "skipping malformed audit line");
            }
        }
    }
    Ok(entries)
}

/// Write JSON to `path` atomically (write `tmp` + rename).
///
/// Callers must hold the store's write lock.
async fn save_atomic(path: &Path, tmp: &Path, value: &impl serde::Serialize) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(tmp, json).await?;
    tokio::fs::rename(tmp, path).await?;
    Ok(())
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
