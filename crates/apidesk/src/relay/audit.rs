// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Audit records for relayed calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status recorded when no valid token was cached.
pub const STATUS_TOKEN_MISSING: u16 = 401;
/// Status recorded when the relay itself failed.
pub const STATUS_RELAY_FAILED: u16 = 500;

/// One immutable record of a relayed call or its failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: String,
    pub collection: String,
    pub endpoint: String,
    pub method: String,
    pub url: String,
    pub request_body: Option<String>,
    pub response_body: Option<String>,
    pub status_code: u16,
    pub duration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Audit record under construction inside a single relay invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditDraft {
    pub collection: String,
    pub endpoint: String,
    pub method: String,
    pub url: String,
    pub request_body: Option<String>,
    pub response_body: Option<String>,
    pub status_code: u16,
    pub duration: u64,
    pub error: Option<String>,
}

impl AuditDraft {
    /// Mark the draft as failed with `status_code`.
    pub fn fail(&mut self, error: impl Into<String>, status_code: u16) {
        self.error = Some(error.into());
        self.status_code = status_code;
    }

    /// Seal the draft into a stored entry.
    pub fn into_entry(self, created_at: DateTime<Utc>) -> AuditLogEntry {
        AuditLogEntry {
            id: uuid::Uuid::new_v4().to_string(),
            collection: self.collection,
            endpoint: self.endpoint,
            method: self.method,
            url: self.url,
            request_body: self.request_body,
            response_body: self.response_body,
            status_code: self.status_code,
            duration: self.duration,
            error: self.error,
            created_at,
        }
    }
}

/// Filter for reading the audit log back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditQuery {
    pub collection: Option<String>,
    pub limit: usize,
}

impl AuditQuery {
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        self.collection.as_deref().is_none_or(|c| entry.collection == c)
    }
}
