// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token cache: one bearer token per partition, validity checked on read.

use std::sync::Arc;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::credential::oauth::TokenResponse;
use crate::environment::partition_key;
use crate::store::TokenStore;

/// Lifetime assumed when the authorization server omits `expires_in`.
pub const DEFAULT_EXPIRES_IN: u64 = 3600;

/// The most recent token for a partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedToken {
    pub environment: String,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    /// Absolute expiry. Authoritative for validity, not `expires_in`.
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl CachedToken {
    /// Build a record from a token response issued at `now`.
    pub fn from_response(environment: &str, token: &TokenResponse, now: DateTime<Utc>) -> Self {
        let expires_in = token.expires_in.filter(|s| *s > 0).unwrap_or(DEFAULT_EXPIRES_IN);
        let seconds = i64::try_from(expires_in).unwrap_or(i64::MAX);
        let expires_at = now
            .checked_add_signed(Duration::try_seconds(seconds).unwrap_or(Duration::MAX))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            environment: environment.to_owned(),
            access_token: token.access_token.clone(),
            token_type: token
                .token_type
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Bearer".to_owned()),
            expires_in,
            expires_at,
            scope: token.scope.clone().filter(|s| !s.is_empty()),
        }
    }

    /// Valid through the expiry instant itself; expired only once `now` is past it.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// `Authorization` header value for relayed calls.
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    /// Operator-facing view with an RFC 3339 millisecond expiry.
    pub fn info(&self) -> TokenInfo {
        TokenInfo {
            access_token: self.access_token.clone(),
            token_type: self.token_type.clone(),
            expires_in: self.expires_in,
            expires_at: self.expires_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            environment: self.environment.clone(),
        }
    }
}

/// True iff a record exists and has not expired at `now`.
pub fn is_valid(record: Option<&CachedToken>, now: DateTime<Utc>) -> bool {
    record.is_some_and(|token| token.is_valid_at(now))
}

/// Token summary returned by the token endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub expires_at: String,
    pub environment: String,
}

/// Partitioned token cache over a [`TokenStore`].
///
/// All methods accept UI-facing identifiers and alias them through
/// [`partition_key`], so writers and readers always agree on the key.
#[derive(Clone)]
pub struct TokenCache {
    store: Arc<dyn TokenStore>,
}

impl TokenCache {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Write-or-replace the token for the identifier's partition.
    pub async fn upsert(
        &self,
        environment: &str,
        token: &TokenResponse,
    ) -> anyhow::Result<CachedToken> {
        self.upsert_at(environment, token, Utc::now()).await
    }

    pub async fn upsert_at(
        &self,
        environment: &str,
        token: &TokenResponse,
        now: DateTime<Utc>,
    ) -> anyhow::Result<CachedToken> {
        let record = CachedToken::from_response(partition_key(environment), token, now);
        self.store.upsert(record.clone()).await?;
        tracing::info!(
            environment = %record.environment,
            expires_at = %record.expires_at,
            "token cached"
        );
        Ok(record)
    }

    /// Raw record for the identifier's partition, expired or not.
    pub async fn get(&self, environment: &str) -> anyhow::Result<Option<CachedToken>> {
        self.store.find(partition_key(environment)).await
    }

    /// The record for the identifier's partition if it is still valid.
    pub async fn valid_token(&self, environment: &str) -> anyhow::Result<Option<CachedToken>> {
        self.valid_token_at(environment, Utc::now()).await
    }

    pub async fn valid_token_at(
        &self,
        environment: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<CachedToken>> {
        let record = self.get(environment).await?;
        Ok(record.filter(|token| token.is_valid_at(now)))
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
