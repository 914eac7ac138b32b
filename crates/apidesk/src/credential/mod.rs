// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential handling: bag resolution, OAuth2 token flows, token cache.
//!
//! Operators paste credentials exported from several generations of tooling,
//! so the same field shows up as `ClientId`, `CLIENT_ID` or `client_id`.
//! [`resolve`] hides that from the flows.

pub mod cache;
pub mod flow;
pub mod oauth;

use std::collections::HashMap;

/// Free-form credential map as submitted by the operator.
pub type CredentialBag = HashMap<String, String>;

/// Return the value of the first candidate key present and non-empty in `bag`.
///
/// Absence yields an empty string rather than an error: the flow still runs
/// and the authorization server reports what is missing.
pub fn resolve(bag: &CredentialBag, candidates: &[&str]) -> String {
    candidates
        .iter()
        .filter_map(|key| bag.get(*key))
        .find(|value| !value.is_empty())
        .cloned()
        .unwrap_or_default()
}

/// Mask an identifier for logging: first 8 chars, then `***`.
pub fn mask_prefix(value: &str) -> String {
    if value.is_empty() {
        return "MISSING".to_owned();
    }
    let prefix: String = value.chars().take(8).collect();
    format!("{prefix}***")
}

/// Mask a secret for logging without revealing any of it.
pub fn mask_secret(value: &str) -> &'static str {
    if value.is_empty() {
        "MISSING"
    } else {
        "***"
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
