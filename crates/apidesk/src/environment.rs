// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mapping from UI-facing environment identifiers to token cache partitions.
//!
//! Several console modules share one authorization domain, so their tokens
//! live under a single partition key. Every lookup or write against the token
//! cache goes through [`partition_key`].

/// Partition for the enterprise REST surfaces (property, workflows, nor1).
pub const OPERA_CLOUD: &str = "opera_cloud";
/// Partition for the distribution surface.
pub const DISTRIBUTION: &str = "distribution";
/// Partition for the analytics storage and data surfaces.
pub const RA_STORAGE: &str = "ra_storage";

/// Every identifier accepted by the token issue endpoint.
pub const KNOWN_ENVIRONMENTS: [&str; 7] =
    [OPERA_CLOUD, "property", "workflows", "nor1", DISTRIBUTION, RA_STORAGE, "ra_data"];

/// Translate a UI-facing identifier into its token cache partition key.
///
/// Unrecognized identifiers pass through unchanged; the cache then simply
/// has no entry for them.
pub fn partition_key(id: &str) -> &str {
    match id {
        "property" | "workflows" | "nor1" => OPERA_CLOUD,
        "ra_data" | "ra_storage" => RA_STORAGE,
        DISTRIBUTION => DISTRIBUTION,
        other => other,
    }
}

#[cfg(test)]
#[path = "environment_tests.rs"]
mod tests;
