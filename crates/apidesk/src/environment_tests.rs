// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn enterprise_modules_share_opera_cloud() -> anyhow::Result<()> {
    for id in ["property", "workflows", "nor1", "opera_cloud"] {
        assert_eq!(partition_key(id), OPERA_CLOUD, "{id}");
    }
    Ok(())
}

#[test]
fn analytics_modules_share_ra_storage() -> anyhow::Result<()> {
    assert_eq!(partition_key("ra_data"), RA_STORAGE);
    assert_eq!(partition_key("ra_storage"), RA_STORAGE);
    Ok(())
}

#[test]
fn distribution_maps_to_itself() -> anyhow::Result<()> {
    assert_eq!(partition_key("distribution"), DISTRIBUTION);
    Ok(())
}

#[test]
fn unknown_identifier_passes_through() -> anyhow::Result<()> {
    assert_eq!(partition_key("sandbox"), "sandbox");
    assert_eq!(partition_key(""), "");
    Ok(())
}

#[test]
fn every_known_environment_lands_in_a_partition() -> anyhow::Result<()> {
    for id in KNOWN_ENVIRONMENTS {
        assert!(
            [OPERA_CLOUD, DISTRIBUTION, RA_STORAGE].contains(&partition_key(id)),
            "{id} has no partition"
        );
    }
    Ok(())
}
