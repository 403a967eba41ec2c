//! Enabled-region discovery

use cloudsweep_checks::list_at;
use cloudsweep_core::{CallParams, CloudSession, CloudsweepError, Region, Result};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::debug;

/// Opt-in states of regions usable without further enablement
pub const USABLE_OPT_IN_STATES: [&str; 2] = ["opted-in", "opt-in-not-required"];

const PERMISSION_HINT: &str =
    "check that the access key is valid and allowed to call ec2:DescribeRegions";

/// List the regions enabled for the session's account, sorted.
///
/// Any failure here is fatal for the account: there is no partial scan without
/// a region set.
pub fn discover_regions(session: &dyn CloudSession, anchor_region: &str) -> Result<Vec<Region>> {
    let fail = |e: CloudsweepError| CloudsweepError::RegionDiscovery(format!("{} ({})", e, PERMISSION_HINT));

    let client = session.client("ec2", anchor_region).map_err(fail)?;
    let params = CallParams::new().filter("opt-in-status", USABLE_OPT_IN_STATES);
    let response = client.invoke("describe_regions", &params).map_err(fail)?;

    let regions: BTreeSet<Region> = list_at(&response, "Regions")
        .map_err(fail)?
        .iter()
        .filter_map(|r| r.get("RegionName").and_then(Value::as_str))
        .map(str::to_string)
        .collect();

    if regions.is_empty() {
        return Err(CloudsweepError::RegionDiscovery(format!(
            "no enabled regions returned ({})",
            PERMISSION_HINT
        )));
    }

    debug!("Discovered {} enabled regions", regions.len());
    Ok(regions.into_iter().collect())
}
