#![forbid(unsafe_code)]

use anyhow::Result;
use whistle_sim::{CampaignConfig, run_campaign};

fn main() -> Result<()> {
    let report = run_campaign(&CampaignConfig::default())?;

    println!(
        "campaign complete: seeds={} passed={} isolated={} first_failure={:?}",
        report.seeds_run, report.seeds_passed, report.isolated_origins, report.first_failure
    );

    Ok(())
}
