//! Runs a single collection cycle against the configured services and
//! reports how long it took.

use std::time::Instant;

use cexwatch_backend::config::AppConfig;
use cexwatch_backend::services::CexServices;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = AppConfig::load()?;
    let services = CexServices::from_config(config).await?;

    let start = Instant::now();
    let report = services.aggregator.run_cycle().await?;

    println!(
        "Collected {} tokens ({}/{} venues returned data)",
        report.tokens_processed, report.venues_with_data, report.venues_total
    );
    println!("Total time: {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}
