// src/bin/estimate_snapshot.rs
//! Usage: estimate_snapshot <test_result.json> [platform_metrics.json]
use anyhow::{anyhow, Context};
use dotenv::dotenv;
use log::info;
use serde_json::json;
use std::fs;
use storefront_opportunity::config::StoreLeadsConfig;
use storefront_opportunity::models::{PlatformMetrics, TestResult};
use storefront_opportunity::services::snapshot::fetch_store_snapshot;
use storefront_opportunity::services::store_leads::StoreLeadsClient;
use storefront_opportunity::services::threat_impact::calculate_threat_impact;

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let test_path = args
        .next()
        .ok_or_else(|| anyhow!("usage: estimate_snapshot <test_result.json> [platform_metrics.json]"))?;
    let platform: Option<PlatformMetrics> = args.next().map(|path| read_json(&path)).transpose()?;
    let test: TestResult = read_json(&test_path)?;

    let client = StoreLeadsClient::new(&StoreLeadsConfig::from_env()?)?;
    let snapshot = fetch_store_snapshot(&client, &test, platform.as_ref()).await?;
    info!(
        "Snapshot for {} built from {} visitors ({})",
        snapshot.store_url, snapshot.metrics.monthly_visitors.value, snapshot.metrics.monthly_visitors.source
    );

    let threats: Vec<_> = test
        .issues
        .iter()
        .map(|issue| calculate_threat_impact(issue, snapshot.metrics.monthly_revenue.value))
        .collect();

    let output = json!({
        "snapshot": snapshot,
        "display": snapshot.opportunity.display(),
        "funnel_rates": snapshot.funnel.stage_rates(),
        "biggest_drop_off": snapshot.funnel.biggest_drop_off(),
        "threats": threats,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
