// src/bin/test_store_leads.rs
use anyhow::anyhow;
use dotenv::dotenv;
use log::{info, warn};
use storefront_opportunity::config::StoreLeadsConfig;
use storefront_opportunity::services::store_leads::{clean_domain, StoreLeadsClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let domain = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow!("usage: test_store_leads <domain>"))?;

    let config = StoreLeadsConfig::from_env()?;
    let client = StoreLeadsClient::new(&config)?;

    info!("Looking up {} (cleaned: {})", domain, clean_domain(&domain));

    match client.fetch_and_normalize(&domain).await {
        Some(metrics) => {
            info!("Shopify detected: {}", metrics.is_shopify());
            println!("{}", serde_json::to_string_pretty(&metrics)?);
        }
        None => warn!("No external metrics available for {}", domain),
    }

    Ok(())
}
