// src/services/store_leads.rs
use anyhow::{bail, Context};
use log::{debug, error, info, warn};
use regex::Regex;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use crate::config::StoreLeadsConfig;
use crate::models::NormalizedExternalMetrics;

static SCHEME_OR_WWW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:https?://|www\.)").expect("domain prefix pattern is valid"));

/// Reduces a store URL to a bare lowercase domain, so that
/// `https://Www.Store.com/` and `store.com` look up the same record.
///
/// Prefixes and trailing slashes are stripped until nothing changes, which
/// makes cleaning idempotent.
pub fn clean_domain(domain: &str) -> String {
    let mut cleaned = domain.trim().to_lowercase();
    loop {
        let next = {
            let stripped = SCHEME_OR_WWW.replace(&cleaned, "");
            stripped.trim_end_matches('/').trim().to_string()
        };
        if next == cleaned {
            return cleaned;
        }
        cleaned = next;
    }
}

/// Store Leads domain record as sent over the wire. Every field is optional
/// and loosely typed; [`normalize_response`] is the only place that reads it.
#[derive(Debug, Default, Deserialize)]
pub struct RawDomainRecord {
    #[serde(default)]
    pub estimated_sales_monthly: Option<Value>,
    #[serde(default)]
    pub estimated_traffic_monthly: Option<Value>,
    #[serde(default, alias = "rank")]
    pub global_rank: Option<Value>,
    #[serde(default)]
    pub technologies: Option<Value>,
}

const RECORD_FIELDS: [&str; 5] = [
    "estimated_sales_monthly",
    "estimated_traffic_monthly",
    "global_rank",
    "rank",
    "technologies",
];

/// Reads a response body into a [`RawDomainRecord`]. The API wraps the record
/// in `{"domain": {...}}`; a bare record is accepted too. Anything that is not
/// an object carrying at least one known field is rejected.
fn parse_record_body(body: &str) -> Result<RawDomainRecord, LookupError> {
    let Value::Object(mut fields) = serde_json::from_str::<Value>(body).map_err(LookupError::Parse)? else {
        return Err(LookupError::Shape("body is not a JSON object"));
    };

    if let Some(Value::Object(inner)) = fields.remove("domain") {
        fields = inner;
    }

    if !RECORD_FIELDS.iter().any(|key| fields.contains_key(*key)) {
        return Err(LookupError::Shape("body has no store metrics"));
    }

    serde_json::from_value(Value::Object(fields)).map_err(LookupError::Parse)
}

pub fn normalize_response(raw: RawDomainRecord) -> NormalizedExternalMetrics {
    NormalizedExternalMetrics {
        monthly_revenue_estimate: raw.estimated_sales_monthly.as_ref().and_then(non_negative_number),
        monthly_traffic_estimate: raw
            .estimated_traffic_monthly
            .as_ref()
            .and_then(non_negative_number)
            .map(|traffic| traffic.round() as u64),
        global_rank: raw
            .global_rank
            .as_ref()
            .and_then(non_negative_number)
            .map(|rank| rank.round() as u64)
            .filter(|rank| *rank >= 1),
        technologies: raw.technologies.as_ref().map(technology_names).unwrap_or_default(),
    }
}

fn non_negative_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }?;
    (number.is_finite() && number >= 0.0).then_some(number)
}

fn technology_names(value: &Value) -> BTreeSet<String> {
    let Value::Array(entries) = value else {
        return BTreeSet::new();
    };

    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::Object(fields) => fields.get("name").and_then(Value::as_str),
            Value::String(name) => Some(name.as_str()),
            _ => None,
        })
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug)]
enum LookupError {
    NotFound,
    RateLimited,
    Status(StatusCode),
    Transport(reqwest::Error),
    Parse(serde_json::Error),
    Shape(&'static str),
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LookupError::NotFound => write!(f, "domain not found"),
            LookupError::RateLimited => write!(f, "rate limited"),
            LookupError::Status(status) => write!(f, "unexpected status {}", status),
            LookupError::Transport(e) => write!(f, "request failed: {}", e),
            LookupError::Parse(e) => write!(f, "invalid response body: {}", e),
            LookupError::Shape(reason) => write!(f, "unexpected response shape: {}", reason),
        }
    }
}

/// Client for the Store Leads domain intelligence API.
///
/// Lookups are a single attempt bounded by the configured timeout. Every
/// failure is logged and turned into `None`, since these figures only refine
/// an estimate that works without them.
#[derive(Debug, Clone)]
pub struct StoreLeadsClient {
    http: Client,
    api_key: Option<String>,
    base_url: Url,
}

impl StoreLeadsClient {
    pub fn new(config: &StoreLeadsConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("invalid Store Leads base URL {:?}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            bail!("Store Leads base URL {:?} cannot take a path", config.base_url);
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("storefront_opportunity/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn fetch_and_normalize(&self, domain: &str) -> Option<NormalizedExternalMetrics> {
        let cleaned = clean_domain(domain);
        if cleaned.is_empty() {
            warn!("Skipping Store Leads lookup for empty domain {:?}", domain);
            return None;
        }

        let Some(api_key) = self.api_key.as_deref() else {
            info!("Store Leads not configured, skipping lookup for {}", cleaned);
            return None;
        };

        match self.fetch_record(api_key, &cleaned).await {
            Ok(record) => {
                let metrics = normalize_response(record);
                debug!("Store Leads metrics for {}: {:?}", cleaned, metrics);
                Some(metrics)
            }
            Err(LookupError::NotFound) => {
                info!("Store Leads has no record for {}", cleaned);
                None
            }
            Err(e @ (LookupError::RateLimited | LookupError::Status(_))) => {
                warn!("Store Leads lookup for {} failed: {}", cleaned, e);
                None
            }
            Err(e) => {
                error!("Store Leads lookup for {} failed: {}", cleaned, e);
                None
            }
        }
    }

    fn record_url(&self, domain: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(domain);
        }
        url
    }

    async fn fetch_record(&self, api_key: &str, domain: &str) -> Result<RawDomainRecord, LookupError> {
        let url = self.record_url(domain);
        info!("Fetching Store Leads record from URL: {}", url);

        let response = self
            .http
            .get(url)
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(LookupError::Transport)?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(LookupError::NotFound),
            StatusCode::TOO_MANY_REQUESTS => return Err(LookupError::RateLimited),
            status if !status.is_success() => return Err(LookupError::Status(status)),
            _ => {}
        }

        let body = response.text().await.map_err(LookupError::Transport)?;
        parse_record_body(&body)
    }
}
