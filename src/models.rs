// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::FunnelError;

/// Reference conversion figures for one merchandise category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryBenchmark {
    pub category: &'static str,
    pub avg_conversion_rate: f64,
    pub avg_order_value: f64,
    pub top_performer_conversion_rate: f64,
}

/// Store intelligence figures after cleaning the third-party payload.
/// Unknown values are `None`, never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedExternalMetrics {
    pub monthly_revenue_estimate: Option<f64>,
    pub monthly_traffic_estimate: Option<u64>,
    pub global_rank: Option<u64>,
    pub technologies: BTreeSet<String>,
}

impl NormalizedExternalMetrics {
    pub fn uses_technology(&self, name: &str) -> bool {
        self.technologies.iter().any(|t| t.eq_ignore_ascii_case(name))
    }

    pub fn is_shopify(&self) -> bool {
        self.uses_technology("shopify")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelStage {
    Cart,
    Checkout,
    Purchase,
}

impl fmt::Display for FunnelStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            FunnelStage::Cart => "add to cart",
            FunnelStage::Checkout => "reach checkout",
            FunnelStage::Purchase => "purchase",
        };
        write!(f, "{}", name)
    }
}

/// Step-to-step conversion through the funnel. Each rate is relative to the
/// stage before it; `overall_rate` is purchases over landings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StageRates {
    pub cart_rate: f64,
    pub checkout_rate: f64,
    pub purchase_rate: f64,
    pub overall_rate: f64,
}

#[derive(Debug, Deserialize)]
struct RawFunnel {
    landed: u64,
    #[serde(alias = "added_to_cart")]
    cart: u64,
    #[serde(alias = "reached_checkout")]
    checkout: u64,
    purchased: u64,
}

impl TryFrom<RawFunnel> for FunnelSample {
    type Error = FunnelError;

    fn try_from(raw: RawFunnel) -> Result<Self, Self::Error> {
        FunnelSample::new(raw.landed, raw.cart, raw.checkout, raw.purchased)
    }
}

/// Visitor counts at each funnel stage.
/// Invariant: `purchased <= checkout <= cart <= landed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFunnel")]
pub struct FunnelSample {
    landed: u64,
    cart: u64,
    checkout: u64,
    purchased: u64,
}

impl FunnelSample {
    pub fn new(landed: u64, cart: u64, checkout: u64, purchased: u64) -> Result<Self, FunnelError> {
        let stages = [
            ("landed", landed),
            ("cart", cart),
            ("checkout", checkout),
            ("purchased", purchased),
        ];
        for pair in stages.windows(2) {
            let (previous, previous_count) = pair[0];
            let (stage, count) = pair[1];
            if count > previous_count {
                return Err(FunnelError::StageExceedsPrevious {
                    stage,
                    count,
                    previous,
                    previous_count,
                });
            }
        }
        Ok(Self { landed, cart, checkout, purchased })
    }

    /// Builds a funnel by capping each stage at the one before it.
    pub fn clamped(landed: u64, cart: u64, checkout: u64, purchased: u64) -> Self {
        let cart = cart.min(landed);
        let checkout = checkout.min(cart);
        let purchased = purchased.min(checkout);
        Self { landed, cart, checkout, purchased }
    }

    pub fn landed(&self) -> u64 {
        self.landed
    }

    pub fn cart(&self) -> u64 {
        self.cart
    }

    pub fn checkout(&self) -> u64 {
        self.checkout
    }

    pub fn purchased(&self) -> u64 {
        self.purchased
    }

    pub fn stage_rates(&self) -> StageRates {
        StageRates {
            cart_rate: ratio(self.cart, self.landed),
            checkout_rate: ratio(self.checkout, self.cart),
            purchase_rate: ratio(self.purchased, self.checkout),
            overall_rate: ratio(self.purchased, self.landed),
        }
    }

    /// Stage that loses the largest share of the visitors reaching it.
    /// Ties go to the earlier stage. `None` when nobody landed.
    pub fn biggest_drop_off(&self) -> Option<FunnelStage> {
        let steps = [
            (FunnelStage::Cart, self.landed, self.cart),
            (FunnelStage::Checkout, self.cart, self.checkout),
            (FunnelStage::Purchase, self.checkout, self.purchased),
        ];

        steps
            .iter()
            .filter(|(_, entered, _)| *entered > 0)
            .map(|(stage, entered, kept)| (*stage, 1.0 - ratio(*kept, *entered)))
            .fold(None, |best: Option<(FunnelStage, f64)>, (stage, loss)| match best {
                Some((_, best_loss)) if best_loss >= loss => best,
                _ => Some((stage, loss)),
            })
            .map(|(stage, _)| stage)
    }
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Figures reported by the store's own connected analytics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformMetrics {
    pub total_sessions: Option<u64>,
    pub total_orders: Option<u64>,
    pub average_order_value: Option<f64>,
    pub total_revenue: Option<f64>,
}

/// A completed conversion test for one store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub store_url: String,
    #[serde(default)]
    pub store_name: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    pub completed_at: DateTime<Utc>,
    pub funnel: FunnelSample,
    #[serde(default)]
    pub issues: Vec<ThreatIssue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueOpportunity {
    pub current_monthly_revenue: f64,
    pub potential_monthly_revenue: f64,
    pub monthly_opportunity: ValueRange,
    /// Twelve times `monthly_opportunity.max`.
    pub annual_opportunity: f64,
    pub methodology: String,
}

/// Pre-formatted strings for showing an opportunity to a merchant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpportunityDisplay {
    pub monthly: String,
    pub annual: String,
    pub current_monthly: String,
    pub potential_monthly: String,
}

/// Where a resolved snapshot metric came from, highest trust first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricSource {
    Platform,
    External,
    Funnel,
    Benchmark,
    Derived,
    Default,
}

impl MetricSource {
    pub fn description(&self) -> &'static str {
        match self {
            MetricSource::Platform => "connected store analytics",
            MetricSource::External => "third-party traffic estimates",
            MetricSource::Funnel => "the test funnel",
            MetricSource::Benchmark => "the category benchmark",
            MetricSource::Derived => "the other resolved figures",
            MetricSource::Default => "conservative defaults",
        }
    }
}

impl fmt::Display for MetricSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedMetric<T> {
    pub value: T,
    pub source: MetricSource,
}

impl<T> ResolvedMetric<T> {
    pub fn new(value: T, source: MetricSource) -> Self {
        Self { value, source }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedMetrics {
    pub monthly_visitors: ResolvedMetric<u64>,
    pub monthly_orders: ResolvedMetric<u64>,
    pub conversion_rate: ResolvedMetric<f64>,
    pub average_order_value: ResolvedMetric<f64>,
    pub monthly_revenue: ResolvedMetric<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreSnapshot {
    pub store_url: String,
    pub store_name: Option<String>,
    pub last_scan_at: DateTime<Utc>,
    pub metrics: ResolvedMetrics,
    /// Test funnel projected to monthly volume.
    pub funnel: FunnelSample,
    pub benchmark: CategoryBenchmark,
    pub opportunity: RevenueOpportunity,
    /// Monthly revenue at the category's top-performer conversion rate.
    pub top_performer_monthly_revenue: f64,
}

/// A friction issue found during a test, with its estimated share of lost conversions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatIssue {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub impact_min: f64,
    pub impact_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Confidence {
    #[serde(rename = "high confidence")]
    High,
    #[serde(rename = "medium confidence")]
    Medium,
    #[serde(rename = "low confidence")]
    Low,
}

impl Confidence {
    pub fn label(&self) -> &'static str {
        match self {
            Confidence::High => "high confidence",
            Confidence::Medium => "medium confidence",
            Confidence::Low => "low confidence",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreatImpactEstimate {
    pub issue_id: String,
    pub impact_range: ValueRange,
    pub monthly_recovery: ValueRange,
    pub annual_recovery_max: f64,
    pub confidence: Confidence,
    pub recovery_display: String,
}
