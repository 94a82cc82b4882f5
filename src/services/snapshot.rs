// src/services/snapshot.rs
use log::{debug, info};

use crate::error::SnapshotError;
use crate::models::{
    CategoryBenchmark, FunnelSample, MetricSource, NormalizedExternalMetrics, PlatformMetrics,
    ResolvedMetric, ResolvedMetrics, StoreSnapshot, TestResult,
};
use crate::services::benchmarks::lookup_benchmark;
use crate::services::calculations::{calculate_revenue_opportunity, monthly_revenue, OpportunityInputs};
use crate::services::store_leads::StoreLeadsClient;

/// Used when no source reports traffic.
pub const DEFAULT_MONTHLY_VISITORS: u64 = 10_000;
/// Used when neither the platform nor the test funnel yields a rate.
pub const DEFAULT_CONVERSION_RATE: f64 = 0.015;

/// Everything a metric provider may read. Metrics are resolved in dependency
/// order (rate, order value, visitors, orders, revenue); a provider only reads
/// resolved fields that come before its own metric.
struct Resolution<'a> {
    test: &'a TestResult,
    external: Option<&'a NormalizedExternalMetrics>,
    platform: Option<&'a PlatformMetrics>,
    conversion_rate: f64,
    average_order_value: f64,
    monthly_visitors: u64,
    monthly_orders: u64,
}

type Provider<T> = (MetricSource, fn(&Resolution<'_>) -> Option<T>);

fn resolve<T>(ctx: &Resolution<'_>, providers: &[Provider<T>], fallback: ResolvedMetric<T>) -> ResolvedMetric<T> {
    providers
        .iter()
        .find_map(|(source, provider)| provider(ctx).map(|value| ResolvedMetric::new(value, *source)))
        .unwrap_or(fallback)
}

fn valid_amount(value: f64) -> Option<f64> {
    (value.is_finite() && value >= 0.0).then_some(value)
}

fn platform_conversion_rate(ctx: &Resolution<'_>) -> Option<f64> {
    let platform = ctx.platform?;
    let sessions = platform.total_sessions.filter(|s| *s > 0)?;
    let orders = platform.total_orders?;
    Some((orders as f64 / sessions as f64).min(1.0))
}

fn funnel_conversion_rate(ctx: &Resolution<'_>) -> Option<f64> {
    let funnel = &ctx.test.funnel;
    (funnel.landed() > 0).then(|| funnel.purchased() as f64 / funnel.landed() as f64)
}

fn platform_average_order_value(ctx: &Resolution<'_>) -> Option<f64> {
    ctx.platform?.average_order_value.and_then(valid_amount).filter(|aov| *aov > 0.0)
}

fn platform_revenue_per_order(ctx: &Resolution<'_>) -> Option<f64> {
    let platform = ctx.platform?;
    let orders = platform.total_orders.filter(|o| *o > 0)?;
    let revenue = platform.total_revenue.and_then(valid_amount)?;
    Some(revenue / orders as f64).filter(|aov| *aov > 0.0)
}

fn platform_sessions(ctx: &Resolution<'_>) -> Option<u64> {
    ctx.platform?.total_sessions
}

fn external_traffic(ctx: &Resolution<'_>) -> Option<u64> {
    ctx.external?.monthly_traffic_estimate
}

fn external_revenue_implied_visitors(ctx: &Resolution<'_>) -> Option<u64> {
    let revenue = ctx.external?.monthly_revenue_estimate?;
    let revenue_per_visitor = ctx.conversion_rate * ctx.average_order_value;
    (revenue_per_visitor > 0.0).then(|| (revenue / revenue_per_visitor).round() as u64)
}

fn platform_orders(ctx: &Resolution<'_>) -> Option<u64> {
    ctx.platform?.total_orders
}

fn platform_revenue(ctx: &Resolution<'_>) -> Option<f64> {
    ctx.platform?.total_revenue.and_then(valid_amount)
}

fn external_revenue(ctx: &Resolution<'_>) -> Option<f64> {
    ctx.external?.monthly_revenue_estimate
}

const CONVERSION_RATE_PROVIDERS: &[Provider<f64>] = &[
    (MetricSource::Platform, platform_conversion_rate),
    (MetricSource::Funnel, funnel_conversion_rate),
];

const AVERAGE_ORDER_VALUE_PROVIDERS: &[Provider<f64>] = &[
    (MetricSource::Platform, platform_average_order_value),
    (MetricSource::Platform, platform_revenue_per_order),
];

const VISITOR_PROVIDERS: &[Provider<u64>] = &[
    (MetricSource::Platform, platform_sessions),
    (MetricSource::External, external_traffic),
    (MetricSource::External, external_revenue_implied_visitors),
];

const ORDER_PROVIDERS: &[Provider<u64>] = &[(MetricSource::Platform, platform_orders)];

const REVENUE_PROVIDERS: &[Provider<f64>] = &[
    (MetricSource::Platform, platform_revenue),
    (MetricSource::External, external_revenue),
];

fn resolve_metrics(
    test: &TestResult,
    external: Option<&NormalizedExternalMetrics>,
    platform: Option<&PlatformMetrics>,
    benchmark: &CategoryBenchmark,
) -> ResolvedMetrics {
    let mut ctx = Resolution {
        test,
        external,
        platform,
        conversion_rate: 0.0,
        average_order_value: 0.0,
        monthly_visitors: 0,
        monthly_orders: 0,
    };

    let conversion_rate = resolve(
        &ctx,
        CONVERSION_RATE_PROVIDERS,
        ResolvedMetric::new(DEFAULT_CONVERSION_RATE, MetricSource::Default),
    );
    ctx.conversion_rate = conversion_rate.value;

    let average_order_value = resolve(
        &ctx,
        AVERAGE_ORDER_VALUE_PROVIDERS,
        ResolvedMetric::new(benchmark.avg_order_value, MetricSource::Benchmark),
    );
    ctx.average_order_value = average_order_value.value;

    let monthly_visitors = resolve(
        &ctx,
        VISITOR_PROVIDERS,
        ResolvedMetric::new(DEFAULT_MONTHLY_VISITORS, MetricSource::Default),
    );
    ctx.monthly_visitors = monthly_visitors.value;

    let derived_orders = (ctx.monthly_visitors as f64 * ctx.conversion_rate).round() as u64;
    let monthly_orders = resolve(
        &ctx,
        ORDER_PROVIDERS,
        ResolvedMetric::new(derived_orders, MetricSource::Derived),
    );
    ctx.monthly_orders = monthly_orders.value;

    let derived_revenue = ctx.monthly_orders as f64 * ctx.average_order_value;
    let monthly_revenue = resolve(
        &ctx,
        REVENUE_PROVIDERS,
        ResolvedMetric::new(derived_revenue, MetricSource::Derived),
    );

    ResolvedMetrics {
        monthly_visitors,
        monthly_orders,
        conversion_rate,
        average_order_value,
        monthly_revenue,
    }
}

/// Projects a test funnel onto monthly traffic. Every stage is multiplied by
/// `monthly_visitors / landed` (1 when nobody landed) and rounded; rounding
/// is capped so no stage exceeds the one before it.
pub fn scale_funnel(sample: &FunnelSample, monthly_visitors: u64) -> FunnelSample {
    let factor = if sample.landed() == 0 {
        1.0
    } else {
        monthly_visitors as f64 / sample.landed() as f64
    };
    let scale = |count: u64| (count as f64 * factor).round() as u64;

    FunnelSample::clamped(
        scale(sample.landed()),
        scale(sample.cart()),
        scale(sample.checkout()),
        scale(sample.purchased()),
    )
}

fn describe_sources(metrics: &ResolvedMetrics) -> String {
    format!(
        "Visitors come from {}, conversion rate from {}, order value from {} and revenue from {}.",
        metrics.monthly_visitors.source,
        metrics.conversion_rate.source,
        metrics.average_order_value.source,
        metrics.monthly_revenue.source,
    )
}

/// Builds the store overview shown on the dashboard.
///
/// Each metric takes the first source that has it: the store's own analytics,
/// then third-party estimates, then the test funnel, then a documented
/// default. Missing external metrics never fail assembly.
pub fn build_store_snapshot(
    test: &TestResult,
    external: Option<&NormalizedExternalMetrics>,
    platform: Option<&PlatformMetrics>,
) -> Result<StoreSnapshot, SnapshotError> {
    let store_url = test.store_url.trim();
    if store_url.is_empty() {
        return Err(SnapshotError::MissingStoreUrl);
    }

    let benchmark = lookup_benchmark(test.industry.as_deref());
    let metrics = resolve_metrics(test, external, platform, &benchmark);
    debug!("Resolved metrics for {}: {:?}", store_url, metrics);

    let visitors = metrics.monthly_visitors.value as f64;
    let conversion_rate = metrics.conversion_rate.value;
    let aov = metrics.average_order_value.value;

    let mut opportunity = calculate_revenue_opportunity(&OpportunityInputs {
        monthly_visitors: visitors,
        current_conversion_rate: conversion_rate,
        aov,
        category_benchmark_cr: benchmark.avg_conversion_rate,
    });
    opportunity.methodology = format!(
        "{} Compared against the {} benchmark. {}",
        opportunity.methodology,
        benchmark.category,
        describe_sources(&metrics)
    );

    let top_performer_rate = benchmark.top_performer_conversion_rate.max(conversion_rate);

    Ok(StoreSnapshot {
        store_url: store_url.to_string(),
        store_name: test.store_name.clone(),
        last_scan_at: test.completed_at,
        funnel: scale_funnel(&test.funnel, metrics.monthly_visitors.value),
        top_performer_monthly_revenue: monthly_revenue(visitors, top_performer_rate, aov),
        benchmark,
        opportunity,
        metrics,
    })
}

/// Looks up third-party metrics for the store and builds its snapshot.
/// A failed lookup degrades to funnel-derived figures. An empty store URL
/// skips the lookup and is rejected by [`build_store_snapshot`].
pub async fn fetch_store_snapshot(
    client: &StoreLeadsClient,
    test: &TestResult,
    platform: Option<&PlatformMetrics>,
) -> Result<StoreSnapshot, SnapshotError> {
    let external = client.fetch_and_normalize(&test.store_url).await;
    if external.is_none() {
        info!("No external metrics for {}, using available store data", test.store_url);
    }

    build_store_snapshot(test, external.as_ref(), platform)
}
