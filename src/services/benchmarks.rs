// src/services/benchmarks.rs
use log::debug;

use crate::models::CategoryBenchmark;

pub const DEFAULT_BENCHMARK: CategoryBenchmark = CategoryBenchmark {
    category: "general",
    avg_conversion_rate: 0.023,
    avg_order_value: 85.0,
    top_performer_conversion_rate: 0.042,
};

struct CategoryRule {
    stems: &'static [&'static str],
    benchmark: CategoryBenchmark,
}

// Checked in order; the first rule with a matching stem wins.
static CATEGORY_RULES: [CategoryRule; 5] = [
    CategoryRule {
        stems: &["fashion", "apparel", "clothing"],
        benchmark: CategoryBenchmark {
            category: "fashion",
            avg_conversion_rate: 0.021,
            avg_order_value: 95.0,
            top_performer_conversion_rate: 0.038,
        },
    },
    CategoryRule {
        stems: &["beauty", "cosmetic", "skincare"],
        benchmark: CategoryBenchmark {
            category: "beauty",
            avg_conversion_rate: 0.027,
            avg_order_value: 65.0,
            top_performer_conversion_rate: 0.048,
        },
    },
    CategoryRule {
        stems: &["home", "garden", "furniture"],
        benchmark: CategoryBenchmark {
            category: "home_garden",
            avg_conversion_rate: 0.016,
            avg_order_value: 165.0,
            top_performer_conversion_rate: 0.031,
        },
    },
    CategoryRule {
        stems: &["electronics", "tech", "gadget"],
        benchmark: CategoryBenchmark {
            category: "electronics",
            avg_conversion_rate: 0.013,
            avg_order_value: 210.0,
            top_performer_conversion_rate: 0.026,
        },
    },
    CategoryRule {
        stems: &["health", "wellness", "fitness"],
        benchmark: CategoryBenchmark {
            category: "health_wellness",
            avg_conversion_rate: 0.026,
            avg_order_value: 70.0,
            top_performer_conversion_rate: 0.045,
        },
    },
];

/// Maps a free-text industry label onto a category benchmark.
///
/// The label is lowercased and stripped of everything but letters before
/// matching, so "Women's Fashion & Apparel" and "womensfashion" behave the
/// same. Unknown or missing labels get [`DEFAULT_BENCHMARK`].
pub fn lookup_benchmark(industry: Option<&str>) -> CategoryBenchmark {
    let normalized = industry.map(normalize_label).unwrap_or_default();
    if normalized.is_empty() {
        return DEFAULT_BENCHMARK;
    }

    CATEGORY_RULES
        .iter()
        .find(|rule| rule.stems.iter().any(|stem| normalized.contains(stem)))
        .map(|rule| rule.benchmark)
        .unwrap_or_else(|| {
            debug!("No benchmark category matches {:?}, using default", industry);
            DEFAULT_BENCHMARK
        })
}

fn normalize_label(label: &str) -> String {
    label
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphabetic())
        .collect()
}
