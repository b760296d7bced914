//! Tag facet aggregation and ranking.
//!
//! This module turns a batch of monitoring records into per-facet
//! frequency counts and top-K ranked buckets with percentage shares.

use crate::analysis::facets::{extract, Facet, FacetCounter};
use crate::models::{LogsTopBuckets, MonitoringRecord, NamedCount, RankedEntry};
use tracing::debug;

/// Number of entries kept in each ranked bucket.
pub const TOP_K: usize = 5;

/// Result of one aggregation pass.
#[derive(Debug, Clone, Default)]
pub struct FacetSummary {
    /// Ranked version/host/error-code buckets, ready for JSON embedding.
    pub buckets: LogsTopBuckets,
    /// Full-resolution dependency counts.
    pub dependencies: FacetCounter,
    /// Full-resolution operation counts.
    pub operations: FacetCounter,
}

/// Aggregate facet counts over a batch of records.
///
/// Records lacking a facet simply contribute nothing to it.
pub fn aggregate(records: &[MonitoringRecord]) -> FacetSummary {
    let mut by_version = FacetCounter::new();
    let mut by_host = FacetCounter::new();
    let mut by_error_code = FacetCounter::new();
    let mut dependencies = FacetCounter::new();
    let mut operations = FacetCounter::new();

    for record in records {
        let counters: [(Facet, &mut FacetCounter); 5] = [
            (Facet::Version, &mut by_version),
            (Facet::Host, &mut by_host),
            (Facet::ErrorCode, &mut by_error_code),
            (Facet::Dependency, &mut dependencies),
            (Facet::Operation, &mut operations),
        ];

        for (facet, counter) in counters {
            if let Some(value) = extract(facet, record) {
                counter.add(value);
            }
        }
    }

    debug!(
        "Aggregated {} records: {} versions, {} hosts, {} error codes, {} dependencies, {} operations",
        records.len(),
        by_version.len(),
        by_host.len(),
        by_error_code.len(),
        dependencies.len(),
        operations.len()
    );

    FacetSummary {
        buckets: LogsTopBuckets {
            by_version: ranked_bucket(&by_version, TOP_K),
            by_host: ranked_bucket(&by_host, TOP_K),
            by_error_code: ranked_bucket(&by_error_code, TOP_K),
        },
        dependencies,
        operations,
    }
}

/// Top `k` entries of `counter` with their share of the facet total.
///
/// The total covers every value of the facet, not only the kept ones.
pub fn ranked_bucket(counter: &FacetCounter, k: usize) -> Vec<RankedEntry> {
    let total = counter.total().max(1);

    counter
        .most_common(k)
        .into_iter()
        .map(|(value, count)| RankedEntry {
            value: value.to_string(),
            count,
            pct: percentage(count, total),
        })
        .collect()
}

/// `count / total * 100`, rounded to two decimals.
pub fn percentage(count: usize, total: usize) -> f64 {
    let raw = 100.0 * count as f64 / total.max(1) as f64;
    (raw * 100.0).round() / 100.0
}

/// Top `k` values of `counter` as `{name, count}` pairs.
pub fn named_counts(counter: &FacetCounter, k: usize) -> Vec<NamedCount> {
    counter
        .most_common(k)
        .into_iter()
        .map(|(name, count)| NamedCount {
            name: name.to_string(),
            count,
        })
        .collect()
}
