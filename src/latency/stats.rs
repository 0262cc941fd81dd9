use crate::store::LatencySnapshot;
use serde::Serialize;
use std::collections::BTreeMap;

/// Summary of one platform's latency samples, in milliseconds
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct PlatformStats {
    pub avg: i64,
    pub min: i64,
    pub max: i64,
    pub p95: i64,
    pub count: usize,
}

/// Nearest-rank index of the 95th percentile in a sorted sample of `n`:
/// `ceil(n * 0.95) - 1`, clamped to `[0, n - 1]`.
pub fn p95_index(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let rank = (n * 95).div_ceil(100);
    rank.saturating_sub(1).min(n - 1)
}

/// Empty input yields all zeros
pub fn compute_stats(values: &[i64]) -> PlatformStats {
    if values.is_empty() {
        return PlatformStats::default();
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let n = sorted.len();
    let sum: i64 = sorted.iter().sum();

    PlatformStats {
        avg: (sum as f64 / n as f64).round() as i64,
        min: sorted[0],
        max: sorted[n - 1],
        p95: sorted[p95_index(n)],
        count: n,
    }
}

/// Group samples by platform id and summarize each group
pub fn stats_by_platform(snapshots: &[LatencySnapshot]) -> BTreeMap<String, PlatformStats> {
    let mut by_platform: BTreeMap<String, Vec<i64>> = BTreeMap::new();
    for snapshot in snapshots {
        by_platform
            .entry(snapshot.platform_id.clone())
            .or_default()
            .push(snapshot.latency_ms as i64);
    }

    by_platform
        .into_iter()
        .map(|(platform, values)| (platform, compute_stats(&values)))
        .collect()
}
