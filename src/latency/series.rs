use crate::store::LatencySnapshot;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Latency of each platform that reported at one instant
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SeriesPoint {
    pub time: DateTime<Utc>,
    #[serde(flatten)]
    pub latencies: BTreeMap<String, i32>,
}

/// One point per distinct `created_at`, oldest first.
///
/// Platforms missing at a timestamp are left out of that point; nothing is
/// interpolated or carried forward.
pub fn build_series(snapshots: &[LatencySnapshot]) -> Vec<SeriesPoint> {
    let mut sorted: Vec<&LatencySnapshot> = snapshots.iter().collect();
    sorted.sort_by_key(|s| s.created_at);

    let mut series: Vec<SeriesPoint> = Vec::new();
    for snapshot in sorted {
        match series.last_mut() {
            Some(point) if point.time == snapshot.created_at => {
                point
                    .latencies
                    .insert(snapshot.platform_id.clone(), snapshot.latency_ms);
            }
            _ => {
                let mut latencies = BTreeMap::new();
                latencies.insert(snapshot.platform_id.clone(), snapshot.latency_ms);
                series.push(SeriesPoint {
                    time: snapshot.created_at,
                    latencies,
                });
            }
        }
    }

    series
}
