//! Latency analytics over collected health-check snapshots.

mod format;
mod series;
mod stats;
mod time_range;

pub use format::format_ms;
pub use series::{build_series, SeriesPoint};
pub use stats::{compute_stats, p95_index, stats_by_platform, PlatformStats};
pub use time_range::TimeRange;
