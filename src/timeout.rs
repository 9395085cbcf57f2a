use std::time::Duration;

use sfw_sockets::RttStats;

/// Seconds a probe may take when the path latency does not suggest less
pub const DEFAULT_TEST_TIME: u64 = 30;

/// Derives the probe deadline, in whole seconds, from round trip statistics.
///
/// The larger of RTT and RTO is used plus one second. Values that would
/// reach `fallback` fall back to it, so the result is never above `fallback`
/// and never below one second.
pub fn test_time(stats: RttStats, fallback: u64) -> u64 {
    let fallback = fallback.max(1);
    let rto_ms = u64::from(stats.max_rtt_ms.max(stats.max_rto_ms));

    if rto_ms < (fallback - 1).saturating_mul(1000) {
        rto_ms / 1000 + 1
    } else {
        fallback
    }
}

/// Wait bound for a probe announced with `test_time` seconds
pub fn deadline(test_time: u64, grace: u64) -> Duration {
    Duration::from_secs(test_time.saturating_add(grace))
}
