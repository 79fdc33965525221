//! Measurement aggregation and scoring
//!
//! The E-model-derived MOS approximation plus the reducers that collapse
//! streams of transport statistics, transfer progress and round-trip
//! measurements into final scalar results.

mod reducer;

pub use reducer::{bytes_to_mbps, LatencyReducer, SampleReducer, ThroughputReducer};

/// Base transmission rating with no impairments
const R0: f64 = 93.2;

/// Estimate a Mean Opinion Score from round-trip time, packet loss and
/// jitter, using a simplified E-model transmission rating.
///
/// The result is clamped to [1.0, 4.5]. The function is pure and
/// deterministic; callers are responsible for passing non-negative RTT and
/// jitter and a loss percentage in [0, 100]. Loss above 100 is tolerated
/// and simply drives the rating to the floor.
pub fn estimate_mos(rtt_ms: f64, packet_loss_pct: f64, jitter_ms: f64) -> f64 {
    // Delay impairment: free below 100 ms of round-trip time
    let id = if rtt_ms > 100.0 { rtt_ms / 4.0 - 25.0 } else { 0.0 };

    // Equipment/loss impairment: loss above 1% incurs a fixed offset
    let ie = if packet_loss_pct > 1.0 {
        15.0 + packet_loss_pct
    } else {
        packet_loss_pct
    };

    // Jitter penalty: free below 20 ms
    let jp = if jitter_ms > 20.0 { jitter_ms / 20.0 } else { 0.0 };

    let r = (R0 - id - ie - jp).clamp(0.0, 100.0);

    let mos = 1.0 + 0.035 * r + r * (r - 60.0) * (100.0 - r) * 0.000007;
    mos.clamp(1.0, 4.5)
}
