//! Typed accumulators with explicit reduction policies

use crate::error::{AppError, Result};
use crate::models::{MeasurementSample, TransportSnapshot};
use crate::scoring::estimate_mos;
use crate::types::ReductionPolicy;
use std::time::{Duration, Instant};

/// Reduces a stream of transport statistics snapshots into a live score for
/// display and a final score captured at test end.
///
/// The live value always reflects the most recent snapshot. The final value
/// follows the configured [`ReductionPolicy`]: `KeepLatest` reports the last
/// observed sample, `RunningAverage` estimates the score from the uniform
/// mean of all observed inputs.
#[derive(Debug)]
pub struct SampleReducer {
    policy: ReductionPolicy,
    default_rtt_ms: f64,
    last_rtt_ms: Option<f64>,
    latest: Option<MeasurementSample>,
    sum: MeasurementSample,
    count: usize,
}

impl SampleReducer {
    /// Create a reducer with the given final-value policy
    pub fn new(policy: ReductionPolicy, default_rtt_ms: f64) -> Self {
        Self {
            policy,
            default_rtt_ms,
            last_rtt_ms: None,
            latest: None,
            sum: MeasurementSample {
                round_trip_ms: 0.0,
                packet_loss_pct: 0.0,
                jitter_ms: 0.0,
            },
            count: 0,
        }
    }

    /// Reduce one statistics snapshot, returning the live sample and score.
    pub fn observe(&mut self, snapshot: &TransportSnapshot) -> (MeasurementSample, f64) {
        // Cumulative counters; a zero received count would divide by zero
        let received = snapshot.packets_received.max(1);
        let lost = snapshot.packets_lost;
        let packet_loss_pct = (lost as f64 / (lost + received) as f64) * 100.0;

        let jitter_ms = snapshot.jitter_seconds * 1000.0;

        // RTT resolves from the most recent successful transport-pair
        // statistic, falling back to the configured default.
        if let Some(rtt) = snapshot.round_trip_seconds {
            self.last_rtt_ms = Some(rtt * 1000.0);
        }
        let round_trip_ms = self.last_rtt_ms.unwrap_or(self.default_rtt_ms);

        let sample = MeasurementSample {
            round_trip_ms,
            packet_loss_pct,
            jitter_ms,
        };

        self.latest = Some(sample);
        self.sum.round_trip_ms += sample.round_trip_ms;
        self.sum.packet_loss_pct += sample.packet_loss_pct;
        self.sum.jitter_ms += sample.jitter_ms;
        self.count += 1;

        let mos = estimate_mos(sample.round_trip_ms, sample.packet_loss_pct, sample.jitter_ms);
        (sample, mos)
    }

    /// Most recent reduced sample and score, if any snapshot has arrived
    pub fn live(&self) -> Option<(MeasurementSample, f64)> {
        self.latest.map(|sample| {
            let mos =
                estimate_mos(sample.round_trip_ms, sample.packet_loss_pct, sample.jitter_ms);
            (sample, mos)
        })
    }

    /// Number of snapshots observed so far
    pub fn sample_count(&self) -> usize {
        self.count
    }

    /// Final sample and score at test end.
    ///
    /// Publishing with zero observed snapshots is a caller error, so this
    /// returns `Err` instead of an undefined result.
    pub fn finalize(&self) -> Result<(MeasurementSample, f64)> {
        if self.count == 0 {
            return Err(AppError::probe(
                "no statistics snapshot arrived before test end",
            ));
        }

        let sample = match self.policy {
            ReductionPolicy::KeepLatest => self.latest.expect("count > 0 implies latest"),
            ReductionPolicy::RunningAverage => MeasurementSample {
                round_trip_ms: self.sum.round_trip_ms / self.count as f64,
                packet_loss_pct: self.sum.packet_loss_pct / self.count as f64,
                jitter_ms: self.sum.jitter_ms / self.count as f64,
            },
        };

        let mos = estimate_mos(sample.round_trip_ms, sample.packet_loss_pct, sample.jitter_ms);
        Ok((sample, mos))
    }
}

/// Convert a transfer rate in bytes per second to megabits per second
pub fn bytes_to_mbps(bytes_per_second: f64) -> f64 {
    bytes_per_second * 8.0 / 1_000_000.0
}

/// Reduces cumulative transfer progress into an instantaneous speed for
/// display and an overall average at completion.
#[derive(Debug)]
pub struct ThroughputReducer {
    started_at: Instant,
    last_tick_at: Instant,
    last_tick_bytes: u64,
    total_bytes: u64,
    instantaneous_mbps: f64,
}

impl ThroughputReducer {
    /// Start measuring at `now`
    pub fn start(now: Instant) -> Self {
        Self {
            started_at: now,
            last_tick_at: now,
            last_tick_bytes: 0,
            total_bytes: 0,
            instantaneous_mbps: 0.0,
        }
    }

    /// Record cumulative transferred bytes at `now`, returning the
    /// instantaneous speed in Mbps when the tick advanced the clock.
    pub fn record(&mut self, cumulative_bytes: u64, now: Instant) -> Option<f64> {
        self.total_bytes = cumulative_bytes;

        let elapsed = now.duration_since(self.last_tick_at);
        if elapsed.is_zero() {
            return None;
        }

        let delta_bytes = cumulative_bytes.saturating_sub(self.last_tick_bytes);
        let bytes_per_second = delta_bytes as f64 / elapsed.as_secs_f64();
        self.instantaneous_mbps = bytes_to_mbps(bytes_per_second);

        self.last_tick_at = now;
        self.last_tick_bytes = cumulative_bytes;

        Some(self.instantaneous_mbps)
    }

    /// Most recent instantaneous speed in Mbps
    pub fn instantaneous_mbps(&self) -> f64 {
        self.instantaneous_mbps
    }

    /// Total bytes recorded so far
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Overall average speed over the whole transfer, in Mbps
    pub fn finalize(&self, now: Instant) -> Result<f64> {
        let elapsed = now.duration_since(self.started_at);
        if elapsed.is_zero() {
            return Err(AppError::probe("transfer completed with zero elapsed time"));
        }
        Ok(bytes_to_mbps(self.total_bytes as f64 / elapsed.as_secs_f64()))
    }
}

/// Reduces N sequential round-trip measurements into their arithmetic mean
#[derive(Debug, Default)]
pub struct LatencyReducer {
    total: Duration,
    count: u32,
}

impl LatencyReducer {
    /// Create an empty reducer
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one round-trip measurement
    pub fn record(&mut self, round_trip: Duration) {
        self.total += round_trip;
        self.count += 1;
    }

    /// Number of measurements recorded
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Mean round-trip time in milliseconds
    pub fn mean_ms(&self) -> Result<f64> {
        if self.count == 0 {
            return Err(AppError::probe("no round-trip measurements recorded"));
        }
        Ok(self.total.as_secs_f64() * 1000.0 / self.count as f64)
    }
}
