//! Measurement samples and per-probe result data models

use crate::types::QualityLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One snapshot of cumulative transport statistics, as delivered by a
/// [`TransportStatsSource`](crate::probe::TransportStatsSource).
///
/// Counters are cumulative since negotiation; a snapshot is immutable once
/// produced and superseded by the next one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransportSnapshot {
    /// Packets lost since the start of the run
    pub packets_lost: u64,

    /// Packets received since the start of the run
    pub packets_received: u64,

    /// Interarrival jitter, in seconds
    pub jitter_seconds: f64,

    /// Most recent successful round-trip measurement, in seconds,
    /// if one has been observed
    pub round_trip_seconds: Option<f64>,
}

/// A reduced measurement sample ready for MOS estimation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSample {
    /// Round-trip time in milliseconds (>= 0)
    pub round_trip_ms: f64,

    /// Packet loss percentage in [0, 100]
    pub packet_loss_pct: f64,

    /// Jitter in milliseconds (>= 0)
    pub jitter_ms: f64,
}

/// Final metrics of one jitter probe run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JitterResult {
    /// Estimated Mean Opinion Score in [1.0, 4.5]
    pub mos: f64,

    /// Jitter in milliseconds
    pub jitter_ms: f64,

    /// Packet loss percentage
    pub packet_loss_pct: f64,

    /// Round-trip time in milliseconds
    pub rtt_ms: f64,

    /// Number of statistics snapshots that contributed to the result
    pub sample_count: usize,

    /// Set exactly once, after every metric above has been finalized
    pub complete: bool,

    /// When the probe run finished
    pub completed_at: DateTime<Utc>,
}

impl JitterResult {
    /// Build a complete result from finalized metrics
    pub fn finalized(sample: MeasurementSample, mos: f64, sample_count: usize) -> Self {
        Self {
            mos,
            jitter_ms: sample.jitter_ms,
            packet_loss_pct: sample.packet_loss_pct,
            rtt_ms: sample.round_trip_ms,
            sample_count,
            complete: true,
            completed_at: Utc::now(),
        }
    }

    /// Perceived quality classification for display
    pub fn quality(&self) -> QualityLevel {
        QualityLevel::from_mos(self.mos)
    }
}

/// Final metrics of one throughput probe run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputResult {
    /// Whether any download candidate succeeded
    pub success: bool,

    /// Overall average download speed in megabits per second
    pub download_mbps: f64,

    /// Overall average upload speed in megabits per second
    pub upload_mbps: f64,

    /// Mean round-trip time over the latency iterations, in milliseconds
    pub rtt_ms: f64,

    /// The download endpoint that succeeded, if any
    pub endpoint: Option<String>,

    /// Number of candidate attempts made before success or exhaustion
    pub attempts: u32,

    /// Set exactly once, after every metric above has been finalized
    pub complete: bool,

    /// When the probe run finished
    pub completed_at: DateTime<Utc>,
}

impl ThroughputResult {
    /// Build a complete result from finalized metrics
    pub fn finalized(
        download_mbps: f64,
        upload_mbps: f64,
        rtt_ms: f64,
        endpoint: String,
        attempts: u32,
    ) -> Self {
        Self {
            success: true,
            download_mbps,
            upload_mbps,
            rtt_ms,
            endpoint: Some(endpoint),
            attempts,
            complete: true,
            completed_at: Utc::now(),
        }
    }

    /// Failure state after exhausting every fallback candidate.
    /// Numeric fields are zeroed rather than left undefined.
    pub fn exhausted(attempts: u32) -> Self {
        Self {
            success: false,
            download_mbps: 0.0,
            upload_mbps: 0.0,
            rtt_ms: 0.0,
            endpoint: None,
            attempts,
            complete: true,
            completed_at: Utc::now(),
        }
    }
}

/// Final metrics of one video probe run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoResult {
    /// Time from load-start to first-playable, in milliseconds
    pub initial_latency_ms: f64,

    /// Accumulated stall time over the whole playback, in milliseconds
    pub total_buffering_ms: f64,

    /// Stall time as a percentage of the declared playback duration
    pub rebuffer_ratio_pct: f64,

    /// Declared playback duration, in seconds
    pub duration_seconds: f64,

    /// Set exactly once, after every metric above has been finalized
    pub complete: bool,

    /// When the probe run finished
    pub completed_at: DateTime<Utc>,
}

impl VideoResult {
    /// Build a complete result from finalized metrics
    pub fn finalized(
        initial_latency_ms: f64,
        total_buffering_ms: f64,
        duration_seconds: f64,
    ) -> Self {
        let rebuffer_ratio_pct = (total_buffering_ms / 1000.0) / duration_seconds * 100.0;
        Self {
            initial_latency_ms,
            total_buffering_ms,
            rebuffer_ratio_pct,
            duration_seconds,
            complete: true,
            completed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jitter_result_finalized() {
        let sample = MeasurementSample {
            round_trip_ms: 48.0,
            packet_loss_pct: 0.2,
            jitter_ms: 6.5,
        };
        let result = JitterResult::finalized(sample, 4.32, 9);

        assert!(result.complete);
        assert_eq!(result.sample_count, 9);
        assert_eq!(result.jitter_ms, 6.5);
        assert_eq!(result.quality(), QualityLevel::Excellent);
    }

    #[test]
    fn test_throughput_exhausted_zeroes_metrics() {
        let result = ThroughputResult::exhausted(4);

        assert!(!result.success);
        assert!(result.complete);
        assert_eq!(result.download_mbps, 0.0);
        assert_eq!(result.upload_mbps, 0.0);
        assert_eq!(result.rtt_ms, 0.0);
        assert_eq!(result.attempts, 4);
        assert!(result.endpoint.is_none());
    }

    #[test]
    fn test_video_rebuffer_ratio() {
        // 6.0 s of buffering over a 120 s clip is exactly 5%
        let result = VideoResult::finalized(850.0, 6_000.0, 120.0);

        assert!(result.complete);
        assert!((result.rebuffer_ratio_pct - 5.0).abs() < 1e-9);
    }
}
