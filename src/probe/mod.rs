//! Measurement probes and their abstract event/stat sources
//!
//! Each probe is an explicit state machine (Idle through Complete/Failed)
//! driven by an abstract source trait, so the measurement logic stays
//! independent of the transport or playback mechanism behind it.

pub mod jitter;
pub mod loopback;
pub mod playback;
pub mod throughput;
pub mod video;

pub use jitter::{JitterProbe, JitterProbeConfig};
pub use loopback::UdpLoopbackTransport;
pub use playback::{PlaybackEvent, PlaybackSource, ScriptedPlayback, SimulatedPlayback, TimedEvent};
pub use throughput::{ThroughputProbe, ThroughputProbeConfig};
pub use video::VideoProbe;

use crate::error::Result;
use crate::models::TransportSnapshot;
use async_trait::async_trait;
use std::fmt;

/// Lifecycle phase of a probe run.
///
/// Transitions are strictly sequential within one run:
/// Idle -> Negotiating/Loading -> Measuring -> Finalizing -> Complete,
/// with any step able to divert to Failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbePhase {
    Idle,
    /// Setting up transport (jitter probe)
    Negotiating,
    /// Waiting for the media resource to become playable (video probe)
    Loading,
    Measuring,
    Finalizing,
    Complete,
    Failed,
}

impl ProbePhase {
    /// Whether the run has reached a terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProbePhase::Complete | ProbePhase::Failed)
    }
}

impl fmt::Display for ProbePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProbePhase::Idle => "idle",
            ProbePhase::Negotiating => "negotiating",
            ProbePhase::Loading => "loading",
            ProbePhase::Measuring => "measuring",
            ProbePhase::Finalizing => "finalizing",
            ProbePhase::Complete => "complete",
            ProbePhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Periodic transport statistics source consumed by the jitter probe.
///
/// Implementations own the live transport resources; `shutdown` must tear
/// them down (close sockets, stop tasks) and is called on both the success
/// and failure paths before a new run may start.
#[async_trait]
pub trait TransportStatsSource: Send {
    /// Establish the transport (bind sockets, start traffic generation)
    async fn negotiate(&mut self) -> Result<()>;

    /// Take the current statistics snapshot.
    ///
    /// Returns `None` when no inbound data has been observed yet; consumers
    /// must tolerate a missing snapshot on any tick.
    async fn sample(&mut self) -> Result<Option<TransportSnapshot>>;

    /// Tear down live resources
    async fn shutdown(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_phases() {
        assert!(ProbePhase::Complete.is_terminal());
        assert!(ProbePhase::Failed.is_terminal());
        assert!(!ProbePhase::Idle.is_terminal());
        assert!(!ProbePhase::Measuring.is_terminal());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(ProbePhase::Negotiating.to_string(), "negotiating");
        assert_eq!(ProbePhase::Complete.to_string(), "complete");
    }
}
