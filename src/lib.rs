//! Network Quality Probe
//!
//! A network quality measurement tool that runs three independent probes
//! and merges their results into a shared summary: jitter/VoIP-MOS
//! estimation over a local loopback packet train, throughput/latency
//! measurement against HTTP endpoints, and video rebuffering analysis over
//! a simulated playback session.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod fallback;
pub mod logging;
pub mod models;
pub mod output;
pub mod probe;
pub mod registry;
pub mod scoring;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{Config, JitterResult, ThroughputResult, TransportSnapshot, VideoResult};
pub use registry::{RegistrySnapshot, ResultsRegistry, SummarySink};
pub use scoring::{estimate_mos, LatencyReducer, SampleReducer, ThroughputReducer};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    /// Poll cadence for transport statistics during the jitter probe.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
    /// Wall-clock duration of one jitter probe run.
    pub const DEFAULT_JITTER_DURATION: Duration = Duration::from_secs(20);
    /// RTT assumed when no transport-pair statistic has been observed yet.
    pub const DEFAULT_RTT_MS: f64 = 50.0;

    pub const DEFAULT_TRANSFER_BYTES: usize = 10 * 1024 * 1024;
    pub const DEFAULT_LATENCY_SAMPLES: u32 = 10;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub const DEFAULT_DOWNLOAD_URLS: &[&str] = &[
        "https://speed.hetzner.de/10MB.bin",
        "https://proof.ovh.net/files/10Mb.dat",
    ];
    pub const DEFAULT_UPLOAD_URL: &str = "https://httpbin.org/post";

    pub const DEFAULT_ENABLE_COLOR: bool = true;
}
