//! Data models and structures for the network quality probe

pub mod config;
pub mod metrics;

// Re-export main model types
pub use config::Config;
pub use metrics::{
    JitterResult, MeasurementSample, ThroughputResult, TransportSnapshot, VideoResult,
};
