//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// The three measurement probes supported by the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProbeKind {
    /// Loopback packet train with MOS estimation
    Jitter,
    /// Latency, download and upload measurement
    Throughput,
    /// Playback rebuffering measurement
    Video,
}

impl ProbeKind {
    /// All probes, in the order they run by default
    pub const ALL: [ProbeKind; 3] = [ProbeKind::Jitter, ProbeKind::Throughput, ProbeKind::Video];

    /// Stable registry key for this probe
    pub fn name(&self) -> &'static str {
        match self {
            ProbeKind::Jitter => "jitter",
            ProbeKind::Throughput => "throughput",
            ProbeKind::Video => "video",
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProbeKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "jitter" => Ok(ProbeKind::Jitter),
            "throughput" | "speed" => Ok(ProbeKind::Throughput),
            "video" => Ok(ProbeKind::Video),
            _ => Err(AppError::parse(format!(
                "Unknown probe '{}' (expected jitter, throughput or video)",
                s
            ))),
        }
    }
}

/// How a reducer collapses a stream of samples into one reported value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReductionPolicy {
    /// The most recent sample wins; earlier samples are discarded
    KeepLatest,
    /// Uniform mean over every sample observed during the run
    RunningAverage,
}

impl Default for ReductionPolicy {
    fn default() -> Self {
        Self::KeepLatest
    }
}

impl FromStr for ReductionPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "latest" | "keep-latest" => Ok(Self::KeepLatest),
            "average" | "running-average" => Ok(Self::RunningAverage),
            _ => Err(AppError::parse(format!(
                "Unknown reduction policy '{}' (expected latest or average)",
                s
            ))),
        }
    }
}

/// Perceived call quality classification derived from a MOS value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityLevel {
    /// MOS >= 4.0, indistinguishable from a clean line
    Excellent,
    /// MOS >= 3.6, minor impairments
    Good,
    /// MOS >= 3.1, noticeable but tolerable impairments
    Fair,
    /// Anything below
    Poor,
}

impl QualityLevel {
    /// Classify a MOS value in [1.0, 4.5]
    pub fn from_mos(mos: f64) -> Self {
        if mos >= 4.0 {
            Self::Excellent
        } else if mos >= 3.6 {
            Self::Good
        } else if mos >= 3.1 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
