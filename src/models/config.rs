//! Configuration data model and validation

use crate::types::{AppError, ProbeKind, ReductionPolicy, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Probes to run, in order
    #[serde(default = "default_probes")]
    pub probes: Vec<ProbeKind>,

    /// Ordered download fallback candidates for the throughput probe
    #[serde(default = "default_download_urls")]
    pub download_urls: Vec<String>,

    /// Upload endpoint for the throughput probe
    #[serde(default = "default_upload_url")]
    pub upload_url: String,

    /// Media URL for the video probe; the probe is skipped when unset
    #[serde(default)]
    pub video_url: Option<String>,

    /// Declared playback duration of the media resource, in seconds
    #[serde(default = "default_video_duration_secs")]
    pub video_duration_secs: f64,

    /// Transfer payload size for download/upload measurement, in bytes
    #[serde(default = "default_transfer_bytes")]
    pub transfer_bytes: usize,

    /// Number of sequential round-trip measurements for the latency step
    #[serde(default = "default_latency_samples")]
    pub latency_samples: u32,

    /// Transport statistics poll interval, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Wall-clock duration of the jitter probe, in seconds
    #[serde(default = "default_jitter_duration_secs")]
    pub jitter_duration_secs: u64,

    /// Per-request timeout, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_seconds: u64,

    /// How the jitter probe reduces samples into its final score
    #[serde(default)]
    pub reduction_policy: ReductionPolicy,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            probes: default_probes(),
            download_urls: default_download_urls(),
            upload_url: default_upload_url(),
            video_url: None,
            video_duration_secs: default_video_duration_secs(),
            transfer_bytes: default_transfer_bytes(),
            latency_samples: default_latency_samples(),
            poll_interval_ms: default_poll_interval_ms(),
            jitter_duration_secs: default_jitter_duration_secs(),
            timeout_seconds: default_timeout_secs(),
            reduction_policy: ReductionPolicy::default(),
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get per-request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Get statistics poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Get jitter probe duration as Duration
    pub fn jitter_duration(&self) -> Duration {
        Duration::from_secs(self.jitter_duration_secs)
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.probes.is_empty() {
            return Err(AppError::config("At least one probe must be selected"));
        }

        for url in &self.download_urls {
            if url.is_empty() {
                return Err(AppError::config("Download URL cannot be empty"));
            }
            if let Err(e) = url::Url::parse(url) {
                return Err(AppError::config(format!("Invalid download URL '{}': {}", url, e)));
            }
        }

        if self.probes.contains(&ProbeKind::Throughput) && self.download_urls.is_empty() {
            return Err(AppError::config(
                "Throughput probe requires at least one download URL",
            ));
        }

        if let Err(e) = url::Url::parse(&self.upload_url) {
            return Err(AppError::config(format!(
                "Invalid upload URL '{}': {}",
                self.upload_url, e
            )));
        }

        if let Some(ref video_url) = self.video_url {
            if let Err(e) = url::Url::parse(video_url) {
                return Err(AppError::config(format!(
                    "Invalid video URL '{}': {}",
                    video_url, e
                )));
            }
        }

        if !self.video_duration_secs.is_finite() || self.video_duration_secs <= 0.0 {
            return Err(AppError::config(
                "Video duration must be a positive, finite number of seconds",
            ));
        }

        if self.transfer_bytes == 0 {
            return Err(AppError::config("Transfer size must be greater than 0"));
        }

        if self.transfer_bytes > 1024 * 1024 * 1024 {
            return Err(AppError::config("Transfer size cannot exceed 1 GiB"));
        }

        if self.latency_samples == 0 {
            return Err(AppError::config("Latency sample count must be greater than 0"));
        }

        if self.latency_samples > 100 {
            return Err(AppError::config("Latency sample count cannot exceed 100"));
        }

        if self.poll_interval_ms == 0 {
            return Err(AppError::config("Poll interval must be greater than 0"));
        }

        if self.jitter_duration_secs == 0 {
            return Err(AppError::config("Jitter probe duration must be greater than 0"));
        }

        if self.poll_interval() > self.jitter_duration() {
            return Err(AppError::config(
                "Poll interval cannot exceed the jitter probe duration",
            ));
        }

        if self.timeout_seconds == 0 {
            return Err(AppError::config("Timeout must be greater than 0"));
        }

        if self.timeout_seconds > 300 {
            return Err(AppError::config("Timeout cannot exceed 300 seconds"));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(probes) = std::env::var("NQP_PROBES") {
            self.probes = probes
                .split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(ProbeKind::from_str)
                .collect::<Result<Vec<_>>>()?;
        }

        if let Ok(urls) = std::env::var("NQP_DOWNLOAD_URLS") {
            self.download_urls = urls
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(upload_url) = std::env::var("NQP_UPLOAD_URL") {
            self.upload_url = upload_url;
        }

        if let Ok(video_url) = std::env::var("NQP_VIDEO_URL") {
            self.video_url = Some(video_url);
        }

        if let Ok(duration) = std::env::var("NQP_VIDEO_DURATION_SECS") {
            self.video_duration_secs = duration.parse().map_err(|e| {
                AppError::config(format!("Invalid NQP_VIDEO_DURATION_SECS '{}': {}", duration, e))
            })?;
        }

        if let Ok(bytes) = std::env::var("NQP_TRANSFER_BYTES") {
            self.transfer_bytes = bytes.parse().map_err(|e| {
                AppError::config(format!("Invalid NQP_TRANSFER_BYTES '{}': {}", bytes, e))
            })?;
        }

        if let Ok(samples) = std::env::var("NQP_LATENCY_SAMPLES") {
            self.latency_samples = samples.parse().map_err(|e| {
                AppError::config(format!("Invalid NQP_LATENCY_SAMPLES '{}': {}", samples, e))
            })?;
        }

        if let Ok(interval) = std::env::var("NQP_POLL_INTERVAL_MS") {
            self.poll_interval_ms = interval.parse().map_err(|e| {
                AppError::config(format!("Invalid NQP_POLL_INTERVAL_MS '{}': {}", interval, e))
            })?;
        }

        if let Ok(duration) = std::env::var("NQP_JITTER_DURATION_SECS") {
            self.jitter_duration_secs = duration.parse().map_err(|e| {
                AppError::config(format!(
                    "Invalid NQP_JITTER_DURATION_SECS '{}': {}",
                    duration, e
                ))
            })?;
        }

        if let Ok(timeout) = std::env::var("NQP_TIMEOUT_SECONDS") {
            self.timeout_seconds = timeout.parse().map_err(|e| {
                AppError::config(format!("Invalid NQP_TIMEOUT_SECONDS '{}': {}", timeout, e))
            })?;
        }

        if let Ok(policy) = std::env::var("NQP_REDUCTION_POLICY") {
            self.reduction_policy = policy.parse()?;
        }

        if let Ok(enable_color) = std::env::var("NQP_ENABLE_COLOR") {
            self.enable_color = enable_color.parse().map_err(|e| {
                AppError::config(format!("Invalid NQP_ENABLE_COLOR '{}': {}", enable_color, e))
            })?;
        }

        Ok(())
    }
}

// Default value functions for serde
fn default_probes() -> Vec<ProbeKind> {
    ProbeKind::ALL.to_vec()
}

fn default_download_urls() -> Vec<String> {
    crate::defaults::DEFAULT_DOWNLOAD_URLS
        .iter()
        .map(|&s| s.to_string())
        .collect()
}

fn default_upload_url() -> String {
    crate::defaults::DEFAULT_UPLOAD_URL.to_string()
}

fn default_video_duration_secs() -> f64 {
    15.0
}

fn default_transfer_bytes() -> usize {
    crate::defaults::DEFAULT_TRANSFER_BYTES
}

fn default_latency_samples() -> u32 {
    crate::defaults::DEFAULT_LATENCY_SAMPLES
}

fn default_poll_interval_ms() -> u64 {
    crate::defaults::DEFAULT_POLL_INTERVAL.as_millis() as u64
}

fn default_jitter_duration_secs() -> u64 {
    crate::defaults::DEFAULT_JITTER_DURATION.as_secs()
}

fn default_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_TIMEOUT.as_secs()
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}
