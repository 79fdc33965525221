//! Throughput and latency probe
//!
//! Measures mean HTTP round-trip latency and sustained download speed
//! against an ordered list of fallback endpoints, then upload speed against
//! a single upload endpoint. Exhausting every download candidate publishes
//! an explicit failure record rather than leaving the registry entry empty.

use crate::error::{AppError, Result};
use crate::fallback::{self, FallbackOutcome};
use crate::logging::Logger;
use crate::models::{Config, ThroughputResult};
use crate::probe::ProbePhase;
use crate::registry::ResultsRegistry;
use crate::scoring::{bytes_to_mbps, LatencyReducer, ThroughputReducer};
use futures::StreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Upload bodies are capped; public echo endpoints commonly reject
/// multi-megabyte payloads
const UPLOAD_CAP_BYTES: usize = 2 * 1024 * 1024;

/// Throughput probe parameters
#[derive(Debug, Clone)]
pub struct ThroughputProbeConfig {
    /// Ordered download fallback candidates
    pub download_urls: Vec<String>,
    /// Upload endpoint
    pub upload_url: String,
    /// Bytes to transfer during the download step
    pub transfer_bytes: usize,
    /// Sequential round trips for the latency step
    pub latency_samples: u32,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ThroughputProbeConfig {
    fn default() -> Self {
        Self {
            download_urls: crate::defaults::DEFAULT_DOWNLOAD_URLS
                .iter()
                .map(|&s| s.to_string())
                .collect(),
            upload_url: crate::defaults::DEFAULT_UPLOAD_URL.to_string(),
            transfer_bytes: crate::defaults::DEFAULT_TRANSFER_BYTES,
            latency_samples: crate::defaults::DEFAULT_LATENCY_SAMPLES,
            timeout: crate::defaults::DEFAULT_TIMEOUT,
        }
    }
}

impl From<&Config> for ThroughputProbeConfig {
    fn from(config: &Config) -> Self {
        Self {
            download_urls: config.download_urls.clone(),
            upload_url: config.upload_url.clone(),
            transfer_bytes: config.transfer_bytes,
            latency_samples: config.latency_samples,
            timeout: config.timeout(),
        }
    }
}

/// Latency and download metrics measured against one candidate
#[derive(Debug)]
struct CandidateMeasurement {
    rtt_ms: f64,
    download_mbps: f64,
}

/// The throughput probe state machine
pub struct ThroughputProbe {
    client: reqwest::Client,
    config: ThroughputProbeConfig,
    registry: Arc<ResultsRegistry>,
    logger: Logger,
    phase: ProbePhase,
}

impl ThroughputProbe {
    /// Create a probe with its own HTTP client
    pub fn new(
        config: ThroughputProbeConfig,
        registry: Arc<ResultsRegistry>,
        logger: Logger,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("{}/{}", crate::PKG_NAME, crate::VERSION))
            .build()
            .map_err(AppError::from)?;
        Ok(Self::with_client(client, config, registry, logger))
    }

    /// Create a probe over an existing HTTP client
    pub fn with_client(
        client: reqwest::Client,
        config: ThroughputProbeConfig,
        registry: Arc<ResultsRegistry>,
        logger: Logger,
    ) -> Self {
        Self {
            client,
            config,
            registry,
            logger: logger.scoped("probe.throughput"),
            phase: ProbePhase::Idle,
        }
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> ProbePhase {
        self.phase
    }

    /// Run the probe to completion and publish the final result.
    ///
    /// The download step walks the candidate list in order and stops at the
    /// first endpoint that completes both the latency and download
    /// measurements. When every candidate fails, an explicit failure record
    /// (zeroed metrics, `success: false`) is published so downstream readers
    /// never observe a missing entry for a finished run.
    pub async fn run(&mut self) -> Result<ThroughputResult> {
        // The HTTP client is built at construction, so unlike the other
        // probes there is no Negotiating/Loading step before Measuring
        self.phase = ProbePhase::Measuring;

        let this: &Self = self;
        let outcome = fallback::try_each(
            &this.config.download_urls,
            |url| url.clone(),
            |url| {
                let url = url.clone();
                async move { this.measure_candidate(&url).await }
            },
            &this.logger,
        )
        .await;

        let attempts = outcome.attempt_count();
        self.phase = ProbePhase::Finalizing;

        let result = match outcome {
            FallbackOutcome::Success {
                candidate, value, ..
            } => {
                // Upload degradation is not fatal: the download half of the
                // result still stands, with upload reported as zero.
                let upload_mbps = match self.measure_upload().await {
                    Ok(mbps) => mbps,
                    Err(e) => {
                        self.logger
                            .warn(&format!("upload measurement failed: {}", e));
                        0.0
                    }
                };
                ThroughputResult::finalized(
                    value.download_mbps,
                    upload_mbps,
                    value.rtt_ms,
                    candidate,
                    attempts,
                )
            }
            FallbackOutcome::Exhausted { failures } => {
                self.logger.warn(&format!(
                    "all {} download candidates failed",
                    failures.len()
                ));
                ThroughputResult::exhausted(attempts)
            }
        };

        self.registry.publish_throughput(result.clone());
        self.phase = ProbePhase::Complete;

        if result.success {
            self.logger.info(&format!(
                "complete: {:.1} Mbps down, {:.1} Mbps up, {:.0} ms RTT via {}",
                result.download_mbps,
                result.upload_mbps,
                result.rtt_ms,
                result.endpoint.as_deref().unwrap_or("-")
            ));
        } else {
            self.logger.info(&format!(
                "complete: no reachable endpoint after {} attempts",
                result.attempts
            ));
        }

        Ok(result)
    }

    /// Measure latency then download speed against a single candidate
    async fn measure_candidate(&self, url: &str) -> Result<CandidateMeasurement> {
        let rtt_ms = self.measure_latency(url).await?;
        self.logger
            .debug(&format!("{}: mean RTT {:.0} ms", url, rtt_ms));

        let download_mbps = self.measure_download(url).await?;
        self.logger
            .debug(&format!("{}: {:.1} Mbps download", url, download_mbps));

        Ok(CandidateMeasurement {
            rtt_ms,
            download_mbps,
        })
    }

    /// N sequential HEAD round trips, reduced to their mean
    async fn measure_latency(&self, url: &str) -> Result<f64> {
        let mut reducer = LatencyReducer::new();

        for _ in 0..self.config.latency_samples {
            let started = Instant::now();
            let response = self
                .client
                .head(cache_busted(url))
                .send()
                .await
                .map_err(AppError::from)?;
            if !response.status().is_success() {
                return Err(AppError::http_request(format!(
                    "latency endpoint {} returned status {}",
                    url,
                    response.status()
                )));
            }
            reducer.record(started.elapsed());
        }

        reducer.mean_ms()
    }

    /// Streamed download of up to `transfer_bytes`, reduced to the overall
    /// average speed
    async fn measure_download(&self, url: &str) -> Result<f64> {
        let response = self
            .client
            .get(cache_busted(url))
            .send()
            .await
            .map_err(AppError::from)?;
        if !response.status().is_success() {
            return Err(AppError::http_request(format!(
                "download endpoint {} returned status {}",
                url,
                response.status()
            )));
        }

        let mut reducer = ThroughputReducer::start(Instant::now());
        let mut cumulative: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(AppError::from)?;
            cumulative += chunk.len() as u64;
            if let Some(instantaneous) = reducer.record(cumulative, Instant::now()) {
                self.logger.trace(&format!(
                    "download tick: {} bytes, {:.1} Mbps",
                    cumulative, instantaneous
                ));
            }
            if cumulative >= self.config.transfer_bytes as u64 {
                break;
            }
        }

        if reducer.total_bytes() == 0 {
            return Err(AppError::http_request(format!(
                "download endpoint {} returned an empty body",
                url
            )));
        }

        reducer.finalize(Instant::now())
    }

    /// One timed POST of an incompressible payload
    async fn measure_upload(&self) -> Result<f64> {
        let payload = incompressible_payload(self.config.transfer_bytes.min(UPLOAD_CAP_BYTES));
        let payload_len = payload.len();

        let started = Instant::now();
        let response = self
            .client
            .post(cache_busted(&self.config.upload_url))
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(payload)
            .send()
            .await
            .map_err(AppError::from)?;
        if !response.status().is_success() {
            return Err(AppError::http_request(format!(
                "upload endpoint {} returned status {}",
                self.config.upload_url,
                response.status()
            )));
        }
        // The transfer is not complete until the body is drained
        let _ = response.bytes().await.map_err(AppError::from)?;
        let elapsed = started.elapsed();

        if elapsed.is_zero() {
            return Err(AppError::probe("upload completed with zero elapsed time"));
        }
        Ok(bytes_to_mbps(payload_len as f64 / elapsed.as_secs_f64()))
    }
}

fn cache_busted(url: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}cb={}", url, separator, Uuid::new_v4())
}

/// Fill a buffer with a cheap xorshift sequence so transparent compression
/// along the path cannot shrink the transfer
fn incompressible_payload(len: usize) -> Vec<u8> {
    let mut payload = Vec::with_capacity(len);
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    while payload.len() < len {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let bytes = state.to_le_bytes();
        let take = bytes.len().min(len - payload.len());
        payload.extend_from_slice(&bytes[..take]);
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_app_config() {
        let mut app_config = Config::default();
        app_config.download_urls = vec!["https://example.com/file.bin".to_string()];
        app_config.latency_samples = 5;
        app_config.transfer_bytes = 1024;

        let config = ThroughputProbeConfig::from(&app_config);
        assert_eq!(config.download_urls.len(), 1);
        assert_eq!(config.latency_samples, 5);
        assert_eq!(config.transfer_bytes, 1024);
        assert_eq!(config.timeout, app_config.timeout());
    }

    #[test]
    fn test_cache_busting_appends_query() {
        let busted = cache_busted("https://example.com/file.bin");
        assert!(busted.starts_with("https://example.com/file.bin?cb="));

        let busted = cache_busted("https://example.com/file.bin?size=10");
        assert!(busted.starts_with("https://example.com/file.bin?size=10&cb="));
    }

    #[test]
    fn test_incompressible_payload_length_and_variety() {
        let payload = incompressible_payload(1000);
        assert_eq!(payload.len(), 1000);

        // A constant-filled buffer would compress away; the xorshift fill
        // must produce many distinct byte values.
        let mut seen = [false; 256];
        for &b in &payload {
            seen[b as usize] = true;
        }
        assert!(seen.iter().filter(|&&s| s).count() > 100);
    }

    #[test]
    fn test_probe_starts_idle() {
        let registry = Arc::new(ResultsRegistry::new());
        let probe = ThroughputProbe::new(
            ThroughputProbeConfig::default(),
            registry,
            Logger::new("test", crate::logging::LogLevel::Error, false),
        )
        .unwrap();
        assert_eq!(probe.phase(), ProbePhase::Idle);
    }
}
