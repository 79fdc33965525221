//! Jitter/MOS probe
//!
//! Drives a transport statistics source for a fixed wall-clock duration,
//! reducing each snapshot into a live MOS estimate and publishing the final
//! score into the results registry.

use crate::error::Result;
use crate::logging::Logger;
use crate::models::{Config, JitterResult};
use crate::probe::{ProbePhase, TransportStatsSource};
use crate::registry::ResultsRegistry;
use crate::scoring::SampleReducer;
use crate::types::ReductionPolicy;
use std::sync::Arc;
use std::time::Duration;

/// Jitter probe parameters
#[derive(Debug, Clone)]
pub struct JitterProbeConfig {
    /// Statistics poll cadence
    pub poll_interval: Duration,
    /// Total run duration
    pub duration: Duration,
    /// Final-value reduction policy
    pub policy: ReductionPolicy,
    /// RTT assumed until a transport-pair statistic arrives
    pub default_rtt_ms: f64,
}

impl Default for JitterProbeConfig {
    fn default() -> Self {
        Self {
            poll_interval: crate::defaults::DEFAULT_POLL_INTERVAL,
            duration: crate::defaults::DEFAULT_JITTER_DURATION,
            policy: ReductionPolicy::default(),
            default_rtt_ms: crate::defaults::DEFAULT_RTT_MS,
        }
    }
}

impl From<&Config> for JitterProbeConfig {
    fn from(config: &Config) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            duration: config.jitter_duration(),
            policy: config.reduction_policy,
            default_rtt_ms: crate::defaults::DEFAULT_RTT_MS,
        }
    }
}

/// The jitter probe state machine
pub struct JitterProbe<S: TransportStatsSource> {
    source: S,
    config: JitterProbeConfig,
    registry: Arc<ResultsRegistry>,
    logger: Logger,
    phase: ProbePhase,
}

impl<S: TransportStatsSource> JitterProbe<S> {
    /// Create a probe over the given statistics source
    pub fn new(
        source: S,
        config: JitterProbeConfig,
        registry: Arc<ResultsRegistry>,
        logger: Logger,
    ) -> Self {
        Self {
            source,
            config,
            registry,
            logger: logger.scoped("probe.jitter"),
            phase: ProbePhase::Idle,
        }
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> ProbePhase {
        self.phase
    }

    /// Run the probe to completion and publish the final result.
    ///
    /// Any failure tears down the source's live resources and leaves the
    /// probe in the Failed phase; no partial result reaches the registry.
    pub async fn run(&mut self) -> Result<JitterResult> {
        // Not reachable through Config::validate, but the config struct has
        // public fields and a zero cadence would otherwise divide by zero
        if self.config.poll_interval.is_zero() {
            self.phase = ProbePhase::Failed;
            return Err(crate::error::AppError::probe(
                "poll interval must be greater than zero",
            ));
        }

        self.phase = ProbePhase::Negotiating;
        self.logger.info("negotiating loopback transport");

        if let Err(e) = self.source.negotiate().await {
            return Err(self.fail(e).await);
        }

        self.phase = ProbePhase::Measuring;
        let mut reducer = SampleReducer::new(self.config.policy, self.config.default_rtt_ms);

        let ticks = (self.config.duration.as_millis() / self.config.poll_interval.as_millis())
            .max(1) as u64;
        self.logger.debug(&format!(
            "measuring for {:?} ({} polls every {:?})",
            self.config.duration, ticks, self.config.poll_interval
        ));

        for tick in 0..ticks {
            tokio::time::sleep(self.config.poll_interval).await;

            match self.source.sample().await {
                Ok(Some(snapshot)) => {
                    let (sample, mos) = reducer.observe(&snapshot);
                    self.logger.log(
                        crate::logging::LogLevel::Debug,
                        "tick reduced",
                        &[
                            ("tick", tick.to_string()),
                            ("mos", format!("{:.2}", mos)),
                            ("jitter_ms", format!("{:.2}", sample.jitter_ms)),
                            ("loss_pct", format!("{:.1}", sample.packet_loss_pct)),
                            ("rtt_ms", format!("{:.0}", sample.round_trip_ms)),
                        ],
                    );
                }
                Ok(None) => {
                    self.logger.debug("waiting for inbound data");
                }
                Err(e) => {
                    return Err(self.fail(e).await);
                }
            }
        }

        self.phase = ProbePhase::Finalizing;
        if let Err(e) = self.source.shutdown().await {
            self.logger.warn(&format!("shutdown reported: {}", e));
        }

        let (sample, mos) = match reducer.finalize() {
            Ok(reduced) => reduced,
            Err(e) => {
                self.phase = ProbePhase::Failed;
                return Err(e);
            }
        };

        let result = JitterResult::finalized(sample, mos, reducer.sample_count());
        self.registry.publish_jitter(result.clone());
        self.phase = ProbePhase::Complete;
        self.logger.info(&format!(
            "complete: MOS {:.2} ({}), jitter {:.2} ms",
            result.mos,
            result.quality(),
            result.jitter_ms
        ));

        Ok(result)
    }

    async fn fail(&mut self, error: crate::error::AppError) -> crate::error::AppError {
        if let Err(e) = self.source.shutdown().await {
            self.logger.warn(&format!("shutdown after failure reported: {}", e));
        }
        self.phase = ProbePhase::Failed;
        self.logger.error(&format!("probe failed: {}", error));
        error
    }
}
