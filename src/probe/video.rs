//! Video rebuffering probe
//!
//! Consumes timed playback events from a [`PlaybackSource`], accumulating
//! the initial load latency and every stall interval, and publishes the
//! rebuffer ratio over the declared playback duration.

use crate::error::{AppError, Result};
use crate::logging::Logger;
use crate::models::VideoResult;
use crate::probe::{PlaybackEvent, PlaybackSource, ProbePhase};
use crate::registry::ResultsRegistry;
use std::sync::Arc;
use std::time::Duration;

/// The video probe state machine
pub struct VideoProbe<S: PlaybackSource> {
    source: S,
    registry: Arc<ResultsRegistry>,
    logger: Logger,
    phase: ProbePhase,
}

impl<S: PlaybackSource> VideoProbe<S> {
    /// Create a probe over the given playback source
    pub fn new(source: S, registry: Arc<ResultsRegistry>, logger: Logger) -> Self {
        Self {
            source,
            registry,
            logger: logger.scoped("probe.video"),
            phase: ProbePhase::Idle,
        }
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> ProbePhase {
        self.phase
    }

    /// Run the probe to completion and publish the final result.
    ///
    /// The declared duration must be a finite positive number of seconds;
    /// anything else is rejected before any ratio is computed, so the
    /// published record can never carry NaN or Infinity.
    pub async fn run(&mut self) -> Result<VideoResult> {
        self.phase = ProbePhase::Loading;
        self.logger.info("starting media load");

        if let Err(e) = self.source.start().await {
            return Err(self.fail(e));
        }

        let mut load_start: Option<Duration> = None;
        let mut initial_latency: Option<Duration> = None;
        let mut duration_seconds: Option<f64> = None;
        let mut stall_started: Option<Duration> = None;
        let mut total_buffering = Duration::ZERO;
        let mut ended = false;

        loop {
            let timed = match self.source.next_event().await {
                Ok(Some(timed)) => timed,
                Ok(None) => break,
                Err(e) => return Err(self.fail(e)),
            };

            match timed.event {
                PlaybackEvent::LoadStart => {
                    load_start = Some(timed.offset);
                }
                PlaybackEvent::Metadata {
                    duration_seconds: declared,
                } => {
                    if !declared.is_finite() || declared <= 0.0 {
                        return Err(self.fail(AppError::degenerate_input(format!(
                            "declared playback duration {} is not a positive number of seconds",
                            declared
                        ))));
                    }
                    duration_seconds = Some(declared);
                }
                PlaybackEvent::CanPlay => {
                    if initial_latency.is_none() {
                        let since_load =
                            timed.offset.saturating_sub(load_start.unwrap_or(Duration::ZERO));
                        initial_latency = Some(since_load);
                        self.phase = ProbePhase::Measuring;
                        self.logger.debug(&format!(
                            "playable after {:.0} ms",
                            since_load.as_secs_f64() * 1000.0
                        ));
                    }
                }
                PlaybackEvent::Waiting => {
                    if stall_started.is_none() {
                        stall_started = Some(timed.offset);
                        self.logger.debug(&format!(
                            "stall began at {:.2} s",
                            timed.offset.as_secs_f64()
                        ));
                    }
                }
                PlaybackEvent::Playing => {
                    if let Some(start) = stall_started.take() {
                        total_buffering += timed.offset.saturating_sub(start);
                    }
                }
                PlaybackEvent::Ended => {
                    // A stall still open at the end counts up to this point
                    if let Some(start) = stall_started.take() {
                        total_buffering += timed.offset.saturating_sub(start);
                    }
                    ended = true;
                    break;
                }
                PlaybackEvent::Error { code } => {
                    return Err(self.fail(AppError::media_code(code)));
                }
            }
        }

        self.phase = ProbePhase::Finalizing;

        if !ended {
            return Err(self.fail(AppError::probe(
                "playback event stream ended before the media finished",
            )));
        }
        let duration_seconds = match duration_seconds {
            Some(d) => d,
            None => {
                return Err(self.fail(AppError::degenerate_input(
                    "playback finished without ever reporting a duration",
                )))
            }
        };
        let initial_latency = initial_latency.unwrap_or(Duration::ZERO);

        let result = VideoResult::finalized(
            initial_latency.as_secs_f64() * 1000.0,
            total_buffering.as_secs_f64() * 1000.0,
            duration_seconds,
        );
        self.registry.publish_video(result.clone());
        self.phase = ProbePhase::Complete;
        self.logger.info(&format!(
            "complete: initial latency {:.0} ms, rebuffer ratio {:.2}%",
            result.initial_latency_ms, result.rebuffer_ratio_pct
        ));

        Ok(result)
    }

    fn fail(&mut self, error: AppError) -> AppError {
        self.phase = ProbePhase::Failed;
        self.logger.error(&format!("probe failed: {}", error));
        error
    }
}
