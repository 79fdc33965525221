//! Playback event sources for the video probe
//!
//! The video probe consumes an ordered stream of timed playback events
//! through the [`PlaybackSource`] trait. [`ScriptedPlayback`] replays a
//! fixed event list for deterministic tests; [`SimulatedPlayback`] streams
//! a real media resource over HTTP and models a fixed-bitrate player over
//! the observed byte arrivals, so stalls reflect the actual network path.

use crate::error::{AppError, Result};
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Media seconds that must be buffered before playback starts
const CANPLAY_BUFFER_SECS: f64 = 2.0;

/// A playback lifecycle event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackEvent {
    /// Resource fetch has begun
    LoadStart,
    /// The declared playback duration is known
    Metadata { duration_seconds: f64 },
    /// Enough data is buffered for playback to begin
    CanPlay,
    /// Playback stalled waiting for data
    Waiting,
    /// Playback resumed after a stall
    Playing,
    /// Playback reached the end of the media
    Ended,
    /// The resource failed to load or decode; code 4 denotes a missing
    /// or unsupported resource
    Error { code: u32 },
}

/// A playback event stamped with its offset from the start of the run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedEvent {
    /// Time since `start` was called
    pub offset: Duration,
    /// What happened
    pub event: PlaybackEvent,
}

impl TimedEvent {
    pub fn new(offset: Duration, event: PlaybackEvent) -> Self {
        Self { offset, event }
    }

    fn at_secs(offset_secs: f64, event: PlaybackEvent) -> Self {
        Self::new(Duration::from_secs_f64(offset_secs.max(0.0)), event)
    }
}

/// Ordered source of playback events consumed by the video probe.
///
/// `next_event` returns `None` once the source is drained; the probe treats
/// a drain before `Ended` or `Error` as a truncated run.
#[async_trait]
pub trait PlaybackSource: Send {
    /// Begin loading the media resource
    async fn start(&mut self) -> Result<()>;

    /// The next event in offset order, or `None` when drained
    async fn next_event(&mut self) -> Result<Option<TimedEvent>>;
}

/// Deterministic playback source replaying a fixed event list
pub struct ScriptedPlayback {
    events: VecDeque<TimedEvent>,
    started: bool,
}

impl ScriptedPlayback {
    pub fn new(events: Vec<TimedEvent>) -> Self {
        Self {
            events: events.into(),
            started: false,
        }
    }
}

#[async_trait]
impl PlaybackSource for ScriptedPlayback {
    async fn start(&mut self) -> Result<()> {
        self.started = true;
        Ok(())
    }

    async fn next_event(&mut self) -> Result<Option<TimedEvent>> {
        if !self.started {
            return Err(AppError::probe("playback source was not started"));
        }
        Ok(self.events.pop_front())
    }
}

/// HTTP streaming playback source.
///
/// Downloads the media resource while recording byte-arrival timestamps,
/// then models a constant-bitrate player over the arrival curve: the
/// resource's bytes are spread evenly across the declared duration, playback
/// begins once a small buffer is filled and stalls whenever the playhead
/// catches up with the downloaded bytes.
pub struct SimulatedPlayback {
    client: reqwest::Client,
    url: String,
    declared_duration_secs: f64,
    queue: VecDeque<TimedEvent>,
    started: bool,
}

impl SimulatedPlayback {
    /// Create a source for the given media URL and declared duration
    pub fn new(url: String, declared_duration_secs: f64, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("{}/{}", crate::PKG_NAME, crate::VERSION))
            .build()
            .map_err(AppError::from)?;
        Ok(Self::with_client(client, url, declared_duration_secs))
    }

    /// Create a source over an existing HTTP client
    pub fn with_client(client: reqwest::Client, url: String, declared_duration_secs: f64) -> Self {
        Self {
            client,
            url,
            declared_duration_secs,
            queue: VecDeque::new(),
            started: false,
        }
    }

    fn cache_busted_url(&self) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}cb={}", self.url, separator, Uuid::new_v4())
    }
}

#[async_trait]
impl PlaybackSource for SimulatedPlayback {
    async fn start(&mut self) -> Result<()> {
        self.started = true;
        self.queue
            .push_back(TimedEvent::new(Duration::ZERO, PlaybackEvent::LoadStart));

        let duration = self.declared_duration_secs;
        if !duration.is_finite() || duration <= 0.0 {
            // Surface the bad duration through metadata; the probe rejects it
            self.queue.push_back(TimedEvent::new(
                Duration::ZERO,
                PlaybackEvent::Metadata {
                    duration_seconds: duration,
                },
            ));
            return Ok(());
        }

        let epoch = Instant::now();
        let response = self
            .client
            .get(self.cache_busted_url())
            .send()
            .await
            .map_err(AppError::from)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE {
            self.queue.push_back(TimedEvent::new(
                epoch.elapsed(),
                PlaybackEvent::Error { code: 4 },
            ));
            return Ok(());
        }
        if !status.is_success() {
            return Err(AppError::http_request(format!(
                "media endpoint {} returned status {}",
                self.url, status
            )));
        }

        // Record the arrival curve: (elapsed seconds, cumulative bytes)
        let mut samples: Vec<(f64, u64)> = Vec::new();
        let mut cumulative: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(AppError::from)?;
            cumulative += chunk.len() as u64;
            samples.push((epoch.elapsed().as_secs_f64(), cumulative));
        }

        if cumulative == 0 {
            self.queue.push_back(TimedEvent::new(
                epoch.elapsed(),
                PlaybackEvent::Error { code: 2 },
            ));
            return Ok(());
        }

        for event in simulate_timeline(&samples, cumulative, duration) {
            self.queue.push_back(event);
        }
        Ok(())
    }

    async fn next_event(&mut self) -> Result<Option<TimedEvent>> {
        if !self.started {
            return Err(AppError::probe("playback source was not started"));
        }
        Ok(self.queue.pop_front())
    }
}

/// Model a constant-bitrate player over a recorded byte-arrival curve.
///
/// The resource's bytes map evenly onto the declared duration. Playback
/// begins once [`CANPLAY_BUFFER_SECS`] of media are buffered (or the whole
/// resource has arrived), stalls when the playhead reaches the last buffered
/// media second and resumes with the chunk that extends the buffer.
fn simulate_timeline(samples: &[(f64, u64)], total_bytes: u64, duration: f64) -> Vec<TimedEvent> {
    let bytes_per_media_sec = total_bytes as f64 / duration;
    let media_avail = |cum: u64| (cum as f64 / bytes_per_media_sec).min(duration);

    let mut events = Vec::new();
    let first_arrival = samples.first().map_or(0.0, |&(t, _)| t);
    events.push(TimedEvent::at_secs(
        first_arrival,
        PlaybackEvent::Metadata {
            duration_seconds: duration,
        },
    ));

    let threshold = CANPLAY_BUFFER_SECS.min(duration);
    let canplay_index = samples
        .iter()
        .position(|&(_, cum)| media_avail(cum) >= threshold)
        .unwrap_or(samples.len().saturating_sub(1));
    let (canplay_time, canplay_bytes) = samples[canplay_index];
    events.push(TimedEvent::at_secs(canplay_time, PlaybackEvent::CanPlay));

    // Playhead walk: `clock` is the wall time at which playback last
    // (re)started from media position `pos`.
    let mut clock = canplay_time;
    let mut pos = 0.0;
    let mut avail = media_avail(canplay_bytes);

    for &(arrival, cum) in &samples[canplay_index + 1..] {
        let run_out = clock + (avail - pos);
        if avail < duration && arrival > run_out {
            events.push(TimedEvent::at_secs(run_out, PlaybackEvent::Waiting));
            events.push(TimedEvent::at_secs(arrival, PlaybackEvent::Playing));
            pos = avail;
            clock = arrival;
        }
        avail = media_avail(cum);
    }

    events.push(TimedEvent::at_secs(
        clock + (duration - pos),
        PlaybackEvent::Ended,
    ));
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offsets_of(events: &[TimedEvent], wanted: PlaybackEvent) -> Vec<f64> {
        events
            .iter()
            .filter(|e| e.event == wanted)
            .map(|e| e.offset.as_secs_f64())
            .collect()
    }

    #[tokio::test]
    async fn test_scripted_playback_replays_in_order() {
        let mut source = ScriptedPlayback::new(vec![
            TimedEvent::new(Duration::ZERO, PlaybackEvent::LoadStart),
            TimedEvent::new(Duration::from_millis(500), PlaybackEvent::CanPlay),
            TimedEvent::new(Duration::from_secs(10), PlaybackEvent::Ended),
        ]);

        source.start().await.unwrap();
        assert_eq!(
            source.next_event().await.unwrap().unwrap().event,
            PlaybackEvent::LoadStart
        );
        assert_eq!(
            source.next_event().await.unwrap().unwrap().event,
            PlaybackEvent::CanPlay
        );
        assert_eq!(
            source.next_event().await.unwrap().unwrap().event,
            PlaybackEvent::Ended
        );
        assert!(source.next_event().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_scripted_playback_requires_start() {
        let mut source = ScriptedPlayback::new(vec![]);
        assert!(source.next_event().await.is_err());
    }

    #[test]
    fn test_timeline_smooth_arrival_never_stalls() {
        // 1000 bytes over a 10 s clip: 100 bytes per media second.
        // Everything arrives within half a second.
        let samples = vec![(0.1, 300), (0.3, 700), (0.5, 1000)];
        let events = simulate_timeline(&samples, 1000, 10.0);

        assert!(offsets_of(&events, PlaybackEvent::Waiting).is_empty());
        let canplay = offsets_of(&events, PlaybackEvent::CanPlay);
        assert!((canplay[0] - 0.1).abs() < 1e-9);
        // Playback runs uninterrupted: ends 10 s after canplay
        let ended = offsets_of(&events, PlaybackEvent::Ended);
        assert!((ended[0] - 10.1).abs() < 1e-9);
    }

    #[test]
    fn test_timeline_slow_chunk_produces_a_stall() {
        // 100 bytes per media second; a gap between 1.0 s and 6.0 s starves
        // the buffer at 4 media seconds.
        let samples = vec![(0.0, 0), (0.5, 300), (1.0, 400), (6.0, 500), (6.2, 1000)];
        let events = simulate_timeline(&samples, 1000, 10.0);

        let canplay = offsets_of(&events, PlaybackEvent::CanPlay);
        assert!((canplay[0] - 0.5).abs() < 1e-9);

        // Buffer holds 4 media seconds at canplay, so the stall begins at
        // 0.5 + 4.0 and ends when the next chunk lands at 6.0.
        let waiting = offsets_of(&events, PlaybackEvent::Waiting);
        let playing = offsets_of(&events, PlaybackEvent::Playing);
        assert_eq!(waiting.len(), 1);
        assert!((waiting[0] - 4.5).abs() < 1e-9);
        assert!((playing[0] - 6.0).abs() < 1e-9);

        // 6 media seconds remain after the stall
        let ended = offsets_of(&events, PlaybackEvent::Ended);
        assert!((ended[0] - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_timeline_metadata_carries_declared_duration() {
        let samples = vec![(0.2, 1000)];
        let events = simulate_timeline(&samples, 1000, 42.0);

        match events[0].event {
            PlaybackEvent::Metadata { duration_seconds } => {
                assert_eq!(duration_seconds, 42.0)
            }
            other => panic!("expected metadata first, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_simulated_playback_rejects_bad_duration_via_metadata() {
        let mut source = SimulatedPlayback::with_client(
            reqwest::Client::new(),
            "http://127.0.0.1:9/unreachable".to_string(),
            0.0,
        );

        // No request is made for a degenerate duration; the metadata event
        // carries it for the probe to reject.
        source.start().await.unwrap();
        let first = source.next_event().await.unwrap().unwrap();
        assert_eq!(first.event, PlaybackEvent::LoadStart);
        let second = source.next_event().await.unwrap().unwrap();
        assert_eq!(
            second.event,
            PlaybackEvent::Metadata {
                duration_seconds: 0.0
            }
        );
    }
}
