//! Shared results registry and summary notification
//!
//! An explicitly-owned aggregation context handed to each probe at
//! construction. Every probe owns exactly one entry and publishes a whole,
//! complete record at the end of its run; readers never observe a mix of
//! old and new fields for the same probe.

use crate::models::{JitterResult, ThroughputResult, VideoResult};
use crate::types::ProbeKind;
use std::sync::{Arc, Mutex, RwLock};

/// A point-in-time copy of every published probe result
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    pub jitter: Option<JitterResult>,
    pub throughput: Option<ThroughputResult>,
    pub video: Option<VideoResult>,
}

impl RegistrySnapshot {
    /// Whether a given probe has published a complete result
    pub fn is_complete(&self, kind: ProbeKind) -> bool {
        match kind {
            ProbeKind::Jitter => self.jitter.as_ref().map(|r| r.complete),
            ProbeKind::Throughput => self.throughput.as_ref().map(|r| r.complete),
            ProbeKind::Video => self.video.as_ref().map(|r| r.complete),
        }
        .unwrap_or(false)
    }

    /// Number of probes that have published
    pub fn published_count(&self) -> usize {
        [
            self.jitter.is_some(),
            self.throughput.is_some(),
            self.video.is_some(),
        ]
        .iter()
        .filter(|&&p| p)
        .count()
    }
}

/// Observer invoked after every publish with a fresh snapshot.
///
/// Implementations may render at any time; they must not assume all probes
/// have finished.
pub trait SummarySink: Send + Sync {
    fn on_publish(&self, kind: ProbeKind, snapshot: &RegistrySnapshot);
}

/// Process-wide registry mapping probe -> final result.
///
/// Initialized empty, mutated in place as each probe completes, never
/// cleared; a rerun of a probe overwrites its own entry only. Each entry is
/// swapped as a whole record under the lock, so partial writes are never
/// visible.
pub struct ResultsRegistry {
    entries: RwLock<RegistrySnapshot>,
    sinks: Mutex<Vec<Arc<dyn SummarySink>>>,
}

impl ResultsRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(RegistrySnapshot::default()),
            sinks: Mutex::new(Vec::new()),
        }
    }

    /// Register a summary sink notified after every publish
    pub fn add_sink(&self, sink: Arc<dyn SummarySink>) {
        self.sinks.lock().expect("sink lock poisoned").push(sink);
    }

    /// Publish the jitter probe's final result
    pub fn publish_jitter(&self, result: JitterResult) {
        debug_assert!(result.complete, "only complete records may be published");
        {
            let mut entries = self.entries.write().expect("registry lock poisoned");
            entries.jitter = Some(result);
        }
        self.notify(ProbeKind::Jitter);
    }

    /// Publish the throughput probe's final result
    pub fn publish_throughput(&self, result: ThroughputResult) {
        debug_assert!(result.complete, "only complete records may be published");
        {
            let mut entries = self.entries.write().expect("registry lock poisoned");
            entries.throughput = Some(result);
        }
        self.notify(ProbeKind::Throughput);
    }

    /// Publish the video probe's final result
    pub fn publish_video(&self, result: VideoResult) {
        debug_assert!(result.complete, "only complete records may be published");
        {
            let mut entries = self.entries.write().expect("registry lock poisoned");
            entries.video = Some(result);
        }
        self.notify(ProbeKind::Video);
    }

    /// Take a consistent copy of the current registry contents
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.entries.read().expect("registry lock poisoned").clone()
    }

    fn notify(&self, kind: ProbeKind) {
        let snapshot = self.snapshot();
        let sinks = self.sinks.lock().expect("sink lock poisoned").clone();
        for sink in sinks {
            sink.on_publish(kind, &snapshot);
        }
    }
}

impl Default for ResultsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
