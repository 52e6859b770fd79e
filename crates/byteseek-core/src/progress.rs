//! Progress and status reporting for one analysis session.
//!
//! Advisory only: nothing here gates correctness. Consumers implement
//! `StatusObserver` (a UI, a CLI spinner, a test recorder) or use
//! `ChannelObserver` to receive events on a tokio channel.

use std::sync::Mutex;

/// Receives human-readable phase messages and a progress percentage.
pub trait StatusObserver: Send + Sync {
    fn on_status(&self, message: &str);

    fn on_progress(&self, _percent: u8) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl StatusObserver for NoopObserver {
    fn on_status(&self, _message: &str) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    Status(String),
    Progress(u8),
}

/// Forwards events to a tokio channel; drops them when the channel is full.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: tokio::sync::mpsc::Sender<StatusEvent>,
}

impl ChannelObserver {
    pub fn new(tx: tokio::sync::mpsc::Sender<StatusEvent>) -> Self {
        Self { tx }
    }
}

impl StatusObserver for ChannelObserver {
    fn on_status(&self, message: &str) {
        let _ = self.tx.try_send(StatusEvent::Status(message.to_string()));
    }

    fn on_progress(&self, percent: u8) {
        let _ = self.tx.try_send(StatusEvent::Progress(percent));
    }
}

/// Records events in memory; handy for tests and headless runs.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<StatusEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<StatusEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl StatusObserver for RecordingObserver {
    fn on_status(&self, message: &str) {
        if let Ok(mut events) = self.events.lock() {
            events.push(StatusEvent::Status(message.to_string()));
        }
    }

    fn on_progress(&self, percent: u8) {
        if let Ok(mut events) = self.events.lock() {
            events.push(StatusEvent::Progress(percent));
        }
    }
}

/// Monotonic fetched-byte counter mapped onto a percentage of an estimated workload.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    bytes_so_far: u64,
    estimated_workload: u64,
    finished: bool,
}

impl ProgressTracker {
    pub fn new(estimated_workload: u64) -> Self {
        Self {
            bytes_so_far: 0,
            estimated_workload: estimated_workload.max(1),
            finished: false,
        }
    }

    pub fn record(&mut self, bytes: u64) {
        self.bytes_so_far = self.bytes_so_far.saturating_add(bytes);
    }

    pub fn bytes_so_far(&self) -> u64 {
        self.bytes_so_far
    }

    /// `min(99, bytes / workload * 100)` while running; 100 once finished.
    pub fn percent(&self) -> u8 {
        if self.finished {
            return 100;
        }
        let pct = self.bytes_so_far.saturating_mul(100) / self.estimated_workload;
        pct.min(99) as u8
    }

    pub fn finish(&mut self) {
        self.finished = true;
    }
}
