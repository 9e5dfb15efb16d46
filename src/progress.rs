// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Progress reporting for cascade reloads
//!
//! The resolver reports each level listing as it starts and finishes,
//! which the REPL displays as a spinner.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;

use crate::cascade::Level;

/// Create a spinner with consistent styling
pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner:.cyan} {msg} {elapsed:.dim}")
    {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

/// Progress update message
#[derive(Clone, Debug)]
pub enum ProgressUpdate {
    /// A level listing request was issued
    LevelLoading { level: Level, request: String },
    /// A level listing completed
    LevelLoaded {
        level: Level,
        options: usize,
        elapsed_ms: u64,
    },
    /// A level listing failed; the level has no options
    LevelFailed { level: Level, message: String },
    /// The instance listing was served from the cache
    CacheHit { scope: i64 },
    /// The metrics query was (re)issued
    QueryTriggered { stamp: i64 },
}

/// Progress reporter shared between the resolver and the shell
pub struct ProgressReporter {
    sender: broadcast::Sender<ProgressUpdate>,
    /// Requests completed since the last reset
    requests_done: AtomicUsize,
    /// Requests issued since the last reset
    requests_total: AtomicUsize,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self {
            sender,
            requests_done: AtomicUsize::new(0),
            requests_total: AtomicUsize::new(0),
        }
    }

    /// Subscribe to progress updates
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressUpdate> {
        self.sender.subscribe()
    }

    /// Reset counters before a user command
    pub fn reset(&self) {
        self.requests_done.store(0, Ordering::SeqCst);
        self.requests_total.store(0, Ordering::SeqCst);
    }

    /// Report a listing request for `level`
    pub fn level_loading(&self, level: Level, request: &str) {
        self.requests_total.fetch_add(1, Ordering::SeqCst);
        let _ = self.sender.send(ProgressUpdate::LevelLoading {
            level,
            request: request.to_string(),
        });
    }

    /// Report a completed listing
    pub fn level_loaded(&self, level: Level, options: usize, elapsed_ms: u64) {
        self.requests_done.fetch_add(1, Ordering::SeqCst);
        let _ = self.sender.send(ProgressUpdate::LevelLoaded {
            level,
            options,
            elapsed_ms,
        });
    }

    /// Report a failed listing
    pub fn level_failed(&self, level: Level, message: &str) {
        self.requests_done.fetch_add(1, Ordering::SeqCst);
        let _ = self.sender.send(ProgressUpdate::LevelFailed {
            level,
            message: message.to_string(),
        });
    }

    pub fn cache_hit(&self, scope: i64) {
        let _ = self.sender.send(ProgressUpdate::CacheHit { scope });
    }

    pub fn query_triggered(&self, stamp: i64) {
        let _ = self.sender.send(ProgressUpdate::QueryTriggered { stamp });
    }

    /// Get current progress (done/total)
    pub fn progress(&self) -> (usize, usize) {
        (
            self.requests_done.load(Ordering::SeqCst),
            self.requests_total.load(Ordering::SeqCst),
        )
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe handle to progress reporter
pub type ProgressHandle = Arc<ProgressReporter>;

/// Create a new progress reporter handle
pub fn create_progress_handle() -> ProgressHandle {
    Arc::new(ProgressReporter::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_reporter_new() {
        let reporter = ProgressReporter::default();
        assert_eq!(reporter.progress(), (0, 0));
    }

    #[test]
    fn test_counters_follow_requests() {
        let reporter = ProgressReporter::new();
        reporter.level_loading(Level::Group, "AutoCompleteGroupReq");
        reporter.level_loading(Level::Resource, "AutoCompleteHostReq");
        assert_eq!(reporter.progress(), (0, 2));

        reporter.level_loaded(Level::Group, 3, 10);
        reporter.level_failed(Level::Resource, "Network Error");
        assert_eq!(reporter.progress(), (2, 2));

        reporter.reset();
        assert_eq!(reporter.progress(), (0, 0));
    }

    #[test]
    fn test_subscribe_receives_updates() {
        let reporter = ProgressReporter::new();
        let mut receiver = reporter.subscribe();

        reporter.level_loading(Level::Instance, "AllInstanceReq");
        reporter.cache_hit(88);
        reporter.level_loaded(Level::Instance, 3, 0);
        reporter.query_triggered(1);

        let updates: Vec<_> = std::iter::from_fn(|| receiver.try_recv().ok()).collect();
        assert_eq!(updates.len(), 4);
        assert!(matches!(
            updates[0],
            ProgressUpdate::LevelLoading {
                level: Level::Instance,
                ..
            }
        ));
        assert!(matches!(updates[1], ProgressUpdate::CacheHit { scope: 88 }));
        assert!(matches!(
            updates[2],
            ProgressUpdate::LevelLoaded { options: 3, .. }
        ));
        assert!(matches!(updates[3], ProgressUpdate::QueryTriggered { stamp: 1 }));
    }

    #[test]
    fn test_send_without_subscribers_is_silent() {
        let handle = create_progress_handle();
        handle.level_failed(Level::Group, "boom");
        assert_eq!(handle.progress(), (1, 0));
    }
}
