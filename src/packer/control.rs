// Copyright (c) 2026 the srcpack contributors
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

/// Cooperative cancellation flag, checked before every directory entry and file.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

type ReportFn = dyn Fn(&str) + Send + Sync;

/// One-way progress notifications: a file's relative path or a phase label.
///
/// Reporting never blocks and never fails; an observer that has gone away is
/// simply not notified.
#[derive(Clone, Default)]
pub struct ProgressSink {
    report: Option<Arc<ReportFn>>,
}

impl ProgressSink {
    /// A sink that discards everything.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            report: Some(Arc::new(f)),
        }
    }

    /// A sink backed by an unbounded channel; the receiver may lag or be
    /// dropped without affecting the pack.
    pub fn channel() -> (Self, UnboundedReceiver<String>) {
        let (tx, rx) = unbounded_channel();
        let sink = Self::from_fn(move |unit| {
            let _ = tx.send(unit.to_string());
        });
        (sink, rx)
    }

    pub fn report(&self, unit: &str) {
        if let Some(report) = &self.report {
            report(unit);
        }
    }
}

impl std::fmt::Debug for ProgressSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSink")
            .field("attached", &self.report.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let token = CancelToken::new();
        let observer = token.clone();
        assert!(!observer.is_cancelled());
        token.cancel();
        assert!(observer.is_cancelled());
    }

    #[test]
    fn test_channel_sink_delivers_in_order() {
        let (sink, mut rx) = ProgressSink::channel();
        sink.report("src/a.rs");
        sink.report("src/b.rs");
        assert_eq!(rx.try_recv().ok().as_deref(), Some("src/a.rs"));
        assert_eq!(rx.try_recv().ok().as_deref(), Some("src/b.rs"));
    }

    #[test]
    fn test_dropped_receiver_is_ignored() {
        let (sink, rx) = ProgressSink::channel();
        drop(rx);
        sink.report("still fine");
    }
}
