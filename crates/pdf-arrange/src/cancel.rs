//! Cooperative cancellation and progress reporting
//!
//! A [`CancellationToken`] is a shared flag the UI sets and long-running
//! work polls at its checkpoints. A [`ProgressReporter`] receives
//! `(processed, total)` updates; a failing reporter is logged and ignored,
//! never allowed to abort the work it reports on.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

/// Shared cancel flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Clear the flag before a new run
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

/// Progress of a page-by-page operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

impl Progress {
    pub fn new(current: usize, total: usize) -> Self {
        Self { current, total }
    }

    /// Completion rounded to a whole percent
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.current as f64 / self.total as f64) * 100.0).round() as u32
    }

    pub fn fraction(&self) -> f32 {
        self.current as f32 / self.total.max(1) as f32
    }
}

pub type ReportError = Box<dyn std::error::Error + Send + Sync>;

/// Receives progress updates synchronously from a running operation.
pub trait ProgressReporter {
    fn report(&mut self, progress: Progress) -> std::result::Result<(), ReportError>;
}

impl<F> ProgressReporter for F
where
    F: FnMut(Progress),
{
    fn report(&mut self, progress: Progress) -> std::result::Result<(), ReportError> {
        self(progress);
        Ok(())
    }
}

/// Forwards updates over a channel, typically to a UI thread
#[derive(Debug, Clone)]
pub struct ChannelReporter(pub mpsc::UnboundedSender<Progress>);

impl ProgressReporter for ChannelReporter {
    fn report(&mut self, progress: Progress) -> std::result::Result<(), ReportError> {
        self.0.send(progress)?;
        Ok(())
    }
}

/// Reporter that discards every update
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&mut self, _progress: Progress) -> std::result::Result<(), ReportError> {
        Ok(())
    }
}

/// Deliver an update, logging rather than propagating reporter failures
pub(crate) fn report_quietly(reporter: &mut dyn ProgressReporter, progress: Progress) {
    if let Err(e) = reporter.report(progress) {
        log::warn!(
            "Progress reporter failed at {}/{}: {}",
            progress.current,
            progress.total,
            e
        );
    }
}
