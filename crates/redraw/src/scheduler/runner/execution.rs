use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use chrono::Utc;
use tracing::{debug, debug_span, warn};

use crate::pass::{PassHandle, PassReport, PassRunner, PassStatus};
use crate::scheduler::types::SchedulerEvent;

use super::core::{lock, SchedulerInner};

/// Outcome of an attempt to launch a pass.
pub(super) enum Launch {
    Started(u64),
    /// A previous pass is still in flight.
    Busy(PassHandle),
    Disposed,
}

/// Finishes the handle and frees the in-flight slot when the pass ends,
/// including when a strategy panics.
struct PassCompletion<'a> {
    inner: &'a SchedulerInner,
    handle: &'a PassHandle,
    /// Shapes advanced so far in this pass.
    progress: &'a AtomicUsize,
    status: PassStatus,
}

impl Drop for PassCompletion<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.inner.record_pass(&PassReport {
                pass_id: self.handle.id(),
                visited: self.progress.load(Ordering::Relaxed),
                status: PassStatus::Faulted,
                duration: self.handle.started_at().elapsed(),
                error: Some("strategy panicked".to_string()),
                finished_at: Utc::now(),
            });
        }

        self.handle.finish(self.status);
        let mut slot = lock(&self.inner.in_flight);
        if slot.as_ref().is_some_and(|h| h.id() == self.handle.id()) {
            *slot = None;
        }
    }
}

impl SchedulerInner {
    /// Timer callback. Runs on the ticker thread.
    pub(super) fn on_tick(self: &Arc<Self>) {
        match self.try_launch_pass(false) {
            Launch::Started(_) | Launch::Disposed => {}
            Launch::Busy(pending) => self.resolve_overload(pending),
        }
    }

    /// Launch a pass on the pool unless one is in flight or the scheduler is
    /// disposed. With `rearm_timer` the timer is restarted after a launch.
    pub(super) fn try_launch_pass(self: &Arc<Self>, rearm_timer: bool) -> Launch {
        let lifecycle = lock(&self.lifecycle);
        if lifecycle.disposed {
            return Launch::Disposed;
        }

        let mut slot = lock(&self.in_flight);
        if let Some(current) = slot.as_ref().filter(|h| !h.is_finished()) {
            return Launch::Busy(current.clone());
        }

        let pass_id = self.next_pass_id.fetch_add(1, Ordering::Relaxed) + 1;
        let handle = PassHandle::new(pass_id);
        *slot = Some(handle.clone());
        drop(slot);

        if let Ok(mut m) = self.metrics.write() {
            m.passes_started += 1;
        }

        let inner = Arc::clone(self);
        self.pool.spawn(move || inner.execute_pass(handle));

        if rearm_timer {
            self.timer.start();
        }
        drop(lifecycle);

        Launch::Started(pass_id)
    }

    fn execute_pass(&self, handle: PassHandle) {
        let span = debug_span!("redraw_pass", pass_id = handle.id());
        let _enter = span.enter();

        let progress = AtomicUsize::new(0);
        let mut completion = PassCompletion {
            inner: self,
            handle: &handle,
            progress: &progress,
            status: PassStatus::Faulted,
        };

        let report = PassRunner::new(&self.registry).run_with_progress(
            handle.id(),
            handle.token(),
            &progress,
        );
        completion.status = report.status;
        self.record_pass(&report);
    }

    /// Fold a finished pass into metrics and publish it.
    pub(super) fn record_pass(&self, report: &PassReport) {
        if let Ok(mut m) = self.metrics.write() {
            m.record_pass(report);
        }

        match report.status {
            PassStatus::Faulted => warn!(
                pass_id = report.pass_id,
                visited = report.visited,
                error = report.error.as_deref().unwrap_or("unknown"),
                "Redraw pass faulted"
            ),
            status => debug!(
                pass_id = report.pass_id,
                visited = report.visited,
                ?status,
                duration = ?report.duration,
                "Redraw pass finished"
            ),
        }

        let _ = self.events.send(SchedulerEvent::PassFinished(report.clone()));
    }
}
