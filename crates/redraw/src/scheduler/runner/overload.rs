use std::sync::Arc;

use tracing::debug;

use crate::pass::PassHandle;

use super::core::SchedulerInner;
use super::execution::Launch;

impl SchedulerInner {
    /// A tick found `pending` still running. Suspend the timer, wait for the
    /// in-flight pass to finish, then launch the next pass straight away and
    /// restart the timer from that moment.
    ///
    /// Blocks the ticker thread. Disposal is observed within one poll period.
    pub(super) fn resolve_overload(self: &Arc<Self>, mut pending: PassHandle) {
        self.timer.stop();
        if let Ok(mut m) = self.metrics.write() {
            m.overloads += 1;
        }
        debug!(pass_id = pending.id(), "Pass overran the interval, timer suspended");

        let poll = self.config.overload_poll();
        loop {
            pending.wait_timeout(poll);
            match self.try_launch_pass(true) {
                Launch::Started(pass_id) => {
                    debug!(pass_id, "Overload resolved, timer restarted");
                    return;
                }
                Launch::Disposed => return,
                Launch::Busy(handle) => pending = handle,
            }
        }
    }
}
