use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::pass::{PassReport, PassStatus};

/// Scheduler operational metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RedrawMetrics {
    /// Passes handed to the pass pool.
    pub passes_started: u64,
    pub passes_completed: u64,
    pub passes_cancelled: u64,
    pub passes_faulted: u64,
    /// Ticks that found the previous pass still in flight.
    pub overloads: u64,
    /// Total strategy steps applied across all passes.
    pub shapes_advanced: u64,
    /// Duration of the last pass that was not faulted.
    pub last_pass_duration: Option<Duration>,
    /// Average duration over non-faulted passes.
    pub avg_pass_duration: Duration,
    pub max_pass_duration: Duration,
    pub last_pass_at: Option<DateTime<Utc>>,
}

impl RedrawMetrics {
    /// Passes started but not yet finished. Never more than one.
    pub fn passes_in_flight(&self) -> u64 {
        self.passes_started
            .saturating_sub(self.passes_completed + self.passes_cancelled + self.passes_faulted)
    }

    /// Record a finished pass. Faulted passes are counted but leave the
    /// duration statistics alone.
    pub fn record_pass(&mut self, report: &PassReport) {
        self.shapes_advanced += report.visited as u64;
        match report.status {
            PassStatus::Completed => self.passes_completed += 1,
            PassStatus::Cancelled => self.passes_cancelled += 1,
            PassStatus::Faulted => {
                self.passes_faulted += 1;
                return;
            }
            PassStatus::Running => return,
        }

        let timed = self.passes_completed + self.passes_cancelled;
        let duration = report.duration;

        // Incremental mean: new_avg = prev_avg + (duration - prev_avg) / count
        self.avg_pass_duration = if timed == 1 {
            duration
        } else {
            let prev_nanos = self.avg_pass_duration.as_nanos() as f64;
            let cur_nanos = duration.as_nanos() as f64;
            let avg_nanos = prev_nanos + (cur_nanos - prev_nanos) / timed as f64;
            Duration::from_nanos(avg_nanos as u64)
        };

        self.max_pass_duration = self.max_pass_duration.max(duration);
        self.last_pass_duration = Some(duration);
        self.last_pass_at = Some(report.finished_at);
    }
}
