use std::time::Duration;

use canvas_core::config::RedrawSettings;
use serde::{Deserialize, Serialize};

use crate::error::RedrawError;
use crate::pass::PassReport;
use crate::timer;

/// How often the overload loop re-checks the in-flight pass.
pub const DEFAULT_OVERLOAD_POLL: Duration = Duration::from_millis(5);

/// Scheduler lifecycle as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerState {
    /// Timer running, no pass in flight.
    Armed,
    /// Timer running, one pass in flight.
    Running,
    /// Timer suspended while waiting for an overrunning pass.
    Overloaded,
    /// Terminal.
    Disposed,
}

/// Change notifications published to [`subscribe`](super::RedrawScheduler::subscribe) receivers.
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    IntervalChanged(Duration),
    /// Emitted for every finished pass, whatever its status.
    PassFinished(PassReport),
    Disposed,
}

/// Scheduler configuration, typically parsed from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedrawConfig {
    /// Delay between pass launches, in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: f64,
    /// Overload poll step in milliseconds.
    #[serde(default = "default_overload_poll_ms")]
    pub overload_poll_ms: u64,
    /// Threads in the pass pool. 0 = available parallelism.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    /// Buffered events per subscriber before it starts lagging.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_interval_ms() -> f64 { 1.0 }
fn default_overload_poll_ms() -> u64 { DEFAULT_OVERLOAD_POLL.as_millis() as u64 }
fn default_worker_threads() -> usize { 1 }
fn default_event_capacity() -> usize { 256 }

impl Default for RedrawConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            overload_poll_ms: default_overload_poll_ms(),
            worker_threads: default_worker_threads(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl From<&RedrawSettings> for RedrawConfig {
    fn from(settings: &RedrawSettings) -> Self {
        Self {
            interval_ms: settings.interval_ms,
            overload_poll_ms: settings.overload_poll_ms,
            worker_threads: settings.worker_threads,
            event_capacity: settings.event_capacity,
        }
    }
}

impl RedrawConfig {
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval_ms: interval.as_secs_f64() * 1000.0,
            ..Self::default()
        }
    }

    /// Validated interval.
    pub fn interval(&self) -> Result<Duration, RedrawError> {
        interval_from_millis(self.interval_ms).and_then(validate_interval)
    }

    /// Poll step, never below one millisecond.
    pub fn overload_poll(&self) -> Duration {
        Duration::from_millis(self.overload_poll_ms.max(1))
    }

    /// Resolve pass pool size (0 means use available parallelism).
    pub fn resolved_worker_threads(&self) -> usize {
        if self.worker_threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            self.worker_threads
        }
    }

    pub fn resolved_event_capacity(&self) -> usize {
        self.event_capacity.max(1)
    }
}

/// Convert a millisecond interval, rejecting zero, negative and non-finite values.
pub fn interval_from_millis(ms: f64) -> Result<Duration, RedrawError> {
    let nanos = (ms * 1_000_000.0).round();
    if !ms.is_finite() || nanos < 1.0 || nanos >= u64::MAX as f64 {
        return Err(RedrawError::InvalidInterval(ms));
    }
    Ok(Duration::from_nanos(nanos as u64))
}

/// Reject intervals the timer cannot schedule: zero, or so long that the next
/// deadline would overflow the clock.
pub fn validate_interval(interval: Duration) -> Result<Duration, RedrawError> {
    if timer::is_schedulable(interval) {
        Ok(interval)
    } else {
        Err(RedrawError::InvalidInterval(interval.as_secs_f64() * 1000.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = RedrawConfig::default();
        assert_eq!(config.interval_ms, 1.0);
        assert_eq!(config.overload_poll_ms, 5);
        assert_eq!(config.worker_threads, 1);
        assert_eq!(config.event_capacity, 256);
        assert_eq!(config.overload_poll(), DEFAULT_OVERLOAD_POLL);
    }

    #[test]
    fn parses_partial_toml() {
        let config: RedrawConfig = toml::from_str("interval_ms = 16.5\nworker_threads = 2\n").unwrap();
        assert_eq!(config.interval_ms, 16.5);
        assert_eq!(config.worker_threads, 2);
        assert_eq!(config.overload_poll_ms, 5);
        assert_eq!(config.interval().unwrap(), Duration::from_micros(16_500));
    }

    #[test]
    fn interval_validation() {
        assert_eq!(interval_from_millis(1.0).unwrap(), Duration::from_millis(1));
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 1e-12] {
            assert!(
                matches!(interval_from_millis(bad), Err(RedrawError::InvalidInterval(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn unschedulable_durations_rejected() {
        assert_eq!(validate_interval(Duration::from_secs(3600)).unwrap(), Duration::from_secs(3600));
        assert!(matches!(validate_interval(Duration::ZERO), Err(RedrawError::InvalidInterval(_))));
        assert!(matches!(validate_interval(Duration::MAX), Err(RedrawError::InvalidInterval(_))));
    }

    #[test]
    fn zero_poll_is_clamped() {
        let config = RedrawConfig { overload_poll_ms: 0, ..RedrawConfig::default() };
        assert_eq!(config.overload_poll(), Duration::from_millis(1));
    }

    #[test]
    fn resolved_worker_threads() {
        let mut config = RedrawConfig::default();
        config.worker_threads = 0;
        assert!(config.resolved_worker_threads() > 0);

        config.worker_threads = 3;
        assert_eq!(config.resolved_worker_threads(), 3);
    }

    #[test]
    fn with_interval_round_trips() {
        let config = RedrawConfig::with_interval(Duration::from_millis(40));
        assert_eq!(config.interval().unwrap(), Duration::from_millis(40));
    }
}
