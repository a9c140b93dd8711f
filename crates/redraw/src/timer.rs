//! Auto-repeating timer backed by a dedicated ticker thread.
//!
//! The tick callback runs on the ticker thread itself, so a slow callback
//! delays later ticks instead of overlapping them. Missed ticks are never
//! replayed: after a late tick the next deadline is one interval from now.

use std::io;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct TimerState {
    interval: Duration,
    armed: bool,
    /// `None` when the interval reaches past the representable clock range;
    /// such a timer is armed but never fires.
    deadline: Option<Instant>,
    disposed: bool,
}

#[derive(Debug)]
struct TimerShared {
    state: Mutex<TimerState>,
    wake: Condvar,
}

/// Control handle for the timer. Clones control the same ticker.
#[derive(Debug, Clone)]
pub struct RepeatingTimer {
    shared: Arc<TimerShared>,
}

impl RepeatingTimer {
    /// Create a stopped timer. Nothing ticks until [`spawn_ticker`] and
    /// [`start`] have both been called.
    ///
    /// [`spawn_ticker`]: RepeatingTimer::spawn_ticker
    /// [`start`]: RepeatingTimer::start
    pub fn new(interval: Duration) -> Self {
        Self {
            shared: Arc::new(TimerShared {
                state: Mutex::new(TimerState {
                    interval,
                    armed: false,
                    deadline: None,
                    disposed: false,
                }),
                wake: Condvar::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, TimerState> {
        self.shared.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn the thread that invokes `on_tick` at every deadline. The thread
    /// exits once the timer is disposed.
    pub fn spawn_ticker<F>(&self, name: &str, on_tick: F) -> io::Result<JoinHandle<()>>
    where
        F: Fn() + Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run_ticker(&shared, on_tick))
    }

    /// Arm the timer; the first tick fires one interval from now.
    pub fn start(&self) {
        let mut state = self.state();
        if state.disposed {
            return;
        }
        let interval = state.interval;
        state.armed = true;
        state.deadline = Instant::now().checked_add(interval);
        self.shared.wake.notify_all();
    }

    /// Disarm the timer. A tick callback already running is not affected.
    pub fn stop(&self) {
        self.state().armed = false;
        self.shared.wake.notify_all();
    }

    pub fn is_armed(&self) -> bool {
        self.state().armed
    }

    pub fn interval(&self) -> Duration {
        self.state().interval
    }

    /// Change the interval. A running timer is re-anchored so the next tick
    /// fires one new interval from now.
    pub fn set_interval(&self, interval: Duration) {
        let mut state = self.state();
        state.interval = interval;
        if state.armed {
            state.deadline = Instant::now().checked_add(interval);
            self.shared.wake.notify_all();
        }
    }

    /// Stop for good and let the ticker thread exit. Idempotent.
    pub fn dispose(&self) {
        let mut state = self.state();
        state.armed = false;
        state.disposed = true;
        self.shared.wake.notify_all();
    }

    pub fn is_disposed(&self) -> bool {
        self.state().disposed
    }
}

fn run_ticker(shared: &TimerShared, on_tick: impl Fn()) {
    loop {
        {
            let mut state = shared.state.lock().unwrap_or_else(PoisonError::into_inner);
            let deadline = loop {
                if state.disposed {
                    return;
                }
                let pending = if state.armed { state.deadline } else { None };
                let Some(deadline) = pending else {
                    state = shared.wake.wait(state).unwrap_or_else(PoisonError::into_inner);
                    continue;
                };
                let now = Instant::now();
                if now >= deadline {
                    break deadline;
                }
                state = shared
                    .wake
                    .wait_timeout(state, deadline - now)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0;
            };

            let now = Instant::now();
            let interval = state.interval;
            state.deadline = deadline
                .checked_add(interval)
                .filter(|next| *next > now)
                .or_else(|| now.checked_add(interval));
        }
        on_tick();
    }
}

/// Whether a timer could be armed with `interval` without the deadline
/// overflowing the clock.
pub fn is_schedulable(interval: Duration) -> bool {
    !interval.is_zero() && Instant::now().checked_add(interval).is_some()
}
