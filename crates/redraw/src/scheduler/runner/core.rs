use std::any::Any;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use canvas_core::Shape;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::error::RedrawError;
use crate::pass::PassHandle;
use crate::registry::ShapeRegistry;
use crate::scheduler::metrics::RedrawMetrics;
use crate::scheduler::types::{
    interval_from_millis, validate_interval, RedrawConfig, SchedulerEvent, SchedulerState,
};
use crate::timer::RepeatingTimer;

pub(super) struct Lifecycle {
    pub(super) disposed: bool,
}

/// State shared between the public handle, the ticker thread and running
/// passes.
///
/// Lock order when nested: `lifecycle` -> `in_flight` -> registry. The
/// timer and metrics locks are never held while taking another lock.
pub(super) struct SchedulerInner {
    pub(super) config: RedrawConfig,
    pub(super) lifecycle: Mutex<Lifecycle>,
    /// The single in-flight pass, if any.
    pub(super) in_flight: Mutex<Option<PassHandle>>,
    pub(super) registry: ShapeRegistry,
    pub(super) timer: RepeatingTimer,
    pub(super) pool: rayon::ThreadPool,
    pub(super) metrics: RwLock<RedrawMetrics>,
    pub(super) events: broadcast::Sender<SchedulerEvent>,
    pub(super) next_pass_id: AtomicU64,
}

pub(super) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "non-string panic payload"
    }
}

impl SchedulerInner {
    pub(super) fn is_disposed(&self) -> bool {
        lock(&self.lifecycle).disposed
    }

    /// Stop the timer and cancel the in-flight pass. Returns `false` if
    /// already disposed.
    pub(super) fn dispose(&self) -> bool {
        let mut lifecycle = lock(&self.lifecycle);
        if lifecycle.disposed {
            return false;
        }
        lifecycle.disposed = true;
        self.timer.dispose();
        if let Some(handle) = lock(&self.in_flight).as_ref() {
            handle.cancel();
        }
        drop(lifecycle);

        info!("Redraw scheduler disposed");
        let _ = self.events.send(SchedulerEvent::Disposed);
        true
    }
}

/// The redraw scheduler. Advances every tracked shape once per interval on a
/// background pass pool, with at most one pass in flight.
///
/// Dropping the scheduler disposes it.
pub struct RedrawScheduler {
    inner: Arc<SchedulerInner>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl RedrawScheduler {
    /// Create a scheduler and arm its timer immediately.
    pub fn new(config: RedrawConfig) -> Result<Self, RedrawError> {
        let interval = config.interval()?;
        let workers = config.resolved_worker_threads();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("redraw-pass-{i}"))
            .panic_handler(|payload| {
                error!(panic = panic_message(&*payload), "Redraw pass panicked");
            })
            .build()
            .map_err(|e| RedrawError::Startup(format!("pass pool: {e}")))?;

        let (events, _) = broadcast::channel(config.resolved_event_capacity());

        let inner = Arc::new(SchedulerInner {
            config,
            lifecycle: Mutex::new(Lifecycle { disposed: false }),
            in_flight: Mutex::new(None),
            registry: ShapeRegistry::new(),
            timer: RepeatingTimer::new(interval),
            pool,
            metrics: RwLock::new(RedrawMetrics::default()),
            events,
            next_pass_id: AtomicU64::new(0),
        });

        let weak = Arc::downgrade(&inner);
        let ticker = inner
            .timer
            .spawn_ticker("redraw-ticker", move || {
                if let Some(inner) = weak.upgrade() {
                    inner.on_tick();
                }
            })
            .map_err(|e| RedrawError::Startup(format!("ticker thread: {e}")))?;

        inner.timer.start();
        info!(interval = ?interval, workers, "Redraw scheduler started");

        Ok(Self {
            inner,
            ticker: Mutex::new(Some(ticker)),
        })
    }

    /// Create a scheduler with default settings and the given interval.
    pub fn with_interval(interval: Duration) -> Result<Self, RedrawError> {
        Self::new(RedrawConfig::with_interval(interval))
    }

    /// Track a shape. Returns `false` if it was already tracked.
    ///
    /// Shapes added during a pass may or may not be visited by it. After
    /// disposal the shape is still recorded but never advanced. Must not be
    /// called from a strategy running on this scheduler's pass.
    pub fn add_shape(&self, shape: &Arc<Shape>) -> bool {
        self.inner.registry.add(shape)
    }

    pub fn shape_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Live tracked shapes in pass order.
    pub fn shapes(&self) -> Vec<Arc<Shape>> {
        self.inner.registry.snapshot()
    }

    pub fn interval(&self) -> Result<Duration, RedrawError> {
        let lifecycle = lock(&self.inner.lifecycle);
        if lifecycle.disposed {
            return Err(RedrawError::Disposed);
        }
        Ok(self.inner.timer.interval())
    }

    /// Change the delay between passes. Takes effect from now on; a pass in
    /// flight is left alone. Zero and intervals too long to schedule are
    /// rejected and leave the current interval in place.
    pub fn set_interval(&self, interval: Duration) -> Result<(), RedrawError> {
        let lifecycle = lock(&self.inner.lifecycle);
        if lifecycle.disposed {
            return Err(RedrawError::Disposed);
        }
        let interval = validate_interval(interval)?;
        if self.inner.timer.interval() == interval {
            return Ok(());
        }
        self.inner.timer.set_interval(interval);
        drop(lifecycle);

        info!(interval = ?interval, "Redraw interval changed");
        let _ = self.inner.events.send(SchedulerEvent::IntervalChanged(interval));
        Ok(())
    }

    pub fn interval_ms(&self) -> Result<f64, RedrawError> {
        Ok(self.interval()?.as_nanos() as f64 / 1_000_000.0)
    }

    pub fn set_interval_ms(&self, ms: f64) -> Result<(), RedrawError> {
        if self.inner.is_disposed() {
            return Err(RedrawError::Disposed);
        }
        self.set_interval(interval_from_millis(ms)?)
    }

    /// Duration of the last pass that completed or was cancelled.
    pub fn last_pass_duration(&self) -> Option<Duration> {
        self.metrics().last_pass_duration
    }

    /// Get a snapshot of the current scheduler metrics.
    pub fn metrics(&self) -> RedrawMetrics {
        self.inner
            .metrics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn state(&self) -> SchedulerState {
        let lifecycle = lock(&self.inner.lifecycle);
        if lifecycle.disposed {
            return SchedulerState::Disposed;
        }
        let running = lock(&self.inner.in_flight)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished());
        drop(lifecycle);

        if !self.inner.timer.is_armed() {
            SchedulerState::Overloaded
        } else if running {
            SchedulerState::Running
        } else {
            SchedulerState::Armed
        }
    }

    /// Handle to the pass currently in flight, if any.
    pub fn in_flight_pass(&self) -> Option<PassHandle> {
        lock(&self.inner.in_flight)
            .as_ref()
            .filter(|handle| !handle.is_finished())
            .cloned()
    }

    /// Subscribe to interval changes, finished passes and disposal.
    pub fn subscribe(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.inner.events.subscribe()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }

    /// Stop the timer, request cancellation of the in-flight pass and wait
    /// for the ticker thread to exit. Does not wait for the pass itself.
    /// Safe to call any number of times.
    pub fn dispose(&self) {
        self.inner.dispose();

        let ticker = lock(&self.ticker).take();
        if let Some(ticker) = ticker {
            if ticker.thread().id() == thread::current().id() {
                return;
            }
            if ticker.join().is_err() {
                warn!("Redraw ticker thread panicked");
            }
        }
    }
}

impl Drop for RedrawScheduler {
    fn drop(&mut self) {
        self.dispose();
    }
}
