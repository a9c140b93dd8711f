//! One redraw pass: a single traversal of the registry advancing every shape.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use canvas_core::CanvasError;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::registry::ShapeRegistry;

/// Advisory cancellation flag, checked between shapes. Setting it never
/// interrupts a step already running.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PassStatus {
    Running,
    /// Every live shape was advanced.
    Completed,
    /// Stopped early at a cancellation check.
    Cancelled,
    /// A strategy failed or panicked; the rest of the pass was skipped.
    Faulted,
}

impl PassStatus {
    pub fn is_finished(self) -> bool {
        self != PassStatus::Running
    }
}

/// Result of executing a pass.
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub pass_id: u64,
    /// Shapes whose strategy ran to completion.
    pub visited: usize,
    pub status: PassStatus,
    /// Wall-clock time of the traversal.
    pub duration: Duration,
    /// Strategy error that aborted the pass, if any.
    pub error: Option<String>,
    pub finished_at: DateTime<Utc>,
}

/// Executes one pass over a registry.
pub struct PassRunner<'a> {
    registry: &'a ShapeRegistry,
}

impl<'a> PassRunner<'a> {
    pub fn new(registry: &'a ShapeRegistry) -> Self {
        Self { registry }
    }

    /// Run each shape's strategy once, stopping early if `token` is
    /// cancelled or a strategy returns an error.
    pub fn run(&self, pass_id: u64, token: &CancelToken) -> PassReport {
        self.run_with_progress(pass_id, token, &AtomicUsize::new(0))
    }

    /// Like [`run`](Self::run), also bumping `progress` after every shape
    /// advanced so the count survives a panicking strategy.
    pub fn run_with_progress(
        &self,
        pass_id: u64,
        token: &CancelToken,
        progress: &AtomicUsize,
    ) -> PassReport {
        let started = Instant::now();
        let result = self.registry.for_each::<CanvasError>(
            |shape| {
                shape.run_step()?;
                progress.fetch_add(1, Ordering::Relaxed);
                Ok(())
            },
            || token.is_cancelled(),
        );

        let (status, error) = match result {
            Ok(traversal) if traversal.cancelled => (PassStatus::Cancelled, None),
            Ok(_) => (PassStatus::Completed, None),
            Err(e) => (PassStatus::Faulted, Some(e.to_string())),
        };

        PassReport {
            pass_id,
            visited: progress.load(Ordering::Relaxed),
            status,
            duration: started.elapsed(),
            error,
            finished_at: Utc::now(),
        }
    }
}

#[derive(Debug)]
struct PassShared {
    id: u64,
    started_at: Instant,
    token: CancelToken,
    status: Mutex<PassStatus>,
    finished: Condvar,
}

/// Handle to a launched pass. Cloning shares the same pass.
#[derive(Debug, Clone)]
pub struct PassHandle {
    shared: Arc<PassShared>,
}

impl PassHandle {
    pub fn new(id: u64) -> Self {
        Self {
            shared: Arc::new(PassShared {
                id,
                started_at: Instant::now(),
                token: CancelToken::new(),
                status: Mutex::new(PassStatus::Running),
                finished: Condvar::new(),
            }),
        }
    }

    fn status_guard(&self) -> MutexGuard<'_, PassStatus> {
        self.shared.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> u64 {
        self.shared.id
    }

    pub fn started_at(&self) -> Instant {
        self.shared.started_at
    }

    pub fn token(&self) -> &CancelToken {
        &self.shared.token
    }

    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.shared.token.cancel();
    }

    pub fn status(&self) -> PassStatus {
        *self.status_guard()
    }

    pub fn is_finished(&self) -> bool {
        self.status().is_finished()
    }

    /// Mark the pass finished and wake every waiter. Later calls are ignored.
    pub fn finish(&self, status: PassStatus) {
        let mut current = self.status_guard();
        if current.is_finished() || !status.is_finished() {
            return;
        }
        *current = status;
        self.shared.finished.notify_all();
    }

    /// Block until the pass finishes.
    pub fn wait(&self) -> PassStatus {
        let mut status = self.status_guard();
        while !status.is_finished() {
            status = self
                .shared
                .finished
                .wait(status)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *status
    }

    /// Block until the pass finishes or `timeout` elapses. Returns whether it
    /// finished.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let status = self.status_guard();
        let (status, _) = self
            .shared
            .finished
            .wait_timeout_while(status, timeout, |s| !s.is_finished())
            .unwrap_or_else(PoisonError::into_inner);
        status.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::thread;

    use canvas_core::{Color, MoveStrategy, Point, Shape, Size};

    struct Count(Arc<AtomicUsize>);

    impl MoveStrategy for Count {
        fn move_shape(&self, _shape: &Shape) -> Result<(), CanvasError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Explode;

    impl MoveStrategy for Explode {
        fn move_shape(&self, shape: &Shape) -> Result<(), CanvasError> {
            shape.set_x(f64::NAN)
        }
    }

    fn tracked(registry: &ShapeRegistry, strategy: Arc<dyn MoveStrategy>, n: usize) -> Vec<Arc<Shape>> {
        (0..n)
            .map(|_| {
                let shape = Arc::new(
                    Shape::new(Point::default(), Size::new(1.0, 1.0), Color::GREEN).unwrap(),
                );
                shape.set_strategy(Some(strategy.clone()));
                registry.add(&shape);
                shape
            })
            .collect()
    }

    #[test]
    fn pass_advances_every_shape() {
        let registry = ShapeRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let _shapes = tracked(&registry, Arc::new(Count(calls.clone())), 4);

        let report = PassRunner::new(&registry).run(7, &CancelToken::new());
        assert_eq!(report.pass_id, 7);
        assert_eq!(report.status, PassStatus::Completed);
        assert_eq!(report.visited, 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn cancelled_token_stops_before_first_shape() {
        let registry = ShapeRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let _shapes = tracked(&registry, Arc::new(Count(calls.clone())), 3);

        let token = CancelToken::new();
        token.cancel();
        let report = PassRunner::new(&registry).run(1, &token);
        assert_eq!(report.status, PassStatus::Cancelled);
        assert_eq!(report.visited, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_registry_completes() {
        let report = PassRunner::new(&ShapeRegistry::new()).run(1, &CancelToken::new());
        assert_eq!(report.status, PassStatus::Completed);
        assert_eq!(report.visited, 0);
    }

    #[test]
    fn strategy_error_faults_the_pass() {
        let registry = ShapeRegistry::new();
        let shapes = tracked(&registry, Arc::new(Explode), 2);

        let report = PassRunner::new(&registry).run(3, &CancelToken::new());
        assert_eq!(report.status, PassStatus::Faulted);
        assert_eq!(report.visited, 0);
        assert!(report.error.unwrap().contains("finite"));
        assert_eq!(shapes[0].x(), 0.0);
    }

    #[test]
    fn fault_mid_pass_reports_shapes_already_advanced() {
        let registry = ShapeRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let _good = tracked(&registry, Arc::new(Count(calls.clone())), 2);
        let _bad = tracked(&registry, Arc::new(Explode), 1);
        let _skipped = tracked(&registry, Arc::new(Count(calls.clone())), 1);

        let report = PassRunner::new(&registry).run(4, &CancelToken::new());
        assert_eq!(report.status, PassStatus::Faulted);
        assert_eq!(report.visited, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn progress_survives_a_panicking_strategy() {
        struct Boom;

        impl MoveStrategy for Boom {
            fn move_shape(&self, _shape: &Shape) -> Result<(), CanvasError> {
                panic!("boom");
            }
        }

        let registry = ShapeRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let _good = tracked(&registry, Arc::new(Count(calls.clone())), 3);
        let _bad = tracked(&registry, Arc::new(Boom), 1);

        let progress = AtomicUsize::new(0);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            PassRunner::new(&registry).run_with_progress(5, &CancelToken::new(), &progress)
        }));
        assert!(outcome.is_err());
        assert_eq!(progress.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn handle_finishes_once() {
        let handle = PassHandle::new(1);
        assert_eq!(handle.status(), PassStatus::Running);
        assert!(!handle.wait_timeout(Duration::from_millis(1)));

        handle.finish(PassStatus::Cancelled);
        handle.finish(PassStatus::Completed);
        assert_eq!(handle.status(), PassStatus::Cancelled);
        assert!(handle.wait_timeout(Duration::ZERO));
    }

    #[test]
    fn finish_wakes_waiters() {
        let handle = PassHandle::new(2);
        let waiter = {
            let handle = handle.clone();
            thread::spawn(move || handle.wait())
        };
        thread::sleep(Duration::from_millis(10));
        handle.finish(PassStatus::Completed);
        assert_eq!(waiter.join().unwrap(), PassStatus::Completed);
    }

    #[test]
    fn cancel_reaches_the_token() {
        let handle = PassHandle::new(3);
        let token = handle.token().clone();
        handle.cancel();
        assert!(token.is_cancelled());
        assert!(!handle.is_finished());
    }
}
