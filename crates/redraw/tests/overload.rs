//! Overload recovery timing: when every pass outlasts the interval, passes
//! run back to back instead of piling up.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use canvas_core::{CanvasError, Color, MoveStrategy, Point, Shape, Size};
use canvas_redraw::{RedrawConfig, RedrawScheduler};

/// Blocks for a fixed time per step and records when each step ran.
struct RecordingStrategy {
    work: Duration,
    cycles: Mutex<Vec<(Instant, Instant)>>,
}

impl RecordingStrategy {
    fn new(work: Duration) -> Self {
        Self {
            work,
            cycles: Mutex::new(Vec::new()),
        }
    }

    fn cycles(&self) -> Vec<(Instant, Instant)> {
        self.cycles.lock().unwrap().clone()
    }
}

impl MoveStrategy for RecordingStrategy {
    fn move_shape(&self, _shape: &Shape) -> Result<(), CanvasError> {
        let start = Instant::now();
        thread::sleep(self.work);
        self.cycles.lock().unwrap().push((start, Instant::now()));
        Ok(())
    }
}

/// For each consecutive pair of cycles: (delay between starts, step duration).
fn delays(cycles: &[(Instant, Instant)]) -> Vec<(Duration, Duration)> {
    cycles
        .windows(2)
        .map(|pair| {
            let (start, end) = pair[0];
            (pair[1].0 - start, end - start)
        })
        .collect()
}

fn run_recording(config: RedrawConfig, work: Duration, min_cycles: usize) -> Vec<(Instant, Instant)> {
    let scheduler = RedrawScheduler::new(config).unwrap();
    let strategy = Arc::new(RecordingStrategy::new(work));
    let shape = Arc::new(Shape::new(Point::default(), Size::new(5.0, 5.0), Color::BLUE).unwrap());
    shape.set_strategy(Some(strategy.clone()));
    scheduler.add_shape(&shape);

    let deadline = Instant::now() + Duration::from_secs(60);
    while strategy.cycles().len() < min_cycles && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    scheduler.dispose();
    thread::sleep(work * 2);

    let cycles = strategy.cycles();
    assert!(cycles.len() >= min_cycles, "only {} cycles ran", cycles.len());
    assert!(scheduler.metrics().overloads > 0);
    cycles
}

#[test]
fn slow_passes_run_back_to_back() {
    let config = RedrawConfig {
        interval_ms: 1.0,
        overload_poll_ms: 2,
        ..RedrawConfig::default()
    };
    let work = Duration::from_millis(15);
    let cycles = run_recording(config, work, 20);

    let pairs = delays(&cycles);
    let tight = pairs
        .iter()
        .filter(|(delay, duration)| *delay >= *duration && *delay - *duration <= Duration::from_millis(5))
        .count();
    assert!(
        tight * 5 >= pairs.len() * 4,
        "{tight} of {} cycles started within 5ms of the previous one finishing",
        pairs.len()
    );

    let starts: Vec<_> = cycles.iter().map(|(start, _)| *start).collect();
    for pair in starts.windows(2) {
        assert!(pair[1] - pair[0] >= work, "passes overlapped");
    }
}

#[test]
#[ignore = "timing sensitive; run with --ignored on an idle machine"]
fn thousand_one_millisecond_cycles_self_correct() {
    let config = RedrawConfig {
        interval_ms: 1.0,
        ..RedrawConfig::default()
    };
    let cycles = run_recording(config, Duration::from_millis(1), 1000);

    let pairs = delays(&cycles);
    let slipped = pairs
        .iter()
        .filter(|(delay, duration)| {
            let delay = delay.as_secs_f64();
            (delay - duration.as_secs_f64()) / delay >= 0.1
        })
        .count();
    assert!(
        slipped * 10 < pairs.len(),
        "{slipped} of {} cycles slipped by 10% or more",
        pairs.len()
    );
}
