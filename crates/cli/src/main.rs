mod cli;
mod config;
mod population;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use canvas_core::{CanvasBounds, Config, Size};
use canvas_redraw::{PassReport, RedrawMetrics, RedrawScheduler, SchedulerEvent};
use clap::Parser;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::SimConfig;

/// Final report printed when the simulation ends.
#[derive(Debug, Serialize)]
struct Summary {
    behavior: String,
    shapes: usize,
    interval_ms: f64,
    elapsed_ms: u128,
    metrics: RedrawMetrics,
    last_pass: Option<PassReport>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    canvas_core::config::load_dotenv();
    let args = CliArgs::parse();

    let env_config = Config::from_env();
    env_config.log_summary();

    let mut sim = SimConfig::resolve(args.config.as_deref(), &env_config)
        .context("failed to load configuration")?;
    if let Some(interval_ms) = args.interval_ms {
        sim.redraw.interval_ms = interval_ms;
    }

    let bounds = Arc::new(
        CanvasBounds::new(Size::new(sim.canvas.width, sim.canvas.height))
            .context("invalid canvas size")?,
    );
    let strategy = args.behavior.strategy(Arc::clone(&bounds), args.seed);
    let shapes = population::populate(&bounds, args.shapes, &strategy, args.seed)
        .context("failed to place shapes")?;

    let scheduler =
        RedrawScheduler::new(sim.redraw.clone()).context("failed to start redraw scheduler")?;
    let mut events = scheduler.subscribe();
    for shape in &shapes {
        scheduler.add_shape(shape);
    }
    info!(
        shapes = scheduler.shape_count(),
        behavior = %args.behavior,
        run_for_secs = args.run_for_secs,
        "Simulation running"
    );

    let started = tokio::time::Instant::now();
    let deadline = tokio::time::sleep(Duration::from_secs(args.run_for_secs));
    tokio::pin!(deadline);
    let mut progress = tokio::time::interval(Duration::from_secs(1));
    let mut last_pass = None;

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping simulation");
                break;
            }
            _ = progress.tick() => {
                let metrics = scheduler.metrics();
                info!(
                    passes = metrics.passes_completed,
                    faulted = metrics.passes_faulted,
                    overloads = metrics.overloads,
                    avg_pass = ?metrics.avg_pass_duration,
                    state = ?scheduler.state(),
                    "Progress"
                );
            }
            event = events.recv() => match event {
                Ok(SchedulerEvent::PassFinished(report)) => last_pass = Some(report),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "Event receiver lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    scheduler.dispose();

    let summary = Summary {
        behavior: args.behavior.to_string(),
        shapes: shapes.len(),
        interval_ms: sim.redraw.interval_ms,
        elapsed_ms: started.elapsed().as_millis(),
        metrics: scheduler.metrics(),
        last_pass,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        let m = &summary.metrics;
        println!("Simulation finished after {}ms", summary.elapsed_ms);
        println!("  shapes:      {} ({})", summary.shapes, summary.behavior);
        println!("  interval:    {}ms", summary.interval_ms);
        println!(
            "  passes:      {} started, {} completed, {} cancelled, {} faulted",
            m.passes_started, m.passes_completed, m.passes_cancelled, m.passes_faulted
        );
        println!("  overloads:   {}", m.overloads);
        println!("  steps:       {}", m.shapes_advanced);
        println!(
            "  pass time:   avg {:?}, max {:?}",
            m.avg_pass_duration, m.max_pass_duration
        );
    }

    Ok(())
}
