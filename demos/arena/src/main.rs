//! arena — a full team playing capture-the-flag against a local server.
//!
//! Runs one `TeamCoordinator` against `LocalArena`, maps the arena's
//! obstacles with a noisy sensor on a separate thread, and writes:
//!
//! - `units.csv`          per-tick position, heading and flag of every unit
//! - `field.csv`          unit 0's last sampled steering field (quiver arrows)
//! - `enemy_density.csv`  Gaussian fit of the enemy positions on the last tick
//! - `occupancy.csv`      fused obstacle probability per cell
//!
//! Logging honours `RUST_LOG`; `--verbose` lowers the default to `debug`.

mod arena;
mod config;
mod sensor;
mod trace;


use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use anyhow::{Result, anyhow};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bz_core::UnitId;
use bz_grid::{Classification, OccupancyGridFusion};
use bz_team::{
    DistributionFrame, FieldFrame, FieldSampler, Frame, SamplingSink, TeamBuilder,
    VisualizationSink, state_channel,
};

use arena::LocalArena;
use config::Config;
use sensor::NoisySensor;
use trace::TraceObserver;

/// Ticks played when neither the config nor the CLI bounds the run.
const DEFAULT_TICKS: u64 = 600;

#[derive(Parser, Debug)]
#[command(name = "arena")]
#[command(about = "Potential-field team vs. wandering enemies, with occupancy mapping")]
struct Cli {
    /// TOML config file; missing keys use defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of ticks to play
    #[arg(long)]
    ticks: Option<u64>,

    /// Override the arena seed
    #[arg(long)]
    seed: Option<u64>,

    /// Output directory for CSV files
    #[arg(long, default_value = "arena_output")]
    out: PathBuf,

    /// Debug-level logging unless RUST_LOG is set
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Default)]
struct LatestFrames {
    field:        Option<FieldFrame>,
    distribution: Option<DistributionFrame>,
}

#[derive(Serialize)]
struct CellRow {
    row:         usize,
    col:         usize,
    probability: f64,
    truth:       bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // 1. Configuration.
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(ticks) = cli.ticks {
        config.team.max_ticks = Some(ticks);
    }
    if config.team.max_ticks.is_none() {
        config.team.max_ticks = Some(DEFAULT_TICKS);
    }
    if let Some(seed) = cli.seed {
        config.arena.seed = seed;
    }
    config.validate()?;
    std::fs::create_dir_all(&cli.out)?;

    // 2. World and mapper.
    let arena = Arc::new(LocalArena::new(config.arena.clone())?);
    let cells = config.arena.grid_cells();
    let fusion = Arc::new(OccupancyGridFusion::new(cells, cells, &config.grid)?);
    let (positions_tx, positions_rx) = state_channel();
    let sensor = NoisySensor::new(
        arena.obstacles(),
        config.arena.sensor_range,
        config.grid.true_positive,
        config.grid.true_negative,
        config.arena.seed.wrapping_add(1),
    );
    let mapper = sensor::spawn_mapper(sensor, Arc::clone(&fusion), positions_rx)?;

    // 3. Visualisation: keep the newest frame of each kind.
    let frames = Arc::new(Mutex::new(LatestFrames::default()));
    let sampler = FieldSampler::new(config.arena.world_size, config.arena.plot_samples)?;
    let sink = {
        let frames = Arc::clone(&frames);
        Arc::new(SamplingSink::spawn(sampler, move |frame| {
            let mut latest = frames.lock().unwrap_or_else(PoisonError::into_inner);
            match frame {
                Frame::Field(f) => latest.field = Some(f),
                Frame::Distribution(d) => latest.distribution = Some(d),
            }
        })?)
    };
    let sink_dyn: Arc<dyn VisualizationSink> = sink.clone();

    // 4. Play.
    let observer_out = cli.out.join("units.csv");
    let mut observer =
        TraceObserver::create(&observer_out, positions_tx, Some(Arc::clone(&sink_dyn)))?;
    let team = TeamBuilder::new(Arc::clone(&arena), config.team.clone())
        .visualize(UnitId(0), sink_dyn)
        .start()?;
    let stop = team.stop_token();
    ctrlc::set_handler(move || {
        info!("interrupt received; shutting down");
        stop.cancel();
    })?;
    info!(agents = team.agent_count(), ticks = ?config.team.max_ticks, "playing");

    let started = Instant::now();
    let played = team.run(&mut observer);
    let rows = observer.finish();

    let fused = mapper.join().map_err(|_| anyhow!("mapper thread panicked"))?;
    let rendered = sink.stop();
    let reports = played?;
    let rows = rows?;
    let wall = started.elapsed();

    // 5. Output.
    let latest = std::mem::take(&mut *frames.lock().unwrap_or_else(PoisonError::into_inner));
    if let Some(field) = &latest.field {
        trace::write_field(&cli.out.join("field.csv"), field)?;
    }
    if let Some(density) = &latest.distribution {
        trace::write_distribution(&cli.out.join("enemy_density.csv"), density)?;
    }

    let truth = arena.obstacles();
    let grid = fusion.snapshot();
    let mut w = csv::Writer::from_path(cli.out.join("occupancy.csv"))?;
    let (mut correct, mut classified) = (0usize, 0usize);
    let model = fusion.sensor_model();
    for ((row, col), probability) in grid.iter() {
        let occupied = truth.is_occupied(row, col);
        match model.classify(probability) {
            Classification::Obstacle => {
                classified += 1;
                correct += usize::from(occupied);
            }
            Classification::NotObstacle => {
                classified += 1;
                correct += usize::from(!occupied);
            }
            Classification::Unknown => {}
        }
        w.serialize(CellRow { row, col, probability, truth: occupied })?;
    }
    w.flush()?;

    // 6. Summary.
    let commands: u64 = reports.iter().map(|r| r.commands_sent).sum();
    let skipped: u64 = reports.iter().map(|r| r.snapshots_skipped).sum();
    let counts = fusion.class_counts();
    println!();
    println!("=== arena summary ===");
    println!("  Wall time          : {:.2}s", wall.as_secs_f64());
    println!("  Agents             : {}", reports.len());
    println!("  Commands sent      : {commands}");
    println!("  Snapshots skipped  : {skipped}");
    println!("  Flags captured     : {}", arena.captures());
    println!("  Trace rows         : {rows}");
    println!("  Frames rendered    : {rendered}");
    println!("  Sensor blocks fused: {fused}");
    println!(
        "  Cells              : {} obstacle / {} free / {} unknown",
        counts.obstacle, counts.not_obstacle, counts.unknown
    );
    if classified > 0 {
        println!(
            "  Map accuracy       : {:.1}% of {classified} classified cells",
            100.0 * correct as f64 / classified as f64
        );
    }
    println!("  Output             : {}", cli.out.display());
    Ok(())
}
