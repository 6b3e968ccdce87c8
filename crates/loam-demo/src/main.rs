//! Headless terrain streaming demo.
//!
//! Loads (or creates) `terrain.ron`, applies CLI overrides, and walks a
//! viewer in a straight line along +X, streaming chunks around it. Every
//! viewer chunk change is logged; `debug.log_ticks` logs every tick.
//!
//! Run with: `cargo run -p loam-demo -- --ticks 300 --speed 6`

mod settings;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use glam::DVec3;
use loam_config::{CliArgs, Config};
use loam_stream::{ChunkStreamer, StreamEvent, TickReport};
use tracing::{info, warn};

/// Wall-clock pause between ticks, roughly one 60 Hz frame.
const TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Height of the viewer above the terrain surface.
const EYE_HEIGHT: f64 = 1.8;

#[derive(Debug, Default)]
struct Totals {
    created: u64,
    lod_updates: u64,
    applied: u64,
    stale: u64,
    removed: u64,
    colliders: u64,
    colliders_cancelled: u64,
    trees_placed: u64,
}

impl Totals {
    fn add(&mut self, report: &TickReport) {
        self.created += report.created as u64;
        self.lod_updates += report.lod_updates as u64;
        self.applied += report.meshes_applied as u64;
        self.stale += report.stale_dropped as u64;
        self.removed += report.removed as u64;
        self.colliders += report.colliders_ready as u64;
        self.colliders_cancelled += report.colliders_cancelled as u64;
    }
}

fn run(config: &Config, ticks: u32, speed: f64) {
    let mut streamer = ChunkStreamer::new(
        settings::world_settings(config),
        settings::streamer_settings(config),
    );
    let half = config.world.chunk_world_size * 0.5;
    let mut viewer = DVec3::new(half, 0.0, half);
    let mut totals = Totals::default();
    let start = Instant::now();

    for _ in 0..ticks {
        viewer.x += speed;
        viewer.y = streamer.terrain_height(viewer.x, viewer.z) + EYE_HEIGHT;

        let report = streamer.tick(viewer);
        totals.add(&report);
        for event in streamer.drain_events() {
            if let StreamEvent::TreesChanged { count, .. } = event {
                totals.trees_placed += count as u64;
            }
        }

        if config.debug.log_ticks || report.viewer_moved {
            let biome = streamer.biome_at(viewer.x, viewer.z);
            info!(
                tick = report.tick,
                chunk = %report.viewer_chunk,
                tracked = report.tracked_chunks,
                created = report.created,
                lod_updates = report.lod_updates,
                applied = report.meshes_applied,
                stale = report.stale_dropped,
                pending = report.pending_results,
                in_flight = streamer.in_flight(),
                height = format_args!("{:.1}", viewer.y - EYE_HEIGHT),
                trees_allowed = biome.trees_allowed(),
                "Tick"
            );
        }

        std::thread::sleep(TICK_INTERVAL);
    }

    streamer.shutdown();
    let mesh_bytes: usize = streamer
        .tracked_chunks()
        .into_iter()
        .filter_map(|coord| streamer.chunk_mesh(coord))
        .map(|mesh| mesh.memory_bytes())
        .sum();
    info!(
        ticks,
        elapsed_ms = start.elapsed().as_millis() as u64,
        active = streamer.active_count(),
        tracked = streamer.tracked_count(),
        mesh_kib = mesh_bytes / 1024,
        ?totals,
        "Demo finished"
    );
}

fn main() {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = args
        .config
        .clone()
        .or_else(Config::default_dir)
        .unwrap_or_else(|| PathBuf::from(".loam"));

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    loam_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    if let Err(e) = config.validate() {
        warn!(error = %e, "Invalid configuration, falling back to defaults");
        config = Config::default();
        config.apply_cli_overrides(&args);
    }

    info!(
        seed = config.world.seed,
        config_dir = %config_dir.display(),
        ticks = args.ticks,
        speed = args.speed,
        "Loam terrain demo"
    );

    run(&config, args.ticks, args.speed);
}
