//! Headless Strata world runner.
//!
//! Opens (or creates) a world, walks the player across it while chunks stream
//! in and out through the worker pool, then saves everything and exits.
//!
//! Run with: `cargo run -p strata-demo -- --world saves/demo --ticks 300`

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use glam::Vec3;
use rustc_hash::FxHashMap;
use strata_config::{CliArgs, Config, default_config_dir};
use strata_jobs::{JobContext, JobScheduler};
use strata_mesh::MeshVertex;
use strata_region::{PlayerData, RegionManager};
use strata_terrain::TerrainGenerator;
use strata_voxel::{BlockRegistry, ChunkCoord, blocks};
use strata_world::{ChunkManager, ChunkStreamer, MeshSink, StreamingConfig};
use tracing::{error, info, warn};

/// Walking speed in blocks per tick.
const WALK_SPEED: f32 = 0.75;
const TICK: Duration = Duration::from_millis(5);

/// Keeps per-chunk buffer sizes in place of GPU buffers.
#[derive(Default)]
struct MeshCache {
    buffers: FxHashMap<ChunkCoord, (usize, usize)>,
    uploads: usize,
}

impl MeshCache {
    fn triangle_count(&self) -> usize {
        self.buffers.values().map(|(_, indices)| indices / 3).sum()
    }
}

impl MeshSink for MeshCache {
    fn upload(&mut self, coord: ChunkCoord, vertices: &[MeshVertex], indices: &[u32]) {
        self.buffers.insert(coord, (vertices.len(), indices.len()));
        self.uploads += 1;
    }

    fn remove(&mut self, coord: ChunkCoord) {
        self.buffers.remove(&coord);
    }
}

fn streaming_config(config: &Config) -> StreamingConfig {
    let s = &config.streaming;
    StreamingConfig {
        load_radius: s.load_radius,
        unload_radius: s.unload_radius.max(s.load_radius + 1),
        min_layer: config.world.min_layer,
        max_layer: config.world.max_layer,
        max_loads_per_tick: s.max_loads_per_tick,
        max_unloads_per_tick: s.max_unloads_per_tick,
    }
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_dir = args
        .config
        .clone()
        .or_else(default_config_dir)
        .unwrap_or_else(|| PathBuf::from(".strata"));

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    strata_log::init_logging(
        Some(&config_dir.join("logs")),
        cfg!(debug_assertions),
        Some(&config),
    );

    match run(&config, args.ticks) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config, ticks: u32) -> Result<(), Box<dyn std::error::Error>> {
    let regions = Arc::new(RegionManager::new(&config.world.save_dir)?);
    let generator = Arc::new(TerrainGenerator::new(config.world.seed));
    info!(
        "World {} (seed {})",
        config.world.save_dir.display(),
        generator.seed()
    );

    let mut player = match regions.load_player() {
        Ok(Some(player)) => {
            info!("Resuming player at {}", player.position());
            player
        }
        Ok(None) => new_player(&generator),
        Err(e) => {
            warn!("Player data unreadable, starting fresh: {e}");
            new_player(&generator)
        }
    };

    let context = JobContext::new(
        Arc::clone(&generator),
        Arc::new(BlockRegistry::with_defaults()),
        Some(Arc::clone(&regions)),
    );
    let mut scheduler = JobScheduler::new(context);
    scheduler.start(config.jobs.worker_count)?;

    let mut manager = ChunkManager::with_scheduler(scheduler);
    let mut streamer = ChunkStreamer::new(streaming_config(config));
    let mut cache = MeshCache::default();
    let mut marker_placed = false;
    let started = Instant::now();

    for tick in 0..ticks {
        let mut position = player.position();
        position.x += WALK_SPEED;
        player.set_position(position);

        let center = ChunkCoord::from_world_pos(position.x, position.y, position.z);
        let streamed = streamer.tick(center, &mut manager);
        manager.mesh_dirty_chunks(config.streaming.mesh_budget);
        let stats = manager.update(&mut cache);

        if !marker_placed {
            marker_placed = place_marker(&mut manager, &generator, position);
        }

        if tick % 50 == 0 {
            info!(
                tick,
                resident = manager.resident_count(),
                in_flight = manager.in_flight_count(),
                meshes = cache.buffers.len(),
                triangles = cache.triangle_count(),
                requested = streamed.requested,
                unloaded = streamed.unloaded,
                generated = stats.generated,
                "tick"
            );
        }
        std::thread::sleep(TICK);
    }

    let deadline = Instant::now() + Duration::from_secs(10);
    while manager.in_flight_count() > 0 && Instant::now() < deadline {
        manager.update(&mut cache);
        std::thread::sleep(TICK);
    }

    let written = manager.shutdown()?;
    regions.save_player(&player)?;
    info!(
        "Done in {:.1}s: {written} chunks saved, {} mesh uploads, player at {}",
        started.elapsed().as_secs_f32(),
        cache.uploads,
        player.position()
    );
    Ok(())
}

fn new_player(generator: &TerrainGenerator) -> PlayerData {
    let mut player = PlayerData::default();
    let spawn = player.position();
    let ground = generator.height_at(spawn.x.floor() as i32, spawn.z.floor() as i32);
    player.set_position(Vec3::new(spawn.x, ground as f32 + 2.0, spawn.z));
    player
}

/// Drops a log block on the ground beside the player once that chunk exists.
fn place_marker(manager: &mut ChunkManager, generator: &TerrainGenerator, at: Vec3) -> bool {
    let (wx, wz) = (at.x.floor() as i32 + 2, at.z.floor() as i32);
    let wy = generator.height_at(wx, wz) + 1;
    if manager.set_block_at_world(wx, wy, wz, blocks::LOG) {
        info!("Placed marker at ({wx}, {wy}, {wz})");
        true
    } else {
        false
    }
}
