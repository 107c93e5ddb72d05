//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Strata command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "strata", about = "Strata voxel world")]
pub struct CliArgs {
    /// World save directory.
    #[arg(long)]
    pub world: Option<PathBuf>,

    /// Terrain seed.
    #[arg(long)]
    pub seed: Option<u32>,

    /// Worker thread count (0 = automatic).
    #[arg(long)]
    pub workers: Option<usize>,

    /// Load radius in chunk columns.
    #[arg(long)]
    pub load_radius: Option<i32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Simulation ticks to run before saving and exiting.
    #[arg(long, default_value_t = 200)]
    pub ticks: u32,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref dir) = args.world {
            self.world.save_dir = dir.clone();
        }
        if let Some(seed) = args.seed {
            self.world.seed = seed;
        }
        if let Some(workers) = args.workers {
            self.jobs.worker_count = workers;
        }
        if let Some(radius) = args.load_radius {
            self.streaming.load_radius = radius;
            if self.streaming.unload_radius <= radius {
                self.streaming.unload_radius = radius + 2;
            }
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
