//! Radius-based chunk streaming with hysteresis and per-tick budgets.
//!
//! Columns within `load_radius` of the centre are requested nearest first for
//! every configured vertical layer. Resident chunks farther than
//! `unload_radius` are saved and unloaded, farthest first. The band between the
//! two radii keeps chunks near the boundary from thrashing.

use strata_voxel::ChunkCoord;

use crate::chunk_manager::ChunkManager;

/// Radii are Chebyshev distances in chunk columns on the x/z plane.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamingConfig {
    pub load_radius: i32,
    /// Must exceed `load_radius`.
    pub unload_radius: i32,
    /// Lowest chunk layer (inclusive) loaded in each column.
    pub min_layer: i32,
    /// Highest chunk layer (inclusive) loaded in each column.
    pub max_layer: i32,
    pub max_loads_per_tick: usize,
    pub max_unloads_per_tick: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            load_radius: 4,
            unload_radius: 6,
            min_layer: 6,
            max_layer: 8,
            max_loads_per_tick: 8,
            max_unloads_per_tick: 8,
        }
    }
}

/// Work started by one [`ChunkStreamer::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamTickResult {
    /// Loads started this tick.
    pub requested: usize,
    /// Chunks saved and unloaded this tick.
    pub unloaded: usize,
}

#[derive(Debug)]
pub struct ChunkStreamer {
    config: StreamingConfig,
}

impl ChunkStreamer {
    pub fn new(config: StreamingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    /// Coordinates that should be resident around `center`, nearest column first.
    pub fn wanted(&self, center: ChunkCoord) -> Vec<ChunkCoord> {
        let r = self.config.load_radius;
        let mut columns: Vec<(i32, i32, i32)> = Vec::new();
        for dz in -r..=r {
            for dx in -r..=r {
                columns.push((dx.abs().max(dz.abs()), dx, dz));
            }
        }
        columns.sort_unstable_by_key(|&(ring, dx, dz)| (ring, dx * dx + dz * dz, dz, dx));

        let mut coords = Vec::new();
        for (_, dx, dz) in columns {
            for y in self.config.min_layer..=self.config.max_layer {
                coords.push(ChunkCoord::new(center.x + dx, y, center.z + dz));
            }
        }
        coords
    }

    /// Requests missing chunks and unloads distant ones around `center`.
    pub fn tick(&mut self, center: ChunkCoord, manager: &mut ChunkManager) -> StreamTickResult {
        let mut result = StreamTickResult::default();

        for coord in self.wanted(center) {
            if result.requested >= self.config.max_loads_per_tick {
                break;
            }
            if manager.enqueue_load(coord) {
                result.requested += 1;
            }
        }

        let mut distant: Vec<ChunkCoord> = manager
            .resident_coords()
            .filter(|c| c.horizontal_distance(center) > self.config.unload_radius)
            .collect();
        distant.sort_unstable_by_key(|c| std::cmp::Reverse((c.horizontal_distance(center), c.x, c.y, c.z)));

        for coord in distant.into_iter().take(self.config.max_unloads_per_tick) {
            if manager.enqueue_save_and_unload(coord) {
                result.unloaded += 1;
            }
        }

        result
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
