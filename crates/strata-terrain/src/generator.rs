//! Chunk terrain generation from seeded noise fields.

use strata_voxel::{BlockId, CHUNK_SIZE, Chunk, ChunkCoord, blocks};

use crate::biome::{Biome, BiomeDef};
use crate::octave::OctaveNoise;
use crate::trees::{TREE_LEAF_RADIUS, is_tree_origin, plant_tree};

pub const BASE_HEIGHT: f64 = 100.0;
pub const HEIGHT_VARIATION: f64 = 40.0;
/// Water fills every air cell at or below this world height.
pub const SEA_LEVEL: i32 = 116;
/// Layers of filler under the surface block.
pub const FILLER_DEPTH: i32 = 5;
/// Columns at or below this height are beach: sand surface, no trees.
const BEACH_LEVEL: i32 = SEA_LEVEL + 2;
const TREE_SPAWN_CHANCE: f32 = 0.2;
const CLIMATE_FREQUENCY: f64 = 0.0015;

/// Deterministic terrain source for one world seed.
///
/// Holds its own noise state, so several generators with different seeds can
/// coexist and a generator can be shared between worker threads.
#[derive(Clone, Debug)]
pub struct TerrainGenerator {
    seed: u32,
    terrain: OctaveNoise,
    detail: OctaveNoise,
    temperature: OctaveNoise,
    humidity: OctaveNoise,
}

impl TerrainGenerator {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            terrain: OctaveNoise::new(seed),
            detail: OctaveNoise::new(seed.wrapping_add(1)),
            temperature: OctaveNoise::new(seed.wrapping_add(3)),
            humidity: OctaveNoise::new(seed.wrapping_add(4)),
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Biome of world column `(wx, wz)`.
    pub fn biome_at(&self, wx: i32, wz: i32) -> Biome {
        let (x, z) = (wx as f64 * CLIMATE_FREQUENCY, wz as f64 * CLIMATE_FREQUENCY);
        let temperature = self.temperature.sample_01(x, z, 3, 0.5);
        let humidity = self.humidity.sample_01(x, z, 3, 0.5);
        Biome::from_climate(temperature as f32, humidity as f32)
    }

    fn raw_height(&self, wx: i32, wz: i32, def: &BiomeDef) -> f64 {
        let (x, z) = (wx as f64, wz as f64);
        let continent = self
            .terrain
            .sample_01(x * 0.002, z * 0.002, 2, 0.5)
            .powf(1.2);
        let hills = self.terrain.sample_01(x * 0.01, z * 0.01, 4, 0.45);
        let detail = self.detail.sample_01(x * 0.05, z * 0.05, 2, 0.5);

        let blend = continent * 0.4 + hills * 0.5 + detail * 0.1;
        let blend = blend * blend * (3.0 - 2.0 * blend);

        BASE_HEIGHT + blend * HEIGHT_VARIATION * def.amplitude
    }

    fn column(&self, wx: i32, wz: i32) -> (Biome, i32) {
        let biome = self.biome_at(wx, wz);
        let height = self.raw_height(wx, wz, biome.def()).round() as i32;
        (biome, height)
    }

    /// Surface height of world column `(wx, wz)`.
    pub fn height_at(&self, wx: i32, wz: i32) -> i32 {
        self.column(wx, wz).1
    }

    /// Heights of every column of chunk column `(cx, cz)`, indexed `z * 16 + x`.
    pub fn heights_for_chunk(&self, cx: i32, cz: i32) -> [i32; CHUNK_SIZE * CHUNK_SIZE] {
        let size = CHUNK_SIZE as i32;
        let mut heights = [0; CHUNK_SIZE * CHUNK_SIZE];
        for z in 0..size {
            for x in 0..size {
                heights[(z * size + x) as usize] = self.height_at(cx * size + x, cz * size + z);
            }
        }
        heights
    }

    /// Block at world height `wy` in a column of the given surface height.
    fn fill_block(def: &BiomeDef, height: i32, wy: i32) -> BlockId {
        let beach = height <= BEACH_LEVEL;
        if wy > height {
            if wy <= SEA_LEVEL {
                blocks::WATER
            } else {
                BlockId::AIR
            }
        } else if wy == height {
            if beach { blocks::SAND } else { def.surface }
        } else if wy > height - FILLER_DEPTH {
            if beach { blocks::SAND } else { def.filler }
        } else {
            blocks::STONE
        }
    }

    /// Generates the blocks of `coord`. The result is marked dirty and fully lit.
    pub fn generate(&self, coord: ChunkCoord) -> Chunk {
        let size = CHUNK_SIZE as i32;
        let (ox, oy, oz) = coord.origin();
        let mut chunk = Chunk::new();

        for z in 0..size {
            for x in 0..size {
                let (biome, height) = self.column(ox + x, oz + z);
                let def = biome.def();
                for y in 0..size {
                    let block = Self::fill_block(def, height, oy + y);
                    if !block.is_air() {
                        chunk.set(x as usize, y as usize, z as usize, block);
                    }
                }
            }
        }

        for x in -TREE_LEAF_RADIUS..size + TREE_LEAF_RADIUS {
            for z in -TREE_LEAF_RADIUS..size + TREE_LEAF_RADIUS {
                let (wx, wz) = (ox + x, oz + z);
                let biome = self.biome_at(wx, wz);
                let def = biome.def();
                let Some(kind) = def.tree else {
                    continue;
                };
                if !is_tree_origin(wx, wz, TREE_SPAWN_CHANCE * def.tree_density, self.seed) {
                    continue;
                }
                let height = self.raw_height(wx, wz, def).round() as i32;
                if height <= BEACH_LEVEL {
                    continue;
                }
                plant_tree(&mut chunk, x, height + 1 - oy, z, kind);
            }
        }

        chunk
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Vertical chunk layer containing the surface range.
    const SURFACE_LAYER: i32 = 7;

    #[test]
    fn test_generation_is_deterministic() {
        let a = TerrainGenerator::new(1234);
        let b = TerrainGenerator::new(1234);
        for coord in [
            ChunkCoord::new(0, SURFACE_LAYER, 0),
            ChunkCoord::new(-3, SURFACE_LAYER, 5),
            ChunkCoord::new(2, 6, -1),
        ] {
            assert_eq!(a.generate(coord).blocks(), b.generate(coord).blocks());
        }
    }

    #[test]
    fn test_seeds_are_independent() {
        let a = TerrainGenerator::new(1);
        let b = TerrainGenerator::new(2);
        let differs = (0..64).any(|i| a.height_at(i * 13, i * 7) != b.height_at(i * 13, i * 7));
        assert!(differs);
        assert_eq!(a.seed(), 1);
    }

    #[test]
    fn test_heights_within_bounds() {
        let generator = TerrainGenerator::new(99);
        let max = (BASE_HEIGHT + HEIGHT_VARIATION * 1.05).ceil() as i32;
        for i in -50..50 {
            let h = generator.height_at(i * 17, i * 11);
            assert!((BASE_HEIGHT as i32..=max).contains(&h), "height {h}");
        }
    }

    #[test]
    fn test_heights_for_chunk_layout() {
        let generator = TerrainGenerator::new(5);
        let heights = generator.heights_for_chunk(2, -1);
        assert_eq!(heights[0], generator.height_at(32, -16));
        assert_eq!(heights[15], generator.height_at(47, -16));
        assert_eq!(heights[16], generator.height_at(32, -15));
    }

    #[test]
    fn test_deep_chunk_is_stone() {
        let generator = TerrainGenerator::new(8);
        let chunk = generator.generate(ChunkCoord::new(4, 2, -4));
        assert_eq!(chunk.uniform_block(), Some(blocks::STONE));
    }

    #[test]
    fn test_sky_chunk_is_air() {
        let generator = TerrainGenerator::new(8);
        // Far above the tallest column plus a tree.
        let chunk = generator.generate(ChunkCoord::new(0, 12, 0));
        assert_eq!(chunk.uniform_block(), Some(BlockId::AIR));
        assert!(chunk.is_dirty());
    }

    #[test]
    fn test_column_fill_rules() {
        let generator = TerrainGenerator::new(4242);
        let (cx, cz) = (3, -2);
        let heights = generator.heights_for_chunk(cx, cz);
        for layer in [6, 7, 8] {
            let chunk = generator.generate(ChunkCoord::new(cx, layer, cz));
            for z in 0..16usize {
                for x in 0..16usize {
                    let h = heights[z * 16 + x];
                    let def = generator.biome_at(cx * 16 + x as i32, cz * 16 + z as i32).def();
                    for y in 0..16usize {
                        let wy = layer * 16 + y as i32;
                        let block = chunk.get(x, y, z);
                        // Trees only ever replace air above the surface.
                        if wy < h - FILLER_DEPTH + 1 {
                            assert_eq!(block, blocks::STONE, "({x},{wy},{z})");
                        } else if wy < h {
                            let filler = if h <= SEA_LEVEL + 2 { blocks::SAND } else { def.filler };
                            assert_eq!(block, filler, "({x},{wy},{z})");
                        } else if wy > h && wy <= SEA_LEVEL {
                            assert_eq!(block, blocks::WATER);
                        } else if wy > h {
                            assert_ne!(block, blocks::WATER);
                        }
                    }
                }
            }
        }
    }
}
