//! Procedural terrain: octave Perlin height fields, climate-driven biomes and
//! grid-scattered trees, producing one chunk at a time.

mod biome;
mod generator;
mod octave;
mod trees;

pub use biome::{Biome, BiomeDef, TreeKind};
pub use generator::{BASE_HEIGHT, FILLER_DEPTH, HEIGHT_VARIATION, SEA_LEVEL, TerrainGenerator};
pub use octave::OctaveNoise;
pub use trees::{TREE_GRID_SIZE, TREE_LEAF_RADIUS, is_tree_origin, plant_tree};
