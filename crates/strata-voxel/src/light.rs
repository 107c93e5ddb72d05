//! Per-chunk sky light.

use crate::chunk::{CHUNK_SIZE, CHUNK_VOLUME, Chunk, block_index};
use crate::registry::BlockRegistry;

/// Brightest sky light level.
pub const MAX_SKY_LIGHT: u8 = 15;

/// One light level (0–15) per cell, in the same layout as the block array.
#[derive(Clone, PartialEq, Eq)]
pub struct LightGrid(Box<[u8; CHUNK_VOLUME]>);

impl LightGrid {
    /// Creates a grid with every cell at `level`.
    pub fn filled(level: u8) -> Self {
        Self(Box::new([level.min(MAX_SKY_LIGHT); CHUNK_VOLUME]))
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> u8 {
        self.0[block_index(x, y, z)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, level: u8) {
        self.0[block_index(x, y, z)] = level.min(MAX_SKY_LIGHT);
    }

    pub fn as_slice(&self) -> &[u8; CHUNK_VOLUME] {
        &self.0
    }
}

impl std::fmt::Debug for LightGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lit = self.0.iter().filter(|&&l| l > 0).count();
        write!(f, "LightGrid {{ lit: {lit} }}")
    }
}

/// Computes column sky light for a chunk in isolation.
///
/// Each column is lit from the top of the chunk down to the first block that
/// is not transparent; everything below it is dark.
pub fn compute_sky_light(chunk: &Chunk, registry: &BlockRegistry) -> LightGrid {
    let mut light = LightGrid::filled(0);
    for z in 0..CHUNK_SIZE {
        for x in 0..CHUNK_SIZE {
            for y in (0..CHUNK_SIZE).rev() {
                if !registry.is_transparent(chunk.get(x, y, z)) {
                    break;
                }
                light.set(x, y, z, MAX_SKY_LIGHT);
            }
        }
    }
    light
}
