//! Fixed-size 16×16×16 voxel grid with one byte per block.
//!
//! Blocks are laid out X-fastest: `index = x + 16 * (y + 16 * z)`. This is also
//! the "linear" traversal order used by the storage codec, so the raw slice can
//! be handed to it directly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::light::{LightGrid, MAX_SKY_LIGHT};

/// Side length of a chunk in blocks.
pub const CHUNK_SIZE: usize = 16;

/// Total number of blocks in a chunk (16³).
pub const CHUNK_VOLUME: usize = CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE;

/// Compact block type identifier stored in every cell (1 byte).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[repr(transparent)]
pub struct BlockId(pub u8);

impl BlockId {
    /// The empty block. Zeroed chunk memory is all air.
    pub const AIR: BlockId = BlockId(0);

    /// Returns `true` for [`BlockId::AIR`].
    #[inline]
    pub fn is_air(self) -> bool {
        self.0 == 0
    }
}

/// Converts local coordinates into a flat array index.
///
/// Each coordinate must be in `0..CHUNK_SIZE`.
#[inline]
pub fn block_index(x: usize, y: usize, z: usize) -> usize {
    debug_assert!(x < CHUNK_SIZE && y < CHUNK_SIZE && z < CHUNK_SIZE);
    x + CHUNK_SIZE * (y + CHUNK_SIZE * z)
}

/// A chunk's blocks, its sky light and the mesh-dirty flag.
///
/// The chunk owns its arrays exclusively. Workers never see a live chunk;
/// they receive clones taken by the orchestrating thread.
#[derive(Clone)]
pub struct Chunk {
    blocks: Box<[BlockId; CHUNK_VOLUME]>,
    sky_light: LightGrid,
    dirty: bool,
}

impl Chunk {
    /// Creates an all-air chunk, fully lit and marked dirty.
    pub fn new() -> Self {
        Self::filled(BlockId::AIR)
    }

    /// Creates a chunk where every cell holds `id`.
    pub fn filled(id: BlockId) -> Self {
        Self::from_blocks(Box::new([id; CHUNK_VOLUME]))
    }

    /// Wraps an existing block array. Sky light starts at full brightness.
    pub fn from_blocks(blocks: Box<[BlockId; CHUNK_VOLUME]>) -> Self {
        Self {
            blocks,
            sky_light: LightGrid::filled(MAX_SKY_LIGHT),
            dirty: true,
        }
    }

    /// Returns the block at local `(x, y, z)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> BlockId {
        self.blocks[block_index(x, y, z)]
    }

    /// Sets the block at local `(x, y, z)`.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, id: BlockId) {
        self.blocks[block_index(x, y, z)] = id;
    }

    /// Returns the block at signed local coordinates, or `None` outside the chunk.
    pub fn get_checked(&self, x: i32, y: i32, z: i32) -> Option<BlockId> {
        Self::local(x, y, z).map(|(x, y, z)| self.get(x, y, z))
    }

    /// Sets a block if the signed coordinates fall inside the chunk.
    ///
    /// Writes outside the chunk are clipped; the return value tells whether
    /// the write landed.
    pub fn set_checked(&mut self, x: i32, y: i32, z: i32, id: BlockId) -> bool {
        match Self::local(x, y, z) {
            Some((x, y, z)) => {
                self.set(x, y, z, id);
                true
            }
            None => false,
        }
    }

    fn local(x: i32, y: i32, z: i32) -> Option<(usize, usize, usize)> {
        let n = CHUNK_SIZE as i32;
        if (0..n).contains(&x) && (0..n).contains(&y) && (0..n).contains(&z) {
            Some((x as usize, y as usize, z as usize))
        } else {
            None
        }
    }

    /// Read access to the raw block array in linear order.
    pub fn blocks(&self) -> &[BlockId; CHUNK_VOLUME] {
        &self.blocks
    }

    /// Mutable access to the raw block array in linear order.
    pub fn blocks_mut(&mut self) -> &mut [BlockId; CHUNK_VOLUME] {
        &mut self.blocks
    }

    /// Overwrites every cell with `id`.
    pub fn fill(&mut self, id: BlockId) {
        self.blocks.fill(id);
    }

    /// Returns the single block type if the whole chunk holds one value.
    pub fn uniform_block(&self) -> Option<BlockId> {
        let first = self.blocks[0];
        self.blocks.iter().all(|&b| b == first).then_some(first)
    }

    /// Number of non-air cells.
    pub fn count_non_air(&self) -> usize {
        self.blocks.iter().filter(|b| !b.is_air()).count()
    }

    pub fn sky_light(&self) -> &LightGrid {
        &self.sky_light
    }

    pub fn set_sky_light(&mut self, light: LightGrid) {
        self.sky_light = light;
    }

    /// Whether the mesh needs rebuilding.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

impl Default for Chunk {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("non_air", &self.count_non_air())
            .field("uniform", &self.uniform_block())
            .field("dirty", &self.dirty)
            .finish()
    }
}
