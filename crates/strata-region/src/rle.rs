//! Run-length encoding of a chunk walked in a [`TraversalOrder`].
//!
//! Each run is two bytes, `count: u8` (1..=255) followed by the block id. The
//! resulting stream is deflated by the codec.

use strata_voxel::{BlockId, CHUNK_VOLUME};

use crate::traversal::TraversalOrder;

/// Largest possible RLE stream: one two-byte run per cell.
pub const MAX_RLE_LEN: usize = CHUNK_VOLUME * 2;

/// A single run: `count` consecutive cells holding `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RleRun {
    /// Number of consecutive identical cells (1..=255).
    pub count: u8,
    /// The block id.
    pub value: BlockId,
}

/// Encodes `blocks` visited in `order` into runs.
pub fn rle_encode(blocks: &[BlockId; CHUNK_VOLUME], order: TraversalOrder) -> Vec<RleRun> {
    let indices = order.indices();
    let mut runs = Vec::new();
    let mut i = 0;
    while i < CHUNK_VOLUME {
        let value = blocks[indices[i] as usize];
        let mut count: u8 = 1;
        while i + (count as usize) < CHUNK_VOLUME
            && count < u8::MAX
            && blocks[indices[i + count as usize] as usize] == value
        {
            count += 1;
        }
        runs.push(RleRun { count, value });
        i += count as usize;
    }
    runs
}

/// Serialises runs as `(count, id)` byte pairs.
pub fn rle_to_bytes(runs: &[RleRun]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(runs.len() * 2);
    for run in runs {
        buf.push(run.count);
        buf.push(run.value.0);
    }
    buf
}

/// Expands a `(count, id)` byte stream back into a block array.
///
/// Runs past the end of the chunk are clipped and cells left unfilled stay
/// air. A trailing odd byte is ignored.
pub fn rle_expand(data: &[u8], order: TraversalOrder) -> Box<[BlockId; CHUNK_VOLUME]> {
    let indices = order.indices();
    let mut blocks = Box::new([BlockId::AIR; CHUNK_VOLUME]);
    let mut out = 0;
    for pair in data.chunks_exact(2) {
        if out >= CHUNK_VOLUME {
            break;
        }
        let count = (pair[0] as usize).min(CHUNK_VOLUME - out);
        for &idx in &indices[out..out + count] {
            blocks[idx as usize] = BlockId(pair[1]);
        }
        out += count;
    }
    blocks
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
