//! Traversal orders used to linearise a chunk before run-length encoding.
//!
//! Each order is a permutation of `0..CHUNK_VOLUME`: entry `i` is the linear
//! block index visited at step `i`. Tables are built on first use and shared.

use std::sync::OnceLock;

use strata_voxel::{CHUNK_SIZE, CHUNK_VOLUME, block_index};

/// A permutation of the chunk's cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TraversalOrder {
    /// X fastest, then Y, then Z (the storage layout itself).
    Linear,
    /// Horizontal layers bottom-up: for each y, for each z, for each x.
    YMajor,
    /// Z-order curve interleaving the bits of x, y and z.
    Morton,
}

struct Tables {
    linear: [u16; CHUNK_VOLUME],
    y_major: [u16; CHUNK_VOLUME],
    morton: [u16; CHUNK_VOLUME],
}

fn tables() -> &'static Tables {
    static TABLES: OnceLock<Box<Tables>> = OnceLock::new();
    TABLES.get_or_init(|| {
        let mut t = Box::new(Tables {
            linear: [0; CHUNK_VOLUME],
            y_major: [0; CHUNK_VOLUME],
            morton: [0; CHUNK_VOLUME],
        });

        for (i, slot) in t.linear.iter_mut().enumerate() {
            *slot = i as u16;
        }

        let mut i = 0;
        for y in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                for x in 0..CHUNK_SIZE {
                    t.y_major[i] = block_index(x, y, z) as u16;
                    i += 1;
                }
            }
        }

        for m in 0..CHUNK_VOLUME as u16 {
            let x = compact_1_by_2(m) as usize;
            let y = compact_1_by_2(m >> 1) as usize;
            let z = compact_1_by_2(m >> 2) as usize;
            t.morton[m as usize] = block_index(x, y, z) as u16;
        }
        t
    })
}

/// Gathers every third bit of `v` (bits 0, 3, 6, 9) into a 4-bit value.
fn compact_1_by_2(v: u16) -> u8 {
    let mut v = v & 0x249;
    v = (v ^ (v >> 2)) & 0x0C3;
    v = (v ^ (v >> 4)) & 0x00F;
    v as u8
}

impl TraversalOrder {
    /// All orders in the sequence the encoder tries them.
    pub const ALL: [TraversalOrder; 3] = [Self::Linear, Self::YMajor, Self::Morton];

    /// The permutation table for this order.
    pub fn indices(self) -> &'static [u16; CHUNK_VOLUME] {
        let t = tables();
        match self {
            Self::Linear => &t.linear,
            Self::YMajor => &t.y_major,
            Self::Morton => &t.morton,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_permutation(order: TraversalOrder) {
        let mut seen = vec![false; CHUNK_VOLUME];
        for &idx in order.indices() {
            assert!(!seen[idx as usize], "{order:?} visits {idx} twice");
            seen[idx as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_orders_are_permutations() {
        for order in TraversalOrder::ALL {
            assert_permutation(order);
        }
    }

    #[test]
    fn test_y_major_walks_layers() {
        let idx = TraversalOrder::YMajor.indices();
        assert_eq!(idx[0], block_index(0, 0, 0) as u16);
        assert_eq!(idx[1], block_index(1, 0, 0) as u16);
        assert_eq!(idx[16], block_index(0, 0, 1) as u16);
        assert_eq!(idx[256], block_index(0, 1, 0) as u16);
    }

    #[test]
    fn test_morton_first_octant() {
        let idx = TraversalOrder::Morton.indices();
        assert_eq!(idx[0], block_index(0, 0, 0) as u16);
        assert_eq!(idx[1], block_index(1, 0, 0) as u16);
        assert_eq!(idx[2], block_index(0, 1, 0) as u16);
        assert_eq!(idx[4], block_index(0, 0, 1) as u16);
        assert_eq!(idx[7], block_index(1, 1, 1) as u16);
        assert_eq!(idx[8], block_index(2, 0, 0) as u16);
    }

    #[test]
    fn test_compact_extracts_every_third_bit() {
        assert_eq!(compact_1_by_2(0b001_001_001_001), 0b1111);
        assert_eq!(compact_1_by_2(0b010_010_010_010), 0);
        assert_eq!(compact_1_by_2(0b000_000_001_000), 0b0010);
    }
}
