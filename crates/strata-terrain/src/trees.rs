//! Grid-scattered tree placement.
//!
//! The world is divided into square cells of [`TREE_GRID_SIZE`] columns. Each
//! cell hashes to a spawn roll and an offset; a tree grows only at the one
//! column the offset selects, so placement is stable across chunk borders.

use strata_voxel::{BlockId, Chunk, blocks};

use crate::biome::TreeKind;

pub const TREE_GRID_SIZE: i32 = 7;
/// Horizontal canopy reach from the trunk.
pub const TREE_LEAF_RADIUS: i32 = 2;
const TREE_OFFSET_RANGE: u32 = 10;

fn cell_hash(cell_x: i32, cell_z: i32, seed: u32) -> u32 {
    (cell_x.wrapping_mul(73_856_093) as u32)
        ^ (cell_z.wrapping_mul(19_349_663) as u32)
        ^ seed.wrapping_mul(83_492_791)
}

/// Whether a tree trunk stands at world column `(wx, wz)` for the given
/// spawn `chance` (clamped to 1).
pub fn is_tree_origin(wx: i32, wz: i32, chance: f32, seed: u32) -> bool {
    if chance <= 0.0 {
        return false;
    }
    let chance = chance.min(1.0);

    let cell_x = wx.div_euclid(TREE_GRID_SIZE);
    let cell_z = wz.div_euclid(TREE_GRID_SIZE);
    let hash = cell_hash(cell_x, cell_z, seed);

    let roll = (hash % 10_000) as f32 / 10_000.0;
    if roll >= chance {
        return false;
    }

    let offset = hash.wrapping_mul(31_337);
    let off_x = (offset % TREE_OFFSET_RANGE) as i32;
    let off_z = ((offset / TREE_OFFSET_RANGE) % TREE_OFFSET_RANGE) as i32;

    wx == cell_x * TREE_GRID_SIZE + off_x && wz == cell_z * TREE_GRID_SIZE + off_z
}

/// Grows a tree whose trunk starts at chunk-local `(x, base_y, z)`.
///
/// Coordinates may lie outside the chunk; out-of-range writes are dropped.
/// The trunk replaces whatever it passes through, leaves only fill air.
pub fn plant_tree(chunk: &mut Chunk, x: i32, base_y: i32, z: i32, kind: TreeKind) {
    let trunk = kind.trunk_height();
    for ty in 0..trunk {
        chunk.set_checked(x, base_y + ty, z, blocks::LOG);
    }

    let top = base_y + trunk - 1;
    for lx in -TREE_LEAF_RADIUS..=TREE_LEAF_RADIUS {
        for ly in -1..=TREE_LEAF_RADIUS {
            for lz in -TREE_LEAF_RADIUS..=TREE_LEAF_RADIUS {
                if lx.abs() + ly.abs() + lz.abs() > TREE_LEAF_RADIUS + 1 {
                    continue;
                }
                if lx == 0 && lz == 0 && ly < TREE_LEAF_RADIUS {
                    continue;
                }
                let (px, py, pz) = (x + lx, top + ly, z + lz);
                if chunk.get_checked(px, py, pz) == Some(BlockId::AIR) {
                    chunk.set_checked(px, py, pz, blocks::LEAVES);
                }
            }
        }
    }
}
