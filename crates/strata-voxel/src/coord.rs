//! Integer chunk-grid coordinates.

use serde::{Deserialize, Serialize};

use crate::chunk::CHUNK_SIZE;
use crate::face::Face;

/// Identifies a chunk's position on the chunk grid.
///
/// World block `(wx, wy, wz)` lives in chunk `(wx >> 4, wy >> 4, wz >> 4)`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ChunkCoord {
    /// Chunk-grid X coordinate.
    pub x: i32,
    /// Chunk-grid Y coordinate.
    pub y: i32,
    /// Chunk-grid Z coordinate.
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the coordinate of the chunk one step along `face`.
    pub fn offset(self, face: Face) -> Self {
        let [dx, dy, dz] = face.normal();
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// The six face-adjacent coordinates, paired with the face that leads to them.
    pub fn neighbors(self) -> [(Face, ChunkCoord); 6] {
        Face::ALL.map(|face| (face, self.offset(face)))
    }

    /// Chunk containing the given world block coordinate.
    pub fn from_block(wx: i32, wy: i32, wz: i32) -> Self {
        let n = CHUNK_SIZE as i32;
        Self::new(wx.div_euclid(n), wy.div_euclid(n), wz.div_euclid(n))
    }

    /// Chunk containing a continuous world position.
    pub fn from_world_pos(x: f32, y: f32, z: f32) -> Self {
        Self::from_block(x.floor() as i32, y.floor() as i32, z.floor() as i32)
    }

    /// World block coordinate of this chunk's `(0, 0, 0)` cell.
    pub fn origin(self) -> (i32, i32, i32) {
        let n = CHUNK_SIZE as i32;
        (self.x * n, self.y * n, self.z * n)
    }

    /// Chebyshev distance on the horizontal plane.
    pub fn horizontal_distance(self, other: ChunkCoord) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_block_floors_negatives() {
        assert_eq!(ChunkCoord::from_block(0, 0, 0), ChunkCoord::new(0, 0, 0));
        assert_eq!(ChunkCoord::from_block(15, 16, -1), ChunkCoord::new(0, 1, -1));
        assert_eq!(ChunkCoord::from_block(-16, -17, 31), ChunkCoord::new(-1, -2, 1));
    }

    #[test]
    fn test_from_world_pos() {
        assert_eq!(
            ChunkCoord::from_world_pos(-0.5, 140.0, 17.9),
            ChunkCoord::new(-1, 8, 1)
        );
    }

    #[test]
    fn test_neighbors_are_unit_steps() {
        let c = ChunkCoord::new(2, -1, 5);
        let neighbors = c.neighbors();
        assert_eq!(neighbors[0], (Face::PosX, ChunkCoord::new(3, -1, 5)));
        assert_eq!(neighbors[3], (Face::NegY, ChunkCoord::new(2, -2, 5)));
        for (face, n) in neighbors {
            assert_eq!(n.offset(face.opposite()), c);
        }
    }

    #[test]
    fn test_origin_and_distance() {
        let c = ChunkCoord::new(-2, 1, 3);
        assert_eq!(c.origin(), (-32, 16, 48));
        assert_eq!(c.horizontal_distance(ChunkCoord::new(1, 9, 2)), 3);
    }
}
