//! The six axis-aligned face directions.

use serde::{Deserialize, Serialize};

/// One of the six cardinal directions a block face can point.
///
/// The `repr(u8)` discriminant is the per-face index used by the block
/// registry tables and by neighbour snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Face {
    /// +X direction.
    PosX = 0,
    /// −X direction.
    NegX = 1,
    /// +Y direction (top).
    PosY = 2,
    /// −Y direction (bottom).
    NegY = 3,
    /// +Z direction.
    PosZ = 4,
    /// −Z direction.
    NegZ = 5,
}

impl Face {
    /// All six directions in index order.
    pub const ALL: [Face; 6] = [
        Self::PosX,
        Self::NegX,
        Self::PosY,
        Self::NegY,
        Self::PosZ,
        Self::NegZ,
    ];

    /// Returns the direction index (0–5).
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Axis the face points along: 0=X, 1=Y, 2=Z.
    #[inline]
    pub fn axis(self) -> usize {
        self.index() / 2
    }

    /// `true` for the +X, +Y and +Z faces.
    #[inline]
    pub fn is_positive(self) -> bool {
        self.index() % 2 == 0
    }

    /// Returns the sweep axes for greedy meshing: `(axis, u, v)` with
    /// `u = (axis + 1) % 3` and `v = (axis + 2) % 3`.
    pub fn sweep_axes(self) -> (usize, usize, usize) {
        let axis = self.axis();
        (axis, (axis + 1) % 3, (axis + 2) % 3)
    }

    /// Unit step along the face normal.
    pub fn normal(self) -> [i32; 3] {
        match self {
            Self::PosX => [1, 0, 0],
            Self::NegX => [-1, 0, 0],
            Self::PosY => [0, 1, 0],
            Self::NegY => [0, -1, 0],
            Self::PosZ => [0, 0, 1],
            Self::NegZ => [0, 0, -1],
        }
    }

    /// Returns the opposite face direction.
    pub fn opposite(self) -> Self {
        match self {
            Self::PosX => Self::NegX,
            Self::NegX => Self::PosX,
            Self::PosY => Self::NegY,
            Self::NegY => Self::PosY,
            Self::PosZ => Self::NegZ,
            Self::NegZ => Self::PosZ,
        }
    }
}
