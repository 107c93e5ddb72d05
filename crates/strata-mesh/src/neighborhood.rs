//! Boundary-layer snapshots of the six face-adjacent chunks.
//!
//! A mesh job must not read another chunk's live data, so the orchestrating
//! thread copies the single layer of each neighbour that touches this chunk.
//! Each snapshot is 256 ids in the layout below, where the two coordinates are
//! the neighbour's local in-plane coordinates:
//!
//! | Face | Neighbour layer | Index |
//! |------|-----------------|-------|
//! | `PosX` | `x = 0`  | `y * 16 + z` |
//! | `NegX` | `x = 15` | `y * 16 + z` |
//! | `PosY` | `y = 0`  | `x * 16 + z` |
//! | `NegY` | `y = 15` | `x * 16 + z` |
//! | `PosZ` | `z = 0`  | `x * 16 + y` |
//! | `NegZ` | `z = 15` | `x * 16 + y` |

use strata_voxel::{BlockId, CHUNK_SIZE, Chunk, ChunkCoord, Face};

/// Cells in one chunk face.
pub const FACE_AREA: usize = CHUNK_SIZE * CHUNK_SIZE;

/// One neighbour's boundary layer.
pub type FaceSnapshot = Box<[BlockId; FACE_AREA]>;

/// Index of a cell inside the snapshot for `face`, from the cell's local
/// coordinates (only the two in-plane coordinates are used).
#[inline]
fn snapshot_index(face: Face, x: usize, y: usize, z: usize) -> usize {
    match face {
        Face::PosX | Face::NegX => y * CHUNK_SIZE + z,
        Face::PosY | Face::NegY => x * CHUNK_SIZE + z,
        Face::PosZ | Face::NegZ => x * CHUNK_SIZE + y,
    }
}

/// Optional boundary snapshots for all six faces, indexed by [`Face::index`].
///
/// A missing snapshot reads as air, so faces on that side are emitted.
#[derive(Clone, Debug, Default)]
pub struct NeighborFaces {
    faces: [Option<FaceSnapshot>; 6],
}

impl NeighborFaces {
    /// No neighbours: every boundary face is exposed.
    pub fn none() -> Self {
        Self::default()
    }

    /// Copies the layer of `neighbor` that touches a chunk on its `face` side.
    ///
    /// `neighbor` is the chunk one step along `face` from the chunk being meshed.
    pub fn capture(face: Face, neighbor: &Chunk) -> FaceSnapshot {
        let last = CHUNK_SIZE - 1;
        let mut snapshot = Box::new([BlockId::AIR; FACE_AREA]);
        for a in 0..CHUNK_SIZE {
            for b in 0..CHUNK_SIZE {
                let (x, y, z) = match face {
                    Face::PosX => (0, a, b),
                    Face::NegX => (last, a, b),
                    Face::PosY => (a, 0, b),
                    Face::NegY => (a, last, b),
                    Face::PosZ => (a, b, 0),
                    Face::NegZ => (a, b, last),
                };
                snapshot[snapshot_index(face, x, y, z)] = neighbor.get(x, y, z);
            }
        }
        snapshot
    }

    /// Snapshots every resident neighbour of `center` found through `lookup`.
    pub fn gather<'a, F>(center: ChunkCoord, lookup: F) -> Self
    where
        F: Fn(ChunkCoord) -> Option<&'a Chunk>,
    {
        let mut faces = Self::none();
        for (face, coord) in center.neighbors() {
            if let Some(neighbor) = lookup(coord) {
                faces.set(face, Self::capture(face, neighbor));
            }
        }
        faces
    }

    pub fn set(&mut self, face: Face, snapshot: FaceSnapshot) {
        self.faces[face.index()] = Some(snapshot);
    }

    pub fn get(&self, face: Face) -> Option<&[BlockId; FACE_AREA]> {
        self.faces[face.index()].as_deref()
    }

    /// Number of faces with a snapshot.
    pub fn present_count(&self) -> usize {
        self.faces.iter().filter(|f| f.is_some()).count()
    }

    /// Block just outside the chunk when stepping from local cell
    /// `(x, y, z)` along `face`. Air when no snapshot is present.
    #[inline]
    pub fn sample(&self, face: Face, x: usize, y: usize, z: usize) -> BlockId {
        match &self.faces[face.index()] {
            Some(snapshot) => snapshot[snapshot_index(face, x, y, z)],
            None => BlockId::AIR,
        }
    }
}
