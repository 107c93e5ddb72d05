//! Greedy meshing: turns a chunk plus snapshots of its neighbours' boundary
//! layers into a merged quad mesh.

mod chunk_mesh;
mod greedy;
mod neighborhood;

pub use chunk_mesh::{ChunkMesh, FACE_SHADE, MeshVertex, QuadInfo};
pub use greedy::greedy_mesh;
pub use neighborhood::{FACE_AREA, FaceSnapshot, NeighborFaces};
