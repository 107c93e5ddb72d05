//! Voxel grid, chunk coordinates, face directions and the block type registry.

pub mod chunk;
pub mod coord;
pub mod face;
pub mod light;
pub mod registry;

pub use chunk::{BlockId, CHUNK_SIZE, CHUNK_VOLUME, Chunk, block_index};
pub use coord::ChunkCoord;
pub use face::Face;
pub use light::{LightGrid, MAX_SKY_LIGHT, compute_sky_light};
pub use registry::{BlockRegistry, BlockType, RegistryError, blocks};
