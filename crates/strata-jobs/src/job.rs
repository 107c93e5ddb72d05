//! Job payloads and their results.
//!
//! Every payload owns its data. Workers never read a live chunk; the
//! orchestrating thread clones blocks, light and neighbour faces into the job.

use strata_mesh::{ChunkMesh, NeighborFaces};
use strata_voxel::{Chunk, ChunkCoord};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobKind {
    Generate,
    Mesh,
    Save,
}

/// Load a chunk from disk, or generate it when absent.
#[derive(Clone, Copy, Debug)]
pub struct GenerateJob {
    pub coord: ChunkCoord,
}

/// Mesh a snapshot of a chunk against its neighbours' boundary faces.
pub struct MeshJob {
    pub coord: ChunkCoord,
    pub chunk: Chunk,
    pub neighbors: NeighborFaces,
}

/// Persist a snapshot of a chunk that has left the live map.
pub struct SaveJob {
    pub coord: ChunkCoord,
    pub chunk: Chunk,
}

pub enum Job {
    Generate(GenerateJob),
    Mesh(MeshJob),
    Save(SaveJob),
}

impl Job {
    pub fn generate(coord: ChunkCoord) -> Self {
        Job::Generate(GenerateJob { coord })
    }

    pub fn mesh(coord: ChunkCoord, chunk: Chunk, neighbors: NeighborFaces) -> Self {
        Job::Mesh(MeshJob {
            coord,
            chunk,
            neighbors,
        })
    }

    pub fn save(coord: ChunkCoord, chunk: Chunk) -> Self {
        Job::Save(SaveJob { coord, chunk })
    }

    pub fn coord(&self) -> ChunkCoord {
        match self {
            Job::Generate(job) => job.coord,
            Job::Mesh(job) => job.coord,
            Job::Save(job) => job.coord,
        }
    }

    pub fn kind(&self) -> JobKind {
        match self {
            Job::Generate(_) => JobKind::Generate,
            Job::Mesh(_) => JobKind::Mesh,
            Job::Save(_) => JobKind::Save,
        }
    }
}

#[derive(Debug)]
pub struct GenerateResult {
    pub coord: ChunkCoord,
    /// Blocks with sky light computed.
    pub chunk: Chunk,
    /// `false` when the chunk came from the terrain generator, including
    /// after a failed or corrupt read.
    pub loaded_from_disk: bool,
}

#[derive(Debug)]
pub struct MeshResult {
    pub coord: ChunkCoord,
    pub mesh: ChunkMesh,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SaveResult {
    pub coord: ChunkCoord,
    pub saved: bool,
}

/// A job that panicked on its worker and produced no result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JobFailure {
    pub coord: ChunkCoord,
    pub kind: JobKind,
}
