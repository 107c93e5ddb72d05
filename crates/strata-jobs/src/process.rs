//! Job execution. Runs on worker threads, or inline when no scheduler exists.
//!
//! Nothing here returns an error: storage and codec failures are logged and
//! folded into the result flags.

use strata_mesh::greedy_mesh;
use strata_voxel::compute_sky_light;
use tracing::{debug, warn};

use crate::context::JobContext;
use crate::job::{GenerateJob, GenerateResult, Job, MeshJob, MeshResult, SaveJob, SaveResult};

/// Result of any job kind.
#[derive(Debug)]
pub enum JobOutput {
    Generated(GenerateResult),
    Meshed(MeshResult),
    Saved(SaveResult),
}

pub fn run_job(ctx: &JobContext, job: Job) -> JobOutput {
    match job {
        Job::Generate(job) => JobOutput::Generated(run_generate(ctx, job)),
        Job::Mesh(job) => JobOutput::Meshed(run_mesh(ctx, job)),
        Job::Save(job) => JobOutput::Saved(run_save(ctx, job)),
    }
}

/// Reads the chunk from its region file, falling back to the terrain generator.
pub fn run_generate(ctx: &JobContext, job: GenerateJob) -> GenerateResult {
    let coord = job.coord;
    let stored = match &ctx.regions {
        Some(regions) => match regions.load_chunk(coord) {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!("Chunk {coord} unreadable, regenerating: {e}");
                None
            }
        },
        None => None,
    };

    let loaded_from_disk = stored.is_some();
    let mut chunk = match stored {
        Some(chunk) => chunk,
        None => ctx.generator.generate(coord),
    };
    let light = compute_sky_light(&chunk, &ctx.registry);
    chunk.set_sky_light(light);

    debug!(%coord, loaded_from_disk, "chunk ready");
    GenerateResult {
        coord,
        chunk,
        loaded_from_disk,
    }
}

pub fn run_mesh(ctx: &JobContext, job: MeshJob) -> MeshResult {
    let mesh = greedy_mesh(&job.chunk, &job.neighbors, &ctx.registry);
    debug!(coord = %job.coord, quads = mesh.quad_count(), "chunk meshed");
    MeshResult {
        coord: job.coord,
        mesh,
    }
}

pub fn run_save(ctx: &JobContext, job: SaveJob) -> SaveResult {
    let coord = job.coord;
    let saved = match &ctx.regions {
        Some(regions) => match regions.save_chunk(coord, &job.chunk) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to save chunk {coord}: {e}");
                false
            }
        },
        None => false,
    };
    SaveResult { coord, saved }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use strata_mesh::NeighborFaces;
    use strata_region::RegionManager;
    use strata_voxel::{BlockId, Chunk, ChunkCoord, MAX_SKY_LIGHT, blocks};

    fn context_with_regions(dir: &std::path::Path) -> JobContext {
        let mut ctx = JobContext::in_memory(11);
        ctx.regions = Some(Arc::new(RegionManager::new(dir).unwrap()));
        ctx
    }

    #[test]
    fn test_generate_without_storage_uses_terrain() {
        let ctx = JobContext::in_memory(11);
        let coord = ChunkCoord::new(1, 7, 1);
        let result = run_generate(&ctx, GenerateJob { coord });
        assert!(!result.loaded_from_disk);
        assert_eq!(result.chunk.blocks(), ctx.generator.generate(coord).blocks());
    }

    #[test]
    fn test_generate_computes_sky_light() {
        let ctx = JobContext::in_memory(11);
        let result = run_generate(
            &ctx,
            GenerateJob {
                coord: ChunkCoord::new(0, 1, 0),
            },
        );
        // Buried chunk: solid stone, no light anywhere.
        assert!(result.chunk.sky_light().as_slice().iter().all(|&l| l == 0));
    }

    #[test]
    fn test_save_then_generate_loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_with_regions(dir.path());
        let coord = ChunkCoord::new(-4, 3, 9);
        let mut chunk = Chunk::new();
        chunk.set(1, 2, 3, blocks::LOG);

        let saved = run_save(&ctx, SaveJob { coord, chunk });
        assert!(saved.saved);

        let result = run_generate(&ctx, GenerateJob { coord });
        assert!(result.loaded_from_disk);
        assert_eq!(result.chunk.get(1, 2, 3), blocks::LOG);
        assert_eq!(result.chunk.count_non_air(), 1);
        assert_eq!(result.chunk.sky_light().get(1, 3, 3), MAX_SKY_LIGHT);
        assert_eq!(result.chunk.sky_light().get(1, 1, 3), 0);
    }

    #[test]
    fn test_save_without_storage_reports_unsaved() {
        let ctx = JobContext::in_memory(3);
        let result = run_save(
            &ctx,
            SaveJob {
                coord: ChunkCoord::new(0, 0, 0),
                chunk: Chunk::new(),
            },
        );
        assert!(!result.saved);
    }

    #[test]
    fn test_mesh_job_uses_snapshot() {
        let ctx = JobContext::in_memory(3);
        let mut chunk = Chunk::new();
        chunk.set(0, 0, 0, BlockId(3));
        let output = run_job(
            &ctx,
            Job::mesh(ChunkCoord::new(0, 0, 0), chunk, NeighborFaces::none()),
        );
        match output {
            JobOutput::Meshed(result) => assert_eq!(result.mesh.quad_count(), 6),
            other => panic!("unexpected output {other:?}"),
        }
    }
}
