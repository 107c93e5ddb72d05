//! Resident chunk map and the per-coordinate job lifecycle.
//!
//! A coordinate moves `absent → loading → resident → meshing → resident →
//! saving → absent`. All transitions happen on the thread that owns the
//! [`ChunkManager`]; workers only ever see owned snapshots. Without a
//! [`JobScheduler`] every step runs inline on the calling thread.

use rustc_hash::{FxHashMap, FxHashSet};
use strata_jobs::{
    GenerateJob, GenerateResult, Job, JobContext, JobFailure, JobKind, JobScheduler, MeshJob,
    MeshResult, SaveJob, run_generate, run_mesh, run_save,
};
use strata_mesh::{MeshVertex, NeighborFaces};
use strata_region::RegionError;
use strata_voxel::{BlockId, CHUNK_SIZE, Chunk, ChunkCoord, Face, compute_sky_light};
use tracing::{debug, info, warn};

/// Receives finished chunk meshes, typically a GPU buffer cache.
pub trait MeshSink {
    /// Replaces the geometry stored for `coord`.
    fn upload(&mut self, coord: ChunkCoord, vertices: &[MeshVertex], indices: &[u32]);
    /// Drops the geometry of a chunk that left the world.
    fn remove(&mut self, coord: ChunkCoord);
}

/// Results applied by one [`ChunkManager::update`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateStats {
    pub generated: usize,
    pub meshed: usize,
    pub saved: usize,
    pub failed: usize,
}

/// Coordinates with an outstanding job, one set per job kind.
#[derive(Default)]
struct InFlight {
    loading: FxHashSet<ChunkCoord>,
    meshing: FxHashSet<ChunkCoord>,
    saving: FxHashSet<ChunkCoord>,
}

impl InFlight {
    /// Clears the failed job's in-flight entry. A failed mesh leaves its chunk
    /// dirty again, since the snapshot already cleared the flag.
    fn forget(&mut self, failure: JobFailure, chunks: &mut FxHashMap<ChunkCoord, Chunk>) {
        let set = match failure.kind {
            JobKind::Generate => &mut self.loading,
            JobKind::Mesh => &mut self.meshing,
            JobKind::Save => &mut self.saving,
        };
        set.remove(&failure.coord);

        if failure.kind == JobKind::Mesh
            && let Some(chunk) = chunks.get_mut(&failure.coord)
        {
            chunk.mark_dirty();
        }
    }
}

/// Owns every resident chunk and drives its jobs.
pub struct ChunkManager {
    chunks: FxHashMap<ChunkCoord, Chunk>,
    in_flight: InFlight,
    context: JobContext,
    scheduler: Option<JobScheduler>,
    /// Meshes built inline, delivered on the next update.
    ready_meshes: Vec<MeshResult>,
    /// Unloaded coordinates whose geometry the sink still holds.
    unloaded: Vec<ChunkCoord>,
}

impl ChunkManager {
    /// A manager that runs every job inline.
    pub fn new(context: JobContext) -> Self {
        Self {
            chunks: FxHashMap::default(),
            in_flight: InFlight::default(),
            context,
            scheduler: None,
            ready_meshes: Vec::new(),
            unloaded: Vec::new(),
        }
    }

    /// A manager that hands jobs to `scheduler`, sharing its context.
    pub fn with_scheduler(scheduler: JobScheduler) -> Self {
        let mut manager = Self::new(scheduler.context().clone());
        manager.scheduler = Some(scheduler);
        manager
    }

    pub fn context(&self) -> &JobContext {
        &self.context
    }

    pub fn scheduler(&self) -> Option<&JobScheduler> {
        self.scheduler.as_ref()
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Starts loading `coord`. Returns `false` when the coordinate is already
    /// resident, loading, or still being saved.
    pub fn enqueue_load(&mut self, coord: ChunkCoord) -> bool {
        if self.chunks.contains_key(&coord)
            || self.in_flight.loading.contains(&coord)
            || self.in_flight.saving.contains(&coord)
        {
            return false;
        }

        if let Some(scheduler) = &self.scheduler {
            self.in_flight.loading.insert(coord);
            scheduler.enqueue(Job::generate(coord));
            return true;
        }
        let result = run_generate(&self.context, GenerateJob { coord });
        self.on_generate_complete(result);
        true
    }

    /// Snapshots `coord` and its resident neighbours' faces for meshing.
    ///
    /// The dirty flag is cleared at snapshot time, so an edit made while the
    /// mesh is in flight leaves the chunk dirty for another pass.
    pub fn enqueue_mesh(&mut self, coord: ChunkCoord) -> bool {
        if self.in_flight.meshing.contains(&coord) {
            return false;
        }
        let neighbors = NeighborFaces::gather(coord, |c| self.chunks.get(&c));
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return false;
        };
        chunk.clear_dirty();
        let job = MeshJob {
            coord,
            chunk: chunk.clone(),
            neighbors,
        };

        self.in_flight.meshing.insert(coord);
        match &self.scheduler {
            Some(scheduler) => scheduler.enqueue(Job::Mesh(job)),
            None => self.ready_meshes.push(run_mesh(&self.context, job)),
        }
        true
    }

    /// Removes `coord` from the live map and persists it.
    ///
    /// The chunk disappears immediately. Its save runs on a worker when a
    /// scheduler exists, inline otherwise, and is skipped when there is no
    /// region storage.
    pub fn enqueue_save_and_unload(&mut self, coord: ChunkCoord) -> bool {
        if self.in_flight.saving.contains(&coord) {
            return false;
        }
        let Some(chunk) = self.chunks.remove(&coord) else {
            return false;
        };
        self.unloaded.push(coord);

        if self.context.regions.is_none() {
            debug!(%coord, "unloaded without storage");
            return true;
        }
        match &self.scheduler {
            Some(scheduler) => {
                self.in_flight.saving.insert(coord);
                scheduler.enqueue(Job::save(coord, chunk));
            }
            None => {
                let result = run_save(&self.context, SaveJob { coord, chunk });
                if !result.saved {
                    warn!("Chunk {coord} was unloaded without being saved");
                }
            }
        }
        true
    }

    /// Applies every finished job and pushes geometry changes to `sink`.
    pub fn update(&mut self, sink: &mut dyn MeshSink) -> UpdateStats {
        let mut stats = UpdateStats::default();

        for coord in self.unloaded.drain(..) {
            sink.remove(coord);
        }

        let (generated, meshed, saved, failed) = match &self.scheduler {
            Some(scheduler) => (
                scheduler.poll_generated(),
                scheduler.poll_meshed(),
                scheduler.poll_saved(),
                scheduler.poll_failed(),
            ),
            None => Default::default(),
        };

        for result in generated {
            self.on_generate_complete(result);
            stats.generated += 1;
        }

        let mut meshes = std::mem::take(&mut self.ready_meshes);
        meshes.extend(meshed);
        for result in meshes {
            if self.on_mesh_complete(result, sink) {
                stats.meshed += 1;
            }
        }

        for result in saved {
            self.in_flight.saving.remove(&result.coord);
            if result.saved {
                stats.saved += 1;
            } else {
                warn!("Chunk {} was unloaded without being saved", result.coord);
            }
        }

        stats.failed = failed.len();
        for failure in failed {
            self.on_job_failed(failure);
        }

        stats
    }

    /// Installs a loaded or generated chunk. Returns `false` if it was
    /// already resident.
    pub fn on_generate_complete(&mut self, result: GenerateResult) -> bool {
        let coord = result.coord;
        self.in_flight.loading.remove(&coord);
        if self.chunks.contains_key(&coord) {
            return false;
        }

        let mut chunk = result.chunk;
        chunk.mark_dirty();
        self.chunks.insert(coord, chunk);

        for (_, neighbor) in coord.neighbors() {
            if let Some(chunk) = self.chunks.get_mut(&neighbor) {
                chunk.mark_dirty();
            }
        }
        debug!(%coord, from_disk = result.loaded_from_disk, "chunk resident");
        true
    }

    /// Uploads a finished mesh if its chunk is still resident.
    pub fn on_mesh_complete(&mut self, result: MeshResult, sink: &mut dyn MeshSink) -> bool {
        let coord = result.coord;
        self.in_flight.meshing.remove(&coord);
        if !self.chunks.contains_key(&coord) {
            debug!(%coord, "discarding mesh of unloaded chunk");
            return false;
        }
        sink.upload(coord, &result.mesh.vertices, &result.mesh.indices);
        true
    }

    /// Releases the coordinate of a job that panicked so it can be requested
    /// again. A chunk whose mesh failed is marked dirty for another pass.
    pub fn on_job_failed(&mut self, failure: JobFailure) {
        warn!("{:?} job for chunk {} failed", failure.kind, failure.coord);
        self.in_flight.forget(failure, &mut self.chunks);
    }

    /// Queues meshes for up to `budget` dirty chunks. Returns how many were queued.
    pub fn mesh_dirty_chunks(&mut self, budget: usize) -> usize {
        let dirty: Vec<ChunkCoord> = self
            .chunks
            .iter()
            .filter(|(coord, chunk)| chunk.is_dirty() && !self.in_flight.meshing.contains(*coord))
            .map(|(coord, _)| *coord)
            .take(budget)
            .collect();

        dirty
            .into_iter()
            .filter(|&coord| self.enqueue_mesh(coord))
            .count()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn has_chunk(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    pub fn is_loading(&self, coord: ChunkCoord) -> bool {
        self.in_flight.loading.contains(&coord)
    }

    pub fn is_meshing(&self, coord: ChunkCoord) -> bool {
        self.in_flight.meshing.contains(&coord)
    }

    pub fn is_saving(&self, coord: ChunkCoord) -> bool {
        self.in_flight.saving.contains(&coord)
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// Mutable access for bulk edits. Callers mark the chunk dirty themselves.
    pub fn chunk_mut(&mut self, coord: ChunkCoord) -> Option<&mut Chunk> {
        self.chunks.get_mut(&coord)
    }

    pub fn resident_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn resident_coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.chunks.keys().copied()
    }

    /// Number of jobs of any kind still outstanding.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.loading.len() + self.in_flight.meshing.len() + self.in_flight.saving.len()
    }

    /// Block at a world coordinate, `None` when its chunk is not resident.
    pub fn block_at_world(&self, wx: i32, wy: i32, wz: i32) -> Option<BlockId> {
        let coord = ChunkCoord::from_block(wx, wy, wz);
        let (x, y, z) = local(wx, wy, wz);
        self.chunks.get(&coord).map(|chunk| chunk.get(x, y, z))
    }

    /// Edits one block. The chunk, and any neighbour sharing the touched
    /// boundary, is marked dirty. Returns `false` if the chunk is not resident.
    pub fn set_block_at_world(&mut self, wx: i32, wy: i32, wz: i32, id: BlockId) -> bool {
        let coord = ChunkCoord::from_block(wx, wy, wz);
        let (x, y, z) = local(wx, wy, wz);
        let registry = &self.context.registry;
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return false;
        };
        chunk.set(x, y, z, id);
        let light = compute_sky_light(chunk, registry);
        chunk.set_sky_light(light);
        chunk.mark_dirty();

        let last = CHUNK_SIZE - 1;
        let touched = [
            (Face::NegX, x == 0),
            (Face::PosX, x == last),
            (Face::NegY, y == 0),
            (Face::PosY, y == last),
            (Face::NegZ, z == 0),
            (Face::PosZ, z == last),
        ];
        for (face, on_border) in touched {
            if !on_border {
                continue;
            }
            if let Some(neighbor) = self.chunks.get_mut(&coord.offset(face)) {
                neighbor.mark_dirty();
            }
        }
        true
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Writes every resident chunk, waits for queued saves and flushes the
    /// region files. Returns the number of chunks written inline.
    pub fn save_all(&mut self) -> Result<usize, RegionError> {
        let Some(regions) = self.context.regions.clone() else {
            return Ok(0);
        };

        let mut written = 0;
        for (coord, chunk) in &self.chunks {
            match regions.save_chunk(*coord, chunk) {
                Ok(()) => written += 1,
                Err(e) => warn!("Failed to save chunk {coord}: {e}"),
            }
        }
        self.wait_for_saves();
        regions.flush()?;
        info!("Saved {written} resident chunks");
        Ok(written)
    }

    fn wait_for_saves(&mut self) {
        let Some(scheduler) = &self.scheduler else {
            return;
        };
        while !self.in_flight.saving.is_empty() {
            for result in scheduler.poll_saved() {
                self.in_flight.saving.remove(&result.coord);
            }
            for failure in scheduler.poll_failed() {
                self.in_flight.forget(failure, &mut self.chunks);
            }
            if self.in_flight.saving.is_empty() {
                break;
            }
            if !scheduler.is_running() {
                warn!(
                    "{} chunk saves queued with no workers running",
                    self.in_flight.saving.len()
                );
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
    }

    /// Persists the world and stops the scheduler. Queued jobs finish first.
    pub fn shutdown(&mut self) -> Result<usize, RegionError> {
        let written = self.save_all()?;
        if let Some(scheduler) = &mut self.scheduler {
            scheduler.stop();
            for failure in scheduler.poll_failed() {
                self.in_flight.forget(failure, &mut self.chunks);
            }
            for result in scheduler.poll_saved() {
                self.in_flight.saving.remove(&result.coord);
            }
        }
        if let Some(regions) = &self.context.regions {
            regions.flush()?;
        }
        Ok(written)
    }
}

/// Chunk-local cell of a world block coordinate.
fn local(wx: i32, wy: i32, wz: i32) -> (usize, usize, usize) {
    let n = CHUNK_SIZE as i32;
    (
        wx.rem_euclid(n) as usize,
        wy.rem_euclid(n) as usize,
        wz.rem_euclid(n) as usize,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
