//! Shared cache of open region files and chunk-level load/save.
//!
//! The manager is shared between worker threads behind an `Arc`. A
//! manager-level mutex guards the coordinate → file map and each open file
//! carries its own mutex, so workers touching different regions never contend
//! on file I/O.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashMap;
use strata_voxel::{Chunk, ChunkCoord};

use crate::codec;
use crate::error::RegionError;
use crate::player::{PlayerData, PlayerDataError};
use crate::region_file::{REGION_MASK, REGION_SHIFT, RegionFile};

/// Identifies a region file: chunk column coordinates shifted right by 5.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionCoord {
    pub x: i32,
    pub z: i32,
}

impl RegionCoord {
    /// Region holding the given chunk, plus the chunk's local slot.
    pub fn of_chunk(coord: ChunkCoord) -> (Self, usize, usize) {
        let region = Self {
            x: coord.x >> REGION_SHIFT,
            z: coord.z >> REGION_SHIFT,
        };
        let local_x = (coord.x & REGION_MASK) as usize;
        let local_z = (coord.z & REGION_MASK) as usize;
        (region, local_x, local_z)
    }

    /// File name inside the world directory, `r.<x>.<z>.vox`.
    pub fn file_name(self) -> String {
        format!("r.{}.{}.vox", self.x, self.z)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the world directory and every region file opened so far.
#[derive(Debug)]
pub struct RegionManager {
    world_dir: PathBuf,
    regions: Mutex<FxHashMap<RegionCoord, Arc<Mutex<RegionFile>>>>,
}

impl RegionManager {
    /// Creates a manager rooted at `world_dir`, creating the directory.
    pub fn new(world_dir: impl Into<PathBuf>) -> Result<Self, RegionError> {
        let world_dir = world_dir.into();
        std::fs::create_dir_all(&world_dir)?;
        tracing::info!(world = %world_dir.display(), "region storage ready");
        Ok(Self {
            world_dir,
            regions: Mutex::new(FxHashMap::default()),
        })
    }

    pub fn world_dir(&self) -> &Path {
        &self.world_dir
    }

    /// Path of the region file for `region`.
    pub fn region_path(&self, region: RegionCoord) -> PathBuf {
        self.world_dir.join(region.file_name())
    }

    /// Returns the cached file for `region`, opening it on first use.
    fn region(&self, region: RegionCoord) -> Result<Arc<Mutex<RegionFile>>, RegionError> {
        let mut regions = lock(&self.regions);
        if let Some(file) = regions.get(&region) {
            return Ok(Arc::clone(file));
        }
        let file = Arc::new(Mutex::new(RegionFile::open(&self.region_path(region))?));
        regions.insert(region, Arc::clone(&file));
        Ok(file)
    }

    /// Number of region files currently open.
    pub fn cached_region_count(&self) -> usize {
        lock(&self.regions).len()
    }

    fn section_y(coord: ChunkCoord) -> Result<i8, RegionError> {
        i8::try_from(coord.y).map_err(|_| RegionError::SectionOutOfRange(coord.y))
    }

    /// Loads a stored chunk.
    ///
    /// Returns `Ok(None)` when the column or the section at `coord.y` has never
    /// been saved.
    pub fn load_chunk(&self, coord: ChunkCoord) -> Result<Option<Chunk>, RegionError> {
        let y = Self::section_y(coord)?;
        let (region, local_x, local_z) = RegionCoord::of_chunk(coord);
        let file = self.region(region)?;

        let column = lock(&file).load_column(local_x, local_z)?;
        let Some(section) = column.as_ref().and_then(|c| c.section(y)) else {
            return Ok(None);
        };
        let blocks = codec::decompress(&section.data)?;
        Ok(Some(Chunk::from_blocks(blocks)))
    }

    /// Encodes and stores a chunk's blocks.
    ///
    /// The write is skipped when the stored section already holds the same
    /// bytes. A column that fails to parse is replaced.
    pub fn save_chunk(&self, coord: ChunkCoord, chunk: &Chunk) -> Result<(), RegionError> {
        let y = Self::section_y(coord)?;
        let (region, local_x, local_z) = RegionCoord::of_chunk(coord);
        let data = codec::compress(chunk.blocks())?;
        let file = self.region(region)?;

        let mut file = lock(&file);
        let mut column = match file.load_column(local_x, local_z) {
            Ok(column) => column.unwrap_or_default(),
            Err(RegionError::CorruptColumn(reason)) => {
                tracing::warn!(%coord, %reason, "discarding corrupt column");
                Default::default()
            }
            Err(err) => return Err(err),
        };
        if !column.upsert(y, data) {
            tracing::trace!(%coord, "section unchanged, skipping write");
            return Ok(());
        }
        file.save_column(local_x, local_z, &column)
    }

    /// Flushes every open region file. Stops at the first failure.
    pub fn flush(&self) -> Result<(), RegionError> {
        let files: Vec<_> = lock(&self.regions).values().cloned().collect();
        for file in files {
            lock(&file).flush()?;
        }
        Ok(())
    }

    /// Path of the player record, `player.dat` in the world directory.
    pub fn player_path(&self) -> PathBuf {
        self.world_dir.join("player.dat")
    }

    /// Loads the player record, `None` if none has been saved.
    pub fn load_player(&self) -> Result<Option<PlayerData>, PlayerDataError> {
        PlayerData::load(&self.player_path())
    }

    /// Saves the player record.
    pub fn save_player(&self, data: &PlayerData) -> Result<(), PlayerDataError> {
        data.save(&self.player_path())
    }
}

impl Drop for RegionManager {
    fn drop(&mut self) {
        if let Err(err) = self.flush() {
            tracing::warn!(%err, "failed to flush region files on shutdown");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
