use std::sync::Arc;

use strata_region::RegionManager;
use strata_terrain::TerrainGenerator;
use strata_voxel::BlockRegistry;

/// Read-only collaborators shared by every worker.
#[derive(Clone)]
pub struct JobContext {
    pub generator: Arc<TerrainGenerator>,
    pub registry: Arc<BlockRegistry>,
    /// Persistent storage. `None` runs generation-only with saves dropped.
    pub regions: Option<Arc<RegionManager>>,
}

impl JobContext {
    pub fn new(
        generator: Arc<TerrainGenerator>,
        registry: Arc<BlockRegistry>,
        regions: Option<Arc<RegionManager>>,
    ) -> Self {
        Self {
            generator,
            registry,
            regions,
        }
    }

    /// A storage-less context over the default block set.
    pub fn in_memory(seed: u32) -> Self {
        Self::new(
            Arc::new(TerrainGenerator::new(seed)),
            Arc::new(BlockRegistry::with_defaults()),
            None,
        )
    }
}
