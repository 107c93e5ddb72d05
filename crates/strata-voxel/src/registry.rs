//! Block type registry: a fixed 256-entry table indexed by [`BlockId`].
//!
//! Every possible block byte has an entry, so lookups never fail. Entry 0 is
//! always air and cannot be replaced. The table is built once at startup and
//! shared read-only (behind an `Arc`) by the mesher and the job workers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chunk::BlockId;
use crate::face::Face;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Block ids shipped with the default table.
pub mod blocks {
    use crate::chunk::BlockId;

    pub const AIR: BlockId = BlockId(0);
    pub const DIRT: BlockId = BlockId(1);
    pub const GRASS: BlockId = BlockId(2);
    pub const STONE: BlockId = BlockId(3);
    pub const SAND: BlockId = BlockId(4);
    pub const LOG: BlockId = BlockId(5);
    pub const LEAVES: BlockId = BlockId(6);
    pub const WATER: BlockId = BlockId(9);
}

/// Descriptor for one block type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockType {
    /// Human-readable name (e.g. "stone", "grass").
    pub name: String,
    /// Whether entities collide with this block.
    pub solid: bool,
    /// Whether light and visibility pass through.
    pub transparent: bool,
    /// Texture tile per face, indexed by [`Face::index`].
    pub face_tiles: [u16; 6],
    /// Quarter turns (0–3) applied to the face UVs, indexed by [`Face::index`].
    pub face_rotations: [u8; 6],
}

impl BlockType {
    /// The air descriptor: non-solid, transparent, tile 0.
    pub fn air() -> Self {
        Self {
            name: "air".to_string(),
            solid: false,
            transparent: true,
            face_tiles: [0; 6],
            face_rotations: [0; 6],
        }
    }

    /// A solid opaque block using the same tile on every face.
    pub fn solid(name: &str, tile: u16) -> Self {
        Self {
            name: name.to_string(),
            solid: true,
            transparent: false,
            face_tiles: [tile; 6],
            face_rotations: [0; 6],
        }
    }

    /// Sets distinct tiles for the sides, the top and the bottom.
    pub fn with_tiles(mut self, side: u16, top: u16, bottom: u16) -> Self {
        self.face_tiles = [side, side, top, bottom, side, side];
        self
    }

    /// Sets the rotation of a single face (taken modulo four quarter turns).
    pub fn with_rotation(mut self, face: Face, quarter_turns: u8) -> Self {
        self.face_rotations[face.index()] = quarter_turns % 4;
        self
    }

    /// Marks the block as letting light through.
    pub fn transparent(mut self) -> Self {
        self.transparent = true;
        self
    }

    /// Marks the block as non-colliding.
    pub fn non_solid(mut self) -> Self {
        self.solid = false;
        self
    }

    pub fn tile(&self, face: Face) -> u16 {
        self.face_tiles[face.index()]
    }

    pub fn rotation(&self, face: Face) -> u8 {
        self.face_rotations[face.index()]
    }
}

/// Errors that can occur during block type registration.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Id 0 is permanently air.
    #[error("block id 0 is reserved for air")]
    AirReserved,
    /// Another id already uses this name.
    #[error("duplicate block type name: {0}")]
    DuplicateName(String),
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Maps every [`BlockId`] to a [`BlockType`] with O(1) lookup.
#[derive(Clone, Debug)]
pub struct BlockRegistry {
    /// Dense table where `index == BlockId.0`, always 256 entries.
    types: Vec<BlockType>,
}

impl BlockRegistry {
    /// Creates a registry where every id is an unnamed, air-like placeholder.
    pub fn new() -> Self {
        let mut types = vec![
            BlockType {
                name: String::new(),
                ..BlockType::air()
            };
            256
        ];
        types[0] = BlockType::air();
        Self { types }
    }

    /// The default block table used by the terrain generator.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let defaults = [
            (blocks::DIRT, BlockType::solid("dirt", 0)),
            (blocks::GRASS, BlockType::solid("grass", 2).with_tiles(2, 1, 0)),
            (blocks::STONE, BlockType::solid("stone", 3)),
            (blocks::SAND, BlockType::solid("sand", 8)),
            (blocks::LOG, BlockType::solid("log", 4).with_tiles(4, 5, 5)),
            (blocks::LEAVES, BlockType::solid("leaves", 6).transparent()),
            (
                blocks::WATER,
                BlockType::solid("water", 7).transparent().non_solid(),
            ),
        ];
        for (id, def) in defaults {
            // The default ids are non-zero with unique names.
            let _ = registry.register(id, def);
        }
        registry
    }

    /// Installs `def` at `id`, replacing the previous entry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AirReserved`] for id 0 and
    /// [`RegistryError::DuplicateName`] if another id already uses the name.
    pub fn register(&mut self, id: BlockId, def: BlockType) -> Result<(), RegistryError> {
        if id.is_air() {
            return Err(RegistryError::AirReserved);
        }
        if let Some(existing) = self.lookup_by_name(&def.name)
            && existing != id
        {
            return Err(RegistryError::DuplicateName(def.name));
        }
        tracing::debug!(id = id.0, name = %def.name, "registered block type");
        self.types[id.0 as usize] = def;
        Ok(())
    }

    /// Returns the descriptor for `id`.
    #[inline]
    pub fn get(&self, id: BlockId) -> &BlockType {
        &self.types[id.0 as usize]
    }

    /// Returns the id registered under `name`, ignoring unnamed placeholders.
    pub fn lookup_by_name(&self, name: &str) -> Option<BlockId> {
        if name.is_empty() {
            return None;
        }
        self.types
            .iter()
            .position(|t| t.name == name)
            .map(|i| BlockId(i as u8))
    }

    #[inline]
    pub fn is_solid(&self, id: BlockId) -> bool {
        self.get(id).solid
    }

    #[inline]
    pub fn is_transparent(&self, id: BlockId) -> bool {
        self.get(id).transparent
    }

    /// Texture tile and rotation for one face of a block.
    #[inline]
    pub fn face_texture(&self, id: BlockId, face: Face) -> (u16, u8) {
        let def = self.get(id);
        (def.tile(face), def.rotation(face))
    }

    /// Number of named entries, air included.
    pub fn named_count(&self) -> usize {
        self.types.iter().filter(|t| !t.name.is_empty()).count()
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_air_is_id_zero() {
        let registry = BlockRegistry::with_defaults();
        let air = registry.get(BlockId::AIR);
        assert_eq!(air.name, "air");
        assert!(!air.solid);
        assert!(air.transparent);
    }

    #[test]
    fn test_air_cannot_be_replaced() {
        let mut registry = BlockRegistry::new();
        let result = registry.register(BlockId::AIR, BlockType::solid("bedrock", 9));
        assert!(matches!(result, Err(RegistryError::AirReserved)));
        assert_eq!(registry.get(BlockId::AIR).name, "air");
    }

    #[test]
    fn test_every_id_resolves() {
        let registry = BlockRegistry::new();
        for id in 0..=255u8 {
            let def = registry.get(BlockId(id));
            assert!(!def.solid);
        }
        assert_eq!(registry.named_count(), 1);
    }

    #[test]
    fn test_default_grass_faces() {
        let registry = BlockRegistry::with_defaults();
        assert_eq!(registry.face_texture(blocks::GRASS, Face::PosY), (1, 0));
        assert_eq!(registry.face_texture(blocks::GRASS, Face::NegY), (0, 0));
        assert_eq!(registry.face_texture(blocks::GRASS, Face::PosX), (2, 0));
        assert_eq!(registry.face_texture(blocks::SAND, Face::NegZ), (8, 0));
        assert_eq!(registry.lookup_by_name("stone"), Some(blocks::STONE));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = BlockRegistry::with_defaults();
        let result = registry.register(BlockId(40), BlockType::solid("stone", 3));
        assert!(matches!(result, Err(RegistryError::DuplicateName(_))));
        // Re-registering the same id under its own name is a replacement.
        assert!(
            registry
                .register(blocks::STONE, BlockType::solid("stone", 11))
                .is_ok()
        );
        assert_eq!(registry.face_texture(blocks::STONE, Face::PosX), (11, 0));
    }

    #[test]
    fn test_rotation_wraps() {
        let def = BlockType::solid("log", 4).with_rotation(Face::PosX, 5);
        assert_eq!(def.rotation(Face::PosX), 1);
    }

    #[test]
    fn test_water_and_leaves_transparent() {
        let registry = BlockRegistry::with_defaults();
        assert!(registry.is_transparent(blocks::WATER));
        assert!(!registry.is_solid(blocks::WATER));
        assert!(registry.is_transparent(blocks::LEAVES));
        assert!(!registry.is_transparent(blocks::DIRT));
    }
}
