//! Climate biomes and their surface rules.

use strata_voxel::{BlockId, blocks};

/// Tree species planted by a biome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeKind {
    Oak,
    Spruce,
}

impl TreeKind {
    /// Trunk height in blocks.
    pub fn trunk_height(self) -> i32 {
        match self {
            TreeKind::Oak => 5,
            TreeKind::Spruce => 6,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Biome {
    Desert,
    Forest,
    Tundra,
    Plains,
}

/// Per-biome generation parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiomeDef {
    /// Block placed at the column height.
    pub surface: BlockId,
    /// Block placed in the few layers below the surface.
    pub filler: BlockId,
    pub tree: Option<TreeKind>,
    /// Multiplier on the height variation.
    pub amplitude: f64,
    /// Multiplier on the base tree spawn chance.
    pub tree_density: f32,
}

const DESERT: BiomeDef = BiomeDef {
    surface: blocks::SAND,
    filler: blocks::SAND,
    tree: None,
    amplitude: 0.80,
    tree_density: 0.0,
};

const FOREST: BiomeDef = BiomeDef {
    surface: blocks::GRASS,
    filler: blocks::DIRT,
    tree: Some(TreeKind::Oak),
    amplitude: 1.05,
    tree_density: 1.60,
};

const TUNDRA: BiomeDef = BiomeDef {
    surface: blocks::GRASS,
    filler: blocks::DIRT,
    tree: Some(TreeKind::Spruce),
    amplitude: 0.95,
    tree_density: 0.45,
};

const PLAINS: BiomeDef = BiomeDef {
    surface: blocks::GRASS,
    filler: blocks::DIRT,
    tree: Some(TreeKind::Oak),
    amplitude: 1.00,
    tree_density: 0.60,
};

impl Biome {
    pub const ALL: [Biome; 4] = [Biome::Desert, Biome::Forest, Biome::Tundra, Biome::Plains];

    /// Picks a biome from normalised temperature and humidity.
    pub fn from_climate(temperature: f32, humidity: f32) -> Self {
        if temperature > 0.68 && humidity < 0.45 {
            Biome::Desert
        } else if temperature < 0.35 {
            Biome::Tundra
        } else if humidity > 0.60 {
            Biome::Forest
        } else {
            Biome::Plains
        }
    }

    pub fn def(self) -> &'static BiomeDef {
        match self {
            Biome::Desert => &DESERT,
            Biome::Forest => &FOREST,
            Biome::Tundra => &TUNDRA,
            Biome::Plains => &PLAINS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_climate_lookup() {
        assert_eq!(Biome::from_climate(0.9, 0.1), Biome::Desert);
        assert_eq!(Biome::from_climate(0.2, 0.9), Biome::Tundra);
        assert_eq!(Biome::from_climate(0.5, 0.7), Biome::Forest);
        assert_eq!(Biome::from_climate(0.5, 0.5), Biome::Plains);
        // Hot but humid falls through to forest.
        assert_eq!(Biome::from_climate(0.9, 0.8), Biome::Forest);
    }

    #[test]
    fn test_desert_has_no_trees() {
        assert!(Biome::Desert.def().tree.is_none());
        assert_eq!(Biome::Desert.def().surface, blocks::SAND);
        for biome in [Biome::Forest, Biome::Tundra, Biome::Plains] {
            assert!(biome.def().tree.is_some());
            assert_eq!(biome.def().filler, blocks::DIRT);
        }
    }

    #[test]
    fn test_spruce_is_taller() {
        assert!(TreeKind::Spruce.trunk_height() > TreeKind::Oak.trunk_height());
    }
}
