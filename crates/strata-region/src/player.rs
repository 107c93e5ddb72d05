//! Fixed-size binary player record stored as `player.dat`.
//!
//! ## Binary Layout (version 2, 40 bytes, little-endian)
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | `version: u32` (2) |
//! | 4 | 12 | Position `x, y, z: f32` |
//! | 16 | 8 | Orientation `yaw, pitch: f32` (degrees) |
//! | 24 | 4 | `time_of_day: f32` (0–1) |
//! | 28 | 8 | `health, hunger: f32` |
//! | 36 | 4 | `gamemode: u32` |
//!
//! Version 1 files are 24 bytes holding only position, orientation and time of
//! day. They load with full health and hunger in survival mode.

use std::path::Path;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use static_assertions::const_assert_eq;

/// Version written by [`PlayerData::save`].
pub const PLAYER_DATA_VERSION: u32 = 2;

/// Health and hunger given to records upgraded from version 1.
pub const DEFAULT_VITALS: f32 = 20.0;

/// Persisted player state.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PlayerData {
    pub version: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub time_of_day: f32,
    pub health: f32,
    pub hunger: f32,
    pub gamemode: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct PlayerDataV1 {
    x: f32,
    y: f32,
    z: f32,
    yaw: f32,
    pitch: f32,
    time_of_day: f32,
}

const_assert_eq!(std::mem::size_of::<PlayerData>(), 40);
const_assert_eq!(std::mem::size_of::<PlayerDataV1>(), 24);

/// Errors that can occur when loading or saving the player record.
#[derive(Debug, thiserror::Error)]
pub enum PlayerDataError {
    #[error("player data i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is neither the current nor the legacy size.
    #[error("unrecognised player data size: {0} bytes")]
    InvalidSize(usize),

    /// A 40-byte record carrying an unknown version tag.
    #[error("unsupported player data version: {0}")]
    UnsupportedVersion(u32),
}

fn f32_le(v: f32) -> f32 {
    f32::from_bits(v.to_bits().to_le())
}

fn f32_from_le(v: f32) -> f32 {
    f32::from_bits(u32::from_le(v.to_bits()))
}

impl PlayerData {
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.x = position.x;
        self.y = position.y;
        self.z = position.z;
    }

    /// Encodes the record into its on-disk bytes.
    pub fn to_bytes(&self) -> [u8; 40] {
        let le = Self {
            version: self.version.to_le(),
            x: f32_le(self.x),
            y: f32_le(self.y),
            z: f32_le(self.z),
            yaw: f32_le(self.yaw),
            pitch: f32_le(self.pitch),
            time_of_day: f32_le(self.time_of_day),
            health: f32_le(self.health),
            hunger: f32_le(self.hunger),
            gamemode: self.gamemode.to_le(),
        };
        bytemuck::cast(le)
    }

    /// Decodes a current or legacy record.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PlayerDataError> {
        match bytes.len() {
            40 => {
                let raw: PlayerData = bytemuck::pod_read_unaligned(bytes);
                let data = Self {
                    version: u32::from_le(raw.version),
                    x: f32_from_le(raw.x),
                    y: f32_from_le(raw.y),
                    z: f32_from_le(raw.z),
                    yaw: f32_from_le(raw.yaw),
                    pitch: f32_from_le(raw.pitch),
                    time_of_day: f32_from_le(raw.time_of_day),
                    health: f32_from_le(raw.health),
                    hunger: f32_from_le(raw.hunger),
                    gamemode: u32::from_le(raw.gamemode),
                };
                if data.version != PLAYER_DATA_VERSION {
                    return Err(PlayerDataError::UnsupportedVersion(data.version));
                }
                Ok(data)
            }
            24 => {
                let v1: PlayerDataV1 = bytemuck::pod_read_unaligned(bytes);
                Ok(Self {
                    version: PLAYER_DATA_VERSION,
                    x: f32_from_le(v1.x),
                    y: f32_from_le(v1.y),
                    z: f32_from_le(v1.z),
                    yaw: f32_from_le(v1.yaw),
                    pitch: f32_from_le(v1.pitch),
                    time_of_day: f32_from_le(v1.time_of_day),
                    health: DEFAULT_VITALS,
                    hunger: DEFAULT_VITALS,
                    gamemode: 0,
                })
            }
            other => Err(PlayerDataError::InvalidSize(other)),
        }
    }

    /// Reads `path`, returning `None` if the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>, PlayerDataError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let data = Self::from_bytes(&bytes)?;
        tracing::info!(path = %path.display(), "loaded player data");
        Ok(Some(data))
    }

    /// Writes the record to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), PlayerDataError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_bytes())?;
        Ok(())
    }
}

impl Default for PlayerData {
    fn default() -> Self {
        Self {
            version: PLAYER_DATA_VERSION,
            x: 8.0,
            y: 140.0,
            z: 8.0,
            yaw: -90.0,
            pitch: 0.0,
            time_of_day: 0.25,
            health: DEFAULT_VITALS,
            hunger: DEFAULT_VITALS,
            gamemode: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v1_bytes(values: [f32; 6]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_layout_is_little_endian() {
        let data = PlayerData {
            x: 1.5,
            gamemode: 1,
            ..PlayerData::default()
        };
        let bytes = data.to_bytes();
        assert_eq!(&bytes[0..4], &2u32.to_le_bytes());
        assert_eq!(&bytes[4..8], &1.5f32.to_le_bytes());
        assert_eq!(&bytes[36..40], &1u32.to_le_bytes());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world").join("player.dat");
        let mut data = PlayerData::default();
        data.set_position(Vec3::new(-12.25, 97.0, 4096.5));
        data.health = 7.5;
        data.gamemode = 1;
        data.save(&path).unwrap();

        assert_eq!(std::fs::metadata(&path).unwrap().len(), 40);
        let loaded = PlayerData::load(&path).unwrap().unwrap();
        assert_eq!(loaded, data);
        assert_eq!(loaded.position(), Vec3::new(-12.25, 97.0, 4096.5));
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PlayerData::load(&dir.path().join("player.dat")).unwrap().is_none());
    }

    #[test]
    fn test_legacy_record_upgraded() {
        let bytes = v1_bytes([1.0, 2.0, 3.0, 45.0, -10.0, 0.75]);
        let data = PlayerData::from_bytes(&bytes).unwrap();
        assert_eq!(data.version, PLAYER_DATA_VERSION);
        assert_eq!(data.position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(data.yaw, 45.0);
        assert_eq!(data.pitch, -10.0);
        assert_eq!(data.time_of_day, 0.75);
        assert_eq!(data.health, 20.0);
        assert_eq!(data.hunger, 20.0);
        assert_eq!(data.gamemode, 0);
    }

    #[test]
    fn test_other_sizes_rejected() {
        assert!(matches!(
            PlayerData::from_bytes(&[0u8; 32]),
            Err(PlayerDataError::InvalidSize(32))
        ));
        assert!(matches!(
            PlayerData::from_bytes(&[]),
            Err(PlayerDataError::InvalidSize(0))
        ));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut bytes = PlayerData::default().to_bytes();
        bytes[0..4].copy_from_slice(&9u32.to_le_bytes());
        assert!(matches!(
            PlayerData::from_bytes(&bytes),
            Err(PlayerDataError::UnsupportedVersion(9))
        ));
    }
}
