//! On-disk world storage: the adaptive chunk codec, region files holding
//! 32×32 chunk columns, the shared region cache and the player data record.

pub mod codec;
mod error;
pub mod palette;
pub mod player;
pub mod region_file;
pub mod region_manager;
pub mod rle;
pub mod traversal;

pub use codec::{CodecError, FormatTag, compress, decompress};
pub use error::RegionError;
pub use player::{PlayerData, PlayerDataError};
pub use region_file::{Column, HeaderEntry, RegionFile, Section};
pub use region_manager::{RegionCoord, RegionManager};
pub use traversal::TraversalOrder;
