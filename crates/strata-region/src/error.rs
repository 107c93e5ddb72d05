//! Region storage error types.

use crate::codec::CodecError;

/// Errors that can occur when reading or writing region files.
///
/// Callers in the job pipeline never propagate these further: a failed load
/// means the chunk is regenerated and a failed save is logged.
#[derive(Debug, thiserror::Error)]
pub enum RegionError {
    /// Opening, seeking, reading or writing a region file failed.
    #[error("region i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored section could not be encoded or decoded.
    #[error("section codec error: {0}")]
    Codec(#[from] CodecError),

    /// A column's payload does not parse.
    #[error("corrupt column: {0}")]
    CorruptColumn(String),

    /// Sections are addressed by an `i8` chunk y.
    #[error("chunk y {0} is outside the storable section range")]
    SectionOutOfRange(i32),

    /// The column does not fit the on-disk field widths.
    #[error("column too large: {0}")]
    ColumnTooLarge(String),
}
