//! Adaptive chunk codec: tries several encodings and keeps the smallest.
//!
//! ## Formats
//!
//! Every encoding starts with a one-byte [`FormatTag`]:
//!
//! | Tag | Layout |
//! |-----|--------|
//! | `0xFF` | `[0xFF, id]`, every cell holds `id` |
//! | `0x01`/`0x02`/`0x03` | `[tag][rle_len: u32 LE][zlib(rle)]`, RLE in linear / Y-major / Morton order |
//! | `0x04` | `[0x04][pal_len: u8][palette][packed_len: u32 LE][zlib(packed)]` |
//!
//! Any other leading byte is read as the legacy format: the whole buffer is a
//! zlib stream of the 4096-byte linear grid.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use strata_voxel::{BlockId, CHUNK_VOLUME};

use crate::palette::{
    MAX_PALETTE_LEN, bits_per_entry, build_palette, pack_indices, packed_len, unpack_indices,
};
use crate::rle::{MAX_RLE_LEN, rle_encode, rle_expand, rle_to_bytes};
use crate::traversal::TraversalOrder;

/// Leading byte identifying how a section was encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FormatTag {
    RleLinear = 0x01,
    RleYMajor = 0x02,
    RleMorton = 0x03,
    Palette = 0x04,
    Uniform = 0xFF,
}

impl FormatTag {
    /// Parses a tag byte. Unknown bytes mean the legacy raw format.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::RleLinear),
            0x02 => Some(Self::RleYMajor),
            0x03 => Some(Self::RleMorton),
            0x04 => Some(Self::Palette),
            0xFF => Some(Self::Uniform),
            _ => None,
        }
    }

    fn for_order(order: TraversalOrder) -> Self {
        match order {
            TraversalOrder::Linear => Self::RleLinear,
            TraversalOrder::YMajor => Self::RleYMajor,
            TraversalOrder::Morton => Self::RleMorton,
        }
    }
}

/// Errors that can occur while encoding or decoding a section.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The buffer ends before a header field.
    #[error("compressed data truncated: expected at least {expected} bytes, got {actual}")]
    Truncated {
        /// Minimum byte count for the frame.
        expected: usize,
        /// Bytes actually present.
        actual: usize,
    },
    /// zlib compression failed.
    #[error("deflate failed: {0}")]
    Deflate(#[source] std::io::Error),
    /// The zlib stream is corrupt.
    #[error("inflate failed: {0}")]
    Inflate(#[source] std::io::Error),
    /// The inflated payload is not the declared size.
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Declared payload size.
        expected: usize,
        /// Size actually produced.
        actual: usize,
    },
    /// The declared RLE stream is longer than any valid chunk can produce.
    #[error("RLE stream length {0} exceeds the 8192-byte maximum")]
    RleTooLong(usize),
    /// Palette length is zero or above the limit.
    #[error("invalid palette length: {0}")]
    PaletteLength(usize),
    /// A packed index points past the end of the palette.
    #[error("palette index {index} out of range for palette of {len}")]
    PaletteIndex {
        /// The offending index.
        index: u8,
        /// Palette length.
        len: usize,
    },
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encodes a chunk's blocks, returning the smallest candidate.
///
/// A uniform chunk always yields the two-byte `[0xFF, id]` form. Otherwise the
/// three RLE orders and (when at most 16 ids appear) the palette form are
/// built, and the shortest wins; on a tie the earlier candidate is kept.
pub fn compress(blocks: &[BlockId; CHUNK_VOLUME]) -> Result<Vec<u8>, CodecError> {
    let first = blocks[0];
    if blocks.iter().all(|&b| b == first) {
        return Ok(vec![FormatTag::Uniform as u8, first.0]);
    }

    let mut best = encode_rle(blocks, TraversalOrder::Linear)?;
    let mut offer = |candidate: Vec<u8>| {
        if candidate.len() < best.len() {
            best = candidate;
        }
    };
    offer(encode_rle(blocks, TraversalOrder::YMajor)?);
    offer(encode_rle(blocks, TraversalOrder::Morton)?);
    if let Some(palette) = build_palette(blocks) {
        offer(encode_palette(blocks, &palette)?);
    }
    Ok(best)
}

fn encode_rle(
    blocks: &[BlockId; CHUNK_VOLUME],
    order: TraversalOrder,
) -> Result<Vec<u8>, CodecError> {
    let rle = rle_to_bytes(&rle_encode(blocks, order));
    let deflated = deflate(&rle)?;

    let mut out = Vec::with_capacity(5 + deflated.len());
    out.push(FormatTag::for_order(order) as u8);
    out.extend_from_slice(&(rle.len() as u32).to_le_bytes());
    out.extend_from_slice(&deflated);
    Ok(out)
}

fn encode_palette(
    blocks: &[BlockId; CHUNK_VOLUME],
    palette: &[BlockId],
) -> Result<Vec<u8>, CodecError> {
    let packed = pack_indices(blocks, palette);
    let deflated = deflate(&packed)?;

    let mut out = Vec::with_capacity(2 + palette.len() + 4 + deflated.len());
    out.push(FormatTag::Palette as u8);
    out.push(palette.len() as u8);
    out.extend(palette.iter().map(|id| id.0));
    out.extend_from_slice(&(packed.len() as u32).to_le_bytes());
    out.extend_from_slice(&deflated);
    Ok(out)
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::best());
    encoder.write_all(data).map_err(CodecError::Deflate)?;
    encoder.finish().map_err(CodecError::Deflate)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Returns the format an encoded section uses, `None` for the legacy form.
pub fn format_of(data: &[u8]) -> Option<FormatTag> {
    data.first().copied().and_then(FormatTag::from_byte)
}

/// Decodes a section produced by [`compress`] (or the legacy raw form).
///
/// # Errors
///
/// Returns a [`CodecError`] for truncated, corrupt or inconsistent input. The
/// caller should treat the chunk as missing and regenerate it.
pub fn decompress(data: &[u8]) -> Result<Box<[BlockId; CHUNK_VOLUME]>, CodecError> {
    if data.len() < 2 {
        return Err(CodecError::Truncated {
            expected: 2,
            actual: data.len(),
        });
    }

    match FormatTag::from_byte(data[0]) {
        Some(FormatTag::Uniform) => Ok(Box::new([BlockId(data[1]); CHUNK_VOLUME])),
        Some(FormatTag::RleLinear) => decode_rle(data, TraversalOrder::Linear),
        Some(FormatTag::RleYMajor) => decode_rle(data, TraversalOrder::YMajor),
        Some(FormatTag::RleMorton) => decode_rle(data, TraversalOrder::Morton),
        Some(FormatTag::Palette) => decode_palette(data),
        None => decode_legacy(data),
    }
}

fn decode_rle(
    data: &[u8],
    order: TraversalOrder,
) -> Result<Box<[BlockId; CHUNK_VOLUME]>, CodecError> {
    if data.len() < 5 {
        return Err(CodecError::Truncated {
            expected: 5,
            actual: data.len(),
        });
    }
    let rle_len = read_u32(&data[1..5]) as usize;
    if rle_len > MAX_RLE_LEN {
        return Err(CodecError::RleTooLong(rle_len));
    }
    let rle = inflate(&data[5..], rle_len)?;
    Ok(rle_expand(&rle, order))
}

fn decode_palette(data: &[u8]) -> Result<Box<[BlockId; CHUNK_VOLUME]>, CodecError> {
    let pal_len = data[1] as usize;
    if pal_len == 0 || pal_len > MAX_PALETTE_LEN {
        return Err(CodecError::PaletteLength(pal_len));
    }
    let header_len = 2 + pal_len + 4;
    if data.len() < header_len {
        return Err(CodecError::Truncated {
            expected: header_len,
            actual: data.len(),
        });
    }

    let palette: Vec<BlockId> = data[2..2 + pal_len].iter().map(|&b| BlockId(b)).collect();
    let packed_size = read_u32(&data[2 + pal_len..header_len]) as usize;
    let expected = packed_len(bits_per_entry(pal_len));
    if packed_size != expected {
        return Err(CodecError::SizeMismatch {
            expected,
            actual: packed_size,
        });
    }

    let packed = inflate(&data[header_len..], packed_size)?;
    unpack_indices(&packed, &palette)
}

fn decode_legacy(data: &[u8]) -> Result<Box<[BlockId; CHUNK_VOLUME]>, CodecError> {
    let raw = inflate(data, CHUNK_VOLUME)?;
    let mut blocks = Box::new([BlockId::AIR; CHUNK_VOLUME]);
    for (dst, &src) in blocks.iter_mut().zip(&raw) {
        *dst = BlockId(src);
    }
    Ok(blocks)
}

/// Inflates a zlib stream that must produce exactly `expected` bytes.
fn inflate(data: &[u8], expected: usize) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(expected);
    ZlibDecoder::new(data)
        .take(expected as u64 + 1)
        .read_to_end(&mut out)
        .map_err(CodecError::Inflate)?;
    if out.len() != expected {
        return Err(CodecError::SizeMismatch {
            expected,
            actual: out.len(),
        });
    }
    Ok(out)
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buf)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
