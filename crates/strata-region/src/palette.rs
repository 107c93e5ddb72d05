//! Palette + bit-packing strategy for chunks with few distinct block types.
//!
//! The palette is the sorted list of distinct ids (at most 16). Each cell is
//! stored as its palette index using 1, 2 or 4 bits, walked in Y-major order
//! and packed least-significant bit first. Since every width divides 8, an
//! entry never straddles a byte.

use strata_voxel::{BlockId, CHUNK_VOLUME};

use crate::codec::CodecError;
use crate::traversal::TraversalOrder;

/// Maximum number of distinct ids the palette strategy accepts.
pub const MAX_PALETTE_LEN: usize = 16;

/// Collects the sorted distinct ids, or `None` if there are more than 16.
pub fn build_palette(blocks: &[BlockId; CHUNK_VOLUME]) -> Option<Vec<BlockId>> {
    let mut seen = [false; 256];
    let mut count = 0;
    for &b in blocks.iter() {
        if !seen[b.0 as usize] {
            seen[b.0 as usize] = true;
            count += 1;
            if count > MAX_PALETTE_LEN {
                return None;
            }
        }
    }
    // Walking the table in id order yields a sorted palette.
    Some(
        (0..=255u8)
            .filter(|&id| seen[id as usize])
            .map(BlockId)
            .collect(),
    )
}

/// Bits per packed entry for a palette of `len` entries.
pub fn bits_per_entry(len: usize) -> u8 {
    match len {
        0..=2 => 1,
        3..=4 => 2,
        _ => 4,
    }
}

/// Size in bytes of the packed index stream.
pub fn packed_len(bits: u8) -> usize {
    (CHUNK_VOLUME * bits as usize).div_ceil(8)
}

/// Packs each cell's palette index in Y-major order.
pub fn pack_indices(blocks: &[BlockId; CHUNK_VOLUME], palette: &[BlockId]) -> Vec<u8> {
    let mut lookup = [0u8; 256];
    for (i, id) in palette.iter().enumerate() {
        lookup[id.0 as usize] = i as u8;
    }

    let bits = bits_per_entry(palette.len()) as usize;
    let mut packed = vec![0u8; packed_len(bits as u8)];
    for (i, &cell) in TraversalOrder::YMajor.indices().iter().enumerate() {
        let value = lookup[blocks[cell as usize].0 as usize];
        let bit = i * bits;
        packed[bit / 8] |= value << (bit % 8);
    }
    packed
}

/// Unpacks a Y-major index stream against `palette`.
///
/// # Errors
///
/// Fails if the stream has the wrong length for the palette's bit width or if
/// any index points past the end of the palette.
pub fn unpack_indices(
    packed: &[u8],
    palette: &[BlockId],
) -> Result<Box<[BlockId; CHUNK_VOLUME]>, CodecError> {
    let bits = bits_per_entry(palette.len());
    let expected = packed_len(bits);
    if packed.len() != expected {
        return Err(CodecError::SizeMismatch {
            expected,
            actual: packed.len(),
        });
    }

    let bits = bits as usize;
    let mask = (1u8 << bits) - 1;
    let mut blocks = Box::new([BlockId::AIR; CHUNK_VOLUME]);
    for (i, &cell) in TraversalOrder::YMajor.indices().iter().enumerate() {
        let bit = i * bits;
        let index = (packed[bit / 8] >> (bit % 8)) & mask;
        let id = palette
            .get(index as usize)
            .ok_or(CodecError::PaletteIndex {
                index,
                len: palette.len(),
            })?;
        blocks[cell as usize] = *id;
    }
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn striped(kinds: u8) -> [BlockId; CHUNK_VOLUME] {
        let mut blocks = [BlockId::AIR; CHUNK_VOLUME];
        for (i, b) in blocks.iter_mut().enumerate() {
            *b = BlockId(10 + (i % kinds as usize) as u8);
        }
        blocks
    }

    #[test]
    fn test_palette_is_sorted_and_distinct() {
        let mut blocks = [BlockId(9); CHUNK_VOLUME];
        blocks[5] = BlockId(2);
        blocks[100] = BlockId(200);
        blocks[101] = BlockId(2);
        let palette = build_palette(&blocks).unwrap();
        assert_eq!(palette, vec![BlockId(2), BlockId(9), BlockId(200)]);
    }

    #[test]
    fn test_palette_limit() {
        assert_eq!(build_palette(&striped(16)).unwrap().len(), 16);
        assert!(build_palette(&striped(17)).is_none());
    }

    #[test]
    fn test_bits_per_entry_thresholds() {
        assert_eq!(bits_per_entry(1), 1);
        assert_eq!(bits_per_entry(2), 1);
        assert_eq!(bits_per_entry(3), 2);
        assert_eq!(bits_per_entry(4), 2);
        assert_eq!(bits_per_entry(5), 4);
        assert_eq!(bits_per_entry(16), 4);
        assert_eq!(packed_len(1), 512);
        assert_eq!(packed_len(4), 2048);
    }

    #[test]
    fn test_pack_unpack_roundtrip() {
        for kinds in [2u8, 3, 4, 7, 16] {
            let blocks = striped(kinds);
            let palette = build_palette(&blocks).unwrap();
            let packed = pack_indices(&blocks, &palette);
            assert_eq!(packed.len(), packed_len(bits_per_entry(palette.len())));
            let back = unpack_indices(&packed, &palette).unwrap();
            assert_eq!(*back, blocks, "kinds = {kinds}");
        }
    }

    #[test]
    fn test_index_past_palette_rejected() {
        // Three entries use 2 bits, so index 3 is representable but invalid.
        let palette = [BlockId(1), BlockId(2), BlockId(3)];
        let packed = vec![0xFF; packed_len(2)];
        let result = unpack_indices(&packed, &palette);
        assert!(matches!(
            result,
            Err(CodecError::PaletteIndex { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_wrong_length_rejected() {
        let palette = [BlockId(1), BlockId(2)];
        let result = unpack_indices(&[0u8; 10], &palette);
        assert!(matches!(result, Err(CodecError::SizeMismatch { .. })));
    }
}
