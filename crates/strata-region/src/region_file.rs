//! A single region file holding up to 32×32 chunk columns.
//!
//! ## Binary Layout
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 8192 | Header: 1024 × (`offset: u32 LE`, `size: u32 LE`), slot `(z << 5) \| x` |
//! | 8192.. | - | Column payloads, each starting on a 4096-byte sector boundary |
//!
//! A column payload is `section_count: u8` followed by that many
//! `(y: i8, size: u32 LE, bytes)` sections. A header entry with offset 0
//! marks an absent column.
//!
//! Rewriting a column reuses its slot when the recorded size still fits and
//! otherwise appends at the end of the file. Abandoned slots are never
//! reclaimed, so a file that sees many growing rewrites only grows.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::RegionError;

/// log2 of the region width in chunks.
pub const REGION_SHIFT: i32 = 5;

/// Region width in chunk columns.
pub const REGION_SIZE: usize = 1 << REGION_SHIFT;

/// Mask extracting a chunk's local column coordinate.
pub const REGION_MASK: i32 = REGION_SIZE as i32 - 1;

/// Column slots per region.
pub const COLUMN_COUNT: usize = REGION_SIZE * REGION_SIZE;

/// Header size in bytes.
pub const HEADER_SIZE: u64 = COLUMN_COUNT as u64 * 8;

/// Column payloads are aligned to this many bytes.
pub const SECTOR_SIZE: u64 = 4096;

/// One header slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeaderEntry {
    /// Byte offset of the column payload, 0 when absent.
    pub offset: u32,
    /// Payload size in bytes.
    pub size: u32,
}

impl HeaderEntry {
    pub fn is_present(self) -> bool {
        self.offset != 0 && self.size != 0
    }
}

/// One vertical chunk's encoded blocks within a column.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Section {
    /// Chunk y coordinate.
    pub y: i8,
    /// Output of [`crate::codec::compress`].
    pub data: Vec<u8>,
}

/// All stored sections at one (x, z), kept sorted by y.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Column {
    pub sections: Vec<Section>,
}

impl Column {
    /// Returns the section at chunk height `y`.
    pub fn section(&self, y: i8) -> Option<&Section> {
        self.sections.iter().find(|s| s.y == y)
    }

    /// Inserts or replaces the section at `y`, keeping sections sorted.
    ///
    /// Returns `false` when the section already held identical bytes.
    pub fn upsert(&mut self, y: i8, data: Vec<u8>) -> bool {
        match self.sections.iter_mut().find(|s| s.y == y) {
            Some(existing) if existing.data == data => return false,
            Some(existing) => existing.data = data,
            None => self.sections.push(Section { y, data }),
        }
        self.sections.sort_by_key(|s| s.y);
        true
    }

    /// Serialised size in bytes.
    pub fn encoded_len(&self) -> usize {
        1 + self
            .sections
            .iter()
            .map(|s| 1 + 4 + s.data.len())
            .sum::<usize>()
    }

    /// Serialises the column payload.
    pub fn encode(&self) -> Result<Vec<u8>, RegionError> {
        let count = u8::try_from(self.sections.len()).map_err(|_| {
            RegionError::ColumnTooLarge(format!("{} sections", self.sections.len()))
        })?;

        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.push(count);
        for section in &self.sections {
            let size = u32::try_from(section.data.len()).map_err(|_| {
                RegionError::ColumnTooLarge(format!("section of {} bytes", section.data.len()))
            })?;
            buf.push(section.y as u8);
            buf.extend_from_slice(&size.to_le_bytes());
            buf.extend_from_slice(&section.data);
        }
        Ok(buf)
    }

    /// Parses a column payload. Trailing bytes after the last section are ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self, RegionError> {
        let (&count, mut rest) = bytes
            .split_first()
            .ok_or_else(|| RegionError::CorruptColumn("empty payload".to_string()))?;

        let mut sections = Vec::with_capacity(count as usize);
        for i in 0..count {
            if rest.len() < 5 {
                return Err(RegionError::CorruptColumn(format!(
                    "section {i} header truncated"
                )));
            }
            let y = rest[0] as i8;
            let size = u32::from_le_bytes([rest[1], rest[2], rest[3], rest[4]]) as usize;
            rest = &rest[5..];
            if rest.len() < size {
                return Err(RegionError::CorruptColumn(format!(
                    "section {i} declares {size} bytes, {} remain",
                    rest.len()
                )));
            }
            sections.push(Section {
                y,
                data: rest[..size].to_vec(),
            });
            rest = &rest[size..];
        }
        Ok(Self { sections })
    }
}

/// An open region file with its header cached in memory.
///
/// Not internally synchronised; [`crate::RegionManager`] wraps each file in
/// its own mutex.
#[derive(Debug)]
pub struct RegionFile {
    path: PathBuf,
    file: File,
    header: Vec<HeaderEntry>,
}

impl RegionFile {
    /// Opens (or creates) the region file at `path` and reads its header.
    ///
    /// A new or truncated file gets a zeroed header written immediately.
    pub fn open(path: &Path) -> Result<Self, RegionError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let len = file.metadata()?.len();
        let mut header = vec![HeaderEntry::default(); COLUMN_COUNT];

        if len >= HEADER_SIZE {
            let mut raw = vec![0u8; HEADER_SIZE as usize];
            file.seek(SeekFrom::Start(0))?;
            file.read_exact(&mut raw)?;
            for (entry, bytes) in header.iter_mut().zip(raw.chunks_exact(8)) {
                entry.offset = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                entry.size = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
            }
        } else {
            if len > 0 {
                tracing::warn!(path = %path.display(), len, "region header truncated, resetting");
            }
            file.seek(SeekFrom::Start(0))?;
            file.write_all(&vec![0u8; HEADER_SIZE as usize])?;
            file.flush()?;
        }

        tracing::debug!(path = %path.display(), "opened region file");
        Ok(Self {
            path: path.to_path_buf(),
            file,
            header,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn slot(local_x: usize, local_z: usize) -> usize {
        ((local_z & REGION_MASK as usize) << REGION_SHIFT) | (local_x & REGION_MASK as usize)
    }

    /// Returns the header entry for a column slot.
    pub fn entry(&self, local_x: usize, local_z: usize) -> HeaderEntry {
        self.header[Self::slot(local_x, local_z)]
    }

    /// Reads the column at a slot, `None` when the slot is empty.
    pub fn load_column(
        &mut self,
        local_x: usize,
        local_z: usize,
    ) -> Result<Option<Column>, RegionError> {
        let entry = self.entry(local_x, local_z);
        if !entry.is_present() {
            return Ok(None);
        }

        let end = entry.offset as u64 + entry.size as u64;
        let len = self.file.metadata()?.len();
        if end > len {
            return Err(RegionError::CorruptColumn(format!(
                "entry {}+{} runs past end of file ({len} bytes)",
                entry.offset, entry.size
            )));
        }

        let mut payload = vec![0u8; entry.size as usize];
        self.file.seek(SeekFrom::Start(entry.offset as u64))?;
        self.file.read_exact(&mut payload)?;
        Column::decode(&payload).map(Some)
    }

    /// Writes a column and records it in the header.
    ///
    /// The header entry is written and flushed before returning.
    pub fn save_column(
        &mut self,
        local_x: usize,
        local_z: usize,
        column: &Column,
    ) -> Result<(), RegionError> {
        let payload = column.encode()?;
        let total = u32::try_from(payload.len())
            .map_err(|_| RegionError::ColumnTooLarge(format!("{} bytes", payload.len())))?;

        let slot = Self::slot(local_x, local_z);
        let current = self.header[slot];
        let offset = if current.offset != 0 && current.size >= total {
            current.offset as u64
        } else {
            self.allocate()?
        };
        let offset32 = u32::try_from(offset)
            .map_err(|_| RegionError::ColumnTooLarge(format!("offset {offset}")))?;

        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(&payload)?;

        self.header[slot] = HeaderEntry {
            offset: offset32,
            size: total,
        };
        self.write_entry(slot)?;
        self.file.flush()?;

        tracing::trace!(
            path = %self.path.display(),
            local_x,
            local_z,
            offset,
            size = total,
            "saved column"
        );
        Ok(())
    }

    /// Rewrites the whole header and flushes the file.
    pub fn flush(&mut self) -> Result<(), RegionError> {
        let mut raw = Vec::with_capacity(HEADER_SIZE as usize);
        for entry in &self.header {
            raw.extend_from_slice(&entry.offset.to_le_bytes());
            raw.extend_from_slice(&entry.size.to_le_bytes());
        }
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&raw)?;
        self.file.flush()?;
        Ok(())
    }

    /// Current file length in bytes.
    pub fn file_len(&self) -> Result<u64, RegionError> {
        Ok(self.file.metadata()?.len())
    }

    /// Next free sector-aligned offset at the end of the file.
    fn allocate(&mut self) -> Result<u64, RegionError> {
        let end = self.file.seek(SeekFrom::End(0))?.max(HEADER_SIZE);
        Ok(end.div_ceil(SECTOR_SIZE) * SECTOR_SIZE)
    }

    fn write_entry(&mut self, slot: usize) -> Result<(), RegionError> {
        let entry = self.header[slot];
        let mut raw = [0u8; 8];
        raw[..4].copy_from_slice(&entry.offset.to_le_bytes());
        raw[4..].copy_from_slice(&entry.size.to_le_bytes());
        self.file.seek(SeekFrom::Start(slot as u64 * 8))?;
        self.file.write_all(&raw)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
