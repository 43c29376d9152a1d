//! Compound File Binary (OLE2) reader.
//!
//! Legacy Word, WPS, ET and DPS documents are stored as a small file system
//! inside a single file: fixed-size sectors chained through a FAT, with small
//! streams packed into a mini stream addressed by a second table. The whole
//! file is held in memory and every chain walk is bounded, so cyclic or
//! out-of-range chains truncate a stream instead of looping.

use crate::codec::{read_u16_le, read_u32_le, read_u64_le, utf16le_to_string};
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Compound file signature.
pub const SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const HEADER_SIZE: usize = 512;
const DIRECTORY_ENTRY_SIZE: usize = 128;
const HEADER_DIFAT_ENTRIES: usize = 109;

/// Unallocated sector marker.
pub const FREE_SECTOR: u32 = 0xFFFF_FFFF;
/// Chain terminator.
pub const END_OF_CHAIN: u32 = 0xFFFF_FFFE;

/// Type byte of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Storage,
    Stream,
    Root,
    Other(u8),
}

impl From<u8> for EntryKind {
    fn from(value: u8) -> Self {
        match value {
            1 => EntryKind::Storage,
            2 => EntryKind::Stream,
            5 => EntryKind::Root,
            other => EntryKind::Other(other),
        }
    }
}

/// One 128-byte directory record.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub name: String,
    pub kind: EntryKind,
    pub start_sector: u32,
    pub size: u64,
}

/// Whether the bytes start with the compound file signature.
pub fn is_compound_file(data: &[u8]) -> bool {
    data.len() >= HEADER_SIZE && data.starts_with(&SIGNATURE)
}

/// A parsed compound file.
#[derive(Debug)]
pub struct CompoundFile {
    data: Vec<u8>,
    sector_shift: u16,
    mini_sector_shift: u16,
    mini_stream_cutoff: u32,
    major_version: u16,
    fat: Vec<u32>,
    mini_fat: Vec<u32>,
    entries: Vec<DirectoryEntry>,
    mini_stream: Vec<u8>,
}

impl CompoundFile {
    /// Read and parse a compound file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read(path.as_ref())?;
        Self::from_bytes(data)
    }

    /// Parse a compound file held in memory.
    ///
    /// Fails when the header is short or carries the wrong signature or
    /// byte order, when a DIFAT, FAT or MiniFAT sector lies outside the
    /// buffer, or when the directory holds no entries or no root entry.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::Ole(format!("file too small: {} bytes", data.len())));
        }
        if !data.starts_with(&SIGNATURE) {
            return Err(Error::Ole("signature mismatch".to_string()));
        }

        let header = |offset: usize| read_u32_le(&data, offset).unwrap_or(0);
        let header16 = |offset: usize| read_u16_le(&data, offset).unwrap_or(0);

        let major_version = header16(0x1A);
        if header16(0x1C) != 0xFFFE {
            return Err(Error::Ole("byte order mark mismatch".to_string()));
        }
        let sector_shift = header16(0x1E);
        let mini_sector_shift = header16(0x20);
        if !(7..=20).contains(&sector_shift) || mini_sector_shift > sector_shift {
            return Err(Error::Ole(format!(
                "unsupported sector shifts {sector_shift}/{mini_sector_shift}"
            )));
        }
        let first_dir_sector = header(0x30);
        let mini_stream_cutoff = header(0x38);
        let first_mini_fat_sector = header(0x3C);
        let num_mini_fat_sectors = header(0x40);
        let first_difat_sector = header(0x44);
        let num_difat_sectors = header(0x48);

        let mut file = Self {
            data,
            sector_shift,
            mini_sector_shift,
            mini_stream_cutoff,
            major_version,
            fat: Vec::new(),
            mini_fat: Vec::new(),
            entries: Vec::new(),
            mini_stream: Vec::new(),
        };

        let difat = file.read_difat(first_difat_sector, num_difat_sectors)?;
        file.fat = file.read_fat(&difat)?;
        file.mini_fat = file.read_mini_fat(first_mini_fat_sector, num_mini_fat_sectors)?;
        file.entries = file.read_directory(first_dir_sector)?;

        let root = file
            .entries
            .iter()
            .find(|entry| entry.kind == EntryKind::Root)
            .cloned()
            .ok_or_else(|| Error::Ole("no root entry".to_string()))?;
        file.mini_stream = file.read_chain(root.start_sector, Some(root.size));

        tracing::debug!(
            entries = file.entries.len(),
            fat = file.fat.len(),
            mini_fat = file.mini_fat.len(),
            "parsed compound file"
        );
        Ok(file)
    }

    /// Directory entries in on-disk order.
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    /// Contents of the stream with this name, compared ASCII
    /// case-insensitively. Storages never match.
    pub fn stream_by_name(&self, name: &str) -> Option<Vec<u8>> {
        let entry = self.entries.iter().find(|entry| {
            entry.kind == EntryKind::Stream && entry.name.eq_ignore_ascii_case(name)
        })?;
        let use_mini =
            entry.size < u64::from(self.mini_stream_cutoff) && !self.mini_stream.is_empty();
        if use_mini {
            Some(self.read_mini_chain(entry.start_sector, entry.size))
        } else {
            Some(self.read_chain(entry.start_sector, Some(entry.size)))
        }
    }

    fn sector_size(&self) -> usize {
        1usize << self.sector_shift
    }

    fn mini_sector_size(&self) -> usize {
        1usize << self.mini_sector_shift
    }

    /// Sector `n` starts right after the header sector.
    fn sector(&self, sector: u32) -> Option<&[u8]> {
        if sector >= END_OF_CHAIN {
            return None;
        }
        let size = self.sector_size();
        let start = (sector as usize).checked_add(1)?.checked_mul(size)?;
        self.data.get(start..start.checked_add(size)?)
    }

    fn sector_words(&self, sector: u32) -> Option<Vec<u32>> {
        let block = self.sector(sector)?;
        Some(
            block
                .chunks_exact(4)
                .map(|word| u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
                .collect(),
        )
    }

    fn next_sector(&self, current: u32) -> u32 {
        self.fat.get(current as usize).copied().unwrap_or(END_OF_CHAIN)
    }

    fn max_sectors(&self) -> usize {
        self.data.len() / self.sector_size() + 1
    }

    fn read_difat(&self, first_sector: u32, count: u32) -> Result<Vec<u32>> {
        let mut difat: Vec<u32> = (0..HEADER_DIFAT_ENTRIES)
            .filter_map(|i| read_u32_le(&self.data, 0x4C + i * 4))
            .filter(|&entry| entry != FREE_SECTOR)
            .collect();

        let budget = (count as usize).min(self.max_sectors());
        let mut sector = first_sector;
        for _ in 0..budget {
            if sector == END_OF_CHAIN {
                break;
            }
            let mut words = self
                .sector_words(sector)
                .ok_or_else(|| Error::Ole(format!("DIFAT sector {sector} out of range")))?;
            let next = words.pop().unwrap_or(END_OF_CHAIN);
            difat.extend(words.into_iter().filter(|&entry| entry != FREE_SECTOR));
            sector = next;
        }
        Ok(difat)
    }

    fn read_fat(&self, difat: &[u32]) -> Result<Vec<u32>> {
        if difat.is_empty() {
            return Err(Error::Ole("no FAT sectors".to_string()));
        }
        let mut fat = Vec::with_capacity(difat.len() * self.sector_size() / 4);
        for &sector in difat {
            let words = self
                .sector_words(sector)
                .ok_or_else(|| Error::Ole(format!("FAT sector {sector} out of range")))?;
            fat.extend(words);
        }
        Ok(fat)
    }

    fn read_mini_fat(&self, first_sector: u32, count: u32) -> Result<Vec<u32>> {
        let mut mini_fat = Vec::new();
        if first_sector == END_OF_CHAIN || count == 0 {
            return Ok(mini_fat);
        }
        let budget = (count as usize).min(self.fat.len() + 1);
        let mut sector = first_sector;
        for _ in 0..budget {
            if sector == END_OF_CHAIN {
                break;
            }
            let words = self
                .sector_words(sector)
                .ok_or_else(|| Error::Ole(format!("MiniFAT sector {sector} out of range")))?;
            mini_fat.extend(words);
            sector = self.next_sector(sector);
        }
        Ok(mini_fat)
    }

    fn read_directory(&self, first_sector: u32) -> Result<Vec<DirectoryEntry>> {
        let stream = self.read_chain(first_sector, None);
        let entries: Vec<DirectoryEntry> = stream
            .chunks_exact(DIRECTORY_ENTRY_SIZE)
            .filter_map(|raw| self.parse_entry(raw))
            .collect();
        if entries.is_empty() {
            return Err(Error::Ole("empty directory".to_string()));
        }
        Ok(entries)
    }

    fn parse_entry(&self, raw: &[u8]) -> Option<DirectoryEntry> {
        let name_len = read_u16_le(raw, 64)? as usize;
        if name_len < 2 {
            return None;
        }
        let chars = (name_len / 2 - 1).min(32);
        let name = utf16le_to_string(raw.get(..chars * 2)?);
        let size = if self.major_version >= 4 {
            read_u64_le(raw, 120)?
        } else {
            u64::from(read_u32_le(raw, 120)?)
        };
        Some(DirectoryEntry {
            name,
            kind: EntryKind::from(raw[66]),
            start_sector: read_u32_le(raw, 116)?,
            size,
        })
    }

    /// Follow a FAT chain. With `None` the whole chain is read; with a size
    /// the read stops once that many bytes are collected.
    fn read_chain(&self, start: u32, size: Option<u64>) -> Vec<u8> {
        let mut buffer = Vec::new();
        if size == Some(0) {
            return buffer;
        }
        let limit = size.map(|s| usize::try_from(s).unwrap_or(usize::MAX));
        let mut sector = start;
        for _ in 0..=self.fat.len() {
            let Some(block) = self.sector(sector) else {
                break;
            };
            match limit {
                Some(limit) => {
                    let take = (limit - buffer.len()).min(block.len());
                    buffer.extend_from_slice(&block[..take]);
                    if buffer.len() >= limit {
                        break;
                    }
                }
                None => buffer.extend_from_slice(block),
            }
            sector = self.next_sector(sector);
        }
        buffer
    }

    /// Follow a MiniFAT chain inside the mini stream.
    fn read_mini_chain(&self, start: u32, size: u64) -> Vec<u8> {
        let mut buffer = Vec::new();
        let limit = usize::try_from(size).unwrap_or(usize::MAX);
        let mini_size = self.mini_sector_size();
        let mut sector = start;
        for _ in 0..=self.mini_fat.len() {
            if sector == END_OF_CHAIN || buffer.len() >= limit {
                break;
            }
            let Some(offset) = (sector as usize).checked_mul(mini_size) else {
                break;
            };
            let Some(block) = self.mini_stream.get(offset..offset + mini_size) else {
                break;
            };
            let take = (limit - buffer.len()).min(mini_size);
            buffer.extend_from_slice(&block[..take]);
            match self.mini_fat.get(sector as usize) {
                Some(&next) => sector = next,
                None => break,
            }
        }
        buffer
    }
}
