//! File header and the two block directories.
use crate::error::{FmdlError, Result};
use crate::fmdl_types::{HEADER_SIZE, MAGIC, Section0Block, Section1Block};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};

pub const ALIGNMENT: usize = 16;
pub const FMDL_VERSION: f32 = 2.03;

const SECTION0_ENTRY_SIZE: usize = 8;
const SECTION1_ENTRY_SIZE: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FileHeader {
    pub version: f32,
    pub header_size: u64,
    /// Bit n is set when section-0 block n is present.
    pub section0_mask: u64,
    pub section1_mask: u64,
    pub section0_count: u32,
    pub section1_count: u32,
    pub section0_offset: u32,
    pub section0_length: u32,
    pub section1_offset: u32,
    pub section1_length: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Section0Entry {
    pub id: u16,
    pub entry_count: u16,
    /// Relative to `section0_offset`.
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Section1Entry {
    pub id: u32,
    /// Relative to `section1_offset`.
    pub offset: u32,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Directory {
    pub header: FileHeader,
    pub section0: BTreeMap<u16, Section0Entry>,
    pub section1: BTreeMap<u32, Section1Entry>,
}

impl Directory {
    pub fn read(data: &[u8]) -> Result<Self> {
        let head = slice_at(data, 0, HEADER_SIZE, "file header")?;
        let mut cursor = Cursor::new(head);

        let mut magic = [0u8; 4];
        cursor.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(FmdlError::BadMagic { found: magic });
        }

        let version = cursor.read_f32::<LittleEndian>()?;
        let header_size = cursor.read_u64::<LittleEndian>()?;
        let section0_mask = cursor.read_u64::<LittleEndian>()?;
        let section1_mask = cursor.read_u64::<LittleEndian>()?;
        let section0_count = cursor.read_u32::<LittleEndian>()?;
        let section1_count = cursor.read_u32::<LittleEndian>()?;
        let section0_offset = cursor.read_u32::<LittleEndian>()?;
        let section0_length = cursor.read_u32::<LittleEndian>()?;
        let section1_offset = cursor.read_u32::<LittleEndian>()?;
        let section1_length = cursor.read_u32::<LittleEndian>()?;

        let header = FileHeader {
            version,
            header_size,
            section0_mask,
            section1_mask,
            section0_count,
            section1_count,
            section0_offset,
            section0_length,
            section1_offset,
            section1_length,
        };
        debug!(
            "header: version {} | section 0: {} blocks @ {:#x} (+{:#x}) | section 1: {} blocks @ {:#x} (+{:#x})",
            version,
            section0_count,
            section0_offset,
            section0_length,
            section1_count,
            section1_offset,
            section1_length
        );

        let entries_len = section0_count as usize * SECTION0_ENTRY_SIZE
            + section1_count as usize * SECTION1_ENTRY_SIZE;
        let entries = slice_at(data, HEADER_SIZE, entries_len, "block directory")?;
        let mut cursor = Cursor::new(entries);

        let mut section0 = BTreeMap::new();
        for _ in 0..section0_count {
            let entry = Section0Entry {
                id: cursor.read_u16::<LittleEndian>()?,
                entry_count: cursor.read_u16::<LittleEndian>()?,
                offset: cursor.read_u32::<LittleEndian>()?,
            };
            section0.insert(entry.id, entry);
        }

        let mut section1 = BTreeMap::new();
        for _ in 0..section1_count {
            let entry = Section1Entry {
                id: cursor.read_u32::<LittleEndian>()?,
                offset: cursor.read_u32::<LittleEndian>()?,
                size: cursor.read_u32::<LittleEndian>()?,
            };
            section1.insert(entry.id, entry);
        }

        let directory = Self {
            header,
            section0,
            section1,
        };
        directory.check_masks();
        Ok(directory)
    }

    /// Builds a directory whose header fields all follow from the entries.
    pub fn from_entries(
        version: f32,
        section0: Vec<Section0Entry>,
        section0_length: usize,
        section1: Vec<Section1Entry>,
        section1_length: usize,
    ) -> Result<Self> {
        let section0_offset = align16(
            HEADER_SIZE + section0.len() * SECTION0_ENTRY_SIZE + section1.len() * SECTION1_ENTRY_SIZE,
        );
        let section1_offset = align16(section0_offset + section0_length);

        let header = FileHeader {
            version,
            header_size: HEADER_SIZE as u64,
            section0_mask: block_mask(section0.iter().map(|e| e.id as u32)),
            section1_mask: block_mask(section1.iter().map(|e| e.id)),
            section0_count: section0.len() as u32,
            section1_count: section1.len() as u32,
            section0_offset: to_u32(section0_offset, "section 0 offset")?,
            section0_length: to_u32(section0_length, "section 0 length")?,
            section1_offset: to_u32(section1_offset, "section 1 offset")?,
            section1_length: to_u32(section1_length, "section 1 length")?,
        };

        Ok(Self {
            header,
            section0: section0.into_iter().map(|e| (e.id, e)).collect(),
            section1: section1.into_iter().map(|e| (e.id, e)).collect(),
        })
    }

    /// Writes the header and both directories, without trailing padding.
    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        let h = &self.header;
        w.write_all(&MAGIC)?;
        w.write_f32::<LittleEndian>(h.version)?;
        w.write_u64::<LittleEndian>(h.header_size)?;
        w.write_u64::<LittleEndian>(h.section0_mask)?;
        w.write_u64::<LittleEndian>(h.section1_mask)?;
        w.write_u32::<LittleEndian>(h.section0_count)?;
        w.write_u32::<LittleEndian>(h.section1_count)?;
        w.write_u32::<LittleEndian>(h.section0_offset)?;
        w.write_u32::<LittleEndian>(h.section0_length)?;
        w.write_u32::<LittleEndian>(h.section1_offset)?;
        w.write_u32::<LittleEndian>(h.section1_length)?;
        w.write_u64::<LittleEndian>(0)?;

        for entry in self.section0.values() {
            w.write_u16::<LittleEndian>(entry.id)?;
            w.write_u16::<LittleEndian>(entry.entry_count)?;
            w.write_u32::<LittleEndian>(entry.offset)?;
        }
        for entry in self.section1.values() {
            w.write_u32::<LittleEndian>(entry.id)?;
            w.write_u32::<LittleEndian>(entry.offset)?;
            w.write_u32::<LittleEndian>(entry.size)?;
        }
        Ok(())
    }

    pub fn section0_entry(&self, block: Section0Block) -> Option<&Section0Entry> {
        self.section0.get(&block.id())
    }

    pub fn require_section0(&self, block: Section0Block) -> Result<&Section0Entry> {
        self.section0_entry(block).ok_or(FmdlError::MissingBlock {
            section: 0,
            id: block.id() as u32,
            name: block.name(),
        })
    }

    pub fn section1_entry(&self, block: Section1Block) -> Option<&Section1Entry> {
        self.section1.get(&block.id())
    }

    pub fn require_section1(&self, block: Section1Block) -> Result<&Section1Entry> {
        self.section1_entry(block).ok_or(FmdlError::MissingBlock {
            section: 1,
            id: block.id(),
            name: block.name(),
        })
    }

    pub fn has_skeleton(&self) -> bool {
        self.section0_entry(Section0Block::Bones).is_some()
    }

    /// Absolute file offset of a section-0 block.
    pub fn section0_start(&self, entry: &Section0Entry) -> usize {
        self.header.section0_offset as usize + entry.offset as usize
    }

    /// Absolute file offset of a section-1 block.
    pub fn section1_start(&self, entry: &Section1Entry) -> usize {
        self.header.section1_offset as usize + entry.offset as usize
    }

    fn check_masks(&self) {
        let section0 = block_mask(self.section0.keys().map(|&id| id as u32));
        if section0 != self.header.section0_mask {
            warn!(
                "section 0 block mask {:#x} disagrees with directory ({:#x}), trusting the directory",
                self.header.section0_mask, section0
            );
        }
        let section1 = block_mask(self.section1.keys().copied());
        if section1 != self.header.section1_mask {
            warn!(
                "section 1 block mask {:#x} disagrees with directory ({:#x}), trusting the directory",
                self.header.section1_mask, section1
            );
        }
    }
}

pub fn block_mask(ids: impl Iterator<Item = u32>) -> u64 {
    ids.filter(|&id| id < 64).fold(0, |mask, id| mask | (1u64 << id))
}

pub fn align16(value: usize) -> usize {
    value.div_ceil(ALIGNMENT) * ALIGNMENT
}

/// Zero-fills `buf` until its length is a multiple of 16.
pub fn pad_to_alignment(buf: &mut Vec<u8>) {
    let aligned = align16(buf.len());
    buf.resize(aligned, 0);
}

/// Bounds-checked view into the file.
pub fn slice_at<'a>(data: &'a [u8], offset: usize, len: usize, block: &'static str) -> Result<&'a [u8]> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or(FmdlError::Truncated {
            block,
            offset,
            needed: len,
            available: data.len(),
        })
}

pub(crate) fn to_u32(value: usize, what: &'static str) -> Result<u32> {
    u32::try_from(value).map_err(|_| FmdlError::OutOfRange {
        what,
        value,
        max: u32::MAX as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Directory {
        Directory::from_entries(
            FMDL_VERSION,
            vec![
                Section0Entry { id: 0, entry_count: 3, offset: 0 },
                Section0Entry { id: 3, entry_count: 2, offset: 0x90 },
            ],
            0xf0,
            vec![
                Section1Entry { id: 0, offset: 0, size: 16 },
                Section1Entry { id: 2, offset: 16, size: 0x200 },
                Section1Entry { id: 3, offset: 0x210, size: 40 },
            ],
            0x240,
        )
        .unwrap()
    }

    #[test]
    fn offsets_and_masks_follow_from_entries() {
        let dir = sample();
        // 64 + 2 * 8 + 3 * 12 = 116, rounded up
        assert_eq!(dir.header.section0_offset, 128);
        assert_eq!(dir.header.section1_offset, 128 + 0xf0);
        assert_eq!(dir.header.section0_mask, 0b1001);
        assert_eq!(dir.header.section1_mask, 0b1101);
        assert!(dir.has_skeleton());
    }

    #[test]
    fn write_then_read_keeps_every_entry() {
        let dir = sample();
        let mut bytes = Vec::new();
        dir.write(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 116);
        assert_eq!(&bytes[..4], b"FMDL");
        assert_eq!(bytes[16], 0b1001);
        assert_eq!(bytes[24], 0b1101);

        let back = Directory::read(&bytes).unwrap();
        assert_eq!(back, dir);
        assert_eq!(back.require_section0(Section0Block::Objects).unwrap().entry_count, 2);
    }

    #[test]
    fn rejects_wrong_magic() {
        let mut bytes = Vec::new();
        sample().write(&mut bytes).unwrap();
        bytes[0] = b'X';
        let err = Directory::read(&bytes).unwrap_err();
        assert!(matches!(err, FmdlError::BadMagic { .. }));
    }

    #[test]
    fn truncated_directory_reports_offset() {
        let mut bytes = Vec::new();
        sample().write(&mut bytes).unwrap();
        bytes.truncate(90);
        match Directory::read(&bytes).unwrap_err() {
            FmdlError::Truncated { block, offset, needed, available } => {
                assert_eq!(block, "block directory");
                assert_eq!(offset, 64);
                assert_eq!(needed, 52);
                assert_eq!(available, 90);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_required_block_names_it() {
        let dir = sample();
        let err = dir.require_section0(Section0Block::StringDefs).unwrap_err();
        assert_eq!(
            err.to_string(),
            "required section 0 block 12 (string defs) is missing from the directory"
        );
    }

    #[test]
    fn alignment_helpers() {
        assert_eq!(align16(0), 0);
        assert_eq!(align16(1), 16);
        assert_eq!(align16(16), 16);
        assert_eq!(align16(33), 48);
        let mut buf = vec![1u8; 20];
        pad_to_alignment(&mut buf);
        assert_eq!(buf.len(), 32);
        assert!(buf[20..].iter().all(|&b| b == 0));
    }
}
