//! Reading and writing whole section-0 tables.
use crate::directory::{Directory, Section0Entry, align16, slice_at, to_u32};
use crate::error::{FmdlError, Result};
use crate::fmdl_types::{Record, Section0Block};
use log::debug;
use std::io::Cursor;

/// Reads a table that must be listed in the directory.
pub fn read_table<T: Record>(data: &[u8], dir: &Directory, block: Section0Block) -> Result<Vec<T>> {
    let entry = dir.require_section0(block)?;
    read_entry(data, dir, entry, block)
}

/// Reads a table, yielding an empty list when the directory omits it.
pub fn read_optional_table<T: Record>(data: &[u8], dir: &Directory, block: Section0Block) -> Result<Vec<T>> {
    match dir.section0_entry(block) {
        Some(entry) => read_entry(data, dir, entry, block),
        None => Ok(Vec::new()),
    }
}

fn read_entry<T: Record>(data: &[u8], dir: &Directory, entry: &Section0Entry, block: Section0Block) -> Result<Vec<T>> {
    let start = dir.section0_start(entry);
    let count = entry.entry_count as usize;
    let bytes = slice_at(data, start, count * T::SIZE, block.name())?;
    debug!("block {} ({}): {} records @ {:#x}", block.id(), block.name(), count, start);

    let mut cursor = Cursor::new(bytes);
    let mut records = Vec::with_capacity(count);
    for index in 0..count {
        let record = T::read(&mut cursor).map_err(|e| with_group_index(e, index))?;
        records.push(record);
    }
    Ok(records)
}

/// Sequential writer for section 0. Every table starts on a 16-byte
/// boundary relative to the section base and gets a directory entry
/// pointing at where it actually landed.
#[derive(Debug, Default)]
pub struct Section0Writer {
    buf: Vec<u8>,
    entries: Vec<Section0Entry>,
}

impl Section0Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_table<T: Record>(&mut self, block: Section0Block, records: &[T]) -> Result<()> {
        let count = u16::try_from(records.len()).map_err(|_| FmdlError::OutOfRange {
            what: block.name(),
            value: records.len(),
            max: u16::MAX as usize,
        })?;

        let offset = align16(self.buf.len());
        self.buf.resize(offset, 0);
        for (index, record) in records.iter().enumerate() {
            record.write(&mut self.buf).map_err(|e| with_group_index(e, index))?;
        }
        debug!(
            "wrote block {} ({}): {} records @ +{:#x}",
            block.id(),
            block.name(),
            count,
            offset
        );

        self.entries.push(Section0Entry {
            id: block.id(),
            entry_count: count,
            offset: to_u32(offset, "section 0 block offset")?,
        });
        Ok(())
    }

    /// Returns the padded section bytes and the directory entries in write order.
    pub fn finish(mut self) -> (Vec<u8>, Vec<Section0Entry>) {
        let len = align16(self.buf.len());
        self.buf.resize(len, 0);
        (self.buf, self.entries)
    }
}

// Records report overflow without knowing their position in the table.
fn with_group_index(err: FmdlError, index: usize) -> FmdlError {
    match err {
        FmdlError::BoneGroupOverflow { count, .. } => FmdlError::BoneGroupOverflow { group: index, count },
        other => other,
    }
}
