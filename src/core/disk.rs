//! Sector payload storage
//!
//! The disk only stores bytes. Which slots are meaningful is decided by the
//! allocator; reading an unallocated slot returns whatever was last written.

use crate::core::error::{FsError, Result};

/// Sector payloads, each at most `sector_size` bytes, indexed by sector id
#[derive(Debug, Clone)]
pub struct Disk {
    sector_size: usize,
    slots: Vec<Vec<u8>>,
}

impl Disk {
    /// Empty disk; slots are backed on first write
    pub fn new(sector_size: usize) -> Self {
        Disk {
            sector_size,
            slots: Vec::new(),
        }
    }

    pub fn sector_size(&self) -> usize {
        self.sector_size
    }

    /// Number of slots currently backed by storage
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of sectors needed to hold `len` bytes
    pub fn sectors_for(&self, len: usize) -> usize {
        len.div_ceil(self.sector_size)
    }

    /// Store one chunk in a sector slot
    pub fn write(&mut self, sector: u64, chunk: &[u8]) -> Result<()> {
        if chunk.len() > self.sector_size {
            return Err(FsError::InvalidOperation(format!(
                "chunk of {} bytes does not fit in a {}-byte sector",
                chunk.len(),
                self.sector_size
            )));
        }

        let index = sector as usize;
        if index >= self.slots.len() {
            self.slots.resize(index + 1, Vec::new());
        }

        let slot = &mut self.slots[index];
        slot.clear();
        slot.extend_from_slice(chunk);
        Ok(())
    }

    /// Split `content` over `sectors`, one chunk per sector, in order
    pub fn write_content(&mut self, sectors: &[u64], content: &[u8]) -> Result<()> {
        let chunks = content.chunks(self.sector_size);
        if chunks.len() != sectors.len() {
            return Err(FsError::InvalidOperation(format!(
                "{} bytes need {} sectors, got {}",
                content.len(),
                self.sectors_for(content.len()),
                sectors.len()
            )));
        }

        for (&sector, chunk) in sectors.iter().zip(chunks) {
            self.write(sector, chunk)?;
        }
        Ok(())
    }

    pub fn read(&self, sector: u64) -> Result<&[u8]> {
        self.slots
            .get(sector as usize)
            .map(Vec::as_slice)
            .ok_or(FsError::InvalidSector(sector))
    }

    /// Reassemble content from sectors, in order
    pub fn read_content(&self, sectors: &[u64]) -> Result<Vec<u8>> {
        let mut content = Vec::new();
        for &sector in sectors {
            content.extend_from_slice(self.read(sector)?);
        }
        Ok(content)
    }
}
