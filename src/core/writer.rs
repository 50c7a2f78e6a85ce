//! Content writer
//!
//! Moves a file's bytes onto the disk. A rewrite is two-phase: the sector
//! budget is checked first (counting the sectors the file already holds, since
//! those are released by the rewrite), and only then is anything freed,
//! allocated or written. A rewrite that does not fit fails with `DiskFull` and
//! the file keeps its previous content and sectors.

use crate::core::allocator::{BitmapAllocator, SectorAllocator};
use crate::core::disk::Disk;
use crate::core::error::{FsError, Result};
use crate::core::tree::Node;

pub struct ContentWriter<'a> {
    allocator: &'a mut BitmapAllocator,
    disk: &'a mut Disk,
}

impl<'a> ContentWriter<'a> {
    pub fn new(allocator: &'a mut BitmapAllocator, disk: &'a mut Disk) -> Self {
        ContentWriter { allocator, disk }
    }

    /// Fail with `DiskFull` unless `needed` sectors can be claimed once
    /// `releasing` sectors have been given back
    pub fn ensure_capacity(&self, needed: u64, releasing: u64) -> Result<()> {
        let available = self.allocator.free_sectors() + releasing;
        if needed > available {
            return Err(FsError::DiskFull { needed, available });
        }
        Ok(())
    }

    /// Replace a file's content
    pub fn rewrite(&mut self, node: &mut Node, content: Vec<u8>) -> Result<()> {
        if !node.is_file() {
            return Err(FsError::IsADirectory(node.name().to_string()));
        }

        let needed = self.disk.sectors_for(content.len());
        self.ensure_capacity(needed as u64, node.sectors().len() as u64)?;

        self.allocator.free_all(node.sectors())?;
        node.sectors_mut().clear();

        let sectors = self.allocator.allocate_sectors(needed)?;
        self.disk.write_content(&sectors, &content)?;

        tracing::debug!(
            "Wrote {} bytes of '{}' to sectors {:?}",
            content.len(),
            node.name(),
            sectors
        );
        node.set_content(content, sectors);
        Ok(())
    }
}
