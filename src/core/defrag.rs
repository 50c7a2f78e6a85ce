//! Defragmentation
//!
//! Repacks every file onto consecutive sectors starting at 0, visiting files
//! in depth-first child order. The required sector total is checked before
//! the bitmap is cleared, so a layout that cannot fit is rejected without
//! touching anything.

use crate::core::allocator::{BitmapAllocator, SectorAllocator};
use crate::core::disk::Disk;
use crate::core::error::{FsError, Result};
use crate::core::tree::Tree;
use serde::Serialize;

/// Outcome of a defragmentation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefragReport {
    /// Files visited
    pub files: usize,
    /// Sectors in use afterwards, always `0..used_sectors`
    pub used_sectors: u64,
    pub free_sectors: u64,
    /// Sectors whose id changed
    pub relocated_sectors: u64,
}

pub fn defragment(
    tree: &mut Tree,
    allocator: &mut BitmapAllocator,
    disk: &mut Disk,
) -> Result<DefragReport> {
    let files = tree.files(tree.root())?;

    let mut needed = 0u64;
    for &file in &files {
        needed += disk.sectors_for(tree.get(file)?.content().len()) as u64;
    }
    if needed > allocator.total_sectors() {
        return Err(FsError::DiskFull {
            needed,
            available: allocator.total_sectors(),
        });
    }

    tracing::info!(
        "Defragmenting {} files into sectors 0..{}",
        files.len(),
        needed
    );

    allocator.clear();

    let mut next_sector = 0u64;
    let mut relocated = 0u64;
    for &file in &files {
        let node = tree.get_mut(file)?;
        let count = disk.sectors_for(node.content().len()) as u64;
        let layout: Vec<u64> = (next_sector..next_sector + count).collect();

        relocated += node
            .sectors()
            .iter()
            .zip(&layout)
            .filter(|(old, new)| old != new)
            .count() as u64;

        for &sector in &layout {
            allocator.claim(sector)?;
        }
        disk.write_content(&layout, node.content())?;
        *node.sectors_mut() = layout;

        next_sector += count;
    }

    Ok(DefragReport {
        files: files.len(),
        used_sectors: next_sector,
        free_sectors: allocator.free_sectors(),
        relocated_sectors: relocated,
    })
}
