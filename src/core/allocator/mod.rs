//! Sector allocation for the simulated disk
//!
//! Sectors are handed out lowest id first, so freed low ids are reused before
//! never-used high ids. That reuse order is what fragments files over time.

pub mod bitmap;

pub use bitmap::BitmapAllocator;

use crate::core::error::Result;

/// Sector allocator trait
///
/// Defines the interface for claiming and releasing sector ids.
pub trait SectorAllocator {
    /// Claim the lowest free sector id
    fn allocate(&mut self) -> Result<u64>;

    /// Claim `count` sectors at once, lowest ids first
    ///
    /// Either every requested sector is claimed or none is.
    fn allocate_sectors(&mut self, count: usize) -> Result<Vec<u64>>;

    /// Release a sector id
    fn free(&mut self, sector: u64) -> Result<()>;

    /// Calculate fragmentation score (0.0 = no fragmentation, higher = more fragmented)
    fn fragmentation_score(&self) -> f64;

    /// Get total number of sectors managed
    fn total_sectors(&self) -> u64;

    /// Get number of free sectors available
    fn free_sectors(&self) -> u64;

    fn used_sectors(&self) -> u64 {
        self.total_sectors() - self.free_sectors()
    }
}
