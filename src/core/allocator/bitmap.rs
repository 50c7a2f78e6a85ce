//! Bitmap sector allocator
//!
//! One bit per sector, packed into 64-bit words.

use crate::core::allocator::SectorAllocator;
use crate::core::error::{FsError, Result};
use serde::{Deserialize, Serialize};

/// Bitmap allocator over a fixed number of sectors
///
/// Represents free/allocated state with bits:
/// - 0 = free sector
/// - 1 = allocated sector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitmapAllocator {
    /// Bitmap words (each word = 64 bits = 64 sectors)
    bitmap: Vec<u64>,

    /// Total number of sectors tracked
    total_sectors: u64,

    /// Number of free sectors available
    free_sectors: u64,
}

impl BitmapAllocator {
    pub fn new(total_sectors: u64) -> Self {
        let num_words = total_sectors.div_ceil(64) as usize;
        BitmapAllocator {
            bitmap: vec![0u64; num_words],
            total_sectors,
            free_sectors: total_sectors,
        }
    }

    fn locate(sector: u64) -> (usize, u64) {
        ((sector / 64) as usize, 1u64 << (sector % 64))
    }

    fn check_range(&self, sector: u64) -> Result<()> {
        if sector >= self.total_sectors {
            return Err(FsError::InvalidSector(sector));
        }
        Ok(())
    }

    /// Check if a specific sector is allocated
    pub fn is_allocated(&self, sector: u64) -> bool {
        if sector >= self.total_sectors {
            return false;
        }

        let (word_idx, mask) = Self::locate(sector);
        (self.bitmap[word_idx] & mask) != 0
    }

    /// Mark a specific sector allocated
    ///
    /// Used when a layout is rebuilt wholesale rather than first-fit.
    pub fn claim(&mut self, sector: u64) -> Result<()> {
        self.check_range(sector)?;

        let (word_idx, mask) = Self::locate(sector);
        if self.bitmap[word_idx] & mask == 0 {
            self.bitmap[word_idx] |= mask;
            self.free_sectors -= 1;
        }
        Ok(())
    }

    /// Free previously allocated sectors
    pub fn free_all(&mut self, sectors: &[u64]) -> Result<()> {
        // Validate first so a bad id leaves the bitmap untouched.
        for &sector in sectors {
            self.check_range(sector)?;
        }
        for &sector in sectors {
            self.free(sector)?;
        }
        Ok(())
    }

    /// Mark every sector free
    pub fn clear(&mut self) {
        self.bitmap.iter_mut().for_each(|word| *word = 0);
        self.free_sectors = self.total_sectors;
    }

    /// Allocated sector ids in ascending order
    pub fn allocated(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.total_sectors).filter(move |&sector| self.is_allocated(sector))
    }

    /// Index of the first free sector, if any
    fn first_free(&self) -> Option<u64> {
        for (word_idx, &word) in self.bitmap.iter().enumerate() {
            if word == u64::MAX {
                continue; // All bits set (all allocated)
            }

            let sector = word_idx as u64 * 64 + (!word).trailing_zeros() as u64;
            if sector < self.total_sectors {
                return Some(sector);
            }
            return None;
        }
        None
    }
}

impl SectorAllocator for BitmapAllocator {
    fn allocate(&mut self) -> Result<u64> {
        let sector = self.first_free().ok_or(FsError::DiskFull {
            needed: 1,
            available: 0,
        })?;

        let (word_idx, mask) = Self::locate(sector);
        self.bitmap[word_idx] |= mask;
        self.free_sectors -= 1;
        Ok(sector)
    }

    fn allocate_sectors(&mut self, count: usize) -> Result<Vec<u64>> {
        if count as u64 > self.free_sectors {
            return Err(FsError::DiskFull {
                needed: count as u64,
                available: self.free_sectors,
            });
        }

        let mut allocated = Vec::with_capacity(count);
        while allocated.len() < count {
            match self.allocate() {
                Ok(sector) => allocated.push(sector),
                Err(err) => {
                    // Rollback allocations
                    for &sector in &allocated {
                        self.free(sector)?;
                    }
                    return Err(err);
                }
            }
        }

        Ok(allocated)
    }

    fn free(&mut self, sector: u64) -> Result<()> {
        self.check_range(sector)?;

        let (word_idx, mask) = Self::locate(sector);

        // Check if already free
        if self.bitmap[word_idx] & mask == 0 {
            tracing::warn!("Double free ignored for sector {}", sector);
            return Ok(());
        }

        self.bitmap[word_idx] &= !mask;
        self.free_sectors += 1;
        Ok(())
    }

    fn fragmentation_score(&self) -> f64 {
        if self.total_sectors == 0 {
            return 0.0;
        }

        // Count free/allocated transitions; a packed layout has at most one.
        let mut transitions = 0usize;
        let mut prev_allocated = false;

        for sector in 0..self.total_sectors {
            let is_allocated = self.is_allocated(sector);
            if is_allocated != prev_allocated {
                transitions += 1;
            }
            prev_allocated = is_allocated;
        }

        (transitions as f64) / (self.total_sectors as f64)
    }

    fn total_sectors(&self) -> u64 {
        self.total_sectors
    }

    fn free_sectors(&self) -> u64 {
        self.free_sectors
    }
}
