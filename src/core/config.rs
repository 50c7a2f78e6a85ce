//! Filesystem configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! total_sectors = 128
//! sector_size = 64   # optional, defaults to 64
//! ```

use crate::core::error::{FsError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default sector size in bytes
pub const DEFAULT_SECTOR_SIZE: usize = 64;

/// Largest supported disk capacity in sectors
pub const MAX_TOTAL_SECTORS: u64 = u32::MAX as u64;

/// Largest supported sector size in bytes (1 MiB)
pub const MAX_SECTOR_SIZE: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsConfig {
    /// Disk capacity in sectors
    pub total_sectors: u64,

    /// Bytes per sector
    #[serde(default = "default_sector_size")]
    pub sector_size: usize,
}

fn default_sector_size() -> usize {
    DEFAULT_SECTOR_SIZE
}

impl FsConfig {
    pub fn new(total_sectors: u64) -> Self {
        FsConfig {
            total_sectors,
            sector_size: DEFAULT_SECTOR_SIZE,
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: FsConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading configuration from {:?}", path);
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        if self.total_sectors == 0 {
            return Err(FsError::Config(
                "disk capacity must be positive".to_string(),
            ));
        }
        if self.total_sectors > MAX_TOTAL_SECTORS {
            return Err(FsError::Config(format!(
                "disk capacity must be at most {} sectors",
                MAX_TOTAL_SECTORS
            )));
        }
        if self.sector_size == 0 {
            return Err(FsError::Config("sector size must be positive".to_string()));
        }
        if self.sector_size > MAX_SECTOR_SIZE {
            return Err(FsError::Config(format!(
                "sector size must be at most {} bytes",
                MAX_SECTOR_SIZE
            )));
        }
        Ok(())
    }
}
