//! # sectorfs - Simulated Sector Filesystem
//!
//! `sectorfs` models a Unix-like filesystem entirely in memory on top of a
//! fixed-capacity disk of equally sized sectors. It is meant for studying
//! filesystem internals:
//!
//! - **Directory tree** of files and directories with `.`/`..` path resolution
//! - **Sector allocation** through a lowest-id-first bitmap
//! - **Content chunking** of file bytes into sector-sized pieces
//! - **Defragmentation** that repacks every file onto sectors `0..n`
//!
//! ## Quick Start
//!
//! ```rust
//! use sectorfs::{FileSystem, Result};
//!
//! # fn main() -> Result<()> {
//! // 4 sectors of 64 bytes
//! let mut fs = FileSystem::with_capacity(4)?;
//! let mut session = fs.session();
//!
//! fs.mkdir(&session, "docs")?;
//! fs.cd(&mut session, "docs")?;
//! fs.put(&session, "notes.txt", vec![b'a'; 70])?;
//!
//! assert_eq!(fs.pwd(&session)?, "/docs");
//! assert_eq!(fs.info(&session, "notes.txt")?.sectors, vec![0, 1]);
//! assert_eq!(fs.get(&session, "/docs/notes.txt")?.len(), 70);
//! # Ok(())
//! # }
//! ```
//!
//! ## Sessions
//!
//! The current directory lives in a [`Session`] value rather than in the
//! filesystem, so independent sessions can share one tree:
//!
//! ```rust
//! use sectorfs::FileSystem;
//!
//! let mut fs = FileSystem::with_capacity(8).unwrap();
//! let mut alice = fs.session();
//! let bob = fs.session();
//!
//! fs.mkdir(&alice, "home/alice").unwrap();
//! fs.cd(&mut alice, "home/alice").unwrap();
//!
//! assert_eq!(fs.pwd(&alice).unwrap(), "/home/alice");
//! assert_eq!(fs.pwd(&bob).unwrap(), "/");
//! ```

pub mod core;
pub mod shell;

pub use crate::core::{
    allocator::{BitmapAllocator, SectorAllocator},
    config::{FsConfig, DEFAULT_SECTOR_SIZE, MAX_SECTOR_SIZE, MAX_TOTAL_SECTORS},
    defrag::DefragReport,
    error::{FsError, Result},
    filesystem::{ConsistencyReport, DiskStats, Entry, FileSystem, FileSystemBuilder},
    session::Session,
    tree::{NodeId, NodeKind},
};
