//! Filesystem core: sector layer and node tree

pub mod allocator;
pub mod config;
pub mod defrag;
pub mod disk;
pub mod error;
pub mod filesystem;
pub mod path;
pub mod session;
pub mod tree;
pub mod validation;
pub mod writer;

pub use filesystem::{ConsistencyReport, DiskStats, Entry, FileSystem, FileSystemBuilder};
