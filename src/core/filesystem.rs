//! Main filesystem API
//!
//! Ties the node tree to the sector layer. Every verb validates its
//! preconditions before mutating anything, and every verb that changes file
//! content or removes files keeps the allocation bitmap equal to the set of
//! sectors referenced by live files.

use crate::core::allocator::{BitmapAllocator, SectorAllocator};
use crate::core::config::FsConfig;
use crate::core::defrag::{self, DefragReport};
use crate::core::disk::Disk;
use crate::core::error::{FsError, Result};
use crate::core::path::{self, split_parent};
use crate::core::session::Session;
use crate::core::tree::{NodeId, NodeKind, Tree};
use crate::core::validation::validate_name;
use crate::core::writer::ContentWriter;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Description of a file or directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Entry {
    /// Absolute path (e.g., "/docs/notes.txt")
    pub path: String,

    /// Just the name (e.g., "notes.txt"); "/" for the root
    pub name: String,

    /// Absolute path of the parent directory, empty for the root
    pub parent: String,

    pub is_dir: bool,

    /// Content size in bytes (None for directories)
    pub size: Option<u64>,

    /// Sectors holding the content, in order
    pub sectors: Vec<u64>,
}

/// Disk usage statistics
#[derive(Debug, Clone, Serialize)]
pub struct DiskStats {
    pub total_sectors: u64,
    pub used_sectors: u64,
    pub free_sectors: u64,
    pub sector_size: usize,
    pub fragmentation: f64,
    pub files: usize,
    pub directories: usize,
}

/// Result of cross-checking the tree against the bitmap and the disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsistencyReport {
    /// Allocated sectors no file refers to
    pub orphaned: Vec<u64>,
    /// Sectors referenced by more than one file
    pub shared: Vec<u64>,
    /// Sectors referenced by a file but marked free
    pub unallocated: Vec<u64>,
    /// Files whose sector list or disk payload disagrees with their content
    pub mismatched: Vec<String>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.orphaned.is_empty()
            && self.shared.is_empty()
            && self.unallocated.is_empty()
            && self.mismatched.is_empty()
    }
}

/// In-memory filesystem over a fixed-capacity sector disk
#[derive(Debug, Clone)]
pub struct FileSystem {
    config: FsConfig,
    tree: Tree,
    allocator: BitmapAllocator,
    disk: Disk,
}

impl FileSystem {
    pub fn new(config: FsConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "Creating filesystem with {} sectors of {} bytes",
            config.total_sectors, config.sector_size
        );

        Ok(FileSystem {
            tree: Tree::new(),
            allocator: BitmapAllocator::new(config.total_sectors),
            disk: Disk::new(config.sector_size),
            config,
        })
    }

    /// Filesystem with the default sector size
    pub fn with_capacity(total_sectors: u64) -> Result<Self> {
        Self::new(FsConfig::new(total_sectors))
    }

    pub fn config(&self) -> &FsConfig {
        &self.config
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn allocator(&self) -> &BitmapAllocator {
        &self.allocator
    }

    pub fn disk(&self) -> &Disk {
        &self.disk
    }

    /// Open a new session at the root directory
    pub fn session(&self) -> Session {
        Session::new(self.tree.root())
    }

    fn cwd(&self, session: &Session) -> Result<NodeId> {
        let cwd = session.cwd();
        if !self.tree.contains(cwd) {
            warn!("Session directory {} was removed", cwd);
            return Err(FsError::NotFound(
                "current directory no longer exists".to_string(),
            ));
        }
        Ok(cwd)
    }

    fn lookup(&self, session: &Session, path: &str) -> Result<Option<NodeId>> {
        if !path.starts_with('/') {
            self.cwd(session)?;
        }
        Ok(path::resolve(&self.tree, session.cwd(), path))
    }

    fn resolve(&self, session: &Session, path: &str) -> Result<NodeId> {
        self.lookup(session, path)?
            .ok_or_else(|| FsError::NotFound(path.to_string()))
    }

    fn resolve_dir(&self, session: &Session, path: &str) -> Result<NodeId> {
        let id = self.resolve(session, path)?;
        if !self.tree.get(id)?.is_dir() {
            return Err(FsError::NotADirectory(path.to_string()));
        }
        Ok(id)
    }

    fn resolve_file(&self, session: &Session, path: &str) -> Result<NodeId> {
        let id = self.resolve(session, path)?;
        if self.tree.get(id)?.is_dir() {
            return Err(FsError::IsADirectory(path.to_string()));
        }
        Ok(id)
    }

    /// Directory and name a copy or move of `source` lands on
    ///
    /// An existing directory receives the node under its current name;
    /// anything else names the new entry inside an existing parent.
    fn destination(&self, session: &Session, source: NodeId, dest: &str) -> Result<(NodeId, String)> {
        if let Some(target) = self.lookup(session, dest)? {
            if self.tree.get(target)?.is_dir() {
                return Ok((target, self.tree.get(source)?.name().to_string()));
            }
        }

        let (dir_path, name) = split_parent(dest);
        let dir = self
            .lookup(session, dir_path)?
            .filter(|&id| self.tree.get(id).is_ok_and(|node| node.is_dir()))
            .ok_or_else(|| {
                FsError::NotFound(format!("destination directory not found: {}", dir_path))
            })?;
        validate_name(name)?;
        Ok((dir, name.to_string()))
    }

    fn entry(&self, id: NodeId) -> Result<Entry> {
        let node = self.tree.get(id)?;
        let parent = match node.parent() {
            Some(parent) => self.tree.path_of(parent)?,
            None => String::new(),
        };

        Ok(Entry {
            path: self.tree.path_of(id)?,
            name: node.name().to_string(),
            parent,
            is_dir: node.is_dir(),
            size: node.is_file().then(|| node.size()),
            sectors: node.sectors().to_vec(),
        })
    }

    /// Absolute path of the session's current directory
    pub fn pwd(&self, session: &Session) -> Result<String> {
        let cwd = self.cwd(session)?;
        self.tree.path_of(cwd)
    }

    /// Change the session's current directory
    pub fn cd(&self, session: &mut Session, path: &str) -> Result<()> {
        debug!("cd {}", path);
        let target = self.resolve_dir(session, path)?;
        session.set_cwd(target);
        Ok(())
    }

    /// List a directory, sorted by name
    ///
    /// Without a path the current directory is listed. A file path yields a
    /// single entry for that file.
    pub fn ls(&self, session: &Session, path: Option<&str>) -> Result<Vec<Entry>> {
        let target = match path {
            Some(path) => self.resolve(session, path)?,
            None => self.cwd(session)?,
        };

        let node = self.tree.get(target)?;
        if node.is_file() {
            return Ok(vec![self.entry(target)?]);
        }

        let mut entries = node
            .children()
            .iter()
            .map(|&child| self.entry(child))
            .collect::<Result<Vec<_>>>()?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Create a directory and any missing parents
    ///
    /// The whole path is checked before anything is created: an invalid
    /// segment or a file in the way fails the call with nothing created.
    /// Returns the directories that were created, outermost first.
    pub fn mkdir(&mut self, session: &Session, path: &str) -> Result<Vec<NodeId>> {
        debug!("mkdir {}", path);
        let parts: Vec<&str> = path::segments(path).collect();
        if parts.is_empty() {
            return Err(FsError::InvalidName(format!("missing directory path: '{}'", path)));
        }
        for part in &parts {
            validate_name(part)?;
        }

        let mut current = if path.starts_with('/') {
            self.tree.root()
        } else {
            self.cwd(session)?
        };

        let mut missing_from = parts.len();
        for (idx, part) in parts.iter().enumerate() {
            match self.tree.child(current, part) {
                Some(child) if self.tree.get(child)?.is_dir() => current = child,
                Some(child) => {
                    return Err(FsError::NotADirectory(format!(
                        "{} exists and is a file",
                        self.tree.path_of(child)?
                    )))
                }
                None => {
                    missing_from = idx;
                    break;
                }
            }
        }

        let mut created = Vec::new();
        for part in &parts[missing_from..] {
            current = self.tree.create_child(current, part, NodeKind::Directory)?;
            info!("Directory created: {}", self.tree.path_of(current)?);
            created.push(current);
        }
        Ok(created)
    }

    /// Create an empty file in the current directory
    pub fn touch(&mut self, session: &Session, name: &str) -> Result<NodeId> {
        debug!("touch {}", name);
        let cwd = self.cwd(session)?;
        let id = self.tree.create_child(cwd, name, NodeKind::File)?;
        info!("File created: {}", self.tree.path_of(id)?);
        Ok(id)
    }

    /// Remove a direct child of the current directory
    ///
    /// Returns the number of sectors released.
    pub fn rm(&mut self, session: &Session, name: &str, recursive: bool) -> Result<u64> {
        debug!("rm {} (recursive: {})", name, recursive);
        let cwd = self.cwd(session)?;
        let target = self
            .tree
            .child(cwd, name)
            .ok_or_else(|| FsError::NotFound(name.to_string()))?;

        let node = self.tree.get(target)?;
        if node.is_dir() && !node.children().is_empty() && !recursive {
            return Err(FsError::NotEmpty(name.to_string()));
        }

        let mut sectors = Vec::new();
        for file in self.tree.files(target)? {
            sectors.extend_from_slice(self.tree.get(file)?.sectors());
        }
        let path = self.tree.path_of(target)?;

        self.allocator.free_all(&sectors)?;
        let removed = self.tree.remove_subtree(target)?;

        info!(
            "Removed {} ({} nodes, {} sectors freed)",
            path,
            removed.len(),
            sectors.len()
        );
        Ok(sectors.len() as u64)
    }

    /// Deep-copy a file or directory
    ///
    /// Every copied file gets its own sectors. The whole subtree's sector
    /// budget is checked up front, so `DiskFull` leaves the tree unchanged.
    pub fn cp(&mut self, session: &Session, source: &str, dest: &str) -> Result<NodeId> {
        debug!("cp {} {}", source, dest);
        let src = self.resolve(session, source)?;
        if src == self.tree.root() {
            return Err(FsError::InvalidOperation(
                "cannot copy the root directory".to_string(),
            ));
        }

        let (dest_dir, name) = self.destination(session, src, dest)?;
        if self.tree.child(dest_dir, &name).is_some() {
            let dir_path = self.tree.path_of(dest_dir)?;
            return Err(FsError::AlreadyExists(format!(
                "{}/{}",
                dir_path.trim_end_matches('/'),
                name
            )));
        }

        let needed = self.tree.sector_count(src)?;
        ContentWriter::new(&mut self.allocator, &mut self.disk).ensure_capacity(needed, 0)?;

        // Snapshot the subtree first so copying into it stays finite.
        let order = self.tree.preorder(src)?;
        let mut copies: HashMap<NodeId, NodeId> = HashMap::with_capacity(order.len());

        for original in order {
            let node = self.tree.get(original)?;
            let (parent, node_name) = if original == src {
                (dest_dir, name.clone())
            } else {
                let parent = node
                    .parent()
                    .and_then(|parent| copies.get(&parent).copied())
                    .ok_or_else(|| {
                        FsError::InvalidOperation(format!("orphaned node {} during copy", original))
                    })?;
                (parent, node.name().to_string())
            };
            let kind = node.kind();
            let content = node.content().to_vec();

            let copy = self.tree.create_child(parent, &node_name, kind)?;
            if kind == NodeKind::File {
                let target = self.tree.get_mut(copy)?;
                ContentWriter::new(&mut self.allocator, &mut self.disk).rewrite(target, content)?;
            }
            copies.insert(original, copy);
        }

        let copy = copies
            .get(&src)
            .copied()
            .ok_or_else(|| FsError::NotFound(source.to_string()))?;
        info!(
            "Copied {} -> {} ({} sectors)",
            source,
            self.tree.path_of(copy)?,
            needed
        );
        Ok(copy)
    }

    /// Move or rename a node without touching its sectors
    pub fn mv(&mut self, session: &Session, source: &str, dest: &str) -> Result<NodeId> {
        debug!("mv {} {}", source, dest);
        let src = self.resolve(session, source)?;
        if src == self.tree.root() {
            return Err(FsError::InvalidOperation(
                "cannot move the root directory".to_string(),
            ));
        }

        let (dest_dir, name) = self.destination(session, src, dest)?;
        self.tree.relocate(src, dest_dir, &name)?;

        info!("Moved {} -> {}", source, self.tree.path_of(src)?);
        Ok(src)
    }

    /// Read a file's content back from its sectors
    pub fn get(&self, session: &Session, path: &str) -> Result<Vec<u8>> {
        debug!("get {}", path);
        let id = self.resolve_file(session, path)?;
        self.disk.read_content(self.tree.get(id)?.sectors())
    }

    /// Create a file with content in the current directory
    pub fn put(&mut self, session: &Session, name: &str, content: Vec<u8>) -> Result<NodeId> {
        self.put_into(session, ".", name, content)
    }

    /// Create a file with content inside directory `dir`
    ///
    /// Capacity is checked before the file is created, so on `DiskFull` no
    /// file is left behind.
    pub fn put_into(
        &mut self,
        session: &Session,
        dir: &str,
        name: &str,
        content: Vec<u8>,
    ) -> Result<NodeId> {
        debug!("put {} bytes into {}/{}", content.len(), dir, name);
        let parent = self.resolve_dir(session, dir)?;
        validate_name(name)?;
        if self.tree.child(parent, name).is_some() {
            let dir_path = self.tree.path_of(parent)?;
            return Err(FsError::AlreadyExists(format!(
                "{}/{}",
                dir_path.trim_end_matches('/'),
                name
            )));
        }

        let needed = self.disk.sectors_for(content.len()) as u64;
        ContentWriter::new(&mut self.allocator, &mut self.disk).ensure_capacity(needed, 0)?;

        let id = self.tree.create_child(parent, name, NodeKind::File)?;
        let node = self.tree.get_mut(id)?;
        if let Err(err) = ContentWriter::new(&mut self.allocator, &mut self.disk).rewrite(node, content) {
            self.tree.remove_subtree(id)?;
            return Err(err);
        }

        info!("File created: {}", self.tree.path_of(id)?);
        Ok(id)
    }

    /// Replace an existing file's content
    ///
    /// On `DiskFull` the file keeps its previous content.
    pub fn write(&mut self, session: &Session, path: &str, content: Vec<u8>) -> Result<()> {
        debug!("write {} bytes to {}", content.len(), path);
        let id = self.resolve_file(session, path)?;
        let node = self.tree.get_mut(id)?;
        ContentWriter::new(&mut self.allocator, &mut self.disk).rewrite(node, content)
    }

    /// Append to an existing file
    pub fn append(&mut self, session: &Session, path: &str, content: &[u8]) -> Result<()> {
        let id = self.resolve_file(session, path)?;
        let mut updated = self.tree.get(id)?.content().to_vec();
        updated.extend_from_slice(content);
        self.write(session, path, updated)
    }

    /// Describe a file or directory
    pub fn info(&self, session: &Session, path: &str) -> Result<Entry> {
        let id = self.resolve(session, path)?;
        self.entry(id)
    }

    /// Pre-order listing of a subtree with depths relative to `path`
    pub fn walk(&self, session: &Session, path: &str) -> Result<Vec<(usize, Entry)>> {
        let id = self.resolve(session, path)?;
        self.tree
            .walk(id)?
            .into_iter()
            .map(|(node, depth)| Ok((depth, self.entry(node)?)))
            .collect()
    }

    /// Repack all files onto consecutive sectors from 0
    pub fn defrag(&mut self) -> Result<DefragReport> {
        let report = defrag::defragment(&mut self.tree, &mut self.allocator, &mut self.disk)?;
        info!(
            "Defragmentation complete: {} files, {} sectors used, {} free",
            report.files, report.used_sectors, report.free_sectors
        );
        Ok(report)
    }

    pub fn stats(&self) -> DiskStats {
        let (mut files, mut directories) = (0, 0);
        for (_, node) in self.tree.iter() {
            match node.kind() {
                NodeKind::File => files += 1,
                NodeKind::Directory => directories += 1,
            }
        }

        DiskStats {
            total_sectors: self.allocator.total_sectors(),
            used_sectors: self.allocator.used_sectors(),
            free_sectors: self.allocator.free_sectors(),
            sector_size: self.disk.sector_size(),
            fragmentation: self.allocator.fragmentation_score(),
            files,
            directories,
        }
    }

    /// Cross-check files, bitmap and disk
    pub fn check(&self) -> Result<ConsistencyReport> {
        let mut report = ConsistencyReport::default();
        let mut owners: BTreeMap<u64, usize> = BTreeMap::new();

        for (id, _) in self.tree.walk(self.tree.root())? {
            let node = self.tree.get(id)?;
            for &sector in node.sectors() {
                *owners.entry(sector).or_default() += 1;
            }

            let expected = self.disk.sectors_for(node.content().len());
            let payload_matches = self
                .disk
                .read_content(node.sectors())
                .is_ok_and(|data| data == node.content());
            if node.sectors().len() != expected || !payload_matches {
                report.mismatched.push(self.tree.path_of(id)?);
            }
        }

        for (&sector, &count) in &owners {
            if count > 1 {
                report.shared.push(sector);
            }
            if !self.allocator.is_allocated(sector) {
                report.unallocated.push(sector);
            }
        }
        report.orphaned = self
            .allocator
            .allocated()
            .filter(|sector| !owners.contains_key(sector))
            .collect();

        if !report.is_consistent() {
            warn!("Consistency check failed: {:?}", report);
        }
        Ok(report)
    }
}

/// Builder for [`FileSystem`]
///
/// # Examples
///
/// ```
/// use sectorfs::FileSystemBuilder;
///
/// let fs = FileSystemBuilder::new()
///     .total_sectors(16)
///     .sector_size(32)
///     .build()
///     .unwrap();
/// assert_eq!(fs.stats().free_sectors, 16);
/// ```
#[derive(Debug, Default)]
pub struct FileSystemBuilder {
    total_sectors: Option<u64>,
    sector_size: Option<usize>,
}

impl FileSystemBuilder {
    pub fn new() -> Self {
        FileSystemBuilder {
            total_sectors: None,
            sector_size: None,
        }
    }

    pub fn total_sectors(mut self, total_sectors: u64) -> Self {
        self.total_sectors = Some(total_sectors);
        self
    }

    pub fn sector_size(mut self, sector_size: usize) -> Self {
        self.sector_size = Some(sector_size);
        self
    }

    /// Start from a loaded configuration; later setters override it
    pub fn config(mut self, config: FsConfig) -> Self {
        self.total_sectors = Some(config.total_sectors);
        self.sector_size = Some(config.sector_size);
        self
    }

    pub fn build(self) -> Result<FileSystem> {
        let total_sectors = self
            .total_sectors
            .ok_or_else(|| FsError::Config("disk capacity must be set".to_string()))?;

        let mut config = FsConfig::new(total_sectors);
        if let Some(sector_size) = self.sector_size {
            config.sector_size = sector_size;
        }
        FileSystem::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fs(total: u64) -> (FileSystem, Session) {
        let fs = FileSystem::with_capacity(total).unwrap();
        let session = fs.session();
        (fs, session)
    }

    #[test]
    fn test_pwd_and_cd() {
        let (mut fs, mut session) = fs(8);
        fs.mkdir(&session, "/docs").unwrap();
        fs.put_into(&session, "/docs", "notes.txt", b"hi".to_vec()).unwrap();

        assert_eq!(fs.pwd(&session).unwrap(), "/");
        fs.cd(&mut session, "docs").unwrap();
        assert_eq!(fs.pwd(&session).unwrap(), "/docs");
        fs.cd(&mut session, "..").unwrap();
        assert_eq!(fs.pwd(&session).unwrap(), "/");

        assert!(matches!(
            fs.cd(&mut session, "docs/notes.txt"),
            Err(FsError::NotADirectory(_))
        ));
        assert!(matches!(fs.cd(&mut session, "nope"), Err(FsError::NotFound(_))));
        assert_eq!(fs.pwd(&session).unwrap(), "/");
    }

    #[test]
    fn test_ls_sorted_and_file_target() {
        let (mut fs, session) = fs(8);
        fs.touch(&session, "zeta").unwrap();
        fs.mkdir(&session, "alpha").unwrap();
        fs.put(&session, "mid", vec![7; 70]).unwrap();

        let names: Vec<_> = fs
            .ls(&session, None)
            .unwrap()
            .into_iter()
            .map(|e| (e.name, e.is_dir))
            .collect();
        assert_eq!(
            names,
            vec![
                ("alpha".to_string(), true),
                ("mid".to_string(), false),
                ("zeta".to_string(), false)
            ]
        );

        let single = fs.ls(&session, Some("mid")).unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].size, Some(70));
        assert_eq!(single[0].sectors, vec![0, 1]);
    }

    #[test]
    fn test_mkdir_creates_parents() {
        let (mut fs, session) = fs(4);
        let created = fs.mkdir(&session, "a/b/c").unwrap();
        assert_eq!(created.len(), 3);

        let created = fs.mkdir(&session, "/a/b/d").unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(fs.tree().path_of(created[0]).unwrap(), "/a/b/d");

        // Existing path is a no-op
        assert!(fs.mkdir(&session, "a/b").unwrap().is_empty());
    }

    #[test]
    fn test_mkdir_is_atomic() {
        let (mut fs, mut session) = fs(4);
        fs.mkdir(&session, "a").unwrap();
        fs.cd(&mut session, "a").unwrap();
        fs.touch(&session, "file").unwrap();
        fs.cd(&mut session, "/").unwrap();

        assert!(matches!(
            fs.mkdir(&session, "a/file/deeper"),
            Err(FsError::NotADirectory(_))
        ));
        assert!(matches!(
            fs.mkdir(&session, "x/y/bad name"),
            Err(FsError::InvalidName(_))
        ));
        assert!(matches!(fs.mkdir(&session, "x/../y"), Err(FsError::InvalidName(_))));
        assert!(matches!(fs.mkdir(&session, "/"), Err(FsError::InvalidName(_))));
        assert_eq!(fs.tree().len(), 3);
    }

    #[test]
    fn test_touch_errors() {
        let (mut fs, session) = fs(4);
        fs.touch(&session, "f").unwrap();
        assert!(matches!(fs.touch(&session, "f"), Err(FsError::AlreadyExists(_))));
        assert!(matches!(fs.touch(&session, "a/b"), Err(FsError::InvalidName(_))));
        assert!(matches!(fs.touch(&session, ""), Err(FsError::InvalidName(_))));
    }

    #[test]
    fn test_get_and_write() {
        let (mut fs, session) = fs(8);
        fs.put(&session, "f", b"first".to_vec()).unwrap();
        fs.write(&session, "f", vec![b'x'; 100]).unwrap();
        fs.append(&session, "f", b"!").unwrap();

        let content = fs.get(&session, "f").unwrap();
        assert_eq!(content.len(), 101);
        assert_eq!(content[100], b'!');

        fs.mkdir(&session, "d").unwrap();
        assert!(matches!(fs.get(&session, "d"), Err(FsError::IsADirectory(_))));
        assert!(matches!(fs.write(&session, "d", vec![]), Err(FsError::IsADirectory(_))));
        assert!(matches!(fs.get(&session, "missing"), Err(FsError::NotFound(_))));
    }

    #[test]
    fn test_info() {
        let (mut fs, session) = fs(8);
        fs.mkdir(&session, "docs").unwrap();
        fs.put_into(&session, "docs", "a.txt", vec![1; 65]).unwrap();

        let entry = fs.info(&session, "/docs/a.txt").unwrap();
        assert_eq!(entry.path, "/docs/a.txt");
        assert_eq!(entry.parent, "/docs");
        assert_eq!(entry.size, Some(65));
        assert_eq!(entry.sectors, vec![0, 1]);

        let dir = fs.info(&session, "docs").unwrap();
        assert!(dir.is_dir);
        assert_eq!(dir.size, None);

        let root = fs.info(&session, "/").unwrap();
        assert_eq!(root.name, "/");
        assert_eq!(root.parent, "");
    }

    #[test]
    fn test_stale_session() {
        let (mut fs, first) = fs(8);
        let mut second = fs.session();
        fs.mkdir(&first, "tmp").unwrap();
        fs.cd(&mut second, "tmp").unwrap();

        fs.rm(&first, "tmp", false).unwrap();

        assert!(matches!(fs.pwd(&second), Err(FsError::NotFound(_))));
        assert!(matches!(fs.touch(&second, "f"), Err(FsError::NotFound(_))));
        assert!(fs.info(&second, "/").is_ok());

        fs.cd(&mut second, "/").unwrap();
        assert_eq!(fs.pwd(&second).unwrap(), "/");
    }

    #[test]
    fn test_walk() {
        let (mut fs, session) = fs(8);
        fs.mkdir(&session, "a/b").unwrap();
        fs.put_into(&session, "a", "f", b"x".to_vec()).unwrap();

        let listing: Vec<_> = fs
            .walk(&session, "/")
            .unwrap()
            .into_iter()
            .map(|(depth, e)| (depth, e.path))
            .collect();
        assert_eq!(
            listing,
            vec![
                (0, "/".to_string()),
                (1, "/a".to_string()),
                (2, "/a/b".to_string()),
                (2, "/a/f".to_string())
            ]
        );
    }

    #[test]
    fn test_stats_and_check() {
        let (mut fs, session) = fs(10);
        fs.mkdir(&session, "d").unwrap();
        fs.put(&session, "f", vec![0; 200]).unwrap();

        let stats = fs.stats();
        assert_eq!(stats.total_sectors, 10);
        assert_eq!(stats.used_sectors, 4);
        assert_eq!(stats.free_sectors, 6);
        assert_eq!(stats.files, 1);
        assert_eq!(stats.directories, 2);

        assert!(fs.check().unwrap().is_consistent());

        fs.rm(&session, "d", false).unwrap();
        fs.rm(&session, "f", false).unwrap();
        let stats = fs.stats();
        assert_eq!(stats.used_sectors, 0);
        assert_eq!(stats.files, 0);
        assert_eq!(stats.directories, 1);
    }

    #[test]
    fn test_put_collision_reported_before_capacity() {
        let (mut fs, session) = fs(2);
        fs.put(&session, "full", vec![0; 128]).unwrap();

        assert!(matches!(
            fs.put(&session, "full", vec![1; 64]),
            Err(FsError::AlreadyExists(_))
        ));
        assert!(matches!(
            fs.put(&session, "other", vec![1; 64]),
            Err(FsError::DiskFull { .. })
        ));
        assert_eq!(fs.get(&session, "full").unwrap(), vec![0; 128]);
    }

    #[test]
    fn test_builder() {
        let fs = FileSystemBuilder::new()
            .config(FsConfig::new(4))
            .sector_size(16)
            .build()
            .unwrap();
        assert_eq!(fs.config().total_sectors, 4);
        assert_eq!(fs.disk().sector_size(), 16);

        assert!(matches!(FileSystemBuilder::new().build(), Err(FsError::Config(_))));
        assert!(matches!(
            FileSystemBuilder::new().total_sectors(0).build(),
            Err(FsError::Config(_))
        ));
    }

    #[test]
    fn test_builder_rejects_oversized_disk() {
        assert!(matches!(
            FileSystemBuilder::new().total_sectors(u64::MAX).build(),
            Err(FsError::Config(_))
        ));
        assert!(matches!(
            FileSystemBuilder::new()
                .total_sectors(4)
                .sector_size(usize::MAX)
                .build(),
            Err(FsError::Config(_))
        ));
    }
}
