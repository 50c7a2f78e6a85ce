//! Node arena for the directory tree
//!
//! Nodes live in a map keyed by stable [`NodeId`] handles. A node's parent is a
//! handle and its children are an ordered list of handles, so the tree can be
//! walked and rewired without shared ownership. Handles are never reused: a
//! handle that outlives its node resolves to `NotFound` instead of aliasing a
//! newer node.
//!
//! Every mutation here checks its preconditions before touching the map, so a
//! failed call leaves the tree exactly as it was.

use crate::core::error::{FsError, Result};
use crate::core::validation::validate_name;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Handle to a node in the tree
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node kind, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    File,
    Directory,
}

/// A file or directory
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    name: String,
    /// Raw content, always empty for directories
    content: Vec<u8>,
    /// Sector ids holding `content`, in order
    sectors: Vec<u64>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Node {
    fn new(kind: NodeKind, name: String, parent: Option<NodeId>) -> Self {
        Node {
            kind,
            name,
            content: Vec::new(),
            sectors: Vec::new(),
            children: Vec::new(),
            parent,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn sectors(&self) -> &[u64] {
        &self.sectors
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    /// Content length in bytes
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// Replace content and its sector list together
    pub(crate) fn set_content(&mut self, content: Vec<u8>, sectors: Vec<u64>) {
        self.content = content;
        self.sectors = sectors;
    }

    pub(crate) fn sectors_mut(&mut self) -> &mut Vec<u64> {
        &mut self.sectors
    }
}

/// Rooted tree of nodes
#[derive(Debug, Clone)]
pub struct Tree {
    root: NodeId,
    nodes: BTreeMap<NodeId, Node>,
    next_id: u64,
}

impl Tree {
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = BTreeMap::new();
        nodes.insert(root, Node::new(NodeKind::Directory, "/".to_string(), None));

        Tree {
            root,
            nodes,
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Every live node, in handle order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes.iter().map(|(&id, node)| (id, node))
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(&id)
            .ok_or_else(|| FsError::NotFound(format!("node {} no longer exists", id)))
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(&id)
            .ok_or_else(|| FsError::NotFound(format!("node {} no longer exists", id)))
    }

    /// Look up a direct child by exact name
    pub fn child(&self, dir: NodeId, name: &str) -> Option<NodeId> {
        let node = self.nodes.get(&dir)?;
        node.children
            .iter()
            .copied()
            .find(|child| self.nodes.get(child).is_some_and(|c| c.name == name))
    }

    fn require_dir(&self, id: NodeId) -> Result<&Node> {
        let node = self.get(id)?;
        if !node.is_dir() {
            return Err(FsError::NotADirectory(self.path_of(id)?));
        }
        Ok(node)
    }

    /// Create an empty node under `parent`
    pub fn create_child(&mut self, parent: NodeId, name: &str, kind: NodeKind) -> Result<NodeId> {
        validate_name(name)?;
        self.require_dir(parent)?;

        if self.child(parent, name).is_some() {
            return Err(FsError::AlreadyExists(self.join(parent, name)?));
        }

        let id = self.allocate_id();
        self.nodes
            .insert(id, Node::new(kind, name.to_string(), Some(parent)));
        self.get_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// True if `ancestor` is `node` or lies on its parent chain
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|id| id == ancestor)
    }

    /// `node` followed by each of its ancestors up to the root
    pub fn ancestors(&self, node: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.contains(node).then_some(node),
        }
    }

    /// Re-parent and/or rename a node without touching its content
    pub fn relocate(&mut self, id: NodeId, new_parent: NodeId, new_name: &str) -> Result<()> {
        if id == self.root {
            return Err(FsError::InvalidOperation(
                "cannot move the root directory".to_string(),
            ));
        }
        validate_name(new_name)?;
        self.require_dir(new_parent)?;
        let old_parent = self.get(id)?.parent.ok_or_else(|| {
            FsError::InvalidOperation(format!("node {} has no parent", id))
        })?;

        if self.is_ancestor(id, new_parent) {
            return Err(FsError::InvalidOperation(format!(
                "cannot move '{}' into itself",
                self.path_of(id)?
            )));
        }

        if let Some(existing) = self.child(new_parent, new_name) {
            if existing != id {
                return Err(FsError::AlreadyExists(self.join(new_parent, new_name)?));
            }
        }

        if old_parent != new_parent {
            self.get_mut(old_parent)?.children.retain(|&child| child != id);
            self.get_mut(new_parent)?.children.push(id);
            self.get_mut(id)?.parent = Some(new_parent);
        }
        self.get_mut(id)?.name = new_name.to_string();
        Ok(())
    }

    /// Detach a subtree and drop its nodes
    ///
    /// Returns the removed nodes in pre-order so the caller can release their
    /// storage.
    pub fn remove_subtree(&mut self, id: NodeId) -> Result<Vec<Node>> {
        if id == self.root {
            return Err(FsError::InvalidOperation(
                "cannot remove the root directory".to_string(),
            ));
        }

        let order = self.preorder(id)?;
        if let Some(parent) = self.get(id)?.parent {
            self.get_mut(parent)?.children.retain(|&child| child != id);
        }

        Ok(order
            .into_iter()
            .filter_map(|node| self.nodes.remove(&node))
            .collect())
    }

    /// Every node of the subtree rooted at `id`, parents before children,
    /// siblings in child order
    pub fn preorder(&self, id: NodeId) -> Result<Vec<NodeId>> {
        Ok(self.walk(id)?.into_iter().map(|(node, _)| node).collect())
    }

    /// Pre-order walk yielding each node with its depth below `id`
    pub fn walk(&self, id: NodeId) -> Result<Vec<(NodeId, usize)>> {
        self.get(id)?;

        let mut order = Vec::new();
        let mut stack = vec![(id, 0usize)];
        while let Some((current, depth)) = stack.pop() {
            order.push((current, depth));
            let node = self.get(current)?;
            stack.extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
        }
        Ok(order)
    }

    /// Files of the subtree in depth-first child order
    pub fn files(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut files = Vec::new();
        for node in self.preorder(id)? {
            if self.get(node)?.is_file() {
                files.push(node);
            }
        }
        Ok(files)
    }

    /// Total sectors held by files in the subtree
    pub fn sector_count(&self, id: NodeId) -> Result<u64> {
        let mut total = 0;
        for file in self.files(id)? {
            total += self.get(file)?.sectors.len() as u64;
        }
        Ok(total)
    }

    /// Absolute path of a node
    pub fn path_of(&self, id: NodeId) -> Result<String> {
        self.get(id)?;
        if id == self.root {
            return Ok("/".to_string());
        }

        let mut parts: Vec<&str> = self
            .ancestors(id)
            .take_while(|&node| node != self.root)
            .filter_map(|node| self.nodes.get(&node).map(|n| n.name.as_str()))
            .collect();
        parts.reverse();

        Ok(format!("/{}", parts.join("/")))
    }

    fn join(&self, dir: NodeId, name: &str) -> Result<String> {
        let base = self.path_of(dir)?;
        if base == "/" {
            Ok(format!("/{}", name))
        } else {
            Ok(format!("{}/{}", base, name))
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a node and its ancestors
pub struct Ancestors<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.nodes.get(&current).and_then(|node| node.parent);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Tree, NodeId, NodeId, NodeId) {
        let mut tree = Tree::new();
        let root = tree.root();
        let docs = tree.create_child(root, "docs", NodeKind::Directory).unwrap();
        let notes = tree.create_child(docs, "notes.txt", NodeKind::File).unwrap();
        let src = tree.create_child(root, "src", NodeKind::Directory).unwrap();
        (tree, docs, notes, src)
    }

    #[test]
    fn test_root() {
        let tree = Tree::new();
        let root = tree.get(tree.root()).unwrap();
        assert!(root.is_dir());
        assert_eq!(root.name(), "/");
        assert_eq!(root.parent(), None);
        assert_eq!(tree.path_of(tree.root()).unwrap(), "/");
    }

    #[test]
    fn test_create_and_lookup() {
        let (tree, docs, notes, _) = sample();
        assert_eq!(tree.child(tree.root(), "docs"), Some(docs));
        assert_eq!(tree.child(docs, "notes.txt"), Some(notes));
        assert_eq!(tree.child(docs, "missing"), None);
        assert_eq!(tree.path_of(notes).unwrap(), "/docs/notes.txt");
        assert_eq!(tree.get(notes).unwrap().parent(), Some(docs));
    }

    #[test]
    fn test_create_rejects_duplicates_and_bad_names() {
        let (mut tree, docs, notes, _) = sample();

        assert!(matches!(
            tree.create_child(docs, "notes.txt", NodeKind::Directory),
            Err(FsError::AlreadyExists(_))
        ));
        assert!(matches!(
            tree.create_child(docs, "a b", NodeKind::File),
            Err(FsError::InvalidName(_))
        ));
        assert!(matches!(
            tree.create_child(notes, "inner", NodeKind::File),
            Err(FsError::NotADirectory(_))
        ));
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_relocate_rename_in_place() {
        let (mut tree, docs, notes, _) = sample();
        tree.relocate(notes, docs, "renamed.txt").unwrap();
        assert_eq!(tree.path_of(notes).unwrap(), "/docs/renamed.txt");

        // Same name, same parent is a no-op
        tree.relocate(notes, docs, "renamed.txt").unwrap();
        assert_eq!(tree.get(docs).unwrap().children(), &[notes]);
    }

    #[test]
    fn test_relocate_rejects_cycles() {
        let (mut tree, docs, _, _) = sample();
        let inner = tree.create_child(docs, "inner", NodeKind::Directory).unwrap();

        assert!(matches!(
            tree.relocate(docs, inner, "docs"),
            Err(FsError::InvalidOperation(_))
        ));
        assert!(matches!(
            tree.relocate(docs, docs, "again"),
            Err(FsError::InvalidOperation(_))
        ));
        assert!(matches!(
            tree.relocate(tree.root(), docs, "root"),
            Err(FsError::InvalidOperation(_))
        ));
        assert_eq!(tree.path_of(inner).unwrap(), "/docs/inner");
    }

    #[test]
    fn test_relocate_across_parents() {
        let (mut tree, docs, notes, src) = sample();
        tree.relocate(notes, src, "notes.txt").unwrap();

        assert!(tree.get(docs).unwrap().children().is_empty());
        assert_eq!(tree.get(src).unwrap().children(), &[notes]);
        assert_eq!(tree.path_of(notes).unwrap(), "/src/notes.txt");
    }

    #[test]
    fn test_remove_subtree() {
        let (mut tree, docs, notes, src) = sample();
        let removed = tree.remove_subtree(docs).unwrap();

        assert_eq!(removed.len(), 2);
        assert!(!tree.contains(docs));
        assert!(!tree.contains(notes));
        assert_eq!(tree.get(tree.root()).unwrap().children(), &[src]);
        assert!(matches!(tree.get(notes), Err(FsError::NotFound(_))));
    }

    #[test]
    fn test_walk_order() {
        let (mut tree, docs, notes, src) = sample();
        let main = tree.create_child(src, "main.rs", NodeKind::File).unwrap();
        let readme = tree.create_child(tree.root(), "README", NodeKind::File).unwrap();

        let root = tree.root();
        assert_eq!(
            tree.walk(root).unwrap(),
            vec![(root, 0), (docs, 1), (notes, 2), (src, 1), (main, 2), (readme, 1)]
        );
        assert_eq!(tree.files(root).unwrap(), vec![notes, main, readme]);
    }

    #[test]
    fn test_deep_tree_does_not_recurse() {
        let mut tree = Tree::new();
        let mut current = tree.root();
        for _ in 0..50_000 {
            current = tree.create_child(current, "d", NodeKind::Directory).unwrap();
        }

        assert_eq!(tree.preorder(tree.root()).unwrap().len(), 50_001);
        let top = tree.child(tree.root(), "d").unwrap();
        assert_eq!(tree.remove_subtree(top).unwrap().len(), 50_000);
        assert_eq!(tree.len(), 1);
    }
}
