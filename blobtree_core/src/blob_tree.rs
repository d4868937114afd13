//! Directory-shaped trees of blobs.
//!
//! A [`BlobTreeNode`] mirrors one directory: its `nodes` are the
//! subdirectories and its `blobs` are the files. A [`BlobTree`] owns the
//! root node and maps whole directory trees to and from disk.
//!
//! Paths passed to `find_node`/`find_blob` always use `\` as the separator,
//! whatever the host platform.

use crate::blob::{Blob, BlobCollection};
use crate::error::{Error, Result};
use crate::fsio::{self, EntryKind, SaveOptions, WalkOptions};
use crate::hash::{DigestBuilder, EntryKind as DigestKind, Hash};
use crate::names;
use std::path::Path;
use tracing::{debug, instrument, warn};

/// Separator for node/blob lookup paths.
pub const PATH_SEPARATOR: char = '\\';

/// Ordered, mutable collection of sibling nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobTreeNodeCollection {
    nodes: Vec<BlobTreeNode>,
}

impl BlobTreeNodeCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BlobTreeNode> {
        self.nodes.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, BlobTreeNode> {
        self.nodes.iter_mut()
    }

    pub fn push(&mut self, node: BlobTreeNode) {
        self.nodes.push(node);
    }

    pub fn insert(&mut self, index: usize, node: BlobTreeNode) -> Result<()> {
        if index > self.nodes.len() {
            return Err(Error::index_out_of_range(index, self.nodes.len()));
        }
        self.nodes.insert(index, node);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<BlobTreeNode> {
        if index >= self.nodes.len() {
            return Err(Error::index_out_of_range(index, self.nodes.len()));
        }
        Ok(self.nodes.remove(index))
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn get(&self, index: usize) -> Option<&BlobTreeNode> {
        self.nodes.get(index)
    }

    /// Node at `index`.
    pub fn at(&self, index: usize) -> Result<&BlobTreeNode> {
        let len = self.nodes.len();
        self.nodes
            .get(index)
            .ok_or_else(|| Error::index_out_of_range(index, len))
    }

    pub fn at_mut(&mut self, index: usize) -> Result<&mut BlobTreeNode> {
        let len = self.nodes.len();
        self.nodes
            .get_mut(index)
            .ok_or_else(|| Error::index_out_of_range(index, len))
    }

    /// First node whose name matches.
    pub fn named(&self, name: &str, ignore_case: bool) -> Result<&BlobTreeNode> {
        self.find(name, ignore_case)
            .ok_or_else(|| Error::key_not_found(name))
    }

    pub fn named_mut(&mut self, name: &str, ignore_case: bool) -> Result<&mut BlobTreeNode> {
        self.find_mut(name, ignore_case)
            .ok_or_else(|| Error::key_not_found(name))
    }

    pub fn find(&self, name: &str, ignore_case: bool) -> Option<&BlobTreeNode> {
        self.nodes
            .iter()
            .find(|n| names::names_equal(&n.name, name, ignore_case))
    }

    pub fn find_mut(&mut self, name: &str, ignore_case: bool) -> Option<&mut BlobTreeNode> {
        self.nodes
            .iter_mut()
            .find(|n| names::names_equal(&n.name, name, ignore_case))
    }

    /// Total content size of every node, recursively.
    pub fn compute_size(&self) -> u64 {
        self.nodes.iter().map(BlobTreeNode::compute_size).sum()
    }
}

impl FromIterator<BlobTreeNode> for BlobTreeNodeCollection {
    fn from_iter<I: IntoIterator<Item = BlobTreeNode>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl Extend<BlobTreeNode> for BlobTreeNodeCollection {
    fn extend<I: IntoIterator<Item = BlobTreeNode>>(&mut self, iter: I) {
        self.nodes.extend(iter);
    }
}

impl IntoIterator for BlobTreeNodeCollection {
    type Item = BlobTreeNode;
    type IntoIter = std::vec::IntoIter<BlobTreeNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a BlobTreeNodeCollection {
    type Item = &'a BlobTreeNode;
    type IntoIter = std::slice::Iter<'a, BlobTreeNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

/// A named node holding sub-nodes and the blobs at this level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobTreeNode {
    /// Directory name of the node.
    pub name: String,
    /// Child nodes (subdirectories).
    pub nodes: BlobTreeNodeCollection,
    /// Blobs at this level (files).
    pub blobs: BlobCollection,
    /// Opaque user data, never written to disk.
    pub tag: Option<String>,
}

/// Split a lookup path into its segments after trimming outer separators.
fn path_segments(path: &str) -> Result<std::str::Split<'_, char>> {
    if path.is_empty() {
        return Err(Error::invalid_argument("lookup path is empty"));
    }
    Ok(path.trim_matches(PATH_SEPARATOR).split(PATH_SEPARATOR))
}

/// Split a lookup path into its directory part and final blob name.
fn split_blob_path(path: &str) -> Result<(Option<&str>, &str)> {
    if path.is_empty() {
        return Err(Error::invalid_argument("lookup path is empty"));
    }
    let trimmed = path.trim_matches(PATH_SEPARATOR);
    Ok(match trimmed.rsplit_once(PATH_SEPARATOR) {
        Some((dir, name)) => (Some(dir), name),
        None => (None, trimmed),
    })
}

impl BlobTreeNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Direct child node named `name`, if any.
    pub fn node(&self, name: &str, ignore_case: bool) -> Option<&BlobTreeNode> {
        self.nodes.find(name, ignore_case)
    }

    pub fn node_mut(&mut self, name: &str, ignore_case: bool) -> Option<&mut BlobTreeNode> {
        self.nodes.find_mut(name, ignore_case)
    }

    /// Blob at this level named `name`, if any.
    pub fn blob(&self, name: &str, ignore_case: bool) -> Option<&Blob> {
        self.blobs.find(name, ignore_case)
    }

    pub fn blob_mut(&mut self, name: &str, ignore_case: bool) -> Option<&mut Blob> {
        self.blobs.find_mut(name, ignore_case)
    }

    /// Resolve a `\`-separated path of node names relative to this node.
    ///
    /// Returns `Ok(None)` as soon as a segment does not resolve. An empty
    /// path is an error.
    pub fn find_node(&self, path: &str, ignore_case: bool) -> Result<Option<&BlobTreeNode>> {
        let mut current = self;
        for segment in path_segments(path)? {
            match current.node(segment, ignore_case) {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    pub fn find_node_mut(
        &mut self,
        path: &str,
        ignore_case: bool,
    ) -> Result<Option<&mut BlobTreeNode>> {
        let mut current = self;
        for segment in path_segments(path)? {
            match current.node_mut(segment, ignore_case) {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Resolve a `\`-separated path whose last segment names a blob.
    pub fn find_blob(&self, path: &str, ignore_case: bool) -> Result<Option<&Blob>> {
        let (dir, name) = split_blob_path(path)?;
        let owner = match dir {
            Some(dir) => match self.find_node(dir, ignore_case)? {
                Some(node) => node,
                None => return Ok(None),
            },
            None => self,
        };
        Ok(owner.blob(name, ignore_case))
    }

    pub fn find_blob_mut(&mut self, path: &str, ignore_case: bool) -> Result<Option<&mut Blob>> {
        let (dir, name) = split_blob_path(path)?;
        let owner = match dir {
            Some(dir) => match self.find_node_mut(dir, ignore_case)? {
                Some(node) => node,
                None => return Ok(None),
            },
            None => self,
        };
        Ok(owner.blob_mut(name, ignore_case))
    }

    /// Every blob below and at this node in one collection.
    ///
    /// Child nodes are flattened first, in order, and this node's own blobs
    /// come last.
    pub fn flatten(&self) -> BlobCollection {
        let mut out = BlobCollection::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(&self, out: &mut BlobCollection) {
        for node in &self.nodes {
            node.flatten_into(out);
        }
        out.extend(self.blobs.iter().cloned());
    }

    /// Total content size of this node and everything below it.
    pub fn compute_size(&self) -> u64 {
        self.nodes.compute_size() + self.blobs.compute_size()
    }

    /// Merkle digest of the contents below this node.
    ///
    /// The node's own name and all tags are excluded, so two nodes with the
    /// same files and subdirectories share a digest.
    pub fn digest(&self) -> Hash {
        let mut digest = DigestBuilder::new();
        for blob in &self.blobs {
            digest.push(&blob.name, DigestKind::Blob, blob.hash());
        }
        for node in &self.nodes {
            digest.push(&node.name, DigestKind::Node, node.digest());
        }
        digest.finish()
    }

    /// Check that every child node name and every blob name below this node
    /// can be written to disk, and that no level uses one name for both a
    /// blob and a node. This node's own name is not checked.
    pub fn validate_names(&self) -> Result<()> {
        self.blobs.validate_names()?;
        if let Some(blob) = self
            .blobs
            .iter()
            .find(|b| self.nodes.find(&b.name, false).is_some())
        {
            return Err(Error::invalid_operation(format!(
                "{:?} names both a blob and a node",
                blob.name
            )));
        }
        for node in &self.nodes {
            names::validate_file_name(&node.name)?;
            node.validate_names()?;
        }
        Ok(())
    }

    /// Write this node's blobs into `path` and each child node into a
    /// subdirectory of the same name.
    ///
    /// Every name in the subtree is validated before anything is written.
    pub fn save_to_directory(&self, path: impl AsRef<Path>) -> Result<()> {
        self.save_to_directory_with(path, &SaveOptions::default())
    }

    #[instrument(level = "debug", skip(self, path, opts), fields(dir = %path.as_ref().display()))]
    pub fn save_to_directory_with(&self, path: impl AsRef<Path>, opts: &SaveOptions) -> Result<()> {
        self.validate_names()?;
        self.write_tree(path.as_ref(), opts)
    }

    fn write_tree(&self, dir: &Path, opts: &SaveOptions) -> Result<()> {
        fsio::create_dir(dir)?;
        self.blobs.write_all(dir, opts)?;
        for node in &self.nodes {
            node.write_tree(&dir.join(&node.name), opts)?;
        }
        debug!(dir = %dir.display(), blobs = self.blobs.len(), nodes = self.nodes.len(), "wrote node");
        Ok(())
    }

    /// Mirror the directory at `path`: files become blobs, subdirectories
    /// become nodes. The node is named after the directory.
    pub fn from_directory(path: impl AsRef<Path>, opts: &WalkOptions) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        Self::read_tree(path, name, opts)
    }

    fn read_tree(dir: &Path, name: &str, opts: &WalkOptions) -> Result<Self> {
        let mut root = Self::new(name);
        // A single walk keeps ignore rules from `dir` in force at every depth.
        // Directories are visited before their contents, in name order.
        for entry in fsio::walk(dir, true, opts)? {
            let Ok(rel) = entry.path.strip_prefix(dir) else {
                continue;
            };
            let Some(owner) = root.parent_node_mut(rel) else {
                warn!(path = %entry.path.display(), "skipping entry without a parent node");
                continue;
            };

            match entry.kind {
                EntryKind::File => {
                    let content = fsio::read_file(&entry.path)?;
                    owner.blobs.push(Blob::new(entry.name, content));
                }
                EntryKind::Dir => owner.nodes.push(Self::new(entry.name)),
            }
        }
        Ok(root)
    }

    /// Node for the directory holding `rel`, a path relative to this node.
    fn parent_node_mut(&mut self, rel: &Path) -> Option<&mut BlobTreeNode> {
        let mut current = self;
        for component in rel.parent()?.components() {
            let name = component.as_os_str().to_str()?;
            current = current.node_mut(name, false)?;
        }
        Some(current)
    }
}

/// A tree of blobs with an always-present root node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobTree {
    root: BlobTreeNode,
}

impl BlobTree {
    /// An empty tree with an unnamed root.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_root(root: BlobTreeNode) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &BlobTreeNode {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut BlobTreeNode {
        &mut self.root
    }

    pub fn into_root(self) -> BlobTreeNode {
        self.root
    }

    /// Read a whole directory tree. The root is named after the last
    /// component of `path`.
    pub fn from_directory(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_directory_with(path, &WalkOptions::default())
    }

    #[instrument(level = "debug", skip(path, opts), fields(dir = %path.as_ref().display()))]
    pub fn from_directory_with(path: impl AsRef<Path>, opts: &WalkOptions) -> Result<Self> {
        let root = BlobTreeNode::from_directory(path, opts)?;
        debug!(bytes = root.compute_size(), "read tree");
        Ok(Self { root })
    }

    /// Write the tree under `path`: root blobs go directly into `path`,
    /// every node becomes a subdirectory.
    ///
    /// All names are validated before the first write.
    pub fn save_to_directory(&self, path: impl AsRef<Path>) -> Result<()> {
        self.root.save_to_directory(path)
    }

    pub fn save_to_directory_with(&self, path: impl AsRef<Path>, opts: &SaveOptions) -> Result<()> {
        self.root.save_to_directory_with(path, opts)
    }

    pub fn find_node(&self, path: &str, ignore_case: bool) -> Result<Option<&BlobTreeNode>> {
        self.root.find_node(path, ignore_case)
    }

    pub fn find_blob(&self, path: &str, ignore_case: bool) -> Result<Option<&Blob>> {
        self.root.find_blob(path, ignore_case)
    }

    pub fn flatten(&self) -> BlobCollection {
        self.root.flatten()
    }

    pub fn compute_size(&self) -> u64 {
        self.root.compute_size()
    }

    pub fn digest(&self) -> Hash {
        self.root.digest()
    }
}
