//! Tree Indexer - Structural paths for virtual nodes.
//!
//! Every node reachable from the root gets exactly one [`Path`]: the sequence
//! of child indices leading to it, starting with `0` for the root itself.
//!
//! ```text
//! div              0
//! ├── span         0.0
//! │   └── "hi"     0.0.0
//! └── Counter      0.1
//! ```
//!
//! Two trees rendered from the same shape get the same paths. That is what
//! lets the differ correlate "the same position" across renders without keys.
//! Paths are recomputed for every tree; trees are never patched in place.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use smallvec::SmallVec;

use super::VirtualNode;

// =============================================================================
// Path
// =============================================================================

/// Positional address of a node within a tree.
///
/// Ordering is lexicographic over segments, which is exactly pre-order
/// (document order) of the tree.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(SmallVec<[usize; 8]>);

impl Path {
    /// Path of a tree root (`"0"`).
    pub fn root() -> Self {
        let mut segments = SmallVec::new();
        segments.push(0);
        Self(segments)
    }

    /// Path of the `index`-th child of this node.
    pub fn child(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(index);
        Self(segments)
    }

    /// Path of the parent node, `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.0.len() <= 1 {
            return None;
        }
        let mut segments = self.0.clone();
        segments.pop();
        Some(Self(segments))
    }

    /// True if `self` equals `ancestor` or lies in its subtree.
    ///
    /// Compares whole segments, so `0.10` is not within `0.1`.
    pub fn is_within(&self, ancestor: &Path) -> bool {
        self.0.starts_with(&ancestor.0)
    }

    /// Child indices below the root segment.
    pub fn indices(&self) -> &[usize] {
        self.0.get(1..).unwrap_or(&[])
    }

    /// Number of segments (root = 1).
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({self})")
    }
}

/// Error parsing a dotted path string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid path segment {0:?}")]
pub struct ParsePathError(String);

impl FromStr for Path {
    type Err = ParsePathError;

    /// Parses `"0.1.2"`. The empty string is accepted as the root.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        let segments = s
            .split('.')
            .map(|seg| seg.parse::<usize>().map_err(|_| ParsePathError(seg.to_string())))
            .collect::<Result<SmallVec<[usize; 8]>, _>>()?;
        if segments.first() != Some(&0) {
            return Err(ParsePathError(s.to_string()));
        }
        Ok(Self(segments))
    }
}

// =============================================================================
// Tree
// =============================================================================

/// An immutable virtual tree plus its path index.
///
/// The root is reference-counted so a tree can be held by an entity and by
/// an in-progress diff at the same time without copying nodes.
#[derive(Clone)]
pub struct Tree {
    root: Rc<VirtualNode>,
    /// All paths in pre-order. Pre-order is also sorted order.
    paths: Vec<Path>,
}

impl Tree {
    /// Index a rendered node.
    pub fn new(root: VirtualNode) -> Self {
        let mut paths = Vec::new();
        index(&root, Path::root(), &mut paths);
        Self {
            root: Rc::new(root),
            paths,
        }
    }

    /// Index a render result, substituting the empty placeholder for `None`.
    pub fn from_render(rendered: Option<VirtualNode>) -> Self {
        Self::new(rendered.unwrap_or_else(super::placeholder))
    }

    /// The root node.
    pub fn root(&self) -> &VirtualNode {
        &self.root
    }

    pub(crate) fn shared_root(&self) -> Rc<VirtualNode> {
        Rc::clone(&self.root)
    }

    /// Every path in the tree, in document order.
    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.binary_search(path).is_ok()
    }

    /// Look up the node at `path`.
    pub fn get_node(&self, path: &Path) -> Option<&VirtualNode> {
        if path.0.first() != Some(&0) {
            return None;
        }
        let mut node: &VirtualNode = &self.root;
        for &index in path.indices() {
            node = match node {
                VirtualNode::Element(el) => el.children.get(index)?,
                _ => return None,
            };
        }
        Some(node)
    }

    /// Find the path of a node by identity.
    ///
    /// Only nodes that are part of this tree (not structurally equal copies)
    /// resolve.
    pub fn get_path(&self, node: &VirtualNode) -> Option<Path> {
        self.paths.iter().find_map(|path| {
            let candidate = self.get_node(path)?;
            std::ptr::eq(candidate, node).then(|| path.clone())
        })
    }

    /// Visit every node with its path, in document order.
    pub fn walk<F>(&self, mut visit: F)
    where
        F: FnMut(&Path, &VirtualNode),
    {
        walk_node(&self.root, &Path::root(), &mut visit);
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("root", &self.root)
            .field("nodes", &self.paths.len())
            .finish()
    }
}

fn index(node: &VirtualNode, path: Path, out: &mut Vec<Path>) {
    if let VirtualNode::Element(el) = node {
        out.push(path.clone());
        for (i, child) in el.children.iter().enumerate() {
            index(child, path.child(i), out);
        }
    } else {
        out.push(path);
    }
}

fn walk_node<F>(node: &VirtualNode, path: &Path, visit: &mut F)
where
    F: FnMut(&Path, &VirtualNode),
{
    visit(path, node);
    if let VirtualNode::Element(el) = node {
        for (i, child) in el.children.iter().enumerate() {
            walk_node(child, &path.child(i), visit);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
