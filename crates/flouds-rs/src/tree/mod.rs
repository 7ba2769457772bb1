//! The FLOUDS directory hierarchy.
//!
//! Three parallel sequences of equal length describe the whole tree:
//! `structure[i]` is 1 iff node i is the first child of its parent (the root
//! carries the mark of its phantom super-parent), `types[i]` is the node
//! kind, and `names[i]` the basename. Navigation reduces to rank/select on
//! the structure vector and the type wavelet tree.


use crate::bitvec::BitVector;
use crate::error::{FsError, FsResult};
use crate::names::NameSequence;
use crate::ser::Persist;
use crate::wavelet::WaveletTree;

pub const ROOT_NODE: usize = 0;
pub const ROOT_NAME: &str = "root";

/// Node kinds stored in the type wavelet tree. Symbol 3 is reserved.
const TYPE_FILE: u8 = 0;
const TYPE_FOLDER: u8 = 1;
const TYPE_EMPTY_FOLDER: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flouds<B, S> {
    structure: B,
    types: WaveletTree<B>,
    names: S,
}

impl<B: BitVector, S: NameSequence> Flouds<B, S> {
    /// A tree holding only the root, an empty folder named "root".
    ///
    /// # Errors
    /// Does not fail in practice; mutation errors propagate.
    pub fn new() -> FsResult<Self> {
        let mut structure = B::zeros(1);
        structure.set(0, true)?;
        let mut types = WaveletTree::new();
        types.insert(0, TYPE_EMPTY_FOLDER)?;
        let mut names = S::new();
        names.insert(0, ROOT_NAME)?;
        Ok(Self {
            structure,
            types,
            names,
        })
    }

    pub fn node_count(&self) -> usize {
        self.structure.len()
    }

    fn check_node(&self, node: usize) -> FsResult<()> {
        if node >= self.node_count() {
            return Err(FsError::OutOfRange {
                index: node,
                len: self.node_count(),
            });
        }
        Ok(())
    }

    /// # Errors
    /// `OutOfRange` when the node does not exist.
    pub fn is_folder(&self, node: usize) -> FsResult<bool> {
        let kind = self.types.access(node)?;
        Ok(kind == TYPE_FOLDER || kind == TYPE_EMPTY_FOLDER)
    }

    /// # Errors
    /// `OutOfRange` when the node does not exist.
    pub fn is_file(&self, node: usize) -> FsResult<bool> {
        Ok(self.types.access(node)? == TYPE_FILE)
    }

    /// # Errors
    /// `OutOfRange` when the node does not exist.
    pub fn is_empty_folder(&self, node: usize) -> FsResult<bool> {
        Ok(self.types.access(node)? == TYPE_EMPTY_FOLDER)
    }

    /// # Errors
    /// `OutOfRange` when the node does not exist.
    pub fn get_name(&self, node: usize) -> FsResult<String> {
        self.names.access(node)
    }

    /// Index of the parent node.
    ///
    /// # Errors
    /// `OutOfRange` when the node does not exist or is the root.
    pub fn parent(&self, node: usize) -> FsResult<usize> {
        self.check_node(node)?;
        if node == ROOT_NODE {
            return Err(FsError::OutOfRange {
                index: node,
                len: self.node_count(),
            });
        }
        // First-child marks at or before `node` include the root's own mark,
        // so the group containing `node` belongs to the (marks - 1)-th
        // non-empty folder.
        let marks = self.structure.rank1(node)?;
        self.types.select(TYPE_FOLDER, marks - 1)
    }

    /// 1-based index of `node` among non-empty folders. Only meaningful when
    /// `types[node] == TYPE_FOLDER`.
    fn folder_index(&self, node: usize) -> FsResult<usize> {
        self.types.rank(TYPE_FOLDER, node)
    }

    /// # Errors
    /// `OutOfRange` when the node does not exist, `WrongKind` when it is a
    /// file.
    pub fn children_count(&self, node: usize) -> FsResult<usize> {
        if !self.is_folder(node)? {
            return Err(FsError::WrongKind);
        }
        if self.is_empty_folder(node)? {
            return Ok(0);
        }
        let fi = self.folder_index(node)?;
        let start = self.structure.select1(fi + 1)?;
        let end = match self.structure.select1(fi + 2) {
            Ok(position) => position,
            Err(FsError::OutOfRange { .. }) => self.structure.len(),
            Err(other) => return Err(other),
        };
        Ok(end - start)
    }

    /// Index of the k-th (0-based) child of `node`.
    ///
    /// # Errors
    /// `WrongKind` when `node` is a file, `OutOfRange` when `k` exceeds the
    /// child count.
    pub fn child(&self, node: usize, k: usize) -> FsResult<usize> {
        let count = self.children_count(node)?;
        if k >= count {
            return Err(FsError::OutOfRange {
                index: k,
                len: count,
            });
        }
        let fi = self.folder_index(node)?;
        Ok(self.structure.select1(fi + 1)? + k)
    }

    /// Inserts a new last child of `parent` and returns its index.
    ///
    /// # Errors
    /// `OutOfRange` when `parent` does not exist, `WrongKind` when it is a
    /// file.
    pub fn insert(&mut self, parent: usize, name: &str, is_folder: bool) -> FsResult<usize> {
        if !self.is_folder(parent)? {
            return Err(FsError::WrongKind);
        }
        let was_empty = self.is_empty_folder(parent)?;
        let existing = if was_empty {
            0
        } else {
            self.children_count(parent)?
        };
        if was_empty {
            self.types.set(parent, TYPE_FOLDER)?;
        }
        // A parent that just became non-empty has no children group yet; the
        // next folder's group start (or the end of the sequence) is exactly
        // where its first child belongs.
        let fi = self.folder_index(parent)?;
        let start = match self.structure.select1(fi + 1) {
            Ok(position) => position,
            Err(FsError::OutOfRange { .. }) => self.structure.len(),
            Err(other) => return Err(other),
        };
        let position = start + existing;
        self.structure.insert(position, was_empty)?;
        self.names.insert(position, name)?;
        self.types.insert(
            position,
            if is_folder { TYPE_EMPTY_FOLDER } else { TYPE_FILE },
        )?;
        Ok(position)
    }

    /// Removes a leaf node (a file or an empty folder).
    ///
    /// # Errors
    /// `WrongKind` for the root, `NotEmpty` for a folder with children,
    /// `OutOfRange` when the node does not exist.
    pub fn remove(&mut self, node: usize) -> FsResult<()> {
        self.check_node(node)?;
        if node == ROOT_NODE {
            return Err(FsError::WrongKind);
        }
        if self.is_folder(node)? && !self.is_empty_folder(node)? {
            return Err(FsError::NotEmpty);
        }
        let parent = self.parent(node)?;
        let siblings = self.children_count(parent)?;
        let was_first = self.structure.access(node)?;
        self.structure.remove(node)?;
        self.types.remove(node)?;
        self.names.remove(node)?;
        if siblings == 1 {
            self.types.set(parent, TYPE_EMPTY_FOLDER)?;
        } else if was_first {
            // The next sibling slid into `node` and inherits the mark.
            self.structure.set(node, true)?;
        }
        Ok(())
    }

    /// Resolves a "/"-separated path relative to the root. Empty components
    /// are skipped, so "/a//b" and "a/b" resolve alike.
    ///
    /// # Errors
    /// `NotFound` when a component is absent, `WrongKind` when a non-final
    /// component is a file.
    pub fn resolve_path(&self, path: &str) -> FsResult<usize> {
        let mut node = ROOT_NODE;
        for component in path.split('/').filter(|c| !c.is_empty()) {
            node = self.lookup_child(node, component)?;
        }
        Ok(node)
    }

    /// First child of `node` named `name`, in child order.
    ///
    /// # Errors
    /// `NotFound` when no child matches, `WrongKind` when `node` is a file.
    pub fn lookup_child(&self, node: usize, name: &str) -> FsResult<usize> {
        for k in 0..self.children_count(node)? {
            let candidate = self.child(node, k)?;
            if self.names.access(candidate)? == name {
                return Ok(candidate);
            }
        }
        Err(FsError::NotFound(name.to_string()))
    }
}

impl<B: BitVector, S: NameSequence> Persist for Flouds<B, S> {
    fn serialized_size(&self) -> usize {
        self.structure.serialized_size()
            + self.types.serialized_size()
            + self.names.serialized_size()
    }

    fn serialize_into(&self, buf: &mut [u8], offset: &mut usize) {
        self.structure.serialize_into(buf, offset);
        self.types.serialize_into(buf, offset);
        self.names.serialize_into(buf, offset);
    }

    fn deserialize_from(buf: &[u8], offset: &mut usize) -> FsResult<Self> {
        let structure = B::deserialize_from(buf, offset)?;
        let types = WaveletTree::deserialize_from(buf, offset)?;
        let names = S::deserialize_from(buf, offset)?;
        if types.len() != structure.len() || names.len() != structure.len() {
            return Err(FsError::Corrupt(format!(
                "tree sequences disagree: {} structure bits, {} types, {} names",
                structure.len(),
                types.len(),
                names.len()
            )));
        }
        Ok(Self {
            structure,
            types,
            names,
        })
    }
}
