//! Dynamic four-symbol sequences as a two-level wavelet tree.


use crate::bitvec::BitVector;
use crate::error::{FsError, FsResult};
use crate::ser::Persist;

/// A sequence over the alphabet {0, 1, 2, 3} on three bit vectors.
///
/// `root` stores the high bit of every symbol; `left` and `right` store the
/// low bit of the symbols routed to their half, in routed order. The child
/// lengths always sum to the root length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveletTree<B> {
    root: B,
    left: B,
    right: B,
}

impl<B: BitVector> WaveletTree<B> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: B::zeros(0),
            left: B::zeros(0),
            right: B::zeros(0),
        }
    }

    /// Builds a tree holding `data` in order.
    ///
    /// # Errors
    /// `OutOfRange` when a symbol exceeds 3.
    pub fn from_symbols(data: &[u8]) -> FsResult<Self> {
        let mut tree = Self::new();
        for (i, &symbol) in data.iter().enumerate() {
            tree.insert(i, symbol)?;
        }
        Ok(tree)
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    fn check_symbol(&self, symbol: u8) -> FsResult<()> {
        if symbol > 3 {
            return Err(FsError::OutOfRange {
                index: symbol as usize,
                len: 4,
            });
        }
        Ok(())
    }

    /// # Errors
    /// `OutOfRange` when `index >= len`.
    pub fn access(&self, index: usize) -> FsResult<u8> {
        if self.root.access(index)? {
            let j = self.root.rank1(index)? - 1;
            Ok(if self.right.access(j)? { 3 } else { 2 })
        } else {
            let j = self.root.rank0(index)? - 1;
            Ok(if self.left.access(j)? { 1 } else { 0 })
        }
    }

    /// Occurrences of `symbol` in positions `[0, index]`.
    ///
    /// # Errors
    /// `OutOfRange` when `index >= len` or `symbol > 3`.
    pub fn rank(&self, symbol: u8, index: usize) -> FsResult<usize> {
        self.check_symbol(symbol)?;
        let low = symbol & 1 == 1;
        let (child, routed) = if symbol < 2 {
            (&self.left, self.root.rank0(index)?)
        } else {
            (&self.right, self.root.rank1(index)?)
        };
        if routed == 0 {
            return Ok(0);
        }
        if low {
            child.rank1(routed - 1)
        } else {
            child.rank0(routed - 1)
        }
    }

    /// Position of the n-th (1-based) occurrence of `symbol`.
    ///
    /// # Errors
    /// `OutOfRange` when `n` is zero or exceeds the occurrence count, or
    /// `symbol > 3`.
    pub fn select(&self, symbol: u8, n: usize) -> FsResult<usize> {
        self.check_symbol(symbol)?;
        let low = symbol & 1 == 1;
        if symbol < 2 {
            let j = if low {
                self.left.select1(n)?
            } else {
                self.left.select0(n)?
            };
            self.root.select0(j + 1)
        } else {
            let j = if low {
                self.right.select1(n)?
            } else {
                self.right.select0(n)?
            };
            self.root.select1(j + 1)
        }
    }

    /// Inserts `symbol` at `index`. Only the child of the chosen half grows.
    ///
    /// # Errors
    /// `OutOfRange` when `index > len` or `symbol > 3`.
    pub fn insert(&mut self, index: usize, symbol: u8) -> FsResult<()> {
        self.check_symbol(symbol)?;
        if index > self.len() {
            return Err(FsError::OutOfRange {
                index,
                len: self.len(),
            });
        }
        let child_pos = if index == 0 {
            0
        } else if symbol < 2 {
            self.root.rank0(index - 1)?
        } else {
            self.root.rank1(index - 1)?
        };
        self.root.insert(index, symbol >= 2)?;
        if symbol < 2 {
            self.left.insert(child_pos, symbol & 1 == 1)?;
        } else {
            self.right.insert(child_pos, symbol & 1 == 1)?;
        }
        Ok(())
    }

    /// # Errors
    /// `OutOfRange` when `index >= len`.
    pub fn remove(&mut self, index: usize) -> FsResult<()> {
        let high = self.root.access(index)?;
        let child_pos = if high {
            self.root.rank1(index)? - 1
        } else {
            self.root.rank0(index)? - 1
        };
        self.root.remove(index)?;
        if high {
            self.right.remove(child_pos)
        } else {
            self.left.remove(child_pos)
        }
    }

    /// Overwrites the symbol at `index`. When the new symbol stays in the
    /// same half only the child's low bit changes; otherwise the position is
    /// removed and reinserted.
    ///
    /// # Errors
    /// `OutOfRange` when `index >= len` or `symbol > 3`.
    pub fn set(&mut self, index: usize, symbol: u8) -> FsResult<()> {
        self.check_symbol(symbol)?;
        let current = self.access(index)?;
        if current == symbol {
            return Ok(());
        }
        if (current >= 2) == (symbol >= 2) {
            if symbol >= 2 {
                let j = self.root.rank1(index)? - 1;
                self.right.set(j, symbol & 1 == 1)
            } else {
                let j = self.root.rank0(index)? - 1;
                self.left.set(j, symbol & 1 == 1)
            }
        } else {
            self.remove(index)?;
            self.insert(index, symbol)
        }
    }
}

impl<B: BitVector> Default for WaveletTree<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: BitVector> Persist for WaveletTree<B> {
    fn serialized_size(&self) -> usize {
        self.root.serialized_size() + self.left.serialized_size() + self.right.serialized_size()
    }

    fn serialize_into(&self, buf: &mut [u8], offset: &mut usize) {
        self.root.serialize_into(buf, offset);
        self.left.serialize_into(buf, offset);
        self.right.serialize_into(buf, offset);
    }

    fn deserialize_from(buf: &[u8], offset: &mut usize) -> FsResult<Self> {
        let root = B::deserialize_from(buf, offset)?;
        let left = B::deserialize_from(buf, offset)?;
        let right = B::deserialize_from(buf, offset)?;
        if left.len() + right.len() != root.len() {
            return Err(FsError::Corrupt(format!(
                "wavelet child lengths {} + {} do not cover root length {}",
                left.len(),
                right.len(),
                root.len()
            )));
        }
        Ok(Self { root, left, right })
    }
}
