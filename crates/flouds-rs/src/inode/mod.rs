//! Per-node metadata records, dense and parallel to the tree nodes.

#[cfg(test)]
mod inode_tests;

use crate::alloc::Handle;
use crate::error::{FsError, FsResult};
use crate::ser::{self, Persist};

/// Serialized width of one record: handle, size, mode, three timestamps.
pub const INODE_RECORD_SIZE: usize = 44;

/// Metadata of one tree node. Record k belongs to tree node k and has no
/// lifetime of its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Inode {
    pub allocation_handle: Handle,
    pub size: u64,
    pub mode: u32,
    pub modification_time: i64,
    pub access_time: i64,
    pub creation_time: i64,
}

impl Inode {
    fn serialize_into(&self, buf: &mut [u8], offset: &mut usize) {
        ser::put_u64(buf, offset, self.allocation_handle);
        ser::put_u64(buf, offset, self.size);
        ser::put_u32(buf, offset, self.mode);
        ser::put_i64(buf, offset, self.modification_time);
        ser::put_i64(buf, offset, self.access_time);
        ser::put_i64(buf, offset, self.creation_time);
    }

    fn deserialize_from(buf: &[u8], offset: &mut usize) -> FsResult<Self> {
        Ok(Self {
            allocation_handle: ser::get_u64(buf, offset)?,
            size: ser::get_u64(buf, offset)?,
            mode: ser::get_u32(buf, offset)?,
            modification_time: ser::get_i64(buf, offset)?,
            access_time: ser::get_i64(buf, offset)?,
            creation_time: ser::get_i64(buf, offset)?,
        })
    }
}

/// Dense ordered sequence of inode records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InodeTable {
    inodes: Vec<Inode>,
}

impl InodeTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inodes.is_empty()
    }

    /// # Errors
    /// `OutOfRange` when `index >= len`.
    pub fn get(&self, index: usize) -> FsResult<&Inode> {
        self.inodes.get(index).ok_or(FsError::OutOfRange {
            index,
            len: self.inodes.len(),
        })
    }

    /// # Errors
    /// `OutOfRange` when `index >= len`.
    pub fn get_mut(&mut self, index: usize) -> FsResult<&mut Inode> {
        let len = self.inodes.len();
        self.inodes
            .get_mut(index)
            .ok_or(FsError::OutOfRange { index, len })
    }

    /// Inserts a zeroed record at `index`, shifting the tail right.
    ///
    /// # Errors
    /// `OutOfRange` when `index > len`.
    pub fn insert(&mut self, index: usize) -> FsResult<&mut Inode> {
        if index > self.inodes.len() {
            return Err(FsError::OutOfRange {
                index,
                len: self.inodes.len(),
            });
        }
        self.inodes.insert(index, Inode::default());
        Ok(&mut self.inodes[index])
    }

    /// # Errors
    /// `OutOfRange` when `index >= len`.
    pub fn remove(&mut self, index: usize) -> FsResult<()> {
        if index >= self.inodes.len() {
            return Err(FsError::OutOfRange {
                index,
                len: self.inodes.len(),
            });
        }
        self.inodes.remove(index);
        Ok(())
    }
}

impl Persist for InodeTable {
    fn serialized_size(&self) -> usize {
        ser::WORD + self.inodes.len() * INODE_RECORD_SIZE
    }

    fn serialize_into(&self, buf: &mut [u8], offset: &mut usize) {
        ser::put_u64(buf, offset, self.inodes.len() as u64);
        for inode in &self.inodes {
            inode.serialize_into(buf, offset);
        }
    }

    fn deserialize_from(buf: &[u8], offset: &mut usize) -> FsResult<Self> {
        let count = ser::get_u64(buf, offset)? as usize;
        // The records are fixed-width; a count the buffer cannot hold must
        // fail before any allocation happens.
        let remaining = buf.len() - *offset;
        if count
            .checked_mul(INODE_RECORD_SIZE)
            .map_or(true, |need| need > remaining)
        {
            return Err(FsError::Corrupt(format!(
                "inode table claims {count} records, buffer holds {remaining} bytes"
            )));
        }
        let mut inodes = Vec::with_capacity(count);
        for _ in 0..count {
            inodes.push(Inode::deserialize_from(buf, offset)?);
        }
        Ok(Self { inodes })
    }
}
