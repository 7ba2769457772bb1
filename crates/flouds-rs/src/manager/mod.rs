//! The filesystem manager: binds the block device, allocator, FLOUDS tree
//! and inode table, and owns the on-disk header in block 0.

#[cfg(test)]
mod manager_tests;

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use crate::alloc::{Allocator, AppendAllocator, Handle};
use crate::bitvec::{BitVector, WordBitVector};
use crate::device::BlockDevice;
use crate::error::{FsError, FsResult};
use crate::inode::{Inode, InodeTable};
use crate::names::{ConcatNames, NameSequence};
use crate::ser::{self, Persist};
use crate::tree::{Flouds, ROOT_NODE};

pub const MAGIC: [u8; 6] = *b"FLOUDS";
/// Magic, two bytes of padding, then six little-endian words.
pub const HEADER_SIZE: usize = 56;

const ROOT_MODE: u32 = 0o755;

/// Block-0 header: handle/size pairs for the three serialized components.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub allocator_handle: Handle,
    pub allocator_size: u64,
    pub flouds_handle: Handle,
    pub flouds_size: u64,
    pub inode_handle: Handle,
    pub inode_size: u64,
}

impl Header {
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..6].copy_from_slice(&MAGIC);
        let mut offset = 8;
        ser::put_u64(&mut buf, &mut offset, self.allocator_handle);
        ser::put_u64(&mut buf, &mut offset, self.allocator_size);
        ser::put_u64(&mut buf, &mut offset, self.flouds_handle);
        ser::put_u64(&mut buf, &mut offset, self.flouds_size);
        ser::put_u64(&mut buf, &mut offset, self.inode_handle);
        ser::put_u64(&mut buf, &mut offset, self.inode_size);
        buf
    }

    /// Returns `None` when the buffer is short or the magic is absent.
    #[must_use]
    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_SIZE {
            return None;
        }
        if buf[0..6] != MAGIC {
            return None;
        }
        let mut offset = 8;
        Some(Self {
            allocator_handle: ser::get_u64(buf, &mut offset).ok()?,
            allocator_size: ser::get_u64(buf, &mut offset).ok()?,
            flouds_handle: ser::get_u64(buf, &mut offset).ok()?,
            flouds_size: ser::get_u64(buf, &mut offset).ok()?,
            inode_handle: ser::get_u64(buf, &mut offset).ok()?,
            inode_size: ser::get_u64(buf, &mut offset).ok()?,
        })
    }
}

/// The production wiring: word-packed bit vectors, concatenated names,
/// append allocation.
pub type DefaultManager = FsManager<WordBitVector, ConcatNames<WordBitVector>, AppendAllocator>;

pub struct FsManager<B: BitVector, S: NameSequence, A: Allocator> {
    device: BlockDevice,
    allocator: A,
    flouds: Flouds<B, S>,
    inodes: InodeTable,
    header: Header,
}

impl<B: BitVector, S: NameSequence, A: Allocator> FsManager<B, S, A> {
    /// Opens `path` as the backing image. A missing magic formats a fresh
    /// filesystem (one root folder) and saves it; otherwise the recorded
    /// allocator, tree and inode table are loaded.
    ///
    /// # Errors
    /// I/O errors from the device; `Corrupt` when the magic is present but
    /// the recorded structures do not decode consistently.
    pub fn mount(path: &Path) -> FsResult<Self> {
        let device = BlockDevice::open(path)?;
        let mut block = vec![0u8; device.block_size()];
        device.read_block(0, &mut block)?;

        if let Some(header) = Header::parse(&block) {
            let fs = Self::load(device, header)?;
            info!(path = %path.display(), nodes = fs.flouds.node_count(), "filesystem loaded");
            return Ok(fs);
        }

        info!(path = %path.display(), "no filesystem magic, formatting");
        let mut fs = Self {
            device,
            allocator: A::default(),
            flouds: Flouds::new()?,
            inodes: InodeTable::new(),
            header: Header::default(),
        };
        let now = unix_now();
        let root = fs.inodes.insert(ROOT_NODE)?;
        root.mode = ROOT_MODE;
        root.creation_time = now;
        root.modification_time = now;
        root.access_time = now;
        fs.save()?;
        Ok(fs)
    }

    fn load(device: BlockDevice, header: Header) -> FsResult<Self> {
        // Reading is pure block arithmetic, so a default-state allocator can
        // fetch its own serialized bytes.
        let probe = A::default();
        let mut buf = vec![0u8; header.allocator_size as usize];
        probe.read(&device, header.allocator_handle, 0, &mut buf)?;
        let allocator = A::from_bytes(&buf)?;

        let mut buf = vec![0u8; header.flouds_size as usize];
        allocator.read(&device, header.flouds_handle, 0, &mut buf)?;
        let flouds = Flouds::from_bytes(&buf)?;

        let mut buf = vec![0u8; header.inode_size as usize];
        allocator.read(&device, header.inode_handle, 0, &mut buf)?;
        let inodes = InodeTable::from_bytes(&buf)?;

        if inodes.len() != flouds.node_count() {
            return Err(FsError::Corrupt(format!(
                "inode table holds {} records for {} tree nodes",
                inodes.len(),
                flouds.node_count()
            )));
        }
        Ok(Self {
            device,
            allocator,
            flouds,
            inodes,
            header,
        })
    }

    /// Persists the tree, the inode table and the allocator, then rewrites
    /// block 0.
    ///
    /// # Errors
    /// I/O errors from the device.
    pub fn save(&mut self) -> FsResult<()> {
        let flouds_size = self.flouds.serialized_size() as u64;
        let flouds_handle = self.place(
            self.header.flouds_handle,
            self.header.flouds_size,
            flouds_size,
        );
        let buf = self.flouds.to_bytes();
        self.allocator.write(&mut self.device, flouds_handle, 0, &buf)?;

        let inode_size = self.inodes.serialized_size() as u64;
        let inode_handle = self.place(
            self.header.inode_handle,
            self.header.inode_size,
            inode_size,
        );
        let buf = self.inodes.to_bytes();
        self.allocator.write(&mut self.device, inode_handle, 0, &buf)?;

        // The allocator stores itself, so reserving its own range can change
        // its serialized size; re-measure until it settles.
        let mut allocator_size = self.allocator.serialized_size() as u64;
        let mut allocator_handle = self.place(
            self.header.allocator_handle,
            self.header.allocator_size,
            allocator_size,
        );
        loop {
            let measured = self.allocator.serialized_size() as u64;
            if measured == allocator_size {
                break;
            }
            allocator_handle =
                self.allocator
                    .resize(&self.device, allocator_handle, allocator_size, measured);
            allocator_size = measured;
        }
        let buf = self.allocator.to_bytes();
        self.allocator
            .write(&mut self.device, allocator_handle, 0, &buf)?;

        self.header = Header {
            allocator_handle,
            allocator_size,
            flouds_handle,
            flouds_size,
            inode_handle,
            inode_size,
        };
        let mut block = vec![0u8; self.device.block_size()];
        block[..HEADER_SIZE].copy_from_slice(&self.header.to_bytes());
        self.device.write_block(0, &block)?;
        self.device.flush()?;
        debug!(nodes = self.flouds.node_count(), "state saved");
        Ok(())
    }

    fn place(&mut self, handle: Handle, old_size: u64, new_size: u64) -> Handle {
        if handle == 0 {
            self.allocator.allocate(&self.device, new_size)
        } else {
            self.allocator
                .resize(&self.device, handle, old_size, new_size)
        }
    }

    /// Saves and releases the image.
    ///
    /// # Errors
    /// I/O errors from the final save.
    pub fn unmount(mut self) -> FsResult<()> {
        self.save()?;
        Ok(())
    }

    #[must_use]
    pub fn tree(&self) -> &Flouds<B, S> {
        &self.flouds
    }

    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.flouds.node_count()
    }

    #[must_use]
    pub fn block_size(&self) -> usize {
        self.device.block_size()
    }

    /// Creates a node under `parent` and its zeroed inode, stamped with the
    /// current time.
    ///
    /// # Errors
    /// `WrongKind` when `parent` is a file, `OutOfRange` when it does not
    /// exist.
    pub fn add_node(
        &mut self,
        parent: usize,
        name: &str,
        is_folder: bool,
        mode: u32,
    ) -> FsResult<usize> {
        let node = self.flouds.insert(parent, name, is_folder)?;
        let now = unix_now();
        let inode = self.inodes.insert(node)?;
        inode.mode = mode;
        inode.creation_time = now;
        inode.modification_time = now;
        inode.access_time = now;
        Ok(node)
    }

    /// Removes a leaf node and its inode.
    ///
    /// # Errors
    /// `WrongKind` for the root, `NotEmpty` for a non-empty folder,
    /// `OutOfRange` when the node does not exist.
    pub fn remove_node(&mut self, node: usize) -> FsResult<()> {
        self.flouds.remove(node)?;
        self.inodes.remove(node)?;
        Ok(())
    }

    /// Reads up to `buf.len()` bytes from `offset`; returns the byte count.
    /// Reads past the end return zero bytes, reads across it are truncated.
    ///
    /// # Errors
    /// `WrongKind` when the node is not a file.
    pub fn read_file(&mut self, node: usize, offset: u64, buf: &mut [u8]) -> FsResult<usize> {
        if !self.flouds.is_file(node)? {
            return Err(FsError::WrongKind);
        }
        let inode = *self.inodes.get(node)?;
        if offset >= inode.size {
            return Ok(0);
        }
        let len = usize::try_from(inode.size - offset)
            .unwrap_or(usize::MAX)
            .min(buf.len());
        self.allocator
            .read(&self.device, inode.allocation_handle, offset, &mut buf[..len])?;
        self.inodes.get_mut(node)?.access_time = unix_now();
        Ok(len)
    }

    /// Writes `data` at `offset` and touches mtime. The range must lie
    /// within the current file size; callers grow via [`Self::set_file_size`]
    /// first.
    ///
    /// # Errors
    /// `WrongKind` when the node is not a file, `OutOfRange` when the write
    /// would pass the end.
    pub fn write_file(&mut self, node: usize, offset: u64, data: &[u8]) -> FsResult<usize> {
        if !self.flouds.is_file(node)? {
            return Err(FsError::WrongKind);
        }
        let inode = *self.inodes.get(node)?;
        let end = offset.saturating_add(data.len() as u64);
        if end > inode.size {
            return Err(FsError::OutOfRange {
                index: usize::try_from(end).unwrap_or(usize::MAX),
                len: usize::try_from(inode.size).unwrap_or(usize::MAX),
            });
        }
        self.allocator
            .write(&mut self.device, inode.allocation_handle, offset, data)?;
        self.inodes.get_mut(node)?.modification_time = unix_now();
        Ok(data.len())
    }

    /// Grows or shrinks a file, reallocating and carrying the old contents
    /// over when the range moves.
    ///
    /// # Errors
    /// `WrongKind` when the node is not a file.
    pub fn set_file_size(&mut self, node: usize, size: u64) -> FsResult<()> {
        if !self.flouds.is_file(node)? {
            return Err(FsError::WrongKind);
        }
        let inode = *self.inodes.get(node)?;
        let handle = self.allocator.resize(
            &self.device,
            inode.allocation_handle,
            inode.size,
            size,
        );
        if handle != inode.allocation_handle && inode.size > 0 {
            let keep = usize::try_from(inode.size.min(size)).unwrap_or(usize::MAX);
            if keep > 0 {
                let mut carry = vec![0u8; keep];
                self.allocator
                    .read(&self.device, inode.allocation_handle, 0, &mut carry)?;
                self.allocator.write(&mut self.device, handle, 0, &carry)?;
            }
        }
        let record = self.inodes.get_mut(node)?;
        record.allocation_handle = handle;
        record.size = size;
        record.modification_time = unix_now();
        Ok(())
    }

    /// # Errors
    /// `OutOfRange` when the node does not exist.
    pub fn inode(&self, node: usize) -> FsResult<&Inode> {
        self.inodes.get(node)
    }

    /// # Errors
    /// `OutOfRange` when the node does not exist.
    pub fn inode_mut(&mut self, node: usize) -> FsResult<&mut Inode> {
        self.inodes.get_mut(node)
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
