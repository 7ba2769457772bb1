//! The image file as a fixed-block-size device.


use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use memmap2::{MmapMut, MmapOptions};

use crate::error::{FsError, FsResult};

pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Random-access block I/O over a host image file.
///
/// The file is created if missing and padded to at least one block. It grows
/// (set_len + remap) when a block past the current end is written and is
/// never shrunk. Reads past the end yield zeros.
pub struct BlockDevice {
    path: PathBuf,
    file: File,
    map: MmapMut,
    len: u64,
    block_size: usize,
}

impl BlockDevice {
    /// # Errors
    /// Returns an error if the image cannot be created/opened or mapped.
    pub fn open(path: &Path) -> FsResult<Self> {
        Self::open_with_block_size(path, DEFAULT_BLOCK_SIZE)
    }

    /// # Errors
    /// Returns an error if the image cannot be created/opened or mapped.
    pub fn open_with_block_size(path: &Path, block_size: usize) -> FsResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let existing = file.metadata()?.len();
        // Pad to at least one block and round up to a whole number of blocks.
        let len = existing
            .max(block_size as u64)
            .div_ceil(block_size as u64)
            * block_size as u64;
        if len != existing {
            file.set_len(len)?;
        }
        let map = map_file(&file, len)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            map,
            len,
            block_size,
        })
    }

    #[must_use]
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    #[must_use]
    pub const fn block_count(&self) -> u64 {
        self.len / self.block_size as u64
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn check_buffer(&self, len: usize) -> FsResult<()> {
        if len != self.block_size {
            return Err(FsError::OutOfRange {
                index: len,
                len: self.block_size,
            });
        }
        Ok(())
    }

    fn byte_offset(&self, index: u64) -> FsResult<u64> {
        index.checked_mul(self.block_size as u64).ok_or_else(|| {
            FsError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("block index {index} exceeds addressable size"),
            ))
        })
    }

    /// Reads block `index` into `buf`; blocks past the end read as zeros.
    ///
    /// # Errors
    /// `OutOfRange` when `buf` is not exactly one block.
    pub fn read_block(&self, index: u64, buf: &mut [u8]) -> FsResult<()> {
        self.check_buffer(buf.len())?;
        let start = self.byte_offset(index)?;
        if start >= self.len {
            buf.fill(0);
            return Ok(());
        }
        let start = usize::try_from(start).map_err(|_| {
            FsError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "block offset exceeds addressable size",
            ))
        })?;
        buf.copy_from_slice(&self.map[start..start + self.block_size]);
        Ok(())
    }

    /// Writes `buf` as block `index`, growing the image when needed.
    ///
    /// # Errors
    /// `OutOfRange` when `buf` is not exactly one block; I/O errors from
    /// growing or flushing the mapping.
    pub fn write_block(&mut self, index: u64, buf: &[u8]) -> FsResult<()> {
        self.check_buffer(buf.len())?;
        let start = self.byte_offset(index)?;
        let end = start + self.block_size as u64;
        if end > self.len {
            self.grow_to(end)?;
        }
        let start = usize::try_from(start).map_err(|_| {
            FsError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "block offset exceeds addressable size",
            ))
        })?;
        self.map[start..start + self.block_size].copy_from_slice(buf);
        Ok(())
    }

    fn grow_to(&mut self, new_len: u64) -> FsResult<()> {
        self.file.set_len(new_len)?;
        self.map = map_file(&self.file, new_len)?;
        self.len = new_len;
        Ok(())
    }

    /// # Errors
    /// I/O errors from flushing the mapping.
    pub fn flush(&self) -> FsResult<()> {
        self.map.flush()?;
        Ok(())
    }
}

fn map_file(file: &File, len: u64) -> FsResult<MmapMut> {
    let map_len = usize::try_from(len).map_err(|_| {
        FsError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("image length {len} exceeds addressable size"),
        ))
    })?;
    let map = unsafe { MmapOptions::new().len(map_len).map_mut(file)? };
    Ok(map)
}
