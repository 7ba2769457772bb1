//! Byte-range allocation on the block device.


use crate::device::BlockDevice;
use crate::error::FsResult;
use crate::ser::{self, Persist};

/// Opaque identifier of a contiguous byte range. Zero means "unallocated".
pub type Handle = u64;

/// Capability trait for allocation strategies.
///
/// Strategies borrow the device per call instead of holding it; the manager
/// owns both. `read` depends only on the handle and block arithmetic, so a
/// default-constructed strategy can fetch its own serialized state during
/// mount.
pub trait Allocator: Persist + Default {
    /// Reserves `size` bytes and returns the handle of the range.
    fn allocate(&mut self, device: &BlockDevice, size: u64) -> Handle;

    /// Releases the range behind `handle`.
    fn free(&mut self, handle: Handle);

    /// # Errors
    /// I/O errors from the device.
    fn read(
        &self,
        device: &BlockDevice,
        handle: Handle,
        offset: u64,
        buf: &mut [u8],
    ) -> FsResult<()>;

    /// # Errors
    /// I/O errors from the device.
    fn write(
        &self,
        device: &mut BlockDevice,
        handle: Handle,
        offset: u64,
        data: &[u8],
    ) -> FsResult<()>;

    /// Grows or shrinks a range. Returns the (possibly new) handle; contents
    /// are not copied on relocation.
    fn resize(&mut self, device: &BlockDevice, handle: Handle, old_size: u64, new_size: u64)
        -> Handle;
}

/// Monotonic append strategy: block 0 belongs to the header, `next_block`
/// only moves forward and `free` never reclaims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendAllocator {
    next_block: u64,
}

impl Default for AppendAllocator {
    fn default() -> Self {
        Self { next_block: 1 }
    }
}

impl AppendAllocator {
    #[must_use]
    pub const fn next_block(&self) -> u64 {
        self.next_block
    }

    fn blocks_for(device: &BlockDevice, size: u64) -> u64 {
        size.max(1).div_ceil(device.block_size() as u64)
    }
}

impl Allocator for AppendAllocator {
    fn allocate(&mut self, device: &BlockDevice, size: u64) -> Handle {
        let handle = self.next_block;
        self.next_block += Self::blocks_for(device, size);
        handle
    }

    fn free(&mut self, _handle: Handle) {
        // Space is never reused.
    }

    fn read(
        &self,
        device: &BlockDevice,
        handle: Handle,
        offset: u64,
        buf: &mut [u8],
    ) -> FsResult<()> {
        let block_size = device.block_size();
        let mut block = vec![0u8; block_size];
        let mut done = 0;
        while done < buf.len() {
            let at = offset + done as u64;
            let index = handle + at / block_size as u64;
            let in_block = (at % block_size as u64) as usize;
            let take = (block_size - in_block).min(buf.len() - done);
            device.read_block(index, &mut block)?;
            buf[done..done + take].copy_from_slice(&block[in_block..in_block + take]);
            done += take;
        }
        Ok(())
    }

    fn write(
        &self,
        device: &mut BlockDevice,
        handle: Handle,
        offset: u64,
        data: &[u8],
    ) -> FsResult<()> {
        let block_size = device.block_size();
        let mut block = vec![0u8; block_size];
        let mut done = 0;
        while done < data.len() {
            let at = offset + done as u64;
            let index = handle + at / block_size as u64;
            let in_block = (at % block_size as u64) as usize;
            let take = (block_size - in_block).min(data.len() - done);
            // Partial head/tail blocks keep their surrounding bytes.
            if in_block != 0 || take < block_size {
                device.read_block(index, &mut block)?;
            }
            block[in_block..in_block + take].copy_from_slice(&data[done..done + take]);
            device.write_block(index, &block)?;
            done += take;
        }
        Ok(())
    }

    fn resize(
        &mut self,
        device: &BlockDevice,
        handle: Handle,
        old_size: u64,
        new_size: u64,
    ) -> Handle {
        if handle == 0 || old_size == 0 {
            return self.allocate(device, new_size);
        }
        let old_blocks = Self::blocks_for(device, old_size);
        let new_blocks = Self::blocks_for(device, new_size);
        if new_blocks <= old_blocks {
            handle
        } else {
            self.allocate(device, new_size)
        }
    }
}

impl Persist for AppendAllocator {
    fn serialized_size(&self) -> usize {
        ser::WORD
    }

    fn serialize_into(&self, buf: &mut [u8], offset: &mut usize) {
        ser::put_u64(buf, offset, self.next_block);
    }

    fn deserialize_from(buf: &[u8], offset: &mut usize) -> FsResult<Self> {
        let next_block = ser::get_u64(buf, offset)?;
        Ok(Self { next_block })
    }
}
