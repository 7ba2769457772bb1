use fuser::{ReplyData, ReplyOpen, ReplyWrite, Request};

use crate::fs::constants::OPEN_DIRECT_IO;

use super::types::FloudsFs;

impl FloudsFs {
    pub(crate) fn op_open(&self, _req: &Request<'_>, ino: u64, _flags: i32, reply: ReplyOpen) {
        let Some(node) = Self::node_for_ino(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        let Ok(manager) = self.state.lock() else {
            reply.error(libc::EIO);
            return;
        };
        if node >= manager.node_count() {
            reply.error(libc::ENOENT);
            return;
        }
        match manager.tree().is_file(node) {
            Ok(true) => reply.opened(ino, OPEN_DIRECT_IO),
            Ok(false) => reply.error(libc::EISDIR),
            Err(err) => reply.error(Self::errno_for(&err)),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn op_read(
        &self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let Some(node) = Self::node_for_ino(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        let offset = u64::try_from(offset.max(0)).unwrap_or(0);
        let Ok(mut manager) = self.state.lock() else {
            reply.error(libc::EIO);
            return;
        };
        if node >= manager.node_count() {
            reply.error(libc::ENOENT);
            return;
        }

        let mut buf = vec![0u8; size as usize];
        match manager.read_file(node, offset, &mut buf) {
            Ok(n) => reply.data(&buf[..n]),
            Err(err) => reply.error(Self::errno_for(&err)),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn op_write(
        &self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        let Some(node) = Self::node_for_ino(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        let offset = u64::try_from(offset.max(0)).unwrap_or(0);
        let Ok(mut manager) = self.state.lock() else {
            reply.error(libc::EIO);
            return;
        };
        if node >= manager.node_count() {
            reply.error(libc::ENOENT);
            return;
        }

        let current = match manager.inode(node) {
            Ok(inode) => inode.size,
            Err(err) => {
                reply.error(Self::errno_for(&err));
                return;
            }
        };
        let end = offset.saturating_add(data.len() as u64);
        if end > current {
            if let Err(err) = manager.set_file_size(node, end) {
                reply.error(Self::errno_for(&err));
                return;
            }
        }
        match manager.write_file(node, offset, data) {
            Ok(n) => {
                if let Err(err) = manager.save() {
                    reply.error(Self::errno_for(&err));
                    return;
                }
                reply.written(u32::try_from(n).unwrap_or(u32::MAX));
            }
            Err(err) => reply.error(Self::errno_for(&err)),
        }
    }
}
