use std::time::{SystemTime, UNIX_EPOCH};

use fuser::{ReplyAttr, ReplyEmpty, Request, TimeOrNow};

use crate::fs::constants::TTL;

use super::types::FloudsFs;

impl FloudsFs {
    pub(crate) fn op_getattr(
        &self,
        _req: &Request<'_>,
        ino: u64,
        _fh: Option<u64>,
        reply: ReplyAttr,
    ) {
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
        let Ok(inode) = manager.inode(node) else {
            reply.error(libc::EIO);
            return;
        };
        let is_folder = manager.tree().is_folder(node).unwrap_or(false);
        reply.attr(&TTL, &Self::attr_for(node, inode, is_folder));
    }

    pub(crate) fn op_access(&self, _req: &Request<'_>, ino: u64, _mask: i32, reply: ReplyEmpty) {
        let Some(node) = Self::node_for_ino(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        let Ok(manager) = self.state.lock() else {
            reply.error(libc::EIO);
            return;
        };
        // Mode bits are stored, not checked.
        if node < manager.node_count() {
            reply.ok();
        } else {
            reply.error(libc::ENOENT);
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn op_setattr(
        &self,
        _req: &Request<'_>,
        ino: u64,
        mode: Option<u32>,
        _uid: Option<u32>,
        _gid: Option<u32>,
        size: Option<u64>,
        atime: Option<TimeOrNow>,
        mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        let Some(node) = Self::node_for_ino(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        let Ok(mut manager) = self.state.lock() else {
            reply.error(libc::EIO);
            return;
        };
        if node >= manager.node_count() {
            reply.error(libc::ENOENT);
            return;
        }

        if let Some(new_size) = size {
            match manager.tree().is_file(node) {
                Ok(true) => {}
                Ok(false) => {
                    reply.error(libc::EISDIR);
                    return;
                }
                Err(err) => {
                    reply.error(Self::errno_for(&err));
                    return;
                }
            }
            if let Err(err) = manager.set_file_size(node, new_size) {
                reply.error(Self::errno_for(&err));
                return;
            }
        }

        let mutated = size.is_some() || mode.is_some() || atime.is_some() || mtime.is_some();
        {
            let Ok(record) = manager.inode_mut(node) else {
                reply.error(libc::EIO);
                return;
            };
            if let Some(mode) = mode {
                record.mode = mode;
            }
            if let Some(atime) = atime {
                record.access_time = time_secs(atime);
            }
            if let Some(mtime) = mtime {
                record.modification_time = time_secs(mtime);
            }
        }

        if mutated {
            if let Err(err) = manager.save() {
                reply.error(Self::errno_for(&err));
                return;
            }
        }

        let Ok(inode) = manager.inode(node) else {
            reply.error(libc::EIO);
            return;
        };
        let is_folder = manager.tree().is_folder(node).unwrap_or(false);
        reply.attr(&TTL, &Self::attr_for(node, inode, is_folder));
    }
}

fn time_secs(time: TimeOrNow) -> i64 {
    let at = match time {
        TimeOrNow::SpecificTime(at) => at,
        TimeOrNow::Now => SystemTime::now(),
    };
    at.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i64
}
