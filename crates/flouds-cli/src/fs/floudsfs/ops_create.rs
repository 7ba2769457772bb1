use std::ffi::OsStr;

use fuser::{FileAttr, ReplyCreate, ReplyEmpty, ReplyEntry, Request};

use crate::fs::constants::{OPEN_DIRECT_IO, TTL};

use super::types::FloudsFs;

impl FloudsFs {
    /// Shared mkdir/create/mknod path: validates the name, rejects
    /// duplicates, creates the node and persists.
    pub(crate) fn create_node(
        &self,
        parent: u64,
        name: &OsStr,
        mode: u32,
        is_folder: bool,
    ) -> Result<(usize, FileAttr), i32> {
        if !Self::is_valid_name(name) {
            return Err(libc::EINVAL);
        }
        let Some(parent_node) = Self::node_for_ino(parent) else {
            return Err(libc::ENOENT);
        };
        let Ok(mut manager) = self.state.lock() else {
            return Err(libc::EIO);
        };
        if parent_node >= manager.node_count() {
            return Err(libc::ENOENT);
        }
        match manager.tree().is_folder(parent_node) {
            Ok(true) => {}
            Ok(false) => return Err(libc::ENOTDIR),
            Err(err) => return Err(Self::errno_for(&err)),
        }

        let name = name.to_string_lossy();
        if manager.tree().lookup_child(parent_node, &name).is_ok() {
            return Err(libc::EEXIST);
        }

        let node = manager
            .add_node(parent_node, &name, is_folder, mode)
            .map_err(|e| Self::errno_for(&e))?;
        manager.save().map_err(|e| Self::errno_for(&e))?;

        let inode = manager.inode(node).map_err(|e| Self::errno_for(&e))?;
        Ok((node, Self::attr_for(node, inode, is_folder)))
    }

    /// Shared unlink/rmdir path; `folder` selects which kind may go.
    pub(crate) fn remove_entry(&self, parent: u64, name: &OsStr, folder: bool) -> Result<(), i32> {
        let Some(parent_node) = Self::node_for_ino(parent) else {
            return Err(libc::ENOENT);
        };
        let Ok(mut manager) = self.state.lock() else {
            return Err(libc::EIO);
        };
        if parent_node >= manager.node_count() {
            return Err(libc::ENOENT);
        }

        let name = name.to_string_lossy();
        let node = manager
            .tree()
            .lookup_child(parent_node, &name)
            .map_err(|e| Self::errno_for(&e))?;
        let is_folder = manager.tree().is_folder(node).map_err(|e| Self::errno_for(&e))?;
        if folder && !is_folder {
            return Err(libc::ENOTDIR);
        }
        if !folder && is_folder {
            return Err(libc::EISDIR);
        }

        manager.remove_node(node).map_err(|e| Self::errno_for(&e))?;
        manager.save().map_err(|e| Self::errno_for(&e))?;
        Ok(())
    }

    pub(crate) fn op_mkdir(
        &self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        match self.create_node(parent, name, mode, true) {
            Ok((_, attr)) => reply.entry(&TTL, &attr, 0),
            Err(code) => reply.error(code),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn op_create(
        &self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        mode: u32,
        _umask: u32,
        _flags: i32,
        reply: ReplyCreate,
    ) {
        match self.create_node(parent, name, mode, false) {
            Ok((node, attr)) => {
                reply.created(&TTL, &attr, 0, Self::ino_for_node(node), OPEN_DIRECT_IO);
            }
            Err(code) => reply.error(code),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn op_mknod(
        &self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        mode: u32,
        _umask: u32,
        _rdev: u32,
        reply: ReplyEntry,
    ) {
        match self.create_node(parent, name, mode, false) {
            Ok((_, attr)) => reply.entry(&TTL, &attr, 0),
            Err(code) => reply.error(code),
        }
    }

    pub(crate) fn op_unlink(
        &self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        reply: ReplyEmpty,
    ) {
        match self.remove_entry(parent, name, false) {
            Ok(()) => reply.ok(),
            Err(code) => reply.error(code),
        }
    }

    pub(crate) fn op_rmdir(
        &self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        reply: ReplyEmpty,
    ) {
        match self.remove_entry(parent, name, true) {
            Ok(()) => reply.ok(),
            Err(code) => reply.error(code),
        }
    }
}
