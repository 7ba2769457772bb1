use std::ffi::OsStr;

use fuser::{FileType, ReplyDirectory, ReplyEntry, Request};

use crate::fs::constants::{ROOT_INO, TTL};

use super::types::FloudsFs;

impl FloudsFs {
    pub(crate) fn op_lookup(
        &self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        reply: ReplyEntry,
    ) {
        let Some(parent_node) = Self::node_for_ino(parent) else {
            reply.error(libc::ENOENT);
            return;
        };
        let Ok(manager) = self.state.lock() else {
            reply.error(libc::EIO);
            return;
        };
        if parent_node >= manager.node_count() {
            reply.error(libc::ENOENT);
            return;
        }
        match manager.tree().is_folder(parent_node) {
            Ok(true) => {}
            Ok(false) => {
                reply.error(libc::ENOTDIR);
                return;
            }
            Err(err) => {
                reply.error(Self::errno_for(&err));
                return;
            }
        }

        let name = name.to_string_lossy();
        match manager.tree().lookup_child(parent_node, &name) {
            Ok(child) => {
                let Ok(inode) = manager.inode(child) else {
                    reply.error(libc::EIO);
                    return;
                };
                let is_folder = manager.tree().is_folder(child).unwrap_or(false);
                reply.entry(&TTL, &Self::attr_for(child, inode, is_folder), 0);
            }
            Err(err) => reply.error(Self::errno_for(&err)),
        }
    }

    pub(crate) fn op_readdir(
        &self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        match self.list_dir_entries(ino) {
            Ok(entries) => {
                let offset = usize::try_from(offset).unwrap_or(0);
                for (i, (entry_ino, kind, name)) in entries.into_iter().enumerate().skip(offset) {
                    let next_offset = i64::try_from(i + 1).unwrap_or(i64::MAX);
                    if reply.add(entry_ino, next_offset, kind, name.as_str()) {
                        break;
                    }
                }
                reply.ok();
            }
            Err(code) => reply.error(code),
        }
    }

    fn list_dir_entries(&self, ino: u64) -> Result<Vec<(u64, FileType, String)>, i32> {
        let Some(node) = Self::node_for_ino(ino) else {
            return Err(libc::ENOENT);
        };
        let Ok(manager) = self.state.lock() else {
            return Err(libc::EIO);
        };
        if node >= manager.node_count() {
            return Err(libc::ENOENT);
        }
        let tree = manager.tree();
        if !tree.is_folder(node).map_err(|e| Self::errno_for(&e))? {
            return Err(libc::ENOTDIR);
        }

        let mut entries: Vec<(u64, FileType, String)> = Vec::new();
        entries.push((ino, FileType::Directory, ".".to_string()));
        let parent_ino = if ino == ROOT_INO {
            ino
        } else {
            tree.parent(node).map(Self::ino_for_node).unwrap_or(ino)
        };
        entries.push((parent_ino, FileType::Directory, "..".to_string()));

        let count = tree.children_count(node).map_err(|e| Self::errno_for(&e))?;
        for k in 0..count {
            let child = tree.child(node, k).map_err(|e| Self::errno_for(&e))?;
            let kind = if tree.is_folder(child).map_err(|e| Self::errno_for(&e))? {
                FileType::Directory
            } else {
                FileType::RegularFile
            };
            let name = tree.get_name(child).map_err(|e| Self::errno_for(&e))?;
            entries.push((Self::ino_for_node(child), kind, name));
        }

        Ok(entries)
    }
}
