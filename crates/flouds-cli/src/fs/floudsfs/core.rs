use std::ffi::OsStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use flouds_rs::error::FsError;
use flouds_rs::inode::Inode;
use fuser::{FileAttr, FileType};

use crate::fs::constants::{ATTR_BLOCK_SIZE, NAME_LEN};

use super::types::FloudsFs;

impl FloudsFs {
    /// Kernel inode numbers map to tree nodes as `ino = node + 1`; inode 0
    /// is reserved by the kernel ABI.
    #[must_use]
    pub fn node_for_ino(ino: u64) -> Option<usize> {
        if ino == 0 {
            None
        } else {
            usize::try_from(ino - 1).ok()
        }
    }

    #[must_use]
    pub const fn ino_for_node(node: usize) -> u64 {
        node as u64 + 1
    }

    #[must_use]
    pub fn is_valid_name(name: &OsStr) -> bool {
        if name.is_empty() || name == OsStr::new(".") || name == OsStr::new("..") {
            return false;
        }
        let name = name.to_string_lossy();
        name.len() <= NAME_LEN && !name.contains('/')
    }

    #[must_use]
    pub fn errno_for(err: &FsError) -> i32 {
        match err {
            FsError::OutOfRange { .. } => libc::EINVAL,
            FsError::NotFound(_) => libc::ENOENT,
            // Ops that can hit the file/folder mismatch the other way around
            // (rmdir on a file, descending through a file) reply ENOTDIR at
            // the call site before reaching this fallback.
            FsError::WrongKind => libc::EISDIR,
            FsError::NotEmpty => libc::ENOTEMPTY,
            FsError::Io(_) | FsError::Corrupt(_) => libc::EIO,
        }
    }

    #[must_use]
    pub fn attr_for(node: usize, inode: &Inode, is_folder: bool) -> FileAttr {
        let kind = if is_folder {
            FileType::Directory
        } else {
            FileType::RegularFile
        };
        FileAttr {
            ino: Self::ino_for_node(node),
            size: if is_folder { 0 } else { inode.size },
            blocks: inode.size.div_ceil(512),
            atime: system_time(inode.access_time),
            mtime: system_time(inode.modification_time),
            ctime: system_time(inode.creation_time),
            crtime: system_time(inode.creation_time),
            kind,
            perm: (inode.mode & 0o7777) as u16,
            nlink: if is_folder { 2 } else { 1 },
            uid: unsafe { libc::getuid() },
            gid: unsafe { libc::getgid() },
            rdev: 0,
            blksize: ATTR_BLOCK_SIZE,
            flags: 0,
        }
    }
}

fn system_time(secs: i64) -> SystemTime {
    if secs <= 0 {
        UNIX_EPOCH
    } else {
        UNIX_EPOCH + Duration::from_secs(secs as u64)
    }
}
