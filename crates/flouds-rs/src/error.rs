use std::io;

use thiserror::Error;

/// Errors surfaced by the filesystem engine.
///
/// The FUSE bridge maps these onto errno values; nothing in the engine
/// recovers from them locally.
#[derive(Debug, Error)]
pub enum FsError {
    /// A positional precondition failed in a succinct structure: an index
    /// past the end, a select for a bit that is not there.
    #[error("index {index} out of range (len {len})")]
    OutOfRange { index: usize, len: usize },

    /// A path component does not exist.
    #[error("no entry named `{0}`")]
    NotFound(String),

    /// The operation does not apply to this node kind.
    #[error("wrong node kind for this operation")]
    WrongKind,

    /// Removal of a folder that still has children.
    #[error("folder is not empty")]
    NotEmpty,

    #[error("block device i/o: {0}")]
    Io(#[from] io::Error),

    /// Deserialization saw inconsistent sizes or a short buffer. Fatal to
    /// mount.
    #[error("corrupt image: {0}")]
    Corrupt(String),
}

pub type FsResult<T> = Result<T, FsError>;
