//! FLOUDS filesystem engine: a succinct directory tree over dynamic bit
//! vectors and a four-symbol wavelet tree, persisted on a block-backed
//! image file.

pub mod alloc;
pub mod bitvec;
pub mod device;
pub mod error;
pub mod inode;
pub mod manager;
pub mod names;
pub mod ser;
pub mod tree;
pub mod wavelet;

pub use error::{FsError, FsResult};
pub use manager::{DefaultManager, FsManager};
