mod core;
mod filesystem;
mod ops_attr;
mod ops_create;
mod ops_dir;
mod ops_io;
mod ops_sync;
mod types;

pub use types::FloudsFs;
