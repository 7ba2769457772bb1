pub mod constants;
pub mod floudsfs;

pub use floudsfs::FloudsFs;

#[cfg(test)]
pub(crate) mod test_utils {
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    use flouds_rs::DefaultManager;
    use tempfile::TempDir;

    use super::floudsfs::FloudsFs;

    pub fn create_test_fs() -> (TempDir, FloudsFs) {
        let dir = TempDir::new().expect("tmp dir");
        let image: PathBuf = dir.path().join("test_fs.img");
        let manager = DefaultManager::mount(&image).expect("mount image");
        (dir, FloudsFs::new(Arc::new(Mutex::new(manager))))
    }
}
