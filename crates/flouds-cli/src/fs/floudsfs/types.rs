use std::sync::{Arc, Mutex};

use flouds_rs::DefaultManager;

/// FUSE adapter over the filesystem manager.
///
/// Every entry point funnels through one coarse lock held for the duration
/// of the kernel request; the succinct structures are not safe for parallel
/// writers.
pub struct FloudsFs {
    pub state: Arc<Mutex<DefaultManager>>,
}

impl FloudsFs {
    #[must_use]
    pub fn new(state: Arc<Mutex<DefaultManager>>) -> Self {
        Self { state }
    }
}
