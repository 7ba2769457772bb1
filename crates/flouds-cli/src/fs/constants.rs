use std::time::Duration;

pub const TTL: Duration = Duration::from_secs(1);
pub const ROOT_INO: u64 = 1;
pub const NAME_LEN: usize = 255;
pub const OPEN_DIRECT_IO: u32 = 1;
pub const ATTR_BLOCK_SIZE: u32 = 4096;
