use std::io::Read;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use flouds_rs::manager::{HEADER_SIZE, Header};
use flouds_rs::tree::ROOT_NODE;
use flouds_rs::DefaultManager;
use fuser::MountOption;
use tracing::info;

use crate::cli::{InfoArgs, MountArgs};
use crate::fs::FloudsFs;

pub fn run_mount(args: &MountArgs) -> Result<()> {
    std::fs::create_dir_all(&args.mount_point).with_context(|| {
        format!(
            "failed to create mount point {}",
            args.mount_point.display()
        )
    })?;

    let manager = DefaultManager::mount(&args.image)
        .with_context(|| format!("failed to open image {}", args.image.display()))?;
    info!(
        nodes = manager.node_count(),
        image = %args.image.display(),
        "filesystem ready"
    );

    let fs = FloudsFs::new(Arc::new(Mutex::new(manager)));

    let mut options = vec![MountOption::RW, MountOption::FSName("flouds-fuse".into())];
    if args.allow_root {
        options.push(MountOption::AllowRoot);
    }
    if args.auto_unmount {
        options.push(MountOption::AutoUnmount);
    }
    fuser::mount2(fs, &args.mount_point, &options)
        .with_context(|| format!("failed to mount filesystem at {}", args.mount_point.display()))
}

pub fn run_info(args: &InfoArgs) -> Result<()> {
    // Probe the raw header first so a plain file is never formatted by
    // accident.
    let mut file = std::fs::File::open(&args.image)
        .with_context(|| format!("failed to open image {}", args.image.display()))?;
    let mut block = vec![0u8; HEADER_SIZE];
    file.read_exact(&mut block)
        .with_context(|| format!("image {} is too short for a header", args.image.display()))?;
    let header = Header::parse(&block)
        .with_context(|| format!("no FLOUDS filesystem in {}", args.image.display()))?;
    drop(file);

    let manager = DefaultManager::mount(&args.image)
        .with_context(|| format!("failed to load image {}", args.image.display()))?;

    println!("image:      {}", args.image.display());
    println!("block size: {}", manager.block_size());
    println!("nodes:      {}", manager.node_count());
    println!(
        "root:       {} children",
        manager.tree().children_count(ROOT_NODE)?
    );
    println!(
        "allocator:  handle {} ({} bytes)",
        header.allocator_handle, header.allocator_size
    );
    println!(
        "tree:       handle {} ({} bytes)",
        header.flouds_handle, header.flouds_size
    );
    println!(
        "inodes:     handle {} ({} bytes)",
        header.inode_handle, header.inode_size
    );
    Ok(())
}
