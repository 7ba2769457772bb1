use rand::RngCore;
use tempfile::TempDir;

use crate::error::FsError;
use crate::tree::ROOT_NODE;

use super::{DefaultManager, HEADER_SIZE, Header};

fn image_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("test_fs.img")
}

#[test]
fn header_bytes_round_trip() {
    let header = Header {
        allocator_handle: 9,
        allocator_size: 8,
        flouds_handle: 1,
        flouds_size: 77,
        inode_handle: 3,
        inode_size: 52,
    };
    let bytes = header.to_bytes();
    assert_eq!(&bytes[..6], b"FLOUDS");
    let parsed = Header::parse(&bytes).expect("parse header");
    assert_eq!(parsed, header);
}

#[test]
fn header_parse_rejects_bad_magic() {
    let mut bytes = Header::default().to_bytes();
    bytes[0] = b'X';
    assert!(Header::parse(&bytes).is_none());
}

#[test]
fn header_parse_rejects_short_buffer() {
    let bytes = [0u8; HEADER_SIZE - 1];
    assert!(Header::parse(&bytes).is_none());
}

#[test]
fn mount_formats_a_fresh_image_and_remounts() {
    let dir = TempDir::new().expect("tmp dir");
    let path = image_path(&dir);

    {
        let fs = DefaultManager::mount(&path).expect("first mount");
        assert_eq!(fs.node_count(), 1);
        assert_eq!(fs.tree().children_count(ROOT_NODE).unwrap(), 0);
        assert_eq!(fs.tree().get_name(ROOT_NODE).unwrap(), "root");
        assert_eq!(fs.inode(ROOT_NODE).unwrap().mode, 0o755);
        fs.unmount().expect("unmount");
    }

    // The magic must now be installed and the state reloadable.
    let fs = DefaultManager::mount(&path).expect("second mount");
    assert_eq!(fs.node_count(), 1);
    assert!(fs.tree().is_empty_folder(ROOT_NODE).unwrap());
}

#[test]
fn added_file_survives_save_and_remount() {
    let dir = TempDir::new().expect("tmp dir");
    let path = image_path(&dir);

    {
        let mut fs = DefaultManager::mount(&path).expect("mount");
        fs.add_node(ROOT_NODE, "a.txt", false, 0o644).expect("add");
        assert_eq!(fs.tree().children_count(ROOT_NODE).unwrap(), 1);
        fs.save().expect("save");
        fs.unmount().expect("unmount");
    }

    let fs = DefaultManager::mount(&path).expect("remount");
    assert_eq!(fs.tree().children_count(ROOT_NODE).unwrap(), 1);
    let child = fs.tree().child(ROOT_NODE, 0).unwrap();
    assert_eq!(fs.tree().get_name(child).unwrap(), "a.txt");
    assert!(fs.tree().is_file(child).unwrap());
    assert_eq!(fs.inode(child).unwrap().mode, 0o644);
}

#[test]
fn nested_structure_via_the_manager() {
    let dir = TempDir::new().expect("tmp dir");
    let mut fs = DefaultManager::mount(&image_path(&dir)).expect("mount");

    let folder1 = fs.add_node(ROOT_NODE, "folder1", true, 0o755).expect("mkdir");
    fs.add_node(ROOT_NODE, "file1", false, 0o644).expect("create");
    let file2 = fs.add_node(folder1, "file2", false, 0o644).expect("create");

    assert_eq!(fs.tree().children_count(ROOT_NODE).unwrap(), 2);
    assert_eq!(fs.tree().children_count(folder1).unwrap(), 1);
    assert_eq!(fs.tree().parent(file2).unwrap(), folder1);
    assert_eq!(fs.tree().resolve_path("folder1/file2").unwrap(), file2);
}

#[test]
fn remove_node_preconditions() {
    let dir = TempDir::new().expect("tmp dir");
    let mut fs = DefaultManager::mount(&image_path(&dir)).expect("mount");

    let folder = fs.add_node(ROOT_NODE, "folder", true, 0o755).expect("mkdir");
    let file = fs.add_node(folder, "file", false, 0o644).expect("create");

    assert!(matches!(fs.remove_node(ROOT_NODE), Err(FsError::WrongKind)));
    assert!(matches!(fs.remove_node(folder), Err(FsError::NotEmpty)));

    fs.remove_node(file).expect("remove file");
    assert!(fs.tree().is_empty_folder(folder).unwrap());
    fs.remove_node(folder).expect("remove emptied folder");
    assert_eq!(fs.node_count(), 1);
}

#[test]
fn file_io_round_trip_with_persistence() {
    let dir = TempDir::new().expect("tmp dir");
    let path = image_path(&dir);

    let mut payload = vec![0u8; 10_000];
    rand::rng().fill_bytes(&mut payload);

    let node = {
        let mut fs = DefaultManager::mount(&path).expect("mount");
        let node = fs.add_node(ROOT_NODE, "blob", false, 0o644).expect("create");
        fs.set_file_size(node, 42 + payload.len() as u64).expect("grow");
        fs.write_file(node, 42, &payload).expect("write");

        let mut back = vec![0u8; payload.len()];
        let n = fs.read_file(node, 42, &mut back).expect("read");
        assert_eq!(n, payload.len());
        assert_eq!(back, payload, "in-session round trip must match");

        fs.unmount().expect("unmount");
        node
    };

    // The allocator went through its self-sizing fixpoint during save; the
    // data must still be where the inode says it is.
    let mut fs = DefaultManager::mount(&path).expect("remount");
    let mut back = vec![0u8; payload.len()];
    let n = fs.read_file(node, 42, &mut back).expect("read after remount");
    assert_eq!(n, payload.len());
    assert_eq!(back, payload, "persisted round trip must match");
}

#[test]
fn reads_truncate_at_the_end_of_file() {
    let dir = TempDir::new().expect("tmp dir");
    let mut fs = DefaultManager::mount(&image_path(&dir)).expect("mount");

    let node = fs.add_node(ROOT_NODE, "f", false, 0o644).expect("create");
    fs.set_file_size(node, 10).expect("grow");
    fs.write_file(node, 0, &[7u8; 10]).expect("write");

    let mut buf = vec![0u8; 100];
    assert_eq!(fs.read_file(node, 4, &mut buf).expect("read"), 6);
    assert_eq!(&buf[..6], &[7u8; 6]);
    assert_eq!(fs.read_file(node, 10, &mut buf).expect("read at end"), 0);
    assert_eq!(fs.read_file(node, 999, &mut buf).expect("read past end"), 0);
}

#[test]
fn writes_past_the_end_are_rejected() {
    let dir = TempDir::new().expect("tmp dir");
    let mut fs = DefaultManager::mount(&image_path(&dir)).expect("mount");

    let node = fs.add_node(ROOT_NODE, "f", false, 0o644).expect("create");
    fs.set_file_size(node, 4).expect("grow");
    assert!(matches!(
        fs.write_file(node, 2, &[0u8; 4]),
        Err(FsError::OutOfRange { .. })
    ));
}

#[test]
fn file_io_on_folders_is_rejected() {
    let dir = TempDir::new().expect("tmp dir");
    let mut fs = DefaultManager::mount(&image_path(&dir)).expect("mount");

    let folder = fs.add_node(ROOT_NODE, "d", true, 0o755).expect("mkdir");
    let mut buf = [0u8; 4];
    assert!(matches!(
        fs.read_file(folder, 0, &mut buf),
        Err(FsError::WrongKind)
    ));
    assert!(matches!(
        fs.write_file(folder, 0, &buf),
        Err(FsError::WrongKind)
    ));
    assert!(matches!(
        fs.set_file_size(folder, 10),
        Err(FsError::WrongKind)
    ));
}

#[test]
fn growing_a_file_preserves_its_contents() {
    let dir = TempDir::new().expect("tmp dir");
    let mut fs = DefaultManager::mount(&image_path(&dir)).expect("mount");

    let node = fs.add_node(ROOT_NODE, "log", false, 0o644).expect("create");
    fs.set_file_size(node, 100).expect("initial size");
    fs.write_file(node, 0, &[0xABu8; 100]).expect("write");

    // Allocate something else so the grown file cannot extend in place.
    fs.add_node(ROOT_NODE, "other", false, 0o644).expect("create");
    fs.save().expect("save");

    fs.set_file_size(node, 20_000).expect("grow across blocks");
    let mut back = vec![0u8; 100];
    fs.read_file(node, 0, &mut back).expect("read");
    assert_eq!(back, vec![0xABu8; 100], "grown file keeps its prefix");
    assert_eq!(fs.inode(node).unwrap().size, 20_000);
}

#[test]
fn set_file_size_updates_metadata() {
    let dir = TempDir::new().expect("tmp dir");
    let mut fs = DefaultManager::mount(&image_path(&dir)).expect("mount");

    let node = fs.add_node(ROOT_NODE, "f", false, 0o644).expect("create");
    fs.set_file_size(node, 1024).expect("resize");
    let inode = fs.inode(node).unwrap();
    assert_eq!(inode.size, 1024);
    assert_ne!(inode.allocation_handle, 0, "growing allocates a range");
}

#[test]
fn corrupt_images_fail_to_mount() {
    let dir = TempDir::new().expect("tmp dir");
    let path = image_path(&dir);

    {
        let fs = DefaultManager::mount(&path).expect("format");
        fs.unmount().expect("unmount");
    }

    // Keep the magic but point the tree at a hole full of zeros; the inode
    // count can no longer match the decoded tree.
    let mut image = std::fs::read(&path).expect("read image");
    let mut offset = 8 + 16;
    crate::ser::put_u64(&mut image, &mut offset, 500);
    std::fs::write(&path, &image).expect("write image");

    assert!(matches!(
        DefaultManager::mount(&path),
        Err(FsError::Corrupt(_))
    ));
}
