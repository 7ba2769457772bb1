use crate::error::FsError;
use crate::ser::Persist;

use super::{INODE_RECORD_SIZE, Inode, InodeTable};

fn sample(seed: u64) -> Inode {
    Inode {
        allocation_handle: seed,
        size: seed * 100,
        mode: 0o644,
        modification_time: 1_700_000_000 + seed as i64,
        access_time: 1_700_000_001 + seed as i64,
        creation_time: 1_700_000_002 + seed as i64,
    }
}

#[test]
fn insert_yields_a_zeroed_record() {
    let mut table = InodeTable::new();
    let inode = table.insert(0).unwrap();
    assert_eq!(*inode, Inode::default());
    assert_eq!(inode.allocation_handle, 0, "zero handle means unallocated");
    assert_eq!(table.len(), 1);
}

#[test]
fn insert_shifts_the_tail() {
    let mut table = InodeTable::new();
    *table.insert(0).unwrap() = sample(1);
    *table.insert(1).unwrap() = sample(2);
    *table.insert(1).unwrap() = sample(3);

    assert_eq!(table.get(0).unwrap().allocation_handle, 1);
    assert_eq!(table.get(1).unwrap().allocation_handle, 3);
    assert_eq!(table.get(2).unwrap().allocation_handle, 2);
}

#[test]
fn remove_shifts_the_tail() {
    let mut table = InodeTable::new();
    for i in 0..3 {
        *table.insert(i).unwrap() = sample(i as u64);
    }
    table.remove(1).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.get(0).unwrap().allocation_handle, 0);
    assert_eq!(table.get(1).unwrap().allocation_handle, 2);
}

#[test]
fn positions_are_bounds_checked() {
    let mut table = InodeTable::new();
    assert!(matches!(table.get(0), Err(FsError::OutOfRange { .. })));
    assert!(matches!(table.remove(0), Err(FsError::OutOfRange { .. })));
    assert!(matches!(table.insert(1), Err(FsError::OutOfRange { .. })));
}

#[test]
fn serialize_round_trip() {
    let mut table = InodeTable::new();
    for i in 0..4 {
        *table.insert(i).unwrap() = sample(i as u64 + 10);
    }
    let bytes = table.to_bytes();
    assert_eq!(bytes.len(), 8 + 4 * INODE_RECORD_SIZE);

    let decoded = InodeTable::from_bytes(&bytes).unwrap();
    assert_eq!(decoded, table);
}

#[test]
fn oversized_count_is_corrupt() {
    let mut table = InodeTable::new();
    *table.insert(0).unwrap() = sample(1);
    let mut bytes = table.to_bytes();
    bytes[..8].copy_from_slice(&u64::MAX.to_le_bytes());
    assert!(matches!(
        InodeTable::from_bytes(&bytes),
        Err(FsError::Corrupt(_))
    ));
}

#[test]
fn truncated_table_is_corrupt() {
    let mut table = InodeTable::new();
    *table.insert(0).unwrap() = sample(1);
    let bytes = table.to_bytes();
    assert!(matches!(
        InodeTable::from_bytes(&bytes[..bytes.len() - 4]),
        Err(FsError::Corrupt(_))
    ));
}
