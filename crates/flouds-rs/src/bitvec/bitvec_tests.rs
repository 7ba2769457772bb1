use rand::Rng;

use crate::error::FsError;
use crate::ser::Persist;

use super::{BitVector, VecBitVector, WordBitVector};

fn from_bits<B: BitVector>(bits: &[bool]) -> B {
    let mut out = B::zeros(bits.len());
    for (i, &bit) in bits.iter().enumerate() {
        out.set(i, bit).expect("set in range");
    }
    out
}

fn assert_queries_agree(reference: &VecBitVector, packed: &WordBitVector) {
    assert_eq!(reference.len(), packed.len(), "lengths must agree");
    for i in 0..reference.len() {
        assert_eq!(
            reference.access(i).unwrap(),
            packed.access(i).unwrap(),
            "access({i}) must agree"
        );
        assert_eq!(
            reference.rank1(i).unwrap(),
            packed.rank1(i).unwrap(),
            "rank1({i}) must agree"
        );
        assert_eq!(
            reference.rank0(i).unwrap(),
            packed.rank0(i).unwrap(),
            "rank0({i}) must agree"
        );
    }
    for n in 1..=reference.count_ones() {
        assert_eq!(
            reference.select1(n).unwrap(),
            packed.select1(n).unwrap(),
            "select1({n}) must agree"
        );
    }
    for n in 1..=reference.len() - reference.count_ones() {
        assert_eq!(
            reference.select0(n).unwrap(),
            packed.select0(n).unwrap(),
            "select0({n}) must agree"
        );
    }
}

#[test]
fn empty_vector_rejects_queries() {
    let bv = WordBitVector::zeros(0);
    assert_eq!(bv.len(), 0);
    assert!(bv.is_empty());
    assert!(matches!(bv.access(0), Err(FsError::OutOfRange { .. })));
    assert!(matches!(bv.rank1(0), Err(FsError::OutOfRange { .. })));
    assert!(matches!(bv.select1(1), Err(FsError::OutOfRange { .. })));
    assert!(matches!(bv.select0(1), Err(FsError::OutOfRange { .. })));
}

#[test]
fn single_bit_operations() {
    let mut bv = WordBitVector::zeros(1);
    assert!(!bv.access(0).unwrap());
    assert_eq!(bv.rank0(0).unwrap(), 1);
    assert_eq!(bv.select0(1).unwrap(), 0);

    bv.set(0, true).unwrap();
    assert!(bv.access(0).unwrap());
    assert_eq!(bv.rank1(0).unwrap(), 1);
    assert_eq!(bv.select1(1).unwrap(), 0);
    assert!(matches!(bv.select0(1), Err(FsError::OutOfRange { .. })));
}

#[test]
fn rank_is_inclusive() {
    let bv: WordBitVector = from_bits(&[true, false, true, true, false]);
    assert_eq!(bv.rank1(0).unwrap(), 1);
    assert_eq!(bv.rank1(1).unwrap(), 1);
    assert_eq!(bv.rank1(2).unwrap(), 2);
    assert_eq!(bv.rank1(4).unwrap(), 3);
    for i in 0..bv.len() {
        assert_eq!(
            bv.rank1(i).unwrap() + bv.rank0(i).unwrap(),
            i + 1,
            "rank1 + rank0 must cover the inclusive prefix"
        );
    }
}

#[test]
fn select_of_first_bit_is_its_position() {
    let bv: WordBitVector = from_bits(&[false, false, true, false]);
    assert_eq!(bv.select1(1).unwrap(), 2);
    assert_eq!(bv.select0(1).unwrap(), 0);
}

#[test]
fn select_zero_is_rejected() {
    let bv: WordBitVector = from_bits(&[true, false]);
    assert!(matches!(bv.select1(0), Err(FsError::OutOfRange { .. })));
    assert!(matches!(bv.select0(0), Err(FsError::OutOfRange { .. })));
}

#[test]
fn insert_at_front_and_back() {
    let mut bv = WordBitVector::zeros(0);
    bv.insert(0, true).unwrap();
    bv.insert(1, false).unwrap();
    bv.insert(0, false).unwrap();
    assert_eq!(bv.len(), 3);
    assert!(!bv.access(0).unwrap());
    assert!(bv.access(1).unwrap());
    assert!(!bv.access(2).unwrap());
    assert!(matches!(bv.insert(4, true), Err(FsError::OutOfRange { .. })));
}

#[test]
fn remove_shifts_left() {
    let mut bv: WordBitVector = from_bits(&[true, false, true]);
    bv.remove(1).unwrap();
    assert_eq!(bv.len(), 2);
    assert!(bv.access(0).unwrap());
    assert!(bv.access(1).unwrap());
    assert!(matches!(bv.remove(2), Err(FsError::OutOfRange { .. })));
}

#[test]
fn insert_and_remove_cross_word_boundaries() {
    // A pattern longer than two words so shifts must carry between them.
    let bits: Vec<bool> = (0..150).map(|i| i % 3 == 0).collect();
    let mut reference: VecBitVector = from_bits(&bits);
    let mut packed: WordBitVector = from_bits(&bits);

    for &pos in &[0usize, 63, 64, 65, 127, 128, 150] {
        reference.insert(pos, true).unwrap();
        packed.insert(pos, true).unwrap();
    }
    assert_queries_agree(&reference, &packed);

    for &pos in &[128usize, 127, 65, 64, 63, 0] {
        reference.remove(pos).unwrap();
        packed.remove(pos).unwrap();
    }
    assert_queries_agree(&reference, &packed);
}

#[test]
fn random_mutations_match_reference() {
    let mut rng = rand::rng();
    let mut reference = VecBitVector::zeros(0);
    let mut packed = WordBitVector::zeros(0);

    for step in 0..2000 {
        let len = reference.len();
        match rng.random_range(0..3) {
            0 => {
                let pos = rng.random_range(0..=len);
                let value = rng.random::<bool>();
                reference.insert(pos, value).unwrap();
                packed.insert(pos, value).unwrap();
            }
            1 if len > 0 => {
                let pos = rng.random_range(0..len);
                reference.remove(pos).unwrap();
                packed.remove(pos).unwrap();
            }
            _ if len > 0 => {
                let pos = rng.random_range(0..len);
                let value = rng.random::<bool>();
                reference.set(pos, value).unwrap();
                packed.set(pos, value).unwrap();
            }
            _ => {}
        }
        if step % 250 == 0 {
            assert_queries_agree(&reference, &packed);
        }
    }
    assert_queries_agree(&reference, &packed);
}

#[test]
fn serialized_bytes_are_msb_first() {
    let bits = [true, false, false, false, false, false, false, true, true];
    let packed: WordBitVector = from_bits(&bits);
    let bytes = packed.to_bytes();
    assert_eq!(bytes.len(), 8 + 2);
    assert_eq!(&bytes[..8], &9u64.to_le_bytes());
    assert_eq!(bytes[8], 0b1000_0001);
    assert_eq!(bytes[9], 0b1000_0000);
}

#[test]
fn strategies_share_one_serialized_format() {
    let bits: Vec<bool> = (0..77).map(|i| i % 5 == 0 || i % 7 == 0).collect();
    let reference: VecBitVector = from_bits(&bits);
    let packed: WordBitVector = from_bits(&bits);
    assert_eq!(reference.to_bytes(), packed.to_bytes());

    let decoded = WordBitVector::from_bytes(&reference.to_bytes()).unwrap();
    assert_eq!(decoded, packed);
    let decoded = VecBitVector::from_bytes(&packed.to_bytes()).unwrap();
    assert_eq!(decoded, reference);
}

#[test]
fn serialize_round_trip_across_sizes() {
    for len in [0usize, 1, 7, 8, 9, 63, 64, 65, 200] {
        let bits: Vec<bool> = (0..len).map(|i| i % 2 == 1).collect();
        let packed: WordBitVector = from_bits(&bits);
        let decoded = WordBitVector::from_bytes(&packed.to_bytes()).unwrap();
        assert_eq!(decoded, packed, "round trip must preserve len {len}");
    }
}

#[test]
fn truncated_buffer_is_corrupt() {
    let packed: WordBitVector = from_bits(&[true; 20]);
    let bytes = packed.to_bytes();
    assert!(matches!(
        WordBitVector::from_bytes(&bytes[..bytes.len() - 1]),
        Err(FsError::Corrupt(_))
    ));
}
