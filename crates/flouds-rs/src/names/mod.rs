//! Positional sequences of node names.


use crate::bitvec::BitVector;
use crate::error::{FsError, FsResult};
use crate::ser::{self, Persist};

/// Capability trait for the name sequence strategies.
///
/// Names are non-empty strings. `insert` shifts later positions right,
/// `remove` shifts them left; the two strategies serialize differently but
/// satisfy the same contract.
pub trait NameSequence: Persist {
    fn new() -> Self
    where
        Self: Sized;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// # Errors
    /// `OutOfRange` when `index >= len`.
    fn set(&mut self, index: usize, name: &str) -> FsResult<()>;

    /// # Errors
    /// `OutOfRange` when `index >= len`.
    fn access(&self, index: usize) -> FsResult<String>;

    /// # Errors
    /// `OutOfRange` when `index > len`.
    fn insert(&mut self, index: usize, name: &str) -> FsResult<()>;

    /// # Errors
    /// `OutOfRange` when `index >= len`.
    fn remove(&mut self, index: usize) -> FsResult<()>;
}

/// Straightforward `Vec<String>` strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VecNames {
    names: Vec<String>,
}

impl VecNames {
    fn check(&self, index: usize) -> FsResult<()> {
        if index >= self.names.len() {
            return Err(FsError::OutOfRange {
                index,
                len: self.names.len(),
            });
        }
        Ok(())
    }
}

impl NameSequence for VecNames {
    fn new() -> Self {
        Self::default()
    }

    fn len(&self) -> usize {
        self.names.len()
    }

    fn set(&mut self, index: usize, name: &str) -> FsResult<()> {
        self.check(index)?;
        self.names[index] = name.to_string();
        Ok(())
    }

    fn access(&self, index: usize) -> FsResult<String> {
        self.check(index)?;
        Ok(self.names[index].clone())
    }

    fn insert(&mut self, index: usize, name: &str) -> FsResult<()> {
        if index > self.names.len() {
            return Err(FsError::OutOfRange {
                index,
                len: self.names.len(),
            });
        }
        self.names.insert(index, name.to_string());
        Ok(())
    }

    fn remove(&mut self, index: usize) -> FsResult<()> {
        self.check(index)?;
        self.names.remove(index);
        Ok(())
    }
}

impl Persist for VecNames {
    fn serialized_size(&self) -> usize {
        ser::WORD + self.names.iter().map(|n| ser::WORD + n.len()).sum::<usize>()
    }

    fn serialize_into(&self, buf: &mut [u8], offset: &mut usize) {
        ser::put_u64(buf, offset, self.names.len() as u64);
        for name in &self.names {
            ser::put_u64(buf, offset, name.len() as u64);
            buf[*offset..*offset + name.len()].copy_from_slice(name.as_bytes());
            *offset += name.len();
        }
    }

    fn deserialize_from(buf: &[u8], offset: &mut usize) -> FsResult<Self> {
        let count = ser::get_u64(buf, offset)? as usize;
        // Every name carries at least its length word; a count the buffer
        // cannot hold must fail before any allocation happens.
        let remaining = buf.len() - *offset;
        if count
            .checked_mul(ser::WORD)
            .map_or(true, |need| need > remaining)
        {
            return Err(FsError::Corrupt(format!(
                "name sequence claims {count} names, buffer holds {remaining} bytes"
            )));
        }
        let mut names = Vec::with_capacity(count);
        for _ in 0..count {
            let len = ser::get_u64(buf, offset)? as usize;
            let bytes = ser::get_bytes(buf, offset, len)?;
            names.push(String::from_utf8_lossy(bytes).into_owned());
        }
        Ok(Self { names })
    }
}

/// Concatenated strategy: all names in one buffer, a boundary bit vector
/// marking each name's first character. Position lookups run on select1.
///
/// A name contributes its boundary bit through its first character, so the
/// empty name cannot be represented; callers keep names non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatNames<B> {
    text: Vec<u8>,
    boundaries: B,
}

impl<B: BitVector> ConcatNames<B> {
    fn check(&self, index: usize) -> FsResult<()> {
        if index >= self.len() {
            return Err(FsError::OutOfRange {
                index,
                len: self.len(),
            });
        }
        Ok(())
    }

    fn bounds(&self, index: usize) -> FsResult<(usize, usize)> {
        let start = self.boundaries.select1(index + 1)?;
        let end = if index + 1 == self.len() {
            self.text.len()
        } else {
            self.boundaries.select1(index + 2)?
        };
        Ok((start, end))
    }
}

impl<B: BitVector> NameSequence for ConcatNames<B> {
    fn new() -> Self {
        Self {
            text: Vec::new(),
            boundaries: B::zeros(0),
        }
    }

    fn len(&self) -> usize {
        self.boundaries.count_ones()
    }

    fn set(&mut self, index: usize, name: &str) -> FsResult<()> {
        self.check(index)?;
        self.remove(index)?;
        self.insert(index, name)
    }

    fn access(&self, index: usize) -> FsResult<String> {
        self.check(index)?;
        let (start, end) = self.bounds(index)?;
        Ok(String::from_utf8_lossy(&self.text[start..end]).into_owned())
    }

    fn insert(&mut self, index: usize, name: &str) -> FsResult<()> {
        if index > self.len() {
            return Err(FsError::OutOfRange {
                index,
                len: self.len(),
            });
        }
        debug_assert!(!name.is_empty(), "names must be non-empty");
        let char_pos = if index == 0 {
            0
        } else if index == self.len() {
            self.text.len()
        } else {
            self.boundaries.select1(index + 1)?
        };
        self.text.splice(char_pos..char_pos, name.bytes());
        for i in 0..name.len() {
            self.boundaries.insert(char_pos + i, i == 0)?;
        }
        Ok(())
    }

    fn remove(&mut self, index: usize) -> FsResult<()> {
        self.check(index)?;
        let (start, end) = self.bounds(index)?;
        self.text.drain(start..end);
        for _ in start..end {
            self.boundaries.remove(start)?;
        }
        Ok(())
    }
}

impl<B: BitVector> Persist for ConcatNames<B> {
    fn serialized_size(&self) -> usize {
        ser::WORD + self.text.len() + self.boundaries.serialized_size()
    }

    fn serialize_into(&self, buf: &mut [u8], offset: &mut usize) {
        ser::put_u64(buf, offset, self.text.len() as u64);
        buf[*offset..*offset + self.text.len()].copy_from_slice(&self.text);
        *offset += self.text.len();
        self.boundaries.serialize_into(buf, offset);
    }

    fn deserialize_from(buf: &[u8], offset: &mut usize) -> FsResult<Self> {
        let text_len = ser::get_u64(buf, offset)? as usize;
        let text = ser::get_bytes(buf, offset, text_len)?.to_vec();
        let boundaries = B::deserialize_from(buf, offset)?;
        if boundaries.len() != text.len() {
            return Err(FsError::Corrupt(format!(
                "name boundary vector covers {} characters, text has {}",
                boundaries.len(),
                text.len()
            )));
        }
        Ok(Self { text, boundaries })
    }
}
