//! Edit descriptors and row/column positions.

use std::ops::Range;

use crate::Error;

/// Zero-based row and byte column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.row, self.column)
    }
}

/// One contiguous replacement: bytes `start_byte..old_end_byte` of the old
/// text became `start_byte..new_end_byte` of the new text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InputEdit {
    pub start_byte: usize,
    pub old_end_byte: usize,
    pub new_end_byte: usize,
    pub start_position: Point,
    pub old_end_position: Point,
    pub new_end_position: Point,
}

impl InputEdit {
    /// Replace `range` of `old` with `text`. Returns the edit and the new text.
    ///
    /// # Panics
    ///
    /// If `range` is reversed or ends past `old`.
    pub fn splice(old: &[u8], range: Range<usize>, text: &[u8]) -> (Self, Vec<u8>) {
        assert!(
            range.start <= range.end && range.end <= old.len(),
            "splice range {range:?} is outside the text ({} bytes)",
            old.len()
        );
        let mut new = Vec::with_capacity(old.len() - range.len() + text.len());
        new.extend_from_slice(&old[..range.start]);
        new.extend_from_slice(text);
        new.extend_from_slice(&old[range.end..]);

        let old_lines = LineIndex::new(old);
        let new_lines = LineIndex::new(&new);
        let new_end = range.start + text.len();
        let edit = Self {
            start_byte: range.start,
            old_end_byte: range.end,
            new_end_byte: new_end,
            start_position: old_lines.point(range.start),
            old_end_position: old_lines.point(range.end),
            new_end_position: new_lines.point(new_end),
        };
        (edit, new)
    }

    pub(crate) fn validate(&self, old_len: usize, new_len: usize) -> Result<(), Error> {
        if self.start_byte > self.old_end_byte || self.start_byte > self.new_end_byte {
            return Err(Error::InvalidEdit(format!(
                "edit starts at {} after its end",
                self.start_byte
            )));
        }
        if self.old_end_byte > old_len {
            return Err(Error::InvalidEdit(format!(
                "old end {} is past the old text ({old_len} bytes)",
                self.old_end_byte
            )));
        }
        let expected = old_len - (self.old_end_byte - self.start_byte)
            + (self.new_end_byte - self.start_byte);
        if expected != new_len {
            return Err(Error::InvalidEdit(format!(
                "new text is {new_len} bytes, edit implies {expected}"
            )));
        }
        Ok(())
    }

    /// Position in the old text that `new_pos` came from. `None` inside the
    /// replaced range.
    pub(crate) fn to_old(&self, new_pos: usize) -> Option<usize> {
        if new_pos < self.start_byte {
            Some(new_pos)
        } else if new_pos >= self.new_end_byte {
            Some(new_pos - self.new_end_byte + self.old_end_byte)
        } else {
            None
        }
    }
}

/// Byte offsets of line starts, for offset-to-point conversion.
#[derive(Clone, Debug)]
pub(crate) struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &[u8]) -> Self {
        let mut starts = vec![0];
        starts.extend(
            source
                .iter()
                .enumerate()
                .filter(|&(_, &b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { starts }
    }

    pub fn point(&self, offset: usize) -> Point {
        let row = self.starts.partition_point(|&start| start <= offset) - 1;
        Point::new(row, offset - self.starts[row])
    }
}
