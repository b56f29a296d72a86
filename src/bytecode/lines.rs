//! Run-length encoded mapping from bytecode offsets to source lines.

use super::buffer::GrowableBuffer;

/// First bytecode offset compiled from a given source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineStart {
    pub offset: usize,
    pub line: u32,
}

/// Line information for a chunk. Consecutive bytes from the same line share
/// one entry; entries are strictly increasing by offset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineTable {
    entries: GrowableBuffer<LineStart>,
}

impl LineTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the byte at `offset` came from `line`. Only starts a new
    /// entry when the line differs from the last one recorded.
    pub fn record(&mut self, offset: usize, line: u32) {
        if let Some(last) = self.entries.last() {
            if last.line == line {
                return;
            }
            debug_assert!(offset > last.offset, "line table offsets must increase");
        }
        self.entries.push(LineStart { offset, line });
    }

    /// Line owning `offset`: the last entry whose offset is <= `offset`.
    pub fn line_for_offset(&self, offset: usize) -> Option<u32> {
        let entries = self.entries.as_slice();
        let after = entries.partition_point(|entry| entry.offset <= offset);
        after.checked_sub(1).map(|i| entries[i].line)
    }

    pub fn entries(&self) -> &[LineStart] {
        self.entries.as_slice()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
