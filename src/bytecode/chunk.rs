//! Bytecode chunk containing instructions, constants and line information.

use crate::bytecode::buffer::GrowableBuffer;
use crate::bytecode::instruction::OpCode;
use crate::bytecode::lines::LineTable;
use crate::bytecode::value::Value;

/// A chunk of bytecode: the unit produced by the compiler and run by the VM.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    /// The bytecode instructions.
    code: GrowableBuffer<u8>,
    /// The constant pool.
    constants: GrowableBuffer<Value>,
    /// Line information for every byte in `code`.
    lines: LineTable,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write an opcode to the chunk.
    pub fn write_op(&mut self, op: OpCode, line: u32) {
        self.write_byte(op.into(), line);
    }

    /// Write a raw byte to the chunk, recording its source line.
    pub fn write_byte(&mut self, byte: u8, line: u32) {
        let offset = self.code.push(byte);
        self.lines.record(offset, line);
    }

    /// Add a constant to the pool and return its index. Indices are never
    /// reused; callers check that the index fits their operand width.
    pub fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value)
    }

    pub fn constant(&self, index: usize) -> Option<Value> {
        self.constants.get(index).copied()
    }

    /// Source line of the byte at `offset`.
    pub fn line_at(&self, offset: usize) -> Option<u32> {
        self.lines.line_for_offset(offset)
    }

    /// Offset of the instruction following the one at `offset`.
    pub fn next_offset(&self, offset: usize) -> usize {
        let operands = self
            .code
            .get(offset)
            .and_then(|byte| OpCode::from_u8(*byte))
            .map_or(0, OpCode::operand_size);
        offset + 1 + operands
    }

    pub fn code(&self) -> &[u8] {
        self.code.as_slice()
    }

    pub fn constants(&self) -> &[Value] {
        self.constants.as_slice()
    }

    pub fn lines(&self) -> &LineTable {
        &self.lines
    }

    /// Get the current offset (next instruction index).
    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}
