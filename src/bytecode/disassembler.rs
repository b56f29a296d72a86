//! Bytecode disassembler for debugging.
//!
//! Output format, one instruction per line:
//!
//! ```text
//! == code ==
//! 0000    1 OP_CONSTANT         0 '1.2'
//! 0002    | OP_NEGATE
//! 0003    | OP_RETURN
//! ```

use std::fmt::{self, Write};

use crate::bytecode::chunk::Chunk;
use crate::bytecode::instruction::OpCode;

/// Disassemble a whole chunk under a `== name ==` header.
pub fn disassemble_chunk(chunk: &Chunk, name: &str) -> String {
    ChunkListing::new(chunk, name).to_string()
}

/// Print the disassembly of a chunk to stdout.
pub fn print_disassembly(chunk: &Chunk, name: &str) {
    print!("{}", ChunkListing::new(chunk, name));
}

/// Disassemble the instruction at `offset`, writing one line to `out`.
/// Returns the offset of the next instruction.
pub fn disassemble_instruction<W: Write>(
    chunk: &Chunk,
    offset: usize,
    out: &mut W,
) -> Result<usize, fmt::Error> {
    write!(out, "{:04} ", offset)?;

    // Line number, or | if same as previous
    let line = chunk.line_at(offset);
    if offset > 0 && line == chunk.line_at(offset - 1) {
        out.write_str("   | ")?;
    } else {
        match line {
            Some(line) => write!(out, "{:4} ", line)?,
            None => out.write_str("   ? ")?,
        }
    }

    let code = chunk.code();
    let Some(&byte) = code.get(offset) else {
        writeln!(out, "<end of code>")?;
        return Ok(offset + 1);
    };

    let Some(op) = OpCode::from_u8(byte) else {
        writeln!(out, "Unknown opcode {}", byte)?;
        return Ok(offset + 1);
    };

    match op {
        OpCode::Constant => constant_instruction(chunk, op, offset, out),
        OpCode::Add
        | OpCode::Subtract
        | OpCode::Multiply
        | OpCode::Divide
        | OpCode::Negate
        | OpCode::Return => simple_instruction(op, offset, out),
    }
}

fn simple_instruction<W: Write>(op: OpCode, offset: usize, out: &mut W) -> Result<usize, fmt::Error> {
    writeln!(out, "{}", op.mnemonic())?;
    Ok(offset + 1)
}

fn constant_instruction<W: Write>(
    chunk: &Chunk,
    op: OpCode,
    offset: usize,
    out: &mut W,
) -> Result<usize, fmt::Error> {
    let Some(&index) = chunk.code().get(offset + 1) else {
        writeln!(out, "{} <missing operand>", op.mnemonic())?;
        return Ok(chunk.len());
    };

    write!(out, "{:<16} {:4} '", op.mnemonic(), index)?;
    match chunk.constant(index as usize) {
        Some(value) => write!(out, "{}", value)?,
        None => out.write_str("<invalid>")?,
    }
    writeln!(out, "'")?;

    Ok(offset + 2)
}

/// Display adapter for a full chunk listing.
pub struct ChunkListing<'a> {
    chunk: &'a Chunk,
    name: &'a str,
}

impl<'a> ChunkListing<'a> {
    pub fn new(chunk: &'a Chunk, name: &'a str) -> Self {
        Self { chunk, name }
    }
}

impl fmt::Display for ChunkListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.name)?;

        let mut offset = 0;
        while offset < self.chunk.len() {
            offset = disassemble_instruction(self.chunk, offset, f)?;
        }
        Ok(())
    }
}

/// Display adapter for the single instruction at `offset`. Used by the VM's
/// execution trace.
pub struct InstructionListing<'a> {
    chunk: &'a Chunk,
    offset: usize,
}

impl<'a> InstructionListing<'a> {
    pub fn new(chunk: &'a Chunk, offset: usize) -> Self {
        Self { chunk, offset }
    }
}

impl fmt::Display for InstructionListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        disassemble_instruction(self.chunk, self.offset, f).map(|_| ())
    }
}
