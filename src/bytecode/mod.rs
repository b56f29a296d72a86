//! Bytecode compiler and virtual machine for Lox arithmetic expressions.
//!
//! # Architecture
//!
//! - `buffer`: Growable storage shared by the chunk's code, constants and lines
//! - `value`: Runtime values and their printed form
//! - `instruction`: OpCode definitions for the bytecode instruction set
//! - `lines`: Run-length offset to source line table
//! - `chunk`: Bytecode chunks containing instructions and a constant pool
//! - `compiler`: Single-pass Pratt compiler from source text to a chunk
//! - `vm`: Stack-based virtual machine for executing bytecode
//! - `disassembler`: Debug output for bytecode inspection

pub mod buffer;
pub mod chunk;
pub mod compiler;
pub mod disassembler;
pub mod instruction;
pub mod lines;
pub mod value;
pub mod vm;

pub use buffer::GrowableBuffer;
pub use chunk::Chunk;
pub use compiler::Compiler;
pub use disassembler::{disassemble_chunk, disassemble_instruction, print_disassembly};
pub use instruction::OpCode;
pub use lines::LineTable;
pub use value::Value;
pub use vm::{InterpretResult, Vm, VmResult, VmState};
