//! loxvm: a bytecode compiler and stack VM for Lox arithmetic expressions.
//!
//! Source text is compiled in a single pass into a [`Chunk`] of bytecode,
//! which the [`Vm`] then executes:
//!
//! ```text
//! source -> Scanner -> Compiler (Pratt parser) -> Chunk -> Vm -> Value
//! ```

pub mod bytecode;
pub mod config;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod repl;

use std::path::Path;

pub use bytecode::{Chunk, Compiler, InterpretResult, OpCode, Value, Vm, VmState};
pub use config::VmConfig;
pub use error::{CompileError, CompileErrors, LoxError, RuntimeError};

/// Compile source code to bytecode without executing.
pub fn compile(source: &str) -> Result<Chunk, CompileErrors> {
    let mut chunk = Chunk::new();
    Compiler::compile(source, &mut chunk)?;
    Ok(chunk)
}

/// Compile and run `source` with the default configuration, printing the
/// result to stdout.
pub fn interpret(source: &str) -> Result<Value, LoxError> {
    interpret_with_config(source, VmConfig::default())
}

/// Compile and run `source`, printing the result to stdout.
pub fn interpret_with_config(source: &str, config: VmConfig) -> Result<Value, LoxError> {
    Vm::with_config(config).interpret(source)
}

/// Run a program from a file path.
pub fn run_file(path: &Path, config: VmConfig) -> Result<Value, LoxError> {
    let source = std::fs::read_to_string(path)?;
    interpret_with_config(&source, config)
}

/// Disassemble compiled bytecode to a string.
pub fn disassemble(chunk: &Chunk, name: &str) -> String {
    bytecode::disassemble_chunk(chunk, name)
}
