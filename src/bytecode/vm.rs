//! Stack-based virtual machine for executing bytecode.

use std::io::{self, Write};

use tracing::debug;

use crate::bytecode::chunk::Chunk;
use crate::bytecode::compiler::Compiler;
use crate::bytecode::disassembler::{ChunkListing, InstructionListing};
use crate::bytecode::instruction::OpCode;
use crate::bytecode::value::Value;
use crate::config::VmConfig;
use crate::error::{LoxError, RuntimeError};

/// Result type for VM execution.
pub type VmResult<T> = Result<T, RuntimeError>;

/// Coarse outcome of interpreting a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretResult {
    Ok,
    CompileError,
    RuntimeError,
}

impl InterpretResult {
    /// Conventional process exit code (sysexits) for this outcome.
    pub fn exit_code(self) -> i32 {
        match self {
            InterpretResult::Ok => 0,
            InterpretResult::CompileError => 65,
            InterpretResult::RuntimeError => 70,
        }
    }
}

impl From<&LoxError> for InterpretResult {
    fn from(error: &LoxError) -> Self {
        match error {
            LoxError::Compile(_) => InterpretResult::CompileError,
            LoxError::Runtime(_) | LoxError::Io(_) => InterpretResult::RuntimeError,
        }
    }
}

impl<T> From<&Result<T, LoxError>> for InterpretResult {
    fn from(result: &Result<T, LoxError>) -> Self {
        match result {
            Ok(_) => InterpretResult::Ok,
            Err(error) => error.into(),
        }
    }
}

/// Lifecycle of a VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    NotStarted,
    Running,
    HaltedOk,
    HaltedCompileError,
    HaltedRuntimeError,
}

/// The bytecode virtual machine.
///
/// Program output (the value printed by `OP_RETURN`, the execution trace and
/// the `print_code` listing) goes to `out`, stdout by default.
pub struct Vm<W: Write = io::Stdout> {
    config: VmConfig,
    /// The value stack, bounded by `config.stack_max`
    stack: Vec<Value>,
    /// Offset of the next byte to read
    ip: usize,
    /// Offset of the instruction being executed, for error lines
    instruction_start: usize,
    state: VmState,
    out: W,
}

impl Vm<io::Stdout> {
    /// Create a VM with the default configuration writing to stdout.
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    pub fn with_config(config: VmConfig) -> Self {
        Self::with_writer(config, io::stdout())
    }
}

impl Default for Vm<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Vm<W> {
    pub fn with_writer(config: VmConfig, out: W) -> Self {
        Self {
            stack: Vec::with_capacity(config.stack_max),
            config,
            ip: 0,
            instruction_start: 0,
            state: VmState::NotStarted,
            out,
        }
    }

    /// Compile and run `source`. Returns the value printed by `OP_RETURN`.
    pub fn interpret(&mut self, source: &str) -> Result<Value, LoxError> {
        let mut chunk = Chunk::new();
        if let Err(errors) = Compiler::compile(source, &mut chunk) {
            self.state = VmState::HaltedCompileError;
            return Err(errors.into());
        }

        if self.config.print_code {
            if let Err(e) = write!(self.out, "{}", ChunkListing::new(&chunk, "code")) {
                self.state = VmState::HaltedRuntimeError;
                return Err(RuntimeError::from(e).into());
            }
        }

        Ok(self.run(&chunk)?)
    }

    /// Execute a compiled chunk from its first byte.
    pub fn run(&mut self, chunk: &Chunk) -> VmResult<Value> {
        self.stack.clear();
        self.ip = 0;
        self.instruction_start = 0;
        self.state = VmState::Running;
        debug!(bytes = chunk.len(), "executing chunk");

        let result = self.execute(chunk);
        match &result {
            Ok(value) => {
                self.state = VmState::HaltedOk;
                debug!(%value, kind = value.type_name(), "execution finished");
            }
            Err(error) => {
                self.state = VmState::HaltedRuntimeError;
                self.stack.clear();
                debug!(%error, "runtime error");
            }
        }
        result
    }

    pub fn state(&self) -> VmState {
        self.state
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Current stack contents, bottom first.
    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_writer(self) -> W {
        self.out
    }

    /// Main execution loop.
    fn execute(&mut self, chunk: &Chunk) -> VmResult<Value> {
        loop {
            if self.config.trace_execution {
                self.trace(chunk)?;
            }

            self.instruction_start = self.ip;
            let byte = self.read_byte(chunk).ok_or_else(|| RuntimeError::UnexpectedEndOfCode {
                line: self
                    .ip
                    .checked_sub(1)
                    .and_then(|offset| chunk.line_at(offset)),
            })?;
            let opcode = OpCode::from_u8(byte).ok_or(RuntimeError::UnknownOpcode {
                opcode: byte,
                line: self.line(chunk),
            })?;

            match opcode {
                OpCode::Constant => {
                    let value = self.read_constant(chunk, opcode)?;
                    self.push(chunk, value)?;
                }

                OpCode::Add => self.binary_op(chunk, |a, b| a + b)?,
                OpCode::Subtract => self.binary_op(chunk, |a, b| a - b)?,
                OpCode::Multiply => self.binary_op(chunk, |a, b| a * b)?,
                OpCode::Divide => self.binary_op(chunk, |a, b| a / b)?,

                OpCode::Negate => {
                    let value = match self.pop(chunk)? {
                        Value::Number(n) => Value::Number(-n),
                    };
                    self.push(chunk, value)?;
                }

                OpCode::Return => {
                    let value = self.pop(chunk)?;
                    writeln!(self.out, "{}", value)?;
                    return Ok(value);
                }
            }
        }
    }

    fn trace(&mut self, chunk: &Chunk) -> io::Result<()> {
        write!(self.out, "          ")?;
        for slot in &self.stack {
            write!(self.out, "[ {} ]", slot)?;
        }
        writeln!(self.out)?;

        if self.ip < chunk.len() {
            write!(self.out, "{}", InstructionListing::new(chunk, self.ip))?;
        }
        Ok(())
    }

    fn line(&self, chunk: &Chunk) -> Option<u32> {
        chunk.line_at(self.instruction_start)
    }

    fn read_byte(&mut self, chunk: &Chunk) -> Option<u8> {
        let byte = chunk.code().get(self.ip).copied()?;
        self.ip += 1;
        Some(byte)
    }

    fn read_constant(&mut self, chunk: &Chunk, opcode: OpCode) -> VmResult<Value> {
        let index = self.read_byte(chunk).ok_or(RuntimeError::MissingOperand {
            opcode: opcode.mnemonic(),
            line: self.line(chunk),
        })?;
        chunk
            .constant(index as usize)
            .ok_or(RuntimeError::InvalidConstant {
                index,
                line: self.line(chunk),
            })
    }

    fn push(&mut self, chunk: &Chunk, value: Value) -> VmResult<()> {
        if self.stack.len() >= self.config.stack_max {
            return Err(RuntimeError::StackOverflow {
                line: self.line(chunk),
            });
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self, chunk: &Chunk) -> VmResult<Value> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow {
            line: self.line(chunk),
        })
    }

    /// Pop `b` then `a`, push `op(a, b)`.
    fn binary_op<F>(&mut self, chunk: &Chunk, op: F) -> VmResult<()>
    where
        F: FnOnce(f64, f64) -> f64,
    {
        let b = self.pop(chunk)?;
        let a = self.pop(chunk)?;
        let result = match (a, b) {
            (Value::Number(a), Value::Number(b)) => Value::Number(op(a, b)),
        };
        self.push(chunk, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileErrors;
    use pretty_assertions::assert_eq;

    fn vm() -> Vm<Vec<u8>> {
        Vm::with_writer(VmConfig::default(), Vec::new())
    }

    fn output(vm: Vm<Vec<u8>>) -> String {
        String::from_utf8(vm.into_writer()).unwrap()
    }

    fn chunk_of(bytes: &[u8], constants: &[f64]) -> Chunk {
        let mut chunk = Chunk::new();
        for &n in constants {
            chunk.add_constant(Value::Number(n));
        }
        for &byte in bytes {
            chunk.write_byte(byte, 1);
        }
        chunk
    }

    #[test]
    fn test_arithmetic() {
        let mut vm = vm();
        let value = vm.interpret("-(1.2 + 3.4) / 5.6").unwrap();
        assert_eq!(value, Value::Number(-(1.2 + 3.4) / 5.6));
        assert_eq!(vm.state(), VmState::HaltedOk);
        assert!(vm.stack().is_empty());
        assert_eq!(output(vm), "-0.821429\n");
    }

    #[test]
    fn test_precedence_and_associativity() {
        let mut vm = vm();
        assert_eq!(vm.interpret("1 + 2 * 3").unwrap(), Value::Number(7.0));
        assert_eq!(vm.interpret("(1 + 2) * 3").unwrap(), Value::Number(9.0));
        assert_eq!(vm.interpret("8 - 4 - 2").unwrap(), Value::Number(2.0));
        assert_eq!(vm.interpret("8 / 4 / 2").unwrap(), Value::Number(1.0));
        assert_eq!(output(vm), "7\n9\n2\n1\n");
    }

    #[test]
    fn test_division_by_zero_is_ieee() {
        let mut vm = vm();
        vm.interpret("1 / 0").unwrap();
        vm.interpret("-1 / 0").unwrap();
        assert_eq!(output(vm), "inf\n-inf\n");
    }

    #[test]
    fn test_compile_error_halts_before_running() {
        let mut vm = vm();
        let err = vm.interpret("1 +").unwrap_err();
        assert!(matches!(err, LoxError::Compile(CompileErrors(ref errors)) if errors.len() == 1));
        assert_eq!(InterpretResult::from(&err), InterpretResult::CompileError);
        assert_eq!(vm.state(), VmState::HaltedCompileError);
        assert_eq!(output(vm), "");
    }

    #[test]
    fn test_not_started() {
        assert_eq!(vm().state(), VmState::NotStarted);
    }

    #[test]
    fn test_trace_execution() {
        let config = VmConfig::default().with_trace_execution(true);
        let mut vm = Vm::with_writer(config, Vec::new());
        vm.interpret("-1").unwrap();
        assert_eq!(
            output(vm),
            "          \n\
             0000    1 OP_CONSTANT         0 '1'\n\
             \x20         [ 1 ]\n\
             0002    | OP_NEGATE\n\
             \x20         [ -1 ]\n\
             0003    | OP_RETURN\n\
             -1\n"
        );
    }

    #[test]
    fn test_print_code() {
        let config = VmConfig::default().with_print_code(true);
        let mut vm = Vm::with_writer(config, Vec::new());
        vm.interpret("2 * 3").unwrap();
        assert_eq!(
            output(vm),
            "== code ==\n\
             0000    1 OP_CONSTANT         0 '2'\n\
             0002    | OP_CONSTANT         1 '3'\n\
             0004    | OP_MULTIPLY\n\
             0005    | OP_RETURN\n\
             6\n"
        );
    }

    #[test]
    fn test_stack_overflow() {
        let config = VmConfig::default().with_stack_max(2);
        let mut vm = Vm::with_writer(config, Vec::new());
        // The right operand of each + is pushed before any add runs.
        let err = vm.interpret("1 + (2 + (3 + 4))").unwrap_err();
        assert!(matches!(
            err,
            LoxError::Runtime(RuntimeError::StackOverflow { line: Some(1) })
        ));
        assert_eq!(vm.state(), VmState::HaltedRuntimeError);
        assert!(vm.stack().is_empty());
    }

    #[test]
    fn test_default_stack_holds_deep_nesting() {
        let depth = 200;
        let source = format!("{}1{}", "(1 + ".repeat(depth), ")".repeat(depth));
        let mut vm = vm();
        assert_eq!(
            vm.interpret(&source).unwrap(),
            Value::Number(depth as f64 + 1.0)
        );
    }

    #[test]
    fn test_stack_underflow() {
        let mut vm = vm();
        let chunk = chunk_of(&[OpCode::Add as u8], &[]);
        let err = vm.run(&chunk).unwrap_err();
        assert!(matches!(err, RuntimeError::StackUnderflow { line: Some(1) }));
        assert_eq!(err.to_string(), "Stack underflow.\n[line 1] in script");
    }

    #[test]
    fn test_unknown_opcode() {
        let mut vm = vm();
        let err = vm.run(&chunk_of(&[99], &[])).unwrap_err();
        assert!(matches!(err, RuntimeError::UnknownOpcode { opcode: 99, .. }));
    }

    #[test]
    fn test_missing_operand() {
        let mut vm = vm();
        let err = vm.run(&chunk_of(&[OpCode::Constant as u8], &[])).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::MissingOperand {
                opcode: "OP_CONSTANT",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_constant() {
        let mut vm = vm();
        let chunk = chunk_of(&[OpCode::Constant as u8, 3, OpCode::Return as u8], &[1.0]);
        let err = vm.run(&chunk).unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidConstant { index: 3, .. }));
    }

    #[test]
    fn test_end_of_code_without_return() {
        let mut vm = vm();
        let chunk = chunk_of(&[OpCode::Constant as u8, 0], &[1.0]);
        let err = vm.run(&chunk).unwrap_err();
        assert!(matches!(err, RuntimeError::UnexpectedEndOfCode { line: Some(1) }));

        let err = vm.run(&Chunk::new()).unwrap_err();
        assert!(matches!(err, RuntimeError::UnexpectedEndOfCode { line: None }));
    }

    #[test]
    fn test_run_resets_between_programs() {
        let mut vm = vm();
        assert!(vm.interpret("1 +").is_err());
        assert_eq!(vm.interpret("40 + 2").unwrap(), Value::Number(42.0));
        assert_eq!(vm.state(), VmState::HaltedOk);
    }

    #[test]
    fn test_interpret_result_exit_codes() {
        let ok: Result<Value, LoxError> = Ok(Value::Number(1.0));
        assert_eq!(InterpretResult::from(&ok), InterpretResult::Ok);
        assert_eq!(InterpretResult::Ok.exit_code(), 0);
        assert_eq!(InterpretResult::CompileError.exit_code(), 65);
        assert_eq!(InterpretResult::RuntimeError.exit_code(), 70);
    }

    #[test]
    fn test_writer_is_shared_with_results() {
        let mut vm = vm();
        vm.writer_mut().extend_from_slice(b"> ");
        vm.interpret("6 * 7").unwrap();
        assert_eq!(output(vm), "> 42\n");
    }
}
