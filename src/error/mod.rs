//! Error types for all compilation and execution phases.

use std::fmt;

use thiserror::Error;

/// Where in the source a compile diagnostic points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorLocation {
    /// The end-of-input token.
    AtEnd,
    /// A regular token; holds its lexeme.
    AtLexeme(String),
    /// A scanner error token, whose text is already the message.
    Unlocated,
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorLocation::AtEnd => write!(f, " at end"),
            ErrorLocation::AtLexeme(lexeme) => write!(f, " at '{}'", lexeme),
            ErrorLocation::Unlocated => Ok(()),
        }
    }
}

/// A single compile diagnostic (lexical, syntax or capacity error).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[line {line}] Error{location}: {message}")]
pub struct CompileError {
    pub line: u32,
    pub location: ErrorLocation,
    pub message: String,
}

impl CompileError {
    pub fn new(line: u32, location: ErrorLocation, message: impl Into<String>) -> Self {
        Self {
            line,
            location,
            message: message.into(),
        }
    }
}

/// Every diagnostic reported by one failed compile, in report order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct CompileErrors(pub Vec<CompileError>);

impl CompileErrors {
    pub fn iter(&self) -> std::slice::Iter<'_, CompileError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&CompileError> {
        self.0.first()
    }
}

impl fmt::Display for CompileErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a CompileErrors {
    type Item = &'a CompileError;
    type IntoIter = std::slice::Iter<'a, CompileError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn in_script(line: &Option<u32>) -> String {
    match line {
        Some(line) => format!("\n[line {}] in script", line),
        None => String::new(),
    }
}

/// Runtime errors raised by the virtual machine.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Stack overflow.{}", in_script(.line))]
    StackOverflow { line: Option<u32> },

    #[error("Stack underflow.{}", in_script(.line))]
    StackUnderflow { line: Option<u32> },

    #[error("Unknown opcode {opcode}.{}", in_script(.line))]
    UnknownOpcode { opcode: u8, line: Option<u32> },

    #[error("Missing operand for {opcode}.{}", in_script(.line))]
    MissingOperand {
        opcode: &'static str,
        line: Option<u32>,
    },

    #[error("Constant index {index} out of range.{}", in_script(.line))]
    InvalidConstant { index: u8, line: Option<u32> },

    #[error("Reached end of bytecode without a return.{}", in_script(.line))]
    UnexpectedEndOfCode { line: Option<u32> },

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl RuntimeError {
    /// Source line of the instruction that failed, when known.
    pub fn line(&self) -> Option<u32> {
        match self {
            Self::StackOverflow { line }
            | Self::StackUnderflow { line }
            | Self::UnknownOpcode { line, .. }
            | Self::MissingOperand { line, .. }
            | Self::InvalidConstant { line, .. }
            | Self::UnexpectedEndOfCode { line } => *line,
            Self::Output(_) => None,
        }
    }
}

/// A unified error type for all phases.
#[derive(Debug, Error)]
pub enum LoxError {
    #[error("{0}")]
    Compile(#[from] CompileErrors),

    #[error("{0}")]
    Runtime(#[from] RuntimeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
