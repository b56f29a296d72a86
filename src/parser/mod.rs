//! Expression grammar tables for the single-pass compiler.
//!
//! The compiler in `crate::bytecode::compiler` drives parsing and code
//! generation together; this module only describes the grammar: how
//! tightly each operator binds and which parse action a token starts.

mod precedence;
mod rules;

pub use precedence::Precedence;
pub use rules::{rule_for, InfixRule, ParseRule, PrefixRule};
