//! Runtime configuration for the compiler and VM.
//!
//! Settings come from defaults, then environment variables, then whatever
//! the caller sets through the builder methods (the CLI maps its flags onto
//! those).

use tracing::warn;

/// Default bound on the VM value stack.
pub const DEFAULT_STACK_MAX: usize = 256;

pub const TRACE_EXECUTION_VAR: &str = "LOX_TRACE_EXECUTION";
pub const PRINT_CODE_VAR: &str = "LOX_PRINT_CODE";
pub const STACK_MAX_VAR: &str = "LOX_STACK_MAX";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmConfig {
    /// Print the stack and each instruction before it executes.
    pub trace_execution: bool,
    /// Print the disassembled chunk after a successful compile.
    pub print_code: bool,
    /// Maximum number of values on the VM stack.
    pub stack_max: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            trace_execution: false,
            print_code: false,
            stack_max: DEFAULT_STACK_MAX,
        }
    }
}

impl VmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `LOX_TRACE_EXECUTION`, `LOX_PRINT_CODE` and
    /// `LOX_STACK_MAX`.
    pub fn from_env() -> Self {
        Self::default().apply_env(|key| std::env::var(key).ok())
    }

    fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(TRACE_EXECUTION_VAR) {
            self.trace_execution = is_enabled(&value);
        }
        if let Some(value) = lookup(PRINT_CODE_VAR) {
            self.print_code = is_enabled(&value);
        }
        if let Some(value) = lookup(STACK_MAX_VAR) {
            match value.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.stack_max = n,
                _ => warn!(
                    var = STACK_MAX_VAR,
                    value = %value,
                    "ignoring invalid stack size, expected a positive integer"
                ),
            }
        }
        self
    }

    pub fn with_trace_execution(mut self, enabled: bool) -> Self {
        self.trace_execution = enabled;
        self
    }

    pub fn with_print_code(mut self, enabled: bool) -> Self {
        self.print_code = enabled;
        self
    }

    pub fn with_stack_max(mut self, stack_max: usize) -> Self {
        self.stack_max = stack_max;
        self
    }
}

fn is_enabled(value: &str) -> bool {
    value != "false" && value != "0"
}
