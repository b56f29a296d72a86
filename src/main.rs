//! loxvm CLI: run a script, evaluate an expression, or start the REPL.

use std::env;
use std::path::Path;
use std::process;

use loxvm::repl::Repl;
use loxvm::{InterpretResult, LoxError, VmConfig};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// CLI command to execute.
enum Command {
    /// Run a script file
    Run { file: String },
    /// Evaluate a string
    Eval { code: String },
    /// Compile a script and print its bytecode without running it
    Disassemble { file: String },
    /// Start the REPL
    Repl,
}

/// CLI options parsed from arguments.
struct Options {
    command: Command,
    config: VmConfig,
}

fn print_usage() {
    eprintln!("loxvm {} - Lox bytecode VM", VERSION);
    eprintln!();
    eprintln!("Usage: loxvm [options] [script]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --trace         Print the stack and each instruction as it executes");
    eprintln!("  --print-code    Print the compiled bytecode before running");
    eprintln!("  --disassemble   Compile the script and print its bytecode, don't run it");
    eprintln!("  -e <expr>       Evaluate an expression and print the result");
    eprintln!("  --help, -h      Show this help message");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LOX_TRACE_EXECUTION, LOX_PRINT_CODE, LOX_STACK_MAX");
    eprintln!("  RUST_LOG        Log filter for diagnostics on stderr (e.g. loxvm=debug)");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  loxvm                         Start interactive REPL");
    eprintln!("  loxvm expr.lox                Run a script file");
    eprintln!("  loxvm -e '(1 + 2) * 3'        Evaluate an expression");
    eprintln!("  loxvm --disassemble expr.lox  Show the bytecode for a script");
}

fn usage_error(message: &str) -> ! {
    eprintln!("{}", message);
    print_usage();
    process::exit(64);
}

fn parse_args() -> Options {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut config = VmConfig::from_env();
    let mut disassemble = false;
    let mut code = None;
    let mut file = None;

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            "--trace" => config = config.with_trace_execution(true),
            "--print-code" => config = config.with_print_code(true),
            "--disassemble" => disassemble = true,
            "-e" => {
                i += 1;
                match args.get(i) {
                    Some(expr) => code = Some(expr.clone()),
                    None => usage_error("-e requires an expression"),
                }
            }
            arg if arg.starts_with('-') => usage_error(&format!("Unknown option: {}", arg)),
            _ => {
                if file.is_some() {
                    usage_error(&format!("Unexpected argument: {}", arg));
                }
                file = Some(arg.clone());
            }
        }
        i += 1;
    }

    let command = match (code, file) {
        (Some(_), Some(_)) => usage_error("Cannot combine -e with a script"),
        (Some(code), None) if !disassemble => Command::Eval { code },
        (Some(_), None) => usage_error("--disassemble requires a script"),
        (None, Some(file)) if disassemble => Command::Disassemble { file },
        (None, Some(file)) => Command::Run { file },
        (None, None) if disassemble => usage_error("--disassemble requires a script"),
        (None, None) => Command::Repl,
    };

    Options { command, config }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();
    let options = parse_args();

    match options.command {
        Command::Repl => run_repl(options.config),
        Command::Run { file } => run_file(&file, options.config),
        Command::Eval { code } => run_eval(&code, options.config),
        Command::Disassemble { file } => run_disassemble(&file),
    }
}

fn exit_with(result: Result<loxvm::Value, LoxError>) {
    if let Err(e) = &result {
        eprintln!("{}", e);
    }
    let code = InterpretResult::from(&result).exit_code();
    if code != 0 {
        process::exit(code);
    }
}

fn read_source(file: &str) -> String {
    match std::fs::read_to_string(file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Could not read file \"{}\": {}", file, e);
            process::exit(74);
        }
    }
}

fn run_file(file: &str, config: VmConfig) {
    tracing::debug!(file, "running script");
    match loxvm::run_file(Path::new(file), config) {
        Err(LoxError::Io(e)) => {
            eprintln!("Could not read file \"{}\": {}", file, e);
            process::exit(74);
        }
        result => exit_with(result),
    }
}

fn run_eval(code: &str, config: VmConfig) {
    exit_with(loxvm::interpret_with_config(code, config));
}

fn run_disassemble(file: &str) {
    let source = read_source(file);
    match loxvm::compile(&source) {
        Ok(chunk) => loxvm::bytecode::print_disassembly(&chunk, file),
        Err(errors) => {
            eprintln!("{}", errors);
            process::exit(InterpretResult::CompileError.exit_code());
        }
    }
}

fn run_repl(config: VmConfig) {
    if let Err(e) = Repl::new(config).run() {
        eprintln!("Error: {}", e);
        process::exit(74);
    }
}
