//! Line-at-a-time REPL: each line is compiled and run as one expression.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use colored::Colorize;
use tracing::debug;

use crate::bytecode::vm::{InterpretResult, Vm};
use crate::config::VmConfig;

const HISTORY_FILE: &str = ".loxvm_history";
const PROMPT: &str = "> ";

pub struct Repl<W: Write = io::Stdout> {
    vm: Vm<W>,
    history: Vec<String>,
    history_file: Option<PathBuf>,
}

impl Repl<io::Stdout> {
    /// A REPL printing to stdout, with history kept in `~/.loxvm_history`.
    pub fn new(config: VmConfig) -> Self {
        Self::with_vm(Vm::with_config(config), Some(Self::history_path()))
    }

    fn history_path() -> PathBuf {
        if let Some(home) = dirs::home_dir() {
            home.join(HISTORY_FILE)
        } else {
            PathBuf::from(HISTORY_FILE)
        }
    }
}

impl<W: Write> Repl<W> {
    /// Build a REPL around an existing VM. `None` disables persistent history.
    pub fn with_vm(vm: Vm<W>, history_file: Option<PathBuf>) -> Self {
        let mut repl = Self {
            vm,
            history: Vec::new(),
            history_file,
        };
        repl.load_history();
        repl
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn vm(&self) -> &Vm<W> {
        &self.vm
    }

    pub fn into_vm(self) -> Vm<W> {
        self.vm
    }

    fn load_history(&mut self) {
        let Some(path) = &self.history_file else {
            return;
        };
        if let Ok(content) = std::fs::read_to_string(path) {
            self.history.extend(
                content
                    .lines()
                    .filter(|line| !line.trim().is_empty())
                    .map(str::to_string),
            );
        }
    }

    fn save_history(&self) {
        let Some(path) = &self.history_file else {
            return;
        };
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                debug!(path = %parent.display(), error = %e, "could not create history directory");
            }
        }
        if let Err(e) = std::fs::write(path, self.history.join("\n")) {
            debug!(path = %path.display(), error = %e, "could not save history");
        }
    }

    /// Read lines from stdin until EOF or `.exit`.
    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        self.run_with(stdin.lock())
    }

    /// Read lines from `input` until EOF or `.exit`. The prompt goes to
    /// stdout; results go to the VM's writer.
    pub fn run_with<R: BufRead>(&mut self, mut input: R) -> io::Result<()> {
        loop {
            print!("{}", PROMPT);
            io::stdout().flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                println!();
                break;
            }

            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            if line == ".exit" || line == ".quit" {
                break;
            }

            self.history.push(line.to_string());
            self.handle_line(line);
        }

        self.save_history();
        Ok(())
    }

    /// Handle one line of input: a dot-command or an expression.
    pub fn handle_line(&mut self, line: &str) -> InterpretResult {
        match line {
            ".help" => {
                self.cmd_help();
                InterpretResult::Ok
            }
            ".history" => {
                self.cmd_history();
                InterpretResult::Ok
            }
            _ if line.starts_with(".load ") => self.cmd_load(line[".load ".len()..].trim()),
            _ => self.eval(line),
        }
    }

    /// Compile and run one expression. Errors are reported on stderr and
    /// never end the session.
    pub fn eval(&mut self, source: &str) -> InterpretResult {
        let result = self.vm.interpret(source);
        if let Err(e) = self.vm.writer_mut().flush() {
            debug!(error = %e, "could not flush output");
        }
        if let Err(e) = &result {
            eprintln!("{}", e.to_string().red());
        }
        InterpretResult::from(&result)
    }

    fn cmd_help(&self) {
        println!();
        println!("Lox REPL Commands");
        println!();
        println!(".help          - Show this help message");
        println!(".history       - Show command history");
        println!(".load <file>   - Load and evaluate a file");
        println!(".exit          - Exit the REPL");
        println!();
        println!("Anything else is evaluated as an arithmetic expression.");
        println!();
    }

    fn cmd_history(&self) {
        println!("History:");
        for (i, entry) in self.history.iter().enumerate() {
            println!("{:4}  {}", i + 1, entry);
        }
    }

    fn cmd_load(&mut self, filename: &str) -> InterpretResult {
        match std::fs::read_to_string(filename) {
            Ok(source) => self.eval(&source),
            Err(e) => {
                eprintln!("{}", format!("Could not read file \"{}\": {}", filename, e).red());
                InterpretResult::RuntimeError
            }
        }
    }
}
