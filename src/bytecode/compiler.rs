//! Single-pass compiler: parses Lox expressions with a Pratt parser and emits
//! bytecode into a chunk as it goes. There is no intermediate AST.

use tracing::debug;

use crate::bytecode::chunk::Chunk;
use crate::bytecode::instruction::OpCode;
use crate::bytecode::value::Value;
use crate::error::{CompileError, CompileErrors, ErrorLocation};
use crate::lexer::{Scanner, Token, TokenKind};
use crate::parser::{rule_for, InfixRule, Precedence, PrefixRule};

/// Largest constant index that fits the one-byte operand of `OP_CONSTANT`.
const MAX_CONSTANT_INDEX: usize = u8::MAX as usize;

/// Deepest run of groupings and unary operators the compiler will recurse
/// into before reporting an error.
pub const MAX_NESTING: usize = 256;

/// The bytecode compiler.
///
/// Holds the parser state for one compilation. After the first diagnostic
/// the compiler enters panic mode and suppresses further reports; it keeps
/// parsing so that the chunk still ends with a return.
pub struct Compiler<'src, 'c> {
    scanner: Scanner<'src>,
    chunk: &'c mut Chunk,
    current: Token<'src>,
    previous: Token<'src>,
    panic_mode: bool,
    depth: usize,
    errors: Vec<CompileError>,
}

impl<'src, 'c> Compiler<'src, 'c> {
    fn new(source: &'src str, chunk: &'c mut Chunk) -> Self {
        Self {
            scanner: Scanner::new(source),
            chunk,
            current: Token::eof(1),
            previous: Token::eof(1),
            panic_mode: false,
            depth: 0,
            errors: Vec::new(),
        }
    }

    /// Compile a single expression from `source` into `chunk`, followed by
    /// `OP_RETURN`.
    ///
    /// Bytes are appended to `chunk` even when compilation fails; callers
    /// must not execute a chunk whose compilation returned `Err`.
    pub fn compile(source: &'src str, chunk: &'c mut Chunk) -> Result<(), CompileErrors> {
        let mut compiler = Compiler::new(source, chunk);

        compiler.advance();
        compiler.expression();
        compiler.consume(TokenKind::Eof, "Expect end of expression.");
        compiler.end();

        if compiler.had_error() {
            debug!(errors = compiler.errors.len(), "compilation failed");
            Err(CompileErrors(compiler.errors))
        } else {
            Ok(())
        }
    }

    fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }

    // ---------------------------------------------------------------
    // Token stream
    // ---------------------------------------------------------------

    fn advance(&mut self) {
        self.previous = self.current;

        loop {
            self.current = self.scanner.scan_token();
            if self.current.kind != TokenKind::Error {
                break;
            }
            let message = self.current.lexeme;
            self.error_at_current(message);
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) {
        if self.current.kind == kind {
            self.advance();
            return;
        }
        self.error_at_current(message);
    }

    // ---------------------------------------------------------------
    // Diagnostics
    // ---------------------------------------------------------------

    fn error_at_current(&mut self, message: &str) {
        let token = self.current;
        self.error_at(token, message);
    }

    fn error(&mut self, message: &str) {
        let token = self.previous;
        self.error_at(token, message);
    }

    fn error_at(&mut self, token: Token<'src>, message: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;

        let location = match token.kind {
            TokenKind::Eof => ErrorLocation::AtEnd,
            TokenKind::Error => ErrorLocation::Unlocated,
            _ => ErrorLocation::AtLexeme(token.lexeme.to_string()),
        };
        let error = CompileError::new(token.line, location, message);
        debug!(%error, "compile error");
        self.errors.push(error);
    }

    // ---------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    /// Parse any expression whose operators bind at least as tightly as
    /// `precedence`.
    fn parse_precedence(&mut self, precedence: Precedence) {
        self.advance();

        let Some(prefix) = rule_for(self.previous.kind).prefix else {
            self.error("Expect expression.");
            return;
        };
        self.prefix(prefix);

        while precedence <= rule_for(self.current.kind).precedence {
            self.advance();
            match rule_for(self.previous.kind).infix {
                Some(infix) => self.infix(infix),
                None => break,
            }
        }
    }

    fn prefix(&mut self, rule: PrefixRule) {
        match rule {
            PrefixRule::Grouping => self.grouping(),
            PrefixRule::Unary => self.unary(),
            PrefixRule::Number => self.number(),
        }
    }

    fn infix(&mut self, rule: InfixRule) {
        match rule {
            InfixRule::Binary => self.binary(),
        }
    }

    fn number(&mut self) {
        match self.previous.lexeme.parse::<f64>() {
            Ok(n) => self.emit_constant(Value::Number(n)),
            Err(_) => self.error("Invalid number literal."),
        }
    }

    /// Run `parse` one nesting level deeper. Past `MAX_NESTING` it reports
    /// an error and skips `parse`, so the native stack stays bounded.
    fn nested(&mut self, parse: impl FnOnce(&mut Self)) {
        if self.depth >= MAX_NESTING {
            self.error("Expression nests too deeply.");
            return;
        }
        self.depth += 1;
        parse(self);
        self.depth -= 1;
    }

    fn grouping(&mut self) {
        self.nested(Self::expression);
        self.consume(TokenKind::RightParen, "Expect ')' after expression.");
    }

    fn unary(&mut self) {
        let operator = self.previous.kind;

        // Operand first, so it is on the stack when the operator runs.
        self.nested(|c| c.parse_precedence(Precedence::Unary));

        if operator == TokenKind::Minus {
            self.emit_op(OpCode::Negate);
        }
    }

    fn binary(&mut self) {
        let operator = self.previous.kind;
        let rule = rule_for(operator);

        // Left-associative: the right operand binds one level tighter.
        self.parse_precedence(rule.precedence.next());

        let op = match operator {
            TokenKind::Plus => OpCode::Add,
            TokenKind::Minus => OpCode::Subtract,
            TokenKind::Star => OpCode::Multiply,
            TokenKind::Slash => OpCode::Divide,
            _ => return,
        };
        self.emit_op(op);
    }

    // ---------------------------------------------------------------
    // Emission
    // ---------------------------------------------------------------

    /// Bytes take the line of the most recently consumed token, so an
    /// operator lands on the line where its right operand ends.
    fn emit_op(&mut self, op: OpCode) {
        let line = self.previous.line;
        self.chunk.write_op(op, line);
    }

    fn emit_constant(&mut self, value: Value) {
        let line = self.previous.line;
        let index = self.make_constant(value);
        self.chunk.write_op(OpCode::Constant, line);
        self.chunk.write_byte(index, line);
    }

    fn make_constant(&mut self, value: Value) -> u8 {
        let index = self.chunk.add_constant(value);
        if index > MAX_CONSTANT_INDEX {
            self.error("Too many constants in one chunk.");
            return 0;
        }
        index as u8
    }

    fn end(&mut self) {
        self.emit_op(OpCode::Return);
        debug!(
            bytes = self.chunk.len(),
            constants = self.chunk.constants().len(),
            "compiled chunk"
        );
    }
}
