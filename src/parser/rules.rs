//! Per-token parse rules: which prefix and infix action a token starts and
//! how tightly it binds as an infix operator.

use super::precedence::Precedence;
use crate::lexer::TokenKind;

/// Parse actions a token can start in prefix position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixRule {
    Grouping,
    Unary,
    Number,
}

/// Parse actions a token can continue in infix position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixRule {
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseRule {
    pub prefix: Option<PrefixRule>,
    pub infix: Option<InfixRule>,
    pub precedence: Precedence,
}

impl ParseRule {
    const fn new(
        prefix: Option<PrefixRule>,
        infix: Option<InfixRule>,
        precedence: Precedence,
    ) -> Self {
        Self {
            prefix,
            infix,
            precedence,
        }
    }

    const NONE: ParseRule = ParseRule::new(None, None, Precedence::None);
}

/// Look up the rule for a token kind. Kinds the grammar does not use yet
/// have neither action and `Precedence::None`.
pub fn rule_for(kind: TokenKind) -> ParseRule {
    use InfixRule::Binary;
    use PrefixRule::{Grouping, Number, Unary};

    match kind {
        TokenKind::LeftParen => ParseRule::new(Some(Grouping), None, Precedence::None),
        TokenKind::Minus => ParseRule::new(Some(Unary), Some(Binary), Precedence::Term),
        TokenKind::Plus => ParseRule::new(None, Some(Binary), Precedence::Term),
        TokenKind::Slash | TokenKind::Star => {
            ParseRule::new(None, Some(Binary), Precedence::Factor)
        }
        TokenKind::Number => ParseRule::new(Some(Number), None, Precedence::None),
        _ => ParseRule::NONE,
    }
}
