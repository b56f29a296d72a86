//! Binding power of operators, weakest first.

/// How tightly an operator binds. Variants are declared in ascending order,
/// so the derived `Ord` compares binding strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    None,
    Assignment,
    Or,
    And,
    Equality,
    Comparison,
    Term,
    Factor,
    Unary,
    Call,
    Primary,
}

impl Precedence {
    const LADDER: [Precedence; 11] = [
        Precedence::None,
        Precedence::Assignment,
        Precedence::Or,
        Precedence::And,
        Precedence::Equality,
        Precedence::Comparison,
        Precedence::Term,
        Precedence::Factor,
        Precedence::Unary,
        Precedence::Call,
        Precedence::Primary,
    ];

    /// One step tighter, saturating at `Primary`. A binary operator parses
    /// its right operand here, which makes it left-associative.
    pub fn next(self) -> Precedence {
        let step = (self as usize + 1).min(Self::LADDER.len() - 1);
        Self::LADDER[step]
    }
}
