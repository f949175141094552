//! The front-end error taxonomy (spec.md §7): `LexerError`, `ParseError`,
//! and the parser-only `SyntaxError` subset of parse failures.

use regexlab_core::Span;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexerError {
    #[error("pattern is too short to contain a delimiter pair")]
    PatternTooShort,

    #[error("opening delimiter '{0}' has no matching closing delimiter")]
    UnterminatedDelimiter(char),

    #[error("unknown flag '{0}' at offset {1}")]
    UnknownFlag(char, u32),

    #[error("malformed escape sequence at offset {0}")]
    MalformedEscape(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at offset {offset}{}", expectation.as_deref().map(|e| format!(", expected {e}")).unwrap_or_default())]
pub struct ParseError {
    pub message: String,
    pub offset: u32,
    pub expectation: Option<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, offset: u32) -> Self {
        Self { message: message.into(), offset, expectation: None }
    }

    pub fn expected(message: impl Into<String>, offset: u32, expectation: impl Into<String>) -> Self {
        Self { message: message.into(), offset, expectation: Some(expectation.into()) }
    }

    pub fn syntax(kind: SyntaxError) -> Self {
        Self { message: kind.to_string(), offset: kind.offset(), expectation: None }
    }
}

/// Semantic checks that only the parser itself can perform in-line, e.g.
/// quantifying a construct spec.md §3.3 forbids. These are surfaced to
/// callers as [`ParseError`]s (spec.md §7's propagation rule: "Strict `parse`
/// surfaces errors as failures"), but are kept as a distinct enum so
/// `tolerant` parsing can recognize and recover from them specifically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("quantifier at offset {0} applies to a construct that cannot be quantified")]
    InvalidQuantifierTarget(u32),
    #[error("quantifier at offset {0} has min {1} greater than max {2}")]
    QuantifierMinExceedsMax(u32, u32, u32),
    #[error("unterminated group starting at offset {0}")]
    UnterminatedGroup(u32),
    #[error("unterminated character class starting at offset {0}")]
    UnterminatedCharClass(u32),
    #[error("unterminated conditional starting at offset {0}")]
    UnterminatedConditional(u32),
}

impl SyntaxError {
    pub fn offset(self) -> u32 {
        match self {
            SyntaxError::InvalidQuantifierTarget(o) => o,
            SyntaxError::QuantifierMinExceedsMax(o, _, _) => o,
            SyntaxError::UnterminatedGroup(o) => o,
            SyntaxError::UnterminatedCharClass(o) => o,
            SyntaxError::UnterminatedConditional(o) => o,
        }
    }
}

/// Top-level failure of [`crate::parser::parse`]: either stage of
/// lexer-then-parser can fail, and callers generally want to match on both
/// at once (spec.md §6's `parse` operation lists both as its error set).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Lexer(#[from] LexerError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// A non-fatal, collected diagnostic — the shared shape behind validator
/// issues and lint issues (spec.md §7: "collected, not thrown").
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Issue {
    pub issue_id: String,
    pub message: String,
    pub span: Span,
}

impl Issue {
    pub fn new(issue_id: impl Into<String>, message: impl Into<String>, span: Span) -> Self {
        Self { issue_id: issue_id.into(), message: message.into(), span }
    }
}
