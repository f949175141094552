//! The token model (spec.md §3.1) and the two `logos`-generated lexical
//! grammars the hand-written [`crate::lexer::Lexer`] switches between.
//!
//! A pure `#[derive(Logos)]` enum can't express "mode switches on `[` and
//! `]`" on its own, so the driving logic lives in `lexer.rs`: it tracks
//! class-nesting depth and re-enters a fresh `logos::Lexer` over the
//! remaining input with whichever of [`OuterToken`] or [`ClassToken`] applies
//! to the current mode, the same split the teacher's own hand-written lexer
//! uses for its own mode switches despite also depending on `logos`.

use logos::Logos;
use regexlab_core::Span;

/// The discriminated tag for a lexed token (spec.md §3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum TokenKind {
    Literal,
    CharType,
    Dot,
    Anchor,
    Assertion,
    Keep,
    GroupOpenPlain,
    GroupOpenNonCapturing,
    GroupOpenAtomic,
    GroupOpenBranchReset,
    GroupOpenNamed,
    GroupOpenLookahead,
    GroupOpenLookbehind,
    GroupOpenInlineFlags,
    GroupOpenComment,
    GroupOpenCallout,
    GroupOpenVerbOrCondition,
    GroupClose,
    Alternation,
    Quantifier,
    ClassOpen,
    ClassClose,
    ClassNegation,
    RangeHyphen,
    ClassOperation,
    PosixClass,
    UnicodeProperty,
    UnicodeEscape,
    Octal,
    Control,
    Backref,
    Subroutine,
    Verb,
    Comment,
    Callout,
    ScriptRun,
    EndOfInput,
}

/// A single lexeme: tag, literal text, and its byte offset into the
/// *pattern body* (delimiters and flags already stripped, per spec.md §4.1).
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self { kind, text: text.into(), span }
    }
}

/// Lexical grammar used outside a character class.
///
/// This is the bulk of PCRE2 syntax: anchors, quantifiers, group openers,
/// escapes. Character-class contents switch to [`ClassToken`] instead.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = ())]
pub enum OuterToken {
    #[token(".")]
    Dot,

    #[token("^")]
    CaretAnchor,
    #[token("$")]
    DollarAnchor,
    #[regex(r"\\[AzZ]")]
    StringAnchor,

    #[regex(r"\\[bB]")]
    WordBoundary,
    #[token(r"\K")]
    Keep,

    #[regex(r"\\[dDwWsS]")]
    CharType,

    #[regex(r"\\p\{[^}]*\}|\\P\{[^}]*\}|\\p[A-Za-z]|\\P[A-Za-z]")]
    UnicodeProperty,

    #[regex(r"\\x\{[0-9a-fA-F]+\}|\\x[0-9a-fA-F]{0,2}|\\u\{[0-9a-fA-F]+\}|\\u[0-9a-fA-F]{4}")]
    UnicodeEscape,

    // Bare `\NNN` is ambiguous with a numeric backreference and is handled
    // by `lexer::lex_backslash_digit` before this grammar ever runs on it;
    // only the unambiguous explicit `\o{...}` form is matched here.
    #[regex(r"\\o\{[0-7]+\}")]
    Octal,

    #[regex(r"\\c.")]
    Control,

    #[regex(r"\\g\{[^}]*\}|\\g<[^>]*>|\\g-?[0-9]+|\\k<[^>]*>|\\k'[^']*'|\\k\{[^}]*\}")]
    NamedBackrefOrSubroutine,

    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token("|")]
    Pipe,

    #[regex(r"\?\??|\*\+?|\+\+?|\{[0-9]*,?[0-9]*\}\+?\??")]
    Quantifier,

    #[token("[")]
    BracketOpen,

    #[regex(r"\\.", priority = 1)]
    EscapedLiteral,

    #[regex(r"[^.^$()|?*+{}\[\]\\]+")]
    PlainText,
}

/// Lexical grammar used inside a character class body (between `[`/`[^` and
/// the matching `]`).
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = ())]
pub enum ClassToken {
    #[token("]")]
    BracketClose,
    #[token("-")]
    Hyphen,
    #[token("&&")]
    Intersection,
    #[token("--")]
    Subtraction,
    #[regex(r"\[:\^?[a-z]+:\]")]
    PosixClass,
    #[regex(r"\\p\{[^}]*\}|\\P\{[^}]*\}|\\p[A-Za-z]|\\P[A-Za-z]")]
    UnicodeProperty,
    #[regex(r"\\[dDwWsS]")]
    CharType,
    #[regex(r"\\x\{[0-9a-fA-F]+\}|\\x[0-9a-fA-F]{0,2}|\\u\{[0-9a-fA-F]+\}|\\u[0-9a-fA-F]{4}")]
    UnicodeEscape,
    #[regex(r"\\o\{[0-7]+\}|\\[0-7]{1,3}")]
    Octal,
    #[regex(r"\\.", priority = 1)]
    EscapedLiteral,
    #[regex(r"[^\]\\\-\[]+")]
    PlainText,
}
