//! PCRE2-style regex front end: lexer, parser, AST, and the analyses built
//! over it (round-trip compiler, validator, linter, optimizer, ReDoS
//! analyzer). This is "the regex front end" half of the toolkit; the
//! regular-subset-to-automata half lives in `regexlab-automata`.

pub mod analyze;
pub mod ast;
pub mod compile;
pub mod error;
mod lexer;
pub mod parser;
pub mod token;
pub mod visit;

pub use ast::{Flags, Node};
pub use error::{Error, Issue, LexerError, ParseError, SyntaxError};
pub use parser::{parse, parse_with_options, ParserOptions};
