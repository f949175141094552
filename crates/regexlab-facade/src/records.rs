//! JSON-serializable result records for every façade operation (spec.md
//! §6). Field names are lower_snake_case to match spec.md §6's sample
//! verbatim; every record derives `serde::Serialize` (and `Deserialize`
//! where a caller might round-trip one, e.g. `Dfa` snapshots).

use regexlab_core::Span;
pub use regexlab_syntax::analyze::redos::{Confidence, Finding, Hotspot, ReDoSAnalysis, Severity};
use regexlab_syntax::error::{Issue, ParseError};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Info,
    Warning,
    Error,
}

/// spec.md §6: `validate(pattern) -> { isValid, error? }`, never throws.
#[derive(Debug, Clone, Serialize)]
pub struct ValidateResult {
    pub is_valid: bool,
    pub error: Option<String>,
}

/// spec.md §6: `lint(ast) -> LintIssue{ issueId, message, span, severity, hint? }`.
#[derive(Debug, Clone, Serialize)]
pub struct LintIssue {
    pub issue_id: String,
    pub message: String,
    pub span: Span,
    pub severity: IssueSeverity,
    pub hint: Option<String>,
}

impl LintIssue {
    pub fn from_validator(issue: &Issue) -> Self {
        LintIssue { issue_id: issue.issue_id.clone(), message: issue.message.clone(), span: issue.span, severity: IssueSeverity::Error, hint: None }
    }

    pub fn from_lint(issue: &Issue) -> Self {
        LintIssue { issue_id: issue.issue_id.clone(), message: issue.message.clone(), span: issue.span, severity: IssueSeverity::Warning, hint: lint_hint(&issue.issue_id) }
    }
}

fn lint_hint(issue_id: &str) -> Option<String> {
    match issue_id {
        "regex.lint.flag.useless.i" => Some("drop the 'i' flag".to_string()),
        "regex.lint.quantifier.useless" => Some("remove the redundant {1} quantifier".to_string()),
        "regex.lint.quantifier.zero" => Some("the quantified atom and its quantifier can both be removed".to_string()),
        "regex.lint.alternation.empty" => Some("an empty alternative makes the whole alternation always match".to_string()),
        "regex.lint.anchor.impossible" => Some("this anchor can never be reached at this position".to_string()),
        _ => None,
    }
}

/// spec.md §6: `optimize(ast, options) -> { original, optimized, changes[] }`.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizeResult {
    pub original: String,
    pub optimized: String,
    pub changes: Vec<String>,
    /// `Some(true)`/`Some(false)` when `verify_with_automata` ran and both
    /// patterns were in the regular subset; `None` otherwise (spec.md §6's
    /// `verifyWithAutomata` option, resolved per
    /// `regexlab_facade::options::OptimizeOptions`'s doc comment).
    pub verified: Option<bool>,
}

/// spec.md §6: `compare(...) -> { isEmpty/isSubset/equivalent, example?, counter? }`.
#[derive(Debug, Clone, Serialize)]
pub struct CompareResult {
    pub is_empty: Option<bool>,
    pub is_subset: Option<bool>,
    pub equivalent: Option<bool>,
    pub example: Option<String>,
    pub counter: Option<String>,
}

/// `parse`'s strict-mode failure shape, a flattened view over
/// `regexlab_syntax::Error` so facade callers get one record type instead
/// of matching `Error::Lexer`/`Error::Parse` themselves.
#[derive(Debug, Clone, Serialize)]
pub struct ParseFailure {
    pub message: String,
    pub offset: Option<u32>,
}

impl From<&regexlab_syntax::Error> for ParseFailure {
    fn from(err: &regexlab_syntax::Error) -> Self {
        match err {
            regexlab_syntax::Error::Lexer(e) => ParseFailure { message: e.to_string(), offset: None },
            regexlab_syntax::Error::Parse(ParseError { message, offset, .. }) => ParseFailure { message: message.clone(), offset: Some(*offset) },
        }
    }
}
