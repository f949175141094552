//! The single public façade (spec.md §6): eight operations over plain
//! strings and JSON-serializable records. Everything underneath —
//! `regexlab-syntax`'s front end, `regexlab-automata`'s automata pipeline —
//! stays an internal implementation detail; callers only see this module,
//! `options`, `records`, and `diagnostics`.

pub mod diagnostics;
pub mod options;
pub mod records;

use options::{BuildDfaOptions, CompareMethod, CompareOptions, OptimizeOptions, RedosOptions};
use records::{CompareResult, IssueSeverity, LintIssue, OptimizeResult, ParseFailure, ReDoSAnalysis, ValidateResult};
use regexlab_automata::cache::{fingerprint, DfaCache};
use regexlab_automata::{dfa, minimize, nfa, regular_subset, solver, AutomataError, Dfa};
use std::sync::OnceLock;
use regexlab_syntax::analyze::{lint as lint_pass, optimize as optimize_pass, redos as redos_pass, validate as validate_pass};
use regexlab_syntax::{Node, ParserOptions as SyntaxParserOptions};

/// `parse(pattern, tolerant?)` (spec.md §6). Strict mode fails fast; tolerant
/// mode never fails, trading a hard error for a partial AST plus a list of
/// what went wrong (spec.md §4.2).
pub fn parse(pattern: &str) -> Result<Node, ParseFailure> {
    regexlab_syntax::parse(pattern).map_err(|e| ParseFailure::from(&e))
}

pub fn parse_with_options(pattern: &str, options: SyntaxParserOptions) -> Result<Node, ParseFailure> {
    regexlab_syntax::parse_with_options(pattern, options).map_err(|e| ParseFailure::from(&e))
}

pub fn parse_tolerant(pattern: &str) -> (Option<Node>, Vec<ParseFailure>) {
    let (ast, errors) = regexlab_syntax::parser::parse_tolerant(pattern);
    (ast, errors.iter().map(|e| ParseFailure { message: e.message.clone(), offset: Some(e.offset) }).collect())
}

/// `validate(pattern) -> { isValid, error? }` (spec.md §6). Never throws:
/// a failed parse is a valid `{ isValid: false, error: Some(..) }` record.
pub fn validate(pattern: &str) -> ValidateResult {
    match regexlab_syntax::parse(pattern) {
        Ok(_) => ValidateResult { is_valid: true, error: None },
        Err(e) => ValidateResult { is_valid: false, error: Some(e.to_string()) },
    }
}

/// `compile(ast) -> pattern string` (spec.md §6).
pub fn compile(ast: &Node) -> String {
    regexlab_syntax::compile::compile(ast)
}

/// `lint(ast) -> LintIssue[]` (spec.md §6). Runs both the validator and the
/// linter and merges their findings into one stable-taxonomy list, source-
/// offset ordered (spec.md §5's ordering guarantee); validator findings are
/// semantic errors, linter findings are style warnings.
pub fn lint_and_validate(ast: &Node) -> Vec<LintIssue> {
    let mut issues: Vec<LintIssue> = validate_pass::validate(ast).iter().map(LintIssue::from_validator).collect();
    issues.extend(lint_pass::lint(ast).iter().map(LintIssue::from_lint));
    issues.sort_by_key(|i| (i.span.start, i.span.end));
    issues
}

/// Just the linter half, matching spec.md §6's `lint(ast)` row exactly
/// (issues without [`IssueSeverity::Error`], use [`lint_and_validate`] for
/// the combined view most callers actually want).
pub fn lint(ast: &Node) -> Vec<LintIssue> {
    lint_pass::lint(ast).iter().map(LintIssue::from_lint).collect()
}

pub fn validate_issues(ast: &Node) -> Vec<LintIssue> {
    validate_pass::validate(ast).iter().map(LintIssue::from_validator).collect()
}

/// `optimize(ast, options) -> { original, optimized, changes[] }` (spec.md
/// §6). `changes` is the itemized list of which of the nine rules in
/// `regexlab_syntax::analyze::optimize` actually rewrote something (e.g.
/// `"Replaced [0-9] with \d"`), not a generic "something changed" notice.
pub fn optimize(ast: &Node, options: &OptimizeOptions) -> OptimizeResult {
    let original = regexlab_syntax::compile::compile(ast);
    let (rewritten, changes) = optimize_pass::optimize_checked_with_changes(ast, &options.rules).unwrap_or_else(|| (ast.clone(), Vec::new()));
    let optimized = regexlab_syntax::compile::compile(&rewritten);

    let verified = if options.verify_with_automata && !changes.is_empty() {
        verify_equivalent(ast, &rewritten)
    } else {
        None
    };

    OptimizeResult { original, optimized, changes, verified }
}

fn verify_equivalent(original: &Node, optimized: &Node) -> Option<bool> {
    let dfa_opts = BuildDfaOptions::default();
    let a = build_dfa(original, &dfa_opts).ok()?;
    let b = build_dfa(optimized, &dfa_opts).ok()?;
    solver::equivalent(&a, &b, 100_000, 1_000_000).ok().map(|r| r.equivalent)
}

/// `redos(ast, flags, mode)` (spec.md §6). `ComplexityError` from the
/// confirmation runner's own bounds surfaces as `severity=unknown` per the
/// façade's error column, rather than propagating — the structural
/// findings are still valid even when the confirmation probe itself blows
/// its budget.
pub fn redos(ast: &Node, options: &RedosOptions) -> ReDoSAnalysis {
    let mut analysis = redos_pass::analyze(ast, options.mode, &options.confirm);
    analysis.findings.retain(|f| f.severity >= options.threshold);
    analysis.hotspots.retain(|h| h.severity >= options.threshold);
    analysis
}

/// Process-wide cache shared by every `build_dfa`/`compare` call (spec.md
/// §4.8.5, §5's "at-most-one concurrent build per fingerprint" guarantee).
/// A free-function façade has nowhere else to keep cache state between
/// calls; a lazily-initialized static plays the role an instance field
/// would in a struct-based API.
fn dfa_cache() -> &'static DfaCache {
    static CACHE: OnceLock<DfaCache> = OnceLock::new();
    CACHE.get_or_init(|| DfaCache::new(256))
}

fn build_dfa_options_tag(options: &BuildDfaOptions) -> String {
    format!("{:?}|{}", options.minimization, options.max_states)
}

/// `buildDfa(ast, options) -> Dfa` (spec.md §6). Routed through
/// [`dfa_cache`]: the same pattern rendered under the same options builds
/// its DFA at most once, with later callers (including `compare`, which
/// builds one DFA per side of every pair it checks) reusing the cached
/// automaton instead of re-running subset construction and minimization.
pub fn build_dfa(ast: &Node, options: &BuildDfaOptions) -> Result<Dfa, AutomataError> {
    if let Some(err) = regular_subset::check(ast) {
        return Err(err.into());
    }
    let canonical = regexlab_syntax::compile::compile(ast);
    let tag = build_dfa_options_tag(options);
    let key = fingerprint(&canonical, &tag);
    let dfa = dfa_cache().try_get_or_build(key, || -> Result<Dfa, AutomataError> {
        let built = nfa::build(ast)?;
        let raw = dfa::build(&built, options.max_states)?;
        Ok(minimize::minimize(&raw, options.minimization))
    })?;
    Ok((*dfa).clone())
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CompareError {
    #[error("failed to parse pattern: {0}")]
    Parse(String),
    #[error(transparent)]
    Automata(#[from] AutomataError),
}

/// `compare(patternA, patternB, method, options)` (spec.md §6). All three
/// methods share one BFS over the product automaton
/// (`regexlab_automata::solver`); this wrapper only parses, builds, and
/// shapes the result record.
pub fn compare(pattern_a: &str, pattern_b: &str, method: CompareMethod, options: &CompareOptions) -> Result<CompareResult, CompareError> {
    let ast_a = regexlab_syntax::parse(pattern_a).map_err(|e| CompareError::Parse(e.to_string()))?;
    let ast_b = regexlab_syntax::parse(pattern_b).map_err(|e| CompareError::Parse(e.to_string()))?;
    let dfa_a = build_dfa(&ast_a, &options.build_dfa)?;
    let dfa_b = build_dfa(&ast_b, &options.build_dfa)?;

    match method {
        CompareMethod::IntersectionEmpty => {
            let r = solver::intersection_empty(&dfa_a, &dfa_b, options.solver_state_cap, options.solver_byte_cap).map_err(AutomataError::from)?;
            Ok(CompareResult { is_empty: Some(r.is_empty), is_subset: None, equivalent: None, example: r.example.map(render_witness), counter: None })
        }
        CompareMethod::SubsetOf => {
            let r = solver::subset_of(&dfa_a, &dfa_b, options.solver_state_cap, options.solver_byte_cap).map_err(AutomataError::from)?;
            Ok(CompareResult { is_empty: None, is_subset: Some(r.is_subset), equivalent: None, example: None, counter: r.counter.map(render_witness) })
        }
        CompareMethod::Equivalent => {
            let r = solver::equivalent(&dfa_a, &dfa_b, options.solver_state_cap, options.solver_byte_cap).map_err(AutomataError::from)?;
            Ok(CompareResult { is_empty: None, is_subset: None, equivalent: Some(r.equivalent), example: None, counter: r.counter.map(render_witness) })
        }
    }
}

fn render_witness(w: solver::Witness) -> String {
    String::from_utf8_lossy(&w.bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_reports_valid_patterns_without_an_error() {
        let r = validate("/abc/i");
        assert!(r.is_valid);
        assert!(r.error.is_none());
    }

    #[test]
    fn validate_catches_a_parse_failure() {
        let r = validate("/abc");
        assert!(!r.is_valid);
        assert!(r.error.is_some());
    }

    #[test]
    fn lint_and_validate_is_source_offset_ordered() {
        let ast = regexlab_syntax::parse("/(a)(?<a>b)/").unwrap();
        let issues = lint_and_validate(&ast);
        for pair in issues.windows(2) {
            assert!(pair[0].span.start <= pair[1].span.start);
        }
    }

    #[test]
    fn lint_issue_severities_distinguish_validator_from_linter() {
        let ast = regexlab_syntax::parse("/a{1}/i").unwrap();
        let issues = lint_and_validate(&ast);
        assert!(issues.iter().all(|i| matches!(i.severity, IssueSeverity::Warning | IssueSeverity::Error)));
    }

    #[test]
    fn optimize_reports_no_changes_for_an_already_canonical_pattern() {
        let ast = regexlab_syntax::parse("/abc/").unwrap();
        let result = optimize(&ast, &OptimizeOptions::default());
        assert!(result.changes.is_empty());
        assert_eq!(result.original, result.optimized);
    }

    #[test]
    fn build_dfa_rejects_a_backreference() {
        let ast = regexlab_syntax::parse("/(a)\\1/").unwrap();
        assert!(build_dfa(&ast, &BuildDfaOptions::default()).is_err());
    }

    #[test]
    fn build_dfa_reuses_the_cached_automaton_for_equal_patterns() {
        let ast = regexlab_syntax::parse("/a(b|c)+/").unwrap();
        let options = BuildDfaOptions::default();
        let before = dfa_cache().len();
        build_dfa(&ast, &options).unwrap();
        let after_first = dfa_cache().len();
        build_dfa(&ast, &options).unwrap();
        let after_second = dfa_cache().len();
        assert_eq!(after_first, before + 1);
        assert_eq!(after_second, after_first);
    }

    #[test]
    fn compare_finds_equivalent_patterns_equivalent() {
        let result = compare("/a(b|c)/", "/ab|ac/", CompareMethod::Equivalent, &CompareOptions::default()).unwrap();
        assert_eq!(result.equivalent, Some(true));
    }

    #[test]
    fn compare_surfaces_a_counterexample_for_non_equivalent_patterns() {
        let result = compare("/ab/", "/ab|cd/", CompareMethod::Equivalent, &CompareOptions::default()).unwrap();
        assert_eq!(result.equivalent, Some(false));
        assert!(result.counter.is_some());
    }

    #[test]
    fn redos_filters_findings_below_the_threshold() {
        use regexlab_syntax::analyze::redos::Severity;
        let ast = regexlab_syntax::parse("/(a+)+/").unwrap();
        let mut options = RedosOptions::default();
        options.threshold = Severity::Critical;
        let analysis = redos(&ast, &options);
        assert!(analysis.findings.iter().all(|f| f.severity >= Severity::Critical));
    }
}
