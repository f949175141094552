//! Option structs for every façade operation (spec.md §6 "Options
//! enumerated"). Parser and optimizer options are re-exported from
//! `regexlab-syntax` rather than duplicated; the knobs this crate adds are
//! the ones only the facade can act on (automata-backed verification,
//! solver/confirmation budgets).

pub use regexlab_syntax::analyze::optimize::OptimizerOptions;
pub use regexlab_syntax::analyze::redos::{ConfirmOptions, Mode as RedosMode};
pub use regexlab_syntax::ParserOptions;

use crate::records::Severity;
use regexlab_automata::minimize::Algorithm as MinimizationAlgorithm;

/// Wraps [`regexlab_syntax`]'s optimizer options with the one knob that
/// belongs at this layer: re-running the rewrite through
/// `regexlab-automata`'s solver to confirm it didn't change the pattern's
/// language, rather than only checking the compile/reparse round-trip
/// `regexlab_syntax::analyze::optimize::optimize_checked` already does.
#[derive(Debug, Clone, Copy)]
pub struct OptimizeOptions {
    pub rules: OptimizerOptions,
    /// Corresponds to spec.md §6's `verifyWithAutomata`: only meaningful
    /// when both the original and rewritten pattern fall in the regular
    /// subset (spec.md §4.8.1) — outside it, verification is skipped and
    /// `verified` comes back `None` in the result record.
    pub verify_with_automata: bool,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self { rules: OptimizerOptions::default(), verify_with_automata: false }
    }
}

/// ReDoS operation options (spec.md §6: `{ mode, threshold, confirm }`).
#[derive(Debug, Clone, Copy)]
pub struct RedosOptions {
    pub mode: RedosMode,
    pub threshold: Severity,
    pub confirm: ConfirmOptions,
}

impl Default for RedosOptions {
    fn default() -> Self {
        Self { mode: RedosMode::default(), threshold: Severity::Safe, confirm: ConfirmOptions::default() }
    }
}

/// `buildDfa` options (spec.md §6's Solver row, minus `matchMode` which
/// `regexlab-automata`'s DFA is always "full match" — partial/substring
/// search is a facade-level wrapper, not a distinct automaton shape).
#[derive(Debug, Clone, Copy)]
pub struct BuildDfaOptions {
    pub minimization: MinimizationAlgorithm,
    pub max_states: usize,
}

impl Default for BuildDfaOptions {
    fn default() -> Self {
        Self { minimization: MinimizationAlgorithm::Hopcroft, max_states: 100_000 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareMethod {
    IntersectionEmpty,
    SubsetOf,
    Equivalent,
}

#[derive(Debug, Clone, Copy)]
pub struct CompareOptions {
    pub build_dfa: BuildDfaOptions,
    pub solver_state_cap: usize,
    pub solver_byte_cap: usize,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self { build_dfa: BuildDfaOptions::default(), solver_state_cap: 100_000, solver_byte_cap: 1_000_000 }
    }
}
