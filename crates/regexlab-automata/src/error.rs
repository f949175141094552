//! Error taxonomy for the automata pipeline (spec.md §7): a construct the
//! pipeline can't represent at all, versus a budget the pipeline blew past
//! while trying.

use regexlab_core::Span;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{feature}' is not part of the regular subset: {message}")]
pub struct UnsupportedFeatureError {
    pub feature: String,
    pub message: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ComplexityError {
    #[error("quantifier unrolling exceeded the cap of {cap} repetitions")]
    QuantifierUnrollCap { cap: u32 },
    #[error("DFA state count exceeded the ceiling of {ceiling}")]
    StateCeiling { ceiling: usize },
    #[error("language solver visited more than {cap} product states")]
    SolverStateCap { cap: usize },
}

/// Top-level failure of `build_nfa`/`build_dfa`/the solver (spec.md §7:
/// "the automata pipeline either succeeds or returns `ComplexityError` /
/// `UnsupportedFeatureError` — it never silently degrades").
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AutomataError {
    #[error(transparent)]
    Unsupported(#[from] UnsupportedFeatureError),
    #[error(transparent)]
    Complexity(#[from] ComplexityError),
}
