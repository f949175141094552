//! Regular-subset-to-automata pipeline (spec.md §4.8): takes the AST
//! `regexlab-syntax` produces, rejects whatever isn't regular, and compiles
//! the rest through Thompson NFA, subset construction, and minimization, so
//! `solver` can answer language-level questions (emptiness, subset,
//! equivalence) by walking a product automaton instead of simulating
//! backtracking.

pub mod cache;
pub mod dfa;
pub mod error;
pub mod minimize;
pub mod nfa;
pub mod regular_subset;
pub mod solver;

pub use dfa::Dfa;
pub use error::{AutomataError, ComplexityError, UnsupportedFeatureError};
pub use nfa::Nfa;
