//! Shared primitives for regexlab.
//!
//! This crate has no knowledge of regex syntax. It provides:
//! - [`Span`] — a byte-offset range into a pattern body.
//! - [`CharSet`] — a byte-range set with union/intersection/complement,
//!   used for first-/last-set computation and for the automata pipeline's
//!   effective alphabet.

mod charset;
mod span;

pub use charset::CharSet;
pub use span::Span;
