//! The AST analyses (spec.md §4.4-§4.7): semantic validation, structural
//! linting, peephole optimization, and ReDoS risk assessment. Each lives in
//! its own module but shares the [`crate::visit::Visitor`] walk and the
//! [`charset`] first-set machinery.

pub mod charset;
pub mod lint;
pub mod optimize;
pub mod redos;
pub mod validate;
