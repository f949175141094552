//! Thompson construction (spec.md §4.8.2). Every AST construct lowers to a
//! fragment with one entry state and one accept state; fragments compose by
//! wiring their entry/accept states together, never by mutating a shared
//! global state list out from under a sibling fragment.

use crate::error::{AutomataError, ComplexityError, UnsupportedFeatureError};
use regexlab_core::CharSet;
use regexlab_syntax::analyze::charset::first_set;
use regexlab_syntax::ast::*;

/// Hard cap on `{m,n}` unrolling (spec.md §4.8.2).
const MAX_UNROLL: u32 = 1024;

pub type StateId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Epsilon,
    Byte(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: StateId,
    pub symbol: Symbol,
    pub to: StateId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Nfa {
    pub state_count: u32,
    pub start: StateId,
    pub accept: StateId,
    pub transitions: Vec<Transition>,
}

impl Nfa {
    pub fn out_edges(&self, from: StateId) -> impl Iterator<Item = &Transition> {
        self.transitions.iter().filter(move |t| t.from == from)
    }
}

/// Builds the Thompson NFA for `regex`. Callers should run
/// [`crate::regular_subset::check`] first; constructs it rejects panic here
/// only if skipped (they have no fragment-building rule below).
pub fn build(regex: &Node) -> Result<Nfa, AutomataError> {
    let Node::Regex(r) = regex else {
        return Err(UnsupportedFeatureError {
            feature: "non_regex_root".into(),
            message: "build() expects a Regex root node, not a bare AST fragment".into(),
            span: regex.span(),
        }
        .into());
    };
    let mut builder = Builder { next_state: 0, transitions: Vec::new() };
    let frag = builder.build_node(&r.pattern, r.flags)?;
    Ok(Nfa { state_count: builder.next_state, start: frag.start, accept: frag.accept, transitions: builder.transitions })
}

#[derive(Debug, Clone, Copy)]
struct Fragment {
    start: StateId,
    accept: StateId,
}

struct Builder {
    next_state: u32,
    transitions: Vec<Transition>,
}

impl Builder {
    fn fresh_state(&mut self) -> StateId {
        let id = self.next_state;
        self.next_state += 1;
        id
    }

    fn edge(&mut self, from: StateId, symbol: Symbol, to: StateId) {
        self.transitions.push(Transition { from, symbol, to });
    }

    fn empty_fragment(&mut self) -> Fragment {
        let start = self.fresh_state();
        let accept = self.fresh_state();
        self.edge(start, Symbol::Epsilon, accept);
        Fragment { start, accept }
    }

    fn byte_set_fragment(&mut self, set: &CharSet) -> Fragment {
        let start = self.fresh_state();
        let accept = self.fresh_state();
        for range in set.ranges() {
            for b in range.lo..=range.hi {
                self.edge(start, Symbol::Byte(b), accept);
                if b == 255 {
                    break;
                }
            }
        }
        if set.is_unknown() {
            for b in 0..=255u8 {
                self.edge(start, Symbol::Byte(b), accept);
                if b == 255 {
                    break;
                }
            }
        }
        Fragment { start, accept }
    }

    fn concat(&mut self, a: Fragment, b: Fragment) -> Fragment {
        self.edge(a.accept, Symbol::Epsilon, b.start);
        Fragment { start: a.start, accept: b.accept }
    }

    fn concat_all(&mut self, frags: Vec<Fragment>) -> Fragment {
        let mut iter = frags.into_iter();
        let mut acc = iter.next().unwrap_or_else(|| self.empty_fragment());
        for frag in iter {
            acc = self.concat(acc, frag);
        }
        acc
    }

    fn alternate(&mut self, frags: Vec<Fragment>) -> Fragment {
        let start = self.fresh_state();
        let accept = self.fresh_state();
        for frag in frags {
            self.edge(start, Symbol::Epsilon, frag.start);
            self.edge(frag.accept, Symbol::Epsilon, accept);
        }
        Fragment { start, accept }
    }

    fn star(&mut self, inner: Fragment) -> Fragment {
        let start = self.fresh_state();
        let accept = self.fresh_state();
        self.edge(start, Symbol::Epsilon, inner.start);
        self.edge(start, Symbol::Epsilon, accept);
        self.edge(inner.accept, Symbol::Epsilon, inner.start);
        self.edge(inner.accept, Symbol::Epsilon, accept);
        Fragment { start, accept }
    }

    fn plus(&mut self, inner: Fragment) -> Fragment {
        let accept = self.fresh_state();
        self.edge(inner.accept, Symbol::Epsilon, inner.start);
        self.edge(inner.accept, Symbol::Epsilon, accept);
        Fragment { start: inner.start, accept }
    }

    fn optional(&mut self, inner: Fragment) -> Fragment {
        let start = self.fresh_state();
        self.edge(start, Symbol::Epsilon, inner.start);
        self.edge(start, Symbol::Epsilon, inner.accept);
        Fragment { start, accept: inner.accept }
    }

    /// `R{m,n}`: `m` mandatory copies, then `n-m` optional copies, or a
    /// trailing `R*` when `n` is unbounded. Possessive/lazy collapse to
    /// greedy (spec.md §4.8.2: "they do not change the accepted language").
    fn build_node(&mut self, node: &Node, flags: Flags) -> Result<Fragment, AutomataError> {
        match node {
            Node::Regex(n) => self.build_node(&n.pattern, flags),
            Node::Sequence(n) => {
                let mut frags = Vec::with_capacity(n.children.len());
                for child in &n.children {
                    frags.push(self.build_node(child, flags)?);
                }
                Ok(self.concat_all(frags))
            }
            Node::Alternation(n) => {
                let mut frags = Vec::with_capacity(n.branches.len());
                for branch in &n.branches {
                    frags.push(self.build_node(branch, flags)?);
                }
                Ok(self.alternate(frags))
            }
            Node::Group(n) => self.build_node(&n.child, flags),
            Node::Quantifier(n) => self.build_quantifier(n, flags),
            Node::Literal(n) => {
                let mut frags = Vec::with_capacity(n.text.len());
                for c in n.text.chars() {
                    let set = if c.is_ascii() { CharSet::single(c as u8) } else { CharSet::unknown() };
                    frags.push(self.byte_set_fragment(&set));
                }
                Ok(self.concat_all(frags))
            }
            Node::CharLiteral(_) | Node::CharType(_) | Node::Dot(_) | Node::CharClass(_) | Node::PosixClass(_) | Node::UnicodeProp(_) => {
                Ok(self.byte_set_fragment(&first_set(node, flags)))
            }
            Node::Anchor(_) | Node::Assertion(_) | Node::Comment(_) | Node::Callout(_) | Node::Define(_) | Node::LimitMatch(_) | Node::VersionCondition(_) => {
                Ok(self.empty_fragment())
            }
            Node::ScriptRun(n) => self.build_node(&n.child, flags),
            Node::Conditional(n) => self.build_node(&n.yes, flags),
            Node::Keep(_) | Node::Backref(_) | Node::Subroutine(_) | Node::PcreVerb(_) | Node::Range(_) | Node::ClassOperation(_) => {
                Ok(self.empty_fragment())
            }
        }
    }

    fn build_quantifier(&mut self, n: &QuantifierNode, flags: Flags) -> Result<Fragment, AutomataError> {
        match n.max {
            None => {
                if n.min > MAX_UNROLL {
                    return Err(ComplexityError::QuantifierUnrollCap { cap: MAX_UNROLL }.into());
                }
                let mandatory = self.build_repeated(&n.inner, n.min, flags)?;
                let inner = self.build_node(&n.inner, flags)?;
                let tail = self.star(inner);
                Ok(self.concat(mandatory, tail))
            }
            Some(max) => {
                if max > MAX_UNROLL {
                    return Err(ComplexityError::QuantifierUnrollCap { cap: MAX_UNROLL }.into());
                }
                if n.min == 0 && max == 0 {
                    return Ok(self.empty_fragment());
                }
                let mut optional_frags = Vec::with_capacity((max - n.min) as usize);
                for _ in n.min..max {
                    let inner = self.build_node(&n.inner, flags)?;
                    optional_frags.push(self.optional(inner));
                }
                let optional_chain = self.concat_all(optional_frags);
                if n.min == 0 {
                    Ok(optional_chain)
                } else {
                    let mandatory = self.build_repeated(&n.inner, n.min, flags)?;
                    Ok(self.concat(mandatory, optional_chain))
                }
            }
        }
    }

    fn build_repeated(&mut self, inner: &Node, count: u32, flags: Flags) -> Result<Fragment, AutomataError> {
        if count == 0 {
            return Ok(self.empty_fragment());
        }
        let mut frags = Vec::with_capacity(count as usize);
        for _ in 0..count {
            frags.push(self.build_node(inner, flags)?);
        }
        Ok(self.concat_all(frags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regexlab_syntax::parser::parse;

    fn build_pattern(pattern: &str) -> Nfa {
        build(&parse(pattern).unwrap()).unwrap()
    }

    #[test]
    fn literal_produces_a_chain_of_byte_transitions() {
        let nfa = build_pattern("/ab/");
        assert!(nfa.transitions.iter().any(|t| t.symbol == Symbol::Byte(b'a')));
        assert!(nfa.transitions.iter().any(|t| t.symbol == Symbol::Byte(b'b')));
    }

    #[test]
    fn star_allows_reaching_accept_via_epsilon() {
        let nfa = build_pattern("/a*/");
        assert!(nfa.transitions.iter().any(|t| t.from == nfa.start && t.symbol == Symbol::Epsilon));
    }

    #[test]
    fn bounded_quantifier_unrolls_finite_copies() {
        let nfa = build_pattern("/a{2,4}/");
        let byte_edges = nfa.transitions.iter().filter(|t| t.symbol == Symbol::Byte(b'a')).count();
        assert_eq!(byte_edges, 4);
    }

    #[test]
    fn excessive_unroll_raises_complexity_error() {
        let ast = parse("/a{2000}/").unwrap();
        assert!(matches!(build(&ast), Err(AutomataError::Complexity(ComplexityError::QuantifierUnrollCap { .. }))));
    }
}
