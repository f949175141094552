//! Subset construction (spec.md §4.8.3): NFA states become sets, sets
//! become DFA states. Only bytes actually named on some NFA transition
//! participate ("the effective alphabet") — a `Dot` doesn't force all 256
//! DFA transitions to exist individually, they just all point at the same
//! successor.

use crate::error::ComplexityError;
use crate::nfa::{Nfa, StateId, Symbol};
use indexmap::IndexMap;
use std::collections::BTreeSet;

pub type DfaStateId = u32;

#[derive(Debug, Clone, PartialEq)]
pub struct Dfa {
    pub alphabet: Vec<u8>,
    /// `transitions[state][alphabet_index]` — total: every cell is defined,
    /// pointing at the dead state when nothing in the NFA did.
    pub transitions: Vec<Vec<DfaStateId>>,
    pub accept: Vec<bool>,
    /// Which NFA states each DFA state represents, kept for minimization's
    /// "distinguishable by accept status" seed partition and for debugging.
    pub nfa_states: Vec<BTreeSet<StateId>>,
    pub start: DfaStateId,
    pub dead: DfaStateId,
}

impl Dfa {
    pub fn step(&self, state: DfaStateId, byte: u8) -> DfaStateId {
        match self.alphabet.iter().position(|&b| b == byte) {
            Some(idx) => self.transitions[state as usize][idx],
            None => self.dead,
        }
    }

    pub fn is_accept(&self, state: DfaStateId) -> bool {
        self.accept[state as usize]
    }
}

/// `state_ceiling` bounds the number of DFA states constructed; exceeding it
/// raises [`ComplexityError::StateCeiling`] rather than continuing to build
/// an unboundedly large automaton (spec.md §4.8.3).
pub fn build(nfa: &Nfa, state_ceiling: usize) -> Result<Dfa, ComplexityError> {
    let alphabet = effective_alphabet(nfa);
    let epsilon_adj = epsilon_adjacency(nfa);

    let start_set = closure(&epsilon_adj, &[nfa.start]);
    let mut state_of: IndexMap<BTreeSet<StateId>, DfaStateId> = IndexMap::new();
    state_of.insert(start_set.clone(), 0);
    let mut nfa_states = vec![start_set.clone()];
    let mut worklist = vec![start_set];

    let byte_adj = byte_adjacency(nfa);

    while let Some(set) = worklist.pop() {
        let from_id = state_of[&set];
        for &byte in &alphabet {
            let moved: Vec<StateId> = set.iter().flat_map(|&s| byte_adj.get(&(s, byte)).into_iter().flatten().copied()).collect();
            let target = closure(&epsilon_adj, &moved);
            if target.is_empty() {
                continue;
            }
            if !state_of.contains_key(&target) {
                if state_of.len() >= state_ceiling {
                    return Err(ComplexityError::StateCeiling { ceiling: state_ceiling });
                }
                let id = state_of.len() as DfaStateId;
                state_of.insert(target.clone(), id);
                nfa_states.push(target.clone());
                worklist.push(target.clone());
            }
            let _ = from_id;
        }
    }

    // Dead state collects every transition not otherwise defined, making the
    // DFA total (spec.md §4.8.3).
    let dead = nfa_states.len() as DfaStateId;
    nfa_states.push(BTreeSet::new());
    let n_states = nfa_states.len();

    let mut transitions = vec![vec![dead; alphabet.len()]; n_states];
    for (set, &from_id) in &state_of {
        for (col, &byte) in alphabet.iter().enumerate() {
            let moved: Vec<StateId> = set.iter().flat_map(|&s| byte_adj.get(&(s, byte)).into_iter().flatten().copied()).collect();
            let target = closure(&epsilon_adj, &moved);
            if !target.is_empty() {
                transitions[from_id as usize][col] = state_of[&target];
            }
        }
    }

    let accept = nfa_states.iter().map(|set| set.contains(&nfa.accept)).collect();

    Ok(Dfa { alphabet, transitions, accept, nfa_states, start: 0, dead })
}

fn effective_alphabet(nfa: &Nfa) -> Vec<u8> {
    let mut bytes: BTreeSet<u8> = BTreeSet::new();
    for t in &nfa.transitions {
        if let Symbol::Byte(b) = t.symbol {
            bytes.insert(b);
        }
    }
    bytes.into_iter().collect()
}

fn epsilon_adjacency(nfa: &Nfa) -> IndexMap<StateId, Vec<StateId>> {
    let mut adj: IndexMap<StateId, Vec<StateId>> = IndexMap::new();
    for t in &nfa.transitions {
        if t.symbol == Symbol::Epsilon {
            adj.entry(t.from).or_default().push(t.to);
        }
    }
    adj
}

fn byte_adjacency(nfa: &Nfa) -> IndexMap<(StateId, u8), Vec<StateId>> {
    let mut adj: IndexMap<(StateId, u8), Vec<StateId>> = IndexMap::new();
    for t in &nfa.transitions {
        if let Symbol::Byte(b) = t.symbol {
            adj.entry((t.from, b)).or_default().push(t.to);
        }
    }
    adj
}

fn closure(epsilon_adj: &IndexMap<StateId, Vec<StateId>>, seeds: &[StateId]) -> BTreeSet<StateId> {
    let mut set: BTreeSet<StateId> = seeds.iter().copied().collect();
    let mut stack: Vec<StateId> = seeds.to_vec();
    while let Some(s) = stack.pop() {
        if let Some(next) = epsilon_adj.get(&s) {
            for &n in next {
                if set.insert(n) {
                    stack.push(n);
                }
            }
        }
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nfa;
    use regexlab_syntax::parser::parse;

    fn build_dfa(pattern: &str) -> Dfa {
        let ast = parse(pattern).unwrap();
        let n = nfa::build(&ast).unwrap();
        build(&n, 10_000).unwrap()
    }

    #[test]
    fn dfa_is_total_over_its_alphabet() {
        let d = build_dfa("/ab/");
        for row in &d.transitions {
            assert_eq!(row.len(), d.alphabet.len());
        }
    }

    #[test]
    fn accepts_matching_prefix_only_at_the_right_state() {
        let d = build_dfa("/ab/");
        let s1 = d.step(d.start, b'a');
        let s2 = d.step(s1, b'b');
        assert!(d.is_accept(s2));
        assert!(!d.is_accept(s1));
    }

    #[test]
    fn dead_state_absorbs_unexpected_bytes() {
        let d = build_dfa("/a/");
        let dead_reached = d.step(d.start, b'z');
        assert_eq!(dead_reached, d.dead);
        assert!(!d.is_accept(d.dead));
    }

    #[test]
    fn state_ceiling_is_enforced() {
        let ast = parse("/a{0,50}/").unwrap();
        let n = nfa::build(&ast).unwrap();
        assert!(build(&n, 2).is_err());
    }

    #[test]
    fn ab_builds_the_four_state_shape_matching_on_by_hand_subset_construction() {
        let d = build_dfa("/ab/");
        let accepting = d.accept.iter().filter(|&&a| a).count();
        let summary = format!(
            "states={} alphabet={:?} accepting={}",
            d.transitions.len(),
            d.alphabet.iter().map(|&b| b as char).collect::<Vec<_>>(),
            accepting
        );
        insta::assert_snapshot!(summary, @"states=4 alphabet=['a', 'b'] accepting=1");
    }
}
