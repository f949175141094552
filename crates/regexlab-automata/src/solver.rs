//! Product-automaton language solver (spec.md §4.8.5): `intersectionEmpty`,
//! `subsetOf`, and `equivalent` are all the same BFS over pairs of DFA
//! states, differing only in which pair is a "hit" worth reporting and
//! what a hit means for the verdict.

use crate::dfa::{Dfa, DfaStateId};
use crate::error::ComplexityError;
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness {
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntersectionResult {
    pub is_empty: bool,
    pub example: Option<Witness>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsetResult {
    pub is_subset: bool,
    pub counter: Option<Witness>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquivalenceResult {
    pub equivalent: bool,
    pub counter: Option<Witness>,
}

/// `state_cap` bounds the number of product states visited and `byte_cap`
/// bounds the total bytes walked across all witness reconstructions;
/// exceeding either raises [`ComplexityError::SolverStateCap`] rather than
/// returning an unsound answer (spec.md §4.8.5).
pub fn intersection_empty(a: &Dfa, b: &Dfa, state_cap: usize, byte_cap: usize) -> Result<IntersectionResult, ComplexityError> {
    let hit = bfs(a, b, state_cap, byte_cap, |pa, pb| a.is_accept(pa) && b.is_accept(pb))?;
    Ok(IntersectionResult { is_empty: hit.is_none(), example: hit })
}

pub fn subset_of(a: &Dfa, b: &Dfa, state_cap: usize, byte_cap: usize) -> Result<SubsetResult, ComplexityError> {
    let hit = bfs(a, b, state_cap, byte_cap, |pa, pb| a.is_accept(pa) && !b.is_accept(pb))?;
    Ok(SubsetResult { is_subset: hit.is_none(), counter: hit })
}

pub fn equivalent(a: &Dfa, b: &Dfa, state_cap: usize, byte_cap: usize) -> Result<EquivalenceResult, ComplexityError> {
    let hit = bfs(a, b, state_cap, byte_cap, |pa, pb| a.is_accept(pa) != b.is_accept(pb))?;
    Ok(EquivalenceResult { equivalent: hit.is_none(), counter: hit })
}

/// Shared BFS scaffolding: walks the synchronized product of `a` and `b`
/// over their joint alphabet, stopping at the first state pair satisfying
/// `is_hit`. The witness is the shortest input reaching it, ties broken by
/// the lexicographically smallest sequence of bytes (guaranteed by
/// expanding alphabet symbols in ascending order during the BFS).
fn bfs(
    a: &Dfa,
    b: &Dfa,
    state_cap: usize,
    byte_cap: usize,
    is_hit: impl Fn(DfaStateId, DfaStateId) -> bool,
) -> Result<Option<Witness>, ComplexityError> {
    let alphabet = joint_alphabet(a, b);

    let start = (a.start, b.start);
    if is_hit(start.0, start.1) {
        return Ok(Some(Witness { bytes: Vec::new() }));
    }

    let mut visited: HashSet<(DfaStateId, DfaStateId)> = HashSet::new();
    visited.insert(start);
    let mut parent: HashMap<(DfaStateId, DfaStateId), ((DfaStateId, DfaStateId), u8)> = HashMap::new();
    let mut queue = VecDeque::from([start]);
    let mut bytes_walked = 0usize;

    while let Some((sa, sb)) = queue.pop_front() {
        for &byte in &alphabet {
            bytes_walked += 1;
            if bytes_walked > byte_cap {
                return Err(ComplexityError::SolverStateCap { cap: byte_cap });
            }
            let next = (a.step(sa, byte), b.step(sb, byte));
            if visited.contains(&next) {
                continue;
            }
            if visited.len() >= state_cap {
                return Err(ComplexityError::SolverStateCap { cap: state_cap });
            }
            visited.insert(next);
            parent.insert(next, ((sa, sb), byte));
            if is_hit(next.0, next.1) {
                return Ok(Some(reconstruct(&parent, start, next)));
            }
            queue.push_back(next);
        }
    }

    Ok(None)
}

fn reconstruct(
    parent: &HashMap<(DfaStateId, DfaStateId), ((DfaStateId, DfaStateId), u8)>,
    start: (DfaStateId, DfaStateId),
    mut at: (DfaStateId, DfaStateId),
) -> Witness {
    let mut bytes = Vec::new();
    while at != start {
        let (prev, byte) = parent[&at];
        bytes.push(byte);
        at = prev;
    }
    bytes.reverse();
    Witness { bytes }
}

fn joint_alphabet(a: &Dfa, b: &Dfa) -> Vec<u8> {
    let mut bytes: Vec<u8> = a.alphabet.iter().chain(b.alphabet.iter()).copied().collect();
    bytes.sort_unstable();
    bytes.dedup();
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dfa, nfa};
    use regexlab_syntax::parser::parse;

    fn build_dfa(pattern: &str) -> Dfa {
        let ast = parse(pattern).unwrap();
        let n = nfa::build(&ast).unwrap();
        dfa::build(&n, 10_000).unwrap()
    }

    #[test]
    fn disjoint_languages_have_empty_intersection() {
        let a = build_dfa("/a/");
        let b = build_dfa("/b/");
        let result = intersection_empty(&a, &b, 10_000, 100_000).unwrap();
        assert!(result.is_empty);
    }

    #[test]
    fn overlapping_languages_produce_a_witness() {
        let a = build_dfa("/ab|cd/");
        let b = build_dfa("/ab/");
        let result = intersection_empty(&a, &b, 10_000, 100_000).unwrap();
        assert!(!result.is_empty);
        assert_eq!(result.example.unwrap().bytes, b"ab");
    }

    #[test]
    fn narrower_pattern_is_a_subset_of_the_broader_one() {
        let a = build_dfa("/ab/");
        let b = build_dfa("/ab|cd/");
        assert!(subset_of(&a, &b, 10_000, 100_000).unwrap().is_subset);
    }

    #[test]
    fn non_subset_yields_a_counterexample() {
        let a = build_dfa("/ab|cd/");
        let b = build_dfa("/ab/");
        let result = subset_of(&a, &b, 10_000, 100_000).unwrap();
        assert!(!result.is_subset);
        assert_eq!(result.counter.unwrap().bytes, b"cd");
    }

    #[test]
    fn equivalent_patterns_report_no_counterexample() {
        let a = build_dfa("/a(b|c)/");
        let b = build_dfa("/ab|ac/");
        assert!(equivalent(&a, &b, 10_000, 100_000).unwrap().equivalent);
    }

    #[test]
    fn byte_cap_is_enforced() {
        let a = build_dfa("/a/");
        let b = build_dfa("/b/");
        assert!(intersection_empty(&a, &b, 10_000, 0).is_err());
    }
}
