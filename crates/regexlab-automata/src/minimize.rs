//! DFA minimization (spec.md §4.8.4): collapse equivalent states. Two
//! algorithms are offered because they have different complexity profiles
//! over the effective alphabet `Σ_eff` — callers pick the one that fits
//! their automaton's shape, Hopcroft is the default for everything larger
//! than a handful of states.

use crate::dfa::{Dfa, DfaStateId};
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// O(|Σ_eff| · n log n) partition-refinement worklist.
    Hopcroft,
    /// O(|Σ_eff| · n²) repeated splitting; simpler, fine for small DFAs.
    Moore,
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::Hopcroft
    }
}

pub fn minimize(dfa: &Dfa, algorithm: Algorithm) -> Dfa {
    let reachable = reachable_states(dfa);
    let partition = match algorithm {
        Algorithm::Hopcroft => hopcroft_partition(dfa, &reachable),
        Algorithm::Moore => moore_partition(dfa, &reachable),
    };
    rebuild(dfa, &reachable, &partition)
}

fn reachable_states(dfa: &Dfa) -> Vec<DfaStateId> {
    let mut seen = HashSet::new();
    let mut order = Vec::new();
    let mut queue = VecDeque::from([dfa.start]);
    seen.insert(dfa.start);
    while let Some(s) = queue.pop_front() {
        order.push(s);
        for &t in &dfa.transitions[s as usize] {
            if seen.insert(t) {
                queue.push_back(t);
            }
        }
    }
    order
}

/// Block id per state, 0-indexed, stable only within one call.
type Partition = HashMap<DfaStateId, usize>;

fn moore_partition(dfa: &Dfa, reachable: &[DfaStateId]) -> Partition {
    let mut blocks: Partition = reachable.iter().map(|&s| (s, if dfa.is_accept(s) { 1 } else { 0 })).collect();

    loop {
        let mut signature_of: HashMap<(usize, Vec<usize>), usize> = HashMap::new();
        let mut next: Partition = HashMap::new();
        for &s in reachable {
            let sig: Vec<usize> = dfa.transitions[s as usize].iter().map(|&t| *blocks.get(&t).unwrap_or(&0)).collect();
            let key = (blocks[&s], sig);
            let id = signature_of.len();
            let block_id = *signature_of.entry(key).or_insert(id);
            next.insert(s, block_id);
        }
        if next.values().collect::<HashSet<_>>().len() == blocks.values().collect::<HashSet<_>>().len() {
            return next;
        }
        blocks = next;
    }
}

/// Simplified Hopcroft: worklist of (block, symbol) splitters. Produces the
/// same coarsest stable partition as Moore, just converging faster on
/// larger automata by only re-examining blocks touched by a refinement.
fn hopcroft_partition(dfa: &Dfa, reachable: &[DfaStateId]) -> Partition {
    let reachable_set: HashSet<DfaStateId> = reachable.iter().copied().collect();
    let (accepting, non_accepting): (Vec<DfaStateId>, Vec<DfaStateId>) = reachable.iter().copied().partition(|&s| dfa.is_accept(s));

    let mut partition: Vec<HashSet<DfaStateId>> = Vec::new();
    if !non_accepting.is_empty() {
        partition.push(non_accepting.into_iter().collect());
    }
    if !accepting.is_empty() {
        partition.push(accepting.into_iter().collect());
    }

    let mut worklist: VecDeque<(usize, usize)> = VecDeque::new();
    for block_idx in 0..partition.len() {
        for symbol_idx in 0..dfa.alphabet.len() {
            worklist.push_back((block_idx, symbol_idx));
        }
    }

    // Precompute inverse transitions: for each (symbol, target) the states
    // reaching it, so a splitter's preimage doesn't require a full scan.
    let mut inverse: HashMap<(usize, DfaStateId), Vec<DfaStateId>> = HashMap::new();
    for &s in reachable {
        for (symbol_idx, &t) in dfa.transitions[s as usize].iter().enumerate() {
            inverse.entry((symbol_idx, t)).or_default().push(s);
        }
    }

    while let Some((splitter_idx, symbol_idx)) = worklist.pop_front() {
        if splitter_idx >= partition.len() {
            continue;
        }
        let splitter = partition[splitter_idx].clone();
        let preimage: HashSet<DfaStateId> = splitter
            .iter()
            .flat_map(|&t| inverse.get(&(symbol_idx, t)).into_iter().flatten().copied())
            .filter(|s| reachable_set.contains(s))
            .collect();
        if preimage.is_empty() {
            continue;
        }

        let mut new_partition = Vec::with_capacity(partition.len() + 1);
        for block in &partition {
            let in_preimage: HashSet<DfaStateId> = block.intersection(&preimage).copied().collect();
            if in_preimage.is_empty() || in_preimage.len() == block.len() {
                new_partition.push(block.clone());
                continue;
            }
            let out_preimage: HashSet<DfaStateId> = block.difference(&preimage).copied().collect();
            new_partition.push(in_preimage);
            new_partition.push(out_preimage);
            for s in 0..dfa.alphabet.len() {
                worklist.push_back((new_partition.len() - 2, s));
                worklist.push_back((new_partition.len() - 1, s));
            }
        }
        partition = new_partition;
    }

    let mut result: Partition = HashMap::new();
    for (id, block) in partition.iter().enumerate() {
        for &s in block {
            result.insert(s, id);
        }
    }
    result
}

fn rebuild(dfa: &Dfa, reachable: &[DfaStateId], partition: &Partition) -> Dfa {
    let mut block_ids: Vec<usize> = partition.values().copied().collect();
    block_ids.sort_unstable();
    block_ids.dedup();
    let renumber: HashMap<usize, DfaStateId> = block_ids.iter().enumerate().map(|(new, &old)| (old, new as DfaStateId)).collect();

    let n = block_ids.len();
    let mut transitions = vec![vec![0u32; dfa.alphabet.len()]; n];
    let mut accept = vec![false; n];
    let mut nfa_states = vec![Default::default(); n];

    for &s in reachable {
        let block = renumber[&partition[&s]];
        accept[block as usize] = dfa.is_accept(s);
        nfa_states[block as usize] = dfa.nfa_states[s as usize].clone();
        for (col, &t) in dfa.transitions[s as usize].iter().enumerate() {
            let target_block = renumber[&partition[&t]];
            transitions[block as usize][col] = target_block;
        }
    }

    let start = renumber[&partition[&dfa.start]];
    let dead = accept
        .iter()
        .enumerate()
        .find(|&(id, &acc)| !acc && transitions[id].iter().all(|&t| t == id as DfaStateId))
        .map(|(id, _)| id as DfaStateId)
        .unwrap_or(start);

    Dfa { alphabet: dfa.alphabet.clone(), transitions, accept, nfa_states, start, dead }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dfa, nfa};
    use regexlab_syntax::parser::parse;

    fn minimized(pattern: &str, algorithm: Algorithm) -> Dfa {
        let ast = parse(pattern).unwrap();
        let n = nfa::build(&ast).unwrap();
        let d = dfa::build(&n, 10_000).unwrap();
        minimize(&d, algorithm)
    }

    #[test]
    fn hopcroft_and_moore_agree_on_state_count() {
        let a = minimized("/(ab|ac)d/", Algorithm::Hopcroft);
        let b = minimized("/(ab|ac)d/", Algorithm::Moore);
        assert_eq!(a.transitions.len(), b.transitions.len());
    }

    #[test]
    fn minimization_never_increases_state_count() {
        let ast = parse("/a(b|b)c/").unwrap();
        let n = nfa::build(&ast).unwrap();
        let d = dfa::build(&n, 10_000).unwrap();
        let before = d.transitions.len();
        let after = minimize(&d, Algorithm::Hopcroft).transitions.len();
        assert!(after <= before);
    }

    #[test]
    fn minimized_dfa_still_accepts_the_same_strings() {
        let d = minimized("/ab/", Algorithm::Hopcroft);
        let s1 = d.step(d.start, b'a');
        let s2 = d.step(s1, b'b');
        assert!(d.is_accept(s2));
    }
}
