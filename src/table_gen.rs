//! Grammar → packed automaton.
//
//  Thompson construction over the productions in `grammar`, subset
//  construction from each token set's start closure (so token sets share
//  every DFA state they have in common), then block packing.

use std::collections::HashMap;

use log::debug;

use crate::char_class::CLASS_COUNT;
use crate::grammar::{self, Pattern, Production, TokenId, TokenSet, TERMINALS};
use crate::tables::{
    self, Tables, EXPECTED_LEVELS, STATE_BITS, STATE_MASK, TOKEN_MASK, TRANSITION_LEVELS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Accept {
    token: TokenId,
    backoff: u32,
}

#[derive(Debug, Default)]
struct NfaState {
    eps: Vec<usize>,
    edges: Vec<(grammar::ClassSet, usize)>,
    accept: Option<Accept>,
    owner: TokenId,
}

#[derive(Debug, Default)]
struct Nfa {
    states: Vec<NfaState>,
    /// Start state of each terminal's production.
    starts: HashMap<TokenId, usize>,
}

impl Nfa {
    fn build(productions: &[Production]) -> Self {
        let mut nfa = Nfa::default();
        for p in productions {
            let start = nfa.add(p.token);
            let mut end = nfa.pattern(&p.body, start, p.token);
            let mut backoff = 0;
            if let Some(context) = &p.context {
                // validated by the grammar tests
                backoff = context.fixed_len().unwrap_or(0) as u32;
                end = nfa.pattern(context, end, p.token);
            }
            nfa.states[end].accept = Some(Accept {
                token: p.token,
                backoff,
            });
            nfa.starts.insert(p.token, start);
        }
        nfa
    }

    fn add(&mut self, owner: TokenId) -> usize {
        self.states.push(NfaState {
            owner,
            ..NfaState::default()
        });
        self.states.len() - 1
    }

    fn eps(&mut self, from: usize, to: usize) {
        self.states[from].eps.push(to);
    }

    /// Append `p` after `from`; returns the state reached once it matched.
    fn pattern(&mut self, p: &Pattern, from: usize, owner: TokenId) -> usize {
        match p {
            Pattern::Set(set) => {
                let to = self.add(owner);
                self.states[from].edges.push((*set, to));
                to
            }
            Pattern::Seq(items) => items
                .iter()
                .fold(from, |at, item| self.pattern(item, at, owner)),
            Pattern::Alt(alts) => {
                let to = self.add(owner);
                for a in alts {
                    let start = self.add(owner);
                    self.eps(from, start);
                    let end = self.pattern(a, start, owner);
                    self.eps(end, to);
                }
                to
            }
            Pattern::Star(inner) => {
                let lp = self.add(owner);
                self.eps(from, lp);
                let end = self.pattern(inner, lp, owner);
                self.eps(end, lp);
                let to = self.add(owner);
                self.eps(lp, to);
                to
            }
            Pattern::Plus(inner) => {
                let lp = self.add(owner);
                self.eps(from, lp);
                let end = self.pattern(inner, lp, owner);
                self.eps(end, lp);
                let to = self.add(owner);
                self.eps(end, to);
                to
            }
            Pattern::Opt(inner) => {
                let start = self.add(owner);
                self.eps(from, start);
                let end = self.pattern(inner, start, owner);
                let to = self.add(owner);
                self.eps(end, to);
                self.eps(from, to);
                to
            }
        }
    }

    fn closure(&self, mut set: Vec<usize>) -> Vec<usize> {
        let mut stack = set.clone();
        while let Some(s) = stack.pop() {
            for &next in &self.states[s].eps {
                if !set.contains(&next) {
                    set.push(next);
                    stack.push(next);
                }
            }
        }
        set.sort_unstable();
        set.dedup();
        set
    }

    fn step(&self, set: &[usize], class: u8) -> Vec<usize> {
        let targets = set
            .iter()
            .flat_map(|&s| self.states[s].edges.iter())
            .filter(|(on, _)| on.contains(class))
            .map(|&(_, to)| to)
            .collect();
        self.closure(targets)
    }
}

/// Deterministic automaton; state `i` has id `i + 1`.
struct Dfa {
    sets: Vec<Vec<usize>>,
    ids: HashMap<Vec<usize>, u32>,
    /// (class, from id, to id)
    edges: Vec<(u8, u32, u32)>,
}

impl Dfa {
    fn intern(&mut self, set: Vec<usize>) -> u32 {
        if let Some(&id) = self.ids.get(&set) {
            return id;
        }
        self.sets.push(set.clone());
        let id = self.sets.len() as u32;
        self.ids.insert(set, id);
        id
    }
}

fn accept_of(nfa: &Nfa, set: &[usize]) -> Option<(TokenId, u32)> {
    set.iter()
        .filter_map(|&s| nfa.states[s].accept)
        .min()
        .map(|a| (a.token, a.backoff))
}

fn has_edges(nfa: &Nfa, set: &[usize]) -> bool {
    set.iter().any(|&s| !nfa.states[s].edges.is_empty())
}

pub(crate) fn generate() -> Tables {
    let productions = grammar::productions();
    let nfa = Nfa::build(&productions);

    let mut dfa = Dfa {
        sets: Vec::new(),
        ids: HashMap::new(),
        edges: Vec::new(),
    };
    let initial_ids: Vec<u32> = TokenSet::ALL
        .iter()
        .map(|set| {
            let starts = set
                .members()
                .iter()
                .filter_map(|token| nfa.starts.get(token).copied())
                .collect();
            dfa.intern(nfa.closure(starts))
        })
        .collect();

    let mut next = 0;
    while next < dfa.sets.len() {
        let from = next as u32 + 1;
        let set = dfa.sets[next].clone();
        for class in 0..CLASS_COUNT as u8 {
            let target = nfa.step(&set, class);
            if target.is_empty() {
                continue;
            }
            let to = dfa.intern(target);
            dfa.edges.push((class, from, to));
        }
        next += 1;
    }

    let states = dfa.sets.len();
    assert!(states as u32 <= STATE_MASK, "scanner needs {} states", states);
    assert!(TERMINALS.len() < TOKEN_MASK as usize);

    // entry for moving into `id`: its accept, and no successor if it is a dead end
    let entry = |id: u32| {
        let set = &dfa.sets[id as usize - 1];
        let next = if has_edges(&nfa, set) { id } else { 0 };
        tables::encode(next, accept_of(&nfa, set))
    };

    let mut dense = vec![0u32; CLASS_COUNT << STATE_BITS];
    for &(class, from, to) in &dfa.edges {
        dense[((class as usize) << STATE_BITS) + from as usize - 1] = entry(to);
    }
    // no terminal matches the empty string outright
    for &id in &initial_ids {
        debug_assert!(accept_of(&nfa, &dfa.sets[id as usize - 1]).is_none());
    }
    let initial = initial_ids;

    let windows = TERMINALS.len().div_ceil(32);
    let mut expected = vec![0u32; windows * states];
    for (i, set) in dfa.sets.iter().enumerate() {
        for &s in set {
            let owner = nfa.states[s].owner;
            expected[(owner / 32) * states + i] |= 1 << (owner % 32);
        }
    }

    let transition = tables::pack(&dense, &TRANSITION_LEVELS);
    let expected = tables::pack(&expected, &EXPECTED_LEVELS);
    debug!(
        "scanner tables: {} nfa states, {} dfa states, {} transitions ({} packed), {} expected entries",
        nfa.states.len(),
        states,
        dfa.edges.len(),
        transition.len(),
        expected.len()
    );

    Tables {
        initial,
        transition,
        expected,
        states,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::TABLES;

    #[test]
    fn tables_fit_the_packed_layout() {
        let tables = &*TABLES;
        assert!(tables.states > 0);
        assert!(tables.states <= STATE_MASK as usize);
        assert_eq!(tables.initial.len(), TokenSet::ALL.len());
        for &id in &tables.initial {
            assert!(id >= 1 && id as usize <= tables.states);
        }
    }

    #[test]
    fn token_sets_are_distinct_start_states() {
        let tables = &*TABLES;
        let mut ids = tables.initial.clone();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), TokenSet::ALL.len());
    }

    #[test]
    fn closure_follows_epsilon_chains() {
        let productions = vec![grammar::Production {
            token: 0,
            body: grammar::opt(grammar::opt(grammar::lit("a"))),
            context: None,
        }];
        let nfa = Nfa::build(&productions);
        let start = nfa.closure(vec![nfa.starts[&0]]);
        assert!(accept_of(&nfa, &start).is_some());
    }
}
