//! FIRST-set computation over the combinator arena.
//!
//! Sets are grown to a global fixpoint at parser construction and frozen.
//! An empty, epsilon-free set means the FIRST relation is statically
//! unknown for that combinator; such a set admits every lookahead, so
//! pruning stays sound.

use ahash::RandomState;
use hashbrown::HashSet;

use super::{Combinator, CombinatorKind};
use crate::grammar::LexerSymbol;

#[derive(Debug, Clone, Default)]
pub(crate) struct FirstSet {
    pub(crate) symbols: HashSet<LexerSymbol, RandomState>,
    pub(crate) epsilon: bool,
}

impl FirstSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// No information yet; must not prune.
    pub(crate) fn is_unknown(&self) -> bool {
        self.symbols.is_empty() && !self.epsilon
    }

    /// Whether a parse attempt is worthwhile with `lookahead` next.
    pub(crate) fn admits(&self, lookahead: LexerSymbol) -> bool {
        self.is_unknown() || self.epsilon || self.symbols.contains(&lookahead)
    }

    /// Union `other` into `self`; reports whether anything was added.
    fn merge(&mut self, other: &Self) -> bool {
        let mut changed = false;
        for &symbol in &other.symbols {
            changed |= self.symbols.insert(symbol);
        }
        if other.epsilon && !self.epsilon {
            self.epsilon = true;
            changed = true;
        }
        changed
    }
}

/// Grow all FIRST sets until nothing changes. Insert-only updates keep the
/// iteration monotone, so the fixpoint is reached in finitely many rounds.
pub(crate) fn compute_first_sets(combinators: &mut [Combinator]) {
    loop {
        let mut changed = false;
        for index in 0..combinators.len() {
            let update = first_of(combinators, index);
            changed |= combinators[index].first.merge(&update);
        }
        if !changed {
            break;
        }
    }
}

fn first_of(combinators: &[Combinator], index: usize) -> FirstSet {
    let mut first = FirstSet::new();
    match &combinators[index].kind {
        CombinatorKind::Token { symbol } => {
            first.symbols.insert(*symbol);
        }
        CombinatorKind::Sequence { elements } => {
            let mut all_epsilon = true;
            for element in elements {
                let element_first = &combinators[element.index()].first;
                first.symbols.extend(element_first.symbols.iter().copied());
                if !element_first.epsilon {
                    all_epsilon = false;
                    break;
                }
            }
            first.epsilon = all_epsilon;
        }
        CombinatorKind::Alternatives { branches } => {
            for branch in branches {
                let branch_first = &combinators[branch.index()].first;
                first.symbols.extend(branch_first.symbols.iter().copied());
                first.epsilon |= branch_first.epsilon;
            }
        }
        CombinatorKind::Optional { child, .. } | CombinatorKind::Many { child, .. } => {
            first
                .symbols
                .extend(combinators[child.index()].first.symbols.iter().copied());
            first.epsilon = true;
        }
        CombinatorKind::ManyOne { child, .. } => {
            let child_first = &combinators[child.index()].first;
            first.symbols.extend(child_first.symbols.iter().copied());
            first.epsilon = child_first.epsilon;
        }
        CombinatorKind::Reference { target, .. } => {
            let target_first = &combinators[target.index()].first;
            first.symbols.extend(target_first.symbols.iter().copied());
            first.epsilon = target_first.epsilon;
        }
    }
    first
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::LexerSymbol;
    use crate::parser::ParserId;

    const A: LexerSymbol = LexerSymbol(1);
    const B: LexerSymbol = LexerSymbol(2);

    fn arena(kinds: Vec<CombinatorKind>) -> Vec<Combinator> {
        let mut combinators: Vec<Combinator> = kinds.into_iter().map(Combinator::new).collect();
        compute_first_sets(&mut combinators);
        combinators
    }

    #[test]
    fn optional_prefix_feeds_the_sequence() {
        // (A? B): FIRST = {A, B}, no epsilon.
        let combinators = arena(vec![
            CombinatorKind::Token { symbol: A },
            CombinatorKind::Token { symbol: B },
            CombinatorKind::Optional {
                child: ParserId(0),
                quantified: None,
            },
            CombinatorKind::Sequence {
                elements: vec![ParserId(2), ParserId(1)],
            },
        ]);
        let first = &combinators[3].first;
        assert!(first.symbols.contains(&A));
        assert!(first.symbols.contains(&B));
        assert!(!first.epsilon);
        assert!(first.admits(A));
        assert!(first.admits(B));
        assert!(!first.admits(LexerSymbol::EOF));
    }

    #[test]
    fn star_and_empty_sequence_are_nullable() {
        let combinators = arena(vec![
            CombinatorKind::Token { symbol: A },
            CombinatorKind::Many {
                child: ParserId(0),
                quantified: None,
            },
            CombinatorKind::Sequence { elements: vec![] },
        ]);
        assert!(combinators[1].first.epsilon);
        assert!(combinators[1].first.admits(B));
        assert!(combinators[2].first.epsilon);
    }

    #[test]
    fn left_recursive_reference_reaches_a_fixpoint() {
        // expr := expr A | B
        let combinators = arena(vec![
            CombinatorKind::Token { symbol: A },
            CombinatorKind::Token { symbol: B },
            CombinatorKind::Reference {
                symbol: crate::grammar::ParserSymbol(4),
                target: ParserId(4),
            },
            CombinatorKind::Sequence {
                elements: vec![ParserId(2), ParserId(0)],
            },
            CombinatorKind::Alternatives {
                branches: vec![ParserId(3), ParserId(1)],
            },
        ]);
        let first = &combinators[2].first;
        assert!(first.symbols.contains(&B));
        assert!(!first.epsilon);
    }

    #[test]
    fn unknown_sets_admit_everything() {
        let first = FirstSet::new();
        assert!(first.is_unknown());
        assert!(first.admits(A));
        assert!(first.admits(LexerSymbol::EOF));
    }
}
