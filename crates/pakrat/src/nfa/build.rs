//! Thompson-style construction of [`Nfa`] automata from regexes.

use compact_str::CompactString;
use smallvec::{SmallVec, smallvec};

use super::{CharClass, Nfa, State, StateId};
use crate::grammar::{CharGroup, Quantifier, Regex, RegexAlt, RegexAtom, RegexSeq};

/// An automaton under construction: entry state plus the current accepting
/// states. The literal survives only along unquantified single-literal paths.
struct Fragment {
    start: StateId,
    accepting: SmallVec<[StateId; 4]>,
    literal: Option<CompactString>,
}

struct Builder {
    states: Vec<State>,
}

impl Builder {
    fn new_state(&mut self) -> StateId {
        let id = StateId(u32::try_from(self.states.len()).unwrap_or(u32::MAX));
        self.states.push(State::default());
        id
    }

    fn epsilon(&mut self, from: StateId, to: StateId) {
        if from != to {
            self.states[from.index()].epsilon.push(to);
        }
    }

    fn transition(&mut self, from: StateId, class: CharClass, to: StateId) {
        self.states[from.index()].transitions.push((class, to));
    }

    fn has_outgoing(&self, state: StateId) -> bool {
        let s = &self.states[state.index()];
        !s.transitions.is_empty() || !s.epsilon.is_empty()
    }

    /// Merge a set of accepting states into one, adding a synthetic join
    /// state when there is more than one.
    fn collapse(&mut self, accepting: SmallVec<[StateId; 4]>) -> StateId {
        if accepting.len() == 1 {
            accepting[0]
        } else {
            let join = self.new_state();
            for state in accepting {
                self.epsilon(state, join);
            }
            join
        }
    }

    fn quantify(&mut self, fragment: Fragment, quantifier: Option<Quantifier>) -> Fragment {
        let Some(quantifier) = quantifier else {
            return fragment;
        };
        let accept = self.collapse(fragment.accepting);
        match quantifier {
            Quantifier::Optional => self.epsilon(fragment.start, accept),
            Quantifier::Star => {
                self.epsilon(accept, fragment.start);
                self.epsilon(fragment.start, accept);
            }
            Quantifier::Plus => self.epsilon(accept, fragment.start),
        }
        Fragment {
            start: fragment.start,
            accepting: smallvec![accept],
            literal: None,
        }
    }

    fn alt(&mut self, alt: &RegexAlt) -> Fragment {
        let fragment = if alt.branches.len() == 1 {
            self.seq(&alt.branches[0])
        } else {
            let start = self.new_state();
            let mut accepting = SmallVec::new();
            for branch in &alt.branches {
                let f = self.seq(branch);
                self.epsilon(start, f.start);
                accepting.extend(f.accepting);
            }
            Fragment {
                start,
                accepting,
                literal: None,
            }
        };
        self.quantify(fragment, alt.quantifier)
    }

    fn seq(&mut self, seq: &RegexSeq) -> Fragment {
        match seq.atoms.len() {
            0 => {
                let state = self.new_state();
                Fragment {
                    start: state,
                    accepting: smallvec![state],
                    literal: None,
                }
            }
            1 => self.atom(&seq.atoms[0]),
            _ => {
                let first = self.atom(&seq.atoms[0]);
                let start = first.start;
                let mut accepting = first.accepting;
                for atom in &seq.atoms[1..] {
                    let mut join = self.collapse(accepting);
                    // A join state with outgoing edges (a quantifier loop, for
                    // example) gets a fresh successor so the chain stays linear.
                    if self.has_outgoing(join) {
                        let fresh = self.new_state();
                        self.epsilon(join, fresh);
                        join = fresh;
                    }
                    let f = self.atom(atom);
                    self.epsilon(join, f.start);
                    accepting = f.accepting;
                }
                Fragment {
                    start,
                    accepting,
                    literal: None,
                }
            }
        }
    }

    fn atom(&mut self, atom: &RegexAtom) -> Fragment {
        match atom {
            RegexAtom::Literal { value, quantifier } => {
                let start = self.new_state();
                let mut current = start;
                for c in value.chars() {
                    let next = self.new_state();
                    self.transition(current, CharClass::Single(c), next);
                    current = next;
                }
                let fragment = Fragment {
                    start,
                    accepting: smallvec![current],
                    literal: Some(value.clone()),
                };
                self.quantify(fragment, *quantifier)
            }
            RegexAtom::Group(group) => {
                let start = self.new_state();
                let end = self.new_state();
                self.transition(start, class_for(group), end);
                let fragment = Fragment {
                    start,
                    accepting: smallvec![end],
                    literal: None,
                };
                self.quantify(fragment, group.quantifier)
            }
            RegexAtom::Nested(alt) => self.alt(alt),
        }
    }
}

fn class_for(group: &CharGroup) -> CharClass {
    if !group.inverted && group.ranges.len() == 1 && group.ranges[0].lo == group.ranges[0].hi {
        CharClass::Single(group.ranges[0].lo)
    } else {
        CharClass::Ranges {
            ranges: group.ranges.iter().copied().collect(),
            inverted: group.inverted,
        }
    }
}

pub(super) fn build(regex: &Regex) -> Nfa {
    let mut builder = Builder { states: Vec::new() };
    let fragment = builder.alt(&regex.root);
    seal(builder.states, fragment)
}

/// Freeze the automaton: flag accepting states, cache filtered epsilon
/// closures, and collect the first-character classes.
fn seal(states: Vec<State>, fragment: Fragment) -> Nfa {
    let mut accepting = vec![false; states.len()];
    for state in &fragment.accepting {
        accepting[state.index()] = true;
    }

    let closures: Vec<Vec<StateId>> = (0..states.len())
        .map(|i| {
            let mut reached = vec![false; states.len()];
            let mut stack = vec![StateId(u32::try_from(i).unwrap_or(u32::MAX))];
            reached[i] = true;
            let mut closure = Vec::new();
            while let Some(state) = stack.pop() {
                if accepting[state.index()] || !states[state.index()].transitions.is_empty() {
                    closure.push(state);
                }
                for &next in &states[state.index()].epsilon {
                    if !reached[next.index()] {
                        reached[next.index()] = true;
                        stack.push(next);
                    }
                }
            }
            closure
        })
        .collect();

    let first_chars = closures[fragment.start.index()]
        .iter()
        .flat_map(|state| {
            states[state.index()]
                .transitions
                .iter()
                .map(|(class, _)| class.clone())
        })
        .collect();

    Nfa {
        states,
        start: fragment.start,
        accepting,
        closures,
        first_chars,
        literal: fragment.literal,
    }
}
