//! # NFA Matching Engine
//!
//! Nondeterministic finite automata built from character-level regular
//! expressions via Thompson-style construction, used by the lexer for
//! longest-prefix matching.
//!
//! Automata are sealed after construction: epsilon closures are precomputed
//! per state (filtered to states that accept or carry a character
//! transition), the character classes reachable from the start state feed a
//! cheap first-character rejection test, and regexes that denote a single
//! exact string skip simulation entirely and compare character by character.

mod build;

use ahash::RandomState;
use compact_str::CompactString;
use hashbrown::HashSet;
use smallvec::SmallVec;

use crate::grammar::{CharRange, Regex};

/// State handle inside one [`Nfa`].
///
/// Uses u32, which is sufficient for all practical automaton sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(pub(crate) u32);

impl StateId {
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Matcher on a single transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CharClass {
    Single(char),
    Ranges {
        ranges: SmallVec<[CharRange; 2]>,
        inverted: bool,
    },
}

impl CharClass {
    fn matches(&self, c: char) -> bool {
        match self {
            Self::Single(expected) => c == *expected,
            Self::Ranges { ranges, inverted } => {
                ranges.iter().any(|r| r.contains(c)) != *inverted
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
struct State {
    transitions: SmallVec<[(CharClass, StateId); 2]>,
    epsilon: SmallVec<[StateId; 2]>,
}

/// A sealed automaton for one lexical symbol.
#[derive(Debug, Clone)]
pub struct Nfa {
    states: Vec<State>,
    start: StateId,
    accepting: Vec<bool>,
    /// Per-state epsilon closure, filtered to states that accept or carry a
    /// character transition.
    closures: Vec<Vec<StateId>>,
    /// Character classes leaving the start closure.
    first_chars: Vec<CharClass>,
    /// Set when the regex denotes exactly one string.
    literal: Option<CompactString>,
}

impl Nfa {
    /// Build and seal an automaton for `regex`.
    #[must_use]
    pub fn from_regex(regex: &Regex) -> Self {
        build::build(regex)
    }

    /// The exact string this automaton matches, when the regex is a plain
    /// unquantified literal.
    #[must_use]
    pub fn literal(&self) -> Option<&str> {
        self.literal.as_deref()
    }

    /// Length in characters of the longest prefix of `input[offset..]` this
    /// automaton accepts. Returns 0 when nothing (or only the empty string)
    /// matches.
    #[must_use]
    pub fn prefix_match(&self, input: &[char], offset: usize) -> usize {
        if let Some(literal) = &self.literal {
            let mut len = 0;
            for expected in literal.chars() {
                match input.get(offset + len) {
                    Some(&c) if c == expected => len += 1,
                    _ => return 0,
                }
            }
            return len;
        }

        let Some(&first) = input.get(offset) else {
            return 0;
        };
        if !self.first_chars.iter().any(|class| class.matches(first)) {
            return 0;
        }

        let mut current: HashSet<StateId, RandomState> =
            self.closures[self.start.index()].iter().copied().collect();
        let mut next: HashSet<StateId, RandomState> = HashSet::default();
        let mut longest = 0;
        let mut len = 0;

        for &c in &input[offset..] {
            next.clear();
            for &state in &current {
                for (class, target) in &self.states[state.index()].transitions {
                    if class.matches(c) {
                        next.extend(self.closures[target.index()].iter().copied());
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            len += 1;
            if next.iter().any(|s| self.accepting[s.index()]) {
                longest = len;
            }
            std::mem::swap(&mut current, &mut next);
        }

        longest
    }

    /// Whether this automaton accepts all of `input`.
    #[must_use]
    pub fn matches(&self, input: &str) -> bool {
        let mut current: HashSet<StateId, RandomState> =
            self.closures[self.start.index()].iter().copied().collect();
        let mut next: HashSet<StateId, RandomState> = HashSet::default();

        for c in input.chars() {
            next.clear();
            for &state in &current {
                for (class, target) in &self.states[state.index()].transitions {
                    if class.matches(c) {
                        next.extend(self.closures[target.index()].iter().copied());
                    }
                }
            }
            if next.is_empty() {
                return false;
            }
            std::mem::swap(&mut current, &mut next);
        }

        current.iter().any(|s| self.accepting[s.index()])
    }

    #[must_use]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{CharGroup, Quantifier, RegexAlt, RegexAtom, RegexSeq};
    use compact_str::CompactString;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn literal_atom(value: &str, quantifier: Option<Quantifier>) -> RegexAtom {
        RegexAtom::Literal {
            value: CompactString::from(value),
            quantifier,
        }
    }

    #[test]
    fn literal_uses_the_fast_path() {
        let nfa = Nfa::from_regex(&Regex::literal("while"));
        assert_eq!(nfa.literal(), Some("while"));
        assert_eq!(nfa.prefix_match(&chars("while more"), 0), 5);
        assert_eq!(nfa.prefix_match(&chars("whale"), 0), 0);
        assert_eq!(nfa.prefix_match(&chars("wh"), 0), 0);
        assert_eq!(nfa.prefix_match(&chars("xwhile"), 1), 5);
    }

    #[test]
    fn char_class_plus_matches_longest_prefix() {
        let nfa = Nfa::from_regex(&Regex::char_class(&[('0', '9')], Some(Quantifier::Plus)));
        assert!(nfa.literal().is_none());
        assert_eq!(nfa.prefix_match(&chars("123a"), 0), 3);
        assert_eq!(nfa.prefix_match(&chars("7"), 0), 1);
        assert_eq!(nfa.prefix_match(&chars("a1"), 0), 0);
        assert_eq!(nfa.prefix_match(&chars(""), 0), 0);
    }

    #[test]
    fn star_never_reports_an_empty_match() {
        let nfa = Nfa::from_regex(&Regex::char_class(&[('a', 'z')], Some(Quantifier::Star)));
        assert_eq!(nfa.prefix_match(&chars("abc1"), 0), 3);
        assert_eq!(nfa.prefix_match(&chars("123"), 0), 0);
    }

    #[test]
    fn optional_literal_in_sequence() {
        // "-"? [0-9]+
        let regex = Regex::new(RegexAlt {
            branches: vec![RegexSeq {
                atoms: vec![
                    literal_atom("-", Some(Quantifier::Optional)),
                    RegexAtom::Group(CharGroup {
                        ranges: vec![CharRange::new('0', '9')],
                        inverted: false,
                        quantifier: Some(Quantifier::Plus),
                    }),
                ],
            }],
            quantifier: None,
        });
        let nfa = Nfa::from_regex(&regex);
        assert!(nfa.literal().is_none());
        assert_eq!(nfa.prefix_match(&chars("-42"), 0), 3);
        assert_eq!(nfa.prefix_match(&chars("42"), 0), 2);
        assert_eq!(nfa.prefix_match(&chars("-"), 0), 0);
    }

    #[test]
    fn alternation_takes_the_longest_branch() {
        // "aa" | "a"
        let regex = Regex::new(RegexAlt {
            branches: vec![
                RegexSeq {
                    atoms: vec![literal_atom("aa", None)],
                },
                RegexSeq {
                    atoms: vec![literal_atom("a", None)],
                },
            ],
            quantifier: None,
        });
        let nfa = Nfa::from_regex(&regex);
        assert!(nfa.literal().is_none());
        assert_eq!(nfa.prefix_match(&chars("aa"), 0), 2);
        assert_eq!(nfa.prefix_match(&chars("ab"), 0), 1);
        assert_eq!(nfa.prefix_match(&chars("b"), 0), 0);
    }

    #[test]
    fn inverted_group_rejects_listed_ranges() {
        let nfa = Nfa::from_regex(&Regex::negated_char_class(
            &[('0', '9')],
            Some(Quantifier::Plus),
        ));
        assert_eq!(nfa.prefix_match(&chars("ab1"), 0), 2);
        assert_eq!(nfa.prefix_match(&chars("1ab"), 0), 0);
    }

    #[test]
    fn first_character_filter_rejects_early() {
        // ("+" | "-") [0-9]
        let regex = Regex::new(RegexAlt {
            branches: vec![RegexSeq {
                atoms: vec![
                    RegexAtom::Nested(RegexAlt {
                        branches: vec![
                            RegexSeq {
                                atoms: vec![literal_atom("+", None)],
                            },
                            RegexSeq {
                                atoms: vec![literal_atom("-", None)],
                            },
                        ],
                        quantifier: None,
                    }),
                    RegexAtom::Group(CharGroup {
                        ranges: vec![CharRange::new('0', '9')],
                        inverted: false,
                        quantifier: None,
                    }),
                ],
            }],
            quantifier: None,
        });
        let nfa = Nfa::from_regex(&regex);
        assert_eq!(nfa.prefix_match(&chars("+1"), 0), 2);
        assert_eq!(nfa.prefix_match(&chars("-9"), 0), 2);
        assert_eq!(nfa.prefix_match(&chars("1"), 0), 0);
        assert_eq!(nfa.prefix_match(&chars("+"), 0), 0);
    }

    #[test]
    fn whole_input_matching() {
        let nfa = Nfa::from_regex(&Regex::char_class(&[('a', 'z')], Some(Quantifier::Plus)));
        assert!(nfa.matches("abc"));
        assert!(!nfa.matches("ab1"));
        assert!(!nfa.matches(""));

        let star = Nfa::from_regex(&Regex::char_class(&[('a', 'z')], Some(Quantifier::Star)));
        assert!(star.matches(""));
        assert!(star.matches("xyz"));
    }

    #[test]
    fn quantified_literal_loses_the_fast_path() {
        let regex = Regex::new(RegexAlt {
            branches: vec![RegexSeq {
                atoms: vec![literal_atom("ab", Some(Quantifier::Plus))],
            }],
            quantifier: None,
        });
        let nfa = Nfa::from_regex(&regex);
        assert!(nfa.literal().is_none());
        assert_eq!(nfa.prefix_match(&chars("ababab"), 0), 6);
        assert_eq!(nfa.prefix_match(&chars("aba"), 0), 2);
    }
}
