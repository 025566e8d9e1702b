use compact_str::CompactString;

/// Repetition marker on regex atoms and rule items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Quantifier {
    /// Zero or one (`?`).
    Optional,
    /// Zero or more (`*`).
    Star,
    /// One or more (`+`).
    Plus,
}

/// Inclusive character range; a single character has `lo == hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharRange {
    pub lo: char,
    pub hi: char,
}

impl CharRange {
    #[must_use]
    pub const fn new(lo: char, hi: char) -> Self {
        Self { lo, hi }
    }

    #[must_use]
    pub const fn single(c: char) -> Self {
        Self { lo: c, hi: c }
    }

    #[must_use]
    pub const fn contains(self, c: char) -> bool {
        self.lo <= c && c <= self.hi
    }
}

/// Character class: a union of ranges, optionally inverted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharGroup {
    pub ranges: Vec<CharRange>,
    pub inverted: bool,
    pub quantifier: Option<Quantifier>,
}

/// Character-level regular expression describing one lexical symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Regex {
    pub root: RegexAlt,
}

/// Ordered alternation over sequences, with an optional quantifier applying
/// to the whole alternation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexAlt {
    pub branches: Vec<RegexSeq>,
    pub quantifier: Option<Quantifier>,
}

/// Concatenation of atoms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexSeq {
    pub atoms: Vec<RegexAtom>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegexAtom {
    /// An exact string, matched character by character.
    Literal {
        value: CompactString,
        quantifier: Option<Quantifier>,
    },
    /// A character class.
    Group(CharGroup),
    /// A parenthesized sub-expression.
    Nested(RegexAlt),
}

impl Regex {
    #[must_use]
    pub const fn new(root: RegexAlt) -> Self {
        Self { root }
    }

    /// Regex matching exactly `value`.
    #[must_use]
    pub fn literal(value: &str) -> Self {
        Self::single_atom(RegexAtom::Literal {
            value: CompactString::from(value),
            quantifier: None,
        })
    }

    /// Regex matching one character out of `ranges`, repeated per
    /// `quantifier`.
    #[must_use]
    pub fn char_class(ranges: &[(char, char)], quantifier: Option<Quantifier>) -> Self {
        Self::single_atom(RegexAtom::Group(CharGroup {
            ranges: ranges.iter().map(|&(lo, hi)| CharRange::new(lo, hi)).collect(),
            inverted: false,
            quantifier,
        }))
    }

    /// Like [`Regex::char_class`], but matching every character *not* in
    /// `ranges`.
    #[must_use]
    pub fn negated_char_class(ranges: &[(char, char)], quantifier: Option<Quantifier>) -> Self {
        Self::single_atom(RegexAtom::Group(CharGroup {
            ranges: ranges.iter().map(|&(lo, hi)| CharRange::new(lo, hi)).collect(),
            inverted: true,
            quantifier,
        }))
    }

    fn single_atom(atom: RegexAtom) -> Self {
        Self {
            root: RegexAlt {
                branches: vec![RegexSeq { atoms: vec![atom] }],
                quantifier: None,
            },
        }
    }
}
