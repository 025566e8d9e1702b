use super::regex::Quantifier;
use super::symbols::Symbol;

/// Right-hand side of a syntactic production: ordered alternation over
/// sequences, with an optional quantifier applying to the whole alternation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleAlt {
    pub branches: Vec<RuleSeq>,
    pub quantifier: Option<Quantifier>,
}

/// Concatenation of rule items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSeq {
    pub items: Vec<RuleItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleItem {
    /// A terminal or rule occurrence.
    Symbol {
        symbol: Symbol,
        quantifier: Option<Quantifier>,
    },
    /// A parenthesized sub-expression.
    Nested(RuleAlt),
}

impl RuleAlt {
    #[must_use]
    pub const fn choice(branches: Vec<RuleSeq>) -> Self {
        Self {
            branches,
            quantifier: None,
        }
    }

    /// Single-branch alternation over one sequence of items.
    #[must_use]
    pub fn sequence(items: Vec<RuleItem>) -> Self {
        Self {
            branches: vec![RuleSeq { items }],
            quantifier: None,
        }
    }

    /// The symbol a quantification of this expression ranges over, when the
    /// expression is (possibly nested) a single unquantified symbol.
    ///
    /// Used to alias iteration wrapper nodes in the syntax tree.
    #[must_use]
    pub fn quantified_symbol(&self) -> Option<Symbol> {
        if self.branches.len() != 1 || self.branches[0].items.len() != 1 {
            return None;
        }
        match &self.branches[0].items[0] {
            RuleItem::Symbol {
                symbol,
                quantifier: None,
            } => Some(*symbol),
            RuleItem::Nested(inner) if inner.quantifier.is_none() => inner.quantified_symbol(),
            _ => None,
        }
    }
}

impl RuleSeq {
    #[must_use]
    pub const fn new(items: Vec<RuleItem>) -> Self {
        Self { items }
    }
}

impl RuleItem {
    #[must_use]
    pub fn symbol(symbol: impl Into<Symbol>) -> Self {
        Self::Symbol {
            symbol: symbol.into(),
            quantifier: None,
        }
    }

    #[must_use]
    pub fn quantified(symbol: impl Into<Symbol>, quantifier: Quantifier) -> Self {
        Self::Symbol {
            symbol: symbol.into(),
            quantifier: Some(quantifier),
        }
    }

    #[must_use]
    pub const fn nested(alt: RuleAlt) -> Self {
        Self::Nested(alt)
    }

    #[must_use]
    pub fn nested_quantified(mut alt: RuleAlt, quantifier: Quantifier) -> Self {
        alt.quantifier = Some(quantifier);
        Self::Nested(alt)
    }
}
