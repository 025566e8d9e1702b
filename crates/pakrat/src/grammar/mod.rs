//! # Grammar Model
//!
//! The in-memory description of a language that the lexer and parser are
//! built from: a [`SymbolTable`] of lexical and syntactic symbols, ordered
//! lexical productions (symbol + character-level [`Regex`]), and ordered
//! syntactic productions (symbol + symbol-level [`RuleAlt`]).
//!
//! Grammars are assembled with [`GrammarBuilder`] and immutable afterwards.
//! Parsing the surface syntax of grammar files and validating or rewriting
//! grammars are out of scope here; collaborators construct the model
//! directly.

mod builder;
mod regex;
mod rule;
mod symbols;

pub use builder::GrammarBuilder;
pub use regex::{CharGroup, CharRange, Quantifier, Regex, RegexAlt, RegexAtom, RegexSeq};
pub use rule::{RuleAlt, RuleItem, RuleSeq};
pub use symbols::{Annotation, LexerSymbol, ParserSymbol, Symbol, SymbolTable};

/// A lexical production: one symbol, one regular expression.
#[derive(Debug, Clone)]
pub struct LexicalProduction {
    pub symbol: LexerSymbol,
    pub regex: Regex,
}

/// A syntactic production: one rule symbol, one right-hand side.
#[derive(Debug, Clone)]
pub struct SyntacticProduction {
    pub symbol: ParserSymbol,
    pub rule: RuleAlt,
}

/// A complete grammar: symbols plus ordered productions.
#[derive(Debug, Clone)]
pub struct Grammar {
    symbols: SymbolTable,
    lexical: Vec<LexicalProduction>,
    syntactic: Vec<SyntacticProduction>,
    root: ParserSymbol,
}

impl Grammar {
    #[must_use]
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Lexical productions in declaration order.
    #[must_use]
    pub fn lexical_productions(&self) -> &[LexicalProduction] {
        &self.lexical
    }

    /// Syntactic productions in declaration order.
    #[must_use]
    pub fn syntactic_productions(&self) -> &[SyntacticProduction] {
        &self.syntactic
    }

    /// The start symbol: the first defined rule.
    #[must_use]
    pub fn root(&self) -> ParserSymbol {
        self.root
    }
}
