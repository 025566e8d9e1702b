use ahash::RandomState;
use compact_str::CompactString;
use hashbrown::HashMap;

use super::regex::Regex;
use super::rule::RuleAlt;
use super::symbols::{Annotation, ParserSymbol, Symbol, SymbolTable};
use super::{Grammar, LexerSymbol, LexicalProduction, SyntacticProduction};

/// Incrementally assembles a [`Grammar`].
///
/// Declaration order is significant: lexical productions are tried in order
/// by the lexer (ties go to the earliest declaration), and the first defined
/// rule becomes the grammar root.
///
/// Rule symbols may be declared with [`GrammarBuilder::rule`] before they are
/// defined, which allows mutually recursive productions.
#[derive(Debug)]
pub struct GrammarBuilder {
    symbols: SymbolTable,
    by_name: HashMap<CompactString, Symbol, RandomState>,
    lexical: Vec<LexicalProduction>,
    syntactic: Vec<SyntacticProduction>,
}

impl GrammarBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            symbols: SymbolTable::new(),
            by_name: HashMap::default(),
            lexical: Vec::new(),
            syntactic: Vec::new(),
        }
    }

    /// Declare a lexical symbol matching `regex`.
    pub fn token(&mut self, name: &str, regex: Regex) -> LexerSymbol {
        self.lexical_production(name, regex, false)
    }

    /// Declare a lexical symbol whose tokens are skipped by the parser and
    /// attached to the next kept token.
    pub fn skip_token(&mut self, name: &str, regex: Regex) -> LexerSymbol {
        self.lexical_production(name, regex, true)
    }

    fn lexical_production(&mut self, name: &str, regex: Regex, skip: bool) -> LexerSymbol {
        if let Some(Symbol::Lexer(existing)) = self.by_name.get(name) {
            return *existing;
        }
        let symbol = self.symbols.add_lexer_symbol(name, skip);
        if skip {
            self.symbols
                .add_annotation(symbol.into(), Annotation::new(Annotation::SKIP, None));
        }
        self.by_name.insert(CompactString::from(name), symbol.into());
        self.lexical.push(LexicalProduction { symbol, regex });
        symbol
    }

    /// Declare a rule symbol, reusing the handle if `name` was declared
    /// before.
    pub fn rule(&mut self, name: &str) -> ParserSymbol {
        if let Some(Symbol::Parser(existing)) = self.by_name.get(name) {
            return *existing;
        }
        let symbol = self.symbols.add_parser_symbol(name);
        self.by_name.insert(CompactString::from(name), symbol.into());
        symbol
    }

    /// Define the production of a previously declared rule symbol.
    pub fn define(&mut self, symbol: ParserSymbol, rule: RuleAlt) {
        self.syntactic.push(SyntacticProduction { symbol, rule });
    }

    /// Attach an annotation to a symbol's production.
    pub fn annotate(&mut self, symbol: impl Into<Symbol>, key: &str, value: Option<&str>) {
        self.symbols
            .add_annotation(symbol.into(), Annotation::new(key, value));
    }

    /// Finish the grammar. The first defined rule is the root.
    ///
    /// # Panics
    ///
    /// Panics if no rule has been defined.
    #[must_use]
    pub fn finish(self) -> Grammar {
        assert!(
            !self.syntactic.is_empty(),
            "grammar needs at least one rule definition"
        );
        let root = self.syntactic[0].symbol;
        Grammar {
            symbols: self.symbols,
            lexical: self.lexical,
            syntactic: self.syntactic,
            root,
        }
    }
}

impl Default for GrammarBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Quantifier, RuleItem};

    #[test]
    fn first_rule_becomes_root() {
        let mut builder = GrammarBuilder::new();
        let num = builder.token("NUM", Regex::char_class(&[('0', '9')], Some(Quantifier::Plus)));
        let expr = builder.rule("expr");
        let term = builder.rule("term");
        builder.define(expr, RuleAlt::sequence(vec![RuleItem::symbol(term)]));
        builder.define(term, RuleAlt::sequence(vec![RuleItem::symbol(num)]));

        let grammar = builder.finish();
        assert_eq!(grammar.root(), expr);
        assert_eq!(grammar.lexical_productions().len(), 1);
        assert_eq!(grammar.syntactic_productions().len(), 2);
    }

    #[test]
    fn forward_declared_rules_share_handles() {
        let mut builder = GrammarBuilder::new();
        let first = builder.rule("expr");
        let second = builder.rule("expr");
        assert_eq!(first, second);
    }

    #[test]
    fn skip_tokens_carry_the_skip_annotation() {
        let mut builder = GrammarBuilder::new();
        let space = builder.skip_token("SPACE", Regex::literal(" "));
        let expr = builder.rule("expr");
        builder.define(expr, RuleAlt::sequence(vec![RuleItem::symbol(space)]));

        let grammar = builder.finish();
        assert!(grammar.symbols().is_skip(space));
        assert!(
            grammar
                .symbols()
                .annotations(space.into())
                .iter()
                .any(|a| a.key == Annotation::SKIP)
        );
    }
}
