//! # Packrat Parser
//!
//! A memoizing PEG parser over a combinator arena compiled from a
//! [`Grammar`].
//!
//! Each syntactic production becomes a graph of combinators (token,
//! sequence, ordered choice, `?`/`*`/`+`, rule reference). Parsing walks the
//! graph top-down with ordered choice; rule references are memoized per
//! input position, FIRST sets prune attempts that cannot succeed, and
//! left-recursive rules are handled by growing a seed match until it stops
//! improving.
//!
//! The parser itself is immutable after construction; every parse call
//! carries its own memo tables, so one parser can serve many threads.

mod engine;
mod first;

use ahash::RandomState;
use hashbrown::HashMap;

use engine::{Outcome, ParentCtx, ParseCtx};
use first::{FirstSet, compute_first_sets};

use crate::error::{GrammarError, ParseError};
use crate::grammar::{
    Grammar, LexerSymbol, ParserSymbol, Quantifier, RuleAlt, RuleItem, RuleSeq, Symbol,
    SymbolTable,
};
use crate::lexer::TokenStream;
use crate::syntax::SyntaxTree;

/// Combinator handle inside one [`Parser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ParserId(pub(crate) u32);

impl ParserId {
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
pub(crate) enum CombinatorKind {
    /// Match one token by symbol identity.
    Token { symbol: LexerSymbol },
    Sequence {
        elements: Vec<ParserId>,
    },
    /// Ordered choice; the first admissible succeeding branch wins.
    Alternatives {
        branches: Vec<ParserId>,
    },
    Optional {
        child: ParserId,
        quantified: Option<Symbol>,
    },
    Many {
        child: ParserId,
        quantified: Option<Symbol>,
    },
    ManyOne {
        child: ParserId,
        quantified: Option<Symbol>,
    },
    /// Occurrence of a rule; the only memoized combinator.
    Reference {
        symbol: ParserSymbol,
        target: ParserId,
    },
}

#[derive(Debug)]
pub(crate) struct Combinator {
    pub(crate) kind: CombinatorKind,
    pub(crate) first: FirstSet,
}

impl Combinator {
    pub(crate) fn new(kind: CombinatorKind) -> Self {
        Self {
            kind,
            first: FirstSet::new(),
        }
    }
}

/// A packrat parser for one grammar.
#[derive(Debug)]
pub struct Parser {
    symbols: SymbolTable,
    combinators: Vec<Combinator>,
    /// Root rule followed by the end-of-input token.
    start: ParserId,
    quantifier_nodes: bool,
}

impl Parser {
    /// Compile the combinator arena for `grammar` and compute FIRST sets.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::UndefinedRule`] when a production references
    /// a rule symbol that is never defined, and
    /// [`GrammarError::DuplicateRule`] when a rule symbol is defined more
    /// than once.
    pub fn from_grammar(grammar: &Grammar) -> Result<Self, GrammarError> {
        let symbols = grammar.symbols().clone();
        let mut assembler = Assembler {
            symbols: &symbols,
            combinators: Vec::new(),
            token_parsers: Vec::new(),
            references: HashMap::default(),
        };

        for symbol in symbols.lexer_symbols() {
            let id = assembler.push(CombinatorKind::Token { symbol });
            assembler.token_parsers.push(id);
        }
        for production in grammar.syntactic_productions() {
            let id = assembler.push(CombinatorKind::Reference {
                symbol: production.symbol,
                target: ParserId(u32::MAX),
            });
            if assembler.references.insert(production.symbol, id).is_some() {
                return Err(GrammarError::DuplicateRule {
                    name: symbols.parser_name(production.symbol).to_string(),
                });
            }
        }
        for production in grammar.syntactic_productions() {
            let body = assembler.alt(&production.rule)?;
            assembler.resolve(assembler.references[&production.symbol], body);
        }

        let root = assembler.references[&grammar.root()];
        let eof = assembler.token_parsers[LexerSymbol::EOF.index()];
        let start = assembler.push(CombinatorKind::Sequence {
            elements: vec![root, eof],
        });

        let mut combinators = assembler.combinators;
        compute_first_sets(&mut combinators);

        Ok(Self {
            symbols,
            combinators,
            start,
            quantifier_nodes: true,
        })
    }

    /// Disable (or re-enable) the `?`/`*`/`+`/`ITEM` wrapper nodes;
    /// quantified matches are then spliced directly into the parent node.
    #[must_use]
    pub fn with_quantifier_nodes(mut self, quantifier_nodes: bool) -> Self {
        self.quantifier_nodes = quantifier_nodes;
        self
    }

    #[must_use]
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Parse `tokens` from the grammar root, consuming the whole stream.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] at the furthest failing token when the
    /// stream does not derive from the root.
    pub fn parse(&self, tokens: &TokenStream) -> Result<SyntaxTree, ParseError> {
        let mut tree = SyntaxTree::new();
        let mut ctx = ParseCtx::new(tokens, true);
        match self.run(self.start, 0, ParentCtx::NONE, &mut ctx, &mut tree) {
            Outcome::Success { fragments, .. } => {
                // Fragments are the root node (if the parse produced one)
                // followed by the end-of-input leaf.
                let root = if fragments.len() > 1 {
                    Some(fragments[0])
                } else {
                    None
                };
                tree.set_root(root);
                if let Some(root) = root {
                    tree.set_parent_references(root);
                }
                Ok(tree)
            }
            Outcome::Failure => Err(self.build_error(&ctx)),
        }
    }

    /// Check whether `tokens` derives from the grammar root without building
    /// a tree.
    ///
    /// # Errors
    ///
    /// Returns the same [`ParseError`] that [`Parser::parse`] would.
    pub fn recognize(&self, tokens: &TokenStream) -> Result<(), ParseError> {
        let mut tree = SyntaxTree::new();
        let mut ctx = ParseCtx::new(tokens, false);
        match self.run(self.start, 0, ParentCtx::NONE, &mut ctx, &mut tree) {
            Outcome::Success { .. } => Ok(()),
            Outcome::Failure => Err(self.build_error(&ctx)),
        }
    }

    /// Derive the error from the memo tables: the failure token is the
    /// furthest one with a recorded failure, and the expectation is the
    /// union of the FIRST sets of every combinator consulted there.
    fn build_error(&self, ctx: &ParseCtx<'_>) -> ParseError {
        let failed = |slot: &HashMap<ParserId, Outcome, RandomState>| {
            slot.values().any(|outcome| matches!(outcome, Outcome::Failure))
        };
        let slot = if failed(&ctx.memo[ctx.len]) {
            ctx.len
        } else {
            (0..ctx.len).rev().find(|&i| failed(&ctx.memo[i])).unwrap_or(0)
        };

        let mut unknown = false;
        let mut expected: Vec<String> = Vec::new();
        for id in ctx.memo[slot].keys() {
            let first = &self.combinators[id.index()].first;
            if first.is_unknown() {
                unknown = true;
            }
            for &symbol in &first.symbols {
                expected.push(self.symbols.lexer_name(symbol).to_string());
            }
        }
        expected.sort();
        expected.dedup();

        let token = ctx.tokens.at(slot);
        let found = if token.is_eof() {
            "end of file".to_string()
        } else {
            format!("'{}'", token.escaped_text())
        };
        let message = if unknown || expected.is_empty() {
            format!("unexpected {found}")
        } else {
            format!("expected {{{}}}, but found {found}", expected.join(", "))
        };

        ParseError {
            position: token.begin,
            message,
            expected,
            found,
        }
    }
}

/// Builds the combinator arena for one grammar.
struct Assembler<'g> {
    symbols: &'g SymbolTable,
    combinators: Vec<Combinator>,
    /// Token combinator per lexical symbol, indexed by handle.
    token_parsers: Vec<ParserId>,
    references: HashMap<ParserSymbol, ParserId, RandomState>,
}

impl Assembler<'_> {
    fn push(&mut self, kind: CombinatorKind) -> ParserId {
        let id = ParserId(u32::try_from(self.combinators.len()).unwrap_or(u32::MAX));
        self.combinators.push(Combinator::new(kind));
        id
    }

    fn resolve(&mut self, reference: ParserId, body: ParserId) {
        if let CombinatorKind::Reference { target, .. } =
            &mut self.combinators[reference.index()].kind
        {
            *target = body;
        }
    }

    fn alt(&mut self, alt: &RuleAlt) -> Result<ParserId, GrammarError> {
        let mut branches = Vec::with_capacity(alt.branches.len());
        for branch in &alt.branches {
            branches.push(self.seq(branch)?);
        }
        let base = if branches.len() == 1 {
            branches[0]
        } else {
            self.push(CombinatorKind::Alternatives { branches })
        };
        Ok(match alt.quantifier {
            None => base,
            Some(quantifier) => self.quantify(base, quantifier, alt.quantified_symbol()),
        })
    }

    fn seq(&mut self, seq: &RuleSeq) -> Result<ParserId, GrammarError> {
        if seq.items.len() == 1 {
            return self.item(&seq.items[0]);
        }
        let mut elements = Vec::with_capacity(seq.items.len());
        for item in &seq.items {
            elements.push(self.item(item)?);
        }
        Ok(self.push(CombinatorKind::Sequence { elements }))
    }

    fn item(&mut self, item: &RuleItem) -> Result<ParserId, GrammarError> {
        match item {
            RuleItem::Symbol { symbol, quantifier } => {
                let base = match symbol {
                    Symbol::Lexer(lexer) => self.token_parsers[lexer.index()],
                    Symbol::Parser(parser) => {
                        self.references.get(parser).copied().ok_or_else(|| {
                            GrammarError::UndefinedRule {
                                name: self.symbols.parser_name(*parser).to_string(),
                            }
                        })?
                    }
                };
                Ok(match quantifier {
                    None => base,
                    Some(quantifier) => self.quantify(base, *quantifier, Some(*symbol)),
                })
            }
            RuleItem::Nested(alt) => self.alt(alt),
        }
    }

    fn quantify(
        &mut self,
        child: ParserId,
        quantifier: Quantifier,
        quantified: Option<Symbol>,
    ) -> ParserId {
        let kind = match quantifier {
            Quantifier::Optional => CombinatorKind::Optional { child, quantified },
            Quantifier::Star => CombinatorKind::Many { child, quantified },
            Quantifier::Plus => CombinatorKind::ManyOne { child, quantified },
        };
        self.push(kind)
    }
}
