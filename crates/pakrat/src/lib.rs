//! # pakrat
//!
//! Runtime core for PEG-based grammar tooling.
//!
//! The crate turns an in-memory grammar description into a working language
//! frontend:
//!
//! - [`nfa`]: Thompson-style NFA construction from character-level regular
//!   expressions, with longest-prefix matching.
//! - [`lexer`]: maximal-munch tokenization driven by one NFA per lexical
//!   symbol, with skip-token attachment and source positions.
//! - [`parser`]: a memoizing packrat parser over combinator graphs, with
//!   FIRST-set pruning and grow-the-seed support for left recursion.
//! - [`syntax`]: arena-backed concrete syntax trees with structural editing
//!   (compaction, cloning, pruning, replacement).
//!
//! ## Example
//!
//! ```
//! use pakrat::grammar::{GrammarBuilder, Quantifier, Regex, RuleAlt, RuleItem};
//! use pakrat::lexer::Lexer;
//! use pakrat::parser::Parser;
//!
//! let mut builder = GrammarBuilder::new();
//! let num = builder.token("NUM", Regex::char_class(&[('0', '9')], Some(Quantifier::Plus)));
//! let plus = builder.token("PLUS", Regex::literal("+"));
//! builder.skip_token("SPACE", Regex::char_class(&[(' ', ' ')], Some(Quantifier::Plus)));
//!
//! let sum = builder.rule("sum");
//! builder.define(
//!     sum,
//!     RuleAlt::sequence(vec![
//!         RuleItem::symbol(num),
//!         RuleItem::nested_quantified(
//!             RuleAlt::sequence(vec![RuleItem::symbol(plus), RuleItem::symbol(num)]),
//!             Quantifier::Star,
//!         ),
//!     ]),
//! );
//!
//! let grammar = builder.finish();
//! let lexer = Lexer::for_grammar(&grammar);
//! let parser = Parser::from_grammar(&grammar).unwrap();
//!
//! let tokens = lexer.tokenize("1 + 2+3").unwrap();
//! let tree = parser.parse(&tokens).unwrap();
//! assert_eq!(tree.text(tree.root().unwrap()), "1+2+3");
//! ```

pub mod error;
pub mod grammar;
pub mod lexer;
pub mod nfa;
pub mod parser;
pub mod syntax;

pub use error::{GrammarError, LexicalError, ParseError};
pub use grammar::{Grammar, GrammarBuilder};
pub use lexer::{Lexer, SourcePosition, Token, TokenStream};
pub use nfa::Nfa;
pub use parser::Parser;
pub use syntax::{NodeId, SyntaxTree};
