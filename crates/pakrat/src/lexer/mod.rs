//! # Lexer
//!
//! Maximal-munch tokenization driven by one [`Nfa`] per lexical symbol.
//!
//! At every position all automata are queried for their longest prefix
//! match; the longest one wins, and on equal lengths the symbol declared
//! first in the grammar wins. That declaration-order tie-break is the knob
//! for keyword-versus-identifier precedence.
//!
//! Tokens of skip symbols are buffered and attached to the next kept token
//! (the end-of-input sentinel catches trailing ones), so trivia survives
//! lexing without showing up in the parsed sequence.

mod token;

pub use token::{SourcePosition, Token, TokenStream};

use compact_str::CompactString;

use crate::error::LexicalError;
use crate::grammar::{Grammar, LexerSymbol};
use crate::nfa::Nfa;

struct LexRule {
    symbol: LexerSymbol,
    nfa: Nfa,
    skip: bool,
}

/// A lexer for one grammar. Immutable once built; `tokenize` can be called
/// concurrently from multiple threads.
pub struct Lexer {
    rules: Vec<LexRule>,
}

impl Lexer {
    /// Compile one automaton per lexical production, in declaration order.
    #[must_use]
    pub fn for_grammar(grammar: &Grammar) -> Self {
        let rules = grammar
            .lexical_productions()
            .iter()
            .map(|production| LexRule {
                symbol: production.symbol,
                nfa: Nfa::from_regex(&production.regex),
                skip: grammar.symbols().is_skip(production.symbol),
            })
            .collect();
        Self { rules }
    }

    /// Tokenize `input`, attaching skip tokens to the following kept token.
    ///
    /// # Errors
    ///
    /// Returns a [`LexicalError`] at the first position where no lexical
    /// symbol matches a non-empty prefix.
    pub fn tokenize(&self, input: &str) -> Result<TokenStream, LexicalError> {
        self.tokenize_with(input, false)
    }

    /// Tokenize `input`. With `keep_skipped` set, skip tokens appear in the
    /// stream like any other token instead of being attached as trivia.
    ///
    /// # Errors
    ///
    /// Returns a [`LexicalError`] at the first position where no lexical
    /// symbol matches a non-empty prefix.
    pub fn tokenize_with(
        &self,
        input: &str,
        keep_skipped: bool,
    ) -> Result<TokenStream, LexicalError> {
        let chars: Vec<char> = input.chars().collect();
        let mut tokens = Vec::new();
        let mut skipped: Vec<Token> = Vec::new();

        let mut index = 0;
        let mut line = 1u32;
        let mut column = 1u32;

        while index < chars.len() {
            let mut longest = 0;
            let mut best: Option<&LexRule> = None;
            for rule in &self.rules {
                let length = rule.nfa.prefix_match(&chars, index);
                if length > longest {
                    longest = length;
                    best = Some(rule);
                }
            }

            let Some(rule) = best else {
                return Err(LexicalError {
                    position: SourcePosition::new(index, line, column),
                    found: chars[index],
                });
            };

            let begin = SourcePosition::new(index, line, column);
            for &c in &chars[index..index + longest] {
                if c == '\n' {
                    line += 1;
                    column = 1;
                } else {
                    column += 1;
                }
            }
            let end = SourcePosition::new(index + longest, line, column);

            // Reuse the literal instead of copying out of the input.
            let text: CompactString = rule
                .nfa
                .literal()
                .map_or_else(|| chars[index..index + longest].iter().collect(), |l| {
                    CompactString::from(l)
                });
            index += longest;

            let mut token = Token {
                symbol: rule.symbol,
                text,
                begin,
                end,
                skipped_before: Vec::new(),
            };
            if rule.skip && !keep_skipped {
                skipped.push(token);
            } else {
                token.skipped_before = std::mem::take(&mut skipped);
                tokens.push(token);
            }
        }

        let position = SourcePosition::new(index, line, column);
        let mut eof = Token::new(LexerSymbol::EOF, "", position, position);
        eof.skipped_before = skipped;
        Ok(TokenStream::new(tokens, eof))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{GrammarBuilder, Quantifier, Regex, RuleAlt, RuleItem};

    fn digits_grammar() -> Grammar {
        let mut builder = GrammarBuilder::new();
        let num = builder.token("NUM", Regex::char_class(&[('0', '9')], Some(Quantifier::Plus)));
        let start = builder.rule("start");
        builder.define(start, RuleAlt::sequence(vec![RuleItem::symbol(num)]));
        builder.finish()
    }

    #[test]
    fn single_token_and_sentinel() {
        let grammar = digits_grammar();
        let lexer = Lexer::for_grammar(&grammar);
        let stream = lexer.tokenize("123").unwrap();

        assert_eq!(stream.len(), 1);
        assert_eq!(stream.at(0).text, "123");
        assert_eq!(stream.at(0).begin, SourcePosition::new(0, 1, 1));
        assert_eq!(stream.at(0).end, SourcePosition::new(3, 1, 4));
        assert!(stream.at(1).is_eof());
        assert!(stream.at(99).is_eof());
        assert_eq!(stream.eof().begin, SourcePosition::new(3, 1, 4));
    }

    #[test]
    fn empty_input_yields_only_the_sentinel() {
        let grammar = digits_grammar();
        let lexer = Lexer::for_grammar(&grammar);
        let stream = lexer.tokenize("").unwrap();
        assert!(stream.is_empty());
        assert_eq!(stream.eof().begin, SourcePosition::START);
    }

    #[test]
    fn no_match_reports_the_exact_position() {
        let grammar = digits_grammar();
        let lexer = Lexer::for_grammar(&grammar);
        let err = lexer.tokenize("12x").unwrap_err();
        assert_eq!(err.position, SourcePosition::new(2, 1, 3));
        assert_eq!(err.found, 'x');
        assert!(err.to_string().contains("no matching alternative"));
    }

    #[test]
    fn newlines_reset_the_column() {
        let mut builder = GrammarBuilder::new();
        let num = builder.token("NUM", Regex::char_class(&[('0', '9')], Some(Quantifier::Plus)));
        builder.skip_token(
            "WS",
            Regex::char_class(&[(' ', ' '), ('\n', '\n')], Some(Quantifier::Plus)),
        );
        let start = builder.rule("start");
        builder.define(start, RuleAlt::sequence(vec![RuleItem::symbol(num)]));
        let grammar = builder.finish();

        let lexer = Lexer::for_grammar(&grammar);
        let stream = lexer.tokenize("1\n 2").unwrap();
        assert_eq!(stream.at(0).begin, SourcePosition::new(0, 1, 1));
        assert_eq!(stream.at(1).begin, SourcePosition::new(3, 2, 2));
        assert_eq!(stream.at(1).skipped_before.len(), 1);
        assert_eq!(stream.at(1).skipped_before[0].text, "\n ");
    }
}
