//! # Error Types
//!
//! Positioned errors for grammar assembly, lexing, and parsing.
//!
//! With the `diagnostics` feature enabled, all errors also derive
//! [`miette::Diagnostic`] for integration with rich reporters.

use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

use crate::lexer::SourcePosition;

/// The grammar cannot be turned into a parser.
#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum GrammarError {
    #[error("undefined rule '{name}'")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(pakrat::grammar::undefined_rule)))]
    UndefinedRule { name: String },
    #[error("duplicate definition of rule '{name}'")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(pakrat::grammar::duplicate_rule)))]
    DuplicateRule { name: String },
}

/// No lexical symbol matches a non-empty prefix of the remaining input.
#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
#[error("lexing failed at {position}: no matching alternative at '{found}'")]
#[cfg_attr(feature = "diagnostics", diagnostic(code(pakrat::lexer::no_match)))]
pub struct LexicalError {
    pub position: SourcePosition,
    /// The character at the failing position.
    pub found: char,
}

/// The token sequence does not derive from the grammar root.
///
/// Reported at the furthest token the parser failed on, with the union of
/// the FIRST sets consulted there as the expectation.
#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
#[error("parsing failed at {position}: {message}")]
#[cfg_attr(feature = "diagnostics", diagnostic(code(pakrat::parser::syntax)))]
pub struct ParseError {
    pub position: SourcePosition,
    pub message: String,
    /// Sorted names of the lexical symbols that would have been accepted.
    /// Empty when no precise expectation could be derived.
    pub expected: Vec<String>,
    /// Rendering of the offending token (`'text'`, or `end of file`).
    pub found: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexical_error_message() {
        let err = LexicalError {
            position: SourcePosition::new(4, 2, 1),
            found: '#',
        };
        assert_eq!(
            err.to_string(),
            "lexing failed at 2:1: no matching alternative at '#'"
        );
    }

    #[test]
    fn parse_error_message_carries_the_position() {
        let err = ParseError {
            position: SourcePosition::new(2, 1, 3),
            message: "expected {NUM}, but found end of file".to_string(),
            expected: vec!["NUM".to_string()],
            found: "end of file".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "parsing failed at 1:3: expected {NUM}, but found end of file"
        );
    }
}
