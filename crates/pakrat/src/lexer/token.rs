use compact_str::CompactString;

use crate::grammar::LexerSymbol;

/// A position in the lexed input. `offset` counts characters from 0; `line`
/// and `column` are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourcePosition {
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl SourcePosition {
    #[must_use]
    pub const fn new(offset: usize, line: u32, column: u32) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    /// Start of input.
    pub const START: Self = Self::new(0, 1, 1);
}

impl std::fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// One lexed token.
///
/// Skipped tokens between the previous kept token and this one are attached
/// to `skipped_before`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    pub symbol: LexerSymbol,
    pub text: CompactString,
    pub begin: SourcePosition,
    pub end: SourcePosition,
    pub skipped_before: Vec<Token>,
}

impl Token {
    #[must_use]
    pub fn new(symbol: LexerSymbol, text: &str, begin: SourcePosition, end: SourcePosition) -> Self {
        Self {
            symbol,
            text: CompactString::from(text),
            begin,
            end,
            skipped_before: Vec::new(),
        }
    }

    /// Whether this is the end-of-input sentinel.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.symbol == LexerSymbol::EOF
    }

    /// The token text with control and non-printable characters escaped, for
    /// diagnostics.
    #[must_use]
    pub fn escaped_text(&self) -> String {
        self.text
            .chars()
            .flat_map(|c| match c {
                '\n' => "\\n".chars().collect::<Vec<_>>(),
                '\t' => "\\t".chars().collect(),
                '\r' => "\\r".chars().collect(),
                c => vec![c],
            })
            .collect()
    }
}

/// Random-access token sequence with an end-of-input sentinel.
///
/// The sentinel sits just past the last lexed character, carries any
/// trailing skipped tokens, and is returned for every out-of-range index, so
/// the parser never runs off the end.
#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: Vec<Token>,
    eof: Token,
}

impl TokenStream {
    #[must_use]
    pub(crate) fn new(tokens: Vec<Token>, eof: Token) -> Self {
        Self { tokens, eof }
    }

    /// Number of kept tokens, excluding the end-of-input sentinel.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Token at `position`; the end-of-input sentinel for any position at or
    /// past the end.
    #[must_use]
    pub fn at(&self, position: usize) -> &Token {
        self.tokens.get(position).unwrap_or(&self.eof)
    }

    #[must_use]
    pub fn eof(&self) -> &Token {
        &self.eof
    }

    /// The kept tokens, without the sentinel.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}
