use compact_str::CompactString;

/// Handle for a lexical (terminal) symbol.
///
/// Handles are indices into the owning [`SymbolTable`]; equality and hashing
/// are by identity, never by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LexerSymbol(pub(crate) u32);

impl LexerSymbol {
    /// The end-of-input sentinel, present in every symbol table.
    pub const EOF: Self = Self(0);

    #[must_use]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this is the end-of-input sentinel.
    #[must_use]
    pub const fn is_eof(self) -> bool {
        self.0 == 0
    }
}

/// Handle for a syntactic (rule) symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParserSymbol(pub(crate) u32);

impl ParserSymbol {
    /// Wrapper symbol for `?` quantifications.
    pub const OPTIONAL: Self = Self(0);
    /// Wrapper symbol for `*` quantifications.
    pub const STAR: Self = Self(1);
    /// Wrapper symbol for `+` quantifications.
    pub const PLUS: Self = Self(2);
    /// Wrapper symbol for single iterations inside a quantification.
    pub const LIST_ITEM: Self = Self(3);

    const AUXILIARY_COUNT: u32 = 4;

    #[must_use]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this is one of the `?`/`*`/`+` wrapper symbols.
    #[must_use]
    pub const fn is_quantifier(self) -> bool {
        matches!(self, Self::OPTIONAL | Self::STAR | Self::PLUS)
    }

    /// Whether this is the iteration wrapper symbol.
    #[must_use]
    pub const fn is_list_item(self) -> bool {
        self.0 == Self::LIST_ITEM.0
    }

    /// Whether this symbol names an auxiliary wrapper node rather than a
    /// grammar rule.
    #[must_use]
    pub const fn is_auxiliary(self) -> bool {
        self.0 < Self::AUXILIARY_COUNT
    }
}

/// Either side of the symbol namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Symbol {
    Lexer(LexerSymbol),
    Parser(ParserSymbol),
}

impl From<LexerSymbol> for Symbol {
    fn from(symbol: LexerSymbol) -> Self {
        Self::Lexer(symbol)
    }
}

impl From<ParserSymbol> for Symbol {
    fn from(symbol: ParserSymbol) -> Self {
        Self::Parser(symbol)
    }
}

/// A key/value annotation attached to a symbol's production.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Annotation {
    pub key: CompactString,
    pub value: Option<CompactString>,
}

impl Annotation {
    /// Annotation key marking a lexical symbol as skipped trivia.
    pub const SKIP: &'static str = "skip";

    #[must_use]
    pub fn new(key: &str, value: Option<&str>) -> Self {
        Self {
            key: CompactString::from(key),
            value: value.map(CompactString::from),
        }
    }
}

#[derive(Debug, Clone)]
struct LexerSymbolData {
    name: CompactString,
    skip: bool,
    annotations: Vec<Annotation>,
}

#[derive(Debug, Clone)]
struct ParserSymbolData {
    name: CompactString,
    annotations: Vec<Annotation>,
}

/// Arena of all symbols declared by a grammar.
///
/// Created with the end-of-input sentinel and the auxiliary wrapper symbols
/// already present.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    lexer: Vec<LexerSymbolData>,
    parser: Vec<ParserSymbolData>,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        let lexer = vec![LexerSymbolData {
            name: CompactString::const_new("EOF"),
            skip: false,
            annotations: Vec::new(),
        }];
        let parser = ["?", "*", "+", "ITEM"]
            .into_iter()
            .map(|name| ParserSymbolData {
                name: CompactString::const_new(name),
                annotations: Vec::new(),
            })
            .collect();
        Self { lexer, parser }
    }

    pub(crate) fn add_lexer_symbol(&mut self, name: &str, skip: bool) -> LexerSymbol {
        let id = u32::try_from(self.lexer.len()).unwrap_or(u32::MAX);
        self.lexer.push(LexerSymbolData {
            name: CompactString::from(name),
            skip,
            annotations: Vec::new(),
        });
        LexerSymbol(id)
    }

    pub(crate) fn add_parser_symbol(&mut self, name: &str) -> ParserSymbol {
        let id = u32::try_from(self.parser.len()).unwrap_or(u32::MAX);
        self.parser.push(ParserSymbolData {
            name: CompactString::from(name),
            annotations: Vec::new(),
        });
        ParserSymbol(id)
    }

    pub(crate) fn add_annotation(&mut self, symbol: Symbol, annotation: Annotation) {
        match symbol {
            Symbol::Lexer(s) => self.lexer[s.index()].annotations.push(annotation),
            Symbol::Parser(s) => self.parser[s.index()].annotations.push(annotation),
        }
    }

    #[must_use]
    pub fn lexer_name(&self, symbol: LexerSymbol) -> &str {
        &self.lexer[symbol.index()].name
    }

    #[must_use]
    pub fn parser_name(&self, symbol: ParserSymbol) -> &str {
        &self.parser[symbol.index()].name
    }

    #[must_use]
    pub fn name(&self, symbol: Symbol) -> &str {
        match symbol {
            Symbol::Lexer(s) => self.lexer_name(s),
            Symbol::Parser(s) => self.parser_name(s),
        }
    }

    /// Whether a lexical symbol is skipped trivia.
    #[must_use]
    pub fn is_skip(&self, symbol: LexerSymbol) -> bool {
        self.lexer[symbol.index()].skip
    }

    #[must_use]
    pub fn annotations(&self, symbol: Symbol) -> &[Annotation] {
        match symbol {
            Symbol::Lexer(s) => &self.lexer[s.index()].annotations,
            Symbol::Parser(s) => &self.parser[s.index()].annotations,
        }
    }

    #[must_use]
    pub fn lexer_symbol_count(&self) -> usize {
        self.lexer.len()
    }

    #[must_use]
    pub fn parser_symbol_count(&self) -> usize {
        self.parser.len()
    }

    /// All lexical symbols, the end-of-input sentinel first.
    pub fn lexer_symbols(&self) -> impl Iterator<Item = LexerSymbol> + '_ {
        (0..self.lexer.len()).map(|i| LexerSymbol(u32::try_from(i).unwrap_or(u32::MAX)))
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_symbols() {
        let table = SymbolTable::new();
        assert_eq!(table.lexer_name(LexerSymbol::EOF), "EOF");
        assert_eq!(table.parser_name(ParserSymbol::OPTIONAL), "?");
        assert_eq!(table.parser_name(ParserSymbol::STAR), "*");
        assert_eq!(table.parser_name(ParserSymbol::PLUS), "+");
        assert_eq!(table.parser_name(ParserSymbol::LIST_ITEM), "ITEM");
        assert!(ParserSymbol::LIST_ITEM.is_auxiliary());
        assert!(!ParserSymbol::LIST_ITEM.is_quantifier());
        assert!(ParserSymbol::STAR.is_quantifier());
    }

    #[test]
    fn user_symbols_get_fresh_handles() {
        let mut table = SymbolTable::new();
        let num = table.add_lexer_symbol("NUM", false);
        let space = table.add_lexer_symbol("SPACE", true);
        let sum = table.add_parser_symbol("sum");

        assert_ne!(num, space);
        assert_ne!(num, LexerSymbol::EOF);
        assert!(!table.is_skip(num));
        assert!(table.is_skip(space));
        assert_eq!(table.lexer_name(num), "NUM");
        assert_eq!(table.parser_name(sum), "sum");
        assert!(!sum.is_auxiliary());
    }

    #[test]
    fn annotations_attach_to_symbols() {
        let mut table = SymbolTable::new();
        let num = table.add_lexer_symbol("NUM", false);
        table.add_annotation(num.into(), Annotation::new("value", Some("int")));

        let annotations = table.annotations(num.into());
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].key, "value");
        assert_eq!(annotations[0].value.as_deref(), Some("int"));
    }
}
