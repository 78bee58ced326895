// Symbols, parametric tokens, and the axiom that holds them.
//
// A classic L-system rewrites bare characters; a parametric one rewrites
// `Token`s (`{symbol, params}`). Both are carried by the `Symbol` enum so a
// single engine can drive either. The `Axiom` remembers which representation
// it was created with (`AxiomKind`) and every generation keeps that kind,
// which is what lets `to_symbol_string()` reject a stray bare character in a
// token axiom instead of silently rendering it.
//
// Serialization mirrors the JSON shape used by system descriptions: a bare
// character is a one-character string, a token is an object whose `params`
// field may be omitted when empty.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LSystemError, Result};

/// A parametric symbol, e.g. `A(1, 2)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<f64>,
}

impl Token {
    pub fn new(symbol: impl Into<String>, params: Vec<f64>) -> Self {
        Self {
            symbol: symbol.into(),
            params,
        }
    }

    /// A token without parameters.
    pub fn bare(symbol: impl Into<String>) -> Self {
        Self::new(symbol, Vec::new())
    }
}

/// Classic notation: `A(1,2.5)`, or just `A` without parameters.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)?;
        if !self.params.is_empty() {
            f.write_str("(")?;
            for (i, p) in self.params.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{p}")?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// One element of an axiom.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Symbol {
    Char(char),
    Token(Token),
}

impl Symbol {
    /// The grammar symbol used for production lookup and context matching.
    pub fn name(&self) -> Cow<'_, str> {
        match self {
            Symbol::Char(c) => Cow::Owned(c.to_string()),
            Symbol::Token(t) => Cow::Borrowed(&t.symbol),
        }
    }

    /// Whether this symbol's name equals `key`, without allocating.
    pub fn is(&self, key: &str) -> bool {
        match self {
            Symbol::Char(c) => {
                let mut buf = [0u8; 4];
                c.encode_utf8(&mut buf) == key
            }
            Symbol::Token(t) => t.symbol == key,
        }
    }

    /// Parameters of a token; bare characters have none.
    pub fn params(&self) -> &[f64] {
        match self {
            Symbol::Char(_) => &[],
            Symbol::Token(t) => &t.params,
        }
    }

    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Symbol::Token(t) => Some(t),
            Symbol::Char(_) => None,
        }
    }

    /// Promote a bare character to a parameterless token.
    pub fn into_token(self) -> Token {
        match self {
            Symbol::Char(c) => Token::bare(c.to_string()),
            Symbol::Token(t) => t,
        }
    }
}

impl From<char> for Symbol {
    fn from(c: char) -> Self {
        Symbol::Char(c)
    }
}

impl From<Token> for Symbol {
    fn from(t: Token) -> Self {
        Symbol::Token(t)
    }
}

/// Split a string into bare-character symbols.
pub fn chars(s: &str) -> Vec<Symbol> {
    s.chars().map(Symbol::Char).collect()
}

/// Split a string into parameterless tokens, one per character.
pub fn bare_tokens(s: &str) -> Vec<Symbol> {
    s.chars()
        .map(|c| Symbol::Token(Token::bare(c.to_string())))
        .collect()
}

/// Which representation an axiom was created with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxiomKind {
    /// Bare characters (classic L-systems).
    Plain,
    /// Structured tokens (parametric L-systems).
    Tokens,
}

/// The sequence being rewritten.
///
/// Never edited in place by the engine: every generation builds a fresh
/// `Axiom` of the same kind and swaps it in.
#[derive(Clone, Debug, PartialEq)]
pub struct Axiom {
    kind: AxiomKind,
    symbols: Vec<Symbol>,
}

impl Axiom {
    /// A character axiom, e.g. `Axiom::plain("F-F-F")`.
    pub fn plain(s: &str) -> Self {
        Self {
            kind: AxiomKind::Plain,
            symbols: chars(s),
        }
    }

    pub fn tokens(tokens: Vec<Token>) -> Self {
        Self {
            kind: AxiomKind::Tokens,
            symbols: tokens.into_iter().map(Symbol::Token).collect(),
        }
    }

    /// A token axiom with one parameterless token per character.
    pub fn bare_tokens(s: &str) -> Self {
        Self {
            kind: AxiomKind::Tokens,
            symbols: bare_tokens(s),
        }
    }

    pub fn from_symbols(kind: AxiomKind, symbols: Vec<Symbol>) -> Self {
        Self { kind, symbols }
    }

    pub fn kind(&self) -> AxiomKind {
        self.kind
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Symbol> {
        self.symbols.get(index)
    }

    /// Concatenated symbol names.
    ///
    /// Fails with `MissingSymbol` when a token axiom contains a bare
    /// character, which happens when a production returns characters into
    /// a parametric system.
    pub fn to_symbol_string(&self) -> Result<String> {
        let mut out = String::with_capacity(self.symbols.len());
        for (index, symbol) in self.symbols.iter().enumerate() {
            match (self.kind, symbol) {
                (AxiomKind::Tokens, Symbol::Char(_)) => {
                    return Err(LSystemError::MissingSymbol { index });
                }
                (_, Symbol::Char(c)) => out.push(*c),
                (_, Symbol::Token(t)) => out.push_str(&t.symbol),
            }
        }
        Ok(out)
    }

    /// The full sequence, parameters included, as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.symbols)?)
    }
}
