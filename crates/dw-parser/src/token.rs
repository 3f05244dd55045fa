use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Illegal,
    Eof,

    Ident,
    Quoted,
    Html,

    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Colon,
    Comma,
    Equal,
    Arrow,
    DashDash,

    Strict,
    Graph,
    Digraph,
    Subgraph,
    Node,
    Edge,
}

impl TokenKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Illegal => "ILLEGAL",
            Self::Eof => "EOF",
            Self::Ident => "IDENT",
            Self::Quoted => "STRING",
            Self::Html => "HTML",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Semicolon => ";",
            Self::Colon => ":",
            Self::Comma => ",",
            Self::Equal => "=",
            Self::Arrow => "->",
            Self::DashDash => "--",
            Self::Strict => "strict",
            Self::Graph => "graph",
            Self::Digraph => "digraph",
            Self::Subgraph => "subgraph",
            Self::Node => "node",
            Self::Edge => "edge",
        }
    }

    #[must_use]
    pub const fn is_keyword(self) -> bool {
        matches!(
            self,
            Self::Strict | Self::Graph | Self::Digraph | Self::Subgraph | Self::Node | Self::Edge
        )
    }

    /// Bare, quoted and HTML identifiers are interchangeable wherever the
    /// grammar asks for an ID.
    #[must_use]
    pub const fn is_id(self) -> bool {
        matches!(self, Self::Ident | Self::Quoted | Self::Html)
    }

    #[must_use]
    pub const fn is_edge_op(self) -> bool {
        matches!(self, Self::Arrow | Self::DashDash)
    }

    /// Keyword lookup, case-insensitive. Anything else is an identifier.
    #[must_use]
    pub fn lookup(word: &str) -> Self {
        const KEYWORDS: [(&str, TokenKind); 6] = [
            ("strict", TokenKind::Strict),
            ("graph", TokenKind::Graph),
            ("digraph", TokenKind::Digraph),
            ("subgraph", TokenKind::Subgraph),
            ("node", TokenKind::Node),
            ("edge", TokenKind::Edge),
        ];
        KEYWORDS
            .iter()
            .find(|(keyword, _)| keyword.eq_ignore_ascii_case(word))
            .map_or(Self::Ident, |(_, kind)| *kind)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scanned token. `text` holds the literal for identifiers, strings,
/// keywords (original case) and illegal characters; it is empty otherwise.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    #[must_use]
    pub const fn punct(kind: TokenKind) -> Self {
        Self {
            kind,
            text: String::new(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.text.is_empty() || self.kind.is_keyword() {
            f.write_str(self.kind.as_str())
        } else {
            write!(f, "{} {:?}", self.kind, self.text)
        }
    }
}
