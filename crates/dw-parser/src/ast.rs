//! Syntax tree for DOT source.
//!
//! Every node records the position of its first token. The tree is pure
//! data; the only behavior is position lookup and attribute lookup.

use dw_core::Position;
use serde::Serialize;

pub trait HasPosition {
    fn position(&self) -> &Position;
}

macro_rules! impl_has_position {
    ($($ty:ty),* $(,)?) => {
        $(
            impl HasPosition for $ty {
                fn position(&self) -> &Position {
                    &self.position
                }
            }
        )*
    };
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Graph {
    pub position: Position,
    pub strict: bool,
    pub directed: bool,
    pub id: Option<Ident>,
    pub statements: Vec<Statement>,
}

impl Graph {
    #[must_use]
    pub fn empty(position: Position) -> Self {
        Self {
            position,
            strict: false,
            directed: false,
            id: None,
            statements: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub enum IdentKind {
    #[default]
    Bare,
    Quoted,
    Html,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Ident {
    pub position: Position,
    pub name: String,
    pub kind: IdentKind,
}

impl Ident {
    #[must_use]
    pub fn new(position: Position, name: impl Into<String>, kind: IdentKind) -> Self {
        Self {
            position,
            name: name.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub enum Statement {
    Node(NodeStatement),
    Edge(EdgeStatement),
    Attr(AttrStatement),
    Assign(AttrAssign),
    Subgraph(Subgraph),
}

impl HasPosition for Statement {
    fn position(&self) -> &Position {
        match self {
            Self::Node(stmt) => stmt.position(),
            Self::Edge(stmt) => stmt.position(),
            Self::Attr(stmt) => stmt.position(),
            Self::Assign(stmt) => stmt.position(),
            Self::Subgraph(stmt) => stmt.position(),
        }
    }
}

/// `ID [':' port [':' compass]]`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NodeId {
    pub position: Position,
    pub id: Ident,
    pub port: Option<Port>,
}

impl NodeId {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.id.name
    }
}

/// Carried through parsing only; compass points are not validated.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Port {
    pub position: Position,
    pub id: Option<Ident>,
    pub compass: Option<Ident>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NodeStatement {
    pub position: Position,
    pub node: NodeId,
    pub attrs: Option<AttrList>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EdgeStatement {
    pub position: Position,
    pub left: EdgeEndpoint,
    pub rights: Vec<EdgeRight>,
    /// Applies to every edge the chain produces.
    pub attrs: Option<AttrList>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EdgeRight {
    pub position: Position,
    /// `->` rather than `--`.
    pub directed: bool,
    pub endpoint: EdgeEndpoint,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub enum EdgeEndpoint {
    Node(NodeId),
    Group(NodeGroup),
    Subgraph(Subgraph),
}

impl HasPosition for EdgeEndpoint {
    fn position(&self) -> &Position {
        match self {
            Self::Node(node) => node.position(),
            Self::Group(group) => group.position(),
            Self::Subgraph(subgraph) => subgraph.position(),
        }
    }
}

/// `{A B C}` used as an edge endpoint. Not a scope.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NodeGroup {
    pub position: Position,
    pub nodes: Vec<NodeId>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum AttrKind {
    Graph,
    Node,
    Edge,
}

impl AttrKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Graph => "graph",
            Self::Node => "node",
            Self::Edge => "edge",
        }
    }
}

/// `graph|node|edge [attr_list]`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AttrStatement {
    pub position: Position,
    pub kind: AttrKind,
    pub attrs: Option<AttrList>,
}

/// `ID = ID` at statement level.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AttrAssign {
    pub position: Position,
    pub key: Ident,
    pub value: Ident,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AttrList {
    pub position: Position,
    pub attrs: Vec<Attr>,
}

impl AttrList {
    /// Value of the first attribute named `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|attr| attr.key.name == key)
            .map(|attr| attr.value.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs
            .iter()
            .map(|attr| (attr.key.name.as_str(), attr.value.name.as_str()))
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Attr {
    pub position: Position,
    pub key: Ident,
    pub value: Ident,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Subgraph {
    pub position: Position,
    pub id: Option<Ident>,
    pub statements: Vec<Statement>,
}

impl Subgraph {
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.id.as_ref().map(|id| id.name.as_str())
    }
}

impl_has_position!(
    Graph,
    Ident,
    NodeId,
    Port,
    NodeStatement,
    EdgeStatement,
    EdgeRight,
    NodeGroup,
    AttrStatement,
    AttrAssign,
    AttrList,
    Attr,
    Subgraph,
);
