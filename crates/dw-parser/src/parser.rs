use dw_core::{DotError, Position};

use crate::ast::{
    self, AttrAssign, AttrKind, AttrList, AttrStatement, EdgeEndpoint, EdgeRight, EdgeStatement,
    HasPosition, Ident, IdentKind, NodeGroup, NodeId, NodeStatement, Port, Statement, Subgraph,
};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

/// Deepest run of nested `{ ... }` blocks the parser descends into. Deeper
/// bodies are skipped with a diagnostic.
pub const MAX_NESTING: usize = 100;

/// Recursive-descent parser over a [`Lexer`].
///
/// Each mismatch records an error and the parser moves on by at least one
/// token, so malformed input always yields a best-effort tree.
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    pos: Position,
    tok: Token,
    errors: Vec<DotError>,
    depth: usize,
}

impl<'src> Parser<'src> {
    #[must_use]
    pub fn new(lexer: Lexer<'src>) -> Self {
        let mut parser = Self {
            lexer,
            pos: Position::default(),
            tok: Token::punct(TokenKind::Eof),
            errors: Vec::new(),
            depth: 0,
        };
        parser.next();
        parser
    }

    /// Parses one graph. Lexer errors come first in the returned list,
    /// followed by parser errors, each group in source order.
    #[must_use]
    pub fn parse(mut self) -> (ast::Graph, Vec<DotError>) {
        let graph = self.parse_graph();
        let mut errors = self.lexer.take_errors();
        errors.append(&mut self.errors);
        (graph, errors)
    }

    fn next(&mut self) {
        let (pos, tok) = self.lexer.next_token();
        self.pos = pos;
        self.tok = tok;
    }

    fn kind(&self) -> TokenKind {
        self.tok.kind
    }

    fn error(&mut self, pos: Position, message: impl Into<String>) {
        self.errors.push(DotError::parse(pos, message));
    }

    /// Consumes the current token whether or not it matches.
    fn expect(&mut self, kind: TokenKind) -> Position {
        let pos = self.pos.clone();
        if self.kind() != kind {
            let message = format!("expected {kind}, got {}", self.kind());
            self.error(pos.clone(), message);
        }
        self.next();
        pos
    }

    // graph := ['strict'] ('graph' | 'digraph') [ID] '{' stmt_list '}'
    fn parse_graph(&mut self) -> ast::Graph {
        let mut graph = ast::Graph::empty(self.pos.clone());

        if self.kind() == TokenKind::Strict {
            graph.strict = true;
            self.next();
        }

        match self.kind() {
            TokenKind::Graph => graph.directed = false,
            TokenKind::Digraph => graph.directed = true,
            other => {
                let message = format!("expected 'graph' or 'digraph', got {other}");
                self.error(self.pos.clone(), message);
                return graph;
            }
        }
        self.next();

        if self.kind().is_id() {
            graph.id = Some(self.parse_ident());
        }

        self.expect(TokenKind::LBrace);
        graph.statements = self.parse_stmt_list();
        self.expect(TokenKind::RBrace);

        graph
    }

    // stmt_list := { stmt [';'] }
    fn parse_stmt_list(&mut self) -> Vec<Statement> {
        let mut statements = Vec::new();
        while !matches!(self.kind(), TokenKind::RBrace | TokenKind::Eof) {
            if let Some(statement) = self.parse_stmt() {
                statements.push(statement);
            }
            if self.kind() == TokenKind::Semicolon {
                self.next();
            }
        }
        statements
    }

    fn parse_stmt(&mut self) -> Option<Statement> {
        match self.kind() {
            TokenKind::Graph => Some(Statement::Attr(self.parse_attr_stmt(AttrKind::Graph))),
            TokenKind::Node => Some(Statement::Attr(self.parse_attr_stmt(AttrKind::Node))),
            TokenKind::Edge => Some(Statement::Attr(self.parse_attr_stmt(AttrKind::Edge))),
            TokenKind::Subgraph | TokenKind::LBrace => {
                let subgraph = self.parse_subgraph();
                if self.kind().is_edge_op() {
                    let edge = self.parse_edge_stmt(EdgeEndpoint::Subgraph(subgraph));
                    Some(Statement::Edge(edge))
                } else {
                    Some(Statement::Subgraph(subgraph))
                }
            }
            kind if kind.is_id() => self.parse_id_stmt(),
            other => {
                let message = format!("unexpected token {other} in statement");
                self.error(self.pos.clone(), message);
                self.next();
                None
            }
        }
    }

    /// Statements that open with an ID: `ID = ID`, a node statement, or an
    /// edge statement.
    fn parse_id_stmt(&mut self) -> Option<Statement> {
        let id = self.parse_ident();
        let position = id.position.clone();

        if self.kind() == TokenKind::Equal {
            self.next();
            if !self.kind().is_id() {
                self.error(self.pos.clone(), "expected identifier after '='");
                return None;
            }
            let value = self.parse_ident();
            return Some(Statement::Assign(AttrAssign {
                position,
                key: id,
                value,
            }));
        }

        let port = (self.kind() == TokenKind::Colon).then(|| self.parse_port());
        let node = NodeId {
            position: position.clone(),
            id,
            port,
        };

        if self.kind().is_edge_op() {
            return Some(Statement::Edge(self.parse_edge_stmt(EdgeEndpoint::Node(node))));
        }

        let attrs = (self.kind() == TokenKind::LBracket).then(|| self.parse_attr_list());
        Some(Statement::Node(NodeStatement {
            position,
            node,
            attrs,
        }))
    }

    // attr_stmt := ('graph' | 'node' | 'edge') [attr_list]
    fn parse_attr_stmt(&mut self, kind: AttrKind) -> AttrStatement {
        let position = self.pos.clone();
        self.next();
        let attrs = (self.kind() == TokenKind::LBracket).then(|| self.parse_attr_list());
        AttrStatement {
            position,
            kind,
            attrs,
        }
    }

    fn parse_edge_stmt(&mut self, left: EdgeEndpoint) -> EdgeStatement {
        let position = left.position().clone();
        let mut rights = Vec::new();

        while self.kind().is_edge_op() {
            let directed = self.kind() == TokenKind::Arrow;
            self.next();

            let endpoint = match self.kind() {
                TokenKind::Subgraph | TokenKind::LBrace => self.parse_subgraph_or_group(),
                kind if kind.is_id() => EdgeEndpoint::Node(self.parse_node_id()),
                _ => {
                    self.error(
                        self.pos.clone(),
                        "expected node ID or subgraph after edge operator",
                    );
                    break;
                }
            };

            rights.push(EdgeRight {
                position: endpoint.position().clone(),
                directed,
                endpoint,
            });
        }

        let attrs = (self.kind() == TokenKind::LBracket).then(|| self.parse_attr_list());
        EdgeStatement {
            position,
            left,
            rights,
            attrs,
        }
    }

    /// After an edge operator, `{ ... }` is either the `{A B C}` shorthand or
    /// an anonymous subgraph. A flat run of node IDs closed by `}` is a
    /// group; anything else turns the IDs read so far into node statements
    /// and continues as a subgraph body.
    fn parse_subgraph_or_group(&mut self) -> EdgeEndpoint {
        if self.kind() == TokenKind::Subgraph {
            return EdgeEndpoint::Subgraph(self.parse_subgraph());
        }

        let position = self.expect(TokenKind::LBrace);

        let mut nodes = Vec::new();
        while self.kind().is_id() {
            nodes.push(self.parse_node_id());
        }

        if self.kind() == TokenKind::RBrace && !nodes.is_empty() {
            self.next();
            return EdgeEndpoint::Group(NodeGroup { position, nodes });
        }

        let mut statements: Vec<Statement> = nodes
            .into_iter()
            .map(|node| {
                Statement::Node(NodeStatement {
                    position: node.position.clone(),
                    node,
                    attrs: None,
                })
            })
            .collect();
        if !self.enter_block(&position) {
            return EdgeEndpoint::Subgraph(Subgraph {
                position,
                id: None,
                statements,
            });
        }
        if !statements.is_empty() && self.kind() == TokenKind::Semicolon {
            self.next();
        }
        statements.extend(self.parse_stmt_list());
        self.depth -= 1;
        self.expect(TokenKind::RBrace);

        EdgeEndpoint::Subgraph(Subgraph {
            position,
            id: None,
            statements,
        })
    }

    // subgraph := ['subgraph' [ID]] '{' stmt_list '}'
    fn parse_subgraph(&mut self) -> Subgraph {
        let position = self.pos.clone();
        let mut id = None;

        if self.kind() == TokenKind::Subgraph {
            self.next();
            if self.kind().is_id() {
                id = Some(self.parse_ident());
            }
        }

        let open = self.expect(TokenKind::LBrace);
        if !self.enter_block(&open) {
            return Subgraph {
                position,
                id,
                statements: Vec::new(),
            };
        }
        let statements = self.parse_stmt_list();
        self.depth -= 1;
        self.expect(TokenKind::RBrace);

        Subgraph {
            position,
            id,
            statements,
        }
    }

    /// Called right after a block's `{`. Returns false when the block is too
    /// deep; its body has then been skipped through the matching `}`.
    fn enter_block(&mut self, open: &Position) -> bool {
        if self.depth < MAX_NESTING {
            self.depth += 1;
            return true;
        }

        self.error(open.clone(), "nesting too deep");
        let mut open_braces = 1usize;
        loop {
            match self.kind() {
                TokenKind::Eof => return false,
                TokenKind::LBrace => open_braces += 1,
                TokenKind::RBrace => {
                    open_braces -= 1;
                    if open_braces == 0 {
                        self.next();
                        return false;
                    }
                }
                _ => {}
            }
            self.next();
        }
    }

    fn parse_node_id(&mut self) -> NodeId {
        let position = self.pos.clone();
        let id = self.parse_ident();
        let port = (self.kind() == TokenKind::Colon).then(|| self.parse_port());
        NodeId { position, id, port }
    }

    // port := ':' [ID] [':' [ID]]
    fn parse_port(&mut self) -> Port {
        let position = self.expect(TokenKind::Colon);
        let id = self.kind().is_id().then(|| self.parse_ident());

        let mut compass = None;
        if self.kind() == TokenKind::Colon {
            self.next();
            if self.kind().is_id() {
                compass = Some(self.parse_ident());
            }
        }

        Port {
            position,
            id,
            compass,
        }
    }

    // attr_list := '[' { ID ['=' ID] [';' | ','] } ']' { attr_list }
    fn parse_attr_list(&mut self) -> AttrList {
        let mut list = AttrList {
            position: self.pos.clone(),
            attrs: Vec::new(),
        };

        while self.kind() == TokenKind::LBracket {
            self.next();

            while self.kind().is_id() {
                let position = self.pos.clone();
                let key = self.parse_ident();

                let value = if self.kind() == TokenKind::Equal {
                    self.next();
                    if self.kind().is_id() {
                        self.parse_ident()
                    } else {
                        self.error(self.pos.clone(), "expected value after '='");
                        Ident::new(self.pos.clone(), "", IdentKind::Bare)
                    }
                } else {
                    Ident::new(key.position.clone(), "true", IdentKind::Bare)
                };

                list.attrs.push(ast::Attr {
                    position,
                    key,
                    value,
                });

                if matches!(self.kind(), TokenKind::Semicolon | TokenKind::Comma) {
                    self.next();
                }
            }

            self.expect(TokenKind::RBracket);
        }

        list
    }

    fn parse_ident(&mut self) -> Ident {
        let kind = match self.kind() {
            TokenKind::Ident => IdentKind::Bare,
            TokenKind::Quoted => IdentKind::Quoted,
            TokenKind::Html => IdentKind::Html,
            other => {
                let message = format!("expected identifier, got {other}");
                self.error(self.pos.clone(), message);
                let ident = Ident::new(self.pos.clone(), "", IdentKind::Bare);
                self.next();
                return ident;
            }
        };
        let ident = Ident::new(self.pos.clone(), std::mem::take(&mut self.tok.text), kind);
        self.next();
        ident
    }
}
