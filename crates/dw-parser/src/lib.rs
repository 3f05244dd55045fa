#![forbid(unsafe_code)]

pub mod ast;
mod builder;
mod highlight;
mod lexer;
mod parser;
mod token;

use dw_core::{DotError, Graph, ParseFailure, PathValidationResult};
use serde::Serialize;
use serde_json::json;

pub use builder::{GraphBuilder, convert};
pub use highlight::apply_highlight;
pub use lexer::{Lexer, tokenize};
pub use parser::{MAX_NESTING, Parser};
pub use token::{Token, TokenKind};

/// Syntax tree plus every diagnostic produced while reading it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseResult {
    pub ast: ast::Graph,
    /// Lexer diagnostics first, then parser diagnostics.
    pub errors: Vec<DotError>,
}

impl ParseResult {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// The tree if no diagnostics were recorded, otherwise all of them.
    pub fn into_result(self) -> Result<ast::Graph, ParseFailure> {
        if self.errors.is_empty() {
            Ok(self.ast)
        } else {
            Err(ParseFailure {
                errors: self.errors,
            })
        }
    }
}

/// Reads DOT source into a syntax tree. Never fails: malformed input yields
/// a best-effort tree alongside its diagnostics.
#[must_use]
pub fn parse(filename: &str, src: &[u8]) -> ParseResult {
    let (ast, errors) = Parser::new(Lexer::new(filename, src)).parse();
    ParseResult { ast, errors }
}

/// Parses and builds the graph, refusing input with any diagnostic.
pub fn parse_and_convert(filename: &str, src: &[u8]) -> Result<Graph, ParseFailure> {
    let ast = parse(filename, src).into_result()?;
    Ok(convert(&ast))
}

/// Parses `path_src` and marks it onto `graph`. Syntax errors in the path
/// are returned as a [`ParseFailure`]; unknown nodes are reported through
/// the [`PathValidationResult`].
pub fn highlight_path(
    graph: &mut Graph,
    filename: &str,
    path_src: &[u8],
) -> Result<PathValidationResult, ParseFailure> {
    let path = parse(filename, path_src).into_result()?;
    Ok(apply_highlight(graph, &path))
}

#[must_use]
pub fn summary_json(graph: &Graph) -> String {
    json!({
        "graph_id": graph.graph_id,
        "directed": graph.directed,
        "strict": graph.strict,
        "node_count": graph.nodes.len(),
        "link_count": graph.links.len(),
        "subgraph_count": graph.subgraphs.len(),
        "on_path_nodes": graph.nodes.iter().filter(|node| node.on_path).count(),
        "on_path_links": graph.links.iter().filter(|link| link.on_path).count(),
    })
    .to_string()
}
