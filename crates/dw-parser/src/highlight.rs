//! Marks a path, given as a second DOT document, onto a built graph.

use dw_core::{Graph, InvalidEdge, PathValidationResult};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::ast::{self, EdgeEndpoint, Statement};

/// Walks the edge statements of `path` in order and flags the nodes and
/// links they cover. Stops at the first step that names a node the graph
/// does not have; flags set before that point are kept.
///
/// Nothing is created: ids are looked up, never inserted. A step between
/// two known nodes without a matching link still marks both nodes.
pub fn apply_highlight(graph: &mut Graph, path: &ast::Graph) -> PathValidationResult {
    let index: FxHashMap<String, usize> = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(position, node)| (node.id.clone(), position))
        .collect();
    let links = LinkIndex::new(graph);

    for statement in &path.statements {
        let Statement::Edge(edge) = statement else {
            continue;
        };

        let mut left = endpoint_ids(&edge.left);
        for right in &edge.rights {
            let right_ids = endpoint_ids(&right.endpoint);

            for source in &left {
                for target in &right_ids {
                    let step = match (index.get(source), index.get(target)) {
                        (Some(&s), Some(&t)) => {
                            graph.nodes[s].on_path = true;
                            graph.nodes[t].on_path = true;
                            if let Some(link) = links.find(source, target) {
                                graph.links[link].on_path = true;
                            }
                            trace!(source = %source, target = %target, "path step");
                            continue;
                        }
                        (Some(&s), None) => {
                            graph.nodes[s].path_invalid = true;
                            (target, Some(source))
                        }
                        (None, Some(&t)) => {
                            graph.nodes[t].path_invalid = true;
                            (source, Some(target))
                        }
                        (None, None) => (source, None),
                    };

                    let (invalid_node, last_valid) = step;
                    let result = failure(source, target, invalid_node, last_valid);
                    debug!(
                        error = result.error.as_deref().unwrap_or_default(),
                        "path validation failed"
                    );
                    return result;
                }
            }

            left = right_ids;
        }
    }

    PathValidationResult::success()
}

/// Position of the first link created for each (source, target) pair.
struct LinkIndex {
    first: FxHashMap<(String, String), usize>,
    directed: bool,
}

impl LinkIndex {
    fn new(graph: &Graph) -> Self {
        let mut first = FxHashMap::default();
        for (position, link) in graph.links.iter().enumerate() {
            first
                .entry((link.source.clone(), link.target.clone()))
                .or_insert(position);
        }
        Self {
            first,
            directed: graph.directed,
        }
    }

    /// Undirected graphs match either orientation; the earlier link wins.
    fn find(&self, source: &str, target: &str) -> Option<usize> {
        let forward = self.get(source, target);
        if self.directed {
            return forward;
        }
        forward.into_iter().chain(self.get(target, source)).min()
    }

    fn get(&self, source: &str, target: &str) -> Option<usize> {
        self.first
            .get(&(source.to_string(), target.to_string()))
            .copied()
    }
}

/// The message spells every step with `->`, whatever the graph kind.
fn failure(
    source: &str,
    target: &str,
    invalid_node: &str,
    last_valid: Option<&String>,
) -> PathValidationResult {
    PathValidationResult {
        valid: false,
        error: Some(format!(
            "edge '{source} -> {target}' references unknown node '{invalid_node}'"
        )),
        invalid_edge: Some(InvalidEdge {
            source: source.to_string(),
            target: target.to_string(),
            invalid_node: invalid_node.to_string(),
        }),
        last_valid_node: last_valid.cloned(),
    }
}

/// The node ids an endpoint stands for, without touching any graph.
fn endpoint_ids(endpoint: &EdgeEndpoint) -> Vec<String> {
    let mut ids = PathIds::default();
    ids.add_endpoint(endpoint);
    ids.order
}

/// Ids in first-seen order, without repeats.
#[derive(Default)]
struct PathIds {
    order: Vec<String>,
    seen: FxHashSet<String>,
}

impl PathIds {
    fn add(&mut self, id: &str) {
        if self.seen.insert(id.to_string()) {
            self.order.push(id.to_string());
        }
    }

    fn add_endpoint(&mut self, endpoint: &EdgeEndpoint) {
        match endpoint {
            EdgeEndpoint::Node(node) => self.add(node.name()),
            EdgeEndpoint::Group(group) => {
                for node in &group.nodes {
                    self.add(node.name());
                }
            }
            EdgeEndpoint::Subgraph(subgraph) => self.add_statements(&subgraph.statements),
        }
    }

    fn add_statements(&mut self, statements: &[Statement]) {
        for statement in statements {
            match statement {
                Statement::Node(stmt) => self.add(stmt.node.name()),
                Statement::Edge(edge) => {
                    self.add_endpoint(&edge.left);
                    for right in &edge.rights {
                        self.add_endpoint(&right.endpoint);
                    }
                }
                Statement::Subgraph(subgraph) => self.add_statements(&subgraph.statements),
                Statement::Attr(_) | Statement::Assign(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use dw_core::{Graph, PathValidationResult};

    use super::apply_highlight;
    use crate::ast;
    use crate::builder::convert;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn parse(src: &str) -> ast::Graph {
        let (ast, errors) = Parser::new(Lexer::with_source("", src)).parse();
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        ast
    }

    fn highlight(graph_src: &str, path_src: &str) -> (Graph, PathValidationResult) {
        let mut graph = convert(&parse(graph_src));
        let result = apply_highlight(&mut graph, &parse(path_src));
        (graph, result)
    }

    fn flagged(graph: &Graph) -> (Vec<&str>, Vec<&str>) {
        let on_path = graph
            .nodes
            .iter()
            .filter(|node| node.on_path)
            .map(|node| node.id.as_str())
            .collect();
        let invalid = graph
            .nodes
            .iter()
            .filter(|node| node.path_invalid)
            .map(|node| node.id.as_str())
            .collect();
        (on_path, invalid)
    }

    #[test]
    fn valid_path_marks_nodes_and_links() {
        let (graph, result) = highlight(
            "digraph { A -> B -> C; A -> D }",
            "digraph { A -> B -> C }",
        );
        assert_eq!(result, PathValidationResult::success());

        let (on_path, invalid) = flagged(&graph);
        assert_eq!(on_path, vec!["A", "B", "C"]);
        assert!(invalid.is_empty());

        let marked: Vec<bool> = graph.links.iter().map(|link| link.on_path).collect();
        assert_eq!(marked, vec![true, true, false]);
    }

    #[test]
    fn unknown_target_stops_validation() {
        let (graph, result) = highlight("digraph { A -> B }", "digraph { A -> X; A -> B }");
        assert!(!result.valid);
        assert_eq!(
            result.error.as_deref(),
            Some("edge 'A -> X' references unknown node 'X'")
        );
        let invalid_edge = result.invalid_edge.expect("invalid edge");
        assert_eq!(invalid_edge.source, "A");
        assert_eq!(invalid_edge.target, "X");
        assert_eq!(invalid_edge.invalid_node, "X");
        assert_eq!(result.last_valid_node.as_deref(), Some("A"));

        let (on_path, invalid) = flagged(&graph);
        assert!(on_path.is_empty());
        assert_eq!(invalid, vec!["A"]);
        assert!(graph.links.iter().all(|link| !link.on_path));
    }

    #[test]
    fn unknown_source_reports_known_target_as_last_valid() {
        let (graph, result) = highlight("digraph { A -> B }", "digraph { X -> B }");
        assert_eq!(
            result.invalid_edge.as_ref().map(|edge| edge.invalid_node.as_str()),
            Some("X")
        );
        assert_eq!(result.last_valid_node.as_deref(), Some("B"));
        assert_eq!(flagged(&graph).1, vec!["B"]);
    }

    #[test]
    fn both_unknown_has_no_last_valid_node() {
        let (graph, result) = highlight("digraph { A -> B }", "digraph { X -> Y }");
        assert_eq!(
            result.error.as_deref(),
            Some("edge 'X -> Y' references unknown node 'X'")
        );
        assert!(result.last_valid_node.is_none());
        let (on_path, invalid) = flagged(&graph);
        assert!(on_path.is_empty() && invalid.is_empty());
    }

    #[test]
    fn flags_before_the_failure_are_kept() {
        let (graph, result) = highlight("digraph { A -> B -> C }", "digraph { A -> B -> Z }");
        assert!(!result.valid);
        let (on_path, invalid) = flagged(&graph);
        assert_eq!(on_path, vec!["A", "B"]);
        assert_eq!(invalid, vec!["B"]);
        assert!(graph.links[0].on_path);
    }

    #[test]
    fn missing_link_between_known_nodes_is_not_an_error() {
        let (graph, result) = highlight("digraph { A -> B; C }", "digraph { A -> C }");
        assert!(result.valid);
        assert_eq!(flagged(&graph).0, vec!["A", "C"]);
        assert!(graph.links.iter().all(|link| !link.on_path));
    }

    #[test]
    fn directed_lookup_ignores_reverse_links() {
        let (graph, result) = highlight("digraph { A -> B }", "digraph { B -> A }");
        assert!(result.valid);
        assert!(!graph.links[0].on_path);
    }

    #[test]
    fn undirected_lookup_matches_either_orientation() {
        let (graph, result) = highlight("graph { A -- B }", "graph { B -- A }");
        assert!(result.valid);
        assert!(graph.links[0].on_path);
    }

    #[test]
    fn undirected_step_reports_with_arrow() {
        let (_, result) = highlight("graph { A -- B }", "graph { A -- Q }");
        assert_eq!(
            result.error.as_deref(),
            Some("edge 'A -> Q' references unknown node 'Q'")
        );
    }

    #[test]
    fn duplicate_links_mark_only_the_first() {
        let (graph, result) = highlight("digraph { A -> B; A -> B }", "digraph { A -> B }");
        assert!(result.valid);
        let marked: Vec<bool> = graph.links.iter().map(|link| link.on_path).collect();
        assert_eq!(marked, vec![true, false]);
    }

    #[test]
    fn undirected_lookup_prefers_the_earlier_orientation() {
        let (graph, result) = highlight("graph { B -- A; A -- B }", "graph { A -- B }");
        assert!(result.valid);
        let marked: Vec<bool> = graph.links.iter().map(|link| link.on_path).collect();
        assert_eq!(marked, vec![true, false]);
    }

    #[test]
    fn wide_subgraph_endpoint_marks_every_link() {
        let targets: Vec<String> = (0..5_000).map(|i| format!("n{i}")).collect();
        let group = targets.join(" ");
        let (graph, result) = highlight(
            &format!("digraph {{ hub -> {{ {group} }} }}"),
            &format!("digraph {{ hub -> subgraph {{ {group}; {group} }} }}"),
        );
        assert!(result.valid);
        assert_eq!(graph.links.len(), 5_000);
        assert!(graph.links.iter().all(|link| link.on_path));
        assert_eq!(graph.nodes.iter().filter(|node| node.on_path).count(), 5_001);
    }

    #[test]
    fn node_statements_in_path_are_ignored() {
        let (graph, result) = highlight("digraph { A -> B }", "digraph { Z; A -> B }");
        assert!(result.valid);
        assert!(graph.node("Z").is_none());
        assert_eq!(graph.nodes.len(), 2);
    }

    #[test]
    fn group_endpoints_expand_in_path() {
        let (graph, result) = highlight("digraph { A -> {B C} }", "digraph { A -> {B C} }");
        assert!(result.valid);
        assert!(graph.links.iter().all(|link| link.on_path));
    }

    #[test]
    fn subgraph_endpoint_in_path_does_not_create_nodes() {
        let (graph, result) = highlight(
            "digraph { A -> B; A -> C }",
            "digraph { A -> subgraph s { B; subgraph t { C } } }",
        );
        assert!(result.valid);
        assert_eq!(flagged(&graph).0, vec!["A", "B", "C"]);
        assert!(graph.subgraphs.is_empty());
    }
}
