use std::collections::BTreeMap;

use dw_core::{Graph, Link, Node, SubgraphRecord};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::ast::{self, AttrKind, AttrList, EdgeEndpoint, EdgeStatement, Statement, Subgraph};

/// Walks a syntax tree once, in statement order, and accumulates the
/// resolved [`Graph`].
///
/// Default attributes live in one flat map per kind: a subgraph body starts
/// from whatever the enclosing scope had set, and anything it sets stays in
/// effect after the subgraph closes.
pub struct GraphBuilder {
    graph: Graph,
    node_index: FxHashMap<String, usize>,
    subgraph_index: FxHashMap<String, usize>,
    /// Member ids of each subgraph record, by record index.
    subgraph_members: Vec<FxHashSet<String>>,
    /// Only maintained for strict graphs.
    link_pairs: FxHashSet<(String, String)>,
    node_defaults: BTreeMap<String, String>,
    edge_defaults: BTreeMap<String, String>,
}

/// Node ids in first-seen order, without repeats.
#[derive(Default)]
struct TouchedIds {
    order: Vec<String>,
    seen: FxHashSet<String>,
}

impl TouchedIds {
    fn insert(&mut self, id: &str) {
        if self.seen.insert(id.to_string()) {
            self.order.push(id.to_string());
        }
    }

    fn extend<'a>(&mut self, ids: impl IntoIterator<Item = &'a String>) {
        for id in ids {
            self.insert(id);
        }
    }
}

/// Resolves a parsed graph into the graph model.
#[must_use]
pub fn convert(ast: &ast::Graph) -> Graph {
    let mut builder = GraphBuilder::new(
        ast.directed,
        ast.strict,
        ast.id.as_ref().map(|id| id.name.clone()),
    );
    builder.process_statements(&ast.statements, None);
    let graph = builder.finish();

    debug!(
        nodes = graph.nodes.len(),
        links = graph.links.len(),
        subgraphs = graph.subgraphs.len(),
        directed = graph.directed,
        strict = graph.strict,
        "converted graph"
    );

    graph
}

impl GraphBuilder {
    #[must_use]
    pub fn new(directed: bool, strict: bool, graph_id: Option<String>) -> Self {
        Self {
            graph: Graph::new(directed, strict, graph_id),
            node_index: FxHashMap::default(),
            subgraph_index: FxHashMap::default(),
            subgraph_members: Vec::new(),
            link_pairs: FxHashSet::default(),
            node_defaults: BTreeMap::new(),
            edge_defaults: BTreeMap::new(),
        }
    }

    /// Processes statements in order and returns every node id they touched.
    /// `group` is the id of the innermost named subgraph, if any.
    pub fn process_statements(
        &mut self,
        statements: &[Statement],
        group: Option<&str>,
    ) -> Vec<String> {
        let mut touched = TouchedIds::default();
        for statement in statements {
            self.process_statement(statement, group, &mut touched);
        }
        touched.order
    }

    #[must_use]
    pub fn finish(self) -> Graph {
        self.graph
    }

    fn process_statement(
        &mut self,
        statement: &Statement,
        group: Option<&str>,
        touched: &mut TouchedIds,
    ) {
        match statement {
            Statement::Node(stmt) => {
                let id = stmt.node.name();
                self.apply_node_statement(id, stmt.attrs.as_ref(), group);
                touched.insert(id);
            }
            Statement::Edge(stmt) => {
                let ids = self.process_edge_statement(stmt, group);
                touched.extend(&ids);
            }
            Statement::Attr(stmt) => self.apply_defaults(stmt.kind, stmt.attrs.as_ref()),
            // Top-level assignments are ignored; subgraph-level ones are read
            // when the subgraph record is registered.
            Statement::Assign(_) => {}
            Statement::Subgraph(subgraph) => {
                let ids = self.process_subgraph(subgraph, group);
                touched.extend(&ids);
            }
        }
    }

    fn apply_defaults(&mut self, kind: AttrKind, attrs: Option<&AttrList>) {
        let Some(attrs) = attrs else {
            return;
        };
        let defaults = match kind {
            AttrKind::Node => &mut self.node_defaults,
            AttrKind::Edge => &mut self.edge_defaults,
            AttrKind::Graph => return,
        };
        for (key, value) in attrs.iter() {
            defaults.insert(key.to_string(), value.to_string());
        }
    }

    fn node_slot(&mut self, id: &str) -> usize {
        if let Some(&index) = self.node_index.get(id) {
            return index;
        }
        let index = self.graph.nodes.len();
        self.graph.nodes.push(Node::new(id));
        self.node_index.insert(id.to_string(), index);
        index
    }

    /// Node statements overwrite: defaults first, then the explicit list.
    fn apply_node_statement(&mut self, id: &str, attrs: Option<&AttrList>, group: Option<&str>) {
        let index = self.node_slot(id);
        let node = &mut self.graph.nodes[index];

        for (key, value) in &self.node_defaults {
            node.set_attr(key, value);
        }
        if let Some(attrs) = attrs {
            for (key, value) in attrs.iter() {
                node.set_attr(key, value);
            }
        }
        assign_group(node, group);
    }

    /// Edge endpoints only fill gaps: a default lands on a field that still
    /// holds its unset value, so a later node statement can override it.
    fn ensure_node(&mut self, id: &str, group: Option<&str>) {
        let index = self.node_slot(id);
        let node = &mut self.graph.nodes[index];

        for (key, value) in &self.node_defaults {
            if node.is_attr_unset(key) {
                node.set_attr(key, value);
            }
        }
        assign_group(node, group);
    }

    /// Creates one link per (left, right) pair of every hop and returns the
    /// endpoint ids in the order they were resolved.
    fn process_edge_statement(
        &mut self,
        stmt: &EdgeStatement,
        group: Option<&str>,
    ) -> Vec<String> {
        let mut left = self.resolve_endpoint(&stmt.left, group);
        let mut touched = left.clone();

        for right in &stmt.rights {
            let right_ids = self.resolve_endpoint(&right.endpoint, group);
            touched.extend(right_ids.iter().cloned());

            for source in &left {
                for target in &right_ids {
                    self.add_link(source, target, stmt.attrs.as_ref());
                }
            }

            left = right_ids;
        }

        touched
    }

    fn resolve_endpoint(&mut self, endpoint: &EdgeEndpoint, group: Option<&str>) -> Vec<String> {
        match endpoint {
            EdgeEndpoint::Node(node) => {
                self.ensure_node(node.name(), group);
                vec![node.name().to_string()]
            }
            EdgeEndpoint::Group(node_group) => node_group
                .nodes
                .iter()
                .map(|node| {
                    self.ensure_node(node.name(), group);
                    node.name().to_string()
                })
                .collect(),
            EdgeEndpoint::Subgraph(subgraph) => self.process_subgraph(subgraph, group),
        }
    }

    fn add_link(&mut self, source: &str, target: &str, attrs: Option<&AttrList>) {
        let mut link = Link::new(source, target);
        for (key, value) in &self.edge_defaults {
            link.set_attr(key, value);
        }
        if let Some(attrs) = attrs {
            for (key, value) in attrs.iter() {
                link.set_attr(key, value);
            }
        }

        if self.graph.strict {
            let forward = (source.to_string(), target.to_string());
            let reverse = (target.to_string(), source.to_string());
            if self.link_pairs.contains(&forward)
                || (!self.graph.directed && self.link_pairs.contains(&reverse))
            {
                trace!(source, target, "strict graph: dropping duplicate link");
                return;
            }
            self.link_pairs.insert(forward);
        }

        self.graph.links.push(link);
    }

    /// Processes a subgraph body and returns the ids it touched. Named
    /// subgraphs become the group of the nodes first seen inside them and
    /// get a [`SubgraphRecord`]; anonymous ones keep the enclosing group.
    fn process_subgraph(&mut self, subgraph: &Subgraph, group: Option<&str>) -> Vec<String> {
        let inner_group = subgraph.name().or(group);
        let ids = self.process_statements(&subgraph.statements, inner_group);

        if let Some(name) = subgraph.name() {
            self.register_subgraph(name, subgraph, &ids);
        }

        ids
    }

    fn register_subgraph(&mut self, name: &str, subgraph: &Subgraph, ids: &[String]) {
        let index = match self.subgraph_index.get(name) {
            Some(&index) => index,
            None => {
                let index = self.graph.subgraphs.len();
                self.graph.subgraphs.push(SubgraphRecord {
                    id: name.to_string(),
                    ..SubgraphRecord::default()
                });
                self.subgraph_index.insert(name.to_string(), index);
                self.subgraph_members.push(FxHashSet::default());
                index
            }
        };
        let record = &mut self.graph.subgraphs[index];
        let members = &mut self.subgraph_members[index];

        for id in ids {
            if members.insert(id.clone()) {
                record.nodes.push(id.clone());
            }
        }

        for statement in &subgraph.statements {
            let Statement::Assign(assign) = statement else {
                continue;
            };
            let value = assign.value.name.clone();
            match assign.key.name.as_str() {
                "label" => record.label = value,
                "color" => record.color = value,
                "style" => record.style = value,
                _ => {}
            }
        }
    }
}

/// A node keeps the first group it was assigned.
fn assign_group(node: &mut Node, group: Option<&str>) {
    if node.group.is_none() {
        node.group = group.map(str::to_string);
    }
}
