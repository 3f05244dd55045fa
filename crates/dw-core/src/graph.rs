//! Resolved graph model produced by the graph builder.
//!
//! Everything here is plain data. Nodes and links appear in the order they
//! were first referenced in the source; only the path-highlighting flags are
//! ever changed after a [`Graph`] has been built.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub directed: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strict: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subgraphs: Vec<SubgraphRecord>,
}

impl Graph {
    #[must_use]
    pub fn new(directed: bool, strict: bool, graph_id: Option<String>) -> Self {
        Self {
            directed,
            strict,
            graph_id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    #[must_use]
    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Finds the first link joining `source` to `target`.
    ///
    /// Undirected graphs also accept the reverse orientation.
    #[must_use]
    pub fn link(&self, source: &str, target: &str) -> Option<&Link> {
        self.links
            .iter()
            .find(|link| link.joins(source, target, self.directed))
    }

    #[must_use]
    pub fn subgraph(&self, id: &str) -> Option<&SubgraphRecord> {
        self.subgraphs.iter().find(|subgraph| subgraph.id == id)
    }

    /// Clears every on-path and path-invalid flag.
    pub fn clear_highlight(&mut self) {
        for node in &mut self.nodes {
            node.on_path = false;
            node.path_invalid = false;
        }
        for link in &mut self.links {
            link.on_path = false;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub label: String,
    /// Border color.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub color: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub fill_color: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub shape: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub style: String,
    /// Id of the first named subgraph the node was seen in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub on_path: bool,
    /// Last node reached before a highlight path left the graph.
    #[serde(default, skip_serializing_if = "is_false")]
    pub path_invalid: bool,
}

impl Node {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            ..Self::default()
        }
    }

    /// Writes one attribute, overwriting whatever the field held.
    pub fn set_attr(&mut self, key: &str, value: &str) {
        match key {
            "label" => self.label = value.to_string(),
            "color" => self.color = value.to_string(),
            "fillcolor" => self.fill_color = value.to_string(),
            "shape" => self.shape = value.to_string(),
            "style" => self.style = value.to_string(),
            _ => {
                self.attributes.insert(key.to_string(), value.to_string());
            }
        }
    }

    /// Whether the field `key` maps to still holds its unset value.
    #[must_use]
    pub fn is_attr_unset(&self, key: &str) -> bool {
        match key {
            "label" => self.label == self.id,
            "color" => self.color.is_empty(),
            "fillcolor" => self.fill_color.is_empty(),
            "shape" => self.shape.is_empty(),
            "style" => self.style.is_empty(),
            _ => self.attributes.get(key).is_none_or(String::is_empty),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub color: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub style: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub on_path: bool,
}

impl Link {
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            ..Self::default()
        }
    }

    pub fn set_attr(&mut self, key: &str, value: &str) {
        match key {
            "label" => self.label = value.to_string(),
            "color" => self.color = value.to_string(),
            "style" => self.style = value.to_string(),
            _ => {
                self.attributes.insert(key.to_string(), value.to_string());
            }
        }
    }

    /// Whether this link connects `source` to `target`, in either
    /// orientation when `directed` is false.
    #[must_use]
    pub fn joins(&self, source: &str, target: &str, directed: bool) -> bool {
        (self.source == source && self.target == target)
            || (!directed && self.source == target && self.target == source)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubgraphRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub color: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub style: String,
    pub nodes: Vec<String>,
}

/// Outcome of checking a highlight path against a built [`Graph`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PathValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_edge: Option<InvalidEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_valid_node: Option<String>,
}

impl PathValidationResult {
    #[must_use]
    pub fn success() -> Self {
        Self {
            valid: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct InvalidEdge {
    pub source: String,
    pub target: String,
    pub invalid_node: String,
}
