// Graph Store Interface - key-addressed nodes with string-keyed properties and typed edges
// Entities are mapped onto this shape by the entity layer; the store never sees
// the structure of complex attributes, only their canonical strings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::{EdgeType, NodeLabel};
use crate::error::{AppError, AppResult};

/// A single property value. An absent key is the null value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    TextList(Vec<String>),
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        PropertyValue::Int(v as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Text(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(v: Vec<String>) -> Self {
        PropertyValue::TextList(v)
    }
}

/// A node as persisted by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub label: NodeLabel,
    pub properties: BTreeMap<String, PropertyValue>,
}

impl Node {
    pub fn new(id: impl Into<String>, label: NodeLabel) -> Self {
        Self {
            id: id.into(),
            label,
            properties: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, key: &str, value: impl Into<PropertyValue>) {
        self.properties.insert(key.to_string(), value.into());
    }

    /// Set or clear a nullable property.
    pub fn set_opt<V: Into<PropertyValue>>(&mut self, key: &str, value: Option<V>) {
        match value {
            Some(v) => self.set(key, v),
            None => {
                self.properties.remove(key);
            }
        }
    }

    fn mismatch(&self, key: &str, expected: &str) -> AppError {
        AppError::MalformedEncoding(format!(
            "property '{}' on {} {} is not {}",
            key, self.label, self.id, expected
        ))
    }

    fn missing(&self, key: &str) -> AppError {
        AppError::MalformedEncoding(format!(
            "required property '{}' missing on {} {}",
            key, self.label, self.id
        ))
    }

    pub fn text(&self, key: &str) -> AppResult<Option<&str>> {
        match self.properties.get(key) {
            None => Ok(None),
            Some(PropertyValue::Text(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(self.mismatch(key, "text")),
        }
    }

    pub fn require_text(&self, key: &str) -> AppResult<&str> {
        self.text(key)?.ok_or_else(|| self.missing(key))
    }

    pub fn int(&self, key: &str) -> AppResult<Option<i64>> {
        match self.properties.get(key) {
            None => Ok(None),
            Some(PropertyValue::Int(v)) => Ok(Some(*v)),
            Some(_) => Err(self.mismatch(key, "an integer")),
        }
    }

    /// An integer that must fit in 32 bits.
    pub fn int32(&self, key: &str) -> AppResult<Option<i32>> {
        self.int(key)?
            .map(|v| i32::try_from(v).map_err(|_| self.mismatch(key, "a 32-bit integer")))
            .transpose()
    }

    pub fn float(&self, key: &str) -> AppResult<Option<f64>> {
        match self.properties.get(key) {
            None => Ok(None),
            Some(PropertyValue::Float(v)) => Ok(Some(*v)),
            Some(PropertyValue::Int(v)) => Ok(Some(*v as f64)),
            Some(_) => Err(self.mismatch(key, "a number")),
        }
    }

    pub fn require_float(&self, key: &str) -> AppResult<f64> {
        self.float(key)?.ok_or_else(|| self.missing(key))
    }

    pub fn bool(&self, key: &str) -> AppResult<Option<bool>> {
        match self.properties.get(key) {
            None => Ok(None),
            Some(PropertyValue::Bool(v)) => Ok(Some(*v)),
            Some(_) => Err(self.mismatch(key, "a boolean")),
        }
    }

    /// A missing list reads as empty.
    pub fn text_list(&self, key: &str) -> AppResult<Vec<String>> {
        match self.properties.get(key) {
            None => Ok(Vec::new()),
            Some(PropertyValue::TextList(v)) => Ok(v.clone()),
            Some(_) => Err(self.mismatch(key, "a list of text")),
        }
    }
}

/// Which end of an edge a node sits on when listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Edges whose source is the node
    Outgoing,
    /// Edges whose target is the node
    Incoming,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: String,
    pub edge_type: EdgeType,
    pub to: String,
    pub created: DateTime<Utc>,
}

impl Edge {
    pub fn new(from: impl Into<String>, edge_type: EdgeType, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            edge_type,
            to: to.into(),
            created: Utc::now(),
        }
    }

    /// The node at the opposite end from `direction`'s anchor.
    pub fn other_end(&self, direction: Direction) -> &str {
        match direction {
            Direction::Outgoing => &self.to,
            Direction::Incoming => &self.from,
        }
    }
}

/// Node/edge store the directory is written against.
///
/// Read-modify-write sequences are not atomic across calls; callers rely on
/// the backing store's own concurrency control.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Insert a new node; `Conflict` if the id is taken.
    async fn create_node(&self, node: &Node) -> AppResult<()>;
    /// Replace the properties of an existing node; `NotFound` otherwise.
    async fn update_node(&self, node: &Node) -> AppResult<()>;
    async fn get_node(&self, label: NodeLabel, id: &str) -> AppResult<Option<Node>>;
    async fn list_nodes(&self, label: NodeLabel, limit: u32) -> AppResult<Vec<Node>>;
    async fn find_nodes_by_text(
        &self,
        label: NodeLabel,
        key: &str,
        value: &str,
    ) -> AppResult<Vec<Node>>;
    /// Remove a node and every edge touching it. Returns whether it existed.
    async fn delete_node(&self, id: &str) -> AppResult<bool>;
    /// Replace a node's properties and swap all of its outgoing edges of
    /// `edge.edge_type` for `edge`, in one step. Nothing changes on failure.
    async fn update_node_relinked(&self, node: &Node, edge: &Edge) -> AppResult<()>;

    /// Returns false when the edge already existed.
    async fn add_edge(&self, edge: &Edge) -> AppResult<bool>;
    async fn remove_edge(&self, from: &str, edge_type: EdgeType, to: &str) -> AppResult<bool>;
    async fn remove_edges_from(&self, from: &str, edge_type: EdgeType) -> AppResult<u64>;
    async fn list_edges(
        &self,
        id: &str,
        edge_type: EdgeType,
        direction: Direction,
    ) -> AppResult<Vec<Edge>>;
}
