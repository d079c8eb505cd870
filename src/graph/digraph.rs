// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

//! String-keyed directed multigraph with per-node and per-edge attributes.
//!
//! [`AttrGraph`] is the in-memory representation every exchange format is
//! written from. Nodes are keyed by caller-chosen string identifiers, carry an
//! insertion-ordered attribute map, and are created on demand when an edge
//! references them. Edges are directed and parallel edges between the same
//! ordered pair are permitted as long as their attributes differ; inserting an
//! exact duplicate collapses into the existing edge. The API is append-only,
//! there is no node or edge removal.
//!
//! # Examples
//!
//! ```rust
//! use dexscope::graph::{AttrGraph, AttrMap, AttrValue};
//!
//! let mut graph = AttrGraph::new();
//!
//! let mut attrs = AttrMap::new();
//! attrs.insert("start", AttrValue::from(0_i64));
//! graph.add_node_with_attrs("entry", attrs);
//!
//! // Endpoints spring into existence when an edge names them.
//! let mut edge = AttrMap::new();
//! edge.insert("branch_type", AttrValue::from("fallthrough"));
//! assert!(graph.add_edge("entry", "exit", edge));
//!
//! assert_eq!(graph.node_count(), 2);
//! assert_eq!(graph.edge_count(), 1);
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::graph::attrs::AttrValue;

/// A strongly-typed identifier for nodes within an [`AttrGraph`].
///
/// Node IDs are assigned sequentially starting from 0 and stay valid for the
/// lifetime of the graph; the append-only API never invalidates them.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Returns the raw index value of this node identifier.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A strongly-typed identifier for edges within an [`AttrGraph`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(pub(crate) usize);

impl EdgeId {
    /// Returns the raw index value of this edge identifier.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Insertion-ordered attribute map.
///
/// Exchange writers emit attributes in the order they were inserted, so the
/// map is backed by a vector rather than a hash table. Attribute counts per
/// node are small (a handful of keys), linear lookup is fine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrMap {
    entries: Vec<(String, AttrValue)>,
}

impl AttrMap {
    /// Creates an empty attribute map.
    #[must_use]
    pub const fn new() -> Self {
        AttrMap {
            entries: Vec::new(),
        }
    }

    /// Sets `key` to `value`.
    ///
    /// An existing key keeps its position and gets the new value; a new key is
    /// appended. Keys are never removed.
    pub fn insert(&mut self, key: impl Into<String>, value: AttrValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(name, _)| *name == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Returns the value stored under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    /// Returns the number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map holds no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value))
    }

    /// Replaces every value with the result of `f`, keeping keys and order.
    pub(crate) fn map_values_in_place(&mut self, mut f: impl FnMut(&AttrValue) -> AttrValue) {
        for (_, value) in &mut self.entries {
            *value = f(value);
        }
    }
}

impl<K: Into<String>> FromIterator<(K, AttrValue)> for AttrMap {
    fn from_iter<I: IntoIterator<Item = (K, AttrValue)>>(iter: I) -> Self {
        let mut map = AttrMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// A directed edge with its attribute map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    source: NodeId,
    target: NodeId,
    attrs: AttrMap,
}

impl Edge {
    /// Returns the source node.
    #[must_use]
    pub const fn source(&self) -> NodeId {
        self.source
    }

    /// Returns the target node.
    #[must_use]
    pub const fn target(&self) -> NodeId {
        self.target
    }

    /// Returns the edge attributes.
    #[must_use]
    pub const fn attrs(&self) -> &AttrMap {
        &self.attrs
    }
}

/// String-keyed directed multigraph with attributes on nodes and edges.
///
/// See the module-level documentation for semantics and an example.
#[derive(Debug, Clone, Default)]
pub struct AttrGraph {
    /// Node index to key, in insertion order.
    keys: Vec<String>,
    /// Node index to attribute map.
    node_attrs: Vec<AttrMap>,
    /// Reverse mapping from key to node index.
    key_to_node: HashMap<String, NodeId>,
    /// All edges, in insertion order.
    edges: Vec<Edge>,
    /// Outgoing edge lists per node.
    outgoing: Vec<Vec<EdgeId>>,
    /// Incoming edge lists per node.
    incoming: Vec<Vec<EdgeId>>,
}

impl AttrGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        AttrGraph::default()
    }

    /// Adds a node with the given key, or returns the existing node.
    ///
    /// A node created this way starts with an empty attribute map; existing
    /// attributes are left untouched.
    pub fn add_node(&mut self, key: impl Into<String>) -> NodeId {
        let key = key.into();
        if let Some(&node) = self.key_to_node.get(&key) {
            return node;
        }
        let node = NodeId(self.keys.len());
        self.key_to_node.insert(key.clone(), node);
        self.keys.push(key);
        self.node_attrs.push(AttrMap::new());
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        node
    }

    /// Adds a node with the given key and attributes.
    ///
    /// Insertion is idempotent on the key: if the node already exists its
    /// attribute map is replaced, not merged.
    pub fn add_node_with_attrs(&mut self, key: impl Into<String>, attrs: AttrMap) -> NodeId {
        let node = self.add_node(key);
        self.node_attrs[node.0] = attrs;
        node
    }

    /// Adds a directed edge between the nodes named by `source` and `target`.
    ///
    /// Endpoint nodes that do not exist yet are created with empty attribute
    /// maps, which mirrors how raw successor offsets that match no known block
    /// still produce a reachable endpoint. Parallel edges between the same
    /// ordered pair are kept as long as their attributes differ; an exact
    /// duplicate (same endpoints, equal attributes) collapses into the
    /// existing edge and returns `false`.
    pub fn add_edge(
        &mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        attrs: AttrMap,
    ) -> bool {
        let source = self.add_node(source);
        let target = self.add_node(target);

        let duplicate = self.outgoing[source.0].iter().any(|&edge_id| {
            let edge = &self.edges[edge_id.0];
            edge.target == target && edge.attrs == attrs
        });
        if duplicate {
            return false;
        }

        let edge_id = EdgeId(self.edges.len());
        self.edges.push(Edge {
            source,
            target,
            attrs,
        });
        self.outgoing[source.0].push(edge_id);
        self.incoming[target.0].push(edge_id);
        true
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.keys.len()
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns `true` if a node with the given key exists.
    #[must_use]
    pub fn contains_node(&self, key: &str) -> bool {
        self.key_to_node.contains_key(key)
    }

    /// Looks up the node with the given key.
    #[must_use]
    pub fn node_id(&self, key: &str) -> Option<NodeId> {
        self.key_to_node.get(key).copied()
    }

    /// Returns the key of a node.
    #[must_use]
    pub fn node_key(&self, node: NodeId) -> Option<&str> {
        self.keys.get(node.0).map(String::as_str)
    }

    /// Returns the attributes of a node.
    #[must_use]
    pub fn node_attrs(&self, node: NodeId) -> Option<&AttrMap> {
        self.node_attrs.get(node.0)
    }

    /// Iterates over all nodes as `(id, key, attrs)` in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &str, &AttrMap)> {
        self.keys
            .iter()
            .zip(&self.node_attrs)
            .enumerate()
            .map(|(index, (key, attrs))| (NodeId(index), key.as_str(), attrs))
    }

    /// Iterates over all edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Iterates over all edges as `(source_key, target_key, attrs)`.
    pub fn edges_with_keys(&self) -> impl Iterator<Item = (&str, &str, &AttrMap)> {
        self.edges.iter().map(|edge| {
            (
                self.keys[edge.source.0].as_str(),
                self.keys[edge.target.0].as_str(),
                &edge.attrs,
            )
        })
    }

    /// Returns the edge with the given identifier.
    #[must_use]
    pub fn edge(&self, edge: EdgeId) -> Option<&Edge> {
        self.edges.get(edge.0)
    }

    /// Iterates over the targets of a node's outgoing edges.
    ///
    /// Parallel edges yield their target once per edge.
    pub fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.outgoing
            .get(node.0)
            .into_iter()
            .flatten()
            .map(|&edge_id| self.edges[edge_id.0].target)
    }

    /// Iterates over the sources of a node's incoming edges.
    pub fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.incoming
            .get(node.0)
            .into_iter()
            .flatten()
            .map(|&edge_id| self.edges[edge_id.0].source)
    }

    /// Returns the number of outgoing edges of a node.
    #[must_use]
    pub fn out_degree(&self, node: NodeId) -> usize {
        self.outgoing.get(node.0).map_or(0, Vec::len)
    }

    /// Returns the number of incoming edges of a node.
    #[must_use]
    pub fn in_degree(&self, node: NodeId) -> usize {
        self.incoming.get(node.0).map_or(0, Vec::len)
    }

    /// Iterates over all node attribute maps mutably, in insertion order.
    pub(crate) fn node_attr_maps_mut(&mut self) -> impl Iterator<Item = &mut AttrMap> {
        self.node_attrs.iter_mut()
    }

    /// Iterates over all edge attribute maps mutably, in insertion order.
    pub(crate) fn edge_attr_maps_mut(&mut self) -> impl Iterator<Item = &mut AttrMap> {
        self.edges.iter_mut().map(|edge| &mut edge.attrs)
    }

    /// Merges another graph into this one.
    ///
    /// Node keys shared by both graphs keep this graph's attributes unless the
    /// incoming node carries a non-empty map, in which case the incoming map
    /// wins. Edges merge under the usual duplicate-collapse rule. Used by the
    /// parallel build path, where per-method partial graphs have disjoint node
    /// sets by construction except for raw-offset endpoints.
    pub fn absorb(&mut self, other: AttrGraph) {
        for (_, key, attrs) in other.nodes() {
            if attrs.is_empty() {
                self.add_node(key);
            } else {
                self.add_node_with_attrs(key, attrs.clone());
            }
        }
        for edge in other.edges() {
            let source = other.keys[edge.source.0].clone();
            let target = other.keys[edge.target.0].clone();
            self.add_edge(source, target, edge.attrs.clone());
        }
    }

    /// Serializes the graph to a JSON value with `nodes` and `edges` arrays.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let nodes: Vec<serde_json::Value> = self
            .nodes()
            .map(|(_, key, attrs)| {
                let mut object = serde_json::Map::new();
                object.insert("id".to_string(), serde_json::Value::String(key.to_string()));
                for (name, value) in attrs.iter() {
                    let json = serde_json::to_value(value)
                        .unwrap_or_else(|_| serde_json::Value::String(value.to_text()));
                    object.insert(name.to_string(), json);
                }
                serde_json::Value::Object(object)
            })
            .collect();

        let edges: Vec<serde_json::Value> = self
            .edges()
            .map(|edge| {
                let mut object = serde_json::Map::new();
                object.insert(
                    "source".to_string(),
                    serde_json::Value::String(self.keys[edge.source.0].clone()),
                );
                object.insert(
                    "target".to_string(),
                    serde_json::Value::String(self.keys[edge.target.0].clone()),
                );
                for (name, value) in edge.attrs.iter() {
                    let json = serde_json::to_value(value)
                        .unwrap_or_else(|_| serde_json::Value::String(value.to_text()));
                    object.insert(name.to_string(), json);
                }
                serde_json::Value::Object(object)
            })
            .collect();

        serde_json::json!({ "nodes": nodes, "edges": edges })
    }
}
