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

//! Attribute graph construction and exchange serialization.
//!
//! This module provides the graph representation that control-flow analysis
//! results are collected into, and the writers that turn it into exchange
//! files other tooling can load.
//!
//! # Architecture
//!
//! [`AttrGraph`] is a string-keyed directed multigraph whose nodes and edges
//! carry insertion-ordered [`AttrMap`]s of [`AttrValue`]s. The value domain is
//! a closed variant set, which keeps every downstream decision a `match`:
//! serializers never meet a value they cannot classify. Formats with flat
//! attribute models go through [`normalize`], which coerces composites into
//! canonical JSON text without touching keys.
//!
//! # Key Components
//!
//! - [`AttrGraph`] / [`AttrMap`] / [`AttrValue`] - the in-memory model
//! - [`normalize`] / [`normalize_into`] - copying and in-place coercion
//! - [`write_dot`] - direct DOT export
//! - [`write_graphml`] - two-step GraphML export with one normalize-and-retry
//! - [`read_graphml`] / [`parse_graphml`] - GraphML import for round-trips
//!
//! # Examples
//!
//! ```rust,no_run
//! use dexscope::graph::{AttrGraph, AttrMap, AttrValue, write_dot, write_graphml};
//!
//! let mut graph = AttrGraph::new();
//! let mut attrs = AttrMap::new();
//! attrs.insert("start", AttrValue::from(0_i64));
//! graph.add_node_with_attrs("entry", attrs);
//!
//! write_dot(&graph, "cfg.dot")?;
//! assert!(write_graphml(&graph, "cfg.graphml"));
//! # Ok::<(), dexscope::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! [`AttrGraph`] is `Send` and `Sync`; construction requires `&mut self`, so
//! parallel producers build per-method partial graphs and merge them with
//! [`AttrGraph::absorb`] rather than sharing one graph under a lock.

mod attrs;
mod digraph;
mod dot;
mod export;
mod graphml;
mod normalize;

pub use attrs::AttrValue;
pub use digraph::{AttrGraph, AttrMap, Edge, EdgeId, NodeId};
pub use dot::{escape_dot, to_dot};
pub use export::{try_write_graphml, write_dot, write_graphml, write_json, GraphmlOutcome};
pub(crate) use export::atomic_write;
pub use graphml::{first_unrepresentable, parse_graphml, write_graphml_to};
pub use normalize::{normalize, normalize_into};

use crate::Result;

/// Reads a GraphML file into an [`AttrGraph`].
pub fn read_graphml(path: impl AsRef<std::path::Path>) -> Result<AttrGraph> {
    let data = std::fs::read(path.as_ref())?;
    parse_graphml(&data)
}
