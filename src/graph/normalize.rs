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

//! Graph-wide attribute normalization.
//!
//! Exchange formats with flat attribute models (GraphML in particular) cannot
//! carry sequences, mappings or opaque values. Normalization rewrites every
//! attribute to its primitive form via [`AttrValue::normalized`]: composites
//! become canonical JSON text, opaque values become `<TypeTag>:<identifier>`
//! strings. Keys are never dropped, only values are coerced, and running the
//! pass twice is the identity.
//!
//! [`normalize`] produces a rewritten copy and leaves the source untouched;
//! [`normalize_into`] rewrites in place and is what the export fallback path
//! uses once it already owns a scratch copy.

use crate::graph::attrs::AttrValue;
use crate::graph::digraph::AttrGraph;

/// Returns a copy of `graph` with every node and edge attribute normalized.
///
/// The source graph is not mutated.
#[must_use]
pub fn normalize(graph: &AttrGraph) -> AttrGraph {
    let mut copy = graph.clone();
    normalize_into(&mut copy);
    copy
}

/// Normalizes every node and edge attribute of `graph` in place.
pub fn normalize_into(graph: &mut AttrGraph) {
    for attrs in graph.node_attr_maps_mut() {
        attrs.map_values_in_place(AttrValue::normalized);
    }
    for attrs in graph.edge_attr_maps_mut() {
        attrs.map_values_in_place(AttrValue::normalized);
    }
}
