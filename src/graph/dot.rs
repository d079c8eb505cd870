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

//! DOT format rendering for attribute graphs.
//!
//! Produces Graphviz-compatible `digraph` text: one statement per node with a
//! `key="value"` attribute list, one statement per edge. Attribute values are
//! rendered via [`AttrValue::to_text`](crate::graph::AttrValue::to_text), so
//! composites appear as their canonical JSON and nothing needs normalization
//! up front. Output order follows insertion order, which makes the text
//! deterministic for a given build.

use std::fmt::Write;

use crate::graph::digraph::{AttrGraph, AttrMap};

/// Escapes a string for safe use inside a quoted DOT value.
///
/// Handles the characters with special meaning in quoted DOT strings:
/// backslashes, double quotes and line breaks.
///
/// # Examples
///
/// ```rust
/// use dexscope::graph::escape_dot;
///
/// let escaped = escape_dot("say \"hello\"");
/// assert_eq!(escaped, "say \\\"hello\\\"");
/// ```
#[must_use]
pub fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "")
}

/// Renders the graph as DOT text.
#[must_use]
pub fn to_dot(graph: &AttrGraph) -> String {
    let mut dot = String::new();
    dot.push_str("digraph {\n");

    for (_, key, attrs) in graph.nodes() {
        let _ = write!(dot, "    \"{}\"", escape_dot(key));
        push_attr_list(&mut dot, attrs);
        dot.push_str(";\n");
    }

    if graph.edge_count() > 0 {
        dot.push('\n');
    }
    for (source, target, attrs) in graph.edges_with_keys() {
        let _ = write!(
            dot,
            "    \"{}\" -> \"{}\"",
            escape_dot(source),
            escape_dot(target)
        );
        push_attr_list(&mut dot, attrs);
        dot.push_str(";\n");
    }

    dot.push_str("}\n");
    dot
}

fn push_attr_list(dot: &mut String, attrs: &AttrMap) {
    if attrs.is_empty() {
        return;
    }
    dot.push_str(" [");
    for (index, (key, value)) in attrs.iter().enumerate() {
        if index > 0 {
            dot.push_str(", ");
        }
        let _ = write!(dot, "{}=\"{}\"", key, escape_dot(&value.to_text()));
    }
    dot.push(']');
}
