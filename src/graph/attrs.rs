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

//! Attribute values for graph nodes and edges.
//!
//! Every attribute attached to a node or edge of an [`AttrGraph`](crate::graph::AttrGraph)
//! is an [`AttrValue`]. The variant set is closed: primitives (string, integer,
//! boolean), ordered sequences, key-sorted mappings, and an opaque escape hatch
//! for values that carry only a type tag and a best-effort identifier. Exchange
//! formats that cannot represent composites rely on [`AttrValue::normalized`],
//! which is total and never fails.
//!
//! # Examples
//!
//! ```rust
//! use dexscope::graph::AttrValue;
//!
//! let attrs = AttrValue::Seq(vec![
//!     AttrValue::from("const/4 v0, 1"),
//!     AttrValue::from("return v0"),
//! ]);
//!
//! // Composites normalize to their canonical JSON text.
//! let flat = attrs.normalized();
//! assert_eq!(flat, AttrValue::from(r#"["const/4 v0, 1","return v0"]"#));
//!
//! // Normalization is idempotent.
//! assert_eq!(flat.normalized(), flat);
//! ```

use std::collections::BTreeMap;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

/// A single node or edge attribute value.
///
/// The variant set is closed by design: anything a caller cannot express as a
/// primitive, sequence or mapping goes through [`AttrValue::Opaque`], which
/// keeps a type tag and an optional identifier instead of the value itself.
/// Mappings are key-sorted ([`BTreeMap`]) so their JSON encoding is canonical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// UTF-8 text.
    Str(String),
    /// Signed integer.
    Int(i64),
    /// Boolean flag.
    Bool(bool),
    /// Ordered sequence of attribute values.
    Seq(Vec<AttrValue>),
    /// String-keyed mapping with canonical (sorted) key order.
    Map(BTreeMap<String, AttrValue>),
    /// A value that cannot be represented structurally.
    ///
    /// Only a type tag and a best-effort identifier survive. Rendering an
    /// opaque value with no identifier produces an error-marker string rather
    /// than failing.
    Opaque {
        /// Short name of the original value's type.
        type_tag: String,
        /// Best-effort identifier for the value, if one could be produced.
        identifier: Option<String>,
    },
}

impl AttrValue {
    /// Returns `true` for the variants that exchange formats can carry
    /// directly (string, integer, boolean).
    #[must_use]
    pub const fn is_primitive(&self) -> bool {
        matches!(
            self,
            AttrValue::Str(_) | AttrValue::Int(_) | AttrValue::Bool(_)
        )
    }

    /// Returns the GraphML `attr.type` name for primitive values, or `None`
    /// for composites and opaque values, which need normalization first.
    #[must_use]
    pub const fn graphml_type(&self) -> Option<&'static str> {
        match self {
            AttrValue::Str(_) => Some("string"),
            AttrValue::Int(_) => Some("long"),
            AttrValue::Bool(_) => Some("boolean"),
            _ => None,
        }
    }

    /// Renders the value as plain text.
    ///
    /// Primitives render naturally, composites render as canonical JSON and
    /// opaque values render as `<TypeTag>:<identifier>`. This is the text that
    /// lands in DOT attributes and GraphML `data` elements.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            AttrValue::Str(value) => value.clone(),
            AttrValue::Int(value) => value.to_string(),
            AttrValue::Bool(value) => value.to_string(),
            AttrValue::Seq(_) | AttrValue::Map(_) => self.canonical_json(),
            AttrValue::Opaque {
                type_tag,
                identifier,
            } => render_opaque(type_tag, identifier.as_deref()),
        }
    }

    /// Encodes the value as canonical JSON text.
    ///
    /// Mappings serialize with sorted keys, so re-parsing the text yields a
    /// structurally equal value. This function is total: the closed variant
    /// set cannot produce a serialization failure, and if one ever surfaced
    /// it would be folded into an error-marker string instead of an `Err`.
    #[must_use]
    pub fn canonical_json(&self) -> String {
        match serde_json::to_string(self) {
            Ok(text) => text,
            Err(err) => render_opaque("Json", Some(&err.to_string())),
        }
    }

    /// Returns the normalized form of this value.
    ///
    /// Primitives pass through unchanged, composites become their canonical
    /// JSON text and opaque values become their `<TypeTag>:<identifier>`
    /// rendering. The result is always primitive, and normalizing a
    /// normalized value is the identity.
    #[must_use]
    pub fn normalized(&self) -> AttrValue {
        match self {
            AttrValue::Str(_) | AttrValue::Int(_) | AttrValue::Bool(_) => self.clone(),
            AttrValue::Seq(_) | AttrValue::Map(_) => AttrValue::Str(self.canonical_json()),
            AttrValue::Opaque {
                type_tag,
                identifier,
            } => AttrValue::Str(render_opaque(type_tag, identifier.as_deref())),
        }
    }

    /// Converts a JSON value into the closed attribute variant.
    ///
    /// Nulls and non-integral numbers have no structural counterpart and map
    /// to [`AttrValue::Opaque`] so the conversion stays total.
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> AttrValue {
        match value {
            serde_json::Value::String(text) => AttrValue::Str(text),
            serde_json::Value::Bool(flag) => AttrValue::Bool(flag),
            serde_json::Value::Number(number) => match number.as_i64() {
                Some(int) => AttrValue::Int(int),
                None => AttrValue::Opaque {
                    type_tag: "Number".to_string(),
                    identifier: Some(number.to_string()),
                },
            },
            serde_json::Value::Array(items) => {
                AttrValue::Seq(items.into_iter().map(AttrValue::from_json).collect())
            }
            serde_json::Value::Object(entries) => AttrValue::Map(
                entries
                    .into_iter()
                    .map(|(key, item)| (key, AttrValue::from_json(item)))
                    .collect(),
            ),
            serde_json::Value::Null => AttrValue::Opaque {
                type_tag: "Null".to_string(),
                identifier: Some("null".to_string()),
            },
        }
    }
}

/// Renders the opaque form `<TypeTag>:<identifier>`.
///
/// A missing identifier yields an error-marker string naming the reason, so
/// rendering never fails.
fn render_opaque(type_tag: &str, identifier: Option<&str>) -> String {
    match identifier {
        Some(id) => format!("<{type_tag}>:{id}"),
        None => format!("<{type_tag}>:<no identifier available>"),
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<u32> for AttrValue {
    fn from(value: u32) -> Self {
        AttrValue::Int(i64::from(value))
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<Vec<AttrValue>> for AttrValue {
    fn from(value: Vec<AttrValue>) -> Self {
        AttrValue::Seq(value)
    }
}

impl Serialize for AttrValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttrValue::Str(value) => serializer.serialize_str(value),
            AttrValue::Int(value) => serializer.serialize_i64(*value),
            AttrValue::Bool(value) => serializer.serialize_bool(*value),
            AttrValue::Seq(items) => serializer.collect_seq(items),
            AttrValue::Map(entries) => serializer.collect_map(entries),
            AttrValue::Opaque { .. } => serializer.serialize_str(&self.to_text()),
        }
    }
}

impl<'de> Deserialize<'de> for AttrValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(AttrValue::from_json(value))
    }
}
