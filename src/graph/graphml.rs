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

//! GraphML reading and writing.
//!
//! The writer emits networkx-compatible GraphML: a `<key>` declaration per
//! `(domain, attribute name, attribute type)` combination, a `<graph
//! edgedefault="directed">` element, `<node>` elements carrying `<data>`
//! children and `<edge>` elements referencing nodes by key. GraphML's
//! attribute model is flat, so only primitive values are representable;
//! [`first_unrepresentable`] reports the first offending attribute and the
//! pipeline behind [`write_graphml`](crate::graph::write_graphml) uses it to
//! decide whether a normalization pass is needed before writing.
//!
//! The reader rebuilds an [`AttrGraph`] from a GraphML document, parsing each
//! `data` value through its declared `attr.type`. It understands exactly what
//! the writer produces plus the common scalar types, which is sufficient for
//! round-trip verification and for importing previously exported graphs.

use std::collections::HashMap;
use std::io;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::graph::attrs::AttrValue;
use crate::graph::digraph::{AttrGraph, AttrMap};
use crate::{Error, Result};

const GRAPHML_NS: &str = "http://graphml.graphdrawing.org/xmlns";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const SCHEMA_LOCATION: &str =
    "http://graphml.graphdrawing.org/xmlns http://graphml.graphdrawing.org/xmlns/1.0/graphml.xsd";

/// Returns a description of the first attribute GraphML cannot carry, or
/// `None` when every value is primitive.
///
/// Scans nodes first, then edges, both in insertion order, so the result is
/// deterministic.
#[must_use]
pub fn first_unrepresentable(graph: &AttrGraph) -> Option<String> {
    for (_, key, attrs) in graph.nodes() {
        for (name, value) in attrs.iter() {
            if value.graphml_type().is_none() {
                return Some(format!("node `{key}` attribute `{name}`"));
            }
        }
    }
    for (source, target, attrs) in graph.edges_with_keys() {
        for (name, value) in attrs.iter() {
            if value.graphml_type().is_none() {
                return Some(format!("edge `{source}` -> `{target}` attribute `{name}`"));
            }
        }
    }
    None
}

/// One `<key>` declaration.
struct KeyDecl {
    id: String,
    domain: &'static str,
    name: String,
    attr_type: &'static str,
}

/// Table of `<key>` declarations in first-seen order.
///
/// GraphML types each attribute through its key declaration. An attribute
/// name used with two different primitive types gets one declaration per
/// type, the same scheme networkx uses for heterogeneous attributes.
struct KeyTable {
    decls: Vec<KeyDecl>,
    index: HashMap<(&'static str, String, &'static str), usize>,
}

impl KeyTable {
    fn collect(graph: &AttrGraph) -> Result<KeyTable> {
        let mut table = KeyTable {
            decls: Vec::new(),
            index: HashMap::new(),
        };
        for (_, key, attrs) in graph.nodes() {
            table.absorb_attrs("node", key, attrs)?;
        }
        for (source, _, attrs) in graph.edges_with_keys() {
            table.absorb_attrs("edge", source, attrs)?;
        }
        Ok(table)
    }

    fn absorb_attrs(&mut self, domain: &'static str, owner: &str, attrs: &AttrMap) -> Result<()> {
        for (name, value) in attrs.iter() {
            let Some(attr_type) = value.graphml_type() else {
                return Err(Error::GraphError(format!(
                    "{domain} `{owner}` attribute `{name}` needs normalization before GraphML export"
                )));
            };
            let lookup = (domain, name.to_string(), attr_type);
            if !self.index.contains_key(&lookup) {
                let id = format!("d{}", self.decls.len());
                self.index.insert(lookup, self.decls.len());
                self.decls.push(KeyDecl {
                    id,
                    domain,
                    name: name.to_string(),
                    attr_type,
                });
            }
        }
        Ok(())
    }

    fn id_for(&self, domain: &'static str, name: &str, value: &AttrValue) -> Result<&str> {
        let attr_type = value.graphml_type().ok_or_else(|| {
            Error::GraphError(format!("{domain} attribute `{name}` is not primitive"))
        })?;
        self.index
            .get(&(domain, name.to_string(), attr_type))
            .map(|&slot| self.decls[slot].id.as_str())
            .ok_or_else(|| {
                Error::GraphError(format!("{domain} attribute `{name}` has no key declaration"))
            })
    }
}

/// Writes `graph` as GraphML to `out`.
///
/// Fails with [`Error::GraphError`] if any attribute value is non-primitive;
/// callers that want the normalize-and-retry behavior go through
/// [`write_graphml`](crate::graph::write_graphml) instead.
pub fn write_graphml_to<W: io::Write>(graph: &AttrGraph, out: W) -> Result<()> {
    let keys = KeyTable::collect(graph)?;
    let mut writer = Writer::new_with_indent(out, b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("graphml");
    root.push_attribute(("xmlns", GRAPHML_NS));
    root.push_attribute(("xmlns:xsi", XSI_NS));
    root.push_attribute(("xsi:schemaLocation", SCHEMA_LOCATION));
    writer.write_event(Event::Start(root))?;

    for decl in &keys.decls {
        let mut key = BytesStart::new("key");
        key.push_attribute(("id", decl.id.as_str()));
        key.push_attribute(("for", decl.domain));
        key.push_attribute(("attr.name", decl.name.as_str()));
        key.push_attribute(("attr.type", decl.attr_type));
        writer.write_event(Event::Empty(key))?;
    }

    let mut graph_elem = BytesStart::new("graph");
    graph_elem.push_attribute(("edgedefault", "directed"));
    writer.write_event(Event::Start(graph_elem))?;

    for (_, key, attrs) in graph.nodes() {
        let mut node = BytesStart::new("node");
        node.push_attribute(("id", key));
        if attrs.is_empty() {
            writer.write_event(Event::Empty(node))?;
        } else {
            writer.write_event(Event::Start(node))?;
            write_data(&mut writer, &keys, "node", attrs)?;
            writer.write_event(Event::End(BytesEnd::new("node")))?;
        }
    }

    for (source, target, attrs) in graph.edges_with_keys() {
        let mut edge = BytesStart::new("edge");
        edge.push_attribute(("source", source));
        edge.push_attribute(("target", target));
        if attrs.is_empty() {
            writer.write_event(Event::Empty(edge))?;
        } else {
            writer.write_event(Event::Start(edge))?;
            write_data(&mut writer, &keys, "edge", attrs)?;
            writer.write_event(Event::End(BytesEnd::new("edge")))?;
        }
    }

    writer.write_event(Event::End(BytesEnd::new("graph")))?;
    writer.write_event(Event::End(BytesEnd::new("graphml")))?;
    Ok(())
}

fn write_data<W: io::Write>(
    writer: &mut Writer<W>,
    keys: &KeyTable,
    domain: &'static str,
    attrs: &AttrMap,
) -> Result<()> {
    for (name, value) in attrs.iter() {
        let mut data = BytesStart::new("data");
        data.push_attribute(("key", keys.id_for(domain, name, value)?));
        writer.write_event(Event::Start(data))?;
        writer.write_event(Event::Text(BytesText::new(&value.to_text())))?;
        writer.write_event(Event::End(BytesEnd::new("data")))?;
    }
    Ok(())
}

/// Parses a GraphML document into an [`AttrGraph`].
///
/// Data values are typed through their key declarations: `int`/`long` become
/// integers, `boolean` becomes a flag, everything else is kept as text.
/// Structural violations (a `node` without an `id`, `data` referencing an
/// undeclared key) are malformed input.
pub fn parse_graphml(data: &[u8]) -> Result<AttrGraph> {
    let mut reader = Reader::from_reader(data);
    let mut buf = Vec::new();

    let mut graph = AttrGraph::new();
    // Key id -> (attribute name, attribute type).
    let mut keys: HashMap<String, (String, String)> = HashMap::new();
    let mut node: Option<(String, AttrMap)> = None;
    let mut edge: Option<(String, String, AttrMap)> = None;
    let mut data_elem: Option<(String, String)> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(start) => match start.name().as_ref() {
                b"key" => read_key_decl(&start, &mut keys)?,
                b"node" => node = Some((required_attr(&start, b"id")?, AttrMap::new())),
                b"edge" => {
                    edge = Some((
                        required_attr(&start, b"source")?,
                        required_attr(&start, b"target")?,
                        AttrMap::new(),
                    ));
                }
                b"data" => data_elem = Some((required_attr(&start, b"key")?, String::new())),
                _ => {}
            },
            Event::Empty(start) => match start.name().as_ref() {
                b"key" => read_key_decl(&start, &mut keys)?,
                b"node" => {
                    graph.add_node(required_attr(&start, b"id")?);
                }
                b"edge" => {
                    graph.add_edge(
                        required_attr(&start, b"source")?,
                        required_attr(&start, b"target")?,
                        AttrMap::new(),
                    );
                }
                b"data" => {
                    let key_id = required_attr(&start, b"key")?;
                    store_data(&keys, &key_id, "", node.as_mut(), edge.as_mut())?;
                }
                _ => {}
            },
            Event::Text(text) => {
                if let Some((_, content)) = &mut data_elem {
                    content.push_str(&text.unescape().map_err(quick_xml::Error::from)?);
                }
            }
            Event::CData(cdata) => {
                if let Some((_, content)) = &mut data_elem {
                    content.push_str(&String::from_utf8_lossy(&cdata));
                }
            }
            Event::End(end) => match end.name().as_ref() {
                b"data" => {
                    let Some((key_id, content)) = data_elem.take() else {
                        return Err(malformed_error!("unbalanced data element in GraphML"));
                    };
                    store_data(&keys, &key_id, &content, node.as_mut(), edge.as_mut())?;
                }
                b"node" => {
                    let Some((id, attrs)) = node.take() else {
                        return Err(malformed_error!("unbalanced node element in GraphML"));
                    };
                    graph.add_node_with_attrs(id, attrs);
                }
                b"edge" => {
                    let Some((source, target, attrs)) = edge.take() else {
                        return Err(malformed_error!("unbalanced edge element in GraphML"));
                    };
                    graph.add_edge(source, target, attrs);
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(graph)
}

fn read_key_decl(start: &BytesStart<'_>, keys: &mut HashMap<String, (String, String)>) -> Result<()> {
    let mut id = None;
    let mut name = None;
    let mut attr_type = None;
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let value = attr.unescape_value().map_err(quick_xml::Error::from)?;
        match attr.key.as_ref() {
            b"id" => id = Some(value.into_owned()),
            b"attr.name" => name = Some(value.into_owned()),
            b"attr.type" => attr_type = Some(value.into_owned()),
            _ => {}
        }
    }
    match (id, name) {
        (Some(id), Some(name)) => {
            keys.insert(id, (name, attr_type.unwrap_or_else(|| "string".to_string())));
            Ok(())
        }
        _ => Err(malformed_error!("GraphML key declaration without id or attr.name")),
    }
}

fn required_attr(start: &BytesStart<'_>, name: &[u8]) -> Result<String> {
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == name {
            let value = attr.unescape_value().map_err(quick_xml::Error::from)?;
            return Ok(value.into_owned());
        }
    }
    Err(malformed_error!(
        "GraphML element `{}` lacks required attribute `{}`",
        String::from_utf8_lossy(start.name().as_ref()),
        String::from_utf8_lossy(name)
    ))
}

fn store_data(
    keys: &HashMap<String, (String, String)>,
    key_id: &str,
    content: &str,
    node: Option<&mut (String, AttrMap)>,
    edge: Option<&mut (String, String, AttrMap)>,
) -> Result<()> {
    let Some((name, attr_type)) = keys.get(key_id) else {
        return Err(malformed_error!("GraphML data references undeclared key `{}`", key_id));
    };
    let value = parse_typed(attr_type, content)?;
    if let Some((_, attrs)) = node {
        attrs.insert(name.clone(), value);
        return Ok(());
    }
    if let Some((_, _, attrs)) = edge {
        attrs.insert(name.clone(), value);
        return Ok(());
    }
    Err(malformed_error!("GraphML data element outside node or edge"))
}

fn parse_typed(attr_type: &str, text: &str) -> Result<AttrValue> {
    match attr_type {
        "int" | "long" => text
            .parse::<i64>()
            .map(AttrValue::Int)
            .map_err(|_| malformed_error!("invalid GraphML integer value `{}`", text)),
        "boolean" => match text {
            "true" => Ok(AttrValue::Bool(true)),
            "false" => Ok(AttrValue::Bool(false)),
            _ => Err(malformed_error!("invalid GraphML boolean value `{}`", text)),
        },
        // "string" and anything exotic (float, double) stay text.
        _ => Ok(AttrValue::Str(text.to_string())),
    }
}
