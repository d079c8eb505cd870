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

//! Binary XML document walking.
//!
//! A compiled XML document is one outer chunk containing a string pool, an
//! optional resource map, and a flat stream of namespace/element/end events.
//! The manifest queries only need the elements with their attributes in
//! document order, so the walk flattens the event stream into
//! [`Element`] records and drops nesting; unknown chunk types are skipped by
//! their declared size.

use log::warn;

use crate::{
    file::parser::Parser,
    manifest::chunks::{
        ChunkHeader, StringPool, TypedValue, RES_STRING_POOL_TYPE, RES_XML_END_ELEMENT_TYPE,
        RES_XML_END_NAMESPACE_TYPE, RES_XML_RESOURCE_MAP_TYPE, RES_XML_START_ELEMENT_TYPE,
        RES_XML_START_NAMESPACE_TYPE, RES_XML_TYPE,
    },
    Result,
};

/// One attribute of an element.
#[derive(Debug, Clone)]
pub struct Attribute {
    /// Attribute name.
    pub name: String,
    /// Raw string form when the compiler kept one.
    pub raw: Option<String>,
    /// The typed value.
    pub value: TypedValue,
}

/// One element of the document, attributes in declaration order.
#[derive(Debug, Clone)]
pub struct Element {
    /// Element (tag) name.
    pub name: String,
    /// Nesting depth, 0 for the document element.
    pub depth: usize,
    /// Attributes in declaration order.
    pub attributes: Vec<Attribute>,
}

impl Element {
    /// Looks up an attribute value by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    /// An attribute's effective string: the typed string value when there is
    /// one, otherwise the raw form.
    #[must_use]
    pub fn attribute_string<'a>(&'a self, name: &str, pool: &'a StringPool) -> Option<&'a str> {
        let attribute = self.attribute(name)?;
        attribute
            .value
            .as_string_index()
            .and_then(|index| pool.get(index))
            .or(attribute.raw.as_deref())
    }
}

/// A parsed binary XML document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// The document's string pool.
    pub pool: StringPool,
    /// Elements in document order.
    pub elements: Vec<Element>,
}

impl Document {
    /// Parses a binary XML document.
    ///
    /// # Errors
    ///
    /// Returns an error when the outer chunk is not binary XML, the string
    /// pool is missing or malformed, or an element chunk is truncated.
    pub fn parse(data: &[u8]) -> Result<Document> {
        let mut parser = Parser::new(data);
        let outer = ChunkHeader::read(&mut parser)?;
        if outer.kind != RES_XML_TYPE {
            return Err(malformed_error!(
                "Expected a binary XML document, found chunk type {:#06x}",
                outer.kind
            ));
        }
        let document_end = (outer.size as usize).min(data.len());

        let mut pool = None;
        let mut elements = Vec::new();
        let mut depth = 0_usize;
        let mut at = outer.header_size as usize;

        while at + 8 <= document_end {
            parser.seek(at)?;
            let header = ChunkHeader::read(&mut parser)?;
            let chunk_end = at + header.size as usize;
            if header.size < 8 || chunk_end > document_end {
                return Err(malformed_error!(
                    "Chunk {:#06x} at {:#x} exceeds the document",
                    header.kind,
                    at
                ));
            }

            match header.kind {
                RES_STRING_POOL_TYPE => {
                    pool = Some(StringPool::parse(data, at, header)?);
                }
                RES_XML_START_ELEMENT_TYPE => {
                    let pool_ref = pool.as_ref().ok_or_else(|| {
                        malformed_error!("Element chunk before the string pool")
                    })?;
                    elements.push(read_element(
                        &mut parser,
                        at,
                        header,
                        pool_ref,
                        depth,
                    )?);
                    depth += 1;
                }
                RES_XML_END_ELEMENT_TYPE => depth = depth.saturating_sub(1),
                RES_XML_START_NAMESPACE_TYPE
                | RES_XML_END_NAMESPACE_TYPE
                | RES_XML_RESOURCE_MAP_TYPE => {}
                other => {
                    warn!("Skipping unknown binary XML chunk type {other:#06x}");
                }
            }
            at = chunk_end;
        }

        Ok(Document {
            pool: pool.ok_or_else(|| malformed_error!("Document carries no string pool"))?,
            elements,
        })
    }

    /// First element with the given name, in document order.
    #[must_use]
    pub fn element(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|element| element.name == name)
    }

    /// All elements with the given name, in document order.
    pub fn elements_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements
            .iter()
            .filter(move |element| element.name == name)
    }
}

/// Reads one start-element chunk body.
fn read_element(
    parser: &mut Parser<'_>,
    chunk_start: usize,
    header: ChunkHeader,
    pool: &StringPool,
    depth: usize,
) -> Result<Element> {
    // The 16-byte node header carries line number and comment; the element
    // body starts at the declared header size.
    parser.seek(chunk_start + header.header_size as usize)?;
    let _namespace: u32 = parser.read_le()?;
    let name_index: u32 = parser.read_le()?;
    let attribute_start: u16 = parser.read_le()?;
    let attribute_size: u16 = parser.read_le()?;
    let attribute_count: u16 = parser.read_le()?;
    let _id_index: u16 = parser.read_le()?;
    let _class_index: u16 = parser.read_le()?;
    let _style_index: u16 = parser.read_le()?;

    let name = pool
        .get(name_index)
        .ok_or_else(|| malformed_error!("Element name index {} not in the pool", name_index))?
        .to_string();

    let body = chunk_start + header.header_size as usize;
    let mut attributes = Vec::with_capacity(usize::from(attribute_count));
    for index in 0..usize::from(attribute_count) {
        parser.seek(body + usize::from(attribute_start) + index * usize::from(attribute_size))?;
        let _namespace: u32 = parser.read_le()?;
        let name_index: u32 = parser.read_le()?;
        let raw_index: u32 = parser.read_le()?;
        let value = TypedValue::read(parser)?;

        let Some(name) = pool.get(name_index) else {
            warn!("Skipping attribute with dangling name index {name_index}");
            continue;
        };
        attributes.push(Attribute {
            name: name.to_string(),
            raw: (raw_index != u32::MAX)
                .then(|| pool.get(raw_index).map(str::to_string))
                .flatten(),
            value,
        });
    }

    Ok(Element {
        name,
        depth,
        attributes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::chunks::value_type;
    use crate::test::AxmlBuilder;

    #[test]
    fn parses_elements_with_attributes() {
        let mut builder = AxmlBuilder::new();
        builder.start_element(
            "manifest",
            &[("package", AxmlBuilder::string_value("com.example.app"))],
        );
        builder.start_element(
            "uses-sdk",
            &[("minSdkVersion", AxmlBuilder::int_value(21))],
        );
        builder.end_element("uses-sdk");
        builder.end_element("manifest");
        let document = Document::parse(&builder.build()).unwrap();

        assert_eq!(document.elements.len(), 2);
        let manifest = document.element("manifest").unwrap();
        assert_eq!(manifest.depth, 0);
        assert_eq!(
            manifest.attribute_string("package", &document.pool),
            Some("com.example.app")
        );

        let sdk = document.element("uses-sdk").unwrap();
        assert_eq!(sdk.depth, 1);
        assert_eq!(sdk.attribute("minSdkVersion").unwrap().value.as_int(), Some(21));
        assert!(sdk.attribute("missing").is_none());
    }

    #[test]
    fn elements_named_preserves_document_order() {
        let mut builder = AxmlBuilder::new();
        builder.start_element("manifest", &[]);
        builder.start_element(
            "uses-permission",
            &[("name", AxmlBuilder::string_value("android.permission.INTERNET"))],
        );
        builder.end_element("uses-permission");
        builder.start_element(
            "uses-permission",
            &[("name", AxmlBuilder::string_value("android.permission.CAMERA"))],
        );
        builder.end_element("uses-permission");
        builder.end_element("manifest");
        let document = Document::parse(&builder.build()).unwrap();

        let names: Vec<_> = document
            .elements_named("uses-permission")
            .filter_map(|element| element.attribute_string("name", &document.pool))
            .collect();
        assert_eq!(
            names,
            vec!["android.permission.INTERNET", "android.permission.CAMERA"]
        );
    }

    #[test]
    fn rejects_plain_text_xml() {
        assert!(Document::parse(b"<manifest package=\"a\"/>").is_err());
        assert!(Document::parse(&[]).is_err());
    }

    #[test]
    fn boolean_attribute_decodes() {
        let mut builder = AxmlBuilder::new();
        builder.start_element(
            "application",
            &[("debuggable", AxmlBuilder::bool_value(true))],
        );
        builder.end_element("application");
        let document = Document::parse(&builder.build()).unwrap();

        let app = document.element("application").unwrap();
        assert_eq!(app.attribute("debuggable").unwrap().value.as_bool(), Some(true));
        assert_eq!(
            app.attribute("debuggable").unwrap().value.data_type,
            value_type::BOOLEAN
        );
    }
}
