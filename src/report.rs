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

//! Audit report emission.
//!
//! The extraction queries all produce flat lists or small records, and the
//! reports mirror that: a JSON object with a single named array, or an XML
//! document with one element per value. Both renderings are pretty-printed
//! for human consumption, and the path-taking writers land their bytes with
//! the same temp-file-and-rename discipline the graph exporters use, so a
//! failed write never leaves a truncated report behind.

use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::Serialize;
use serde_json::json;

use crate::{graph::atomic_write, manifest::MinSdkReport, Result};

/// Renders a permissions report as JSON: `{"permissions": [...]}`.
///
/// # Errors
///
/// Returns [`crate::Error::Json`] when encoding fails.
pub fn permissions_json<S: Serialize>(permissions: &[S]) -> Result<String> {
    json_list("permissions", permissions)
}

/// Renders a permissions report as XML, one `<permission>` element per entry.
///
/// # Errors
///
/// Returns [`crate::Error::Xml`] when encoding fails.
pub fn permissions_xml<S: AsRef<str>>(permissions: &[S]) -> Result<String> {
    xml_list("permissions", "permission", permissions)
}

/// Renders a native library report as JSON: `{"native_libraries": [...]}`.
///
/// # Errors
///
/// Returns [`crate::Error::Json`] when encoding fails.
pub fn native_libraries_json<S: Serialize>(libraries: &[S]) -> Result<String> {
    json_list("native_libraries", libraries)
}

/// Renders a native library report as XML, one `<library>` element per entry.
///
/// # Errors
///
/// Returns [`crate::Error::Xml`] when encoding fails.
pub fn native_libraries_xml<S: AsRef<str>>(libraries: &[S]) -> Result<String> {
    xml_list("native_libraries", "library", libraries)
}

/// Renders an extracted-strings report as JSON: `{"strings": [...]}`.
///
/// # Errors
///
/// Returns [`crate::Error::Json`] when encoding fails.
pub fn strings_json<S: Serialize>(strings: &[S]) -> Result<String> {
    json_list("strings", strings)
}

/// Renders a minimum-SDK report as JSON: `{"api_level": ..., "version": ...}`.
///
/// # Errors
///
/// Returns [`crate::Error::Json`] when encoding fails.
pub fn min_sdk_json(report: &MinSdkReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Writes an already rendered report to `path` atomically.
///
/// # Errors
///
/// Returns an I/O error when the temporary file cannot be created or the
/// rename fails.
pub fn write_report(path: impl AsRef<Path>, rendered: &str) -> Result<()> {
    atomic_write(path.as_ref(), rendered.as_bytes())
}

fn json_list<S: Serialize>(key: &str, values: &[S]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&json!({ key: values }))?)
}

fn xml_list<S: AsRef<str>>(root: &str, item: &str, values: &[S]) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    if values.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new(root)))?;
    } else {
        writer.write_event(Event::Start(BytesStart::new(root)))?;
        for value in values {
            writer.write_event(Event::Start(BytesStart::new(item)))?;
            writer.write_event(Event::Text(BytesText::new(value.as_ref())))?;
            writer.write_event(Event::End(BytesEnd::new(item)))?;
        }
        writer.write_event(Event::End(BytesEnd::new(root)))?;
    }
    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    String::from_utf8(bytes).map_err(|err| malformed_error!("Report is not UTF-8: {}", err))
}
