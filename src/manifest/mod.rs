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

//! Compiled `AndroidManifest.xml` parsing.
//!
//! Packages ship their manifest in the binary XML (AXML) format rather than
//! plain text. [`Manifest`] parses the compiled document and exposes the
//! fields the audit queries need: the package name, the declared permissions,
//! and the SDK version bounds.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dexscope::Package;
//!
//! # fn main() -> dexscope::Result<()> {
//! let package = Package::from_file("app.apk".as_ref())?;
//! let manifest = package.manifest()?;
//! println!("{}", manifest.min_sdk());
//! for permission in manifest.permissions() {
//!     println!("{permission}");
//! }
//! # Ok(())
//! # }
//! ```

mod axml;
mod chunks;
mod sdk;

pub use axml::{Attribute, Document, Element};
pub use chunks::{value_type, ChunkHeader, PoolFlags, StringPool, TypedValue};
pub use sdk::{version_name, MinSdkReport, DEFAULT_MIN_SDK};

use crate::Result;

/// A parsed application manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    document: Document,
}

impl Manifest {
    /// Parses a compiled manifest from its binary XML bytes.
    ///
    /// # Errors
    ///
    /// Returns an error when the bytes are not a well-formed binary XML
    /// document or the document has no `manifest` element.
    pub fn parse(data: &[u8]) -> Result<Manifest> {
        let document = Document::parse(data)?;
        if document.element("manifest").is_none() {
            return Err(malformed_error!("Document has no manifest element"));
        }
        Ok(Manifest { document })
    }

    /// The underlying document, for queries the facade does not cover.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The declared package name, when present.
    #[must_use]
    pub fn package_name(&self) -> Option<&str> {
        self.document
            .element("manifest")
            .and_then(|manifest| manifest.attribute_string("package", &self.document.pool))
    }

    /// Requested permissions in document order, duplicates removed.
    #[must_use]
    pub fn permissions(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.document
            .elements_named("uses-permission")
            .filter_map(|element| element.attribute_string("name", &self.document.pool))
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// The declared minimum SDK level, defaulting to API 1 when the manifest
    /// does not carry one.
    #[must_use]
    pub fn min_sdk(&self) -> MinSdkReport {
        MinSdkReport::new(self.sdk_attribute("minSdkVersion").unwrap_or(DEFAULT_MIN_SDK))
    }

    /// The declared target SDK level, when present.
    #[must_use]
    pub fn target_sdk(&self) -> Option<u32> {
        self.sdk_attribute("targetSdkVersion")
    }

    /// Reads an integer attribute off the `uses-sdk` element, accepting the
    /// string encoding some build tools emit.
    fn sdk_attribute(&self, name: &str) -> Option<u32> {
        let element = self.document.element("uses-sdk")?;
        let attribute = element.attribute(name)?;
        attribute.value.as_int().or_else(|| {
            element
                .attribute_string(name, &self.document.pool)
                .and_then(|text| text.parse().ok())
        })
    }
}
