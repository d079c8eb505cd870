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

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(clippy::too_many_arguments)]

//! # dexscope
//!
//! A framework for auditing Android application packages. Built in pure Rust,
//! `dexscope` parses APK containers, compiled manifests, and DEX bytecode,
//! disassembles Dalvik methods into basic blocks, and assembles whole-package
//! control-flow graphs that export to DOT, GraphML, and JSON.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dexscope::prelude::*;
//!
//! let package = Package::from_file("app.apk".as_ref())?;
//! let manifest = package.manifest()?;
//! println!("{}", manifest.min_sdk());
//!
//! if let Some(graph) = cfg_from_package(&package)? {
//!     write_dot(&graph, "app.dot")?;
//! }
//! # Ok::<(), dexscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! The crate is layered bottom-up:
//!
//! - [`package`] - APK container access: ZIP directory parsing, entry
//!   extraction, digests, native library and string scans
//! - [`manifest`] - compiled (binary XML) `AndroidManifest.xml` parsing
//! - [`dex`] - DEX file structures: header, identifier tables, class data,
//!   code items
//! - [`disassembler`] - Dalvik instruction decoding and basic block
//!   construction
//! - [`analysis`] - control-flow graph assembly over disassembled methods
//! - [`graph`] - the attribute graph and its DOT/GraphML/JSON serializers
//! - [`report`] - JSON and XML audit report rendering
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result):
//!
//! ```rust,no_run
//! use dexscope::{Error, Package};
//!
//! match Package::from_file(std::path::Path::new("app.apk")) {
//!     Ok(package) => println!("{} entries", package.entries().len()),
//!     Err(Error::NotSupported) => println!("Unsupported container feature"),
//!     Err(Error::Malformed { message, .. }) => println!("Malformed: {}", message),
//!     Err(e) => println!("Error: {}", e),
//! }
//! ```
//!
//! ## Memory-based Analysis
//!
//! Every entry point that takes a file path has a buffer-based twin, backed
//! by the same [`Backend`] abstraction:
//!
//! ```rust,no_run
//! use dexscope::Package;
//!
//! let bytes: Vec<u8> = std::fs::read("app.apk")?;
//! let package = Package::from_mem(bytes)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[macro_use]
pub(crate) mod error;
pub(crate) mod file;
pub(crate) mod utils;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust,no_run
/// use dexscope::prelude::*;
///
/// let package = Package::from_file("app.apk".as_ref())?;
/// println!("{} DEX files", package.dex_names().len());
/// # Ok::<(), dexscope::Error>(())
/// ```
pub mod prelude;

/// Control-flow analysis over whole packages.
///
/// The [`analysis::cfg`] module turns disassembled methods into one
/// package-wide attribute graph: a node per basic block carrying the
/// rendered instructions, an edge per successor carrying the branch kind.
pub mod analysis;

/// DEX file parsing: header, string/type/proto/method identifier tables,
/// class definitions, and code items with their exception tables.
pub mod dex;

/// Dalvik bytecode decoding and basic block construction.
///
/// # Examples
///
/// ```rust,no_run
/// use dexscope::{dex::Dex, disassembler::decode_method};
///
/// let data = std::fs::read("classes.dex")?;
/// let dex = Dex::parse(&data)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub mod disassembler;

/// The attribute graph and its serializers.
///
/// [`graph::AttrGraph`] is a string-keyed directed multigraph whose node and
/// edge attributes are [`graph::AttrValue`]s. Exporters cover DOT, JSON, and
/// GraphML; the GraphML path is a typed two-step pipeline that normalizes
/// unrepresentable attributes and retries before giving up.
pub mod graph;

/// Compiled `AndroidManifest.xml` parsing and SDK version queries.
pub mod manifest;

/// APK container access and extraction queries.
pub mod package;

/// JSON and XML audit report rendering.
pub mod report;

/// `dexscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is
/// always [`Error`], used consistently throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// `dexscope` Error type
///
/// The main error type for all operations in this crate, covering container
/// parsing, bytecode decoding, graph serialization, and I/O.
pub use error::Error;

/// Main entry point for working with application packages.
///
/// # Example
///
/// ```rust,no_run
/// use dexscope::Package;
/// let package = Package::from_file(std::path::Path::new("app.apk"))?;
/// println!("{} entries", package.entries().len());
/// # Ok::<(), dexscope::Error>(())
/// ```
pub use package::Package;

/// Parsed application manifest, see [`manifest::Manifest`].
pub use manifest::Manifest;

/// Low-level data access: the [`Backend`] storage abstraction and the
/// bounds-checked [`Parser`] the format readers are built on.
pub use file::{parser::Parser, Backend};
