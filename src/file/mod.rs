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

//! Package file abstraction and binary parsing primitives.
//!
//! This module provides the byte-level foundation for analyzing Android application
//! packages. It abstracts over different data sources (files, memory) and provides
//! bounds-checked access to the raw bytes that the container, manifest, and DEX layers
//! parse.
//!
//! # Architecture
//!
//! - **Backend system** - Pluggable data sources (disk files, memory buffers)
//! - **Parsing infrastructure** - Cursor-based bounds-checked readers
//!
//! # Key Components
//!
//! ## Core Types
//! - [`crate::file::Backend`] - Trait for different data sources (disk files, memory buffers)
//! - [`crate::file::Physical`] - Memory-mapped file backend for disk access
//! - [`crate::file::Memory`] - In-memory buffer backend for synthetic packages and tests
//!
//! ## Parsing Infrastructure
//! - [`crate::file::parser::Parser`] - High-level parsing interface for binary structures
//! - [`crate::file::io`] - Low-level I/O utilities for reading little-endian values
//!
//! # Examples
//!
//! ```rust,ignore
//! use dexscope::file::{Backend, Memory};
//!
//! let backend = Memory::new(vec![0x50, 0x4B, 0x05, 0x06]);
//! assert_eq!(backend.len(), 4);
//! assert_eq!(backend.data_slice(0, 2)?, b"PK");
//! # Ok::<(), dexscope::Error>(())
//! ```
//!
//! # Integration
//!
//! This module integrates with:
//! - [`crate::package`] - Uses backends for ZIP container parsing
//! - [`crate::dex`] - Parses DEX structures out of entry payloads
//! - [`crate::disassembler`] - Provides binary data access for instruction decoding
//!
//! # Thread Safety
//!
//! All components are designed to be thread-safe and can be shared across threads
//! for concurrent analysis of the same package.

pub mod io;
pub mod parser;

mod memory;
mod physical;

pub use memory::Memory;
pub use physical::Physical;

use crate::Result;

/// Backend trait for file data sources.
///
/// This trait abstracts over the source of package data, allowing for both in-memory and
/// on-disk representations. All implementations must be thread-safe.
///
/// The trait provides a common interface for accessing package data regardless of whether
/// it's loaded from a file on disk or from a memory buffer. This enables flexible handling
/// of different data sources while maintaining performance.
pub trait Backend: Send + Sync {
    /// Returns a slice of the data at the given offset and length.
    ///
    /// This method provides bounds-checked access to the underlying data.
    /// It's used by the container and DEX layers to safely read portions
    /// of the package data.
    ///
    /// # Arguments
    ///
    /// * `offset` - The starting offset within the data.
    /// * `len` - The length of the slice in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested range is out of bounds.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// Returns the entire data buffer.
    ///
    /// This provides access to the complete package data as a single slice.
    /// For file-based backends, this typically maps the entire file into memory.
    /// For memory-based backends, this returns the underlying buffer.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data buffer.
    ///
    /// This is equivalent to `self.data().len()` but may be more efficient
    /// for some backend implementations.
    fn len(&self) -> usize;

    /// Returns `true` if the data buffer has a length of zero.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
