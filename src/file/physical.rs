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

//! Physical file backend for memory-mapped I/O.
//!
//! This module provides the [`crate::file::Physical`] backend that implements the
//! [`crate::file::Backend`] trait for accessing packages from disk using memory-mapped
//! I/O. This approach provides efficient access to large packages without loading the
//! entire content into memory upfront, while still allowing fast random access to any
//! part of the file — the access pattern of ZIP parsing, which starts at the end of the
//! file and jumps backwards into entry data.
//!
//! # Key Components
//!
//! - [`crate::file::Physical`] - Main backend struct implementing [`crate::file::Backend`]
//! - [`crate::file::Physical::new`] - Creates backend from file path with memory mapping
//!
//! # Usage Examples
//!
//! ```rust,ignore
//! use dexscope::file::{Physical, Backend};
//! use std::path::Path;
//!
//! let physical = Physical::new(Path::new("app.apk"))?;
//! println!("File size: {} bytes", physical.len());
//!
//! // Read the first 4 bytes (local file header signature)
//! let header = physical.data_slice(0, 4)?;
//! assert_eq!(header, b"PK\x03\x04");
//! # Ok::<(), dexscope::Error>(())
//! ```

use super::Backend;
use crate::{Error::FileError, Result};

use memmap2::Mmap;
use std::{fs, path::Path};

/// A file backend that uses memory-mapped I/O for efficient access to files on disk.
///
/// [`crate::file::Physical`] provides a way to access large files by mapping them
/// directly into the process's virtual address space. This eliminates the need to read
/// the entire file into memory upfront and allows the operating system to manage
/// memory efficiently through demand paging.
///
/// The backend is well-suited for reading application packages, which can be large and
/// are accessed in a non-sequential pattern when walking the central directory and
/// extracting entries. All access operations include bounds checking to ensure memory
/// safety.
///
/// # Examples
///
/// ```rust,ignore
/// use dexscope::file::{Physical, Backend};
/// use std::path::Path;
///
/// let physical = Physical::new(Path::new("app.apk"))?;
///
/// // End-of-central-directory signature lives in the last 22 bytes
/// let tail = physical.data_slice(physical.len() - 22, 4)?;
/// assert_eq!(tail, b"PK\x05\x06");
/// # Ok::<(), dexscope::Error>(())
/// ```
#[derive(Debug)]
pub struct Physical {
    /// Memory-mapped file data
    data: Mmap,
}

impl Physical {
    /// Create a new physical file backend by memory-mapping the specified file.
    ///
    /// This method opens the file at the given path and creates a memory mapping
    /// for it. The file is mapped as read-only and shared, allowing multiple
    /// processes to efficiently access the same file.
    ///
    /// # Arguments
    /// * `path` - Path to the package on disk. Accepts `&Path`, `&str`, `String`, or `PathBuf`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or memory
    /// mapping fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(error) => return Err(FileError(error)),
        };

        let mmap = match unsafe { Mmap::map(&file) } {
            Ok(mmap) => mmap,
            Err(error) => return Err(FileError(error)),
        };

        Ok(Physical { data: mmap })
    }
}

impl Backend for Physical {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let Some(offset_end) = offset.checked_add(len) else {
            return Err(crate::Error::OutOfBounds);
        };

        if offset_end > self.data.len() {
            return Err(crate::Error::OutOfBounds);
        }

        Ok(&self.data[offset..offset_end])
    }

    fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}
