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

//! In-memory buffer backend.
//!
//! This module provides the [`crate::file::Memory`] backend that implements the
//! [`crate::file::Backend`] trait for package data that is already resident in memory.
//! It is used when analyzing downloaded packages without touching disk and by the test
//! suite, which assembles synthetic packages byte by byte.
//!
//! # Usage Examples
//!
//! ```rust,ignore
//! use dexscope::file::{Backend, Memory};
//!
//! let memory = Memory::new(vec![0x64, 0x65, 0x78, 0x0A]);
//! assert_eq!(memory.len(), 4);
//! assert_eq!(memory.data_slice(0, 3)?, b"dex");
//! # Ok::<(), dexscope::Error>(())
//! ```

use super::Backend;
use crate::{Error::OutOfBounds, Result};

/// A backend over an owned byte buffer.
///
/// [`crate::file::Memory`] is the counterpart to [`crate::file::Physical`] for data that
/// does not originate from a file on disk. All access operations include bounds checking,
/// matching the behavior of the memory-mapped backend.
#[derive(Debug)]
pub struct Memory {
    /// The owned package data
    data: Vec<u8>,
}

impl Memory {
    /// Create a new in-memory backend from a byte buffer.
    ///
    /// # Arguments
    /// * `data` - The bytes of the package
    #[must_use]
    pub fn new(data: Vec<u8>) -> Memory {
        Memory { data }
    }
}

impl Backend for Memory {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let Some(offset_end) = offset.checked_add(len) else {
            return Err(OutOfBounds);
        };

        if offset_end > self.data.len() {
            return Err(OutOfBounds);
        }

        Ok(&self.data[offset..offset_end])
    }

    fn data(&self) -> &[u8] {
        &self.data
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}
