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

//! Low-level byte order and safe reading utilities for container and bytecode parsing.
//!
//! This module provides endian-aware binary data reading functionality for parsing APK
//! containers, binary manifests, and DEX bytecode structures. It implements safe,
//! bounds-checked operations for reading primitive types from byte buffers, preventing
//! buffer overruns during binary analysis.
//!
//! All of the formats handled by this crate (ZIP records, AXML chunks, DEX sections,
//! Dalvik instructions) are little-endian, so only little-endian reads are provided.
//!
//! # Architecture
//!
//! The module is built around the [`crate::file::io::DexIO`] trait which provides a unified
//! interface for reading binary data in a type-safe manner:
//!
//! - Generic trait-based reading for all primitive integer types
//! - Automatic bounds checking to prevent buffer overruns
//! - Consistent error handling through the [`crate::Result`] type
//!
//! # Key Components
//!
//! - [`crate::file::io::DexIO`] - Trait defining byte-array conversion for primitive types
//! - [`crate::file::io::read_le_at`] - Read a value at a specific offset with auto-advance
//!
//! # Usage Examples
//!
//! ```rust,ignore
//! use dexscope::file::io::read_le_at;
//!
//! let data = [0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x00, 0x00];
//! let mut offset = 0;
//!
//! let first: u16 = read_le_at(&data, &mut offset)?;  // offset: 0 -> 2
//! let second: u16 = read_le_at(&data, &mut offset)?; // offset: 2 -> 4
//! let third: u32 = read_le_at(&data, &mut offset)?;  // offset: 4 -> 8
//!
//! assert_eq!(first, 1);
//! assert_eq!(second, 2);
//! assert_eq!(third, 3);
//! assert_eq!(offset, 8);
//! # Ok::<(), dexscope::Error>(())
//! ```
//!
//! # Error Handling
//!
//! All reading functions return [`crate::Result<T>`] and will return
//! [`crate::Error::OutOfBounds`] if there are insufficient bytes in the buffer to
//! complete the operation.
//!
//! # Integration
//!
//! This module is the foundational layer for all binary data access throughout the
//! crate; [`crate::file::parser::Parser`] builds its cursor-based interface on top of
//! these functions.

use crate::{Error::OutOfBounds, Result};

/// Trait for implementing type-specific safe binary data reading operations.
///
/// This trait provides a unified interface for reading primitive types from byte slices
/// in a safe manner. It abstracts over the conversion from byte arrays to typed values
/// for the little-endian formats used by ZIP records, AXML chunks, and DEX structures.
///
/// Each implementation defines a `Bytes` associated type that represents the fixed-size
/// byte array required for that particular type (e.g., `[u8; 4]` for `u32`).
pub trait DexIO: Sized {
    /// Associated type representing the byte array type for this numeric type.
    ///
    /// This type must be convertible from a byte slice and is used for reading
    /// binary data in little-endian format.
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]>;

    /// Read T from a byte buffer in little-endian
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
}

macro_rules! impl_dex_io {
    ($($ty:ty => $len:literal),* $(,)?) => {
        $(
            impl DexIO for $ty {
                type Bytes = [u8; $len];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_dex_io! {
    u8 => 1,
    i8 => 1,
    u16 => 2,
    i16 => 2,
    u32 => 4,
    i32 => 4,
    u64 => 8,
    i64 => 8,
}

/// Read a `T` at the provided offset in little-endian format, advancing the offset.
///
/// # Arguments
/// * `data` - The buffer to read from
/// * `offset` - The location to read from; advanced by `size_of::<T>()` on success
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if reading `T` at `offset` would exceed the
/// buffer length.
pub fn read_le_at<T: DexIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let size = std::mem::size_of::<T>();

    let Some(end) = offset.checked_add(size) else {
        return Err(OutOfBounds);
    };

    if end > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(bytes) = T::Bytes::try_from(&data[*offset..end]) else {
        return Err(OutOfBounds);
    };

    *offset = end;
    Ok(T::from_le_bytes(bytes))
}
