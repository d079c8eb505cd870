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

//! Low-level byte stream parser for container and DEX decoding.
//!
//! This module provides the [`crate::file::parser::Parser`] type, a cursor-based binary data
//! parser designed for reading ZIP records, AXML chunks, and DEX structures. It offers
//! bounds-checked access to binary data with support for the variable-length LEB128
//! encodings used throughout the DEX format.
//!
//! # Architecture
//!
//! The parser is built around a simple cursor-based model that maintains a position within
//! a byte slice:
//!
//! - **Position tracking** - Maintains current offset for sequential parsing operations
//! - **Bounds checking** - All operations validate data availability before reading
//! - **Type-safe reading** - Strongly typed methods for common data types
//! - **DEX support** - Specialized methods for ULEB128/SLEB128 varints
//!
//! # Key Components
//!
//! ## Navigation Methods
//! - [`crate::file::parser::Parser::seek`] - Move to specific position
//! - [`crate::file::parser::Parser::advance_by`] - Move forward by specified bytes
//! - [`crate::file::parser::Parser::pos`] - Get current position
//! - [`crate::file::parser::Parser::align`] - Align to byte boundaries
//!
//! ## Data Access Methods
//! - [`crate::file::parser::Parser::read_le`] - Read primitive types (little-endian)
//! - [`crate::file::parser::Parser::read_bytes`] - Read a raw byte slice
//! - [`crate::file::parser::Parser::peek_byte`] - Peek at current byte without advancing
//!
//! ## Varint Reading Methods
//! - [`crate::file::parser::Parser::read_uleb128`] - Read unsigned LEB128 integers
//! - [`crate::file::parser::Parser::read_sleb128`] - Read signed LEB128 integers
//!
//! # Usage Examples
//!
//! ## Basic Value Reading
//!
//! ```rust
//! use dexscope::Parser;
//!
//! let data = [0x01, 0x02, 0x03, 0x04];
//! let mut parser = Parser::new(&data);
//!
//! let value = parser.read_le::<u16>()?;
//! assert_eq!(value, 0x0201);
//! # Ok::<(), dexscope::Error>(())
//! ```
//!
//! ## Sequential Parsing with Navigation
//!
//! ```rust
//! use dexscope::Parser;
//!
//! let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
//! let mut parser = Parser::new(&data);
//!
//! let first = parser.read_le::<u32>()?;
//! assert_eq!(first, 0x04030201);
//!
//! parser.seek(6)?;
//! let last_bytes = parser.read_le::<u16>()?;
//! assert_eq!(last_bytes, 0x0807);
//! # Ok::<(), dexscope::Error>(())
//! ```
//!
//! ## Varint Parsing
//!
//! ```rust
//! use dexscope::Parser;
//!
//! // DEX encodes most counts and indices as ULEB128
//! let data = [0x80, 0x7F]; // 16256
//! let mut parser = Parser::new(&data);
//! assert_eq!(parser.read_uleb128()?, 16256);
//! # Ok::<(), dexscope::Error>(())
//! ```

use crate::{
    file::io::{read_le_at, DexIO},
    Error::OutOfBounds,
    Result,
};

/// A generic binary data parser for reading APK and DEX structures.
///
/// `Parser` provides a cursor-based interface for reading binary data in little-endian
/// format. It's designed for parsing the structures this crate deals with: ZIP
/// central-directory records, AXML chunks, DEX headers and pools, and Dalvik
/// instruction streams.
///
/// The parser maintains an internal position cursor and provides bounds checking
/// to prevent buffer overruns when reading malformed or truncated data.
///
/// # Examples
///
/// ```rust
/// use dexscope::Parser;
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
/// let mut parser = Parser::new(&data);
///
/// let first = parser.read_le::<u32>()?;
/// assert_eq!(first, 0x04030201);
///
/// parser.seek(6)?;
/// let last_bytes = parser.read_le::<u16>()?;
/// assert_eq!(last_bytes, 0x0807);
/// # Ok::<(), dexscope::Error>(())
/// ```
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`crate::file::parser::Parser`] from a byte slice.
    ///
    /// # Arguments
    /// * `data` - The byte slice to read from
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dexscope::Parser;
    /// let data = [0x01, 0x02, 0x03, 0x04];
    /// let parser = Parser::new(&data);
    /// assert_eq!(parser.len(), 4);
    /// ```
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the parser has no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there is more data available to parse.
    ///
    /// This checks if the current position is before the end of the data buffer.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Move the current position to the specified index.
    ///
    /// # Arguments
    /// * `pos` - The position to move the cursor to
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if position is beyond the data length.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos >= self.data.len() {
            return Err(OutOfBounds);
        }

        self.position = pos;
        Ok(())
    }

    /// Move the position forward by one byte.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing would exceed the data length.
    pub fn advance(&mut self) -> Result<()> {
        self.advance_by(1)
    }

    /// Move the position forward by the specified number of bytes.
    ///
    /// # Arguments
    /// * `step` - Amount of bytes to advance
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing by step would exceed the data length.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        let Some(end) = self.position.checked_add(step) else {
            return Err(OutOfBounds);
        };

        if end > self.data.len() {
            return Err(OutOfBounds);
        }

        self.position = end;
        Ok(())
    }

    /// Get the current position of the parser within the data buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Get access to the underlying data buffer.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Peek at the next byte without advancing the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if position is at or beyond the data length.
    pub fn peek_byte(&self) -> Result<u8> {
        if self.position >= self.data.len() {
            return Err(OutOfBounds);
        }
        Ok(self.data[self.position])
    }

    /// Align the position to a specific boundary.
    ///
    /// This advances the position to the next multiple of the specified alignment,
    /// which is used when parsing DEX structures that require 4-byte alignment
    /// (e.g. the try-item table following an odd-length instruction array).
    ///
    /// # Arguments
    /// * `alignment` - The boundary to align to (must be non-zero)
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if aligning would exceed the data
    /// length. Like [`Parser::advance_by`], landing exactly at the end of the
    /// buffer is permitted; subsequent reads fail instead.
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        let padding = (alignment - (self.position % alignment)) % alignment;
        if self.position + padding > self.data.len() {
            return Err(OutOfBounds);
        }
        self.position += padding;
        Ok(())
    }

    /// Read a type `T` from the current position in little-endian format and advance the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dexscope::Parser;
    /// let data = [0x01, 0x02, 0x03, 0x04];
    /// let mut parser = Parser::new(&data);
    ///
    /// let value: u16 = parser.read_le()?;
    /// assert_eq!(value, 0x0201);
    /// assert_eq!(parser.pos(), 2);
    /// # Ok::<(), dexscope::Error>(())
    /// ```
    pub fn read_le<T: DexIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Read `len` raw bytes from the current position and advance past them.
    ///
    /// The returned slice borrows from the underlying buffer, so no copy is made.
    ///
    /// # Arguments
    /// * `len` - Number of bytes to read
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let Some(end) = self.position.checked_add(len) else {
            return Err(OutOfBounds);
        };

        if end > self.data.len() {
            return Err(OutOfBounds);
        }

        let slice = &self.data[self.position..end];
        self.position = end;
        Ok(slice)
    }

    /// Read an unsigned LEB128 value as used throughout the DEX format.
    ///
    /// Each byte contributes its lower 7 bits; the most significant bit signals
    /// a continuation. A `u32` value occupies at most 5 bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length or
    /// [`crate::Error::Malformed`] if the encoding runs past 5 bytes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dexscope::Parser;
    ///
    /// // Single byte encoding (value < 128)
    /// let data = [0x7F];
    /// let mut parser = Parser::new(&data);
    /// assert_eq!(parser.read_uleb128()?, 127);
    ///
    /// // Two byte encoding
    /// let data = [0x80, 0x01];
    /// let mut parser = Parser::new(&data);
    /// assert_eq!(parser.read_uleb128()?, 128);
    /// # Ok::<(), dexscope::Error>(())
    /// ```
    pub fn read_uleb128(&mut self) -> Result<u32> {
        // Accumulate in 64 bits: the 5th byte may carry payload bits past bit 31,
        // which the final conversion rejects.
        let mut value = 0u64;
        let mut shift = 0;

        loop {
            let byte = self.read_le::<u8>()?;

            value |= u64::from(byte & 0x7F) << shift;

            if (byte & 0x80) == 0 {
                break;
            }

            shift += 7;

            if shift >= 35 {
                return Err(malformed_error!("ULEB128 value exceeds 5 bytes"));
            }
        }

        u32::try_from(value).map_err(|_| malformed_error!("ULEB128 value overflows u32"))
    }

    /// Read a signed LEB128 value as used in DEX exception handler lists.
    ///
    /// The encoding matches ULEB128, with the final byte's highest payload bit
    /// acting as a sign bit that is extended across the remaining width.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length or
    /// [`crate::Error::Malformed`] if the encoding runs past 5 bytes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dexscope::Parser;
    ///
    /// let data = [0x7F]; // -1
    /// let mut parser = Parser::new(&data);
    /// assert_eq!(parser.read_sleb128()?, -1);
    /// # Ok::<(), dexscope::Error>(())
    /// ```
    pub fn read_sleb128(&mut self) -> Result<i32> {
        let mut value = 0i64;
        let mut shift = 0;

        loop {
            let byte = self.read_le::<u8>()?;

            value |= i64::from(byte & 0x7F) << shift;
            shift += 7;

            if (byte & 0x80) == 0 {
                if (byte & 0x40) != 0 {
                    value |= -1i64 << shift;
                }
                break;
            }

            if shift >= 35 {
                return Err(malformed_error!("SLEB128 value exceeds 5 bytes"));
            }
        }

        i32::try_from(value).map_err(|_| malformed_error!("SLEB128 value overflows i32"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let mut parser = Parser::new(&data);

        assert_eq!(parser.len(), 8);
        assert!(!parser.is_empty());
        assert!(parser.has_more_data());

        parser.seek(4).unwrap();
        assert_eq!(parser.pos(), 4);
        assert_eq!(parser.peek_byte().unwrap(), 0x05);
        assert_eq!(parser.pos(), 4);

        parser.advance().unwrap();
        assert_eq!(parser.pos(), 5);

        parser.advance_by(3).unwrap();
        assert_eq!(parser.pos(), 8);
        assert!(!parser.has_more_data());

        assert!(parser.seek(8).is_err());
        assert!(parser.advance().is_err());
    }

    #[test]
    fn align_boundary() {
        let data = [0u8; 16];
        let mut parser = Parser::new(&data);

        parser.advance().unwrap();
        parser.align(4).unwrap();
        assert_eq!(parser.pos(), 4);

        // Already aligned: no movement
        parser.align(4).unwrap();
        assert_eq!(parser.pos(), 4);

        // Landing exactly on the end of the buffer is fine, reads past it are not
        parser.seek(15).unwrap();
        parser.align(8).unwrap();
        assert_eq!(parser.pos(), 16);
        assert!(parser.read_le::<u8>().is_err());

        let short = [0u8; 15];
        let mut parser = Parser::new(&short);
        parser.seek(13).unwrap();
        assert!(parser.align(8).is_err());
        assert_eq!(parser.pos(), 13);
    }

    #[test]
    fn read_primitives() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let mut parser = Parser::new(&data);

        assert_eq!(parser.read_le::<u16>().unwrap(), 0x0201);
        assert_eq!(parser.read_le::<u16>().unwrap(), 0x0403);
        assert!(parser.read_le::<u8>().is_err());
    }

    #[test]
    fn read_bytes_slices() {
        let data = [0x0A, 0x0B, 0x0C, 0x0D];
        let mut parser = Parser::new(&data);

        assert_eq!(parser.read_bytes(2).unwrap(), &[0x0A, 0x0B]);
        assert_eq!(parser.pos(), 2);
        assert_eq!(parser.read_bytes(2).unwrap(), &[0x0C, 0x0D]);
        assert!(parser.read_bytes(1).is_err());
    }

    #[test]
    fn uleb128_values() {
        // (encoding, expected) pairs from the DEX specification
        let cases: &[(&[u8], u32)] = &[
            (&[0x00], 0),
            (&[0x01], 1),
            (&[0x7F], 127),
            (&[0x80, 0x01], 128),
            (&[0x80, 0x7F], 16256),
            (&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F], u32::MAX),
        ];

        for (encoding, expected) in cases {
            let mut parser = Parser::new(encoding);
            assert_eq!(parser.read_uleb128().unwrap(), *expected);
            assert_eq!(parser.pos(), encoding.len());
        }
    }

    #[test]
    fn uleb128_too_long() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        let mut parser = Parser::new(&data);
        assert!(parser.read_uleb128().is_err());
    }

    #[test]
    fn uleb128_truncated() {
        let data = [0x80];
        let mut parser = Parser::new(&data);
        assert!(parser.read_uleb128().is_err());
    }

    #[test]
    fn sleb128_values() {
        let cases: &[(&[u8], i32)] = &[
            (&[0x00], 0),
            (&[0x01], 1),
            (&[0x7F], -1),
            (&[0x80, 0x7F], -128),
            (&[0x3F], 63),
            (&[0x40], -64),
        ];

        for (encoding, expected) in cases {
            let mut parser = Parser::new(encoding);
            assert_eq!(parser.read_sleb128().unwrap(), *expected);
        }
    }
}
