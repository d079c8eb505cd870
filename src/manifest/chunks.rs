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

//! Binary XML chunk primitives.
//!
//! Compiled resources are a sequence of length-prefixed chunks: an 8-byte
//! header (type, header size, total size) followed by a type-specific body.
//! This module reads the pieces the manifest parser needs — the chunk
//! headers, the string pool, and typed attribute values. Chunk types that do
//! not matter here (style data, CDATA) are skipped by size, never rejected.

use bitflags::bitflags;
use widestring::U16Str;

use crate::{file::parser::Parser, Result};

/// Chunk type: string pool.
pub const RES_STRING_POOL_TYPE: u16 = 0x0001;
/// Chunk type: whole binary XML document.
pub const RES_XML_TYPE: u16 = 0x0003;
/// Chunk type: namespace scope start.
pub const RES_XML_START_NAMESPACE_TYPE: u16 = 0x0100;
/// Chunk type: namespace scope end.
pub const RES_XML_END_NAMESPACE_TYPE: u16 = 0x0101;
/// Chunk type: element start.
pub const RES_XML_START_ELEMENT_TYPE: u16 = 0x0102;
/// Chunk type: element end.
pub const RES_XML_END_ELEMENT_TYPE: u16 = 0x0103;
/// Chunk type: resource id map for attribute names.
pub const RES_XML_RESOURCE_MAP_TYPE: u16 = 0x0180;

/// The 8-byte header every chunk starts with.
#[derive(Debug, Clone, Copy)]
pub struct ChunkHeader {
    /// Chunk type discriminator.
    pub kind: u16,
    /// Bytes from the chunk start to the body.
    pub header_size: u16,
    /// Total chunk size including the header.
    pub size: u32,
}

impl ChunkHeader {
    /// Reads a chunk header at the parser's position.
    ///
    /// # Errors
    ///
    /// Returns an error when the header is truncated or its sizes are
    /// internally inconsistent.
    pub fn read(parser: &mut Parser<'_>) -> Result<ChunkHeader> {
        let kind: u16 = parser.read_le()?;
        let header_size: u16 = parser.read_le()?;
        let size: u32 = parser.read_le()?;
        if u32::from(header_size) > size || header_size < 8 {
            return Err(malformed_error!(
                "Chunk {:#06x} header size {} conflicts with chunk size {}",
                kind,
                header_size,
                size
            ));
        }
        Ok(ChunkHeader {
            kind,
            header_size,
            size,
        })
    }
}

bitflags! {
    /// String pool header flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PoolFlags: u32 {
        /// Strings are sorted by value.
        const SORTED = 1 << 0;
        /// Strings are stored as UTF-8 instead of UTF-16LE.
        const UTF8 = 1 << 8;
    }
}

/// A decoded string pool chunk.
#[derive(Debug, Clone, Default)]
pub struct StringPool {
    strings: Vec<String>,
}

impl StringPool {
    /// Decodes the string pool chunk starting at `chunk_start` in `data`.
    ///
    /// # Errors
    ///
    /// Returns an error when offsets point outside the chunk or string data
    /// is truncated.
    pub fn parse(data: &[u8], chunk_start: usize, header: ChunkHeader) -> Result<StringPool> {
        let mut parser = Parser::new(data);
        parser.seek(chunk_start + 8)?;

        let string_count: u32 = parser.read_le()?;
        let _style_count: u32 = parser.read_le()?;
        let flags = PoolFlags::from_bits_retain(parser.read_le()?);
        let strings_start: u32 = parser.read_le()?;
        let _styles_start: u32 = parser.read_le()?;

        let chunk_end = chunk_start + header.size as usize;
        if chunk_end > data.len() {
            return Err(malformed_error!(
                "String pool chunk at {:#x} exceeds the document",
                chunk_start
            ));
        }

        let mut offsets = Vec::with_capacity(string_count as usize);
        parser.seek(chunk_start + header.header_size as usize)?;
        for _ in 0..string_count {
            offsets.push(parser.read_le::<u32>()?);
        }

        let base = chunk_start + strings_start as usize;
        let mut strings = Vec::with_capacity(string_count as usize);
        for offset in offsets {
            let at = base + offset as usize;
            if at >= chunk_end {
                return Err(malformed_error!(
                    "String offset {:#x} lies outside its pool",
                    offset
                ));
            }
            strings.push(if flags.contains(PoolFlags::UTF8) {
                read_utf8(&data[..chunk_end], at)?
            } else {
                read_utf16(&data[..chunk_end], at)?
            });
        }

        Ok(StringPool { strings })
    }

    /// Looks up a string by pool index.
    #[must_use]
    pub fn get(&self, index: u32) -> Option<&str> {
        self.strings.get(index as usize).map(String::as_str)
    }

    /// Number of strings in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Returns `true` when the pool holds no strings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// UTF-16LE pool string: u16 length in units (with a two-unit escape for
/// lengths above 0x7FFF), then the code units.
fn read_utf16(data: &[u8], at: usize) -> Result<String> {
    let mut parser = Parser::new(data);
    parser.seek(at)?;
    let first: u16 = parser.read_le()?;
    let len = if first & 0x8000 != 0 {
        let second: u16 = parser.read_le()?;
        ((usize::from(first & 0x7FFF)) << 16) | usize::from(second)
    } else {
        usize::from(first)
    };

    let mut units = Vec::with_capacity(len);
    for _ in 0..len {
        units.push(parser.read_le::<u16>()?);
    }
    Ok(U16Str::from_slice(&units).to_string_lossy())
}

/// UTF-8 pool string: character count, then byte count (each one or two
/// bytes), then the bytes.
fn read_utf8(data: &[u8], at: usize) -> Result<String> {
    let mut parser = Parser::new(data);
    parser.seek(at)?;
    read_utf8_len(&mut parser)?;
    let byte_len = read_utf8_len(&mut parser)?;
    let bytes = parser.read_bytes(byte_len)?;
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

fn read_utf8_len(parser: &mut Parser<'_>) -> Result<usize> {
    let first: u8 = parser.read_le()?;
    if first & 0x80 == 0 {
        return Ok(usize::from(first));
    }
    let second: u8 = parser.read_le()?;
    Ok((usize::from(first & 0x7F) << 8) | usize::from(second))
}

/// Value type discriminators used by manifest attributes.
pub mod value_type {
    /// Reference into the resource table.
    pub const REFERENCE: u8 = 0x01;
    /// Index into the document's string pool.
    pub const STRING: u8 = 0x03;
    /// Decimal integer.
    pub const INT_DEC: u8 = 0x10;
    /// Hexadecimal integer.
    pub const INT_HEX: u8 = 0x11;
    /// Boolean, 0 or 0xFFFFFFFF.
    pub const BOOLEAN: u8 = 0x12;
}

/// A typed attribute value (`Res_value`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypedValue {
    /// Type discriminator, see [`value_type`].
    pub data_type: u8,
    /// Raw payload, interpretation depends on the type.
    pub data: u32,
}

impl TypedValue {
    /// Reads a `Res_value` at the parser's position.
    ///
    /// # Errors
    ///
    /// Returns an error on truncated input.
    pub fn read(parser: &mut Parser<'_>) -> Result<TypedValue> {
        let _size: u16 = parser.read_le()?;
        let _res0: u8 = parser.read_le()?;
        let data_type: u8 = parser.read_le()?;
        let data: u32 = parser.read_le()?;
        Ok(TypedValue { data_type, data })
    }

    /// The value as an integer, when its type carries one.
    #[must_use]
    pub fn as_int(&self) -> Option<u32> {
        match self.data_type {
            value_type::INT_DEC | value_type::INT_HEX => Some(self.data),
            _ => None,
        }
    }

    /// The value as a string pool index, when its type is a string.
    #[must_use]
    pub fn as_string_index(&self) -> Option<u32> {
        (self.data_type == value_type::STRING).then_some(self.data)
    }

    /// The value as a boolean, when its type is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        (self.data_type == value_type::BOOLEAN).then_some(self.data != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_header_round_trip() {
        let bytes = [0x02, 0x01, 0x10, 0x00, 0x40, 0x00, 0x00, 0x00];
        let mut parser = Parser::new(&bytes);
        let header = ChunkHeader::read(&mut parser).unwrap();
        assert_eq!(header.kind, RES_XML_START_ELEMENT_TYPE);
        assert_eq!(header.header_size, 16);
        assert_eq!(header.size, 64);
    }

    #[test]
    fn chunk_header_rejects_inconsistent_sizes() {
        // header_size 32 but total size 8
        let bytes = [0x01, 0x00, 0x20, 0x00, 0x08, 0x00, 0x00, 0x00];
        let mut parser = Parser::new(&bytes);
        assert!(ChunkHeader::read(&mut parser).is_err());
    }

    #[test]
    fn typed_value_interpretations() {
        let int = TypedValue {
            data_type: value_type::INT_DEC,
            data: 21,
        };
        assert_eq!(int.as_int(), Some(21));
        assert_eq!(int.as_string_index(), None);

        let string = TypedValue {
            data_type: value_type::STRING,
            data: 3,
        };
        assert_eq!(string.as_string_index(), Some(3));
        assert_eq!(string.as_int(), None);

        let flag = TypedValue {
            data_type: value_type::BOOLEAN,
            data: 0xFFFF_FFFF,
        };
        assert_eq!(flag.as_bool(), Some(true));

        let reference = TypedValue {
            data_type: value_type::REFERENCE,
            data: 0x7F01_0001,
        };
        assert_eq!(reference.as_int(), None);
        assert_eq!(reference.as_bool(), None);
    }
}
