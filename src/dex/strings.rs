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

//! String identifier table and MUTF-8 decoding.
//!
//! DEX stores strings in Modified UTF-8: a `string_id_item` is an offset into the
//! data section, where a ULEB128 length in UTF-16 code units is followed by the
//! encoded units and a NUL terminator. The encoding differs from standard UTF-8 in
//! two ways: `U+0000` appears as the two-byte sequence `C0 80`, and supplementary
//! characters are stored as CESU-8 surrogate pairs (two three-byte units). Decoding
//! therefore goes through UTF-16 code units; unpaired surrogates degrade to the
//! replacement character rather than failing the whole pool.
//!
//! # Reference
//! - [Dalvik Executable format, `string_data_item`](https://source.android.com/docs/core/runtime/dex-format#string-data-item)

use super::table_parser;
use crate::{file::parser::Parser, Result};

/// All strings of a single DEX file, decoded eagerly in table order.
///
/// Lookups by `string_idx` are plain vector indexing afterwards, which keeps the
/// hot disassembly path (every `const-string`, field and method reference goes
/// through here) free of repeated decoding work.
pub(crate) struct StringPool {
    strings: Vec<String>,
}

impl StringPool {
    /// Decode `count` strings whose id table starts at `offset`.
    ///
    /// # Errors
    /// Returns an error if the id table or any `string_data_item` lies outside
    /// `data`, or if a string contains invalid MUTF-8 byte sequences.
    pub(crate) fn parse(data: &[u8], offset: u32, count: u32) -> Result<StringPool> {
        let mut ids = table_parser(data, offset, count, 4)?;

        let mut strings = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let data_off = ids.read_le::<u32>()?;

            let mut item = Parser::new(data);
            item.seek(data_off as usize)?;
            strings.push(decode_mutf8(&mut item)?);
        }

        Ok(StringPool { strings })
    }

    /// Look up a decoded string by `string_idx`.
    #[must_use]
    pub(crate) fn get(&self, index: u32) -> Option<&str> {
        self.strings.get(index as usize).map(String::as_str)
    }

    /// Number of strings in the pool.
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.strings.len()
    }
}

/// Decode a single `string_data_item` at the parser's current position.
fn decode_mutf8(parser: &mut Parser) -> Result<String> {
    let utf16_size = parser.read_uleb128()? as usize;

    // Every code unit occupies at least one byte, so a size beyond the remaining
    // data can never decode. Checking up front also bounds the allocation below.
    if utf16_size > parser.len() - parser.pos() {
        return Err(malformed_error!(
            "MUTF-8 length {} exceeds remaining data",
            utf16_size
        ));
    }

    let mut units = Vec::with_capacity(utf16_size);
    for _ in 0..utf16_size {
        let lead = parser.read_le::<u8>()?;
        let unit = match lead {
            0x01..=0x7F => u16::from(lead),
            0x00 => return Err(malformed_error!("Premature NUL byte in MUTF-8 data")),
            _ if lead & 0xE0 == 0xC0 => {
                let b2 = parser.read_le::<u8>()?;
                if b2 & 0xC0 != 0x80 {
                    return Err(malformed_error!(
                        "Invalid MUTF-8 continuation byte: 0x{:02X}",
                        b2
                    ));
                }
                (u16::from(lead & 0x1F) << 6) | u16::from(b2 & 0x3F)
            }
            _ if lead & 0xF0 == 0xE0 => {
                let b2 = parser.read_le::<u8>()?;
                let b3 = parser.read_le::<u8>()?;
                if b2 & 0xC0 != 0x80 || b3 & 0xC0 != 0x80 {
                    return Err(malformed_error!(
                        "Invalid MUTF-8 continuation bytes: 0x{:02X} 0x{:02X}",
                        b2,
                        b3
                    ));
                }
                (u16::from(lead & 0x0F) << 12)
                    | (u16::from(b2 & 0x3F) << 6)
                    | u16::from(b3 & 0x3F)
            }
            _ => {
                return Err(malformed_error!(
                    "Invalid MUTF-8 lead byte: 0x{:02X}",
                    lead
                ))
            }
        };
        units.push(unit);
    }

    if parser.read_le::<u8>()? != 0 {
        return Err(malformed_error!("Missing NUL terminator in MUTF-8 data"));
    }

    Ok(String::from_utf16_lossy(&units))
}
