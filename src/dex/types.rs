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

//! Type and prototype identifier tables.
//!
//! A `type_id_item` is a single index into the string pool naming a descriptor
//! such as `Lcom/example/Main;` or `[I`. A `proto_id_item` describes a method
//! prototype: shorty string, return type, and an optional `type_list` of
//! parameter types in the data section.

use super::table_parser;
use crate::{file::parser::Parser, Result};

/// A method prototype entry from the `proto_ids` table.
///
/// The on-disk item also carries a shorty string index; descriptors are built
/// from the full type indices instead, so it is not retained.
pub(crate) struct ProtoId {
    /// Index into `type_ids` for the return type
    pub(crate) return_type_idx: u32,
    /// Offset of the parameter `type_list`, 0 when the method takes none
    pub(crate) parameters_off: u32,
}

/// Read the `type_ids` table: `count` string pool indices starting at `offset`.
pub(crate) fn parse_type_ids(data: &[u8], offset: u32, count: u32) -> Result<Vec<u32>> {
    let mut parser = table_parser(data, offset, count, 4)?;

    let mut ids = Vec::with_capacity(count as usize);
    for _ in 0..count {
        ids.push(parser.read_le::<u32>()?);
    }
    Ok(ids)
}

/// Read the `proto_ids` table of 12-byte prototype entries.
pub(crate) fn parse_proto_ids(data: &[u8], offset: u32, count: u32) -> Result<Vec<ProtoId>> {
    let mut parser = table_parser(data, offset, count, 12)?;

    let mut protos = Vec::with_capacity(count as usize);
    for _ in 0..count {
        parser.advance_by(4)?; // shorty_idx
        protos.push(ProtoId {
            return_type_idx: parser.read_le::<u32>()?,
            parameters_off: parser.read_le::<u32>()?,
        });
    }
    Ok(protos)
}

/// Read a `type_list` at `offset`: a `u32` entry count followed by that many
/// `u16` type indices. An offset of zero denotes an absent list and yields no
/// entries.
pub(crate) fn parse_type_list(data: &[u8], offset: u32) -> Result<Vec<u16>> {
    if offset == 0 {
        return Ok(Vec::new());
    }

    let mut parser = Parser::new(data);
    parser.seek(offset as usize)?;

    let size = parser.read_le::<u32>()?;
    if u64::from(size) * 2 > (parser.len() - parser.pos()) as u64 {
        return Err(malformed_error!(
            "Type list at 0x{:X} with {} entries exceeds file size",
            offset,
            size
        ));
    }

    let mut entries = Vec::with_capacity(size as usize);
    for _ in 0..size {
        entries.push(parser.read_le::<u16>()?);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_ids() {
        let mut data = vec![0xFF; 4]; // table at offset 4
        data.extend_from_slice(&7u32.to_le_bytes());
        data.extend_from_slice(&9u32.to_le_bytes());

        let ids = parse_type_ids(&data, 4, 2).unwrap();
        assert_eq!(ids, vec![7, 9]);
    }

    #[test]
    fn type_ids_out_of_bounds() {
        if parse_type_ids(&[0u8; 8], 4, 2).is_ok() {
            panic!("This should not work!");
        }
    }

    #[test]
    fn proto_ids() {
        let mut data = vec![];
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&0x40u32.to_le_bytes());

        let protos = parse_proto_ids(&data, 0, 1).unwrap();
        assert_eq!(protos.len(), 1);
        assert_eq!(protos[0].return_type_idx, 2);
        assert_eq!(protos[0].parameters_off, 0x40);
    }

    #[test]
    fn type_list() {
        let mut data = vec![0xFF; 8];
        data.extend_from_slice(&3u32.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&2u16.to_le_bytes());
        data.extend_from_slice(&3u16.to_le_bytes());

        let entries = parse_type_list(&data, 8).unwrap();
        assert_eq!(entries, vec![1, 2, 3]);
    }

    #[test]
    fn type_list_absent() {
        assert!(parse_type_list(&[], 0).unwrap().is_empty());
    }

    #[test]
    fn type_list_truncated() {
        let mut data = vec![0xFF; 4]; // offset 0 means "no list", so pad past it
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());

        if parse_type_list(&data, 4).is_ok() {
            panic!("This should not work!");
        }
    }
}
