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

//! DEX file header parsing.
//!
//! This module defines the [`DexHeader`] struct, which represents the fixed 112-byte
//! header at the start of every `.dex` file. The header carries the format version,
//! integrity fields, and the offset/size pairs locating every identifier table and
//! the data section.
//!
//! # Reference
//! - [Dalvik Executable format](https://source.android.com/docs/core/runtime/dex-format)

use crate::{file::parser::Parser, Error::OutOfBounds, Result};

/// Size of the DEX header in bytes.
pub const HEADER_SIZE: u32 = 0x70;

/// Value of `endian_tag` for little-endian files (the only supported layout).
pub const ENDIAN_CONSTANT: u32 = 0x1234_5678;

/// Value of `endian_tag` for byte-swapped files.
pub const REVERSE_ENDIAN_CONSTANT: u32 = 0x7856_3412;

/// The fixed header at the start of a `.dex` file.
///
/// All multi-byte fields are little-endian. Offsets are absolute positions
/// from the start of the file; sizes count table entries, not bytes.
pub struct DexHeader {
    /// Magic bytes, `dex\n0xx\0` where `xx` are ASCII version digits
    pub magic: [u8; 8],
    /// Adler-32 checksum of the file contents after this field
    pub checksum: u32,
    /// SHA-1 digest of the file contents after this field
    pub signature: [u8; 20],
    /// Size of the entire file in bytes
    pub file_size: u32,
    /// Size of this header, always 0x70
    pub header_size: u32,
    /// Endianness tag, [`ENDIAN_CONSTANT`] for supported files
    pub endian_tag: u32,
    /// Size of the link section, 0 for unlinked files
    pub link_size: u32,
    /// Offset of the link section
    pub link_off: u32,
    /// Offset of the map list in the data section
    pub map_off: u32,
    /// Number of entries in the string identifiers table
    pub string_ids_size: u32,
    /// Offset of the string identifiers table
    pub string_ids_off: u32,
    /// Number of entries in the type identifiers table
    pub type_ids_size: u32,
    /// Offset of the type identifiers table
    pub type_ids_off: u32,
    /// Number of entries in the prototype identifiers table
    pub proto_ids_size: u32,
    /// Offset of the prototype identifiers table
    pub proto_ids_off: u32,
    /// Number of entries in the field identifiers table
    pub field_ids_size: u32,
    /// Offset of the field identifiers table
    pub field_ids_off: u32,
    /// Number of entries in the method identifiers table
    pub method_ids_size: u32,
    /// Offset of the method identifiers table
    pub method_ids_off: u32,
    /// Number of entries in the class definitions table
    pub class_defs_size: u32,
    /// Offset of the class definitions table
    pub class_defs_off: u32,
    /// Size of the data section in bytes
    pub data_size: u32,
    /// Offset of the data section
    pub data_off: u32,
}

impl DexHeader {
    /// Parse a `DexHeader` from the start of a byte slice.
    ///
    /// # Arguments
    /// * `data` - The full contents of the `.dex` file
    ///
    /// # Errors
    /// Returns an error if the data is too short, the magic bytes are not a
    /// recognized DEX signature, or the endian tag is invalid. Byte-swapped
    /// files ([`REVERSE_ENDIAN_CONSTANT`]) are rejected with
    /// [`Error::NotSupported`](crate::Error::NotSupported).
    pub fn read(data: &[u8]) -> Result<DexHeader> {
        if data.len() < HEADER_SIZE as usize {
            return Err(OutOfBounds);
        }

        let mut parser = Parser::new(data);

        let mut magic = [0u8; 8];
        magic.copy_from_slice(parser.read_bytes(8)?);

        if &magic[0..4] != b"dex\n" || magic[7] != 0 {
            return Err(malformed_error!("Invalid DEX magic: {:02X?}", magic));
        }
        if !magic[4..7].iter().all(u8::is_ascii_digit) {
            return Err(malformed_error!(
                "Invalid DEX version digits: {:02X?}",
                &magic[4..7]
            ));
        }

        let checksum = parser.read_le::<u32>()?;

        let mut signature = [0u8; 20];
        signature.copy_from_slice(parser.read_bytes(20)?);

        let file_size = parser.read_le::<u32>()?;

        let header_size = parser.read_le::<u32>()?;
        if header_size != HEADER_SIZE {
            return Err(malformed_error!(
                "Invalid DEX header size: expected 0x70, got 0x{:X}",
                header_size
            ));
        }

        let endian_tag = parser.read_le::<u32>()?;
        match endian_tag {
            ENDIAN_CONSTANT => {}
            REVERSE_ENDIAN_CONSTANT => return Err(crate::Error::NotSupported),
            _ => {
                return Err(malformed_error!(
                    "Invalid DEX endian tag: 0x{:08X}",
                    endian_tag
                ))
            }
        }

        Ok(DexHeader {
            magic,
            checksum,
            signature,
            file_size,
            header_size,
            endian_tag,
            link_size: parser.read_le::<u32>()?,
            link_off: parser.read_le::<u32>()?,
            map_off: parser.read_le::<u32>()?,
            string_ids_size: parser.read_le::<u32>()?,
            string_ids_off: parser.read_le::<u32>()?,
            type_ids_size: parser.read_le::<u32>()?,
            type_ids_off: parser.read_le::<u32>()?,
            proto_ids_size: parser.read_le::<u32>()?,
            proto_ids_off: parser.read_le::<u32>()?,
            field_ids_size: parser.read_le::<u32>()?,
            field_ids_off: parser.read_le::<u32>()?,
            method_ids_size: parser.read_le::<u32>()?,
            method_ids_off: parser.read_le::<u32>()?,
            class_defs_size: parser.read_le::<u32>()?,
            class_defs_off: parser.read_le::<u32>()?,
            data_size: parser.read_le::<u32>()?,
            data_off: parser.read_le::<u32>()?,
        })
    }

    /// The format version encoded in the magic bytes, e.g. `35` for `dex\n035\0`.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.magic[4..7]
            .iter()
            .fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_header_bytes() -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE as usize);
        bytes.extend_from_slice(b"dex\n035\0");
        bytes.extend_from_slice(&0xDEAD_BEEF_u32.to_le_bytes()); // checksum
        bytes.extend_from_slice(&[0xAB; 20]); // signature
        bytes.extend_from_slice(&0x70_u32.to_le_bytes()); // file_size
        bytes.extend_from_slice(&0x70_u32.to_le_bytes()); // header_size
        bytes.extend_from_slice(&ENDIAN_CONSTANT.to_le_bytes());
        // link_size .. data_off, 17 fields counting up
        for value in 1_u32..=17 {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn crafted() {
        let bytes = valid_header_bytes();
        let header = DexHeader::read(&bytes).unwrap();

        assert_eq!(&header.magic, b"dex\n035\0");
        assert_eq!(header.version(), 35);
        assert_eq!(header.checksum, 0xDEAD_BEEF);
        assert_eq!(header.signature, [0xAB; 20]);
        assert_eq!(header.file_size, 0x70);
        assert_eq!(header.header_size, 0x70);
        assert_eq!(header.endian_tag, ENDIAN_CONSTANT);
        assert_eq!(header.link_size, 1);
        assert_eq!(header.map_off, 3);
        assert_eq!(header.string_ids_size, 4);
        assert_eq!(header.string_ids_off, 5);
        assert_eq!(header.type_ids_size, 6);
        assert_eq!(header.class_defs_size, 14);
        assert_eq!(header.class_defs_off, 15);
        assert_eq!(header.data_size, 16);
        assert_eq!(header.data_off, 17);
    }

    #[test]
    fn version_039() {
        let mut bytes = valid_header_bytes();
        bytes[4..7].copy_from_slice(b"039");

        let header = DexHeader::read(&bytes).unwrap();
        assert_eq!(header.version(), 39);
    }

    #[test]
    fn too_short() {
        if DexHeader::read(&[0u8; 0x6F]).is_ok() {
            panic!("This should not work!");
        }
    }

    #[test]
    fn bad_magic() {
        let mut bytes = valid_header_bytes();
        bytes[0] = b'D';

        if DexHeader::read(&bytes).is_ok() {
            panic!("This should not work!");
        }
    }

    #[test]
    fn bad_version_digits() {
        let mut bytes = valid_header_bytes();
        bytes[5] = b'x';

        if DexHeader::read(&bytes).is_ok() {
            panic!("This should not work!");
        }
    }

    #[test]
    fn reverse_endian_rejected() {
        let mut bytes = valid_header_bytes();
        bytes[40..44].copy_from_slice(&REVERSE_ENDIAN_CONSTANT.to_le_bytes());

        match DexHeader::read(&bytes) {
            Err(crate::Error::NotSupported) => {}
            _ => panic!("This should not work!"),
        }
    }

    #[test]
    fn bad_header_size() {
        let mut bytes = valid_header_bytes();
        bytes[36..40].copy_from_slice(&0x80_u32.to_le_bytes());

        if DexHeader::read(&bytes).is_ok() {
            panic!("This should not work!");
        }
    }
}
