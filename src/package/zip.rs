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

//! ZIP central directory parsing and entry extraction.
//!
//! APKs are ZIP archives, and the subset that matters here is small: locate
//! the end-of-central-directory record by scanning backwards (the record may
//! be followed by an archive comment of up to 64 KiB), walk the central
//! directory for entry metadata, and extract entries stored raw or with
//! DEFLATE. The local file headers are only consulted at extraction time to
//! find where an entry's data actually begins, since their name and extra
//! field lengths can differ from the central directory's.
//!
//! Anything beyond that — encryption, other compression methods, ZIP64 — is
//! rejected as [`crate::Error::NotSupported`].

use std::io::Read;

use flate2::read::DeflateDecoder;

use crate::{file::parser::Parser, Result};

/// `PK\x03\x04`, local file header.
const LOCAL_HEADER_SIG: u32 = 0x0403_4B50;
/// `PK\x01\x02`, central directory record.
const CENTRAL_DIR_SIG: u32 = 0x0201_4B50;
/// `PK\x05\x06`, end of central directory.
const EOCD_SIG: u32 = 0x0605_4B50;

/// Fixed part of the EOCD record, before the comment.
const EOCD_SIZE: usize = 22;
/// Maximum archive comment length, bounding the backward scan.
const MAX_COMMENT: usize = 0xFFFF;

/// How an entry's data is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Raw bytes, `compressed_size == uncompressed_size`.
    Stored,
    /// Raw DEFLATE stream.
    Deflate,
    /// Any method this library does not extract.
    Other(u16),
}

impl From<u16> for Compression {
    fn from(method: u16) -> Self {
        match method {
            0 => Compression::Stored,
            8 => Compression::Deflate,
            other => Compression::Other(other),
        }
    }
}

/// One central directory entry.
#[derive(Debug, Clone)]
pub struct ZipEntry {
    /// Entry name as stored, forward slashes, no leading slash.
    pub name: String,
    /// Storage method.
    pub method: Compression,
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Size of the stored data.
    pub compressed_size: u32,
    /// Size after decompression.
    pub uncompressed_size: u32,
    /// General purpose bit flags; bit 0 means the entry is encrypted.
    pub flags: u16,
    /// Offset of the entry's local file header.
    pub local_header_off: u32,
}

impl ZipEntry {
    /// Returns `true` when the entry is encrypted and cannot be read.
    #[must_use]
    pub const fn is_encrypted(&self) -> bool {
        self.flags & 0x1 != 0
    }
}

/// Parses the central directory of the archive in `data`.
///
/// Entries come back in central directory order, duplicates included; name
/// resolution policy (last record wins) is the caller's.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] when no EOCD record exists or the
/// directory lies outside the file, and [`crate::Error::Empty`] for empty
/// input.
pub fn parse_central_directory(data: &[u8]) -> Result<Vec<ZipEntry>> {
    if data.is_empty() {
        return Err(crate::Error::Empty);
    }
    let eocd = find_eocd(data)?;

    let mut parser = Parser::new(data);
    parser.seek(eocd)?;
    let _signature: u32 = parser.read_le()?;
    let _disk: u16 = parser.read_le()?;
    let _cd_disk: u16 = parser.read_le()?;
    let _disk_entries: u16 = parser.read_le()?;
    let total_entries: u16 = parser.read_le()?;
    let cd_size: u32 = parser.read_le()?;
    let cd_offset: u32 = parser.read_le()?;

    let cd_end = u64::from(cd_offset) + u64::from(cd_size);
    if cd_end > data.len() as u64 {
        return Err(malformed_error!(
            "Central directory at {:#x}+{:#x} exceeds file size",
            cd_offset,
            cd_size
        ));
    }

    let mut entries = Vec::with_capacity(usize::from(total_entries));
    parser.seek(cd_offset as usize)?;
    for _ in 0..total_entries {
        let signature: u32 = parser.read_le()?;
        if signature != CENTRAL_DIR_SIG {
            return Err(malformed_error!(
                "Expected central directory record, found {:#010x}",
                signature
            ));
        }
        let _version_made: u16 = parser.read_le()?;
        let _version_needed: u16 = parser.read_le()?;
        let flags: u16 = parser.read_le()?;
        let method: u16 = parser.read_le()?;
        let _mod_time: u16 = parser.read_le()?;
        let _mod_date: u16 = parser.read_le()?;
        let crc32: u32 = parser.read_le()?;
        let compressed_size: u32 = parser.read_le()?;
        let uncompressed_size: u32 = parser.read_le()?;
        let name_len: u16 = parser.read_le()?;
        let extra_len: u16 = parser.read_le()?;
        let comment_len: u16 = parser.read_le()?;
        let _disk_start: u16 = parser.read_le()?;
        let _internal_attrs: u16 = parser.read_le()?;
        let _external_attrs: u32 = parser.read_le()?;
        let local_header_off: u32 = parser.read_le()?;

        let name_bytes = parser.read_bytes(usize::from(name_len))?;
        let name = String::from_utf8_lossy(name_bytes).into_owned();
        parser.advance_by(usize::from(extra_len) + usize::from(comment_len))?;

        entries.push(ZipEntry {
            name,
            method: Compression::from(method),
            crc32,
            compressed_size,
            uncompressed_size,
            flags,
            local_header_off,
        });
    }

    Ok(entries)
}

/// Extracts the uncompressed bytes of `entry` from the archive in `data`.
///
/// # Errors
///
/// Returns [`crate::Error::NotSupported`] for encrypted entries and
/// compression methods other than stored and DEFLATE, and
/// [`crate::Error::Malformed`] when the local header does not match the
/// central directory or the stream fails to inflate.
pub fn read_entry(data: &[u8], entry: &ZipEntry) -> Result<Vec<u8>> {
    if entry.is_encrypted() {
        return Err(crate::Error::NotSupported);
    }

    let mut parser = Parser::new(data);
    parser.seek(entry.local_header_off as usize)?;
    let signature: u32 = parser.read_le()?;
    if signature != LOCAL_HEADER_SIG {
        return Err(malformed_error!(
            "Entry `{}` points at {:#x}, which is not a local file header",
            entry.name,
            entry.local_header_off
        ));
    }
    // Skip to the local header's own name and extra lengths; they override
    // the central directory when computing where the data starts.
    parser.advance_by(22)?;
    let name_len: u16 = parser.read_le()?;
    let extra_len: u16 = parser.read_le()?;
    parser.advance_by(usize::from(name_len) + usize::from(extra_len))?;

    let compressed = parser.read_bytes(entry.compressed_size as usize)?;
    match entry.method {
        Compression::Stored => Ok(compressed.to_vec()),
        Compression::Deflate => {
            let mut decoder = DeflateDecoder::new(compressed);
            let mut out = Vec::with_capacity(entry.uncompressed_size as usize);
            decoder.read_to_end(&mut out).map_err(|err| {
                malformed_error!("Entry `{}` failed to inflate: {}", entry.name, err)
            })?;
            Ok(out)
        }
        Compression::Other(_) => Err(crate::Error::NotSupported),
    }
}

/// Locates the EOCD record, tolerating a trailing archive comment.
fn find_eocd(data: &[u8]) -> Result<usize> {
    if data.len() < EOCD_SIZE {
        return Err(malformed_error!(
            "File of {} bytes is too small to be a ZIP archive",
            data.len()
        ));
    }
    let lowest = data.len().saturating_sub(EOCD_SIZE + MAX_COMMENT);
    let mut at = data.len() - EOCD_SIZE;
    loop {
        if u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]) == EOCD_SIG {
            return Ok(at);
        }
        if at == lowest {
            return Err(malformed_error!(
                "No end-of-central-directory record found"
            ));
        }
        at -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::ZipBuilder;

    #[test]
    fn parses_stored_entries() {
        let data = ZipBuilder::new()
            .stored("a.txt", b"alpha")
            .stored("dir/b.bin", &[0_u8, 1, 2, 3])
            .build();

        let entries = parse_central_directory(&data).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "a.txt");
        assert_eq!(entries[0].method, Compression::Stored);
        assert_eq!(entries[0].uncompressed_size, 5);
        assert_eq!(entries[1].name, "dir/b.bin");

        assert_eq!(read_entry(&data, &entries[0]).unwrap(), b"alpha");
        assert_eq!(read_entry(&data, &entries[1]).unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn parses_deflated_entries() {
        let payload = b"the quick brown fox jumps over the lazy dog, twice over \
                        the quick brown fox jumps over the lazy dog";
        let data = ZipBuilder::new().deflated("big.txt", payload).build();

        let entries = parse_central_directory(&data).unwrap();
        assert_eq!(entries[0].method, Compression::Deflate);
        assert!(entries[0].compressed_size < entries[0].uncompressed_size);
        assert_eq!(read_entry(&data, &entries[0]).unwrap(), payload);
    }

    #[test]
    fn tolerates_archive_comment() {
        let data = ZipBuilder::new()
            .stored("a.txt", b"alpha")
            .comment(b"built by a test")
            .build();

        let entries = parse_central_directory(&data).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(read_entry(&data, &entries[0]).unwrap(), b"alpha");
    }

    #[test]
    fn rejects_empty_and_garbage_input() {
        assert!(matches!(
            parse_central_directory(&[]),
            Err(crate::Error::Empty)
        ));
        assert!(parse_central_directory(&[0_u8; 64]).is_err());
        assert!(parse_central_directory(b"not a zip at all").is_err());
    }

    #[test]
    fn rejects_unsupported_method() {
        let data = ZipBuilder::new().stored("a.txt", b"alpha").build();
        let mut entry = parse_central_directory(&data).unwrap().remove(0);
        entry.method = Compression::Other(12); // bzip2
        assert!(matches!(
            read_entry(&data, &entry),
            Err(crate::Error::NotSupported)
        ));
    }

    #[test]
    fn rejects_encrypted_entry() {
        let data = ZipBuilder::new().stored("a.txt", b"alpha").build();
        let mut entry = parse_central_directory(&data).unwrap().remove(0);
        entry.flags |= 0x1;
        assert!(matches!(
            read_entry(&data, &entry),
            Err(crate::Error::NotSupported)
        ));
    }

    #[test]
    fn rejects_dangling_local_header_offset() {
        let data = ZipBuilder::new().stored("a.txt", b"alpha").build();
        let mut entry = parse_central_directory(&data).unwrap().remove(0);
        entry.local_header_off = data.len() as u32 - 4;
        assert!(read_entry(&data, &entry).is_err());
    }
}
