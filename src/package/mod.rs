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

//! Application package container.
//!
//! [`Package`] is the entry point of the library: it opens an APK from disk
//! (memory-mapped) or from a byte buffer, parses the ZIP central directory
//! once, and exposes everything the extractors and the CFG pipeline consume —
//! per-entry reads, the DEX entry list, the binary manifest, native library
//! and embedded string scans, and whole-file digests.
//!
//! # Architecture
//!
//! The container layer owns no derived state: every artifact is computed from
//! entry reads on demand. Entry metadata is owned (copied out of the central
//! directory at open time), so nothing borrows the backing map beyond the
//! read calls themselves.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dexscope::Package;
//!
//! let package = Package::from_file("app.apk".as_ref())?;
//! println!("{} entries, native: {}", package.entries().len(), package.is_native());
//!
//! for name in package.dex_names() {
//!     let dex = package.read(&name)?;
//!     println!("{name}: {} bytes", dex.len());
//! }
//! # Ok::<(), dexscope::Error>(())
//! ```

mod digests;
mod natives;
mod strings;
mod zip;

use std::path::Path;

use log::debug;

use crate::{
    file::{Backend, Memory, Physical},
    manifest::Manifest,
    Result,
};

pub use digests::Digests;
pub use natives::NativeLibraries;
pub use strings::{scan_bytes, DEFAULT_MIN_LENGTH};
pub use zip::{Compression, ZipEntry};

/// The manifest's fixed name inside every APK.
pub const MANIFEST_NAME: &str = "AndroidManifest.xml";

/// An opened application package.
pub struct Package {
    backend: Box<dyn Backend>,
    entries: Vec<ZipEntry>,
}

impl Package {
    /// Opens a package from disk through a read-only memory mapping.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be opened or mapped, or when it
    /// is not a parseable ZIP archive.
    pub fn from_file(path: &Path) -> Result<Package> {
        Self::from_backend(Box::new(Physical::new(path)?))
    }

    /// Opens a package from an owned byte buffer.
    ///
    /// # Errors
    ///
    /// Returns an error when the buffer is not a parseable ZIP archive.
    pub fn from_mem(data: Vec<u8>) -> Result<Package> {
        Self::from_backend(Box::new(Memory::new(data)))
    }

    fn from_backend(backend: Box<dyn Backend>) -> Result<Package> {
        let entries = zip::parse_central_directory(backend.data())?;
        debug!("opened package with {} entries", entries.len());
        Ok(Package { backend, entries })
    }

    /// All central directory entries, in directory order.
    #[must_use]
    pub fn entries(&self) -> &[ZipEntry] {
        &self.entries
    }

    /// Looks up an entry by exact name.
    ///
    /// Archives may carry the same name more than once; the last central
    /// directory record wins, which is also what the platform's own extractor
    /// does.
    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&ZipEntry> {
        self.entries.iter().rev().find(|entry| entry.name == name)
    }

    /// Reads and decompresses one entry.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] when no such entry exists or its
    /// data fails to extract, and [`crate::Error::NotSupported`] for
    /// encrypted entries or unsupported compression methods.
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let Some(entry) = self.entry(name) else {
            return Err(malformed_error!("Package has no entry named `{}`", name));
        };
        zip::read_entry(self.backend.data(), entry)
    }

    /// Names of the package's DEX entries, `classes.dex` first and the
    /// `classes2.dex`, `classes3.dex`, ... multi-DEX tail in numeric order.
    #[must_use]
    pub fn dex_names(&self) -> Vec<String> {
        let mut numbered: Vec<(u32, &str)> = self
            .entries
            .iter()
            .filter_map(|entry| dex_ordinal(&entry.name).map(|n| (n, entry.name.as_str())))
            .collect();
        numbered.sort_unstable();
        numbered.dedup();
        numbered.into_iter().map(|(_, name)| name.to_string()).collect()
    }

    /// Parses the binary `AndroidManifest.xml`.
    ///
    /// # Errors
    ///
    /// Returns an error when the package has no manifest entry or the entry
    /// is not decodable binary XML.
    pub fn manifest(&self) -> Result<Manifest> {
        Manifest::parse(&self.read(MANIFEST_NAME)?)
    }

    /// Whole-file MD5 and SHA-1 digests.
    #[must_use]
    pub fn digests(&self) -> Digests {
        Digests::of(self.backend.data())
    }

    /// Scans entry names for packaged native code.
    #[must_use]
    pub fn native_libraries(&self) -> NativeLibraries {
        natives::scan(&self.entries)
    }

    /// Returns `true` when the package ships native code under `lib/`.
    #[must_use]
    pub fn is_native(&self) -> bool {
        self.native_libraries().is_native()
    }

    /// Extracts the deduplicated, sorted set of printable-ASCII strings of at
    /// least `min_length` bytes across every entry's uncompressed data.
    ///
    /// Entries that fail to extract are skipped, not fatal.
    #[must_use]
    pub fn strings(&self, min_length: usize) -> Vec<String> {
        strings::extract(self, min_length)
    }
}

/// Ordinal of a DEX entry name: 1 for `classes.dex`, N for `classesN.dex`.
fn dex_ordinal(name: &str) -> Option<u32> {
    let number = name.strip_prefix("classes")?.strip_suffix(".dex")?;
    if number.is_empty() {
        return Some(1);
    }
    // `classes1.dex` never exists alongside `classes.dex`; reject leading
    // zeros and ordinal 0 outright.
    if number.starts_with('0') {
        return None;
    }
    number.parse().ok().filter(|&n| n > 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::ZipBuilder;

    #[test]
    fn reads_entries_by_name() {
        let data = ZipBuilder::new()
            .stored("classes.dex", b"not really dex")
            .deflated("assets/data.txt", b"some asset payload worth deflating")
            .build();

        let package = Package::from_mem(data).unwrap();
        assert_eq!(package.entries().len(), 2);
        assert_eq!(package.read("classes.dex").unwrap(), b"not really dex");
        assert_eq!(
            package.read("assets/data.txt").unwrap(),
            b"some asset payload worth deflating"
        );
        assert!(package.read("missing").is_err());
    }

    #[test]
    fn duplicate_names_resolve_to_last_record() {
        let data = ZipBuilder::new()
            .stored("a.txt", b"first")
            .stored("a.txt", b"second")
            .build();

        let package = Package::from_mem(data).unwrap();
        assert_eq!(package.entries().len(), 2);
        assert_eq!(package.read("a.txt").unwrap(), b"second");
    }

    #[test]
    fn dex_names_in_numeric_order() {
        let data = ZipBuilder::new()
            .stored("classes10.dex", b"")
            .stored("classes.dex", b"")
            .stored("classes2.dex", b"")
            .stored("classesX.dex", b"")
            .stored("classes0.dex", b"")
            .stored("res/classes.dex", b"")
            .build();

        let package = Package::from_mem(data).unwrap();
        assert_eq!(
            package.dex_names(),
            vec!["classes.dex", "classes2.dex", "classes10.dex"]
        );
    }

    #[test]
    fn native_and_strings_surface_through_facade() {
        let data = ZipBuilder::new()
            .stored("lib/x86_64/libnative.so", b"\x7FELF and then padding")
            .stored("assets/a.bin", b"\x00embedded-marker\x00")
            .build();

        let package = Package::from_mem(data).unwrap();
        assert!(package.is_native());
        assert_eq!(package.native_libraries().libraries, vec!["libnative.so"]);
        assert!(package
            .strings(DEFAULT_MIN_LENGTH)
            .contains(&"embedded-marker".to_string()));
    }

    #[test]
    fn digests_are_stable_for_same_bytes() {
        let data = ZipBuilder::new().stored("a", b"x").build();
        let first = Package::from_mem(data.clone()).unwrap().digests();
        let second = Package::from_mem(data).unwrap().digests();
        assert_eq!(first, second);
        assert_eq!(first.md5.len(), 32);
        assert_eq!(first.sha1.len(), 40);
    }

    #[test]
    fn rejects_non_zip_input() {
        assert!(Package::from_mem(b"plainly not an archive".to_vec()).is_err());
        assert!(Package::from_mem(Vec::new()).is_err());
    }
}
