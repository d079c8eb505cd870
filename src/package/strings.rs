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

//! Embedded string extraction.
//!
//! Every entry's uncompressed bytes are scanned for runs of printable ASCII
//! (0x20 through 0x7E) of a configurable minimum length. Entries scan in
//! parallel, the per-entry results land in one deduplicated, sorted set. An
//! entry that fails to extract is skipped with a warning; a damaged resource
//! should not cost the strings of every other entry.

use std::collections::BTreeSet;

use log::warn;
use rayon::prelude::*;

use crate::package::Package;

/// Default minimum run length, matching the common `strings(1)` floor for
/// meaningful output.
pub const DEFAULT_MIN_LENGTH: usize = 5;

/// Collects printable-ASCII runs of at least `min_length` bytes from `data`.
#[must_use]
pub fn scan_bytes(data: &[u8], min_length: usize) -> Vec<String> {
    let mut found = Vec::new();
    let mut run_start = None;

    for (index, &byte) in data.iter().enumerate() {
        if (0x20..=0x7E).contains(&byte) {
            run_start.get_or_insert(index);
            continue;
        }
        if let Some(start) = run_start.take() {
            if index - start >= min_length {
                found.push(String::from_utf8_lossy(&data[start..index]).into_owned());
            }
        }
    }
    if let Some(start) = run_start {
        if data.len() - start >= min_length {
            found.push(String::from_utf8_lossy(&data[start..]).into_owned());
        }
    }

    found
}

/// Extracts the deduplicated, sorted string set of the whole package.
pub(crate) fn extract(package: &Package, min_length: usize) -> Vec<String> {
    let names: Vec<String> = package
        .entries()
        .iter()
        .map(|entry| entry.name.clone())
        .collect();

    let found: BTreeSet<String> = names
        .par_iter()
        .filter_map(|name| match package.read(name) {
            Ok(data) => Some(scan_bytes(&data, min_length)),
            Err(err) => {
                warn!("Skipping unreadable entry `{name}` during string scan: {err}");
                None
            }
        })
        .flatten()
        .collect();

    found.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_runs_of_minimum_length() {
        let data = b"\x00hello\x01hi\x02world!\xFF";
        assert_eq!(scan_bytes(data, 5), vec!["hello", "world!"]);
    }

    #[test]
    fn run_at_end_of_data_is_kept() {
        assert_eq!(scan_bytes(b"\x00trailing", 5), vec!["trailing"]);
    }

    #[test]
    fn shorter_minimum_admits_shorter_runs() {
        let data = b"\x00hi\x01ok\x02";
        assert_eq!(scan_bytes(data, 2), vec!["hi", "ok"]);
        assert!(scan_bytes(data, 3).is_empty());
    }

    #[test]
    fn boundary_bytes_are_printable() {
        // 0x20 (space) and 0x7E (tilde) count, 0x1F and 0x7F terminate.
        assert_eq!(scan_bytes(b"\x1F ab~\x7F", 4), vec![" ab~"]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(scan_bytes(&[], 5).is_empty());
    }
}
