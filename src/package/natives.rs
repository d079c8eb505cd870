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

//! Native library enumeration.
//!
//! Packaged native code lives under `lib/<abi>/`, one subdirectory per
//! supported ABI (`arm64-v8a`, `armeabi-v7a`, `x86_64`, ...), with the same
//! `.so` basenames repeated per ABI. The report deduplicates to the sorted
//! basename set and records which ABIs ship code; its presence at all is the
//! NDK check.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::package::zip::ZipEntry;

/// The native code shipped by a package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NativeLibraries {
    /// Unique shared object basenames across all ABIs, sorted.
    pub libraries: Vec<String>,
    /// ABIs that ship at least one library, sorted.
    pub abis: Vec<String>,
}

impl NativeLibraries {
    /// Returns `true` when the package ships any native code.
    #[must_use]
    pub fn is_native(&self) -> bool {
        !self.libraries.is_empty()
    }
}

/// Scans entry names for `lib/<abi>/*.so` and collects the report.
pub(crate) fn scan(entries: &[ZipEntry]) -> NativeLibraries {
    let mut libraries = BTreeSet::new();
    let mut abis = BTreeSet::new();

    for entry in entries {
        let Some(rest) = entry.name.strip_prefix("lib/") else {
            continue;
        };
        let Some((abi, path)) = rest.split_once('/') else {
            continue;
        };
        if abi.is_empty() || !path.ends_with(".so") {
            continue;
        }
        let basename = path.rsplit('/').next().unwrap_or(path);
        libraries.insert(basename.to_string());
        abis.insert(abi.to_string());
    }

    NativeLibraries {
        libraries: libraries.into_iter().collect(),
        abis: abis.into_iter().collect(),
    }
}
