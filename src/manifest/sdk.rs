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

//! Android API level to marketing version mapping.

use serde::Serialize;

/// Marketing version names indexed by API level, starting at level 1.
const VERSIONS: &[&str] = &[
    "1.0",    // 1
    "1.1",    // 2
    "1.5",    // 3
    "1.6",    // 4
    "2.0",    // 5
    "2.0.1",  // 6
    "2.1",    // 7
    "2.2",    // 8
    "2.3",    // 9
    "2.3.3",  // 10
    "3.0",    // 11
    "3.1",    // 12
    "3.2",    // 13
    "4.0",    // 14
    "4.0.3",  // 15
    "4.1",    // 16
    "4.2",    // 17
    "4.3",    // 18
    "4.4",    // 19
    "4.4W",   // 20
    "5.0",    // 21
    "5.1",    // 22
    "6.0",    // 23
    "7.0",    // 24
    "7.1",    // 25
    "8.0",    // 26
    "8.1",    // 27
    "9",      // 28
    "10",     // 29
    "11",     // 30
    "12",     // 31
    "12L",    // 32
    "13",     // 33
    "14",     // 34
];

/// The API level a manifest without a `minSdkVersion` attribute targets.
pub const DEFAULT_MIN_SDK: u32 = 1;

/// Marketing version name for an API level, `"Unknown"` outside the table.
#[must_use]
pub fn version_name(api_level: u32) -> &'static str {
    usize::try_from(api_level)
        .ok()
        .and_then(|level| level.checked_sub(1))
        .and_then(|index| VERSIONS.get(index))
        .copied()
        .unwrap_or("Unknown")
}

/// The resolved minimum SDK requirement of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MinSdkReport {
    /// The declared (or defaulted) API level.
    pub api_level: u32,
    /// The matching marketing version name.
    pub version: &'static str,
}

impl MinSdkReport {
    /// Builds the report for an API level.
    #[must_use]
    pub fn new(api_level: u32) -> MinSdkReport {
        MinSdkReport {
            api_level,
            version: version_name(api_level),
        }
    }
}

impl std::fmt::Display for MinSdkReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "API {} (Android {})", self.api_level, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_levels_map_to_marketing_names() {
        assert_eq!(version_name(1), "1.0");
        assert_eq!(version_name(21), "5.0");
        assert_eq!(version_name(28), "9");
        assert_eq!(version_name(34), "14");
    }

    #[test]
    fn unknown_levels_fall_back() {
        assert_eq!(version_name(0), "Unknown");
        assert_eq!(version_name(99), "Unknown");
    }

    #[test]
    fn report_formats_both_parts() {
        let report = MinSdkReport::new(23);
        assert_eq!(report.to_string(), "API 23 (Android 6.0)");
    }
}
