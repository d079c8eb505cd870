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

//! Package file digests.
//!
//! MD5 and SHA-1 of the whole package file, which is how analysis reports and
//! sample databases identify an APK. Both are identity fingerprints here, not
//! integrity guarantees.

use md5::Md5;
use serde::Serialize;
use sha1::{Digest, Sha1};

/// Hex digests of the package file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Digests {
    /// Lowercase hex MD5.
    pub md5: String,
    /// Lowercase hex SHA-1.
    pub sha1: String,
}

impl Digests {
    /// Computes both digests over `data`.
    #[must_use]
    pub fn of(data: &[u8]) -> Digests {
        Digests {
            md5: hex(&Md5::digest(data)),
            sha1: hex(&Sha1::digest(data)),
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}
