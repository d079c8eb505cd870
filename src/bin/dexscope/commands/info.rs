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

use std::path::Path;

use serde::Serialize;

use crate::{app::GlobalOptions, commands::common::load_package, output::print_output};

#[derive(Debug, Serialize)]
pub struct PackageInfo {
    pub md5: String,
    pub sha1: String,
    pub entry_count: usize,
    pub dex_files: Vec<String>,
    pub is_native: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_sdk: Option<String>,
    pub permission_count: usize,
}

pub fn run(path: &Path, opts: &GlobalOptions) -> anyhow::Result<()> {
    let package = load_package(path)?;
    let digests = package.digests();

    // An unreadable manifest degrades the summary instead of failing it.
    let manifest = package.manifest().ok();
    let info = PackageInfo {
        md5: digests.md5,
        sha1: digests.sha1,
        entry_count: package.entries().len(),
        dex_files: package.dex_names(),
        is_native: package.is_native(),
        package_name: manifest
            .as_ref()
            .and_then(|manifest| manifest.package_name().map(str::to_string)),
        min_sdk: manifest
            .as_ref()
            .map(|manifest| manifest.min_sdk().to_string()),
        permission_count: manifest
            .as_ref()
            .map_or(0, |manifest| manifest.permissions().len()),
    };

    print_output(&info, opts, |info| {
        println!("MD5:         {}", info.md5);
        println!("SHA1:        {}", info.sha1);
        println!("Entries:     {}", info.entry_count);
        println!("DEX files:   {}", info.dex_files.join(", "));
        println!("Native code: {}", if info.is_native { "yes" } else { "no" });
        if let Some(name) = &info.package_name {
            println!("Package:     {name}");
        }
        if let Some(min_sdk) = &info.min_sdk {
            println!("Min SDK:     {min_sdk}");
        }
        println!("Permissions: {}", info.permission_count);
    })
}
