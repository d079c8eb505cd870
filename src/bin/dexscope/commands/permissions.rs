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

use std::path::{Path, PathBuf};

use serde::Serialize;

use dexscope::report::{permissions_json, permissions_xml, write_report};

use crate::{app::GlobalOptions, commands::common::load_package, output::print_output};

#[derive(Debug, Serialize)]
struct PermissionsOutput {
    permissions: Vec<String>,
    json_report: PathBuf,
    xml_report: PathBuf,
}

/// `base.json`, keeping any extension `base` already has.
fn append_extension(base: &Path, extension: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

pub fn run(path: &Path, output: Option<&Path>, opts: &GlobalOptions) -> anyhow::Result<()> {
    let package = load_package(path)?;
    let manifest = package.manifest()?;
    let permissions: Vec<String> = manifest
        .permissions()
        .into_iter()
        .map(str::to_string)
        .collect();

    let base = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| path.with_extension("permissions"));
    let json_report = append_extension(&base, "json");
    let xml_report = append_extension(&base, "xml");
    write_report(&json_report, &permissions_json(&permissions)?)?;
    write_report(&xml_report, &permissions_xml(&permissions)?)?;

    let data = PermissionsOutput {
        permissions,
        json_report,
        xml_report,
    };
    print_output(&data, opts, |data| {
        if data.permissions.is_empty() {
            println!("No permissions requested.");
        } else {
            for permission in &data.permissions {
                println!("{permission}");
            }
        }
        println!(
            "Reports written to {} and {}",
            data.json_report.display(),
            data.xml_report.display()
        );
    })
}
