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
struct StringsOutput {
    strings: Vec<String>,
}

pub fn run(path: &Path, min_length: usize, opts: &GlobalOptions) -> anyhow::Result<()> {
    let package = load_package(path)?;
    let data = StringsOutput {
        strings: package.strings(min_length),
    };

    print_output(&data, opts, |data| {
        for string in &data.strings {
            println!("{string}");
        }
    })
}
