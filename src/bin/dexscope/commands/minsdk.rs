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

use crate::{app::GlobalOptions, commands::common::load_package, output::print_output};

pub fn run(path: &Path, opts: &GlobalOptions) -> anyhow::Result<()> {
    let package = load_package(path)?;
    let report = package.manifest()?.min_sdk();

    print_output(&report, opts, |report| println!("{report}"))
}
