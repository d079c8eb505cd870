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

mod app;
mod commands;
mod output;

use clap::Parser;

use crate::app::{Cli, Command};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Show dexscope info+ on stderr unless --json; --verbose enables debug; RUST_LOG overrides
    if !cli.global.json {
        let level = if cli.global.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        env_logger::Builder::new()
            .filter_module("dexscope", level)
            .parse_default_env()
            .target(env_logger::Target::Stderr)
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(false)
            .init();
    }

    match &cli.command {
        Command::Info { path } => commands::info::run(path, &cli.global),
        Command::Cfg {
            path,
            format,
            output,
        } => commands::cfg::run(path, format, output.as_deref()),
        Command::Permissions { path, output } => {
            commands::permissions::run(path, output.as_deref(), &cli.global)
        }
        Command::Libs { path } => commands::libs::run(path, &cli.global),
        Command::Strings { path, min_length } => {
            commands::strings::run(path, *min_length, &cli.global)
        }
        Command::Minsdk { path } => commands::minsdk::run(path, &cli.global),
    }
}
