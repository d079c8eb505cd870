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

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// dexscope - Android package auditing: manifests, bytecode, control-flow graphs
#[derive(Debug, Parser)]
#[command(name = "dexscope", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Display package overview: digests, DEX files, native code, manifest counts.
    Info {
        /// Path to the application package.
        #[arg(value_name = "APK")]
        path: PathBuf,
    },

    /// Build the whole-package control flow graph and export it.
    Cfg {
        /// Path to the application package.
        #[arg(value_name = "APK")]
        path: PathBuf,

        /// Output format: dot, graphml, json.
        #[arg(long, default_value = "dot")]
        format: String,

        /// Write to a file instead of stdout.
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Extract requested permissions and write JSON + XML reports.
    Permissions {
        /// Path to the application package.
        #[arg(value_name = "APK")]
        path: PathBuf,

        /// Base path for the report files (default: next to the package).
        #[arg(short, long, value_name = "BASE")]
        output: Option<PathBuf>,
    },

    /// List bundled native libraries and their ABIs.
    Libs {
        /// Path to the application package.
        #[arg(value_name = "APK")]
        path: PathBuf,
    },

    /// Extract printable strings from every package entry.
    Strings {
        /// Path to the application package.
        #[arg(value_name = "APK")]
        path: PathBuf,

        /// Minimum run length to report.
        #[arg(long, value_name = "N", default_value_t = dexscope::package::DEFAULT_MIN_LENGTH)]
        min_length: usize,
    },

    /// Show the minimum SDK requirement declared by the manifest.
    Minsdk {
        /// Path to the application package.
        #[arg(value_name = "APK")]
        path: PathBuf,
    },
}
