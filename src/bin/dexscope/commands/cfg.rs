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

use anyhow::bail;
use dexscope::{
    analysis::cfg_from_package,
    graph::{
        first_unrepresentable, normalize, write_dot, write_graphml, write_graphml_to, write_json,
        AttrGraph,
    },
};

use crate::commands::common::load_package;

pub fn run(path: &Path, format: &str, output: Option<&Path>) -> anyhow::Result<()> {
    let package = load_package(path)?;

    let Some(graph) = cfg_from_package(&package)? else {
        println!("No CFG data.");
        return Ok(());
    };

    match output {
        Some(output) => write_to_file(&graph, format, output),
        None => write_to_stdout(&graph, format),
    }
}

fn write_to_file(graph: &AttrGraph, format: &str, output: &Path) -> anyhow::Result<()> {
    match format {
        "dot" => write_dot(graph, output)?,
        "json" => write_json(graph, output)?,
        "graphml" => {
            if !write_graphml(graph, output) {
                bail!("GraphML export to {} failed", output.display());
            }
        }
        other => bail!("unknown format: {other} (expected dot, graphml, or json)"),
    }
    println!(
        "Wrote {} nodes / {} edges to {}",
        graph.node_count(),
        graph.edge_count(),
        output.display()
    );
    Ok(())
}

fn write_to_stdout(graph: &AttrGraph, format: &str) -> anyhow::Result<()> {
    match format {
        "dot" => print!("{}", dexscope::graph::to_dot(graph)),
        "json" => println!("{}", serde_json::to_string_pretty(&graph.to_json())?),
        "graphml" => {
            // Same normalize-and-retry policy as the file path, minus the
            // temp file.
            let mut buffer = Vec::new();
            if first_unrepresentable(graph).is_some() {
                write_graphml_to(&normalize(graph), &mut buffer)?;
            } else {
                write_graphml_to(graph, &mut buffer)?;
            }
            print!("{}", String::from_utf8_lossy(&buffer));
        }
        other => bail!("unknown format: {other} (expected dot, graphml, or json)"),
    }
    Ok(())
}
