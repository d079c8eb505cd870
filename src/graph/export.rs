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

//! Exchange file writers with the two-step GraphML pipeline.
//!
//! [`write_dot`] is a direct export: DOT carries composite values as their
//! JSON text, so there is nothing to fall back to and any failure is the
//! caller's problem. [`write_graphml`] runs the two-step pipeline: one direct
//! attempt, and if the graph carries attributes GraphML cannot represent, one
//! retry against a normalized copy. Each attempt produces a typed
//! [`GraphmlOutcome`] rather than steering control flow through errors, and
//! the function reports plain success or failure without panicking.
//!
//! Both writers serialize into memory first and then go through
//! [`atomic_write`]: the bytes land in a temporary file next to the
//! destination and are renamed into place, so a crash or I/O failure never
//! leaves a partially-written exchange file behind.

use std::fs;
use std::io;
use std::path::Path;

use log::{debug, warn};

use crate::graph::digraph::AttrGraph;
use crate::graph::{dot, graphml, normalize};
use crate::{Error, Result};

/// Outcome of a single direct GraphML write attempt.
#[derive(Debug)]
pub enum GraphmlOutcome {
    /// The graph was written as-is.
    Ok,
    /// An attribute is not representable in GraphML; the payload names it.
    /// Normalizing the graph and retrying is expected to succeed.
    NeedsNormalization(String),
    /// The attempt failed; retrying without intervention will not help.
    Failed(Error),
}

/// Writes `graph` as DOT text to `path`.
///
/// Composite attribute values are rendered as canonical JSON, so no
/// normalization pass exists for DOT; an I/O failure is returned as-is.
pub fn write_dot(graph: &AttrGraph, path: impl AsRef<Path>) -> Result<()> {
    atomic_write(path.as_ref(), dot::to_dot(graph).as_bytes())
}

/// Writes `graph` as pretty-printed JSON (`nodes` / `edges` arrays) to `path`.
pub fn write_json(graph: &AttrGraph, path: impl AsRef<Path>) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(&graph.to_json())?;
    atomic_write(path.as_ref(), &bytes)
}

/// Makes one direct GraphML write attempt without any fallback.
///
/// The representability check runs before any I/O, so a graph that needs
/// normalization is reported without touching the filesystem.
pub fn try_write_graphml(graph: &AttrGraph, path: &Path) -> GraphmlOutcome {
    if let Some(reason) = graphml::first_unrepresentable(graph) {
        return GraphmlOutcome::NeedsNormalization(reason);
    }
    let mut buffer = Vec::new();
    if let Err(err) = graphml::write_graphml_to(graph, &mut buffer) {
        return GraphmlOutcome::Failed(err);
    }
    match atomic_write(path, &buffer) {
        Ok(()) => GraphmlOutcome::Ok,
        Err(err) => GraphmlOutcome::Failed(err),
    }
}

/// Writes `graph` as GraphML to `path`, normalizing a copy and retrying once
/// if the direct attempt is blocked by composite attributes.
///
/// Returns `true` when a well-formed file was written. On failure the
/// destination is left untouched, the cause is logged and `false` comes back;
/// this function never panics on export problems.
pub fn write_graphml(graph: &AttrGraph, path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    match try_write_graphml(graph, path) {
        GraphmlOutcome::Ok => true,
        GraphmlOutcome::NeedsNormalization(reason) => {
            debug!("direct GraphML export blocked by {reason}, retrying with a normalized copy");
            match try_write_graphml(&normalize::normalize(graph), path) {
                GraphmlOutcome::Ok => true,
                GraphmlOutcome::NeedsNormalization(reason) => {
                    warn!("GraphML export failed: {reason} survived normalization");
                    false
                }
                GraphmlOutcome::Failed(err) => {
                    warn!("GraphML export of {} failed: {err}", path.display());
                    false
                }
            }
        }
        GraphmlOutcome::Failed(err) => {
            warn!("GraphML export of {} failed: {err}", path.display());
            false
        }
    }
}

/// Writes `bytes` to `path` through a temporary file in the same directory,
/// renaming into place on success.
pub(crate) fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path.file_name().ok_or_else(|| {
        Error::FileError(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("`{}` has no file name", path.display()),
        ))
    })?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = directory.join(format!(
        ".{}.tmp{}",
        file_name.to_string_lossy(),
        std::process::id()
    ));

    let outcome = fs::write(&tmp, bytes).and_then(|()| fs::rename(&tmp, path));
    if outcome.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    outcome.map_err(Error::from)
}
