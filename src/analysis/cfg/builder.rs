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

//! Graph construction over disassembled methods.
//!
//! The builder walks every method's blocks and appends them to an
//! [`AttrGraph`]: node attributes are `method`, `start` and `instructions`
//! (texts in address order), edge attribute is `branch_type`. Methods without
//! blocks are expected and contribute nothing; a build over nothing but empty
//! methods reports `None` so callers can tell "no CFG data" apart from a
//! graph that happens to be small.
//!
//! Exact duplicate edges collapse through [`AttrGraph::add_edge`]; parallel
//! edges between the same pair of blocks survive when their branch kinds
//! differ, which a switch falling through to its own case target produces
//! legitimately.

use log::{debug, warn};
use rayon::prelude::*;

use crate::{
    dex::{Dex, MethodSignature},
    disassembler::{decode_method, BasicBlock, Successor, SuccessorTarget},
    graph::{AttrGraph, AttrMap, AttrValue},
    package::Package,
    Result,
};

/// One method's contribution to the graph: its identity and decoded blocks.
#[derive(Debug, Clone)]
pub struct MethodBlocks {
    /// Full method identity, embedded into every node identifier.
    pub signature: MethodSignature,
    /// Decoded basic blocks in address order. May be empty for abstract and
    /// native methods.
    pub blocks: Vec<BasicBlock>,
}

/// Derives the node identifier for a block of `signature` starting at
/// `start_offset`.
///
/// The format is `{class}->{name}{descriptor}_bb_{start}`. The function is
/// pure: the same inputs always produce the same identifier, and two distinct
/// `(method, start)` pairs never produce the same one because the method
/// identity is embedded verbatim.
#[must_use]
pub fn block_id(signature: &MethodSignature, start_offset: i64) -> String {
    format!("{signature}_bb_{start_offset}")
}

/// Extracts the code-unit offset a successor edge lands on.
///
/// A resolved target yields the block start it was matched to; a raw target
/// yields the offset itself, as long as it is non-negative. A negative raw
/// offset cannot name any block and marks the edge as malformed input, so
/// `None` comes back and the caller drops the edge.
#[must_use]
pub fn target_offset(successor: &Successor) -> Option<i64> {
    match successor.target {
        SuccessorTarget::Resolved(offset) => Some(i64::from(offset)),
        SuccessorTarget::RawOffset(offset) if offset >= 0 => Some(offset),
        SuccessorTarget::RawOffset(_) => None,
    }
}

/// Appends one method's blocks and edges to `graph`.
fn add_method(graph: &mut AttrGraph, method: &MethodBlocks) {
    for block in &method.blocks {
        let id = block_id(&method.signature, i64::from(block.start_offset));

        let mut attrs = AttrMap::new();
        attrs.insert("method", AttrValue::from(method.signature.to_string()));
        attrs.insert("start", AttrValue::from(block.start_offset));
        attrs.insert(
            "instructions",
            AttrValue::Seq(
                block
                    .instructions
                    .iter()
                    .map(|instruction| AttrValue::from(instruction.text.clone()))
                    .collect(),
            ),
        );
        graph.add_node_with_attrs(&id, attrs);

        for successor in &block.successors {
            let Some(offset) = target_offset(successor) else {
                warn!(
                    "Dropping malformed successor of {} at {:#x}: no usable target offset",
                    method.signature, successor.source_offset
                );
                continue;
            };
            let mut attrs = AttrMap::new();
            attrs.insert(
                "branch_type",
                AttrValue::from(successor.kind.to_string()),
            );
            graph.add_edge(&id, block_id(&method.signature, offset), attrs);
        }
    }
}

/// Builds the package-wide control flow graph sequentially.
///
/// Returns `None` when no method contributed a node, which callers report as
/// "no CFG data available" rather than as an error or an empty graph.
#[must_use]
pub fn build(methods: &[MethodBlocks]) -> Option<AttrGraph> {
    let mut graph = AttrGraph::new();
    for method in methods {
        add_method(&mut graph, method);
    }
    (!graph.is_empty()).then_some(graph)
}

/// Builds the package-wide control flow graph with one rayon task per method.
///
/// Each task fills an independent partial graph; the method-qualified
/// identifier scheme guarantees the partial node sets are disjoint except for
/// edge endpoints fabricated from raw offsets, so the final merge is a plain
/// sequential [`AttrGraph::absorb`] fold with no locking.
#[must_use]
pub fn build_parallel(methods: &[MethodBlocks]) -> Option<AttrGraph> {
    let partials: Vec<AttrGraph> = methods
        .par_iter()
        .map(|method| {
            let mut partial = AttrGraph::new();
            add_method(&mut partial, method);
            partial
        })
        .collect();

    let mut graph = AttrGraph::new();
    for partial in partials {
        graph.absorb(partial);
    }
    (!graph.is_empty()).then_some(graph)
}

/// Disassembles every method of every DEX file in `package` and builds the
/// control flow graph.
///
/// Methods whose bodies fail to decode are skipped with a warning, matching
/// the rule that construction-time problems never abort the build: a partial
/// graph over the decodable methods is still useful.
///
/// # Errors
///
/// Returns an error when a DEX entry cannot be read from the container or its
/// identifier tables are malformed. Per-method decode failures do not error.
pub fn cfg_from_package(package: &Package) -> Result<Option<AttrGraph>> {
    let mut methods = Vec::new();
    for name in package.dex_names() {
        let data = package.read(&name)?;
        let dex = Dex::parse(&data)?;
        collect_methods(&dex, &name, &mut methods)?;
    }
    debug!("collected {} methods with blocks", methods.len());
    Ok(build(&methods))
}

/// Decodes all declared methods of one DEX file into [`MethodBlocks`].
pub(crate) fn collect_methods(
    dex: &Dex<'_>,
    entry_name: &str,
    methods: &mut Vec<MethodBlocks>,
) -> Result<()> {
    for class in dex.class_defs() {
        let Some(class_data) = dex.class_data(class)? else {
            continue;
        };
        for method in class_data.methods() {
            let signature = dex.method_signature(method.method_idx)?;
            let Some(code) = dex.code_item(method)? else {
                // Abstract or native, nothing to decode.
                methods.push(MethodBlocks {
                    signature,
                    blocks: Vec::new(),
                });
                continue;
            };
            match decode_method(&code, Some(dex)) {
                Ok(blocks) => methods.push(MethodBlocks { signature, blocks }),
                Err(err) => {
                    warn!("Skipping undecodable method {signature} in {entry_name}: {err}");
                }
            }
        }
    }
    Ok(())
}
