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

//! Exchange format round-trips over the file-based exporters.

use std::path::PathBuf;

use dexscope::prelude::*;
use dexscope::graph::{normalize, to_dot, AttrMap};

fn temp_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("dexscope-exchange-tests");
    std::fs::create_dir_all(&dir).unwrap();
    dir.join(format!("{}-{name}", std::process::id()))
}

/// A small graph with primitive attributes only.
fn primitive_graph() -> AttrGraph {
    let mut graph = AttrGraph::new();

    let mut attrs = AttrMap::new();
    attrs.insert("method", AttrValue::from("La;->f()V"));
    attrs.insert("start", AttrValue::from(0_u32));
    graph.add_node_with_attrs("La;->f()V_bb_0", attrs);

    let mut attrs = AttrMap::new();
    attrs.insert("method", AttrValue::from("La;->f()V"));
    attrs.insert("start", AttrValue::from(4_u32));
    graph.add_node_with_attrs("La;->f()V_bb_4", attrs);

    let mut attrs = AttrMap::new();
    attrs.insert("branch_type", AttrValue::from("goto"));
    graph.add_edge("La;->f()V_bb_0", "La;->f()V_bb_4", attrs);
    graph
}

/// The same shape with a composite `instructions` attribute on the entry.
fn composite_graph() -> AttrGraph {
    let mut graph = AttrGraph::new();

    let mut attrs = AttrMap::new();
    attrs.insert("method", AttrValue::from("La;->f()V"));
    attrs.insert("start", AttrValue::from(0_u32));
    attrs.insert(
        "instructions",
        AttrValue::Seq(vec![AttrValue::from("nop"), AttrValue::from("return-void")]),
    );
    graph.add_node_with_attrs("La;->f()V_bb_0", attrs);

    let mut attrs = AttrMap::new();
    attrs.insert("method", AttrValue::from("La;->f()V"));
    attrs.insert("start", AttrValue::from(4_u32));
    graph.add_node_with_attrs("La;->f()V_bb_4", attrs);

    let mut attrs = AttrMap::new();
    attrs.insert("branch_type", AttrValue::from("goto"));
    graph.add_edge("La;->f()V_bb_0", "La;->f()V_bb_4", attrs);
    graph
}

#[test]
fn primitive_graph_round_trips_through_graphml() {
    let path = temp_path("primitive.graphml");
    let graph = primitive_graph();

    assert!(matches!(
        try_write_graphml(&graph, &path),
        GraphmlOutcome::Ok
    ));
    let recovered = read_graphml(&path).unwrap();
    assert_eq!(recovered.to_json(), graph.to_json());
    std::fs::remove_file(&path).ok();
}

#[test]
fn composite_graph_is_reported_before_any_io() {
    let path = temp_path("blocked.graphml");
    std::fs::remove_file(&path).ok();

    match try_write_graphml(&composite_graph(), &path) {
        GraphmlOutcome::NeedsNormalization(reason) => {
            assert!(reason.contains("instructions"), "reason was: {reason}");
        }
        other => panic!("expected NeedsNormalization, got {other:?}"),
    }
    assert!(!path.exists(), "a blocked export must not touch the disk");
}

#[test]
fn two_step_export_normalizes_and_round_trips() {
    let path = temp_path("normalized.graphml");
    let graph = composite_graph();

    assert!(write_graphml(&graph, &path));
    let recovered = read_graphml(&path).unwrap();

    // What lands on disk is the normalized rendition of the input.
    assert_eq!(recovered.to_json(), normalize(&graph).to_json());

    let entry = recovered.node_id("La;->f()V_bb_0").unwrap();
    let instructions = recovered
        .node_attrs(entry)
        .unwrap()
        .get("instructions")
        .unwrap();
    assert_eq!(
        instructions,
        &AttrValue::from("[\"nop\",\"return-void\"]")
    );
    std::fs::remove_file(&path).ok();
}

#[test]
fn json_export_carries_nodes_and_edges() {
    let path = temp_path("graph.json");
    let graph = composite_graph();

    write_json(&graph, &path).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["nodes"].as_array().unwrap().len(), 2);
    assert_eq!(value["edges"].as_array().unwrap().len(), 1);
    std::fs::remove_file(&path).ok();
}

#[test]
fn dot_export_quotes_identifiers_and_labels_edges() {
    let path = temp_path("graph.dot");
    let graph = primitive_graph();

    write_dot(&graph, &path).unwrap();
    let rendered = std::fs::read_to_string(&path).unwrap();
    assert_eq!(rendered, to_dot(&graph));
    assert!(rendered.starts_with("digraph"));
    assert!(rendered.contains("\"La;->f()V_bb_0\" -> \"La;->f()V_bb_4\""));
    assert!(rendered.contains("branch_type=\"goto\""));
    std::fs::remove_file(&path).ok();
}

#[test]
fn built_cfg_survives_a_graphml_round_trip() {
    let method = MethodBlocks {
        signature: MethodSignature {
            class: "Lcom/example/Main;".to_string(),
            name: "run".to_string(),
            descriptor: "()V".to_string(),
        },
        blocks: vec![BasicBlock {
            id: 0,
            start_offset: 0,
            instructions: vec![Instruction {
                offset: 0,
                size: 1,
                opcode: 0x0e,
                mnemonic: "return-void",
                flow_type: FlowType::Return,
                text: "return-void".to_string(),
                branch_targets: Vec::new(),
            }],
            successors: Vec::new(),
        }],
    };
    let graph = build(&[method]).unwrap();
    let path = temp_path("cfg.graphml");

    // Built graphs carry a composite `instructions` attribute, so the
    // two-step pipeline is the one that must succeed here.
    assert!(write_graphml(&graph, &path));
    let recovered = read_graphml(&path).unwrap();
    assert_eq!(recovered.node_count(), graph.node_count());
    assert!(recovered.contains_node("Lcom/example/Main;->run()V_bb_0"));
    std::fs::remove_file(&path).ok();
}
