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

//! Benchmarks for control flow graph construction and serialization.
//!
//! Measures the hot path over synthetic disassembled methods:
//! - sequential vs. parallel graph construction
//! - attribute normalization of a built graph
//! - DOT and GraphML rendering

extern crate dexscope;

use criterion::{criterion_group, criterion_main, Criterion};
use dexscope::graph::{normalize, to_dot, write_graphml_to};
use dexscope::prelude::*;
use std::hint::black_box;

/// Fabricates `count` methods of eight blocks each: a diamond followed by a
/// small switch, which exercises every branch kind except exceptions.
fn synthetic_methods(count: usize) -> Vec<MethodBlocks> {
    (0..count)
        .map(|index| MethodBlocks {
            signature: MethodSignature {
                class: format!("Lbench/Class{};", index % 16),
                name: format!("method{index}"),
                descriptor: "(I)I".to_string(),
            },
            blocks: method_blocks(),
        })
        .collect()
}

fn instruction(offset: u32, text: &str, flow_type: FlowType) -> Instruction {
    Instruction {
        offset,
        size: 2,
        opcode: 0,
        mnemonic: "nop",
        flow_type,
        text: text.to_string(),
        branch_targets: Vec::new(),
    }
}

fn method_blocks() -> Vec<BasicBlock> {
    let starts = [0_u32, 2, 4, 6, 8, 10, 12, 14];
    starts
        .iter()
        .enumerate()
        .map(|(id, &start)| {
            let successors = match id {
                0 => vec![
                    edge(start, 2, BranchKind::ConditionalTrue),
                    edge(start, 4, BranchKind::ConditionalFalse),
                ],
                1 | 2 => vec![edge(start, 6, BranchKind::Goto)],
                3 => vec![
                    edge(start, 8, BranchKind::Switch),
                    edge(start, 10, BranchKind::Switch),
                    edge(start, 12, BranchKind::Fallthrough),
                ],
                4 | 5 | 6 => vec![edge(start, 14, BranchKind::Goto)],
                _ => Vec::new(),
            };
            BasicBlock {
                id,
                start_offset: start,
                instructions: vec![
                    instruction(start, "const/4 v0, 1", FlowType::Sequential),
                    instruction(start + 1, "add-int v0, v0, v1", FlowType::Sequential),
                ],
                successors,
            }
        })
        .collect()
}

fn edge(source: u32, target: u32, kind: BranchKind) -> Successor {
    Successor {
        source_offset: source,
        target: SuccessorTarget::Resolved(target),
        kind,
    }
}

fn bench_build_sequential(c: &mut Criterion) {
    let methods = synthetic_methods(500);
    c.bench_function("cfg_build_sequential_500", |b| {
        b.iter(|| black_box(build(black_box(&methods))));
    });
}

fn bench_build_parallel(c: &mut Criterion) {
    let methods = synthetic_methods(500);
    c.bench_function("cfg_build_parallel_500", |b| {
        b.iter(|| black_box(build_parallel(black_box(&methods))));
    });
}

fn bench_normalize(c: &mut Criterion) {
    let graph = build(&synthetic_methods(500)).unwrap();
    c.bench_function("cfg_normalize_500", |b| {
        b.iter(|| black_box(normalize(black_box(&graph))));
    });
}

fn bench_render_dot(c: &mut Criterion) {
    let graph = build(&synthetic_methods(500)).unwrap();
    c.bench_function("cfg_render_dot_500", |b| {
        b.iter(|| black_box(to_dot(black_box(&graph))));
    });
}

fn bench_render_graphml(c: &mut Criterion) {
    let graph = normalize(&build(&synthetic_methods(500)).unwrap());
    c.bench_function("cfg_render_graphml_500", |b| {
        b.iter(|| {
            let mut buffer = Vec::with_capacity(1 << 20);
            write_graphml_to(black_box(&graph), &mut buffer).unwrap();
            black_box(buffer)
        });
    });
}

criterion_group!(
    benches,
    bench_build_sequential,
    bench_build_parallel,
    bench_normalize,
    bench_render_dot,
    bench_render_graphml
);
criterion_main!(benches);
