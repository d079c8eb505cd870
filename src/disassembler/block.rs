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

//! Basic blocks and the control flow edges between them.

use strum::{Display, IntoStaticStr};

use super::instruction::Instruction;

/// Classification of a control flow edge leaving a basic block.
///
/// The serialized form is the kebab-case variant name, e.g.
/// `conditional-true`, which is what graph exports record as the edge's
/// `branch_type` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum BranchKind {
    /// Linear flow into the block that follows in address order
    Fallthrough,
    /// Conditional branch taken
    ConditionalTrue,
    /// Conditional branch not taken
    ConditionalFalse,
    /// Unconditional jump
    Goto,
    /// One arm of a switch dispatch
    Switch,
    /// Transfer into an exception handler
    Exception,
}

/// Where a successor edge lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessorTarget {
    /// Start offset of a decoded block in the same method
    Resolved(u32),
    /// Computed target that does not begin a decoded block, kept verbatim
    RawOffset(i64),
}

/// One outgoing edge recorded on a basic block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Successor {
    /// Offset of the instruction the edge originates from, always the
    /// block's last instruction
    pub source_offset: u32,
    /// Landing point of the edge
    pub target: SuccessorTarget,
    /// Edge classification
    pub kind: BranchKind,
}

/// A maximal straight-line run of instructions.
///
/// Control enters only at the first instruction and leaves only after the
/// last. Blocks are produced in address order with dense ids.
#[derive(Debug, Clone)]
pub struct BasicBlock {
    /// Dense index in address order within the method
    pub id: usize,
    /// Code unit offset of the first instruction
    pub start_offset: u32,
    /// Instructions in address order, never empty
    pub instructions: Vec<Instruction>,
    /// Outgoing edges, exact duplicates collapsed
    pub successors: Vec<Successor>,
}

impl BasicBlock {
    /// Code unit offset just past the last instruction.
    #[must_use]
    pub fn end_offset(&self) -> u32 {
        self.instructions
            .last()
            .map_or(self.start_offset, Instruction::end_offset)
    }
}
