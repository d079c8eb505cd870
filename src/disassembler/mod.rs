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

//! Dalvik bytecode disassembler and basic block recovery.
//!
//! This module decodes the registers-and-code-units instruction stream of a
//! DEX method into rendered [`Instruction`]s and partitions them into
//! [`BasicBlock`]s with classified successor edges, the raw material for
//! control flow graph construction.
//!
//! # Key Types
//! - [`Instruction`] - One decoded instruction with rendered text
//! - [`BasicBlock`] - A single-entry, single-exit instruction run
//! - [`Successor`] / [`BranchKind`] - Outgoing edges and their classification
//! - [`SymbolResolver`] - Hook for rendering constant pool references
//!
//! # Main Functions
//! - [`decode_instruction`] - Decode a single instruction
//! - [`decode_method`] - Decode a whole method into basic blocks
//!
//! # Example
//! ```rust
//! use dexscope::disassembler::decode_instruction;
//!
//! // return-void
//! let units = [0x000E];
//! let instruction = decode_instruction(&units, 0, None)?;
//! assert_eq!(instruction.mnemonic, "return-void");
//! # Ok::<(), dexscope::Error>(())
//! ```

mod block;
mod decoder;
mod instruction;
mod instructions;

pub use block::{BasicBlock, BranchKind, Successor, SuccessorTarget};
pub use decoder::{decode_instruction, decode_method};
pub use instruction::{FlowType, Instruction, SymbolResolver};
pub use instructions::{Format, Opcode, OPCODES};
