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

//! # dexscope Prelude
//!
//! A convenient prelude for the most commonly used types from the library.
//! Import this module to get quick access to the essentials of package
//! auditing and control-flow graph construction.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dexscope operations
pub use crate::Error;

/// The result type used throughout dexscope
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Main entry point for package auditing
pub use crate::Package;

/// Parsed application manifest
pub use crate::Manifest;

/// Low-level parsing utilities
pub use crate::{Backend, Parser};

// ================================================================================================
// Container and Manifest Queries
// ================================================================================================

/// Container entry metadata and storage methods
pub use crate::package::{Compression, Digests, NativeLibraries, ZipEntry};

/// Manifest SDK reporting
pub use crate::manifest::{version_name, MinSdkReport};

// ================================================================================================
// DEX and Disassembly
// ================================================================================================

/// DEX file structures
pub use crate::dex::{CodeItem, Dex, DexHeader, MethodSignature};

/// Dalvik disassembly
pub use crate::disassembler::{
    decode_method, BasicBlock, BranchKind, FlowType, Instruction, Successor, SuccessorTarget,
};

// ================================================================================================
// Control-Flow Graphs
// ================================================================================================

/// Graph construction over packages and disassembled methods
pub use crate::analysis::{build, build_parallel, cfg_from_package, MethodBlocks};

/// The attribute graph and its value model
pub use crate::graph::{AttrGraph, AttrValue};

/// Graph serialization
pub use crate::graph::{
    read_graphml, try_write_graphml, write_dot, write_graphml, write_json, GraphmlOutcome,
};
