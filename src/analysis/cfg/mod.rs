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

//! Package-wide control flow graph construction.
//!
//! Every decoded method contributes one subgraph: one node per basic block,
//! one directed edge per successor. Node identifiers embed the full method
//! identity (`{class}->{name}{descriptor}_bb_{start}`), so blocks from
//! different methods can never collide and per-method partial graphs merge
//! without coordination.
//!
//! # Key Components
//!
//! - [`MethodBlocks`] - a method identity with its decoded blocks, the
//!   builder's input unit
//! - [`build`] / [`build_parallel`] - sequential and rayon-backed construction
//! - [`cfg_from_package`] - the full pipeline from an opened package
//! - [`block_id`] / [`target_offset`] - the node identity scheme
//!
//! # Examples
//!
//! ```rust,no_run
//! use dexscope::{analysis::cfg_from_package, Package};
//!
//! let package = Package::from_file("app.apk".as_ref())?;
//! match cfg_from_package(&package)? {
//!     Some(graph) => println!("{} blocks, {} edges", graph.node_count(), graph.edge_count()),
//!     None => println!("no CFG data available"),
//! }
//! # Ok::<(), dexscope::Error>(())
//! ```

mod builder;

pub use builder::{
    block_id, build, build_parallel, cfg_from_package, target_offset, MethodBlocks,
};
