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

//! `code_item` decoding: register counts, the instruction stream, and the
//! try/catch structure.
//!
//! The instruction stream is stored as 16-bit code units; all offsets and
//! addresses inside a method (branch targets, try ranges, handler entries)
//! count units, not bytes. Try items reference their handlers through byte
//! offsets into the `encoded_catch_handler_list` that follows them, so the
//! list is decoded positionally and joined back onto the tries afterwards.

use std::collections::HashMap;

use crate::{file::parser::Parser, Result};

/// A decoded `code_item`: everything needed to disassemble one method body.
pub struct CodeItem {
    /// Number of registers used by the method
    pub registers_size: u16,
    /// Number of words of incoming arguments
    pub ins_size: u16,
    /// Number of words of outgoing argument space for calls
    pub outs_size: u16,
    /// Offset of the debug info stream, 0 for none
    pub debug_info_off: u32,
    /// The instruction stream as 16-bit code units
    pub units: Vec<u16>,
    /// Try ranges with their resolved catch handlers
    pub tries: Vec<TryItem>,
}

impl CodeItem {
    /// Whether the method body contains no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// A guarded code range and the handlers covering it.
pub struct TryItem {
    /// First code unit covered by this range
    pub start_addr: u32,
    /// Number of code units covered
    pub insn_count: u16,
    /// The catch handlers for exceptions raised inside the range
    pub handlers: CatchHandlers,
}

impl TryItem {
    /// First code unit past the covered range.
    #[must_use]
    pub const fn end_addr(&self) -> u32 {
        self.start_addr + self.insn_count as u32
    }
}

/// A single typed catch entry.
#[derive(Clone)]
pub struct CatchHandler {
    /// Index into `type_ids` for the caught exception type
    pub type_idx: u32,
    /// Handler entry point in code units
    pub addr: u32,
}

/// One `encoded_catch_handler`: typed catches plus an optional catch-all.
#[derive(Clone)]
pub struct CatchHandlers {
    /// Typed catches in declaration order
    pub catches: Vec<CatchHandler>,
    /// Entry point of the catch-all handler, if present
    pub catch_all: Option<u32>,
}

impl CatchHandlers {
    /// All handler entry points, typed catches first.
    pub fn handler_addrs(&self) -> impl Iterator<Item = u32> + '_ {
        self.catches.iter().map(|c| c.addr).chain(self.catch_all)
    }
}

/// Decode the `code_item` at `offset`.
///
/// # Errors
/// Returns an error if the item lies outside `data`, the instruction stream is
/// truncated, or a try item references a handler offset that does not match
/// any entry of the handler list.
pub(crate) fn parse_code_item(data: &[u8], offset: u32) -> Result<CodeItem> {
    let mut parser = Parser::new(data);
    parser.seek(offset as usize)?;

    let registers_size = parser.read_le::<u16>()?;
    let ins_size = parser.read_le::<u16>()?;
    let outs_size = parser.read_le::<u16>()?;
    let tries_size = parser.read_le::<u16>()?;
    let debug_info_off = parser.read_le::<u32>()?;
    let insns_size = parser.read_le::<u32>()?;

    if u64::from(insns_size) * 2 > (parser.len() - parser.pos()) as u64 {
        return Err(malformed_error!(
            "Instruction stream of {} units exceeds file size",
            insns_size
        ));
    }

    let mut units = Vec::with_capacity(insns_size as usize);
    for _ in 0..insns_size {
        units.push(parser.read_le::<u16>()?);
    }

    let tries = if tries_size > 0 {
        // An alignment unit precedes the try items when the stream length is odd
        if insns_size % 2 == 1 {
            parser.advance_by(2)?;
        }
        read_tries(&mut parser, tries_size)?
    } else {
        Vec::new()
    };

    Ok(CodeItem {
        registers_size,
        ins_size,
        outs_size,
        debug_info_off,
        units,
        tries,
    })
}

struct RawTry {
    start_addr: u32,
    insn_count: u16,
    handler_off: u16,
}

fn read_tries(parser: &mut Parser, count: u16) -> Result<Vec<TryItem>> {
    let mut raw = Vec::with_capacity(count as usize);
    for _ in 0..count {
        raw.push(RawTry {
            start_addr: parser.read_le::<u32>()?,
            insn_count: parser.read_le::<u16>()?,
            handler_off: parser.read_le::<u16>()?,
        });
    }

    // The handler list follows the try items; handler_off values are byte
    // offsets relative to its start.
    let list_base = parser.pos();
    let list_size = parser.read_uleb128()?;
    if u64::from(list_size) > (parser.len() - parser.pos()) as u64 {
        return Err(malformed_error!(
            "Catch handler list with {} entries exceeds remaining data",
            list_size
        ));
    }

    let mut offsets: HashMap<usize, usize> = HashMap::new();
    let mut handlers = Vec::with_capacity(list_size as usize);
    for _ in 0..list_size {
        offsets.insert(parser.pos() - list_base, handlers.len());
        handlers.push(read_catch_handlers(parser)?);
    }

    let mut tries = Vec::with_capacity(count as usize);
    for item in raw {
        let Some(&index) = offsets.get(&usize::from(item.handler_off)) else {
            return Err(malformed_error!(
                "Try item references unknown handler offset {}",
                item.handler_off
            ));
        };
        tries.push(TryItem {
            start_addr: item.start_addr,
            insn_count: item.insn_count,
            handlers: handlers[index].clone(),
        });
    }
    Ok(tries)
}

fn read_catch_handlers(parser: &mut Parser) -> Result<CatchHandlers> {
    // A negative size means the typed catches are followed by a catch-all
    let size = parser.read_sleb128()?;
    let pair_count = size.unsigned_abs();

    if u64::from(pair_count) * 2 > (parser.len() - parser.pos()) as u64 {
        return Err(malformed_error!(
            "Catch handler with {} pairs exceeds remaining data",
            pair_count
        ));
    }

    let mut catches = Vec::with_capacity(pair_count as usize);
    for _ in 0..pair_count {
        catches.push(CatchHandler {
            type_idx: parser.read_uleb128()?,
            addr: parser.read_uleb128()?,
        });
    }

    let catch_all = if size <= 0 {
        Some(parser.read_uleb128()?)
    } else {
        None
    };

    Ok(CatchHandlers { catches, catch_all })
}
