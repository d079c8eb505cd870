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

//! Instruction decoding and basic block recovery.
//!
//! Decoding runs in two phases. The first phase walks the code units with a
//! worklist seeded at the method entry and every exception handler, decoding
//! linearly until a terminator and queueing branch targets as it goes. Every
//! branch target and every instruction following a conditional branch or
//! switch is recorded as a block leader. The second phase partitions the
//! decoded instructions at leaders and address gaps, then attaches successor
//! edges, resolving each target against the set of block start offsets.
//!
//! Targets that point outside the method body or into the middle of another
//! instruction are kept as [`SuccessorTarget::RawOffset`] rather than being
//! discarded, so downstream consumers see exactly where a malformed branch
//! wanted to go.

use std::collections::{BTreeMap, HashSet};

use crate::{
    dex::{CodeItem, TryItem},
    disassembler::{
        block::{BasicBlock, BranchKind, Successor, SuccessorTarget},
        instruction::{FlowType, Instruction, RefKind, SymbolResolver},
        instructions::{Format, OPCODES},
    },
    utils::BitSet,
    Result,
};

/// Decodes a single instruction at `offset` code units into `units`.
///
/// Operand text is rendered immediately, through `resolver` when one is
/// given. For switch instructions the referenced payload is read here and its
/// case targets land in [`Instruction::branch_targets`]; a malformed payload
/// is logged and leaves the target list empty.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] when `offset` is outside the method
/// body, names an unused opcode, lands on a data payload, or the instruction
/// extends past the end of the code.
///
/// # Examples
///
/// ```rust
/// use dexscope::disassembler::{decode_instruction, FlowType};
///
/// // goto +3
/// let units = [0x0328];
/// let instruction = decode_instruction(&units, 0, None)?;
///
/// assert_eq!(instruction.mnemonic, "goto");
/// assert_eq!(instruction.flow_type, FlowType::Branch);
/// assert_eq!(instruction.branch_targets, vec![3]);
/// assert_eq!(instruction.text, "goto +3");
/// # Ok::<(), dexscope::Error>(())
/// ```
pub fn decode_instruction(
    units: &[u16],
    offset: u32,
    resolver: Option<&dyn SymbolResolver>,
) -> Result<Instruction> {
    let at = offset as usize;
    let Some(&first) = units.get(at) else {
        return Err(malformed_error!(
            "Instruction offset {:#x} is outside the method body",
            offset
        ));
    };

    let opcode = (first & 0xFF) as u8;
    if opcode == 0x00 && matches!(first >> 8, 1..=3) {
        return Err(malformed_error!(
            "Data payload {:#06x} at {:#x} reached as an instruction",
            first,
            offset
        ));
    }

    let entry = &OPCODES[opcode as usize];
    if entry.mnemonic.is_empty() {
        return Err(malformed_error!(
            "Unused opcode {:#04x} at {:#x}",
            opcode,
            offset
        ));
    }

    let size = entry.format.units();
    let end = at + size as usize;
    if end > units.len() {
        return Err(malformed_error!(
            "Instruction {} at {:#x} extends past the end of the code",
            entry.mnemonic,
            offset
        ));
    }
    let u = &units[at..end];

    let mut branch_targets = Vec::new();
    let operands = match entry.format {
        Format::Format10x => String::new(),
        Format::Format12x => {
            format!("v{}, v{}", (u[0] >> 8) & 0xF, (u[0] >> 12) & 0xF)
        }
        Format::Format11n => {
            // Top nibble is a signed 4-bit literal.
            format!("v{}, #{}", (u[0] >> 8) & 0xF, (u[0] as i16) >> 12)
        }
        Format::Format11x => format!("v{}", u[0] >> 8),
        Format::Format10t => {
            let rel = i64::from((u[0] >> 8) as i8);
            branch_targets.push(rel);
            format!("{rel:+}")
        }
        Format::Format20t => {
            let rel = i64::from(u[1] as i16);
            branch_targets.push(rel);
            format!("{rel:+}")
        }
        Format::Format22x => format!("v{}, v{}", u[0] >> 8, u[1]),
        Format::Format21t => {
            let rel = i64::from(u[1] as i16);
            branch_targets.push(rel);
            format!("v{}, {rel:+}", u[0] >> 8)
        }
        Format::Format21s => format!("v{}, #{}", u[0] >> 8, u[1] as i16),
        Format::Format21h => {
            // const-wide/high16 shifts into the top of 64 bits, const/high16
            // into the top of 32.
            let literal = if opcode == 0x19 {
                i64::from(u[1] as i16) << 48
            } else {
                i64::from(i32::from(u[1] as i16) << 16)
            };
            format!("v{}, #{literal}", u[0] >> 8)
        }
        Format::Format21c => {
            let reference = ref_kind(opcode).render(resolver, u32::from(u[1]));
            format!("v{}, {reference}", u[0] >> 8)
        }
        Format::Format23x => {
            format!("v{}, v{}, v{}", u[0] >> 8, u[1] & 0xFF, u[1] >> 8)
        }
        Format::Format22b => {
            format!("v{}, v{}, #{}", u[0] >> 8, u[1] & 0xFF, (u[1] >> 8) as i8)
        }
        Format::Format22t => {
            let rel = i64::from(u[1] as i16);
            branch_targets.push(rel);
            format!("v{}, v{}, {rel:+}", (u[0] >> 8) & 0xF, (u[0] >> 12) & 0xF)
        }
        Format::Format22s => {
            format!(
                "v{}, v{}, #{}",
                (u[0] >> 8) & 0xF,
                (u[0] >> 12) & 0xF,
                u[1] as i16
            )
        }
        Format::Format22c => {
            let reference = ref_kind(opcode).render(resolver, u32::from(u[1]));
            format!(
                "v{}, v{}, {reference}",
                (u[0] >> 8) & 0xF,
                (u[0] >> 12) & 0xF
            )
        }
        Format::Format30t => {
            let rel = i64::from(join_i32(u[1], u[2]));
            branch_targets.push(rel);
            format!("{rel:+}")
        }
        Format::Format32x => format!("v{}, v{}", u[1], u[2]),
        Format::Format31i => {
            format!("v{}, #{}", u[0] >> 8, join_i32(u[1], u[2]))
        }
        Format::Format31t => {
            let rel = i64::from(join_i32(u[1], u[2]));
            if entry.flow == FlowType::Switch {
                branch_targets = read_switch_targets(units, offset, rel);
            }
            format!("v{}, {rel:+}", u[0] >> 8)
        }
        Format::Format31c => {
            let reference = ref_kind(opcode).render(resolver, join_u32(u[1], u[2]));
            format!("v{}, {reference}", u[0] >> 8)
        }
        Format::Format35c => {
            let regs = nibble_regs(u[0], u[2], offset, entry.mnemonic)?;
            let reference = ref_kind(opcode).render(resolver, u32::from(u[1]));
            format!("{regs}, {reference}")
        }
        Format::Format3rc => {
            let reference = ref_kind(opcode).render(resolver, u32::from(u[1]));
            format!("{}, {reference}", reg_range(u[2], u[0] >> 8))
        }
        Format::Format45cc => {
            let regs = nibble_regs(u[0], u[2], offset, entry.mnemonic)?;
            let method = RefKind::Method.render(resolver, u32::from(u[1]));
            let proto = RefKind::Proto.render(resolver, u32::from(u[3]));
            format!("{regs}, {method}, {proto}")
        }
        Format::Format4rcc => {
            let method = RefKind::Method.render(resolver, u32::from(u[1]));
            let proto = RefKind::Proto.render(resolver, u32::from(u[3]));
            format!("{}, {method}, {proto}", reg_range(u[2], u[0] >> 8))
        }
        Format::Format51l => {
            let literal = (u64::from(u[1])
                | u64::from(u[2]) << 16
                | u64::from(u[3]) << 32
                | u64::from(u[4]) << 48) as i64;
            format!("v{}, #{literal}", u[0] >> 8)
        }
    };

    let text = if operands.is_empty() {
        entry.mnemonic.to_string()
    } else {
        format!("{} {}", entry.mnemonic, operands)
    };

    Ok(Instruction {
        offset,
        size,
        opcode,
        mnemonic: entry.mnemonic,
        flow_type: entry.flow,
        text,
        branch_targets,
    })
}

/// Decodes the reachable code of a method and partitions it into basic
/// blocks, in address order with dense ids.
///
/// Code that is only reachable by falling past a `return` or `throw` without
/// being a branch or handler target is never decoded, matching what the
/// runtime itself could execute. A method whose code item carries no units
/// yields no blocks.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] when decoding runs into an invalid
/// instruction on a reachable path.
pub fn decode_method(
    code: &CodeItem,
    resolver: Option<&dyn SymbolResolver>,
) -> Result<Vec<BasicBlock>> {
    if code.is_empty() {
        return Ok(Vec::new());
    }

    let mut decoder = Decoder::new(&code.units, resolver);
    decoder.seed_exception_leaders(&code.tries);
    decoder.decode_from_entry()?;
    Ok(decoder.into_blocks(&code.tries))
}

struct Decoder<'a> {
    units: &'a [u16],
    resolver: Option<&'a dyn SymbolResolver>,
    /// Decoded instructions keyed by start offset
    instructions: BTreeMap<u32, Instruction>,
    /// Every code unit covered by a decoded instruction
    visited: BitSet,
    /// Offsets that must begin a new block
    leaders: BitSet,
    worklist: Vec<u32>,
}

impl<'a> Decoder<'a> {
    fn new(units: &'a [u16], resolver: Option<&'a dyn SymbolResolver>) -> Self {
        Self {
            units,
            resolver,
            instructions: BTreeMap::new(),
            visited: BitSet::new(units.len()),
            leaders: BitSet::new(units.len()),
            worklist: Vec::new(),
        }
    }

    /// Handler entry points are decode roots, try range starts are block
    /// boundaries. Addresses outside the method body are ignored here and
    /// surface later as raw edge targets.
    fn seed_exception_leaders(&mut self, tries: &[TryItem]) {
        for try_item in tries {
            let start = try_item.start_addr as usize;
            if start < self.units.len() {
                self.leaders.insert(start);
            }
            for handler in try_item.handlers.handler_addrs() {
                if (handler as usize) < self.units.len() {
                    self.leaders.insert(handler as usize);
                    self.worklist.push(handler);
                }
            }
        }
    }

    fn decode_from_entry(&mut self) -> Result<()> {
        self.worklist.push(0);
        while let Some(start) = self.worklist.pop() {
            if self.instructions.contains_key(&start) || self.visited.contains(start as usize) {
                continue;
            }
            self.linear_decode(start)?;
        }
        Ok(())
    }

    fn linear_decode(&mut self, start: u32) -> Result<()> {
        let mut cursor = start;
        loop {
            let at = cursor as usize;
            if at >= self.units.len() {
                break;
            }
            if self.instructions.contains_key(&cursor) {
                // Fell into an already decoded run, the join point starts a
                // new block.
                self.leaders.insert(at);
                break;
            }
            if self.visited.contains(at) {
                // Mid-instruction overlap with a previous run.
                break;
            }

            let instruction = decode_instruction(self.units, cursor, self.resolver)?;
            for unit in at..at + instruction.size as usize {
                self.visited.insert(unit);
            }

            let next = instruction.end_offset();
            let flow = instruction.flow_type;
            self.queue_branch_targets(&instruction);
            self.instructions.insert(cursor, instruction);

            match flow {
                FlowType::Sequential => cursor = next,
                FlowType::ConditionalBranch | FlowType::Switch => {
                    if (next as usize) < self.units.len() {
                        self.leaders.insert(next as usize);
                    }
                    cursor = next;
                }
                FlowType::Branch | FlowType::Return | FlowType::Throw => break,
            }
        }
        Ok(())
    }

    fn queue_branch_targets(&mut self, instruction: &Instruction) {
        for &rel in &instruction.branch_targets {
            let Ok(target) = u32::try_from(i64::from(instruction.offset) + rel) else {
                continue;
            };
            if (target as usize) < self.units.len() {
                self.leaders.insert(target as usize);
                self.worklist.push(target);
            }
        }
    }

    fn into_blocks(self, tries: &[TryItem]) -> Vec<BasicBlock> {
        let mut blocks: Vec<BasicBlock> = Vec::new();
        let mut previous_end = 0;
        for (offset, instruction) in self.instructions {
            let boundary = blocks.is_empty()
                || offset != previous_end
                || self.leaders.contains(offset as usize);
            if boundary {
                blocks.push(BasicBlock {
                    id: blocks.len(),
                    start_offset: offset,
                    instructions: Vec::new(),
                    successors: Vec::new(),
                });
            }
            previous_end = offset + instruction.size;
            if let Some(block) = blocks.last_mut() {
                block.instructions.push(instruction);
            }
        }

        let starts: HashSet<u32> = blocks.iter().map(|block| block.start_offset).collect();
        for block in &mut blocks {
            let Some(last) = block.instructions.last() else {
                continue;
            };
            let source = last.offset;
            let flow = last.flow_type;
            let next = last.end_offset();
            let absolute: Vec<i64> = last
                .branch_targets
                .iter()
                .map(|&rel| i64::from(source) + rel)
                .collect();

            let mut outgoing = Vec::new();
            match flow {
                FlowType::Branch => {
                    for target in absolute {
                        push_unique(
                            &mut outgoing,
                            successor(source, resolve_target(&starts, target), BranchKind::Goto),
                        );
                    }
                }
                FlowType::ConditionalBranch => {
                    for target in absolute {
                        push_unique(
                            &mut outgoing,
                            successor(
                                source,
                                resolve_target(&starts, target),
                                BranchKind::ConditionalTrue,
                            ),
                        );
                    }
                    if let Some(target) = fallthrough_target(&starts, next, self.units.len()) {
                        push_unique(
                            &mut outgoing,
                            successor(source, target, BranchKind::ConditionalFalse),
                        );
                    }
                }
                FlowType::Switch => {
                    for target in absolute {
                        push_unique(
                            &mut outgoing,
                            successor(source, resolve_target(&starts, target), BranchKind::Switch),
                        );
                    }
                    if let Some(target) = fallthrough_target(&starts, next, self.units.len()) {
                        push_unique(
                            &mut outgoing,
                            successor(source, target, BranchKind::Fallthrough),
                        );
                    }
                }
                FlowType::Sequential => {
                    if let Some(target) = fallthrough_target(&starts, next, self.units.len()) {
                        push_unique(
                            &mut outgoing,
                            successor(source, target, BranchKind::Fallthrough),
                        );
                    }
                }
                FlowType::Return | FlowType::Throw => {}
            }
            block.successors = outgoing;
        }

        // Every block overlapping a try range can transfer to each of the
        // range's handlers.
        for try_item in tries {
            for block in &mut blocks {
                if block.start_offset >= try_item.end_addr()
                    || block.end_offset() <= try_item.start_addr
                {
                    continue;
                }
                let Some(last) = block.instructions.last() else {
                    continue;
                };
                let source = last.offset;
                for handler in try_item.handlers.handler_addrs() {
                    push_unique(
                        &mut block.successors,
                        successor(
                            source,
                            resolve_target(&starts, i64::from(handler)),
                            BranchKind::Exception,
                        ),
                    );
                }
            }
        }

        blocks
    }
}

const fn successor(source: u32, target: SuccessorTarget, kind: BranchKind) -> Successor {
    Successor {
        source_offset: source,
        target,
        kind,
    }
}

fn push_unique(successors: &mut Vec<Successor>, candidate: Successor) {
    if !successors.contains(&candidate) {
        successors.push(candidate);
    }
}

fn resolve_target(starts: &HashSet<u32>, target: i64) -> SuccessorTarget {
    match u32::try_from(target) {
        Ok(offset) if starts.contains(&offset) => SuccessorTarget::Resolved(offset),
        _ => SuccessorTarget::RawOffset(target),
    }
}

fn fallthrough_target(starts: &HashSet<u32>, next: u32, len: usize) -> Option<SuccessorTarget> {
    if next as usize >= len {
        return None;
    }
    Some(if starts.contains(&next) {
        SuccessorTarget::Resolved(next)
    } else {
        SuccessorTarget::RawOffset(i64::from(next))
    })
}

/// Register list of a `35c` or `45cc` encoding, `{vC, vD, ...}`.
fn nibble_regs(u0: u16, u2: u16, offset: u32, mnemonic: &str) -> Result<String> {
    let count = usize::from((u0 >> 12) & 0xF);
    if count > 5 {
        return Err(malformed_error!(
            "Register count {} for {} at {:#x} exceeds the encoding limit",
            count,
            mnemonic,
            offset
        ));
    }
    let regs = [
        u2 & 0xF,
        (u2 >> 4) & 0xF,
        (u2 >> 8) & 0xF,
        (u2 >> 12) & 0xF,
        (u0 >> 8) & 0xF,
    ];
    let list = regs[..count]
        .iter()
        .map(|reg| format!("v{reg}"))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("{{{list}}}"))
}

/// Register range of a `3rc` or `4rcc` encoding, `{vC .. vN}`.
fn reg_range(first: u16, count: u16) -> String {
    if count == 0 {
        String::from("{}")
    } else {
        let last = u32::from(first) + u32::from(count) - 1;
        format!("{{v{first} .. v{last}}}")
    }
}

/// Which constant pool an opcode's reference operand indexes.
const fn ref_kind(opcode: u8) -> RefKind {
    match opcode {
        0x1A | 0x1B => RefKind::String,
        0x52..=0x6D => RefKind::Field,
        0x6E..=0x72 | 0x74..=0x78 | 0xFA | 0xFB => RefKind::Method,
        0xFC | 0xFD => RefKind::CallSite,
        0xFE => RefKind::MethodHandle,
        0xFF => RefKind::Proto,
        _ => RefKind::Type,
    }
}

fn join_u32(low: u16, high: u16) -> u32 {
    u32::from(low) | u32::from(high) << 16
}

fn join_i32(low: u16, high: u16) -> i32 {
    join_u32(low, high) as i32
}

/// Case targets of the payload referenced by the switch at `switch_offset`,
/// relative to the switch opcode itself. A payload that lies outside the
/// method body or carries an unknown ident yields no targets, keeping the
/// switch as a plain fallthrough.
fn read_switch_targets(units: &[u16], switch_offset: u32, rel: i64) -> Vec<i64> {
    match switch_payload_targets(units, switch_offset, rel) {
        Some(targets) => targets,
        None => {
            log::warn!("Ignoring malformed switch payload referenced from {switch_offset:#x}");
            Vec::new()
        }
    }
}

fn switch_payload_targets(units: &[u16], switch_offset: u32, rel: i64) -> Option<Vec<i64>> {
    let payload = usize::try_from(i64::from(switch_offset) + rel).ok()?;
    let ident = *units.get(payload)?;
    let size = usize::from(*units.get(payload + 1)?);
    let targets_at = match ident {
        // ident, size, first_key, then one target per case
        0x0100 => payload + 4,
        // ident, size, one key per case, then one target per case
        0x0200 => payload + 2 + 2 * size,
        _ => return None,
    };
    if targets_at + 2 * size > units.len() {
        return None;
    }

    let mut targets = Vec::with_capacity(size);
    for case in 0..size {
        let at = targets_at + 2 * case;
        targets.push(i64::from(join_i32(units[at], units[at + 1])));
    }
    Some(targets)
}
