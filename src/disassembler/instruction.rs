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

//! Decoded instruction representation and symbol resolution.
//!
//! [`Instruction`] is the unit the rest of the crate consumes: a fixed header
//! (offset, width, opcode, control flow class) plus a fully rendered text form
//! and the relative branch targets needed for block construction. Rendering
//! happens at decode time so that callers holding a [`SymbolResolver`] get
//! human-readable constant pool references baked into the text.

use std::fmt;

/// Control flow behavior of an instruction, as recorded in the opcode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowType {
    /// Execution continues at the next instruction
    Sequential,
    /// Unconditional jump, the `goto` family
    Branch,
    /// Two-way branch, the `if-*` family
    ConditionalBranch,
    /// Multi-way dispatch via `packed-switch` or `sparse-switch`
    Switch,
    /// Method exit, the `return*` family
    Return,
    /// Raises an exception
    Throw,
}

/// One decoded Dalvik instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Code unit offset where this instruction starts, within its method
    pub offset: u32,
    /// Width in 16-bit code units
    pub size: u32,
    /// Low byte of the first code unit
    pub opcode: u8,
    /// Instruction name from the opcode table
    pub mnemonic: &'static str,
    /// Control flow class
    pub flow_type: FlowType,
    /// Rendered text, mnemonic followed by its operands
    pub text: String,
    /// Branch targets in code units, relative to [`Instruction::offset`].
    ///
    /// Populated for branches, conditional branches and switches. Switch
    /// targets come from the referenced payload, in case order.
    pub branch_targets: Vec<i64>,
}

impl Instruction {
    /// Code unit offset immediately after this instruction.
    #[must_use]
    pub const fn end_offset(&self) -> u32 {
        self.offset + self.size
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Resolves constant pool indices to printable names.
///
/// The decoder renders operands through this trait so that instruction text
/// carries real symbol names instead of bare pool indices. [`crate::dex::Dex`]
/// implements it over its own tables; passing no resolver falls back to
/// placeholder forms such as `string@7` or `method@42`.
pub trait SymbolResolver {
    /// Look up a string pool entry.
    fn string_ref(&self, index: u32) -> Option<String>;
    /// Look up a type descriptor.
    fn type_ref(&self, index: u32) -> Option<String>;
    /// Render a field reference, declaring type, name and field type.
    fn field_ref(&self, index: u32) -> Option<String>;
    /// Render a method reference, declaring type, name and descriptor.
    fn method_ref(&self, index: u32) -> Option<String>;
    /// Render a prototype descriptor.
    fn proto_ref(&self, index: u32) -> Option<String>;
}

/// Which constant pool a symbolic operand indexes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RefKind {
    String,
    Type,
    Field,
    Method,
    Proto,
    CallSite,
    MethodHandle,
}

impl RefKind {
    /// Render a pool reference, falling back to `kind@index` when no resolver
    /// is available or the index does not resolve.
    pub(crate) fn render(self, resolver: Option<&dyn SymbolResolver>, index: u32) -> String {
        let resolved = match (self, resolver) {
            (RefKind::String, Some(symbols)) => symbols
                .string_ref(index)
                .map(|value| format!("\"{}\"", value.escape_default())),
            (RefKind::Type, Some(symbols)) => symbols.type_ref(index),
            (RefKind::Field, Some(symbols)) => symbols.field_ref(index),
            (RefKind::Method, Some(symbols)) => symbols.method_ref(index),
            (RefKind::Proto, Some(symbols)) => symbols.proto_ref(index),
            // Call sites and method handles have no rendered form.
            _ => None,
        };

        resolved.unwrap_or_else(|| {
            let pool = match self {
                RefKind::String => "string",
                RefKind::Type => "type",
                RefKind::Field => "field",
                RefKind::Method => "method",
                RefKind::Proto => "proto",
                RefKind::CallSite => "call_site",
                RefKind::MethodHandle => "method_handle",
            };
            format!("{pool}@{index}")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OneString;

    impl SymbolResolver for OneString {
        fn string_ref(&self, index: u32) -> Option<String> {
            (index == 0).then(|| String::from("hello\nworld"))
        }

        fn type_ref(&self, _index: u32) -> Option<String> {
            None
        }

        fn field_ref(&self, _index: u32) -> Option<String> {
            None
        }

        fn method_ref(&self, _index: u32) -> Option<String> {
            None
        }

        fn proto_ref(&self, _index: u32) -> Option<String> {
            None
        }
    }

    #[test]
    fn string_refs_are_quoted_and_escaped() {
        let text = RefKind::String.render(Some(&OneString), 0);
        assert_eq!(text, "\"hello\\nworld\"");
    }

    #[test]
    fn unresolved_refs_fall_back_to_pool_index() {
        assert_eq!(RefKind::String.render(None, 7), "string@7");
        assert_eq!(RefKind::Method.render(Some(&OneString), 42), "method@42");
        assert_eq!(RefKind::CallSite.render(Some(&OneString), 3), "call_site@3");
    }

    #[test]
    fn end_offset_spans_instruction_width() {
        let instruction = Instruction {
            offset: 4,
            size: 3,
            opcode: 0x14,
            mnemonic: "const",
            flow_type: FlowType::Sequential,
            text: String::from("const v0, #70000"),
            branch_targets: Vec::new(),
        };
        assert_eq!(instruction.end_offset(), 7);
    }
}
