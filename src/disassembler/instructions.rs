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

//! Static reference table for the Dalvik instruction set.
//!
//! One [`Opcode`] entry per possible low byte of the first code unit, indexed
//! directly by that byte. Entries for the gaps in the instruction set carry an
//! empty mnemonic and are rejected by the decoder. Encoding layouts follow the
//! format identifiers from the Dalvik bytecode reference (`10x`, `22t`, `35c`,
//! and so on), which fix the width of every instruction up front.

use super::instruction::FlowType::{self, *};
use self::Format::*;

/// Instruction encoding format identifier.
///
/// The two leading digits of each name give the width in 16-bit code units and
/// the register count, mirroring the naming used by the bytecode reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Format {
    Format10x,
    Format12x,
    Format11n,
    Format11x,
    Format10t,
    Format20t,
    Format22x,
    Format21t,
    Format21s,
    Format21h,
    Format21c,
    Format23x,
    Format22b,
    Format22t,
    Format22s,
    Format22c,
    Format30t,
    Format32x,
    Format31i,
    Format31t,
    Format31c,
    Format35c,
    Format3rc,
    Format45cc,
    Format4rcc,
    Format51l,
}

impl Format {
    /// Width of an instruction in this format, in 16-bit code units.
    #[must_use]
    pub const fn units(self) -> u32 {
        match self {
            Format10x | Format12x | Format11n | Format11x | Format10t => 1,
            Format20t | Format22x | Format21t | Format21s | Format21h | Format21c | Format23x
            | Format22b | Format22t | Format22s | Format22c => 2,
            Format30t | Format32x | Format31i | Format31t | Format31c | Format35c | Format3rc => 3,
            Format45cc | Format4rcc => 4,
            Format51l => 5,
        }
    }
}

/// Static description of one Dalvik opcode.
#[derive(Debug, Clone, Copy)]
pub struct Opcode {
    /// Instruction name, empty for unused opcode values
    pub mnemonic: &'static str,
    /// Encoding layout, determines width and operand extraction
    pub format: Format,
    /// Control flow class
    pub flow: FlowType,
}

const fn op(mnemonic: &'static str, format: Format, flow: FlowType) -> Opcode {
    Opcode {
        mnemonic,
        format,
        flow,
    }
}

const UNUSED: Opcode = op("", Format10x, Sequential);

/// Opcode lookup table, indexed by the low byte of the first code unit.
#[rustfmt::skip]
pub const OPCODES: [Opcode; 256] = [
    op("nop", Format10x, Sequential),                       // 0x00
    op("move", Format12x, Sequential),                      // 0x01
    op("move/from16", Format22x, Sequential),               // 0x02
    op("move/16", Format32x, Sequential),                   // 0x03
    op("move-wide", Format12x, Sequential),                 // 0x04
    op("move-wide/from16", Format22x, Sequential),          // 0x05
    op("move-wide/16", Format32x, Sequential),              // 0x06
    op("move-object", Format12x, Sequential),               // 0x07
    op("move-object/from16", Format22x, Sequential),        // 0x08
    op("move-object/16", Format32x, Sequential),            // 0x09
    op("move-result", Format11x, Sequential),               // 0x0A
    op("move-result-wide", Format11x, Sequential),          // 0x0B
    op("move-result-object", Format11x, Sequential),        // 0x0C
    op("move-exception", Format11x, Sequential),            // 0x0D
    op("return-void", Format10x, Return),                   // 0x0E
    op("return", Format11x, Return),                        // 0x0F
    op("return-wide", Format11x, Return),                   // 0x10
    op("return-object", Format11x, Return),                 // 0x11
    op("const/4", Format11n, Sequential),                   // 0x12
    op("const/16", Format21s, Sequential),                  // 0x13
    op("const", Format31i, Sequential),                     // 0x14
    op("const/high16", Format21h, Sequential),              // 0x15
    op("const-wide/16", Format21s, Sequential),             // 0x16
    op("const-wide/32", Format31i, Sequential),             // 0x17
    op("const-wide", Format51l, Sequential),                // 0x18
    op("const-wide/high16", Format21h, Sequential),         // 0x19
    op("const-string", Format21c, Sequential),              // 0x1A
    op("const-string/jumbo", Format31c, Sequential),        // 0x1B
    op("const-class", Format21c, Sequential),               // 0x1C
    op("monitor-enter", Format11x, Sequential),             // 0x1D
    op("monitor-exit", Format11x, Sequential),              // 0x1E
    op("check-cast", Format21c, Sequential),                // 0x1F
    op("instance-of", Format22c, Sequential),               // 0x20
    op("array-length", Format12x, Sequential),              // 0x21
    op("new-instance", Format21c, Sequential),              // 0x22
    op("new-array", Format22c, Sequential),                 // 0x23
    op("filled-new-array", Format35c, Sequential),          // 0x24
    op("filled-new-array/range", Format3rc, Sequential),    // 0x25
    op("fill-array-data", Format31t, Sequential),           // 0x26
    op("throw", Format11x, Throw),                          // 0x27
    op("goto", Format10t, Branch),                          // 0x28
    op("goto/16", Format20t, Branch),                       // 0x29
    op("goto/32", Format30t, Branch),                       // 0x2A
    op("packed-switch", Format31t, Switch),                 // 0x2B
    op("sparse-switch", Format31t, Switch),                 // 0x2C
    op("cmpl-float", Format23x, Sequential),                // 0x2D
    op("cmpg-float", Format23x, Sequential),                // 0x2E
    op("cmpl-double", Format23x, Sequential),               // 0x2F
    op("cmpg-double", Format23x, Sequential),               // 0x30
    op("cmp-long", Format23x, Sequential),                  // 0x31
    op("if-eq", Format22t, ConditionalBranch),              // 0x32
    op("if-ne", Format22t, ConditionalBranch),              // 0x33
    op("if-lt", Format22t, ConditionalBranch),              // 0x34
    op("if-ge", Format22t, ConditionalBranch),              // 0x35
    op("if-gt", Format22t, ConditionalBranch),              // 0x36
    op("if-le", Format22t, ConditionalBranch),              // 0x37
    op("if-eqz", Format21t, ConditionalBranch),             // 0x38
    op("if-nez", Format21t, ConditionalBranch),             // 0x39
    op("if-ltz", Format21t, ConditionalBranch),             // 0x3A
    op("if-gez", Format21t, ConditionalBranch),             // 0x3B
    op("if-gtz", Format21t, ConditionalBranch),             // 0x3C
    op("if-lez", Format21t, ConditionalBranch),             // 0x3D
    UNUSED,                                                 // 0x3E
    UNUSED,                                                 // 0x3F
    UNUSED,                                                 // 0x40
    UNUSED,                                                 // 0x41
    UNUSED,                                                 // 0x42
    UNUSED,                                                 // 0x43
    op("aget", Format23x, Sequential),                      // 0x44
    op("aget-wide", Format23x, Sequential),                 // 0x45
    op("aget-object", Format23x, Sequential),               // 0x46
    op("aget-boolean", Format23x, Sequential),              // 0x47
    op("aget-byte", Format23x, Sequential),                 // 0x48
    op("aget-char", Format23x, Sequential),                 // 0x49
    op("aget-short", Format23x, Sequential),                // 0x4A
    op("aput", Format23x, Sequential),                      // 0x4B
    op("aput-wide", Format23x, Sequential),                 // 0x4C
    op("aput-object", Format23x, Sequential),               // 0x4D
    op("aput-boolean", Format23x, Sequential),              // 0x4E
    op("aput-byte", Format23x, Sequential),                 // 0x4F
    op("aput-char", Format23x, Sequential),                 // 0x50
    op("aput-short", Format23x, Sequential),                // 0x51
    op("iget", Format22c, Sequential),                      // 0x52
    op("iget-wide", Format22c, Sequential),                 // 0x53
    op("iget-object", Format22c, Sequential),               // 0x54
    op("iget-boolean", Format22c, Sequential),              // 0x55
    op("iget-byte", Format22c, Sequential),                 // 0x56
    op("iget-char", Format22c, Sequential),                 // 0x57
    op("iget-short", Format22c, Sequential),                // 0x58
    op("iput", Format22c, Sequential),                      // 0x59
    op("iput-wide", Format22c, Sequential),                 // 0x5A
    op("iput-object", Format22c, Sequential),               // 0x5B
    op("iput-boolean", Format22c, Sequential),               // 0x5C
    op("iput-byte", Format22c, Sequential),                 // 0x5D
    op("iput-char", Format22c, Sequential),                 // 0x5E
    op("iput-short", Format22c, Sequential),                // 0x5F
    op("sget", Format21c, Sequential),                      // 0x60
    op("sget-wide", Format21c, Sequential),                 // 0x61
    op("sget-object", Format21c, Sequential),               // 0x62
    op("sget-boolean", Format21c, Sequential),               // 0x63
    op("sget-byte", Format21c, Sequential),                 // 0x64
    op("sget-char", Format21c, Sequential),                 // 0x65
    op("sget-short", Format21c, Sequential),                // 0x66
    op("sput", Format21c, Sequential),                      // 0x67
    op("sput-wide", Format21c, Sequential),                 // 0x68
    op("sput-object", Format21c, Sequential),               // 0x69
    op("sput-boolean", Format21c, Sequential),               // 0x6A
    op("sput-byte", Format21c, Sequential),                 // 0x6B
    op("sput-char", Format21c, Sequential),                 // 0x6C
    op("sput-short", Format21c, Sequential),                // 0x6D
    op("invoke-virtual", Format35c, Sequential),            // 0x6E
    op("invoke-super", Format35c, Sequential),              // 0x6F
    op("invoke-direct", Format35c, Sequential),             // 0x70
    op("invoke-static", Format35c, Sequential),             // 0x71
    op("invoke-interface", Format35c, Sequential),          // 0x72
    UNUSED,                                                 // 0x73
    op("invoke-virtual/range", Format3rc, Sequential),      // 0x74
    op("invoke-super/range", Format3rc, Sequential),        // 0x75
    op("invoke-direct/range", Format3rc, Sequential),       // 0x76
    op("invoke-static/range", Format3rc, Sequential),       // 0x77
    op("invoke-interface/range", Format3rc, Sequential),    // 0x78
    UNUSED,                                                 // 0x79
    UNUSED,                                                 // 0x7A
    op("neg-int", Format12x, Sequential),                   // 0x7B
    op("not-int", Format12x, Sequential),                   // 0x7C
    op("neg-long", Format12x, Sequential),                  // 0x7D
    op("not-long", Format12x, Sequential),                  // 0x7E
    op("neg-float", Format12x, Sequential),                 // 0x7F
    op("neg-double", Format12x, Sequential),                // 0x80
    op("int-to-long", Format12x, Sequential),               // 0x81
    op("int-to-float", Format12x, Sequential),              // 0x82
    op("int-to-double", Format12x, Sequential),             // 0x83
    op("long-to-int", Format12x, Sequential),               // 0x84
    op("long-to-float", Format12x, Sequential),             // 0x85
    op("long-to-double", Format12x, Sequential),            // 0x86
    op("float-to-int", Format12x, Sequential),              // 0x87
    op("float-to-long", Format12x, Sequential),             // 0x88
    op("float-to-double", Format12x, Sequential),           // 0x89
    op("double-to-int", Format12x, Sequential),             // 0x8A
    op("double-to-long", Format12x, Sequential),            // 0x8B
    op("double-to-float", Format12x, Sequential),           // 0x8C
    op("int-to-byte", Format12x, Sequential),               // 0x8D
    op("int-to-char", Format12x, Sequential),               // 0x8E
    op("int-to-short", Format12x, Sequential),              // 0x8F
    op("add-int", Format23x, Sequential),                   // 0x90
    op("sub-int", Format23x, Sequential),                   // 0x91
    op("mul-int", Format23x, Sequential),                   // 0x92
    op("div-int", Format23x, Sequential),                   // 0x93
    op("rem-int", Format23x, Sequential),                   // 0x94
    op("and-int", Format23x, Sequential),                   // 0x95
    op("or-int", Format23x, Sequential),                    // 0x96
    op("xor-int", Format23x, Sequential),                   // 0x97
    op("shl-int", Format23x, Sequential),                   // 0x98
    op("shr-int", Format23x, Sequential),                   // 0x99
    op("ushr-int", Format23x, Sequential),                  // 0x9A
    op("add-long", Format23x, Sequential),                  // 0x9B
    op("sub-long", Format23x, Sequential),                  // 0x9C
    op("mul-long", Format23x, Sequential),                  // 0x9D
    op("div-long", Format23x, Sequential),                  // 0x9E
    op("rem-long", Format23x, Sequential),                  // 0x9F
    op("and-long", Format23x, Sequential),                  // 0xA0
    op("or-long", Format23x, Sequential),                   // 0xA1
    op("xor-long", Format23x, Sequential),                  // 0xA2
    op("shl-long", Format23x, Sequential),                  // 0xA3
    op("shr-long", Format23x, Sequential),                  // 0xA4
    op("ushr-long", Format23x, Sequential),                 // 0xA5
    op("add-float", Format23x, Sequential),                 // 0xA6
    op("sub-float", Format23x, Sequential),                 // 0xA7
    op("mul-float", Format23x, Sequential),                 // 0xA8
    op("div-float", Format23x, Sequential),                 // 0xA9
    op("rem-float", Format23x, Sequential),                 // 0xAA
    op("add-double", Format23x, Sequential),                // 0xAB
    op("sub-double", Format23x, Sequential),                // 0xAC
    op("mul-double", Format23x, Sequential),                // 0xAD
    op("div-double", Format23x, Sequential),                // 0xAE
    op("rem-double", Format23x, Sequential),                // 0xAF
    op("add-int/2addr", Format12x, Sequential),             // 0xB0
    op("sub-int/2addr", Format12x, Sequential),             // 0xB1
    op("mul-int/2addr", Format12x, Sequential),             // 0xB2
    op("div-int/2addr", Format12x, Sequential),             // 0xB3
    op("rem-int/2addr", Format12x, Sequential),             // 0xB4
    op("and-int/2addr", Format12x, Sequential),             // 0xB5
    op("or-int/2addr", Format12x, Sequential),              // 0xB6
    op("xor-int/2addr", Format12x, Sequential),             // 0xB7
    op("shl-int/2addr", Format12x, Sequential),             // 0xB8
    op("shr-int/2addr", Format12x, Sequential),             // 0xB9
    op("ushr-int/2addr", Format12x, Sequential),            // 0xBA
    op("add-long/2addr", Format12x, Sequential),            // 0xBB
    op("sub-long/2addr", Format12x, Sequential),            // 0xBC
    op("mul-long/2addr", Format12x, Sequential),            // 0xBD
    op("div-long/2addr", Format12x, Sequential),            // 0xBE
    op("rem-long/2addr", Format12x, Sequential),            // 0xBF
    op("and-long/2addr", Format12x, Sequential),            // 0xC0
    op("or-long/2addr", Format12x, Sequential),             // 0xC1
    op("xor-long/2addr", Format12x, Sequential),            // 0xC2
    op("shl-long/2addr", Format12x, Sequential),            // 0xC3
    op("shr-long/2addr", Format12x, Sequential),            // 0xC4
    op("ushr-long/2addr", Format12x, Sequential),           // 0xC5
    op("add-float/2addr", Format12x, Sequential),           // 0xC6
    op("sub-float/2addr", Format12x, Sequential),           // 0xC7
    op("mul-float/2addr", Format12x, Sequential),           // 0xC8
    op("div-float/2addr", Format12x, Sequential),           // 0xC9
    op("rem-float/2addr", Format12x, Sequential),           // 0xCA
    op("add-double/2addr", Format12x, Sequential),          // 0xCB
    op("sub-double/2addr", Format12x, Sequential),          // 0xCC
    op("mul-double/2addr", Format12x, Sequential),          // 0xCD
    op("div-double/2addr", Format12x, Sequential),          // 0xCE
    op("rem-double/2addr", Format12x, Sequential),          // 0xCF
    op("add-int/lit16", Format22s, Sequential),             // 0xD0
    op("rsub-int", Format22s, Sequential),                  // 0xD1
    op("mul-int/lit16", Format22s, Sequential),             // 0xD2
    op("div-int/lit16", Format22s, Sequential),             // 0xD3
    op("rem-int/lit16", Format22s, Sequential),             // 0xD4
    op("and-int/lit16", Format22s, Sequential),             // 0xD5
    op("or-int/lit16", Format22s, Sequential),              // 0xD6
    op("xor-int/lit16", Format22s, Sequential),             // 0xD7
    op("add-int/lit8", Format22b, Sequential),              // 0xD8
    op("rsub-int/lit8", Format22b, Sequential),             // 0xD9
    op("mul-int/lit8", Format22b, Sequential),              // 0xDA
    op("div-int/lit8", Format22b, Sequential),              // 0xDB
    op("rem-int/lit8", Format22b, Sequential),              // 0xDC
    op("and-int/lit8", Format22b, Sequential),              // 0xDD
    op("or-int/lit8", Format22b, Sequential),               // 0xDE
    op("xor-int/lit8", Format22b, Sequential),              // 0xDF
    op("shl-int/lit8", Format22b, Sequential),              // 0xE0
    op("shr-int/lit8", Format22b, Sequential),              // 0xE1
    op("ushr-int/lit8", Format22b, Sequential),             // 0xE2
    UNUSED,                                                 // 0xE3
    UNUSED,                                                 // 0xE4
    UNUSED,                                                 // 0xE5
    UNUSED,                                                 // 0xE6
    UNUSED,                                                 // 0xE7
    UNUSED,                                                 // 0xE8
    UNUSED,                                                 // 0xE9
    UNUSED,                                                 // 0xEA
    UNUSED,                                                 // 0xEB
    UNUSED,                                                 // 0xEC
    UNUSED,                                                 // 0xED
    UNUSED,                                                 // 0xEE
    UNUSED,                                                 // 0xEF
    UNUSED,                                                 // 0xF0
    UNUSED,                                                 // 0xF1
    UNUSED,                                                 // 0xF2
    UNUSED,                                                 // 0xF3
    UNUSED,                                                 // 0xF4
    UNUSED,                                                 // 0xF5
    UNUSED,                                                 // 0xF6
    UNUSED,                                                 // 0xF7
    UNUSED,                                                 // 0xF8
    UNUSED,                                                 // 0xF9
    op("invoke-polymorphic", Format45cc, Sequential),       // 0xFA
    op("invoke-polymorphic/range", Format4rcc, Sequential), // 0xFB
    op("invoke-custom", Format35c, Sequential),             // 0xFC
    op("invoke-custom/range", Format3rc, Sequential),       // 0xFD
    op("const-method-handle", Format21c, Sequential),       // 0xFE
    op("const-method-type", Format21c, Sequential),         // 0xFF
];
