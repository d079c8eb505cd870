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

//! Field, method, and class definition tables, plus `class_data_item` decoding.
//!
//! The fixed-width id tables (`field_ids`, `method_ids`, `class_defs`) are read
//! eagerly. The variable-width `class_data_item` each class definition points at
//! is decoded on demand: ULEB128 element counts followed by diff-encoded field
//! and method lists, where the first entry carries an absolute index and every
//! subsequent entry the difference to its predecessor.

use bitflags::bitflags;

use super::table_parser;
use crate::{file::parser::Parser, Result};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Access and property flags for methods (`access_flags` in `encoded_method`)
    pub struct MethodAccess: u32 {
        /// Visible everywhere
        const PUBLIC = 0x1;
        /// Only visible to the defining class
        const PRIVATE = 0x2;
        /// Visible to package and subclasses
        const PROTECTED = 0x4;
        /// Does not take a `this` argument
        const STATIC = 0x8;
        /// Not overridable
        const FINAL = 0x10;
        /// Lock is taken around the call
        const SYNCHRONIZED = 0x20;
        /// Compiler-generated bridge method
        const BRIDGE = 0x40;
        /// Last argument is a variadic rest array
        const VARARGS = 0x80;
        /// Implemented in native code, carries no bytecode
        const NATIVE = 0x100;
        /// Unimplemented by this class, carries no bytecode
        const ABSTRACT = 0x400;
        /// Declared `strictfp` in source
        const STRICT = 0x800;
        /// Not directly present in source code
        const SYNTHETIC = 0x1000;
        /// Constructor method
        const CONSTRUCTOR = 0x10000;
        /// Declared `synchronized` in source
        const DECLARED_SYNCHRONIZED = 0x20000;
    }
}

/// A field reference from the `field_ids` table.
pub(crate) struct FieldId {
    /// Index into `type_ids` for the declaring class
    pub(crate) class_idx: u16,
    /// Index into `type_ids` for the field type
    pub(crate) type_idx: u16,
    /// Index into the string pool for the field name
    pub(crate) name_idx: u32,
}

/// A method reference from the `method_ids` table.
pub(crate) struct MethodId {
    /// Index into `type_ids` for the declaring class
    pub(crate) class_idx: u16,
    /// Index into `proto_ids` for the method prototype
    pub(crate) proto_idx: u16,
    /// Index into the string pool for the method name
    pub(crate) name_idx: u32,
}

/// A class definition from the `class_defs` table.
pub struct ClassDef {
    /// Index into `type_ids` for this class
    pub class_idx: u32,
    /// Class-level access flags
    pub access_flags: u32,
    /// Index into `type_ids` for the superclass, [`NO_INDEX`](super::NO_INDEX) for none
    pub superclass_idx: u32,
    /// Offset of the implemented-interfaces `type_list`, 0 for none
    pub interfaces_off: u32,
    /// Index into the string pool for the source file name, [`NO_INDEX`](super::NO_INDEX) if unknown
    pub source_file_idx: u32,
    /// Offset of the annotations directory, 0 for none
    pub annotations_off: u32,
    /// Offset of the `class_data_item`, 0 for a class without fields or methods
    pub class_data_off: u32,
    /// Offset of the static field initial values, 0 for none
    pub static_values_off: u32,
}

/// A method declared by a class, with its decoded absolute method index.
pub struct EncodedMethod {
    /// Index into the `method_ids` table
    pub method_idx: u32,
    /// Access and property flags
    pub access_flags: MethodAccess,
    /// Offset of the `code_item`, 0 for abstract and native methods
    pub code_off: u32,
}

impl EncodedMethod {
    /// Whether this method carries bytecode to disassemble.
    #[must_use]
    pub const fn has_code(&self) -> bool {
        self.code_off != 0
    }
}

/// The decoded method lists of a single `class_data_item`.
///
/// Field entries are walked during parsing to locate the method lists but are
/// not retained.
pub struct ClassData {
    /// `static` and `private` methods plus constructors
    pub direct_methods: Vec<EncodedMethod>,
    /// Overridable instance methods
    pub virtual_methods: Vec<EncodedMethod>,
}

impl ClassData {
    /// All declared methods, direct first.
    pub fn methods(&self) -> impl Iterator<Item = &EncodedMethod> {
        self.direct_methods.iter().chain(self.virtual_methods.iter())
    }
}

/// Read the `field_ids` table of 8-byte field references.
pub(crate) fn parse_field_ids(data: &[u8], offset: u32, count: u32) -> Result<Vec<FieldId>> {
    let mut parser = table_parser(data, offset, count, 8)?;

    let mut fields = Vec::with_capacity(count as usize);
    for _ in 0..count {
        fields.push(FieldId {
            class_idx: parser.read_le::<u16>()?,
            type_idx: parser.read_le::<u16>()?,
            name_idx: parser.read_le::<u32>()?,
        });
    }
    Ok(fields)
}

/// Read the `method_ids` table of 8-byte method references.
pub(crate) fn parse_method_ids(data: &[u8], offset: u32, count: u32) -> Result<Vec<MethodId>> {
    let mut parser = table_parser(data, offset, count, 8)?;

    let mut methods = Vec::with_capacity(count as usize);
    for _ in 0..count {
        methods.push(MethodId {
            class_idx: parser.read_le::<u16>()?,
            proto_idx: parser.read_le::<u16>()?,
            name_idx: parser.read_le::<u32>()?,
        });
    }
    Ok(methods)
}

/// Read the `class_defs` table of 32-byte class definitions.
pub(crate) fn parse_class_defs(data: &[u8], offset: u32, count: u32) -> Result<Vec<ClassDef>> {
    let mut parser = table_parser(data, offset, count, 32)?;

    let mut classes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        classes.push(ClassDef {
            class_idx: parser.read_le::<u32>()?,
            access_flags: parser.read_le::<u32>()?,
            superclass_idx: parser.read_le::<u32>()?,
            interfaces_off: parser.read_le::<u32>()?,
            source_file_idx: parser.read_le::<u32>()?,
            annotations_off: parser.read_le::<u32>()?,
            class_data_off: parser.read_le::<u32>()?,
            static_values_off: parser.read_le::<u32>()?,
        });
    }
    Ok(classes)
}

/// Decode the `class_data_item` at `offset`.
///
/// An offset of zero means the class declares no fields or methods and yields
/// `None`.
///
/// # Errors
/// Returns an error if the item lies outside `data` or an index diff overflows.
pub(crate) fn parse_class_data(data: &[u8], offset: u32) -> Result<Option<ClassData>> {
    if offset == 0 {
        return Ok(None);
    }

    let mut parser = Parser::new(data);
    parser.seek(offset as usize)?;

    let static_fields = parser.read_uleb128()?;
    let instance_fields = parser.read_uleb128()?;
    let direct_count = parser.read_uleb128()?;
    let virtual_count = parser.read_uleb128()?;

    // Field entries are variable length, so they must be walked even though
    // only the method lists matter here.
    for _ in 0..u64::from(static_fields) + u64::from(instance_fields) {
        parser.read_uleb128()?; // field_idx_diff
        parser.read_uleb128()?; // access_flags
    }

    let direct_methods = read_encoded_methods(&mut parser, direct_count)?;
    let virtual_methods = read_encoded_methods(&mut parser, virtual_count)?;

    Ok(Some(ClassData {
        direct_methods,
        virtual_methods,
    }))
}

fn read_encoded_methods(parser: &mut Parser, count: u32) -> Result<Vec<EncodedMethod>> {
    // Each encoded method is at least three single-byte ULEB128 values, which
    // bounds the allocation for adversarial counts.
    if u64::from(count) * 3 > (parser.len() - parser.pos()) as u64 {
        return Err(malformed_error!(
            "Encoded method list with {} entries exceeds remaining data",
            count
        ));
    }

    let mut methods = Vec::with_capacity(count as usize);
    let mut method_idx = 0u32;

    for i in 0..count {
        let diff = parser.read_uleb128()?;
        method_idx = if i == 0 {
            diff
        } else {
            method_idx
                .checked_add(diff)
                .ok_or_else(|| malformed_error!("Method index diff overflow in class data"))?
        };

        let access_flags = parser.read_uleb128()?;
        let code_off = parser.read_uleb128()?;

        methods.push(EncodedMethod {
            method_idx,
            access_flags: MethodAccess::from_bits_truncate(access_flags),
            code_off,
        });
    }

    Ok(methods)
}
