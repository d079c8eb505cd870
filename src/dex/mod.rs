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

//! DEX file parsing.
//!
//! This module turns the raw bytes of a `classes.dex` entry into typed access to
//! everything the disassembler and the reports need: decoded strings, type and
//! prototype descriptors, class definitions with their method lists, and
//! per-method [`CodeItem`]s.
//!
//! # Architecture
//!
//! [`Dex::parse`] validates the [`DexHeader`] and eagerly reads the fixed-width
//! identifier tables (strings, types, prototypes, fields, methods, classes).
//! The variable-width structures hanging off the class definitions —
//! `class_data_item` and `code_item` — are decoded on demand through
//! [`Dex::class_data`] and [`Dex::code_item`], so packages where only a few
//! classes matter never pay for the rest.
//!
//! Identity lookups mirror the two-sided error model of the tables: plain index
//! lookups (`string`, `type_descriptor`) return `Option` and leave policy to
//! the caller, while the composite builders ([`Dex::method_signature`],
//! [`Dex::proto_descriptor`]) return `Result` because a dangling index inside
//! them means the file itself is inconsistent.
//!
//! # Example
//!
//! ```rust,no_run
//! use dexscope::dex::Dex;
//!
//! let data = std::fs::read("classes.dex")?;
//! let dex = Dex::parse(&data)?;
//!
//! for class in dex.class_defs() {
//!     if let Some(descriptor) = dex.type_descriptor(class.class_idx) {
//!         println!("{descriptor}");
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Reference
//! - [Dalvik Executable format](https://source.android.com/docs/core/runtime/dex-format)

mod code;
mod header;
mod methods;
mod strings;
mod types;

use std::fmt;

use crate::{disassembler::SymbolResolver, file::parser::Parser, Result};

pub use code::{CatchHandler, CatchHandlers, CodeItem, TryItem};
pub use header::{DexHeader, ENDIAN_CONSTANT, HEADER_SIZE, REVERSE_ENDIAN_CONSTANT};
pub use methods::{ClassData, ClassDef, EncodedMethod, MethodAccess};

use methods::{FieldId, MethodId};
use strings::StringPool;
use types::ProtoId;

/// Sentinel index meaning "no value", used by class definitions for absent
/// superclasses and unknown source files.
pub const NO_INDEX: u32 = 0xFFFF_FFFF;

/// Seek a parser to a table of `count` fixed-size entries, validating that the
/// whole table lies inside `data` first. The up-front check also bounds the
/// capacity the table readers allocate.
pub(crate) fn table_parser(data: &[u8], offset: u32, count: u32, entry_size: u32) -> Result<Parser<'_>> {
    let end = u64::from(offset) + u64::from(count) * u64::from(entry_size);
    if end > data.len() as u64 {
        return Err(malformed_error!(
            "Table at 0x{:X} with {} entries of {} bytes exceeds file size",
            offset,
            count,
            entry_size
        ));
    }

    let mut parser = Parser::new(data);
    parser.seek(offset as usize)?;
    Ok(parser)
}

/// A parsed DEX file borrowing the raw bytes it was created from.
pub struct Dex<'data> {
    data: &'data [u8],
    header: DexHeader,
    strings: StringPool,
    type_ids: Vec<u32>,
    protos: Vec<ProtoId>,
    fields: Vec<FieldId>,
    method_ids: Vec<MethodId>,
    class_defs: Vec<ClassDef>,
}

impl<'data> Dex<'data> {
    /// Parse a DEX file from raw bytes.
    ///
    /// # Errors
    /// Returns an error if the header is invalid or any identifier table lies
    /// outside the file or fails to decode.
    pub fn parse(data: &'data [u8]) -> Result<Dex<'data>> {
        let header = DexHeader::read(data)?;

        let strings = StringPool::parse(data, header.string_ids_off, header.string_ids_size)?;
        let type_ids = types::parse_type_ids(data, header.type_ids_off, header.type_ids_size)?;
        let protos = types::parse_proto_ids(data, header.proto_ids_off, header.proto_ids_size)?;
        let fields = methods::parse_field_ids(data, header.field_ids_off, header.field_ids_size)?;
        let method_ids =
            methods::parse_method_ids(data, header.method_ids_off, header.method_ids_size)?;
        let class_defs =
            methods::parse_class_defs(data, header.class_defs_off, header.class_defs_size)?;

        Ok(Dex {
            data,
            header,
            strings,
            type_ids,
            protos,
            fields,
            method_ids,
            class_defs,
        })
    }

    /// The validated file header.
    #[must_use]
    pub fn header(&self) -> &DexHeader {
        &self.header
    }

    /// Look up a string by `string_idx`.
    #[must_use]
    pub fn string(&self, index: u32) -> Option<&str> {
        self.strings.get(index)
    }

    /// Number of decoded strings.
    #[must_use]
    pub fn string_count(&self) -> usize {
        self.strings.len()
    }

    /// Look up a type descriptor such as `Lcom/example/Main;` by `type_idx`.
    #[must_use]
    pub fn type_descriptor(&self, index: u32) -> Option<&str> {
        let string_idx = *self.type_ids.get(index as usize)?;
        self.strings.get(string_idx)
    }

    /// All class definitions in file order.
    #[must_use]
    pub fn class_defs(&self) -> &[ClassDef] {
        &self.class_defs
    }

    /// Decode the field and method lists of a class definition.
    ///
    /// Returns `None` for marker classes without a `class_data_item`.
    ///
    /// # Errors
    /// Returns an error if the item is malformed.
    pub fn class_data(&self, class: &ClassDef) -> Result<Option<ClassData>> {
        methods::parse_class_data(self.data, class.class_data_off)
    }

    /// Decode the body of a declared method.
    ///
    /// Returns `None` for abstract and native methods, which carry no bytecode.
    ///
    /// # Errors
    /// Returns an error if the `code_item` is malformed.
    pub fn code_item(&self, method: &EncodedMethod) -> Result<Option<CodeItem>> {
        if method.code_off == 0 {
            return Ok(None);
        }
        code::parse_code_item(self.data, method.code_off).map(Some)
    }

    /// Build the Smali-style descriptor of a prototype, e.g. `(ILjava/lang/String;)V`.
    ///
    /// # Errors
    /// Returns an error if the prototype index or any type index it references
    /// is out of range.
    pub fn proto_descriptor(&self, index: u32) -> Result<String> {
        let Some(proto) = self.protos.get(index as usize) else {
            return Err(malformed_error!("Prototype index {} out of range", index));
        };

        let mut descriptor = String::from("(");
        for type_idx in types::parse_type_list(self.data, proto.parameters_off)? {
            let param = self.type_descriptor(u32::from(type_idx)).ok_or_else(|| {
                malformed_error!("Prototype parameter references unknown type index {}", type_idx)
            })?;
            descriptor.push_str(param);
        }
        descriptor.push(')');

        let ret = self.type_descriptor(proto.return_type_idx).ok_or_else(|| {
            malformed_error!(
                "Prototype return references unknown type index {}",
                proto.return_type_idx
            )
        })?;
        descriptor.push_str(ret);

        Ok(descriptor)
    }

    /// Resolve a `method_idx` to its full identity: declaring class, name, and
    /// prototype descriptor.
    ///
    /// # Errors
    /// Returns an error if the method index or anything it references is out
    /// of range.
    pub fn method_signature(&self, index: u32) -> Result<MethodSignature> {
        let Some(method) = self.method_ids.get(index as usize) else {
            return Err(malformed_error!("Method index {} out of range", index));
        };

        let class = self
            .type_descriptor(u32::from(method.class_idx))
            .ok_or_else(|| {
                malformed_error!(
                    "Method references unknown declaring type index {}",
                    method.class_idx
                )
            })?
            .to_string();
        let name = self
            .string(method.name_idx)
            .ok_or_else(|| {
                malformed_error!("Method references unknown name index {}", method.name_idx)
            })?
            .to_string();
        let descriptor = self.proto_descriptor(u32::from(method.proto_idx))?;

        Ok(MethodSignature {
            class,
            name,
            descriptor,
        })
    }
}

impl SymbolResolver for Dex<'_> {
    fn string_ref(&self, index: u32) -> Option<String> {
        self.string(index).map(str::to_string)
    }

    fn type_ref(&self, index: u32) -> Option<String> {
        self.type_descriptor(index).map(str::to_string)
    }

    fn field_ref(&self, index: u32) -> Option<String> {
        let field = self.fields.get(index as usize)?;
        let class = self.type_descriptor(u32::from(field.class_idx))?;
        let name = self.string(field.name_idx)?;
        let ty = self.type_descriptor(u32::from(field.type_idx))?;
        Some(format!("{class}->{name}:{ty}"))
    }

    fn method_ref(&self, index: u32) -> Option<String> {
        self.method_signature(index).ok().map(|sig| sig.to_string())
    }

    fn proto_ref(&self, index: u32) -> Option<String> {
        self.proto_descriptor(index).ok()
    }
}

/// The full identity of a method: exactly the strings embedded in graph node
/// identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    /// Declaring type descriptor, e.g. `Lcom/example/Main;`
    pub class: String,
    /// Method name
    pub name: String,
    /// Prototype descriptor, e.g. `(II)V`
    pub descriptor: String,
}

impl fmt::Display for MethodSignature {
    /// Formats as `Lcom/example/Main;->onCreate(Landroid/os/Bundle;)V`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}{}", self.class, self.name, self.descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{CodeSpec, DexBuilder};

    fn two_method_dex() -> Vec<u8> {
        let mut builder = DexBuilder::new();
        let run = builder.method("LTest;", "run", "V", &[]);
        let add = builder.method("LTest;", "add", "I", &["I", "Ljava/lang/String;"]);
        let class = builder.class("LTest;");
        builder.add_code_method(
            class,
            run,
            0x1,
            CodeSpec::new(1, vec![0x000E]), // return-void
        );
        builder.add_abstract_method(class, add, 0x401);
        builder.build()
    }

    #[test]
    fn parses_crafted_file() {
        let data = two_method_dex();
        let dex = Dex::parse(&data).unwrap();

        assert_eq!(dex.header().version(), 35);
        assert_eq!(dex.class_defs().len(), 1);
        assert!(dex.string_count() > 0);
    }

    #[test]
    fn method_signatures() {
        let data = two_method_dex();
        let dex = Dex::parse(&data).unwrap();

        let run = dex.method_signature(0).unwrap();
        assert_eq!(run.class, "LTest;");
        assert_eq!(run.name, "run");
        assert_eq!(run.descriptor, "()V");
        assert_eq!(run.to_string(), "LTest;->run()V");

        let add = dex.method_signature(1).unwrap();
        assert_eq!(add.descriptor, "(ILjava/lang/String;)I");
        assert_eq!(add.to_string(), "LTest;->add(ILjava/lang/String;)I");
    }

    #[test]
    fn method_signature_out_of_range() {
        let data = two_method_dex();
        let dex = Dex::parse(&data).unwrap();

        if dex.method_signature(99).is_ok() {
            panic!("This should not work!");
        }
    }

    #[test]
    fn code_items() {
        let data = two_method_dex();
        let dex = Dex::parse(&data).unwrap();

        let class_data = dex.class_data(&dex.class_defs()[0]).unwrap().unwrap();
        let methods: Vec<_> = class_data.methods().collect();
        assert_eq!(methods.len(), 2);

        let coded = dex.code_item(methods[0]).unwrap().unwrap();
        assert_eq!(coded.units, vec![0x000E]);
        assert_eq!(coded.registers_size, 1);

        assert!(methods[1].access_flags.contains(MethodAccess::ABSTRACT));
        assert!(dex.code_item(methods[1]).unwrap().is_none());
    }

    #[test]
    fn resolver_renders_references() {
        let data = two_method_dex();
        let dex = Dex::parse(&data).unwrap();

        assert_eq!(dex.type_ref(0), dex.type_descriptor(0).map(String::from));
        assert_eq!(dex.method_ref(0), Some("LTest;->run()V".to_string()));
        assert_eq!(dex.method_ref(99), None);
        assert_eq!(dex.string_ref(0xFFFF_0000), None);
        assert_eq!(dex.field_ref(0), None); // no field table entries
    }

    #[test]
    fn truncated_file_rejected() {
        let mut data = two_method_dex();
        data.truncate(0x80);
        // Keep the header intact but drop the tables it points at
        if Dex::parse(&data).is_ok() {
            panic!("This should not work!");
        }
    }
}
