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

//! Shared test fixtures.
//!
//! Real packages are too large to embed, so the tests assemble their own:
//! [`DexBuilder`] lays out a minimal but structurally valid DEX file — header,
//! identifier tables, string data, class data, and code items — from a handful
//! of declared methods, [`ZipBuilder`] wraps payloads into a well-formed
//! archive, and [`AxmlBuilder`] compiles element trees into binary XML.
//! Offsets are computed the same way the real tools would, which keeps the
//! fixtures honest against the parsers' bounds checks.


pub(crate) use axml::AxmlBuilder;
pub(crate) use zip::ZipBuilder;

use crate::dex::ENDIAN_CONSTANT;

/// Incrementally assembles an in-memory DEX file.
pub(crate) struct DexBuilder {
    strings: Vec<String>,
    types: Vec<u32>,
    protos: Vec<ProtoSpec>,
    methods: Vec<MethodIdSpec>,
    classes: Vec<ClassSpec>,
}

struct ProtoSpec {
    shorty_idx: u32,
    return_type_idx: u16,
    params: Vec<u16>,
}

struct MethodIdSpec {
    class_idx: u16,
    proto_idx: u16,
    name_idx: u32,
}

struct ClassSpec {
    type_idx: u16,
    methods: Vec<MethodSpec>,
}

struct MethodSpec {
    method_idx: u32,
    flags: u32,
    code: Option<ResolvedCode>,
}

struct ResolvedCode {
    registers: u16,
    units: Vec<u16>,
    tries: Vec<ResolvedTry>,
}

struct ResolvedTry {
    start: u32,
    count: u16,
    catches: Vec<(u16, u32)>,
    catch_all: Option<u32>,
}

/// A method body to attach to a declared method.
pub(crate) struct CodeSpec {
    pub(crate) registers: u16,
    pub(crate) units: Vec<u16>,
    pub(crate) tries: Vec<TrySpec>,
}

impl CodeSpec {
    pub(crate) fn new(registers: u16, units: Vec<u16>) -> CodeSpec {
        CodeSpec {
            registers,
            units,
            tries: Vec::new(),
        }
    }

    pub(crate) fn with_tries(registers: u16, units: Vec<u16>, tries: Vec<TrySpec>) -> CodeSpec {
        CodeSpec {
            registers,
            units,
            tries,
        }
    }
}

/// A guarded range with handlers, expressed in code-unit addresses.
pub(crate) struct TrySpec {
    pub(crate) start: u32,
    pub(crate) count: u16,
    /// `(exception type descriptor, handler address)` pairs
    pub(crate) catches: Vec<(String, u32)>,
    pub(crate) catch_all: Option<u32>,
}

impl DexBuilder {
    pub(crate) fn new() -> DexBuilder {
        DexBuilder {
            strings: Vec::new(),
            types: Vec::new(),
            protos: Vec::new(),
            methods: Vec::new(),
            classes: Vec::new(),
        }
    }

    /// Intern a string, returning its `string_idx`.
    pub(crate) fn string(&mut self, value: &str) -> u32 {
        if let Some(index) = self.strings.iter().position(|s| s == value) {
            return index as u32;
        }
        self.strings.push(value.to_string());
        (self.strings.len() - 1) as u32
    }

    /// Intern a type descriptor, returning its `type_idx`.
    pub(crate) fn type_id(&mut self, descriptor: &str) -> u16 {
        let string_idx = self.string(descriptor);
        if let Some(index) = self.types.iter().position(|&s| s == string_idx) {
            return index as u16;
        }
        self.types.push(string_idx);
        (self.types.len() - 1) as u16
    }

    fn proto(&mut self, ret: &str, params: &[&str]) -> u16 {
        let shorty: String = std::iter::once(shorty_char(ret))
            .chain(params.iter().map(|p| shorty_char(p)))
            .collect();
        let shorty_idx = self.string(&shorty);
        let return_type_idx = self.type_id(ret);
        let param_idxs: Vec<u16> = params.iter().map(|p| self.type_id(p)).collect();

        if let Some(index) = self
            .protos
            .iter()
            .position(|p| p.return_type_idx == return_type_idx && p.params == param_idxs)
        {
            return index as u16;
        }
        self.protos.push(ProtoSpec {
            shorty_idx,
            return_type_idx,
            params: param_idxs,
        });
        (self.protos.len() - 1) as u16
    }

    /// Declare a method id, returning its `method_idx`.
    pub(crate) fn method(&mut self, class: &str, name: &str, ret: &str, params: &[&str]) -> u32 {
        let class_idx = self.type_id(class);
        let proto_idx = self.proto(ret, params);
        let name_idx = self.string(name);

        self.methods.push(MethodIdSpec {
            class_idx,
            proto_idx,
            name_idx,
        });
        (self.methods.len() - 1) as u32
    }

    /// Declare a class definition, returning a slot for attaching methods.
    pub(crate) fn class(&mut self, descriptor: &str) -> usize {
        let type_idx = self.type_id(descriptor);
        self.classes.push(ClassSpec {
            type_idx,
            methods: Vec::new(),
        });
        self.classes.len() - 1
    }

    /// Attach a method with bytecode to a class.
    pub(crate) fn add_code_method(
        &mut self,
        class: usize,
        method_idx: u32,
        flags: u32,
        code: CodeSpec,
    ) {
        let tries = code
            .tries
            .into_iter()
            .map(|t| ResolvedTry {
                start: t.start,
                count: t.count,
                catches: t
                    .catches
                    .iter()
                    .map(|(descriptor, addr)| (self.type_id(descriptor), *addr))
                    .collect(),
                catch_all: t.catch_all,
            })
            .collect();

        self.classes[class].methods.push(MethodSpec {
            method_idx,
            flags,
            code: Some(ResolvedCode {
                registers: code.registers,
                units: code.units,
                tries,
            }),
        });
    }

    /// Attach a method without bytecode (abstract or native) to a class.
    pub(crate) fn add_abstract_method(&mut self, class: usize, method_idx: u32, flags: u32) {
        self.classes[class].methods.push(MethodSpec {
            method_idx,
            flags,
            code: None,
        });
    }

    /// Assemble the file.
    pub(crate) fn build(&self) -> Vec<u8> {
        let string_ids_off = 0x70_u32;
        let type_ids_off = string_ids_off + 4 * self.strings.len() as u32;
        let proto_ids_off = type_ids_off + 4 * self.types.len() as u32;
        let method_ids_off = proto_ids_off + 12 * self.protos.len() as u32;
        let class_defs_off = method_ids_off + 8 * self.methods.len() as u32;
        let data_off = class_defs_off + 32 * self.classes.len() as u32;

        let mut data = Vec::new();

        let mut string_offs = Vec::with_capacity(self.strings.len());
        for s in &self.strings {
            string_offs.push(data_off + data.len() as u32);
            push_uleb(&mut data, s.encode_utf16().count() as u32);
            push_mutf8(&mut data, s);
            data.push(0);
        }

        let mut param_offs = Vec::with_capacity(self.protos.len());
        for proto in &self.protos {
            if proto.params.is_empty() {
                param_offs.push(0);
                continue;
            }
            align4(&mut data, data_off);
            param_offs.push(data_off + data.len() as u32);
            data.extend_from_slice(&(proto.params.len() as u32).to_le_bytes());
            for &param in &proto.params {
                data.extend_from_slice(&param.to_le_bytes());
            }
        }

        let mut class_data_offs = Vec::with_capacity(self.classes.len());
        for class in &self.classes {
            let mut code_offs = Vec::with_capacity(class.methods.len());
            for method in &class.methods {
                match &method.code {
                    None => code_offs.push(0),
                    Some(code) => {
                        align4(&mut data, data_off);
                        code_offs.push(data_off + data.len() as u32);
                        push_code_item(&mut data, code);
                    }
                }
            }

            class_data_offs.push(data_off + data.len() as u32);
            push_uleb(&mut data, 0); // static fields
            push_uleb(&mut data, 0); // instance fields
            push_uleb(&mut data, class.methods.len() as u32); // all methods as direct
            push_uleb(&mut data, 0); // virtual methods

            let mut order: Vec<usize> = (0..class.methods.len()).collect();
            order.sort_by_key(|&i| class.methods[i].method_idx);

            let mut prev = 0_u32;
            for (n, &i) in order.iter().enumerate() {
                let method = &class.methods[i];
                let diff = if n == 0 {
                    method.method_idx
                } else {
                    method.method_idx - prev
                };
                prev = method.method_idx;
                push_uleb(&mut data, diff);
                push_uleb(&mut data, method.flags);
                push_uleb(&mut data, code_offs[i]);
            }
        }

        let file_size = data_off + data.len() as u32;
        let mut out = Vec::with_capacity(file_size as usize);

        out.extend_from_slice(b"dex\n035\0");
        out.extend_from_slice(&0_u32.to_le_bytes()); // checksum, never verified
        out.extend_from_slice(&[0_u8; 20]); // signature, never verified
        out.extend_from_slice(&file_size.to_le_bytes());
        out.extend_from_slice(&0x70_u32.to_le_bytes());
        out.extend_from_slice(&ENDIAN_CONSTANT.to_le_bytes());
        out.extend_from_slice(&0_u32.to_le_bytes()); // link_size
        out.extend_from_slice(&0_u32.to_le_bytes()); // link_off
        out.extend_from_slice(&0_u32.to_le_bytes()); // map_off
        out.extend_from_slice(&(self.strings.len() as u32).to_le_bytes());
        out.extend_from_slice(&string_ids_off.to_le_bytes());
        out.extend_from_slice(&(self.types.len() as u32).to_le_bytes());
        out.extend_from_slice(&type_ids_off.to_le_bytes());
        out.extend_from_slice(&(self.protos.len() as u32).to_le_bytes());
        out.extend_from_slice(&proto_ids_off.to_le_bytes());
        out.extend_from_slice(&0_u32.to_le_bytes()); // field_ids_size
        out.extend_from_slice(&0_u32.to_le_bytes()); // field_ids_off
        out.extend_from_slice(&(self.methods.len() as u32).to_le_bytes());
        out.extend_from_slice(&method_ids_off.to_le_bytes());
        out.extend_from_slice(&(self.classes.len() as u32).to_le_bytes());
        out.extend_from_slice(&class_defs_off.to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&data_off.to_le_bytes());

        for &off in &string_offs {
            out.extend_from_slice(&off.to_le_bytes());
        }
        for &string_idx in &self.types {
            out.extend_from_slice(&string_idx.to_le_bytes());
        }
        for (proto, &params_off) in self.protos.iter().zip(&param_offs) {
            out.extend_from_slice(&proto.shorty_idx.to_le_bytes());
            out.extend_from_slice(&u32::from(proto.return_type_idx).to_le_bytes());
            out.extend_from_slice(&params_off.to_le_bytes());
        }
        for method in &self.methods {
            out.extend_from_slice(&method.class_idx.to_le_bytes());
            out.extend_from_slice(&method.proto_idx.to_le_bytes());
            out.extend_from_slice(&method.name_idx.to_le_bytes());
        }
        for (class, &class_data_off) in self.classes.iter().zip(&class_data_offs) {
            out.extend_from_slice(&u32::from(class.type_idx).to_le_bytes()); // class_idx
            out.extend_from_slice(&0x1_u32.to_le_bytes()); // access_flags: public
            out.extend_from_slice(&crate::dex::NO_INDEX.to_le_bytes()); // superclass_idx
            out.extend_from_slice(&0_u32.to_le_bytes()); // interfaces_off
            out.extend_from_slice(&crate::dex::NO_INDEX.to_le_bytes()); // source_file_idx
            out.extend_from_slice(&0_u32.to_le_bytes()); // annotations_off
            out.extend_from_slice(&class_data_off.to_le_bytes());
            out.extend_from_slice(&0_u32.to_le_bytes()); // static_values_off
        }

        out.extend_from_slice(&data);
        out
    }
}

/// Build a file with one public method `LTest;->run()V` holding `units`.
pub(crate) fn single_method_dex(units: Vec<u16>) -> Vec<u8> {
    let mut builder = DexBuilder::new();
    let method = builder.method("LTest;", "run", "V", &[]);
    let class = builder.class("LTest;");
    builder.add_code_method(class, method, 0x1, CodeSpec::new(4, units));
    builder.build()
}

/// Like [`single_method_dex`] but with try/catch ranges attached.
pub(crate) fn single_method_dex_with_tries(
    registers: u16,
    units: Vec<u16>,
    tries: Vec<TrySpec>,
) -> Vec<u8> {
    let mut builder = DexBuilder::new();
    let method = builder.method("LTest;", "run", "V", &[]);
    let class = builder.class("LTest;");
    builder.add_code_method(
        class,
        method,
        0x1,
        CodeSpec::with_tries(registers, units, tries),
    );
    builder.build()
}

fn shorty_char(descriptor: &str) -> char {
    match descriptor.as_bytes().first() {
        Some(b'[') => 'L',
        Some(&b) => b as char,
        None => 'V',
    }
}

fn align4(data: &mut Vec<u8>, base: u32) {
    while (base as usize + data.len()) % 4 != 0 {
        data.push(0);
    }
}

fn push_code_item(data: &mut Vec<u8>, code: &ResolvedCode) {
    data.extend_from_slice(&code.registers.to_le_bytes());
    data.extend_from_slice(&0_u16.to_le_bytes()); // ins_size
    data.extend_from_slice(&0_u16.to_le_bytes()); // outs_size
    data.extend_from_slice(&(code.tries.len() as u16).to_le_bytes());
    data.extend_from_slice(&0_u32.to_le_bytes()); // debug_info_off
    data.extend_from_slice(&(code.units.len() as u32).to_le_bytes());
    for unit in &code.units {
        data.extend_from_slice(&unit.to_le_bytes());
    }

    if code.tries.is_empty() {
        return;
    }
    if code.units.len() % 2 == 1 {
        data.extend_from_slice(&0_u16.to_le_bytes()); // alignment unit
    }

    // The handler list is assembled first so each try can reference its
    // entry's offset within the list.
    let mut handlers = Vec::new();
    push_uleb(&mut handlers, code.tries.len() as u32);
    let mut entry_offs = Vec::with_capacity(code.tries.len());
    for t in &code.tries {
        entry_offs.push(handlers.len() as u16);
        let size = t.catches.len() as i32;
        push_sleb(&mut handlers, if t.catch_all.is_some() { -size } else { size });
        for &(type_idx, addr) in &t.catches {
            push_uleb(&mut handlers, u32::from(type_idx));
            push_uleb(&mut handlers, addr);
        }
        if let Some(addr) = t.catch_all {
            push_uleb(&mut handlers, addr);
        }
    }

    for (t, &off) in code.tries.iter().zip(&entry_offs) {
        data.extend_from_slice(&t.start.to_le_bytes());
        data.extend_from_slice(&t.count.to_le_bytes());
        data.extend_from_slice(&off.to_le_bytes());
    }
    data.extend_from_slice(&handlers);
}

fn push_uleb(data: &mut Vec<u8>, mut value: u32) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            data.push(byte);
            return;
        }
        data.push(byte | 0x80);
    }
}

fn push_sleb(data: &mut Vec<u8>, mut value: i32) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
        data.push(if done { byte } else { byte | 0x80 });
        if done {
            return;
        }
    }
}

fn push_mutf8(data: &mut Vec<u8>, value: &str) {
    for unit in value.encode_utf16() {
        match unit {
            0 => data.extend_from_slice(&[0xC0, 0x80]),
            0x01..=0x7F => data.push(unit as u8),
            0x80..=0x7FF => {
                data.push(0xC0 | (unit >> 6) as u8);
                data.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                data.push(0xE0 | (unit >> 12) as u8);
                data.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                data.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
}
