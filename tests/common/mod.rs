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

//! Fixtures for the integration suites: a stored-only ZIP writer and a
//! compiled-manifest emitter, both producing bytes in memory.

use std::io::Write;

/// Assembles an archive with every entry stored uncompressed.
pub fn zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut local_offsets = Vec::new();

    for (name, data) in entries {
        local_offsets.push(out.len() as u32);
        out.extend_from_slice(&0x0403_4B50_u32.to_le_bytes());
        out.extend_from_slice(&20_u16.to_le_bytes());
        out.extend_from_slice(&0_u16.to_le_bytes());
        out.extend_from_slice(&0_u16.to_le_bytes()); // stored
        out.extend_from_slice(&0_u32.to_le_bytes()); // time + date
        out.extend_from_slice(&crc32(data).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0_u16.to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(data);
    }

    let cd_offset = out.len() as u32;
    for ((name, data), local_offset) in entries.iter().zip(&local_offsets) {
        out.extend_from_slice(&0x0201_4B50_u32.to_le_bytes());
        out.extend_from_slice(&20_u16.to_le_bytes());
        out.extend_from_slice(&20_u16.to_le_bytes());
        out.extend_from_slice(&0_u16.to_le_bytes());
        out.extend_from_slice(&0_u16.to_le_bytes()); // stored
        out.extend_from_slice(&0_u32.to_le_bytes()); // time + date
        out.extend_from_slice(&crc32(data).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&[0_u8; 12]); // extra/comment/disk/attrs
        out.extend_from_slice(&local_offset.to_le_bytes());
        out.extend_from_slice(name.as_bytes());
    }
    let cd_size = out.len() as u32 - cd_offset;

    out.extend_from_slice(&0x0605_4B50_u32.to_le_bytes());
    out.extend_from_slice(&0_u32.to_le_bytes()); // disk numbers
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    out.extend_from_slice(&cd_size.to_le_bytes());
    out.extend_from_slice(&cd_offset.to_le_bytes());
    out.extend_from_slice(&0_u16.to_le_bytes()); // no comment
    out
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = flate2::Crc::new();
    crc.update(data);
    crc.sum()
}

/// Emits a compiled `AndroidManifest.xml` declaring a package name, a list
/// of permissions, and optionally a `minSdkVersion`.
pub fn manifest(package: &str, permissions: &[&str], min_sdk: Option<u32>) -> Vec<u8> {
    // Interned string table; element and attribute names first.
    let mut pool: Vec<String> = [
        "manifest",
        "package",
        "uses-permission",
        "name",
        "uses-sdk",
        "minSdkVersion",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect();
    pool.push(package.to_string());
    for permission in permissions {
        if !pool.iter().any(|existing| existing == permission) {
            pool.push((*permission).to_string());
        }
    }
    let index = |value: &str| pool.iter().position(|s| s == value).unwrap() as u32;

    let mut body = Vec::new();
    start_element(&mut body, index("manifest"), &[string_attr(index("package"), index(package))]);
    for permission in permissions {
        start_element(
            &mut body,
            index("uses-permission"),
            &[string_attr(index("name"), index(permission))],
        );
        end_element(&mut body, index("uses-permission"));
    }
    if let Some(api) = min_sdk {
        start_element(&mut body, index("uses-sdk"), &[int_attr(index("minSdkVersion"), api)]);
        end_element(&mut body, index("uses-sdk"));
    }
    end_element(&mut body, index("manifest"));

    let mut pool_chunk = Vec::new();
    string_pool(&mut pool_chunk, &pool);

    let mut out = Vec::new();
    out.extend_from_slice(&0x0003_u16.to_le_bytes());
    out.extend_from_slice(&8_u16.to_le_bytes());
    out.extend_from_slice(&((8 + pool_chunk.len() + body.len()) as u32).to_le_bytes());
    out.extend_from_slice(&pool_chunk);
    out.extend_from_slice(&body);
    out
}

/// One 20-byte attribute record: `(name index, raw index, type, data)`.
type Attr = (u32, u32, u8, u32);

fn string_attr(name: u32, value: u32) -> Attr {
    (name, value, 0x03, value)
}

fn int_attr(name: u32, value: u32) -> Attr {
    (name, u32::MAX, 0x10, value)
}

fn start_element(out: &mut Vec<u8>, name: u32, attrs: &[Attr]) {
    out.extend_from_slice(&0x0102_u16.to_le_bytes());
    out.extend_from_slice(&16_u16.to_le_bytes());
    out.extend_from_slice(&((16 + 20 + 20 * attrs.len()) as u32).to_le_bytes());
    out.extend_from_slice(&0_u32.to_le_bytes()); // line number
    out.extend_from_slice(&u32::MAX.to_le_bytes()); // comment
    out.extend_from_slice(&u32::MAX.to_le_bytes()); // namespace
    out.extend_from_slice(&name.to_le_bytes());
    out.extend_from_slice(&20_u16.to_le_bytes()); // attribute start
    out.extend_from_slice(&20_u16.to_le_bytes()); // attribute size
    out.extend_from_slice(&(attrs.len() as u16).to_le_bytes());
    out.extend_from_slice(&[0_u8; 6]); // id/class/style indices
    for (name, raw, data_type, data) in attrs {
        out.extend_from_slice(&u32::MAX.to_le_bytes()); // namespace
        out.extend_from_slice(&name.to_le_bytes());
        out.extend_from_slice(&raw.to_le_bytes());
        out.extend_from_slice(&8_u16.to_le_bytes()); // value size
        out.push(0); // res0
        out.push(*data_type);
        out.extend_from_slice(&data.to_le_bytes());
    }
}

fn end_element(out: &mut Vec<u8>, name: u32) {
    out.extend_from_slice(&0x0103_u16.to_le_bytes());
    out.extend_from_slice(&16_u16.to_le_bytes());
    out.extend_from_slice(&24_u32.to_le_bytes());
    out.extend_from_slice(&0_u32.to_le_bytes());
    out.extend_from_slice(&u32::MAX.to_le_bytes());
    out.extend_from_slice(&u32::MAX.to_le_bytes());
    out.extend_from_slice(&name.to_le_bytes());
}

fn string_pool(out: &mut Vec<u8>, pool: &[String]) {
    let mut offsets = Vec::new();
    let mut data = Vec::new();
    for value in pool {
        offsets.push(data.len() as u32);
        let units: Vec<u16> = value.encode_utf16().collect();
        data.write_all(&(units.len() as u16).to_le_bytes()).unwrap();
        for unit in units {
            data.write_all(&unit.to_le_bytes()).unwrap();
        }
        data.write_all(&0_u16.to_le_bytes()).unwrap();
    }
    while data.len() % 4 != 0 {
        data.push(0);
    }

    let strings_start = 28 + 4 * pool.len() as u32;
    out.extend_from_slice(&0x0001_u16.to_le_bytes());
    out.extend_from_slice(&28_u16.to_le_bytes());
    out.extend_from_slice(&(strings_start + data.len() as u32).to_le_bytes());
    out.extend_from_slice(&(pool.len() as u32).to_le_bytes());
    out.extend_from_slice(&0_u32.to_le_bytes()); // style count
    out.extend_from_slice(&0_u32.to_le_bytes()); // flags: UTF-16
    out.extend_from_slice(&strings_start.to_le_bytes());
    out.extend_from_slice(&0_u32.to_le_bytes()); // styles start
    for offset in offsets {
        out.extend_from_slice(&offset.to_le_bytes());
    }
    out.extend_from_slice(&data);
}
