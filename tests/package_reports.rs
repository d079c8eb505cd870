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

//! Extraction queries and report rendering over synthetic packages.

mod common;

use dexscope::prelude::*;
use dexscope::report;

fn sample_package() -> Package {
    let manifest = common::manifest(
        "com.example.app",
        &[
            "android.permission.INTERNET",
            "android.permission.CAMERA",
            "android.permission.INTERNET",
        ],
        Some(23),
    );
    let data = common::zip(&[
        ("AndroidManifest.xml", manifest.as_slice()),
        ("classes.dex", b"placeholder"),
        ("classes2.dex", b"placeholder"),
        ("lib/arm64-v8a/libcrypto.so", b"\x7fELF..."),
        ("lib/x86_64/libcrypto.so", b"\x7fELF..."),
        ("assets/config.txt", b"\x01endpoint=https://example.com\x02"),
    ]);
    Package::from_mem(data).unwrap()
}

#[test]
fn manifest_queries_surface_through_the_package() {
    let package = sample_package();
    let manifest = package.manifest().unwrap();

    assert_eq!(manifest.package_name(), Some("com.example.app"));
    assert_eq!(
        manifest.permissions(),
        vec!["android.permission.INTERNET", "android.permission.CAMERA"]
    );
    assert_eq!(manifest.min_sdk(), MinSdkReport::new(23));
    assert_eq!(manifest.min_sdk().to_string(), "API 23 (Android 6.0)");
}

#[test]
fn dex_names_come_back_in_numeric_order() {
    let package = sample_package();
    assert_eq!(package.dex_names(), vec!["classes.dex", "classes2.dex"]);
}

#[test]
fn native_libraries_deduplicate_across_abis() {
    let package = sample_package();
    let libraries = package.native_libraries();

    assert!(package.is_native());
    assert_eq!(libraries.libraries, vec!["libcrypto.so"]);
    assert_eq!(libraries.abis, vec!["arm64-v8a", "x86_64"]);
}

#[test]
fn string_extraction_respects_the_minimum_length() {
    let package = sample_package();

    let strings = package.strings(5);
    assert!(strings
        .iter()
        .any(|s| s == "endpoint=https://example.com"));
    // Entry names are not scanned, only contents.
    assert!(!strings.iter().any(|s| s.contains("classes.dex")));
}

#[test]
fn digests_match_the_raw_archive_bytes() {
    let manifest = common::manifest("a", &[], None);
    let data = common::zip(&[("AndroidManifest.xml", manifest.as_slice())]);
    let expected = Digests::of(&data);

    let package = Package::from_mem(data).unwrap();
    assert_eq!(package.digests(), expected);
}

#[test]
fn permission_reports_render_from_extracted_lists() {
    let package = sample_package();
    let permissions: Vec<String> = package
        .manifest()
        .unwrap()
        .permissions()
        .into_iter()
        .map(str::to_string)
        .collect();

    let json = report::permissions_json(&permissions).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["permissions"].as_array().unwrap().len(), 2);

    let xml = report::permissions_xml(&permissions).unwrap();
    assert!(xml.contains("<permission>android.permission.CAMERA</permission>"));
}

#[test]
fn package_without_manifest_reports_the_absence() {
    let data = common::zip(&[("classes.dex", b"placeholder")]);
    let package = Package::from_mem(data).unwrap();
    assert!(package.manifest().is_err());
}

#[test]
fn cfg_over_a_package_without_dex_entries_is_absent() {
    let manifest = common::manifest("com.example.app", &[], None);
    let data = common::zip(&[("AndroidManifest.xml", manifest.as_slice())]);
    let package = Package::from_mem(data).unwrap();

    assert!(cfg_from_package(&package).unwrap().is_none());
}
