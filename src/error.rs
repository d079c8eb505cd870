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

use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers all possible error conditions that can occur during APK container parsing,
/// manifest decoding, DEX disassembly, and graph export operations. Each variant provides
/// specific context about the failure mode to enable appropriate error handling.
///
/// # Error Categories
///
/// ## File Parsing Errors
/// - [`Error::Malformed`] - Corrupted or invalid file structure
/// - [`Error::OutOfBounds`] - Attempted to read beyond file boundaries
/// - [`Error::NotSupported`] - Unsupported file format or feature
/// - [`Error::Empty`] - Empty input provided
///
/// ## I/O and External Errors
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::Xml`] - XML reading/writing errors from the quick-xml crate
/// - [`Error::Json`] - JSON encoding errors from the serde_json crate
///
/// ## Analysis Errors
/// - [`Error::GraphError`] - Control-flow graph construction or exchange error
///
/// # Examples
///
/// ```rust
/// use dexscope::{Error, Package};
/// use std::path::Path;
///
/// match Package::from_file(Path::new("app.apk")) {
///     Ok(package) => {
///         println!("Opened package with {} entries", package.entries().len());
///     }
///     Err(Error::NotSupported) => {
///         eprintln!("File format is not supported");
///     }
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("Malformed file: {} ({}:{})", message, file, line);
///     }
///     Err(Error::FileError(io_err)) => {
///         eprintln!("I/O error: {}", io_err);
///     }
///     Err(e) => {
///         eprintln!("Other error: {}", e);
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The file is damaged and could not be parsed.
    ///
    /// This error indicates that the file structure is corrupted or doesn't
    /// conform to the expected APK/DEX format. The error includes the source
    /// location where the malformation was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the file.
    ///
    /// This error occurs when trying to read data beyond the end of the file
    /// or stream. It's a safety check to prevent buffer overruns during parsing.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// This file type is not supported.
    ///
    /// Indicates that the input file is not a supported application package,
    /// or uses features (e.g. entry encryption, exotic compression methods)
    /// that are not implemented in this library.
    #[error("This file type is not supported")]
    NotSupported,

    /// Provided input was empty.
    ///
    /// This error occurs when an empty file or buffer is provided where
    /// actual package data was expected.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur during file operations
    /// such as reading from disk, permission issues, or filesystem errors.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Error from the quick-xml crate during XML reading or writing.
    ///
    /// The quick-xml crate is used for GraphML and XML report emission.
    /// This error wraps any failures from that layer.
    #[error("{0}")]
    Xml(#[from] quick_xml::Error),

    /// Error from the serde_json crate during JSON encoding.
    ///
    /// JSON is used for report emission and for the canonical textual
    /// encoding of composite graph attribute values.
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// Control-flow graph error.
    ///
    /// Errors related to graph construction and graph exchange, such as an
    /// exchange document referencing nodes or attribute keys that were never
    /// declared.
    #[error("{0}")]
    GraphError(String),
}
