// MIT License
//
// Copyright (c) 2019 Lukas Lueg (lukas.lueg@gmail.com)
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! The error taxonomy used throughout schema compilation and the pack/unpack engine.

use std::fmt;

/// Errors produced while compiling a schema or running `pack`/`unpack`.
#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    /// A schema could not be compiled.
    #[error("schema `{schema}` is invalid: {reason}")]
    Schema {
        /// Name of the schema under compilation.
        schema: String,
        /// Human-readable reason.
        reason: String,
    },

    /// A non-optional field had no value and no default.
    #[error("missing required field `{field}`")]
    MissingRequiredField {
        /// Name of the field.
        field: String,
    },

    /// A name or integer fell outside an enum's known set.
    #[error("invalid value `{value}` for enum `{enum_name}`")]
    InvalidEnumValue {
        /// Name of the enum definition.
        enum_name: String,
        /// The offending value, stringified for display.
        value: String,
    },

    /// A user-supplied validator rejected a value.
    #[error("validation failed for field `{field}`{index_suffix}: {source}", index_suffix = index.map(|i| format!(" at index {}", i)).unwrap_or_default())]
    Validation {
        /// Name of the field being validated.
        field: String,
        /// Index into the sequence, for `pack_list`.
        index: Option<usize>,
        /// The validator's own error.
        #[source]
        source: Box<CodecError>,
    },

    /// A validator rejected a value outright; the error a validator returns when it has no
    /// more specific `CodecError` variant to report.
    #[error("{field}: {message}")]
    Rejected {
        /// Name of the field being validated.
        field: String,
        /// Human-readable rejection reason.
        message: String,
    },

    /// The input buffer was shorter than the schema requires.
    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall {
        /// Bytes required.
        needed: usize,
        /// Bytes actually supplied.
        actual: usize,
    },

    /// An array's address slot was null while its length field was nonzero.
    #[error("field `{field}` has a null address but nonzero length {length}")]
    NullPointerNonzeroLength {
        /// Name of the array field.
        field: String,
        /// The nonzero length read from the companion length field.
        length: u64,
    },
}

impl CodecError {
    /// Build a schema-error with the given schema name and reason.
    pub fn schema(schema: impl fmt::Display, reason: impl fmt::Display) -> Self {
        CodecError::Schema {
            schema: schema.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Wrap `self` as the source of a field validation failure, optionally tagged with an
    /// index (used by `pack_list`).
    pub fn into_validation(self, field: impl fmt::Display, index: Option<usize>) -> Self {
        CodecError::Validation {
            field: field.to_string(),
            index,
            source: Box::new(self),
        }
    }
}
