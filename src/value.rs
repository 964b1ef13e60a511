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

//! The dynamic value representation used for schema input and output.
//!
//! Rust has no structural "object" literal, so input to `pack` and output from `unpack` is
//! expressed with this recursive enum instead. A field being absent from an [`Object`] map,
//! present with [`Value::Null`], and present with a zero-valued primitive are three distinct
//! states; the engine must not conflate them (see the module docs on optional-handling).

use std::collections::BTreeMap;

/// A field-name-keyed map, used both as the top-level "object" `pack` consumes / `unpack`
/// produces and as the representation of nested inline records.
pub type Object = BTreeMap<String, Value>;

/// A dynamically-typed value flowing in or out of the codec.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Explicitly absent / the null sentinel.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    UInt(u64),
    /// A floating point number.
    Float(f64),
    /// An address-width value: a raw pointer, opaque-object handle, or similar.
    Address(u64),
    /// A UTF-8 string.
    Str(String),
    /// A raw byte sequence.
    Bytes(Vec<u8>),
    /// A sequence of values, used for variable arrays.
    Array(Vec<Value>),
    /// A nested record.
    Object(Object),
}

impl Value {
    /// `true` for [`Value::Null`]; used throughout to treat "explicitly null" like "absent".
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The object map, if this value is one.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// The array elements, if this value is one.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// The string contents, if this value is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// This value converted to an address-width unsigned integer, for primitive/enum/address
    /// field encoders. Bools convert to 0/1; negative signed integers return `None` (two's
    /// complement reinterpretation happens in `primitive::write`, not here).
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt(n) => Some(*n),
            Value::Int(n) if *n >= 0 => Some(*n as u64),
            Value::Address(n) => Some(*n),
            Value::Bool(b) => Some(*b as u64),
            _ => None,
        }
    }

    /// This value converted to a signed integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::UInt(n) => Some(*n as i64),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    /// This value converted to a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Int(n) => Some(*n as f64),
            Value::UInt(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// This value converted to a bool (nonzero-is-true for numerics).
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::UInt(n) => Some(*n != 0),
            Value::Int(n) => Some(*n != 0),
            _ => None,
        }
    }

    /// The number of elements this value would contribute to a `length_of` field: array length,
    /// UTF-8 byte length for strings/bytes, or zero for an absent/null referent.
    pub fn length_for(&self) -> u64 {
        match self {
            Value::Null => 0,
            Value::Array(a) => a.len() as u64,
            Value::Str(s) => s.len() as u64,
            Value::Bytes(b) => b.len() as u64,
            _ => 0,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::UInt(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}
