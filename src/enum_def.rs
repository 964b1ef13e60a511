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

//! Bidirectional `name <-> integer` enum definitions, pinned to an integer backing kind.

use std::collections::HashMap;

use crate::error::CodecError;
use crate::primitive::PrimitiveKind;

/// A bidirectional mapping between variant names and their backing integer values.
#[derive(Clone, Debug)]
pub struct EnumDef {
    name: String,
    backing: PrimitiveKind,
    to_int: HashMap<String, i64>,
    to_name: HashMap<i64, String>,
}

impl EnumDef {
    /// Build an enum definition from `(name, value)` pairs backed by `backing`.
    ///
    /// Fails if `backing` is not an integer primitive, if any name repeats, or if any integer
    /// value repeats.
    pub fn new(
        name: impl Into<String>,
        backing: PrimitiveKind,
        variants: impl IntoIterator<Item = (impl Into<String>, i64)>,
    ) -> Result<Self, CodecError> {
        let name = name.into();
        if !backing.is_integer() {
            return Err(CodecError::schema(
                &name,
                "enum backing kind must be an integer primitive",
            ));
        }
        let mut to_int = HashMap::new();
        let mut to_name = HashMap::new();
        for (variant, value) in variants {
            let variant = variant.into();
            if to_int.insert(variant.clone(), value).is_some() {
                return Err(CodecError::schema(
                    &name,
                    format!("duplicate enum variant name `{}`", variant),
                ));
            }
            if let Some(existing) = to_name.insert(value, variant.clone()) {
                return Err(CodecError::schema(
                    &name,
                    format!(
                        "enum values for `{}` and `{}` collide on {}",
                        existing, variant, value
                    ),
                ));
            }
        }
        Ok(Self {
            name,
            backing,
            to_int,
            to_name,
        })
    }

    /// The enum's name, used in error messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The integer primitive this enum is stored as.
    pub fn backing(&self) -> PrimitiveKind {
        self.backing
    }

    /// Resolve a variant name to its backing integer.
    pub fn to(&self, variant: &str) -> Result<i64, CodecError> {
        self.to_int
            .get(variant)
            .copied()
            .ok_or_else(|| CodecError::InvalidEnumValue {
                enum_name: self.name.clone(),
                value: variant.to_owned(),
            })
    }

    /// Resolve a backing integer to its variant name.
    pub fn from(&self, value: i64) -> Result<&str, CodecError> {
        self.to_name
            .get(&value)
            .map(String::as_str)
            .ok_or_else(|| CodecError::InvalidEnumValue {
                enum_name: self.name.clone(),
                value: value.to_string(),
            })
    }
}
