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

//! `unpack` and `unpack_list`: turning byte-exact buffers back into [`Value`]s.
//!
//! `cstring`/`char_star`/record-array fields decode to the raw [`Value::Address`] they hold
//! rather than to decoded contents; the core contract does not require walking host memory on
//! the unpack path (see the design notes' open question on string and record-array decoding).

use std::collections::HashMap;

use crate::error::CodecError;
use crate::field::{ArrayElementKind, FieldKind};
use crate::host::{HostOps, NativeHost};
use crate::primitive::PrimitiveKind;
use crate::schema::{FieldRecord, Schema};
use crate::value::{Object, Value};

static NATIVE_HOST: NativeHost = NativeHost;

/// Options accepted by `unpack` and `unpack_list`.
#[derive(Clone, Copy, Default)]
pub struct UnpackOptions<'a> {
    /// The host collaborator used to read array/pointer sub-buffers. Defaults to [`NativeHost`].
    pub host: Option<&'a dyn HostOps>,
}

impl<'a> UnpackOptions<'a> {
    fn host(&self) -> &'a dyn HostOps {
        self.host.unwrap_or(&NATIVE_HOST)
    }
}

impl Schema {
    /// Decode one record out of `buf`, starting at its first byte.
    pub fn unpack(&self, buf: &[u8], opts: UnpackOptions<'_>) -> Result<Value, CodecError> {
        if buf.len() < self.size {
            return Err(CodecError::BufferTooSmall {
                needed: self.size,
                actual: buf.len(),
            });
        }
        let mut object = self.default.clone().unwrap_or_default();
        unpack_fields(self, buf, 0, opts.host(), &mut object)?;
        Ok(self.apply_reduce_value(Value::Object(object)))
    }

    /// Decode `count` contiguous records out of `buf`.
    pub fn unpack_list(
        &self,
        buf: &[u8],
        count: usize,
        opts: UnpackOptions<'_>,
    ) -> Result<Vec<Value>, CodecError> {
        let needed = self.size * count;
        if buf.len() < needed {
            return Err(CodecError::BufferTooSmall {
                needed,
                actual: buf.len(),
            });
        }
        let host = opts.host();
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            let mut object = self.default.clone().unwrap_or_default();
            unpack_fields(self, buf, i * self.size, host, &mut object)?;
            out.push(self.apply_reduce_value(Value::Object(object)));
        }
        Ok(out)
    }

    fn apply_reduce_value(&self, value: Value) -> Value {
        match &self.reduce_value {
            Some(f) => f(value),
            None => value,
        }
    }
}

fn read_address(buf: &[u8], offset: usize) -> u64 {
    match PrimitiveKind::Address.read(buf, offset) {
        Value::Address(a) => a,
        _ => 0,
    }
}

/// Decode every non-virtual field record of `schema` from `buf[base..base + schema.size()]` into
/// `object`, honouring tag-after-payload overrides and skipping `length_of` source fields (their
/// value is folded into the array/string field they describe, not surfaced on their own).
fn unpack_fields(
    schema: &Schema,
    buf: &[u8],
    base: usize,
    host: &dyn HostOps,
    object: &mut Object,
) -> Result<(), CodecError> {
    let mut tags: HashMap<&str, bool> = HashMap::new();
    for f in &schema.fields {
        if let Some(tagged) = &f.virtual_flag_for {
            tags.insert(tagged.as_str(), buf[base + f.offset] != 0);
        }
    }

    for field in &schema.fields {
        if field.virtual_flag_for.is_some() {
            continue;
        }
        if field.length_of.is_some() {
            continue;
        }

        let offset = base + field.offset;
        let present = tags.get(field.name.as_str()).copied().unwrap_or(true);

        if schema.tag_after_payload && !present && field.optional && field.kind.is_scalar_or_inline_record() {
            log::trace!("unpack: field `{}` overridden to null by tag", field.name);
            object.insert(field.name.clone(), Value::Null);
            continue;
        }

        let mut value = decode_field(schema, field, buf, base, offset, host)?;
        if let Some(t) = &field.unpack_transform {
            value = t(value)?;
        }
        object.insert(field.name.clone(), value);
    }
    Ok(())
}

fn decode_field(
    schema: &Schema,
    field: &FieldRecord,
    buf: &[u8],
    base: usize,
    offset: usize,
    host: &dyn HostOps,
) -> Result<Value, CodecError> {
    match &field.kind {
        FieldKind::Primitive(p) => Ok(p.read(buf, offset)),

        FieldKind::Enum(e) => {
            let int = match e.backing().read(buf, offset) {
                Value::Int(n) => n,
                Value::UInt(n) => n as i64,
                _ => 0,
            };
            Ok(Value::Str(e.from(int)?.to_owned()))
        }

        FieldKind::CString | FieldKind::CharStar => Ok(Value::Address(read_address(buf, offset))),

        FieldKind::NestedInline(nested) => {
            let mut inner = Object::new();
            unpack_fields(nested, buf, offset, host, &mut inner)?;
            Ok(nested.apply_reduce_value(Value::Object(inner)))
        }

        FieldKind::NestedPointer(nested) => {
            let addr = read_address(buf, offset);
            if addr == 0 {
                return Ok(Value::Null);
            }
            let bytes = host.read_bytes(addr, nested.size())?;
            let mut inner = Object::new();
            unpack_fields(nested, &bytes, 0, host, &mut inner)?;
            Ok(nested.apply_reduce_value(Value::Object(inner)))
        }

        FieldKind::OpaquePointer => Ok(Value::Address(read_address(buf, offset))),

        FieldKind::Array { element } => {
            let addr = read_address(buf, offset);
            let meta = schema.arrays.get(&field.name).ok_or_else(|| {
                CodecError::schema(
                    &schema.name,
                    format!("array field `{}` has no resolved length_of", field.name),
                )
            })?;
            let length = meta
                .length_field_kind
                .read(buf, base + meta.length_field_offset)
                .as_u64()
                .unwrap_or(0);

            if addr == 0 {
                if length > 0 {
                    return Err(CodecError::NullPointerNonzeroLength {
                        field: field.name.clone(),
                        length,
                    });
                }
                return Ok(Value::Array(Vec::new()));
            }

            match element {
                ArrayElementKind::Primitive(_) | ArrayElementKind::Enum(_) => {
                    let element_size = element.element_size();
                    let bytes = host.read_bytes(addr, element_size * length as usize)?;
                    let mut items = Vec::with_capacity(length as usize);
                    for i in 0..length as usize {
                        let item = match element {
                            ArrayElementKind::Primitive(p) => p.read(&bytes, i * element_size),
                            ArrayElementKind::Enum(e) => {
                                let int = match e.backing().read(&bytes, i * element_size) {
                                    Value::Int(n) => n,
                                    Value::UInt(n) => n as i64,
                                    _ => 0,
                                };
                                Value::Str(e.from(int)?.to_owned())
                            }
                            ArrayElementKind::InlineRecord(_) | ArrayElementKind::OpaquePointer => {
                                unreachable!("handled by the outer match arm")
                            }
                        };
                        items.push(item);
                    }
                    Ok(Value::Array(items))
                }
                ArrayElementKind::InlineRecord(_) | ArrayElementKind::OpaquePointer => {
                    Ok(Value::Address(addr))
                }
            }
        }
    }
}
