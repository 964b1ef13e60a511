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

//! `pack`, `pack_into` and `pack_list`: turning an input [`Value`] into byte-exact buffers.

use crate::error::CodecError;
use crate::field::{ArrayElementKind, FieldKind, ValidationContext};
use crate::host::{HostOps, NativeHost};
use crate::schema::{FieldRecord, Schema};
use crate::value::{Object, Value};

static NATIVE_HOST: NativeHost = NativeHost;
static NULL_HINT: Value = Value::Null;

/// Options accepted by `pack`, `pack_into` and `pack_list`.
#[derive(Clone, Copy, Default)]
pub struct PackOptions<'a> {
    /// An opaque bag of values threaded unchanged to every validator at every nesting depth.
    pub validation_hints: Option<&'a Value>,
    /// The host collaborator used to address sub-buffers. Defaults to [`NativeHost`].
    pub host: Option<&'a dyn HostOps>,
}

impl<'a> PackOptions<'a> {
    pub(crate) fn host(&self) -> &'a dyn HostOps {
        self.host.unwrap_or(&NATIVE_HOST)
    }

    fn hints(&self) -> &'a Value {
        self.validation_hints.unwrap_or(&NULL_HINT)
    }
}

/// The result of a successful `pack`: the main buffer plus every sub-buffer it addresses.
///
/// Sub-buffers must be kept alive by the caller for as long as a downstream consumer retains
/// their addresses; the engine never retains them once `pack` returns.
pub struct PackedBuffer {
    /// The packed record, `schema.size()` bytes long (or a multiple thereof for `pack_list`).
    pub bytes: Vec<u8>,
    /// Every out-of-line region `pack` allocated for arrays, by-pointer nested records and
    /// string references, in allocation order.
    pub sub_buffers: Vec<Box<[u8]>>,
}

impl Schema {
    /// Serialise `input` into a freshly allocated buffer matching this schema's layout.
    pub fn pack(&self, input: &Value, opts: PackOptions<'_>) -> Result<PackedBuffer, CodecError> {
        let mapped = self.apply_map_value(input);
        let mut bytes = vec![0u8; self.size];
        let mut sub_buffers = Vec::new();
        pack_fields(self, &mapped, &mut bytes, 0, opts.host(), opts.hints(), &mut sub_buffers, None)?;
        Ok(PackedBuffer { bytes, sub_buffers })
    }

    /// Serialise `input` directly into `view` at `base_offset`, without allocating the main
    /// buffer. Used internally by `pack_list` and by containers packing arrays of inline
    /// records; exposed because callers composing larger buffers by hand need it too.
    pub fn pack_into(
        &self,
        input: &Value,
        view: &mut [u8],
        base_offset: usize,
        opts: PackOptions<'_>,
    ) -> Result<Vec<Box<[u8]>>, CodecError> {
        let mapped = self.apply_map_value(input);
        let mut sub_buffers = Vec::new();
        pack_fields(
            self,
            &mapped,
            view,
            base_offset,
            opts.host(),
            opts.hints(),
            &mut sub_buffers,
            None,
        )?;
        Ok(sub_buffers)
    }

    /// Pack every item of `sequence` back-to-back into one contiguous buffer of
    /// `schema.size() * sequence.len()` bytes. Equivalent to, but more efficient than, calling
    /// `pack_into` once per item against a zero-initialised buffer (see the testable property
    /// in the top-level docs: `pack_list` byte-equals that composition).
    pub fn pack_list(
        &self,
        sequence: &[Value],
        opts: PackOptions<'_>,
    ) -> Result<PackedBuffer, CodecError> {
        let mut bytes = vec![0u8; self.size * sequence.len()];
        let mut sub_buffers = Vec::new();
        for (index, item) in sequence.iter().enumerate() {
            let mapped = self.apply_map_value(item);
            pack_fields(
                self,
                &mapped,
                &mut bytes,
                index * self.size,
                opts.host(),
                opts.hints(),
                &mut sub_buffers,
                Some(index),
            )?;
        }
        Ok(PackedBuffer { bytes, sub_buffers })
    }

    fn apply_map_value(&self, input: &Value) -> Value {
        match &self.map_value {
            Some(f) => f(input),
            None => input.clone(),
        }
    }
}

/// Walk every field record of `schema` in compilation order, writing into
/// `buf[base_offset..base_offset + schema.size()]`.
#[allow(clippy::too_many_arguments)]
fn pack_fields(
    schema: &Schema,
    input: &Value,
    buf: &mut [u8],
    base_offset: usize,
    host: &dyn HostOps,
    hints: &Value,
    sub_buffers: &mut Vec<Box<[u8]>>,
    index: Option<usize>,
) -> Result<(), CodecError> {
    let empty = Object::new();
    let object = input.as_object().unwrap_or(&empty);

    for field in &schema.fields {
        let offset = base_offset + field.offset;

        if let Some(tagged) = &field.virtual_flag_for {
            let present = object.get(tagged).map(|v| !v.is_null()).unwrap_or(false);
            buf[offset] = present as u8;
            continue;
        }

        let value = obtain_value(field, object)?;

        log::trace!("pack: field `{}` <- {:?}", field.name, value);

        let context = ValidationContext { hints, input };
        for validator in &field.validators {
            validator(&value, &field.name, context).map_err(|e| e.into_validation(&field.name, index))?;
        }

        let value = match &field.pack_transform {
            Some(t) => t(&value)?,
            None => value,
        };

        encode_field(schema, field, &value, buf, offset, host, hints, sub_buffers, index)?;
    }
    Ok(())
}

/// Resolve the value to encode for `field`: a derived array/string length, the mapped input's
/// own value, the field's default, or a missing-required-field error.
fn obtain_value(field: &FieldRecord, object: &Object) -> Result<Value, CodecError> {
    if let Some(target) = &field.length_of {
        let referent = object.get(target).cloned().unwrap_or(Value::Null);
        return Ok(Value::UInt(referent.length_for()));
    }
    if let Some(v) = object.get(&field.name) {
        if !v.is_null() {
            return Ok(v.clone());
        }
    }
    if let Some(d) = &field.default {
        return Ok(d.clone());
    }
    if field.optional {
        return Ok(Value::Null);
    }
    Err(CodecError::MissingRequiredField {
        field: field.name.clone(),
    })
}

#[allow(clippy::too_many_arguments)]
fn encode_field(
    schema: &Schema,
    field: &FieldRecord,
    value: &Value,
    buf: &mut [u8],
    offset: usize,
    host: &dyn HostOps,
    hints: &Value,
    sub_buffers: &mut Vec<Box<[u8]>>,
    index: Option<usize>,
) -> Result<(), CodecError> {
    match &field.kind {
        FieldKind::Primitive(p) => p.write(value, buf, offset),

        FieldKind::Enum(e) => {
            let name = value.as_str().ok_or_else(|| CodecError::InvalidEnumValue {
                enum_name: e.name().to_owned(),
                value: format!("{:?}", value),
            })?;
            let int = e.to(name)?;
            e.backing().write(&Value::Int(int), buf, offset)
        }

        FieldKind::CString => {
            if value.is_null() {
                crate::primitive::PrimitiveKind::Address.write(&Value::Address(0), buf, offset)
            } else {
                let s = value
                    .as_str()
                    .ok_or_else(|| CodecError::schema(&schema.name, "cstring field requires a string value"))?;
                let mut bytes = crate::host::encode_utf8(s);
                bytes.push(0);
                let boxed: Box<[u8]> = bytes.into_boxed_slice();
                let addr = host.address_of(&boxed)?;
                sub_buffers.push(boxed);
                crate::primitive::PrimitiveKind::Address.write(&Value::Address(addr), buf, offset)
            }
        }

        FieldKind::CharStar => {
            if value.is_null() {
                crate::primitive::PrimitiveKind::Address.write(&Value::Address(0), buf, offset)
            } else {
                let bytes: Vec<u8> = match value {
                    Value::Str(s) => crate::host::encode_utf8(s),
                    Value::Bytes(b) => b.clone(),
                    _ => {
                        return Err(CodecError::schema(
                            &schema.name,
                            "char_star field requires a string or byte value",
                        ))
                    }
                };
                let boxed: Box<[u8]> = bytes.into_boxed_slice();
                let addr = host.address_of(&boxed)?;
                sub_buffers.push(boxed);
                crate::primitive::PrimitiveKind::Address.write(&Value::Address(addr), buf, offset)
            }
        }

        FieldKind::NestedInline(nested) => {
            if value.is_null() && !field.map_optional_inline {
                // Genuinely absent (no supplied value, no field default) and not opted into
                // map_optional_inline: skip recursion entirely rather than packing a synthesized
                // empty object, which would bake the nested schema's own defaults into bytes
                // that must stay zero and could spuriously trip a required-field check downstream.
                buf[offset..offset + nested.size()].fill(0);
                Ok(())
            } else {
                let nested_value = if value.is_null() {
                    nested.apply_map_value(&Value::Null)
                } else {
                    nested.apply_map_value(value)
                };
                pack_fields(nested, &nested_value, buf, offset, host, hints, sub_buffers, index)
            }
        }

        FieldKind::NestedPointer(nested) => {
            if value.is_null() {
                crate::primitive::PrimitiveKind::Address.write(&Value::Address(0), buf, offset)
            } else {
                let mut inner = vec![0u8; nested.size()];
                let nested_value = nested.apply_map_value(value);
                pack_fields(nested, &nested_value, &mut inner, 0, host, hints, sub_buffers, index)?;
                let boxed: Box<[u8]> = inner.into_boxed_slice();
                let addr = host.address_of(&boxed)?;
                sub_buffers.push(boxed);
                crate::primitive::PrimitiveKind::Address.write(&Value::Address(addr), buf, offset)
            }
        }

        FieldKind::OpaquePointer => {
            let addr = match value {
                Value::Null => 0,
                other => other.as_u64().unwrap_or(0),
            };
            crate::primitive::PrimitiveKind::Address.write(&Value::Address(addr), buf, offset)
        }

        FieldKind::Array { element } => {
            let elements = value.as_array().unwrap_or(&[]);
            if elements.is_empty() {
                crate::primitive::PrimitiveKind::Address.write(&Value::Address(0), buf, offset)?;
            } else {
                let element_size = element.element_size();
                let mut inner = vec![0u8; element_size * elements.len()];
                for (i, el) in elements.iter().enumerate() {
                    encode_array_element(element, el, &mut inner, i * element_size, host, hints, sub_buffers, index)?;
                }
                let boxed: Box<[u8]> = inner.into_boxed_slice();
                let addr = host.address_of(&boxed)?;
                sub_buffers.push(boxed);
                crate::primitive::PrimitiveKind::Address.write(&Value::Address(addr), buf, offset)?;
            }

            // The length-of field derives its written value from the raw input before this
            // field's own pack_transform runs (see `obtain_value`); if a transform changes the
            // element count (e.g. filters the array), the two diverge silently unless flagged.
            if let Some(meta) = schema.arrays.get(&field.name) {
                let base_offset = offset - field.offset;
                let written_length = meta
                    .length_field_kind
                    .read(buf, base_offset + meta.length_field_offset)
                    .as_u64()
                    .unwrap_or(0);
                if written_length != elements.len() as u64 {
                    log::warn!(
                        "pack: field `{}` has {} elements but its length_of field already holds {} \
                         (a pack_transform likely changed the element count after length derivation)",
                        field.name,
                        elements.len(),
                        written_length
                    );
                }
            }
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn encode_array_element(
    element: &ArrayElementKind,
    value: &Value,
    buf: &mut [u8],
    offset: usize,
    host: &dyn HostOps,
    hints: &Value,
    sub_buffers: &mut Vec<Box<[u8]>>,
    index: Option<usize>,
) -> Result<(), CodecError> {
    match element {
        ArrayElementKind::Primitive(p) => p.write(value, buf, offset),
        ArrayElementKind::Enum(e) => {
            let name = value.as_str().ok_or_else(|| CodecError::InvalidEnumValue {
                enum_name: e.name().to_owned(),
                value: format!("{:?}", value),
            })?;
            let int = e.to(name)?;
            e.backing().write(&Value::Int(int), buf, offset)
        }
        ArrayElementKind::InlineRecord(nested) => {
            pack_fields(nested, value, buf, offset, host, hints, sub_buffers, index)
        }
        ArrayElementKind::OpaquePointer => {
            let addr = value.as_u64().unwrap_or(0);
            crate::primitive::PrimitiveKind::Address.write(&Value::Address(addr), buf, offset)
        }
    }
}
