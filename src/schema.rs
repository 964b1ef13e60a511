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

//! The schema compiler: walks an ordered field list and produces a [`Schema`] with resolved
//! offsets, padding, total size/alignment, and the bookkeeping the pack/unpack engine needs
//! (array metadata, virtual validity-tag records, schema-level hooks).
//!
//! Schemas are immutable once built (`Schema: Send + Sync`) and may be compiled once and shared
//! across threads; see the concurrency notes in the crate's top-level docs.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::CodecError;
use crate::field::{FieldDef, FieldKind, MapValue, PackTransform, ReduceValue, UnpackTransform, Validator};
use crate::primitive::PrimitiveKind;
use crate::value::{Object, Value};

/// A compiled field, in compilation order. Either a real field or an auto-generated
/// tag-after-payload validity byte (`virtual_flag_for.is_some()`).
pub struct FieldRecord {
    pub(crate) name: String,
    pub(crate) offset: usize,
    pub(crate) size: usize,
    pub(crate) align: usize,
    pub(crate) kind: FieldKind,
    pub(crate) optional: bool,
    pub(crate) default: Option<Value>,
    pub(crate) validators: Vec<Validator>,
    pub(crate) length_of: Option<String>,
    pub(crate) virtual_flag_for: Option<String>,
    pub(crate) map_optional_inline: bool,
    pub(crate) pack_transform: Option<PackTransform>,
    pub(crate) unpack_transform: Option<UnpackTransform>,
}

impl FieldRecord {
    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Byte offset within the compiled schema.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Size in bytes within the parent buffer.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Natural alignment.
    pub fn align(&self) -> usize {
        self.align
    }

    /// Whether input may omit this field.
    pub fn optional(&self) -> bool {
        self.optional
    }

    /// `true` for an auto-generated tag-after-payload validity byte.
    pub fn is_virtual_tag(&self) -> bool {
        self.virtual_flag_for.is_some()
    }
}

/// Per-array bookkeeping used by `unpack` (to find the count) and `alloc` (to pre-populate the
/// address and count slots).
#[derive(Clone)]
pub(crate) struct ArrayMetadata {
    pub(crate) slot_offset: usize,
    pub(crate) element: crate::field::ArrayElementKind,
    pub(crate) length_field_offset: usize,
    pub(crate) length_field_kind: PrimitiveKind,
}

/// A compiled schema: the immutable result of [`SchemaBuilder::build`].
pub struct Schema {
    pub(crate) name: String,
    pub(crate) size: usize,
    pub(crate) align: usize,
    pub(crate) fields: Vec<FieldRecord>,
    pub(crate) field_index: HashMap<String, usize>,
    pub(crate) arrays: HashMap<String, ArrayMetadata>,
    pub(crate) map_value: Option<MapValue>,
    pub(crate) reduce_value: Option<ReduceValue>,
    pub(crate) default: Option<Object>,
    pub(crate) tag_after_payload: bool,
}

impl Schema {
    /// The schema's name, as given to [`SchemaBuilder::new`].
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total size in bytes, including trailing padding to `align`.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Maximum alignment of any included field (minimum 1).
    pub fn align(&self) -> usize {
        self.align
    }

    /// Compiled field records in compilation order, including virtual tag-after-payload bytes.
    pub fn fields(&self) -> &[FieldRecord] {
        &self.fields
    }

    /// Look up a non-virtual field by name.
    pub fn field(&self, name: &str) -> Option<&FieldRecord> {
        self.field_index.get(name).map(|&i| &self.fields[i])
    }
}

/// Builds a [`Schema`] from an ordered list of [`FieldDef`]s plus schema-level hooks.
pub struct SchemaBuilder {
    name: String,
    fields: Vec<FieldDef>,
    map_value: Option<MapValue>,
    reduce_value: Option<ReduceValue>,
    default: Option<Object>,
    tag_after_payload: bool,
}

impl SchemaBuilder {
    /// Start building a schema with the given name (used in error messages and logging).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            map_value: None,
            reduce_value: None,
            default: None,
            tag_after_payload: false,
        }
    }

    /// Append a field definition.
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Set the schema-level `map_value` hook, applied to the whole input object before field
    /// extraction.
    pub fn map_value(mut self, f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        self.map_value = Some(Arc::new(f));
        self
    }

    /// Set the schema-level `reduce_value` hook, applied to the whole output object after field
    /// decoding.
    pub fn reduce_value(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.reduce_value = Some(Arc::new(f));
        self
    }

    /// A partial object merged into `unpack`'s output before fields are decoded over it.
    pub fn default(mut self, default: Object) -> Self {
        self.default = Some(default);
        self
    }

    /// Enable tag-after-payload layout: every optional scalar/inline-record field gets an
    /// auto-generated 1-byte validity tag immediately after its payload.
    pub fn tag_after_payload(mut self, enabled: bool) -> Self {
        self.tag_after_payload = enabled;
        self
    }

    /// Compile the field list into a [`Schema`], computing offsets, padding, total size and
    /// alignment, and resolving `length_of` back-references.
    pub fn build(self) -> Result<Schema, CodecError> {
        let mut fields = Vec::with_capacity(self.fields.len());
        let mut offset = 0usize;
        let mut max_align = 1usize;

        for def in &self.fields {
            if !def.condition {
                log::trace!("schema `{}`: skipping excluded field `{}`", self.name, def.name);
                continue;
            }

            let size = def.kind.size();
            let align = def.kind.align().max(1);
            offset = align_up(offset, align);

            fields.push(FieldRecord {
                name: def.name.clone(),
                offset,
                size,
                align,
                kind: def.kind.clone(),
                optional: def.optional,
                default: def.default.clone(),
                validators: def.validators.clone(),
                length_of: def.length_of.clone(),
                virtual_flag_for: None,
                map_optional_inline: def.map_optional_inline,
                pack_transform: def.pack_transform.clone(),
                unpack_transform: def.unpack_transform.clone(),
            });
            offset += size;
            max_align = max_align.max(align);

            if self.tag_after_payload && def.optional && def.kind.is_scalar_or_inline_record() {
                log::trace!(
                    "schema `{}`: appending tag-after-payload byte for `{}`",
                    self.name,
                    def.name
                );
                fields.push(FieldRecord {
                    name: format!("{}__tag", def.name),
                    offset,
                    size: 1,
                    align: 1,
                    kind: FieldKind::Primitive(PrimitiveKind::U8),
                    optional: false,
                    default: None,
                    validators: Vec::new(),
                    length_of: None,
                    virtual_flag_for: Some(def.name.clone()),
                    map_optional_inline: false,
                    pack_transform: None,
                    unpack_transform: None,
                });
                offset += 1;
            }
        }

        let size = align_up(offset, max_align);

        let mut field_index = HashMap::new();
        for (i, f) in fields.iter().enumerate() {
            if f.virtual_flag_for.is_none() {
                field_index.insert(f.name.clone(), i);
            }
        }

        let mut arrays: HashMap<String, ArrayMetadata> = HashMap::new();
        let mut length_of_claimed: std::collections::HashSet<String> = std::collections::HashSet::new();
        for f in &fields {
            let Some(target_name) = &f.length_of else {
                continue;
            };
            let length_kind = match &f.kind {
                FieldKind::Primitive(p) if p.is_integer() => *p,
                _ => {
                    return Err(CodecError::schema(
                        &self.name,
                        format!(
                            "length_of field `{}` must be a primitive integer kind",
                            f.name
                        ),
                    ));
                }
            };
            let target_record = field_index
                .get(target_name)
                .map(|&i| &fields[i])
                .ok_or_else(|| {
                    CodecError::schema(
                        &self.name,
                        format!(
                            "field `{}` has length_of(\"{}\") but no such field exists",
                            f.name, target_name
                        ),
                    )
                })?;
            if !length_of_claimed.insert(target_name.clone()) {
                return Err(CodecError::schema(
                    &self.name,
                    format!("`{}` has more than one length_of field", target_name),
                ));
            }
            match &target_record.kind {
                FieldKind::Array { element } => {
                    arrays.insert(
                        target_name.clone(),
                        ArrayMetadata {
                            slot_offset: target_record.offset,
                            element: element.clone(),
                            length_field_offset: f.offset,
                            length_field_kind: length_kind,
                        },
                    );
                }
                FieldKind::CString | FieldKind::CharStar => {
                    // Byte-length coupling; unpack never decodes these, so no array metadata
                    // is required (see the design notes' open question on string decoding).
                }
                _ => {
                    return Err(CodecError::schema(
                        &self.name,
                        format!(
                            "field `{}` named by length_of must be an array or string field",
                            target_name
                        ),
                    ));
                }
            }
        }

        log::debug!(
            "compiled schema `{}`: {} fields, size {} bytes, align {}",
            self.name,
            fields.len(),
            size,
            max_align
        );

        Ok(Schema {
            name: self.name,
            size,
            align: max_align,
            fields,
            field_index,
            arrays,
            map_value: self.map_value,
            reduce_value: self.reduce_value,
            default: self.default,
            tag_after_payload: self.tag_after_payload,
        })
    }
}

/// Round `offset` up to the next multiple of `align` (a power of two), per `§6`'s layout rule:
/// `(off + a - 1) & ~(a - 1)`.
pub(crate) fn align_up(offset: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    (offset + align - 1) & !(align - 1)
}
