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

//! Uncompiled field definitions: the input to [`crate::schema::SchemaBuilder`].
//!
//! A [`FieldDef`] is a closed tagged-variant over [`FieldKind`] plus the options `§4.2` of the
//! design enumerates (optional, default, condition, `length_of`, transforms, validators). The
//! schema compiler resolves a `Vec<FieldDef>` into the offset/alignment table and the per-field
//! processors described in `crate::schema`.

use std::sync::Arc;

use crate::enum_def::EnumDef;
use crate::error::CodecError;
use crate::primitive::PrimitiveKind;
use crate::schema::Schema;
use crate::value::Value;

/// The third argument a [`Validator`] receives: the caller-supplied validation hints plus the
/// containing input object, so a validator can check a field's value against its siblings.
#[derive(Clone, Copy)]
pub struct ValidationContext<'a> {
    /// The opaque hints bag passed to `pack`, unchanged at every nesting depth.
    pub hints: &'a Value,
    /// The (possibly schema-mapped) input object this field was extracted from.
    pub input: &'a Value,
}

/// A validator callback: `(value, field name, context) -> Result<(), CodecError>`. The first
/// validator to reject aborts `pack`; see the ordering guarantee in the top-level docs.
pub type Validator =
    Arc<dyn Fn(&Value, &str, ValidationContext<'_>) -> Result<(), CodecError> + Send + Sync>;

/// A pack-side transform, run on the value before it reaches the base encoder.
pub type PackTransform = Arc<dyn Fn(&Value) -> Result<Value, CodecError> + Send + Sync>;

/// An unpack-side transform, run on the value the base decoder produced.
pub type UnpackTransform = Arc<dyn Fn(Value) -> Result<Value, CodecError> + Send + Sync>;

/// Schema-level `map_value`: replaces the whole input object before field extraction begins.
pub type MapValue = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Schema-level `reduce_value`: replaces the whole output object after field decoding finishes.
pub type ReduceValue = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// The element type of a variable array: the core requires primitives and enums; inline records
/// and opaque-object pointers are accepted for `pack` but unpack of arrays of records is not in
/// the core contract (see the design notes' open question).
#[derive(Clone)]
pub enum ArrayElementKind {
    /// An array of primitives.
    Primitive(PrimitiveKind),
    /// An array of enum-backed integers, encoded/decoded through their variant names.
    Enum(Arc<EnumDef>),
    /// An array of inline records. Unpack returns the raw address rather than decoded records
    /// (see the design notes' open question on arrays of records).
    InlineRecord(Arc<Schema>),
    /// An array of opaque-object pointers.
    OpaquePointer,
}

impl ArrayElementKind {
    /// The packed size of one element.
    pub fn element_size(&self) -> usize {
        match self {
            ArrayElementKind::Primitive(p) => p.size(),
            ArrayElementKind::Enum(e) => e.backing().size(),
            ArrayElementKind::InlineRecord(s) => s.size(),
            ArrayElementKind::OpaquePointer => crate::primitive::ADDRESS_SIZE,
        }
    }
}

/// The type-descriptor variants the schema compiler recognises.
#[derive(Clone)]
pub enum FieldKind {
    /// A fixed-size primitive.
    Primitive(PrimitiveKind),
    /// A null-terminated string, stored as one pointer-sized slot addressing a host-owned,
    /// NUL-terminated UTF-8 byte region.
    CString,
    /// A raw byte region with no terminator; its length lives in a companion `length_of` field.
    CharStar,
    /// An enum-backed integer, encoded/decoded through its variant name.
    Enum(Arc<EnumDef>),
    /// A nested record occupying `nested.size` bytes directly in the parent buffer.
    NestedInline(Arc<Schema>),
    /// A nested record allocated in its own sub-buffer, addressed from a pointer slot.
    NestedPointer(Arc<Schema>),
    /// An opaque-object pointer: one pointer-sized slot holding the wrapped `.pointer` value
    /// (or null).
    OpaquePointer,
    /// A variable-length array: one pointer-sized slot addressing `count * element_size` bytes
    /// elsewhere. The companion field carrying `count` is found by looking this field's name
    /// up in the schema's array-metadata map (built from the count field's `length_of` option).
    Array {
        /// The element type.
        element: ArrayElementKind,
    },
}

impl FieldKind {
    /// The size, in bytes, this field kind occupies in the parent buffer (not counting any
    /// out-of-line sub-buffer).
    pub fn size(&self) -> usize {
        match self {
            FieldKind::Primitive(p) => p.size(),
            FieldKind::CString | FieldKind::CharStar => crate::primitive::ADDRESS_SIZE,
            FieldKind::Enum(e) => e.backing().size(),
            FieldKind::NestedInline(s) => s.size(),
            FieldKind::NestedPointer(_) => crate::primitive::ADDRESS_SIZE,
            FieldKind::OpaquePointer => crate::primitive::ADDRESS_SIZE,
            FieldKind::Array { .. } => crate::primitive::ADDRESS_SIZE,
        }
    }

    /// The natural alignment of this field kind (equal to size for every kind this crate
    /// supports).
    pub fn align(&self) -> usize {
        match self {
            FieldKind::NestedInline(s) => s.align(),
            other => other.size(),
        }
    }

    /// `true` for kinds that are "scalar/record" for the purposes of tag-after-payload and
    /// optional-handling: primitives, enums and inline records, but not pointers/arrays (those
    /// already have a natural null-address representation for "absent").
    pub fn is_scalar_or_inline_record(&self) -> bool {
        matches!(
            self,
            FieldKind::Primitive(_) | FieldKind::Enum(_) | FieldKind::NestedInline(_)
        )
    }
}

/// An uncompiled field: a `(name, kind, options)` triple, built with the fluent methods below
/// and handed to [`crate::schema::SchemaBuilder::field`].
#[derive(Clone)]
pub struct FieldDef {
    pub(crate) name: String,
    pub(crate) kind: FieldKind,
    pub(crate) optional: bool,
    pub(crate) default: Option<Value>,
    pub(crate) condition: bool,
    pub(crate) length_of: Option<String>,
    pub(crate) map_optional_inline: bool,
    pub(crate) pack_transform: Option<PackTransform>,
    pub(crate) unpack_transform: Option<UnpackTransform>,
    pub(crate) validators: Vec<Validator>,
}

impl FieldDef {
    /// Start a new field definition with the given name and kind.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            optional: false,
            default: None,
            condition: true,
            length_of: None,
            map_optional_inline: false,
            pack_transform: None,
            unpack_transform: None,
            validators: Vec::new(),
        }
    }

    /// Mark the field optional-on-input: `pack` does not fail when the value is absent.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Supply a default value used when the field is absent on input. Implies `optional`.
    pub fn default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self.optional = true;
        self
    }

    /// A compile-time inclusion thunk, already evaluated by the caller. When `false`, the field
    /// is excluded entirely: zero bytes, absent from `describe`, absent from `unpack` output.
    pub fn condition(mut self, include: bool) -> Self {
        self.condition = include;
        self
    }

    /// Mark this field as the length-of another (array or string/`char_star`) field. Implies
    /// `optional`, since the engine derives the value instead of reading it from input.
    pub fn length_of(mut self, array_field: impl Into<String>) -> Self {
        self.length_of = Some(array_field.into());
        self.optional = true;
        self
    }

    /// For inline nested optional records: invoke the nested schema's `map_value` even when
    /// the input value is absent, so a sentinel packed form can still be produced.
    pub fn map_optional_inline(mut self) -> Self {
        self.map_optional_inline = true;
        self
    }

    /// Wrap the base pack encoder with a transform run on the value first.
    pub fn pack_transform(
        mut self,
        f: impl Fn(&Value) -> Result<Value, CodecError> + Send + Sync + 'static,
    ) -> Self {
        self.pack_transform = Some(Arc::new(f));
        self
    }

    /// Wrap the base unpack decoder with a transform run on the decoded value.
    pub fn unpack_transform(
        mut self,
        f: impl Fn(Value) -> Result<Value, CodecError> + Send + Sync + 'static,
    ) -> Self {
        self.unpack_transform = Some(Arc::new(f));
        self
    }

    /// Append a validator to the (possibly empty) ordered sequence run at pack time.
    pub fn validate(
        mut self,
        f: impl Fn(&Value, &str, ValidationContext<'_>) -> Result<(), CodecError> + Send + Sync + 'static,
    ) -> Self {
        self.validators.push(Arc::new(f));
        self
    }
}
