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

//! `describe`: a pure, side-effect-free projection of a compiled schema's field layout. Useful
//! for building FFI headers, debug dumps, or introspecting a schema without a buffer in hand.

use crate::field::FieldKind;
use crate::schema::Schema;

/// One field's layout and kind, as reported by [`Schema::describe`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Byte offset within the schema.
    pub offset: usize,
    /// Size in bytes within the parent buffer.
    pub size: usize,
    /// Natural alignment.
    pub align: usize,
    /// Whether input may omit this field.
    pub optional: bool,
    /// A short, human-readable tag for the field's kind (e.g. `"primitive(u32)"`, `"array"`).
    pub kind: String,
    /// The array/string field this field supplies the element or byte count for, if any.
    pub length_of: Option<String>,
}

impl Schema {
    /// Project every non-virtual field of this schema into a [`FieldDescriptor`], in compilation
    /// order. Tag-after-payload validity bytes are not real fields and are omitted.
    pub fn describe(&self) -> Vec<FieldDescriptor> {
        self.fields
            .iter()
            .filter(|f| f.virtual_flag_for.is_none())
            .map(|f| FieldDescriptor {
                name: f.name.clone(),
                offset: f.offset,
                size: f.size,
                align: f.align,
                optional: f.optional,
                kind: describe_kind(&f.kind),
                length_of: f.length_of.clone(),
            })
            .collect()
    }
}

fn describe_kind(kind: &FieldKind) -> String {
    match kind {
        FieldKind::Primitive(p) => format!("primitive({})", describe_primitive(*p)),
        FieldKind::CString => "cstring".to_owned(),
        FieldKind::CharStar => "char_star".to_owned(),
        FieldKind::Enum(e) => format!("enum({})", e.name()),
        FieldKind::NestedInline(s) => format!("record({})", s.name()),
        FieldKind::NestedPointer(s) => format!("record_pointer({})", s.name()),
        FieldKind::OpaquePointer => "opaque_pointer".to_owned(),
        FieldKind::Array { element } => format!("array({})", describe_element(element)),
    }
}

fn describe_element(element: &crate::field::ArrayElementKind) -> String {
    use crate::field::ArrayElementKind;
    match element {
        ArrayElementKind::Primitive(p) => describe_primitive(*p).to_owned(),
        ArrayElementKind::Enum(e) => format!("enum({})", e.name()),
        ArrayElementKind::InlineRecord(s) => format!("record({})", s.name()),
        ArrayElementKind::OpaquePointer => "opaque_pointer".to_owned(),
    }
}

fn describe_primitive(p: crate::primitive::PrimitiveKind) -> &'static str {
    use crate::primitive::PrimitiveKind;
    match p {
        PrimitiveKind::U8 => "u8",
        PrimitiveKind::U16 => "u16",
        PrimitiveKind::U32 => "u32",
        PrimitiveKind::U64 => "u64",
        PrimitiveKind::I16 => "i16",
        PrimitiveKind::I32 => "i32",
        PrimitiveKind::F32 => "f32",
        PrimitiveKind::F64 => "f64",
        PrimitiveKind::Address => "address",
        PrimitiveKind::BoolU8 => "bool_u8",
        PrimitiveKind::BoolU32 => "bool_u32",
    }
}
