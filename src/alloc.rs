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

//! `alloc`: pre-populate a record's array sub-buffers so native code can write into them
//! directly, without going through `pack` first.
//!
//! A caller that is about to hand a struct to a native function expecting to fill in a
//! variable-length array (rather than read one) needs the count field and the sub-buffer address
//! already in place before the call. `alloc` does exactly that and nothing else: every other
//! field is left zeroed.

use crate::error::CodecError;
use crate::pack::{PackOptions, PackedBuffer};
use crate::primitive::PrimitiveKind;
use crate::schema::Schema;
use crate::value::{Object, Value};

impl Schema {
    /// Allocate a zeroed buffer for this schema, with every array field's count and sub-buffer
    /// address already written.
    ///
    /// `array_lengths` maps array field names to the element count to reserve; fields absent
    /// from the map are allocated with zero elements (count 0, null address).
    pub fn alloc(
        &self,
        array_lengths: &Object,
        opts: PackOptions<'_>,
    ) -> Result<PackedBuffer, CodecError> {
        let mut bytes = vec![0u8; self.size];
        let mut sub_buffers = Vec::new();
        let host = opts.host();

        for (name, meta) in &self.arrays {
            let count = array_lengths
                .get(name)
                .and_then(Value::as_u64)
                .unwrap_or(0);
            meta.length_field_kind
                .write_length(count, &mut bytes, meta.length_field_offset)?;

            if count == 0 {
                continue;
            }
            let element_size = meta.element.element_size();
            let inner = vec![0u8; element_size * count as usize];
            let boxed: Box<[u8]> = inner.into_boxed_slice();
            let addr = host.address_of(&boxed)?;
            sub_buffers.push(boxed);
            PrimitiveKind::Address.write(&Value::Address(addr), &mut bytes, meta.slot_offset)?;

            log::trace!(
                "alloc: schema `{}` field `{}` reserved for {} elements",
                self.name,
                name,
                count
            );
        }

        Ok(PackedBuffer { bytes, sub_buffers })
    }
}
