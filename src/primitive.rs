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

//! The fixed table of primitive kinds: size, alignment, and little-endian read/write.
//!
//! Alignment always equals size here (the crate does not infer platform ABI rules, see the
//! top-level docs); all multibyte encodings are little-endian regardless of host byte order.

use crate::error::CodecError;
use crate::value::Value;

/// The address width this build targets. Pointer-sized fields and every sub-buffer address are
/// this many bytes wide.
pub const ADDRESS_SIZE: usize = std::mem::size_of::<usize>();

/// A primitive field kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// `u8`
    U8,
    /// `u16`, little-endian
    U16,
    /// `u32`, little-endian
    U32,
    /// `u64`, little-endian
    U64,
    /// `i16`, little-endian, two's complement
    I16,
    /// `i32`, little-endian, two's complement
    I32,
    /// `f32`, little-endian
    F32,
    /// `f64`, little-endian
    F64,
    /// An address-width pointer value.
    Address,
    /// One byte; nonzero reads as `true`.
    BoolU8,
    /// Four little-endian bytes; nonzero reads as `true`.
    BoolU32,
}

impl PrimitiveKind {
    /// Size in bytes.
    pub fn size(self) -> usize {
        match self {
            PrimitiveKind::U8 | PrimitiveKind::BoolU8 => 1,
            PrimitiveKind::U16 | PrimitiveKind::I16 => 2,
            PrimitiveKind::U32 | PrimitiveKind::I32 | PrimitiveKind::BoolU32 => 4,
            PrimitiveKind::U64 | PrimitiveKind::F64 => 8,
            PrimitiveKind::F32 => 4,
            PrimitiveKind::Address => ADDRESS_SIZE,
        }
    }

    /// Natural alignment; always equal to size for the primitives this crate supports.
    pub fn align(self) -> usize {
        self.size()
    }

    /// Whether this kind is a signed or unsigned integer, i.e. usable as an enum backing kind
    /// or as a `length_of` field.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            PrimitiveKind::U8
                | PrimitiveKind::U16
                | PrimitiveKind::U32
                | PrimitiveKind::U64
                | PrimitiveKind::I16
                | PrimitiveKind::I32
        )
    }

    /// Write `value` into `buf[offset..offset + self.size()]`, little-endian.
    pub fn write(self, value: &Value, buf: &mut [u8], offset: usize) -> Result<(), CodecError> {
        let size = self.size();
        let slot = &mut buf[offset..offset + size];
        match self {
            PrimitiveKind::U8 => slot[0] = value.as_u64().unwrap_or(0) as u8,
            PrimitiveKind::U16 => {
                slot.copy_from_slice(&(value.as_u64().unwrap_or(0) as u16).to_le_bytes())
            }
            PrimitiveKind::U32 => {
                slot.copy_from_slice(&(value.as_u64().unwrap_or(0) as u32).to_le_bytes())
            }
            PrimitiveKind::U64 => slot.copy_from_slice(&value.as_u64().unwrap_or(0).to_le_bytes()),
            PrimitiveKind::I16 => {
                slot.copy_from_slice(&(value.as_i64().unwrap_or(0) as i16).to_le_bytes())
            }
            PrimitiveKind::I32 => {
                slot.copy_from_slice(&(value.as_i64().unwrap_or(0) as i32).to_le_bytes())
            }
            PrimitiveKind::F32 => {
                slot.copy_from_slice(&(value.as_f64().unwrap_or(0.0) as f32).to_le_bytes())
            }
            PrimitiveKind::F64 => slot.copy_from_slice(&value.as_f64().unwrap_or(0.0).to_le_bytes()),
            PrimitiveKind::Address => write_address(slot, value.as_u64().unwrap_or(0)),
            PrimitiveKind::BoolU8 => slot[0] = value.as_bool().unwrap_or(false) as u8,
            PrimitiveKind::BoolU32 => {
                slot.copy_from_slice(&(value.as_bool().unwrap_or(false) as u32).to_le_bytes())
            }
        }
        Ok(())
    }

    /// Read a value out of `buf[offset..offset + self.size()]`, little-endian.
    pub fn read(self, buf: &[u8], offset: usize) -> Value {
        let size = self.size();
        let slot = &buf[offset..offset + size];
        match self {
            PrimitiveKind::U8 => Value::UInt(slot[0] as u64),
            PrimitiveKind::U16 => Value::UInt(u16::from_le_bytes(slot.try_into().unwrap()) as u64),
            PrimitiveKind::U32 => Value::UInt(u32::from_le_bytes(slot.try_into().unwrap()) as u64),
            PrimitiveKind::U64 => Value::UInt(u64::from_le_bytes(slot.try_into().unwrap())),
            PrimitiveKind::I16 => Value::Int(i16::from_le_bytes(slot.try_into().unwrap()) as i64),
            PrimitiveKind::I32 => Value::Int(i32::from_le_bytes(slot.try_into().unwrap()) as i64),
            PrimitiveKind::F32 => {
                Value::Float(f32::from_le_bytes(slot.try_into().unwrap()) as f64)
            }
            PrimitiveKind::F64 => Value::Float(f64::from_le_bytes(slot.try_into().unwrap())),
            PrimitiveKind::Address => Value::Address(read_address(slot)),
            PrimitiveKind::BoolU8 => Value::Bool(slot[0] != 0),
            PrimitiveKind::BoolU32 => {
                Value::Bool(u32::from_le_bytes(slot.try_into().unwrap()) != 0)
            }
        }
    }

    /// Write an element count or derived length through this (integer) kind's writer.
    pub fn write_length(self, length: u64, buf: &mut [u8], offset: usize) -> Result<(), CodecError> {
        self.write(&Value::UInt(length), buf, offset)
    }
}

fn write_address(slot: &mut [u8], addr: u64) {
    match ADDRESS_SIZE {
        4 => slot.copy_from_slice(&(addr as u32).to_le_bytes()),
        8 => slot.copy_from_slice(&addr.to_le_bytes()),
        n => panic!("unsupported address width {}", n),
    }
}

fn read_address(slot: &[u8]) -> u64 {
    match ADDRESS_SIZE {
        4 => u32::from_le_bytes(slot.try_into().unwrap()) as u64,
        8 => u64::from_le_bytes(slot.try_into().unwrap()),
        n => panic!("unsupported address width {}", n),
    }
}
