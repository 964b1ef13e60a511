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

//! `abi_codec` compiles a declarative field schema into a typed pack/unpack codec for
//! C-ABI-compatible records, so callers crossing an FFI boundary can describe a struct once and
//! get byte-exact encoding and decoding in both directions.
//!
//! A [`schema::Schema`] is built at runtime from a list of [`field::FieldDef`]s via
//! [`schema::SchemaBuilder`], then compiled once with `.build()`. The result is immutable,
//! `Send + Sync`, and safe to share across threads; compile a schema once at startup and reuse it
//! for every `pack`/`unpack` call.
//!
//! ```
//! use abi_codec::field::FieldDef;
//! use abi_codec::pack::PackOptions;
//! use abi_codec::primitive::PrimitiveKind;
//! use abi_codec::schema::SchemaBuilder;
//! use abi_codec::unpack::UnpackOptions;
//! use abi_codec::value::{Object, Value};
//!
//! let schema = SchemaBuilder::new("Point")
//!     .field(FieldDef::new("x", abi_codec::field::FieldKind::Primitive(PrimitiveKind::I32)))
//!     .field(FieldDef::new("y", abi_codec::field::FieldKind::Primitive(PrimitiveKind::I32)))
//!     .build()
//!     .unwrap();
//!
//! let mut input = Object::new();
//! input.insert("x".to_owned(), Value::Int(3));
//! input.insert("y".to_owned(), Value::Int(-7));
//!
//! let packed = schema.pack(&Value::Object(input), PackOptions::default()).unwrap();
//! let decoded = schema.unpack(&packed.bytes, UnpackOptions::default()).unwrap();
//! assert_eq!(decoded.as_object().unwrap().get("x").unwrap().as_i64(), Some(3));
//! ```
//!
//! # Absent, null and zero
//!
//! A field key missing from the input [`value::Object`], a field present with [`value::Value::Null`],
//! and a field present with a zero-valued primitive are three distinct states. Losing this
//! distinction on the wire requires [`schema::SchemaBuilder::tag_after_payload`]; without it,
//! an absent optional field round-trips as its zero value, same as C would see it.
//!
//! # External collaborators
//!
//! The engine never dereferences memory on its own behalf except through the pluggable
//! [`host::HostOps`] trait (`address_of`/`read_bytes`), which [`host::NativeHost`] implements
//! with raw pointer arithmetic. Everything else in this crate is safe code.
//!
//! # Concurrency
//!
//! [`schema::Schema`] is immutable after [`schema::SchemaBuilder::build`] and implements
//! `Send + Sync`; compiling it once and sharing it behind an `Arc` across worker threads is the
//! expected usage pattern. `pack`/`unpack` take `&self` and touch no shared mutable state.

pub mod alloc;
pub mod describe;
pub mod enum_def;
pub mod error;
pub mod field;
pub mod host;
pub mod pack;
pub mod primitive;
pub mod schema;
pub mod unpack;
pub mod value;

pub use error::CodecError;
pub use field::{FieldDef, FieldKind, ValidationContext};
pub use host::{HostOps, NativeHost};
pub use pack::{PackOptions, PackedBuffer};
pub use schema::{Schema, SchemaBuilder};
pub use unpack::UnpackOptions;
pub use value::{Object, Value};
