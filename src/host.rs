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

//! The two abstract collaborator operations a host runtime must supply: turning an owned
//! buffer into a stable numeric address, and reading back an arbitrary region of memory by
//! address. The engine never interprets the addresses it writes or reads; it only moves bytes.

use crate::error::CodecError;

/// Stands in for the host runtime's `address_of`/`read_bytes` primitives (see the crate's
/// top-level docs on external collaborators).
pub trait HostOps: Send + Sync {
    /// Return a stable numeric address for `buffer`, which the caller promises to keep alive
    /// for as long as anything holds the returned address.
    fn address_of(&self, buffer: &[u8]) -> Result<u64, CodecError>;

    /// Read `length` bytes starting at `address`. Used only for out-of-line array data whose
    /// address was produced by a previous `pack`/`alloc` call (or by the native library the
    /// caller is talking to).
    ///
    /// # Safety
    ///
    /// Implementations that dereference `address` must trust the caller that it is valid for
    /// `length` bytes; this crate's own [`NativeHost`] crosses that boundary with `unsafe`.
    fn read_bytes(&self, address: u64, length: usize) -> Result<Vec<u8>, CodecError>;
}

/// The default [`HostOps`] implementation: buffers are addressed by their own heap pointer.
///
/// This is the same trust boundary a hand-written `from_raw` constructor crosses: the caller
/// must guarantee the address was produced by this crate (or is otherwise known-valid) and
/// remains live for the requested length.
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeHost;

impl HostOps for NativeHost {
    fn address_of(&self, buffer: &[u8]) -> Result<u64, CodecError> {
        Ok(buffer.as_ptr() as usize as u64)
    }

    fn read_bytes(&self, address: u64, length: usize) -> Result<Vec<u8>, CodecError> {
        if address == 0 {
            return Ok(Vec::new());
        }
        // SAFETY: the caller is required to guarantee `address` is live for `length` bytes;
        // this is the one narrow boundary where the crate trusts the host.
        let slice = unsafe { std::slice::from_raw_parts(address as usize as *const u8, length) };
        Ok(slice.to_vec())
    }
}

/// UTF-8 encode a string to its byte representation. A pure text transform, not a host
/// collaborator operation.
pub fn encode_utf8(s: &str) -> Vec<u8> {
    s.as_bytes().to_vec()
}

/// UTF-8 decode a byte sequence.
pub fn decode_utf8(bytes: &[u8]) -> Result<String, CodecError> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| CodecError::schema("<utf8>", format!("invalid utf-8: {}", e)))
}

/// The number of bytes `s` occupies when UTF-8 encoded.
pub fn byte_length_utf8(s: &str) -> usize {
    s.len()
}
