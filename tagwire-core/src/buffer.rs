// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Binary buffer management for the protobuf wire format.
//!
//! [`Writer`] appends to a growable byte vector and never fails; all size
//! decisions are made before writing (see the two-pass packed sizing in the
//! coder matrix). [`Reader`] is bounds-checked and returns
//! [`Error::BufferOutOfBound`] / [`Error::InvalidData`] on truncated or
//! malformed input instead of panicking.

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use crate::error::Error;

/// Append-only wire buffer.
#[derive(Default)]
pub struct Writer {
    bf: Vec<u8>,
    reserved: usize,
}

impl Writer {
    /// Keeps capacity and resets length to 0.
    pub fn reset(&mut self) {
        self.bf.clear();
    }

    pub fn dump(&self) -> Vec<u8> {
        self.bf.clone()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.bf
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bf
    }

    pub fn len(&self) -> usize {
        self.bf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bf.is_empty()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.reserved += additional;
        if self.bf.capacity() < self.reserved {
            self.bf.reserve(self.reserved);
        }
    }

    pub fn write_bytes(&mut self, v: &[u8]) {
        self.bf.extend_from_slice(v);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.bf.write_u8(value).unwrap();
    }

    pub fn write_fixed32(&mut self, value: u32) {
        self.bf.write_u32::<LittleEndian>(value).unwrap();
    }

    pub fn write_fixed64(&mut self, value: u64) {
        self.bf.write_u64::<LittleEndian>(value).unwrap();
    }

    pub fn write_f32(&mut self, value: f32) {
        self.bf.write_f32::<LittleEndian>(value).unwrap();
    }

    pub fn write_f64(&mut self, value: f64) {
        self.bf.write_f64::<LittleEndian>(value).unwrap();
    }

    /// Little-endian base-128 varint, low 7 bits per byte, high bit set on
    /// continuation bytes.
    pub fn write_varuint64(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.write_u8((value as u8 & 0x7F) | 0x80);
            value >>= 7;
        }
        self.write_u8(value as u8);
    }

    pub fn write_varuint32(&mut self, value: u32) {
        self.write_varuint64(value as u64);
    }

    /// Two's-complement varint: negative values sign-extend to 64 bits and
    /// occupy the full ten bytes, matching `int32`/`int64` semantics.
    pub fn write_varint64(&mut self, value: i64) {
        self.write_varuint64(value as u64);
    }

    pub fn write_tag(&mut self, tag: u32) {
        self.write_varuint32(tag);
    }
}

/// Bounds-checked wire reader over a borrowed byte slice.
pub struct Reader<'a> {
    bf: &'a [u8],
    cursor: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bf: &'a [u8]) -> Reader<'a> {
        Reader { bf, cursor: 0 }
    }

    #[inline(always)]
    pub fn pos(&self) -> usize {
        self.cursor
    }

    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.bf.len() - self.cursor
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.cursor >= self.bf.len()
    }

    /// Raw view of an already-consumed region, used to capture unknown
    /// fields verbatim.
    pub fn slice(&self, start: usize, end: usize) -> &'a [u8] {
        &self.bf[start..end]
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        if self.cursor >= self.bf.len() {
            return Err(Error::buffer_out_of_bound(self.cursor, 1, self.bf.len()));
        }
        let v = self.bf[self.cursor];
        self.cursor += 1;
        Ok(v)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], Error> {
        if self.remaining() < len {
            return Err(Error::buffer_out_of_bound(self.cursor, len, self.bf.len()));
        }
        let v = &self.bf[self.cursor..self.cursor + len];
        self.cursor += len;
        Ok(v)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), Error> {
        if self.remaining() < len {
            return Err(Error::buffer_out_of_bound(self.cursor, len, self.bf.len()));
        }
        self.cursor += len;
        Ok(())
    }

    pub fn read_fixed32(&mut self) -> Result<u32, Error> {
        let bytes = self.read_bytes(4)?;
        Ok(LittleEndian::read_u32(bytes))
    }

    pub fn read_fixed64(&mut self) -> Result<u64, Error> {
        let bytes = self.read_bytes(8)?;
        Ok(LittleEndian::read_u64(bytes))
    }

    pub fn read_f32(&mut self) -> Result<f32, Error> {
        let bytes = self.read_bytes(4)?;
        Ok(LittleEndian::read_f32(bytes))
    }

    pub fn read_f64(&mut self) -> Result<f64, Error> {
        let bytes = self.read_bytes(8)?;
        Ok(LittleEndian::read_f64(bytes))
    }

    pub fn read_varuint64(&mut self) -> Result<u64, Error> {
        let mut value: u64 = 0;
        let mut shift: u32 = 0;
        loop {
            let byte = self.read_u8()?;
            if shift == 63 && byte > 1 {
                return Err(Error::invalid_data("varint overflows 64 bits"));
            }
            value |= ((byte & 0x7F) as u64) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift >= 64 {
                return Err(Error::invalid_data("varint exceeds ten bytes"));
            }
        }
    }

    pub fn read_varuint32(&mut self) -> Result<u32, Error> {
        // Accepts the canonical ten-byte sign-extended form for int32.
        Ok(self.read_varuint64()? as u32)
    }
}

/// Number of bytes the varint encoding of `value` occupies.
#[inline(always)]
pub const fn varuint64_size(value: u64) -> usize {
    // 1 + floor(bits/7); value 0 still takes one byte.
    ((((value | 1).leading_zeros() ^ 63) * 9 + 73) / 64) as usize
}

#[inline(always)]
pub const fn varuint32_size(value: u32) -> usize {
    varuint64_size(value as u64)
}

#[inline(always)]
pub const fn varint64_size(value: i64) -> usize {
    varuint64_size(value as u64)
}

#[inline(always)]
pub const fn zigzag32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

#[inline(always)]
pub const fn unzigzag32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

#[inline(always)]
pub const fn zigzag64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

#[inline(always)]
pub const fn unzigzag64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}
