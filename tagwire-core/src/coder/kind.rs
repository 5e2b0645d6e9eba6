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

//! Per-kind value codecs.
//!
//! One [`KindCodec`] per scalar kind, each a static of plain function
//! pointers stamped from the declarative table at the bottom of this file.
//! A codec handles exactly one value with no tag: the field coders add
//! tags, cardinality and presence on top. Message and group kinds have no
//! codec here because their bodies recurse through the field-coder layer.

use crate::buffer::{
    varint64_size, varuint32_size, varuint64_size, zigzag32, zigzag64, unzigzag32, unzigzag64,
    Reader, Writer,
};
use crate::coder::EncodeState;
use crate::error::Error;
use crate::types::{Kind, WireType};
use crate::value::{Value, ValueRef};

/// Size, encode and decode for single values of one scalar kind.
pub struct KindCodec {
    pub wire_type: WireType,
    /// Encoded byte length of one value, tag excluded.
    pub size: fn(ValueRef<'_>) -> usize,
    pub encode: fn(&mut Writer, ValueRef<'_>, &mut EncodeState<'_>),
    pub decode: fn(&mut Reader<'_>) -> Result<Value, Error>,
}

/// The codec for a scalar kind. Message and group kinds are a caller bug.
pub fn codec(kind: Kind) -> &'static KindCodec {
    match kind {
        Kind::Bool => &BOOL,
        Kind::Int32 => &INT32,
        Kind::Sint32 => &SINT32,
        Kind::Uint32 => &UINT32,
        Kind::Int64 => &INT64,
        Kind::Sint64 => &SINT64,
        Kind::Uint64 => &UINT64,
        Kind::Fixed32 => &FIXED32,
        Kind::Sfixed32 => &SFIXED32,
        Kind::Fixed64 => &FIXED64,
        Kind::Sfixed64 => &SFIXED64,
        Kind::Float => &FLOAT,
        Kind::Double => &DOUBLE,
        Kind::Enum => &ENUM,
        Kind::String => &STRING,
        Kind::Bytes => &BYTES,
        Kind::Message | Kind::Group => {
            panic!("message kinds are encoded by the field coders, not a KindCodec")
        }
    }
}

#[cold]
fn mismatch(expected: &'static str, got: ValueRef<'_>) -> ! {
    panic!("type mismatch: coder expected {expected}, got {got:?}")
}

fn as_bool(v: ValueRef<'_>) -> bool {
    match v {
        ValueRef::Bool(b) => b,
        other => mismatch("Bool", other),
    }
}

fn as_i32(v: ValueRef<'_>) -> i32 {
    match v {
        ValueRef::I32(n) => n,
        other => mismatch("I32", other),
    }
}

fn as_i64(v: ValueRef<'_>) -> i64 {
    match v {
        ValueRef::I64(n) => n,
        other => mismatch("I64", other),
    }
}

fn as_u32(v: ValueRef<'_>) -> u32 {
    match v {
        ValueRef::U32(n) => n,
        other => mismatch("U32", other),
    }
}

fn as_u64(v: ValueRef<'_>) -> u64 {
    match v {
        ValueRef::U64(n) => n,
        other => mismatch("U64", other),
    }
}

/// String-kind values arrive as `Str` from typed storage and as `Bytes`
/// from the owned plane, where unvalidated text is representable.
fn as_text(v: ValueRef<'_>) -> &[u8] {
    match v {
        ValueRef::Str(s) => s.as_bytes(),
        ValueRef::Bytes(b) => b,
        other => mismatch("Str", other),
    }
}

fn as_bytes(v: ValueRef<'_>) -> &[u8] {
    match v {
        ValueRef::Bytes(b) => b,
        other => mismatch("Bytes", other),
    }
}

fn len_delimited_size(len: usize) -> usize {
    varuint64_size(len as u64) + len
}

pub static BOOL: KindCodec = KindCodec {
    wire_type: WireType::Varint,
    size: |_| 1,
    encode: |w, v, _| w.write_u8(as_bool(v) as u8),
    decode: |r| Ok(Value::Bool(r.read_varuint64()? != 0)),
};

// int32 sign-extends to 64 bits: negative values occupy ten bytes.
pub static INT32: KindCodec = KindCodec {
    wire_type: WireType::Varint,
    size: |v| varint64_size(as_i32(v) as i64),
    encode: |w, v, _| w.write_varint64(as_i32(v) as i64),
    decode: |r| Ok(Value::I32(r.read_varuint64()? as i32)),
};

pub static INT64: KindCodec = KindCodec {
    wire_type: WireType::Varint,
    size: |v| varint64_size(as_i64(v)),
    encode: |w, v, _| w.write_varint64(as_i64(v)),
    decode: |r| Ok(Value::I64(r.read_varuint64()? as i64)),
};

pub static SINT32: KindCodec = KindCodec {
    wire_type: WireType::Varint,
    size: |v| varuint32_size(zigzag32(as_i32(v))),
    encode: |w, v, _| w.write_varuint32(zigzag32(as_i32(v))),
    decode: |r| Ok(Value::I32(unzigzag32(r.read_varuint32()?))),
};

pub static SINT64: KindCodec = KindCodec {
    wire_type: WireType::Varint,
    size: |v| varuint64_size(zigzag64(as_i64(v))),
    encode: |w, v, _| w.write_varuint64(zigzag64(as_i64(v))),
    decode: |r| Ok(Value::I64(unzigzag64(r.read_varuint64()?))),
};

pub static UINT32: KindCodec = KindCodec {
    wire_type: WireType::Varint,
    size: |v| varuint32_size(as_u32(v)),
    encode: |w, v, _| w.write_varuint32(as_u32(v)),
    decode: |r| Ok(Value::U32(r.read_varuint32()?)),
};

pub static UINT64: KindCodec = KindCodec {
    wire_type: WireType::Varint,
    size: |v| varuint64_size(as_u64(v)),
    encode: |w, v, _| w.write_varuint64(as_u64(v)),
    decode: |r| Ok(Value::U64(r.read_varuint64()?)),
};

pub static FIXED32: KindCodec = KindCodec {
    wire_type: WireType::Fixed32,
    size: |_| 4,
    encode: |w, v, _| w.write_fixed32(as_u32(v)),
    decode: |r| Ok(Value::U32(r.read_fixed32()?)),
};

pub static SFIXED32: KindCodec = KindCodec {
    wire_type: WireType::Fixed32,
    size: |_| 4,
    encode: |w, v, _| w.write_fixed32(as_i32(v) as u32),
    decode: |r| Ok(Value::I32(r.read_fixed32()? as i32)),
};

pub static FIXED64: KindCodec = KindCodec {
    wire_type: WireType::Fixed64,
    size: |_| 8,
    encode: |w, v, _| w.write_fixed64(as_u64(v)),
    decode: |r| Ok(Value::U64(r.read_fixed64()?)),
};

pub static SFIXED64: KindCodec = KindCodec {
    wire_type: WireType::Fixed64,
    size: |_| 8,
    encode: |w, v, _| w.write_fixed64(as_i64(v) as u64),
    decode: |r| Ok(Value::I64(r.read_fixed64()? as i64)),
};

pub static FLOAT: KindCodec = KindCodec {
    wire_type: WireType::Fixed32,
    size: |_| 4,
    encode: |w, v, _| match v {
        ValueRef::F32(f) => w.write_f32(f),
        other => mismatch("F32", other),
    },
    decode: |r| Ok(Value::F32(r.read_f32()?)),
};

pub static DOUBLE: KindCodec = KindCodec {
    wire_type: WireType::Fixed64,
    size: |_| 8,
    encode: |w, v, _| match v {
        ValueRef::F64(f) => w.write_f64(f),
        other => mismatch("F64", other),
    },
    decode: |r| Ok(Value::F64(r.read_f64()?)),
};

pub static ENUM: KindCodec = KindCodec {
    wire_type: WireType::Varint,
    size: |v| varint64_size(as_i32(v) as i64),
    encode: |w, v, _| w.write_varint64(as_i32(v) as i64),
    decode: |r| Ok(Value::I32(r.read_varuint64()? as i32)),
};

// UTF-8 failure is advisory: the bytes are written regardless and the
// error is reported after the marshal completes.
pub static STRING: KindCodec = KindCodec {
    wire_type: WireType::LengthDelimited,
    size: |v| len_delimited_size(as_text(v).len()),
    encode: |w, v, state| {
        let bytes = as_text(v);
        w.write_varuint64(bytes.len() as u64);
        w.write_bytes(bytes);
        if std::str::from_utf8(bytes).is_err() {
            state.note(Error::invalid_utf8(state.field));
        }
    },
    decode: |r| {
        let len = r.read_varuint64()? as usize;
        let bytes = r.read_bytes(len)?;
        match std::str::from_utf8(bytes) {
            Ok(s) => Ok(Value::Str(s.to_owned())),
            Err(_) => Err(Error::invalid_utf8("decoded string field")),
        }
    },
};

pub static BYTES: KindCodec = KindCodec {
    wire_type: WireType::LengthDelimited,
    size: |v| len_delimited_size(as_bytes(v).len()),
    encode: |w, v, _| {
        let bytes = as_bytes(v);
        w.write_varuint64(bytes.len() as u64);
        w.write_bytes(bytes);
    },
    decode: |r| {
        let len = r.read_varuint64()? as usize;
        Ok(Value::Bytes(r.read_bytes(len)?.to_vec()))
    },
};
