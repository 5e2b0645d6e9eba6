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

//! Type-erased field values.
//!
//! Two planes exist deliberately. [`ValueRef`] is a cheap borrowed view used
//! on the marshal fast path (scalars are copied, strings/bytes/collections
//! are borrowed, nothing allocates). [`Value`] is the owned form used where
//! storage cannot statically bind to a field projection: extension entries,
//! map elements, oneof payloads and the reflective `get`/`set` surface.

use std::cmp::Ordering;
use std::fmt;

use crate::record::Record;
use crate::storage::{ListView, MapView};
use crate::types::Kind;

/// Borrowed, allocation-free view of one field value.
#[derive(Clone, Copy)]
pub enum ValueRef<'a> {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(&'a str),
    Bytes(&'a [u8]),
    Message(&'a dyn Record),
    List(&'a dyn ListView),
    Map(&'a dyn MapView),
}

impl ValueRef<'_> {
    /// Proto3 zero-elision check, mirroring [`Value::is_zero`]. `-0.0` is
    /// non-zero: its sign bit survives encoding, so presence must too.
    pub fn is_zero(&self) -> bool {
        match self {
            ValueRef::Bool(v) => !*v,
            ValueRef::I32(v) => *v == 0,
            ValueRef::I64(v) => *v == 0,
            ValueRef::U32(v) => *v == 0,
            ValueRef::U64(v) => *v == 0,
            ValueRef::F32(v) => v.to_bits() == 0,
            ValueRef::F64(v) => v.to_bits() == 0,
            ValueRef::Str(v) => v.is_empty(),
            ValueRef::Bytes(v) => v.is_empty(),
            ValueRef::Message(_) => false,
            ValueRef::List(l) => l.is_empty(),
            ValueRef::Map(m) => m.is_empty(),
        }
    }

    /// Deep conversion into the owned plane.
    pub fn to_owned_value(&self) -> Value {
        match *self {
            ValueRef::Bool(v) => Value::Bool(v),
            ValueRef::I32(v) => Value::I32(v),
            ValueRef::I64(v) => Value::I64(v),
            ValueRef::U32(v) => Value::U32(v),
            ValueRef::U64(v) => Value::U64(v),
            ValueRef::F32(v) => Value::F32(v),
            ValueRef::F64(v) => Value::F64(v),
            ValueRef::Str(v) => Value::Str(v.to_owned()),
            ValueRef::Bytes(v) => Value::Bytes(v.to_vec()),
            ValueRef::Message(m) => Value::Message(m.clone_boxed()),
            ValueRef::List(l) => {
                Value::List((0..l.len()).map(|i| l.get(i).to_owned_value()).collect())
            }
            ValueRef::Map(m) => {
                Value::Map(m.iter().map(|(k, v)| (k, v.to_owned_value())).collect())
            }
        }
    }
}

impl fmt::Debug for ValueRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueRef::Bool(v) => write!(f, "Bool({v})"),
            ValueRef::I32(v) => write!(f, "I32({v})"),
            ValueRef::I64(v) => write!(f, "I64({v})"),
            ValueRef::U32(v) => write!(f, "U32({v})"),
            ValueRef::U64(v) => write!(f, "U64({v})"),
            ValueRef::F32(v) => write!(f, "F32({v})"),
            ValueRef::F64(v) => write!(f, "F64({v})"),
            ValueRef::Str(v) => write!(f, "Str({v:?})"),
            ValueRef::Bytes(v) => write!(f, "Bytes({} bytes)", v.len()),
            ValueRef::Message(m) => {
                write!(f, "Message({})", m.layout_dyn().descriptor().full_name)
            }
            ValueRef::List(l) => write!(f, "List(len={})", l.len()),
            ValueRef::Map(m) => write!(f, "Map(len={})", m.len()),
        }
    }
}

/// Owned, type-erased field value.
pub enum Value {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
    Message(Box<dyn Record>),
    List(Vec<Value>),
    Map(Vec<(MapKey, Value)>),
}

impl Value {
    pub fn as_value_ref(&self) -> ValueRef<'_> {
        match self {
            Value::Bool(v) => ValueRef::Bool(*v),
            Value::I32(v) => ValueRef::I32(*v),
            Value::I64(v) => ValueRef::I64(*v),
            Value::U32(v) => ValueRef::U32(*v),
            Value::U64(v) => ValueRef::U64(*v),
            Value::F32(v) => ValueRef::F32(*v),
            Value::F64(v) => ValueRef::F64(*v),
            Value::Str(v) => ValueRef::Str(v),
            Value::Bytes(v) => ValueRef::Bytes(v),
            Value::Message(m) => ValueRef::Message(&**m),
            Value::List(l) => ValueRef::List(l),
            Value::Map(m) => ValueRef::Map(m),
        }
    }

    /// The kind's zero value. Message kinds have no zero; callers decide
    /// between a default instance and "unset" before reaching here.
    pub fn zero_of(kind: Kind) -> Value {
        match kind {
            Kind::Bool => Value::Bool(false),
            Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 | Kind::Enum => Value::I32(0),
            Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => Value::I64(0),
            Kind::Uint32 | Kind::Fixed32 => Value::U32(0),
            Kind::Uint64 | Kind::Fixed64 => Value::U64(0),
            Kind::Float => Value::F32(0.0),
            Kind::Double => Value::F64(0.0),
            Kind::String => Value::Str(String::new()),
            Kind::Bytes => Value::Bytes(Vec::new()),
            Kind::Message | Kind::Group => {
                panic!("message kinds have no zero value")
            }
        }
    }

    /// Proto3 zero-elision check. `-0.0` is non-zero on purpose: its sign
    /// bit survives encoding, so presence must survive too.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Bool(v) => !*v,
            Value::I32(v) => *v == 0,
            Value::I64(v) => *v == 0,
            Value::U32(v) => *v == 0,
            Value::U64(v) => *v == 0,
            Value::F32(v) => v.to_bits() == 0,
            Value::F64(v) => v.to_bits() == 0,
            Value::Str(v) => v.is_empty(),
            Value::Bytes(v) => v.is_empty(),
            Value::Message(_) => false,
            Value::List(l) => l.is_empty(),
            Value::Map(m) => m.is_empty(),
        }
    }
}

impl Clone for Value {
    fn clone(&self) -> Value {
        match self {
            Value::Bool(v) => Value::Bool(*v),
            Value::I32(v) => Value::I32(*v),
            Value::I64(v) => Value::I64(*v),
            Value::U32(v) => Value::U32(*v),
            Value::U64(v) => Value::U64(*v),
            Value::F32(v) => Value::F32(*v),
            Value::F64(v) => Value::F64(*v),
            Value::Str(v) => Value::Str(v.clone()),
            Value::Bytes(v) => Value::Bytes(v.clone()),
            Value::Message(m) => Value::Message(m.clone_boxed()),
            Value::List(l) => Value::List(l.clone()),
            Value::Map(m) => Value::Map(m.clone()),
        }
    }
}

impl PartialEq for Value {
    /// Floats compare by bit pattern (NaNs equal only when bit-identical,
    /// `0.0 != -0.0`); messages compare by deterministic wire bytes.
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a.to_bits() == b.to_bits(),
            (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Message(a), Value::Message(b)) => {
                crate::message_info::eq_by_wire(&**a, &**b)
            }
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_value_ref().fmt(f)
    }
}

/// A map key. Keys within one map field are homogeneous; the [`Ord`] impl
/// realizes the deterministic-mode ordering: signed integers by signed
/// value, unsigned by unsigned value, `false < true`, strings
/// byte-lexicographically.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MapKey {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    Str(String),
}

impl MapKey {
    pub fn kind_matches(&self, kind: Kind) -> bool {
        matches!(
            (self, kind),
            (MapKey::Bool(_), Kind::Bool)
                | (MapKey::I32(_), Kind::Int32 | Kind::Sint32 | Kind::Sfixed32)
                | (MapKey::I64(_), Kind::Int64 | Kind::Sint64 | Kind::Sfixed64)
                | (MapKey::U32(_), Kind::Uint32 | Kind::Fixed32)
                | (MapKey::U64(_), Kind::Uint64 | Kind::Fixed64)
                | (MapKey::Str(_), Kind::String)
        )
    }

    pub fn as_value_ref(&self) -> ValueRef<'_> {
        match self {
            MapKey::Bool(v) => ValueRef::Bool(*v),
            MapKey::I32(v) => ValueRef::I32(*v),
            MapKey::I64(v) => ValueRef::I64(*v),
            MapKey::U32(v) => ValueRef::U32(*v),
            MapKey::U64(v) => ValueRef::U64(*v),
            MapKey::Str(v) => ValueRef::Str(v),
        }
    }

    /// Converts an owned value of a key-compatible kind. Passing a
    /// non-key value is a programming error.
    pub fn from_value(value: Value) -> MapKey {
        match value {
            Value::Bool(v) => MapKey::Bool(v),
            Value::I32(v) => MapKey::I32(v),
            Value::I64(v) => MapKey::I64(v),
            Value::U32(v) => MapKey::U32(v),
            Value::U64(v) => MapKey::U64(v),
            Value::Str(v) => MapKey::Str(v),
            other => panic!("{other:?} is not a valid map key"),
        }
    }

    /// Zero key, used when a decoded map entry omits field 1.
    pub fn zero_of(kind: Kind) -> MapKey {
        match kind {
            Kind::Bool => MapKey::Bool(false),
            Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => MapKey::I32(0),
            Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => MapKey::I64(0),
            Kind::Uint32 | Kind::Fixed32 => MapKey::U32(0),
            Kind::Uint64 | Kind::Fixed64 => MapKey::U64(0),
            Kind::String => MapKey::Str(String::new()),
            _ => panic!("kind {kind:?} is not a valid map key kind"),
        }
    }
}

impl Ord for MapKey {
    fn cmp(&self, other: &MapKey) -> Ordering {
        match (self, other) {
            (MapKey::Bool(a), MapKey::Bool(b)) => a.cmp(b),
            (MapKey::I32(a), MapKey::I32(b)) => a.cmp(b),
            (MapKey::I64(a), MapKey::I64(b)) => a.cmp(b),
            (MapKey::U32(a), MapKey::U32(b)) => a.cmp(b),
            (MapKey::U64(a), MapKey::U64(b)) => a.cmp(b),
            (MapKey::Str(a), MapKey::Str(b)) => a.as_bytes().cmp(b.as_bytes()),
            // Heterogeneous comparison never happens for a well-formed map
            // field; fall back to a stable arbitrary order.
            (a, b) => discriminant_rank(a).cmp(&discriminant_rank(b)),
        }
    }
}

impl PartialOrd for MapKey {
    fn partial_cmp(&self, other: &MapKey) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn discriminant_rank(k: &MapKey) -> u8 {
    match k {
        MapKey::Bool(_) => 0,
        MapKey::I32(_) => 1,
        MapKey::I64(_) => 2,
        MapKey::U32(_) => 3,
        MapKey::U64(_) => 4,
        MapKey::Str(_) => 5,
    }
}

/// A proto2 custom default, stored in the field descriptor.
#[derive(Clone, Copy, Debug)]
pub enum DefaultValue {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(&'static str),
    Bytes(&'static [u8]),
}

impl DefaultValue {
    pub fn to_value(self) -> Value {
        match self {
            DefaultValue::Bool(v) => Value::Bool(v),
            DefaultValue::I32(v) => Value::I32(v),
            DefaultValue::I64(v) => Value::I64(v),
            DefaultValue::U32(v) => Value::U32(v),
            DefaultValue::U64(v) => Value::U64(v),
            DefaultValue::F32(v) => Value::F32(v),
            DefaultValue::F64(v) => Value::F64(v),
            DefaultValue::Str(v) => Value::Str(v.to_owned()),
            DefaultValue::Bytes(v) => Value::Bytes(v.to_vec()),
        }
    }
}
