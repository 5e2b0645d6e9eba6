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

//! Core wire-format type definitions and tag arithmetic.

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::buffer::varuint32_size;

/// The 3-bit framing suffix of a field tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    StartGroup = 3,
    EndGroup = 4,
    Fixed32 = 5,
}

/// Declared field kind: the value encoding, independent of cardinality.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Bool,
    Int32,
    Sint32,
    Uint32,
    Int64,
    Sint64,
    Uint64,
    Fixed32,
    Sfixed32,
    Fixed64,
    Sfixed64,
    Float,
    Double,
    Enum,
    String,
    Bytes,
    Message,
    Group,
}

impl Kind {
    /// Wire type of a single (non-packed) value of this kind.
    pub fn wire_type(self) -> WireType {
        match self {
            Kind::Bool
            | Kind::Int32
            | Kind::Sint32
            | Kind::Uint32
            | Kind::Int64
            | Kind::Sint64
            | Kind::Uint64
            | Kind::Enum => WireType::Varint,
            Kind::Fixed32 | Kind::Sfixed32 | Kind::Float => WireType::Fixed32,
            Kind::Fixed64 | Kind::Sfixed64 | Kind::Double => WireType::Fixed64,
            Kind::String | Kind::Bytes | Kind::Message => WireType::LengthDelimited,
            Kind::Group => WireType::StartGroup,
        }
    }

    /// Numeric kinds may be packed into a single length-delimited blob.
    pub fn is_packable(self) -> bool {
        !matches!(
            self,
            Kind::String | Kind::Bytes | Kind::Message | Kind::Group
        )
    }

    pub fn is_message(self) -> bool {
        matches!(self, Kind::Message | Kind::Group)
    }
}

/// How many values a field holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cardinality {
    Singular,
    /// Proto2 required: singular, but `is_initialized` demands presence.
    Required,
    Repeated,
}

/// Wire syntax revision of the declaring file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Syntax {
    Proto2,
    Proto3,
}

/// Decode recursion limit for nested messages and groups.
pub const MAX_DEPTH: usize = 100;

#[inline(always)]
pub const fn make_tag(number: u32, wire_type: WireType) -> u32 {
    (number << 3) | wire_type as u32
}

#[inline(always)]
pub const fn tag_field_number(tag: u32) -> u32 {
    tag >> 3
}

#[inline(always)]
pub fn tag_wire_type(tag: u32) -> Result<WireType, crate::error::Error> {
    WireType::try_from((tag & 7) as u8)
        .map_err(|_| crate::error::Error::invalid_data(format!("invalid wire type in tag {tag}")))
}

#[inline(always)]
pub const fn tag_size(number: u32, wire_type: WireType) -> usize {
    varuint32_size(make_tag(number, wire_type))
}
