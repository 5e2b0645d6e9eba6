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

//! Field coders: the cardinality and presence layer of the matrix.
//!
//! A [`FieldCoder`] is one `{size, encode}` pair selected per field at
//! table-build time. Presence is the accessor's business: `get` already
//! returns `None` for an elided proto3 zero, an unset explicit-presence
//! scalar, an empty collection or an inactive oneof member, so the coders
//! here only frame whatever the accessor reports present. Oneofs have a
//! single encode entry point on the first declared member; the remaining
//! members carry the no-op coder.

use std::any::Any;

use crate::buffer::{varuint64_size, Writer};
use crate::coder::kind::{self, KindCodec};
use crate::coder::{EncodeOptions, EncodeState};
use crate::message_info::{FieldInfo, MessageInfo};
use crate::types::{make_tag, tag_size, Kind, WireType};
use crate::value::{MapKey, ValueRef};

pub type SizeFn = fn(&MessageInfo, &FieldInfo, &dyn Any, &EncodeOptions) -> usize;
pub type EncodeFn = fn(&MessageInfo, &FieldInfo, &dyn Any, &mut Writer, &mut EncodeState<'_>);

/// One cell of the coder matrix.
pub struct FieldCoder {
    pub size: SizeFn,
    pub encode: EncodeFn,
}

/// Proto3 implicit-presence scalars: the accessor elides zero values.
pub static SCALAR_ELIDE: FieldCoder = FieldCoder {
    size: singular_size,
    encode: singular_encode,
};

/// Explicit-presence scalars (`Option<T>` storage): a set zero encodes.
pub static SCALAR_NULLABLE: FieldCoder = FieldCoder {
    size: singular_size,
    encode: singular_encode,
};

pub static MESSAGE: FieldCoder = FieldCoder {
    size: singular_size,
    encode: singular_encode,
};

pub static GROUP: FieldCoder = FieldCoder {
    size: singular_size,
    encode: singular_encode,
};

pub static LIST: FieldCoder = FieldCoder {
    size: list_size,
    encode: list_encode,
};

pub static LIST_PACKED: FieldCoder = FieldCoder {
    size: list_packed_size,
    encode: list_packed_encode,
};

pub static MAP: FieldCoder = FieldCoder {
    size: map_size,
    encode: map_encode,
};

/// First declared member of a oneof: dispatches on the union's runtime tag.
pub static ONEOF_ENTRY: FieldCoder = FieldCoder {
    size: oneof_size,
    encode: oneof_encode,
};

/// Every other oneof member; the entry coder already covers it.
pub static ONEOF_MEMBER: FieldCoder = FieldCoder {
    size: |_, _, _, _| 0,
    encode: |_, _, _, _, _| {},
};

/// Payload size of one present value, tag excluded. Message and group
/// kinds recurse through the nested type's own table.
pub(crate) fn payload_size(
    kind: Kind,
    number: u32,
    codec: Option<&'static KindCodec>,
    value: ValueRef<'_>,
    opts: &EncodeOptions,
) -> usize {
    match kind {
        Kind::Message => {
            let body = submessage_size(value, opts);
            varuint64_size(body as u64) + body
        }
        Kind::Group => submessage_size(value, opts) + tag_size(number, WireType::EndGroup),
        _ => (unwrap_codec(codec).size)(value),
    }
}

pub(crate) fn payload_encode(
    kind: Kind,
    number: u32,
    codec: Option<&'static KindCodec>,
    value: ValueRef<'_>,
    w: &mut Writer,
    state: &mut EncodeState<'_>,
) {
    match kind {
        Kind::Message => {
            let (info, record) = submessage(value);
            let body = info.size(record, state.options);
            w.write_varuint64(body as u64);
            let outer = state.field;
            info.encode_body(w, record.as_any(), state);
            state.field = outer;
        }
        Kind::Group => {
            let (info, record) = submessage(value);
            let outer = state.field;
            info.encode_body(w, record.as_any(), state);
            state.field = outer;
            // The end tag closes the group even when the body is empty.
            w.write_tag(make_tag(number, WireType::EndGroup));
        }
        _ => (unwrap_codec(codec).encode)(w, value, state),
    }
}

fn unwrap_codec(codec: Option<&'static KindCodec>) -> &'static KindCodec {
    codec.expect("scalar kind with no codec in its field info")
}

fn submessage(value: ValueRef<'_>) -> (&'static MessageInfo, &dyn crate::record::Record) {
    match value {
        ValueRef::Message(m) => (m.layout_dyn().message_info(), m),
        other => panic!("type mismatch: coder expected Message, got {other:?}"),
    }
}

fn submessage_size(value: ValueRef<'_>, opts: &EncodeOptions) -> usize {
    let (info, record) = submessage(value);
    info.size(record, opts)
}

fn singular_size(_: &MessageInfo, fi: &FieldInfo, r: &dyn Any, opts: &EncodeOptions) -> usize {
    match (fi.accessor.get)(r) {
        Some(v) => fi.tag_size + payload_size(fi.kind, fi.number, fi.codec, v, opts),
        None => 0,
    }
}

fn singular_encode(
    _: &MessageInfo,
    fi: &FieldInfo,
    r: &dyn Any,
    w: &mut Writer,
    state: &mut EncodeState<'_>,
) {
    if let Some(v) = (fi.accessor.get)(r) {
        state.field = fi.name;
        w.write_tag(fi.tag);
        payload_encode(fi.kind, fi.number, fi.codec, v, w, state);
    }
}

fn field_list<'a>(fi: &FieldInfo, r: &'a dyn Any) -> &'a dyn crate::storage::ListView {
    let list = fi
        .accessor
        .list
        .as_ref()
        .expect("repeated field without list storage");
    list(r)
}

fn list_size(_: &MessageInfo, fi: &FieldInfo, r: &dyn Any, opts: &EncodeOptions) -> usize {
    let list = field_list(fi, r);
    let mut total = 0;
    for i in 0..list.len() {
        total += fi.tag_size + payload_size(fi.kind, fi.number, fi.codec, list.get(i), opts);
    }
    total
}

fn list_encode(
    _: &MessageInfo,
    fi: &FieldInfo,
    r: &dyn Any,
    w: &mut Writer,
    state: &mut EncodeState<'_>,
) {
    let list = field_list(fi, r);
    state.field = fi.name;
    for i in 0..list.len() {
        w.write_tag(fi.tag);
        payload_encode(fi.kind, fi.number, fi.codec, list.get(i), w, state);
    }
}

/// Two-pass packed sizing: the length prefix's own width depends on the
/// summed element sizes, so elements are measured before anything is
/// written.
fn packed_body_size(fi: &FieldInfo, list: &dyn crate::storage::ListView) -> usize {
    let codec = unwrap_codec(fi.codec);
    let mut body = 0;
    for i in 0..list.len() {
        body += (codec.size)(list.get(i));
    }
    body
}

fn list_packed_size(_: &MessageInfo, fi: &FieldInfo, r: &dyn Any, _: &EncodeOptions) -> usize {
    let list = field_list(fi, r);
    if list.is_empty() {
        return 0;
    }
    let body = packed_body_size(fi, list);
    fi.tag_size + varuint64_size(body as u64) + body
}

fn list_packed_encode(
    _: &MessageInfo,
    fi: &FieldInfo,
    r: &dyn Any,
    w: &mut Writer,
    state: &mut EncodeState<'_>,
) {
    let list = field_list(fi, r);
    if list.is_empty() {
        return;
    }
    let codec = unwrap_codec(fi.codec);
    state.field = fi.name;
    w.write_tag(fi.tag);
    w.write_varuint64(packed_body_size(fi, list) as u64);
    for i in 0..list.len() {
        (codec.encode)(w, list.get(i), state);
    }
}

/// Size of one map entry's body: a synthetic two-field submessage with
/// key = 1 and value = 2, zero key/value elided like any proto3 scalar.
fn map_entry_size(fi: &FieldInfo, key: ValueRef<'_>, value: ValueRef<'_>, opts: &EncodeOptions) -> usize {
    let meta = fi.map.expect("map coder on a non-map field");
    let mut body = 0;
    if !key.is_zero() {
        body += tag_size(1, meta.key_kind.wire_type())
            + (kind::codec(meta.key_kind).size)(key);
    }
    if meta.value_kind.is_message() {
        body += tag_size(2, WireType::LengthDelimited)
            + payload_size(Kind::Message, 2, None, value, opts);
    } else if !value.is_zero() {
        body += tag_size(2, meta.value_kind.wire_type())
            + (kind::codec(meta.value_kind).size)(value);
    }
    body
}

fn map_entry_encode(
    fi: &FieldInfo,
    key: ValueRef<'_>,
    value: ValueRef<'_>,
    w: &mut Writer,
    state: &mut EncodeState<'_>,
) {
    let meta = fi.map.expect("map coder on a non-map field");
    if !key.is_zero() {
        w.write_tag(make_tag(1, meta.key_kind.wire_type()));
        (kind::codec(meta.key_kind).encode)(w, key, state);
    }
    if meta.value_kind.is_message() {
        w.write_tag(make_tag(2, WireType::LengthDelimited));
        payload_encode(Kind::Message, 2, None, value, w, state);
    } else if !value.is_zero() {
        w.write_tag(make_tag(2, meta.value_kind.wire_type()));
        (kind::codec(meta.value_kind).encode)(w, value, state);
    }
}

fn field_map<'a>(fi: &FieldInfo, r: &'a dyn Any) -> &'a dyn crate::storage::MapView {
    let map = fi
        .accessor
        .map
        .as_ref()
        .expect("map field without map storage");
    map(r)
}

fn map_size(_: &MessageInfo, fi: &FieldInfo, r: &dyn Any, opts: &EncodeOptions) -> usize {
    let map = field_map(fi, r);
    let mut total = 0;
    for (key, value) in map.iter() {
        let body = map_entry_size(fi, key.as_value_ref(), value, opts);
        total += fi.tag_size + varuint64_size(body as u64) + body;
    }
    total
}

fn map_encode(
    _: &MessageInfo,
    fi: &FieldInfo,
    r: &dyn Any,
    w: &mut Writer,
    state: &mut EncodeState<'_>,
) {
    let map = field_map(fi, r);
    state.field = fi.name;
    let mut entries: Vec<(MapKey, ValueRef<'_>)> = map.iter().collect();
    if state.options.deterministic {
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    }
    for (key, value) in entries {
        let body = map_entry_size(fi, key.as_value_ref(), value, state.options);
        w.write_tag(fi.tag);
        w.write_varuint64(body as u64);
        map_entry_encode(fi, key.as_value_ref(), value, w, state);
    }
}

fn oneof_size(mi: &MessageInfo, fi: &FieldInfo, r: &dyn Any, opts: &EncodeOptions) -> usize {
    let index = fi.oneof_index.expect("oneof coder on a plain field");
    let Some(active) = mi.which(index, r) else {
        return 0;
    };
    let member = mi
        .field(active)
        .expect("active oneof member missing from the field table");
    match (member.accessor.get)(r) {
        Some(v) => member.tag_size + payload_size(member.kind, member.number, member.codec, v, opts),
        None => 0,
    }
}

fn oneof_encode(
    mi: &MessageInfo,
    fi: &FieldInfo,
    r: &dyn Any,
    w: &mut Writer,
    state: &mut EncodeState<'_>,
) {
    let index = fi.oneof_index.expect("oneof coder on a plain field");
    let Some(active) = mi.which(index, r) else {
        return;
    };
    let member = mi
        .field(active)
        .expect("active oneof member missing from the field table");
    if let Some(v) = (member.accessor.get)(r) {
        state.field = member.name;
        w.write_tag(member.tag);
        payload_encode(member.kind, member.number, member.codec, v, w, state);
    }
}
