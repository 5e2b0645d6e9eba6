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

//! Wire-walk merge: decoding a byte stream into an existing record.
//!
//! Standard protobuf merge semantics: singular fields overwrite, repeated
//! fields append, nested messages merge recursively. Packable repeated
//! fields accept both the packed and the per-element encoding regardless
//! of their declared packing. Field numbers inside an extension range with
//! a registered descriptor land in the extension store as lazy raw bytes;
//! everything else unrecognized is captured verbatim into the unknown
//! region, when the record type declares one.

use crate::buffer::Reader;
use crate::coder::kind;
use crate::descriptor::ExtensionDescriptor;
use crate::ensure;
use crate::error::Error;
use crate::message_info::{FieldInfo, MessageInfo};
use crate::record::Record;
use crate::registry::Registry;
use crate::types::{tag_field_number, tag_wire_type, Cardinality, Kind, WireType, MAX_DEPTH};
use crate::value::{MapKey, Value};

use std::any::Any;

/// Merges one wire image into `record`.
pub(crate) fn merge_record(
    record: &mut dyn Record,
    reader: &mut Reader<'_>,
    registry: &Registry,
    depth: usize,
    group: Option<u32>,
) -> Result<(), Error> {
    let info = record.layout_dyn().message_info();
    merge_fields(info, reader, record.as_any_mut(), registry, depth, group)
}

pub(crate) fn merge_fields(
    info: &MessageInfo,
    reader: &mut Reader<'_>,
    record: &mut dyn Any,
    registry: &Registry,
    depth: usize,
    group: Option<u32>,
) -> Result<(), Error> {
    while !reader.is_empty() {
        let start = reader.pos();
        let tag = reader.read_varuint32()?;
        ensure!(tag >> 3 != 0, Error::invalid_data("field number 0 in tag"));
        let number = tag_field_number(tag);
        let wire_type = tag_wire_type(tag)?;
        if wire_type == WireType::EndGroup {
            ensure!(
                group == Some(number),
                Error::invalid_data(format!("stray end-group tag for field {number}"))
            );
            return Ok(());
        }
        match info.field(number) {
            Some(fi) => merge_field(info, fi, reader, record, registry, depth, wire_type, start)?,
            None => merge_unmatched(info, reader, record, registry, number, wire_type, start, depth)?,
        }
    }
    ensure!(
        group.is_none(),
        Error::invalid_data("group not closed before end of input")
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn merge_field(
    info: &MessageInfo,
    fi: &FieldInfo,
    reader: &mut Reader<'_>,
    record: &mut dyn Any,
    registry: &Registry,
    depth: usize,
    wire_type: WireType,
    start: usize,
) -> Result<(), Error> {
    if fi.map.is_some() {
        if wire_type != WireType::LengthDelimited {
            return capture_unknown(info, reader, record, fi.number, wire_type, start, depth);
        }
        return merge_map_entry(fi, reader, record, registry, depth);
    }
    if fi.cardinality == Cardinality::Repeated {
        return merge_list_field(fi, reader, record, registry, depth, wire_type, start, info);
    }
    if fi.kind.is_message() {
        return merge_message_field(fi, reader, record, registry, depth, wire_type, start, info);
    }
    if wire_type != fi.kind.wire_type() {
        return capture_unknown(info, reader, record, fi.number, wire_type, start, depth);
    }
    let value = (kind::codec(fi.kind).decode)(reader)?;
    (fi.accessor.set)(record, value);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn merge_list_field(
    fi: &FieldInfo,
    reader: &mut Reader<'_>,
    record: &mut dyn Any,
    registry: &Registry,
    depth: usize,
    wire_type: WireType,
    start: usize,
    info: &MessageInfo,
) -> Result<(), Error> {
    // Packed form is accepted for every packable kind, declared packing
    // notwithstanding.
    if fi.kind.is_packable() && wire_type == WireType::LengthDelimited {
        let len = reader.read_varuint32()? as usize;
        let bytes = reader.read_bytes(len)?;
        let mut packed = Reader::new(bytes);
        let codec = kind::codec(fi.kind);
        let list = list_mut(fi, record);
        while !packed.is_empty() {
            list.push((codec.decode)(&mut packed)?);
        }
        return Ok(());
    }
    if wire_type != fi.kind.wire_type() {
        return capture_unknown(info, reader, record, fi.number, wire_type, start, depth);
    }
    match fi.kind {
        Kind::Message => {
            check_depth(depth)?;
            let len = reader.read_varuint32()? as usize;
            let bytes = reader.read_bytes(len)?;
            let mut sub = Reader::new(bytes);
            let mut element = new_linked(fi);
            merge_record(&mut *element, &mut sub, registry, depth - 1, None)?;
            list_mut(fi, record).push(Value::Message(element));
        }
        Kind::Group => {
            check_depth(depth)?;
            let mut element = new_linked(fi);
            merge_record(&mut *element, reader, registry, depth - 1, Some(fi.number))?;
            list_mut(fi, record).push(Value::Message(element));
        }
        _ => {
            let value = (kind::codec(fi.kind).decode)(reader)?;
            list_mut(fi, record).push(value);
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn merge_message_field(
    fi: &FieldInfo,
    reader: &mut Reader<'_>,
    record: &mut dyn Any,
    registry: &Registry,
    depth: usize,
    wire_type: WireType,
    start: usize,
    info: &MessageInfo,
) -> Result<(), Error> {
    let expected = match fi.kind {
        Kind::Group => WireType::StartGroup,
        _ => WireType::LengthDelimited,
    };
    if wire_type != expected {
        return capture_unknown(info, reader, record, fi.number, wire_type, start, depth);
    }
    check_depth(depth)?;
    match &fi.accessor.message_mut {
        Some(message_mut) => {
            // Existing submessage merges in place; absent storage allocates.
            let target = message_mut(record);
            match fi.kind {
                Kind::Group => merge_record(target, reader, registry, depth - 1, Some(fi.number))?,
                _ => {
                    let len = reader.read_varuint32()? as usize;
                    let bytes = reader.read_bytes(len)?;
                    let mut sub = Reader::new(bytes);
                    merge_record(target, &mut sub, registry, depth - 1, None)?;
                }
            }
        }
        None => {
            // Oneof message member: decode a fresh instance, then activate
            // the member with it.
            let mut fresh = new_linked(fi);
            match fi.kind {
                Kind::Group => merge_record(&mut *fresh, reader, registry, depth - 1, Some(fi.number))?,
                _ => {
                    let len = reader.read_varuint32()? as usize;
                    let bytes = reader.read_bytes(len)?;
                    let mut sub = Reader::new(bytes);
                    merge_record(&mut *fresh, &mut sub, registry, depth - 1, None)?;
                }
            }
            (fi.accessor.set)(record, Value::Message(fresh));
        }
    }
    Ok(())
}

fn merge_map_entry(
    fi: &FieldInfo,
    reader: &mut Reader<'_>,
    record: &mut dyn Any,
    registry: &Registry,
    depth: usize,
) -> Result<(), Error> {
    let meta = fi.map.expect("map merge on a non-map field");
    let len = reader.read_varuint32()? as usize;
    let bytes = reader.read_bytes(len)?;
    let mut entry = Reader::new(bytes);
    let mut key: Option<Value> = None;
    let mut value: Option<Value> = None;
    while !entry.is_empty() {
        let tag = entry.read_varuint32()?;
        let wire_type = tag_wire_type(tag)?;
        match tag_field_number(tag) {
            1 if wire_type == meta.key_kind.wire_type() => {
                key = Some((kind::codec(meta.key_kind).decode)(&mut entry)?);
            }
            2 if meta.value_kind.is_message() => {
                ensure!(
                    wire_type == WireType::LengthDelimited,
                    Error::invalid_data("map value submessage with non-delimited wire type")
                );
                check_depth(depth)?;
                let vlen = entry.read_varuint32()? as usize;
                let vbytes = entry.read_bytes(vlen)?;
                let mut sub = Reader::new(vbytes);
                let link = meta
                    .value_message
                    .expect("message-valued map without a value link");
                let mut element = (link.new)();
                merge_record(&mut *element, &mut sub, registry, depth - 1, None)?;
                value = Some(Value::Message(element));
            }
            2 if wire_type == meta.value_kind.wire_type() => {
                value = Some((kind::codec(meta.value_kind).decode)(&mut entry)?);
            }
            n => skip_payload(&mut entry, wire_type, n, depth)?,
        }
    }
    // Missing key or value decodes as the kind's zero.
    let key = key
        .map(MapKey::from_value)
        .unwrap_or_else(|| MapKey::zero_of(meta.key_kind));
    let value = value.unwrap_or_else(|| match meta.value_message {
        Some(link) => Value::Message((link.new)()),
        None => Value::zero_of(meta.value_kind),
    });
    let map_mut = fi
        .accessor
        .map_mut
        .as_ref()
        .expect("map field without map storage");
    map_mut(record).insert(key, value);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn merge_unmatched(
    info: &MessageInfo,
    reader: &mut Reader<'_>,
    record: &mut dyn Any,
    registry: &Registry,
    number: u32,
    wire_type: WireType,
    start: usize,
    depth: usize,
) -> Result<(), Error> {
    skip_payload(reader, wire_type, number, depth)?;
    let raw = reader.slice(start, reader.pos());
    if info.descriptor().in_extension_range(number) {
        if let Some(ext_mut) = &info.layout.ext_mut {
            if let Some(desc) = registry.find_extension(info.descriptor().full_name, number) {
                ext_mut(record).merge_lazy(desc, raw);
                return Ok(());
            }
        }
    }
    if let Some(unknown_mut) = &info.layout.unknown_mut {
        unknown_mut(record).extend_from_slice(raw);
    }
    Ok(())
}

fn capture_unknown(
    info: &MessageInfo,
    reader: &mut Reader<'_>,
    record: &mut dyn Any,
    number: u32,
    wire_type: WireType,
    start: usize,
    depth: usize,
) -> Result<(), Error> {
    skip_payload(reader, wire_type, number, depth)?;
    let raw = reader.slice(start, reader.pos());
    if let Some(unknown_mut) = &info.layout.unknown_mut {
        unknown_mut(record).extend_from_slice(raw);
    }
    Ok(())
}

fn skip_payload(
    reader: &mut Reader<'_>,
    wire_type: WireType,
    number: u32,
    depth: usize,
) -> Result<(), Error> {
    match wire_type {
        WireType::Varint => {
            reader.read_varuint64()?;
        }
        WireType::Fixed64 => reader.skip(8)?,
        WireType::Fixed32 => reader.skip(4)?,
        WireType::LengthDelimited => {
            let len = reader.read_varuint32()? as usize;
            reader.skip(len)?;
        }
        WireType::StartGroup => {
            check_depth(depth)?;
            loop {
                let tag = reader.read_varuint32()?;
                ensure!(tag >> 3 != 0, Error::invalid_data("field number 0 in tag"));
                let n = tag_field_number(tag);
                let w = tag_wire_type(tag)?;
                if w == WireType::EndGroup {
                    ensure!(
                        n == number,
                        Error::invalid_data(format!("mismatched end-group tag for field {n}"))
                    );
                    break;
                }
                skip_payload(reader, w, n, depth - 1)?;
            }
        }
        WireType::EndGroup => {
            return Err(Error::invalid_data(format!(
                "stray end-group tag for field {number}"
            )))
        }
    }
    Ok(())
}

fn check_depth(depth: usize) -> Result<(), Error> {
    ensure!(
        depth > 0,
        Error::depth_exceed(format!("message nesting exceeds {MAX_DEPTH} levels"))
    );
    Ok(())
}

fn list_mut<'a>(fi: &FieldInfo, record: &'a mut dyn Any) -> &'a mut dyn crate::storage::ListView {
    let list_mut = fi
        .accessor
        .list_mut
        .as_ref()
        .expect("repeated field without list storage");
    list_mut(record)
}

fn new_linked(fi: &FieldInfo) -> Box<dyn Record> {
    let link = fi
        .message
        .expect("message-kind field without a message link");
    (link.new)()
}

/// Decodes the raw tag-prefixed occurrences of one extension field into an
/// owned value. Backs the lazy extension thunk; nested extensions inside a
/// message-valued extension resolve against the global registry.
pub(crate) fn decode_extension(
    desc: &'static ExtensionDescriptor,
    bytes: &[u8],
) -> Result<Value, Error> {
    let registry = Registry::global();
    let mut reader = Reader::new(bytes);
    let mut list: Vec<Value> = Vec::new();
    let mut singular: Option<Value> = None;
    let mut message: Option<Box<dyn Record>> = None;
    while !reader.is_empty() {
        let tag = reader.read_varuint32()?;
        let number = tag_field_number(tag);
        ensure!(
            number == desc.number,
            Error::invalid_data(format!(
                "extension bytes for field {} carry tag {}",
                desc.number, number
            ))
        );
        let wire_type = tag_wire_type(tag)?;
        if desc.kind.is_message() {
            let link = desc
                .message
                .expect("message-kind extension without a message link");
            if desc.is_repeated() {
                let mut element = (link.new)();
                decode_ext_message(desc, &mut reader, &mut element, registry, wire_type)?;
                list.push(Value::Message(element));
            } else {
                let target = message.get_or_insert_with(|| (link.new)());
                decode_ext_message(desc, &mut reader, target, registry, wire_type)?;
            }
            continue;
        }
        if desc.is_repeated() && desc.kind.is_packable() && wire_type == WireType::LengthDelimited {
            let len = reader.read_varuint32()? as usize;
            let mut packed = Reader::new(reader.read_bytes(len)?);
            let codec = kind::codec(desc.kind);
            while !packed.is_empty() {
                list.push((codec.decode)(&mut packed)?);
            }
            continue;
        }
        ensure!(
            wire_type == desc.kind.wire_type(),
            Error::invalid_data(format!(
                "extension {} has unexpected wire type {wire_type:?}",
                desc.name
            ))
        );
        let value = (kind::codec(desc.kind).decode)(&mut reader)?;
        if desc.is_repeated() {
            list.push(value);
        } else {
            singular = Some(value);
        }
    }
    if desc.is_repeated() {
        Ok(Value::List(list))
    } else if let Some(m) = message {
        Ok(Value::Message(m))
    } else {
        singular.ok_or_else(|| Error::invalid_data("empty extension byte run"))
    }
}

fn decode_ext_message(
    desc: &ExtensionDescriptor,
    reader: &mut Reader<'_>,
    target: &mut Box<dyn Record>,
    registry: &Registry,
    wire_type: WireType,
) -> Result<(), Error> {
    match desc.kind {
        Kind::Group => {
            ensure!(
                wire_type == WireType::StartGroup,
                Error::invalid_data("group extension with non-group wire type")
            );
            merge_record(&mut **target, reader, registry, MAX_DEPTH, Some(desc.number))
        }
        _ => {
            ensure!(
                wire_type == WireType::LengthDelimited,
                Error::invalid_data("message extension with non-delimited wire type")
            );
            let len = reader.read_varuint32()? as usize;
            let bytes = reader.read_bytes(len)?;
            let mut sub = Reader::new(bytes);
            merge_record(&mut **target, &mut sub, registry, MAX_DEPTH, None)
        }
    }
}
