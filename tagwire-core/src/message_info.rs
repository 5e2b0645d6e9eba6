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

//! Per-type field-coder tables and the marshal/size/init-check operations
//! over them.
//!
//! One [`MessageInfo`] exists per concrete record type, built exactly once
//! inside the layout's `OnceLock` on first use and immutable after. Every
//! operation is then a flat walk over the number-sorted [`FieldInfo`]
//! table: no classification happens at marshal time.

use std::any::Any;

use crate::buffer::{Reader, Writer};
use crate::coder::field::{self, FieldCoder};
use crate::coder::kind::{self, KindCodec};
use crate::coder::{decode, EncodeOptions, EncodeState};
use crate::descriptor::{FieldDescriptor, MapMeta, MessageDescriptor, MessageLink};
use crate::error::Error;
use crate::layout::RecordLayout;
use crate::record::Record;
use crate::registry::Registry;
use crate::storage::AccessorSet;
use crate::types::{make_tag, tag_size, Cardinality, Kind, Syntax, WireType, MAX_DEPTH};
use crate::value::ValueRef;

/// One field's fully resolved dispatch entry.
pub struct FieldInfo {
    pub number: u32,
    pub name: &'static str,
    pub kind: Kind,
    pub cardinality: Cardinality,
    pub syntax: Syntax,
    pub packed: bool,
    pub oneof_index: Option<usize>,
    /// Precomputed wire tag and its varint width, never recomputed per
    /// marshal call.
    pub tag: u32,
    pub tag_size: usize,
    pub required: bool,
    /// Proto2 custom default, surfaced by reflective `get` on absence.
    pub default: Option<crate::value::DefaultValue>,
    pub message: Option<MessageLink>,
    pub map: Option<MapMeta>,
    pub accessor: &'static AccessorSet,
    pub coder: &'static FieldCoder,
    /// Value codec for scalar kinds; `None` for message and group kinds,
    /// whose bodies recurse instead.
    pub codec: Option<&'static KindCodec>,
}

/// The per-type coder table plus the operations over it.
pub struct MessageInfo {
    pub(crate) layout: &'static RecordLayout,
    /// Sorted ascending by field number.
    fields: Vec<FieldInfo>,
}

impl MessageInfo {
    pub(crate) fn build(layout: &'static RecordLayout) -> MessageInfo {
        let descriptor = &layout.descriptor;
        let mut fields: Vec<FieldInfo> = descriptor
            .fields
            .iter()
            .map(|fd| build_field(layout, descriptor, fd))
            .collect();
        fields.sort_by_key(|fi| fi.number);
        MessageInfo { layout, fields }
    }

    pub fn descriptor(&self) -> &MessageDescriptor {
        &self.layout.descriptor
    }

    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    pub(crate) fn field(&self, number: u32) -> Option<&FieldInfo> {
        self.fields
            .binary_search_by_key(&number, |fi| fi.number)
            .ok()
            .map(|i| &self.fields[i])
    }

    /// Active member number of the oneof at `index`, or `None`.
    pub(crate) fn which(&self, index: usize, record: &dyn Any) -> Option<u32> {
        self.layout
            .whiches
            .iter()
            .find(|(i, _)| *i == index)
            .and_then(|(_, f)| f(record))
    }

    /// Encoded byte size of the record: populated fields plus extensions
    /// plus retained unknown bytes.
    pub fn size(&self, record: &dyn Record, options: &EncodeOptions) -> usize {
        let any = record.as_any();
        if options.use_cached_size {
            if let Some(cache) = &self.layout.size_cache {
                if let Some(n) = cache(any).get() {
                    return n;
                }
            }
        }
        let n = self.body_size(any, options);
        if options.use_cached_size {
            if let Some(cache) = &self.layout.size_cache {
                cache(any).store(n);
            }
        }
        n
    }

    pub(crate) fn body_size(&self, any: &dyn Any, options: &EncodeOptions) -> usize {
        let mut total = 0;
        if let Some(ext) = &self.layout.ext_get {
            total += ext(any).wire_size(options);
        }
        for fi in &self.fields {
            total += (fi.coder.size)(self, fi, any, options);
        }
        if let Some(unknown) = &self.layout.unknown_get {
            total += unknown(any).len();
        }
        total
    }

    /// Appends the record's wire image: extensions sorted ascending first,
    /// then ordinary and oneof fields ascending, then retained unknown
    /// bytes verbatim.
    ///
    /// UTF-8 validation failures are advisory: every byte is written
    /// regardless and the first such failure is returned at the end.
    pub fn marshal_append(
        &self,
        writer: &mut Writer,
        record: &dyn Record,
        options: &EncodeOptions,
    ) -> Result<(), Error> {
        let mut state = EncodeState::new(options);
        self.encode_body(writer, record.as_any(), &mut state);
        state.finish()
    }

    pub(crate) fn encode_body(
        &self,
        writer: &mut Writer,
        any: &dyn Any,
        state: &mut EncodeState<'_>,
    ) {
        if let Some(ext) = &self.layout.ext_get {
            ext(any).encode(writer, state);
        }
        for fi in &self.fields {
            (fi.coder.encode)(self, fi, any, writer, state);
        }
        if let Some(unknown) = &self.layout.unknown_get {
            writer.write_bytes(unknown(any));
        }
    }

    /// Merges one wire image into the record: singular overwrite, repeated
    /// append, nested messages merged recursively. Extension-range fields
    /// with a descriptor registered in `registry` land in the extension
    /// store as lazy bytes.
    pub fn merge_from(
        &self,
        reader: &mut Reader<'_>,
        record: &mut dyn Record,
        registry: &Registry,
    ) -> Result<(), Error> {
        decode::merge_fields(self, reader, record.as_any_mut(), registry, MAX_DEPTH, None)
    }

    /// Verifies every proto2 required field is set, transitively.
    ///
    /// Types whose transitive graph declares no required fields and no
    /// extension ranges short-circuit without touching the record.
    pub fn check_initialized(&self, record: &dyn Record) -> Result<(), Error> {
        if !self.layout.needs_init_check() {
            return Ok(());
        }
        let any = record.as_any();
        for fi in &self.fields {
            if fi.required && !(fi.accessor.has)(any) {
                return Err(Error::required_not_set(format!(
                    "{}.{}",
                    self.descriptor().full_name,
                    fi.name
                )));
            }
        }
        for fi in &self.fields {
            if let Some(link) = fi.message {
                if !(link.layout)().needs_init_check() {
                    continue;
                }
                if fi.cardinality == Cardinality::Repeated {
                    let list = fi
                        .accessor
                        .list
                        .as_ref()
                        .expect("repeated field without list storage");
                    let list = list(any);
                    for i in 0..list.len() {
                        check_message_value(list.get(i))?;
                    }
                } else if let Some(v) = (fi.accessor.get)(any) {
                    check_message_value(v)?;
                }
            }
            if let Some(meta) = fi.map {
                if let Some(link) = meta.value_message {
                    if !(link.layout)().needs_init_check() {
                        continue;
                    }
                    let map = fi
                        .accessor
                        .map
                        .as_ref()
                        .expect("map field without map storage");
                    for (_, v) in map(any).iter() {
                        check_message_value(v)?;
                    }
                }
            }
        }
        if let Some(ext) = &self.layout.ext_get {
            ext(any).check_initialized()?;
        }
        Ok(())
    }
}

fn check_message_value(value: ValueRef<'_>) -> Result<(), Error> {
    match value {
        ValueRef::Message(m) => m.layout_dyn().message_info().check_initialized(m),
        other => panic!("type mismatch: expected Message, got {other:?}"),
    }
}

/// Wire-bytes equality for the owned value plane: same concrete type and
/// identical deterministic encodings.
pub fn eq_by_wire(a: &dyn Record, b: &dyn Record) -> bool {
    let la = a.layout_dyn();
    let lb = b.layout_dyn();
    if !std::ptr::eq(la, lb) {
        return false;
    }
    let options = EncodeOptions::deterministic();
    let info = la.message_info();
    let mut wa = Writer::default();
    let mut wb = Writer::default();
    // Advisory errors do not affect the bytes.
    let _ = info.marshal_append(&mut wa, a, &options);
    let _ = info.marshal_append(&mut wb, b, &options);
    wa.as_slice() == wb.as_slice()
}

fn build_field(
    layout: &'static RecordLayout,
    descriptor: &MessageDescriptor,
    fd: &FieldDescriptor,
) -> FieldInfo {
    let accessor = layout
        .accessor(fd.number)
        .unwrap_or_else(|| panic!("field {} has no slot after layout validation", fd.number));
    let packed = fd.packed && fd.kind.is_packable() && fd.cardinality == Cardinality::Repeated;
    let wire_type = if fd.is_map() || packed {
        WireType::LengthDelimited
    } else {
        fd.kind.wire_type()
    };
    let coder: &'static FieldCoder = if let Some(index) = fd.oneof_index {
        let entry = descriptor.oneofs[index].fields[0];
        if fd.number == entry {
            &field::ONEOF_ENTRY
        } else {
            &field::ONEOF_MEMBER
        }
    } else if fd.is_map() {
        &field::MAP
    } else if fd.cardinality == Cardinality::Repeated {
        if packed {
            &field::LIST_PACKED
        } else {
            &field::LIST
        }
    } else if fd.kind == Kind::Group {
        &field::GROUP
    } else if fd.kind.is_message() {
        &field::MESSAGE
    } else {
        match accessor.class {
            crate::storage::StorageClass::ScalarImplicit => &field::SCALAR_ELIDE,
            _ => &field::SCALAR_NULLABLE,
        }
    };
    let codec = if fd.kind.is_message() || fd.is_map() {
        None
    } else {
        Some(kind::codec(fd.kind))
    };
    FieldInfo {
        number: fd.number,
        name: fd.name,
        kind: fd.kind,
        cardinality: fd.cardinality,
        syntax: descriptor.syntax,
        packed,
        oneof_index: fd.oneof_index,
        tag: make_tag(fd.number, wire_type),
        tag_size: tag_size(fd.number, wire_type),
        required: fd.is_required(),
        default: fd.default,
        message: fd.message,
        map: fd.map,
        accessor,
        coder,
        codec,
    }
}
