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

//! Message, field and extension descriptors.
//!
//! Descriptors are the runtime's *input*: the record type supplies them
//! alongside its storage projections, and the introspector cross-checks the
//! two. Submessage references go through [`MessageLink`] function pointers
//! rather than direct references, so mutually recursive message graphs
//! (A contains B contains A) can be declared without initialization-order
//! cycles.

use crate::layout::RecordLayout;
use crate::record::{Record, StructRecord};
use crate::types::{Cardinality, Kind, Syntax};
use crate::value::DefaultValue;

/// Deferred link to another record type's layout plus a way to construct a
/// fresh instance of it.
#[derive(Clone, Copy)]
pub struct MessageLink {
    pub layout: fn() -> &'static RecordLayout,
    pub new: fn() -> Box<dyn Record>,
}

impl MessageLink {
    pub fn of<M: StructRecord>() -> MessageLink {
        MessageLink {
            layout: M::layout,
            new: new_boxed::<M>,
        }
    }
}

fn new_boxed<M: StructRecord>() -> Box<dyn Record> {
    Box::new(M::default())
}

impl std::fmt::Debug for MessageLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MessageLink")
    }
}

/// Map-entry metadata: a map field is wire-identical to a repeated
/// synthetic submessage with key = 1 and value = 2.
#[derive(Clone, Copy, Debug)]
pub struct MapMeta {
    pub key_kind: Kind,
    pub value_kind: Kind,
    pub value_message: Option<MessageLink>,
}

/// One declared field.
#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    pub number: u32,
    pub name: &'static str,
    pub kind: Kind,
    pub cardinality: Cardinality,
    /// Resolved packing decision (explicit option or syntax default).
    pub packed: bool,
    /// Index into the message's oneof list, if any.
    pub oneof_index: Option<usize>,
    pub default: Option<DefaultValue>,
    pub message: Option<MessageLink>,
    pub map: Option<MapMeta>,
}

impl FieldDescriptor {
    /// Plain scalar field with syntax-default packing and no default.
    pub fn scalar(number: u32, name: &'static str, kind: Kind, cardinality: Cardinality) -> Self {
        FieldDescriptor {
            number,
            name,
            kind,
            cardinality,
            packed: false,
            oneof_index: None,
            default: None,
            message: None,
            map: None,
        }
    }

    pub fn message(
        number: u32,
        name: &'static str,
        cardinality: Cardinality,
        link: MessageLink,
    ) -> Self {
        FieldDescriptor {
            number,
            name,
            kind: Kind::Message,
            cardinality,
            packed: false,
            oneof_index: None,
            default: None,
            message: Some(link),
            map: None,
        }
    }

    pub fn group(
        number: u32,
        name: &'static str,
        cardinality: Cardinality,
        link: MessageLink,
    ) -> Self {
        FieldDescriptor {
            kind: Kind::Group,
            ..FieldDescriptor::message(number, name, cardinality, link)
        }
    }

    pub fn map(number: u32, name: &'static str, meta: MapMeta) -> Self {
        FieldDescriptor {
            number,
            name,
            kind: Kind::Message,
            cardinality: Cardinality::Repeated,
            packed: false,
            oneof_index: None,
            default: None,
            message: None,
            map: Some(meta),
        }
    }

    pub fn packed(mut self, packed: bool) -> Self {
        self.packed = packed;
        self
    }

    pub fn in_oneof(mut self, index: usize) -> Self {
        self.oneof_index = Some(index);
        self
    }

    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn is_map(&self) -> bool {
        self.map.is_some()
    }

    pub fn is_list(&self) -> bool {
        self.cardinality == Cardinality::Repeated && self.map.is_none()
    }

    pub fn is_required(&self) -> bool {
        self.cardinality == Cardinality::Required
    }
}

/// One declared oneof union.
#[derive(Clone, Debug)]
pub struct OneofDescriptor {
    pub name: &'static str,
    /// Member field numbers in declaration order; the first member's coder
    /// is the union's single encode entry point.
    pub fields: Vec<u32>,
}

/// Per-message descriptor: the unit the Descriptor Provider hands us.
#[derive(Debug)]
pub struct MessageDescriptor {
    pub full_name: &'static str,
    pub syntax: Syntax,
    pub fields: Vec<FieldDescriptor>,
    pub oneofs: Vec<OneofDescriptor>,
    /// Inclusive number ranges reserved for extensions.
    pub extension_ranges: Vec<(u32, u32)>,
}

impl MessageDescriptor {
    pub fn new(full_name: &'static str, syntax: Syntax) -> Self {
        MessageDescriptor {
            full_name,
            syntax,
            fields: Vec::new(),
            oneofs: Vec::new(),
            extension_ranges: Vec::new(),
        }
    }

    pub fn field(mut self, fd: FieldDescriptor) -> Self {
        self.fields.push(fd);
        self
    }

    pub fn oneof(mut self, name: &'static str, fields: Vec<u32>) -> Self {
        self.oneofs.push(OneofDescriptor { name, fields });
        self
    }

    pub fn extension_range(mut self, start: u32, end: u32) -> Self {
        self.extension_ranges.push((start, end));
        self
    }

    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|fd| fd.number == number)
    }

    pub fn in_extension_range(&self, number: u32) -> bool {
        self.extension_ranges
            .iter()
            .any(|&(lo, hi)| number >= lo && number <= hi)
    }
}

/// A field declared outside the message's own schema but addressable within
/// one of its extension ranges. Declared as `static` items by extension
/// authors and registered with a [`Registry`](crate::registry::Registry).
#[derive(Debug)]
pub struct ExtensionDescriptor {
    /// Full name of the extended message.
    pub extendee: &'static str,
    pub name: &'static str,
    pub number: u32,
    pub kind: Kind,
    pub cardinality: Cardinality,
    pub packed: bool,
    pub default: Option<DefaultValue>,
    pub message: Option<MessageLink>,
}

impl ExtensionDescriptor {
    pub fn is_repeated(&self) -> bool {
        self.cardinality == Cardinality::Repeated
    }
}
