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

//! Struct layout introspection.
//!
//! [`LayoutBuilder`] pairs a concrete record type's descriptor with its
//! storage projections and validates the two against each other exactly
//! once per type. A descriptor field with no matching storage is a
//! malformed record type and fails construction with a panic; nothing about
//! that is recoverable at runtime.
//!
//! The resulting [`RecordLayout`] owns the erased accessors plus the
//! optional unknown-bytes, extension-store and size-cache slots, and hosts
//! the lazily built [`MessageInfo`] for the type.

use std::any::Any;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::descriptor::MessageDescriptor;
use crate::extension::ExtensionStore;
use crate::message_info::MessageInfo;
use crate::record::{Record, SizeCache, StructRecord};
use crate::storage::{
    self, AccessorSet, ElemStorage, MapKeyStorage, OneofBinding, ScalarStorage, StorageClass,
    WhichFn,
};
use crate::types::{Cardinality, Syntax};

pub type BytesRefFn = Box<dyn for<'a> Fn(&'a dyn Any) -> &'a Vec<u8> + Send + Sync>;
pub type BytesMutFn = Box<dyn for<'a> Fn(&'a mut dyn Any) -> &'a mut Vec<u8> + Send + Sync>;
pub type ExtRefFn = Box<dyn for<'a> Fn(&'a dyn Any) -> &'a ExtensionStore + Send + Sync>;
pub type ExtMutFn = Box<dyn for<'a> Fn(&'a mut dyn Any) -> &'a mut ExtensionStore + Send + Sync>;
pub type SizeCacheFn = Box<dyn for<'a> Fn(&'a dyn Any) -> &'a SizeCache + Send + Sync>;

/// The introspected layout of one concrete record type.
///
/// Built once per type inside a `OnceLock`-backed static and shared
/// (read-only) by every instance of that type forever after.
pub struct RecordLayout {
    pub(crate) descriptor: MessageDescriptor,
    /// Erased accessors in descriptor declaration order, oneof members
    /// included.
    pub(crate) slots: Vec<(u32, AccessorSet)>,
    /// Erased active-member lookups, indexed by oneof index.
    pub(crate) whiches: Vec<(usize, WhichFn)>,
    pub(crate) unknown_get: Option<BytesRefFn>,
    pub(crate) unknown_mut: Option<BytesMutFn>,
    pub(crate) ext_get: Option<ExtRefFn>,
    pub(crate) ext_mut: Option<ExtMutFn>,
    pub(crate) size_cache: Option<SizeCacheFn>,
    info: OnceLock<MessageInfo>,
    needs_init: OnceLock<bool>,
}

impl RecordLayout {
    pub fn descriptor(&self) -> &MessageDescriptor {
        &self.descriptor
    }

    /// The per-type field-coder table, built on first use.
    ///
    /// Initialization state moves uninitialized → initializing → ready
    /// through the `OnceLock`: concurrent first callers race to a single
    /// build and no caller ever observes a partially built table.
    pub fn message_info(&'static self) -> &'static MessageInfo {
        self.info.get_or_init(|| MessageInfo::build(self))
    }

    pub(crate) fn accessor(&self, number: u32) -> Option<&AccessorSet> {
        self.slots
            .iter()
            .find(|(n, _)| *n == number)
            .map(|(_, a)| a)
    }

    /// Whether `is_initialized` has any work to do for this type: a
    /// required field or an extension range anywhere in the transitive
    /// message graph.
    pub fn needs_init_check(&'static self) -> bool {
        *self
            .needs_init
            .get_or_init(|| compute_needs_init(self, &mut Vec::new()))
    }
}

/// Cycle-tolerant traversal: a node currently on the visiting stack
/// contributes no requirement of its own and defers to the rest of the
/// graph, so A-embeds-B-embeds-A terminates.
fn compute_needs_init(layout: &'static RecordLayout, visiting: &mut Vec<*const RecordLayout>) -> bool {
    if let Some(&cached) = layout.needs_init.get() {
        return cached;
    }
    let key = layout as *const RecordLayout;
    if visiting.contains(&key) {
        return false;
    }
    visiting.push(key);
    let mut needs = !layout.descriptor.extension_ranges.is_empty();
    for fd in &layout.descriptor.fields {
        if needs {
            break;
        }
        if fd.is_required() {
            needs = true;
            break;
        }
        if let Some(link) = fd.message {
            needs |= compute_needs_init((link.layout)(), visiting);
        }
        if let Some(map) = fd.map {
            if let Some(link) = map.value_message {
                needs |= compute_needs_init((link.layout)(), visiting);
            }
        }
    }
    visiting.pop();
    needs
}

/// Builds a [`RecordLayout`] for record type `R`.
pub struct LayoutBuilder<R: StructRecord> {
    descriptor: MessageDescriptor,
    slots: Vec<(u32, AccessorSet)>,
    oneofs: Vec<(usize, OneofBinding<R>)>,
    unknown: Option<(BytesRefFn, BytesMutFn)>,
    extensions: Option<(ExtRefFn, ExtMutFn)>,
    size_cache: Option<SizeCacheFn>,
}

impl<R: StructRecord> LayoutBuilder<R> {
    pub fn new(descriptor: MessageDescriptor) -> Self {
        LayoutBuilder {
            descriptor,
            slots: Vec::new(),
            oneofs: Vec::new(),
            unknown: None,
            extensions: None,
            size_cache: None,
        }
    }

    /// Implicit-presence scalar storage (proto3 non-optional).
    pub fn scalar<T: ScalarStorage>(
        mut self,
        number: u32,
        get: fn(&R) -> &T,
        get_mut: fn(&mut R) -> &mut T,
    ) -> Self {
        self.slots.push((number, storage::erase_scalar(get, get_mut)));
        self
    }

    /// Explicit-presence scalar storage (proto2 or proto3 `optional`).
    pub fn optional<T: ScalarStorage>(
        mut self,
        number: u32,
        get: fn(&R) -> &Option<T>,
        get_mut: fn(&mut R) -> &mut Option<T>,
    ) -> Self {
        self.slots
            .push((number, storage::erase_optional(get, get_mut)));
        self
    }

    pub fn repeated<T: ElemStorage>(
        mut self,
        number: u32,
        get: fn(&R) -> &Vec<T>,
        get_mut: fn(&mut R) -> &mut Vec<T>,
    ) -> Self {
        self.slots
            .push((number, storage::erase_repeated(get, get_mut)));
        self
    }

    pub fn map<K: MapKeyStorage, V: ElemStorage>(
        mut self,
        number: u32,
        get: fn(&R) -> &HashMap<K, V>,
        get_mut: fn(&mut R) -> &mut HashMap<K, V>,
    ) -> Self {
        self.slots.push((number, storage::erase_map(get, get_mut)));
        self
    }

    /// Singular message or group storage.
    pub fn message<M: StructRecord>(
        mut self,
        number: u32,
        get: fn(&R) -> &Option<Box<M>>,
        get_mut: fn(&mut R) -> &mut Option<Box<M>>,
    ) -> Self {
        self.slots
            .push((number, storage::erase_message(get, get_mut)));
        self
    }

    /// Accessors for the oneof at the given descriptor index. Member
    /// fields take their accessors from this binding; they must not also
    /// declare standalone slots.
    pub fn oneof(mut self, index: usize, binding: OneofBinding<R>) -> Self {
        self.oneofs.push((index, binding));
        self
    }

    /// Storage for unparsed unknown-field bytes, re-emitted verbatim at
    /// the end of the wire image.
    pub fn unknown_fields(
        mut self,
        get: fn(&R) -> &Vec<u8>,
        get_mut: fn(&mut R) -> &mut Vec<u8>,
    ) -> Self {
        self.unknown = Some((
            Box::new(move |r| get(cast::<R>(r))),
            Box::new(move |r| get_mut(cast_mut::<R>(r))),
        ));
        self
    }

    pub fn extensions(
        mut self,
        get: fn(&R) -> &ExtensionStore,
        get_mut: fn(&mut R) -> &mut ExtensionStore,
    ) -> Self {
        self.extensions = Some((
            Box::new(move |r| get(cast::<R>(r))),
            Box::new(move |r| get_mut(cast_mut::<R>(r))),
        ));
        self
    }

    pub fn size_cache(mut self, get: fn(&R) -> &SizeCache) -> Self {
        self.size_cache = Some(Box::new(move |r| get(cast::<R>(r))));
        self
    }

    /// Validates storage against the descriptor and produces the layout.
    ///
    /// Panics on malformed record types: a declared field with no backing
    /// storage, storage whose presence discipline contradicts the
    /// descriptor, a oneof member without its union binding, or storage
    /// for an undeclared field number.
    pub fn build(mut self) -> RecordLayout {
        let name = self.descriptor.full_name;

        // Storage for undeclared numbers and duplicate slots are both
        // configuration errors.
        let mut seen = Vec::with_capacity(self.slots.len());
        for (number, _) in &self.slots {
            if seen.contains(number) {
                panic!("{name}: duplicate storage for field {number}");
            }
            seen.push(*number);
            if self.descriptor.field_by_number(*number).is_none() {
                panic!("{name}: storage declared for unknown field {number}");
            }
        }

        let descriptor = &self.descriptor;
        let mut member_slots: Vec<(u32, AccessorSet)> = Vec::new();
        for fd in &descriptor.fields {
            match fd.oneof_index {
                Some(index) => {
                    if self.descriptor.field_by_number(fd.number).is_none() {
                        unreachable!();
                    }
                    if seen.contains(&fd.number) {
                        panic!(
                            "{name}: oneof member {} must not declare standalone storage",
                            fd.number
                        );
                    }
                    let oneof = descriptor.oneofs.get(index).unwrap_or_else(|| {
                        panic!("{name}: field {} names missing oneof {index}", fd.number)
                    });
                    if !oneof.fields.contains(&fd.number) {
                        panic!(
                            "{name}: field {} absent from oneof '{}' member list",
                            fd.number, oneof.name
                        );
                    }
                    let binding = self
                        .oneofs
                        .iter()
                        .find(|(i, _)| *i == index)
                        .map(|(_, b)| *b)
                        .unwrap_or_else(|| {
                            panic!("{name}: no binding for oneof '{}'", oneof.name)
                        });
                    member_slots.push((fd.number, storage::erase_oneof_member(binding, fd.number)));
                }
                None => {
                    let slot = self
                        .slots
                        .iter()
                        .find(|(n, _)| *n == fd.number)
                        .unwrap_or_else(|| {
                            panic!(
                                "{name}: declared field {} ({}) has no backing storage",
                                fd.number, fd.name
                            )
                        });
                    validate_class(name, fd, slot.1.class, descriptor.syntax);
                }
            }
        }

        if descriptor.syntax == Syntax::Proto3
            && descriptor.fields.iter().any(|fd| fd.is_required())
        {
            panic!("{name}: required fields are a proto2 construct");
        }

        let whiches = self
            .oneofs
            .iter()
            .map(|(index, binding)| (*index, storage::erase_which(binding.which)))
            .collect();

        self.slots.extend(member_slots);
        let (unknown_get, unknown_mut) = match self.unknown {
            Some((g, m)) => (Some(g), Some(m)),
            None => (None, None),
        };
        let (ext_get, ext_mut) = match self.extensions {
            Some((g, m)) => (Some(g), Some(m)),
            None => (None, None),
        };

        RecordLayout {
            descriptor: self.descriptor,
            slots: self.slots,
            whiches,
            unknown_get,
            unknown_mut,
            ext_get,
            ext_mut,
            size_cache: self.size_cache,
            info: OnceLock::new(),
            needs_init: OnceLock::new(),
        }
    }
}

fn validate_class(
    name: &str,
    fd: &crate::descriptor::FieldDescriptor,
    class: StorageClass,
    syntax: Syntax,
) {
    let ok = if fd.is_map() {
        class == StorageClass::Map
    } else if fd.is_list() {
        class == StorageClass::Repeated
    } else if fd.kind.is_message() {
        class == StorageClass::Message
    } else {
        match fd.cardinality {
            Cardinality::Required => class == StorageClass::ScalarExplicit,
            _ => match syntax {
                // Proto2 singular scalars are nullable: zero must remain
                // distinguishable from absent.
                Syntax::Proto2 => class == StorageClass::ScalarExplicit,
                Syntax::Proto3 => {
                    class == StorageClass::ScalarImplicit || class == StorageClass::ScalarExplicit
                }
            },
        }
    };
    if !ok {
        panic!(
            "{name}: field {} ({}) storage class {:?} contradicts its descriptor",
            fd.number, fd.name, class
        );
    }
}

#[inline(always)]
fn cast<R: Record>(record: &dyn Any) -> &R {
    record
        .downcast_ref::<R>()
        .expect("layout slot applied to a mismatched record type")
}

#[inline(always)]
fn cast_mut<R: Record>(record: &mut dyn Any) -> &mut R {
    record
        .downcast_mut::<R>()
        .expect("layout slot applied to a mismatched record type")
}
