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

//! The reflective facade: uniform field access over any record.
//!
//! [`MessageRef`] / [`MessageMut`] are transient pairings of one live
//! record with its type's `MessageInfo`; they hold no other state and are
//! constructed per call site. Field numbers dispatch to the field table
//! first, then to the extension store when the number falls inside a
//! declared extension range, and fail with [`Error::UnknownField`]
//! otherwise.

use crate::buffer::{Reader, Writer};
use crate::coder::EncodeOptions;
use crate::error::Error;
use crate::message_info::{FieldInfo, MessageInfo};
use crate::record::{Record, StructRecord};
use crate::registry::Registry;
use crate::types::Cardinality;
use crate::value::{Value, ValueRef};

/// Read-only reflective view of one record.
pub struct MessageRef<'a> {
    record: &'a dyn Record,
    info: &'static MessageInfo,
    registry: &'a Registry,
}

impl<'a> MessageRef<'a> {
    pub fn new(record: &'a dyn Record) -> MessageRef<'a> {
        MessageRef::with_registry(record, Registry::global())
    }

    pub fn with_registry(record: &'a dyn Record, registry: &'a Registry) -> MessageRef<'a> {
        MessageRef {
            record,
            info: record.layout_dyn().message_info(),
            registry,
        }
    }

    pub fn descriptor(&self) -> &crate::descriptor::MessageDescriptor {
        self.info.descriptor()
    }

    /// Whether the field is populated under its presence discipline.
    pub fn has(&self, number: u32) -> Result<bool, Error> {
        if let Some(fi) = self.info.field(number) {
            return Ok((fi.accessor.has)(self.record.as_any()));
        }
        let ext = self.extension(number)?;
        Ok(ext
            .map(|desc| {
                self.info
                    .layout
                    .ext_get
                    .as_ref()
                    .map(|get| get(self.record.as_any()).has(desc.number))
                    .unwrap_or(false)
            })
            .unwrap_or(false))
    }

    /// The field's value, or its default when absent. Absent singular
    /// message fields yield a fresh default instance.
    pub fn get(&self, number: u32) -> Result<Value, Error> {
        if let Some(fi) = self.info.field(number) {
            return Ok(match (fi.accessor.get)(self.record.as_any()) {
                Some(v) => v.to_owned_value(),
                None => default_of(fi),
            });
        }
        match self.extension(number)? {
            Some(desc) => {
                let store = self
                    .info
                    .layout
                    .ext_get
                    .as_ref()
                    .ok_or_else(|| Error::unknown_field(number))?;
                Ok(store(self.record.as_any()).value_or_default(desc))
            }
            None => Err(Error::unknown_field(number)),
        }
    }

    /// Active member number of the named oneof, or `None` when the union
    /// is empty or the name is not a oneof of this type.
    pub fn which_oneof(&self, name: &str) -> Option<u32> {
        let index = self
            .descriptor()
            .oneofs
            .iter()
            .position(|o| o.name == name)?;
        self.info.which(index, self.record.as_any())
    }

    /// Visits populated fields in ascending number order, then populated
    /// extensions in ascending number order. The visitor returns `false`
    /// to stop early.
    pub fn range<F>(&self, mut visitor: F)
    where
        F: FnMut(u32, ValueRef<'_>) -> bool,
    {
        let any = self.record.as_any();
        for fi in self.info.fields() {
            if let Some(v) = (fi.accessor.get)(any) {
                if !visitor(fi.number, v) {
                    return;
                }
            }
        }
        if let Some(store) = &self.info.layout.ext_get {
            for entry in store(any).iter() {
                if !visitor(entry.descriptor().number, entry.value().as_value_ref()) {
                    return;
                }
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.info.check_initialized(self.record).is_ok()
    }

    /// Resolves a number that is not an ordinary field: `Ok(Some(desc))`
    /// for a registered extension in range, `Ok(None)` for an in-range
    /// number with no registration, `Err` outside every range.
    fn extension(&self, number: u32) -> Result<Option<&'static crate::descriptor::ExtensionDescriptor>, Error> {
        if !self.descriptor().in_extension_range(number) {
            return Err(Error::unknown_field(number));
        }
        Ok(self
            .registry
            .find_extension(self.descriptor().full_name, number))
    }
}

/// Mutable reflective view of one record.
pub struct MessageMut<'a> {
    record: &'a mut dyn Record,
    info: &'static MessageInfo,
    registry: &'a Registry,
}

impl<'a> MessageMut<'a> {
    pub fn new(record: &'a mut dyn Record) -> MessageMut<'a> {
        MessageMut::with_registry(record, Registry::global())
    }

    pub fn with_registry(record: &'a mut dyn Record, registry: &'a Registry) -> MessageMut<'a> {
        MessageMut {
            info: record.layout_dyn().message_info(),
            record,
            registry,
        }
    }

    pub fn as_ref(&self) -> MessageRef<'_> {
        MessageRef::with_registry(self.record, self.registry)
    }

    /// Sets the field to `value`. Values of the wrong shape for the field
    /// are a programming error and panic.
    pub fn set(&mut self, number: u32, value: Value) -> Result<(), Error> {
        if let Some(fi) = self.info.field(number) {
            (fi.accessor.set)(self.record.as_any_mut(), value);
            self.invalidate_size();
            return Ok(());
        }
        let desc = self.required_extension(number)?;
        let store = self
            .info
            .layout
            .ext_mut
            .as_ref()
            .ok_or_else(|| Error::unknown_field(number))?;
        store(self.record.as_any_mut()).set(desc, value);
        self.invalidate_size();
        Ok(())
    }

    pub fn clear(&mut self, number: u32) -> Result<(), Error> {
        if let Some(fi) = self.info.field(number) {
            (fi.accessor.clear)(self.record.as_any_mut());
            self.invalidate_size();
            return Ok(());
        }
        if !self.info.descriptor().in_extension_range(number) {
            return Err(Error::unknown_field(number));
        }
        if let Some(store) = &self.info.layout.ext_mut {
            store(self.record.as_any_mut()).clear(number);
        }
        self.invalidate_size();
        Ok(())
    }

    fn required_extension(
        &self,
        number: u32,
    ) -> Result<&'static crate::descriptor::ExtensionDescriptor, Error> {
        if !self.info.descriptor().in_extension_range(number) {
            return Err(Error::unknown_field(number));
        }
        self.registry
            .find_extension(self.info.descriptor().full_name, number)
            .ok_or_else(|| Error::unknown_field(number))
    }

    fn invalidate_size(&mut self) {
        if let Some(cache) = &self.info.layout.size_cache {
            cache(self.record.as_any()).invalidate();
        }
    }
}

fn default_of(fi: &FieldInfo) -> Value {
    if fi.map.is_some() {
        return Value::Map(Vec::new());
    }
    if fi.cardinality == Cardinality::Repeated {
        return Value::List(Vec::new());
    }
    if fi.kind.is_message() {
        let link = fi.message.expect("message-kind field without a message link");
        return Value::Message((link.new)());
    }
    // Proto2 custom default, else the kind's zero.
    match fi.default {
        Some(default) => default.to_value(),
        None => Value::zero_of(fi.kind),
    }
}

/// Marshals a record with default options.
pub fn marshal(record: &dyn Record) -> Result<Vec<u8>, Error> {
    marshal_with(record, &EncodeOptions::default())
}

pub fn marshal_with(record: &dyn Record, options: &EncodeOptions) -> Result<Vec<u8>, Error> {
    let info = record.layout_dyn().message_info();
    let mut writer = Writer::default();
    writer.reserve(info.size(record, options));
    info.marshal_append(&mut writer, record, options)?;
    Ok(writer.into_vec())
}

/// Decodes a fresh record from `bytes`, resolving extensions against the
/// global registry.
pub fn unmarshal<M: StructRecord>(bytes: &[u8]) -> Result<M, Error> {
    unmarshal_with::<M>(bytes, Registry::global())
}

pub fn unmarshal_with<M: StructRecord>(bytes: &[u8], registry: &Registry) -> Result<M, Error> {
    let mut record = M::default();
    merge(&mut record, bytes, registry)?;
    Ok(record)
}

/// Merges a wire image into an existing record.
pub fn merge(record: &mut dyn Record, bytes: &[u8], registry: &Registry) -> Result<(), Error> {
    let info = record.layout_dyn().message_info();
    let mut reader = Reader::new(bytes);
    info.merge_from(&mut reader, record, registry)
}
