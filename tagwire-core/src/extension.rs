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

//! Per-record extension storage.
//!
//! Entries are keyed by field number in a `BTreeMap`, so the ascending
//! iteration the deterministic marshal order needs comes for free. A value
//! is either eager (typed, set by the caller) or lazy (raw wire bytes
//! captured during decode, converted on first read through a `OnceLock`).
//! The store follows single-writer discipline like any `&mut` structure;
//! lazy forcing is the one concurrent-safe operation, because multiple
//! readers may race to the same thunk. The `OnceLock` makes the observable
//! value exactly-once.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::buffer::{varuint64_size, Writer};
use crate::coder::field::{payload_encode, payload_size};
use crate::coder::{decode, kind, EncodeOptions, EncodeState};
use crate::descriptor::ExtensionDescriptor;
use crate::error::Error;
use crate::registry::Registry;
use crate::value::Value;

enum ExtValue {
    Eager(Value),
    Lazy(LazyValue),
}

/// Raw tag-prefixed wire occurrences plus the decode-once cell.
struct LazyValue {
    bytes: Vec<u8>,
    cell: OnceLock<Value>,
}

impl LazyValue {
    fn force(&self, desc: &'static ExtensionDescriptor) -> &Value {
        self.cell.get_or_init(|| {
            decode::decode_extension(desc, &self.bytes).unwrap_or_else(|_| default_value(desc))
        })
    }
}

/// One stored extension field.
pub struct ExtensionEntry {
    desc: &'static ExtensionDescriptor,
    value: ExtValue,
}

impl ExtensionEntry {
    pub fn descriptor(&self) -> &'static ExtensionDescriptor {
        self.desc
    }

    /// The typed value, decoding lazy bytes on first call.
    pub fn value(&self) -> &Value {
        match &self.value {
            ExtValue::Eager(v) => v,
            ExtValue::Lazy(lazy) => lazy.force(self.desc),
        }
    }

    fn is_unforced_lazy(&self) -> bool {
        matches!(&self.value, ExtValue::Lazy(lazy) if lazy.cell.get().is_none())
    }
}

/// The default a missing or undecodable extension reads as: the declared
/// default, the kind's zero, an empty concrete list, or a fresh default
/// message instance.
pub(crate) fn default_value(desc: &ExtensionDescriptor) -> Value {
    if desc.is_repeated() {
        return Value::List(Vec::new());
    }
    if let Some(default) = desc.default {
        return default.to_value();
    }
    match desc.message {
        Some(link) => Value::Message((link.new)()),
        None => Value::zero_of(desc.kind),
    }
}

/// Field-number-keyed store of extension entries, embedded in record types
/// that declare extension ranges.
#[derive(Default)]
pub struct ExtensionStore {
    entries: BTreeMap<u32, ExtensionEntry>,
}

impl ExtensionStore {
    pub fn new() -> ExtensionStore {
        ExtensionStore::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has(&self, number: u32) -> bool {
        self.entries.contains_key(&number)
    }

    /// The entry's value, forcing a lazy one. Absent entries return `None`;
    /// callers wanting default semantics go through
    /// [`ExtensionStore::value_or_default`].
    pub fn get(&self, number: u32) -> Option<&Value> {
        self.entries.get(&number).map(|e| e.value())
    }

    /// The stored value or the descriptor's default, cloned to owned form.
    pub fn value_or_default(&self, desc: &'static ExtensionDescriptor) -> Value {
        match self.get(desc.number) {
            Some(v) => v.clone(),
            None => default_value(desc),
        }
    }

    pub fn set(&mut self, desc: &'static ExtensionDescriptor, value: Value) {
        self.entries.insert(
            desc.number,
            ExtensionEntry {
                desc,
                value: ExtValue::Eager(value),
            },
        );
    }

    /// Stores undecoded wire bytes, replacing any current value.
    pub fn set_lazy(&mut self, desc: &'static ExtensionDescriptor, bytes: Vec<u8>) {
        self.entries.insert(
            desc.number,
            ExtensionEntry {
                desc,
                value: ExtValue::Lazy(LazyValue {
                    bytes,
                    cell: OnceLock::new(),
                }),
            },
        );
    }

    /// Merge path for decode: raw occurrences accumulate while the entry is
    /// still lazy; once forced or eagerly set, incoming bytes are decoded
    /// and merged by value (repeated appends, singular overwrites).
    pub(crate) fn merge_lazy(&mut self, desc: &'static ExtensionDescriptor, raw: &[u8]) {
        match self.entries.get_mut(&desc.number) {
            None => self.set_lazy(desc, raw.to_vec()),
            Some(entry) => match &mut entry.value {
                ExtValue::Lazy(lazy) if lazy.cell.get().is_none() => {
                    lazy.bytes.extend_from_slice(raw);
                }
                _ => {
                    let incoming = decode::decode_extension(desc, raw)
                        .unwrap_or_else(|_| default_value(desc));
                    let current = entry.value().clone();
                    let merged = match (current, incoming) {
                        (Value::List(mut a), Value::List(b)) => {
                            a.extend(b);
                            Value::List(a)
                        }
                        (_, incoming) => incoming,
                    };
                    entry.value = ExtValue::Eager(merged);
                }
            },
        }
    }

    /// Clears the extension. Repeated extensions truncate to an empty
    /// concrete list so existing handles stay well-defined; singular
    /// extensions drop the entry.
    pub fn clear(&mut self, number: u32) {
        let Some(entry) = self.entries.get_mut(&number) else {
            return;
        };
        if entry.desc.is_repeated() {
            entry.value = ExtValue::Eager(Value::List(Vec::new()));
        } else {
            self.entries.remove(&number);
        }
    }

    /// Entries in ascending field-number order.
    pub fn iter(&self) -> impl Iterator<Item = &ExtensionEntry> {
        self.entries.values()
    }

    pub(crate) fn wire_size(&self, options: &EncodeOptions) -> usize {
        let mut total = 0;
        for entry in self.entries.values() {
            total += entry_size(entry, options);
        }
        total
    }

    pub(crate) fn encode(&self, writer: &mut Writer, state: &mut EncodeState<'_>) {
        for entry in self.entries.values() {
            encode_entry(entry, writer, state);
        }
    }

    pub(crate) fn check_initialized(&self) -> Result<(), Error> {
        for entry in self.entries.values() {
            if !entry.desc.kind.is_message() || entry.is_unforced_lazy() {
                continue;
            }
            match entry.value() {
                Value::Message(m) => {
                    m.layout_dyn().message_info().check_initialized(&**m)?;
                }
                Value::List(items) => {
                    for item in items {
                        if let Value::Message(m) = item {
                            m.layout_dyn().message_info().check_initialized(&**m)?;
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn entry_size(entry: &ExtensionEntry, options: &EncodeOptions) -> usize {
    // Unforced lazy bytes re-emit verbatim.
    if let ExtValue::Lazy(lazy) = &entry.value {
        if lazy.cell.get().is_none() {
            return lazy.bytes.len();
        }
    }
    let desc = entry.desc;
    let coder = Registry::global().ext_coder(desc);
    let value = entry.value();
    if desc.is_repeated() {
        let Value::List(items) = value else {
            panic!("repeated extension {} holds a non-list value", desc.name)
        };
        if desc.packed && desc.kind.is_packable() {
            if items.is_empty() {
                return 0;
            }
            let body: usize = items
                .iter()
                .map(|v| (kind::codec(desc.kind).size)(v.as_value_ref()))
                .sum();
            coder.tag_size + varuint64_size(body as u64) + body
        } else {
            items
                .iter()
                .map(|v| {
                    coder.tag_size
                        + payload_size(desc.kind, desc.number, coder.codec, v.as_value_ref(), options)
                })
                .sum()
        }
    } else {
        coder.tag_size
            + payload_size(desc.kind, desc.number, coder.codec, value.as_value_ref(), options)
    }
}

fn encode_entry(entry: &ExtensionEntry, writer: &mut Writer, state: &mut EncodeState<'_>) {
    if let ExtValue::Lazy(lazy) = &entry.value {
        if lazy.cell.get().is_none() {
            writer.write_bytes(&lazy.bytes);
            return;
        }
    }
    let desc = entry.desc;
    let coder = Registry::global().ext_coder(desc);
    let value = entry.value();
    state.field = desc.name;
    if desc.is_repeated() {
        let Value::List(items) = value else {
            panic!("repeated extension {} holds a non-list value", desc.name)
        };
        if desc.packed && desc.kind.is_packable() {
            if items.is_empty() {
                return;
            }
            let codec = kind::codec(desc.kind);
            let body: usize = items.iter().map(|v| (codec.size)(v.as_value_ref())).sum();
            writer.write_tag(coder.tag);
            writer.write_varuint64(body as u64);
            for item in items {
                (codec.encode)(writer, item.as_value_ref(), state);
            }
        } else {
            for item in items {
                writer.write_tag(coder.tag);
                payload_encode(desc.kind, desc.number, coder.codec, item.as_value_ref(), writer, state);
            }
        }
    } else {
        writer.write_tag(coder.tag);
        payload_encode(desc.kind, desc.number, coder.codec, value.as_value_ref(), writer, state);
    }
}

impl Clone for ExtensionStore {
    fn clone(&self) -> ExtensionStore {
        let mut entries = BTreeMap::new();
        for (&number, entry) in &self.entries {
            let value = match &entry.value {
                ExtValue::Eager(v) => ExtValue::Eager(v.clone()),
                ExtValue::Lazy(lazy) => {
                    let cell = OnceLock::new();
                    if let Some(v) = lazy.cell.get() {
                        let _ = cell.set(v.clone());
                    }
                    ExtValue::Lazy(LazyValue {
                        bytes: lazy.bytes.clone(),
                        cell,
                    })
                }
            };
            entries.insert(
                number,
                ExtensionEntry {
                    desc: entry.desc,
                    value,
                },
            );
        }
        ExtensionStore { entries }
    }
}

/// Equality by forced values; lazy entries decode as needed.
impl PartialEq for ExtensionStore {
    fn eq(&self, other: &ExtensionStore) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.iter().all(|(number, entry)| {
                other
                    .entries
                    .get(number)
                    .is_some_and(|o| o.value() == entry.value())
            })
    }
}

impl std::fmt::Debug for ExtensionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (number, entry) in &self.entries {
            match &entry.value {
                ExtValue::Eager(v) => map.entry(number, v),
                ExtValue::Lazy(lazy) => match lazy.cell.get() {
                    Some(v) => map.entry(number, v),
                    None => map.entry(number, &format_args!("<{} lazy bytes>", lazy.bytes.len())),
                },
            };
        }
        map.finish()
    }
}
