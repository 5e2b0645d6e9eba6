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

//! Extension registration and the legacy-layout adapter hook.
//!
//! A [`Registry`] is explicit and injectable so tests can build isolated
//! ones; [`Registry::global`] is the process-wide default with append-only,
//! never-evicted lifetime. Both caches are read-mostly: an `RwLock` guards
//! each, writers appear only on first registration or first use of a new
//! extension type.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use crate::coder::kind::{self, KindCodec};
use crate::descriptor::ExtensionDescriptor;
use crate::record::Record;
use crate::types::{make_tag, tag_size, WireType};

/// Precomputed wire framing for one extension descriptor, cached
/// process-wide so repeated marshals of the same extension never redo the
/// tag arithmetic.
pub struct ExtCoder {
    pub tag: u32,
    pub tag_size: usize,
    pub wire_type: WireType,
    pub packed: bool,
    /// Value codec for scalar kinds; `None` for message and group kinds.
    pub codec: Option<&'static KindCodec>,
}

/// Hook for adapting record types that do not follow the native storage
/// convention. The runtime calls it only after a record fails to present
/// itself as a native [`Record`]; the adapter owns everything about its
/// legacy layout.
pub trait LegacyAdapter: Send + Sync {
    /// A reflective copy of `record` in native form, or `None` when this
    /// adapter does not recognize the type.
    fn adapt(&self, record: &dyn Any) -> Option<Box<dyn Record>>;
}

/// Extension descriptors and derived coders, keyed for lookup during
/// decode and reflective access.
pub struct Registry {
    extensions: RwLock<HashMap<(&'static str, u32), &'static ExtensionDescriptor>>,
    coders: RwLock<HashMap<usize, &'static ExtCoder>>,
    adapter: RwLock<Option<&'static dyn LegacyAdapter>>,
}

impl Default for Registry {
    fn default() -> Registry {
        Registry::new()
    }
}

impl Registry {
    pub fn new() -> Registry {
        Registry {
            extensions: RwLock::new(HashMap::new()),
            coders: RwLock::new(HashMap::new()),
            adapter: RwLock::new(None),
        }
    }

    /// The process-wide registry. Lives for the process, append-only,
    /// never evicted.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::new)
    }

    /// Registers an extension descriptor. Registering the same
    /// `(extendee, number)` twice is a programming error and panics.
    pub fn register_extension(&self, desc: &'static ExtensionDescriptor) {
        let mut extensions = self.extensions.write().unwrap();
        if extensions
            .insert((desc.extendee, desc.number), desc)
            .is_some()
        {
            panic!(
                "extension {} on {} registered twice",
                desc.number, desc.extendee
            );
        }
    }

    pub fn find_extension(
        &self,
        extendee: &'static str,
        number: u32,
    ) -> Option<&'static ExtensionDescriptor> {
        self.extensions
            .read()
            .unwrap()
            .get(&(extendee, number))
            .copied()
    }

    /// The derived wire framing for `desc`, built on first use and cached
    /// by descriptor identity.
    pub(crate) fn ext_coder(&self, desc: &'static ExtensionDescriptor) -> &'static ExtCoder {
        let key = desc as *const ExtensionDescriptor as usize;
        if let Some(coder) = self.coders.read().unwrap().get(&key) {
            return coder;
        }
        let wire_type = if desc.packed && desc.kind.is_packable() && desc.is_repeated() {
            WireType::LengthDelimited
        } else {
            desc.kind.wire_type()
        };
        let coder: &'static ExtCoder = Box::leak(Box::new(ExtCoder {
            tag: make_tag(desc.number, wire_type),
            tag_size: tag_size(desc.number, wire_type),
            wire_type,
            packed: desc.packed && desc.kind.is_packable(),
            codec: if desc.kind.is_message() {
                None
            } else {
                Some(kind::codec(desc.kind))
            },
        }));
        // A racing first use may build twice; both results are identical
        // and the map keeps whichever lands last.
        self.coders.write().unwrap().insert(key, coder);
        coder
    }

    /// Installs the single legacy-layout adapter. Installing a second one
    /// is a programming error and panics.
    pub fn set_legacy_adapter(&self, adapter: &'static dyn LegacyAdapter) {
        let mut slot = self.adapter.write().unwrap();
        if slot.is_some() {
            panic!("legacy adapter installed twice");
        }
        *slot = Some(adapter);
    }

    /// Runs the legacy adapter, if any, over a record of unknown layout.
    pub fn adapt(&self, record: &dyn Any) -> Option<Box<dyn Record>> {
        let slot = self.adapter.read().unwrap();
        slot.and_then(|a| a.adapt(record))
    }
}
