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

//! # Tagwire
//!
//! Tagwire is a reflective message runtime: protobuf-wire-compatible
//! binary serialization for arbitrary record types with no per-type
//! generated encode/decode code. A record type declares its fields once
//! (numbers, kinds, cardinalities, oneofs) alongside plain field
//! projections; the runtime introspects that layout a single time per
//! type and drives marshaling, sizing, initialization checks and a
//! uniform `has`/`get`/`set`/`clear`/`range` reflective interface from
//! the resulting coder table.
//!
//! ## Declaring a record type
//!
//! ```rust
//! use std::sync::OnceLock;
//! use tagwire::{
//!     impl_record, FieldDescriptor, Kind, Cardinality, LayoutBuilder,
//!     MessageDescriptor, RecordLayout, StructRecord, Syntax,
//! };
//!
//! #[derive(Clone, Default, PartialEq, Debug)]
//! struct Ping {
//!     seq: u64,
//!     note: String,
//! }
//!
//! impl_record!(Ping);
//!
//! impl StructRecord for Ping {
//!     fn layout() -> &'static RecordLayout {
//!         static LAYOUT: OnceLock<RecordLayout> = OnceLock::new();
//!         LAYOUT.get_or_init(|| {
//!             let descriptor = MessageDescriptor::new("demo.Ping", Syntax::Proto3)
//!                 .field(FieldDescriptor::scalar(1, "seq", Kind::Uint64, Cardinality::Singular))
//!                 .field(FieldDescriptor::scalar(2, "note", Kind::String, Cardinality::Singular));
//!             LayoutBuilder::new(descriptor)
//!                 .scalar(1, |p: &Ping| &p.seq, |p: &mut Ping| &mut p.seq)
//!                 .scalar(2, |p: &Ping| &p.note, |p: &mut Ping| &mut p.note)
//!                 .build()
//!         })
//!     }
//! }
//!
//! let ping = Ping { seq: 7, note: "hi".into() };
//! let bytes = tagwire::marshal(&ping).unwrap();
//! let back: Ping = tagwire::unmarshal(&bytes).unwrap();
//! assert_eq!(ping, back);
//! ```
//!
//! ## Reflective access
//!
//! ```rust
//! # use std::sync::OnceLock;
//! # use tagwire::{
//! #     impl_record, FieldDescriptor, Kind, Cardinality, LayoutBuilder,
//! #     MessageDescriptor, RecordLayout, StructRecord, Syntax,
//! # };
//! # #[derive(Clone, Default, PartialEq, Debug)]
//! # struct Ping { seq: u64, note: String }
//! # impl_record!(Ping);
//! # impl StructRecord for Ping {
//! #     fn layout() -> &'static RecordLayout {
//! #         static LAYOUT: OnceLock<RecordLayout> = OnceLock::new();
//! #         LAYOUT.get_or_init(|| {
//! #             let descriptor = MessageDescriptor::new("demo.Ping2", Syntax::Proto3)
//! #                 .field(FieldDescriptor::scalar(1, "seq", Kind::Uint64, Cardinality::Singular))
//! #                 .field(FieldDescriptor::scalar(2, "note", Kind::String, Cardinality::Singular));
//! #             LayoutBuilder::new(descriptor)
//! #                 .scalar(1, |p: &Ping| &p.seq, |p: &mut Ping| &mut p.seq)
//! #                 .scalar(2, |p: &Ping| &p.note, |p: &mut Ping| &mut p.note)
//! #                 .build()
//! #         })
//! #     }
//! # }
//! use tagwire::{MessageMut, MessageRef, Value};
//!
//! let mut ping = Ping::default();
//! MessageMut::new(&mut ping).set(1, Value::U64(42)).unwrap();
//! assert_eq!(ping.seq, 42);
//! assert!(MessageRef::new(&ping).has(1).unwrap());
//! ```

pub use tagwire_core::coder::{EncodeOptions, EncodeState};
pub use tagwire_core::descriptor::{
    ExtensionDescriptor, FieldDescriptor, MapMeta, MessageDescriptor, MessageLink, OneofDescriptor,
};
pub use tagwire_core::error::Error;
pub use tagwire_core::extension::{ExtensionEntry, ExtensionStore};
pub use tagwire_core::facade::{
    marshal, marshal_with, merge, unmarshal, unmarshal_with, MessageMut, MessageRef,
};
pub use tagwire_core::impl_record;
pub use tagwire_core::layout::{LayoutBuilder, RecordLayout};
pub use tagwire_core::message_info::MessageInfo;
pub use tagwire_core::record::{Record, SizeCache, StructRecord};
pub use tagwire_core::registry::{LegacyAdapter, Registry};
pub use tagwire_core::storage::OneofBinding;
pub use tagwire_core::types::{Cardinality, Kind, Syntax, WireType};
pub use tagwire_core::value::{DefaultValue, MapKey, Value, ValueRef};
