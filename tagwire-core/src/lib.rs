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

//! # Tagwire Core
//!
//! This is the core implementation of the tagwire reflective message
//! runtime: protobuf-wire-compatible serialization without per-type
//! generated code. Any struct that follows the common field-layout
//! convention gets marshal, size, initialization checking and a uniform
//! reflective interface, all driven by a per-type coder table built
//! lazily, exactly once.
//!
//! ## Architecture
//!
//! - **`buffer`**: binary wire buffers with varint/zigzag/fixed codecs
//! - **`types`**: wire types, field kinds, tag arithmetic
//! - **`value`**: the type-erased value planes (`Value` / `ValueRef`)
//! - **`record`**: the `Record` traits concrete message structs opt into
//! - **`storage`**: typed field projections erased to accessor sets
//! - **`descriptor`**: message, field and extension descriptors
//! - **`layout`**: per-type layout introspection and validation
//! - **`coder`**: the {kind × cardinality × packed × presence} coder matrix
//! - **`message_info`**: the per-type field table and its operations
//! - **`extension`**: per-record extension storage with lazy values
//! - **`registry`**: extension registration and the legacy adapter hook
//! - **`facade`**: the public reflective view and marshal helpers
//! - **`error`**: error handling and result types
//!
//! ## Dispatch model
//!
//! A concrete record type declares a descriptor plus storage projections;
//! the layout introspector validates the two against each other once. On
//! first use, `MessageInfo` resolves every field to one static coder from
//! the matrix. After that every marshal, size or reflective call is a flat
//! walk over the number-sorted table with no per-field classification.

pub mod buffer;
pub mod coder;
pub mod descriptor;
pub mod error;
pub mod extension;
pub mod facade;
pub mod layout;
pub mod message_info;
pub mod record;
pub mod registry;
pub mod storage;
pub mod types;
pub mod value;
