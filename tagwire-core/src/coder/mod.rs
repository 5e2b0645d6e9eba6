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

//! The coder matrix: size/encode/decode dispatch over
//! {kind × cardinality × packed × presence}.
//!
//! [`kind`] holds the per-kind value codecs (one wire encoding per scalar
//! kind). [`field`] wraps them with the cardinality and presence handling a
//! whole field needs. [`decode`] is the wire-walk merge. Dispatch is data:
//! each field resolves to one `&'static FieldCoder` once, at table-build
//! time, and marshaling is then a flat walk with no per-field branching.

pub mod decode;
pub mod field;
pub mod kind;

use crate::error::Error;

/// Caller-chosen encoding knobs.
#[derive(Clone, Copy, Debug, Default)]
pub struct EncodeOptions {
    /// Sort map entries by key so repeated marshals of equal messages are
    /// byte-identical.
    pub deterministic: bool,
    /// Trust and maintain the record's embedded size cache, when its type
    /// declares one.
    pub use_cached_size: bool,
}

impl EncodeOptions {
    pub fn deterministic() -> EncodeOptions {
        EncodeOptions {
            deterministic: true,
            ..EncodeOptions::default()
        }
    }
}

/// Per-marshal mutable state threaded through the coder walk.
///
/// Carries the advisory-error accumulator: UTF-8 failures do not stop the
/// walk, the first one is returned once every byte is written.
pub struct EncodeState<'a> {
    pub options: &'a EncodeOptions,
    /// Name of the field currently being encoded, for advisory errors.
    pub field: &'static str,
    first_error: Option<Error>,
}

impl<'a> EncodeState<'a> {
    pub fn new(options: &'a EncodeOptions) -> EncodeState<'a> {
        EncodeState {
            options,
            field: "",
            first_error: None,
        }
    }

    /// Records a non-fatal error; first error wins.
    pub fn note(&mut self, err: Error) {
        if self.first_error.is_none() {
            self.first_error = Some(err);
        }
    }

    pub fn finish(self) -> Result<(), Error> {
        match self.first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
