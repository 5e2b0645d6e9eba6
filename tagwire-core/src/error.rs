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

//! Error types for marshaling, unmarshaling and reflective access.
//!
//! Only data-dependent conditions are surfaced through [`enum@Error`].
//! Contract violations (a declared field with no backing storage, a typed
//! accessor applied to the wrong record type, double registration of an
//! extension) are programming errors and panic at the violation site
//! instead of returning a value the caller would have to thread around.

use std::borrow::Cow;

use thiserror::Error;

/// Compile-time flag: set `TAGWIRE_PANIC_ON_ERROR=1` while building to make
/// every error constructor panic at its creation site, which turns a
/// returned error into a backtrace during debugging.
pub const PANIC_ON_ERROR: bool = option_env!("TAGWIRE_PANIC_ON_ERROR").is_some();

/// Error type for tagwire operations.
///
/// Always construct variants through the static constructor functions
/// ([`Error::invalid_utf8`], [`Error::required_not_set`], ...) rather than
/// the enum syntax; the constructors honor `TAGWIRE_PANIC_ON_ERROR` and
/// keep error creation uniform across the codebase.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A string-kind field carried bytes that are not valid UTF-8.
    ///
    /// This is advisory: marshaling still completes and the reported wire
    /// bytes are structurally valid.
    #[error("invalid UTF-8 in string field: {0}")]
    InvalidUtf8(Cow<'static, str>),

    /// A proto2 required field (possibly in a nested message) is absent.
    #[error("required field not set: {0}")]
    RequiredNotSet(Cow<'static, str>),

    /// A field number that is neither declared on the message nor inside
    /// one of its extension ranges was passed to the reflective facade.
    #[error("unknown field number {0}")]
    UnknownField(u32),

    /// Read past the end of the input buffer.
    #[error("buffer out of bound: {0} + {1} > {2}")]
    BufferOutOfBound(usize, usize, usize),

    /// Malformed wire data (overlong varint, bad wire type, stray end-group
    /// tag and the like).
    #[error("{0}")]
    InvalidData(Cow<'static, str>),

    /// Message nesting exceeded the decode recursion limit.
    #[error("{0}")]
    DepthExceed(Cow<'static, str>),
}

impl Error {
    /// Creates a new [`Error::InvalidUtf8`] naming the offending field.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn invalid_utf8<S: Into<Cow<'static, str>>>(field: S) -> Self {
        let err = Error::InvalidUtf8(field.into());
        if PANIC_ON_ERROR {
            panic!("TAGWIRE_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::RequiredNotSet`] naming the absent field.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn required_not_set<S: Into<Cow<'static, str>>>(field: S) -> Self {
        let err = Error::RequiredNotSet(field.into());
        if PANIC_ON_ERROR {
            panic!("TAGWIRE_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::UnknownField`] for the given field number.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unknown_field(number: u32) -> Self {
        let err = Error::UnknownField(number);
        if PANIC_ON_ERROR {
            panic!("TAGWIRE_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::BufferOutOfBound`] with the given bounds.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn buffer_out_of_bound(offset: usize, length: usize, capacity: usize) -> Self {
        let err = Error::BufferOutOfBound(offset, length, capacity);
        if PANIC_ON_ERROR {
            panic!("TAGWIRE_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::InvalidData`] from a string or static message.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn invalid_data<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::InvalidData(s.into());
        if PANIC_ON_ERROR {
            panic!("TAGWIRE_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::DepthExceed`] from a string or static message.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn depth_exceed<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::DepthExceed(s.into());
        if PANIC_ON_ERROR {
            panic!("TAGWIRE_PANIC_ON_ERROR: {}", err);
        }
        err
    }
}

/// Ensures a condition is true; otherwise returns an [`enum@Error`].
///
/// ```
/// use tagwire_core::ensure;
/// use tagwire_core::error::Error;
///
/// fn check_len(n: usize) -> Result<(), Error> {
///     ensure!(n < 10, Error::invalid_data("length too large"));
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            return Err($crate::error::Error::invalid_data(format!($fmt, $($arg)*)));
        }
    };
}

/// Returns early with an [`Error::InvalidData`].
#[macro_export]
macro_rules! bail {
    ($err:expr) => {
        return Err($crate::error::Error::invalid_data($err))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::Error::invalid_data(format!($fmt, $($arg)*)))
    };
}
