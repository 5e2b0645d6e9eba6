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

//! The record traits: the common field-layout convention concrete message
//! structs opt into.
//!
//! A concrete type implements [`StructRecord`] by returning its
//! [`RecordLayout`](crate::layout::RecordLayout) from a `OnceLock`-backed
//! static, so the layout is introspected exactly once per type and shared
//! forever. [`Record`] is the object-safe half used everywhere a message is
//! handled generically. The [`impl_record!`] macro writes the `Record`
//! boilerplate for any `Clone + StructRecord` type.

use std::any::Any;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::layout::RecordLayout;

/// Object-safe view of a concrete message struct.
pub trait Record: Any + Send + Sync {
    /// The layout of this record's concrete type.
    fn layout_dyn(&self) -> &'static RecordLayout;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn clone_boxed(&self) -> Box<dyn Record>;
}

/// Statically known record type: the entry point for layout lookup and
/// default construction.
pub trait StructRecord: Record + Default + Clone + Sized {
    /// Returns the layout, building it on first use.
    ///
    /// Implementations follow one convention:
    ///
    /// ```ignore
    /// fn layout() -> &'static RecordLayout {
    ///     static LAYOUT: OnceLock<RecordLayout> = OnceLock::new();
    ///     LAYOUT.get_or_init(|| LayoutBuilder::new(descriptor()) /* ... */ .build())
    /// }
    /// ```
    fn layout() -> &'static RecordLayout;
}

/// Implements [`Record`] for a `Clone + StructRecord` type.
#[macro_export]
macro_rules! impl_record {
    ($ty:ty) => {
        impl $crate::record::Record for $ty {
            fn layout_dyn(&self) -> &'static $crate::layout::RecordLayout {
                <$ty as $crate::record::StructRecord>::layout()
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }

            fn clone_boxed(&self) -> ::std::boxed::Box<dyn $crate::record::Record> {
                ::std::boxed::Box::new(::std::clone::Clone::clone(self))
            }
        }
    };
}

/// Cached encoded size, embedded in a record struct when the type opts into
/// size caching. Negative means "not computed".
#[derive(Debug)]
pub struct SizeCache {
    size: AtomicI64,
}

impl Default for SizeCache {
    fn default() -> SizeCache {
        SizeCache::new()
    }
}

impl SizeCache {
    pub fn new() -> SizeCache {
        SizeCache {
            size: AtomicI64::new(-1),
        }
    }

    #[inline(always)]
    pub fn get(&self) -> Option<usize> {
        let v = self.size.load(Ordering::Acquire);
        if v < 0 {
            None
        } else {
            Some(v as usize)
        }
    }

    #[inline(always)]
    pub fn store(&self, size: usize) {
        self.size.store(size as i64, Ordering::Release);
    }

    #[inline(always)]
    pub fn invalidate(&self) {
        self.size.store(-1, Ordering::Release);
    }
}

impl Clone for SizeCache {
    /// A cloned record starts with an unset cache; the clone's size may be
    /// mutated independently afterwards.
    fn clone(&self) -> SizeCache {
        SizeCache::new()
    }
}

/// The cache is derived state and never affects value equality.
impl PartialEq for SizeCache {
    fn eq(&self, _other: &SizeCache) -> bool {
        true
    }
}

impl Eq for SizeCache {}
