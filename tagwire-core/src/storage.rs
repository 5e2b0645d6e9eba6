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

//! Field storage projections and their type-erased accessor sets.
//!
//! A projection pair `fn(&R) -> &T` / `fn(&mut R) -> &mut T` plays the role
//! a raw "record pointer plus byte offset" plays in unchecked runtimes: it
//! names one field's storage inside a concrete record without the consumer
//! knowing the record type. The layout introspector erases each projection
//! into an [`AccessorSet`] of boxed closures over `&dyn Any`; applying an
//! accessor to a record of the wrong concrete type is a caller-contract
//! violation and panics.

use std::any::Any;
use std::collections::HashMap;
use std::hash::Hash;

use crate::record::{Record, StructRecord};
use crate::value::{MapKey, Value, ValueRef};

/// Presence discipline of a field's storage, decided by the introspector
/// from the descriptor and validated against the declared slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageClass {
    /// Proto3 implicit presence: the zero value means absent.
    ScalarImplicit,
    /// Explicit presence (`Option<T>`): zero and absent are distinct.
    ScalarExplicit,
    Repeated,
    Map,
    /// Singular message or group (`Option<Box<M>>`).
    Message,
    /// Member of a oneof union.
    Oneof,
}

pub type HasFn = Box<dyn Fn(&dyn Any) -> bool + Send + Sync>;
pub type GetFn = Box<dyn for<'a> Fn(&'a dyn Any) -> Option<ValueRef<'a>> + Send + Sync>;
pub type SetFn = Box<dyn Fn(&mut dyn Any, Value) + Send + Sync>;
pub type ClearFn = Box<dyn Fn(&mut dyn Any) + Send + Sync>;
pub type ListFn = Box<dyn for<'a> Fn(&'a dyn Any) -> &'a (dyn ListView) + Send + Sync>;
pub type ListMutFn = Box<dyn for<'a> Fn(&'a mut dyn Any) -> &'a mut (dyn ListView) + Send + Sync>;
pub type MapFn = Box<dyn for<'a> Fn(&'a dyn Any) -> &'a (dyn MapView) + Send + Sync>;
pub type MapMutFn = Box<dyn for<'a> Fn(&'a mut dyn Any) -> &'a mut (dyn MapView) + Send + Sync>;
pub type MessageMutFn = Box<dyn for<'a> Fn(&'a mut dyn Any) -> &'a mut (dyn Record) + Send + Sync>;
pub type WhichFn = Box<dyn Fn(&dyn Any) -> Option<u32> + Send + Sync>;

/// The erased reflective interface to one field's storage.
///
/// `get` returns `None` when the field is absent under its presence
/// discipline; collection accessors are populated only for the matching
/// classes.
pub struct AccessorSet {
    pub class: StorageClass,
    pub has: HasFn,
    pub get: GetFn,
    pub set: SetFn,
    pub clear: ClearFn,
    pub list: Option<ListFn>,
    pub list_mut: Option<ListMutFn>,
    pub map: Option<MapFn>,
    pub map_mut: Option<MapMutFn>,
    pub message_mut: Option<MessageMutFn>,
}

impl AccessorSet {
    fn new(class: StorageClass, has: HasFn, get: GetFn, set: SetFn, clear: ClearFn) -> AccessorSet {
        AccessorSet {
            class,
            has,
            get,
            set,
            clear,
            list: None,
            list_mut: None,
            map: None,
            map_mut: None,
            message_mut: None,
        }
    }
}

// Constrain helpers: pin the higher-ranked closure signatures so boxing
// infers the `for<'a>` bound instead of a single concrete lifetime.
fn hr_get<F>(f: F) -> GetFn
where
    F: for<'a> Fn(&'a dyn Any) -> Option<ValueRef<'a>> + Send + Sync + 'static,
{
    Box::new(f)
}

fn hr_list<F>(f: F) -> ListFn
where
    F: for<'a> Fn(&'a dyn Any) -> &'a (dyn ListView) + Send + Sync + 'static,
{
    Box::new(f)
}

fn hr_list_mut<F>(f: F) -> ListMutFn
where
    F: for<'a> Fn(&'a mut dyn Any) -> &'a mut (dyn ListView) + Send + Sync + 'static,
{
    Box::new(f)
}

fn hr_map<F>(f: F) -> MapFn
where
    F: for<'a> Fn(&'a dyn Any) -> &'a (dyn MapView) + Send + Sync + 'static,
{
    Box::new(f)
}

fn hr_map_mut<F>(f: F) -> MapMutFn
where
    F: for<'a> Fn(&'a mut dyn Any) -> &'a mut (dyn MapView) + Send + Sync + 'static,
{
    Box::new(f)
}

fn hr_message_mut<F>(f: F) -> MessageMutFn
where
    F: for<'a> Fn(&'a mut dyn Any) -> &'a mut (dyn Record) + Send + Sync + 'static,
{
    Box::new(f)
}

#[inline(always)]
fn cast<R: Record>(record: &dyn Any) -> &R {
    record
        .downcast_ref::<R>()
        .expect("field accessor applied to a mismatched record type")
}

#[inline(always)]
fn cast_mut<R: Record>(record: &mut dyn Any) -> &mut R {
    record
        .downcast_mut::<R>()
        .expect("field accessor applied to a mismatched record type")
}

/// Singular scalar storage (`bool`, the numeric types, `String`, `Vec<u8>`).
pub trait ScalarStorage: Send + Sync + Sized + 'static {
    /// Zero check for proto3 elision. Floating-point `-0.0` is non-zero.
    fn is_zero(&self) -> bool;
    fn as_ref_value(&self) -> ValueRef<'_>;
    fn from_value(value: Value) -> Self;
    fn reset(&mut self);
}

macro_rules! copy_scalar_storage {
    ($($ty:ty => $variant:ident, $zero:expr;)*) => {
        $(
            impl ScalarStorage for $ty {
                #[inline(always)]
                fn is_zero(&self) -> bool {
                    *self == $zero
                }

                #[inline(always)]
                fn as_ref_value(&self) -> ValueRef<'_> {
                    ValueRef::$variant(*self)
                }

                #[inline(always)]
                fn from_value(value: Value) -> Self {
                    match value {
                        Value::$variant(v) => v,
                        other => panic!(
                            "type mismatch: expected {}, got {:?}",
                            stringify!($variant),
                            other
                        ),
                    }
                }

                #[inline(always)]
                fn reset(&mut self) {
                    *self = $zero;
                }
            }

            impl ElemStorage for $ty {
                #[inline(always)]
                fn as_ref_value(&self) -> ValueRef<'_> {
                    ValueRef::$variant(*self)
                }

                #[inline(always)]
                fn from_value(value: Value) -> Self {
                    <$ty as ScalarStorage>::from_value(value)
                }
            }
        )*
    };
}

copy_scalar_storage! {
    bool => Bool, false;
    i32 => I32, 0;
    i64 => I64, 0;
    u32 => U32, 0;
    u64 => U64, 0;
}

macro_rules! float_scalar_storage {
    ($($ty:ty => $variant:ident;)*) => {
        $(
            impl ScalarStorage for $ty {
                #[inline(always)]
                fn is_zero(&self) -> bool {
                    // Bit comparison: -0.0 has its sign bit set and counts
                    // as present.
                    self.to_bits() == 0
                }

                #[inline(always)]
                fn as_ref_value(&self) -> ValueRef<'_> {
                    ValueRef::$variant(*self)
                }

                #[inline(always)]
                fn from_value(value: Value) -> Self {
                    match value {
                        Value::$variant(v) => v,
                        other => panic!(
                            "type mismatch: expected {}, got {:?}",
                            stringify!($variant),
                            other
                        ),
                    }
                }

                #[inline(always)]
                fn reset(&mut self) {
                    *self = 0.0;
                }
            }

            impl ElemStorage for $ty {
                #[inline(always)]
                fn as_ref_value(&self) -> ValueRef<'_> {
                    ValueRef::$variant(*self)
                }

                #[inline(always)]
                fn from_value(value: Value) -> Self {
                    <$ty as ScalarStorage>::from_value(value)
                }
            }
        )*
    };
}

float_scalar_storage! {
    f32 => F32;
    f64 => F64;
}

impl ScalarStorage for String {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn as_ref_value(&self) -> ValueRef<'_> {
        ValueRef::Str(self)
    }

    fn from_value(value: Value) -> Self {
        match value {
            Value::Str(v) => v,
            other => panic!("type mismatch: expected Str, got {:?}", other),
        }
    }

    fn reset(&mut self) {
        self.clear();
    }
}

impl ElemStorage for String {
    fn as_ref_value(&self) -> ValueRef<'_> {
        ValueRef::Str(self)
    }

    fn from_value(value: Value) -> Self {
        <String as ScalarStorage>::from_value(value)
    }
}

impl ScalarStorage for Vec<u8> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn as_ref_value(&self) -> ValueRef<'_> {
        ValueRef::Bytes(self)
    }

    fn from_value(value: Value) -> Self {
        match value {
            Value::Bytes(v) => v,
            other => panic!("type mismatch: expected Bytes, got {:?}", other),
        }
    }

    fn reset(&mut self) {
        self.clear();
    }
}

/// Element storage for repeated fields and map values.
pub trait ElemStorage: Send + Sync + Sized + 'static {
    fn as_ref_value(&self) -> ValueRef<'_>;
    fn from_value(value: Value) -> Self;
}

/// Repeated `bytes` fields store `Vec<Vec<u8>>`.
impl ElemStorage for Vec<u8> {
    fn as_ref_value(&self) -> ValueRef<'_> {
        ValueRef::Bytes(self)
    }

    fn from_value(value: Value) -> Self {
        <Vec<u8> as ScalarStorage>::from_value(value)
    }
}

/// Submessage elements are boxed, matching the singular `Option<Box<M>>`
/// convention.
impl<M: StructRecord> ElemStorage for Box<M> {
    fn as_ref_value(&self) -> ValueRef<'_> {
        ValueRef::Message(&**self)
    }

    fn from_value(value: Value) -> Self {
        match value {
            Value::Message(m) => match m.into_any().downcast::<M>() {
                Ok(b) => b,
                Err(_) => panic!("type mismatch: wrong concrete message type"),
            },
            other => panic!("type mismatch: expected Message, got {:?}", other),
        }
    }
}

/// Identity element, used for the owned value plane (extension lists).
impl ElemStorage for Value {
    fn as_ref_value(&self) -> ValueRef<'_> {
        self.as_value_ref()
    }

    fn from_value(value: Value) -> Self {
        value
    }
}

/// Uniform view of repeated-field storage.
pub trait ListView: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, index: usize) -> ValueRef<'_>;

    fn push(&mut self, value: Value);

    fn clear(&mut self);
}

impl<T: ElemStorage> ListView for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn get(&self, index: usize) -> ValueRef<'_> {
        self[index].as_ref_value()
    }

    fn push(&mut self, value: Value) {
        Vec::push(self, T::from_value(value));
    }

    fn clear(&mut self) {
        Vec::clear(self);
    }
}

/// Map key storage.
pub trait MapKeyStorage: Eq + Hash + Clone + Send + Sync + 'static {
    fn to_map_key(&self) -> MapKey;
    fn from_map_key(key: &MapKey) -> Self;
}

macro_rules! map_key_storage {
    ($($ty:ty => $variant:ident;)*) => {
        $(
            impl MapKeyStorage for $ty {
                #[inline(always)]
                fn to_map_key(&self) -> MapKey {
                    MapKey::$variant(self.clone())
                }

                #[inline(always)]
                fn from_map_key(key: &MapKey) -> Self {
                    match key {
                        MapKey::$variant(v) => v.clone(),
                        other => panic!(
                            "type mismatch: expected {} map key, got {:?}",
                            stringify!($variant),
                            other
                        ),
                    }
                }
            }
        )*
    };
}

map_key_storage! {
    bool => Bool;
    i32 => I32;
    i64 => I64;
    u32 => U32;
    u64 => U64;
    String => Str;
}

/// Uniform view of map-field storage.
pub trait MapView: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, key: &MapKey) -> Option<ValueRef<'_>>;

    fn insert(&mut self, key: MapKey, value: Value);

    fn remove(&mut self, key: &MapKey);

    fn clear(&mut self);

    /// Iteration order is the storage's natural order; deterministic
    /// encoding sorts separately.
    fn iter(&self) -> Box<dyn Iterator<Item = (MapKey, ValueRef<'_>)> + '_>;
}

impl<K: MapKeyStorage, V: ElemStorage> MapView for HashMap<K, V> {
    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn get(&self, key: &MapKey) -> Option<ValueRef<'_>> {
        HashMap::get(self, &K::from_map_key(key)).map(|v| v.as_ref_value())
    }

    fn insert(&mut self, key: MapKey, value: Value) {
        HashMap::insert(self, K::from_map_key(&key), V::from_value(value));
    }

    fn remove(&mut self, key: &MapKey) {
        HashMap::remove(self, &K::from_map_key(key));
    }

    fn clear(&mut self) {
        HashMap::clear(self);
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (MapKey, ValueRef<'_>)> + '_> {
        Box::new(HashMap::iter(self).map(|(k, v)| (k.to_map_key(), v.as_ref_value())))
    }
}

/// Owned value plane for map-kind extension values.
impl MapView for Vec<(MapKey, Value)> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn get(&self, key: &MapKey) -> Option<ValueRef<'_>> {
        <[(MapKey, Value)]>::iter(self)
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_value_ref())
    }

    fn insert(&mut self, key: MapKey, value: Value) {
        if let Some(slot) = self.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            Vec::push(self, (key, value));
        }
    }

    fn remove(&mut self, key: &MapKey) {
        self.retain(|(k, _)| k != key);
    }

    fn clear(&mut self) {
        Vec::clear(self);
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (MapKey, ValueRef<'_>)> + '_> {
        Box::new(<[(MapKey, Value)]>::iter(self).map(|(k, v)| (k.clone(), v.as_value_ref())))
    }
}

/// Accessors over a oneof union, supplied by the record type as plain
/// function pointers over its union enum.
pub struct OneofBinding<R> {
    /// Active member's field number, or `None` when the union is empty.
    pub which: fn(&R) -> Option<u32>,
    /// Borrowed payload of the given member, `None` when inactive.
    pub get: for<'a> fn(&'a R, u32) -> Option<ValueRef<'a>>,
    /// Replaces the whole union with the given member's value.
    pub set: fn(&mut R, u32, Value),
    pub clear: fn(&mut R),
}

// Fn pointers are Copy; derive(Clone) would demand R: Clone.
impl<R> Clone for OneofBinding<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for OneofBinding<R> {}

pub(crate) fn erase_scalar<R: Record, T: ScalarStorage>(
    get: fn(&R) -> &T,
    get_mut: fn(&mut R) -> &mut T,
) -> AccessorSet {
    AccessorSet::new(
        StorageClass::ScalarImplicit,
        Box::new(move |r| !get(cast::<R>(r)).is_zero()),
        hr_get(move |r| {
            let v = get(cast::<R>(r));
            if v.is_zero() {
                None
            } else {
                Some(v.as_ref_value())
            }
        }),
        Box::new(move |r, v| *get_mut(cast_mut::<R>(r)) = T::from_value(v)),
        Box::new(move |r| get_mut(cast_mut::<R>(r)).reset()),
    )
}

pub(crate) fn erase_optional<R: Record, T: ScalarStorage>(
    get: fn(&R) -> &Option<T>,
    get_mut: fn(&mut R) -> &mut Option<T>,
) -> AccessorSet {
    AccessorSet::new(
        StorageClass::ScalarExplicit,
        Box::new(move |r| get(cast::<R>(r)).is_some()),
        hr_get(move |r| get(cast::<R>(r)).as_ref().map(|v| v.as_ref_value())),
        Box::new(move |r, v| *get_mut(cast_mut::<R>(r)) = Some(T::from_value(v))),
        Box::new(move |r| *get_mut(cast_mut::<R>(r)) = None),
    )
}

pub(crate) fn erase_repeated<R: Record, T: ElemStorage>(
    get: fn(&R) -> &Vec<T>,
    get_mut: fn(&mut R) -> &mut Vec<T>,
) -> AccessorSet {
    let mut set = AccessorSet::new(
        StorageClass::Repeated,
        Box::new(move |r| !get(cast::<R>(r)).is_empty()),
        hr_get(move |r| {
            let v = get(cast::<R>(r));
            if v.is_empty() {
                None
            } else {
                Some(ValueRef::List(v))
            }
        }),
        Box::new(move |r, v| {
            let items = match v {
                Value::List(items) => items,
                other => panic!("type mismatch: expected List, got {:?}", other),
            };
            let vec = get_mut(cast_mut::<R>(r));
            vec.clear();
            vec.extend(items.into_iter().map(T::from_value));
        }),
        Box::new(move |r| get_mut(cast_mut::<R>(r)).clear()),
    );
    set.list = Some(hr_list(move |r| get(cast::<R>(r)) as &dyn ListView));
    set.list_mut = Some(hr_list_mut(move |r| {
        get_mut(cast_mut::<R>(r)) as &mut dyn ListView
    }));
    set
}

pub(crate) fn erase_map<R: Record, K: MapKeyStorage, V: ElemStorage>(
    get: fn(&R) -> &HashMap<K, V>,
    get_mut: fn(&mut R) -> &mut HashMap<K, V>,
) -> AccessorSet {
    let mut set = AccessorSet::new(
        StorageClass::Map,
        Box::new(move |r| !get(cast::<R>(r)).is_empty()),
        hr_get(move |r| {
            let v = get(cast::<R>(r));
            if v.is_empty() {
                None
            } else {
                Some(ValueRef::Map(v))
            }
        }),
        Box::new(move |r, v| {
            let entries = match v {
                Value::Map(entries) => entries,
                other => panic!("type mismatch: expected Map, got {:?}", other),
            };
            let map = get_mut(cast_mut::<R>(r));
            map.clear();
            for (k, v) in entries {
                map.insert(K::from_map_key(&k), V::from_value(v));
            }
        }),
        Box::new(move |r| get_mut(cast_mut::<R>(r)).clear()),
    );
    set.map = Some(hr_map(move |r| get(cast::<R>(r)) as &dyn MapView));
    set.map_mut = Some(hr_map_mut(move |r| {
        get_mut(cast_mut::<R>(r)) as &mut dyn MapView
    }));
    set
}

pub(crate) fn erase_message<R: Record, M: StructRecord>(
    get: fn(&R) -> &Option<Box<M>>,
    get_mut: fn(&mut R) -> &mut Option<Box<M>>,
) -> AccessorSet {
    let mut set = AccessorSet::new(
        StorageClass::Message,
        Box::new(move |r| get(cast::<R>(r)).is_some()),
        hr_get(move |r| {
            get(cast::<R>(r))
                .as_deref()
                .map(|m| ValueRef::Message(m as &dyn Record))
        }),
        Box::new(move |r, v| {
            let boxed = <Box<M> as ElemStorage>::from_value(v);
            *get_mut(cast_mut::<R>(r)) = Some(boxed);
        }),
        Box::new(move |r| *get_mut(cast_mut::<R>(r)) = None),
    );
    // Lazily allocates a zero-valued submessage on first mutable access.
    set.message_mut = Some(hr_message_mut(move |r| {
        let slot = get_mut(cast_mut::<R>(r));
        &mut **slot.get_or_insert_with(|| Box::new(M::default())) as &mut dyn Record
    }));
    set
}

pub(crate) fn erase_oneof_member<R: Record>(binding: OneofBinding<R>, number: u32) -> AccessorSet {
    let which = binding.which;
    let get = binding.get;
    let set = binding.set;
    let clear = binding.clear;
    AccessorSet::new(
        StorageClass::Oneof,
        Box::new(move |r| which(cast::<R>(r)) == Some(number)),
        hr_get(move |r| get(cast::<R>(r), number)),
        Box::new(move |r, v| set(cast_mut::<R>(r), number, v)),
        Box::new(move |r| {
            // Clearing an inactive member leaves the union untouched.
            let rec = cast_mut::<R>(r);
            if which(rec) == Some(number) {
                clear(rec);
            }
        }),
    )
}

pub(crate) fn erase_which<R: Record>(which: fn(&R) -> Option<u32>) -> WhichFn {
    Box::new(move |r| which(cast::<R>(r)))
}
