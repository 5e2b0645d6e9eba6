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

//! Record types shared by the integration tests.

use std::collections::HashMap;
use std::sync::OnceLock;

use tagwire::{
    impl_record, Cardinality, ExtensionDescriptor, ExtensionStore, FieldDescriptor, Kind,
    LayoutBuilder, MapMeta, MessageDescriptor, MessageLink, OneofBinding, RecordLayout, SizeCache,
    StructRecord, Syntax, Value, ValueRef,
};

/// Proto3 message matching `{1: bool, 2: repeated int32, 3: map<string,string>}`.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct Sample {
    pub flag: bool,
    pub nums: Vec<i32>,
    pub labels: HashMap<String, String>,
    pub unknown: Vec<u8>,
    pub cache: SizeCache,
}

impl_record!(Sample);

impl StructRecord for Sample {
    fn layout() -> &'static RecordLayout {
        static LAYOUT: OnceLock<RecordLayout> = OnceLock::new();
        LAYOUT.get_or_init(|| {
            let descriptor = MessageDescriptor::new("test.Sample", Syntax::Proto3)
                .field(FieldDescriptor::scalar(1, "flag", Kind::Bool, Cardinality::Singular))
                .field(FieldDescriptor::scalar(2, "nums", Kind::Int32, Cardinality::Repeated))
                .field(FieldDescriptor::map(
                    3,
                    "labels",
                    MapMeta {
                        key_kind: Kind::String,
                        value_kind: Kind::String,
                        value_message: None,
                    },
                ));
            LayoutBuilder::new(descriptor)
                .scalar(1, |s: &Sample| &s.flag, |s: &mut Sample| &mut s.flag)
                .repeated(2, |s: &Sample| &s.nums, |s: &mut Sample| &mut s.nums)
                .map(3, |s: &Sample| &s.labels, |s: &mut Sample| &mut s.labels)
                .unknown_fields(|s: &Sample| &s.unknown, |s: &mut Sample| &mut s.unknown)
                .size_cache(|s: &Sample| &s.cache)
                .build()
        })
    }
}

/// Proto3 floats, for the negative-zero presence rules.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct Floaty {
    pub single: f32,
    pub double: f64,
}

impl_record!(Floaty);

impl StructRecord for Floaty {
    fn layout() -> &'static RecordLayout {
        static LAYOUT: OnceLock<RecordLayout> = OnceLock::new();
        LAYOUT.get_or_init(|| {
            let descriptor = MessageDescriptor::new("test.Floaty", Syntax::Proto3)
                .field(FieldDescriptor::scalar(1, "single", Kind::Float, Cardinality::Singular))
                .field(FieldDescriptor::scalar(2, "double", Kind::Double, Cardinality::Singular));
            LayoutBuilder::new(descriptor)
                .scalar(1, |f: &Floaty| &f.single, |f: &mut Floaty| &mut f.single)
                .scalar(2, |f: &Floaty| &f.double, |f: &mut Floaty| &mut f.double)
                .build()
        })
    }
}

#[derive(Clone, Default, PartialEq, Debug)]
pub struct PackedInts {
    pub values: Vec<u32>,
}

impl_record!(PackedInts);

impl StructRecord for PackedInts {
    fn layout() -> &'static RecordLayout {
        static LAYOUT: OnceLock<RecordLayout> = OnceLock::new();
        LAYOUT.get_or_init(|| {
            let descriptor = MessageDescriptor::new("test.PackedInts", Syntax::Proto3).field(
                FieldDescriptor::scalar(1, "values", Kind::Uint32, Cardinality::Repeated)
                    .packed(true),
            );
            LayoutBuilder::new(descriptor)
                .repeated(1, |p: &PackedInts| &p.values, |p: &mut PackedInts| {
                    &mut p.values
                })
                .build()
        })
    }
}

#[derive(Clone, Default, PartialEq, Debug)]
pub struct Inner {
    pub x: u64,
}

impl_record!(Inner);

impl StructRecord for Inner {
    fn layout() -> &'static RecordLayout {
        static LAYOUT: OnceLock<RecordLayout> = OnceLock::new();
        LAYOUT.get_or_init(|| {
            let descriptor = MessageDescriptor::new("test.Inner", Syntax::Proto3)
                .field(FieldDescriptor::scalar(1, "x", Kind::Uint64, Cardinality::Singular));
            LayoutBuilder::new(descriptor)
                .scalar(1, |i: &Inner| &i.x, |i: &mut Inner| &mut i.x)
                .build()
        })
    }
}

/// Proto2 message with one group-kind field.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct Grouped {
    pub g: Option<Box<Inner>>,
}

impl_record!(Grouped);

impl StructRecord for Grouped {
    fn layout() -> &'static RecordLayout {
        static LAYOUT: OnceLock<RecordLayout> = OnceLock::new();
        LAYOUT.get_or_init(|| {
            let descriptor = MessageDescriptor::new("test.Grouped", Syntax::Proto2).field(
                FieldDescriptor::group(1, "g", Cardinality::Singular, MessageLink::of::<Inner>()),
            );
            LayoutBuilder::new(descriptor)
                .message(1, |o: &Grouped| &o.g, |o: &mut Grouped| &mut o.g)
                .build()
        })
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum Shape {
    Circle(u32),
    Label(String),
}

pub const SHAPE_CIRCLE: u32 = 9;
pub const SHAPE_LABEL: u32 = 10;

fn shape_which(r: &Rich) -> Option<u32> {
    match &r.shape {
        Some(Shape::Circle(_)) => Some(SHAPE_CIRCLE),
        Some(Shape::Label(_)) => Some(SHAPE_LABEL),
        None => None,
    }
}

fn shape_get<'a>(r: &'a Rich, number: u32) -> Option<ValueRef<'a>> {
    match (&r.shape, number) {
        (Some(Shape::Circle(v)), SHAPE_CIRCLE) => Some(ValueRef::U32(*v)),
        (Some(Shape::Label(s)), SHAPE_LABEL) => Some(ValueRef::Str(s)),
        _ => None,
    }
}

fn shape_set(r: &mut Rich, number: u32, value: Value) {
    r.shape = Some(match (number, value) {
        (SHAPE_CIRCLE, Value::U32(v)) => Shape::Circle(v),
        (SHAPE_LABEL, Value::Str(s)) => Shape::Label(s),
        (n, v) => panic!("bad oneof member {n}: {v:?}"),
    });
}

fn shape_clear(r: &mut Rich) {
    r.shape = None;
}

/// One of everything: scalars, explicit presence, lists, maps, a nested
/// message and a oneof.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct Rich {
    pub id: u64,
    pub temp: i32,
    pub ratio: f64,
    pub name: String,
    pub blob: Vec<u8>,
    pub tags: Vec<String>,
    pub counts: HashMap<i32, u64>,
    pub inner: Option<Box<Inner>>,
    pub shape: Option<Shape>,
    pub opt_flag: Option<bool>,
}

impl_record!(Rich);

impl StructRecord for Rich {
    fn layout() -> &'static RecordLayout {
        static LAYOUT: OnceLock<RecordLayout> = OnceLock::new();
        LAYOUT.get_or_init(|| {
            let descriptor = MessageDescriptor::new("test.Rich", Syntax::Proto3)
                .field(FieldDescriptor::scalar(1, "id", Kind::Uint64, Cardinality::Singular))
                .field(FieldDescriptor::scalar(2, "temp", Kind::Sint32, Cardinality::Singular))
                .field(FieldDescriptor::scalar(3, "ratio", Kind::Double, Cardinality::Singular))
                .field(FieldDescriptor::scalar(4, "name", Kind::String, Cardinality::Singular))
                .field(FieldDescriptor::scalar(5, "blob", Kind::Bytes, Cardinality::Singular))
                .field(FieldDescriptor::scalar(6, "tags", Kind::String, Cardinality::Repeated))
                .field(FieldDescriptor::map(
                    7,
                    "counts",
                    MapMeta {
                        key_kind: Kind::Int32,
                        value_kind: Kind::Uint64,
                        value_message: None,
                    },
                ))
                .field(FieldDescriptor::message(
                    8,
                    "inner",
                    Cardinality::Singular,
                    MessageLink::of::<Inner>(),
                ))
                .field(
                    FieldDescriptor::scalar(
                        SHAPE_CIRCLE,
                        "circle",
                        Kind::Uint32,
                        Cardinality::Singular,
                    )
                    .in_oneof(0),
                )
                .field(
                    FieldDescriptor::scalar(
                        SHAPE_LABEL,
                        "label",
                        Kind::String,
                        Cardinality::Singular,
                    )
                    .in_oneof(0),
                )
                .field(FieldDescriptor::scalar(11, "opt_flag", Kind::Bool, Cardinality::Singular))
                .oneof("shape", vec![SHAPE_CIRCLE, SHAPE_LABEL]);
            LayoutBuilder::new(descriptor)
                .scalar(1, |r: &Rich| &r.id, |r: &mut Rich| &mut r.id)
                .scalar(2, |r: &Rich| &r.temp, |r: &mut Rich| &mut r.temp)
                .scalar(3, |r: &Rich| &r.ratio, |r: &mut Rich| &mut r.ratio)
                .scalar(4, |r: &Rich| &r.name, |r: &mut Rich| &mut r.name)
                .scalar(5, |r: &Rich| &r.blob, |r: &mut Rich| &mut r.blob)
                .repeated(6, |r: &Rich| &r.tags, |r: &mut Rich| &mut r.tags)
                .map(7, |r: &Rich| &r.counts, |r: &mut Rich| &mut r.counts)
                .message(8, |r: &Rich| &r.inner, |r: &mut Rich| &mut r.inner)
                .oneof(
                    0,
                    OneofBinding {
                        which: shape_which,
                        get: shape_get,
                        set: shape_set,
                        clear: shape_clear,
                    },
                )
                .optional(11, |r: &Rich| &r.opt_flag, |r: &mut Rich| &mut r.opt_flag)
                .build()
        })
    }
}

/// Proto2 message with a required field.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct ReqMsg {
    pub id: Option<u64>,
}

impl_record!(ReqMsg);

impl StructRecord for ReqMsg {
    fn layout() -> &'static RecordLayout {
        static LAYOUT: OnceLock<RecordLayout> = OnceLock::new();
        LAYOUT.get_or_init(|| {
            let descriptor = MessageDescriptor::new("test.ReqMsg", Syntax::Proto2)
                .field(FieldDescriptor::scalar(1, "id", Kind::Uint64, Cardinality::Required));
            LayoutBuilder::new(descriptor)
                .optional(1, |m: &ReqMsg| &m.id, |m: &mut ReqMsg| &mut m.id)
                .build()
        })
    }
}

#[derive(Clone, Default, PartialEq, Debug)]
pub struct ReqWrapper {
    pub req: Option<Box<ReqMsg>>,
}

impl_record!(ReqWrapper);

impl StructRecord for ReqWrapper {
    fn layout() -> &'static RecordLayout {
        static LAYOUT: OnceLock<RecordLayout> = OnceLock::new();
        LAYOUT.get_or_init(|| {
            let descriptor = MessageDescriptor::new("test.ReqWrapper", Syntax::Proto2).field(
                FieldDescriptor::message(
                    1,
                    "req",
                    Cardinality::Singular,
                    MessageLink::of::<ReqMsg>(),
                ),
            );
            LayoutBuilder::new(descriptor)
                .message(1, |w: &ReqWrapper| &w.req, |w: &mut ReqWrapper| &mut w.req)
                .build()
        })
    }
}

/// Half of a mutually recursive pair with no required fields anywhere.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct NodeA {
    pub b: Option<Box<NodeB>>,
}

#[derive(Clone, Default, PartialEq, Debug)]
pub struct NodeB {
    pub a: Option<Box<NodeA>>,
}

impl_record!(NodeA);
impl_record!(NodeB);

impl StructRecord for NodeA {
    fn layout() -> &'static RecordLayout {
        static LAYOUT: OnceLock<RecordLayout> = OnceLock::new();
        LAYOUT.get_or_init(|| {
            let descriptor = MessageDescriptor::new("test.NodeA", Syntax::Proto3).field(
                FieldDescriptor::message(1, "b", Cardinality::Singular, MessageLink::of::<NodeB>()),
            );
            LayoutBuilder::new(descriptor)
                .message(1, |n: &NodeA| &n.b, |n: &mut NodeA| &mut n.b)
                .build()
        })
    }
}

impl StructRecord for NodeB {
    fn layout() -> &'static RecordLayout {
        static LAYOUT: OnceLock<RecordLayout> = OnceLock::new();
        LAYOUT.get_or_init(|| {
            let descriptor = MessageDescriptor::new("test.NodeB", Syntax::Proto3).field(
                FieldDescriptor::message(1, "a", Cardinality::Singular, MessageLink::of::<NodeA>()),
            );
            LayoutBuilder::new(descriptor)
                .message(1, |n: &NodeB| &n.a, |n: &mut NodeB| &mut n.a)
                .build()
        })
    }
}

/// Proto2 message carrying an extension range, extension storage and a
/// plain field for ordering checks.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct Holder {
    pub weight: Option<u32>,
    pub extensions: ExtensionStore,
    pub unknown: Vec<u8>,
}

impl_record!(Holder);

impl StructRecord for Holder {
    fn layout() -> &'static RecordLayout {
        static LAYOUT: OnceLock<RecordLayout> = OnceLock::new();
        LAYOUT.get_or_init(|| {
            let descriptor = MessageDescriptor::new("test.Holder", Syntax::Proto2)
                .field(FieldDescriptor::scalar(1, "weight", Kind::Uint32, Cardinality::Singular))
                .extension_range(10000, 20000);
            LayoutBuilder::new(descriptor)
                .optional(1, |h: &Holder| &h.weight, |h: &mut Holder| &mut h.weight)
                .extensions(|h: &Holder| &h.extensions, |h: &mut Holder| {
                    &mut h.extensions
                })
                .unknown_fields(|h: &Holder| &h.unknown, |h: &mut Holder| &mut h.unknown)
                .build()
        })
    }
}

pub static EXT_TAG: ExtensionDescriptor = ExtensionDescriptor {
    extendee: "test.Holder",
    name: "tag",
    number: 10000,
    kind: Kind::Uint32,
    cardinality: Cardinality::Singular,
    packed: false,
    default: None,
    message: None,
};

pub static EXT_NOTE: ExtensionDescriptor = ExtensionDescriptor {
    extendee: "test.Holder",
    name: "note",
    number: 10001,
    kind: Kind::String,
    cardinality: Cardinality::Singular,
    packed: false,
    default: None,
    message: None,
};

pub static EXT_SCORES: ExtensionDescriptor = ExtensionDescriptor {
    extendee: "test.Holder",
    name: "scores",
    number: 10002,
    kind: Kind::Uint64,
    cardinality: Cardinality::Repeated,
    packed: false,
    default: None,
    message: None,
};
