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

use std::thread;

use tests::{Holder, EXT_NOTE, EXT_SCORES, EXT_TAG};

use tagwire::{
    marshal, unmarshal_with, EncodeOptions, Error, MessageMut, MessageRef, Registry, StructRecord,
    Value, WireType,
};
use tagwire_core::buffer::Writer;
use tagwire_core::types::make_tag;

fn registry() -> Registry {
    let reg = Registry::new();
    reg.register_extension(&EXT_TAG);
    reg.register_extension(&EXT_NOTE);
    reg.register_extension(&EXT_SCORES);
    reg
}

#[test]
fn set_get_clear_through_the_facade() {
    let reg = registry();
    let mut holder = Holder::default();
    let mut view = MessageMut::with_registry(&mut holder, &reg);
    view.set(EXT_TAG.number, Value::U32(7)).unwrap();
    view.set(EXT_NOTE.number, Value::Str("hi".into())).unwrap();
    drop(view);

    let view = MessageRef::with_registry(&holder, &reg);
    assert!(view.has(EXT_TAG.number).unwrap());
    assert_eq!(view.get(EXT_TAG.number).unwrap(), Value::U32(7));
    assert_eq!(view.get(EXT_NOTE.number).unwrap(), Value::Str("hi".into()));
    // In range but absent: the descriptor's default.
    assert!(!view.has(EXT_SCORES.number).unwrap());
    assert_eq!(view.get(EXT_SCORES.number).unwrap(), Value::List(Vec::new()));

    MessageMut::with_registry(&mut holder, &reg)
        .clear(EXT_NOTE.number)
        .unwrap();
    assert_eq!(holder.extensions.len(), 1);
    assert!(holder.extensions.has(EXT_TAG.number));
}

#[test]
fn extensions_marshal_before_ordinary_fields() {
    let reg = registry();
    let mut holder = Holder {
        weight: Some(3),
        ..Holder::default()
    };
    MessageMut::with_registry(&mut holder, &reg)
        .set(EXT_TAG.number, Value::U32(9))
        .unwrap();

    let mut expected = Writer::default();
    expected.write_tag(make_tag(EXT_TAG.number, WireType::Varint));
    expected.write_varuint64(9);
    expected.write_u8(0x08);
    expected.write_varuint64(3);
    assert_eq!(marshal(&holder).unwrap(), expected.into_vec());
}

#[test]
fn decoded_extensions_stay_lazy_until_read() {
    let reg = registry();
    let mut image = Writer::default();
    image.write_tag(make_tag(EXT_TAG.number, WireType::Varint));
    image.write_varuint64(9);
    let image = image.into_vec();

    let holder: Holder = unmarshal_with(&image, &reg).unwrap();
    assert!(holder.extensions.has(EXT_TAG.number));
    // Unforced bytes re-emit verbatim.
    assert_eq!(marshal(&holder).unwrap(), image);
    // Forcing yields the typed value.
    assert_eq!(holder.extensions.get(EXT_TAG.number), Some(&Value::U32(9)));
}

#[test]
fn concurrent_readers_observe_one_forced_value() {
    let reg = registry();
    let mut image = Writer::default();
    image.write_tag(make_tag(EXT_NOTE.number, WireType::LengthDelimited));
    image.write_varuint64(4);
    image.write_bytes(b"once");
    let holder: Holder = unmarshal_with(&image.into_vec(), &reg).unwrap();

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                assert_eq!(
                    holder.extensions.get(EXT_NOTE.number),
                    Some(&Value::Str("once".into()))
                );
            });
        }
    });
}

#[test]
fn repeated_extension_occurrences_accumulate() {
    let reg = registry();
    let mut image = Writer::default();
    for v in [1u64, 2] {
        image.write_tag(make_tag(EXT_SCORES.number, WireType::Varint));
        image.write_varuint64(v);
    }
    let holder: Holder = unmarshal_with(&image.into_vec(), &reg).unwrap();
    assert_eq!(
        holder.extensions.get(EXT_SCORES.number),
        Some(&Value::List(vec![Value::U64(1), Value::U64(2)]))
    );
}

#[test]
fn clearing_a_repeated_extension_leaves_an_empty_list() {
    let reg = registry();
    let mut holder = Holder::default();
    holder
        .extensions
        .set(&EXT_SCORES, Value::List(vec![Value::U64(1)]));
    MessageMut::with_registry(&mut holder, &reg)
        .clear(EXT_SCORES.number)
        .unwrap();
    assert!(holder.extensions.has(EXT_SCORES.number));
    assert_eq!(
        holder.extensions.get(EXT_SCORES.number),
        Some(&Value::List(Vec::new()))
    );
}

#[test]
fn invalid_string_bytes_marshal_in_full_and_report_afterwards() {
    let mut holder = Holder {
        weight: Some(1),
        ..Holder::default()
    };
    // The owned plane can carry unvalidated text for a string-kind field.
    holder.extensions.set(&EXT_NOTE, Value::Bytes(vec![0xFF, 0xFE]));

    let mut writer = Writer::default();
    let result = Holder::layout()
        .message_info()
        .marshal_append(&mut writer, &holder, &EncodeOptions::default());
    assert!(matches!(result, Err(Error::InvalidUtf8(_))));

    // The full image was still written, invalid payload included, and the
    // fields after the failing one are intact.
    let mut expected = Writer::default();
    expected.write_tag(make_tag(EXT_NOTE.number, WireType::LengthDelimited));
    expected.write_varuint64(2);
    expected.write_bytes(&[0xFF, 0xFE]);
    expected.write_u8(0x08);
    expected.write_varuint64(1);
    assert_eq!(writer.as_slice(), expected.as_slice());
}

#[test]
fn unregistered_in_range_numbers_decode_as_unknown_fields() {
    let reg = Registry::new();
    let mut image = Writer::default();
    image.write_tag(make_tag(EXT_TAG.number, WireType::Varint));
    image.write_varuint64(9);
    let image = image.into_vec();

    let holder: Holder = unmarshal_with(&image, &reg).unwrap();
    assert!(holder.extensions.is_empty());
    assert_eq!(holder.unknown, image);
}

#[test]
#[should_panic(expected = "registered twice")]
fn double_registration_panics() {
    let reg = Registry::new();
    reg.register_extension(&EXT_TAG);
    reg.register_extension(&EXT_TAG);
}
