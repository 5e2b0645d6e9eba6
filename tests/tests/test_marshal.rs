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

//! Exact wire-byte checks against hand-assembled protobuf images.

use tests::{Floaty, Grouped, Inner, PackedInts, Sample};

use tagwire::{marshal, EncodeOptions, MessageMut, StructRecord, Value};

#[test]
fn zero_message_is_empty() {
    assert_eq!(marshal(&Sample::default()).unwrap(), Vec::<u8>::new());
}

#[test]
fn false_bool_is_elided() {
    let sample = Sample {
        flag: false,
        ..Sample::default()
    };
    assert!(marshal(&sample).unwrap().is_empty());

    let sample = Sample {
        flag: true,
        ..Sample::default()
    };
    assert_eq!(marshal(&sample).unwrap(), vec![0x08, 0x01]);
}

#[test]
fn unpacked_int32_negative_sign_extends() {
    let sample = Sample {
        nums: vec![7, -7],
        ..Sample::default()
    };
    // Field 2, varint: 7 is one byte, -7 sign-extends to the full ten.
    assert_eq!(
        marshal(&sample).unwrap(),
        vec![
            0x10, 0x07, //
            0x10, 0xF9, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01,
        ]
    );
}

#[test]
fn map_entry_framing() {
    let mut sample = Sample::default();
    sample.labels.insert("a".into(), "b".into());
    // Field 3 entry: key = 1, value = 2, both length-delimited strings.
    assert_eq!(
        marshal(&sample).unwrap(),
        vec![0x1A, 0x06, 0x0A, 0x01, 0x61, 0x12, 0x01, 0x62]
    );
}

#[test]
fn map_zero_key_and_value_are_elided_inside_the_entry() {
    let mut sample = Sample::default();
    sample.labels.insert(String::new(), String::new());
    // The entry itself survives with an empty body.
    assert_eq!(marshal(&sample).unwrap(), vec![0x1A, 0x00]);
}

#[test]
fn negative_zero_float_is_present() {
    let floaty = Floaty {
        single: -0.0,
        double: 0.0,
    };
    assert_eq!(marshal(&floaty).unwrap(), vec![0x0D, 0x00, 0x00, 0x00, 0x80]);

    let floaty = Floaty {
        single: 0.0,
        double: -0.0,
    };
    assert_eq!(
        marshal(&floaty).unwrap(),
        vec![0x11, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x80]
    );
}

#[test]
fn packed_uint32_framing() {
    let ints = PackedInts {
        values: vec![1, 2, 300],
    };
    assert_eq!(
        marshal(&ints).unwrap(),
        vec![0x0A, 0x04, 0x01, 0x02, 0xAC, 0x02]
    );
    assert!(marshal(&PackedInts::default()).unwrap().is_empty());
}

#[test]
fn empty_group_emits_both_delimiters() {
    let grouped = Grouped {
        g: Some(Box::new(Inner::default())),
    };
    assert_eq!(marshal(&grouped).unwrap(), vec![0x0B, 0x0C]);

    let grouped = Grouped {
        g: Some(Box::new(Inner { x: 5 })),
    };
    assert_eq!(marshal(&grouped).unwrap(), vec![0x0B, 0x08, 0x05, 0x0C]);
}

#[test]
fn size_cache_reuse_and_invalidation() {
    let info = Sample::layout().message_info();
    let cached = EncodeOptions {
        use_cached_size: true,
        ..EncodeOptions::default()
    };

    let mut sample = Sample {
        nums: vec![1, 2, 3],
        ..Sample::default()
    };
    assert_eq!(sample.cache.get(), None);

    let size = info.size(&sample, &cached);
    assert_eq!(size, marshal(&sample).unwrap().len());
    assert_eq!(sample.cache.get(), Some(size));

    // The flag means trust the slot; without it the slot is ignored.
    sample.cache.store(999);
    assert_eq!(info.size(&sample, &cached), 999);
    assert_eq!(info.size(&sample, &EncodeOptions::default()), size);

    // Facade mutation drops the cached size.
    sample.cache.store(999);
    MessageMut::new(&mut sample)
        .set(1, Value::Bool(true))
        .unwrap();
    assert_eq!(sample.cache.get(), None);
    let resized = info.size(&sample, &cached);
    assert_eq!(resized, marshal(&sample).unwrap().len());
}

#[test]
fn marshal_is_idempotent() {
    let mut sample = Sample::default();
    sample.nums.push(1);
    let first = marshal(&sample).unwrap();
    let second = marshal(&sample).unwrap();
    assert_eq!(first, second);
}
