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

use tests::{Grouped, Inner, PackedInts, Rich, Sample, Shape};

use tagwire::{marshal, unmarshal};

fn rich_sample() -> Rich {
    let mut rich = Rich {
        id: 99,
        temp: -40,
        ratio: 0.25,
        name: "sensor".into(),
        blob: vec![0, 1, 2, 255],
        tags: vec!["a".into(), "b".into()],
        inner: Some(Box::new(Inner { x: 7 })),
        shape: Some(Shape::Label("hex".into())),
        opt_flag: Some(false),
        ..Rich::default()
    };
    rich.counts.insert(-1, 10);
    rich.counts.insert(3, 30);
    rich
}

#[test]
fn rich_round_trip() {
    let rich = rich_sample();
    let bytes = marshal(&rich).unwrap();
    let back: Rich = unmarshal(&bytes).unwrap();
    assert_eq!(back, rich);
}

#[test]
fn oneof_round_trip_keeps_only_the_active_member() {
    let mut rich = Rich::default();
    rich.shape = Some(Shape::Circle(12));
    let back: Rich = unmarshal(&marshal(&rich).unwrap()).unwrap();
    assert_eq!(back.shape, Some(Shape::Circle(12)));

    rich.shape = Some(Shape::Label("last".into()));
    let back: Rich = unmarshal(&marshal(&rich).unwrap()).unwrap();
    assert_eq!(back.shape, Some(Shape::Label("last".into())));
}

#[test]
fn explicit_presence_survives_the_wire() {
    let mut rich = Rich::default();
    rich.opt_flag = Some(false);
    let bytes = marshal(&rich).unwrap();
    assert_eq!(bytes, vec![0x58, 0x00]);
    let back: Rich = unmarshal(&bytes).unwrap();
    assert_eq!(back.opt_flag, Some(false));

    rich.opt_flag = None;
    assert!(marshal(&rich).unwrap().is_empty());
}

#[test]
fn unknown_fields_are_preserved_and_reemitted_last() {
    // Field 99 (varint 5) ahead of a known field.
    let input = vec![0x98, 0x06, 0x05, 0x08, 0x01];
    let sample: Sample = unmarshal(&input).unwrap();
    assert!(sample.flag);
    assert_eq!(sample.unknown, vec![0x98, 0x06, 0x05]);
    // Known fields first, then the unknown bytes verbatim.
    assert_eq!(marshal(&sample).unwrap(), vec![0x08, 0x01, 0x98, 0x06, 0x05]);
}

#[test]
fn unpacked_field_accepts_packed_wire_data() {
    let input = vec![0x12, 0x02, 0x07, 0x08];
    let sample: Sample = unmarshal(&input).unwrap();
    assert_eq!(sample.nums, vec![7, 8]);
}

#[test]
fn packed_field_accepts_unpacked_wire_data() {
    let input = vec![0x08, 0x07, 0x08, 0xAC, 0x02];
    let ints: PackedInts = unmarshal(&input).unwrap();
    assert_eq!(ints.values, vec![7, 300]);
}

#[test]
fn singular_values_overwrite_and_lists_append_across_merges() {
    // Two concatenated images merge like one.
    let first = marshal(&Sample {
        flag: true,
        nums: vec![1],
        ..Sample::default()
    })
    .unwrap();
    let second = marshal(&Sample {
        nums: vec![2],
        ..Sample::default()
    })
    .unwrap();
    let joined = [first, second].concat();
    let merged: Sample = unmarshal(&joined).unwrap();
    assert!(merged.flag);
    assert_eq!(merged.nums, vec![1, 2]);
}

#[test]
fn nested_group_round_trip() {
    let grouped = Grouped {
        g: Some(Box::new(Inner { x: u64::MAX })),
    };
    let back: Grouped = unmarshal(&marshal(&grouped).unwrap()).unwrap();
    assert_eq!(back, grouped);
}

#[test]
fn truncated_image_fails() {
    let mut bytes = marshal(&rich_sample()).unwrap();
    bytes.pop();
    assert!(unmarshal::<Rich>(&bytes).is_err());
}
