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

use tests::{Inner, Rich, Shape, SHAPE_CIRCLE, SHAPE_LABEL};

use tagwire::{Error, MessageMut, MessageRef, Value};

#[test]
fn has_follows_presence_discipline() {
    let mut rich = Rich::default();
    let view = MessageRef::new(&rich);
    assert!(!view.has(1).unwrap());
    assert!(!view.has(8).unwrap());
    assert!(!view.has(11).unwrap());

    rich.id = 1;
    rich.inner = Some(Box::new(Inner::default()));
    rich.opt_flag = Some(false);
    let view = MessageRef::new(&rich);
    assert!(view.has(1).unwrap());
    assert!(view.has(8).unwrap());
    // Explicit presence: Some(false) counts.
    assert!(view.has(11).unwrap());
}

#[test]
fn get_returns_the_default_for_absent_fields() {
    let rich = Rich::default();
    let view = MessageRef::new(&rich);
    assert_eq!(view.get(1).unwrap(), Value::U64(0));
    assert_eq!(view.get(4).unwrap(), Value::Str(String::new()));
    assert_eq!(view.get(6).unwrap(), Value::List(Vec::new()));
    assert_eq!(view.get(7).unwrap(), Value::Map(Vec::new()));
    // Absent message fields yield a fresh default instance.
    assert_eq!(
        view.get(8).unwrap(),
        Value::Message(Box::new(Inner::default()))
    );
}

#[test]
fn set_and_clear_through_the_facade() {
    let mut rich = Rich::default();
    let mut view = MessageMut::new(&mut rich);
    view.set(1, Value::U64(42)).unwrap();
    view.set(4, Value::Str("edge".into())).unwrap();
    drop(view);
    assert_eq!(rich.id, 42);
    assert_eq!(rich.name, "edge");

    let mut view = MessageMut::new(&mut rich);
    view.clear(1).unwrap();
    drop(view);
    assert_eq!(rich.id, 0);
}

#[test]
fn oneof_reflection() {
    let mut rich = Rich::default();
    assert_eq!(MessageRef::new(&rich).which_oneof("shape"), None);

    MessageMut::new(&mut rich)
        .set(SHAPE_CIRCLE, Value::U32(4))
        .unwrap();
    assert_eq!(rich.shape, Some(Shape::Circle(4)));
    let view = MessageRef::new(&rich);
    assert_eq!(view.which_oneof("shape"), Some(SHAPE_CIRCLE));
    assert!(view.has(SHAPE_CIRCLE).unwrap());
    assert!(!view.has(SHAPE_LABEL).unwrap());

    // Setting the other member replaces the union.
    MessageMut::new(&mut rich)
        .set(SHAPE_LABEL, Value::Str("l".into()))
        .unwrap();
    assert_eq!(rich.shape, Some(Shape::Label("l".into())));

    // Clearing the inactive member leaves the union untouched.
    MessageMut::new(&mut rich).clear(SHAPE_CIRCLE).unwrap();
    assert_eq!(rich.shape, Some(Shape::Label("l".into())));
    MessageMut::new(&mut rich).clear(SHAPE_LABEL).unwrap();
    assert_eq!(rich.shape, None);
}

#[test]
fn range_visits_populated_fields_in_ascending_order() {
    let mut rich = Rich {
        id: 1,
        name: "n".into(),
        shape: Some(Shape::Circle(2)),
        ..Rich::default()
    };
    rich.tags.push("t".into());

    let mut seen = Vec::new();
    MessageRef::new(&rich).range(|number, _| {
        seen.push(number);
        true
    });
    assert_eq!(seen, vec![1, 4, 6, SHAPE_CIRCLE]);

    // Early exit on `false`.
    let mut seen = Vec::new();
    MessageRef::new(&rich).range(|number, _| {
        seen.push(number);
        false
    });
    assert_eq!(seen, vec![1]);
}

#[test]
fn undeclared_numbers_are_rejected() {
    let mut rich = Rich::default();
    assert!(matches!(
        MessageRef::new(&rich).get(999),
        Err(Error::UnknownField(999))
    ));
    assert!(matches!(
        MessageMut::new(&mut rich).set(999, Value::U64(0)),
        Err(Error::UnknownField(999))
    ));
    assert!(matches!(
        MessageMut::new(&mut rich).clear(999),
        Err(Error::UnknownField(999))
    ));
}
