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

use tests::{NodeA, NodeB, ReqMsg, ReqWrapper, Sample};

use tagwire::{marshal, unmarshal, Error, MessageRef, StructRecord};

#[test]
fn missing_required_field_is_reported_by_name() {
    let msg = ReqMsg::default();
    assert!(!MessageRef::new(&msg).is_initialized());
    match ReqMsg::layout().message_info().check_initialized(&msg) {
        Err(Error::RequiredNotSet(name)) => assert_eq!(name, "test.ReqMsg.id"),
        other => panic!("expected RequiredNotSet, got {other:?}"),
    }

    let msg = ReqMsg { id: Some(0) };
    assert!(MessageRef::new(&msg).is_initialized());
}

#[test]
fn the_check_is_transitive() {
    // An absent submessage is fine; a present one must itself be complete.
    let wrapper = ReqWrapper::default();
    assert!(MessageRef::new(&wrapper).is_initialized());

    let wrapper = ReqWrapper {
        req: Some(Box::new(ReqMsg::default())),
    };
    assert!(!MessageRef::new(&wrapper).is_initialized());

    let wrapper = ReqWrapper {
        req: Some(Box::new(ReqMsg { id: Some(1) })),
    };
    assert!(MessageRef::new(&wrapper).is_initialized());
}

#[test]
fn marshal_does_not_enforce_required_fields() {
    // Initialization checking is a separate operation; an incomplete
    // message still produces structurally valid bytes.
    let bytes = marshal(&ReqMsg::default()).unwrap();
    assert!(bytes.is_empty());
    let back: ReqMsg = unmarshal(&bytes).unwrap();
    assert!(!MessageRef::new(&back).is_initialized());
}

#[test]
fn recursive_types_without_required_fields_short_circuit() {
    assert!(!NodeA::layout().needs_init_check());
    assert!(!NodeB::layout().needs_init_check());
    assert!(!Sample::layout().needs_init_check());

    let node = NodeA {
        b: Some(Box::new(NodeB {
            a: Some(Box::new(NodeA::default())),
        })),
    };
    assert!(MessageRef::new(&node).is_initialized());
}

#[test]
fn required_types_do_need_the_check() {
    assert!(ReqMsg::layout().needs_init_check());
    assert!(ReqWrapper::layout().needs_init_check());
}
