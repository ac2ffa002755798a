//! Tagged value tests

use std::rc::Rc;

use crate::vm::types::{TypeIds, PRIMITIVE_MAX_ID};
use crate::vm::value::{Object, StringObject, Value};

#[test]
fn test_object_flag_derived_from_type_id() {
    assert!(!Value::from_i32(7).is_object());
    assert!(!Value::primitive(PRIMITIVE_MAX_ID, 0).is_object());
    assert!(Value::from_string("x").is_object());
    assert!(Value::null(TypeIds::STRING).is_object());
}

#[test]
fn test_copy_shares_object() {
    let a = Value::from_string("etch");
    let b = a.clone();
    assert_eq!(a.ref_count(), 2);
    drop(b);
    assert_eq!(a.ref_count(), 1);
}

#[test]
fn test_take_resets_source() {
    let mut a = Value::from_string("etch");
    let b = a.take();
    assert!(a.is_unknown());
    assert!(a.as_object().is_none());
    assert_eq!(b.ref_count(), 1);
    assert_eq!(b.type_id(), TypeIds::STRING);
}

#[test]
fn test_assign_releases_previous_object() {
    let shared: Rc<dyn Object> = Rc::new(StringObject {
        text: "old".to_string(),
    });
    let mut slot = Value::object(TypeIds::STRING, Some(shared.clone()));
    assert_eq!(Rc::strong_count(&shared), 2);
    slot.assign(Value::from_i64(3));
    assert_eq!(Rc::strong_count(&shared), 1);
    assert_eq!(slot.type_id(), TypeIds::INT64);
}

#[test]
fn test_reset_releases_object() {
    let mut a = Value::from_string("etch");
    let b = a.clone();
    a.reset();
    assert_eq!(b.ref_count(), 1);
    assert!(a.is_unknown());
}

#[test]
fn test_equality() {
    assert_eq!(Value::from_i32(1), Value::from_i32(1));
    assert_ne!(Value::from_i32(1), Value::from_i64(1));
    assert_eq!(Value::from_string("a"), Value::from_string("a"));
    assert_ne!(Value::from_string("a"), Value::from_string("b"));
    assert_eq!(Value::null(TypeIds::STRING), Value::null(TypeIds::STRING));
    assert!(Value::null(TypeIds::STRING).is_null());
}
