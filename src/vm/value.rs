//! Tagged runtime values
//!
//! A [`Value`] pairs a type id with either raw primitive bits or a
//! reference-counted object. Whether it is an object is derived from the type
//! id alone, so the pair must always travel together. Object lifetime follows
//! `Rc`: copying a value shares the object, overwriting or dropping releases
//! it, and [`Value::take`] leaves the source in the neutral unknown state so
//! nothing is released twice.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use super::types::{is_primitive, TypeId, TypeIds};

/// Heap object manipulated by the interpreter
pub trait Object: fmt::Debug {
    /// Runtime type of this object
    fn object_type_id(&self) -> TypeId;

    fn as_any(&self) -> &dyn Any;

    /// Structural equality with another object of the same type
    fn is_equal(
        &self,
        _other: &dyn Object,
    ) -> bool {
        false
    }
}

/// Immutable string object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringObject {
    pub text: String,
}

impl Object for StringObject {
    fn object_type_id(&self) -> TypeId {
        TypeIds::STRING
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_equal(
        &self,
        other: &dyn Object,
    ) -> bool {
        other
            .as_any()
            .downcast_ref::<StringObject>()
            .is_some_and(|o| o.text == self.text)
    }
}

/// Tagged (type id, bits-or-reference) pair
#[derive(Clone, Default)]
pub struct Value {
    type_id: TypeId,
    bits: u64,
    object: Option<Rc<dyn Object>>,
}

impl Value {
    /// Primitive value from raw bits
    pub fn primitive(
        type_id: TypeId,
        bits: u64,
    ) -> Self {
        debug_assert!(is_primitive(type_id));
        Self {
            type_id,
            bits,
            object: None,
        }
    }

    /// Object-typed value; `None` is the typed null reference
    pub fn object(
        type_id: TypeId,
        object: Option<Rc<dyn Object>>,
    ) -> Self {
        debug_assert!(!is_primitive(type_id));
        Self {
            type_id,
            bits: 0,
            object,
        }
    }

    pub fn null(type_id: TypeId) -> Self {
        Self::object(type_id, None)
    }

    pub fn from_bool(b: bool) -> Self {
        Self::primitive(TypeIds::BOOL, u64::from(b))
    }

    pub fn from_i32(v: i32) -> Self {
        Self::primitive(TypeIds::INT32, v as i64 as u64)
    }

    pub fn from_i64(v: i64) -> Self {
        Self::primitive(TypeIds::INT64, v as u64)
    }

    pub fn from_f64(v: f64) -> Self {
        Self::primitive(TypeIds::FLOAT64, v.to_bits())
    }

    pub fn from_string(text: impl Into<String>) -> Self {
        Self::object(
            TypeIds::STRING,
            Some(Rc::new(StringObject { text: text.into() })),
        )
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline]
    pub fn bits(&self) -> u64 {
        self.bits
    }

    /// Whether the type id lies above the primitive divider
    #[inline]
    pub fn is_object(&self) -> bool {
        !is_primitive(self.type_id)
    }

    #[inline]
    pub fn is_primitive(&self) -> bool {
        is_primitive(self.type_id)
    }

    /// A value reset by [`take`](Self::take) or never assigned
    #[inline]
    pub fn is_unknown(&self) -> bool {
        self.type_id == TypeIds::UNKNOWN
    }

    /// Object-typed value holding no reference
    pub fn is_null(&self) -> bool {
        self.is_object() && self.object.is_none()
    }

    pub fn as_object(&self) -> Option<&Rc<dyn Object>> {
        self.object.as_ref()
    }

    /// Number of values currently sharing the held object
    pub fn ref_count(&self) -> usize {
        self.object.as_ref().map_or(0, Rc::strong_count)
    }

    /// Move out, leaving this value unknown and empty
    pub fn take(&mut self) -> Value {
        std::mem::take(self)
    }

    /// Overwrite, releasing whatever was held before
    pub fn assign(
        &mut self,
        other: Value,
    ) {
        *self = other;
    }

    /// Release the held object and reset to unknown
    pub fn reset(&mut self) {
        drop(self.take());
    }
}

impl fmt::Debug for Value {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if self.is_object() {
            f.debug_struct("Value")
                .field("type_id", &self.type_id)
                .field("object", &self.object)
                .finish()
        } else {
            f.debug_struct("Value")
                .field("type_id", &self.type_id)
                .field("bits", &self.bits)
                .finish()
        }
    }
}

impl PartialEq for Value {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        if self.type_id != other.type_id {
            return false;
        }
        if self.is_primitive() {
            return self.bits == other.bits;
        }
        match (&self.object, &other.object) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b) || a.is_equal(b.as_ref()),
            _ => false,
        }
    }
}
