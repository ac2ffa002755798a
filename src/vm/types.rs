//! Runtime type identifiers
//!
//! Ids up to [`PRIMITIVE_MAX_ID`] name primitive types whose values are held
//! inline as raw bits; every id above it names an object type whose values are
//! reference counted. Ids at or above [`NUM_RESERVED`] are handed out to
//! module types, template instantiations and user-defined contracts/structs.

use serde::Serialize;

/// Numeric type identifier carried on instructions and runtime values
pub type TypeId = u16;

/// Reserved type ids
pub struct TypeIds;

impl TypeIds {
    pub const UNKNOWN: TypeId = 0;
    pub const NULL: TypeId = 1;
    pub const VOID: TypeId = 2;
    pub const BOOL: TypeId = 3;
    pub const INT8: TypeId = 4;
    pub const UINT8: TypeId = 5;
    pub const INT16: TypeId = 6;
    pub const UINT16: TypeId = 7;
    pub const INT32: TypeId = 8;
    pub const UINT32: TypeId = 9;
    pub const INT64: TypeId = 10;
    pub const UINT64: TypeId = 11;
    pub const FLOAT32: TypeId = 12;
    pub const FLOAT64: TypeId = 13;
    pub const FIXED32: TypeId = 14;
    pub const FIXED64: TypeId = 15;
    pub const FIXED128: TypeId = 16;
    pub const STRING: TypeId = 17;
    pub const ADDRESS: TypeId = 18;
}

/// Divider between primitive and object type ids
pub const PRIMITIVE_MAX_ID: TypeId = TypeIds::FIXED64;

/// First type id available to module and user-defined types
pub const NUM_RESERVED: TypeId = 19;

/// Names of the reserved types, indexed by id
pub const RESERVED_TYPE_NAMES: [&str; NUM_RESERVED as usize] = [
    "Unknown", "Null", "Void", "Bool", "Int8", "UInt8", "Int16", "UInt16", "Int32", "UInt32",
    "Int64", "UInt64", "Float32", "Float64", "Fixed32", "Fixed64", "Fixed128", "String",
    "Address",
];

/// Whether values of `type_id` are held inline
#[inline]
pub fn is_primitive(type_id: TypeId) -> bool {
    type_id <= PRIMITIVE_MAX_ID
}

/// Shape of a type as recorded in the executable's type-info table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeKind {
    Unknown,
    Primitive,
    Meta,
    Class,
    Template,
    Instantiation,
    UserDefinedInstantiation,
    UserDefinedContract,
    UserDefinedStruct,
}

/// Entry in the executable's type-info table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeInfo {
    pub kind: TypeKind,
    pub name: String,
    pub id: TypeId,
    pub template_type_id: TypeId,
    pub parameter_type_ids: Vec<TypeId>,
}

impl TypeInfo {
    pub fn new(
        kind: TypeKind,
        name: impl Into<String>,
        id: TypeId,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            id,
            template_type_id: TypeIds::UNKNOWN,
            parameter_type_ids: Vec::new(),
        }
    }
}
