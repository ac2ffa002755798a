//! Module bindings seen by the generator
//!
//! The generator never hard-codes system types or library functions; it asks
//! a [`Bindings`] implementation for the type id of every non user-defined
//! type and for the opcode of every opcode-invoked function.

use std::collections::HashMap;

use super::opcode::Opcode;
use super::types::{is_primitive, TypeId, TypeInfo, TypeKind, RESERVED_TYPE_NAMES};

/// Lookup interface onto the registered module
pub trait Bindings {
    /// Type id of a system or module type, by canonical name (`Array<Int32>`)
    fn type_id(
        &self,
        name: &str,
    ) -> Option<TypeId>;

    /// Opcode of a module-bound function, by unique name
    fn opcode(
        &self,
        unique_name: &str,
    ) -> Option<u16>;

    /// Number of type ids already claimed by the module
    fn num_types(&self) -> u16;
}

/// Registry of the reserved types plus whatever a host module adds
#[derive(Debug, Clone)]
pub struct BuiltinBindings {
    types: HashMap<String, TypeId>,
    type_infos: Vec<TypeInfo>,
    opcodes: HashMap<String, u16>,
    next_opcode: u16,
}

impl Default for BuiltinBindings {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinBindings {
    pub fn new() -> Self {
        let mut bindings = Self {
            types: HashMap::new(),
            type_infos: Vec::new(),
            opcodes: HashMap::new(),
            next_opcode: Opcode::NumReserved.code(),
        };
        for (id, name) in RESERVED_TYPE_NAMES.iter().enumerate() {
            let id = id as TypeId;
            let kind = if is_primitive(id) {
                TypeKind::Primitive
            } else {
                TypeKind::Class
            };
            bindings.types.insert((*name).to_string(), id);
            bindings.type_infos.push(TypeInfo::new(kind, *name, id));
        }
        bindings
    }

    /// Register a module type (class, template or instantiation), returning its id
    pub fn register_type(
        &mut self,
        kind: TypeKind,
        name: impl Into<String>,
    ) -> TypeId {
        let name = name.into();
        if let Some(id) = self.types.get(&name) {
            return *id;
        }
        let id = self.type_infos.len() as TypeId;
        self.types.insert(name.clone(), id);
        self.type_infos.push(TypeInfo::new(kind, name, id));
        id
    }

    /// Register a module-bound function, returning its opcode
    pub fn register_function(
        &mut self,
        unique_name: impl Into<String>,
    ) -> u16 {
        let opcode = self.next_opcode;
        self.opcodes.insert(unique_name.into(), opcode);
        self.next_opcode += 1;
        opcode
    }

    pub fn type_infos(&self) -> &[TypeInfo] {
        &self.type_infos
    }
}

impl Bindings for BuiltinBindings {
    fn type_id(
        &self,
        name: &str,
    ) -> Option<TypeId> {
        self.types.get(name).copied()
    }

    fn opcode(
        &self,
        unique_name: &str,
    ) -> Option<u16> {
        self.opcodes.get(unique_name).copied()
    }

    fn num_types(&self) -> u16 {
        self.type_infos.len() as u16
    }
}
