//! Resolved entities attached to the syntax tree by semantic analysis
//!
//! Entities are shared by identity: every tree node that refers to the same
//! variable holds a clone of the same `Rc`. Later stages rely on that identity,
//! so entities are never compared by value.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::vm::TypeKind;

pub type TypeRef = Rc<Type>;
pub type VariableRef = Rc<Variable>;
pub type FunctionRef = Rc<Function>;

/// Variable storage class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Parameter,
    Local,
    Member,
}

/// How a resolved function is invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// Module-bound free function, invoked by opcode
    FreeFunction,
    /// Module-bound constructor, invoked by opcode
    Constructor,
    /// Module-bound static member function, invoked by opcode
    StaticMemberFunction,
    /// Module-bound member function, invoked by opcode
    MemberFunction,
    UserDefinedFreeFunction,
    UserDefinedContractFunction,
    UserDefinedConstructor,
    UserDefinedMemberFunction,
}

impl FunctionKind {
    /// Whether the function body is compiled from source
    pub fn is_user_defined(&self) -> bool {
        matches!(
            self,
            FunctionKind::UserDefinedFreeFunction
                | FunctionKind::UserDefinedContractFunction
                | FunctionKind::UserDefinedConstructor
                | FunctionKind::UserDefinedMemberFunction
        )
    }
}

/// Resolved type
#[derive(Debug)]
pub struct Type {
    pub kind: TypeKind,
    /// Canonical spelling, e.g. `Map<String,Int32>`
    pub name: String,
    /// Template this type instantiates
    pub template_type: Option<TypeRef>,
    /// Template arguments of an instantiation
    pub parameter_types: Vec<TypeRef>,
}

impl Type {
    pub fn new(
        kind: TypeKind,
        name: impl Into<String>,
    ) -> TypeRef {
        Rc::new(Self {
            kind,
            name: name.into(),
            template_type: None,
            parameter_types: Vec::new(),
        })
    }

    pub fn instantiation(
        kind: TypeKind,
        template_type: &TypeRef,
        parameter_types: Vec<TypeRef>,
    ) -> TypeRef {
        let args: Vec<&str> = parameter_types.iter().map(|t| t.name.as_str()).collect();
        Rc::new(Self {
            kind,
            name: format!("{}<{}>", template_type.name, args.join(",")),
            template_type: Some(Rc::clone(template_type)),
            parameter_types,
        })
    }

    pub fn is_primitive(&self) -> bool {
        self.kind == TypeKind::Primitive
    }

    pub fn is_void(&self) -> bool {
        self.name == "Void"
    }
}

impl fmt::Display for Type {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Resolved variable
#[derive(Debug)]
pub struct Variable {
    pub kind: VariableKind,
    pub name: String,
    pub ty: TypeRef,
    /// Set once any expression reads or writes the variable
    pub referenced: Cell<bool>,
}

impl Variable {
    pub fn new(
        kind: VariableKind,
        name: impl Into<String>,
        ty: &TypeRef,
    ) -> VariableRef {
        Rc::new(Self {
            kind,
            name: name.into(),
            ty: Rc::clone(ty),
            referenced: Cell::new(false),
        })
    }
}

/// Resolved function
#[derive(Debug)]
pub struct Function {
    pub kind: FunctionKind,
    pub name: String,
    /// Overload-unique name, e.g. `print(String)`
    pub unique_name: String,
    pub parameter_types: Vec<TypeRef>,
    pub parameter_variables: Vec<VariableRef>,
    pub return_type: TypeRef,
}

impl Function {
    pub fn new(
        kind: FunctionKind,
        name: impl Into<String>,
        parameter_variables: Vec<VariableRef>,
        return_type: &TypeRef,
    ) -> FunctionRef {
        let name = name.into();
        let parameter_types: Vec<TypeRef> = parameter_variables
            .iter()
            .map(|v| Rc::clone(&v.ty))
            .collect();
        Rc::new(Self {
            kind,
            unique_name: unique_name(&name, &parameter_types),
            name,
            parameter_types,
            parameter_variables,
            return_type: Rc::clone(return_type),
        })
    }

    /// Function known only by signature (module-bound or contract prototype)
    pub fn prototype(
        kind: FunctionKind,
        name: impl Into<String>,
        parameter_types: Vec<TypeRef>,
        return_type: &TypeRef,
    ) -> FunctionRef {
        let name = name.into();
        Rc::new(Self {
            kind,
            unique_name: unique_name(&name, &parameter_types),
            name,
            parameter_types,
            parameter_variables: Vec::new(),
            return_type: Rc::clone(return_type),
        })
    }
}

/// `name(T1,T2)`
pub fn unique_name(
    name: &str,
    parameter_types: &[TypeRef],
) -> String {
    let params: Vec<&str> = parameter_types.iter().map(|t| t.name.as_str()).collect();
    format!("{}({})", name, params.join(","))
}
