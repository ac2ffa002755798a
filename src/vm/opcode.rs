//! Bytecode opcodes
//!
//! Opcodes are 16-bit. The reserved range `0..NumReserved` is fixed by the
//! compiler; everything at or above [`Opcode::NumReserved`] belongs to
//! module-bound functions (constructors, member functions, index getters and
//! setters) and is handed out by the bindings in registration order.
//!
//! Operand conventions (see [`Instruction`](super::executable::Instruction)):
//! - `index`: variable slot, jump destination, string/constant slot or function index
//! - `type_id`: result type
//! - `data`: other-operand type, scope number, arity or container type

use std::fmt;

macro_rules! opcodes {
    ($($(#[$meta:meta])* $name:ident = $value:expr,)*) => {
        /// Reserved bytecode operation
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u16)]
        pub enum Opcode {
            $($(#[$meta])* $name = $value,)*
        }

        impl Opcode {
            /// Every reserved opcode, in numeric order
            pub const ALL: &'static [Opcode] = &[$(Opcode::$name,)*];

            /// Mnemonic used in disassembly
            pub fn name(&self) -> &'static str {
                match self {
                    $(Opcode::$name => stringify!($name),)*
                }
            }
        }

        impl TryFrom<u16> for Opcode {
            type Error = u16;

            fn try_from(value: u16) -> Result<Self, Self::Error> {
                match value {
                    // The bound itself names no operation
                    v if v >= Opcode::NumReserved as u16 => Err(v),
                    $(v if v == $value => Ok(Opcode::$name),)*
                    other => Err(other),
                }
            }
        }
    };
}

opcodes! {
    /// Placeholder; never present in a finished executable
    Unknown = 0,
    /// Declare local `index` in scope `data` with the default value of `type_id`
    VariableDeclare = 1,
    /// Declare local `index` in scope `data` and pop its initial value
    VariableDeclareAssign = 2,
    /// Push a null reference of object type `type_id`
    PushNull = 3,
    PushFalse = 4,
    PushTrue = 5,
    /// Push string table entry `index`
    PushString = 6,
    /// Push constant table entry `index`
    PushConstant = 7,
    /// Push large (128-bit) constant table entry `index`
    PushLargeConstant = 8,
    /// Push local `index`
    PushVariable = 9,
    /// Pop into local `index`
    PopToVariable = 10,
    /// Increment top of stack in place
    Inc = 11,
    /// Decrement top of stack in place
    Dec = 12,
    /// Duplicate the top `data` values
    Duplicate = 13,
    /// Copy the top value below the `data` values beneath it
    DuplicateInsert = 14,
    /// Pop and drop the top value
    Discard = 15,
    /// Release every live object declared at scope `data` or deeper
    Destruct = 16,
    /// Leave the innermost loop: destruct scope `data`, jump to `index`
    Break = 17,
    /// Restart the innermost loop: destruct scope `data`, jump to `index`
    Continue = 18,
    /// Jump to `index`
    Jump = 19,
    /// Pop the condition, jump to `index` if false
    JumpIfFalse = 20,
    /// Pop the condition, jump to `index` if true
    JumpIfTrue = 21,
    Return = 22,
    ReturnValue = 23,
    /// Pop `data` range bounds and bind loop variable `index`
    ForRangeInit = 24,
    /// Advance the loop variable, jump to `index` once exhausted
    ForRangeIterate = 25,
    ForRangeTerminate = 26,
    /// Call user-defined function `index`
    InvokeUserDefinedFreeFunction = 27,
    VariablePrefixInc = 28,
    VariablePrefixDec = 29,
    VariablePostfixInc = 30,
    VariablePostfixDec = 31,
    /// Jump to `index` keeping the value if false, otherwise pop it
    JumpIfFalseOrPop = 32,
    /// Jump to `index` keeping the value if true, otherwise pop it
    JumpIfTrueOrPop = 33,
    Not = 34,
    PrimitiveEqual = 35,
    ObjectEqual = 36,
    PrimitiveNotEqual = 37,
    ObjectNotEqual = 38,
    PrimitiveLessThan = 39,
    ObjectLessThan = 40,
    PrimitiveLessThanOrEqual = 41,
    ObjectLessThanOrEqual = 42,
    PrimitiveGreaterThan = 43,
    ObjectGreaterThan = 44,
    PrimitiveGreaterThanOrEqual = 45,
    ObjectGreaterThanOrEqual = 46,
    PrimitiveNegate = 47,
    ObjectNegate = 48,
    PrimitiveAdd = 49,
    ObjectAdd = 50,
    /// Left operand differs from the result type; `data` is the right operand type
    ObjectLeftAdd = 51,
    /// Right operand differs from the result type; `data` is the left operand type
    ObjectRightAdd = 52,
    VariablePrimitiveInplaceAdd = 53,
    VariableObjectInplaceAdd = 54,
    VariableObjectInplaceRightAdd = 55,
    PrimitiveSubtract = 56,
    ObjectSubtract = 57,
    ObjectLeftSubtract = 58,
    ObjectRightSubtract = 59,
    VariablePrimitiveInplaceSubtract = 60,
    VariableObjectInplaceSubtract = 61,
    VariableObjectInplaceRightSubtract = 62,
    PrimitiveMultiply = 63,
    ObjectMultiply = 64,
    ObjectLeftMultiply = 65,
    ObjectRightMultiply = 66,
    VariablePrimitiveInplaceMultiply = 67,
    VariableObjectInplaceMultiply = 68,
    VariableObjectInplaceRightMultiply = 69,
    PrimitiveDivide = 70,
    ObjectDivide = 71,
    ObjectLeftDivide = 72,
    ObjectRightDivide = 73,
    VariablePrimitiveInplaceDivide = 74,
    VariableObjectInplaceDivide = 75,
    VariableObjectInplaceRightDivide = 76,
    PrimitiveModulo = 77,
    VariablePrimitiveInplaceModulo = 78,
    /// Pop `data` elements into a new array of type `type_id`
    InitialiseArray = 79,
    /// Bind local `index` (scope `data`) to a contract instance
    ContractVariableDeclareAssign = 80,
    /// Call contract function `index` on an instance of contract `data`
    InvokeContractFunction = 81,
    /// Pop a struct instance of type `data`, push member slot `index`
    PushMemberVariable = 82,
    /// Pop a value and a struct instance of type `data`, store into member slot `index`
    PopToMemberVariable = 83,
    /// Create a zeroed instance of user-defined struct `type_id`
    InvokeUserDefinedConstructor = 84,
    /// Call user-defined member function `index` on an instance of struct `data`
    InvokeUserDefinedMemberFunction = 85,
    /// First opcode available to module-bound functions
    NumReserved = 86,
}

impl Opcode {
    /// Raw 16-bit encoding
    #[inline]
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Whether `index` of this instruction is a jump destination
    pub fn is_jump(&self) -> bool {
        matches!(
            self,
            Opcode::Jump
                | Opcode::JumpIfFalse
                | Opcode::JumpIfTrue
                | Opcode::JumpIfFalseOrPop
                | Opcode::JumpIfTrueOrPop
                | Opcode::Break
                | Opcode::Continue
                | Opcode::ForRangeIterate
        )
    }

    /// Whether this opcode ends a function body
    pub fn is_return(&self) -> bool {
        matches!(self, Opcode::Return | Opcode::ReturnValue)
    }
}

impl From<Opcode> for u16 {
    fn from(opcode: Opcode) -> Self {
        opcode as u16
    }
}

impl fmt::Display for Opcode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Mnemonic for a raw opcode, module-bound opcodes render as `Module+N`
pub fn opcode_name(code: u16) -> String {
    match Opcode::try_from(code) {
        Ok(opcode) => opcode.name().to_string(),
        Err(code) => format!("Module+{}", code - Opcode::NumReserved.code()),
    }
}
