use crate::metadata::token::Token;

/// Size and lower bound of one array dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArrayDimension {
    /// Amount of elements in this dimension, if declared
    pub size: Option<u32>,
    /// Lower bound of this dimension, if declared
    pub lower_bound: Option<u32>,
}

/// Represents a parsed type in various signatures
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TypeSignature {
    #[default]
    /// Not defined
    Unknown,
    /// void
    Void,
    /// bool
    Boolean,
    /// char
    Char,
    /// signed 8bit integer
    I1,
    /// unsigned 8bit integer
    U1,
    /// signed 16bit integer
    I2,
    /// unsigned 16bit integer
    U2,
    /// signed 32bit integer
    I4,
    /// unsigned 32bit integer
    U4,
    /// signed 64bit integer
    I8,
    /// unsigned 64bit integer
    U8,
    /// 32bit floating-point
    R4,
    /// 64bit floating-point
    R8,
    /// System.String
    String,
    /// A pointer to a type, with custom modifiers
    Ptr(Vec<Token>, Box<TypeSignature>),
    /// Type passed by reference
    ByRef(Box<TypeSignature>),
    /// Value type, `TypeDefOrRef` encoded
    ValueType(Token),
    /// Class, `TypeDefOrRef` encoded
    Class(Token),
    /// Generic type parameter, index into the owner's generic parameters
    GenericParamType(u32),
    /// Multi-dimensional array
    Array(SignatureArray),
    /// Generic type instantiation: the open type and its arguments
    GenericInst(Box<TypeSignature>, Vec<TypeSignature>),
    /// System.TypedReference
    TypedByRef,
    /// signed integer, sized to the executing platform
    I,
    /// unsigned integer, sized to the executing platform
    U,
    /// Function pointer with a full method signature
    FnPtr(Box<SignatureMethod>),
    /// System.Object
    Object,
    /// Single dimension array, with custom modifiers
    SzArray(Vec<Token>, Box<TypeSignature>),
    /// Generic method parameter, index into the method's generic parameters
    GenericParamMethod(u32),
    /// Required modifier tokens
    ModifiedRequired(Vec<Token>),
    /// Optional modifier tokens
    ModifiedOptional(Vec<Token>),
    /// Implemented within the CLI
    Internal,
    /// Sentinel for vararg method signatures
    Sentinel,
    /// A pinned type
    Pinned(Box<TypeSignature>),
}

/// A multi-dimensional array signature
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureArray {
    /// The element type
    pub base: Box<TypeSignature>,
    /// The number of dimensions
    pub rank: u32,
    /// The dimensions; can be fewer than `rank`, in order from dimension 0
    pub dimensions: Vec<ArrayDimension>,
}

/// Parameter (or return type) with optional custom modifiers
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureParameter {
    /// Custom modifiers of the parameter, `TypeDefOrRef` encoded
    pub modifiers: Vec<Token>,
    /// Parameter is passed by reference
    pub by_ref: bool,
    /// The type of the parameter
    pub base: TypeSignature,
}

/// Represents a method signature (II.23.2.1 - II.23.2.3)
#[derive(Debug, Clone, PartialEq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct SignatureMethod {
    /// Encodes the keyword `instance` in the calling convention, see §II.15.3
    pub has_this: bool,
    /// Encodes the keyword `explicit` in the calling convention, see §II.15.3
    pub explicit_this: bool,
    /// Default managed calling convention
    pub default: bool,
    /// Vararg calling convention
    pub vararg: bool,
    /// Native 'cdecl' calling convention
    pub cdecl: bool,
    /// Native 'stdcall' calling convention
    pub stdcall: bool,
    /// Native 'thiscall' calling convention
    pub thiscall: bool,
    /// Native 'fastcall' calling convention
    pub fastcall: bool,
    /// Amount of generic parameters, when the method is generic
    pub param_count_generic: u32,
    /// Amount of parameters
    pub param_count: u32,
    /// The return type
    pub return_type: SignatureParameter,
    /// The parameters
    pub params: Vec<SignatureParameter>,
    /// The vararg parameters following the sentinel
    pub varargs: Vec<SignatureParameter>,
}

/// Field signature (II.23.2.4)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureField {
    /// The custom modifiers for this field, `TypeDefOrRef` encoded
    pub modifiers: Vec<Token>,
    /// The field's type
    pub base: TypeSignature,
}

/// Property signature (II.23.2.5)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureProperty {
    /// Indicates the passing of a 'this' pointer
    pub has_this: bool,
    /// The custom modifiers for this property, `TypeDefOrRef` encoded
    pub modifiers: Vec<Token>,
    /// The property's type
    pub base: TypeSignature,
    /// The indexer parameters of this property
    pub params: Vec<SignatureParameter>,
}

/// Local variable signature (II.23.2.6)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureLocalVariables {
    /// The local variables
    pub locals: Vec<SignatureLocalVariable>,
}

/// Represents a local variable in a method body
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureLocalVariable {
    /// Custom modifiers
    pub modifiers: Vec<Token>,
    /// Is passed by reference
    pub is_byref: bool,
    /// This variable is pinned
    pub is_pinned: bool,
    /// The variable's type
    pub base: TypeSignature,
}

/// Type specification signature (II.23.2.14)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureTypeSpec {
    /// The specified type
    pub base: TypeSignature,
}

/// Represents a generic method instantiation (II.23.2.15)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureMethodSpec {
    /// Types of the generic arguments
    pub generic_args: Vec<TypeSignature>,
}
