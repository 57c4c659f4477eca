//! Type-level entries of the source metadata graph: type definitions, type references and the
//! recursive type grammar used by signatures.

use std::sync::Arc;

use crate::metadata::{
    source::{
        attributes::{Attribute, SecurityDecl},
        members::{Event, Field, Method, Property},
    },
    token::Token,
};

/// The scope a type reference resolves against (ECMA-335 `ResolutionScope`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// The module currently being loaded (or a null scope, which the CLI treats the same way)
    CurrentModule,
    /// An external assembly, identified by its simple name
    AssemblyRef(String),
    /// Another module of the same assembly, identified by its name
    ModuleRef(String),
}

/// A reference to a type by name, corresponding to a `TypeRef` row.
///
/// The metadata name keeps the `` `n `` arity suffix for generic types; the loader splits it.
/// `is_value_type` is only meaningful when the reference was encountered inside a signature or
/// type specification, where the element type encoding distinguishes `valuetype` from `class`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    /// Resolution scope of the reference. For nested references the scope of the outermost
    /// declaring type applies.
    pub scope: Scope,
    /// Declaring type for nested references
    pub parent: Option<Arc<TypeRef>>,
    /// Namespace of the type; empty for nested references
    pub namespace: String,
    /// Short name including the generic arity suffix (e.g. `List`1`)
    pub name: String,
    /// Whether the signature encoded this reference as a value type
    pub is_value_type: bool,
}

impl TypeRef {
    /// Creates a top-level reference in the given scope
    #[must_use]
    pub fn new(scope: Scope, namespace: &str, name: &str) -> Self {
        TypeRef {
            scope,
            parent: None,
            namespace: namespace.to_string(),
            name: name.to_string(),
            is_value_type: false,
        }
    }

    /// Creates a reference nested inside `parent`
    #[must_use]
    pub fn nested(parent: Arc<TypeRef>, name: &str) -> Self {
        let scope = parent.scope.clone();
        TypeRef {
            scope,
            parent: Some(parent),
            namespace: String::new(),
            name: name.to_string(),
            is_value_type: false,
        }
    }

    /// Marks the reference as a value type (signature-encoded `valuetype`)
    #[must_use]
    pub fn value_type(mut self) -> Self {
        self.is_value_type = true;
        self
    }
}

/// A type as it appears in signatures and type positions of the metadata graph.
///
/// This is the small recursive language of ECMA-335 element types: primitives, compound
/// constructors (pointer, by-ref, array, generic instantiation), generic parameters, custom
/// modifiers, and references to type definitions or type references.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TypeSig {
    /// void
    #[default]
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
    /// signed integer, sized to executing platform
    I,
    /// unsigned integer, sized to executing platform
    U,
    /// System.String
    String,
    /// System.Object
    Object,
    /// A pointer to a type
    Ptr(Box<TypeSig>),
    /// Type passed by reference
    ByRef(Box<TypeSig>),
    /// Array with the given rank; rank 1 covers the `szarray` encoding
    Array {
        /// The element type of the array
        element: Box<TypeSig>,
        /// Number of dimensions
        rank: u32,
    },
    /// Generic instantiation of an open type
    GenericInst {
        /// The open generic type
        open: Box<TypeSig>,
        /// The type arguments, in declaration order
        args: Vec<TypeSig>,
    },
    /// Generic parameter of the enclosing type (`!n`)
    Var(u16),
    /// Generic parameter of the enclosing method (`!!n`)
    MVar(u16),
    /// Function pointer. The signature is not carried: the construct is unrepresentable in the
    /// unresolved model and is substituted with a native integer reference.
    FnPtr,
    /// Required custom modifier applied to an element type
    ModReq {
        /// The modifier type
        modifier: Arc<TypeRef>,
        /// The modified element type
        element: Box<TypeSig>,
    },
    /// Optional custom modifier applied to an element type
    ModOpt {
        /// The modifier type
        modifier: Arc<TypeRef>,
        /// The modified element type
        element: Box<TypeSig>,
    },
    /// A pinned local or field type
    Pinned(Box<TypeSig>),
    /// Sentinel marking the start of vararg arguments
    Sentinel,
    /// A type definition of the module being loaded
    Definition(Arc<TypeDef>),
    /// A type reference by name
    Named(Arc<TypeRef>),
}

impl TypeSig {
    /// Shorthand for a single-dimensional array of `element`
    #[must_use]
    pub fn sz_array(element: TypeSig) -> Self {
        TypeSig::Array {
            element: Box::new(element),
            rank: 1,
        }
    }

    /// Shorthand for a generic instantiation
    #[must_use]
    pub fn generic(open: TypeSig, args: Vec<TypeSig>) -> Self {
        TypeSig::GenericInst {
            open: Box::new(open),
            args,
        }
    }

    /// Whether the loader may trust `is_value_type` on named references inside this type.
    ///
    /// Compound types only occur in signatures and type specifications, where the element type
    /// encoding is authoritative; a bare name may come from a coded index where it is not.
    #[must_use]
    pub fn is_type_spec(&self) -> bool {
        !matches!(self, TypeSig::Named(_) | TypeSig::Definition(_))
    }
}

/// Layout information from the `ClassLayout` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassLayout {
    /// Field alignment in bytes; 0 means default
    pub packing_size: u16,
    /// Explicit size of the type in bytes; 0 means default
    pub class_size: u32,
}

/// An interface implementation entry, with the custom attributes attached to the
/// `InterfaceImpl` row (these can carry `Dynamic`/`TupleElementNames` markers for the
/// interface type).
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceImpl {
    /// The implemented interface
    pub interface: TypeSig,
    /// Custom attributes on the implementation row
    pub attributes: Vec<Attribute>,
}

impl InterfaceImpl {
    /// Creates an implementation entry without row attributes
    #[must_use]
    pub fn new(interface: TypeSig) -> Self {
        InterfaceImpl {
            interface,
            attributes: Vec::new(),
        }
    }
}

/// A constraint on a generic parameter, with the attributes of the
/// `GenericParamConstraint` row.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericConstraint {
    /// The constraint type
    pub constraint: TypeSig,
    /// Custom attributes on the constraint row
    pub attributes: Vec<Attribute>,
}

impl GenericConstraint {
    /// Creates a constraint entry without row attributes
    #[must_use]
    pub fn new(constraint: TypeSig) -> Self {
        GenericConstraint {
            constraint,
            attributes: Vec::new(),
        }
    }
}

/// A generic parameter row of a type or method.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenericParam {
    /// Name of the parameter
    pub name: String,
    /// Declared position; must equal the index in the owner's parameter list
    pub position: u16,
    /// `GenericParamAttributes` flags (variance group + special constraints)
    pub flags: u32,
    /// Constraint rows
    pub constraints: Vec<GenericConstraint>,
    /// Custom attributes on the parameter
    pub attributes: Vec<Attribute>,
}

impl GenericParam {
    /// Creates a parameter with the given name and position
    #[must_use]
    pub fn new(name: &str, position: u16) -> Self {
        GenericParam {
            name: name.to_string(),
            position,
            ..GenericParam::default()
        }
    }
}

/// A type definition row together with everything owned by it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeDef {
    /// Metadata token of the definition
    pub token: Token,
    /// Namespace; empty for nested types and the `<Module>` type
    pub namespace: String,
    /// Short name including the generic arity suffix
    pub name: String,
    /// `TypeAttributes` flags
    pub flags: u32,
    /// The base type, if any
    pub base: Option<TypeSig>,
    /// Implemented interfaces, in declaration order
    pub interfaces: Vec<InterfaceImpl>,
    /// Generic parameters, in position order
    pub generic_params: Vec<GenericParam>,
    /// `ClassLayout` row, if present
    pub layout: Option<ClassLayout>,
    /// Nested type definitions, in declaration order
    pub nested_types: Vec<Arc<TypeDef>>,
    /// Fields, in declaration order
    pub fields: Vec<Field>,
    /// Methods, in declaration order
    pub methods: Vec<Arc<Method>>,
    /// Properties, in declaration order
    pub properties: Vec<Property>,
    /// Events, in declaration order
    pub events: Vec<Event>,
    /// Custom attributes on the definition
    pub attributes: Vec<Attribute>,
    /// Security declarations on the definition
    pub security: Vec<SecurityDecl>,
}

impl TypeDef {
    /// Creates an empty definition with the given identity
    #[must_use]
    pub fn new(token: Token, namespace: &str, name: &str, flags: u32) -> Self {
        TypeDef {
            token,
            namespace: namespace.to_string(),
            name: name.to_string(),
            flags,
            ..TypeDef::default()
        }
    }
}
