//! Unresolved type references.
//!
//! A type reference describes a type purely by structure and name, without binding to a type
//! definition; binding happens in a later resolve phase that sees all assemblies. References
//! are immutable, compared by value, and interned so that identical subtrees share storage.

use std::{fmt, sync::Arc, sync::LazyLock};

use crate::metadata::token::Token;

/// Reference to an [`UnresolvedType`]
pub type UnresolvedTypeRc = Arc<UnresolvedType>;
/// An interned, immutable list of type references
pub type TypeRefList = Arc<[UnresolvedTypeRc]>;
/// An interned, immutable list of tuple element names
pub type TupleNameList = Arc<[Option<Arc<str>>]>;

/// The known primitive types of the CLI type system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum PrimitiveKind {
    /// System.Void
    Void,
    /// System.Boolean
    Boolean,
    /// System.Char
    Char,
    /// System.SByte
    SByte,
    /// System.Byte
    Byte,
    /// System.Int16
    Int16,
    /// System.UInt16
    UInt16,
    /// System.Int32
    Int32,
    /// System.UInt32
    UInt32,
    /// System.Int64
    Int64,
    /// System.UInt64
    UInt64,
    /// System.Single
    Single,
    /// System.Double
    Double,
    /// System.IntPtr
    IntPtr,
    /// System.UIntPtr
    UIntPtr,
    /// System.String
    String,
    /// System.Object
    Object,
    /// System.Decimal
    Decimal,
}

impl PrimitiveKind {
    /// The short name of the primitive within the `System` namespace
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Void => "Void",
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Char => "Char",
            PrimitiveKind::SByte => "SByte",
            PrimitiveKind::Byte => "Byte",
            PrimitiveKind::Int16 => "Int16",
            PrimitiveKind::UInt16 => "UInt16",
            PrimitiveKind::Int32 => "Int32",
            PrimitiveKind::UInt32 => "UInt32",
            PrimitiveKind::Int64 => "Int64",
            PrimitiveKind::UInt64 => "UInt64",
            PrimitiveKind::Single => "Single",
            PrimitiveKind::Double => "Double",
            PrimitiveKind::IntPtr => "IntPtr",
            PrimitiveKind::UIntPtr => "UIntPtr",
            PrimitiveKind::String => "String",
            PrimitiveKind::Object => "Object",
            PrimitiveKind::Decimal => "Decimal",
        }
    }

    /// The canonical shared reference for this primitive
    #[must_use]
    pub fn reference(self) -> UnresolvedTypeRc {
        use strum::IntoEnumIterator;
        static KNOWN: LazyLock<Vec<UnresolvedTypeRc>> = LazyLock::new(|| {
            PrimitiveKind::iter()
                .map(|kind| Arc::new(UnresolvedType::Primitive(kind)))
                .collect()
        });
        KNOWN[self as usize].clone()
    }
}

/// Which symbol a type parameter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeParameterOwner {
    /// A type definition's parameter (`!n` in signatures)
    Type,
    /// A method's parameter (`!!n` in signatures)
    Method,
}

/// The assembly a named reference resolves against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeScope {
    /// The assembly currently being loaded
    CurrentAssembly,
    /// An external assembly, by simple name
    Assembly(Arc<str>),
}

/// An unresolved reference to a type.
///
/// Every reference the loader returns is either one of the known singletons (primitives and
/// the [`UnresolvedType::Dynamic`] / [`UnresolvedType::ArgList`] / [`UnresolvedType::Unknown`]
/// sentinels) or has been registered with the interning pool, except for references produced
/// during lazy materialization where the pool is disabled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UnresolvedType {
    /// A known primitive type
    Primitive(PrimitiveKind),
    /// A pointer to a type
    Pointer(UnresolvedTypeRc),
    /// A type passed by reference
    ByRef(UnresolvedTypeRc),
    /// An array of the given rank
    Array {
        /// The element type
        element: UnresolvedTypeRc,
        /// Number of dimensions
        rank: u32,
    },
    /// A generic instantiation of an open type
    GenericInstance {
        /// The open generic type
        open: UnresolvedTypeRc,
        /// The type arguments
        args: TypeRefList,
    },
    /// A value tuple, flattened across `TRest` chains
    Tuple {
        /// The element types, in order
        elements: TypeRefList,
        /// The element names; `None` entries are unnamed
        names: TupleNameList,
    },
    /// A generic parameter of the enclosing type or method
    TypeParameter {
        /// Which symbol owns the parameter
        owner: TypeParameterOwner,
        /// Position within the owner's parameter list
        position: u16,
    },
    /// A type identified by scope, namespace and name
    Named {
        /// The assembly to resolve against
        scope: TypeScope,
        /// Namespace of the type
        namespace: Arc<str>,
        /// Short name without the arity suffix
        name: Arc<str>,
        /// Number of generic parameters
        arity: u16,
        /// Whether the type is known to be a reference type; `None` when the source encoding
        /// cannot be trusted
        is_reference_type: Option<bool>,
    },
    /// A type nested in another referenced type
    Nested {
        /// The declaring type reference
        declaring: UnresolvedTypeRc,
        /// Short name without the arity suffix
        name: Arc<str>,
        /// Number of additional generic parameters introduced by the nested type
        arity: u16,
        /// Whether the type is known to be a reference type
        is_reference_type: Option<bool>,
    },
    /// A type definition of the assembly being loaded, by metadata token
    Definition(Token),
    /// The C# `dynamic` type
    Dynamic,
    /// The vararg argument list sentinel
    ArgList,
    /// An unknown or unrepresentable type
    Unknown,
}

impl UnresolvedType {
    /// The canonical `System.Object` reference
    #[must_use]
    pub fn object() -> UnresolvedTypeRc {
        PrimitiveKind::Object.reference()
    }

    /// The canonical `dynamic` sentinel
    #[must_use]
    pub fn dynamic() -> UnresolvedTypeRc {
        static DYNAMIC: LazyLock<UnresolvedTypeRc> =
            LazyLock::new(|| Arc::new(UnresolvedType::Dynamic));
        DYNAMIC.clone()
    }

    /// The canonical `arglist` sentinel
    #[must_use]
    pub fn arglist() -> UnresolvedTypeRc {
        static ARGLIST: LazyLock<UnresolvedTypeRc> =
            LazyLock::new(|| Arc::new(UnresolvedType::ArgList));
        ARGLIST.clone()
    }

    /// The canonical unknown-type sentinel
    #[must_use]
    pub fn unknown() -> UnresolvedTypeRc {
        static UNKNOWN: LazyLock<UnresolvedTypeRc> =
            LazyLock::new(|| Arc::new(UnresolvedType::Unknown));
        UNKNOWN.clone()
    }

    /// Whether this reference is one of the known singletons
    #[must_use]
    pub fn is_known_singleton(&self) -> bool {
        matches!(
            self,
            UnresolvedType::Primitive(_)
                | UnresolvedType::Dynamic
                | UnresolvedType::ArgList
                | UnresolvedType::Unknown
        )
    }
}

impl fmt::Display for UnresolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedType::Primitive(kind) => write!(f, "System.{}", kind.name()),
            UnresolvedType::Pointer(element) => write!(f, "{element}*"),
            UnresolvedType::ByRef(element) => write!(f, "{element}&"),
            UnresolvedType::Array { element, rank } => {
                write!(f, "{element}[{}]", ",".repeat((*rank as usize).saturating_sub(1)))
            }
            UnresolvedType::GenericInstance { open, args } => {
                write!(f, "{open}<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ">")
            }
            UnresolvedType::Tuple { elements, .. } => {
                write!(f, "(")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, ")")
            }
            UnresolvedType::TypeParameter { owner, position } => match owner {
                TypeParameterOwner::Type => write!(f, "!{position}"),
                TypeParameterOwner::Method => write!(f, "!!{position}"),
            },
            UnresolvedType::Named {
                namespace, name, ..
            } => {
                if namespace.is_empty() {
                    write!(f, "{name}")
                } else {
                    write!(f, "{namespace}.{name}")
                }
            }
            UnresolvedType::Nested {
                declaring, name, ..
            } => write!(f, "{declaring}+{name}"),
            UnresolvedType::Definition(token) => write!(f, "#{token}"),
            UnresolvedType::Dynamic => write!(f, "dynamic"),
            UnresolvedType::ArgList => write!(f, "__arglist"),
            UnresolvedType::Unknown => write!(f, "?"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_singletons_are_shared() {
        let a = PrimitiveKind::Int32.reference();
        let b = PrimitiveKind::Int32.reference();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*a, UnresolvedType::Primitive(PrimitiveKind::Int32));
    }

    #[test]
    fn test_sentinel_singletons_are_shared() {
        assert!(Arc::ptr_eq(&UnresolvedType::dynamic(), &UnresolvedType::dynamic()));
        assert!(Arc::ptr_eq(&UnresolvedType::arglist(), &UnresolvedType::arglist()));
        assert!(Arc::ptr_eq(&UnresolvedType::unknown(), &UnresolvedType::unknown()));
        assert!(UnresolvedType::dynamic().is_known_singleton());
    }

    #[test]
    fn test_display() {
        let list: UnresolvedTypeRc = Arc::new(UnresolvedType::Named {
            scope: TypeScope::Assembly("mscorlib".into()),
            namespace: "System.Collections.Generic".into(),
            name: "List".into(),
            arity: 1,
            is_reference_type: Some(true),
        });
        let inst = UnresolvedType::GenericInstance {
            open: list,
            args: vec![PrimitiveKind::Int32.reference()].into(),
        };
        assert_eq!(inst.to_string(), "System.Collections.Generic.List<System.Int32>");

        let array = UnresolvedType::Array {
            element: PrimitiveKind::Byte.reference(),
            rank: 2,
        };
        assert_eq!(array.to_string(), "System.Byte[,]");
    }

    #[test]
    fn test_value_equality() {
        let a = UnresolvedType::Pointer(PrimitiveKind::Int32.reference());
        let b = UnresolvedType::Pointer(PrimitiveKind::Int32.reference());
        assert_eq!(a, b);
    }
}
