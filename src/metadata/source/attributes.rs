//! Custom attribute, security and marshalling entries of the source metadata graph.
//!
//! Custom attributes arrive with both the raw serialized blob and the decoded constructor
//! arguments. The loader keeps the blob for user attributes (decoding is deferred to the
//! resolve phase) and reads the decoded arguments only for the handful of markers it
//! recognizes (`Dynamic`, `TupleElementNames`, `Extension`, `ParamArray`, `DecimalConstant`,
//! `DefaultMember`, `StandardModule`, `CompilerGlobalScope`).

use std::sync::Arc;

use crate::metadata::source::types::{TypeRef, TypeSig};

/// A decoded custom attribute argument value (ECMA-335 §II.23.3).
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// null
    Null,
    /// bool
    Boolean(bool),
    /// char (UTF-16 code unit)
    Char(u16),
    /// signed 8bit integer
    I1(i8),
    /// unsigned 8bit integer
    U1(u8),
    /// signed 16bit integer
    I2(i16),
    /// unsigned 16bit integer
    U2(u16),
    /// signed 32bit integer
    I4(i32),
    /// unsigned 32bit integer
    U4(u32),
    /// signed 64bit integer
    I8(i64),
    /// unsigned 64bit integer
    U8(u64),
    /// 32bit floating-point
    R4(f32),
    /// 64bit floating-point
    R8(f64),
    /// string
    String(String),
    /// A serialized type name (`System.Type` argument)
    TypeName(String),
    /// An array argument (`SZARRAY` of any element kind)
    Array(Vec<AttrValue>),
}

impl AttrValue {
    /// Reads the value as a string, if it is one
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Reads the value as a bool, if it is one
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

/// A named argument (field or property assignment) of a custom attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedArg {
    /// Whether this assigns a field (true) or a property (false)
    pub is_field: bool,
    /// Name of the field or property
    pub name: String,
    /// The assigned value
    pub value: AttrValue,
}

/// A custom attribute row.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// The attribute type
    pub attr_type: Arc<TypeRef>,
    /// Parameter types of the invoked constructor
    pub ctor_param_types: Vec<TypeSig>,
    /// Decoded positional arguments
    pub fixed_args: Vec<AttrValue>,
    /// Decoded named arguments
    pub named_args: Vec<NamedArg>,
    /// The raw serialized value blob, starting with the 0x0001 prolog
    pub blob: Vec<u8>,
}

impl Attribute {
    /// Creates a marker attribute (parameterless constructor, empty blob body)
    #[must_use]
    pub fn marker(namespace: &str, name: &str) -> Self {
        Attribute {
            attr_type: Arc::new(TypeRef::new(
                super::types::Scope::AssemblyRef("mscorlib".to_string()),
                namespace,
                name,
            )),
            ctor_param_types: Vec::new(),
            fixed_args: Vec::new(),
            named_args: Vec::new(),
            blob: vec![0x01, 0x00, 0x00, 0x00],
        }
    }

    /// Creates an attribute with decoded positional arguments and a reconstructed blob left
    /// empty (tests and synthetic graphs do not need byte-accurate blobs)
    #[must_use]
    pub fn with_args(
        namespace: &str,
        name: &str,
        ctor_param_types: Vec<TypeSig>,
        fixed_args: Vec<AttrValue>,
    ) -> Self {
        Attribute {
            attr_type: Arc::new(TypeRef::new(
                super::types::Scope::AssemblyRef("mscorlib".to_string()),
                namespace,
                name,
            )),
            ctor_param_types,
            fixed_args,
            named_args: Vec::new(),
            blob: Vec::new(),
        }
    }

    /// Whether the attribute type matches the given namespace and name
    #[must_use]
    pub fn is_type(&self, namespace: &str, name: &str) -> bool {
        self.attr_type.namespace == namespace && self.attr_type.name == name
    }
}

/// A security declaration row (`DeclSecurity` table).
///
/// The permission-set blob is read by the byte-level parser; a failed read is represented as
/// `None` and causes the declaration to be skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityDecl {
    /// The security action code
    pub action: u16,
    /// The permission-set blob, or `None` when reading it failed
    pub blob: Option<Vec<u8>>,
}

/// A marshalling descriptor (`FieldMarshal` table, ECMA-335 §II.23.4).
///
/// The simple form carries the native type code directly; the specialized forms add the extra
/// operands the descriptor encodes for arrays, safe arrays, fixed strings and custom
/// marshalers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marshal {
    /// A plain native type
    Simple(u32),
    /// `NATIVE_TYPE::FIXEDARRAY`: fixed-size array with an optional element type
    FixedArray {
        /// Number of elements
        size: u32,
        /// Element native type; `NATIVE_TYPE::MAX` when unspecified
        element: u32,
    },
    /// `NATIVE_TYPE::SAFEARRAY`: COM safe array with an optional variant element type
    SafeArray {
        /// Variant type of the elements; 0 (`VT_EMPTY`) when unspecified
        element: u32,
    },
    /// `NATIVE_TYPE::ARRAY`: variable-length array
    Array {
        /// Element native type; `NATIVE_TYPE::MAX` when unspecified
        element: u32,
        /// Index of the parameter carrying the element count
        size_param_index: Option<u16>,
        /// Constant element count
        size: Option<u32>,
    },
    /// `NATIVE_TYPE::BYVALTSTR`: fixed-length string buffer
    FixedSysString {
        /// Buffer length in characters
        size: u32,
    },
    /// `NATIVE_TYPE::CUSTOMMARSHALER`: user-supplied marshaler
    Custom {
        /// Assembly-qualified name of the marshaler type
        managed_type: String,
        /// Cookie string passed to the marshaler
        cookie: String,
    },
}
