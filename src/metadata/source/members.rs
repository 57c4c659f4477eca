//! Member-level entries of the source metadata graph: methods, fields, properties, events and
//! parameters, plus the constant and P/Invoke records attached to them.

use std::sync::Arc;

use crate::metadata::{
    source::{
        attributes::{Attribute, Marshal, SecurityDecl},
        types::TypeSig,
    },
    token::Token,
};

/// A constant slot value (`Constant` table, ECMA-335 §II.22.9).
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// null reference
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
}

/// P/Invoke information from the `ImplMap` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PInvokeInfo {
    /// Name of the imported module (the library)
    pub module: String,
    /// Entry point name; `None` to use the method name
    pub entry_point: Option<String>,
    /// `PInvokeAttributes` flags
    pub flags: u32,
}

impl PInvokeInfo {
    /// Creates a record importing from `module` with the given flags
    #[must_use]
    pub fn new(module: &str, flags: u32) -> Self {
        PInvokeInfo {
            module: module.to_string(),
            entry_point: None,
            flags,
        }
    }
}

/// A parameter row together with its signature type.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Name of the parameter; may be empty for unnamed parameters
    pub name: String,
    /// `ParamAttributes` flags
    pub flags: u32,
    /// The parameter type from the method signature
    pub ty: TypeSig,
    /// Constant slot for optional parameters
    pub constant: Option<Constant>,
    /// Marshalling descriptor, if present
    pub marshal: Option<Marshal>,
    /// Custom attributes on the parameter
    pub attributes: Vec<Attribute>,
}

impl Param {
    /// Creates a plain parameter
    #[must_use]
    pub fn new(name: &str, ty: TypeSig) -> Self {
        Param {
            name: name.to_string(),
            flags: 0,
            ty,
            constant: None,
            marshal: None,
            attributes: Vec::new(),
        }
    }
}

/// A reference to a method of another type, as it appears in the method-override table.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodRef {
    /// The declaring type of the referenced method
    pub declaring_type: TypeSig,
    /// Name of the referenced method
    pub name: String,
    /// Number of generic parameters of the referenced method
    pub generic_arity: u16,
}

/// A method definition row together with its signature and owned rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Method {
    /// Metadata token of the definition
    pub token: Token,
    /// Name; explicit interface implementations keep the dotted form
    pub name: String,
    /// `MethodAttributes` flags
    pub flags: u32,
    /// `MethodImplAttributes` flags
    pub impl_flags: u32,
    /// `MethodSemantics` flags linking the method to a property or event
    pub semantics: u32,
    /// Whether the signature uses the vararg calling convention
    pub is_vararg: bool,
    /// Whether the method has a body (non-zero RVA)
    pub has_body: bool,
    /// Return type from the signature
    pub return_type: TypeSig,
    /// Custom attributes on the return parameter
    pub return_attributes: Vec<Attribute>,
    /// Marshalling descriptor of the return value, if present
    pub return_marshal: Option<Marshal>,
    /// Parameters, in signature order
    pub params: Vec<Param>,
    /// Generic parameters, in position order
    pub generic_params: Vec<super::types::GenericParam>,
    /// Explicit overrides (`MethodImpl` table entries with this method as body)
    pub overrides: Vec<MethodRef>,
    /// P/Invoke record, if the method is a platform invoke
    pub pinvoke: Option<PInvokeInfo>,
    /// Custom attributes on the method
    pub attributes: Vec<Attribute>,
    /// Security declarations on the method
    pub security: Vec<SecurityDecl>,
}

impl Method {
    /// Creates a bodyless method with the given identity and return type
    #[must_use]
    pub fn new(token: Token, name: &str, flags: u32, return_type: TypeSig) -> Self {
        Method {
            token,
            name: name.to_string(),
            flags,
            return_type,
            ..Method::default()
        }
    }
}

/// A field definition row.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Metadata token of the definition
    pub token: Token,
    /// Name of the field
    pub name: String,
    /// `FieldAttributes` flags
    pub flags: u32,
    /// Field type from the signature; custom modifiers are preserved here so the loader can
    /// observe `modreq(IsVolatile)`
    pub ty: TypeSig,
    /// Constant slot for literal fields
    pub constant: Option<Constant>,
    /// Explicit offset from the `FieldLayout` table
    pub offset: Option<u32>,
    /// Marshalling descriptor, if present
    pub marshal: Option<Marshal>,
    /// Custom attributes on the field
    pub attributes: Vec<Attribute>,
}

impl Field {
    /// Creates a field with the given identity and type
    #[must_use]
    pub fn new(token: Token, name: &str, flags: u32, ty: TypeSig) -> Self {
        Field {
            token,
            name: name.to_string(),
            flags,
            ty,
            constant: None,
            offset: None,
            marshal: None,
            attributes: Vec::new(),
        }
    }
}

/// A property row with its accessors resolved through the `MethodSemantics` table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Property {
    /// Metadata token of the definition
    pub token: Token,
    /// Name; explicit interface implementations keep the dotted form
    pub name: String,
    /// Property type from the signature
    pub ty: TypeSig,
    /// Getter accessor, shared with the owning type's method list
    pub getter: Option<Arc<Method>>,
    /// Setter accessor, shared with the owning type's method list
    pub setter: Option<Arc<Method>>,
    /// Indexer parameters from the property signature
    pub params: Vec<Param>,
    /// Custom attributes on the property
    pub attributes: Vec<Attribute>,
}

impl Property {
    /// Creates a property with the given identity and type
    #[must_use]
    pub fn new(token: Token, name: &str, ty: TypeSig) -> Self {
        Property {
            token,
            name: name.to_string(),
            ty,
            ..Property::default()
        }
    }
}

/// An event row with its accessors resolved through the `MethodSemantics` table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    /// Metadata token of the definition
    pub token: Token,
    /// Name; explicit interface implementations keep the dotted form
    pub name: String,
    /// The delegate type of the event
    pub ty: TypeSig,
    /// AddOn accessor
    pub add: Option<Arc<Method>>,
    /// RemoveOn accessor
    pub remove: Option<Arc<Method>>,
    /// Fire accessor
    pub invoke: Option<Arc<Method>>,
    /// Custom attributes on the event
    pub attributes: Vec<Attribute>,
}

impl Event {
    /// Creates an event with the given identity and delegate type
    #[must_use]
    pub fn new(token: Token, name: &str, ty: TypeSig) -> Self {
        Event {
            token,
            name: name.to_string(),
            ty,
            ..Event::default()
        }
    }
}
