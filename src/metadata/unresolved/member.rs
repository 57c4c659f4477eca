//! Unresolved member records: methods, fields, properties, events and parameters.

use std::sync::Arc;

use crate::metadata::{
    token::Token,
    unresolved::{
        attribute::{AttributeList, ConstantValue},
        typedef::TypeDefRef,
        typeref::{TypeRefList, UnresolvedTypeRc},
    },
};

/// An interned, immutable list of members
pub type MemberList = Arc<[UnresolvedMember]>;

/// Member accessibility, ordered from least to most permissive where a total order exists.
///
/// `protected` and `internal` are incomparable; their union promotes to
/// [`Accessibility::ProtectedOrInternal`] (see [`Accessibility::union`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Accessibility {
    /// Accessible only within the declaring type
    Private,
    /// Accessible within derived types of this assembly (`private protected`)
    ProtectedAndInternal,
    /// Accessible within this assembly (`internal`)
    Internal,
    /// Accessible within derived types (`protected`)
    Protected,
    /// Accessible within derived types or this assembly (`protected internal`)
    ProtectedOrInternal,
    /// Accessible everywhere
    Public,
}

impl Accessibility {
    /// The most permissive accessibility covering both operands, under the C# promotion
    /// rules: `protected` ∪ `internal` promotes to `protected internal`.
    #[must_use]
    pub fn union(self, other: Accessibility) -> Accessibility {
        use Accessibility::{
            Internal, Private, Protected, ProtectedAndInternal, ProtectedOrInternal, Public,
        };
        match (self, other) {
            (Public, _) | (_, Public) => Public,
            (ProtectedOrInternal, _) | (_, ProtectedOrInternal) => ProtectedOrInternal,
            (Protected, Internal) | (Internal, Protected) => ProtectedOrInternal,
            (Protected, _) | (_, Protected) => Protected,
            (Internal, _) | (_, Internal) => Internal,
            (ProtectedAndInternal, _) | (_, ProtectedAndInternal) => ProtectedAndInternal,
            (Private, Private) => Private,
        }
    }
}

impl Default for Accessibility {
    fn default() -> Self {
        Accessibility::Private
    }
}

/// The modifier set shared by all member kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemberModifiers {
    /// Accessibility of the member
    pub accessibility: Accessibility,
    /// Defined on the type rather than per instance
    pub is_static: bool,
    /// Declared without an implementation
    pub is_abstract: bool,
    /// Introduces a new virtual slot
    pub is_virtual: bool,
    /// Cannot be overridden further
    pub is_sealed: bool,
    /// Overrides an inherited virtual slot
    pub is_override: bool,
}

/// Variance of a generic parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variance {
    /// No variance
    #[default]
    Invariant,
    /// `out` parameter
    Covariant,
    /// `in` parameter
    Contravariant,
}

/// An unresolved generic type parameter of a type or method.
///
/// The position always equals the parameter's index in its owner's parameter list; the loader
/// rejects metadata where the two disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParameter {
    /// Which symbol owns the parameter
    pub owner: super::typeref::TypeParameterOwner,
    /// Position within the owner's parameter list
    pub position: u16,
    /// Name of the parameter
    pub name: Arc<str>,
    /// Declared variance
    pub variance: Variance,
    /// `class` constraint
    pub has_reference_type_constraint: bool,
    /// `struct` constraint
    pub has_value_type_constraint: bool,
    /// `new()` constraint
    pub has_default_constructor_constraint: bool,
    /// Constraint type references
    pub constraints: TypeRefList,
    /// Custom attributes on the parameter
    pub attributes: AttributeList,
}

/// Parameter passing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterDirection {
    /// Passed by value
    #[default]
    In,
    /// Passed by reference
    Ref,
    /// By reference, written by the callee (`out` without `in`)
    Out,
}

/// An unresolved parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedParameter {
    /// The parameter type
    pub ty: UnresolvedTypeRc,
    /// Name; empty for the synthesized vararg parameter
    pub name: Arc<str>,
    /// Passing mode
    pub direction: ParameterDirection,
    /// Whether the parameter is a C# `params` array
    pub is_params: bool,
    /// Default value for optional parameters
    pub default_value: Option<Arc<ConstantValue>>,
    /// Custom attributes on the parameter
    pub attributes: AttributeList,
}

/// Which member kind an explicit interface implementation reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberReferenceKind {
    /// A method
    Method,
    /// A property or event accessor
    Accessor,
}

/// An unresolved reference to an interface member, recorded for explicit interface
/// implementations.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberReference {
    /// Kind of the referenced member
    pub kind: MemberReferenceKind,
    /// The interface type declaring the member
    pub declaring_type: UnresolvedTypeRc,
    /// Name of the interface member
    pub name: Arc<str>,
    /// Number of generic parameters of the referenced method
    pub type_parameter_count: u16,
    /// Parameter types of the referenced method
    pub parameter_types: TypeRefList,
}

/// The symbol kind of a method record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MethodKind {
    /// An ordinary method
    #[default]
    Method,
    /// An instance or static constructor
    Constructor,
    /// A user-defined operator
    Operator,
    /// A property or event accessor
    Accessor,
}

/// An unresolved method.
#[derive(Debug)]
pub struct UnresolvedMethod {
    /// Metadata token the method was loaded from
    pub token: Token,
    /// Name; shortened for explicit interface implementations when configured
    pub name: Arc<str>,
    /// Symbol kind
    pub kind: MethodKind,
    /// Modifier set
    pub modifiers: MemberModifiers,
    /// The return type
    pub return_type: UnresolvedTypeRc,
    /// Generic parameters, in position order
    pub type_parameters: Arc<[Arc<TypeParameter>]>,
    /// Parameters, in signature order; vararg methods carry a trailing `arglist` parameter
    pub parameters: Arc<[Arc<UnresolvedParameter>]>,
    /// Whether the method is a C# extension method
    pub is_extension_method: bool,
    /// Whether the method explicitly implements interface members
    pub is_explicit_interface_implementation: bool,
    /// The implemented interface members
    pub explicit_interface_implementations: Arc<[MemberReference]>,
    /// Whether the method has an IL body
    pub has_body: bool,
    /// Custom attributes on the method
    pub attributes: AttributeList,
    /// Custom attributes on the return parameter
    pub return_attributes: AttributeList,
    pub(crate) declaring: TypeDefRef,
}

impl UnresolvedMethod {
    /// The type definition this method belongs to, if still alive
    #[must_use]
    pub fn declaring_type(&self) -> Option<super::typedef::UnresolvedTypeDefRc> {
        self.declaring.get()
    }
}

/// An unresolved field.
#[derive(Debug)]
pub struct UnresolvedField {
    /// Metadata token the field was loaded from
    pub token: Token,
    /// Name of the field
    pub name: Arc<str>,
    /// Modifier set
    pub modifiers: MemberModifiers,
    /// The field type
    pub return_type: UnresolvedTypeRc,
    /// `initonly` fields
    pub is_read_only: bool,
    /// Fields with a `modreq(IsVolatile)` type
    pub is_volatile: bool,
    /// Constant value of literal fields, including decoded decimal constants
    pub constant: Option<Arc<ConstantValue>>,
    /// Custom attributes on the field
    pub attributes: AttributeList,
    pub(crate) declaring: TypeDefRef,
}

impl UnresolvedField {
    /// The type definition this field belongs to, if still alive
    #[must_use]
    pub fn declaring_type(&self) -> Option<super::typedef::UnresolvedTypeDefRc> {
        self.declaring.get()
    }
}

/// The symbol kind of a property record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropertyKind {
    /// An ordinary property
    #[default]
    Property,
    /// An indexer
    Indexer,
}

/// An unresolved property.
#[derive(Debug)]
pub struct UnresolvedProperty {
    /// Metadata token the property was loaded from
    pub token: Token,
    /// Name; shortened for explicit interface implementations when configured
    pub name: Arc<str>,
    /// Property or indexer
    pub kind: PropertyKind,
    /// Modifier set; accessibility is the union of the visible accessors
    pub modifiers: MemberModifiers,
    /// The property type
    pub return_type: UnresolvedTypeRc,
    /// Getter accessor
    pub getter: Option<Arc<UnresolvedMethod>>,
    /// Setter accessor
    pub setter: Option<Arc<UnresolvedMethod>>,
    /// Indexer parameters
    pub parameters: Arc<[Arc<UnresolvedParameter>]>,
    /// Whether the property explicitly implements an interface property
    pub is_explicit_interface_implementation: bool,
    /// The implemented interface accessors
    pub explicit_interface_implementations: Arc<[MemberReference]>,
    /// Custom attributes on the property
    pub attributes: AttributeList,
    pub(crate) declaring: TypeDefRef,
}

impl UnresolvedProperty {
    /// The type definition this property belongs to, if still alive
    #[must_use]
    pub fn declaring_type(&self) -> Option<super::typedef::UnresolvedTypeDefRc> {
        self.declaring.get()
    }
}

/// An unresolved event.
#[derive(Debug)]
pub struct UnresolvedEvent {
    /// Metadata token the event was loaded from
    pub token: Token,
    /// Name; shortened for explicit interface implementations when configured
    pub name: Arc<str>,
    /// Modifier set, taken from the add accessor
    pub modifiers: MemberModifiers,
    /// The delegate type of the event
    pub return_type: UnresolvedTypeRc,
    /// Add accessor
    pub add_accessor: Option<Arc<UnresolvedMethod>>,
    /// Remove accessor
    pub remove_accessor: Option<Arc<UnresolvedMethod>>,
    /// Invoke accessor
    pub invoke_accessor: Option<Arc<UnresolvedMethod>>,
    /// Whether the event explicitly implements an interface event
    pub is_explicit_interface_implementation: bool,
    /// The implemented interface accessors
    pub explicit_interface_implementations: Arc<[MemberReference]>,
    /// Custom attributes on the event
    pub attributes: AttributeList,
    pub(crate) declaring: TypeDefRef,
}

impl UnresolvedEvent {
    /// The type definition this event belongs to, if still alive
    #[must_use]
    pub fn declaring_type(&self) -> Option<super::typedef::UnresolvedTypeDefRc> {
        self.declaring.get()
    }
}

/// An unresolved member of any kind.
#[derive(Debug, Clone)]
pub enum UnresolvedMember {
    /// A method
    Method(Arc<UnresolvedMethod>),
    /// A field
    Field(Arc<UnresolvedField>),
    /// A property
    Property(Arc<UnresolvedProperty>),
    /// An event
    Event(Arc<UnresolvedEvent>),
}

impl UnresolvedMember {
    /// The member name
    #[must_use]
    pub fn name(&self) -> &Arc<str> {
        match self {
            UnresolvedMember::Method(m) => &m.name,
            UnresolvedMember::Field(m) => &m.name,
            UnresolvedMember::Property(m) => &m.name,
            UnresolvedMember::Event(m) => &m.name,
        }
    }

    /// The member's metadata token
    #[must_use]
    pub fn token(&self) -> Token {
        match self {
            UnresolvedMember::Method(m) => m.token,
            UnresolvedMember::Field(m) => m.token,
            UnresolvedMember::Property(m) => m.token,
            UnresolvedMember::Event(m) => m.token,
        }
    }

    /// The member's modifier set
    #[must_use]
    pub fn modifiers(&self) -> MemberModifiers {
        match self {
            UnresolvedMember::Method(m) => m.modifiers,
            UnresolvedMember::Field(m) => m.modifiers,
            UnresolvedMember::Property(m) => m.modifiers,
            UnresolvedMember::Event(m) => m.modifiers,
        }
    }

    /// The member's declaring type, if still alive
    #[must_use]
    pub fn declaring_type(&self) -> Option<super::typedef::UnresolvedTypeDefRc> {
        match self {
            UnresolvedMember::Method(m) => m.declaring_type(),
            UnresolvedMember::Field(m) => m.declaring_type(),
            UnresolvedMember::Property(m) => m.declaring_type(),
            UnresolvedMember::Event(m) => m.declaring_type(),
        }
    }

    /// The member's attribute list
    #[must_use]
    pub fn attributes(&self) -> &AttributeList {
        match self {
            UnresolvedMember::Method(m) => &m.attributes,
            UnresolvedMember::Field(m) => &m.attributes,
            UnresolvedMember::Property(m) => &m.attributes,
            UnresolvedMember::Event(m) => &m.attributes,
        }
    }

    pub(crate) fn bind_declaring(&self, owner: &super::typedef::UnresolvedTypeDefRc) {
        match self {
            UnresolvedMember::Method(m) => m.declaring.bind(owner),
            UnresolvedMember::Field(m) => m.declaring.bind(owner),
            UnresolvedMember::Property(m) => {
                m.declaring.bind(owner);
                if let Some(accessor) = &m.getter {
                    accessor.declaring.bind(owner);
                }
                if let Some(accessor) = &m.setter {
                    accessor.declaring.bind(owner);
                }
            }
            UnresolvedMember::Event(m) => {
                m.declaring.bind(owner);
                for accessor in [&m.add_accessor, &m.remove_accessor, &m.invoke_accessor]
                    .into_iter()
                    .flatten()
                {
                    accessor.declaring.bind(owner);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessibility_union() {
        use Accessibility::{
            Internal, Private, Protected, ProtectedAndInternal, ProtectedOrInternal, Public,
        };
        assert_eq!(Public.union(Private), Public);
        assert_eq!(Protected.union(Internal), ProtectedOrInternal);
        assert_eq!(Internal.union(Protected), ProtectedOrInternal);
        assert_eq!(Protected.union(Private), Protected);
        assert_eq!(Internal.union(ProtectedAndInternal), Internal);
        assert_eq!(Private.union(Private), Private);
        assert_eq!(ProtectedOrInternal.union(Internal), ProtectedOrInternal);
    }

    #[test]
    fn test_accessibility_display() {
        assert_eq!(Accessibility::Public.to_string(), "public");
        assert_eq!(
            Accessibility::ProtectedOrInternal.to_string(),
            "protected_or_internal"
        );
    }
}
