//! The unresolved type system produced by the loader.
//!
//! Entities in this module describe one assembly's types and members without binding any
//! cross-assembly references; binding is the job of a later resolve phase that sees all
//! assemblies of a compilation. Everything here is immutable once the loader has returned:
//! value-shaped records (type references, attributes, constants) are interned and compared by
//! value, entity records (type definitions, members) have identity and carry their metadata
//! token.
//!
//! # Key Components
//!
//! - [`UnresolvedAssembly`] - the frozen per-module result
//! - [`UnresolvedTypeDef`] - a type definition with publish-once deferred lists
//! - [`UnresolvedType`] - the structural type-reference grammar
//! - [`UnresolvedMember`] - methods, fields, properties and events
//! - [`UnresolvedAttribute`] / [`ConstantValue`] - attribute records and constants

mod assembly;
mod attribute;
mod member;
mod typedef;
mod typeref;

pub use assembly::{TopLevelTypeName, UnresolvedAssembly};
pub use attribute::{
    AttributeArguments, AttributeList, ConstPayload, ConstantValue, DecimalValue, NamedArgument,
    NamedArgumentKind, UnresolvedAttribute, UnresolvedAttributeRc,
};
pub use member::{
    Accessibility, MemberList, MemberModifiers, MemberReference, MemberReferenceKind, MethodKind,
    ParameterDirection, PropertyKind, TypeParameter, UnresolvedEvent, UnresolvedField,
    UnresolvedMember, UnresolvedMethod, UnresolvedParameter, UnresolvedProperty, Variance,
};
pub use typedef::{TypeDefList, TypeKind, UnresolvedTypeDef, UnresolvedTypeDefRc};
pub use typeref::{
    PrimitiveKind, TupleNameList, TypeParameterOwner, TypeRefList, TypeScope, UnresolvedType,
    UnresolvedTypeRc,
};

pub(crate) use typedef::{LazyTypeSource, TypeDefRef};
