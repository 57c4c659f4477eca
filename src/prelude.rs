//! # cildom Prelude
//!
//! This module provides a convenient prelude for the most commonly used types from the
//! library. Import it to get quick access to the loader, its configuration, the source-graph
//! builders and the unresolved model.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all cildom operations
pub use crate::Error;

/// The result type used throughout cildom
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// The metadata loader and its configuration
pub use crate::metadata::loader::{
    CancellationToken, EntityCallback, LoadedEntity, LoaderConfig, MetadataLoader, ModuleReader,
};

/// Metadata token type for referencing table entries
pub use crate::metadata::token::Token;

// ================================================================================================
// Source Metadata Graph
// ================================================================================================

/// The object-level input graph and its flag constants
pub use crate::metadata::source::{
    AssemblyInfo, AttrValue, Attribute, ClassLayout, Constant, Event, ExportedType, Field,
    FieldAttributes, GenericConstraint, GenericParam, InterfaceImpl, Marshal, Method,
    MethodAttributes, MethodImplAttributes, MethodRef, MethodSemantics, Module, ModuleHandle,
    NamedArg, PInvokeAttributes, PInvokeInfo, Param, ParamAttributes, Property, Scope,
    SecurityDecl, TypeAttributes, TypeDef, TypeRef, TypeSig,
};

// ================================================================================================
// Unresolved Model
// ================================================================================================

/// The interning pool
pub use crate::metadata::interning::InternPool;

/// The frozen output entities
pub use crate::metadata::unresolved::{
    Accessibility, AttributeArguments, ConstPayload, ConstantValue, MemberModifiers, MethodKind,
    ParameterDirection, PrimitiveKind, PropertyKind, TopLevelTypeName, TypeKind, TypeScope,
    UnresolvedAssembly, UnresolvedAttribute, UnresolvedMember, UnresolvedType, UnresolvedTypeDef,
    UnresolvedTypeDefRc, UnresolvedTypeRc,
};
