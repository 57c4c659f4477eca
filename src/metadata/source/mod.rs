//! The source metadata graph consumed by the loader.
//!
//! This module defines the object-level view of one CLI module that the byte-level parser
//! (an external collaborator) produces: assembly and module identity, type definitions with
//! their members, the recursive signature type grammar, custom attributes, security
//! declarations, marshalling descriptors and P/Invoke records. The shapes follow the ECMA-335
//! logical metadata tables, with heap indexes already resolved to strings and coded indexes
//! already resolved to object references.
//!
//! # Concurrency
//!
//! The graph is not required to be safe for concurrent readers (a real parser may decode
//! blobs on demand behind interior caches). All access therefore goes through
//! [`ModuleHandle`], which serializes readers behind a module-wide lock. The eager loader
//! locks once for the whole walk; lazy type definitions lock per materialization.

mod attributes;
mod flags;
mod members;
mod types;

pub use attributes::{AttrValue, Attribute, Marshal, NamedArg, SecurityDecl};
pub use flags::{
    FieldAttributes, GenericParamAttributes, MethodAttributes, MethodImplAttributes,
    MethodSemantics, PInvokeAttributes, ParamAttributes, SecurityAction, TypeAttributes,
    GENERIC_PARAM_CONTRAVARIANT, GENERIC_PARAM_COVARIANT, GENERIC_PARAM_VARIANCE_MASK,
    NATIVE_TYPE,
};
pub use members::{Constant, Event, Field, Method, MethodRef, PInvokeInfo, Param, Property};
pub use types::{
    ClassLayout, GenericConstraint, GenericParam, InterfaceImpl, Scope, TypeDef, TypeRef,
    TypeSig,
};

use std::sync::{Arc, Mutex, MutexGuard};

/// Assembly identity of the module's manifest, if the module carries one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssemblyInfo {
    /// Simple name of the assembly
    pub name: String,
    /// Assembly version (major, minor, build, revision)
    pub version: (u16, u16, u16, u16),
    /// Custom attributes on the assembly row
    pub attributes: Vec<Attribute>,
}

/// An `ExportedType` row. Only forwarders are relevant to the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedType {
    /// Namespace of the exported type
    pub namespace: String,
    /// Short name including the generic arity suffix
    pub name: String,
    /// The scope the type now lives in
    pub scope: Scope,
    /// Whether the row is a type forwarder
    pub is_forwarder: bool,
}

/// One CLI module as produced by the byte-level parser.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    /// Assembly manifest, if this is the manifest module
    pub assembly: Option<AssemblyInfo>,
    /// Module name
    pub name: String,
    /// Location the module was loaded from; empty when loaded from memory
    pub location: String,
    /// Custom attributes on the module row
    pub attributes: Vec<Attribute>,
    /// Top-level type definitions, in declaration order
    pub types: Vec<Arc<TypeDef>>,
    /// `ExportedType` rows
    pub exported_types: Vec<ExportedType>,
}

impl Module {
    /// Creates an empty module with the given name
    #[must_use]
    pub fn new(name: &str) -> Self {
        Module {
            name: name.to_string(),
            ..Module::default()
        }
    }
}

/// Shared handle to a [`Module`], serializing all graph access behind a module-wide lock.
///
/// Every lazy type definition of a loaded assembly holds a clone of this handle; deferred
/// materialization acquires the lock for the duration of the computation and publishes the
/// result lock-free.
#[derive(Debug)]
pub struct ModuleHandle {
    module: Mutex<Module>,
}

impl ModuleHandle {
    /// Wraps a module for loading
    #[must_use]
    pub fn new(module: Module) -> Arc<Self> {
        Arc::new(ModuleHandle {
            module: Mutex::new(module),
        })
    }

    /// Acquires the module-wide lock and returns the guarded module
    pub fn lock(&self) -> MutexGuard<'_, Module> {
        lock!(self.module)
    }
}
