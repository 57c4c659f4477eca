//! Unresolved type definitions.
//!
//! A type definition is built in two stages: the shell (identity, kind, modifiers, type
//! parameters, attributes) is always constructed up front, while base types, nested types and
//! members live in publish-once slots. Eager loading fills the slots before the assembly is
//! returned; lazy loading defers them to first access, computed under the module-wide lock by
//! a [`LazyTypeSource`] and then dropped so the source graph becomes collectible.

use std::sync::{atomic::fence, atomic::Ordering, Arc, OnceLock, RwLock, Weak};

use crate::{
    metadata::{
        token::Token,
        unresolved::{
            attribute::AttributeList,
            member::{MemberList, TypeParameter},
            typeref::TypeRefList,
        },
    },
    Result,
};

/// Reference to an [`UnresolvedTypeDef`]
pub type UnresolvedTypeDefRc = Arc<UnresolvedTypeDef>;
/// An immutable list of type definitions
pub type TypeDefList = Arc<[UnresolvedTypeDefRc]>;

/// Member accessibility of a type definition.
pub use super::member::Accessibility;

/// The kind of a type definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum TypeKind {
    /// A class
    Class,
    /// A value type
    Struct,
    /// An interface
    Interface,
    /// An enumeration
    Enum,
    /// A delegate
    Delegate,
    /// A VB module / compiler global scope type
    Module,
}

/// A weak back-reference to a type definition, set once when the owning entity is registered.
///
/// Members are created before their declaring type definition exists as an `Arc`, so the
/// back-reference is bound afterwards. Weakness avoids the member → type → member cycle.
pub struct TypeDefRef {
    inner: OnceLock<Weak<UnresolvedTypeDef>>,
}

impl TypeDefRef {
    /// Creates an unbound reference
    #[must_use]
    pub(crate) fn unset() -> Self {
        TypeDefRef {
            inner: OnceLock::new(),
        }
    }

    /// Binds the reference; later binds of the same owner are ignored
    pub(crate) fn bind(&self, owner: &UnresolvedTypeDefRc) {
        let _ = self.inner.set(Arc::downgrade(owner));
    }

    /// Upgrades to the owning type definition, if bound and still alive
    #[must_use]
    pub fn get(&self) -> Option<UnresolvedTypeDefRc> {
        self.inner.get().and_then(Weak::upgrade)
    }
}

impl std::fmt::Debug for TypeDefRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.get() {
            Some(td) => write!(f, "TypeDefRef({}.{})", td.namespace, td.name),
            None => write!(f, "TypeDefRef(<unbound>)"),
        }
    }
}

/// The deferred-computation source of a lazy type definition.
///
/// Implementations hold the module handle and the source type; each method acquires the
/// module-wide lock, re-checks the slot, computes, and publishes into the slot.
pub(crate) trait LazyTypeSource: Send + Sync {
    /// Computes and publishes the base-type list
    fn base_types(&self, slot: &OnceLock<TypeRefList>) -> Result<TypeRefList>;
    /// Computes and publishes the nested-type list
    fn nested_types(&self, slot: &OnceLock<TypeDefList>) -> Result<TypeDefList>;
    /// Computes and publishes the member list
    fn members(
        &self,
        owner: &UnresolvedTypeDefRc,
        slot: &OnceLock<MemberList>,
    ) -> Result<MemberList>;
}

/// An unresolved type definition.
pub struct UnresolvedTypeDef {
    /// Metadata token of the definition
    pub token: Token,
    /// Namespace; empty for nested types
    pub namespace: Arc<str>,
    /// Short name without the arity suffix
    pub name: Arc<str>,
    /// Kind of the type
    pub kind: TypeKind,
    /// Accessibility of the type
    pub accessibility: Accessibility,
    /// Whether the type is sealed
    pub is_sealed: bool,
    /// Whether the type is abstract
    pub is_abstract: bool,
    /// Generic parameters, in position order
    pub type_parameters: Arc<[Arc<TypeParameter>]>,
    /// Custom attributes, including the synthesized flag-derived records
    pub attributes: AttributeList,
    /// Whether any method of the type carries the extension marker
    pub has_extension_methods: bool,
    /// Whether downstream consumers must synthesize a default constructor (structs and enums)
    pub add_default_constructor_if_required: bool,
    base_types: OnceLock<TypeRefList>,
    nested_types: OnceLock<TypeDefList>,
    members: OnceLock<MemberList>,
    lazy: RwLock<Option<Box<dyn LazyTypeSource>>>,
}

impl UnresolvedTypeDef {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        token: Token,
        namespace: Arc<str>,
        name: Arc<str>,
        kind: TypeKind,
        accessibility: Accessibility,
        is_sealed: bool,
        is_abstract: bool,
        type_parameters: Arc<[Arc<TypeParameter>]>,
        attributes: AttributeList,
        has_extension_methods: bool,
        lazy: Option<Box<dyn LazyTypeSource>>,
    ) -> Self {
        let add_default_constructor_if_required =
            matches!(kind, TypeKind::Struct | TypeKind::Enum);
        UnresolvedTypeDef {
            token,
            namespace,
            name,
            kind,
            accessibility,
            is_sealed,
            is_abstract,
            type_parameters,
            attributes,
            has_extension_methods,
            add_default_constructor_if_required,
            base_types: OnceLock::new(),
            nested_types: OnceLock::new(),
            members: OnceLock::new(),
            lazy: RwLock::new(lazy),
        }
    }

    /// Whether the type is static (sealed and abstract)
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.is_sealed && self.is_abstract
    }

    /// The base-type references: the base class (or the enum underlying type) followed by the
    /// implemented interfaces, in declaration order.
    ///
    /// # Errors
    ///
    /// Lazy materialization can surface [`crate::Error::NotSupported`]; eager-loaded types
    /// never fail.
    pub fn base_types(&self) -> Result<TypeRefList> {
        if let Some(published) = self.base_types.get() {
            return Ok(published.clone());
        }
        let lazy = read_lock!(self.lazy);
        match lazy.as_ref() {
            Some(source) => source.base_types(&self.base_types),
            None => Ok(self
                .base_types
                .get()
                .expect("slot published before lazy source release")
                .clone()),
        }
    }

    /// The nested type definitions, in declaration order.
    ///
    /// # Errors
    ///
    /// Lazy materialization can surface [`crate::Error::NotSupported`]; eager-loaded types
    /// never fail.
    pub fn nested_types(&self) -> Result<TypeDefList> {
        if let Some(published) = self.nested_types.get() {
            return Ok(published.clone());
        }
        let lazy = read_lock!(self.lazy);
        match lazy.as_ref() {
            Some(source) => source.nested_types(&self.nested_types),
            None => Ok(self
                .nested_types
                .get()
                .expect("slot published before lazy source release")
                .clone()),
        }
    }

    /// The members of the type, in load order: methods, fields, properties, events.
    ///
    /// Accessor methods are not part of this list; they are reachable through their owning
    /// property or event.
    ///
    /// # Errors
    ///
    /// Lazy materialization can surface [`crate::Error::NotSupported`]; eager-loaded types
    /// never fail.
    pub fn members(self: &Arc<Self>) -> Result<MemberList> {
        if let Some(published) = self.members.get() {
            return Ok(published.clone());
        }
        let lazy = read_lock!(self.lazy);
        match lazy.as_ref() {
            Some(source) => source.members(self, &self.members),
            None => Ok(self
                .members
                .get()
                .expect("slot published before lazy source release")
                .clone()),
        }
    }

    /// Forces any still-empty slot, fences, and releases the lazy source so the underlying
    /// metadata graph becomes collectible.
    pub(crate) fn finish_lazy(self: &Arc<Self>) -> Result<()> {
        self.base_types()?;
        self.nested_types()?;
        self.members()?;
        fence(Ordering::SeqCst);
        write_lock!(self.lazy).take();
        Ok(())
    }

    pub(crate) fn publish_base_types(&self, base_types: TypeRefList) {
        let _ = self.base_types.set(base_types);
    }

    pub(crate) fn publish_nested_types(&self, nested_types: TypeDefList) {
        let _ = self.nested_types.set(nested_types);
    }

    pub(crate) fn publish_members(self: &Arc<Self>, members: MemberList) {
        for member in members.iter() {
            member.bind_declaring(self);
        }
        let _ = self.members.set(members);
    }
}

impl std::fmt::Debug for UnresolvedTypeDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnresolvedTypeDef")
            .field("token", &self.token)
            .field("namespace", &self.namespace)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("accessibility", &self.accessibility)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for UnresolvedTypeDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{} {}", self.kind, self.name)
        } else {
            write!(f, "{} {}.{}", self.kind, self.namespace, self.name)
        }
    }
}
