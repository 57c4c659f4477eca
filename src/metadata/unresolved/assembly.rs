//! The frozen unresolved assembly returned by the loader.

use std::sync::Arc;

use crossbeam_skiplist::SkipMap;

use crate::{
    metadata::{
        token::Token,
        unresolved::{
            attribute::AttributeList,
            typedef::{TypeDefList, UnresolvedTypeDefRc},
            typeref::UnresolvedTypeRc,
        },
    },
    Result,
};

/// The key of the type-forwarder map: namespace, short name (without arity suffix) and the
/// number of generic parameters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TopLevelTypeName {
    /// Namespace of the type
    pub namespace: Arc<str>,
    /// Short name without the arity suffix
    pub name: Arc<str>,
    /// Number of generic parameters
    pub arity: u16,
}

impl TopLevelTypeName {
    /// Creates a key
    #[must_use]
    pub fn new(namespace: Arc<str>, name: Arc<str>, arity: u16) -> Self {
        TopLevelTypeName {
            namespace,
            name,
            arity,
        }
    }
}

/// A loaded, frozen unresolved assembly.
///
/// All collections are read-only after construction. Lazy-loaded type definitions still
/// materialize their deferred lists on first access, which is safe for concurrent readers;
/// everything else is immutable.
pub struct UnresolvedAssembly {
    name: Arc<str>,
    location: Arc<str>,
    assembly_attributes: AttributeList,
    module_attributes: AttributeList,
    types: TypeDefList,
    by_token: SkipMap<Token, UnresolvedTypeDefRc>,
    forwarders: SkipMap<TopLevelTypeName, UnresolvedTypeRc>,
}

impl std::fmt::Debug for UnresolvedAssembly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnresolvedAssembly")
            .field("name", &self.name)
            .field("location", &self.location)
            .field("types", &self.types.len())
            .field("forwarders", &self.forwarders.len())
            .finish_non_exhaustive()
    }
}

impl UnresolvedAssembly {
    pub(crate) fn new(
        name: Arc<str>,
        location: Arc<str>,
        assembly_attributes: AttributeList,
        module_attributes: AttributeList,
        types: TypeDefList,
        forwarders: SkipMap<TopLevelTypeName, UnresolvedTypeRc>,
    ) -> Arc<Self> {
        let by_token = SkipMap::new();
        for td in types.iter() {
            by_token.insert(td.token, td.clone());
        }
        Arc::new(UnresolvedAssembly {
            name,
            location,
            assembly_attributes,
            module_attributes,
            types,
            by_token,
            forwarders,
        })
    }

    /// Simple name of the assembly (or the module name for modules without a manifest)
    #[must_use]
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// The location the module was loaded from; empty when loaded from memory
    #[must_use]
    pub fn location(&self) -> &Arc<str> {
        &self.location
    }

    /// Attributes of the assembly manifest, including the synthesized version attribute
    #[must_use]
    pub fn assembly_attributes(&self) -> &AttributeList {
        &self.assembly_attributes
    }

    /// Attributes of the module row
    #[must_use]
    pub fn module_attributes(&self) -> &AttributeList {
        &self.module_attributes
    }

    /// Top-level type definitions, in the module's declaration order
    #[must_use]
    pub fn types(&self) -> &TypeDefList {
        &self.types
    }

    /// Looks up a top-level type definition by its metadata token
    #[must_use]
    pub fn type_by_token(&self, token: Token) -> Option<UnresolvedTypeDefRc> {
        self.by_token.get(&token).map(|entry| entry.value().clone())
    }

    /// Looks up a type forwarder
    #[must_use]
    pub fn forwarder(&self, key: &TopLevelTypeName) -> Option<UnresolvedTypeRc> {
        self.forwarders.get(key).map(|entry| entry.value().clone())
    }

    /// All registered type forwarders, ordered by key
    #[must_use]
    pub fn forwarders(&self) -> Vec<(TopLevelTypeName, UnresolvedTypeRc)> {
        self.forwarders
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Forces every lazy type definition to materialize its deferred lists, then releases
    /// the loader and source-metadata references they hold.
    ///
    /// After this call the underlying metadata graph is no longer reachable from the
    /// assembly and can be dropped.
    ///
    /// # Errors
    ///
    /// Surfaces the first materialization error; slots that materialized before the error
    /// stay published.
    pub fn finish_lazy_loading(&self) -> Result<()> {
        for td in self.types.iter() {
            td.finish_lazy()?;
        }
        Ok(())
    }
}
