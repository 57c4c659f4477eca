//! The metadata loader: source graph in, frozen unresolved assembly out.
//!
//! One loader instance drives one module at a time; reuse is fine, concurrent use is not,
//! and the `&mut self` entry points encode this. Eager loading walks the module under a single
//! acquisition of the module-wide lock and returns a fully materialized assembly. Lazy
//! loading attaches a [`lazy::LazySource`] to every top-level type instead, deferring base
//! types, nested types and members to first access.
//!
//! # Data flow
//!
//! ```text
//! source::Module -> type-reference builder -> attribute decoder -> member reader
//!                -> type-definition reader -> interned records -> UnresolvedAssembly
//! ```

mod attributes;
mod lazy;
mod member;
mod typedef;
mod typeref;

use std::{
    fmt,
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use crossbeam_skiplist::SkipMap;

use crate::{
    metadata::{
        interning::InternPool,
        source::{self, TypeAttributes},
        unresolved::{
            TopLevelTypeName, UnresolvedAssembly, UnresolvedEvent, UnresolvedField,
            UnresolvedMethod, UnresolvedProperty, UnresolvedType, UnresolvedTypeDefRc,
            UnresolvedTypeRc,
        },
    },
    Error, Result,
};

use lazy::LazySource;
use typeref::split_arity;

/// Cooperative cancellation for eager loads, checked once per top-level type.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled
    #[must_use]
    pub fn new() -> Self {
        CancellationToken::default()
    }

    /// Requests cancellation
    pub fn cancel(&self) {
        self.inner.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::Relaxed)
    }
}

/// An entity handed to the [`LoaderConfig::on_entity_loaded`] callback after registration.
#[derive(Debug, Clone)]
pub enum LoadedEntity {
    /// A type definition
    TypeDefinition(UnresolvedTypeDefRc),
    /// A method
    Method(Arc<UnresolvedMethod>),
    /// A field
    Field(Arc<UnresolvedField>),
    /// A property
    Property(Arc<UnresolvedProperty>),
    /// An event
    Event(Arc<UnresolvedEvent>),
}

/// The per-entity load callback. In lazy mode this may fire from any thread that triggers
/// materialization.
pub type EntityCallback = Arc<dyn Fn(&LoadedEntity) + Send + Sync>;

/// Loader configuration.
#[derive(Clone)]
pub struct LoaderConfig {
    /// Also load members with assembly-internal accessibility
    pub include_internal_members: bool,
    /// Defer base types, nested types and members of top-level types to first access
    pub lazy_load: bool,
    /// Translate `object` + `DynamicAttribute` into the `dynamic` sentinel
    pub use_dynamic_type: bool,
    /// Flatten `System.ValueTuple` instantiations into tuple references
    pub use_tuple_types: bool,
    /// Truncate explicit interface implementation names to the part after the final dot
    pub shorten_interface_impl_names: bool,
    /// Per-entity load callback
    pub on_entity_loaded: Option<EntityCallback>,
    /// Cancellation token honored on the eager type-iteration boundary
    pub cancellation: CancellationToken,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            include_internal_members: false,
            lazy_load: false,
            use_dynamic_type: true,
            use_tuple_types: true,
            shorten_interface_impl_names: true,
            on_entity_loaded: None,
            cancellation: CancellationToken::new(),
        }
    }
}

impl fmt::Debug for LoaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderConfig")
            .field("include_internal_members", &self.include_internal_members)
            .field("lazy_load", &self.lazy_load)
            .field("use_dynamic_type", &self.use_dynamic_type)
            .field("use_tuple_types", &self.use_tuple_types)
            .field(
                "shorten_interface_impl_names",
                &self.shorten_interface_impl_names,
            )
            .field("on_entity_loaded", &self.on_entity_loaded.is_some())
            .finish()
    }
}

/// The shared state of one loader: configuration plus the interning pool.
///
/// Lazy sources hold a clone with the pool disabled; everything else is identical, so eager
/// and lazy materialization produce value-equal results.
#[derive(Debug)]
pub(crate) struct LoaderCore {
    pub(crate) config: LoaderConfig,
    pub(crate) pool: InternPool,
}

impl LoaderCore {
    pub(crate) fn new(config: LoaderConfig) -> Self {
        LoaderCore {
            config,
            pool: InternPool::new(),
        }
    }

    fn lazy_clone(&self) -> Self {
        LoaderCore {
            config: self.config.clone(),
            pool: InternPool::dummy(),
        }
    }
}

/// The seam to the byte-level parser for path-based loading.
///
/// Implementations must open the module standalone: the assembly resolver must refuse to
/// follow references, since dependencies are never chased transitively.
pub trait ModuleReader {
    /// Reads one module from a file.
    ///
    /// # Errors
    ///
    /// Implementation-defined parse failures.
    fn read_module(&self, path: &Path) -> Result<source::Module>;
}

/// The metadata loader.
///
/// A single instance may be reused for multiple modules, but never concurrently; the
/// mutable-borrow entry points enforce this at compile time. The interning pool is shared
/// across all modules loaded through the same instance.
#[derive(Debug)]
pub struct MetadataLoader {
    core: LoaderCore,
}

impl Default for MetadataLoader {
    fn default() -> Self {
        MetadataLoader::new(LoaderConfig::default())
    }
}

impl MetadataLoader {
    /// Creates a loader with the given configuration
    #[must_use]
    pub fn new(config: LoaderConfig) -> Self {
        MetadataLoader {
            core: LoaderCore::new(config),
        }
    }

    /// The active configuration
    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.core.config
    }

    /// Translates a standalone type reference outside of any load; exposed for consumers
    /// that need references for comparison or lookup purposes.
    #[must_use]
    pub fn read_type_reference(&self, ty: &source::TypeSig) -> UnresolvedTypeRc {
        self.core.read_plain_type(ty)
    }

    /// Reads a module from a file through the supplied [`ModuleReader`] and loads it.
    ///
    /// # Errors
    ///
    /// Reader parse failures, plus everything [`MetadataLoader::load_module`] can raise.
    pub fn load_assembly_file<R: ModuleReader>(
        &mut self,
        reader: &R,
        path: &Path,
    ) -> Result<Arc<UnresolvedAssembly>> {
        let module = reader.read_module(path)?;
        self.load_module(&source::ModuleHandle::new(module))
    }

    /// Loads one module into a frozen unresolved assembly.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for a module without a name, before any state mutation
    /// - [`Error::InvalidMetadata`] for generic parameter position mismatches
    /// - [`Error::NotSupported`] for unknown P/Invoke calling conventions
    /// - [`Error::Cancelled`] when the configured token fires between top-level types
    pub fn load_module(
        &mut self,
        handle: &Arc<source::ModuleHandle>,
    ) -> Result<Arc<UnresolvedAssembly>> {
        let module = handle.lock();
        if module.name.is_empty() {
            return Err(Error::InvalidArgument("module name must not be empty"));
        }

        let core = &self.core;
        let name = core.pool.intern_str(
            module
                .assembly
                .as_ref()
                .map_or(module.name.as_str(), |a| a.name.as_str()),
        );
        let location = core.pool.intern_str(&module.location);

        let assembly_attributes = match &module.assembly {
            Some(info) => core.read_assembly_attributes(info),
            None => Vec::new(),
        };
        let mut module_attributes = Vec::new();
        core.add_custom_attributes(&module.attributes, &mut module_attributes);

        let forwarders = SkipMap::new();
        for exported in &module.exported_types {
            if !exported.is_forwarder {
                continue;
            }
            let (short, arity) = split_arity(&exported.name);
            let namespace = core.pool.intern_str(&exported.namespace);
            let short = core.pool.intern_str(short);
            let reference = core.pool.intern_type(Arc::new(UnresolvedType::Named {
                scope: core.read_scope(&exported.scope),
                namespace: namespace.clone(),
                name: short.clone(),
                arity,
                is_reference_type: None,
            }));
            forwarders.insert(TopLevelTypeName::new(namespace, short, arity), reference);
        }

        let lazy_core = core.config.lazy_load.then(|| Arc::new(core.lazy_clone()));
        let mut types: Vec<UnresolvedTypeDefRc> = Vec::new();
        let mut pending: Vec<(UnresolvedTypeDefRc, Arc<source::TypeDef>)> = Vec::new();
        for raw in &module.types {
            if core.config.cancellation.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let visibility = raw.flags & TypeAttributes::VISIBILITY_MASK;
            if !(core.config.include_internal_members || visibility == TypeAttributes::PUBLIC) {
                continue;
            }
            if raw.name.is_empty() {
                continue;
            }
            match &lazy_core {
                Some(lazy) => {
                    let shell = lazy.create_type_shell(
                        raw,
                        Some(Box::new(LazySource::new(
                            lazy.clone(),
                            handle.clone(),
                            raw.clone(),
                        ))),
                    )?;
                    lazy.notify(LoadedEntity::TypeDefinition(shell.clone()));
                    types.push(shell);
                }
                None => {
                    let shell = core.create_type_shell(raw, None)?;
                    types.push(shell.clone());
                    pending.push((shell, raw.clone()));
                }
            }
        }

        // Member initialization runs only once the full type list exists.
        for (shell, raw) in &pending {
            core.init_type_def(shell, raw)?;
        }

        drop(module);

        Ok(UnresolvedAssembly::new(
            name,
            location,
            core.pool.intern_attribute_list(assembly_attributes),
            core.pool.intern_attribute_list(module_attributes),
            types.into(),
            forwarders,
        ))
    }
}
