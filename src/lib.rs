// Copyright 2026 The cildom contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]

//! # cildom
//!
//! A loader that turns a parsed ECMA-335 (CLI) metadata module into an **unresolved type
//! system**: a frozen, in-memory description of every publicly visible (optionally internal)
//! type, member, parameter, attribute and type parameter in the module. The output is meant
//! for decompilers, analyzers and IDE-grade navigators that bind cross-assembly references in
//! a later resolve phase.
//!
//! # Architecture
//!
//! - **Source graph** ([`metadata::source`]): the object-level view of one module, produced
//!   by an external byte-level parser. The loader never touches file bytes.
//! - **Loader** ([`metadata::loader`]): the translation core. Walks the recursive type
//!   grammar while threading the `Dynamic`/`TupleElementNames` cursors, synthesizes
//!   attribute records from P/Invoke, layout and flag metadata, derives member modifiers,
//!   and drives eager or lazy type creation.
//! - **Unresolved model** ([`metadata::unresolved`]): the frozen output with interned,
//!   value-compared records.
//! - **Interning** ([`metadata::interning`]): canonicalization so identical subtrees share
//!   storage.
//!
//! # Usage Examples
//!
//! ```rust
//! use cildom::prelude::*;
//!
//! let mut module = Module::new("Demo.dll");
//! let mut ty = TypeDef::new(Token::type_def(1), "Demo", "Widget", TypeAttributes::PUBLIC);
//! ty.fields.push(Field::new(
//!     Token::field(1),
//!     "Count",
//!     FieldAttributes::PUBLIC,
//!     TypeSig::I4,
//! ));
//! module.types.push(std::sync::Arc::new(ty));
//!
//! let mut loader = MetadataLoader::new(LoaderConfig::default());
//! let assembly = loader.load_module(&ModuleHandle::new(module))?;
//!
//! let widget = &assembly.types()[0];
//! assert_eq!(widget.name.as_ref(), "Widget");
//! assert_eq!(widget.members()?.len(), 1);
//! # Ok::<(), cildom::Error>(())
//! ```
//!
//! # Concurrency
//!
//! A loader instance is single-threaded (the `&mut self` entry points enforce this); load
//! multiple assemblies in parallel with multiple instances. A returned assembly is safe for
//! concurrent readers. In lazy mode, the deferred lists materialize under a module-wide lock
//! and publish lock-free; [`metadata::unresolved::UnresolvedAssembly::finish_lazy_loading`]
//! forces everything and releases the source graph.
//!
//! # Standards Compliance
//!
//! The source graph follows the **ECMA-335 specification** (6th edition) for the Common
//! Language Infrastructure: metadata table semantics, attribute encodings, marshalling
//! descriptors and the element-type grammar all conform to this standard.

#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types.
pub mod prelude;

/// CLI metadata loading and the unresolved type system.
pub mod metadata;

/// `cildom` Result type.
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always
/// [`crate::Error`]. Used consistently throughout the crate for all fallible operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `cildom` Error type.
///
/// The main error type for all operations in this crate. See [`error::Error`] for the
/// individual failure modes.
pub use error::Error;

/// Main entry point for loading a module.
pub use metadata::loader::MetadataLoader;

/// Loader configuration.
pub use metadata::loader::LoaderConfig;

/// The frozen per-module result.
pub use metadata::unresolved::UnresolvedAssembly;
