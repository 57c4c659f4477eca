//! CLI metadata loading and the unresolved type system.
//!
//! The module is layered the way the data flows:
//!
//! - [`source`] - the object-level metadata graph produced by an external byte-level parser
//! - [`token`] - metadata tokens carried from the source graph into the output
//! - [`interning`] - the canonicalization pool for value-shaped records
//! - [`loader`] - the translation from the source graph to the unresolved model
//! - [`unresolved`] - the frozen output entities
//!
//! # Usage Examples
//!
//! ```rust
//! use cildom::metadata::loader::{LoaderConfig, MetadataLoader};
//! use cildom::metadata::source::{Module, ModuleHandle};
//!
//! let module = Module::new("Demo.dll");
//! let mut loader = MetadataLoader::new(LoaderConfig::default());
//! let assembly = loader.load_module(&ModuleHandle::new(module))?;
//! assert_eq!(assembly.name().as_ref(), "Demo.dll");
//! # Ok::<(), cildom::Error>(())
//! ```

pub mod interning;
pub mod loader;
pub mod source;
pub mod token;
pub mod unresolved;
