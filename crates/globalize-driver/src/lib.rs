//! Globalize Driver Library
//!
//! Bundling pipeline: specifier resolution, compilation of every reachable
//! module, dependency graph, topological ordering, helper aggregation and
//! assembly of the final script with its source map.

pub mod bundle;
pub mod compile;
pub mod concat;
pub mod dep_graph;
pub mod error;
pub mod helpers;
pub mod loader;
pub mod options;
pub mod order;
pub mod resolver;

pub use bundle::{compile_to_globals, BundleArtifact, Bundler};
pub use compile::{CompilationResult, CompilationSet, ModuleIdx, UnresolvedImport};
pub use dep_graph::DepGraph;
pub use error::BundleError;
pub use loader::{FsLoader, MemoryLoader, SourceFile, SourceLoader};
pub use options::{BundleOptions, SkipInit, UnresolvedImportPolicy};
pub use resolver::{AliasRewrite, ModuleKey, SpecifierResolver, SpecifierRewrite};
