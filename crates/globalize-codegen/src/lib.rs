//! Globalize Code Generator
//!
//! Compiles a single ES module into a plain script that publishes its exports
//! on global namespace objects and reads its imports from them. Each compiled
//! module carries its own source map and the set of runtime helpers it calls.

mod compiler;
mod error;
mod runtime;
mod writer;

use std::collections::BTreeSet;

use globalize_sourcemap::SourceMap;

pub use compiler::{
    is_identifier_name, member, module_slot, CompileInput, CompilerOptions, GlobalsCompiler, ModuleCompiler,
};
pub use error::CompileError;
pub use runtime::{ExternalHelpers, Helper, HelperGenerator, HELPERS_OBJECT};

/// Output of compiling one module
#[derive(Debug, Clone)]
pub struct CompiledModule {
    /// The wrapped, rewritten module code
    pub code: String,
    /// Maps `code` back to the module source
    pub map: SourceMap,
    /// Import and re-export specifiers as written, in declaration order
    pub imports: Vec<String>,
    /// Runtime helpers the code calls
    pub helpers: BTreeSet<Helper>,
}
