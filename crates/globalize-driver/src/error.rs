//! Errors that abort a bundling invocation

use std::io;
use std::path::PathBuf;

use globalize_codegen::CompileError;
use globalize_sourcemap::SourceMapError;
use thiserror::Error;

use crate::resolver::ModuleKey;

#[derive(Debug, Error)]
pub enum BundleError {
    /// Two inputs canonicalize to the same module
    #[error("module {0} is listed more than once")]
    DuplicateModule(ModuleKey),

    #[error("cannot resolve import {specifier:?} in {importer}: {target} could not be loaded: {reason}")]
    UnresolvableImport {
        importer: ModuleKey,
        specifier: String,
        target: ModuleKey,
        reason: String,
    },

    /// The compiler rejected a module; `text` is the module source.
    #[error("failed to compile {file} ({} error(s))", .errors.len())]
    Compile {
        file: ModuleKey,
        text: String,
        errors: Vec<CompileError>,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    SourceMap(#[from] SourceMapError),
}
