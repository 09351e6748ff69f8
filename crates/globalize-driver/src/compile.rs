//! Compiling the input modules and everything they import

use std::collections::{HashMap, HashSet};

use globalize_codegen::{CompileInput, CompiledModule, ModuleCompiler};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::BundleError;
use crate::loader::{SourceFile, SourceLoader};
use crate::options::{BundleOptions, UnresolvedImportPolicy};
use crate::resolver::{ModuleKey, SpecifierResolver};

/// Index of a module in a [`CompilationSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleIdx(pub usize);

#[derive(Debug, Clone)]
pub struct CompilationResult {
    pub key: ModuleKey,
    pub module: CompiledModule,
}

/// An import whose target could not be loaded (warn policy only)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedImport {
    pub importer: ModuleKey,
    pub specifier: String,
    pub target: ModuleKey,
}

/// Every module compiled for one invocation, in discovery order.
#[derive(Debug, Default)]
pub struct CompilationSet {
    results: Vec<CompilationResult>,
    index: HashMap<ModuleKey, ModuleIdx>,
    inputs: Vec<ModuleIdx>,
    unresolved: Vec<UnresolvedImport>,
}

impl CompilationSet {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, idx: ModuleIdx) -> &CompilationResult {
        &self.results[idx.0]
    }

    pub fn lookup(&self, key: &ModuleKey) -> Option<ModuleIdx> {
        self.index.get(key).copied()
    }

    /// The modules passed in as inputs, in input order
    pub fn inputs(&self) -> &[ModuleIdx] {
        &self.inputs
    }

    pub fn unresolved(&self) -> &[UnresolvedImport] {
        &self.unresolved
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModuleIdx, &CompilationResult)> {
        self.results.iter().enumerate().map(|(i, result)| (ModuleIdx(i), result))
    }

    fn push(&mut self, key: ModuleKey, module: CompiledModule) -> ModuleIdx {
        let idx = ModuleIdx(self.results.len());
        self.index.insert(key.clone(), idx);
        self.results.push(CompilationResult { key, module });
        idx
    }
}

/// Compiles `files` and, wave by wave, every module they transitively
/// import. Modules within a wave compile in parallel; results keep
/// discovery order.
pub fn compile_all<C, L>(
    files: &[SourceFile],
    options: &BundleOptions,
    resolver: &SpecifierResolver,
    compiler: &C,
    loader: &L,
) -> Result<CompilationSet, BundleError>
where
    C: ModuleCompiler + ?Sized,
    L: SourceLoader + ?Sized,
{
    let compiler_options = options.compiler_options();
    let mut set = CompilationSet::default();
    let mut seen = HashSet::new();
    let mut missing = HashSet::new();

    let mut wave = Vec::with_capacity(files.len());
    for file in files {
        let key = resolver.key_for(&file.path);
        if !seen.insert(key.clone()) {
            return Err(BundleError::DuplicateModule(key));
        }
        wave.push((key, file.contents.clone()));
    }

    let mut is_input_wave = true;
    while !wave.is_empty() {
        let compiled: Vec<_> = wave
            .par_iter()
            .map(|(key, text)| {
                let filename = key.to_string();
                let rewrite = |specifier: &str| resolver.resolve(specifier, key).to_string();
                compiler.compile(CompileInput {
                    source: text,
                    filename: &filename,
                    options: &compiler_options,
                    rewrite: &rewrite,
                })
            })
            .collect();

        let mut next = Vec::new();
        for ((key, text), result) in wave.into_iter().zip(compiled) {
            let module = match result {
                Ok(module) => module,
                Err(errors) => {
                    return Err(BundleError::Compile {
                        file: key,
                        text,
                        errors,
                    })
                }
            };
            debug!(module = %key, imports = module.imports.len(), "compiled module");

            for specifier in &module.imports {
                let target = resolver.resolve(specifier, &key);
                if seen.contains(&target) {
                    continue;
                }

                if !missing.contains(&target) {
                    match loader.load(&target) {
                        Ok(contents) => {
                            debug!(importer = %key, target = %target, "discovered module");
                            seen.insert(target.clone());
                            next.push((target, contents));
                            continue;
                        }
                        Err(err) => {
                            if options.on_unresolved_import == UnresolvedImportPolicy::Error {
                                return Err(BundleError::UnresolvableImport {
                                    importer: key,
                                    specifier: specifier.clone(),
                                    target,
                                    reason: err.to_string(),
                                });
                            }
                            warn!(
                                importer = %key,
                                specifier = %specifier,
                                target = %target,
                                "unresolved import: {}",
                                err
                            );
                            missing.insert(target.clone());
                        }
                    }
                }

                set.unresolved.push(UnresolvedImport {
                    importer: key.clone(),
                    specifier: specifier.clone(),
                    target,
                });
            }

            let idx = set.push(key, module);
            if is_input_wave {
                set.inputs.push(idx);
            }
        }

        wave = next;
        is_input_wave = false;
    }

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;
    use globalize_codegen::GlobalsCompiler;

    fn compile(files: &[SourceFile], loader: &MemoryLoader, options: &BundleOptions) -> Result<CompilationSet, BundleError> {
        let resolver = SpecifierResolver::from_options(options);
        compile_all(files, options, &resolver, &GlobalsCompiler, loader)
    }

    fn keys(set: &CompilationSet) -> Vec<String> {
        set.iter().map(|(_, result)| result.key.to_string()).collect()
    }

    #[test]
    fn test_discovers_transitive_imports_in_waves() {
        let loader = MemoryLoader::new()
            .with_file("/src/b.js", "import c from './c'; export default c;")
            .with_file("/src/c.js", "export default 3;");
        let files = [SourceFile::new("/src/a.js", "import b from './b';")];

        let set = compile(&files, &loader, &BundleOptions::default()).unwrap();
        assert_eq!(keys(&set), vec!["/src/a.js", "/src/b.js", "/src/c.js"]);
        assert_eq!(set.inputs(), &[ModuleIdx(0)]);
        assert!(set.unresolved().is_empty());
    }

    #[test]
    fn test_inputs_are_not_loaded_again() {
        let files = [
            SourceFile::new("/src/a.js", "import b from './b';"),
            SourceFile::new("/src/b", "export default 2;"),
        ];
        let set = compile(&files, &MemoryLoader::new(), &BundleOptions::default()).unwrap();
        assert_eq!(keys(&set), vec!["/src/a.js", "/src/b.js"]);
        assert_eq!(set.inputs(), &[ModuleIdx(0), ModuleIdx(1)]);
    }

    #[test]
    fn test_duplicate_inputs_are_rejected() {
        let files = [
            SourceFile::new("/src/a.js", ""),
            SourceFile::new("/src/x/../a", ""),
        ];
        let err = compile(&files, &MemoryLoader::new(), &BundleOptions::default()).unwrap_err();
        assert!(matches!(err, BundleError::DuplicateModule(key) if key.to_string() == "/src/a.js"));
    }

    #[test]
    fn test_unresolved_import_policy() {
        let files = [SourceFile::new("/src/a.js", "import m from './missing';\nimport n from './missing.js';")];

        let err = compile(&files, &MemoryLoader::new(), &BundleOptions::default()).unwrap_err();
        assert!(matches!(err, BundleError::UnresolvableImport { ref specifier, .. } if specifier == "./missing"));

        let options = BundleOptions {
            on_unresolved_import: UnresolvedImportPolicy::Warn,
            ..BundleOptions::default()
        };
        let set = compile(&files, &MemoryLoader::new(), &options).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.unresolved().len(), 2);
        assert_eq!(set.unresolved()[0].target, set.unresolved()[1].target);
    }

    #[test]
    fn test_compile_errors_abort() {
        let files = [SourceFile::new("/src/bad.js", "let s = 'open")];
        let err = compile(&files, &MemoryLoader::new(), &BundleOptions::default()).unwrap_err();
        match err {
            BundleError::Compile { file, errors, .. } => {
                assert_eq!(file.to_string(), "/src/bad.js");
                assert_eq!(errors[0].message, "Unterminated string literal");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
