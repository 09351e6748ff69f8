//! Assembling compiled modules into one script

use globalize_codegen::{ExternalHelpers, GlobalsCompiler, HelperGenerator, ModuleCompiler};
use globalize_sourcemap::SourceMap;
use tracing::{debug, info, info_span};

use crate::compile::compile_all;
use crate::concat::Concat;
use crate::dep_graph::DepGraph;
use crate::error::BundleError;
use crate::helpers::used_helpers;
use crate::loader::{FsLoader, SourceFile, SourceLoader};
use crate::options::BundleOptions;
use crate::order::topological_order;
use crate::resolver::SpecifierResolver;

pub const INIT_FRAGMENT: &str = "init.js";
pub const INIT_NAMED_FRAGMENT: &str = "initNamed.js";
pub const HELPERS_FRAGMENT: &str = "helpers.js";

const SCOPE_OPEN: &str = "(function () {";
const SCOPE_CLOSE: &str = "}).call(this);";

/// The bundled script and its source map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleArtifact {
    pub content: String,
    /// Source map JSON; `file` is the artifact name
    pub source_map: String,
    /// Named fragments in emission order: initializers, `helpers.js`, then
    /// one canonical filename per module
    pub fragments: Vec<String>,
}

impl BundleArtifact {
    pub fn parsed_source_map(&self) -> Result<SourceMap, BundleError> {
        Ok(SourceMap::from_json(&self.source_map)?)
    }
}

/// Bundles ES modules into a single script that links them through global
/// namespace objects.
///
/// A bundler holds no state between calls; every [`Bundler::bundle`] works on
/// a fresh compilation set.
#[derive(Debug, Clone, Default)]
pub struct Bundler<C = GlobalsCompiler, L = FsLoader, H = ExternalHelpers> {
    compiler: C,
    loader: L,
    helpers: H,
}

impl Bundler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C, L, H> Bundler<C, L, H>
where
    C: ModuleCompiler,
    L: SourceLoader,
    H: HelperGenerator,
{
    pub fn with_parts(compiler: C, loader: L, helpers: H) -> Self {
        Self {
            compiler,
            loader,
            helpers,
        }
    }

    /// Replaces the loader used for modules reached only through imports.
    pub fn with_loader<L2: SourceLoader>(self, loader: L2) -> Bundler<C, L2, H> {
        Bundler {
            compiler: self.compiler,
            loader,
            helpers: self.helpers,
        }
    }

    pub fn bundle(&self, files: &[SourceFile], options: &BundleOptions) -> Result<BundleArtifact, BundleError> {
        let span = info_span!("bundle", artifact = %options.output_artifact_name, inputs = files.len());
        let _enter = span.enter();

        let resolver = SpecifierResolver::from_options(options);
        let set = compile_all(files, options, &resolver, &self.compiler, &self.loader)?;

        let graph = DepGraph::build(&set, &resolver);
        for cycle in graph.find_cycles() {
            let members: Vec<_> = cycle.iter().map(|&idx| set.get(idx).key.to_string()).collect();
            debug!(cycle = %members.join(" -> "), "import cycle, ordering by first encounter");
        }
        let order = topological_order(&set, &graph);

        let helpers = used_helpers(&set);
        let helper_code = self.helpers.generate(&helpers);

        let mut concat = Concat::new(options.output_artifact_name.clone());
        if options.scope_wrapper {
            concat.add(None, SCOPE_OPEN, None)?;
        }
        if !options.skip_namespace_init.skips_primary() {
            let init = namespace_init(&options.global_namespace_name, options.attach_to_global_object);
            concat.add(Some(INIT_FRAGMENT), &init, None)?;
        }
        if !options.skip_namespace_init.skips_named() {
            let named = options.compiler_options().named_namespace();
            let init = namespace_init(&named, options.attach_to_global_object);
            concat.add(Some(INIT_NAMED_FRAGMENT), &init, None)?;
        }
        concat.add(Some(HELPERS_FRAGMENT), &helper_code, None)?;

        for &idx in &order {
            let result = set.get(idx);
            concat.add(Some(&result.key.to_string()), &result.module.code, Some(&result.module.map))?;
        }
        if options.scope_wrapper {
            concat.add(None, SCOPE_CLOSE, None)?;
        }

        let (content, map, fragments) = concat.finish();
        info!(
            modules = order.len(),
            helpers = helpers.len(),
            bytes = content.len(),
            "bundle assembled"
        );

        Ok(BundleArtifact {
            content,
            source_map: map.to_json()?,
            fragments,
        })
    }
}

/// Bundles `files` with the default compiler, loader and helpers.
pub fn compile_to_globals(files: &[SourceFile], options: &BundleOptions) -> Result<BundleArtifact, BundleError> {
    Bundler::new().bundle(files, options)
}

/// Initializer that creates the namespace object unless it already exists.
pub fn namespace_init(name: &str, attach_to_global_object: bool) -> String {
    if attach_to_global_object {
        format!(
            "if (typeof this.{0} !== \"object\" || this.{0} === null) {{ this.{0} = {{}}; }}",
            name
        )
    } else {
        format!("var {0} = typeof {0} === \"object\" && {0} !== null ? {0} : {{}};", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_init_forms() {
        assert_eq!(
            namespace_init("myGlobals", true),
            "if (typeof this.myGlobals !== \"object\" || this.myGlobals === null) { this.myGlobals = {}; }"
        );
        assert_eq!(
            namespace_init("g", false),
            "var g = typeof g === \"object\" && g !== null ? g : {};"
        );
    }
}
