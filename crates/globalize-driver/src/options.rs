//! Bundling options and their JSON configuration form

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use globalize_codegen::CompilerOptions;
use serde::{Deserialize, Serialize};

use crate::error::BundleError;
use crate::resolver::SpecifierRewrite;

/// What to do when an import names a module that cannot be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedImportPolicy {
    /// Abort the bundle
    #[default]
    Error,
    /// Log a warning and leave the module out
    Warn,
}

/// Which namespace initializers to leave out of the bundle.
///
/// Configured as `true`/`false` or `{ "named": true }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "SkipInitRepr", into = "SkipInitRepr")]
pub enum SkipInit {
    #[default]
    None,
    /// Skip both `init.js` and `initNamed.js`
    All,
    /// Skip only `initNamed.js`
    Named,
}

impl SkipInit {
    pub fn skips_primary(self) -> bool {
        self == SkipInit::All
    }

    pub fn skips_named(self) -> bool {
        matches!(self, SkipInit::All | SkipInit::Named)
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum SkipInitRepr {
    Flag(bool),
    Detailed {
        #[serde(default)]
        named: bool,
    },
}

impl From<SkipInitRepr> for SkipInit {
    fn from(repr: SkipInitRepr) -> Self {
        match repr {
            SkipInitRepr::Flag(true) => SkipInit::All,
            SkipInitRepr::Detailed { named: true } => SkipInit::Named,
            SkipInitRepr::Flag(false) | SkipInitRepr::Detailed { named: false } => SkipInit::None,
        }
    }
}

impl From<SkipInit> for SkipInitRepr {
    fn from(skip: SkipInit) -> Self {
        match skip {
            SkipInit::None => SkipInitRepr::Flag(false),
            SkipInit::All => SkipInitRepr::Flag(true),
            SkipInit::Named => SkipInitRepr::Detailed { named: true },
        }
    }
}

/// Options for one bundling invocation.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BundleOptions {
    /// Global object holding default exports; named exports go on
    /// `<name>Named`.
    pub global_namespace_name: String,
    /// Bundle filename, recorded as the source map's `file`
    pub output_artifact_name: String,
    pub skip_namespace_init: SkipInit,
    /// Reach the namespaces through `this` rather than as bare variables
    pub attach_to_global_object: bool,
    /// Wrap the whole bundle in `(function () { ... }).call(this);`
    pub scope_wrapper: bool,
    pub on_unresolved_import: UnresolvedImportPolicy,
    /// Specifier prefix rewrites applied before canonicalization
    pub aliases: BTreeMap<String, String>,
    /// Appended to specifiers whose last component has no extension
    pub default_extension: String,
    /// Embed original sources in the source map
    pub sources_content: bool,
    /// Programmatic specifier rewrite, applied after `aliases`
    #[serde(skip)]
    pub specifier_rewrite_override: Option<Arc<dyn SpecifierRewrite>>,
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            global_namespace_name: "myGlobals".to_string(),
            output_artifact_name: "bundle.js".to_string(),
            skip_namespace_init: SkipInit::None,
            attach_to_global_object: true,
            scope_wrapper: false,
            on_unresolved_import: UnresolvedImportPolicy::Error,
            aliases: BTreeMap::new(),
            default_extension: "js".to_string(),
            sources_content: true,
            specifier_rewrite_override: None,
        }
    }
}

impl BundleOptions {
    pub fn from_json_str(json: &str) -> Result<Self, BundleError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, BundleError> {
        let json = std::fs::read_to_string(path).map_err(|source| BundleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn with_specifier_rewrite(mut self, rewrite: impl SpecifierRewrite + 'static) -> Self {
        self.specifier_rewrite_override = Some(Arc::new(rewrite));
        self
    }

    /// Settings handed to the per-file compiler
    pub fn compiler_options(&self) -> CompilerOptions {
        CompilerOptions {
            namespace: self.global_namespace_name.clone(),
            attach_to_global_object: self.attach_to_global_object,
            sources_content: self.sources_content,
        }
    }
}

impl fmt::Debug for BundleOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleOptions")
            .field("global_namespace_name", &self.global_namespace_name)
            .field("output_artifact_name", &self.output_artifact_name)
            .field("skip_namespace_init", &self.skip_namespace_init)
            .field("attach_to_global_object", &self.attach_to_global_object)
            .field("scope_wrapper", &self.scope_wrapper)
            .field("on_unresolved_import", &self.on_unresolved_import)
            .field("aliases", &self.aliases)
            .field("default_extension", &self.default_extension)
            .field("sources_content", &self.sources_content)
            .field("specifier_rewrite_override", &self.specifier_rewrite_override.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = BundleOptions::from_json_str("{}").unwrap();
        assert_eq!(options.global_namespace_name, "myGlobals");
        assert_eq!(options.output_artifact_name, "bundle.js");
        assert_eq!(options.skip_namespace_init, SkipInit::None);
        assert!(options.attach_to_global_object);
        assert!(!options.scope_wrapper);
        assert_eq!(options.on_unresolved_import, UnresolvedImportPolicy::Error);
        assert_eq!(options.default_extension, "js");
    }

    #[test]
    fn test_skip_namespace_init_forms() {
        let parse = |json: &str| BundleOptions::from_json_str(json).unwrap().skip_namespace_init;
        assert_eq!(parse(r#"{"skipNamespaceInit": true}"#), SkipInit::All);
        assert_eq!(parse(r#"{"skipNamespaceInit": false}"#), SkipInit::None);
        assert_eq!(parse(r#"{"skipNamespaceInit": {"named": true}}"#), SkipInit::Named);
        assert_eq!(parse(r#"{"skipNamespaceInit": {}}"#), SkipInit::None);

        assert!(SkipInit::Named.skips_named());
        assert!(!SkipInit::Named.skips_primary());
    }

    #[test]
    fn test_full_config() {
        let options = BundleOptions::from_json_str(
            r#"{
                "globalNamespaceName": "app",
                "outputArtifactName": "out.js",
                "attachToGlobalObject": false,
                "scopeWrapper": true,
                "onUnresolvedImport": "warn",
                "aliases": { "@/": "/src/" }
            }"#,
        )
        .unwrap();
        assert_eq!(options.global_namespace_name, "app");
        assert_eq!(options.on_unresolved_import, UnresolvedImportPolicy::Warn);
        assert_eq!(options.aliases.get("@/").map(String::as_str), Some("/src/"));

        let compiler = options.compiler_options();
        assert_eq!(compiler.namespace_root(), "app");
        assert_eq!(compiler.named_root(), "appNamed");
    }

    #[test]
    fn test_invalid_config() {
        let err = BundleOptions::from_json_str(r#"{"onUnresolvedImport": "ignore"}"#).unwrap_err();
        assert!(matches!(err, BundleError::Config(_)));
    }
}
