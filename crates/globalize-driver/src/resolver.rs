//! Specifier resolution for import statements

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::options::BundleOptions;

/// Canonical identity of a module: a lexically normalized path with an
/// extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleKey(PathBuf);

impl ModuleKey {
    /// Normalizes `path` and appends `default_extension` when the last
    /// component has none.
    pub fn new(path: impl AsRef<Path>, default_extension: &str) -> Self {
        let mut path = normalize(path.as_ref());
        if path.file_name().is_some() && path.extension().is_none() && !default_extension.is_empty() {
            path.set_extension(default_extension);
        }
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Directory that relative specifiers in this module resolve against
    pub fn dir(&self) -> &Path {
        self.0.parent().unwrap_or_else(|| Path::new(""))
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Rewrites a specifier before it is canonicalized.
pub trait SpecifierRewrite: Send + Sync {
    fn rewrite(&self, specifier: &str, importer: &Path) -> String;
}

impl<F> SpecifierRewrite for F
where
    F: Fn(&str, &Path) -> String + Send + Sync,
{
    fn rewrite(&self, specifier: &str, importer: &Path) -> String {
        self(specifier, importer)
    }
}

/// Prefix aliases; the longest matching prefix wins.
#[derive(Debug, Clone, Default)]
pub struct AliasRewrite {
    aliases: Vec<(String, String)>,
}

impl AliasRewrite {
    pub fn new(aliases: &BTreeMap<String, String>) -> Self {
        let mut aliases: Vec<_> = aliases.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        aliases.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        Self { aliases }
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl SpecifierRewrite for AliasRewrite {
    fn rewrite(&self, specifier: &str, _importer: &Path) -> String {
        for (prefix, replacement) in &self.aliases {
            if let Some(rest) = specifier.strip_prefix(prefix.as_str()) {
                return format!("{}{}", replacement, rest);
            }
        }
        specifier.to_string()
    }
}

/// Resolves import specifiers to canonical module keys.
///
/// Aliases apply first, then the caller's override, then the result is
/// joined to the importing file's directory (unless rooted) and normalized.
/// Resolution is purely lexical and never touches the filesystem.
#[derive(Clone)]
pub struct SpecifierResolver {
    aliases: AliasRewrite,
    rewrite: Option<Arc<dyn SpecifierRewrite>>,
    default_extension: String,
}

impl SpecifierResolver {
    pub fn new(default_extension: impl Into<String>) -> Self {
        Self {
            aliases: AliasRewrite::default(),
            rewrite: None,
            default_extension: default_extension.into(),
        }
    }

    pub fn from_options(options: &BundleOptions) -> Self {
        Self {
            aliases: AliasRewrite::new(&options.aliases),
            rewrite: options.specifier_rewrite_override.clone(),
            default_extension: options.default_extension.clone(),
        }
    }

    pub fn with_rewrite(mut self, rewrite: Arc<dyn SpecifierRewrite>) -> Self {
        self.rewrite = Some(rewrite);
        self
    }

    /// Canonical key for an input path
    pub fn key_for(&self, path: &Path) -> ModuleKey {
        ModuleKey::new(path, &self.default_extension)
    }

    /// Resolve `specifier` as written in the module `from`
    pub fn resolve(&self, specifier: &str, from: &ModuleKey) -> ModuleKey {
        let mut specifier = if self.aliases.is_empty() {
            specifier.to_string()
        } else {
            self.aliases.rewrite(specifier, from.path())
        };
        if let Some(rewrite) = &self.rewrite {
            specifier = rewrite.rewrite(&specifier, from.path());
        }

        let target = Path::new(&specifier);
        if target.has_root() {
            self.key_for(target)
        } else {
            self.key_for(&from.dir().join(target))
        }
    }
}

impl fmt::Debug for SpecifierResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecifierResolver")
            .field("aliases", &self.aliases)
            .field("rewrite", &self.rewrite.as_ref().map(|_| "<fn>"))
            .field("default_extension", &self.default_extension)
            .finish()
    }
}

/// Collapses `.` and `..` components without consulting the filesystem.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                // `..` at the root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            Component::Normal(part) => normalized.push(part),
        }
    }

    normalized
}
