//! Runtime helpers referenced by compiled modules
//!
//! Compiled code calls helpers as `globalizeHelpers.<name>(...)`. The bundle
//! defines each helper once, before the first module.

use std::collections::BTreeSet;
use std::fmt;

/// Global object that holds the helper functions.
pub const HELPERS_OBJECT: &str = "globalizeHelpers";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Helper {
    /// `namespace(defaultValue, named)`: namespace object for `import * as`
    Namespace,
    /// `exportStar(target, source)`: copies named exports for `export *`
    ExportStar,
}

impl Helper {
    pub fn name(self) -> &'static str {
        match self {
            Helper::Namespace => "namespace",
            Helper::ExportStar => "exportStar",
        }
    }

    /// Call expression prefix, e.g. `globalizeHelpers.namespace`
    pub fn callee(self) -> String {
        format!("{}.{}", HELPERS_OBJECT, self.name())
    }

    fn definition(self) -> &'static str {
        match self {
            Helper::Namespace => NAMESPACE_HELPER,
            Helper::ExportStar => EXPORT_STAR_HELPER,
        }
    }
}

impl fmt::Display for Helper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Produces the code that defines a set of helpers.
pub trait HelperGenerator: Send + Sync {
    fn generate(&self, helpers: &BTreeSet<Helper>) -> String;
}

/// Emits standalone ES5 definitions onto [`HELPERS_OBJECT`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalHelpers;

impl HelperGenerator for ExternalHelpers {
    fn generate(&self, helpers: &BTreeSet<Helper>) -> String {
        if helpers.is_empty() {
            return String::new();
        }

        let mut code = format!("var {0} = {0} || {{}};\n", HELPERS_OBJECT);
        for helper in helpers {
            code.push_str(&format!("{} = {}", helper.callee(), helper.definition()));
        }
        code
    }
}

const NAMESPACE_HELPER: &str = r#"function (defaultValue, named) {
  var ns = {};
  if (named) {
    for (var key in named) {
      if (Object.prototype.hasOwnProperty.call(named, key)) {
        ns[key] = named[key];
      }
    }
  }
  ns["default"] = defaultValue;
  return ns;
};
"#;

const EXPORT_STAR_HELPER: &str = r#"function (target, source) {
  if (source) {
    Object.keys(source).forEach(function (key) {
      if (key !== "default" && !Object.prototype.hasOwnProperty.call(target, key)) {
        target[key] = source[key];
      }
    });
  }
  return target;
};
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_helpers_generates_nothing() {
        assert_eq!(ExternalHelpers.generate(&BTreeSet::new()), "");
    }

    #[test]
    fn test_generates_each_helper_once() {
        let helpers: BTreeSet<_> = [Helper::ExportStar, Helper::Namespace].into_iter().collect();
        let code = ExternalHelpers.generate(&helpers);

        assert!(code.starts_with("var globalizeHelpers = globalizeHelpers || {};\n"));
        assert_eq!(code.matches("globalizeHelpers.namespace = function").count(), 1);
        assert_eq!(code.matches("globalizeHelpers.exportStar = function").count(), 1);
        // BTreeSet order follows declaration order
        assert!(code.find("namespace =").unwrap() < code.find("exportStar =").unwrap());
    }

    #[test]
    fn test_single_helper() {
        let helpers: BTreeSet<_> = [Helper::ExportStar].into_iter().collect();
        let code = ExternalHelpers.generate(&helpers);
        assert!(code.contains("exportStar"));
        assert!(!code.contains("namespace ="));
    }
}
