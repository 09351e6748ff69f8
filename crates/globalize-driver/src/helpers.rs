//! Collecting the runtime helpers a bundle needs

use std::collections::BTreeSet;

use globalize_codegen::Helper;
pub use globalize_codegen::{ExternalHelpers, HelperGenerator};

use crate::compile::CompilationSet;

/// Union of the helpers used by every compiled module.
pub fn used_helpers(set: &CompilationSet) -> BTreeSet<Helper> {
    set.iter()
        .flat_map(|(_, result)| result.module.helpers.iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile_all;
    use crate::loader::{MemoryLoader, SourceFile};
    use crate::options::BundleOptions;
    use crate::resolver::SpecifierResolver;
    use globalize_codegen::GlobalsCompiler;

    #[test]
    fn test_union_of_module_helpers() {
        let options = BundleOptions::default();
        let resolver = SpecifierResolver::from_options(&options);
        let files = [
            SourceFile::new("/p/a.js", "import * as b from './b';"),
            SourceFile::new("/p/b.js", "export * from './c';\nexport * as d from './c';"),
            SourceFile::new("/p/c.js", "export const c = 1;"),
        ];
        let set = compile_all(&files, &options, &resolver, &GlobalsCompiler, &MemoryLoader::new()).unwrap();

        let helpers = used_helpers(&set);
        assert_eq!(helpers.into_iter().collect::<Vec<_>>(), vec![Helper::Namespace, Helper::ExportStar]);
    }

    #[test]
    fn test_no_helpers_for_plain_modules() {
        let options = BundleOptions::default();
        let resolver = SpecifierResolver::from_options(&options);
        let files = [SourceFile::new("/p/a.js", "export default 1;")];
        let set = compile_all(&files, &options, &resolver, &GlobalsCompiler, &MemoryLoader::new()).unwrap();
        assert!(used_helpers(&set).is_empty());
    }
}
