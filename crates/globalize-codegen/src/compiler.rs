//! The globals transform
//!
//! Rewrites the import and export declarations of one module into reads and
//! writes on the shared namespace objects and wraps the module body in its
//! own function scope.

use std::collections::BTreeSet;
use std::path::Path;

use globalize_ast::*;
use globalize_lexer::Lexer;
use globalize_parser::Parser;

use crate::runtime::Helper;
use crate::writer::CodeWriter;
use crate::{CompileError, CompiledModule};

/// Namespace settings for one compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Name of the primary namespace; named exports live on `<name>Named`.
    pub namespace: String,
    /// Reach the namespaces through `this` instead of bare identifiers.
    pub attach_to_global_object: bool,
    /// Embed the source text in the per-file source map.
    pub sources_content: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            namespace: "myGlobals".to_string(),
            attach_to_global_object: true,
            sources_content: true,
        }
    }
}

impl CompilerOptions {
    /// Expression for the default-export namespace, e.g. `this.myGlobals`.
    pub fn namespace_root(&self) -> String {
        self.qualify(&self.namespace)
    }

    /// Expression for the named-export namespace, e.g. `this.myGlobalsNamed`.
    pub fn named_root(&self) -> String {
        self.qualify(&self.named_namespace())
    }

    pub fn named_namespace(&self) -> String {
        format!("{}Named", self.namespace)
    }

    fn qualify(&self, name: &str) -> String {
        if self.attach_to_global_object {
            format!("this.{}", name)
        } else {
            name.to_string()
        }
    }
}

/// Everything the compiler needs for one file.
pub struct CompileInput<'a> {
    pub source: &'a str,
    /// Canonical filename; its stem names the module's namespace slot.
    pub filename: &'a str,
    pub options: &'a CompilerOptions,
    /// Maps a specifier, as written, to the canonical filename of its target.
    pub rewrite: &'a dyn Fn(&str) -> String,
}

/// A per-file compiler pluggable into the bundler.
pub trait ModuleCompiler: Send + Sync {
    fn compile(&self, input: CompileInput<'_>) -> Result<CompiledModule, Vec<CompileError>>;
}

/// Compiles ES modules into scripts that link through global namespaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalsCompiler;

impl ModuleCompiler for GlobalsCompiler {
    fn compile(&self, input: CompileInput<'_>) -> Result<CompiledModule, Vec<CompileError>> {
        let tokens = Lexer::new(input.source).tokenize();
        let program = Parser::new(tokens)
            .parse_program()
            .map_err(|errors| errors.into_iter().map(CompileError::from).collect::<Vec<_>>())?;

        Transform::new(&input).run(&program)
    }
}

/// Slot name of a module on the namespaces: the file stem.
pub fn module_slot(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string())
}

/// `base.name`, or `base["name"]` when `name` is not an identifier.
pub fn member(base: &str, name: &str) -> String {
    if is_identifier_name(name) {
        format!("{}.{}", base, name)
    } else {
        format!("{}[{}]", base, serde_json::Value::String(name.to_string()))
    }
}

pub fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

struct Edit {
    start: usize,
    end: usize,
    text: String,
}

struct Transform<'a> {
    input: &'a CompileInput<'a>,
    root: String,
    named_root: String,
    /// `G.m` and `N.m` for this module
    own_default: String,
    own_named: String,
    edits: Vec<Edit>,
    /// Statements appended after the body, with the offset they map to
    trailer: Vec<(String, usize)>,
    helpers: BTreeSet<Helper>,
    errors: Vec<CompileError>,
}

impl<'a> Transform<'a> {
    fn new(input: &'a CompileInput<'a>) -> Self {
        let root = input.options.namespace_root();
        let named_root = input.options.named_root();
        let slot = module_slot(input.filename);

        Self {
            own_default: member(&root, &slot),
            own_named: member(&named_root, &slot),
            root,
            named_root,
            input,
            edits: Vec::new(),
            trailer: Vec::new(),
            helpers: BTreeSet::new(),
            errors: Vec::new(),
        }
    }

    fn run(mut self, program: &Program) -> Result<CompiledModule, Vec<CompileError>> {
        for item in &program.items {
            match &item.value {
                ModuleItem::Import(import) => self.import(import, item.span),
                ModuleItem::Export(export) => self.export(export, item.span),
            }
        }

        if !self.errors.is_empty() {
            return Err(self.errors);
        }

        let source = self.input.source;
        let mut writer = CodeWriter::new(source, self.input.filename, self.input.options.sources_content);
        writer.write_generated("(function () {\n");
        if program.has_named_exports() {
            writer.write_generated(&format!("{} = {{}};\n", self.own_named));
        }

        let mut cursor = 0;
        for edit in &self.edits {
            writer.copy_verbatim(cursor, edit.start);
            writer.write_mapped(&edit.text, edit.start);
            cursor = edit.end;
        }
        writer.copy_verbatim(cursor, source.len());

        if !writer.ends_with_newline() {
            writer.write_generated("\n");
        }
        for (statement, offset) in &self.trailer {
            writer.write_mapped(statement, *offset);
            writer.write_generated("\n");
        }
        writer.write_generated("}).call(this);");

        let (code, map) = writer.finish();
        Ok(CompiledModule {
            code,
            map,
            imports: program.sources().into_iter().map(String::from).collect(),
            helpers: self.helpers,
        })
    }

    // =========================================================================
    // Namespace expressions
    // =========================================================================

    fn target_slot(&self, specifier: &str) -> String {
        module_slot(&(self.input.rewrite)(specifier))
    }

    /// `G.t`
    fn default_of(&self, specifier: &str) -> String {
        member(&self.root, &self.target_slot(specifier))
    }

    /// `N.t`
    fn named_of(&self, specifier: &str) -> String {
        member(&self.named_root, &self.target_slot(specifier))
    }

    /// `G.t` for `default`, `N.t.name` otherwise
    fn binding_of(&self, specifier: &str, name: &str) -> String {
        if name == "default" {
            self.default_of(specifier)
        } else {
            member(&self.named_of(specifier), name)
        }
    }

    /// Assignment target for an export of this module under `name`.
    fn export_slot(&self, name: &str) -> String {
        if name == "default" {
            self.own_default.clone()
        } else {
            member(&self.own_named, name)
        }
    }

    fn namespace_object(&mut self, specifier: &str) -> String {
        self.helpers.insert(Helper::Namespace);
        format!(
            "{}({}, {})",
            Helper::Namespace.callee(),
            self.default_of(specifier),
            self.named_of(specifier)
        )
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn import(&mut self, import: &ImportDecl, span: Span) {
        let specifier = import.source.value.as_str();
        let mut declarators = Vec::new();

        for spec in &import.specifiers {
            let value = match spec {
                ImportSpecifier::Default(_) => self.default_of(specifier),
                ImportSpecifier::Namespace(_) => self.namespace_object(specifier),
                ImportSpecifier::Named { imported, .. } => self.binding_of(specifier, &imported.value.name),
            };
            declarators.push(format!("{} = {}", spec.local_name(), value));
        }

        let text = if declarators.is_empty() {
            String::new()
        } else {
            format!("var {};", declarators.join(", "))
        };
        self.replace(span.start, span.end, text);
    }

    fn export(&mut self, export: &ExportDecl, span: Span) {
        match export {
            ExportDecl::DefaultExpr { keyword_span } => {
                let text = format!("{} =", self.own_default);
                self.replace(keyword_span.start, keyword_span.end, text);
            }
            ExportDecl::DefaultDecl { keyword_span, name, .. } => {
                self.strip_keyword(*keyword_span);
                let statement = format!("{} = {};", self.own_default, name.value.name);
                self.trailer.push((statement, span.start));
            }
            ExportDecl::Decl { keyword_span, names, .. } => {
                self.strip_keyword(*keyword_span);
                for name in names {
                    let statement = format!("{} = {};", self.export_slot(&name.value.name), name.value.name);
                    self.trailer.push((statement, name.span.start));
                }
            }
            ExportDecl::Named { specifiers, source: None } => {
                for spec in specifiers {
                    let local = &spec.local.value.name;
                    if !is_identifier_name(local) {
                        self.errors.push(CompileError::new(
                            format!("Cannot export string name '{}' without a 'from' clause", local),
                            spec.local.span,
                        ));
                        continue;
                    }
                    let statement = format!("{} = {};", self.export_slot(spec.exported_name()), local);
                    self.trailer.push((statement, spec.local.span.start));
                }
                self.replace(span.start, span.end, String::new());
            }
            ExportDecl::Named {
                specifiers,
                source: Some(source),
            } => {
                let statements: Vec<_> = specifiers
                    .iter()
                    .map(|spec| {
                        format!(
                            "{} = {};",
                            self.export_slot(spec.exported_name()),
                            self.binding_of(&source.value, &spec.local.value.name)
                        )
                    })
                    .collect();
                self.replace(span.start, span.end, statements.join(" "));
            }
            ExportDecl::All { source, as_name: None } => {
                self.helpers.insert(Helper::ExportStar);
                let text = format!(
                    "{}({}, {});",
                    Helper::ExportStar.callee(),
                    self.own_named,
                    self.named_of(&source.value)
                );
                self.replace(span.start, span.end, text);
            }
            ExportDecl::All {
                source,
                as_name: Some(as_name),
            } => {
                let namespace = self.namespace_object(&source.value);
                let text = format!("{} = {};", self.export_slot(&as_name.value.name), namespace);
                self.replace(span.start, span.end, text);
            }
        }
    }

    /// Removes an `export`/`export default` prefix and the blanks after it.
    fn strip_keyword(&mut self, keyword_span: Span) {
        let source = self.input.source.as_bytes();
        let mut end = keyword_span.end;
        while end < source.len() && matches!(source[end], b' ' | b'\t') {
            end += 1;
        }
        self.replace(keyword_span.start, end, String::new());
    }

    fn replace(&mut self, start: usize, end: usize, text: String) {
        self.edits.push(Edit { start, end, text });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile_with(source: &str, filename: &str, options: &CompilerOptions) -> CompiledModule {
        let rewrite = |specifier: &str| format!("/src/{}.js", specifier.trim_start_matches("./"));
        GlobalsCompiler
            .compile(CompileInput {
                source,
                filename,
                options,
                rewrite: &rewrite,
            })
            .expect("module should compile")
    }

    fn compile(source: &str) -> CompiledModule {
        compile_with(source, "/src/main.js", &CompilerOptions::default())
    }

    #[test]
    fn test_default_export_expression() {
        let module = compile("export default 'foo bar';\n");
        assert_eq!(
            module.code,
            "(function () {\nthis.myGlobals.main = 'foo bar';\n}).call(this);"
        );
        assert!(module.imports.is_empty());
        assert!(module.helpers.is_empty());
    }

    #[test]
    fn test_imports_become_namespace_reads() {
        let module = compile(
            "import './side';\nimport foo from './foo';\nimport { a, b as c, default as d } from './bar';\nexport default foo + a;",
        );
        assert_eq!(
            module.code,
            "(function () {\n\n\
             var foo = this.myGlobals.foo;\n\
             var a = this.myGlobalsNamed.bar.a, c = this.myGlobalsNamed.bar.b, d = this.myGlobals.bar;\n\
             this.myGlobals.main = foo + a;\n\
             }).call(this);"
        );
        assert_eq!(module.imports, vec!["./side", "./foo", "./bar"]);
    }

    #[test]
    fn test_namespace_import_uses_helper() {
        let module = compile("import * as util from './util';\nutil.run();");
        assert!(module
            .code
            .contains("var util = globalizeHelpers.namespace(this.myGlobals.util, this.myGlobalsNamed.util);"));
        assert_eq!(module.helpers.iter().copied().collect::<Vec<_>>(), vec![Helper::Namespace]);
    }

    #[test]
    fn test_named_exports_are_appended() {
        let module = compile("export const x = 1, { y } = obj;\nexport function run() {}\nlet z = 2;\nexport { z as zed, run as default };");
        assert_eq!(
            module.code,
            "(function () {\n\
             this.myGlobalsNamed.main = {};\n\
             const x = 1, { y } = obj;\n\
             function run() {}\n\
             let z = 2;\n\
             this.myGlobalsNamed.main.x = x;\n\
             this.myGlobalsNamed.main.y = y;\n\
             this.myGlobalsNamed.main.run = run;\n\
             this.myGlobalsNamed.main.zed = z;\n\
             this.myGlobals.main = run;\n\
             }).call(this);"
        );
    }

    #[test]
    fn test_default_declaration_keeps_name() {
        let module = compile("export default class UsingClasses {}");
        assert_eq!(
            module.code,
            "(function () {\nclass UsingClasses {}\nthis.myGlobals.main = UsingClasses;\n}).call(this);"
        );
    }

    #[test]
    fn test_reexports() {
        let module = compile(
            "export { a, default as b } from './x';\nexport * from './y';\nexport * as z from './z';",
        );
        assert!(module
            .code
            .contains("this.myGlobalsNamed.main.a = this.myGlobalsNamed.x.a; this.myGlobalsNamed.main.b = this.myGlobals.x;"));
        assert!(module
            .code
            .contains("globalizeHelpers.exportStar(this.myGlobalsNamed.main, this.myGlobalsNamed.y);"));
        assert!(module.code.contains(
            "this.myGlobalsNamed.main.z = globalizeHelpers.namespace(this.myGlobals.z, this.myGlobalsNamed.z);"
        ));
        assert_eq!(module.helpers.len(), 2);
        assert_eq!(module.imports, vec!["./x", "./y", "./z"]);
    }

    #[test]
    fn test_bare_namespace_and_bracket_slots() {
        let options = CompilerOptions {
            namespace: "app".to_string(),
            attach_to_global_object: false,
            sources_content: false,
        };
        let module = compile_with("import v from './my-lib';\nexport default v;", "/src/entry-point.js", &options);
        assert!(module.code.contains("var v = app[\"my-lib\"];"));
        assert!(module.code.contains("app[\"entry-point\"] = v;"));
        assert!(module.map.sources_content.is_empty());
    }

    #[test]
    fn test_source_map_points_into_original() {
        let source = "import foo from './foo';\nconsole.log(foo);\nexport default 1;";
        let module = compile(source);
        assert_eq!(module.map.sources, vec!["/src/main.js"]);
        assert_eq!(module.map.source_content(0), Some(source));

        // line 2 of the output is `console.log(foo);`
        let position = module.map.original_position_for(2, 0).unwrap().unwrap();
        assert_eq!(position.source, "/src/main.js");
        assert_eq!((position.line, position.column), (1, 0));

        // the default export assignment maps to the declaration
        let position = module.map.original_position_for(3, 0).unwrap().unwrap();
        assert_eq!((position.line, position.column), (2, 0));
    }

    #[test]
    fn test_syntax_errors_are_reported() {
        let options = CompilerOptions::default();
        let rewrite = |s: &str| s.to_string();
        let errors = GlobalsCompiler
            .compile(CompileInput {
                source: "import { from './a';\nexport { 'x-y' };",
                filename: "/src/bad.js",
                options: &options,
                rewrite: &rewrite,
            })
            .unwrap_err();
        assert_eq!(errors.len(), 1);

        let errors = GlobalsCompiler
            .compile(CompileInput {
                source: "export { 'x-y' };",
                filename: "/src/bad.js",
                options: &options,
                rewrite: &rewrite,
            })
            .unwrap_err();
        assert!(errors[0].message.contains("'x-y'"));
    }

    #[test]
    fn test_identifier_names() {
        assert!(is_identifier_name("foo"));
        assert!(is_identifier_name("$_a1"));
        assert!(!is_identifier_name("1a"));
        assert!(!is_identifier_name("a-b"));
        assert!(!is_identifier_name(""));
        assert_eq!(member("G", "a-b"), "G[\"a-b\"]");
    }
}
