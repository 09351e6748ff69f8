//! # Globalize Parser
//!
//! Module-level parser for JavaScript: recognizes top-level import and
//! export declarations (including destructuring export bindings, re-exports
//! and import attributes) and skips everything else.

use globalize_ast::*;
use globalize_lexer::{Token, TokenKind};

// Module declarations
mod error;
mod parser;
mod helpers;

// Re-export public types
pub use error::{ParseError, ParseResult};
pub use parser::Parser;

/// Lexes and parses `source` in one step.
pub fn parse_module(source: &str) -> Result<Program, Vec<ParseError>> {
    let tokens = globalize_lexer::Lexer::new(source).tokenize();
    Parser::new(tokens).parse_program()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Program {
        parse_module(source).expect("module should parse")
    }

    fn single_export(source: &str) -> ExportDecl {
        let program = parse(source);
        assert_eq!(program.items.len(), 1, "expected exactly one item in {source:?}");
        match &program.items[0].value {
            ModuleItem::Export(export) => export.clone(),
            other => panic!("expected export, got {other:?}"),
        }
    }

    fn names(nodes: &[Node<Ident>]) -> Vec<&str> {
        nodes.iter().map(|n| n.value.name.as_str()).collect()
    }

    #[test]
    fn test_parse_import_forms() {
        let source = r#"
            import "./side-effect";
            import Foo from './Foo';
            import {Bar, baz as qux} from "./Bar";
            import * as ns from './ns';
            import def, { a } from './mixed';
            import def2, * as all from './mixed2';
        "#;
        let program = parse(source);
        assert_eq!(program.items.len(), 6);
        assert_eq!(
            program.sources(),
            vec!["./side-effect", "./Foo", "./Bar", "./ns", "./mixed", "./mixed2"]
        );

        let ModuleItem::Import(import) = &program.items[2].value else {
            panic!("expected import");
        };
        let locals: Vec<_> = import.specifiers.iter().map(|s| s.local_name()).collect();
        assert_eq!(locals, vec!["Bar", "qux"]);

        let ModuleItem::Import(import) = &program.items[5].value else {
            panic!("expected import");
        };
        assert!(matches!(import.specifiers[0], ImportSpecifier::Default(_)));
        assert!(matches!(import.specifiers[1], ImportSpecifier::Namespace(_)));
    }

    #[test]
    fn test_import_item_span_covers_semicolon() {
        let source = "import a from './a';\nfoo();";
        let program = parse(source);
        let span = program.items[0].span;
        assert_eq!(&source[span.start..span.end], "import a from './a';");
    }

    #[test]
    fn test_import_with_attributes() {
        let program = parse("import data from './data.json' with { type: 'json' };\nlet x = 1;");
        assert_eq!(program.sources(), vec!["./data.json"]);
    }

    #[test]
    fn test_import_default_as_name() {
        let program = parse("import { default as Foo, 'a-b' as ab } from './foo';");
        let ModuleItem::Import(import) = &program.items[0].value else {
            panic!("expected import");
        };
        match &import.specifiers[0] {
            ImportSpecifier::Named { imported, local } => {
                assert_eq!(imported.value.name, "default");
                assert_eq!(local.as_ref().map(|l| l.value.name.as_str()), Some("Foo"));
            }
            other => panic!("unexpected specifier {other:?}"),
        }
        assert_eq!(import.specifiers[1].local_name(), "ab");
    }

    #[test]
    fn test_reserved_import_requires_alias() {
        let errors = parse_module("import { default } from './foo';").unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_dynamic_import_and_meta_are_ignored() {
        let program = parse("const m = import('./lazy'); console.log(import.meta.url);");
        assert!(program.items.is_empty());
    }

    #[test]
    fn test_nested_import_word_is_ignored() {
        let program = parse("function f() { return obj.import; }\nconst o = { export: 1 };");
        assert!(program.items.is_empty());
    }

    #[test]
    fn test_export_default_expression() {
        let source = "export default 'foo bar';";
        match single_export(source) {
            ExportDecl::DefaultExpr { keyword_span } => {
                assert_eq!(&source[keyword_span.start..keyword_span.end], "export default");
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(matches!(
            single_export("export default function () {}"),
            ExportDecl::DefaultExpr { .. }
        ));
        assert!(matches!(
            single_export("export default class extends Base {}"),
            ExportDecl::DefaultExpr { .. }
        ));
    }

    #[test]
    fn test_export_default_declarations() {
        match single_export("export default class UsingClasses { static value() {} }") {
            ExportDecl::DefaultDecl { kind, name, .. } => {
                assert_eq!(kind, DeclKind::Class);
                assert_eq!(name.value.name, "UsingClasses");
            }
            other => panic!("unexpected {other:?}"),
        }

        match single_export("export default async function* run() {}") {
            ExportDecl::DefaultDecl { kind, name, .. } => {
                assert_eq!(kind, DeclKind::Function);
                assert_eq!(name.value.name, "run");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_export_variable_declarations() {
        let source = "export const a = 1, { b, c: d, ...rest } = obj, [e, , f = g(1, 2)] = arr;";
        match single_export(source) {
            ExportDecl::Decl { kind, names: bound, keyword_span } => {
                assert_eq!(kind, DeclKind::Const);
                assert_eq!(names(&bound), vec!["a", "b", "d", "rest", "e", "f"]);
                assert_eq!(&source[keyword_span.start..keyword_span.end], "export");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_export_declaration_without_semicolon() {
        let source = "export let x = foo\n  .bar()\nexport var y = function () {\n  return 1\n}\nx++";
        let program = parse(source);
        assert_eq!(program.items.len(), 2);
        let ModuleItem::Export(ExportDecl::Decl { names: second, .. }) = &program.items[1].value else {
            panic!("expected declaration");
        };
        assert_eq!(names(second), vec!["y"]);
    }

    #[test]
    fn test_export_function_and_class() {
        match single_export("export async function load() {}") {
            ExportDecl::Decl { kind, names: bound, .. } => {
                assert_eq!(kind, DeclKind::Function);
                assert_eq!(names(&bound), vec!["load"]);
            }
            other => panic!("unexpected {other:?}"),
        }
        match single_export("export class Bar {}") {
            ExportDecl::Decl { kind, names: bound, .. } => {
                assert_eq!(kind, DeclKind::Class);
                assert_eq!(names(&bound), vec!["Bar"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_export_named_and_reexports() {
        let program = parse(
            "export { a, b as c, d as default };\nexport { x } from './x';\nexport * from './all';\nexport * as ns from './ns';",
        );
        assert_eq!(program.items.len(), 4);
        assert_eq!(program.sources(), vec!["./x", "./all", "./ns"]);

        let ModuleItem::Export(ExportDecl::Named { specifiers, source }) = &program.items[0].value else {
            panic!("expected named export");
        };
        assert!(source.is_none());
        let exported: Vec<_> = specifiers.iter().map(|s| s.exported_name()).collect();
        assert_eq!(exported, vec!["a", "c", "default"]);

        let ModuleItem::Export(ExportDecl::All { as_name, .. }) = &program.items[3].value else {
            panic!("expected star export");
        };
        assert_eq!(as_name.as_ref().map(|n| n.value.name.as_str()), Some("ns"));
    }

    #[test]
    fn test_template_and_regex_do_not_confuse_depth() {
        let source = "const s = `${'}'}`; const r = /{/;\nexport const z = 1;";
        let program = parse(source);
        assert_eq!(program.items.len(), 1);
    }

    #[test]
    fn test_errors_are_collected() {
        let errors = parse_module("import { from './a';\nexport nonsense;\nlet s = 'open").unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[2].message, "Unterminated string literal");
    }
}
