//! Module system definitions for the AST

use super::*;

/// String literal with its unescaped value
#[derive(Debug, Clone, PartialEq)]
pub struct StrLit {
    pub value: String,
    pub span: Span,
}

/// Module item (top-level linking declaration in a module)
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleItem {
    /// Import declaration
    Import(ImportDecl),

    /// Export declaration
    Export(ExportDecl),
}

/// Import declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub specifiers: Vec<ImportSpecifier>,
    pub source: StrLit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportSpecifier {
    /// import name from "module"
    Default(Node<Ident>),

    /// import * as name from "module"
    Namespace(Node<Ident>),

    /// import { name } from "module" or import { name as alias } from "module"
    Named {
        imported: Node<Ident>,
        local: Option<Node<Ident>>,
    },
}

impl ImportSpecifier {
    /// The binding this specifier introduces in the importing module.
    pub fn local_name(&self) -> &str {
        match self {
            ImportSpecifier::Default(local) | ImportSpecifier::Namespace(local) => &local.value.name,
            ImportSpecifier::Named { imported, local } => {
                &local.as_ref().unwrap_or(imported).value.name
            }
        }
    }
}

/// What kind of declaration follows `export`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Var,
    Let,
    Const,
    Function,
    Class,
}

/// Export declaration
#[derive(Debug, Clone, PartialEq)]
pub enum ExportDecl {
    /// export default expr
    ///
    /// `keyword_span` covers `export default`; the expression is left in place.
    DefaultExpr { keyword_span: Span },

    /// export default function name() {} / export default class Name {}
    DefaultDecl {
        keyword_span: Span,
        kind: DeclKind,
        name: Node<Ident>,
    },

    /// export const a = 1, { b } = c; / export function f() {} / export class C {}
    ///
    /// `keyword_span` covers only `export`.
    Decl {
        keyword_span: Span,
        kind: DeclKind,
        names: Vec<Node<Ident>>,
    },

    /// export { name } / export { name } from "module"
    Named {
        specifiers: Vec<ExportSpecifier>,
        source: Option<StrLit>,
    },

    /// export * from "module" / export * as name from "module"
    All {
        source: StrLit,
        as_name: Option<Node<Ident>>,
    },
}

impl ExportDecl {
    pub fn source(&self) -> Option<&StrLit> {
        match self {
            ExportDecl::Named { source, .. } => source.as_ref(),
            ExportDecl::All { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSpecifier {
    pub local: Node<Ident>,
    pub exported: Option<Node<Ident>>,
}

impl ExportSpecifier {
    pub fn exported_name(&self) -> &str {
        &self.exported.as_ref().unwrap_or(&self.local).value.name
    }
}

/// Root AST node - the linking declarations of a complete source file
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub items: Vec<Node<ModuleItem>>,
    pub span: Span,
}

impl Program {
    /// Every module specifier the file declares (imports and re-exports),
    /// in declaration order, duplicates included.
    pub fn sources(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|item| match &item.value {
                ModuleItem::Import(import) => Some(&import.source),
                ModuleItem::Export(export) => export.source(),
            })
            .map(|lit| lit.value.as_str())
            .collect()
    }

    /// Whether anything is exported under a name other than `default`.
    pub fn has_named_exports(&self) -> bool {
        self.items.iter().any(|item| match &item.value {
            ModuleItem::Export(ExportDecl::Decl { .. }) | ModuleItem::Export(ExportDecl::All { .. }) => true,
            ModuleItem::Export(ExportDecl::Named { specifiers, .. }) => {
                specifiers.iter().any(|spec| spec.exported_name() != "default")
            }
            _ => false,
        })
    }
}
