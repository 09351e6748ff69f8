//! Core Parser struct and the module-level scan

use super::*;

/// Module-level parser for JavaScript.
///
/// Walks the token stream keeping track of bracket nesting and fully parses
/// every top-level `import` and `export` declaration. All other tokens are
/// skipped; the code generator copies them through untouched.
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) current: usize,
}

impl Parser {
    /// Creates a new parser from a token stream
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    /// Parses a complete module
    pub fn parse_program(&mut self) -> Result<Program, Vec<ParseError>> {
        let start_span = self.current_token().span;
        let mut items = Vec::new();
        let mut errors = Vec::new();
        let mut depth = 0usize;

        while !self.is_at_end() {
            match self.current_token().kind {
                TokenKind::Error => {
                    let token = self.advance();
                    errors.push(ParseError::from_error_token(token));
                }
                TokenKind::Import if depth == 0 && !self.is_import_expression() => {
                    match self.parse_module_item() {
                        Ok(item) => items.push(item),
                        Err(err) => {
                            errors.push(err);
                            self.synchronize();
                        }
                    }
                }
                TokenKind::Export if depth == 0 => match self.parse_module_item() {
                    Ok(item) => items.push(item),
                    Err(err) => {
                        errors.push(err);
                        self.synchronize();
                    }
                },
                kind => {
                    if opens_group(kind) {
                        depth += 1;
                    } else if closes_group(kind) {
                        depth = depth.saturating_sub(1);
                    }
                    self.advance();
                }
            }
        }

        if errors.is_empty() {
            let end_span = self.previous_token().span;
            Ok(Program {
                items,
                span: start_span.merge(&end_span),
            })
        } else {
            Err(errors)
        }
    }

    // =========================================================================
    // Module Items
    // =========================================================================

    pub(crate) fn parse_module_item(&mut self) -> ParseResult<Node<ModuleItem>> {
        let start = self.current_token().span;

        let item = match self.current_token().kind {
            TokenKind::Import => ModuleItem::Import(self.parse_import_decl()?),
            _ => ModuleItem::Export(self.parse_export_decl()?),
        };

        let span = start.merge(&self.previous_token().span);
        Ok(Node::new(item, span))
    }

    /// `import(...)` and `import.meta` are expressions, not declarations.
    fn is_import_expression(&self) -> bool {
        matches!(self.peek_kind(1), Some(TokenKind::LParen) | Some(TokenKind::Dot))
    }

    // =========================================================================
    // Import/Export
    // =========================================================================

    pub(crate) fn parse_import_decl(&mut self) -> ParseResult<ImportDecl> {
        self.consume(TokenKind::Import)?;

        let mut specifiers = Vec::new();

        // import "module"
        if self.check(TokenKind::StringLiteral) {
            let source = self.parse_source()?;
            self.consume_semicolon();
            return Ok(ImportDecl { specifiers, source });
        }

        // import defaultName from "module"
        if self.check(TokenKind::Identifier) {
            let name = self.parse_binding_identifier()?;
            specifiers.push(ImportSpecifier::Default(name));

            if self.check(TokenKind::Comma) {
                self.advance();
            } else {
                self.expect_word("from")?;
                let source = self.parse_source()?;
                self.consume_semicolon();
                return Ok(ImportDecl { specifiers, source });
            }
        }

        // import * as name from "module"
        if self.check(TokenKind::Star) {
            self.advance();
            self.expect_word("as")?;
            let name = self.parse_binding_identifier()?;
            specifiers.push(ImportSpecifier::Namespace(name));
        }
        // import { a, b as c } from "module"
        else if self.check(TokenKind::LBrace) {
            self.advance();

            while !self.check(TokenKind::RBrace) && !self.is_at_end() {
                let imported_is_binding = self.check(TokenKind::Identifier);
                let imported = self.parse_module_export_name()?;
                let local = if self.current_token().is_word("as") {
                    self.advance();
                    Some(self.parse_binding_identifier()?)
                } else if !imported_is_binding {
                    return Err(self.error(format!(
                        "'{}' cannot be imported without a local name",
                        imported.value.name
                    )));
                } else {
                    None
                };

                specifiers.push(ImportSpecifier::Named { imported, local });

                if !self.check(TokenKind::RBrace) {
                    self.consume(TokenKind::Comma)?;
                }
            }

            self.consume(TokenKind::RBrace)?;
        } else {
            return Err(self.error(format!(
                "Expected import specifiers, found {:?}",
                self.current_token().kind
            )));
        }

        self.expect_word("from")?;
        let source = self.parse_source()?;
        self.consume_semicolon();

        Ok(ImportDecl { specifiers, source })
    }

    pub(crate) fn parse_export_decl(&mut self) -> ParseResult<ExportDecl> {
        let keyword_span = self.consume(TokenKind::Export)?.span;

        // export default
        if self.check(TokenKind::Default) {
            let keyword_span = keyword_span.merge(&self.advance().span);
            return self.parse_export_default(keyword_span);
        }

        // export * from "module" / export * as name from "module"
        if self.check(TokenKind::Star) {
            self.advance();

            let as_name = if self.current_token().is_word("as") {
                self.advance();
                Some(self.parse_module_export_name()?)
            } else {
                None
            };

            self.expect_word("from")?;
            let source = self.parse_source()?;
            self.consume_semicolon();

            return Ok(ExportDecl::All { source, as_name });
        }

        // export { ... } / export { ... } from "module"
        if self.check(TokenKind::LBrace) {
            self.advance();
            let mut specifiers = Vec::new();

            while !self.check(TokenKind::RBrace) && !self.is_at_end() {
                let local = self.parse_module_export_name()?;
                let exported = if self.current_token().is_word("as") {
                    self.advance();
                    Some(self.parse_module_export_name()?)
                } else {
                    None
                };

                specifiers.push(ExportSpecifier { local, exported });

                if !self.check(TokenKind::RBrace) {
                    self.consume(TokenKind::Comma)?;
                }
            }

            self.consume(TokenKind::RBrace)?;

            let source = if self.current_token().is_word("from") {
                self.advance();
                Some(self.parse_source()?)
            } else {
                None
            };

            self.consume_semicolon();

            return Ok(ExportDecl::Named { specifiers, source });
        }

        // export declaration
        match self.current_token().kind {
            TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                let kind = match self.advance().kind {
                    TokenKind::Var => DeclKind::Var,
                    TokenKind::Let => DeclKind::Let,
                    _ => DeclKind::Const,
                };
                let names = self.parse_var_declarations()?;
                Ok(ExportDecl::Decl {
                    keyword_span,
                    kind,
                    names,
                })
            }
            TokenKind::Class => {
                self.advance();
                let name = self.parse_binding_identifier()?;
                Ok(ExportDecl::Decl {
                    keyword_span,
                    kind: DeclKind::Class,
                    names: vec![name],
                })
            }
            _ if self.is_function_start() => {
                self.skip_function_keywords();
                let name = self.parse_binding_identifier()?;
                Ok(ExportDecl::Decl {
                    keyword_span,
                    kind: DeclKind::Function,
                    names: vec![name],
                })
            }
            kind => Err(self.error(format!("Expected declaration after 'export', found {:?}", kind))),
        }
    }

    /// Everything after `export default`. Named function and class
    /// declarations are consumed up to their name; anything else is an
    /// expression that stays in the token stream.
    fn parse_export_default(&mut self, keyword_span: Span) -> ParseResult<ExportDecl> {
        if self.is_function_start() {
            let checkpoint = self.current;
            self.skip_function_keywords();
            if self.check(TokenKind::Identifier) {
                let name = self.parse_binding_identifier()?;
                return Ok(ExportDecl::DefaultDecl {
                    keyword_span,
                    kind: DeclKind::Function,
                    name,
                });
            }
            self.current = checkpoint;
        } else if self.check(TokenKind::Class) && self.peek_kind(1) == Some(TokenKind::Identifier) {
            self.advance();
            let name = self.parse_binding_identifier()?;
            return Ok(ExportDecl::DefaultDecl {
                keyword_span,
                kind: DeclKind::Class,
                name,
            });
        }

        Ok(ExportDecl::DefaultExpr { keyword_span })
    }

    /// `function`, `async function` (no line break after `async`).
    fn is_function_start(&self) -> bool {
        if self.check(TokenKind::Function) {
            return true;
        }
        self.current_token().is_word("async")
            && self.peek_kind(1) == Some(TokenKind::Function)
            && !self.tokens[self.current + 1].newline_before
    }

    /// Skips `async`, `function` and a generator `*`.
    fn skip_function_keywords(&mut self) {
        if self.current_token().is_word("async") {
            self.advance();
        }
        self.advance(); // function
        if self.check(TokenKind::Star) {
            self.advance();
        }
    }

    /// Module specifier string plus any trailing import attributes.
    fn parse_source(&mut self) -> ParseResult<StrLit> {
        let token = self.consume(TokenKind::StringLiteral)?;
        let source = StrLit {
            value: token.value.clone(),
            span: token.span,
        };

        // with { type: "json" } / assert { type: "json" }
        let token = self.current_token();
        if (token.is_word("with") || token.is_word("assert"))
            && !token.newline_before
            && self.peek_kind(1) == Some(TokenKind::LBrace)
        {
            self.advance();
            self.skip_group();
        }

        Ok(source)
    }
}

pub(crate) fn opens_group(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace | TokenKind::TemplateHead
    )
}

pub(crate) fn closes_group(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace | TokenKind::TemplateTail
    )
}
