//! Helper methods and utilities

use super::*;
use crate::parser::{closes_group, opens_group};

impl Parser {
    pub(crate) fn parse_binding_identifier(&mut self) -> ParseResult<Node<Ident>> {
        let token = self.consume(TokenKind::Identifier)?;
        Ok(Node::new(Ident::new(token.value.clone()), token.span))
    }

    /// Import/export names may be any identifier, a reserved word, or a
    /// string literal.
    pub(crate) fn parse_module_export_name(&mut self) -> ParseResult<Node<Ident>> {
        let token = self.current_token();
        if token.is_name() || token.kind == TokenKind::StringLiteral {
            let token = self.advance();
            Ok(Node::new(Ident::new(token.value.clone()), token.span))
        } else {
            Err(self.error(format!("Expected export name, found {:?}", token.kind)))
        }
    }

    /// Declarators of `var`/`let`/`const`, returning every bound name.
    pub(crate) fn parse_var_declarations(&mut self) -> ParseResult<Vec<Node<Ident>>> {
        let mut names = Vec::new();

        loop {
            self.parse_binding_pattern(&mut names)?;
            if self.check(TokenKind::Eq) {
                self.advance();
                self.skip_expression();
            }
            if self.check(TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }

        self.consume_semicolon();
        Ok(names)
    }

    /// Identifier, object or array binding pattern.
    pub(crate) fn parse_binding_pattern(&mut self, names: &mut Vec<Node<Ident>>) -> ParseResult<()> {
        match self.current_token().kind {
            TokenKind::Identifier => {
                names.push(self.parse_binding_identifier()?);
            }
            TokenKind::LBrace => {
                self.advance();
                while !self.check(TokenKind::RBrace) && !self.is_at_end() {
                    if self.check(TokenKind::DotDotDot) {
                        self.advance();
                        self.parse_binding_pattern(names)?;
                    } else {
                        let key = self.current_token().clone();
                        if key.kind == TokenKind::LBracket {
                            self.skip_group();
                        } else {
                            self.advance();
                        }

                        if self.check(TokenKind::Colon) {
                            self.advance();
                            self.parse_binding_pattern(names)?;
                        } else if key.kind == TokenKind::Identifier {
                            names.push(Node::new(Ident::new(key.value), key.span));
                        } else {
                            return Err(ParseError::new(
                                format!("Expected ':' after property key '{}'", key.value),
                                key.span,
                            ));
                        }

                        if self.check(TokenKind::Eq) {
                            self.advance();
                            self.skip_expression();
                        }
                    }

                    if !self.check(TokenKind::RBrace) {
                        self.consume(TokenKind::Comma)?;
                    }
                }
                self.consume(TokenKind::RBrace)?;
            }
            TokenKind::LBracket => {
                self.advance();
                while !self.check(TokenKind::RBracket) && !self.is_at_end() {
                    if self.check(TokenKind::Comma) {
                        self.advance();
                        continue;
                    }
                    if self.check(TokenKind::DotDotDot) {
                        self.advance();
                    }
                    self.parse_binding_pattern(names)?;
                    if self.check(TokenKind::Eq) {
                        self.advance();
                        self.skip_expression();
                    }
                    if !self.check(TokenKind::RBracket) {
                        self.consume(TokenKind::Comma)?;
                    }
                }
                self.consume(TokenKind::RBracket)?;
            }
            kind => return Err(self.error(format!("Expected binding pattern, found {:?}", kind))),
        }
        Ok(())
    }

    /// Skips one assignment expression. Stops before a `,`, `;` or an
    /// unbalanced closing bracket at nesting level zero, or where automatic
    /// semicolon insertion would end the statement.
    pub(crate) fn skip_expression(&mut self) {
        let mut depth = 0usize;

        while !self.is_at_end() {
            let token = self.current_token();
            let kind = token.kind;

            if depth == 0 {
                if matches!(kind, TokenKind::Comma | TokenKind::Semicolon) || closes_group(kind) {
                    return;
                }
                let previous = self.previous_token().kind;
                if token.newline_before
                    && self.current > 0
                    && previous.ends_expression()
                    && !continues_expression(kind)
                {
                    return;
                }
            }

            if opens_group(kind) {
                depth += 1;
            } else if closes_group(kind) {
                depth -= 1;
            }
            self.advance();
        }
    }

    /// Skips a bracketed group starting at the current opening token.
    pub(crate) fn skip_group(&mut self) {
        let mut depth = 0usize;

        while !self.is_at_end() {
            let kind = self.advance().kind;
            if opens_group(kind) {
                depth += 1;
            } else if closes_group(kind) {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return;
                }
            }
        }
    }

    pub(crate) fn current_token(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    pub(crate) fn previous_token(&self) -> &Token {
        &self.tokens[(self.current.saturating_sub(1)).min(self.tokens.len() - 1)]
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous_token()
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.current_token().kind == kind
    }

    pub(crate) fn peek_kind(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.current + offset).map(|token| token.kind)
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len() || self.current_token().kind == TokenKind::Eof
    }

    pub(crate) fn consume(&mut self, kind: TokenKind) -> ParseResult<&Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(format!("Expected {:?}, found {:?}", kind, self.current_token().kind)))
        }
    }

    /// Consumes a contextual keyword such as `from` or `as`.
    pub(crate) fn expect_word(&mut self, word: &str) -> ParseResult<()> {
        if self.current_token().is_word(word) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("Expected '{}', found {:?}", word, self.current_token().kind)))
        }
    }

    pub(crate) fn consume_semicolon(&mut self) {
        if self.check(TokenKind::Semicolon) {
            self.advance();
        }
    }

    pub(crate) fn error(&self, message: String) -> ParseError {
        ParseError::new(message, self.current_token().span)
    }

    /// Skips ahead to the next statement boundary after an error.
    pub(crate) fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous_token().kind == TokenKind::Semicolon {
                return;
            }

            match self.current_token().kind {
                TokenKind::Import | TokenKind::Export => return,
                _ => {}
            }

            self.advance();
        }
    }
}

/// Tokens that, at the start of a new line, still belong to the previous
/// expression.
fn continues_expression(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Dot
            | TokenKind::QuestionDot
            | TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::Question
            | TokenKind::Colon
            | TokenKind::FatArrow
            | TokenKind::In
            | TokenKind::Instanceof
            | TokenKind::TemplateLiteral
            | TokenKind::TemplateHead
            | TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Slash
            | TokenKind::Percent
            | TokenKind::StarStar
            | TokenKind::Eq
            | TokenKind::EqEq
            | TokenKind::EqEqEq
            | TokenKind::BangEq
            | TokenKind::BangEqEq
            | TokenKind::Lt
            | TokenKind::Gt
            | TokenKind::LtEq
            | TokenKind::GtEq
            | TokenKind::AmpAmp
            | TokenKind::PipePipe
            | TokenKind::Amp
            | TokenKind::Pipe
            | TokenKind::Caret
            | TokenKind::LtLt
            | TokenKind::GtGt
            | TokenKind::GtGtGt
            | TokenKind::PlusEq
            | TokenKind::MinusEq
            | TokenKind::StarEq
            | TokenKind::SlashEq
            | TokenKind::PercentEq
            | TokenKind::StarStarEq
            | TokenKind::AmpAmpEq
            | TokenKind::PipePipeEq
            | TokenKind::QuestionQuestionEq
            | TokenKind::LtLtEq
            | TokenKind::GtGtEq
            | TokenKind::GtGtGtEq
            | TokenKind::AmpEq
            | TokenKind::PipeEq
            | TokenKind::CaretEq
            | TokenKind::QuestionQuestion
    )
}
