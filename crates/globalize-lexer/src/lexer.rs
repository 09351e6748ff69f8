use globalize_ast::Span;
use crate::token::{Token, TokenKind};

/// Punctuators, longest first so the first prefix match wins.
const PUNCTUATORS: &[(&str, TokenKind)] = &[
    (">>>=", TokenKind::GtGtGtEq),
    ("...", TokenKind::DotDotDot),
    ("===", TokenKind::EqEqEq),
    ("!==", TokenKind::BangEqEq),
    ("**=", TokenKind::StarStarEq),
    ("<<=", TokenKind::LtLtEq),
    (">>=", TokenKind::GtGtEq),
    (">>>", TokenKind::GtGtGt),
    ("&&=", TokenKind::AmpAmpEq),
    ("||=", TokenKind::PipePipeEq),
    ("??=", TokenKind::QuestionQuestionEq),
    ("=>", TokenKind::FatArrow),
    ("==", TokenKind::EqEq),
    ("!=", TokenKind::BangEq),
    ("<=", TokenKind::LtEq),
    (">=", TokenKind::GtEq),
    ("&&", TokenKind::AmpAmp),
    ("||", TokenKind::PipePipe),
    ("??", TokenKind::QuestionQuestion),
    ("?.", TokenKind::QuestionDot),
    ("++", TokenKind::PlusPlus),
    ("--", TokenKind::MinusMinus),
    ("+=", TokenKind::PlusEq),
    ("-=", TokenKind::MinusEq),
    ("*=", TokenKind::StarEq),
    ("/=", TokenKind::SlashEq),
    ("%=", TokenKind::PercentEq),
    ("&=", TokenKind::AmpEq),
    ("|=", TokenKind::PipeEq),
    ("^=", TokenKind::CaretEq),
    ("**", TokenKind::StarStar),
    ("<<", TokenKind::LtLt),
    (">>", TokenKind::GtGt),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    ("=", TokenKind::Eq),
    ("<", TokenKind::Lt),
    (">", TokenKind::Gt),
    ("!", TokenKind::Bang),
    ("&", TokenKind::Amp),
    ("|", TokenKind::Pipe),
    ("^", TokenKind::Caret),
    ("~", TokenKind::Tilde),
    ("?", TokenKind::Question),
    (".", TokenKind::Dot),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("[", TokenKind::LBracket),
    ("]", TokenKind::RBracket),
    (";", TokenKind::Semicolon),
    (",", TokenKind::Comma),
    (":", TokenKind::Colon),
    ("@", TokenKind::At),
];

/// What an open `{` belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Brace {
    /// Statement block, function or class body
    Block,
    /// Object literal or pattern
    Expression,
    /// `${` of a template substitution
    Template,
}

/// The lexer/tokenizer for JavaScript modules.
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::str::CharIndices<'a>,
    current_pos: usize,
    current_char: Option<char>,
    /// Kind of the last significant token, used to tell a regex from division.
    last_kind: Option<TokenKind>,
    brace_stack: Vec<Brace>,
    /// One entry per open `(`; `true` for the head of `if`, `for`, `while`
    /// or `with`.
    paren_stack: Vec<bool>,
    /// The last token closed a statement head or a block, so a `/` after it
    /// starts a regex.
    after_statement_close: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer from source code.
    pub fn new(source: &'a str) -> Self {
        let mut chars = source.char_indices();
        let current_char = chars.next().map(|(_, c)| c);
        Self {
            source,
            chars,
            current_pos: 0,
            current_char,
            last_kind: None,
            brace_stack: Vec::new(),
            paren_stack: Vec::new(),
            after_statement_close: false,
        }
    }

    /// Tokenizes the entire source code and returns all tokens.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    /// Gets the next token from the source.
    pub fn next_token(&mut self) -> Token {
        let newline_before = match self.skip_whitespace_and_comments() {
            Ok(newline) => newline,
            Err(error_token) => return error_token,
        };

        let start = self.current_pos;
        let mut closes_statement = false;

        let mut token = match self.current_char {
            None => self.make(TokenKind::Eof, start, String::new()),
            Some(ch) => match ch {
                // String literals
                '"' | '\'' => self.read_string_literal(ch),
                '`' => {
                    self.advance();
                    self.read_template_piece(start, true)
                }

                // Numbers
                '0'..='9' => self.read_number(),
                '.' if self.peek().map_or(false, |c| c.is_ascii_digit()) => self.read_number(),

                '#' => self.read_private_name(),
                '/' if self.regex_allowed() => self.read_regex_literal(),

                '{' => {
                    let brace = if self.brace_opens_block(newline_before) {
                        Brace::Block
                    } else {
                        Brace::Expression
                    };
                    self.brace_stack.push(brace);
                    self.advance();
                    self.make(TokenKind::LBrace, start, "{".to_string())
                }
                '}' => {
                    self.advance();
                    match self.brace_stack.pop() {
                        Some(Brace::Template) => self.read_template_piece(start, false),
                        popped => {
                            closes_statement = popped == Some(Brace::Block);
                            self.make(TokenKind::RBrace, start, "}".to_string())
                        }
                    }
                }

                // Identifiers and keywords
                _ if is_identifier_start(ch) => self.read_identifier_or_keyword(),

                _ => self.read_punctuator(ch),
            },
        };

        match token.kind {
            TokenKind::LParen => {
                let head = matches!(
                    self.last_kind,
                    Some(TokenKind::If | TokenKind::For | TokenKind::While | TokenKind::With)
                );
                self.paren_stack.push(head);
            }
            TokenKind::RParen => closes_statement = self.paren_stack.pop() == Some(true),
            _ => {}
        }

        token.newline_before = newline_before;
        if token.kind != TokenKind::Error {
            self.last_kind = Some(token.kind);
            self.after_statement_close = closes_statement;
        }
        token
    }

    // Helper methods

    fn make(&self, kind: TokenKind, start: usize, value: String) -> Token {
        Token::new(kind, Span::new(start, self.current_pos, 0), value)
    }

    fn error(&self, start: usize, message: &str) -> Token {
        self.make(TokenKind::Error, start, message.to_string())
    }

    fn advance(&mut self) {
        if let Some((pos, ch)) = self.chars.next() {
            self.current_pos = pos;
            self.current_char = Some(ch);
        } else {
            self.current_pos = self.source.len();
            self.current_char = None;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.clone().next().map(|(_, c)| c)
    }

    fn regex_allowed(&self) -> bool {
        if self.after_statement_close {
            return true;
        }
        match self.last_kind {
            None => true,
            Some(kind) => !kind.ends_expression(),
        }
    }

    /// Whether a `{` at this point opens a block rather than an object
    /// literal, judged from the previous token and the enclosing brace.
    fn brace_opens_block(&self, newline_before: bool) -> bool {
        let enclosing_block = matches!(self.brace_stack.last(), None | Some(Brace::Block));
        match self.last_kind {
            None => true,
            Some(kind) => match kind {
                TokenKind::Semicolon
                | TokenKind::RBrace
                | TokenKind::RParen
                | TokenKind::FatArrow
                | TokenKind::Else
                | TokenKind::Do
                | TokenKind::Try
                | TokenKind::Finally
                | TokenKind::Identifier
                | TokenKind::Class => true,
                TokenKind::LBrace | TokenKind::Colon => enclosing_block,
                TokenKind::Return | TokenKind::Yield => newline_before,
                _ => false,
            },
        }
    }

    /// Skips trivia. Returns whether a line terminator was crossed, or an
    /// error token for an unterminated block comment.
    fn skip_whitespace_and_comments(&mut self) -> Result<bool, Token> {
        let mut newline = false;

        // Hashbang line
        if self.current_pos == 0 && self.current_char == Some('#') && self.peek() == Some('!') {
            self.skip_single_line_comment();
            newline = true;
        }

        loop {
            match self.current_char {
                Some(ch) if is_line_terminator(ch) => {
                    newline = true;
                    self.advance();
                }
                Some(ch) if ch.is_whitespace() || ch == '\u{feff}' => {
                    self.advance();
                }
                Some('/') => {
                    if self.peek() == Some('/') {
                        self.skip_single_line_comment();
                        newline = true;
                    } else if self.peek() == Some('*') {
                        let start = self.current_pos;
                        match self.skip_multi_line_comment() {
                            Some(crossed) => newline |= crossed,
                            None => return Err(self.error(start, "Unterminated multi-line comment")),
                        }
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(newline)
    }

    fn skip_single_line_comment(&mut self) {
        while let Some(ch) = self.current_char {
            if is_line_terminator(ch) {
                self.advance();
                break;
            }
            self.advance();
        }
    }

    /// Returns `Some(crossed_newline)`, or `None` when unterminated.
    fn skip_multi_line_comment(&mut self) -> Option<bool> {
        // Skip /*
        self.advance();
        self.advance();

        let mut crossed = false;
        while let Some(ch) = self.current_char {
            if ch == '*' && self.peek() == Some('/') {
                self.advance();
                self.advance();
                return Some(crossed);
            }
            crossed |= is_line_terminator(ch);
            self.advance();
        }
        None
    }

    fn read_string_literal(&mut self, quote: char) -> Token {
        let start = self.current_pos;
        self.advance(); // Skip opening quote

        let mut value = String::new();

        while let Some(ch) = self.current_char {
            if ch == quote {
                self.advance();
                return self.make(TokenKind::StringLiteral, start, value);
            } else if ch == '\\' {
                self.advance();
                let Some(escaped) = self.current_char else { break };
                match escaped {
                    'u' => {
                        self.advance();
                        value.push(self.read_unicode_escape());
                    }
                    'x' => {
                        self.advance();
                        value.push(self.read_hex_digits(2));
                    }
                    // Line continuation
                    '\r' => {
                        self.advance();
                        if self.current_char == Some('\n') {
                            self.advance();
                        }
                    }
                    '\n' | '\u{2028}' | '\u{2029}' => self.advance(),
                    _ => {
                        value.push(match escaped {
                            'n' => '\n',
                            'r' => '\r',
                            't' => '\t',
                            'b' => '\u{8}',
                            'f' => '\u{c}',
                            'v' => '\u{b}',
                            '0' => '\0',
                            other => other,
                        });
                        self.advance();
                    }
                }
            } else if ch == '\n' || ch == '\r' {
                return self.error(start, "Unterminated string literal");
            } else {
                value.push(ch);
                self.advance();
            }
        }

        self.error(start, "Unterminated string literal")
    }

    fn read_unicode_escape(&mut self) -> char {
        if self.current_char != Some('{') {
            return self.read_hex_digits(4);
        }
        self.advance();
        let mut code = 0u32;
        while let Some(digit) = self.current_char.and_then(|c| c.to_digit(16)) {
            code = code.saturating_mul(16).saturating_add(digit);
            self.advance();
        }
        if self.current_char == Some('}') {
            self.advance();
        }
        char::from_u32(code).unwrap_or('\u{FFFD}')
    }

    fn read_hex_digits(&mut self, count: usize) -> char {
        let mut code = 0u32;
        for _ in 0..count {
            match self.current_char.and_then(|c| c.to_digit(16)) {
                Some(digit) => {
                    code = code * 16 + digit;
                    self.advance();
                }
                None => break,
            }
        }
        char::from_u32(code).unwrap_or('\u{FFFD}')
    }

    /// Reads template text after a backtick (`head`) or after the `}` that
    /// closes a substitution, up to the closing backtick or the next `${`.
    /// The value is the raw text between the delimiters.
    fn read_template_piece(&mut self, start: usize, head: bool) -> Token {
        let text_start = self.current_pos;

        while let Some(ch) = self.current_char {
            match ch {
                '`' => {
                    let raw = self.source[text_start..self.current_pos].to_string();
                    self.advance();
                    let kind = if head { TokenKind::TemplateLiteral } else { TokenKind::TemplateTail };
                    return self.make(kind, start, raw);
                }
                '$' if self.peek() == Some('{') => {
                    let raw = self.source[text_start..self.current_pos].to_string();
                    self.advance();
                    self.advance();
                    self.brace_stack.push(Brace::Template);
                    let kind = if head { TokenKind::TemplateHead } else { TokenKind::TemplateMiddle };
                    return self.make(kind, start, raw);
                }
                '\\' => {
                    self.advance();
                    self.advance();
                }
                _ => self.advance(),
            }
        }

        self.error(start, "Unterminated template literal")
    }

    fn read_regex_literal(&mut self) -> Token {
        let start = self.current_pos;
        self.advance(); // Skip opening slash

        let mut in_class = false;
        loop {
            match self.current_char {
                None => return self.error(start, "Unterminated regular expression"),
                Some(ch) if is_line_terminator(ch) => {
                    return self.error(start, "Unterminated regular expression");
                }
                Some('\\') => {
                    self.advance();
                    if self.current_char.map_or(true, is_line_terminator) {
                        return self.error(start, "Unterminated regular expression");
                    }
                    self.advance();
                }
                Some('[') => {
                    in_class = true;
                    self.advance();
                }
                Some(']') => {
                    in_class = false;
                    self.advance();
                }
                Some('/') if !in_class => {
                    self.advance();
                    break;
                }
                Some(_) => self.advance(),
            }
        }

        // Flags
        while self.current_char.map_or(false, is_identifier_part) {
            self.advance();
        }

        let raw = self.source[start..self.current_pos].to_string();
        self.make(TokenKind::RegexLiteral, start, raw)
    }

    fn read_number(&mut self) -> Token {
        let start = self.current_pos;

        // Check for special number formats
        if self.current_char == Some('0') {
            match self.peek() {
                Some('x') | Some('X') => return self.read_radix_number(start, "0x", |c| c.is_ascii_hexdigit()),
                Some('o') | Some('O') => return self.read_radix_number(start, "0o", |c| ('0'..='7').contains(&c)),
                Some('b') | Some('B') => return self.read_radix_number(start, "0b", |c| c == '0' || c == '1'),
                _ => {}
            }
        }

        let mut value = String::new();
        self.read_digits(&mut value, |c| c.is_ascii_digit());

        // Fraction
        if self.current_char == Some('.') {
            value.push('.');
            self.advance();
            self.read_digits(&mut value, |c| c.is_ascii_digit());
        }

        // Exponent
        if matches!(self.current_char, Some('e') | Some('E')) {
            value.push('e');
            self.advance();
            if let Some(sign @ ('+' | '-')) = self.current_char {
                value.push(sign);
                self.advance();
            }
            self.read_digits(&mut value, |c| c.is_ascii_digit());
        }

        // BigInt suffix
        if self.current_char == Some('n') {
            self.advance();
            return self.make(TokenKind::BigIntLiteral, start, value);
        }

        self.make(TokenKind::NumberLiteral, start, value)
    }

    fn read_radix_number(&mut self, start: usize, prefix: &str, is_digit: fn(char) -> bool) -> Token {
        let mut value = String::from(prefix);
        self.advance(); // 0
        self.advance(); // x, o or b
        self.read_digits(&mut value, is_digit);

        if self.current_char == Some('n') {
            self.advance();
            return self.make(TokenKind::BigIntLiteral, start, value);
        }
        self.make(TokenKind::NumberLiteral, start, value)
    }

    /// Appends digits accepted by `is_digit`, dropping numeric separators.
    fn read_digits(&mut self, value: &mut String, is_digit: fn(char) -> bool) {
        while let Some(ch) = self.current_char {
            if is_digit(ch) {
                value.push(ch);
            } else if ch != '_' {
                break;
            }
            self.advance();
        }
    }

    fn read_identifier_or_keyword(&mut self) -> Token {
        let start = self.current_pos;
        let mut value = String::new();

        while let Some(ch) = self.current_char {
            if is_identifier_part(ch) {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        // A keyword after `.` is a property name
        let after_dot = matches!(self.last_kind, Some(TokenKind::Dot) | Some(TokenKind::QuestionDot));
        let kind = match TokenKind::keyword(&value) {
            Some(keyword) if !after_dot => keyword,
            _ => TokenKind::Identifier,
        };

        self.make(kind, start, value)
    }

    fn read_private_name(&mut self) -> Token {
        let start = self.current_pos;
        self.advance(); // #

        if !self.current_char.map_or(false, is_identifier_start) {
            return self.error(start, "Unexpected character: #");
        }

        let mut value = String::from("#");
        while let Some(ch) = self.current_char.filter(|c| is_identifier_part(*c)) {
            value.push(ch);
            self.advance();
        }
        self.make(TokenKind::PrivateName, start, value)
    }

    fn read_punctuator(&mut self, ch: char) -> Token {
        let start = self.current_pos;
        let rest = &self.source[start..];

        for &(text, kind) in PUNCTUATORS {
            if !rest.starts_with(text) {
                continue;
            }
            // `a?.5:b` is a conditional, not optional chaining
            if kind == TokenKind::QuestionDot && rest[2..].starts_with(|c: char| c.is_ascii_digit()) {
                continue;
            }
            for _ in 0..text.len() {
                self.advance();
            }
            return self.make(kind, start, text.to_string());
        }

        self.advance();
        self.make(TokenKind::Error, start, format!("Unexpected character: {}", ch))
    }
}

fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_identifier_part(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$' || ch == '\u{200c}' || ch == '\u{200d}'
}
