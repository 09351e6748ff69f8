use globalize_ast::Span;

/// Represents the different kinds of tokens in JavaScript.
///
/// Contextual words (`from`, `as`, `async`, `of`, `get`, ...) are lexed as
/// [`TokenKind::Identifier`] and recognized by the parser through
/// [`Token::is_word`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Keywords
    Var,
    Let,
    Const,
    Function,
    Class,
    Extends,
    Return,
    If,
    Else,
    For,
    While,
    Do,
    Break,
    Continue,
    Switch,
    Case,
    Default,
    Import,
    Export,
    New,
    Delete,
    This,
    Super,
    Typeof,
    Instanceof,
    In,
    Void,
    Null,
    True,
    False,
    Await,
    Yield,
    Try,
    Catch,
    Finally,
    Throw,
    Debugger,
    With,

    // Literals
    NumberLiteral,
    BigIntLiteral,
    StringLiteral,
    /// Template without substitutions: `text`
    TemplateLiteral,
    /// Opening piece of a template: `text${
    TemplateHead,
    /// Piece between two substitutions: }text${
    TemplateMiddle,
    /// Closing piece of a template: }text`
    TemplateTail,
    RegexLiteral,

    // Identifiers
    Identifier,
    PrivateName,

    // Operators
    Plus,              // +
    Minus,             // -
    Star,              // *
    Slash,             // /
    Percent,           // %
    StarStar,          // **
    Eq,                // =
    EqEq,              // ==
    EqEqEq,            // ===
    BangEq,            // !=
    BangEqEq,          // !==
    Lt,                // <
    Gt,                // >
    LtEq,              // <=
    GtEq,              // >=
    AmpAmp,            // &&
    PipePipe,          // ||
    Bang,              // !
    Amp,               // &
    Pipe,              // |
    Caret,             // ^
    Tilde,             // ~
    LtLt,              // <<
    GtGt,              // >>
    GtGtGt,            // >>>
    PlusEq,            // +=
    MinusEq,           // -=
    StarEq,            // *=
    SlashEq,           // /=
    PercentEq,         // %=
    StarStarEq,        // **=
    AmpAmpEq,          // &&=
    PipePipeEq,        // ||=
    QuestionQuestionEq,// ??=
    LtLtEq,            // <<=
    GtGtEq,            // >>=
    GtGtGtEq,          // >>>=
    AmpEq,             // &=
    PipeEq,            // |=
    CaretEq,           // ^=
    QuestionQuestion,  // ??
    QuestionDot,       // ?.
    PlusPlus,          // ++
    MinusMinus,        // --
    FatArrow,          // =>
    DotDotDot,         // ...

    // Delimiters
    LParen,            // (
    RParen,            // )
    LBrace,            // {
    RBrace,            // }
    LBracket,          // [
    RBracket,          // ]
    Semicolon,         // ;
    Comma,             // ,
    Dot,               // .
    Colon,             // :
    Question,          // ?
    At,                // @

    // Special
    Eof,
    Error,
}

impl TokenKind {
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "var" => TokenKind::Var,
            "let" => TokenKind::Let,
            "const" => TokenKind::Const,
            "function" => TokenKind::Function,
            "class" => TokenKind::Class,
            "extends" => TokenKind::Extends,
            "return" => TokenKind::Return,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "while" => TokenKind::While,
            "do" => TokenKind::Do,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "switch" => TokenKind::Switch,
            "case" => TokenKind::Case,
            "default" => TokenKind::Default,
            "import" => TokenKind::Import,
            "export" => TokenKind::Export,
            "new" => TokenKind::New,
            "delete" => TokenKind::Delete,
            "this" => TokenKind::This,
            "super" => TokenKind::Super,
            "typeof" => TokenKind::Typeof,
            "instanceof" => TokenKind::Instanceof,
            "in" => TokenKind::In,
            "void" => TokenKind::Void,
            "null" => TokenKind::Null,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "await" => TokenKind::Await,
            "yield" => TokenKind::Yield,
            "try" => TokenKind::Try,
            "catch" => TokenKind::Catch,
            "finally" => TokenKind::Finally,
            "throw" => TokenKind::Throw,
            "debugger" => TokenKind::Debugger,
            "with" => TokenKind::With,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_keyword(self) -> bool {
        (self as u8) <= (TokenKind::With as u8)
    }

    /// Whether a token of this kind can end an expression. A `/` that follows
    /// such a token is division; anywhere else it starts a regex literal.
    pub fn ends_expression(self) -> bool {
        matches!(
            self,
            TokenKind::Identifier
                | TokenKind::PrivateName
                | TokenKind::NumberLiteral
                | TokenKind::BigIntLiteral
                | TokenKind::StringLiteral
                | TokenKind::TemplateLiteral
                | TokenKind::TemplateTail
                | TokenKind::RegexLiteral
                | TokenKind::This
                | TokenKind::Super
                | TokenKind::Null
                | TokenKind::True
                | TokenKind::False
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
        )
    }
}

/// Represents a token with its kind, span, and value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// Identifier name, unescaped string value, raw template/regex text,
    /// punctuator text, or the message of an error token.
    pub value: String,
    /// A line terminator separates this token from the previous one.
    pub newline_before: bool,
}

impl Token {
    pub(crate) fn new(kind: TokenKind, span: Span, value: String) -> Self {
        Self {
            kind,
            span,
            value,
            newline_before: false,
        }
    }

    /// Identifier or keyword whose text is exactly `word`.
    pub fn is_word(&self, word: &str) -> bool {
        (self.kind == TokenKind::Identifier || self.kind.is_keyword()) && self.value == word
    }

    /// Anything that may stand as a property or export name (identifiers and
    /// reserved words alike).
    pub fn is_name(&self) -> bool {
        self.kind == TokenKind::Identifier || self.kind.is_keyword()
    }
}
