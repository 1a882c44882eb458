use std::fmt;

#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: u32,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: u32) -> Token {
        Token {
            kind,
            lexeme: lexeme.into(),
            line,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?}, {:?}, line {})", self.kind, self.lexeme, self.line)
    }
}

/// A value tied to the source line it originated from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Located<T> {
    pub line: u32,
    pub inner: T,
}

impl<T> Located<T> {
    pub fn new(line: u32, inner: T) -> Located<T> {
        Located { line, inner }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Located<U> {
        Located {
            line: self.line,
            inner: f(self.inner),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Interface,
    Struct,
    Var,
    Void,
    Int32,
    If,
    Else,
    Return,

    LBrace,
    RBrace,
    LParen,
    RParen,
    Semicolon,
    Colon,
    /// `->`
    Arrow,
    /// `=`
    Equal,
    Star,
    Comma,
    Dot,
    Plus,
    /// `!=`
    NotEqual,
    /// `==`
    EqualEqual,
    Less,
    Greater,

    Identifier,
    /// The lexeme holds the contents between the quotes.
    StringLiteral,
    NumberLiteral,

    Eof,
    Unknown,
}

impl TokenKind {
    /// Whether this token may begin a top-level declaration.
    pub fn starts_declaration(self) -> bool {
        matches!(
            self,
            TokenKind::Interface | TokenKind::Struct | TokenKind::Void | TokenKind::Int32
        )
    }

    /// Whether this token may begin an operand, i.e., a primary expression
    /// or a cast.
    pub fn starts_operand(self) -> bool {
        matches!(
            self,
            TokenKind::Identifier
                | TokenKind::NumberLiteral
                | TokenKind::StringLiteral
                | TokenKind::LParen
        )
    }
}

pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "interface" => TokenKind::Interface,
    "struct" => TokenKind::Struct,
    "var" => TokenKind::Var,
    "void" => TokenKind::Void,
    "int32" => TokenKind::Int32,
    "if" => TokenKind::If,
    "else" => TokenKind::Else,
    "return" => TokenKind::Return,
};
