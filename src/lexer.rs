use std::iter::Peekable;

use tracing::{trace, warn};

use crate::token::{Token, TokenKind, KEYWORDS};

pub const SUGGESTED_TOKENS_CAPACITY: usize = 1_024;

/// Lexes the provided string, producing the tokens into the provided buffer.
///
/// The buffer always ends with a single [`TokenKind::Eof`] token. Returns
/// the starting line of a string literal left unterminated at the end of
/// the input, which is dropped from the buffer.
pub fn lex_into(src: &str, tokens: &mut Vec<Token>) -> Option<u32> {
    Lexer::new(src, tokens).lex()
}

/// A convenience function that allocates a new buffer per lexed input and
/// returns it.
pub fn lex(src: &str) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY);
    lex_into(src, &mut tokens);
    tokens
}

/// The jlang lexer.
///
/// Lexing never fails. Unrecognized characters become [`TokenKind::Unknown`]
/// tokens, leaving all error reporting to the parser.
struct Lexer<'src, 'tok> {
    src: &'src str,
    iter: Peekable<std::str::Chars<'src>>,
    cursor: usize,
    current_lo: usize,
    line: u32,
    tokens: &'tok mut Vec<Token>,
    unterminated: Option<u32>,
}

impl Lexer<'_, '_> {
    /// Scans the source string until the input is exhausted.
    fn lex(mut self) -> Option<u32> {
        assert_eq!(self.tokens.len(), 0, "must pass clean tokens buffer");
        loop {
            self.skip_whitespace();
            if self.is_at_end() {
                break;
            }
            if let Some(kind) = self.scan_token_kind() {
                self.produce(kind);
            }
        }
        self.tokens.push(Token::new(TokenKind::Eof, "", self.line));
        trace!(count = self.tokens.len(), "lexed source");
        self.unterminated
    }

    /// Scans the current character. Returns `None` if nothing should be
    /// produced (which only happens for unterminated strings).
    fn scan_token_kind(&mut self) -> Option<TokenKind> {
        use TokenKind::*;
        let kind = match self.mark_advance() {
            '{' => LBrace,
            '}' => RBrace,
            '(' => LParen,
            ')' => RParen,
            ';' => Semicolon,
            ':' => Colon,
            ',' => Comma,
            '.' => Dot,
            '*' => Star,
            '+' => Plus,
            '<' => Less,
            '>' => Greater,
            '=' => match self.peek() {
                '=' => self.advance_with(EqualEqual),
                _ => Equal,
            },
            '!' => match self.peek() {
                '=' => self.advance_with(NotEqual),
                _ => Unknown,
            },
            '-' => match self.peek() {
                '>' => self.advance_with(Arrow),
                _ => Unknown,
            },
            '"' => return self.string(),
            c if c.is_ascii_digit() => self.number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier_or_keyword(),
            _ => Unknown,
        };
        Some(kind)
    }

    /// Lexes a string literal. There are no escape sequences: the literal
    /// ends at the next quotation mark.
    ///
    /// An unterminated literal produces no token at all.
    fn string(&mut self) -> Option<TokenKind> {
        let start_line = self.line;
        loop {
            match self.peek() {
                '"' => break,
                '\0' if self.is_at_end() => {
                    warn!(line = start_line, "unterminated string literal, dropping it");
                    self.unterminated = Some(start_line);
                    return None;
                }
                '\n' => {
                    self.line += 1;
                    self.advance();
                }
                _ => {
                    self.advance();
                }
            }
        }
        let contents = &self.src[self.current_lo + 1..self.cursor];
        self.advance(); // closing quote
        self.tokens
            .push(Token::new(TokenKind::StringLiteral, contents, start_line));
        None
    }

    fn identifier_or_keyword(&mut self) -> TokenKind {
        let valid_identifier_suffix = |c: char| c.is_ascii_alphanumeric() || c == '_';

        while valid_identifier_suffix(self.peek()) {
            self.advance();
        }
        match KEYWORDS.get(self.substr()).copied() {
            Some(keyword) => keyword,
            None => TokenKind::Identifier,
        }
    }

    fn number(&mut self) -> TokenKind {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        TokenKind::NumberLiteral
    }

    fn skip_whitespace(&mut self) {
        loop {
            match self.peek() {
                ' ' | '\t' | '\r' => {
                    self.advance();
                }
                '\n' => {
                    self.line += 1;
                    self.advance();
                }
                _ => break,
            }
        }
    }
}

impl Lexer<'_, '_> {
    /// Constructs a new lexer with the default state.
    fn new<'src, 'tok>(src: &'src str, tokens: &'tok mut Vec<Token>) -> Lexer<'src, 'tok> {
        Lexer {
            src,
            iter: src.chars().peekable(),
            cursor: 0,
            current_lo: 0,
            line: 1,
            tokens,
            unterminated: None,
        }
    }

    fn is_at_end(&self) -> bool {
        self.cursor >= self.src.len()
    }

    /// Starts a new token "mark" and advances the iterator.
    fn mark_advance(&mut self) -> char {
        self.current_lo = self.cursor;
        self.advance()
    }

    /// Returns the next character and advances the iterator.
    fn advance(&mut self) -> char {
        self.iter
            .next()
            .inspect(|c| self.cursor += c.len_utf8())
            .unwrap_or('\0')
    }

    /// Advances and returns the provided value.
    fn advance_with<T>(&mut self, value: T) -> T {
        self.advance();
        value
    }

    /// Returns the next character without advancing the iterator.
    fn peek(&mut self) -> char {
        self.iter.peek().copied().unwrap_or('\0')
    }

    /// Returns the substring of the current marked bounds.
    fn substr(&self) -> &str {
        &self.src[self.current_lo..self.cursor]
    }

    /// Produces a token using the marked bounds as its lexeme.
    fn produce(&mut self, kind: TokenKind) {
        let token = Token::new(kind, self.substr(), self.line);
        self.tokens.push(token);
    }
}
