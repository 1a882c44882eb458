use tracing::{debug, trace};

use crate::{
    ast::{
        BinaryOperator, Block, Decl, DeclKind, Expr, ExprKind, Field, FunctionDecl, Ident,
        InterfaceDecl, Literal, Param, Program, Stmt, StmtKind, StructDecl, TypeRef,
        VariableDecl,
    },
    lexer,
    token::{Located, Token, TokenKind},
};

type Result<T, E = ()> = std::result::Result<T, E>;

/// On failure, carries whatever could still be parsed alongside the errors.
pub type ParseResult<T> = Result<T, (T, Vec<Located<Error>>)>;

/// Lexes and parses the provided source.
pub fn parse_program(src: &str) -> ParseResult<Program> {
    let tokens = lexer::lex(src);
    parse(&tokens)
}

/// Parses a token sequence (as produced by the lexer) into a program.
///
/// Declarations which contain syntax errors are never part of the returned
/// program, even in the error case.
///
/// # Panics
///
/// Panics if `tokens` is not terminated by a [`TokenKind::Eof`] token.
pub fn parse(tokens: &[Token]) -> ParseResult<Program> {
    assert!(
        tokens.last().is_some_and(Token::is_eof),
        "token sequence must be terminated by eof"
    );
    let mut p = Parser::new(tokens);
    let program = p.parse_program();
    if p.errors.is_empty() {
        Ok(program)
    } else {
        Err((program, p.errors))
    }
}

/// Parses a single expression, which must span the whole source.
pub fn parse_expr(src: &str) -> Result<Expr, Vec<Located<Error>>> {
    let tokens = lexer::lex(src);
    let mut p = Parser::new(&tokens);
    let parsed = p.parse_expr().and_then(|expr| {
        p.consume(TokenKind::Eof)?;
        Ok(expr)
    });
    match parsed {
        Ok(expr) if p.errors.is_empty() => Ok(expr),
        _ => Err(p.errors),
    }
}

struct Parser<'tok> {
    tokens: &'tok [Token],
    cursor: usize,
    errors: Vec<Located<Error>>,
}

impl Parser<'_> {
    fn parse_program(&mut self) -> Program {
        let mut decls = Vec::with_capacity(8);
        while self.except([]) {
            let current = self.peek();
            if !current.kind.starts_declaration() {
                trace!(line = current.line, kind = ?current.kind, "skipping top-level token");
                self.advance();
                continue;
            }

            let start = self.cursor;
            let errors_before = self.errors.len();
            match self.parse_decl() {
                Ok(decl) if self.errors.len() == errors_before => decls.push(decl),
                Ok(decl) => {
                    debug!(line = decl.line, "discarding declaration with syntax errors");
                }
                Err(()) => {
                    debug!(line = current.line, "discarding malformed declaration");
                    self.synchronize_declaration(start);
                }
            }
        }
        Program { decls }
    }

    fn parse_decl(&mut self) -> Result<Decl> {
        let line = self.peek().line;
        let kind = match self.peek().kind {
            TokenKind::Interface => DeclKind::Interface(self.parse_interface()?),
            TokenKind::Struct => DeclKind::Struct(self.parse_struct()?),
            TokenKind::Void | TokenKind::Int32 => DeclKind::Function(self.parse_function()?),
            other => unreachable!("{other:?} does not start a declaration"),
        };
        Ok(Decl { kind, line })
    }

    fn parse_interface(&mut self) -> Result<InterfaceDecl> {
        self.consume(TokenKind::Interface)?;
        let name = self.parse_ident()?;
        self.consume(TokenKind::LBrace)?;

        let mut methods = Vec::new();
        while self.except([TokenKind::RBrace]) {
            self.consume(TokenKind::Void)?;
            let method = self.parse_ident()?;
            self.consume(TokenKind::LParen)?;
            self.consume(TokenKind::RParen)?;
            self.consume(TokenKind::Semicolon)?;
            methods.push(method);
        }
        self.consume(TokenKind::RBrace)?;

        Ok(InterfaceDecl { name, methods })
    }

    fn parse_struct(&mut self) -> Result<StructDecl> {
        self.consume(TokenKind::Struct)?;
        let name = self.parse_ident()?;

        let interface = if self.take(TokenKind::Arrow) {
            Some(self.parse_ident()?)
        } else {
            None
        };

        self.consume(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        while self.except([TokenKind::RBrace]) {
            let line = self.peek().line;
            let name = self.parse_ident()?;
            let ty = self.parse_type()?;
            self.consume(TokenKind::Semicolon)?;
            fields.push(Field { name, ty, line });
        }
        self.consume(TokenKind::RBrace)?;

        Ok(StructDecl {
            name,
            interface,
            fields,
        })
    }

    fn parse_function(&mut self) -> Result<FunctionDecl> {
        let return_token = self.consume_any(&[TokenKind::Void, TokenKind::Int32])?;
        let return_ty = TypeRef::new(&*return_token.lexeme, false);
        let name = self.parse_ident()?;
        self.consume(TokenKind::LParen)?;
        self.consume(TokenKind::RParen)?;

        let params = if self.take(TokenKind::Arrow) {
            self.parse_separated(TokenKind::Comma, Parser::parse_param)?
        } else {
            Vec::new()
        };

        let body = self.parse_block()?;

        Ok(FunctionDecl {
            name,
            params,
            return_ty,
            body,
        })
    }

    fn parse_param(&mut self) -> Result<Param> {
        let line = self.peek().line;
        let ty = self.parse_type()?;
        let name = self.parse_ident()?;
        Ok(Param { name, ty, line })
    }

    fn parse_type(&mut self) -> Result<TypeRef> {
        let token = self.peek();
        let name = match token.kind {
            TokenKind::Void | TokenKind::Int32 | TokenKind::Identifier => {
                self.advance();
                &*token.lexeme
            }
            actual => {
                self.error(token.line, Error::ExpectedType { actual });
                return Err(());
            }
        };
        let is_pointer = self.take(TokenKind::Star);
        Ok(TypeRef::new(name, is_pointer))
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        let token = self.consume(TokenKind::Identifier)?;
        Ok(Ident::new(&*token.lexeme, token.line))
    }

    fn parse_block(&mut self) -> Result<Block> {
        self.consume(TokenKind::LBrace)?;
        let mut statements = Vec::new();
        while self.except([TokenKind::RBrace]) {
            if let Ok(statement) = self.parse_statement() {
                statements.push(statement);
            } else {
                self.synchronize_statement();
            }
        }
        self.consume(TokenKind::RBrace)?;
        Ok(Block { statements })
    }

    fn parse_statement(&mut self) -> Result<Stmt> {
        let line = self.peek().line;
        let kind = match self.peek().kind {
            TokenKind::LBrace => StmtKind::Block(self.parse_block()?),
            TokenKind::If => self.parse_if()?,
            TokenKind::Var => StmtKind::Var(self.parse_variable()?),
            TokenKind::Return => {
                self.consume(TokenKind::Return)?;
                let value = if self.is(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.consume(TokenKind::Semicolon)?;
                StmtKind::Return(value)
            }
            _ => {
                let expr = self.parse_expr()?;
                self.consume(TokenKind::Semicolon)?;
                StmtKind::Expr(expr)
            }
        };
        Ok(Stmt { kind, line })
    }

    fn parse_if(&mut self) -> Result<StmtKind> {
        self.consume(TokenKind::If)?;
        self.consume(TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.consume(TokenKind::RParen)?;
        let then_branch = self.parse_statement()?;
        let else_branch = if self.take(TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(StmtKind::If {
            condition,
            then_branch: Box::new(then_branch),
            else_branch,
        })
    }

    fn parse_variable(&mut self) -> Result<VariableDecl> {
        self.consume(TokenKind::Var)?;
        let name = self.parse_ident()?;
        let ty = self.parse_type()?;
        let initializer = if self.take(TokenKind::Equal) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon)?;
        Ok(VariableDecl {
            name,
            ty,
            initializer,
        })
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_expr_bp(0)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;

        loop {
            let op_token = self.peek();
            let Some((op, lbp, rbp)) = Self::infix_binding_power(op_token.kind) else {
                // Not an infix operator
                break;
            };
            if lbp < min_bp {
                // Operator binds less tightly than the minimum required
                break;
            }
            self.advance(); // Operator

            let rhs = self.parse_expr_bp(rbp)?;
            lhs = Expr {
                kind: ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                line: op_token.line,
            };
        }

        Ok(lhs)
    }

    fn infix_binding_power(kind: TokenKind) -> Option<(BinaryOperator, u8, u8)> {
        let bp = match kind {
            // Comparisons (left-associative)
            TokenKind::EqualEqual => (BinaryOperator::Eq, 1, 2),
            TokenKind::NotEqual => (BinaryOperator::Ne, 1, 2),
            TokenKind::Less => (BinaryOperator::Lt, 1, 2),
            TokenKind::Greater => (BinaryOperator::Gt, 1, 2),

            // Addition (left-associative)
            TokenKind::Plus => (BinaryOperator::Add, 3, 4),

            _ => return None,
        };
        Some(bp)
    }

    /// Parses a cast, if one starts at the current position, or a primary
    /// expression otherwise.
    fn parse_unary(&mut self) -> Result<Expr> {
        if !self.is_cast_ahead() {
            return self.parse_primary();
        }
        let lparen = self.consume(TokenKind::LParen)?;
        let target = self.parse_type()?;
        self.consume(TokenKind::RParen)?;
        let expr = self.parse_unary()?;
        Ok(Expr {
            kind: ExprKind::Cast {
                target,
                expr: Box::new(expr),
            },
            line: lparen.line,
        })
    }

    /// Tells a cast apart from a parenthesized expression without consuming
    /// anything. `(T)` only counts as a cast when an operand follows it.
    fn is_cast_ahead(&self) -> bool {
        if !self.is(TokenKind::LParen) {
            return false;
        }
        match self.peek_nth(1).kind {
            TokenKind::Void | TokenKind::Int32 => true,
            TokenKind::Identifier => match self.peek_nth(2).kind {
                TokenKind::Star => true,
                TokenKind::RParen => self.peek_nth(3).kind.starts_operand(),
                _ => false,
            },
            _ => false,
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.peek();
        if !token.kind.starts_operand() {
            let actual = token.kind;
            self.error(token.line, Error::ExpectedExpression { actual });
            return Err(());
        }
        self.advance();
        let kind = match token.kind {
            TokenKind::Identifier => {
                let name = Ident::new(&*token.lexeme, token.line);
                if self.take(TokenKind::LParen) {
                    let args = if self.is(TokenKind::RParen) {
                        Vec::new()
                    } else {
                        self.parse_separated(TokenKind::Comma, Parser::parse_expr)?
                    };
                    self.consume(TokenKind::RParen)?;
                    ExprKind::Call { callee: name, args }
                } else {
                    ExprKind::Var(name)
                }
            }
            TokenKind::NumberLiteral => {
                let Ok(value) = token.lexeme.parse() else {
                    self.error(token.line, Error::ParseInt);
                    return Err(());
                };
                ExprKind::Literal(Literal::Int(value))
            }
            TokenKind::StringLiteral => {
                ExprKind::Literal(Literal::Str(token.lexeme.as_str().into()))
            }

            // Grouping: ( expr )
            TokenKind::LParen => {
                let expr = self.parse_expr()?;
                self.consume(TokenKind::RParen)?;
                return Ok(expr);
            }

            other => unreachable!("{other:?} does not start an operand"),
        };
        Ok(Expr {
            kind,
            line: token.line,
        })
    }

    /// Parses `item (separator item)*`.
    fn parse_separated<T>(
        &mut self,
        separator: TokenKind,
        mut parse_item: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut items = vec![parse_item(self)?];
        while self.take(separator) {
            items.push(parse_item(self)?);
        }
        Ok(items)
    }
}

impl<'tok> Parser<'tok> {
    fn new(tokens: &'tok [Token]) -> Parser<'tok> {
        Parser {
            tokens,
            cursor: 0,
            errors: Vec::with_capacity(8),
        }
    }

    /// Records an error at the provided line.
    fn error(&mut self, line: u32, error: Error) {
        self.errors.push(Located::new(line, error));
    }

    /// Returns the current token.
    #[inline]
    fn peek(&self) -> &'tok Token {
        self.peek_nth(0)
    }

    /// Returns the token `n` positions ahead of the current one, saturating
    /// at the final [`TokenKind::Eof`].
    fn peek_nth(&self, n: usize) -> &'tok Token {
        let tokens = self.tokens;
        let last = tokens.len() - 1;
        &tokens[(self.cursor + n).min(last)]
    }

    /// Returns the current token and advances. Never advances past eof.
    fn advance(&mut self) -> &'tok Token {
        let c = self.peek();
        if !c.is_eof() {
            self.cursor += 1;
        }
        c
    }

    /// Checks whether the current token matches the given one.
    fn is(&self, expect: TokenKind) -> bool {
        self.peek().kind == expect
    }

    /// Advances if the current token matches the provided one, returning true.
    /// If not, returns false and doesn't advance.
    fn take(&mut self, expect: TokenKind) -> bool {
        if self.is(expect) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advances if the current token matches the provided one, returning it.
    /// If not, records an error.
    fn consume(&mut self, expect: TokenKind) -> Result<&'tok Token> {
        let c = self.peek();
        if self.is(expect) {
            self.advance();
            Ok(c)
        } else {
            self.error(
                c.line,
                Error::Unexpected {
                    actual: c.kind,
                    expected: expect,
                },
            );
            Err(())
        }
    }

    /// Advances if the current token matches any of the provided tokens,
    /// returning it. If not, records an error.
    fn consume_any(&mut self, expect: &'static [TokenKind]) -> Result<&'tok Token> {
        for t in expect {
            if self.is(*t) {
                return Ok(self.advance());
            }
        }
        let c = self.peek();
        self.error(
            c.line,
            Error::UnexpectedAny {
                actual: c.kind,
                expected: Box::from(expect),
            },
        );
        Err(())
    }

    /// Returns true while the current token does *not* match one of the
    /// provided ones. [`TokenKind::Eof`] is implicitly included in the list.
    ///
    /// This won't advance the cursor.
    fn except(&self, except: impl IntoIterator<Item = TokenKind>) -> bool {
        let c = self.peek();
        for e in except {
            if c.kind == e {
                return false;
            }
        }
        c.kind != TokenKind::Eof
    }

    /// Skips the remainder of a broken statement: up to and including the
    /// next `;`, or up to (excluding) the `}` which closes the current block.
    /// Nested braces are skipped as a whole.
    fn synchronize_statement(&mut self) {
        let mut depth = 0_usize;
        loop {
            match self.peek().kind {
                TokenKind::Eof => break,
                TokenKind::RBrace if depth == 0 => break,
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    break;
                }
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => depth -= 1,
                _ => {}
            }
            self.advance();
        }
    }

    /// Rescans from the start of a broken declaration until the brace that
    /// closes it, or until the next declaration at the outermost level.
    ///
    /// A type keyword right after `->` or `,` is a parameter type of the
    /// broken header, not the start of another function.
    fn synchronize_declaration(&mut self, start: usize) {
        self.cursor = start;
        self.advance(); // The declaration keyword
        let mut depth = 0_usize;
        loop {
            let previous = self.tokens[self.cursor - 1].kind;
            match self.peek().kind {
                TokenKind::Eof => break,
                TokenKind::Void | TokenKind::Int32
                    if matches!(previous, TokenKind::Arrow | TokenKind::Comma) => {}
                kind if depth == 0 && kind.starts_declaration() => break,
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    self.advance();
                    if depth <= 1 {
                        break;
                    }
                    depth -= 1;
                    continue;
                }
                _ => {}
            }
            self.advance();
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Unexpected {
        actual: TokenKind,
        expected: TokenKind,
    },
    UnexpectedAny {
        actual: TokenKind,
        expected: Box<[TokenKind]>,
    },
    ExpectedExpression {
        actual: TokenKind,
    },
    ExpectedType {
        actual: TokenKind,
    },
    /// Integer literal does not fit in 32 bits.
    ParseInt,
}

#[cfg(test)]
mod tests {
    use crate::util::test_utils::tree_tests;

    #[test]
    #[should_panic(expected = "token sequence must be terminated by eof")]
    fn test_parse_requires_eof() {
        let _ = super::parse(&[]);
    }

    tree_tests!(
        use parser;

        fn test_identifier_expr() {
            let expr = "myVar";
            let tree_ok = "ident myVar @1";
        }

        fn test_integer_literal_expr() {
            let expr = "12345";
            let tree_ok = "int 12345 @1";
        }

        fn test_string_literal_expr() {
            let expr = r#""hello world""#;
            let tree_ok = r#"string "hello world" @1"#;
        }

        fn test_parenthesized_expr() {
            let expr = "(x)";
            let tree_ok = "ident x @1";
        }

        fn test_call_no_args() {
            let expr = "run()";
            let tree_ok = "call run @1";
        }

        fn test_call_multiple_args() {
            let expr = r#"printf("%d", a + 1, f())"#;
            let tree_ok = r#"
                call printf @1
                  string "%d" @1
                  binary Add @1
                    ident a @1
                    int 1 @1
                  call f @1
            "#;
        }

        fn test_binary_add_left_assoc() {
            let expr = "a + b + c";
            let tree_ok = "
                binary Add @1
                  binary Add @1
                    ident a @1
                    ident b @1
                  ident c @1
            ";
        }

        fn test_precedence_add_over_eq() {
            let expr = "a == b + 1";
            let tree_ok = "
                binary Eq @1
                  ident a @1
                  binary Add @1
                    ident b @1
                    int 1 @1
            ";
        }

        fn test_comparison_operators() {
            let expr = "a != b < c > d";
            let tree_ok = "
                binary Gt @1
                  binary Lt @1
                    binary Ne @1
                      ident a @1
                      ident b @1
                    ident c @1
                  ident d @1
            ";
        }

        fn test_grouping_overrides_precedence() {
            let expr = "(a == b) + 1";
            let tree_ok = "
                binary Add @1
                  binary Eq @1
                    ident a @1
                    ident b @1
                  int 1 @1
            ";
        }

        fn test_cast_pointer() {
            let expr = "(char*) p";
            let tree_ok = "
                cast char* @1
                  ident p @1
            ";
        }

        fn test_cast_keyword_type() {
            let expr = "(int32) x + 1";
            let tree_ok = "
                binary Add @1
                  cast int32 @1
                    ident x @1
                  int 1 @1
            ";
        }

        fn test_cast_named_type_before_operand() {
            let expr = r#"(Point) "x""#;
            let tree_ok = r#"
                cast Point @1
                  string "x" @1
            "#;
        }

        fn test_nested_cast() {
            let expr = "(char*) (Point*) p";
            let tree_ok = "
                cast char* @1
                  cast Point* @1
                    ident p @1
            ";
        }

        fn test_interface() {
            let program = "
                interface Drawable {
                    void draw();
                    void clear();
                }
            ";
            let tree_ok = "
                interface Drawable @2
                  method draw
                  method clear
            ";
        }

        fn test_empty_interface() {
            let program = "interface Marker {}";
            let tree_ok = "interface Marker @1";
        }

        fn test_struct() {
            let program = "
                struct P {
                    x int32;
                    name char*;
                }
            ";
            let tree_ok = "
                struct P @2
                  field x: int32 @3
                  field name: char* @4
            ";
        }

        fn test_struct_implementing_interface() {
            let program = "struct Square -> Drawable { side int32; }";
            let tree_ok = "
                struct Square -> Drawable @1
                  field side: int32 @1
            ";
        }

        fn test_function_no_params() {
            let program = "void main() { }";
            let tree_ok = "function main() : void @1";
        }

        fn test_function_single_param() {
            let program = "int32 len() -> char* s { return 0; }";
            let tree_ok = "
                function len(s: char*) : int32 @1
                  return @1
                    int 0 @1
            ";
        }

        fn test_function_multiple_params() {
            let program = "int32 add() -> int32 a, int32 b { return a + b; }";
            let tree_ok = "
                function add(a: int32, b: int32) : int32 @1
                  return @1
                    binary Add @1
                      ident a @1
                      ident b @1
            ";
        }

        fn test_statements() {
            let program = r#"
                void main() {
                    var x int32 = 1;
                    var s char*;
                    puts("hi");
                    { return; }
                }
            "#;
            let tree_ok = r#"
                function main() : void @2
                  var x: int32 @3 (initialized)
                    int 1 @3
                  var s: char* @4
                  expr @5
                    call puts @5
                      string "hi" @5
                  block @6
                    return @6
            "#;
        }

        fn test_if_else() {
            let program = "
                void main() {
                    if (x == 0) { } else { }
                }
            ";
            let tree_ok = "
                function main() : void @2
                  if @3
                    binary Eq @3
                      ident x @3
                      int 0 @3
                    then
                      block @3
                    else
                      block @3
            ";
        }

        fn test_if_without_else_and_dangling_else() {
            let program = "
                void main() {
                    if (a) if (b) f(); else g();
                }
            ";
            let tree_ok = "
                function main() : void @2
                  if @3
                    ident a @3
                    then
                      if @3
                        ident b @3
                        then
                          expr @3
                            call f @3
                        else
                          expr @3
                            call g @3
            ";
        }

        fn test_top_level_noise_is_skipped() {
            let program = "; 42 foo void main() { } = }";
            let tree_ok = "function main() : void @1";
        }

        fn test_multiple_declarations() {
            let program = "
                interface Shape { void area(); }
                struct Circle -> Shape { radius int32; }
                int32 main() { return 0; }
            ";
            let tree_ok = "
                interface Shape @2
                  method area
                struct Circle -> Shape @3
                  field radius: int32 @3
                function main() : int32 @4
                  return @4
                    int 0 @4
            ";
        }

        fn test_error_interface_method_not_void() {
            let program = "interface I { int32 f(); }";
            let expected_errors = &["line 1: expected token Void, but got Int32"];
        }

        fn test_error_struct_missing_semicolon() {
            let program = "
                struct A { x int32 }
                struct B { y int32; }
            ";
            let tree_error = "
                struct B @3
                  field y: int32 @3
            ";
            let expected_errors = &["line 2: expected token Semicolon, but got RBrace"];
        }

        fn test_error_struct_missing_field_type() {
            let program = "struct A { x ; }";
            let expected_errors = &["line 1: expected a type, but got Semicolon"];
        }

        fn test_error_function_missing_parens() {
            let program = "
                void f { }
                void g() { }
            ";
            let tree_error = "function g() : void @3";
            let expected_errors = &["line 2: expected token LParen, but got LBrace"];
        }

        fn test_error_missing_block() {
            let program = "void f() return;";
            let expected_errors = &["line 1: expected token LBrace, but got Return"];
        }

        fn test_error_unclosed_block() {
            let program = "void f() { g();";
            let expected_errors = &["line 1: expected token RBrace, but got Eof"];
        }

        fn test_error_expected_expression() {
            let expr = "1 + ;";
            let expected_errors = &["line 1: expected an expression, but got Semicolon"];
        }

        fn test_error_unmatched_paren() {
            let expr = "(1 + 2";
            let expected_errors = &["line 1: expected token RParen, but got Eof"];
        }

        fn test_error_trailing_tokens_in_expr() {
            let expr = "1 + 2)";
            let expected_errors = &["line 1: expected token Eof, but got RParen"];
        }

        fn test_error_parse_int_too_large() {
            let expr = "2147483648";
            let expected_errors = &["line 1: integer literal out of range"];
        }

        fn test_error_unknown_token_in_expr() {
            let expr = "a - b";
            let expected_errors = &["line 1: expected token Eof, but got Unknown"];
        }

        fn test_error_unterminated_string_in_statement() {
            let program = "void f() { puts(\"oops); }";
            let expected_errors = &[
                "line 1: expected an expression, but got Eof",
                "line 1: expected token RBrace, but got Eof",
            ];
        }

        fn test_unsupported_return_type_is_skipped() {
            let program = "void f() { } char g() { }";
            let tree_ok = "function f() : void @1";
        }

        fn test_recovery_discards_whole_function() {
            let program = "
                void broken() {
                    var x int32 = ;
                    ok();
                }

                void fine() {
                    ok();
                }
            ";
            let tree_error = "
                function fine() : void @7
                  expr @8
                    call ok @8
            ";
            let expected_errors = &["line 3: expected an expression, but got Semicolon"];
        }

        fn test_recovery_reports_every_broken_statement() {
            let program = "
                void f() {
                    a(;
                    if (x { b(); }
                    c();
                    var 1;
                }
            ";
            let tree_error = "";
            let expected_errors = &[
                "line 3: expected an expression, but got Semicolon",
                "line 4: expected token RParen, but got LBrace",
                "line 6: expected token Identifier, but got NumberLiteral",
            ];
        }

        fn test_recovery_nested_braces_in_header_error() {
            let program = "
                struct S -> { a int32; { } }
                void after() { }
            ";
            let tree_error = "function after() : void @3";
            let expected_errors = &["line 2: expected token Identifier, but got LBrace"];
        }

        fn test_recovery_skips_parameter_types_in_broken_header() {
            let program = "
                void f() -> int32 { }
                void g() -> char* s, int32 { }
                void h() { }
            ";
            let tree_error = "function h() : void @4";
            let expected_errors = &[
                "line 2: expected token Identifier, but got LBrace",
                "line 3: expected token Identifier, but got LBrace",
            ];
        }
    );
}
