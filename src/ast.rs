// program ::= declaration*
// declaration ::= interface | struct | function
// interface ::= 'interface' ID '{' ('void' ID '(' ')' ';')* '}'
// struct ::= 'struct' ID ['->' ID] '{' (ID type ';')* '}'
// function ::= ('void' | 'int32') ID '(' ')' ['->' param (',' param)*] block
// param ::= type ID
// type ::= ('void' | 'int32' | ID) ['*']
// block ::= '{' statement* '}'
// statement ::= block
//             | 'if' '(' expr ')' statement ['else' statement]
//             | 'var' ID type ['=' expr] ';'
//             | 'return' [expr] ';'
//             | expr ';'
// expr ::= expr ('==' | '!=' | '<' | '>') expr
//        | expr '+' expr
//        | '(' type ')' expr
//        | ID '(' [expr (',' expr)*] ')'
//        | ID
//        | integer
//        | string
//        | '(' expr ')'

// Precedence
//
// cast
// +
// == != < >

use std::fmt;

#[derive(Debug, PartialEq, Default)]
pub struct Program {
    pub decls: Vec<Decl>,
}

#[derive(Debug, PartialEq)]
pub struct Decl {
    pub kind: DeclKind,
    pub line: u32,
}

#[derive(Debug, PartialEq)]
pub enum DeclKind {
    Interface(InterfaceDecl),
    Struct(StructDecl),
    Function(FunctionDecl),
}

#[derive(Debug, PartialEq)]
pub struct InterfaceDecl {
    pub name: Ident,
    /// Method names. Every method returns `void` and takes no parameters.
    pub methods: Vec<Ident>,
}

#[derive(Debug, PartialEq)]
pub struct StructDecl {
    pub name: Ident,
    /// The interface named after `->`, if any. Conformance is not checked.
    pub interface: Option<Ident>,
    pub fields: Vec<Field>,
}

#[derive(Debug, PartialEq)]
pub struct Field {
    pub name: Ident,
    pub ty: TypeRef,
    pub line: u32,
}

#[derive(Debug, PartialEq)]
pub struct FunctionDecl {
    pub name: Ident,
    pub params: Vec<Param>,
    pub return_ty: TypeRef,
    pub body: Block,
}

#[derive(Debug, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub ty: TypeRef,
    pub line: u32,
}

#[derive(Debug, PartialEq)]
pub struct VariableDecl {
    pub name: Ident,
    pub ty: TypeRef,
    pub initializer: Option<Expr>,
}

#[derive(Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: u32,
}

#[derive(Debug, PartialEq)]
pub enum StmtKind {
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    Block(Block),
    Expr(Expr),
    Var(VariableDecl),
    Return(Option<Expr>),
}

#[derive(Debug, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: u32,
}

#[derive(Debug, PartialEq)]
pub enum ExprKind {
    Call {
        callee: Ident,
        args: Vec<Expr>,
    },
    Binary {
        op: BinaryOperator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Var(Ident),
    Literal(Literal),
    Cast {
        target: TypeRef,
        expr: Box<Expr>,
    },
}

/// A literal, already classified by the token it was parsed from.
#[derive(Debug, PartialEq)]
pub enum Literal {
    Int(i32),
    Str(Box<str>),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Eq,
    Ne,
    Lt,
    Gt,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Eq => "==",
            BinaryOperator::Ne => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Gt => ">",
        }
    }
}

/// A nominal type reference, such as `int32` or `char*`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub name: Box<str>,
    pub is_pointer: bool,
}

impl TypeRef {
    pub const VOID: &'static str = "void";

    pub fn new(name: impl Into<Box<str>>, is_pointer: bool) -> TypeRef {
        TypeRef {
            name: name.into(),
            is_pointer,
        }
    }

    pub fn void() -> TypeRef {
        TypeRef::new(TypeRef::VOID, false)
    }

    pub fn is_void(&self) -> bool {
        &*self.name == TypeRef::VOID
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.is_pointer {
            f.write_str("*")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ident {
    pub name: Box<str>,
    pub line: u32,
}

impl Ident {
    pub fn new(name: impl Into<Box<str>>, line: u32) -> Ident {
        Ident {
            name: name.into(),
            line,
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
