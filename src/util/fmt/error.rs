use std::fmt::{self, Display, Formatter};

use crate::{codegen, driver::CompileError, parser, token::Located};

/// The alternate form (`{:#}`) prefixes the message with its line.
impl<T: Display> Display for Located<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "line {}: ", self.line)?;
        }
        self.inner.fmt(f)
    }
}

impl Display for parser::Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        use parser::Error::*;
        match self {
            Unexpected { actual, expected } => {
                write!(f, "expected token {expected:?}, but got {actual:?}")
            }
            UnexpectedAny { actual, expected } => {
                write!(f, "expected one of {expected:?}, but got {actual:?}")
            }
            ExpectedExpression { actual } => {
                write!(f, "expected an expression, but got {actual:?}")
            }
            ExpectedType { actual } => write!(f, "expected a type, but got {actual:?}"),
            ParseInt => write!(f, "integer literal out of range"),
        }
    }
}

impl Display for codegen::Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        use codegen::Position::*;
        f.write_str(match self {
            Variable => "a variable type",
            Field => "a field type",
            Parameter => "a parameter type",
            CastTarget => "a cast target",
            Pointee => "a pointee type",
        })
    }
}

impl Display for codegen::Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        use codegen::Error::*;
        match self {
            UnknownType(name) => write!(f, "unknown type {name}"),
            VoidNotAllowed(position) => write!(f, "void is not allowed as {position}"),
            UndefinedVariable(name) => write!(f, "undefined variable {name}"),
            UnknownFunction(name) => write!(f, "unknown function {name}"),
            DuplicateFunction(name) => write!(f, "function {name} is already defined"),
            DuplicateStruct(name) => write!(f, "struct {name} is already defined"),
            ArgumentCount {
                callee,
                expected,
                actual,
            } => write!(
                f,
                "incorrect number of arguments to {callee}. expected {expected}, but got {actual}"
            ),
            TypeMismatch { expected, actual } => {
                write!(f, "expected type {expected}, but got {actual}")
            }
            InvalidOperands { op, lhs, rhs } => {
                let op = op.symbol();
                write!(f, "invalid operands to {op}: {lhs} and {rhs}")
            }
            UnsupportedOperator(op) => {
                write!(f, "unsupported binary operator {}", op.symbol())
            }
            UnsupportedCast { from, to } => write!(f, "unsupported cast from {from} to {to}"),
            InvalidCondition(ty) => write!(f, "condition must be i1 or i32, but got {ty}"),
            MissingReturn(name) => write!(f, "missing return in non-void function {name}"),
            MissingReturnValue(ty) => write!(f, "missing return value of type {ty}"),
            UnexpectedReturnValue => write!(f, "void function cannot return a value"),
            UnreachableStatement => write!(f, "unreachable statement after return"),
        }
    }
}

impl Display for CompileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Syntax(count) => write!(f, "{count} syntax error(s)"),
            CompileError::Semantic(count) => write!(f, "{count} semantic error(s)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        ast::BinaryOperator,
        codegen,
        ir::Type,
        parser,
        token::{Located, TokenKind},
    };

    #[test]
    fn test_alternate_adds_line() {
        let error = Located::new(7, codegen::Error::UnknownFunction("g".into()));
        assert_eq!(format!("{error}"), "unknown function g");
        assert_eq!(format!("{error:#}"), "line 7: unknown function g");
    }

    #[test]
    fn test_messages() {
        let cases: [(Box<dyn std::fmt::Display>, &str); 4] = [
            (
                Box::new(parser::Error::UnexpectedAny {
                    actual: TokenKind::Identifier,
                    expected: Box::new([TokenKind::Void, TokenKind::Int32]),
                }),
                "expected one of [Void, Int32], but got Identifier",
            ),
            (
                Box::new(codegen::Error::VoidNotAllowed(codegen::Position::Variable)),
                "void is not allowed as a variable type",
            ),
            (
                Box::new(codegen::Error::InvalidOperands {
                    op: BinaryOperator::Add,
                    lhs: Type::I32,
                    rhs: Type::I8.pointer_to(),
                }),
                "invalid operands to +: i32 and i8*",
            ),
            (
                Box::new(codegen::Error::UnsupportedOperator(BinaryOperator::Lt)),
                "unsupported binary operator <",
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }
}
