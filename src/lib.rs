/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into an AST.
pub mod parser;

/// The code generator lowers an AST into an IR module.
pub mod codegen;

/// The driver runs the whole pipeline, reporting to a diagnostics sink.
pub mod driver;

pub mod ast;
pub mod diag;
pub mod ir;
pub mod token;

pub mod util {
    pub mod fmt;
    #[cfg(test)]
    pub(crate) mod test_utils;
}
