//! Human-readable renderings of compiler data: error messages and AST trees.

pub mod error;
pub mod tree;
