//! Source front end
//!
//! Everything that touches tree-sitter lives below this module. The rest of
//! the crate sees declarations, spans and doc text.

pub mod go;
pub mod span;
pub mod tree_sitter_utils;

pub use go::{FunctionDecl, GoPackage, GoParser, GoSource};
pub use span::SourceSpan;
