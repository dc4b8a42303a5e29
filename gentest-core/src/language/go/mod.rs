//! Go language support
//!
//! Parsing, top-level function discovery, doc comments and package
//! grouping on top of the tree-sitter-go grammar.

pub mod doc;
pub mod package;
pub mod parser;

pub use package::GoPackage;
pub use parser::{FunctionDecl, GoParser, GoSource};
