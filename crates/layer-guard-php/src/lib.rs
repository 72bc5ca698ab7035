//! # layer-guard-php
//!
//! Tree-sitter based PHP adapter for layer-guard.
//!
//! [`PhpParser`] implements [`SourceParser`](layer_guard_core::ast::SourceParser):
//! it parses PHP with `tree-sitter-php` and maps namespaces, imports,
//! class-like declarations, signatures and class-referencing expressions to
//! the core's syntax node shapes.
//!
//! ## Example
//!
//! ```ignore
//! use layer_guard_core::ast::SourceParser;
//! use layer_guard_php::PhpParser;
//!
//! let parsed = PhpParser::new().parse(path, &source)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod convert;
mod parser;

pub use parser::PhpParser;
