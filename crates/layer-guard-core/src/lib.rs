//! # layer-guard-core
//!
//! Core engine for enforcing architectural layer rules over PHP sources.
//!
//! This crate is language-agnostic up to the syntax tree: a parser adapter
//! produces [`ast::ParsedFile`]s and the engine does the rest.
//!
//! - [`ast`] extracts symbols and class-to-class references into an [`AstMap`]
//! - [`collector`] decides which symbols belong to a layer
//! - [`config`] validates layer definitions and the allow-list
//! - [`Analyzer`] runs extraction, layer resolution and ruleset evaluation
//!
//! ## Example
//!
//! ```ignore
//! use layer_guard_core::Analyzer;
//!
//! let analyzer = Analyzer::builder()
//!     .raw_configuration(config)
//!     .build()?;
//!
//! let analysis = analyzer.analyze(parsed_files)?;
//! for violation in analysis.report.violations() {
//!     println!("{}", violation.format());
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
pub mod ast;
pub mod collector;
pub mod config;
mod layer;
mod ruleset;
mod types;

pub use analyzer::{Analysis, Analyzer, AnalyzerBuilder, AnalyzerError};
pub use ast::AstMap;
pub use config::{Configuration, ConfigurationError};
pub use layer::{LayerMembership, LayerResolver};
pub use ruleset::RulesetEngine;
pub use types::{
    Classification, ClassifiedEdge, Reference, ReferenceKind, Report, SkipEntry, Summary,
};
