//! Dependency extraction.
//!
//! # Architecture
//!
//! ```text
//! ParsedFile (typed syntax tree from a parser adapter)
//!   ↓ Extractor walks it, threading a TypeScope
//! DependencyResolver (one per reference shape)
//!   ↓ edges into a per-file FileExtraction
//! AstMapBuilder
//!   ↓ finish()
//! AstMap
//! ```

mod extract;
mod map;
mod resolver;
mod scope;
mod symbol;
mod syntax;

pub use extract::{
    ExtractionError, ExtractionOutcome, ExtractionPolicy, Extractor, MAX_DEPTH,
};
pub use map::{AstMap, AstMapBuilder, FileExtraction};
pub use resolver::{
    AttributeResolver, CatchResolver, ClassConstantResolver, DependencyResolver,
    InheritanceResolver, InstanceCallResolver, InstanceOfResolver, InstantiationResolver,
    InterfaceResolver, ReferenceBuilder, ResolverBox, ResolverRegistry, StaticCallResolver,
    TraitUseResolver, TypeHintResolver,
};
pub use scope::TypeScope;
pub use symbol::{symbol_key, FileReference, Symbol, SymbolKind};
pub use syntax::{
    ClassRef, HintPosition, NodeKind, ParsedFile, Receiver, SourceParser, SyntaxNode,
};
