//! Syntax tree walking and parallel extraction.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, warn};

use super::map::{AstMap, AstMapBuilder, FileExtraction};
use super::resolver::ResolverRegistry;
use super::scope::TypeScope;
use super::symbol::{Symbol, SymbolKind};
use super::syntax::{NodeKind, ParsedFile, SyntaxNode};

/// Deepest syntax tree nesting the walker accepts.
pub const MAX_DEPTH: usize = 256;

/// Per-file failure to produce or walk a syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    /// The parser adapter could not produce a tree.
    #[error("failed to parse {}: {message}", path.display())]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// The tree could not be walked.
    #[error("malformed syntax tree in {}:{line}: {message}", path.display())]
    Malformed {
        /// Offending file.
        path: PathBuf,
        /// Line of the offending node.
        line: usize,
        /// What went wrong.
        message: String,
    },
}

impl ExtractionError {
    /// File the error belongs to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Parse { path, .. } | Self::Malformed { path, .. } => path,
        }
    }
}

/// What to do when a file fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionPolicy {
    /// Abort on the first failure (in input order) instead of skipping it.
    pub fail_fast: bool,
}

/// Result of extracting a whole file set.
#[derive(Debug)]
pub struct ExtractionOutcome {
    /// Finalized dependency graph.
    pub ast_map: AstMap,
    /// Files that were skipped.
    pub failures: Vec<ExtractionError>,
    /// Number of files merged into the map.
    pub files_extracted: usize,
}

/// Drives the resolvers over syntax trees.
#[derive(Debug, Default)]
pub struct Extractor {
    resolvers: ResolverRegistry,
    policy: ExtractionPolicy,
}

impl Extractor {
    /// Creates an extractor.
    #[must_use]
    pub fn new(resolvers: ResolverRegistry, policy: ExtractionPolicy) -> Self {
        Self { resolvers, policy }
    }

    /// Failure policy.
    #[must_use]
    pub fn policy(&self) -> ExtractionPolicy {
        self.policy
    }

    /// Extracts symbols and edges from one file.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Malformed`] if the tree nests deeper than
    /// [`MAX_DEPTH`].
    pub fn extract_file(&self, file: &ParsedFile) -> Result<FileExtraction, ExtractionError> {
        let mut walker = Walker {
            resolvers: &self.resolvers,
            path: &file.path,
            extraction: FileExtraction::new(&file.path),
            current: None,
        };
        walker.walk(&file.root, &mut TypeScope::new(), 0)?;
        Ok(walker.extraction)
    }

    /// Extracts every file in parallel and merges the results in input order.
    ///
    /// # Errors
    ///
    /// Under [`ExtractionPolicy::fail_fast`], returns the first failure in
    /// input order. Otherwise failures are collected in the outcome.
    pub fn extract_all(
        &self,
        files: Vec<Result<ParsedFile, ExtractionError>>,
    ) -> Result<ExtractionOutcome, ExtractionError> {
        let results: Vec<_> = files
            .into_par_iter()
            .map(|file| file.and_then(|file| self.extract_file(&file)))
            .collect();

        let mut builder = AstMapBuilder::new();
        let mut failures = Vec::new();
        let mut files_extracted = 0;

        for result in results {
            match result {
                Ok(extraction) => {
                    debug!(
                        file = %extraction.path().display(),
                        symbols = extraction.symbols().len(),
                        references = extraction.references().len(),
                        "extracted file"
                    );
                    builder.merge(extraction);
                    files_extracted += 1;
                }
                Err(e) if self.policy.fail_fast => return Err(e),
                Err(e) => {
                    warn!(error = %e, "skipping file");
                    failures.push(e);
                }
            }
        }

        Ok(ExtractionOutcome {
            ast_map: builder.finish(),
            failures,
            files_extracted,
        })
    }
}

struct Walker<'a> {
    resolvers: &'a ResolverRegistry,
    path: &'a Path,
    extraction: FileExtraction,
    /// Index of the innermost class-like being walked.
    current: Option<usize>,
}

impl Walker<'_> {
    fn walk(
        &mut self,
        node: &SyntaxNode,
        scope: &mut TypeScope,
        depth: usize,
    ) -> Result<(), ExtractionError> {
        if depth > MAX_DEPTH {
            return Err(ExtractionError::Malformed {
                path: self.path.to_path_buf(),
                line: node.line,
                message: format!("syntax tree nested deeper than {MAX_DEPTH} levels"),
            });
        }

        match &node.kind {
            NodeKind::Namespace { name } => {
                let mut inner = scope.clone();
                inner.enter_namespace(name);
                self.walk_children(node, &mut inner, depth)
            }
            NodeKind::Import { name, alias } => {
                scope.add_import(name, alias.as_deref());
                Ok(())
            }
            NodeKind::ClassLike { name, kind } => {
                self.walk_class_like(node, name, *kind, scope, depth)
            }
            NodeKind::Method { name } => {
                if let Some(symbol) = self.current.and_then(|i| self.extraction.symbol_mut(i)) {
                    symbol.push_method(name);
                }
                let mut inner = scope.clone();
                inner.clear_variables();
                self.walk_children(node, &mut inner, depth)
            }
            NodeKind::Bind { variable, class } => {
                self.walk_children(node, scope, depth)?;
                match scope.resolve_class(class) {
                    Some(class) => scope.bind(variable, class),
                    None => scope.unbind(variable),
                }
                Ok(())
            }
            _ => {
                self.resolve(node, scope);
                self.walk_children(node, scope, depth)
            }
        }
    }

    fn walk_children(
        &mut self,
        node: &SyntaxNode,
        scope: &mut TypeScope,
        depth: usize,
    ) -> Result<(), ExtractionError> {
        for child in &node.children {
            self.walk(child, scope, depth + 1)?;
        }
        Ok(())
    }

    fn walk_class_like(
        &mut self,
        node: &SyntaxNode,
        name: &str,
        kind: SymbolKind,
        scope: &TypeScope,
        depth: usize,
    ) -> Result<(), ExtractionError> {
        let fqcn = scope.qualify_declaration(name);
        let parent = if kind == SymbolKind::Class {
            node.children.iter().find_map(|child| match &child.kind {
                NodeKind::Extends { class } => scope.resolve_name(class),
                _ => None,
            })
        } else {
            None
        };

        let index = self
            .extraction
            .push_symbol(Symbol::new(&fqcn, kind, self.path, node.line));
        let mut inner = scope.clone();
        inner.enter_class(fqcn, parent);

        let outer = self.current.replace(index);
        let result = self.walk_children(node, &mut inner, depth);
        self.current = outer;
        result
    }

    fn resolve(&mut self, node: &SyntaxNode, scope: &TypeScope) {
        // References outside a class-like have no source symbol.
        let Some(index) = self.current else {
            return;
        };
        let resolvers = self.resolvers;
        self.extraction
            .record_for(index, |refs| resolvers.process(node, scope, refs));
    }
}
