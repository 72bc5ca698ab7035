//! Symbol index and dependency graph.
//!
//! ```text
//! FileExtraction (one per file, single owner)
//!   ↓ merge, in input order
//! AstMapBuilder
//!   ↓ finish()
//! AstMap (read-only)
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::warn;

use super::resolver::ReferenceBuilder;
use super::symbol::{symbol_key, FileReference, Symbol};
use crate::types::Reference;

/// Everything extracted from one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileExtraction {
    path: PathBuf,
    symbols: Vec<Symbol>,
    references: Vec<Reference>,
    /// Index of the declaring symbol, one per reference.
    owners: Vec<usize>,
}

impl FileExtraction {
    /// Creates an empty extraction for the given file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            symbols: Vec::new(),
            references: Vec::new(),
            owners: Vec::new(),
        }
    }

    /// Extracted file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Declared symbols, in source order.
    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Recorded edges, in source order.
    #[must_use]
    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub(crate) fn push_symbol(&mut self, symbol: Symbol) -> usize {
        self.symbols.push(symbol);
        self.symbols.len() - 1
    }

    pub(crate) fn symbol_mut(&mut self, index: usize) -> Option<&mut Symbol> {
        self.symbols.get_mut(index)
    }

    /// Runs `record` with an edge accumulator attributing edges to the
    /// symbol at `index`. Unknown indexes record nothing.
    pub(crate) fn record_for(
        &mut self,
        index: usize,
        record: impl FnOnce(&mut ReferenceBuilder<'_>),
    ) {
        let Some(symbol) = self.symbols.get(index) else {
            return;
        };
        let mut refs = ReferenceBuilder::new(symbol.name(), &self.path, &mut self.references);
        record(&mut refs);
        self.owners.resize(self.references.len(), index);
    }
}

/// Accumulates file extractions into an [`AstMap`].
#[derive(Debug, Default)]
pub struct AstMapBuilder {
    symbols: BTreeMap<String, Symbol>,
    references: BTreeMap<String, Vec<Reference>>,
    files: BTreeMap<PathBuf, FileReference>,
}

impl AstMapBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one file's extraction.
    ///
    /// A symbol declared again replaces the earlier declaration together with
    /// the edges recorded for it.
    pub fn merge(&mut self, extraction: FileExtraction) {
        let FileExtraction {
            path,
            symbols,
            references,
            owners,
        } = extraction;

        let mut declared = Vec::with_capacity(symbols.len());
        let mut in_file: BTreeMap<String, usize> = BTreeMap::new();
        let mut superseded = BTreeSet::new();
        for (index, symbol) in symbols.into_iter().enumerate() {
            let key = symbol.key();
            let name = symbol.name().to_owned();
            if let Some(previous) = self.symbols.insert(key.clone(), symbol) {
                warn!(
                    symbol = %name,
                    previous = %previous.file().display(),
                    file = %path.display(),
                    "symbol re-declared, keeping the later declaration"
                );
                if let Some(earlier) = in_file.insert(key.clone(), index) {
                    superseded.insert(earlier);
                    continue;
                }
                self.references.remove(&key);
                if let Some(file) = self.files.get_mut(previous.file()) {
                    file.forget(&key);
                }
            } else {
                in_file.insert(key, index);
            }
            declared.push(name);
        }

        for (reference, owner) in references.into_iter().zip(owners) {
            if superseded.contains(&owner) {
                continue;
            }
            self.references
                .entry(symbol_key(&reference.source))
                .or_default()
                .push(reference);
        }
        self.files
            .insert(path.clone(), FileReference::new(path, declared));
    }

    /// Finalizes the map. The builder is consumed, so no edge can be added
    /// afterwards.
    #[must_use]
    pub fn finish(self) -> AstMap {
        AstMap {
            symbols: self.symbols,
            references: self.references,
            files: self.files,
        }
    }
}

/// Read-only symbol index and dependency graph.
#[derive(Debug, Default, Clone)]
pub struct AstMap {
    symbols: BTreeMap<String, Symbol>,
    references: BTreeMap<String, Vec<Reference>>,
    files: BTreeMap<PathBuf, FileReference>,
}

impl AstMap {
    /// Looks up a symbol by name, ignoring case and a leading `\`.
    #[must_use]
    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(&symbol_key(name))
    }

    /// Returns true if the symbol was declared in an analyzed file.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(&symbol_key(name))
    }

    /// All symbols, in case-insensitive name order.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    /// Edges recorded for a symbol, in extraction order.
    #[must_use]
    pub fn dependencies(&self, name: &str) -> &[Reference] {
        self.references
            .get(&symbol_key(name))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All edges, grouped by source symbol.
    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        self.references.values().flatten()
    }

    /// Looks up a file by path.
    #[must_use]
    pub fn file(&self, path: &Path) -> Option<&FileReference> {
        self.files.get(path)
    }

    /// All files, in path order.
    pub fn files(&self) -> impl Iterator<Item = &FileReference> {
        self.files.values()
    }

    /// Number of symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns true if no symbol was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Total number of edges.
    #[must_use]
    pub fn reference_count(&self) -> usize {
        self.references.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SymbolKind;
    use crate::types::ReferenceKind;

    fn extraction(path: &str, class: &str, target: &str) -> FileExtraction {
        let mut extraction = FileExtraction::new(path);
        let index = extraction.push_symbol(Symbol::new(class, SymbolKind::Class, path, 3));
        extraction.record_for(index, |refs| {
            refs.record(ReferenceKind::Instantiates, Some(target.to_owned()), 5);
        });
        extraction
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut builder = AstMapBuilder::new();
        builder.merge(extraction("src/Foo.php", "App\\Foo", "App\\Bar"));
        let map = builder.finish();

        assert!(map.contains("\\app\\FOO"));
        assert_eq!(map.dependencies("app\\foo").len(), 1);
        assert!(map.dependencies("App\\Unknown").is_empty());
        assert_eq!(
            map.file(Path::new("src/Foo.php")).map(FileReference::symbols),
            Some(&["App\\Foo".to_owned()][..])
        );
    }

    #[test]
    fn symbols_enumerate_in_name_order() {
        let mut builder = AstMapBuilder::new();
        builder.merge(extraction("src/b.php", "app\\Zed", "X"));
        builder.merge(extraction("src/a.php", "App\\alpha", "X"));
        let map = builder.finish();

        let names: Vec<_> = map.symbols().map(Symbol::name).collect();
        assert_eq!(names, ["App\\alpha", "app\\Zed"]);
        assert_eq!(map.reference_count(), 2);
    }

    #[test]
    fn later_declaration_wins() {
        let mut builder = AstMapBuilder::new();
        builder.merge(extraction("src/one.php", "App\\Foo", "App\\First"));
        builder.merge(extraction("src/two.php", "App\\Foo", "App\\Second"));
        let map = builder.finish();

        let symbol = map.symbol("App\\Foo").map(Symbol::file);
        assert_eq!(symbol, Some(Path::new("src/two.php")));
        let targets: Vec<_> = map
            .dependencies("App\\Foo")
            .iter()
            .map(|r| r.target.as_str())
            .collect();
        assert_eq!(targets, ["App\\Second"]);
        assert!(map
            .file(Path::new("src/one.php"))
            .is_some_and(|f| f.symbols().is_empty()));
    }

    #[test]
    fn later_declaration_in_the_same_file_drops_the_earlier_edges() {
        let path = "src/Foo.php";
        let mut extraction = FileExtraction::new(path);
        for (line, target) in [(3, "App\\First"), (10, "App\\Second")] {
            let index =
                extraction.push_symbol(Symbol::new("App\\Foo", SymbolKind::Class, path, line));
            extraction.record_for(index, |refs| {
                refs.record(ReferenceKind::Instantiates, Some(target.to_owned()), line + 2);
            });
        }
        let mut builder = AstMapBuilder::new();
        builder.merge(extraction);
        let map = builder.finish();

        assert_eq!(map.symbol("App\\Foo").map(Symbol::line), Some(10));
        let targets: Vec<_> = map
            .dependencies("App\\Foo")
            .iter()
            .map(|r| r.target.as_str())
            .collect();
        assert_eq!(targets, ["App\\Second"]);
        assert_eq!(
            map.file(Path::new(path)).map(FileReference::symbols),
            Some(&["App\\Foo".to_owned()][..])
        );
    }
}
