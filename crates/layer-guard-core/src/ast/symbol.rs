//! Class-like symbols and the files declaring them.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Kind of class-like declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    /// `class Foo`
    Class,
    /// `interface Foo`
    Interface,
    /// `trait Foo`
    Trait,
    /// `enum Foo`
    Enum,
}

impl SymbolKind {
    /// Returns the lowercase keyword for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Trait => "trait",
            Self::Enum => "enum",
        }
    }

    /// Parses a kind keyword, ignoring case.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "class" => Some(Self::Class),
            "interface" => Some(Self::Interface),
            "trait" => Some(Self::Trait),
            "enum" => Some(Self::Enum),
            _ => None,
        }
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalizes a symbol name into its lookup key.
///
/// Symbol names compare case-insensitively and without a leading `\`.
#[must_use]
pub fn symbol_key(name: &str) -> String {
    name.trim_start_matches('\\').to_lowercase()
}

/// A class-like declaration discovered during extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    name: String,
    kind: SymbolKind,
    file: PathBuf,
    line: usize,
    methods: Vec<String>,
}

impl Symbol {
    /// Creates a new symbol without methods.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: SymbolKind,
        file: impl Into<PathBuf>,
        line: usize,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            file: file.into(),
            line,
            methods: Vec::new(),
        }
    }

    /// Adds a declared method name.
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.methods.push(method.into());
        self
    }

    pub(crate) fn push_method(&mut self, method: &str) {
        self.methods.push(method.to_owned());
    }

    /// Fully-qualified name, as declared.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case-insensitive lookup key.
    #[must_use]
    pub fn key(&self) -> String {
        symbol_key(&self.name)
    }

    /// Declaration kind.
    #[must_use]
    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    /// Declaring file path.
    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Declaration line (1-indexed).
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Names of the methods declared in the symbol body.
    #[must_use]
    pub fn methods(&self) -> &[String] {
        &self.methods
    }
}

/// A source file and the symbols declared in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReference {
    path: PathBuf,
    symbols: Vec<String>,
}

impl FileReference {
    /// Creates a new file reference.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, symbols: Vec<String>) -> Self {
        Self {
            path: path.into(),
            symbols,
        }
    }

    /// File path as handed over by the parser adapter.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of the symbols declared in this file, in declaration order.
    #[must_use]
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub(crate) fn forget(&mut self, key: &str) {
        self.symbols.retain(|name| symbol_key(name) != key);
    }
}
