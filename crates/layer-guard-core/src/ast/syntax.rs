//! Typed syntax tree handed over by parser adapters.
//!
//! Adapters reduce a concrete parse tree to the handful of shapes the
//! reference resolvers and the scope tracker care about. Everything else is
//! either dropped or flattened into [`NodeKind::Block`] containers.
//!
//! [`SourceParser`] is the extension point for adding new languages.

use std::path::{Path, PathBuf};

use super::symbol::SymbolKind;
use super::ExtractionError;

/// Class reference as written in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassRef {
    /// A literal class name, possibly qualified (`Foo`, `Sub\Foo`, `\App\Foo`).
    Named(String),
    /// `self`
    SelfRef,
    /// `static`
    Static,
    /// `parent`
    Parent,
    /// A name computed at runtime (`new $class`, `$object::CONSTANT`).
    Dynamic,
}

impl ClassRef {
    /// Classifies raw source text in class-name position.
    #[must_use]
    pub fn from_source(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() || text.starts_with('$') {
            return Self::Dynamic;
        }
        match text.to_ascii_lowercase().as_str() {
            "self" => Self::SelfRef,
            "static" => Self::Static,
            "parent" => Self::Parent,
            _ => Self::Named(text.to_owned()),
        }
    }
}

/// Receiver of an instance method call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receiver {
    /// `$this->method()`
    This,
    /// `$name->method()`, variable name without `$`.
    Variable(String),
    /// `(new Foo)->method()`
    New(ClassRef),
    /// Any other expression.
    Dynamic,
}

/// Where a type declaration appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintPosition {
    /// Property type.
    Property,
    /// Parameter type.
    Parameter,
    /// Return type.
    Return,
}

/// Closed set of node shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Container without meaning of its own.
    Block,
    /// Namespace scope; its children are the statements inside it.
    Namespace {
        /// Namespace name (`App\Controller`).
        name: String,
    },
    /// `use A\B as C;` import, visible to following siblings.
    Import {
        /// Imported fully-qualified name.
        name: String,
        /// Alias, if given.
        alias: Option<String>,
    },
    /// Class-like declaration; its children are the clauses and body.
    ClassLike {
        /// Short name as declared.
        name: String,
        /// Declaration kind.
        kind: SymbolKind,
    },
    /// Method declaration; its children are signature and body.
    Method {
        /// Method name.
        name: String,
    },
    /// A variable whose class is statically known from here on.
    Bind {
        /// Variable name without `$`.
        variable: String,
        /// Bound class.
        class: ClassRef,
    },
    /// `extends` clause entry.
    Extends {
        /// Parent name as written.
        class: String,
    },
    /// `implements` clause entry.
    Implements {
        /// Interface name as written.
        class: String,
    },
    /// Trait `use` inside a class body.
    UseTrait {
        /// Trait name as written.
        class: String,
    },
    /// `new Foo`
    New {
        /// Instantiated class.
        class: ClassRef,
    },
    /// `Foo::method()`
    StaticCall {
        /// Receiving class.
        class: ClassRef,
        /// Called method.
        method: String,
    },
    /// `$foo->method()`
    InstanceCall {
        /// Receiver expression.
        receiver: Receiver,
        /// Called method.
        method: String,
    },
    /// `Foo::CONSTANT`
    ConstantFetch {
        /// Owning class.
        class: ClassRef,
        /// Constant name.
        constant: String,
    },
    /// A named type in a declaration.
    TypeHint {
        /// Type name as written.
        class: String,
        /// Declaration site.
        position: HintPosition,
    },
    /// One type of a `catch` clause.
    Catch {
        /// Caught class as written.
        class: String,
    },
    /// `$x instanceof Foo`
    InstanceOf {
        /// Tested class.
        class: ClassRef,
    },
    /// `#[Foo]`
    Attribute {
        /// Attribute class as written.
        class: String,
    },
}

/// A node of the typed syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    /// Node shape.
    pub kind: NodeKind,
    /// Line number (1-indexed).
    pub line: usize,
    /// Nested nodes, in source order.
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    /// Creates a leaf node.
    #[must_use]
    pub fn new(kind: NodeKind, line: usize) -> Self {
        Self {
            kind,
            line,
            children: Vec::new(),
        }
    }

    /// Creates a block containing the given children.
    #[must_use]
    pub fn block(line: usize, children: Vec<SyntaxNode>) -> Self {
        Self::new(NodeKind::Block, line).with_children(children)
    }

    /// Replaces the children of this node.
    #[must_use]
    pub fn with_children(mut self, children: Vec<SyntaxNode>) -> Self {
        self.children = children;
        self
    }

    /// Appends one child.
    pub fn push(&mut self, child: SyntaxNode) {
        self.children.push(child);
    }
}

/// One input file, reduced to its typed syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFile {
    /// Path relative to the project root.
    pub path: PathBuf,
    /// Tree root.
    pub root: SyntaxNode,
}

impl ParsedFile {
    /// Creates a parsed file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, root: SyntaxNode) -> Self {
        Self {
            path: path.into(),
            root,
        }
    }
}

/// Trait for language-specific parser adapters.
///
/// Implement this to add support for a new language. The adapter receives
/// raw source text and returns the language-agnostic [`ParsedFile`].
pub trait SourceParser: Send + Sync {
    /// Language identifier (e.g., `"php"`).
    fn language_id(&self) -> &'static str;

    /// File extensions this adapter handles, without the dot (e.g., `&["php"]`).
    fn extensions(&self) -> &'static [&'static str];

    /// Parses one file.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Parse`] if no usable tree could be produced.
    fn parse(&self, path: &Path, source: &str) -> Result<ParsedFile, ExtractionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_ref_recognizes_markers() {
        assert_eq!(ClassRef::from_source("self"), ClassRef::SelfRef);
        assert_eq!(ClassRef::from_source("STATIC"), ClassRef::Static);
        assert_eq!(ClassRef::from_source("parent"), ClassRef::Parent);
        assert_eq!(ClassRef::from_source("$class"), ClassRef::Dynamic);
        assert_eq!(
            ClassRef::from_source("\\App\\Foo"),
            ClassRef::Named("\\App\\Foo".into())
        );
    }
}
