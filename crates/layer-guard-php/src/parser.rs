//! PHP parser adapter using Tree-sitter.

use std::path::Path;

use layer_guard_core::ast::{ExtractionError, ParsedFile, SourceParser, SyntaxNode};
use tracing::debug;
use tree_sitter::{Language, Node, Parser};

use crate::convert::Converter;

/// Parses PHP source into the core syntax tree.
#[derive(Clone)]
pub struct PhpParser {
    language: Language,
}

impl PhpParser {
    /// Creates a new PHP parser.
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: tree_sitter_php::LANGUAGE_PHP.into(),
        }
    }
}

impl Default for PhpParser {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PhpParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhpParser").finish_non_exhaustive()
    }
}

impl SourceParser for PhpParser {
    fn language_id(&self) -> &'static str {
        "php"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["php"]
    }

    fn parse(&self, path: &Path, source: &str) -> Result<ParsedFile, ExtractionError> {
        let parse_error = |message: String| ExtractionError::Parse {
            path: path.to_path_buf(),
            message,
        };

        // Parser is not Sync; one per call keeps the adapter shareable.
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| parse_error(format!("failed to load the PHP grammar: {e}")))?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| parse_error("parser produced no tree".to_owned()))?;

        let root = tree.root_node();
        if root.has_error() {
            let line = first_error(root).map_or(1, |n| n.start_position().row + 1);
            return Err(parse_error(format!("syntax error at line {line}")));
        }

        let children = Converter::new(path, source.as_bytes()).program(root)?;
        debug!(path = %path.display(), nodes = children.len(), "parsed PHP file");
        Ok(ParsedFile::new(path, SyntaxNode::block(1, children)))
    }
}

/// First error or missing node in document order.
fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let mut children: Vec<Node<'_>> = node.children(&mut cursor).collect();
            children.reverse();
            stack.extend(children);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer_guard_core::ast::NodeKind;

    fn parse(src: &str) -> Result<ParsedFile, ExtractionError> {
        PhpParser::new().parse(Path::new("src/Test.php"), src)
    }

    #[test]
    fn adapter_identity() {
        let parser = PhpParser::new();
        assert_eq!(parser.language_id(), "php");
        assert_eq!(parser.extensions(), ["php"]);
    }

    #[test]
    fn empty_source() {
        let file = parse("<?php\n").unwrap();
        assert!(file.root.children.is_empty());
        assert_eq!(file.path, Path::new("src/Test.php"));
    }

    #[test]
    fn syntax_error_is_a_parse_error() {
        let error = parse("<?php\nclass Foo {\n    public function (\n").unwrap_err();
        match error {
            ExtractionError::Parse { path, message } => {
                assert_eq!(path, Path::new("src/Test.php"));
                assert!(message.starts_with("syntax error at line"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn braced_namespace_holds_its_class() {
        let file = parse("<?php\nnamespace App\\Model {\n    class User {}\n}\n").unwrap();
        let [namespace] = file.root.children.as_slice() else {
            panic!("expected one namespace, got {:#?}", file.root.children);
        };
        assert_eq!(
            namespace.kind,
            NodeKind::Namespace {
                name: "App\\Model".into()
            }
        );
        assert!(matches!(
            &namespace.children[..],
            [node] if matches!(&node.kind, NodeKind::ClassLike { name, .. } if name == "User")
        ));
    }

    #[test]
    fn statement_namespace_scopes_following_siblings() {
        let file = parse(
            "<?php\nnamespace A;\nclass One {}\nnamespace B;\nclass Two {}\n",
        )
        .unwrap();
        let names: Vec<_> = file
            .root
            .children
            .iter()
            .map(|ns| match &ns.kind {
                NodeKind::Namespace { name } => (name.as_str(), ns.children.len()),
                other => panic!("unexpected node {other:?}"),
            })
            .collect();
        assert_eq!(names, [("A", 1), ("B", 1)]);
        assert_eq!(file.root.children[1].line, 4);
    }
}
