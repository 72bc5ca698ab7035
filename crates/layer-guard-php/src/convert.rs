//! tree-sitter-php nodes → core syntax nodes.
//!
//! Only nodes that carry a dependency or a scope become [`SyntaxNode`]s.
//! Everything else is flattened: its converted children are spliced into the
//! parent, so the resulting tree stays shallow.

use std::path::Path;

use layer_guard_core::ast::{
    ClassRef, ExtractionError, HintPosition, NodeKind, Receiver, SymbolKind, SyntaxNode,
};
use tree_sitter::Node;

/// Deepest tree-sitter nesting the converter follows.
pub(crate) const MAX_NESTING: usize = 1024;

/// Node kinds naming a class in class-reference position.
const CLASS_NAME_KINDS: &[&str] = &["name", "qualified_name", "relative_scope"];

pub(crate) struct Converter<'s> {
    path: &'s Path,
    src: &'s [u8],
}

impl<'s> Converter<'s> {
    pub(crate) fn new(path: &'s Path, src: &'s [u8]) -> Self {
        Self { path, src }
    }

    /// Converts the children of `program`.
    pub(crate) fn program(&self, root: Node<'_>) -> Result<Vec<SyntaxNode>, ExtractionError> {
        self.children(root, 0)
    }

    fn text(&self, node: Node<'_>) -> &'s str {
        node.utf8_text(self.src).map(str::trim).unwrap_or_default()
    }

    fn children(&self, node: Node<'_>, depth: usize) -> Result<Vec<SyntaxNode>, ExtractionError> {
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        self.siblings(children, depth + 1)
    }

    /// Converts a statement list. A statement-form `namespace Foo;` scopes
    /// every following sibling up to the next namespace definition.
    fn siblings(
        &self,
        nodes: Vec<Node<'_>>,
        depth: usize,
    ) -> Result<Vec<SyntaxNode>, ExtractionError> {
        let mut out = Vec::new();
        let mut open: Option<SyntaxNode> = None;
        for node in nodes {
            if node.kind() == "namespace_definition" {
                out.extend(open.take());
                let name = node
                    .child_by_field_name("name")
                    .map(|n| self.text(n).to_owned())
                    .unwrap_or_default();
                let namespace = SyntaxNode::new(NodeKind::Namespace { name }, line(node));
                match node.child_by_field_name("body") {
                    Some(body) => out.push(namespace.with_children(self.children(body, depth)?)),
                    None => open = Some(namespace),
                }
                continue;
            }

            let converted = self.convert(node, depth)?;
            match open.as_mut() {
                Some(namespace) => namespace.children.extend(converted),
                None => out.extend(converted),
            }
        }
        out.extend(open);
        Ok(out)
    }

    fn convert(&self, node: Node<'_>, depth: usize) -> Result<Vec<SyntaxNode>, ExtractionError> {
        if depth > MAX_NESTING {
            return Err(ExtractionError::Malformed {
                path: self.path.to_path_buf(),
                line: line(node),
                message: format!("source nested deeper than {MAX_NESTING} levels"),
            });
        }

        match node.kind() {
            "namespace_use_declaration" => Ok(self.imports(node)),
            "class_declaration" => self.class_like(node, SymbolKind::Class, depth),
            "interface_declaration" => self.class_like(node, SymbolKind::Interface, depth),
            "trait_declaration" => self.class_like(node, SymbolKind::Trait, depth),
            "enum_declaration" => self.class_like(node, SymbolKind::Enum, depth),
            "base_clause" => Ok(self.class_list(node, |class| NodeKind::Extends { class })),
            "class_interface_clause" => {
                Ok(self.class_list(node, |class| NodeKind::Implements { class }))
            }
            "use_declaration" => Ok(self.class_list(node, |class| NodeKind::UseTrait { class })),
            "method_declaration" => self.method(node, depth),
            "simple_parameter" | "property_promotion_parameter" | "variadic_parameter" => {
                self.parameter(node, depth)
            }
            "property_declaration" => self.typed(node, HintPosition::Property, depth),
            "object_creation_expression" => self.creation(node, depth),
            "scoped_call_expression" => {
                let class = self.class_ref(node.child_by_field_name("scope"));
                let method = self.field_text(node, "name");
                self.wrap(node, NodeKind::StaticCall { class, method }, depth)
            }
            "member_call_expression" | "nullsafe_member_call_expression" => {
                let receiver = self.receiver(node.child_by_field_name("object"));
                let method = self.field_text(node, "name");
                self.wrap(node, NodeKind::InstanceCall { receiver, method }, depth)
            }
            "class_constant_access_expression" => {
                let mut cursor = node.walk();
                let parts: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
                let class = self.class_ref(parts.first().copied());
                let constant = parts
                    .last()
                    .map(|n| self.text(*n).to_owned())
                    .unwrap_or_default();
                self.wrap(node, NodeKind::ConstantFetch { class, constant }, depth)
            }
            "catch_clause" => self.catch(node, depth),
            "binary_expression" if self.is_instanceof(node) => {
                let class = self.class_ref(node.child_by_field_name("right"));
                self.wrap(node, NodeKind::InstanceOf { class }, depth)
            }
            "attribute" => {
                let mut cursor = node.walk();
                let name = node
                    .named_children(&mut cursor)
                    .find(|n| matches!(n.kind(), "name" | "qualified_name"));
                match name {
                    Some(name) => {
                        let class = self.text(name).to_owned();
                        self.wrap(node, NodeKind::Attribute { class }, depth)
                    }
                    None => self.children(node, depth),
                }
            }
            "assignment_expression" => self.assignment(node, depth),
            _ => self.children(node, depth),
        }
    }

    /// A node of `kind` whose children are the converted children of `node`.
    fn wrap(
        &self,
        node: Node<'_>,
        kind: NodeKind,
        depth: usize,
    ) -> Result<Vec<SyntaxNode>, ExtractionError> {
        let children = self.children(node, depth)?;
        Ok(vec![SyntaxNode::new(kind, line(node)).with_children(children)])
    }

    fn field_text(&self, node: Node<'_>, field: &str) -> String {
        node.child_by_field_name(field)
            .map(|n| self.text(n).to_owned())
            .unwrap_or_default()
    }

    fn class_ref(&self, node: Option<Node<'_>>) -> ClassRef {
        match node {
            Some(node) if CLASS_NAME_KINDS.contains(&node.kind()) => {
                ClassRef::from_source(self.text(node))
            }
            _ => ClassRef::Dynamic,
        }
    }

    fn receiver(&self, node: Option<Node<'_>>) -> Receiver {
        let Some(node) = node else {
            return Receiver::Dynamic;
        };
        match node.kind() {
            "variable_name" => match self.text(node).trim_start_matches('$') {
                "this" => Receiver::This,
                name => Receiver::Variable(name.to_owned()),
            },
            "object_creation_expression" => Receiver::New(self.created_class(node)),
            "parenthesized_expression" => {
                let mut cursor = node.walk();
                let inner = node.named_children(&mut cursor).next();
                self.receiver(inner)
            }
            _ => Receiver::Dynamic,
        }
    }

    fn is_instanceof(&self, node: Node<'_>) -> bool {
        node.child_by_field_name("operator")
            .is_some_and(|op| self.text(op).eq_ignore_ascii_case("instanceof"))
    }

    // ────────────────────────────────────────────
    // Declarations
    // ────────────────────────────────────────────

    fn imports(&self, node: Node<'_>) -> Vec<SyntaxNode> {
        if has_keyword_child(node, &["function", "const"]) {
            return Vec::new();
        }

        let mut prefix = None;
        let mut clauses = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "namespace_name" | "qualified_name" | "name" => prefix = Some(self.text(child)),
                "namespace_use_clause" => clauses.push(child),
                "namespace_use_group" => {
                    let mut inner = child.walk();
                    clauses.extend(child.named_children(&mut inner).filter(|c| {
                        matches!(c.kind(), "namespace_use_clause" | "namespace_use_group_clause")
                    }));
                }
                _ => {}
            }
        }

        clauses
            .into_iter()
            .filter(|clause| !has_keyword_child(*clause, &["function", "const"]))
            .filter_map(|clause| {
                let (name, alias) = self.use_clause(clause)?;
                let name = match prefix {
                    Some(prefix) => format!("{}\\{name}", prefix.trim_end_matches('\\')),
                    None => name.to_owned(),
                };
                Some(SyntaxNode::new(
                    NodeKind::Import {
                        name,
                        alias: alias.map(str::to_owned),
                    },
                    line(clause),
                ))
            })
            .collect()
    }

    fn use_clause(&self, clause: Node<'_>) -> Option<(&'s str, Option<&'s str>)> {
        let alias_node = clause.child_by_field_name("alias");
        let mut alias = alias_node.map(|n| self.text(n));
        let mut name = None;

        let mut cursor = clause.walk();
        for child in clause.named_children(&mut cursor) {
            match child.kind() {
                "namespace_aliasing_clause" => {
                    let mut inner = child.walk();
                    alias = child
                        .named_children(&mut inner)
                        .find(|n| n.kind() == "name")
                        .map(|n| self.text(n));
                }
                "name" | "qualified_name" | "namespace_name"
                    if name.is_none() && Some(child) != alias_node =>
                {
                    name = Some(self.text(child));
                }
                _ => {}
            }
        }
        name.map(|name| (name, alias))
    }

    fn class_like(
        &self,
        node: Node<'_>,
        kind: SymbolKind,
        depth: usize,
    ) -> Result<Vec<SyntaxNode>, ExtractionError> {
        let Some(name) = node.child_by_field_name("name") else {
            return self.children(node, depth);
        };
        let name = self.text(name).to_owned();
        self.wrap(node, NodeKind::ClassLike { name, kind }, depth)
    }

    /// `extends A, B` / `implements A, B` / `use A, B;`, one node per class.
    fn class_list(&self, node: Node<'_>, kind: impl Fn(String) -> NodeKind) -> Vec<SyntaxNode> {
        let mut cursor = node.walk();
        let nodes: Vec<SyntaxNode> = node
            .named_children(&mut cursor)
            .filter(|n| matches!(n.kind(), "name" | "qualified_name"))
            .map(|n| SyntaxNode::new(kind(self.text(n).to_owned()), line(n)))
            .collect();
        nodes
    }

    fn method(&self, node: Node<'_>, depth: usize) -> Result<Vec<SyntaxNode>, ExtractionError> {
        let name = self.field_text(node, "name");
        let return_type = node.child_by_field_name("return_type");

        let mut children = Vec::new();
        let mut cursor = node.walk();
        let parts: Vec<Node<'_>> = node.children(&mut cursor).collect();
        for part in parts {
            if Some(part) == return_type {
                children.extend(self.hints(part, HintPosition::Return));
            } else {
                children.extend(self.convert(part, depth + 1)?);
            }
        }
        Ok(vec![
            SyntaxNode::new(NodeKind::Method { name }, line(node)).with_children(children)
        ])
    }

    /// Parameter type hints, then a binding of the variable when the type is a
    /// single class. Variadic parameters hold arrays and are never bound.
    fn parameter(&self, node: Node<'_>, depth: usize) -> Result<Vec<SyntaxNode>, ExtractionError> {
        let mut out = self.typed(node, HintPosition::Parameter, depth)?;
        if node.kind() == "variadic_parameter" {
            return Ok(out);
        }
        let variable = self
            .field_text(node, "name")
            .trim_start_matches('$')
            .to_owned();
        if let Some(class) = node
            .child_by_field_name("type")
            .and_then(|ty| self.single_class(ty))
        {
            out.push(SyntaxNode::new(
                NodeKind::Bind {
                    variable,
                    class: ClassRef::Named(class),
                },
                line(node),
            ));
        }
        Ok(out)
    }

    /// Type hints of the `type` field, then the other children converted.
    fn typed(
        &self,
        node: Node<'_>,
        position: HintPosition,
        depth: usize,
    ) -> Result<Vec<SyntaxNode>, ExtractionError> {
        let ty = node.child_by_field_name("type");
        let mut out = ty.map(|ty| self.hints(ty, position)).unwrap_or_default();
        let mut cursor = node.walk();
        let parts: Vec<Node<'_>> = node.children(&mut cursor).collect();
        for part in parts {
            if Some(part) != ty {
                out.extend(self.convert(part, depth + 1)?);
            }
        }
        Ok(out)
    }

    fn hints(&self, ty: Node<'_>, position: HintPosition) -> Vec<SyntaxNode> {
        named_types(ty)
            .into_iter()
            .map(|n| {
                SyntaxNode::new(
                    NodeKind::TypeHint {
                        class: self.text(n).to_owned(),
                        position,
                    },
                    line(n),
                )
            })
            .collect()
    }

    /// The class of a type that names exactly one class, nullable or not.
    fn single_class(&self, ty: Node<'_>) -> Option<String> {
        match ty.kind() {
            "named_type" | "name" | "qualified_name" => Some(self.text(ty).to_owned()),
            "optional_type" => {
                let mut cursor = ty.walk();
                let inner = ty.named_children(&mut cursor).next();
                inner.and_then(|inner| self.single_class(inner))
            }
            _ => None,
        }
    }

    // ────────────────────────────────────────────
    // Expressions
    // ────────────────────────────────────────────

    fn creation(&self, node: Node<'_>, depth: usize) -> Result<Vec<SyntaxNode>, ExtractionError> {
        if is_anonymous_class(node) {
            // Dependencies of the anonymous class belong to the enclosing one,
            // which neither inherits its parents nor declares its methods.
            let mut converted = self.children(node, depth)?;
            converted.iter_mut().for_each(demote_members);
            return Ok(converted);
        }
        let class = self.created_class(node);
        self.wrap(node, NodeKind::New { class }, depth)
    }

    fn created_class(&self, node: Node<'_>) -> ClassRef {
        let mut cursor = node.walk();
        let designator = node
            .named_children(&mut cursor)
            .find(|n| !matches!(n.kind(), "arguments" | "attribute_list" | "comment"));
        self.class_ref(designator)
    }

    fn catch(&self, node: Node<'_>, depth: usize) -> Result<Vec<SyntaxNode>, ExtractionError> {
        let ty = node.child_by_field_name("type");
        let classes: Vec<String> = ty
            .map(|ty| named_types(ty).into_iter().map(|n| self.text(n).to_owned()).collect())
            .unwrap_or_default();

        let mut out: Vec<SyntaxNode> = classes
            .iter()
            .map(|class| SyntaxNode::new(NodeKind::Catch { class: class.clone() }, line(node)))
            .collect();
        if let (Some(variable), [class]) = (node.child_by_field_name("name"), classes.as_slice()) {
            out.push(SyntaxNode::new(
                NodeKind::Bind {
                    variable: self.text(variable).trim_start_matches('$').to_owned(),
                    class: ClassRef::Named(class.clone()),
                },
                line(node),
            ));
        }

        let mut cursor = node.walk();
        let parts: Vec<Node<'_>> = node.children(&mut cursor).collect();
        for part in parts {
            if Some(part) != ty {
                out.extend(self.convert(part, depth + 1)?);
            }
        }
        Ok(out)
    }

    /// `$x = new Foo()` binds `$x`; any other assignment to `$x` forgets it.
    fn assignment(&self, node: Node<'_>, depth: usize) -> Result<Vec<SyntaxNode>, ExtractionError> {
        let left = node.child_by_field_name("left");
        let Some(left) = left.filter(|l| l.kind() == "variable_name") else {
            return self.children(node, depth);
        };
        let variable = self.text(left).trim_start_matches('$').to_owned();
        let class = match node.child_by_field_name("right") {
            Some(right)
                if right.kind() == "object_creation_expression" && !is_anonymous_class(right) =>
            {
                self.created_class(right)
            }
            _ => ClassRef::Dynamic,
        };
        self.wrap(node, NodeKind::Bind { variable, class }, depth)
    }
}

fn line(node: Node<'_>) -> usize {
    node.start_position().row + 1
}

fn has_keyword_child(node: Node<'_>, keywords: &[&str]) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|c| !c.is_named() && keywords.iter().any(|k| c.kind().eq_ignore_ascii_case(k)));
    found
}

fn is_anonymous_class(node: Node<'_>) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|c| c.kind().starts_with("anonymous_class") || c.kind() == "declaration_list");
    found
}

/// Class names inside a type, skipping primitive types.
fn named_types(ty: Node<'_>) -> Vec<Node<'_>> {
    match ty.kind() {
        "named_type" | "name" | "qualified_name" => vec![ty],
        "primitive_type" | "bottom_type" => Vec::new(),
        _ => {
            let mut cursor = ty.walk();
            let children: Vec<Node<'_>> = ty.named_children(&mut cursor).collect();
            children.into_iter().flat_map(named_types).collect()
        }
    }
}

/// Turns method nodes into plain blocks so their names are not attributed
/// to the enclosing class.
fn demote_members(node: &mut SyntaxNode) {
    let demoted = match &mut node.kind {
        NodeKind::Method { .. } => Some(NodeKind::Block),
        NodeKind::Extends { class }
        | NodeKind::Implements { class }
        | NodeKind::UseTrait { class } => Some(NodeKind::New {
            class: ClassRef::Named(std::mem::take(class)),
        }),
        _ => None,
    };
    if let Some(kind) = demoted {
        node.kind = kind;
    }
    node.children.iter_mut().for_each(demote_members);
}
