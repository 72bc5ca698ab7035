//! Reference resolvers, one per syntactic reference shape.
//!
//! Each resolver recognizes exactly one [`NodeKind`] variant, canonicalizes
//! the referenced name through the [`TypeScope`] and records at most one edge.
//! Every other shape is a no-op.

use std::path::Path;

use tracing::trace;

use super::scope::TypeScope;
use super::syntax::{HintPosition, NodeKind, SyntaxNode};
use crate::types::{Reference, ReferenceKind};

/// Edge accumulator for the symbol currently being walked.
#[derive(Debug)]
pub struct ReferenceBuilder<'a> {
    source: &'a str,
    file: &'a Path,
    references: &'a mut Vec<Reference>,
}

impl<'a> ReferenceBuilder<'a> {
    /// Creates an accumulator attributing edges to `source`.
    pub fn new(source: &'a str, file: &'a Path, references: &'a mut Vec<Reference>) -> Self {
        Self {
            source,
            file,
            references,
        }
    }

    /// Name of the depending symbol.
    #[must_use]
    pub fn source(&self) -> &str {
        self.source
    }

    /// Records an edge to `target`, or skips it when the name did not resolve.
    pub fn record(&mut self, kind: ReferenceKind, target: Option<String>, line: usize) {
        let Some(target) = target else {
            trace!(
                source = self.source,
                kind = %kind,
                line,
                "skipping unresolvable reference"
            );
            return;
        };
        self.references
            .push(Reference::new(self.source, target, kind, self.file, line));
    }
}

/// Handler for one syntactic reference shape.
///
/// Implement this to teach the extractor a new reference kind.
pub trait DependencyResolver: Send + Sync {
    /// Short name for diagnostics.
    fn name(&self) -> &'static str;

    /// Inspects one node and records zero or one edge.
    fn process_node(
        &self,
        node: &SyntaxNode,
        scope: &TypeScope,
        refs: &mut ReferenceBuilder<'_>,
    );
}

/// A boxed resolver for dynamic dispatch.
pub type ResolverBox = Box<dyn DependencyResolver>;

/// `class A extends B`
#[derive(Debug, Clone, Copy, Default)]
pub struct InheritanceResolver;

impl DependencyResolver for InheritanceResolver {
    fn name(&self) -> &'static str {
        "inheritance"
    }

    fn process_node(&self, node: &SyntaxNode, scope: &TypeScope, refs: &mut ReferenceBuilder<'_>) {
        if let NodeKind::Extends { class } = &node.kind {
            refs.record(ReferenceKind::Extends, scope.resolve_name(class), node.line);
        }
    }
}

/// `class A implements B`
#[derive(Debug, Clone, Copy, Default)]
pub struct InterfaceResolver;

impl DependencyResolver for InterfaceResolver {
    fn name(&self) -> &'static str {
        "interface"
    }

    fn process_node(&self, node: &SyntaxNode, scope: &TypeScope, refs: &mut ReferenceBuilder<'_>) {
        if let NodeKind::Implements { class } = &node.kind {
            refs.record(ReferenceKind::Implements, scope.resolve_name(class), node.line);
        }
    }
}

/// `use SomeTrait;` in a class body.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraitUseResolver;

impl DependencyResolver for TraitUseResolver {
    fn name(&self) -> &'static str {
        "trait-use"
    }

    fn process_node(&self, node: &SyntaxNode, scope: &TypeScope, refs: &mut ReferenceBuilder<'_>) {
        if let NodeKind::UseTrait { class } = &node.kind {
            refs.record(ReferenceKind::UsesTrait, scope.resolve_name(class), node.line);
        }
    }
}

/// `new B()`
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantiationResolver;

impl DependencyResolver for InstantiationResolver {
    fn name(&self) -> &'static str {
        "instantiation"
    }

    fn process_node(&self, node: &SyntaxNode, scope: &TypeScope, refs: &mut ReferenceBuilder<'_>) {
        if let NodeKind::New { class } = &node.kind {
            refs.record(ReferenceKind::Instantiates, scope.resolve_class(class), node.line);
        }
    }
}

/// `B::method()`
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCallResolver;

impl DependencyResolver for StaticCallResolver {
    fn name(&self) -> &'static str {
        "static-call"
    }

    fn process_node(&self, node: &SyntaxNode, scope: &TypeScope, refs: &mut ReferenceBuilder<'_>) {
        if let NodeKind::StaticCall { class, .. } = &node.kind {
            refs.record(ReferenceKind::StaticCall, scope.resolve_class(class), node.line);
        }
    }
}

/// `$b->method()` where the class of `$b` is statically known.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstanceCallResolver;

impl DependencyResolver for InstanceCallResolver {
    fn name(&self) -> &'static str {
        "instance-call"
    }

    fn process_node(&self, node: &SyntaxNode, scope: &TypeScope, refs: &mut ReferenceBuilder<'_>) {
        if let NodeKind::InstanceCall { receiver, .. } = &node.kind {
            refs.record(
                ReferenceKind::InstanceCall,
                scope.resolve_receiver(receiver),
                node.line,
            );
        }
    }
}

/// `B::CONSTANT`, including `B::class`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassConstantResolver;

impl DependencyResolver for ClassConstantResolver {
    fn name(&self) -> &'static str {
        "class-constant"
    }

    fn process_node(&self, node: &SyntaxNode, scope: &TypeScope, refs: &mut ReferenceBuilder<'_>) {
        if let NodeKind::ConstantFetch { class, .. } = &node.kind {
            refs.record(ReferenceKind::ConstantFetch, scope.resolve_class(class), node.line);
        }
    }
}

/// Property, parameter and return types.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeHintResolver;

impl DependencyResolver for TypeHintResolver {
    fn name(&self) -> &'static str {
        "type-hint"
    }

    fn process_node(&self, node: &SyntaxNode, scope: &TypeScope, refs: &mut ReferenceBuilder<'_>) {
        if let NodeKind::TypeHint { class, position } = &node.kind {
            let kind = match position {
                HintPosition::Property => ReferenceKind::TypeHint,
                HintPosition::Parameter => ReferenceKind::ParamType,
                HintPosition::Return => ReferenceKind::ReturnType,
            };
            // Builtins are not references at all, so they are not traced.
            if let Some(target) = scope.resolve_type(class) {
                refs.record(kind, Some(target), node.line);
            }
        }
    }
}

/// `catch (B $e)`
#[derive(Debug, Clone, Copy, Default)]
pub struct CatchResolver;

impl DependencyResolver for CatchResolver {
    fn name(&self) -> &'static str {
        "catch"
    }

    fn process_node(&self, node: &SyntaxNode, scope: &TypeScope, refs: &mut ReferenceBuilder<'_>) {
        if let NodeKind::Catch { class } = &node.kind {
            refs.record(ReferenceKind::Catch, scope.resolve_name(class), node.line);
        }
    }
}

/// `$x instanceof B`
#[derive(Debug, Clone, Copy, Default)]
pub struct InstanceOfResolver;

impl DependencyResolver for InstanceOfResolver {
    fn name(&self) -> &'static str {
        "instanceof"
    }

    fn process_node(&self, node: &SyntaxNode, scope: &TypeScope, refs: &mut ReferenceBuilder<'_>) {
        if let NodeKind::InstanceOf { class } = &node.kind {
            refs.record(ReferenceKind::Instanceof, scope.resolve_class(class), node.line);
        }
    }
}

/// `#[B]`
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeResolver;

impl DependencyResolver for AttributeResolver {
    fn name(&self) -> &'static str {
        "attribute"
    }

    fn process_node(&self, node: &SyntaxNode, scope: &TypeScope, refs: &mut ReferenceBuilder<'_>) {
        if let NodeKind::Attribute { class } = &node.kind {
            refs.record(ReferenceKind::Attribute, scope.resolve_name(class), node.line);
        }
    }
}

/// Ordered set of resolvers applied to every node.
pub struct ResolverRegistry {
    resolvers: Vec<ResolverBox>,
}

impl Default for ResolverRegistry {
    fn default() -> Self {
        Self::empty()
            .with_resolver(InheritanceResolver)
            .with_resolver(InterfaceResolver)
            .with_resolver(TraitUseResolver)
            .with_resolver(InstantiationResolver)
            .with_resolver(StaticCallResolver)
            .with_resolver(InstanceCallResolver)
            .with_resolver(ClassConstantResolver)
            .with_resolver(TypeHintResolver)
            .with_resolver(CatchResolver)
            .with_resolver(InstanceOfResolver)
            .with_resolver(AttributeResolver)
    }
}

impl std::fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl ResolverRegistry {
    /// Creates a registry without any resolver.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            resolvers: Vec::new(),
        }
    }

    /// Adds a resolver.
    #[must_use]
    pub fn with_resolver<R: DependencyResolver + 'static>(mut self, resolver: R) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    /// Names of the registered resolvers, in application order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resolvers.iter().map(|r| r.name())
    }

    /// Number of registered resolvers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Returns true if no resolver is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Runs every resolver on one node.
    pub fn process(&self, node: &SyntaxNode, scope: &TypeScope, refs: &mut ReferenceBuilder<'_>) {
        for resolver in &self.resolvers {
            resolver.process_node(node, scope, refs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ClassRef, Receiver};
    use std::path::PathBuf;

    fn scope() -> TypeScope {
        let mut scope = TypeScope::new();
        scope.enter_namespace("App\\Controller");
        scope.add_import("App\\Repository\\UserRepository", Some("Users"));
        scope.enter_class("App\\Controller\\Home", Some("App\\Controller\\Base".into()));
        scope
    }

    fn run(resolver: &dyn DependencyResolver, kind: NodeKind) -> Vec<(ReferenceKind, String)> {
        let file = PathBuf::from("src/Controller/Home.php");
        let mut references = Vec::new();
        let mut builder = ReferenceBuilder::new("App\\Controller\\Home", &file, &mut references);
        resolver.process_node(&SyntaxNode::new(kind, 7), &scope(), &mut builder);
        references
            .into_iter()
            .map(|r| {
                assert_eq!(r.line, 7);
                (r.kind, r.target)
            })
            .collect()
    }

    #[test]
    fn inheritance_resolves_through_namespace() {
        let edges = run(&InheritanceResolver, NodeKind::Extends { class: "Base".into() });
        assert_eq!(edges, [(ReferenceKind::Extends, "App\\Controller\\Base".to_owned())]);
    }

    #[test]
    fn instantiation_uses_alias() {
        let edges = run(
            &InstantiationResolver,
            NodeKind::New { class: ClassRef::Named("Users".into()) },
        );
        assert_eq!(
            edges,
            [(ReferenceKind::Instantiates, "App\\Repository\\UserRepository".to_owned())]
        );
    }

    #[test]
    fn static_call_on_parent() {
        let edges = run(
            &StaticCallResolver,
            NodeKind::StaticCall {
                class: ClassRef::Parent,
                method: "__construct".into(),
            },
        );
        assert_eq!(edges, [(ReferenceKind::StaticCall, "App\\Controller\\Base".to_owned())]);
    }

    #[test]
    fn dynamic_receivers_are_skipped() {
        let edges = run(
            &InstanceCallResolver,
            NodeKind::InstanceCall {
                receiver: Receiver::Dynamic,
                method: "run".into(),
            },
        );
        assert!(edges.is_empty());

        let edges = run(&InstantiationResolver, NodeKind::New { class: ClassRef::Dynamic });
        assert!(edges.is_empty());
    }

    #[test]
    fn type_hints_map_position_to_kind() {
        let edges = run(
            &TypeHintResolver,
            NodeKind::TypeHint {
                class: "?Users".into(),
                position: HintPosition::Return,
            },
        );
        assert_eq!(
            edges,
            [(ReferenceKind::ReturnType, "App\\Repository\\UserRepository".to_owned())]
        );

        let edges = run(
            &TypeHintResolver,
            NodeKind::TypeHint {
                class: "string".into(),
                position: HintPosition::Parameter,
            },
        );
        assert!(edges.is_empty());
    }

    #[test]
    fn resolvers_ignore_other_shapes() {
        let edges = run(&CatchResolver, NodeKind::Extends { class: "Base".into() });
        assert!(edges.is_empty());
    }

    #[test]
    fn default_registry_has_every_resolver() {
        let registry = ResolverRegistry::default();
        assert_eq!(registry.len(), 11);
        assert!(registry.names().any(|n| n == "attribute"));
    }
}
