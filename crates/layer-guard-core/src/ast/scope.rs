//! Name resolution context threaded through a single file walk.

use std::collections::BTreeMap;

use super::syntax::{ClassRef, Receiver};

/// Type keywords that never name a class.
const BUILTIN_TYPES: &[&str] = &[
    "array", "bool", "callable", "false", "float", "int", "iterable", "mixed", "never", "null",
    "object", "string", "true", "void",
];

/// Per-node resolution context.
///
/// Holds the current namespace, import aliases, the enclosing class, its
/// parent, and the variables whose class is statically known. The walker
/// clones the scope when entering a namespace, class-like or method, so
/// nothing leaks out of the construct that introduced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeScope {
    namespace: String,
    /// Lowercase alias -> fully-qualified name.
    imports: BTreeMap<String, String>,
    class: Option<String>,
    parent: Option<String>,
    /// Variable name (without `$`) -> fully-qualified class.
    variables: BTreeMap<String, String>,
}

impl TypeScope {
    /// Creates an empty scope (global namespace, no class).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current namespace, empty for the global namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Enclosing class, if any.
    #[must_use]
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    /// Parent of the enclosing class, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Enters a namespace. Imports of the previous namespace are dropped.
    pub fn enter_namespace(&mut self, name: &str) {
        self.namespace = name.trim_matches('\\').to_owned();
        self.imports.clear();
        self.class = None;
        self.parent = None;
        self.variables.clear();
    }

    /// Registers a `use` import. Without an alias, the last segment is used.
    pub fn add_import(&mut self, name: &str, alias: Option<&str>) {
        let name = name.trim_start_matches('\\');
        let alias = alias.unwrap_or_else(|| name.rsplit('\\').next().unwrap_or(name));
        self.imports.insert(alias.to_lowercase(), name.to_owned());
    }

    /// Enters a class-like declaration.
    pub fn enter_class(&mut self, fqcn: impl Into<String>, parent: Option<String>) {
        self.class = Some(fqcn.into());
        self.parent = parent;
        self.variables.clear();
    }

    /// Records that `$variable` holds an instance of `class` from here on.
    pub fn bind(&mut self, variable: &str, class: impl Into<String>) {
        self.variables.insert(variable.to_owned(), class.into());
    }

    /// Forgets what `$variable` holds.
    pub fn unbind(&mut self, variable: &str) {
        self.variables.remove(variable);
    }

    /// Forgets all variable bindings.
    pub fn clear_variables(&mut self) {
        self.variables.clear();
    }

    /// Prefixes a declared short name with the current namespace.
    #[must_use]
    pub fn qualify_declaration(&self, name: &str) -> String {
        if self.namespace.is_empty() {
            name.to_owned()
        } else {
            format!("{}\\{name}", self.namespace)
        }
    }

    /// Canonicalizes a class name as written in source.
    ///
    /// Returns `None` for markers that cannot be resolved here, such as
    /// `parent` in a class without a parent.
    #[must_use]
    pub fn resolve_name(&self, name: &str) -> Option<String> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        if let Some(qualified) = name.strip_prefix('\\') {
            return Some(qualified.to_owned());
        }

        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "self" | "static" => return self.class.clone(),
            "parent" => return self.parent.clone(),
            _ => {}
        }
        if lower.starts_with("namespace\\") {
            return Some(self.qualify_declaration(&name["namespace\\".len()..]));
        }

        let (first, rest) = match name.split_once('\\') {
            Some((first, rest)) => (first, Some(rest)),
            None => (name, None),
        };
        if let Some(imported) = self.imports.get(&first.to_lowercase()) {
            return Some(match rest {
                Some(rest) => format!("{imported}\\{rest}"),
                None => imported.clone(),
            });
        }
        Some(self.qualify_declaration(name))
    }

    /// Canonicalizes a type name from a declaration, dropping builtins.
    ///
    /// A leading `?` (nullable) is ignored.
    #[must_use]
    pub fn resolve_type(&self, name: &str) -> Option<String> {
        let name = name.trim().trim_start_matches('?');
        if BUILTIN_TYPES.contains(&name.to_ascii_lowercase().as_str()) {
            return None;
        }
        self.resolve_name(name)
    }

    /// Canonicalizes a class reference in expression position.
    #[must_use]
    pub fn resolve_class(&self, class: &ClassRef) -> Option<String> {
        match class {
            ClassRef::Named(name) => self.resolve_type(name),
            ClassRef::SelfRef | ClassRef::Static => self.class.clone(),
            ClassRef::Parent => self.parent.clone(),
            ClassRef::Dynamic => None,
        }
    }

    /// Canonicalizes the class of a method-call receiver.
    #[must_use]
    pub fn resolve_receiver(&self, receiver: &Receiver) -> Option<String> {
        match receiver {
            Receiver::This => self.class.clone(),
            Receiver::Variable(name) if name == "this" => self.class.clone(),
            Receiver::Variable(name) => self.variables.get(name).cloned(),
            Receiver::New(class) => self.resolve_class(class),
            Receiver::Dynamic => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> TypeScope {
        let mut scope = TypeScope::new();
        scope.enter_namespace("App\\Controller");
        scope.add_import("App\\Repository\\UserRepository", None);
        scope.add_import("\\App\\Service", Some("Svc"));
        scope.enter_class("App\\Controller\\UserController", Some("App\\Base".into()));
        scope
    }

    #[test]
    fn fully_qualified_names_are_kept() {
        assert_eq!(scope().resolve_name("\\Foo\\Bar").as_deref(), Some("Foo\\Bar"));
    }

    #[test]
    fn unqualified_names_use_imports_then_namespace() {
        let scope = scope();
        assert_eq!(
            scope.resolve_name("userrepository").as_deref(),
            Some("App\\Repository\\UserRepository")
        );
        assert_eq!(
            scope.resolve_name("Helper").as_deref(),
            Some("App\\Controller\\Helper")
        );
    }

    #[test]
    fn qualified_names_expand_first_segment_alias() {
        assert_eq!(
            scope().resolve_name("Svc\\Mailer").as_deref(),
            Some("App\\Service\\Mailer")
        );
        assert_eq!(
            scope().resolve_name("Sub\\Thing").as_deref(),
            Some("App\\Controller\\Sub\\Thing")
        );
    }

    #[test]
    fn namespace_relative_names() {
        assert_eq!(
            scope().resolve_name("namespace\\Form\\Login").as_deref(),
            Some("App\\Controller\\Form\\Login")
        );
    }

    #[test]
    fn markers_resolve_to_enclosing_classes() {
        let scope = scope();
        assert_eq!(
            scope.resolve_class(&ClassRef::Static).as_deref(),
            Some("App\\Controller\\UserController")
        );
        assert_eq!(scope.resolve_name("parent").as_deref(), Some("App\\Base"));

        let mut orphan = TypeScope::new();
        orphan.enter_class("Foo", None);
        assert_eq!(orphan.resolve_class(&ClassRef::Parent), None);
    }

    #[test]
    fn builtin_types_are_dropped() {
        let scope = scope();
        assert_eq!(scope.resolve_type("int"), None);
        assert_eq!(scope.resolve_type("?String"), None);
        assert_eq!(
            scope.resolve_type("?UserRepository").as_deref(),
            Some("App\\Repository\\UserRepository")
        );
    }

    #[test]
    fn receivers() {
        let mut scope = scope();
        scope.bind("repo", "App\\Repository\\UserRepository");
        assert_eq!(
            scope.resolve_receiver(&Receiver::Variable("repo".into())).as_deref(),
            Some("App\\Repository\\UserRepository")
        );
        assert_eq!(
            scope.resolve_receiver(&Receiver::This).as_deref(),
            Some("App\\Controller\\UserController")
        );
        assert_eq!(scope.resolve_receiver(&Receiver::Variable("other".into())), None);
        assert_eq!(scope.resolve_receiver(&Receiver::Dynamic), None);

        scope.unbind("repo");
        assert_eq!(scope.resolve_receiver(&Receiver::Variable("repo".into())), None);
    }

    #[test]
    fn entering_a_namespace_drops_imports() {
        let mut scope = scope();
        scope.enter_namespace("Other");
        assert_eq!(
            scope.resolve_name("UserRepository").as_deref(),
            Some("Other\\UserRepository")
        );
        assert_eq!(scope.class(), None);
    }
}
