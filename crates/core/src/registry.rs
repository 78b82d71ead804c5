//! FQDN-keyed component registry
//!
//! The registry is written by a single owner while the graph is built and is
//! read-only afterwards. Keys are kept sorted so every iteration order derived
//! from it is deterministic.

use crate::entities::{Component, ComponentKind};
use std::collections::{BTreeMap, BTreeSet};

/// Adjacency view of the registry: component id -> ids it depends on
pub type DependencyGraph = BTreeMap<String, BTreeSet<String>>;

/// Outcome of inserting a component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A component with the same id was already present and was kept
    Duplicate,
}

/// Registry of every component discovered in one run
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    components: BTreeMap<String, Component>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a component, keeping the first one registered under an id
    pub fn insert(&mut self, component: Component) -> InsertOutcome {
        if self.components.contains_key(&component.id) {
            return InsertOutcome::Duplicate;
        }
        self.components.insert(component.id.clone(), component);
        InsertOutcome::Inserted
    }

    pub fn get(&self, id: &str) -> Option<&Component> {
        self.components.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Component> {
        self.components.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.components.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Component ids in sorted order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    /// Components in id order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Component)> {
        self.components.iter().map(|(id, c)| (id.as_str(), c))
    }

    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    /// Record `callee` as a dependency of `caller`.
    ///
    /// Returns `true` when the edge is new. Unknown callers are ignored and
    /// report `false`; the caller is responsible for only passing known callees.
    pub fn add_dependency(&mut self, caller: &str, callee: &str) -> bool {
        match self.get_mut(caller) {
            Some(component) => component.depends_on.insert(callee.to_string()),
            None => false,
        }
    }

    /// Whether any component has one of the given kinds
    pub fn has_any_kind(&self, kinds: &[ComponentKind]) -> bool {
        self.components.values().any(|c| kinds.contains(&c.kind))
    }

    /// Count of components per kind, sorted by kind
    pub fn kind_breakdown(&self) -> BTreeMap<ComponentKind, usize> {
        let mut counts = BTreeMap::new();
        for component in self.components.values() {
            *counts.entry(component.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Snapshot of the dependency edges
    pub fn dependency_graph(&self) -> DependencyGraph {
        self.components
            .iter()
            .map(|(id, c)| (id.clone(), c.depends_on.clone()))
            .collect()
    }
}

impl FromIterator<Component> for ComponentRegistry {
    fn from_iter<I: IntoIterator<Item = Component>>(iter: I) -> Self {
        let mut registry = Self::new();
        for component in iter {
            registry.insert(component);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn component(id: &str, kind: ComponentKind) -> Component {
        let (namespace, short_id) = id.split_once('.').unwrap();
        Component::builder()
            .id(id)
            .name(crate::fqdn::last_dotted_segment(id))
            .kind(kind)
            .relative_path("src/lib.py")
            .file_path(PathBuf::from("/tmp/src/lib.py"))
            .short_id(short_id)
            .namespace(namespace)
            .build()
            .unwrap()
    }

    #[test]
    fn test_insert_keeps_first_writer() {
        let mut registry = ComponentRegistry::new();
        assert_eq!(
            registry.insert(component("a.Foo", ComponentKind::Class)),
            InsertOutcome::Inserted
        );
        assert_eq!(
            registry.insert(component("a.Foo", ComponentKind::Function)),
            InsertOutcome::Duplicate
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a.Foo").unwrap().kind, ComponentKind::Class);
    }

    #[test]
    fn test_ids_are_sorted() {
        let registry: ComponentRegistry = ["b.Z", "a.Y", "a.X"]
            .into_iter()
            .map(|id| component(id, ComponentKind::Class))
            .collect();
        let ids: Vec<&str> = registry.ids().collect();
        assert_eq!(ids, vec!["a.X", "a.Y", "b.Z"]);
    }

    #[test]
    fn test_add_dependency_is_idempotent() {
        let mut registry: ComponentRegistry = ["a.X", "a.Y"]
            .into_iter()
            .map(|id| component(id, ComponentKind::Class))
            .collect();
        assert!(registry.add_dependency("a.X", "a.Y"));
        assert!(!registry.add_dependency("a.X", "a.Y"));
        assert!(!registry.add_dependency("a.Missing", "a.Y"));

        let graph = registry.dependency_graph();
        assert_eq!(graph["a.X"].len(), 1);
        assert!(graph["a.Y"].is_empty());
    }

    #[test]
    fn test_kind_queries() {
        let registry: ComponentRegistry = vec![
            component("a.f", ComponentKind::Function),
            component("a.g", ComponentKind::Function),
            component("a.S", ComponentKind::Struct),
        ]
        .into_iter()
        .collect();

        assert!(registry.has_any_kind(&ComponentKind::OBJECT_ORIENTED));
        assert!(!registry.has_any_kind(&[ComponentKind::Interface]));
        let breakdown = registry.kind_breakdown();
        assert_eq!(breakdown[&ComponentKind::Function], 2);
        assert_eq!(breakdown[&ComponentKind::Struct], 1);
    }
}
