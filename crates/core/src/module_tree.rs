//! Hierarchical module tree produced by clustering
//!
//! The tree serializes as a JSON object keyed by module name:
//!
//! ```json
//! { "Auth": { "name": "Auth", "path": "auth", "components": ["a.pkg.Foo"], "children": {} } }
//! ```
//!
//! Children are kept in a sorted map so the serialized form of a tree depends
//! only on its content.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display};

/// Immutable path of module names from the repository root to a node.
///
/// Each recursive clustering call receives its own value; extending a path
/// produces a new one instead of mutating a shared list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModulePath(Vec<String>);

impl ModulePath {
    /// The repository level
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// A new path one level below this one
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.into());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Name of the module this path points at, `None` at the root
    pub fn leaf_name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }
}

impl Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "(root)")
        } else {
            write!(f, "{}", self.0.join(" > "))
        }
    }
}

impl<S: Into<String>> FromIterator<S> for ModulePath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// A node of the module tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleNode {
    pub name: String,

    /// Path hint proposed for the module (directory-like, may be empty)
    #[serde(default)]
    pub path: String,

    /// Canonical ids of the module's core components, in first-seen order
    #[serde(default)]
    pub components: Vec<String>,

    #[serde(default)]
    pub children: ModuleTree,
}

impl ModuleNode {
    pub fn new(name: impl Into<String>, path: impl Into<String>, components: Vec<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            components,
            children: ModuleTree::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Module tree: module name -> node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleTree(BTreeMap<String, ModuleNode>);

impl ModuleTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, name: &str) -> Option<&ModuleNode> {
        self.0.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ModuleNode> {
        self.0.get_mut(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModuleNode)> {
        self.0.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ModuleNode> {
        self.0.values()
    }

    /// Insert a node under its own name, replacing any node with that name
    pub fn insert(&mut self, node: ModuleNode) -> Option<ModuleNode> {
        self.0.insert(node.name.clone(), node)
    }

    /// Look up the node a path points at
    pub fn node_at(&self, path: &ModulePath) -> Option<&ModuleNode> {
        let (first, rest) = path.segments().split_first()?;
        let mut node = self.0.get(first)?;
        for segment in rest {
            node = node.children.0.get(segment)?;
        }
        Some(node)
    }

    /// Return a copy of this tree with `delta` attached at `path`.
    ///
    /// At the root, the delta's modules are added next to the existing ones.
    /// Below the root, they become children of the node at `path`; missing
    /// intermediate nodes are created empty.
    pub fn grafted(&self, path: &ModulePath, delta: ModuleTree) -> ModuleTree {
        let mut tree = self.clone();
        let mut level = &mut tree;
        for segment in path.segments() {
            level = &mut level
                .0
                .entry(segment.clone())
                .or_insert_with(|| ModuleNode::new(segment.clone(), "", Vec::new()))
                .children;
        }
        level.0.extend(delta.0);
        tree
    }

    /// Module paths ordered children-first (post-order, siblings by name)
    pub fn processing_order(&self) -> Vec<ModulePath> {
        fn collect(tree: &ModuleTree, prefix: &ModulePath, out: &mut Vec<ModulePath>) {
            for (name, node) in &tree.0 {
                let path = prefix.child(name.clone());
                collect(&node.children, &path, out);
                out.push(path);
            }
        }

        let mut order = Vec::new();
        collect(self, &ModulePath::root(), &mut order);
        order
    }

    /// Every component id referenced anywhere in the tree
    pub fn component_ids(&self) -> BTreeSet<String> {
        let mut ids = BTreeSet::new();
        for node in self.0.values() {
            ids.extend(node.components.iter().cloned());
            ids.extend(node.children.component_ids());
        }
        ids
    }

    /// Drop component ids rejected by `keep` everywhere in the tree.
    ///
    /// Returns the ids that were removed, in tree order.
    pub fn retain_components<F>(&mut self, keep: &F) -> Vec<String>
    where
        F: Fn(&str) -> bool,
    {
        let mut removed = Vec::new();
        for node in self.0.values_mut() {
            node.components.retain(|id| {
                let kept = keep(id);
                if !kept {
                    removed.push(id.clone());
                }
                kept
            });
            removed.extend(node.children.retain_components(keep));
        }
        removed
    }

    /// Number of levels below the root (0 for an empty tree)
    pub fn depth(&self) -> usize {
        self.0
            .values()
            .map(|node| 1 + node.children.depth())
            .max()
            .unwrap_or(0)
    }

    /// Total number of modules at every level
    pub fn module_count(&self) -> usize {
        self.0
            .values()
            .map(|node| 1 + node.children.module_count())
            .sum()
    }
}

impl FromIterator<ModuleNode> for ModuleTree {
    fn from_iter<I: IntoIterator<Item = ModuleNode>>(iter: I) -> Self {
        let mut tree = Self::new();
        for node in iter {
            tree.insert(node);
        }
        tree
    }
}
