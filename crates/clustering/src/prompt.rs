//! Clustering prompt assembly

use crate::hints::describe;
use crate::identifiers::IdentifierMap;
use crate::response::{CLOSE_TAG, OPEN_TAG};
use modmap_core::entities::Component;
use modmap_core::module_tree::ModuleTree;
use modmap_core::registry::ComponentRegistry;
use std::collections::BTreeMap;

/// Leaves listed for the oracle, with and without source text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentListing {
    pub listing: String,
    pub listing_with_source: String,
}

/// List the components of `map` grouped by file.
///
/// Files are sorted by relative path, components within a file by id; each
/// entry reads `\t{index}: {hint}`.
pub fn format_component_listing(map: &IdentifierMap, registry: &ComponentRegistry) -> ComponentListing {
    let mut by_file: BTreeMap<&str, Vec<(&str, usize, &Component)>> = BTreeMap::new();
    for (index, id) in map.ids().iter().enumerate() {
        if let Some(component) = registry.get(id) {
            by_file
                .entry(component.relative_path.as_str())
                .or_default()
                .push((id.as_str(), index, component));
        }
    }

    let mut out = ComponentListing::default();
    for (file, mut entries) in by_file {
        entries.sort_by(|a, b| a.0.cmp(b.0));
        let header = format!("# {file}\n");
        out.listing.push_str(&header);
        out.listing_with_source.push_str(&header);
        for (_, index, component) in entries {
            let line = format!("\t{index}: {}\n", describe(component));
            out.listing.push_str(&line);
            out.listing_with_source.push_str(&line);
            out.listing_with_source.push_str(&format!("{}\n", component.source_text));
        }
    }
    out
}

/// Indented outline of the tree, marking `current` when present
pub fn format_module_tree(tree: &ModuleTree, current: Option<&str>) -> String {
    fn walk(tree: &ModuleTree, current: Option<&str>, indent: usize, lines: &mut Vec<String>) {
        for (name, node) in tree.iter() {
            let pad = "  ".repeat(indent);
            if Some(name) == current {
                lines.push(format!("{pad}{name} (current module)"));
            } else {
                lines.push(format!("{pad}{name}"));
            }
            lines.push(format!("{pad}   Core components: {}", node.components.join(", ")));
            if !node.children.is_empty() {
                lines.push(format!("{pad}   Children:"));
                walk(&node.children, current, indent + 2, lines);
            }
        }
    }

    let mut lines = Vec::new();
    walk(tree, current, 0, &mut lines);
    lines.join("\n")
}

fn response_format() -> String {
    format!(
        "First reason about the components, then return the grouping in exactly this format:\n\
         {OPEN_TAG}\n\
         {{\n    \"module_name\": {{\n        \"path\": \"<file or directory of the module>\",\n        \"components\": [<index>, <index>, ...]\n    }}\n}}\n\
         {CLOSE_TAG}\n\
         Refer to components only by the integer index shown before them. The payload must be valid JSON."
    )
}

/// Build the clustering prompt.
///
/// The current tree, when not empty, is included as context.
pub fn format_cluster_prompt(listing: &str, tree: &ModuleTree, module_name: Option<&str>) -> String {
    let subject = match module_name {
        Some(name) => format!("the module {name}"),
        None => "the repository".to_string(),
    };

    let mut prompt = String::new();
    if !tree.is_empty() {
        prompt.push_str(&format!(
            "Here is the module tree of the repository:\n<MODULE_TREE>\n{}\n</MODULE_TREE>\n\n",
            format_module_tree(tree, module_name)
        ));
    }
    prompt.push_str(&format!(
        "Here is the list of all potential core components of {subject} \
         (some of them may not be essential):\n\
         <POTENTIAL_CORE_COMPONENTS>\n{listing}</POTENTIAL_CORE_COMPONENTS>\n\n\
         Group the components so that each group is a set of closely related components \
         forming a module. Use at least two groups.\n\n{}",
        response_format()
    ));
    prompt
}
