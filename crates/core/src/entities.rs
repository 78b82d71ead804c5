use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use strum_macros::{Display, EnumString};

/// Kind of code component reported by a source analyzer
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ComponentKind {
    Class,
    Interface,
    Struct,
    Enum,
    Record,
    Trait,
    Function,
    Method,
    Module,
    Delegate,
    Annotation,
    /// Anything the analyzer reports that is not listed above
    #[serde(other)]
    Other,
}

impl ComponentKind {
    /// Kinds that count as object-oriented leaf candidates
    pub const OBJECT_ORIENTED: [ComponentKind; 3] = [
        ComponentKind::Class,
        ComponentKind::Interface,
        ComponentKind::Struct,
    ];

    /// Map an analyzer-supplied kind string onto a known kind.
    ///
    /// Matching ignores case and surrounding whitespace; multi-word kinds such
    /// as `abstract class` collapse onto their base kind. Unknown strings map
    /// to [`ComponentKind::Other`].
    pub fn from_raw(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "abstract_class" | "data_class" => ComponentKind::Class,
            "fn" | "func" => ComponentKind::Function,
            other => other.parse().unwrap_or(ComponentKind::Other),
        }
    }

    /// Whether this kind is one of class, interface or struct
    pub fn is_object_oriented(self) -> bool {
        Self::OBJECT_ORIENTED.contains(&self)
    }
}

/// A code-level component registered under a globally unique id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[builder(setter(into))]
pub struct Component {
    /// Canonical id: `{namespace}.{short_id}`
    pub id: String,

    /// Simple name of the symbol
    pub name: String,

    /// Kind of the component
    pub kind: ComponentKind,

    /// Path relative to the source root the component was found under
    pub relative_path: String,

    /// Absolute path of the defining file
    pub file_path: PathBuf,

    /// Raw source text of the component
    #[builder(default)]
    pub source_text: String,

    /// First line of the component (1-based)
    #[builder(default)]
    pub start_line: usize,

    /// Last line of the component (1-based, inclusive)
    #[builder(default)]
    pub end_line: usize,

    /// Documentation comment, if any
    #[builder(default)]
    pub docstring: Option<String>,

    /// Parameter names for callables
    #[builder(default)]
    pub parameters: Vec<String>,

    /// Base classes / implemented interfaces
    #[builder(default)]
    pub base_classes: Vec<String>,

    /// Id without the namespace prefix, as reported by the analyzer
    pub short_id: String,

    /// Namespace derived from the source root
    pub namespace: String,

    /// True when the component comes from a non-primary source root
    #[builder(default)]
    pub is_external: bool,

    /// Ids of the components this one depends on
    #[builder(default)]
    pub depends_on: BTreeSet<String>,
}

impl Component {
    /// Create a builder for a component
    pub fn builder() -> ComponentBuilder {
        ComponentBuilder::default()
    }

    /// Whether the component carries a non-empty docstring
    pub fn has_docstring(&self) -> bool {
        self.docstring
            .as_deref()
            .is_some_and(|doc| !doc.trim().is_empty())
    }
}
