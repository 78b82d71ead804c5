//! Decoding of oracle grouping responses
//!
//! The payload between the `<GROUPED_COMPONENTS>` tags is decoded as strict
//! JSON of the shape `{name: {path, components: [token]}}`. Nothing in the
//! response is ever evaluated.

use modmap_core::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt::{self, Display};

pub const OPEN_TAG: &str = "<GROUPED_COMPONENTS>";
pub const CLOSE_TAG: &str = "</GROUPED_COMPONENTS>";

/// One member reference proposed by the oracle
#[derive(Debug, Clone, PartialEq)]
pub enum ProposedToken {
    /// An integer, expected to be a surrogate index
    Index(i64),
    /// A string, expected to be an index, an id or a name
    Text(String),
    /// Any other JSON value, kept verbatim for diagnostics
    Other(String),
}

impl ProposedToken {
    fn from_value(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Index(i),
                None => Self::Other(n.to_string()),
            },
            serde_json::Value::String(s) => Self::Text(s),
            other => Self::Other(other.to_string()),
        }
    }
}

impl Display for ProposedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Text(s) | Self::Other(s) => write!(f, "{s}"),
        }
    }
}

/// A group proposed by the oracle, before identifier resolution
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedGroup {
    pub path: String,
    pub components: Vec<ProposedToken>,
}

#[derive(Deserialize)]
struct RawGroup {
    #[serde(default)]
    path: Option<String>,
    components: Vec<serde_json::Value>,
}

/// Groups keyed by proposed module name, sorted by name
pub type ProposedGrouping = BTreeMap<String, ProposedGroup>;

fn strip_markdown_fences(payload: &str) -> &str {
    let trimmed = payload.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let after_fence = match trimmed.find('\n') {
        Some(newline) => &trimmed[newline + 1..],
        None => trimmed.trim_start_matches('`'),
    };
    match after_fence.rfind("```") {
        Some(close) => after_fence[..close].trim(),
        None => after_fence.trim(),
    }
}

/// Text between the first opening tag and the next closing tag
pub fn delimited_payload(response: &str) -> Option<&str> {
    let start = response.find(OPEN_TAG)? + OPEN_TAG.len();
    let end = response[start..].find(CLOSE_TAG)? + start;
    Some(&response[start..end])
}

/// Decode a grouping response.
///
/// Fails with [`Error::OracleMalformed`] when the tags are missing, the
/// payload is not JSON, or the JSON does not have the expected shape.
pub fn parse_grouping(response: &str) -> Result<ProposedGrouping> {
    let payload = delimited_payload(response).ok_or_else(|| {
        Error::oracle_malformed(format!("missing {OPEN_TAG} block"))
    })?;
    let json = strip_markdown_fences(payload);

    let raw: BTreeMap<String, RawGroup> = serde_json::from_str(json)
        .map_err(|e| Error::oracle_malformed(format!("undecodable grouping payload: {e}")))?;

    Ok(raw
        .into_iter()
        .map(|(name, group)| {
            let components = group
                .components
                .into_iter()
                .map(ProposedToken::from_value)
                .collect();
            (
                name,
                ProposedGroup {
                    path: group.path.unwrap_or_default(),
                    components,
                },
            )
        })
        .collect())
}
