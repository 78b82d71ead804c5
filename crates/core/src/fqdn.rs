//! Helpers for fully-qualified component identifiers.
//!
//! A component id has the shape `{namespace}.{local-path}`, where the local
//! path is whatever the source analyzer reported for the symbol. Local paths
//! may themselves contain dots (`pkg.module.Class`) or a file/symbol split
//! (`src/auth.py::AuthService`), so every helper here works on plain string
//! segments and never assumes a fixed depth.

/// Separator between a namespace and the local path, and between dotted segments.
pub const SEGMENT_SEPARATOR: char = '.';

/// Separator some analyzers use between a file path and a symbol name.
pub const SYMBOL_SEPARATOR: &str = "::";

/// Build the canonical id for a local symbol id inside a namespace.
pub fn compose(namespace: &str, local_id: &str) -> String {
    format!("{namespace}{SEGMENT_SEPARATOR}{local_id}")
}

/// Namespace part of a canonical id (everything before the first dot).
pub fn namespace_of(id: &str) -> &str {
    id.split(SEGMENT_SEPARATOR).next().unwrap_or(id)
}

/// Split an id into its dotted segments.
pub fn dotted_segments(id: &str) -> Vec<&str> {
    id.split(SEGMENT_SEPARATOR).collect()
}

/// Last dotted segment of an id (`a.pkg.Foo` -> `Foo`).
pub fn last_dotted_segment(id: &str) -> &str {
    id.rsplit(SEGMENT_SEPARATOR).next().unwrap_or(id)
}

/// The last `n` dotted segments joined back together.
///
/// Returns `None` when the id has fewer than `n` segments.
pub fn dotted_suffix(id: &str, n: usize) -> Option<String> {
    let segments = dotted_segments(id);
    if n == 0 || segments.len() < n {
        return None;
    }
    Some(segments[segments.len() - n..].join("."))
}

/// Human-facing short name: the symbol after `::` if present, otherwise the
/// last dotted segment.
pub fn short_name(id: &str) -> &str {
    match id.rsplit_once(SYMBOL_SEPARATOR) {
        Some((_, symbol)) if !symbol.is_empty() => symbol,
        _ => last_dotted_segment(id),
    }
}

/// Replace every non-alphanumeric character with `_`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}
