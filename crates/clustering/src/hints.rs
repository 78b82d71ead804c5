//! Human-readable hints shown next to each surrogate index

use modmap_core::entities::Component;
use modmap_core::fqdn;

/// Package words recognised as a component's role, in priority order
const ROLE_WORDS: [&str; 10] = [
    "controller",
    "service",
    "repository",
    "model",
    "dto",
    "config",
    "util",
    "helper",
    "handler",
    "processor",
];

/// Path components carrying no information about a module
const NOISE_DIRECTORIES: [&str; 5] = ["src", "main", "java", "com", "org"];

const SOURCE_EXTENSIONS: [&str; 7] = [".py", ".java", ".ts", ".tsx", ".js", ".rs", ".go"];

fn path_parts(relative_path: &str) -> Vec<&str> {
    relative_path
        .split(['/', '\\'])
        .filter(|part| !part.is_empty())
        .collect()
}

fn strip_extension(file: &str) -> &str {
    SOURCE_EXTENSIONS
        .iter()
        .find_map(|ext| file.strip_suffix(ext))
        .unwrap_or(file)
}

/// Module a component belongs to, e.g. `api-service` or `auth`.
///
/// Prefers a `*-service`/`*-api` id segment (its last two dash parts), then
/// the last meaningful component of the file path, then the namespace.
pub fn module_hint(component: &Component) -> String {
    for segment in fqdn::dotted_segments(&component.id) {
        if segment.contains("-service") || segment.contains("-api") {
            let dashed: Vec<&str> = segment.split('-').collect();
            if dashed.len() >= 2 {
                return dashed[dashed.len() - 2..].join("-");
            }
        }
    }

    path_parts(&component.relative_path)
        .into_iter()
        .rev()
        .find(|part| !NOISE_DIRECTORIES.contains(part))
        .map(|part| strip_extension(part).to_string())
        .unwrap_or_else(|| component.namespace.clone())
}

/// Role or package of a component, e.g. `controller` or `models`.
pub fn package_hint(component: &Component) -> String {
    let lowered = component.id.to_lowercase();
    if let Some(role) = ROLE_WORDS.iter().find(|role| lowered.contains(*role)) {
        return role.to_string();
    }

    let parts = path_parts(&component.relative_path);
    let directories = parts.split_last().map(|(_, dirs)| dirs).unwrap_or_default();
    if let Some(dir) = directories
        .iter()
        .rev()
        .find(|part| !NOISE_DIRECTORIES.contains(*part))
    {
        return dir.to_string();
    }

    let segments = fqdn::dotted_segments(&component.id);
    if segments.len() >= 2 {
        return segments[segments.len() - 2].to_string();
    }
    "core".to_string()
}

/// `{ShortName} ({module}, {package})`
pub fn describe(component: &Component) -> String {
    format!(
        "{} ({}, {})",
        fqdn::short_name(&component.id),
        module_hint(component),
        package_hint(component)
    )
}
