//! JSON file persistence shared by the graph dump and the module tree store

use crate::error::{Error, Result, ResultExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Serialize `value` as pretty JSON and write it atomically using temp + rename.
///
/// Readers see either the previous file or the complete new one.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .context(format!("creating output directory {}", parent.display()))?;
        }
    }

    let mut content = serde_json::to_vec_pretty(value)?;
    content.push(b'\n');

    let file_name = path
        .file_name()
        .ok_or_else(|| Error::invalid_input(format!("not a file path: {}", path.display())))?;
    let temp_path = path.with_file_name(format!(
        ".{}.{}.tmp",
        file_name.to_string_lossy(),
        std::process::id()
    ));

    fs::write(&temp_path, &content).context(format!("writing {}", temp_path.display()))?;
    fs::rename(&temp_path, path).context(format!("replacing {}", path.display()))?;
    Ok(())
}

/// Read and decode a JSON file, returning `None` when it does not exist.
pub fn read_json_if_present<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::with_context(format!("reading {}", path.display()), e)),
    };
    Ok(Some(serde_json::from_slice(&content)?))
}
