//! Optional JSON persistence for the catalog.

use crate::entry::RegistryEntry;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::path::Path;
use tracing::instrument;

/// Load previously saved entries. A missing file is an empty catalog, not
/// an error; a present-but-unreadable or malformed file is.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_entries(path: impl AsRef<Path>) -> Result<Vec<RegistryEntry>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Vec::new());
    }
    let json = std::fs::read_to_string(path).or_raise(|| ErrorKind::Persistence(path.to_path_buf()))?;
    let entries = serde_json::from_str(&json).or_raise(|| ErrorKind::Malformed(path.to_path_buf()))?;
    Ok(entries)
}

/// Save entries as pretty-printed JSON, sorted by identity so successive
/// saves of the same catalog diff cleanly.
#[instrument(skip_all, fields(path = %path.as_ref().display(), entries = entries.len()))]
pub fn save_entries(path: impl AsRef<Path>, entries: &[RegistryEntry]) -> Result<()> {
    let path = path.as_ref();
    let mut entries: Vec<&RegistryEntry> = entries.iter().collect();
    entries.sort_by(|a, b| a.identity.strong.cmp(&b.identity.strong));
    let json = serde_json::to_string_pretty(&entries).or_raise(|| ErrorKind::Persistence(path.to_path_buf()))?;
    std::fs::write(path, json).or_raise(|| ErrorKind::Persistence(path.to_path_buf()))?;
    Ok(())
}
