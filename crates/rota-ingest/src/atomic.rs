//! Write-then-rename file replacement.

use std::fs;
use std::io;
use std::path::Path;

/// Writes `contents` to a sibling temp file and renames it over
/// `path`, so readers never observe a partial file.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}
