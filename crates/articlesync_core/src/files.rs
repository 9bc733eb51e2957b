use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| Error::io(parent, source))?;
    }
    Ok(())
}

/// True when anything occupies `path`, file or directory.
pub fn file_exists(path: &Path) -> bool {
    path.exists()
}

pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::io(path, source))
}

/// Write `content` byte for byte, creating parent directories first.
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    ensure_parent_dir(path)?;
    fs::write(path, content).map_err(|source| Error::io(path, source))?;
    debug!(path = %path.display(), bytes = content.len(), "wrote file");
    Ok(())
}

pub fn remove_file(path: &Path) -> Result<()> {
    fs::remove_file(path).map_err(|source| Error::io(path, source))?;
    debug!(path = %path.display(), "removed file");
    Ok(())
}
