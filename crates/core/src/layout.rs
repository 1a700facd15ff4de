use crate::{AppPaths, LaunchError, Result};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DIRECTORY_MODE: u32 = 0o755;

/// Creates a directory (and parents) and forces its mode to 755, whether or
/// not it already existed.
pub fn ensure_directory(path: &Path) -> Result<()> {
    let wrap = |source: std::io::Error| LaunchError::Directory {
        path: path.to_path_buf(),
        source,
    };

    fs::create_dir_all(path).map_err(wrap)?;
    fs::set_permissions(path, fs::Permissions::from_mode(DIRECTORY_MODE)).map_err(wrap)?;
    debug!(path = %path.display(), "directory ready");
    Ok(())
}

pub fn ensure_directories(paths: &AppPaths) -> Result<Vec<PathBuf>> {
    let mut prepared = Vec::new();
    for dir in paths.runtime_directories() {
        ensure_directory(dir)?;
        prepared.push(dir.to_path_buf());
    }
    Ok(prepared)
}
