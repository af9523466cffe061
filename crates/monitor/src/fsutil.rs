use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use crate::{Error, Result};

/// `known_skills.json` + `tmp` -> `known_skills.json.tmp`.
pub(crate) fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Atomic write: write to temp, optionally keep the old file as `.bak`,
/// rename over target. Parent directories are created as needed.
pub(crate) fn atomic_write(path: &Path, data: &[u8], keep_backup: bool) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| Error::write(parent, e))?;
    }

    let tmp = with_suffix(path, "tmp");
    std::fs::write(&tmp, data).map_err(|e| Error::write(&tmp, e))?;

    if keep_backup && path.exists() {
        let _ = std::fs::rename(path, with_suffix(path, "bak"));
    }

    std::fs::rename(&tmp, path).map_err(|e| Error::write(path, e))
}
