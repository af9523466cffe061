//! Single-instance guard over an advisory file lock.

use std::{
    fs::{File, OpenOptions},
    io::ErrorKind,
    path::{Path, PathBuf},
};

use {
    fd_lock::{RwLock, RwLockWriteGuard},
    tracing::debug,
};

use crate::{Error, Result};

/// Exclusive, non-blocking lock on a file in the working directory.
///
/// The lock is held for as long as the guard returned by [`try_acquire`]
/// lives and is released by the OS if the process dies. The file itself is
/// left in place.
///
/// [`try_acquire`]: ProcessLock::try_acquire
pub struct ProcessLock {
    path: PathBuf,
    lock: RwLock<File>,
}

impl ProcessLock {
    pub fn open(path: &Path) -> Result<Self> {
        let lock_err = |source| Error::Lock {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(lock_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(lock_err)?;
        Ok(Self {
            path: path.to_path_buf(),
            lock: RwLock::new(file),
        })
    }

    /// `None` when another holder has the lock.
    pub fn try_acquire(&mut self) -> Result<Option<RwLockWriteGuard<'_, File>>> {
        match self.lock.try_write() {
            Ok(guard) => {
                debug!(path = %self.path.display(), "lock acquired");
                Ok(Some(guard))
            },
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(source) => Err(Error::Lock {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_holder_is_refused_until_release() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("monitor.lock");

        let mut first = ProcessLock::open(&path).unwrap();
        let mut second = ProcessLock::open(&path).unwrap();

        let guard = first.try_acquire().unwrap();
        assert!(guard.is_some());
        assert!(second.try_acquire().unwrap().is_none());

        drop(guard);
        assert!(second.try_acquire().unwrap().is_some());
        assert!(path.exists());
    }
}
