//! Per-run scratch directory holding the split record files.
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::error::Result;

/// Scratch directory owned by one run. Removed on `close` or when dropped.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh workspace inside `base`, or the system temp dir when `None`.
    pub fn create(base: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("auto3d_batch_");
        let dir = match base {
            Some(base) => {
                std::fs::create_dir_all(base)?;
                builder.tempdir_in(base)?
            }
            None => builder.tempdir()?,
        };
        debug!("Workspace: {:?}", dir.path());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Deterministic path of the `index`-th (1-based) record file.
    /// `ext` carries the leading dot, e.g. `.sdf`.
    pub fn record_path(&self, index: usize, ext: &str) -> PathBuf {
        self.dir.path().join(format!("input_{}{}", index, ext))
    }

    /// Remove the directory and everything in it.
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        debug!("Removed workspace {:?}", path);
        Ok(())
    }

    /// Persist the directory past the end of the run and return its path.
    pub fn keep(self) -> PathBuf {
        self.dir.keep()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_paths_are_one_based_and_keep_extension() {
        let base = tempfile::tempdir().unwrap();
        let ws = Workspace::create(Some(base.path())).unwrap();
        assert!(ws.path().starts_with(base.path()));
        assert_eq!(ws.record_path(1, ".smi"), ws.path().join("input_1.smi"));
        assert_eq!(ws.record_path(12, ".sd"), ws.path().join("input_12.sd"));
    }

    #[test]
    fn close_removes_directory() {
        let base = tempfile::tempdir().unwrap();
        let ws = Workspace::create(Some(base.path())).unwrap();
        std::fs::write(ws.record_path(1, ".smi"), "C\n").unwrap();
        let path = ws.path().to_path_buf();
        ws.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn keep_leaves_directory_in_place() {
        let base = tempfile::tempdir().unwrap();
        let ws = Workspace::create(Some(base.path())).unwrap();
        let kept = ws.keep();
        assert!(kept.is_dir());
    }

    #[test]
    fn creates_missing_base_directory() {
        let base = tempfile::tempdir().unwrap();
        let nested = base.path().join("a").join("b");
        let ws = Workspace::create(Some(&nested)).unwrap();
        assert!(ws.path().starts_with(&nested));
    }
}
