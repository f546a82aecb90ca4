//! Safe file update operations

use crate::Result;
use std::path::{Path, PathBuf};

/// File updater that performs atomic writes
///
/// Several files can be staged first and renamed into place together, so a
/// write error in a later file leaves every earlier target untouched.
#[derive(Debug, Default)]
pub struct FileUpdater {
    staged: Vec<StagedFile>,
}

#[derive(Debug)]
struct StagedFile {
    target: PathBuf,
    temp: PathBuf,
}

impl FileUpdater {
    /// Create an updater with nothing staged
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replace a single file's contents
    pub fn write(path: &Path, new_contents: &str) -> Result<()> {
        let mut updater = Self::new();
        updater.stage(path, new_contents)?;
        updater.commit()
    }

    /// Write `new_contents` to a temporary file next to `path`
    ///
    /// The temporary file is read back before it counts as staged. Nothing
    /// touches `path` until [`FileUpdater::commit`].
    pub fn stage(&mut self, path: &Path, new_contents: &str) -> Result<()> {
        let temp = temp_path_for(path);
        let result = std::fs::write(&temp, new_contents)
            .and_then(|()| std::fs::read_to_string(&temp).map(|_| ()));

        if let Err(err) = result {
            let _ = std::fs::remove_file(&temp);
            return Err(err.into());
        }

        tracing::debug!(path = %path.display(), "staged");
        self.staged.push(StagedFile {
            target: path.to_path_buf(),
            temp,
        });
        Ok(())
    }

    /// Rename every staged file over its target
    ///
    /// Rename is atomic on POSIX and best-effort on Windows.
    pub fn commit(mut self) -> Result<()> {
        while !self.staged.is_empty() {
            let file = self.staged.remove(0);
            if let Err(err) = std::fs::rename(&file.temp, &file.target) {
                // The rest are cleaned up on drop
                let _ = std::fs::remove_file(&file.temp);
                return Err(err.into());
            }
            tracing::info!(path = %file.target.display(), "updated");
        }
        Ok(())
    }
}

impl Drop for FileUpdater {
    fn drop(&mut self) {
        for file in &self.staged {
            let _ = std::fs::remove_file(&file.temp);
        }
    }
}

// original.ext -> original.ext.tmp
fn temp_path_for(path: &Path) -> PathBuf {
    path.with_extension(format!(
        "{}.tmp",
        path.extension().and_then(|ext| ext.to_str()).unwrap_or("")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("pyproject.toml");
        std::fs::write(&file_path, "old content").unwrap();

        FileUpdater::write(&file_path, "new content").unwrap();

        assert_eq!(std::fs::read_to_string(&file_path).unwrap(), "new content");
        assert!(!temp_dir.path().join("pyproject.toml.tmp").exists());
    }

    #[test]
    fn test_failed_stage_leaves_earlier_targets_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = temp_dir.path().join("pyproject.toml");
        std::fs::write(&manifest, "old content").unwrap();
        let unreachable = temp_dir.path().join("missing").join("requirements.txt");

        let mut updater = FileUpdater::new();
        updater.stage(&manifest, "new content").unwrap();
        assert!(updater.stage(&unreachable, "x").is_err());
        drop(updater);

        assert_eq!(std::fs::read_to_string(&manifest).unwrap(), "old content");
        assert!(!temp_dir.path().join("pyproject.toml.tmp").exists());
    }

    #[test]
    fn test_commit_renames_every_staged_file() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = temp_dir.path().join("pyproject.toml");
        let requirements = temp_dir.path().join("requirements.txt");
        std::fs::write(&manifest, "old").unwrap();
        std::fs::write(&requirements, "old").unwrap();

        let mut updater = FileUpdater::new();
        updater.stage(&manifest, "manifest").unwrap();
        updater.stage(&requirements, "requirements").unwrap();
        assert_eq!(std::fs::read_to_string(&manifest).unwrap(), "old");
        updater.commit().unwrap();

        assert_eq!(std::fs::read_to_string(&manifest).unwrap(), "manifest");
        assert_eq!(std::fs::read_to_string(&requirements).unwrap(), "requirements");
        assert!(!temp_dir.path().join("requirements.txt.tmp").exists());
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("missing").join("pyproject.toml");
        assert!(FileUpdater::write(&file_path, "x").is_err());
    }
}
