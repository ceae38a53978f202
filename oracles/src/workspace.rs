//! Per-session scratch directory for candidate and subject files.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::toolchain::ToolError;

/// Owns a temporary directory holding the candidate transform and the
/// subject file it is applied to. Removed from disk on drop, whichever
/// way the session ends.
#[derive(Debug)]
pub struct ScratchWorkspace {
    dir: TempDir,
    candidate_path: PathBuf,
    subject_path: PathBuf,
}

impl ScratchWorkspace {
    /// Create a workspace under `parent` (or the system temp dir).
    pub fn create(session_id: &str, parent: Option<&Path>) -> Result<Self, ToolError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("codemod-session-");
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        let candidate_path = dir.path().join(format!("codemod-{session_id}.ts"));
        let subject_path = dir.path().join(format!("actual.codemod-{session_id}.tsx"));
        Ok(Self {
            dir,
            candidate_path,
            subject_path,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of the candidate transform file.
    pub fn candidate_path(&self) -> &Path {
        &self.candidate_path
    }

    /// Absolute path of the subject file rewritten in place.
    pub fn subject_path(&self) -> &Path {
        &self.subject_path
    }

    pub fn write_candidate(&self, source: &str) -> Result<(), ToolError> {
        fs::write(&self.candidate_path, source)?;
        Ok(())
    }

    /// Reset the subject to `input`, discarding any previous output.
    pub fn write_subject(&self, input: &str) -> Result<(), ToolError> {
        fs::write(&self.subject_path, input)?;
        Ok(())
    }

    /// Current subject contents, or `None` if the file is missing.
    pub fn read_subject(&self) -> Option<String> {
        fs::read_to_string(&self.subject_path).ok()
    }

    /// Drop the subject so a crashed tool cannot leave stale output behind.
    pub fn clear_subject(&self) -> Result<(), ToolError> {
        match fs::remove_file(&self.subject_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_live_inside_root() {
        let parent = tempfile::tempdir().unwrap();
        let ws = ScratchWorkspace::create("abc", Some(parent.path())).unwrap();
        assert!(ws.candidate_path().starts_with(ws.root()));
        assert!(ws.subject_path().starts_with(ws.root()));
        assert!(ws.candidate_path().ends_with("codemod-abc.ts"));
    }

    #[test]
    fn test_round_trip_subject() {
        let ws = ScratchWorkspace::create("s1", None).unwrap();
        assert_eq!(ws.read_subject(), None);
        ws.write_subject("let a = 1;").unwrap();
        assert_eq!(ws.read_subject().as_deref(), Some("let a = 1;"));
        ws.clear_subject().unwrap();
        ws.clear_subject().unwrap();
        assert_eq!(ws.read_subject(), None);
    }

    #[test]
    fn test_directory_removed_on_drop() {
        let ws = ScratchWorkspace::create("gone", None).unwrap();
        ws.write_candidate("export default () => {};").unwrap();
        let root = ws.root().to_path_buf();
        assert!(root.exists());
        drop(ws);
        assert!(!root.exists());
    }
}
