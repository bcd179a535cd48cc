//! Scoped workspace for a single conversion.
//!
//! A [`Workspace`] owns a temporary directory holding intermediate files
//! (the palette) and the staged output. Dropping it removes everything it
//! holds, so cancelled or failed conversions leave nothing behind. On success
//! [`Workspace::finalize`] moves the staged output to its destination.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use clipgif_common::{Error, Result};
use tempfile::TempDir;

/// Prefix of every workspace directory.
const PREFIX: &str = "clipgif-";

/// Workspace for one conversion.
///
/// # Example
///
/// ```no_run
/// use clipgif_av::Workspace;
/// use std::path::Path;
///
/// let workspace = Workspace::new(Path::new("/out/clip.gif")).unwrap();
/// // ... ffmpeg writes to workspace.output() ...
/// workspace.finalize(Path::new("/out/clip.gif")).unwrap();
/// ```
#[derive(Debug)]
pub struct Workspace {
    temp_dir: TempDir,
    output_name: PathBuf,
}

impl Workspace {
    /// Create a workspace in the system temp directory for producing `output`.
    pub fn new(output: &Path) -> Result<Self> {
        Self::new_in(&std::env::temp_dir(), output)
    }

    /// Create a workspace below `root` for producing `output`.
    pub fn new_in(root: &Path, output: &Path) -> Result<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix(PREFIX)
            .tempdir_in(root)
            .map_err(|e| Error::resource(root, format!("failed to create temp dir: {e}")))?;

        let output_name = output
            .file_name()
            .unwrap_or_else(|| OsStr::new("output.gif"))
            .into();

        tracing::debug!("created workspace {}", temp_dir.path().display());
        Ok(Self {
            temp_dir,
            output_name,
        })
    }

    /// Path to the temporary directory.
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a path for a named temporary file inside the workspace.
    pub fn temp_file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// The staged output path (destination's file name, inside the temp dir).
    pub fn output(&self) -> PathBuf {
        self.temp_dir.path().join(&self.output_name)
    }

    /// Move the staged output to `dest` and remove the workspace.
    ///
    /// Tries a rename first and falls back to copy + remove across
    /// filesystems. An existing file at `dest` is never replaced; a partial
    /// copy is removed before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resource`] if nothing was staged, if `dest` already
    /// exists, or if the move fails.
    pub fn finalize(self, dest: &Path) -> Result<PathBuf> {
        let staged = self.output();

        if !staged.is_file() {
            return Err(Error::resource(
                &staged,
                "the encoder produced no output file",
            ));
        }
        if dest.exists() {
            return Err(Error::resource(dest, "destination already exists"));
        }

        if std::fs::rename(&staged, dest).is_err() {
            if let Err(e) = std::fs::copy(&staged, dest) {
                let _ = std::fs::remove_file(dest);
                return Err(Error::resource(
                    dest,
                    format!("failed to copy output to destination: {e}"),
                ));
            }
            let _ = std::fs::remove_file(&staged);
        }

        tracing::debug!("moved {} to {}", staged.display(), dest.display());
        Ok(dest.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn workspace_paths() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::new_in(root.path(), Path::new("/out/clip.gif")).unwrap();

        assert!(ws.temp_dir().starts_with(root.path()));
        assert!(ws.output().starts_with(ws.temp_dir()));
        assert_eq!(ws.output().file_name().unwrap(), "clip.gif");
    }

    #[test]
    fn temp_file_inside_workspace() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::new_in(root.path(), Path::new("clip.gif")).unwrap();
        let tf = ws.temp_file("palette.png");
        assert!(tf.starts_with(ws.temp_dir()));
        assert_eq!(tf.file_name().unwrap(), "palette.png");
    }

    #[test]
    fn finalize_moves_output() {
        let root = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let dest = out_dir.path().join("clip.gif");

        let ws = Workspace::new_in(root.path(), &dest).unwrap();
        fs::write(ws.output(), b"GIF89a").unwrap();
        let temp = ws.temp_dir().to_path_buf();

        let result = ws.finalize(&dest).unwrap();
        assert_eq!(result, dest);
        assert_eq!(fs::read(&dest).unwrap(), b"GIF89a");
        assert!(!temp.exists());
    }

    #[test]
    fn finalize_refuses_to_overwrite() {
        let root = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let dest = out_dir.path().join("clip.gif");
        fs::write(&dest, b"existing").unwrap();

        let ws = Workspace::new_in(root.path(), &dest).unwrap();
        fs::write(ws.output(), b"GIF89a").unwrap();

        let err = ws.finalize(&dest).unwrap_err();
        assert!(matches!(err, Error::Resource { .. }));
        assert_eq!(fs::read(&dest).unwrap(), b"existing");
    }

    #[test]
    fn finalize_without_output_fails() {
        let root = tempfile::tempdir().unwrap();
        let dest = root.path().join("never.gif");
        let ws = Workspace::new_in(root.path(), &dest).unwrap();
        assert!(ws.finalize(&dest).is_err());
        assert!(!dest.exists());
    }

    #[test]
    fn drop_removes_temp_dir() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::new_in(root.path(), Path::new("clip.gif")).unwrap();
        fs::write(ws.temp_file("palette.png"), b"png").unwrap();
        let temp = ws.temp_dir().to_path_buf();
        drop(ws);
        assert!(!temp.exists());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
