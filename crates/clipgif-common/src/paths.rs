//! Path utilities for output naming.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Extension of every produced file.
pub const GIF_EXTENSION: &str = "gif";

/// Check if a path has a `.gif` extension (case-insensitive).
pub fn is_gif_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(GIF_EXTENSION))
}

/// Append `.gif` unless the path already ends with it.
///
/// An existing different extension is kept as part of the name, so
/// `out.mp4` becomes `out.mp4.gif`.
///
/// ```
/// use std::path::{Path, PathBuf};
/// use clipgif_common::paths::ensure_gif_extension;
///
/// assert_eq!(ensure_gif_extension(Path::new("a/b")), PathBuf::from("a/b.gif"));
/// assert_eq!(ensure_gif_extension(Path::new("a/b.GIF")), PathBuf::from("a/b.GIF"));
/// ```
pub fn ensure_gif_extension(path: &Path) -> PathBuf {
    if is_gif_file(path) {
        return path.to_path_buf();
    }
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(GIF_EXTENSION);
    PathBuf::from(name)
}

/// The `index`-th output candidate for `stem` inside `dir`.
///
/// Index 0 is the plain name; later indices carry a `_(n)` suffix.
///
/// ```
/// use std::path::{Path, PathBuf};
/// use clipgif_common::paths::output_candidate;
///
/// let dir = Path::new("/out");
/// assert_eq!(output_candidate(dir, "clip", 0), PathBuf::from("/out/clip.gif"));
/// assert_eq!(output_candidate(dir, "clip", 2), PathBuf::from("/out/clip_(2).gif"));
/// ```
pub fn output_candidate(dir: &Path, stem: &str, index: u64) -> PathBuf {
    if index == 0 {
        dir.join(format!("{stem}.{GIF_EXTENSION}"))
    } else {
        dir.join(format!("{stem}_({index}).{GIF_EXTENSION}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_gif_file() {
        assert!(is_gif_file(Path::new("out.gif")));
        assert!(is_gif_file(Path::new("OUT.GIF")));
        assert!(!is_gif_file(Path::new("out.png")));
        assert!(!is_gif_file(Path::new("gif")));
    }

    #[test]
    fn test_ensure_gif_extension_keeps_other_extensions() {
        assert_eq!(
            ensure_gif_extension(Path::new("/tmp/out.mp4")),
            PathBuf::from("/tmp/out.mp4.gif")
        );
    }

    #[test]
    fn test_output_candidates_are_distinct() {
        let dir = Path::new("/out");
        let first = output_candidate(dir, "my clip", 0);
        let tenth = output_candidate(dir, "my clip", 10);
        assert_eq!(first, PathBuf::from("/out/my clip.gif"));
        assert_eq!(tenth, PathBuf::from("/out/my clip_(10).gif"));
    }
}
