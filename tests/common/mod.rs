//! Shared helpers for integration tests.
//!
//! Provides GIF fixtures written with the `gif` encoder, dummy source clips,
//! and (on Unix) fake ffmpeg/ffprobe shell scripts.

#![allow(dead_code)]

use std::borrow::Cow;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Write a GIF with `frames` 2x2 frames.
pub fn write_gif(path: &Path, frames: usize) {
    let file = File::create(path).unwrap();
    let palette = [0u8, 0, 0, 255, 255, 255];
    let mut encoder = gif::Encoder::new(file, 2, 2, &palette).unwrap();
    for i in 0..frames {
        let mut frame = gif::Frame::default();
        frame.width = 2;
        frame.height = 2;
        frame.buffer = Cow::Owned(vec![(i % 2) as u8; 4]);
        encoder.write_frame(&frame).unwrap();
    }
}

/// Write a GIF with `frames` frames, zero-padded after the trailer to
/// exactly `size` bytes.
pub fn write_padded_gif(path: &Path, frames: usize, size: u64) {
    write_gif(path, frames);
    let file = fs::OpenOptions::new().write(true).open(path).unwrap();
    assert!(file.metadata().unwrap().len() <= size);
    file.set_len(size).unwrap();
}

/// Create a placeholder source clip. Its content is never decoded.
pub fn write_source(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"\x00\x00\x00\x18ftypmp42").unwrap();
    path
}

pub fn dir_is_empty(dir: &Path) -> bool {
    fs::read_dir(dir).map(|mut d| d.next().is_none()).unwrap_or(true)
}

/// Poll `cond` every 20ms until it holds or `timeout` passes.
pub async fn eventually(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    cond()
}

#[cfg(unix)]
pub mod fake {
    use std::fs;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// Write an executable `/bin/sh` script named `name` into `dir`.
    pub fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        {
            let mut file = fs::File::create(&path).unwrap();
            writeln!(file, "#!/bin/sh").unwrap();
            file.write_all(body.as_bytes()).unwrap();
            file.sync_all().unwrap();
        }
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// ffmpeg that records its arguments to `args_log`, emits a progress
    /// block, and copies `fixture` to its last argument.
    pub fn ffmpeg_success(dir: &Path, fixture: &Path, args_log: &Path) -> PathBuf {
        script(
            dir,
            "ffmpeg",
            &format!(
                r#"echo "$@" >> "{args}"
for last; do :; done
echo "frame=10" >&2
echo "out_time_us=1000000" >&2
echo "progress=continue" >&2
echo "progress=end" >&2
cp "{fixture}" "$last"
"#,
                args = args_log.display(),
                fixture = fixture.display()
            ),
        )
    }

    /// ffmpeg that fails like a corrupt input would.
    pub fn ffmpeg_failure(dir: &Path) -> PathBuf {
        script(
            dir,
            "ffmpeg",
            "echo 'clip.mp4: Invalid data found when processing input' >&2\nexit 3\n",
        )
    }

    /// ffmpeg that writes its pid to `pid_file` and then hangs.
    pub fn ffmpeg_hang(dir: &Path, pid_file: &Path) -> PathBuf {
        script(
            dir,
            "ffmpeg",
            &format!("echo $$ > \"{}\"\nexec sleep 30\n", pid_file.display()),
        )
    }

    /// ffprobe reporting a source of `seconds` length.
    pub fn ffprobe_length(dir: &Path, seconds: f64) -> PathBuf {
        script(
            dir,
            "ffprobe",
            &format!(
                "echo '{{\"format\": {{\"format_name\": \"mov,mp4\", \"duration\": \"{seconds}\"}}, \"streams\": []}}'\n"
            ),
        )
    }

    /// Read a pid written by [`ffmpeg_hang`], if present yet.
    pub fn read_pid(pid_file: &Path) -> Option<u32> {
        fs::read_to_string(pid_file).ok()?.trim().parse().ok()
    }

    pub fn process_alive(pid: u32) -> bool {
        std::process::Command::new("kill")
            .arg("-0")
            .arg(pid.to_string())
            .stderr(std::process::Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}
