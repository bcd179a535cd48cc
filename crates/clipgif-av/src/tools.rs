//! External tool detection and management.
//!
//! The [`ToolRegistry`] discovers and caches the locations of ffmpeg and
//! ffprobe. Each tool is resolved from, in order: an explicitly configured
//! path, a bundled copy shipped next to the executable
//! (`lib/windows/<tool>.exe` or `lib/mac/<tool>`), and finally `PATH`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clipgif_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Name of the transcoding tool.
pub const FFMPEG: &str = "ffmpeg";
/// Name of the probing tool.
pub const FFPROBE: &str = "ffprobe";

/// Known tool names that the registry manages.
const KNOWN_TOOLS: &[&str] = &[FFMPEG, FFPROBE];

/// Tool location settings, usually read from the `[tools]` config section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Explicit ffmpeg location.
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,
    /// Explicit ffprobe location.
    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,
    /// Directory containing the bundled `lib/` tree. Defaults to the
    /// directory of the running executable.
    #[serde(default)]
    pub bundle_dir: Option<PathBuf>,
    /// Fall back to searching `PATH`.
    #[serde(default = "default_search_path")]
    pub search_path: bool,
}

fn default_search_path() -> bool {
    true
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            bundle_dir: None,
            search_path: default_search_path(),
        }
    }
}

impl ToolsConfig {
    fn configured_path(&self, name: &str) -> Option<&Path> {
        match name {
            FFMPEG => self.ffmpeg_path.as_deref(),
            FFPROBE => self.ffprobe_path.as_deref(),
            _ => None,
        }
    }
}

/// Host platform, which decides where bundled tools live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Other,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Other
        }
    }

    /// Location of a bundled tool below `bundle_dir`, if this platform
    /// ships one. Other platforms rely on `PATH`.
    pub fn bundled_tool_path(&self, bundle_dir: &Path, name: &str) -> Option<PathBuf> {
        match self {
            Platform::Windows => Some(
                bundle_dir
                    .join("lib")
                    .join("windows")
                    .join(format!("{name}.exe")),
            ),
            Platform::MacOs => Some(bundle_dir.join("lib").join("mac").join(name)),
            Platform::Other => None,
        }
    }
}

/// A resolved external tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Tool name (e.g. "ffmpeg").
    pub name: String,
    /// Resolved path to the executable.
    pub path: PathBuf,
}

/// Availability information for a tool, returned by [`ToolRegistry::check_all`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name.
    pub name: String,
    /// Whether the tool was found.
    pub available: bool,
    /// Version string (first line of `-version` output), if available.
    pub version: Option<String>,
    /// Resolved path to the executable.
    pub path: Option<PathBuf>,
}

/// Registry holding discovered tool locations.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolConfig>,
}

impl ToolRegistry {
    /// Discover tools for the current platform.
    pub fn discover(config: &ToolsConfig) -> Self {
        let bundle_dir = config.bundle_dir.clone().or_else(executable_dir);
        Self::discover_for(config, Platform::current(), bundle_dir.as_deref())
    }

    /// Discover tools as they would be resolved on `platform`.
    ///
    /// Tools that cannot be found are omitted; [`ToolRegistry::require`]
    /// reports them as missing.
    pub fn discover_for(config: &ToolsConfig, platform: Platform, bundle_dir: Option<&Path>) -> Self {
        let mut tools = HashMap::new();

        for &name in KNOWN_TOOLS {
            let configured = config.configured_path(name).filter(|p| p.is_file());
            if let Some(p) = config.configured_path(name) {
                if configured.is_none() {
                    tracing::warn!("configured {} path does not exist: {}", name, p.display());
                }
            }

            let bundled = || {
                bundle_dir
                    .and_then(|dir| platform.bundled_tool_path(dir, name))
                    .filter(|p| p.is_file())
            };

            let resolved = configured
                .map(Path::to_path_buf)
                .or_else(bundled)
                .or_else(|| {
                    if config.search_path {
                        which::which(name).ok()
                    } else {
                        None
                    }
                });

            match resolved {
                Some(path) => {
                    tracing::debug!("resolved {} at {}", name, path.display());
                    tools.insert(
                        name.to_string(),
                        ToolConfig {
                            name: name.to_string(),
                            path,
                        },
                    );
                }
                None => tracing::debug!("{} not found", name),
            }
        }

        Self { tools }
    }

    /// A registry with no tools.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register `name` at an explicit `path`, replacing any earlier entry.
    pub fn with_tool(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.tools.insert(
            name.to_string(),
            ToolConfig {
                name: name.to_string(),
                path: path.into(),
            },
        );
        self
    }

    /// Look up a tool without requiring it.
    pub fn get(&self, name: &str) -> Option<&ToolConfig> {
        self.tools.get(name)
    }

    /// Return the [`ToolConfig`] for `name`, or [`Error::ToolNotFound`] if it
    /// was not discovered or its executable has since disappeared.
    pub fn require(&self, name: &str) -> Result<&ToolConfig> {
        match self.tools.get(name) {
            Some(tool) if tool.path.is_file() => Ok(tool),
            Some(tool) => {
                tracing::warn!("{} vanished from {}", name, tool.path.display());
                Err(Error::tool_not_found(name))
            }
            None => Err(Error::tool_not_found(name)),
        }
    }

    /// Check all known tools and return availability information.
    pub fn check_all(&self) -> Vec<ToolInfo> {
        KNOWN_TOOLS
            .iter()
            .map(|&name| match self.tools.get(name) {
                Some(cfg) => ToolInfo {
                    name: name.to_string(),
                    available: cfg.path.is_file(),
                    version: detect_version(&cfg.path),
                    path: Some(cfg.path.clone()),
                },
                None => ToolInfo {
                    name: name.to_string(),
                    available: false,
                    version: None,
                    path: None,
                },
            })
            .collect()
    }
}

fn executable_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()?
        .parent()
        .map(Path::to_path_buf)
}

/// Run `<tool> -version` and return the first line of stdout.
fn detect_version(path: &Path) -> Option<String> {
    let output = std::process::Command::new(path)
        .arg("-version")
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.to_string())
}
