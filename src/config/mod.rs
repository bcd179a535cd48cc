mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = ["./clipgif.toml", "~/.config/clipgif/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.limits.max_bytes == 0 {
        anyhow::bail!("limits.max_bytes cannot be 0");
    }
    if config.limits.max_frames == 0 {
        anyhow::bail!("limits.max_frames cannot be 0");
    }

    let levels = i64::from(config.quality.bayer_scale.levels());
    if !(1..=levels).contains(&config.defaults.quality) {
        anyhow::bail!(
            "defaults.quality is {} but the quality table has {} levels",
            config.defaults.quality,
            levels
        );
    }

    config
        .defaults
        .dither
        .parse::<clipgif_common::DitherMode>()
        .map_err(|e| anyhow::anyhow!("defaults.dither: {}", e))?;

    if config.invoke.timeout_secs == Some(0) {
        anyhow::bail!("invoke.timeout_secs cannot be 0; omit it to disable the timeout");
    }

    if let Some(dir) = &config.output.dir {
        if !dir.is_dir() {
            tracing::warn!("Output directory does not exist: {:?}", dir);
        }
    }

    for path in [&config.tools.ffmpeg_path, &config.tools.ffprobe_path]
        .into_iter()
        .flatten()
    {
        if !path.exists() {
            tracing::warn!("Configured tool does not exist: {:?}", path);
        }
    }

    Ok(())
}
