use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{
    error::{Error, Result},
    schema::TempVoiceConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "tempvoice.toml",
    "tempvoice.yaml",
    "tempvoice.yml",
    "tempvoice.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<TempVoiceConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./tempvoice.{toml,yaml,yml,json}` (working directory)
/// 2. `~/.config/tempvoice/tempvoice.{toml,yaml,yml,json}` (user-global)
///
/// Returns `TempVoiceConfig::default()` if no config file is found. A file
/// that exists but cannot be parsed is an error: the bot must not run with
/// a configuration the operator did not intend.
pub fn discover_and_load() -> Result<TempVoiceConfig> {
    match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path)
        },
        None => {
            debug!("no config file found, using defaults");
            Ok(TempVoiceConfig::default())
        },
    }
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    find_in(Path::new("."))
        .or_else(|| config_dir().and_then(|dir| find_in(&dir)))
}

fn find_in(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/tempvoice/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "tempvoice").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> Result<TempVoiceConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => toml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "json" => serde_json::from_str(raw).map_err(|e| Error::parse(path, e)),
        _ => Err(Error::UnsupportedFormat {
            extension: ext.to_string(),
        }),
    }
}
