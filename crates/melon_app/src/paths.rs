//! Where settings live on disk.

use anyhow::{Context, Result};
use directories_next::ProjectDirs;
use melon_core::Settings;
use std::path::PathBuf;

pub fn settings_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("id", "MelonCheck", "MelonCheck")
        .context("cannot determine the configuration directory")?;
    Ok(dirs.config_dir().join("settings.toml"))
}

/// Settings from disk plus environment overrides, and the path to save them to.
///
/// Problems are logged and fall back to defaults so the window always opens.
pub fn load_settings() -> (Settings, Option<PathBuf>) {
    let path = match settings_path() {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!("settings will not be persisted: {e:#}");
            return (Settings::default().with_env_overrides(), None);
        }
    };
    let settings = Settings::load_from(&path).unwrap_or_else(|e| {
        tracing::warn!("ignoring {}: {e}", path.display());
        Settings::default()
    });
    (settings.with_env_overrides(), Some(path))
}
