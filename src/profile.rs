// src/profile.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Lowest-priority fallback values for token and channel, loaded from a
/// named per-user profile file.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub channel: String,
}

/// Path of a named profile: `<config>/slack-quickpost/<name>.toml`.
pub fn profile_path(name: &str) -> Result<PathBuf> {
    let base = dirs::config_dir().context("could not determine the user config directory")?;
    Ok(base.join("slack-quickpost").join(format!("{name}.toml")))
}

pub fn load_profile(path: &Path) -> Result<Profile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read profile {}", path.display()))?;
    let profile: Profile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse profile {}", path.display()))?;
    Ok(profile)
}
