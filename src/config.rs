//! Site configuration
//!
//! Resolution order: an explicit `--config` path, then `glint.yaml` in the
//! site root, then `~/.config/glint/config.yaml`, then built-in defaults.
//! A missing file is fine; a malformed one is a hard error, because a
//! silently-defaulted allow-list would highlight the wrong languages.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::syntax::AllowList;

/// Name of the per-site config file, looked up in the site root
pub const SITE_CONFIG_FILE: &str = "glint.yaml";

/// Site configuration for a highlight run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Ordered language allow-list (identifiers as in class hints)
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    /// Prefix for emitted CSS classes (e.g. `hl-` gives `hl-keyword`)
    #[serde(default = "default_class_prefix")]
    pub class_prefix: String,

    /// Auto-detect languages for untagged blocks
    #[serde(default = "default_detect")]
    pub detect: bool,
}

fn default_languages() -> Vec<String> {
    AllowList::DEFAULT.iter().map(|s| s.to_string()).collect()
}

fn default_class_prefix() -> String {
    "hl-".to_string()
}

fn default_detect() -> bool {
    true
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            class_prefix: default_class_prefix(),
            detect: default_detect(),
        }
    }
}

impl SiteConfig {
    /// Load config, resolving against the site root.
    ///
    /// `explicit` is the `--config` argument; pointing it at a missing file
    /// is an error. The fallback locations may simply not exist.
    pub fn load(explicit: Option<&Path>, site_root: &Path) -> Result<Self> {
        Self::load_with_user_config(
            explicit,
            site_root,
            crate::config_paths::config_file().as_deref(),
        )
    }

    /// `load` with the user-config fallback made explicit. Tests point it
    /// inside a tempdir so a developer's real config can't leak in.
    pub fn load_with_user_config(
        explicit: Option<&Path>,
        site_root: &Path,
        user_config: Option<&Path>,
    ) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::read(path)
                .with_context(|| format!("Failed to load config from {}", path.display()));
        }

        let site_config = site_root.join(SITE_CONFIG_FILE);
        if site_config.exists() {
            return Self::read(&site_config)
                .with_context(|| format!("Failed to load config from {}", site_config.display()));
        }

        if let Some(user_config) = user_config {
            if user_config.exists() {
                return Self::read(user_config).with_context(|| {
                    format!("Failed to load config from {}", user_config.display())
                });
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Resolve the configured identifiers into a validated allow-list
    pub fn allow_list(&self) -> Result<AllowList> {
        AllowList::parse(&self.languages)
    }
}
