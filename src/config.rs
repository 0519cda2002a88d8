use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::sampler::Filter;
use crate::error::ConfigError;

/// Prefix for environment overrides, e.g. `FB_PRESENT_LINEAR_FILTERING=1`
pub const ENV_PREFIX: &str = "FB_PRESENT_";

/// Presentation preferences read by the renderers every frame
///
/// Renderers never mutate this; callers swap it in with `set_config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentConfig {
    /// Bilinear sampling instead of nearest
    pub linear_filtering: bool,
    /// Stretch to the whole display instead of letterboxing
    pub ignore_aspect_ratio: bool,
    /// Force (or forbid) the 16-bit upload path. `None` lets the backend decide.
    pub prefer_rgb565: Option<bool>,
    /// Full GPU wait every N frames; 0 never waits explicitly
    pub sync_every: u32,
    /// Tile-swizzle console textures before upload
    pub swizzle: bool,
    /// Vertical-blank synchronized presentation
    pub vsync: bool,
}

impl Default for PresentConfig {
    fn default() -> Self {
        Self {
            linear_filtering: false,
            ignore_aspect_ratio: false,
            prefer_rgb565: None,
            sync_every: 0,
            swizzle: false,
            vsync: true,
        }
    }
}

impl PresentConfig {
    pub fn aspect_locked(&self) -> bool {
        !self.ignore_aspect_ratio
    }

    pub fn filter(&self) -> Filter {
        Filter::from_linear(self.linear_filtering)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file; missing fields keep their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Apply `FB_PRESENT_*` overrides from the process environment
    pub fn with_process_env(self) -> Result<Self, ConfigError> {
        self.with_env_overrides(std::env::vars())
    }

    /// Apply overrides from arbitrary key/value pairs; unknown keys are ignored
    pub fn with_env_overrides<I>(mut self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            let Some(key) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match key {
                "LINEAR_FILTERING" => self.linear_filtering = parse_flag(&name, &value)?,
                "IGNORE_ASPECT_RATIO" => self.ignore_aspect_ratio = parse_flag(&name, &value)?,
                "PREFER_RGB565" => self.prefer_rgb565 = Some(parse_flag(&name, &value)?),
                "SWIZZLE" => self.swizzle = parse_flag(&name, &value)?,
                "VSYNC" => self.vsync = parse_flag(&name, &value)?,
                "SYNC_EVERY" => {
                    self.sync_every = value.trim().parse().map_err(|_| invalid(&name, &value))?
                }
                _ => log::debug!("ignoring unknown override {}", name),
            }
        }
        Ok(self)
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(name, value)),
    }
}

fn invalid(name: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnv {
        name: name.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_lock_aspect_and_use_nearest() {
        let config = PresentConfig::default();
        assert!(config.aspect_locked());
        assert_eq!(config.filter(), Filter::Nearest);
        assert!(config.vsync);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = PresentConfig::from_json_str(r#"{ "linear_filtering": true }"#).unwrap();
        assert!(config.linear_filtering);
        assert_eq!(config.sync_every, 0);
        assert_eq!(config.prefer_rgb565, None);
    }

    #[test]
    fn env_overrides_apply() {
        let config = PresentConfig::default()
            .with_env_overrides(vars(&[
                ("FB_PRESENT_IGNORE_ASPECT_RATIO", "yes"),
                ("FB_PRESENT_SYNC_EVERY", "4"),
                ("FB_PRESENT_PREFER_RGB565", "0"),
                ("PATH", "/usr/bin"),
            ]))
            .unwrap();
        assert!(!config.aspect_locked());
        assert_eq!(config.sync_every, 4);
        assert_eq!(config.prefer_rgb565, Some(false));
    }

    #[test]
    fn bad_env_value_is_rejected() {
        let err = PresentConfig::default()
            .with_env_overrides(vars(&[("FB_PRESENT_VSYNC", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));
    }
}
