//! Motion manager settings
//!
//! Loaded from a `kinetic.toml`-style file or built in code. Every field has
//! a default, so an empty file is valid:
//!
//! ```toml
//! initial_capacity = 256
//! parallel_batch_size = 16
//! parallel_threshold = 64
//! default_ease = "out_cubic"
//! default_time_kind = "unscaled_time"
//! skip_values_during_delay = false
//! cancel_on_error = true
//! ```

use crate::easing::Ease;
use anyhow::{Context, Result};
use kinetic_core::MotionTimeKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Manager-wide defaults and batch tuning
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct MotionSettings {
    /// Records reserved per storage when it is created
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,
    /// Records stepped per parallel task
    #[serde(default = "default_parallel_batch_size")]
    pub parallel_batch_size: usize,
    /// Live records a storage needs before stepping goes parallel
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
    /// Ease for builders that do not set one
    #[serde(default)]
    pub default_ease: Ease,
    /// Time kind for builders that do not set one
    #[serde(default)]
    pub default_time_kind: MotionTimeKind,
    #[serde(default)]
    pub skip_values_during_delay: bool,
    #[serde(default)]
    pub cancel_on_error: bool,
}

fn default_initial_capacity() -> usize {
    16
}

fn default_parallel_batch_size() -> usize {
    16
}

fn default_parallel_threshold() -> usize {
    64
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            initial_capacity: default_initial_capacity(),
            parallel_batch_size: default_parallel_batch_size(),
            parallel_threshold: default_parallel_threshold(),
            default_ease: Ease::default(),
            default_time_kind: MotionTimeKind::default(),
            skip_values_during_delay: false,
            cancel_on_error: false,
        }
    }
}

impl MotionSettings {
    /// Parse settings from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: MotionSettings =
            toml::from_str(content).context("Failed to parse motion settings")?;
        Ok(settings.sanitized())
    }

    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let settings: MotionSettings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(settings.sanitized())
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize motion settings")
    }

    fn sanitized(mut self) -> Self {
        self.parallel_batch_size = self.parallel_batch_size.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let settings = MotionSettings::from_toml_str("").unwrap();
        assert_eq!(settings, MotionSettings::default());
        assert_eq!(settings.parallel_batch_size, 16);
    }

    #[test]
    fn test_parse_all_fields() {
        let settings = MotionSettings::from_toml_str(
            r#"
            initial_capacity = 256
            parallel_batch_size = 0
            parallel_threshold = 8
            default_ease = "out_cubic"
            default_time_kind = "realtime"
            skip_values_during_delay = true
            cancel_on_error = true
            "#,
        )
        .unwrap();

        assert_eq!(settings.initial_capacity, 256);
        assert_eq!(settings.parallel_batch_size, 1);
        assert_eq!(settings.parallel_threshold, 8);
        assert_eq!(settings.default_ease, Ease::OutCubic);
        assert_eq!(settings.default_time_kind, MotionTimeKind::Realtime);
        assert!(settings.skip_values_during_delay);
        assert!(settings.cancel_on_error);
    }

    #[test]
    fn test_invalid_toml_reports_context() {
        let error = MotionSettings::from_toml_str("parallel_threshold = \"many\"").unwrap_err();
        assert!(error.to_string().contains("Failed to parse motion settings"));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let error = MotionSettings::load(Path::new("/nonexistent/kinetic.toml")).unwrap_err();
        assert!(error.to_string().contains("/nonexistent/kinetic.toml"));
    }

    #[test]
    fn test_toml_round_trip() {
        let settings = MotionSettings {
            default_ease: Ease::InOutBack,
            cancel_on_error: true,
            ..MotionSettings::default()
        };
        let text = settings.to_toml().unwrap();
        assert_eq!(MotionSettings::from_toml_str(&text).unwrap(), settings);
    }
}
