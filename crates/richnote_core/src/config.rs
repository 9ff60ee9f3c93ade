//! Core configuration.
//!
//! # Responsibility
//! - Hold editor tunables (default style, font step, font floor).
//! - Resolve process-level settings (database path, logging) from the
//!   environment with deterministic fallbacks.

use crate::logging::default_log_level;
use crate::model::style::StyleAttributes;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DB_PATH_ENV: &str = "RICHNOTE_DB_PATH";
const LOG_LEVEL_ENV: &str = "RICHNOTE_LOG_LEVEL";
const LOG_DIR_ENV: &str = "RICHNOTE_LOG_DIR";
const DEFAULT_DB_FILE_NAME: &str = "richnote.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "richnote-logs";

/// Points added or removed by one font-size step.
pub const DEFAULT_FONT_STEP: f64 = 2.0;
/// Smallest font size a decrement can reach.
pub const DEFAULT_MIN_FONT_SIZE: f64 = 8.0;

/// Editing behavior shared by every formatting session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Style of new notes and of typing into empty text.
    pub default_style: StyleAttributes,
    pub font_step: f64,
    pub min_font_size: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_style: StyleAttributes::default(),
            font_step: DEFAULT_FONT_STEP,
            min_font_size: DEFAULT_MIN_FONT_SIZE,
        }
    }
}

impl EditorConfig {
    /// Size reached from `baseline` after `steps` font steps.
    ///
    /// Decrements stop at `min_font_size`; a baseline already below the
    /// floor is never enlarged by a decrement.
    pub fn stepped_font_size(&self, baseline: f64, steps: i32) -> f64 {
        let floor = self.min_font_size.min(baseline);
        (baseline + f64::from(steps) * self.font_step).max(floor)
    }
}

/// Process-level configuration for hosts embedding the core.
#[derive(Debug, Clone, PartialEq)]
pub struct CoreConfig {
    pub editor: EditorConfig,
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
}

impl CoreConfig {
    /// Resolves configuration from `RICHNOTE_*` environment variables.
    ///
    /// Blank or missing values fall back to files under the system temp dir
    /// and the build-mode default log level.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        Self {
            editor: EditorConfig::default(),
            db_path: non_blank(DB_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
            log_level: non_blank(LOG_LEVEL_ENV)
                .unwrap_or_else(|| default_log_level().to_string()),
            log_dir: non_blank(LOG_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, EditorConfig};
    use std::path::PathBuf;

    #[test]
    fn stepped_font_size_clamps_at_floor() {
        let config = EditorConfig::default();
        assert_eq!(config.stepped_font_size(16.0, 1), 18.0);
        assert_eq!(config.stepped_font_size(16.0, -3), 10.0);
        assert_eq!(config.stepped_font_size(10.0, -5), 8.0);
    }

    #[test]
    fn decrement_below_floor_keeps_baseline() {
        let config = EditorConfig::default();
        assert_eq!(config.stepped_font_size(6.0, -1), 6.0);
        assert_eq!(config.stepped_font_size(6.0, 1), 8.0);
        assert_eq!(config.stepped_font_size(6.0, 0), 6.0);
    }

    #[test]
    fn editor_config_fills_missing_fields() {
        let config: EditorConfig = serde_json::from_str(r#"{"font_step":1.5}"#).unwrap();
        assert_eq!(config.font_step, 1.5);
        assert_eq!(config.min_font_size, 8.0);
    }

    #[test]
    fn blank_env_values_fall_back() {
        let config = CoreConfig::from_lookup(|key| match key {
            "RICHNOTE_DB_PATH" => Some("  /data/notes.sqlite3 ".to_string()),
            "RICHNOTE_LOG_LEVEL" => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.db_path, PathBuf::from("/data/notes.sqlite3"));
        assert!(!config.log_level.is_empty());
        assert!(config.log_dir.ends_with("richnote-logs"));
    }
}
