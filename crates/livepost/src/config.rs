//! Configuration, loaded in layers: environment variables override the TOML
//! file, which overrides compiled defaults.
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `previewable_post_types` | `["post", "page"]` | Subtypes whose records may be edited in the live preview |
//! | `date_format` | `%Y-%m-%d %H:%M:%S` | Format accepted for client-submitted post dates |

use std::path::Path;

use confique::Config;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::DATETIME_FORMAT;

fn default_post_types() -> Vec<String> {
    vec!["post".to_string(), "page".to_string()]
}

/// Configuration for the live-preview settings subsystem.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LivepostConfig {
    /// Post types whose fields can be staged and previewed.
    /// When absent, defaults to `["post", "page"]`.
    pub previewable_post_types: Option<Vec<String>>,

    /// strftime-style format accepted for client-submitted post dates.
    #[config(env = "LIVEPOST_DATE_FORMAT", default = "%Y-%m-%d %H:%M:%S")]
    pub date_format: String,
}

impl Default for LivepostConfig {
    fn default() -> Self {
        Self {
            previewable_post_types: None,
            date_format: DATETIME_FORMAT.to_string(),
        }
    }
}

impl LivepostConfig {
    /// Load from an optional TOML file plus the environment.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = <Self as Config>::builder().env();
        if let Some(path) = file {
            builder = builder.file(path);
        }
        Ok(builder.load()?)
    }

    /// Previewable post types, using defaults if not configured.
    pub fn previewable_post_types(&self) -> Vec<String> {
        self.previewable_post_types
            .clone()
            .unwrap_or_else(default_post_types)
    }

    pub fn is_previewable(&self, post_type: &str) -> bool {
        self.previewable_post_types()
            .iter()
            .any(|t| t == post_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = LivepostConfig::default();
        assert_eq!(config.previewable_post_types(), vec!["post", "page"]);
        assert_eq!(config.date_format, "%Y-%m-%d %H:%M:%S");
    }

    #[test]
    fn is_previewable_uses_configured_list() {
        let config = LivepostConfig {
            previewable_post_types: Some(vec!["post".into(), "recipe".into()]),
            ..Default::default()
        };
        assert!(config.is_previewable("recipe"));
        assert!(!config.is_previewable("page"));
    }

    #[test]
    fn defaults_apply_when_list_absent() {
        let config = LivepostConfig::default();
        assert!(config.is_previewable("post"));
        assert!(config.is_previewable("page"));
        assert!(!config.is_previewable("attachment"));
    }
}
