//! Config loading, validation, and utility operations.

use super::model::Config;
use super::types::DEFAULT_CONFIG_FILE;
use crate::error::{PromptError, Result};
use crate::imports::{StyleOptions, ThemeDocument};
use std::path::{Path, PathBuf};
use tracing::debug;

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(PromptError::Config)` - Read error, parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            PromptError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Load `explicit` if given, else `promptgen.yaml` from `dir` if present,
    /// else the defaults. Returns the config and the directory its relative
    /// paths resolve against.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<(Self, PathBuf)> {
        if let Some(path) = explicit {
            let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
            return Ok((Self::load(path)?, base));
        }

        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            debug!(path = %candidate.display(), "using config file");
            return Ok((Self::load(&candidate)?, dir.to_path_buf()));
        }
        Ok((Self::default(), dir.to_path_buf()))
    }

    /// Parse config from a YAML string.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| PromptError::Config(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| PromptError::Config(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `max_images`, when set, must be positive
    /// - `default_style` must be a non-empty tag without `.` or path separators
    /// - `theme`, when set, must name a `.yaml`/`.yml` file
    pub fn validate(&self) -> Result<()> {
        if self.max_images == Some(0) {
            return Err(PromptError::Config(
                "config validation failed: max_images must be greater than 0".to_string(),
            ));
        }

        if let Some(style) = &self.default_style {
            if style.is_empty() || style.contains(['.', '/', '\\']) {
                return Err(PromptError::Config(format!(
                    "config validation failed: default_style '{}' must be a plain tag such as 'cartoon'",
                    style
                )));
            }
        }

        if let Some(theme) = &self.theme {
            if !(theme.ends_with(".yaml") || theme.ends_with(".yml")) {
                return Err(PromptError::Config(format!(
                    "config validation failed: theme '{}' must be a .yaml file",
                    theme
                )));
            }
        }

        Ok(())
    }

    /// Build import style options, loading the theme file if one is set.
    ///
    /// `style` overrides `default_style`. Relative paths join `base_dir`.
    pub fn style_options(&self, style: Option<&str>, base_dir: &Path) -> Result<StyleOptions> {
        let theme = match &self.theme {
            Some(path) => Some(ThemeDocument::load(base_dir.join(path))?),
            None => None,
        };

        Ok(StyleOptions {
            style: style.map(str::to_string).or_else(|| self.default_style.clone()),
            theme,
            common_dir: self.common_dir.as_ref().map(|dir| base_dir.join(dir)),
        })
    }
}
