//! Style and theme overrides for file imports.
//!
//! A theme file maps placeholders to replacement sources:
//!
//! ```text
//! name: cyberpunk
//! imports:
//!   Outfit: outfits.yaml
//!   Outfit.sexy: outfits.sexy.yaml
//! ```
//!
//! When a style is requested, a file import is looked up in this order:
//!
//! 1. the theme's `Placeholder.style` entry
//! 2. the template's own style-suffixed file (`hair.yaml` -> `hair.style.yaml`)
//! 3. the same style-suffixed file name in the shared common directory
//! 4. the template's unsuffixed file
//!
//! Without a style only the theme's plain `Placeholder` entry may replace the
//! template's file.

use crate::document::load_yaml;
use crate::error::{PromptError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A theme document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThemeDocument {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub imports: BTreeMap<String, String>,

    #[serde(skip)]
    pub path: PathBuf,
}

impl ThemeDocument {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let value = load_yaml(path)?;
        let mut theme: ThemeDocument = serde_yaml::from_value(value).map_err(|e| {
            PromptError::malformed(path.display().to_string(), e.to_string())
        })?;
        theme.path = path.to_path_buf();
        Ok(theme)
    }

    fn source(&self, key: &str) -> Option<PathBuf> {
        let base = self.path.parent().unwrap_or(Path::new(""));
        self.imports.get(key).map(|p| base.join(p))
    }
}

/// Style settings applied while resolving file imports.
#[derive(Debug, Clone, Default)]
pub struct StyleOptions {
    pub style: Option<String>,
    pub theme: Option<ThemeDocument>,
    pub common_dir: Option<PathBuf>,
}

impl StyleOptions {
    pub fn is_active(&self) -> bool {
        self.style.is_some() || self.theme.is_some()
    }
}

/// Which step of the fallback chain produced the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleSource {
    ThemeStyle,
    TemplateStyle,
    CommonStyle,
    Theme,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleResolution {
    pub path: PathBuf,
    pub source: StyleSource,
}

/// Pick the source file for `placeholder`, given its declared `default_path`.
pub fn resolve_style_source(
    placeholder: &str,
    default_path: &Path,
    options: &StyleOptions,
) -> StyleResolution {
    let resolution = match options.style.as_deref() {
        Some(style) => styled_source(placeholder, default_path, style, options),
        None => options
            .theme
            .as_ref()
            .and_then(|theme| theme.source(placeholder))
            .filter(|p| p.is_file())
            .map(|path| StyleResolution {
                path,
                source: StyleSource::Theme,
            }),
    };

    let resolution = resolution.unwrap_or_else(|| StyleResolution {
        path: default_path.to_path_buf(),
        source: StyleSource::Default,
    });
    debug!(
        placeholder,
        path = %resolution.path.display(),
        source = ?resolution.source,
        "resolved import source"
    );
    resolution
}

fn styled_source(
    placeholder: &str,
    default_path: &Path,
    style: &str,
    options: &StyleOptions,
) -> Option<StyleResolution> {
    let theme_key = format!("{}.{}", placeholder, style);
    if let Some(path) = options
        .theme
        .as_ref()
        .and_then(|theme| theme.source(&theme_key))
        .filter(|p| p.is_file())
    {
        return Some(StyleResolution {
            path,
            source: StyleSource::ThemeStyle,
        });
    }

    let styled_name = styled_file_name(default_path, style)?;

    let own = default_path.with_file_name(&styled_name);
    if own.is_file() {
        return Some(StyleResolution {
            path: own,
            source: StyleSource::TemplateStyle,
        });
    }

    let common = options.common_dir.as_ref()?.join(&styled_name);
    common.is_file().then_some(StyleResolution {
        path: common,
        source: StyleSource::CommonStyle,
    })
}

/// `hair.yaml` + `cartoon` -> `hair.cartoon.yaml`.
fn styled_file_name(path: &Path, style: &str) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => Some(format!("{}.{}.{}", stem, style, ext)),
        None => Some(format!("{}.{}", stem, style)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_file;
    use tempfile::TempDir;

    fn theme_in(dir: &Path, yaml: &str) -> ThemeDocument {
        let path = write_file(dir, "themes/dark/theme.yaml", yaml);
        ThemeDocument::load(path).unwrap()
    }

    #[test]
    fn test_theme_exact_style_wins() {
        let dir = TempDir::new().unwrap();
        let default = write_file(dir.path(), "vars/hair.yaml", "A: a\n");
        write_file(dir.path(), "vars/hair.cartoon.yaml", "A: a\n");
        write_file(dir.path(), "themes/dark/hair.cartoon.yaml", "A: a\n");
        let theme = theme_in(dir.path(), "imports:\n  Hair.cartoon: hair.cartoon.yaml\n");

        let options = StyleOptions {
            style: Some("cartoon".to_string()),
            theme: Some(theme),
            common_dir: None,
        };
        let res = resolve_style_source("Hair", &default, &options);
        assert_eq!(res.source, StyleSource::ThemeStyle);
        assert!(res.path.ends_with("themes/dark/hair.cartoon.yaml"));
    }

    #[test]
    fn test_falls_back_to_template_style_then_common_then_default() {
        let dir = TempDir::new().unwrap();
        let default = write_file(dir.path(), "vars/hair.yaml", "A: a\n");
        let common = dir.path().join("common");
        std::fs::create_dir_all(&common).unwrap();

        let options = StyleOptions {
            style: Some("cartoon".to_string()),
            theme: None,
            common_dir: Some(common.clone()),
        };

        // Nothing styled exists yet: default.
        let res = resolve_style_source("Hair", &default, &options);
        assert_eq!(res.source, StyleSource::Default);
        assert_eq!(res.path, default);

        write_file(&common, "hair.cartoon.yaml", "A: a\n");
        let res = resolve_style_source("Hair", &default, &options);
        assert_eq!(res.source, StyleSource::CommonStyle);

        write_file(dir.path(), "vars/hair.cartoon.yaml", "A: a\n");
        let res = resolve_style_source("Hair", &default, &options);
        assert_eq!(res.source, StyleSource::TemplateStyle);
        assert!(res.path.ends_with("vars/hair.cartoon.yaml"));
    }

    #[test]
    fn test_unrequested_style_is_never_used() {
        let dir = TempDir::new().unwrap();
        let default = write_file(dir.path(), "vars/hair.yaml", "A: a\n");
        write_file(dir.path(), "vars/hair.cartoon.yaml", "A: a\n");

        let res = resolve_style_source("Hair", &default, &StyleOptions::default());
        assert_eq!(res.source, StyleSource::Default);
        assert_eq!(res.path, default);
    }

    #[test]
    fn test_theme_plain_entry_without_style() {
        let dir = TempDir::new().unwrap();
        let default = write_file(dir.path(), "vars/hair.yaml", "A: a\n");
        write_file(dir.path(), "themes/dark/hair.yaml", "A: a\n");
        let theme = theme_in(dir.path(), "imports:\n  Hair: hair.yaml\n");

        let options = StyleOptions {
            style: None,
            theme: Some(theme),
            common_dir: None,
        };
        let res = resolve_style_source("Hair", &default, &options);
        assert_eq!(res.source, StyleSource::Theme);
    }

    #[test]
    fn test_styled_file_name() {
        assert_eq!(
            styled_file_name(Path::new("a/hair.yaml"), "x").as_deref(),
            Some("hair.x.yaml")
        );
        assert_eq!(styled_file_name(Path::new("hair"), "x").as_deref(), Some("hair.x"));
    }
}
