//! Configuration management for mdtikz.
//!
//! Parses `mdtikz.toml` with serde and provides auto-discovery of the config
//! file in parent directories. CLI settings are applied during load via
//! [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! Program paths support `${VAR}`, `${VAR:-default}` and a leading `~`:
//!
//! - `tikz.latex`
//! - `tikz.pdf2svg`

mod expand;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mdtikz.toml";

/// CLI settings that override configuration file values.
///
/// Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the LaTeX engine.
    pub latex: Option<String>,
    /// Override the PDF to SVG converter.
    pub pdf2svg: Option<String>,
    /// Override the per-program timeout.
    pub timeout_secs: Option<u64>,
    /// Override title extraction.
    pub extract_title: Option<bool>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Markdown rendering options.
    pub markdown: MarkdownConfig,
    /// TikZ rendering options.
    pub tikz: TikzConfig,
    /// Nested conversion namespacing.
    pub namespace: NamespaceConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Markdown rendering configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    /// GFM tables, strikethrough and task lists.
    pub gfm: bool,
    /// Report the first H1 as the page title.
    pub extract_title: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            gfm: true,
            extract_title: false,
        }
    }
}

/// TikZ rendering configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TikzConfig {
    /// LaTeX engine producing PDF.
    pub latex: String,
    /// PDF to SVG converter.
    pub pdf2svg: String,
    /// Time limit for each program, in seconds.
    pub timeout_secs: u64,
    /// Default `\usetikzlibrary` argument.
    pub library: String,
    /// Default `tikzpicture` options.
    pub option: String,
    /// Title of the source tab.
    pub source_title: String,
    /// Title of the figure tab.
    pub result_title: String,
}

impl TikzConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for TikzConfig {
    fn default() -> Self {
        Self {
            latex: "lualatex".to_owned(),
            pdf2svg: "pdf2svg".to_owned(),
            timeout_secs: 60,
            library: String::new(),
            option: String::new(),
            source_title: "Code".to_owned(),
            result_title: "Figure".to_owned(),
        }
    }
}

/// What happens to headings inside nested conversions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingsMode {
    /// Leave headings in place, without host TOC entries.
    #[default]
    Keep,
    /// Leave headings in place and add them to the host TOC.
    Report,
    /// Remove headings from nested HTML.
    Strip,
}

/// Namespace configuration for nested conversions.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NamespaceConfig {
    /// Tag of automatic id prefixes (`<tag>-<n>--`).
    pub tag: String,
    /// Heading handling.
    pub headings: HeadingsMode,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self {
            tag: "tizk".to_owned(),
            headings: HeadingsMode::Keep,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`tikz.latex`").
        field: String,
        /// Error message (e.g., "${`LATEX`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `mdtikz.toml` in the current directory and its parents, falling
    /// back to defaults.
    ///
    /// CLI settings take precedence over file values and are validated with
    /// them.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_config(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings)?;
        }
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) -> Result<(), ConfigError> {
        if let Some(latex) = &settings.latex {
            self.tikz.latex = expand::expand_program(latex, "tikz.latex")?;
        }
        if let Some(pdf2svg) = &settings.pdf2svg {
            self.tikz.pdf2svg = expand::expand_program(pdf2svg, "tikz.pdf2svg")?;
        }
        if let Some(timeout_secs) = settings.timeout_secs {
            self.tikz.timeout_secs = timeout_secs;
        }
        if let Some(extract_title) = settings.extract_title {
            self.markdown.extract_title = extract_title;
        }
        Ok(())
    }

    /// Search for the config file in `start` and its parents.
    fn discover_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called by [`Config::load`] after CLI settings are applied.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_tikz()?;
        self.validate_namespace()?;
        Ok(())
    }

    fn validate_tikz(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.tikz.latex, "tikz.latex")?;
        require_non_empty(&self.tikz.pdf2svg, "tikz.pdf2svg")?;
        require_non_empty(&self.tikz.source_title, "tikz.source_title")?;
        require_non_empty(&self.tikz.result_title, "tikz.result_title")?;

        if self.tikz.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "tikz.timeout_secs must be greater than 0".to_owned(),
            ));
        }

        Ok(())
    }

    fn validate_namespace(&self) -> Result<(), ConfigError> {
        let tag = &self.namespace.tag;
        require_non_empty(tag, "namespace.tag")?;

        // The tag ends up in HTML id attributes
        if !tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfigError::Validation(format!(
                "namespace.tag may only contain ASCII letters, digits, '-' and '_', got '{tag}'"
            )));
        }

        Ok(())
    }

    /// Expand environment variable references in program paths.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.tikz.latex = expand::expand_program(&self.tikz.latex, "tikz.latex")?;
        self.tikz.pdf2svg = expand::expand_program(&self.tikz.pdf2svg, "tikz.pdf2svg")?;
        Ok(())
    }
}
