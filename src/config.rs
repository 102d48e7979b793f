//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/guesstree/guesstree.toml`
//! 3. Local config: `<knowledge_base_dir>/.guesstree.toml`
//! 4. Environment variables: `GUESSTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::parser::{ParseOptions, DEFAULT_MAX_DEPTH};
use crate::domain::writer::{Writer, DEFAULT_INDENT};
use crate::domain::expand_env_vars;

/// Graph rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GraphConfig {
    /// Graphviz executable
    pub dot_command: String,
    /// Output format passed as `-T`
    pub format: String,
    /// Intermediate graph description file
    pub dot_file: PathBuf,
    /// Rendered image
    pub image_file: PathBuf,
    /// HTML page embedding the image
    pub html_file: PathBuf,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            dot_command: "dot".into(),
            format: "jpg".into(),
            dot_file: PathBuf::from("graph.dot"),
            image_file: PathBuf::from("graph.jpg"),
            html_file: PathBuf::from("logs.html"),
        }
    }
}

/// Raw graph config for intermediate parsing (`None` → not specified).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawGraphConfig {
    pub dot_command: Option<String>,
    pub format: Option<String>,
    pub dot_file: Option<PathBuf>,
    pub image_file: Option<PathBuf>,
    pub html_file: Option<PathBuf>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub indent_width: Option<usize>,
    pub max_depth: Option<usize>,
    #[serde(default)]
    pub graph: RawGraphConfig,
}

impl GraphConfig {
    /// Overlay wins field by field when it specifies a value.
    pub fn merge(&self, overlay: &RawGraphConfig) -> Self {
        Self {
            dot_command: overlay
                .dot_command
                .clone()
                .unwrap_or_else(|| self.dot_command.clone()),
            format: overlay.format.clone().unwrap_or_else(|| self.format.clone()),
            dot_file: overlay
                .dot_file
                .clone()
                .unwrap_or_else(|| self.dot_file.clone()),
            image_file: overlay
                .image_file
                .clone()
                .unwrap_or_else(|| self.image_file.clone()),
            html_file: overlay
                .html_file
                .clone()
                .unwrap_or_else(|| self.html_file.clone()),
        }
    }
}

/// Unified configuration for guesstree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Spaces per nesting level when saving
    pub indent_width: usize,
    /// Maximum brace nesting accepted when loading
    pub max_depth: usize,
    /// Graph rendering settings
    pub graph: GraphConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            indent_width: DEFAULT_INDENT,
            max_depth: DEFAULT_MAX_DEPTH,
            graph: GraphConfig::default(),
        }
    }
}

/// Get the XDG config directory for guesstree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "guesstree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("guesstree.toml"))
}

/// Get the path to the local config file next to a knowledge base.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".guesstree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Options for the tree parser.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            max_depth: self.max_depth,
        }
    }

    /// Writer configured with the indentation width.
    pub fn writer(&self) -> Writer {
        Writer::new().indent(self.indent_width)
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expand = |p: &Path| PathBuf::from(expand_env_vars(p.to_string_lossy().as_ref()));
        self.graph.dot_file = expand(&self.graph.dot_file);
        self.graph.image_file = expand(&self.graph.image_file);
        self.graph.html_file = expand(&self.graph.html_file);
        self.graph.dot_command = expand_env_vars(&self.graph.dot_command);
    }

    /// Overlay wins wherever it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            indent_width: overlay.indent_width.unwrap_or(self.indent_width),
            max_depth: overlay.max_depth.unwrap_or(self.max_depth),
            graph: self.graph.merge(&overlay.graph),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Directory of the knowledge base, searched for `.guesstree.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();
        current.validate()?;

        Ok(current)
    }

    /// Apply GUESSTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("GUESSTREE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get::<usize>("indent_width") {
            settings.indent_width = val;
        }
        if let Ok(val) = config.get::<usize>("max_depth") {
            settings.max_depth = val;
        }
        if let Ok(val) = config.get_string("graph.dot_command") {
            settings.graph.dot_command = val;
        }
        if let Ok(val) = config.get_string("graph.format") {
            settings.graph.format = val;
        }
        if let Ok(val) = config.get_string("graph.dot_file") {
            settings.graph.dot_file = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("graph.image_file") {
            settings.graph.image_file = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("graph.html_file") {
            settings.graph.html_file = PathBuf::from(val);
        }

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.max_depth == 0 {
            return Err(ApplicationError::Config {
                message: "max_depth must be at least 1".into(),
            });
        }
        if self.graph.dot_command.trim().is_empty() {
            return Err(ApplicationError::Config {
                message: "graph.dot_command must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# guesstree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/guesstree/guesstree.toml
#   Local:  <knowledge base dir>/.guesstree.toml
#   Env:    GUESSTREE_* environment variables (GUESSTREE_GRAPH__FORMAT=png)

# Spaces per nesting level when saving a knowledge base
# indent_width = 4

# Maximum brace nesting accepted when loading
# max_depth = 1024

[graph]
# Graphviz executable
# dot_command = "dot"

# Image format passed to dot -T
# format = "jpg"

# Intermediate graph description, rendered image and HTML log page
# dot_file = "graph.dot"
# image_file = "graph.jpg"
# html_file = "logs.html"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_defaults_then_match_format_constants() {
        let settings = Settings::default();
        assert_eq!(settings.indent_width, 4);
        assert_eq!(settings.max_depth, 1024);
        assert_eq!(settings.graph.dot_command, "dot");
        assert_eq!(settings.parse_options().max_depth, 1024);
    }

    #[test]
    fn given_overlay_when_merging_then_overlay_wins_where_specified() {
        let base = Settings::default();
        let overlay = RawSettings {
            indent_width: Some(2),
            max_depth: None,
            graph: RawGraphConfig {
                format: Some("png".into()),
                image_file: Some(PathBuf::from("kb.png")),
                ..Default::default()
            },
        };

        let result = base.merge_with(&overlay);

        assert_eq!(result.indent_width, 2);
        assert_eq!(result.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(result.graph.format, "png");
        assert_eq!(result.graph.image_file, PathBuf::from("kb.png"));
        assert_eq!(result.graph.dot_file, PathBuf::from("graph.dot"));
    }

    #[test]
    fn given_tilde_in_paths_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings::default();
        settings.graph.image_file = PathBuf::from("~/kb.jpg");

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        assert!(
            settings.graph.image_file.to_string_lossy().starts_with(&home),
            "image_file should start with home dir: {}",
            settings.graph.image_file.display()
        );
    }

    #[test]
    fn given_zero_max_depth_then_invalid() {
        let settings = Settings {
            max_depth: 0,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ApplicationError::Config { .. })
        ));
    }

    #[test]
    fn given_template_then_parses_as_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).expect("template is valid toml");
        assert!(raw.indent_width.is_none());
    }
}
