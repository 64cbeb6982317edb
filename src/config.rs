//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/tagtree/tagtree.toml`
//! 3. Local config: `./.tagtree.toml`, or the file given with `--config`
//! 4. Environment variables: `TAGTREE_*` prefix

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{DanglingParents, DomainError, TreeOptions};

/// How the tree is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `{"data": [...]}` response body
    #[default]
    Json,
    /// termtree drawing
    Ascii,
}

impl FromStr for OutputFormat {
    type Err = ApplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "ascii" => Ok(Self::Ascii),
            other => Err(ApplicationError::Config {
                message: format!("unknown output format: {other} (expected 'json' or 'ascii')"),
            }),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Ascii => write!(f, "ascii"),
        }
    }
}

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub input: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub pretty: Option<bool>,
    pub dangling_parents: Option<DanglingParents>,
}

/// Unified configuration for tagtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Tag export to read when no file is given on the command line
    pub input: Option<PathBuf>,
    /// Output format of `tagtree tree`
    pub format: OutputFormat,
    /// Pretty-print JSON output
    pub pretty: bool,
    /// Placement of tags whose parents are all missing
    pub dangling_parents: DanglingParents,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input: None,
            format: OutputFormat::Json,
            pretty: true,
            dangling_parents: DanglingParents::Root,
        }
    }
}

/// Get the XDG config directory for tagtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "tagtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("tagtree.toml"))
}

/// Get the path to the local config file in the working directory.
pub fn local_config_path() -> PathBuf {
    PathBuf::from(".tagtree.toml")
}

/// Expand `~`, `$VAR` and `${VAR}`; unknown variables leave the input as is.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
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
    /// Options handed to the tree builder.
    pub fn tree_options(&self) -> TreeOptions {
        TreeOptions {
            dangling_parents: self.dangling_parents,
        }
    }

    fn expand_paths(&mut self) {
        if let Some(input) = &self.input {
            self.input = Some(PathBuf::from(expand_env_vars(&input.to_string_lossy())));
        }
    }

    /// Overlay wins for every field it specifies.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            input: overlay.input.clone().or_else(|| self.input.clone()),
            format: overlay.format.unwrap_or(self.format),
            pretty: overlay.pretty.unwrap_or(self.pretty),
            dangling_parents: overlay.dangling_parents.unwrap_or(self.dangling_parents),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Explicit local config; must exist when given.
    ///   Without it `./.tagtree.toml` is used if present.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_layered(
            global_config_path().as_deref(),
            config_file,
            default_env_source(),
        )
    }

    /// Same as [`Settings::load`] with caller-supplied global config path and
    /// environment source.
    pub fn load_layered(
        global_config: Option<&Path>,
        config_file: Option<&Path>,
        env: Environment,
    ) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config {
            if global_path.exists() {
                let raw = load_raw_settings(global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Local config
        match config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(ApplicationError::Config {
                        message: format!("config file not found: {}", path.display()),
                    });
                }
                let raw = load_raw_settings(path)?;
                current = current.merge_with(&raw);
            }
            None => {
                let local_path = local_config_path();
                if local_path.exists() {
                    let raw = load_raw_settings(&local_path)?;
                    current = current.merge_with(&raw);
                }
            }
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current, env)?;

        current.expand_paths();
        Ok(current)
    }

    /// Apply TAGTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self, env: Environment) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(env)
            .build()
            .map_err(config_err)?;

        if let Some(val) = present(config.get_string("input"))? {
            settings.input = Some(PathBuf::from(val));
        }
        if let Some(val) = present(config.get_string("format"))? {
            settings.format = val.parse()?;
        }
        if let Some(val) = present(config.get_bool("pretty"))? {
            settings.pretty = val;
        }
        if let Some(val) = present(config.get_string("dangling_parents"))? {
            settings.dangling_parents =
                val.parse().map_err(|e: DomainError| ApplicationError::Config {
                    message: e.to_string(),
                })?;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# tagtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/tagtree/tagtree.toml
#   Local:  ./.tagtree.toml (or --config <file>)
#   Env:    TAGTREE_* environment variables

# Tag export (JSON array or {"data": [...]}) used when no file is given
# input = "~/exports/tags.json"

# Output format of `tagtree tree`: "json" or "ascii"
# format = "json"

# Pretty-print JSON output
# pretty = true

# Tags whose parents are all missing from the export:
#   "root"    - show them at the top level
#   "exclude" - keep them off the top level
# dangling_parents = "root"
"#
        .to_string()
    }
}

fn default_env_source() -> Environment {
    Environment::with_prefix("TAGTREE")
        .prefix_separator("_")
        .separator("__")
}

/// A missing key is `None`; a value of the wrong type is an error.
fn present<T>(value: Result<T, ConfigError>) -> Result<Option<T>, ApplicationError> {
    match value {
        Ok(v) => Ok(Some(v)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(config_err(e)),
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
    use rstest::rstest;

    fn env_from(pairs: &[(&str, &str)]) -> Environment {
        let map: config::Map<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        default_env_source().source(Some(map))
    }

    #[test]
    fn given_no_overrides_when_merging_then_keeps_defaults() {
        let settings = Settings::default().merge_with(&RawSettings::default());
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.tree_options(), TreeOptions::default());
    }

    #[test]
    fn given_overlay_when_merging_then_overlay_wins() {
        let overlay = RawSettings {
            input: Some(PathBuf::from("tags.json")),
            format: Some(OutputFormat::Ascii),
            pretty: None,
            dangling_parents: Some(DanglingParents::Exclude),
        };

        let settings = Settings::default().merge_with(&overlay);

        assert_eq!(settings.input, Some(PathBuf::from("tags.json")));
        assert_eq!(settings.format, OutputFormat::Ascii);
        assert!(settings.pretty);
        assert_eq!(settings.dangling_parents, DanglingParents::Exclude);
    }

    #[test]
    fn given_env_overrides_when_applying_then_replaces_values() {
        let env = env_from(&[
            ("TAGTREE_FORMAT", "ascii"),
            ("TAGTREE_PRETTY", "false"),
            ("TAGTREE_DANGLING_PARENTS", "exclude"),
        ]);

        let settings = Settings::apply_env_overrides(Settings::default(), env).unwrap();

        assert_eq!(settings.format, OutputFormat::Ascii);
        assert!(!settings.pretty);
        assert_eq!(settings.dangling_parents, DanglingParents::Exclude);
    }

    #[rstest]
    #[case::format("TAGTREE_FORMAT", "yaml")]
    #[case::pretty("TAGTREE_PRETTY", "maybe")]
    #[case::dangling("TAGTREE_DANGLING_PARENTS", "sometimes")]
    fn given_bad_env_value_when_applying_then_returns_config_error(
        #[case] key: &str,
        #[case] value: &str,
    ) {
        let env = env_from(&[(key, value)]);

        let result = Settings::apply_env_overrides(Settings::default(), env);

        assert!(
            matches!(result, Err(ApplicationError::Config { .. })),
            "{:?}",
            result
        );
    }

    #[test]
    fn given_tilde_in_input_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            input: Some(PathBuf::from("~/tags.json")),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let input = settings.input.unwrap();
        assert!(input.to_string_lossy().starts_with(&home));
    }

    #[test]
    fn given_settings_when_to_toml_then_roundtrips_format() {
        let settings = Settings {
            format: OutputFormat::Ascii,
            ..Settings::default()
        };

        let toml = settings.to_toml().unwrap();

        assert!(toml.contains("format = \"ascii\""));
        assert!(toml.contains("dangling_parents = \"root\""));
    }

    #[test]
    fn given_template_when_parsed_then_is_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(raw.format.is_none());
    }
}
