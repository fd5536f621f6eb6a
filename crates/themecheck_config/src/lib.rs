//! Configuration file support.
//!
//! A theme is configured by a `themecheck.toml` at its root:
//!
//! ```toml
//! ignore = ["vendor/**"]
//!
//! [checks.UndefinedObject]
//! severity = "error"
//! ignore = ["snippets/legacy/*"]
//!
//! [checks.asset-size-css]
//! enabled = true
//! threshold_in_bytes = 50000
//! ```
//!
//! Check names may be PascalCase or kebab-case. Every key of a check other than
//! `enabled`, `severity` and `ignore` is an option of the check.

mod de;

use glob::Pattern;
use heck::ToUpperCamelCase;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::{fs, mem};
use themecheck_core::{
    get_check_by_code, get_check_suggestion, CheckSettings, ResolvedConfig, SchemaType, Severity,
};
use thiserror::Error;

/// The name of the config file to search for.
pub const CONFIG_NAME: &str = "themecheck.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigRepr {
    ignore: Vec<String>,
    checks: BTreeMap<String, CheckRepr>,
}

#[derive(Debug, Default, Deserialize)]
struct CheckRepr {
    #[serde(default)]
    enabled: Option<bool>,
    #[serde(default, deserialize_with = "de::severity")]
    severity: Option<Severity>,
    #[serde(default)]
    ignore: Vec<String>,
    #[serde(flatten)]
    options: BTreeMap<String, toml::Value>,
}

/// An error which makes a config unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{message}")]
    Toml {
        message: String,
        /// The byte offset of the error in the config source.
        offset: Option<usize>,
    },
    #[error("unknown check '{name}'{}", .suggestion.map(|s| format!(". did you mean '{}'?", s)).unwrap_or_default())]
    UnknownCheck {
        name: String,
        suggestion: Option<&'static str>,
    },
    #[error("option `{key}` of `{code}` must be of type {expected:?}, found `{found}`")]
    InvalidOption {
        code: &'static str,
        key: String,
        expected: SchemaType,
        found: Value,
    },
    #[error("invalid glob pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

#[derive(Debug, Clone)]
struct CheckConfig {
    settings: CheckSettings,
    ignore: Vec<Pattern>,
}

/// A loaded and validated configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    ignore: Vec<Pattern>,
    /// Check configs keyed by check code.
    checks: BTreeMap<String, CheckConfig>,
    warnings: Vec<String>,
}

fn patterns(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|source| ConfigError::Pattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

fn matches_any(patterns: &[Pattern], path: &str) -> bool {
    patterns.iter().any(|pattern| pattern.matches(path))
}

impl Config {
    /// Parse and validate a config from TOML source.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let repr: ConfigRepr = toml::from_str(source).map_err(|err| ConfigError::Toml {
            message: err.message().to_string(),
            offset: err.span().map(|span| span.start),
        })?;

        let mut config = Config {
            ignore: patterns(&repr.ignore)?,
            ..Default::default()
        };

        for (name, check_repr) in repr.checks {
            let normalized = name.to_upper_camel_case();
            let check = match get_check_by_code(&normalized) {
                Some(check) => check,
                None => {
                    return Err(ConfigError::UnknownCheck {
                        suggestion: get_check_suggestion(&normalized),
                        name,
                    })
                }
            };
            let meta = check.meta();
            let code = meta.code;
            let schema = meta.config_schema;

            let mut options = serde_json::Map::new();
            for (key, value) in check_repr.options {
                let value = match serde_json::to_value(&value) {
                    Ok(value) => value,
                    Err(err) => {
                        config.warn(format!("ignoring option `{}` of `{}`: {}", key, code, err));
                        continue;
                    }
                };
                match schema.get(key.as_str()) {
                    Some(prop) if !prop.kind.matches(&value) => {
                        return Err(ConfigError::InvalidOption {
                            code,
                            key,
                            expected: prop.kind,
                            found: value,
                        })
                    }
                    Some(_) => {}
                    None => config.warn(format!("unknown option `{}` for check `{}`", key, code)),
                }
                options.insert(key, value);
            }

            if config.checks.contains_key(code) {
                config.warn(format!("check `{}` is configured more than once, the last entry wins", code));
            }
            config.checks.insert(
                code.to_string(),
                CheckConfig {
                    settings: CheckSettings {
                        enabled: check_repr.enabled,
                        severity: check_repr.severity,
                        options,
                    },
                    ignore: patterns(&check_repr.ignore)?,
                },
            );
        }

        log::debug!("loaded config for {} checks", config.checks.len());
        Ok(config)
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&source)
    }

    /// Search `start` and all of its ancestors for a config file.
    pub fn find(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_NAME))
            .find(|path| path.is_file())
    }

    /// Load the config found from `start`, or the default config if there is none.
    pub fn discover(start: &Path) -> Result<Self, ConfigError> {
        match Self::find(start) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    fn warn(&mut self, warning: String) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Take all warnings out of this `Config`.
    pub fn warnings(&mut self) -> Vec<String> {
        mem::take(&mut self.warnings)
    }

    /// Whether a file is skipped entirely.
    pub fn is_ignored(&self, relative_path: &str) -> bool {
        matches_any(&self.ignore, relative_path)
    }

    /// The run settings of a file, `None` if the file is ignored.
    ///
    /// Checks whose own `ignore` patterns match the file are disabled for it.
    pub fn resolve(&self, relative_path: &str) -> Option<ResolvedConfig> {
        if self.is_ignored(relative_path) {
            log::debug!("{} is ignored by the config", relative_path);
            return None;
        }

        let checks = self
            .checks
            .iter()
            .map(|(code, check)| {
                let mut settings = check.settings.clone();
                if matches_any(&check.ignore, relative_path) {
                    settings.enabled = Some(false);
                }
                (code.clone(), settings)
            })
            .collect();

        Some(ResolvedConfig { checks })
    }
}
