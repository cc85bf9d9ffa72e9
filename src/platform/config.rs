// usbtime - platform/config.rs
//
// Configuration directory resolution and config.toml loading with
// validation at startup.
//
// The embedded default config is always loaded first; a user config.toml
// (from --config or the platform config directory) is layered on top.
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::core::model::{Rule, RuleTable};
use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Resolved platform paths for usbtime configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/usbtime/ or %APPDATA%\usbtime\config\)
    pub config_dir: PathBuf,

    /// Default user config file inside `config_dir`.
    pub config_file: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        let config_dir = match ProjectDirs::from("", "", constants::APP_ID) {
            Some(proj_dirs) => proj_dirs.config_dir().to_path_buf(),
            None => {
                tracing::warn!(
                    "Could not determine platform directories, using current directory"
                );
                PathBuf::from(".")
            }
        };
        let config_file = config_dir.join(constants::CONFIG_FILE_NAME);

        tracing::debug!(
            config = %config_dir.display(),
            file = %config_file.display(),
            "Platform paths resolved"
        );

        Self {
            config_dir,
            config_file,
        }
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[paths]` section.
    pub paths: PathsSection,
    /// `[output]` section.
    pub output: OutputSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
    /// `[[rules]]` array. `None` when the file has no rules at all.
    pub rules: Option<Vec<Rule>>,
}

/// `[paths]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct PathsSection {
    /// Kernel log to analyse.
    pub input_log: Option<String>,
    /// Where the table is written.
    pub output_csv: Option<String>,
}

/// `[output]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// "csv" or "json".
    pub format: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

impl RawConfig {
    /// Layer `user` over `self`: set fields win; a user rule list replaces
    /// the base list as a whole.
    pub fn overlay(self, user: RawConfig) -> RawConfig {
        RawConfig {
            paths: PathsSection {
                input_log: user.paths.input_log.or(self.paths.input_log),
                output_csv: user.paths.output_csv.or(self.paths.output_csv),
            },
            output: OutputSection {
                format: user.output.format.or(self.output.format),
            },
            logging: LoggingSection {
                level: user.logging.level.or(self.logging.level),
            },
            rules: user.rules.or(self.rules),
        }
    }
}

/// Output table encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::UnknownFormat {
                value: s.to_string(),
            }),
        }
    }
}

/// Validated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Kernel log to read.
    pub input_log: PathBuf,
    /// Output file, overwritten on each run.
    pub output_path: PathBuf,
    /// Output encoding.
    pub format: OutputFormat,
    /// Keyword-to-column rules in column order.
    pub rules: RuleTable,
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

/// Load the configuration.
///
/// `config_path` is the --config override. When given, the file must exist.
/// Otherwise `config.toml` in the platform config directory is used if
/// present, and the built-in defaults apply if it is not.
///
/// Returns the validated config and non-fatal warnings. Warnings are
/// returned rather than logged because logging is configured from the
/// result.
pub fn load_config(config_path: Option<&Path>) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let (path, required) = match config_path {
        Some(p) => (p.to_path_buf(), true),
        None => (PlatformPaths::resolve().config_file, false),
    };

    let user = if !required && !path.exists() {
        None
    } else {
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;
        Some(parse_raw(&content, Some(&path))?)
    };

    build_config(user)
}

/// Built-in defaults with an optional user layer, validated.
pub fn build_config(user: Option<RawConfig>) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let base = parse_raw(constants::DEFAULT_CONFIG_TOML, None)?;
    let raw = match user {
        Some(user) => base.overlay(user),
        None => base,
    };
    validate(raw)
}

/// Deserialise config TOML. `path` is `None` for the embedded default.
pub fn parse_raw(content: &str, path: Option<&Path>) -> Result<RawConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::TomlParse {
        path: path.map(Path::to_path_buf),
        source: e,
    })
}

/// Validate a merged raw config.
///
/// Rule and format problems are fatal: running with the wrong columns would
/// silently produce a misleading table. Cosmetic problems become warnings.
pub fn validate(raw: RawConfig) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let mut warnings: Vec<String> = Vec::new();

    // -- Rules --
    let rules = raw.rules.unwrap_or_default();
    if rules.is_empty() {
        return Err(ConfigError::EmptyRuleTable);
    }
    if rules.len() > constants::MAX_RULES {
        return Err(ConfigError::TooManyRules {
            count: rules.len(),
            max: constants::MAX_RULES,
        });
    }
    for (index, rule) in rules.iter().enumerate() {
        if rule.keyword.trim().is_empty() {
            return Err(ConfigError::EmptyField {
                index,
                field: "keyword",
            });
        }
        if rule.category.trim().is_empty() {
            return Err(ConfigError::EmptyField {
                index,
                field: "category",
            });
        }
    }

    // -- Output format --
    let format = match raw.output.format.as_deref() {
        Some(f) => f.parse::<OutputFormat>()?,
        None => OutputFormat::default(),
    };

    // -- Paths --
    let input_log = non_empty_path(
        raw.paths.input_log,
        "[paths] input_log",
        constants::DEFAULT_INPUT_LOG,
        &mut warnings,
    );
    let output_path = non_empty_path(
        raw.paths.output_csv,
        "[paths] output_csv",
        constants::DEFAULT_OUTPUT_CSV,
        &mut warnings,
    );

    // -- Logging: level --
    let mut log_level = None;
    if let Some(level) = raw.logging.level {
        if constants::VALID_LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
            log_level = Some(level);
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default ({}).",
                constants::DEFAULT_LOG_LEVEL,
            ));
        }
    }

    let config = AppConfig {
        input_log,
        output_path,
        format,
        rules: RuleTable::new(rules),
        log_level,
    };

    Ok((config, warnings))
}

fn non_empty_path(
    value: Option<String>,
    field: &str,
    default: &str,
    warnings: &mut Vec<String>,
) -> PathBuf {
    match value {
        Some(v) if !v.trim().is_empty() => PathBuf::from(v),
        Some(_) => {
            warnings.push(format!("{field} is empty. Using default ({default})."));
            PathBuf::from(default)
        }
        None => PathBuf::from(default),
    }
}
