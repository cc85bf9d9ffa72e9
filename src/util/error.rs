// usbtime - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Every fatal condition in the pipeline has its own variant; unrecognised
// log lines are not errors and never appear here.

use std::fmt;
use std::io;
use std::num::ParseFloatError;
use std::path::PathBuf;

/// Top-level error type for all usbtime operations.
/// Errors are categorised by the pipeline stage that produced them.
#[derive(Debug)]
pub enum UsbTimeError {
    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// Kernel log parsing failed.
    Parse(ParseError),

    /// Writing the result table failed.
    Export(ExportError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for UsbTimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Parse(e) => write!(f, "Parse error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for UsbTimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading and rule-table validation.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed. `path` is `None` for the embedded default.
    TomlParse {
        path: Option<PathBuf>,
        source: toml::de::Error,
    },

    /// I/O error reading the config file.
    Io { path: PathBuf, source: io::Error },

    /// The resolved rule table has no rules.
    EmptyRuleTable,

    /// More rules than the hard limit allows.
    TooManyRules { count: usize, max: usize },

    /// A rule has an empty keyword or category.
    EmptyField { index: usize, field: &'static str },

    /// `[output] format` names a format we cannot write.
    UnknownFormat { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse {
                path: Some(path),
                source,
            } => write!(f, "Config parse error '{}': {source}", path.display()),
            Self::TomlParse { path: None, source } => {
                write!(f, "Built-in config parse error: {source}")
            }
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
            Self::EmptyRuleTable => write!(
                f,
                "Rule table is empty. Add at least one [[rules]] entry \
                 with a keyword and a category."
            ),
            Self::TooManyRules { count, max } => {
                write!(f, "Too many rules ({count}), maximum is {max}")
            }
            Self::EmptyField { index, field } => {
                write!(f, "Rule #{} has an empty '{field}'", index + 1)
            }
            Self::UnknownFormat { value } => write!(
                f,
                "Output format \"{value}\" is not recognised. Expected \"csv\" or \"json\"."
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for UsbTimeError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// Errors related to kernel log parsing.
#[derive(Debug)]
pub enum ParseError {
    /// A line matched the USB pattern but its timestamp is not a number.
    TimestampParse {
        line_number: u64,
        raw_timestamp: String,
        source: ParseFloatError,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimestampParse {
                line_number,
                raw_timestamp,
                source,
            } => write!(
                f,
                "line {line_number}: cannot parse timestamp '{raw_timestamp}': {source}"
            ),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TimestampParse { source, .. } => Some(source),
        }
    }
}

impl From<ParseError> for UsbTimeError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to writing the result table.
#[derive(Debug)]
pub enum ExportError {
    /// The device used to derive the header columns never appeared in the log.
    MissingReferenceDevice { device: String },

    /// I/O error writing the export file.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { path: PathBuf, source: csv::Error },

    /// JSON serialisation error.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingReferenceDevice { device } => write!(
                f,
                "Reference device '{device}' was not found in the log. \
                 Output columns are derived from it, so nothing was written."
            ),
            Self::Io { path, source } => {
                write!(f, "Export I/O error '{}': {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "CSV export error '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "JSON export error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::MissingReferenceDevice { .. } => None,
        }
    }
}

impl From<ExportError> for UsbTimeError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

/// Convenience type alias for usbtime results.
pub type Result<T> = std::result::Result<T, UsbTimeError>;
