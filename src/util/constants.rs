// usbtime - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "usbtime";

/// Application identifier used for config directories.
pub const APP_ID: &str = "usbtime";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Configuration
// =============================================================================

/// File name of the user configuration inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Built-in configuration, embedded so the tool always has a rule table.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../config/default.toml");

/// Input log path used when neither the config nor the CLI names one.
pub const DEFAULT_INPUT_LOG: &str = "kernel.log";

/// Output CSV path used when neither the config nor the CLI names one.
pub const DEFAULT_OUTPUT_CSV: &str = "usb_timing.csv";

/// Hard upper bound on the number of rules (prevents configuration mistakes).
pub const MAX_RULES: usize = 256;

/// Valid values for `[logging] level`.
pub const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

// =============================================================================
// Interval detection
// =============================================================================

/// Substring that marks a message as the start of an interval.
pub const BEGIN_MARKER: &str = "begin";

/// Substrings that mark a message as the close of an interval.
/// Only consulted when the message does not contain [`BEGIN_MARKER`].
pub const END_MARKERS: &[&str] = &["end", "down"];

// =============================================================================
// Export
// =============================================================================

/// Device whose categories define the output header. Must be present in the log.
pub const REFERENCE_DEVICE: &str = "1-1";

/// Prefix added to device labels that do not already contain it.
/// Also the title of the first header column.
pub const DEVICE_LABEL_PREFIX: &str = "usb";

// =============================================================================
// Logging
// =============================================================================

/// Default log level when neither RUST_LOG, --debug, nor config sets one.
/// Kept at warn so `--summary` output on stdout stays uncluttered.
pub const DEFAULT_LOG_LEVEL: &str = "warn";
