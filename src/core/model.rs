// usbtime - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no
// platform dependencies.
//
// These types are the shared vocabulary across all layers.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

// =============================================================================
// Parsed record (output of the line parser)
// =============================================================================

/// One USB kernel log line, reduced to the three fields the accumulator needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedRecord {
    /// Bus/port path as written in the log (`1-1`, `2-1.3`, `usb3`).
    /// Not normalised.
    pub device_id: String,

    /// Free text after the second `usb` token.
    pub message: String,

    /// Kernel timestamp in seconds since boot.
    pub timestamp: f64,
}

// =============================================================================
// Rules
// =============================================================================

/// Maps a keyword found in a message to an output column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Substring searched for in the record message.
    pub keyword: String,

    /// Column the keyword's timings are recorded under.
    pub category: String,
}

impl Rule {
    pub fn new(keyword: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            category: category.into(),
        }
    }
}

/// Ordered rule set with its derived column list.
///
/// Several rules may share a category; `categories()` lists each category
/// once, in order of first appearance. That order is the output column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    rules: Vec<Rule>,
    categories: Vec<String>,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>) -> Self {
        let mut categories: Vec<String> = Vec::new();
        for rule in &rules {
            if !categories.contains(&rule.category) {
                categories.push(rule.category.clone());
            }
        }
        Self { rules, categories }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// =============================================================================
// Intervals
// =============================================================================

/// Begin/end timestamps for one device and category.
///
/// `None` means the event was never seen. For duration purposes an unset
/// timestamp counts as 0, so an interval with a begin but no end reports a
/// negative duration (`0 - begin`). That is long-standing output behaviour
/// and is kept as-is; it most likely indicates a missing end line.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Interval {
    pub begin: Option<f64>,
    pub end: Option<f64>,
}

impl Interval {
    /// `end - begin`, or [`Elapsed::Unset`] if neither side was ever recorded.
    pub fn elapsed(&self) -> Elapsed {
        match (self.begin, self.end) {
            (None, None) => Elapsed::Unset,
            (begin, end) => Elapsed::Seconds(end.unwrap_or(0.0) - begin.unwrap_or(0.0)),
        }
    }
}

/// A duration cell in the output table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Elapsed {
    /// Neither begin nor end was seen. Rendered as `0`.
    Unset,
    /// Rendered as a float; whole values keep a trailing `.0` (`2.0`).
    /// Magnitudes below 1e-4 or from 1e16 up switch to exponent form
    /// with a signed, two-digit exponent (`5e-05`, `1e+16`).
    Seconds(f64),
}

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Elapsed::Unset => f.write_str("0"),
            Elapsed::Seconds(s) if uses_exponent(s) => write_exponent(f, s),
            Elapsed::Seconds(s) if s.is_finite() && s.fract() == 0.0 => write!(f, "{s:.1}"),
            Elapsed::Seconds(s) => write!(f, "{s}"),
        }
    }
}

fn uses_exponent(s: f64) -> bool {
    s.is_finite() && s != 0.0 && (s.abs() < 1e-4 || s.abs() >= 1e16)
}

/// `{:e}` gives the shortest round-trip mantissa but a bare exponent
/// (`5e-5`); pad it to `e-05`.
fn write_exponent(f: &mut fmt::Formatter<'_>, s: f64) -> fmt::Result {
    let sci = format!("{s:e}");
    let Some((mantissa, exponent)) = sci.split_once('e') else {
        return f.write_str(&sci);
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    write!(f, "{mantissa}e{sign}{digits:0>2}")
}

impl Serialize for Elapsed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Elapsed::Unset => serializer.serialize_u8(0),
            Elapsed::Seconds(s) => serializer.serialize_f64(*s),
        }
    }
}

/// Every category's interval for one device, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceIntervals {
    intervals: Vec<(String, Interval)>,
}

impl DeviceIntervals {
    /// Zero-filled intervals for every category.
    pub fn new(categories: &[String]) -> Self {
        Self {
            intervals: categories
                .iter()
                .map(|c| (c.clone(), Interval::default()))
                .collect(),
        }
    }

    pub fn get(&self, category: &str) -> Option<&Interval> {
        self.intervals
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, i)| i)
    }

    pub fn get_mut(&mut self, category: &str) -> Option<&mut Interval> {
        self.intervals
            .iter_mut()
            .find(|(c, _)| c == category)
            .map(|(_, i)| i)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.intervals.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Interval)> {
        self.intervals.iter().map(|(c, i)| (c.as_str(), i))
    }
}

/// Per-device intervals for a whole log, in first-seen device order.
/// Grows by insertion only.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AccumulatorState {
    devices: Vec<(String, DeviceIntervals)>,
    index: HashMap<String, usize>,
}

impl AccumulatorState {
    pub fn get(&self, device_id: &str) -> Option<&DeviceIntervals> {
        self.index.get(device_id).map(|&i| &self.devices[i].1)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Devices in the order they were first seen.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeviceIntervals)> {
        self.devices.iter().map(|(d, i)| (d.as_str(), i))
    }

    /// Intervals for `device_id`, creating a zero-filled entry on first sight.
    pub(crate) fn device_mut(
        &mut self,
        device_id: &str,
        categories: &[String],
    ) -> &mut DeviceIntervals {
        let existing = self.index.get(device_id).copied();
        let slot = match existing {
            Some(slot) => slot,
            None => {
                tracing::debug!(device = device_id, "New device");
                self.devices
                    .push((device_id.to_string(), DeviceIntervals::new(categories)));
                self.index
                    .insert(device_id.to_string(), self.devices.len() - 1);
                self.devices.len() - 1
            }
        };
        &mut self.devices[slot].1
    }
}
