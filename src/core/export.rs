// usbtime - core/export.rs
//
// CSV and JSON export of the per-device duration table, plus a plain-text
// summary. Core layer: writes to any Write trait object.

use crate::core::model::{AccumulatorState, Elapsed};
use crate::util::constants::{DEVICE_LABEL_PREFIX, REFERENCE_DEVICE};
use crate::util::error::ExportError;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

/// Row label for a device: `usb` + id, unless the id already contains `usb`.
pub fn device_label(device_id: &str) -> String {
    if device_id.contains(DEVICE_LABEL_PREFIX) {
        device_id.to_string()
    } else {
        format!("{DEVICE_LABEL_PREFIX}{device_id}")
    }
}

/// One output row.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingRow {
    pub label: String,
    /// `(category, end - begin)` in column order.
    pub durations: Vec<(String, Elapsed)>,
}

impl Serialize for TimingRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Durations<'a>(&'a [(String, Elapsed)]);

        impl Serialize for Durations<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (category, elapsed) in self.0 {
                    map.serialize_entry(category, elapsed)?;
                }
                map.end()
            }
        }

        let mut s = serializer.serialize_struct("TimingRow", 2)?;
        s.serialize_field("device", &self.label)?;
        s.serialize_field("durations", &Durations(&self.durations))?;
        s.end()
    }
}

/// The finished table: column titles and rows sorted by label.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingTable {
    pub categories: Vec<String>,
    pub rows: Vec<TimingRow>,
}

impl TimingTable {
    /// Header record: `usb` followed by every category.
    pub fn header(&self) -> Vec<&str> {
        std::iter::once(DEVICE_LABEL_PREFIX)
            .chain(self.categories.iter().map(String::as_str))
            .collect()
    }
}

/// Build the output table from the accumulated state.
///
/// Columns come from the reference device [`REFERENCE_DEVICE`]; if the log
/// never mentioned it, no table is produced.
pub fn build_table(state: &AccumulatorState) -> Result<TimingTable, ExportError> {
    let reference =
        state
            .get(REFERENCE_DEVICE)
            .ok_or_else(|| ExportError::MissingReferenceDevice {
                device: REFERENCE_DEVICE.to_string(),
            })?;

    let categories: Vec<String> = reference.categories().map(str::to_string).collect();

    let mut rows: Vec<TimingRow> = state
        .iter()
        .map(|(device_id, intervals)| TimingRow {
            label: device_label(device_id),
            durations: intervals
                .iter()
                .map(|(category, interval)| (category.to_string(), interval.elapsed()))
                .collect(),
        })
        .collect();
    rows.sort_by(|a, b| a.label.cmp(&b.label));

    Ok(TimingTable { categories, rows })
}

/// Export the duration table as CSV with every field quoted.
///
/// Writes: usb, <category>... then one row per device.
/// Returns the number of device rows written.
pub fn export_csv<W: Write>(
    state: &AccumulatorState,
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    // Checked before the first byte is written.
    let table = build_table(state)?;
    write_csv(&table, writer, export_path)
}

/// Write an already-built table as CSV.
pub fn write_csv<W: Write>(
    table: &TimingTable,
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);

    let csv_err = |e: csv::Error| ExportError::Csv {
        path: export_path.to_path_buf(),
        source: e,
    };

    csv_writer.write_record(table.header()).map_err(csv_err)?;

    let mut count = 0;
    for row in &table.rows {
        let record = std::iter::once(row.label.clone())
            .chain(row.durations.iter().map(|(_, d)| d.to_string()));
        csv_writer.write_record(record).map_err(csv_err)?;
        count += 1;
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })?;

    tracing::debug!(path = %export_path.display(), rows = count, "CSV export complete");
    Ok(count)
}

/// Export the duration table as a JSON array of `{device, durations}` objects.
pub fn export_json<W: Write>(
    state: &AccumulatorState,
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let table = build_table(state)?;
    write_json(&table, writer, export_path)
}

/// Write an already-built table as pretty-printed JSON.
pub fn write_json<W: Write>(
    table: &TimingTable,
    mut writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    serde_json::to_writer_pretty(&mut writer, &table.rows).map_err(|e| ExportError::Json {
        path: export_path.to_path_buf(),
        source: e,
    })?;
    writer.flush().map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })?;
    Ok(table.rows.len())
}

/// Human-readable dump: each device, then one indented line per category.
///
/// Unlike the exports this does not require the reference device.
pub fn render_summary(state: &AccumulatorState) -> String {
    let mut out = String::new();
    for (device_id, intervals) in state.iter() {
        let _ = writeln!(out, "{device_id}");
        for (category, interval) in intervals.iter() {
            let _ = writeln!(out, "\t {device_id} {category} {}", interval.elapsed());
        }
    }
    out
}
