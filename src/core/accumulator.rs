// usbtime - core/accumulator.rs
//
// Folds parsed records into per-device, per-category begin/end timestamps.
// Records must be fed in log order: later lines overwrite earlier ones.

use crate::core::model::{AccumulatorState, ParsedRecord, RuleTable};
use crate::util::constants::{BEGIN_MARKER, END_MARKERS};

/// Which side of an interval a message marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Begin,
    End,
}

/// `begin` wins over `end`/`down` when a message contains both.
fn classify(message: &str) -> Option<Edge> {
    if message.contains(BEGIN_MARKER) {
        Some(Edge::Begin)
    } else if END_MARKERS.iter().any(|m| message.contains(m)) {
        Some(Edge::End)
    } else {
        None
    }
}

/// Single-pass interval accumulator.
///
/// Holds the rule table by reference for the lifetime of the run; there is
/// no process-wide category list.
#[derive(Debug)]
pub struct Accumulator<'r> {
    rules: &'r RuleTable,
    state: AccumulatorState,
    records_seen: u64,
    updates: u64,
}

impl<'r> Accumulator<'r> {
    pub fn new(rules: &'r RuleTable) -> Self {
        Self {
            rules,
            state: AccumulatorState::default(),
            records_seen: 0,
            updates: 0,
        }
    }

    /// Apply one record.
    ///
    /// Every rule whose keyword occurs in the message updates its own
    /// category. No check is made that begin precedes end.
    pub fn ingest(&mut self, record: &ParsedRecord) {
        self.records_seen += 1;
        let rules = self.rules;
        let device = self.state.device_mut(&record.device_id, rules.categories());
        let edge = classify(&record.message);

        for rule in rules.rules() {
            if !record.message.contains(rule.keyword.as_str()) {
                continue;
            }
            let (Some(edge), Some(interval)) = (edge, device.get_mut(&rule.category)) else {
                continue;
            };
            match edge {
                Edge::Begin => interval.begin = Some(record.timestamp),
                Edge::End => interval.end = Some(record.timestamp),
            }
            self.updates += 1;
            tracing::trace!(
                device = %record.device_id,
                category = %rule.category,
                edge = ?edge,
                timestamp = record.timestamp,
                "Interval updated"
            );
        }
    }

    /// Hand over the finished state.
    pub fn finish(self) -> AccumulatorState {
        tracing::debug!(
            records = self.records_seen,
            updates = self.updates,
            devices = self.state.len(),
            "Accumulation complete"
        );
        self.state
    }
}

/// Accumulate `records` in order against `rules`.
pub fn accumulate<'a, I>(records: I, rules: &RuleTable) -> AccumulatorState
where
    I: IntoIterator<Item = &'a ParsedRecord>,
{
    let mut acc = Accumulator::new(rules);
    for record in records {
        acc.ingest(record);
    }
    acc.finish()
}
