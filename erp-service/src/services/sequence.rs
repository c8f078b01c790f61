//! Sequential document numbers: `PREFIX-YYYY-NNNNNN`, restarting at 1 each
//! calendar year.
//!
//! Counters live in the state document and are not atomic across processes;
//! a single writer is assumed.

use tracing::debug;

use crate::models::{DocumentKind, SequenceCounter, Settings};

/// Formats the next number and returns it with the advanced counter. The
/// input counter is left unchanged.
pub fn next_ref(counter: &SequenceCounter, prefix: &str, current_year: i32) -> (String, SequenceCounter) {
    let index = if counter.year == current_year {
        counter.next_index.max(1)
    } else {
        1
    };
    let number = format!("{prefix}-{current_year}-{index:06}");
    let advanced = SequenceCounter {
        prefix: prefix.to_string(),
        year: current_year,
        next_index: index + 1,
    };
    (number, advanced)
}

impl Settings {
    /// Issues the next number of `kind` for `year` and stores the advanced counter.
    pub fn issue(&mut self, kind: DocumentKind, year: i32) -> String {
        let counter = self
            .sequences
            .entry(kind)
            .or_insert_with(|| SequenceCounter::new(kind, year));
        let prefix = counter.prefix.clone();
        let (number, advanced) = next_ref(counter, &prefix, year);
        *counter = advanced;
        debug!(kind = kind.as_str(), number = %number, "Issued document number");
        number
    }

    /// Number the next `issue` call would return, without consuming it.
    pub fn peek(&self, kind: DocumentKind, year: i32) -> String {
        let fresh = SequenceCounter::new(kind, year);
        let counter = self.sequences.get(&kind).unwrap_or(&fresh);
        next_ref(counter, &counter.prefix, year).0
    }
}
