//! Identifier generation.
//!
//! Entity ids are `PREFIX-<epoch millis>`. When that id is already taken the
//! millisecond component is bumped until it is free.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub fn entity_id(prefix: &str, now: DateTime<Utc>, taken: impl Fn(&str) -> bool) -> String {
    let mut millis = now.timestamp_millis();
    loop {
        let id = format!("{prefix}-{millis}");
        if !taken(&id) {
            return id;
        }
        millis += 1;
    }
}

const TICKET_SUFFIXES: i64 = 1_000_000;

/// POS ticket ids keep only the last six digits of the timestamp. Once every
/// six-digit suffix is taken the full timestamp is used instead.
pub fn ticket_id(now: DateTime<Utc>, taken: impl Fn(&str) -> bool) -> String {
    let start = now.timestamp_millis();
    (0..TICKET_SUFFIXES)
        .map(|offset| format!("TCK-{:06}", (start + offset).rem_euclid(TICKET_SUFFIXES)))
        .find(|id| !taken(id.as_str()))
        .unwrap_or_else(|| entity_id("TCK", now, taken))
}

/// Id of a record derived from a parent (a line, a movement, a price log).
pub fn child_id(prefix: &str, now: DateTime<Utc>, parent: &str) -> String {
    format!("{prefix}-{}-{parent}", now.timestamp_millis())
}

/// Six hex characters, enough to tell apart lines created in the same millisecond.
pub fn short_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..6].to_string()
}
