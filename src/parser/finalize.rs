// File: src/parser/finalize.rs
//! Bookkeeping, normalization and validation of parsed drafts.
//!
//! Validation only rewrites values to `INVALID` on complete records. While a
//! record is still streaming, previews show whatever the model wrote so far.
use crate::model::{INVALID, Mode, ScheduleEntryDraft, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::str::FromStr;

static CLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(0?[1-9]|1[0-2]):[0-5][0-9] (AM|PM)$").expect("static clock pattern")
});
static LOCATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]+[0-9]+$").expect("static location pattern"));

pub fn is_valid_clock(value: &str) -> bool {
    CLOCK.is_match(value)
}

pub fn is_valid_location(value: &str) -> bool {
    LOCATION.is_match(value)
}

pub fn is_valid_url(value: &str) -> bool {
    url::Url::parse(value).is_ok()
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `monday` / `MONDAY` -> `Monday`. The sentinel is kept as written.
fn canonical_day(day: &str) -> String {
    if day == INVALID {
        return day.to_string();
    }
    capitalize_first(&day.to_lowercase())
}

/// Turns a parsed object into a finalized draft for `course_id`.
///
/// `complete` and `new` are taken from the object (defaulting to complete and
/// not new), the course id always comes from the caller.
pub fn finalize(object: Map<String, Value>, course_id: i64) -> ScheduleEntryDraft {
    let mut draft: ScheduleEntryDraft =
        serde_json::from_value(Value::Object(object)).unwrap_or_default();
    draft.course_id = course_id;
    format_entry(&mut draft);
    draft
}

/// Normalization followed by validation.
pub fn format_entry(draft: &mut ScheduleEntryDraft) {
    normalize(draft);
    validate(draft);
}

pub fn normalize(draft: &mut ScheduleEntryDraft) {
    draft.host = draft
        .host
        .split(' ')
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(" ");
    draft.day = canonical_day(&draft.day);
    draft.mode = match Mode::derive(&draft.location, &draft.link) {
        Some(mode) => mode.to_string(),
        None if draft.complete => INVALID.to_string(),
        None => String::new(),
    };
    draft.start_time = draft.start_time.to_uppercase();
    draft.end_time = draft.end_time.to_uppercase();
}

fn flag(field: &mut String, valid: bool, complete: bool) {
    if !valid && complete {
        *field = INVALID.to_string();
    }
}

pub fn validate(draft: &mut ScheduleEntryDraft) {
    let complete = draft.complete;

    let host_ok = !draft.host.trim().is_empty();
    flag(&mut draft.host, host_ok, complete);

    let day_ok = Weekday::from_str(&draft.day).is_ok();
    flag(&mut draft.day, day_ok, complete);

    let start_ok = is_valid_clock(&draft.start_time);
    flag(&mut draft.start_time, start_ok, complete);
    let end_ok = is_valid_clock(&draft.end_time);
    flag(&mut draft.end_time, end_ok, complete);

    match Mode::from_str(&draft.mode) {
        Ok(Mode::Remote) => {
            let link_ok = is_valid_url(&draft.link);
            flag(&mut draft.link, link_ok, complete);
            draft.location.clear();
        }
        Ok(Mode::InPerson) => {
            let location_ok = is_valid_location(&draft.location);
            flag(&mut draft.location, location_ok, complete);
            draft.link.clear();
        }
        Ok(Mode::Hybrid) => {
            let link_ok = is_valid_url(&draft.link);
            flag(&mut draft.link, link_ok, complete);
            let location_ok = is_valid_location(&draft.location);
            flag(&mut draft.location, location_ok, complete);
        }
        Err(_) => {}
    }
}
