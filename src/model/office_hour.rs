// File: src/model/office_hour.rs
use crate::model::draft::{INVALID, ScheduleEntryDraft};
use crate::parser::finalize::{is_valid_clock, is_valid_location, is_valid_url};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    Display,
    IntoStaticStr,
)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub fn to_chrono(self) -> chrono::Weekday {
        match self {
            Weekday::Monday => chrono::Weekday::Mon,
            Weekday::Tuesday => chrono::Weekday::Tue,
            Weekday::Wednesday => chrono::Weekday::Wed,
            Weekday::Thursday => chrono::Weekday::Thu,
            Weekday::Friday => chrono::Weekday::Fri,
            Weekday::Saturday => chrono::Weekday::Sat,
            Weekday::Sunday => chrono::Weekday::Sun,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    Display,
    IntoStaticStr,
)]
pub enum Mode {
    Remote,
    #[serde(rename = "In-person")]
    #[strum(serialize = "In-person")]
    InPerson,
    Hybrid,
}

impl Mode {
    /// Mode implied by which of location/link are present.
    pub fn derive(location: &str, link: &str) -> Option<Mode> {
        match (!location.is_empty(), !link.is_empty()) {
            (true, true) => Some(Mode::Hybrid),
            (false, true) => Some(Mode::Remote),
            (true, false) => Some(Mode::InPerson),
            (false, false) => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// A stored office hour entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficeHour {
    pub id: i64,
    pub course_id: i64,
    /// User that submitted the entry; only they may update or delete it.
    pub owner_id: String,
    pub host: String,
    pub day: Weekday,
    pub start_time: String,
    pub end_time: String,
    pub mode: Mode,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub link: String,
}

/// Payload accepted by store/update operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficeHourInput {
    pub course_id: i64,
    pub host: String,
    pub day: Weekday,
    pub start_time: String,
    pub end_time: String,
    pub mode: Mode,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub link: String,
}

impl OfficeHourInput {
    /// Checks the same field rules the parser applies to complete drafts.
    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("Host must not be empty".to_string());
        }
        if !is_valid_clock(&self.start_time) || !is_valid_clock(&self.end_time) {
            return Err("Times must look like '2:00 PM'".to_string());
        }
        let needs_location = matches!(self.mode, Mode::InPerson | Mode::Hybrid);
        let needs_link = matches!(self.mode, Mode::Remote | Mode::Hybrid);
        if needs_location && !is_valid_location(&self.location) {
            return Err(format!("Invalid location '{}'", self.location));
        }
        if needs_link && !is_valid_url(&self.link) {
            return Err(format!("Invalid link '{}'", self.link));
        }
        Ok(())
    }

    pub fn into_office_hour(self, id: i64, owner_id: &str) -> OfficeHour {
        // Fields the mode excludes are never persisted.
        let location = if self.mode == Mode::Remote {
            String::new()
        } else {
            self.location
        };
        let link = if self.mode == Mode::InPerson {
            String::new()
        } else {
            self.link
        };
        OfficeHour {
            id,
            course_id: self.course_id,
            owner_id: owner_id.to_string(),
            host: self.host,
            day: self.day,
            start_time: self.start_time,
            end_time: self.end_time,
            mode: self.mode,
            location,
            link,
        }
    }
}

impl TryFrom<ScheduleEntryDraft> for OfficeHourInput {
    type Error = String;

    fn try_from(draft: ScheduleEntryDraft) -> Result<Self, Self::Error> {
        if !draft.complete {
            return Err("Draft is still incomplete".to_string());
        }
        if draft.has_invalid_fields() {
            return Err(format!(
                "Draft for '{}' has fields marked {}",
                draft.host, INVALID
            ));
        }
        let day = Weekday::from_str(&draft.day).map_err(|_| format!("Invalid day '{}'", draft.day))?;
        let mode =
            Mode::from_str(&draft.mode).map_err(|_| format!("Invalid mode '{}'", draft.mode))?;
        let input = OfficeHourInput {
            course_id: draft.course_id,
            host: draft.host,
            day,
            start_time: draft.start_time,
            end_time: draft.end_time,
            mode,
            location: draft.location,
            link: draft.link,
        };
        input.validate()?;
        Ok(input)
    }
}
