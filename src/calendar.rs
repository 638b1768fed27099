// File: ./src/calendar.rs
//! iCalendar export of office hours as weekly recurring events.
use crate::config::Config;
use crate::model::{Mode, OfficeHour, Weekday};
use anyhow::{Context, Result, anyhow, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use icalendar::{Calendar, Component, Event, Property};

pub const SELECTED_CALENDAR_NAME: &str = "Office Hours for Selected Classes";

pub fn user_calendar_name(user_id: &str) -> String {
    format!("Office Hours for User {}", user_id)
}

/// Parses `h:mm AM|PM` (any casing) into a 24-hour time.
pub fn parse_clock(value: &str) -> Result<NaiveTime> {
    let lower = value.trim().to_lowercase();
    let (clock, meridiem) = lower
        .split_once(' ')
        .ok_or_else(|| anyhow!("Time '{}' has no AM/PM marker", value))?;
    let (h, m) = clock
        .split_once(':')
        .ok_or_else(|| anyhow!("Time '{}' is not h:mm", value))?;
    let mut hours: u32 = h.parse().with_context(|| format!("Bad hour in '{}'", value))?;
    let minutes: u32 = m.parse().with_context(|| format!("Bad minutes in '{}'", value))?;
    if !(1..=12).contains(&hours) {
        bail!("Hour out of range in '{}'", value);
    }
    match meridiem.trim() {
        "pm" if hours != 12 => hours += 12,
        "am" if hours == 12 => hours = 0,
        "am" | "pm" => {}
        other => bail!("Unknown marker '{}' in '{}'", other, value),
    }
    NaiveTime::from_hms_opt(hours, minutes, 0).ok_or_else(|| anyhow!("Invalid time '{}'", value))
}

/// First `day` strictly after `today`, at `time`. A weekday equal to today's
/// lands one week out.
pub fn next_occurrence(day: Weekday, time: &str, today: NaiveDate) -> Result<NaiveDateTime> {
    let target = day.to_chrono().num_days_from_monday() as i64;
    let current = today.weekday().num_days_from_monday() as i64;
    let mut ahead = (target - current).rem_euclid(7);
    if ahead == 0 {
        ahead = 7;
    }
    Ok((today + Duration::days(ahead)).and_time(parse_clock(time)?))
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub name: String,
    pub timezone: Tz,
    pub today: NaiveDate,
    /// Recurrence end.
    pub until: DateTime<Utc>,
    pub organizer_email: String,
}

impl ExportOptions {
    pub fn from_config(config: &Config, name: impl Into<String>) -> Self {
        let timezone = config.timezone();
        let now = Utc::now();
        Self {
            name: name.into(),
            timezone,
            today: now.with_timezone(&timezone).date_naive(),
            until: now + Duration::weeks(config.semester_weeks.into()),
            organizer_email: config.mail_from.clone(),
        }
    }
}

fn local_time_property(key: &str, at: NaiveDateTime, tz: Tz) -> Property {
    let mut prop = Property::new(key, &at.format("%Y%m%dT%H%M%S").to_string());
    prop.add_parameter("TZID", tz.name());
    prop
}

fn office_hour_event(oh: &OfficeHour, options: &ExportOptions) -> Result<Event> {
    let start = next_occurrence(oh.day, &oh.start_time, options.today)?;
    let end = next_occurrence(oh.day, &oh.end_time, options.today)?;

    let mut event = Event::new();
    event.uid(&format!("office-hour-{}@synchrohnize", oh.id));
    event.summary(&format!("{}'s Office Hours", oh.host));
    event.timestamp(Utc::now());
    event.append_property(local_time_property("DTSTART", start, options.timezone));
    event.append_property(local_time_property("DTEND", end, options.timezone));

    let mut organizer = Property::new(
        "ORGANIZER",
        &format!("mailto:{}", options.organizer_email),
    );
    organizer.add_parameter("CN", &oh.host);
    event.append_property(organizer);

    let rrule = format!(
        "FREQ=WEEKLY;UNTIL={}",
        options.until.format("%Y%m%dT%H%M%SZ")
    );
    event.add_property("RRULE", &rrule);

    if oh.mode != Mode::Remote && !oh.location.is_empty() {
        event.add_property("LOCATION", &oh.location);
    }
    if oh.mode != Mode::InPerson && !oh.link.is_empty() {
        event.add_property("URL", &oh.link);
    }
    Ok(event)
}

/// Renders one VCALENDAR holding a weekly event per office hour.
pub fn build_calendar(office_hours: &[OfficeHour], options: &ExportOptions) -> Result<String> {
    let mut calendar = Calendar::new();
    calendar.name(&options.name);
    calendar.timezone(options.timezone.name());
    for oh in office_hours {
        let event = office_hour_event(oh, options)
            .with_context(|| format!("Office hour {} has unusable times", oh.id))?;
        calendar.push(event);
    }
    let ics = calendar.to_string();
    if ics.trim().is_empty() {
        bail!("Empty calendar data");
    }
    Ok(ics)
}

pub fn to_data_url(ics: &str) -> String {
    format!("data:text/calendar;base64,{}", STANDARD.encode(ics.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn office_hour(mode: Mode, location: &str, link: &str) -> OfficeHour {
        OfficeHour {
            id: 7,
            course_id: 1,
            owner_id: "prof".to_string(),
            host: "Prof Lee".to_string(),
            day: Weekday::Monday,
            start_time: "3:00 PM".to_string(),
            end_time: "4:30 PM".to_string(),
            mode,
            location: location.to_string(),
            link: link.to_string(),
        }
    }

    fn options() -> ExportOptions {
        ExportOptions {
            name: SELECTED_CALENDAR_NAME.to_string(),
            timezone: chrono_tz::America::New_York,
            // A Wednesday.
            today: NaiveDate::from_ymd_opt(2026, 9, 2).unwrap(),
            until: Utc.with_ymd_and_hms(2026, 12, 16, 0, 0, 0).unwrap(),
            organizer_email: "noreply@example.edu".to_string(),
        }
    }

    #[test]
    fn test_parse_clock() {
        assert_eq!(parse_clock("3:05 PM").unwrap(), NaiveTime::from_hms_opt(15, 5, 0).unwrap());
        assert_eq!(parse_clock("12:00 am").unwrap(), NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        assert_eq!(parse_clock("12:30 PM").unwrap(), NaiveTime::from_hms_opt(12, 30, 0).unwrap());
        assert!(parse_clock("15:00").is_err());
        assert!(parse_clock("13:00 PM").is_err());
    }

    #[test]
    fn test_next_occurrence_is_strictly_after_today() {
        let wednesday = NaiveDate::from_ymd_opt(2026, 9, 2).unwrap();
        let next_mon = next_occurrence(Weekday::Monday, "9:00 AM", wednesday).unwrap();
        assert_eq!(next_mon.date(), NaiveDate::from_ymd_opt(2026, 9, 7).unwrap());
        let next_wed = next_occurrence(Weekday::Wednesday, "9:00 AM", wednesday).unwrap();
        assert_eq!(next_wed.date(), NaiveDate::from_ymd_opt(2026, 9, 9).unwrap());
        let next_thu = next_occurrence(Weekday::Thursday, "9:00 AM", wednesday).unwrap();
        assert_eq!(next_thu.date(), NaiveDate::from_ymd_opt(2026, 9, 3).unwrap());
    }

    #[test]
    fn test_in_person_event() {
        let ics = build_calendar(&[office_hour(Mode::InPerson, "MALA5200", "")], &options()).unwrap();
        assert!(ics.contains("BEGIN:VEVENT"));
        assert!(ics.contains("SUMMARY:Prof Lee's Office Hours"));
        assert!(ics.contains("DTSTART;TZID=America/New_York:20260907T150000"));
        assert!(ics.contains("DTEND;TZID=America/New_York:20260907T163000"));
        assert!(ics.contains("RRULE:FREQ=WEEKLY;UNTIL=20261216T000000Z"));
        assert!(ics.contains("LOCATION:MALA5200"));
        assert!(!ics.contains("\nURL"));
        assert!(ics.contains("X-WR-CALNAME:Office Hours for Selected Classes"));
    }

    #[test]
    fn test_remote_event_has_url_only() {
        let oh = office_hour(Mode::Remote, "", "https://zoom.us/j/1");
        let ics = build_calendar(&[oh], &options()).unwrap();
        assert!(ics.contains("URL:https://zoom.us/j/1"));
        assert!(!ics.contains("LOCATION"));
    }

    #[test]
    fn test_data_url() {
        let url = to_data_url("BEGIN:VCALENDAR");
        assert_eq!(url, "data:text/calendar;base64,QkVHSU46VkNBTEVOREFS");
    }
}
