// File: ./src/model/mod.rs
pub mod course;
pub mod draft;
pub mod office_hour;

pub use course::{Course, User, UserCourse, UserRole};
pub use draft::{INVALID, ScheduleEntryDraft};
pub use office_hour::{Mode, OfficeHour, OfficeHourInput, Weekday};
