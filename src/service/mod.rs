// File: ./src/service/mod.rs
//! Operations exposed to front-ends. Each returns a `ServiceResponse`
//! instead of an error so callers can map it straight onto a status.
pub mod courses;
pub mod office_hours;
pub mod parse;
pub mod response;

pub use courses::CourseService;
pub use office_hours::{CalendarFormat, DeletedCount, OfficeHourService};
pub use parse::ParseService;
pub use response::ServiceResponse;
