// File: ./src/service/office_hours.rs
use super::ServiceResponse;
use crate::calendar::{self, ExportOptions};
use crate::config::Config;
use crate::mail::{self, MailSender};
use crate::model::{OfficeHour, OfficeHourInput};
use crate::store::ScheduleStore;
use http::StatusCode;
use serde::Serialize;

const RETRIEVE_FAILED: &str = "An error occurred while retrieving office hours.";
const CALENDAR_FAILED: &str = "An error occurred while building the office hours calendar.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedCount {
    pub deleted_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalendarFormat {
    /// `data:text/calendar;base64,...`, ready for a download link.
    #[default]
    DataUrl,
    /// Plain ICS text.
    Ics,
}

pub struct OfficeHourService<M> {
    store: ScheduleStore,
    mailer: M,
    config: Config,
}

impl<M: MailSender> OfficeHourService<M> {
    pub fn new(store: ScheduleStore, mailer: M, config: Config) -> Self {
        Self {
            store,
            mailer,
            config,
        }
    }

    pub fn get_all(&self) -> ServiceResponse<Vec<OfficeHour>> {
        match self.store.all_office_hours() {
            Ok(list) if list.is_empty() => {
                ServiceResponse::failure("No office hours found", StatusCode::NOT_FOUND)
            }
            Ok(list) => ServiceResponse::success("Office hours found", list),
            Err(e) => ServiceResponse::internal_error(RETRIEVE_FAILED, &e),
        }
    }

    pub fn get_by_user(&self, user_id: &str) -> ServiceResponse<Vec<OfficeHour>> {
        match self.store.office_hours_by_user(user_id) {
            Ok(list) => ServiceResponse::success("Office hours found", list),
            Err(e) => ServiceResponse::internal_error(RETRIEVE_FAILED, &e),
        }
    }

    pub fn delete(&self, ids: &[i64], user_id: &str) -> ServiceResponse<DeletedCount> {
        match self.store.delete_office_hours(ids, user_id) {
            Ok(0) => ServiceResponse::failure_with(
                "No office hours were found to delete",
                DeletedCount { deleted_count: 0 },
                StatusCode::NOT_FOUND,
            ),
            Ok(n) => ServiceResponse::success(
                format!("Successfully deleted {} office hours", n),
                DeletedCount { deleted_count: n },
            ),
            Err(e) => ServiceResponse::internal_error("An error occurred while deleting office hours", &e),
        }
    }

    /// Rejects bad input before it reaches the store, with a client-facing status.
    fn check<T>(&self, inputs: &[OfficeHourInput]) -> Option<ServiceResponse<T>> {
        for input in inputs {
            if let Err(msg) = input.validate() {
                return Some(ServiceResponse::failure(msg, StatusCode::BAD_REQUEST));
            }
            match self.store.course_by_id(input.course_id) {
                Ok(Some(_)) => {}
                Ok(None) => {
                    return Some(ServiceResponse::failure(
                        format!("Course {} not found", input.course_id),
                        StatusCode::NOT_FOUND,
                    ));
                }
                Err(e) => return Some(ServiceResponse::internal_error(RETRIEVE_FAILED, &e)),
            }
        }
        None
    }

    /// Stores an entry and enrolls the submitting user in its course.
    pub fn store(&self, input: OfficeHourInput, user_id: &str) -> ServiceResponse<OfficeHour> {
        if let Some(rejected) = self.check(std::slice::from_ref(&input)) {
            return rejected;
        }
        match self.store.store_office_hour(input, user_id) {
            Ok(oh) => ServiceResponse::success("Office hour created successfully", oh),
            Err(e) => ServiceResponse::internal_error("An error occurred while storing the office hour", &e),
        }
    }

    pub fn store_list(&self, inputs: Vec<OfficeHourInput>, user_id: &str) -> ServiceResponse<Vec<OfficeHour>> {
        if let Some(rejected) = self.check(&inputs) {
            return rejected;
        }
        match self.store.store_office_hours(inputs, user_id) {
            Ok(list) => ServiceResponse::success("Office hours created successfully", list),
            Err(e) => ServiceResponse::internal_error("An error occurred while storing the office hours", &e),
        }
    }

    /// Replaces an entry owned by `user_id`, then notifies everyone enrolled
    /// in the course. A failed notification does not fail the update.
    pub async fn update(&self, id: i64, input: OfficeHourInput, user_id: &str) -> ServiceResponse<OfficeHour> {
        if let Some(rejected) = self.check(std::slice::from_ref(&input)) {
            return rejected;
        }
        let updated = match self.store.update_office_hour(id, input, user_id) {
            Ok(Some(oh)) => oh,
            Ok(None) => {
                return ServiceResponse::failure("Office hour not found", StatusCode::NOT_FOUND);
            }
            Err(e) => {
                return ServiceResponse::internal_error("An error occurred while updating the office hour", &e);
            }
        };

        self.notify(&updated).await;
        ServiceResponse::success("Office hour updated successfully", updated)
    }

    async fn notify(&self, office_hour: &OfficeHour) {
        let users = match self.store.users_by_course(office_hour.course_id) {
            Ok(users) => users,
            Err(e) => {
                log::error!("Could not load users of course {}: {:#}", office_hour.course_id, e);
                return;
            }
        };
        let messages = mail::update_messages(
            users.iter().map(|u| u.email.as_str()),
            &self.config.mail_from,
            office_hour,
        );
        if messages.is_empty() {
            return;
        }
        if let Err(e) = self.mailer.send(&messages).await {
            log::error!("Error sending update notifications: {:#}", e);
        }
    }

    fn render(&self, office_hours: &[OfficeHour], name: String, format: CalendarFormat) -> ServiceResponse<String> {
        let options = ExportOptions::from_config(&self.config, name);
        match calendar::build_calendar(office_hours, &options) {
            Ok(ics) => {
                let body = match format {
                    CalendarFormat::DataUrl => calendar::to_data_url(&ics),
                    CalendarFormat::Ics => ics,
                };
                ServiceResponse::success("Office hours found", body)
            }
            Err(e) => ServiceResponse::internal_error(CALENDAR_FAILED, &e),
        }
    }

    pub fn calendar_by_ids(&self, ids: &[i64], format: CalendarFormat) -> ServiceResponse<String> {
        match self.store.office_hours_by_ids(ids) {
            Ok(list) => self.render(&list, calendar::SELECTED_CALENDAR_NAME.to_string(), format),
            Err(e) => ServiceResponse::internal_error(CALENDAR_FAILED, &e),
        }
    }

    pub fn calendar_by_user(&self, user_id: &str, format: CalendarFormat) -> ServiceResponse<String> {
        match self.store.office_hours_by_user(user_id) {
            Ok(list) => self.render(&list, calendar::user_calendar_name(user_id), format),
            Err(e) => ServiceResponse::internal_error(CALENDAR_FAILED, &e),
        }
    }
}
