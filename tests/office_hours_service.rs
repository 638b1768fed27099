// Integration tests for office hour storage, notifications and calendar export.
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::StatusCode;
use mockito::{Matcher, Server};
use synchrohnize::config::Config;
use synchrohnize::context::TestContext;
use synchrohnize::mail::{LogMailer, SendGridMailer};
use synchrohnize::model::{Mode, OfficeHourInput, UserRole, Weekday};
use synchrohnize::service::{CalendarFormat, OfficeHourService};
use synchrohnize::store::ScheduleStore;

fn input(course_id: i64) -> OfficeHourInput {
    OfficeHourInput {
        course_id,
        host: "Prof Lee".to_string(),
        day: Weekday::Monday,
        start_time: "2:00 PM".to_string(),
        end_time: "3:00 PM".to_string(),
        mode: Mode::Hybrid,
        location: "MALA5200".to_string(),
        link: "https://zoom.us/j/123".to_string(),
    }
}

fn config() -> Config {
    Config {
        mail_from: "noreply@example.edu".to_string(),
        ..Config::default()
    }
}

/// A course with two registered, enrolled students.
fn seeded_store(ctx: &TestContext) -> (ScheduleStore, i64) {
    let store = ScheduleStore::open(ctx).unwrap();
    let course = store.store_course("CS101", "Intro", "Lee").unwrap();
    for (id, email) in [("s1", "s1@example.edu"), ("s2", "s2@example.edu")] {
        store.upsert_user(id, email, UserRole::Student).unwrap();
        store.store_user_course(id, course.id).unwrap();
    }
    (store, course.id)
}

#[tokio::test]
async fn test_update_emails_every_enrolled_user() {
    let ctx = TestContext::new();
    let (store, course_id) = seeded_store(&ctx);

    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v3/mail/send")
        .match_header("authorization", "Bearer SG.test")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("Updated Office Hours Notification".to_string()),
            Matcher::Regex("Day: Friday".to_string()),
        ]))
        .with_status(202)
        .expect(2)
        .create_async()
        .await;

    let mailer = SendGridMailer::new(&format!("{}/v3/mail/send", server.url()), "SG.test").unwrap();
    let service = OfficeHourService::new(store, mailer, config());

    let created = service.store(input(course_id), "prof").into_data().unwrap();
    let mut changed = input(course_id);
    changed.day = Weekday::Friday;
    let resp = service.update(created.id, changed, "prof").await;

    assert!(resp.success, "{}", resp.message);
    assert_eq!(resp.into_data().unwrap().day, Weekday::Friday);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_mail_failure_does_not_fail_update() {
    let ctx = TestContext::new();
    let (store, course_id) = seeded_store(&ctx);

    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/v3/mail/send")
        .with_status(500)
        .create_async()
        .await;

    let mailer = SendGridMailer::new(&format!("{}/v3/mail/send", server.url()), "SG.test").unwrap();
    let service = OfficeHourService::new(store, mailer, config());
    let created = service.store(input(course_id), "prof").into_data().unwrap();

    let resp = service.update(created.id, input(course_id), "prof").await;
    assert!(resp.success);
    assert_eq!(resp.status_code, StatusCode::OK);
}

#[tokio::test]
async fn test_update_of_foreign_entry_is_not_found() {
    let ctx = TestContext::new();
    let (store, course_id) = seeded_store(&ctx);
    let service = OfficeHourService::new(store, LogMailer, config());
    let created = service.store(input(course_id), "prof").into_data().unwrap();

    let resp = service.update(created.id, input(course_id), "someone-else").await;
    assert_eq!(resp.status_code, StatusCode::NOT_FOUND);
}

#[test]
fn test_store_rejections_and_delete() {
    let ctx = TestContext::new();
    let (store, course_id) = seeded_store(&ctx);
    let service = OfficeHourService::new(store, LogMailer, config());

    assert_eq!(service.get_all().status_code, StatusCode::NOT_FOUND);

    let mut bad = input(course_id);
    bad.start_time = "14:00".to_string();
    assert_eq!(service.store(bad, "prof").status_code, StatusCode::BAD_REQUEST);
    assert_eq!(service.store(input(999), "prof").status_code, StatusCode::NOT_FOUND);

    let stored = service
        .store_list(vec![input(course_id), input(course_id)], "prof")
        .into_data()
        .unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(service.get_all().into_data().unwrap().len(), 2);

    // The submitter is now enrolled and sees the entries.
    assert_eq!(service.get_by_user("prof").into_data().unwrap().len(), 2);

    let none = service.delete(&[stored[0].id], "s1");
    assert_eq!(none.status_code, StatusCode::NOT_FOUND);
    assert_eq!(none.response_object.unwrap().deleted_count, 0);

    let ids: Vec<i64> = stored.iter().map(|oh| oh.id).collect();
    let done = service.delete(&ids, "prof");
    assert!(done.success);
    assert_eq!(done.message, "Successfully deleted 2 office hours");
}

#[test]
fn test_calendar_exports() {
    let ctx = TestContext::new();
    let (store, course_id) = seeded_store(&ctx);
    let service = OfficeHourService::new(store, LogMailer, config());
    let created = service.store(input(course_id), "prof").into_data().unwrap();

    let url = service
        .calendar_by_user("s1", CalendarFormat::DataUrl)
        .into_data()
        .unwrap();
    let encoded = url.strip_prefix("data:text/calendar;base64,").unwrap();
    let ics = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();
    assert!(ics.contains("X-WR-CALNAME:Office Hours for User s1"));
    assert!(ics.contains("SUMMARY:Prof Lee's Office Hours"));
    assert!(ics.contains("LOCATION:MALA5200"));
    assert!(ics.contains("URL:https://zoom.us/j/123"));
    assert!(ics.contains("RRULE:FREQ=WEEKLY;UNTIL="));

    let ics = service
        .calendar_by_ids(&[created.id], CalendarFormat::Ics)
        .into_data()
        .unwrap();
    assert!(ics.starts_with("BEGIN:VCALENDAR"));
    assert!(ics.contains("Office Hours for Selected Classes"));

    let empty = service
        .calendar_by_ids(&[12345], CalendarFormat::Ics)
        .into_data()
        .unwrap();
    assert!(!empty.contains("BEGIN:VEVENT"));
}
