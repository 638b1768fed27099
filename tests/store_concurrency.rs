// File: tests/store_concurrency.rs
use serial_test::serial;
use std::sync::{Arc, Barrier};
use std::thread;
use synchrohnize::context::TestContext;
use synchrohnize::model::{Mode, OfficeHourInput, Weekday};
use synchrohnize::store::ScheduleStore;

fn input(course_id: i64, host: &str) -> OfficeHourInput {
    OfficeHourInput {
        course_id,
        host: host.to_string(),
        day: Weekday::Tuesday,
        start_time: "9:00 AM".to_string(),
        end_time: "10:00 AM".to_string(),
        mode: Mode::Remote,
        location: String::new(),
        link: "https://meet.example.edu/room".to_string(),
    }
}

/// Two handles on the same file racing a delete against an insert. The
/// lock serializes the read-modify-write cycles, so both changes survive.
#[test]
#[serial]
fn test_concurrent_store_modifications_are_safe() {
    let ctx = TestContext::new();
    let store = ScheduleStore::open(&ctx).unwrap();
    let course = store.store_course("CS101", "Intro", "Lee").unwrap();
    let doomed = store.store_office_hour(input(course.id, "Old Host"), "prof").unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let mut handles = vec![];

    let add_store = ScheduleStore::at(store.path().to_path_buf());
    let add_barrier = barrier.clone();
    handles.push(thread::spawn(move || {
        add_barrier.wait();
        add_store
            .store_office_hour(input(course.id, "New Host"), "prof")
            .unwrap();
    }));

    let delete_store = ScheduleStore::at(store.path().to_path_buf());
    let delete_barrier = barrier.clone();
    handles.push(thread::spawn(move || {
        delete_barrier.wait();
        assert_eq!(delete_store.delete_office_hours(&[doomed.id], "prof").unwrap(), 1);
    }));

    for handle in handles {
        handle.join().unwrap();
    }

    let remaining = store.all_office_hours().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].host, "New Host");
}

#[test]
#[serial]
fn test_many_writers_get_unique_ids() {
    let ctx = TestContext::new();
    let store = ScheduleStore::open(&ctx).unwrap();
    let course = store.store_course("CS101", "Intro", "Lee").unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = store.clone();
            let course_id = course.id;
            thread::spawn(move || {
                store
                    .store_office_hour(input(course_id, &format!("Host {}", i)), "prof")
                    .unwrap()
                    .id
            })
        })
        .collect();

    let mut ids: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);
    assert_eq!(store.all_office_hours().unwrap().len(), 8);
}
