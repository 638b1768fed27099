// File: ./src/service/courses.rs
use super::ServiceResponse;
use crate::model::{Course, User, UserCourse, UserRole};
use crate::store::ScheduleStore;
use http::StatusCode;

pub struct CourseService {
    store: ScheduleStore,
}

impl CourseService {
    pub fn new(store: ScheduleStore) -> Self {
        Self { store }
    }

    pub fn get_all(&self) -> ServiceResponse<Vec<Course>> {
        match self.store.all_courses() {
            Ok(list) if list.is_empty() => {
                ServiceResponse::failure("No Courses found", StatusCode::NOT_FOUND)
            }
            Ok(list) => ServiceResponse::success("Courses found", list),
            Err(e) => ServiceResponse::internal_error("An error occurred while retrieving courses.", &e),
        }
    }

    pub fn get_by_id(&self, id: i64) -> ServiceResponse<Course> {
        match self.store.course_by_id(id) {
            Ok(Some(course)) => ServiceResponse::success("Course found", course),
            Ok(None) => ServiceResponse::failure("Course not found", StatusCode::NOT_FOUND),
            Err(e) => ServiceResponse::internal_error("An error occurred while finding course.", &e),
        }
    }

    pub fn get_by_user(&self, user_id: &str) -> ServiceResponse<Vec<Course>> {
        match self.store.courses_by_user(user_id) {
            Ok(list) => ServiceResponse::success("Courses found", list),
            Err(e) => ServiceResponse::internal_error("An error occurred while finding courses.", &e),
        }
    }

    pub fn store_course(&self, course_code: &str, title: &str, instructor: &str) -> ServiceResponse<Course> {
        if course_code.trim().is_empty() || title.trim().is_empty() {
            return ServiceResponse::failure(
                "Course code and title are required",
                StatusCode::BAD_REQUEST,
            );
        }
        match self.store.store_course(course_code, title, instructor) {
            Ok(course) => ServiceResponse::success("Course stored successfully", course),
            Err(e) => ServiceResponse::internal_error("Failed to store course", &e),
        }
    }

    pub fn store_user_course(&self, user_id: &str, course_id: i64) -> ServiceResponse<UserCourse> {
        match self.store.course_by_id(course_id) {
            Ok(Some(_)) => {}
            Ok(None) => return ServiceResponse::failure("Course not found", StatusCode::NOT_FOUND),
            Err(e) => return ServiceResponse::internal_error("Failed to store user course", &e),
        }
        match self.store.store_user_course(user_id, course_id) {
            Ok(uc) => ServiceResponse::success("User course stored successfully", uc),
            Err(e) => ServiceResponse::internal_error("Failed to store user course", &e),
        }
    }

    pub fn delete_user_course(&self, user_id: &str, course_id: i64) -> ServiceResponse<UserCourse> {
        match self.store.delete_user_course(user_id, course_id) {
            Ok(Some(uc)) => ServiceResponse::success("User course deleted successfully", uc),
            Ok(None) => ServiceResponse::failure("User course not found", StatusCode::NOT_FOUND),
            Err(e) => ServiceResponse::internal_error("Failed to delete user course", &e),
        }
    }

    /// Records the address notifications go to.
    pub fn register_user(&self, user_id: &str, email: &str, role: UserRole) -> ServiceResponse<User> {
        if !email.contains('@') {
            return ServiceResponse::failure(format!("Invalid email '{}'", email), StatusCode::BAD_REQUEST);
        }
        match self.store.upsert_user(user_id, email, role) {
            Ok(user) => ServiceResponse::success("User saved", user),
            Err(e) => ServiceResponse::internal_error("Failed to save user", &e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TestContext;

    #[test]
    fn test_course_lifecycle() {
        let ctx = TestContext::new();
        let service = CourseService::new(ScheduleStore::open(&ctx).unwrap());

        assert_eq!(service.get_all().status_code, StatusCode::NOT_FOUND);
        let course = service.store_course("CS101", "Intro", "Lee").into_data().unwrap();
        assert_eq!(service.get_by_id(course.id).into_data(), Some(course.clone()));
        assert_eq!(service.get_by_id(999).status_code, StatusCode::NOT_FOUND);

        assert_eq!(service.store_user_course("s1", 999).status_code, StatusCode::NOT_FOUND);
        assert!(service.store_user_course("s1", course.id).success);
        assert_eq!(service.get_by_user("s1").into_data(), Some(vec![course.clone()]));

        assert!(service.delete_user_course("s1", course.id).success);
        assert_eq!(
            service.delete_user_course("s1", course.id).status_code,
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_register_user_checks_email() {
        let ctx = TestContext::new();
        let service = CourseService::new(ScheduleStore::open(&ctx).unwrap());
        assert_eq!(
            service.register_user("s1", "nope", UserRole::Student).status_code,
            StatusCode::BAD_REQUEST
        );
        assert!(service.register_user("s1", "s1@x.edu", UserRole::Student).success);
    }
}
