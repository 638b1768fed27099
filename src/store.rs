// File: ./src/store.rs
/*!
File-backed schedule store.

Courses, users, enrollments and office hours live in one versioned JSON
document (`schedule.json` in the data dir). Every operation runs under the
sidecar lock and writes go through `LocalStorage::atomic_write`, so several
processes can share one store.
*/

use crate::context::AppContext;
use crate::model::{Course, OfficeHour, OfficeHourInput, User, UserCourse, UserRole};
use crate::storage::LocalStorage;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const STORE_VERSION: u32 = 1;

fn current_version() -> u32 {
    STORE_VERSION
}

fn first_id() -> i64 {
    1
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScheduleData {
    #[serde(default = "current_version")]
    pub version: u32,
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub enrollments: Vec<UserCourse>,
    #[serde(default)]
    pub office_hours: Vec<OfficeHour>,

    #[serde(default = "first_id")]
    next_course_id: i64,
    #[serde(default = "first_id")]
    next_enrollment_id: i64,
    #[serde(default = "first_id")]
    next_office_hour_id: i64,
}

impl Default for ScheduleData {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            courses: Vec::new(),
            users: Vec::new(),
            enrollments: Vec::new(),
            office_hours: Vec::new(),
            next_course_id: 1,
            next_enrollment_id: 1,
            next_office_hour_id: 1,
        }
    }
}

impl ScheduleData {
    fn alloc(counter: &mut i64) -> i64 {
        let id = *counter;
        *counter += 1;
        id
    }

    fn enrolled_course_ids(&self, user_id: &str) -> HashSet<i64> {
        self.enrollments
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.course_id)
            .collect()
    }

    fn has_course(&self, course_id: i64) -> bool {
        self.courses.iter().any(|c| c.id == course_id)
    }

    fn enroll(&mut self, user_id: &str, course_id: i64) -> UserCourse {
        if let Some(existing) = self
            .enrollments
            .iter()
            .find(|e| e.user_id == user_id && e.course_id == course_id)
        {
            return existing.clone();
        }
        let enrollment = UserCourse {
            id: Self::alloc(&mut self.next_enrollment_id),
            user_id: user_id.to_string(),
            course_id,
        };
        self.enrollments.push(enrollment.clone());
        enrollment
    }

    fn check_input(&self, input: &OfficeHourInput) -> Result<()> {
        if let Err(msg) = input.validate() {
            bail!(msg);
        }
        if !self.has_course(input.course_id) {
            bail!("Course {} does not exist", input.course_id);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ScheduleStore {
    path: PathBuf,
}

impl ScheduleStore {
    pub fn open(ctx: &dyn AppContext) -> Result<Self> {
        Ok(Self::at(ctx.get_store_path()?))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the document without taking the lock. A missing file is an
    /// empty store; an unreadable one is an error so it is never overwritten.
    fn load_internal(path: &Path) -> Result<ScheduleData> {
        if !path.exists() {
            return Ok(ScheduleData::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read store {:?}", path))?;
        if content.trim().is_empty() {
            return Ok(ScheduleData::default());
        }
        let data: ScheduleData = serde_json::from_str(&content)
            .with_context(|| format!("Store {:?} is corrupt", path))?;
        if data.version > STORE_VERSION {
            bail!(
                "Store {:?} was written by a newer version (v{}, this build reads v{})",
                path,
                data.version,
                STORE_VERSION
            );
        }
        Ok(data)
    }

    fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
        Ok(())
    }

    pub fn read<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&ScheduleData) -> T,
    {
        self.ensure_parent()?;
        LocalStorage::with_lock(&self.path, || {
            let data = Self::load_internal(&self.path)?;
            Ok(f(&data))
        })
    }

    /// Loads, applies `f` and persists the result. Nothing is written when `f` fails.
    pub fn modify<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut ScheduleData) -> Result<T>,
    {
        self.ensure_parent()?;
        LocalStorage::with_lock(&self.path, || {
            let mut data = Self::load_internal(&self.path)?;
            let out = f(&mut data)?;
            data.version = STORE_VERSION;
            let json = serde_json::to_string_pretty(&data)?;
            LocalStorage::atomic_write(&self.path, json)?;
            Ok(out)
        })
    }

    // --- Courses ---

    pub fn all_courses(&self) -> Result<Vec<Course>> {
        self.read(|d| {
            let mut courses = d.courses.clone();
            courses.sort_by(|a, b| a.course_code.cmp(&b.course_code));
            courses
        })
    }

    pub fn course_by_id(&self, id: i64) -> Result<Option<Course>> {
        self.read(|d| d.courses.iter().find(|c| c.id == id).cloned())
    }

    pub fn courses_by_user(&self, user_id: &str) -> Result<Vec<Course>> {
        self.read(|d| {
            let ids = d.enrolled_course_ids(user_id);
            d.courses
                .iter()
                .filter(|c| ids.contains(&c.id))
                .cloned()
                .collect()
        })
    }

    /// Inserts a course. An identical code/title/instructor triple returns the
    /// course already stored.
    pub fn store_course(&self, course_code: &str, title: &str, instructor: &str) -> Result<Course> {
        self.modify(|d| {
            if let Some(existing) = d.courses.iter().find(|c| {
                c.course_code == course_code && c.title == title && c.instructor == instructor
            }) {
                log::info!("Course already exists: {} {} {}", course_code, title, instructor);
                return Ok(existing.clone());
            }
            let course = Course {
                id: ScheduleData::alloc(&mut d.next_course_id),
                course_code: course_code.to_string(),
                title: title.to_string(),
                instructor: instructor.to_string(),
            };
            d.courses.push(course.clone());
            Ok(course)
        })
    }

    pub fn store_user_course(&self, user_id: &str, course_id: i64) -> Result<UserCourse> {
        self.modify(|d| {
            if !d.has_course(course_id) {
                bail!("Course {} does not exist", course_id);
            }
            Ok(d.enroll(user_id, course_id))
        })
    }

    /// Removes the user's enrollment in `course_id`, returning it when present.
    pub fn delete_user_course(&self, user_id: &str, course_id: i64) -> Result<Option<UserCourse>> {
        self.modify(|d| {
            let pos = d
                .enrollments
                .iter()
                .position(|e| e.user_id == user_id && e.course_id == course_id);
            Ok(pos.map(|i| d.enrollments.remove(i)))
        })
    }

    // --- Users ---

    pub fn upsert_user(&self, id: &str, email: &str, role: UserRole) -> Result<User> {
        self.modify(|d| {
            if let Some(user) = d.users.iter_mut().find(|u| u.id == id) {
                user.email = email.to_string();
                user.role = role;
                return Ok(user.clone());
            }
            let user = User {
                id: id.to_string(),
                email: email.to_string(),
                role,
                is_active: true,
            };
            d.users.push(user.clone());
            Ok(user)
        })
    }

    /// Active users enrolled in the course.
    pub fn users_by_course(&self, course_id: i64) -> Result<Vec<User>> {
        self.read(|d| {
            let ids: HashSet<&str> = d
                .enrollments
                .iter()
                .filter(|e| e.course_id == course_id)
                .map(|e| e.user_id.as_str())
                .collect();
            d.users
                .iter()
                .filter(|u| u.is_active && ids.contains(u.id.as_str()))
                .cloned()
                .collect()
        })
    }

    // --- Office hours ---

    pub fn all_office_hours(&self) -> Result<Vec<OfficeHour>> {
        self.read(|d| d.office_hours.clone())
    }

    /// Office hours of every course the user is enrolled in.
    pub fn office_hours_by_user(&self, user_id: &str) -> Result<Vec<OfficeHour>> {
        self.read(|d| {
            let ids = d.enrolled_course_ids(user_id);
            d.office_hours
                .iter()
                .filter(|oh| ids.contains(&oh.course_id))
                .cloned()
                .collect()
        })
    }

    pub fn office_hours_by_ids(&self, ids: &[i64]) -> Result<Vec<OfficeHour>> {
        self.read(|d| {
            d.office_hours
                .iter()
                .filter(|oh| ids.contains(&oh.id))
                .cloned()
                .collect()
        })
    }

    /// Stores one entry owned by `user_id` and enrolls them in its course.
    pub fn store_office_hour(&self, input: OfficeHourInput, user_id: &str) -> Result<OfficeHour> {
        let mut stored = self.store_office_hours(vec![input], user_id)?;
        stored
            .pop()
            .context("Office hour was stored but could not be retrieved")
    }

    /// All-or-nothing: one invalid entry rejects the whole list.
    pub fn store_office_hours(
        &self,
        inputs: Vec<OfficeHourInput>,
        user_id: &str,
    ) -> Result<Vec<OfficeHour>> {
        self.modify(|d| {
            for (i, input) in inputs.iter().enumerate() {
                d.check_input(input)
                    .with_context(|| format!("Entry {} rejected", i + 1))?;
            }
            let mut stored = Vec::with_capacity(inputs.len());
            for input in inputs {
                d.enroll(user_id, input.course_id);
                let id = ScheduleData::alloc(&mut d.next_office_hour_id);
                let oh = input.into_office_hour(id, user_id);
                d.office_hours.push(oh.clone());
                stored.push(oh);
            }
            Ok(stored)
        })
    }

    /// Replaces an entry. Returns `None` when it does not exist or belongs to
    /// someone else.
    pub fn update_office_hour(
        &self,
        id: i64,
        input: OfficeHourInput,
        user_id: &str,
    ) -> Result<Option<OfficeHour>> {
        self.modify(|d| {
            d.check_input(&input)?;
            let Some(slot) = d
                .office_hours
                .iter_mut()
                .find(|oh| oh.id == id && oh.owner_id == user_id)
            else {
                return Ok(None);
            };
            *slot = input.into_office_hour(id, user_id);
            Ok(Some(slot.clone()))
        })
    }

    /// Deletes the listed entries owned by `user_id`; returns how many went.
    pub fn delete_office_hours(&self, ids: &[i64], user_id: &str) -> Result<usize> {
        self.modify(|d| {
            let before = d.office_hours.len();
            d.office_hours
                .retain(|oh| !(ids.contains(&oh.id) && oh.owner_id == user_id));
            Ok(before - d.office_hours.len())
        })
    }
}
