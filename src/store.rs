//! Storage port and its in-memory implementation.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    Booking, ClassUpdate, Course, CourseDraft, Enrolment, Organiser, Session, User,
};
use crate::schedule::ClassOccurrence;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Duplicate(String),
    #[error("{0}")]
    NotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of [`Store::update_course`].
#[derive(Debug, Clone, PartialEq)]
pub struct CourseEdit {
    pub course: Course,
    /// Bookings removed because the schedule changed; `None` when it did not.
    pub dropped_bookings: Option<usize>,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn list_courses(&self) -> StoreResult<Vec<Course>>;
    async fn find_course(&self, id: Uuid) -> StoreResult<Option<Course>>;
    async fn insert_course(&self, course: &Course) -> StoreResult<()>;
    /// Stores `classes` on the course unless it already has classes or its
    /// schedule no longer matches `basis`. Returns the course as stored.
    async fn save_classes_if_absent(
        &self,
        basis: &Course,
        classes: Vec<ClassOccurrence>,
    ) -> StoreResult<Course>;
    /// Applies an edit in one step. A schedule change clears the stored
    /// classes and removes the course's bookings.
    async fn update_course(&self, id: Uuid, draft: CourseDraft) -> StoreResult<Option<CourseEdit>>;
    async fn update_class(
        &self,
        course_id: Uuid,
        class_id: Uuid,
        update: ClassUpdate,
    ) -> StoreResult<ClassOccurrence>;
    /// Removes the course along with its enrolments and bookings.
    async fn delete_course(&self, id: Uuid) -> StoreResult<Option<Course>>;

    /// Looks a user up by username or email.
    async fn find_user(&self, identifier: &str) -> StoreResult<Option<User>>;
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    async fn count_users(&self) -> StoreResult<usize>;

    async fn insert_enrolment(&self, enrolment: &Enrolment) -> StoreResult<()>;
    async fn enrolments_by_user(&self, username: &str) -> StoreResult<Vec<Enrolment>>;
    async fn enrolments_by_course(&self, course_id: Uuid) -> StoreResult<Vec<Enrolment>>;

    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()>;
    async fn bookings_by_user(&self, username: &str) -> StoreResult<Vec<Booking>>;
    async fn bookings_by_class(&self, class_id: Uuid) -> StoreResult<Vec<Booking>>;
    async fn delete_booking(&self, id: Uuid) -> StoreResult<Option<Booking>>;

    async fn list_organisers(&self) -> StoreResult<Vec<Organiser>>;
    async fn insert_organiser(&self, organiser: &Organiser) -> StoreResult<()>;
    async fn delete_organiser(&self, id: Uuid) -> StoreResult<Option<Organiser>>;

    async fn insert_session(&self, session: &Session) -> StoreResult<()>;
    async fn find_session(&self, token: &str) -> StoreResult<Option<Session>>;
    async fn delete_session(&self, token: &str) -> StoreResult<Option<Session>>;
}

#[derive(Default)]
pub struct MemoryStore {
    courses: RwLock<Vec<Course>>,
    users: RwLock<Vec<User>>,
    enrolments: RwLock<Vec<Enrolment>>,
    bookings: RwLock<Vec<Booking>>,
    organisers: RwLock<Vec<Organiser>>,
    sessions: RwLock<Vec<Session>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn take_first<T>(items: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> Option<T> {
    let pos = items.iter().position(pred)?;
    Some(items.remove(pos))
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_courses(&self) -> StoreResult<Vec<Course>> {
        Ok(self.courses.read().await.clone())
    }

    async fn find_course(&self, id: Uuid) -> StoreResult<Option<Course>> {
        let courses = self.courses.read().await;
        Ok(courses.iter().find(|c| c.id == id).cloned())
    }

    async fn insert_course(&self, course: &Course) -> StoreResult<()> {
        let mut courses = self.courses.write().await;
        if courses.iter().any(|c| c.id == course.id) {
            return Err(StoreError::Duplicate(format!("Course {} already exists", course.id)));
        }
        courses.push(course.clone());
        Ok(())
    }

    async fn save_classes_if_absent(
        &self,
        basis: &Course,
        classes: Vec<ClassOccurrence>,
    ) -> StoreResult<Course> {
        let mut courses = self.courses.write().await;
        let stored = courses
            .iter_mut()
            .find(|c| c.id == basis.id)
            .ok_or_else(|| StoreError::NotFound("Course not found".into()))?;
        if stored.classes.is_empty() && !stored.schedule_differs(basis) {
            stored.classes = classes;
        }
        Ok(stored.clone())
    }

    async fn update_course(&self, id: Uuid, draft: CourseDraft) -> StoreResult<Option<CourseEdit>> {
        let mut courses = self.courses.write().await;
        let Some(stored) = courses.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        let mut updated = stored.clone();
        updated.apply(draft);

        let dropped_bookings = if updated.schedule_differs(stored) {
            updated.classes.clear();
            let mut bookings = self.bookings.write().await;
            let before = bookings.len();
            bookings.retain(|b| b.course_id != id);
            Some(before - bookings.len())
        } else {
            None
        };
        *stored = updated.clone();
        Ok(Some(CourseEdit {
            course: updated,
            dropped_bookings,
        }))
    }

    async fn update_class(
        &self,
        course_id: Uuid,
        class_id: Uuid,
        update: ClassUpdate,
    ) -> StoreResult<ClassOccurrence> {
        let mut courses = self.courses.write().await;
        let course = courses
            .iter_mut()
            .find(|c| c.id == course_id)
            .ok_or_else(|| StoreError::NotFound("Course not found".into()))?;
        let class = course
            .classes
            .iter_mut()
            .find(|class| class.id == class_id)
            .ok_or_else(|| StoreError::NotFound("Class not found".into()))?;

        if let Some(time) = update.time {
            class.time = time;
        }
        if let Some(location) = update.location {
            class.location = location;
        }
        Ok(class.clone())
    }

    async fn delete_course(&self, id: Uuid) -> StoreResult<Option<Course>> {
        let removed = take_first(&mut *self.courses.write().await, |c| c.id == id);
        if removed.is_some() {
            self.enrolments.write().await.retain(|e| e.course_id != id);
            self.bookings.write().await.retain(|b| b.course_id != id);
        }
        Ok(removed)
    }

    async fn find_user(&self, identifier: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|u| u.username == identifier || u.email == identifier)
            .cloned())
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.write().await;
        if users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(StoreError::Duplicate("Username or email already exists".into()));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn count_users(&self) -> StoreResult<usize> {
        Ok(self.users.read().await.len())
    }

    async fn insert_enrolment(&self, enrolment: &Enrolment) -> StoreResult<()> {
        let mut enrolments = self.enrolments.write().await;
        if enrolments
            .iter()
            .any(|e| e.course_id == enrolment.course_id && e.username == enrolment.username)
        {
            return Err(StoreError::Duplicate("Already enrolled in this course".into()));
        }
        enrolments.push(enrolment.clone());
        Ok(())
    }

    async fn enrolments_by_user(&self, username: &str) -> StoreResult<Vec<Enrolment>> {
        let enrolments = self.enrolments.read().await;
        Ok(enrolments.iter().filter(|e| e.username == username).cloned().collect())
    }

    async fn enrolments_by_course(&self, course_id: Uuid) -> StoreResult<Vec<Enrolment>> {
        let enrolments = self.enrolments.read().await;
        Ok(enrolments.iter().filter(|e| e.course_id == course_id).cloned().collect())
    }

    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()> {
        let mut bookings = self.bookings.write().await;
        if bookings
            .iter()
            .any(|b| b.class_id == booking.class_id && b.username == booking.username)
        {
            return Err(StoreError::Duplicate("Class already booked".into()));
        }
        bookings.push(booking.clone());
        Ok(())
    }

    async fn bookings_by_user(&self, username: &str) -> StoreResult<Vec<Booking>> {
        let bookings = self.bookings.read().await;
        Ok(bookings.iter().filter(|b| b.username == username).cloned().collect())
    }

    async fn bookings_by_class(&self, class_id: Uuid) -> StoreResult<Vec<Booking>> {
        let bookings = self.bookings.read().await;
        Ok(bookings.iter().filter(|b| b.class_id == class_id).cloned().collect())
    }

    async fn delete_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        Ok(take_first(&mut *self.bookings.write().await, |b| b.id == id))
    }

    async fn list_organisers(&self) -> StoreResult<Vec<Organiser>> {
        Ok(self.organisers.read().await.clone())
    }

    async fn insert_organiser(&self, organiser: &Organiser) -> StoreResult<()> {
        self.organisers.write().await.push(organiser.clone());
        Ok(())
    }

    async fn delete_organiser(&self, id: Uuid) -> StoreResult<Option<Organiser>> {
        Ok(take_first(&mut *self.organisers.write().await, |o| o.id == id))
    }

    async fn insert_session(&self, session: &Session) -> StoreResult<()> {
        self.sessions.write().await.push(session.clone());
        Ok(())
    }

    async fn find_session(&self, token: &str) -> StoreResult<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.iter().find(|s| s.token == token).cloned())
    }

    async fn delete_session(&self, token: &str) -> StoreResult<Option<Session>> {
        Ok(take_first(&mut *self.sessions.write().await, |s| s.token == token))
    }
}
