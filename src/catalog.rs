//! Course management on top of the [`Store`].
//!
//! Generated classes are persisted on the course the first time they are
//! needed, so their ids stay stable for bookings.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{Booking, ClassUpdate, Course, CourseDraft, Enrolment};
use crate::schedule::{ClassOccurrence, generate};
use crate::store::{Store, StoreError, StoreResult};

/// Load a course, generating and storing its classes when absent.
pub async fn course_with_classes(store: &dyn Store, id: Uuid) -> StoreResult<Option<Course>> {
    let Some(course) = store.find_course(id).await? else {
        return Ok(None);
    };
    ensure_classes(store, course).await.map(Some)
}

pub async fn ensure_classes(store: &dyn Store, mut course: Course) -> StoreResult<Course> {
    while course.classes.is_empty() {
        let classes = generate(&course);
        if classes.is_empty() {
            debug!(course_id = %course.id, "course has no schedule yet");
            break;
        }
        debug!(course_id = %course.id, classes = classes.len(), "generated classes");
        // the stored copy wins over what was just generated
        course = store.save_classes_if_absent(&course, classes).await?;
    }
    Ok(course)
}

pub async fn all_courses_with_classes(store: &dyn Store) -> StoreResult<Vec<Course>> {
    let mut courses = Vec::new();
    for course in store.list_courses().await? {
        courses.push(ensure_classes(store, course).await?);
    }
    Ok(courses)
}

pub async fn create_course(store: &dyn Store, draft: CourseDraft) -> StoreResult<Course> {
    let course = Course::from_draft(draft);
    store.insert_course(&course).await?;
    info!(course_id = %course.id, title = %course.title, "course created");
    ensure_classes(store, course).await
}

/// Apply an edit. Schedule changes drop the stored classes and their bookings.
pub async fn update_course(
    store: &dyn Store,
    id: Uuid,
    draft: CourseDraft,
) -> StoreResult<Option<Course>> {
    let Some(edit) = store.update_course(id, draft).await? else {
        return Ok(None);
    };
    if let Some(dropped) = edit.dropped_bookings {
        info!(course_id = %id, dropped_bookings = dropped, "course schedule changed");
    }
    ensure_classes(store, edit.course).await.map(Some)
}

pub async fn update_class(
    store: &dyn Store,
    course_id: Uuid,
    class_id: Uuid,
    update: ClassUpdate,
) -> StoreResult<ClassOccurrence> {
    if course_with_classes(store, course_id).await?.is_none() {
        return Err(StoreError::NotFound("Course not found".into()));
    }
    store.update_class(course_id, class_id, update).await
}

/// Enrol a user. Returns the enrolment and whether it was newly created.
pub async fn enrol(
    store: &dyn Store,
    course_id: Uuid,
    username: &str,
) -> StoreResult<(Enrolment, bool)> {
    if store.find_course(course_id).await?.is_none() {
        return Err(StoreError::NotFound("Course not found".into()));
    }
    if let Some(existing) = store
        .enrolments_by_user(username)
        .await?
        .into_iter()
        .find(|e| e.course_id == course_id)
    {
        return Ok((existing, false));
    }

    let enrolment = Enrolment {
        id: Uuid::new_v4(),
        course_id,
        username: username.to_string(),
        enrolled_at: Utc::now(),
    };
    store.insert_enrolment(&enrolment).await?;
    info!(%course_id, username, "user enrolled");
    Ok((enrolment, true))
}

pub async fn book_class(
    store: &dyn Store,
    course_id: Uuid,
    class_id: Uuid,
    username: &str,
) -> StoreResult<Booking> {
    let course = course_with_classes(store, course_id)
        .await?
        .ok_or_else(|| StoreError::NotFound("Course not found".into()))?;
    if !course.classes.iter().any(|class| class.id == class_id) {
        return Err(StoreError::NotFound("Class not found".into()));
    }

    let booking = Booking {
        id: Uuid::new_v4(),
        class_id,
        course_id,
        username: username.to_string(),
        booked_at: Utc::now(),
    };
    store.insert_booking(&booking).await?;
    info!(%course_id, %class_id, username, "class booked");
    Ok(booking)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{Organiser, Session, User};
    use crate::schedule::Weekday;
    use crate::store::{CourseEdit, MemoryStore};

    /// A [`MemoryStore`] that hands control back to the runtime after every
    /// course lookup, so concurrent callers interleave between read and write.
    #[derive(Default)]
    struct YieldingStore(MemoryStore);

    #[async_trait]
    impl Store for YieldingStore {
        async fn list_courses(&self) -> StoreResult<Vec<Course>> {
            self.0.list_courses().await
        }
        async fn find_course(&self, id: Uuid) -> StoreResult<Option<Course>> {
            let course = self.0.find_course(id).await;
            tokio::task::yield_now().await;
            course
        }
        async fn insert_course(&self, course: &Course) -> StoreResult<()> {
            self.0.insert_course(course).await
        }
        async fn save_classes_if_absent(
            &self,
            basis: &Course,
            classes: Vec<ClassOccurrence>,
        ) -> StoreResult<Course> {
            self.0.save_classes_if_absent(basis, classes).await
        }
        async fn update_course(
            &self,
            id: Uuid,
            draft: CourseDraft,
        ) -> StoreResult<Option<CourseEdit>> {
            self.0.update_course(id, draft).await
        }
        async fn update_class(
            &self,
            course_id: Uuid,
            class_id: Uuid,
            update: ClassUpdate,
        ) -> StoreResult<ClassOccurrence> {
            self.0.update_class(course_id, class_id, update).await
        }
        async fn delete_course(&self, id: Uuid) -> StoreResult<Option<Course>> {
            self.0.delete_course(id).await
        }
        async fn find_user(&self, identifier: &str) -> StoreResult<Option<User>> {
            self.0.find_user(identifier).await
        }
        async fn insert_user(&self, user: &User) -> StoreResult<()> {
            self.0.insert_user(user).await
        }
        async fn count_users(&self) -> StoreResult<usize> {
            self.0.count_users().await
        }
        async fn insert_enrolment(&self, enrolment: &Enrolment) -> StoreResult<()> {
            self.0.insert_enrolment(enrolment).await
        }
        async fn enrolments_by_user(&self, username: &str) -> StoreResult<Vec<Enrolment>> {
            self.0.enrolments_by_user(username).await
        }
        async fn enrolments_by_course(&self, course_id: Uuid) -> StoreResult<Vec<Enrolment>> {
            self.0.enrolments_by_course(course_id).await
        }
        async fn insert_booking(&self, booking: &Booking) -> StoreResult<()> {
            self.0.insert_booking(booking).await
        }
        async fn bookings_by_user(&self, username: &str) -> StoreResult<Vec<Booking>> {
            self.0.bookings_by_user(username).await
        }
        async fn bookings_by_class(&self, class_id: Uuid) -> StoreResult<Vec<Booking>> {
            self.0.bookings_by_class(class_id).await
        }
        async fn delete_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
            self.0.delete_booking(id).await
        }
        async fn list_organisers(&self) -> StoreResult<Vec<Organiser>> {
            self.0.list_organisers().await
        }
        async fn insert_organiser(&self, organiser: &Organiser) -> StoreResult<()> {
            self.0.insert_organiser(organiser).await
        }
        async fn delete_organiser(&self, id: Uuid) -> StoreResult<Option<Organiser>> {
            self.0.delete_organiser(id).await
        }
        async fn insert_session(&self, session: &Session) -> StoreResult<()> {
            self.0.insert_session(session).await
        }
        async fn find_session(&self, token: &str) -> StoreResult<Option<Session>> {
            self.0.find_session(token).await
        }
        async fn delete_session(&self, token: &str) -> StoreResult<Option<Session>> {
            self.0.delete_session(token).await
        }
    }

    fn draft() -> CourseDraft {
        CourseDraft {
            title: "Hip Hop".to_string(),
            description: "Urban style dance techniques.".to_string(),
            category: "Urban".to_string(),
            price: dec!(150),
            weekdays: vec![Weekday::Tuesday, Weekday::Thursday],
            time: "5:00pm to 6:30pm".to_string(),
            location: "Studio B".to_string(),
            class_count: 8,
            start_date: NaiveDate::from_ymd_opt(2025, 4, 15).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 5).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_classes_are_generated_once() {
        let store = MemoryStore::new();
        let course = Course::from_draft(draft());
        store.insert_course(&course).await.unwrap();

        let first = course_with_classes(&store, course.id).await.unwrap().unwrap();
        let second = course_with_classes(&store, course.id).await.unwrap().unwrap();

        assert_eq!(first.classes.len(), 8);
        assert_eq!(first.classes, second.classes);
        assert_eq!(first.classes[0].price_per_class, dec!(20.63));
    }

    #[tokio::test]
    async fn test_concurrent_first_reads_share_class_ids() {
        let store = YieldingStore::default();
        let course = Course::from_draft(draft());
        store.insert_course(&course).await.unwrap();

        let (a, b) = tokio::join!(
            course_with_classes(&store, course.id),
            course_with_classes(&store, course.id)
        );
        let (a, b) = (a.unwrap().unwrap(), b.unwrap().unwrap());

        assert_eq!(a.classes.len(), 8);
        assert_eq!(a.classes, b.classes);
        let stored = store.find_course(course.id).await.unwrap().unwrap();
        assert_eq!(stored.classes, a.classes);
        book_class(&store, course.id, b.classes[0].id, "ada").await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_course_and_class_edits_both_land() {
        let store = YieldingStore::default();
        let course = create_course(&store, draft()).await.unwrap();
        let class_id = course.classes[1].id;
        let mut edit = draft();
        edit.title = "Hip Hop Foundations".to_string();

        let (class, updated) = tokio::join!(
            update_class(
                &store,
                course.id,
                class_id,
                ClassUpdate {
                    time: None,
                    location: Some("Studio C".to_string()),
                },
            ),
            update_course(&store, course.id, edit)
        );
        class.unwrap();
        updated.unwrap().unwrap();

        let stored = store.find_course(course.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Hip Hop Foundations");
        assert_eq!(stored.classes[1].location, "Studio C");
        assert_eq!(stored.classes.len(), course.classes.len());
    }

    #[tokio::test]
    async fn test_incomplete_course_has_no_classes() {
        let store = MemoryStore::new();
        let mut course = Course::from_draft(draft());
        course.weekdays.clear();
        store.insert_course(&course).await.unwrap();

        let loaded = course_with_classes(&store, course.id).await.unwrap().unwrap();
        assert!(loaded.classes.is_empty());
        assert!(course_with_classes(&store, Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cosmetic_edit_keeps_classes_and_bookings() {
        let store = MemoryStore::new();
        let course = create_course(&store, draft()).await.unwrap();
        let class_id = course.classes[0].id;
        book_class(&store, course.id, class_id, "ada").await.unwrap();

        let mut edit = draft();
        edit.title = "Hip Hop Foundations".to_string();
        let updated = update_course(&store, course.id, edit).await.unwrap().unwrap();

        assert_eq!(updated.title, "Hip Hop Foundations");
        assert_eq!(updated.classes, course.classes);
        assert_eq!(store.bookings_by_class(class_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_schedule_edit_regenerates_and_drops_bookings() {
        let store = MemoryStore::new();
        let course = create_course(&store, draft()).await.unwrap();
        let class_id = course.classes[0].id;
        book_class(&store, course.id, class_id, "ada").await.unwrap();

        let mut edit = draft();
        edit.class_count = 4;
        let updated = update_course(&store, course.id, edit).await.unwrap().unwrap();

        assert_eq!(updated.classes.len(), 4);
        assert!(updated.classes.iter().all(|class| class.id != class_id));
        assert!(store.bookings_by_user("ada").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_class() {
        let store = MemoryStore::new();
        let course = create_course(&store, draft()).await.unwrap();
        let class_id = course.classes[2].id;

        let class = update_class(
            &store,
            course.id,
            class_id,
            ClassUpdate {
                time: None,
                location: Some("Studio C".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(class.location, "Studio C");
        assert_eq!(class.time, "5:00pm to 6:30pm");

        let stored = store.find_course(course.id).await.unwrap().unwrap();
        assert_eq!(stored.classes[2].location, "Studio C");
        assert_eq!(stored.classes.len(), course.classes.len());

        let err = update_class(&store, course.id, Uuid::new_v4(), ClassUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_enrol_is_idempotent() {
        let store = MemoryStore::new();
        let course = create_course(&store, draft()).await.unwrap();

        let (first, created) = enrol(&store, course.id, "ada").await.unwrap();
        assert!(created);
        let (second, created) = enrol(&store, course.id, "ada").await.unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);
        assert_eq!(store.enrolments_by_course(course.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_book_class_twice_conflicts() {
        let store = MemoryStore::new();
        let course = create_course(&store, draft()).await.unwrap();
        let class_id = course.classes[0].id;

        book_class(&store, course.id, class_id, "ada").await.unwrap();
        let err = book_class(&store, course.id, class_id, "ada").await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));

        let err = book_class(&store, course.id, Uuid::new_v4(), "ada")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
