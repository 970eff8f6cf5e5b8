use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::schedule::{ClassOccurrence, Weekday};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub image: String,
    /// Price of the whole course.
    #[schema(value_type = String, example = "180")]
    pub price: Decimal,
    pub weekdays: Vec<Weekday>,
    #[schema(example = "6:00pm to 7:30pm")]
    pub time: String,
    pub location: String,
    pub class_count: Option<u32>,
    #[schema(value_type = Option<String>, format = "date", example = "2025-03-25")]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date", example = "2025-05-06")]
    pub end_date: Option<NaiveDate>,
    /// Generated classes. Empty until the schedule is first generated.
    #[serde(default)]
    pub classes: Vec<ClassOccurrence>,
}

impl Course {
    pub fn from_draft(draft: CourseDraft) -> Self {
        let mut course = Self {
            id: Uuid::new_v4(),
            title: String::new(),
            description: String::new(),
            category: String::new(),
            image: String::new(),
            price: Decimal::ZERO,
            weekdays: Vec::new(),
            time: String::new(),
            location: String::new(),
            class_count: None,
            start_date: None,
            end_date: None,
            classes: Vec::new(),
        };
        course.apply(draft);
        course
    }

    /// Overwrite every editable field with the draft, keeping id and classes.
    pub fn apply(&mut self, draft: CourseDraft) {
        self.image = image_for_category(&draft.category);
        self.title = draft.title;
        self.description = draft.description;
        self.category = draft.category;
        self.price = draft.price;
        self.weekdays = draft.weekdays;
        self.time = draft.time;
        self.location = draft.location;
        self.class_count = Some(draft.class_count);
        self.start_date = Some(draft.start_date);
        self.end_date = Some(draft.end_date);
    }

    /// Whether anything copied into or driving the generated classes differs.
    pub fn schedule_differs(&self, other: &Course) -> bool {
        self.price != other.price
            || self.weekdays != other.weekdays
            || self.time != other.time
            || self.location != other.location
            || self.class_count != other.class_count
            || self.start_date != other.start_date
            || self.end_date != other.end_date
    }

    /// Split `time` into its start and end parts ("6:00pm to 7:30pm").
    pub fn time_parts(&self) -> (String, String) {
        match self.time.split_once(" to ") {
            Some((start, end)) => (start.trim().to_string(), end.trim().to_string()),
            None => (String::new(), String::new()),
        }
    }
}

pub fn image_for_category(category: &str) -> String {
    format!("/images/{}.jpg", category.to_lowercase())
}

/// Course form as submitted by an organiser. Every field is required.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CourseInput {
    pub title: String,
    pub description: String,
    pub category: String,
    #[schema(value_type = Option<String>, example = "180")]
    pub price: Option<Decimal>,
    pub days: Vec<Weekday>,
    #[schema(example = "6:00pm")]
    pub start_time: String,
    #[schema(example = "7:30pm")]
    pub end_time: String,
    pub location: String,
    #[schema(value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
    pub number_of_classes: Option<u32>,
}

/// A validated [`CourseInput`].
#[derive(Debug, Clone, PartialEq)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: Decimal,
    pub weekdays: Vec<Weekday>,
    pub time: String,
    pub location: String,
    pub class_count: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseView {
    #[serde(flatten)]
    pub course: Course,
    /// Present only for signed-in users.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrolled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseEditView {
    pub course: Course,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ClassUpdate {
    pub time: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Enrolment {
    pub id: Uuid,
    pub course_id: Uuid,
    pub username: String,
    pub enrolled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EnrolmentDetails {
    #[serde(flatten)]
    pub enrolment: Enrolment,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Booking {
    pub id: Uuid,
    pub class_id: Uuid,
    pub course_id: Uuid,
    pub username: String,
    pub booked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Organiser {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub courses: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct NewOrganiser {
    pub name: String,
    pub role: String,
    pub courses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    /// Username or email.
    #[serde(alias = "username")]
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
    pub username: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Dashboard {
    pub username: String,
    pub is_admin: bool,
    pub courses: Vec<CourseView>,
    pub bookings: Vec<Booking>,
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn draft() -> CourseDraft {
        CourseDraft {
            title: "Ballet".to_string(),
            description: "Classical dance for balance and grace.".to_string(),
            category: "Classical".to_string(),
            price: dec!(220),
            weekdays: vec![Weekday::Monday, Weekday::Friday],
            time: "7:00pm to 8:30pm".to_string(),
            location: "Studio A".to_string(),
            class_count: 10,
            start_date: NaiveDate::from_ymd_opt(2025, 4, 14).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 6).unwrap(),
        }
    }

    #[test]
    fn test_from_draft_derives_image() {
        let course = Course::from_draft(draft());
        assert_eq!(course.image, "/images/classical.jpg");
        assert_eq!(course.class_count, Some(10));
        assert!(course.classes.is_empty());
    }

    #[test]
    fn test_schedule_differs() {
        let course = Course::from_draft(draft());

        let mut renamed = course.clone();
        renamed.title = "Ballet Basics".to_string();
        assert!(!course.schedule_differs(&renamed));

        let mut moved = course.clone();
        moved.location = "Studio C".to_string();
        assert!(course.schedule_differs(&moved));

        let mut repriced = course.clone();
        repriced.price = dec!(200);
        assert!(course.schedule_differs(&repriced));
    }

    #[test]
    fn test_time_parts() {
        let course = Course::from_draft(draft());
        assert_eq!(
            course.time_parts(),
            ("7:00pm".to_string(), "8:30pm".to_string())
        );

        let mut untimed = course;
        untimed.time = "evenings".to_string();
        assert_eq!(untimed.time_parts(), (String::new(), String::new()));
    }
}
