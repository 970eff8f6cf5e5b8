//! Default data for an empty store.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::auth::hash_password;
use crate::models::{Course, Organiser, User, image_for_category};
use crate::schedule::Weekday::{self, *};
use crate::settings::Settings;
use crate::store::{Store, StoreError};

pub const ADMIN_EMAIL: &str = "admin@danceacademy.com";

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("failed to hash admin password: {0}")]
    Password(#[from] argon2::password_hash::Error),
}

struct DefaultCourse {
    title: &'static str,
    description: &'static str,
    price: i64,
    weekdays: &'static [Weekday],
    time: &'static str,
    category: &'static str,
    location: &'static str,
    class_count: u32,
    start: (i32, u32, u32),
    end: (i32, u32, u32),
}

const DEFAULT_COURSES: [DefaultCourse; 5] = [
    DefaultCourse {
        title: "Salsa",
        description: "Learn Latin rhythm and movement.",
        price: 180,
        weekdays: &[Monday, Wednesday],
        time: "6:00pm to 7:30pm",
        category: "Latin",
        location: "Studio A, 10 example st., EH1 111, Edinburgh",
        class_count: 7,
        start: (2025, 3, 25),
        end: (2025, 5, 6),
    },
    DefaultCourse {
        title: "Hip Hop",
        description: "Urban style dance techniques.",
        price: 150,
        weekdays: &[Tuesday, Thursday],
        time: "5:00pm to 6:30pm",
        category: "Urban",
        location: "Studio B, 5 example avenue, G1 111, Glasgow",
        class_count: 8,
        start: (2025, 4, 15),
        end: (2025, 6, 5),
    },
    DefaultCourse {
        title: "Ballet",
        description: "Classical dance for balance and grace.",
        price: 220,
        weekdays: &[Monday, Friday],
        time: "7:00pm to 8:30pm",
        category: "Classical",
        location: "Studio A, 10 example st., EH1 111, Edinburgh",
        class_count: 10,
        start: (2025, 4, 14),
        end: (2025, 6, 6),
    },
    DefaultCourse {
        title: "Jazz Funk",
        description: "A mix of jazz, hip hop, and street styles.",
        price: 130,
        weekdays: &[Wednesday, Friday],
        time: "8:00pm to 9:30pm",
        category: "Jazz",
        location: "Studio C, 15 example st., PA1 111, Pasley",
        class_count: 8,
        start: (2025, 4, 16),
        end: (2025, 5, 30),
    },
    DefaultCourse {
        title: "Contemporary",
        description: "Expressive movement and floor work.",
        price: 180,
        weekdays: &[Monday, Wednesday],
        time: "5:30pm to 7:00pm",
        category: "Modern",
        location: "Studio B, 5 example avenue, G1 111, Glasgow",
        class_count: 5,
        start: (2025, 4, 13),
        end: (2025, 5, 21),
    },
];

const DEFAULT_ORGANISERS: [(&str, &str); 3] = [
    ("John Doe", "Course Organiser"),
    ("Jane Smith", "Class Organiser"),
    ("Giuseppe Perugia", "Class Organiser"),
];

fn ymd((y, m, d): (i32, u32, u32)) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

pub fn default_courses() -> Vec<Course> {
    DEFAULT_COURSES
        .iter()
        .map(|c| Course {
            id: Uuid::new_v4(),
            title: c.title.to_string(),
            description: c.description.to_string(),
            category: c.category.to_string(),
            image: image_for_category(c.category),
            price: Decimal::from(c.price),
            weekdays: c.weekdays.to_vec(),
            time: c.time.to_string(),
            location: c.location.to_string(),
            class_count: Some(c.class_count),
            start_date: ymd(c.start),
            end_date: ymd(c.end),
            classes: Vec::new(),
        })
        .collect()
}

/// Fill each empty collection with its defaults.
pub async fn seed_defaults(store: &dyn Store, settings: &Settings) -> Result<(), SeedError> {
    if store.list_courses().await?.is_empty() {
        let courses = default_courses();
        for course in &courses {
            store.insert_course(course).await?;
        }
        info!(count = courses.len(), "default courses added");
    }

    if store.count_users().await? == 0 {
        let admin = User {
            username: settings.admin_username.clone(),
            email: ADMIN_EMAIL.to_string(),
            first_name: "Admin".to_string(),
            last_name: String::new(),
            password_hash: hash_password(&settings.admin_password)?,
        };
        store.insert_user(&admin).await?;
        info!(username = %admin.username, "default admin user created");
    }

    if store.list_organisers().await?.is_empty() {
        for (name, role) in DEFAULT_ORGANISERS {
            store
                .insert_organiser(&Organiser {
                    id: Uuid::new_v4(),
                    name: name.to_string(),
                    role: role.to_string(),
                    courses: Vec::new(),
                })
                .await?;
        }
        info!(count = DEFAULT_ORGANISERS.len(), "default organisers added");
    }

    Ok(())
}
