//! Class occurrence generation.
//!
//! A course describes its schedule as a date range, a set of weekdays and a
//! target number of classes. [`generate`] expands that description into dated
//! [`ClassOccurrence`] records, each priced with [`price_per_class`].

use std::fmt;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Course;
use crate::pricing::price_per_class;

/// Day of the week, always named in English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    #[cfg(test)]
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        date.weekday().into()
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(value: chrono::Weekday) -> Self {
        match value {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One dated class of a course.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ClassOccurrence {
    pub id: Uuid,
    pub course_id: Uuid,
    pub weekday: Weekday,
    #[schema(value_type = String, format = "date", example = "2025-03-26")]
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
    #[schema(value_type = String, example = "28.29")]
    pub price_per_class: Decimal,
}

/// Expand a course's recurrence description into its classes.
///
/// Dates are walked from `start_date` to `end_date` inclusive and every date
/// falling on one of the course's weekdays becomes a class, until
/// `class_count` classes exist. Courses missing a start date, end date,
/// weekdays or a positive class count produce no classes, as do prices too
/// large to split.
pub fn generate(course: &Course) -> Vec<ClassOccurrence> {
    let (Some(start), Some(end), Some(class_count)) =
        (course.start_date, course.end_date, course.class_count)
    else {
        return Vec::new();
    };
    if course.weekdays.is_empty() || class_count == 0 {
        return Vec::new();
    }

    let Some(price) = price_per_class(course.price, class_count) else {
        warn!(course_id = %course.id, price = %course.price, "class price out of range");
        return Vec::new();
    };

    start
        .iter_days()
        .take_while(|date| *date <= end)
        .filter_map(|date| {
            let weekday = Weekday::of(date);
            course.weekdays.contains(&weekday).then_some((date, weekday))
        })
        .take(class_count as usize)
        .map(|(date, weekday)| ClassOccurrence {
            id: Uuid::new_v4(),
            course_id: course.id,
            weekday,
            date,
            time: course.time.clone(),
            location: course.location.clone(),
            price_per_class: price,
        })
        .collect()
}
