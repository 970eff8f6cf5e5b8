use chrono::{NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use icalendar::{Calendar, CalendarDateTime, Component, Event, EventLike};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::models::Course;

static CLOCK_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d{1,2})(?::(\d{2}))?\s*([ap]m)?$").expect("regex compiles")
});

fn parse_clock_time(text: &str) -> Option<NaiveTime> {
    let caps = CLOCK_TIME.captures(text.trim())?;
    let mut hour = caps[1].parse::<u32>().ok()?;
    let minute = caps.get(2).map_or(Some(0), |m| m.as_str().parse::<u32>().ok())?;
    if let Some(meridiem) = caps.get(3) {
        if !(1..=12).contains(&hour) {
            return None;
        }
        let pm = meridiem.as_str().eq_ignore_ascii_case("pm");
        hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
    }
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Parse a display time such as "6:00pm to 7:30pm" or "18:00 - 19:30".
pub fn parse_time_range(time_range: &str) -> Option<(NaiveTime, NaiveTime)> {
    let (start, end) = time_range
        .split_once(" to ")
        .or_else(|| time_range.split_once('-'))?;
    let (start, end) = (parse_clock_time(start)?, parse_clock_time(end)?);
    (end > start).then_some((start, end))
}

#[derive(Clone)]
pub struct ICalExporter {
    tz: Tz,
    public_url: Url,
}

impl ICalExporter {
    pub fn new(tz: Tz, public_url: Url) -> Self {
        Self { tz, public_url }
    }

    /// Render the course's classes. Classes with an unparseable time
    /// become all-day events.
    pub fn generate(&self, course: &Course) -> Vec<u8> {
        if course.classes.is_empty() {
            return Vec::new();
        }

        let mut calendar = Calendar::new();
        calendar.name(&format!("{} classes", course.title));
        calendar.timezone(self.tz.name());

        let booking_url = self
            .public_url
            .join(&format!("courses/{}", course.id))
            .map(|url| url.to_string())
            .unwrap_or_else(|_| self.public_url.to_string());

        for class in &course.classes {
            let mut event = Event::new();
            event.summary(&course.title);

            match parse_time_range(&class.time) {
                Some((start, end)) => {
                    event.starts(self.local(NaiveDateTime::new(class.date, start)));
                    event.ends(self.local(NaiveDateTime::new(class.date, end)));
                }
                None => {
                    event.all_day(class.date);
                }
            }

            event.location(&class.location);
            event.description(&format!(
                "{} class on {}\nTime: {}\nPrice per class: {}\nBook: {}",
                course.title, class.weekday, class.time, class.price_per_class, booking_url
            ));
            event.uid(&format!("{}-dance-school", class.id));
            calendar.push(event);
        }

        calendar.to_string().into_bytes()
    }

    fn local(&self, date_time: NaiveDateTime) -> CalendarDateTime {
        CalendarDateTime::WithTimezone {
            date_time,
            tzid: self.tz.name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use super::*;
    use crate::schedule::{Weekday, generate};

    fn exporter() -> ICalExporter {
        ICalExporter::new(
            chrono_tz::Europe::London,
            Url::parse("https://dance.example.com/").unwrap(),
        )
    }

    fn course(time: &str) -> Course {
        let mut course = Course {
            id: Uuid::new_v4(),
            title: "Salsa".to_string(),
            description: String::new(),
            category: "Latin".to_string(),
            image: "/images/latin.jpg".to_string(),
            price: dec!(180),
            weekdays: vec![Weekday::Monday, Weekday::Wednesday],
            time: time.to_string(),
            location: "Studio A".to_string(),
            class_count: Some(2),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 25),
            end_date: NaiveDate::from_ymd_opt(2025, 5, 6),
            classes: Vec::new(),
        };
        course.classes = generate(&course);
        course
    }

    #[test]
    fn test_parse_time_range() {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        assert_eq!(parse_time_range("6:00pm to 7:30pm"), Some((t(18, 0), t(19, 30))));
        assert_eq!(parse_time_range("18:00 - 19:30"), Some((t(18, 0), t(19, 30))));
        assert_eq!(parse_time_range("11am to 12:15PM"), Some((t(11, 0), t(12, 15))));
        assert_eq!(parse_time_range("12:00am to 1:00am"), Some((t(0, 0), t(1, 0))));
        assert_eq!(parse_time_range("7:00pm to 6:00pm"), None);
        assert_eq!(parse_time_range("13:00pm to 14:00pm"), None);
        assert_eq!(parse_time_range("evenings"), None);
    }

    #[test]
    fn test_generate_timed_events() {
        let course = course("6:00pm to 7:30pm");
        let body = String::from_utf8(exporter().generate(&course)).unwrap();

        assert_eq!(body.matches("BEGIN:VEVENT").count(), 2);
        assert!(body.contains("SUMMARY:Salsa"));
        assert!(body.contains("TZID=Europe/London"));
        assert!(body.contains("20250326T180000"));
        assert!(body.contains("20250326T193000"));
        assert!(body.contains(&format!("UID:{}-dance-school", course.classes[0].id)));
    }

    #[test]
    fn test_generate_all_day_events() {
        let course = course("evenings");
        let body = String::from_utf8(exporter().generate(&course)).unwrap();

        assert!(body.contains("VALUE=DATE"));
        assert!(body.contains("20250326"));
        assert!(!body.contains("TZID=Europe/London"));
    }

    #[test]
    fn test_generate_empty() {
        let mut course = course("6:00pm to 7:30pm");
        course.classes.clear();
        assert!(exporter().generate(&course).is_empty());
    }
}
