use crate::error::ApiError;
use crate::models::{CourseDraft, CourseInput, NewOrganiser, RegisterRequest};
use crate::pricing::MAX_COURSE_PRICE;

fn required(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn validate_course(input: CourseInput) -> Result<CourseDraft, ApiError> {
    let missing = || ApiError::BadRequest("All fields are required.".into());

    let title = required(&input.title).ok_or_else(missing)?;
    let description = required(&input.description).ok_or_else(missing)?;
    let category = required(&input.category).ok_or_else(missing)?;
    let start_time = required(&input.start_time).ok_or_else(missing)?;
    let end_time = required(&input.end_time).ok_or_else(missing)?;
    let location = required(&input.location).ok_or_else(missing)?;
    let price = input.price.ok_or_else(missing)?;
    let start_date = input.start_date.ok_or_else(missing)?;
    let end_date = input.end_date.ok_or_else(missing)?;
    let class_count = input.number_of_classes.ok_or_else(missing)?;
    if input.days.is_empty() {
        return Err(missing());
    }

    if price.is_sign_negative() {
        return Err(ApiError::BadRequest("price must not be negative".into()));
    }
    if price > MAX_COURSE_PRICE {
        return Err(ApiError::BadRequest(format!(
            "price must not exceed {MAX_COURSE_PRICE}"
        )));
    }
    if class_count == 0 {
        return Err(ApiError::BadRequest(
            "number_of_classes must be at least 1".into(),
        ));
    }
    if end_date < start_date {
        return Err(ApiError::BadRequest(
            "end_date must not be before start_date".into(),
        ));
    }

    let mut weekdays = input.days;
    weekdays.sort();
    weekdays.dedup();

    Ok(CourseDraft {
        title,
        description,
        category,
        price,
        weekdays,
        time: format!("{start_time} to {end_time}"),
        location,
        class_count,
        start_date,
        end_date,
    })
}

pub fn validate_registration(request: &RegisterRequest) -> Result<(), ApiError> {
    let fields = [
        &request.username,
        &request.email,
        &request.first_name,
        &request.last_name,
        &request.password,
    ];
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err(ApiError::BadRequest("All fields are required.".into()));
    }
    if request.password != request.confirm_password {
        return Err(ApiError::BadRequest("Passwords do not match".into()));
    }
    Ok(())
}

pub fn validate_organiser(input: &NewOrganiser) -> Result<(), ApiError> {
    if input.name.trim().is_empty() || input.role.trim().is_empty() {
        return Err(ApiError::BadRequest("name and role are required".into()));
    }
    Ok(())
}
