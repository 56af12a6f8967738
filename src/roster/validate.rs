//! Field validation for student payloads.
//!
//! Create requires `name`, `age` and `email`; `id` is optional. Update accepts any subset and
//! treats an empty string or an age of `0` as "not provided", so those values never overwrite
//! stored data. Every failing field is reported, not only the first.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use super::types::{
    FieldError, MAX_STUDENT_ID, NewStudent, RosterError, StudentId, StudentPatch, StudentPayload,
};

/// Maximum length of `name`, in characters.
pub const MAX_NAME_CHARS: usize = 100;
/// Maximum length of `email`, in characters.
pub const MAX_EMAIL_CHARS: usize = 100;
/// Inclusive age bounds.
pub const AGE_RANGE: std::ops::RangeInclusive<i64> = 1..=200;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(
            r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}$",
        )
        .expect("email pattern compiles")
    })
}

/// Validate a create payload.
pub fn validate_new(payload: &StudentPayload) -> Result<NewStudent, RosterError> {
    let mut errors = Vec::new();

    let id = collect(&mut errors, id_field(payload.id.as_ref()));
    let name = collect(&mut errors, required("name", payload.name.as_ref()).and_then(name_field));
    let age = collect(&mut errors, required("age", payload.age.as_ref()).and_then(age_field));
    let email = collect(
        &mut errors,
        required("email", payload.email.as_ref()).and_then(email_field),
    );

    match (id, name, age, email) {
        (Some(id), Some(name), Some(age), Some(email)) if errors.is_empty() => Ok(NewStudent {
            id,
            name,
            age,
            email,
        }),
        _ => Err(RosterError::InvalidInput(errors)),
    }
}

/// Validate an update payload.
pub fn validate_patch(payload: &StudentPayload) -> Result<StudentPatch, RosterError> {
    let mut errors = Vec::new();

    let id = collect(&mut errors, id_field(payload.id.as_ref()));
    let name = collect(
        &mut errors,
        match present(payload.name.as_ref()) {
            Some(value) if !is_blank_string(value) => name_field(value).map(Some),
            _ => Ok(None),
        },
    );
    let age = collect(
        &mut errors,
        match present(payload.age.as_ref()) {
            Some(value) if !is_zero(value) => age_field(value).map(Some),
            _ => Ok(None),
        },
    );
    let email = collect(
        &mut errors,
        match present(payload.email.as_ref()) {
            Some(value) if !is_blank_string(value) => email_field(value).map(Some),
            _ => Ok(None),
        },
    );

    match (id, name, age, email) {
        (Some(id), Some(name), Some(age), Some(email)) if errors.is_empty() => Ok(StudentPatch {
            id,
            name,
            age,
            email,
        }),
        _ => Err(RosterError::InvalidInput(errors)),
    }
}

fn collect<T>(errors: &mut Vec<FieldError>, result: Result<T, FieldError>) -> Option<T> {
    result.map_err(|error| errors.push(error)).ok()
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|value| !value.is_null())
}

fn required<'a>(field: &str, value: Option<&'a Value>) -> Result<&'a Value, FieldError> {
    present(value).ok_or_else(|| FieldError::new(field, "field required"))
}

fn is_blank_string(value: &Value) -> bool {
    value.as_str().is_some_and(str::is_empty)
}

fn is_zero(value: &Value) -> bool {
    value.as_f64() == Some(0.0)
}

fn integer(field: &str, value: &Value) -> Result<i64, FieldError> {
    if let Some(number) = value.as_i64() {
        return Ok(number);
    }
    match value.as_f64() {
        Some(number) if number.fract() == 0.0 && number.abs() < i64::MAX as f64 => {
            Ok(number as i64)
        }
        _ => Err(FieldError::new(field, "must be a valid integer")),
    }
}

fn string<'a>(field: &str, value: &'a Value) -> Result<&'a str, FieldError> {
    value
        .as_str()
        .ok_or_else(|| FieldError::new(field, "must be a valid string"))
}

fn id_field(value: Option<&Value>) -> Result<Option<StudentId>, FieldError> {
    let Some(value) = present(value) else {
        return Ok(None);
    };
    let id = integer("id", value)?;
    if (1..=MAX_STUDENT_ID).contains(&id) {
        Ok(Some(id))
    } else {
        Err(FieldError::new(
            "id",
            format!("must be between 1 and {MAX_STUDENT_ID}"),
        ))
    }
}

fn name_field(value: &Value) -> Result<String, FieldError> {
    let name = string("name", value)?;
    let length = name.chars().count();
    if length == 0 {
        return Err(FieldError::new("name", "must contain at least 1 character"));
    }
    if length > MAX_NAME_CHARS {
        return Err(FieldError::new(
            "name",
            format!("must contain at most {MAX_NAME_CHARS} characters"),
        ));
    }
    Ok(name.to_string())
}

fn age_field(value: &Value) -> Result<u8, FieldError> {
    let age = integer("age", value)?;
    if !AGE_RANGE.contains(&age) {
        return Err(FieldError::new(
            "age",
            format!(
                "must be between {} and {}",
                AGE_RANGE.start(),
                AGE_RANGE.end()
            ),
        ));
    }
    u8::try_from(age).map_err(|_| FieldError::new("age", "out of range"))
}

fn email_field(value: &Value) -> Result<String, FieldError> {
    let email = string("email", value)?;
    if email.chars().count() > MAX_EMAIL_CHARS {
        return Err(FieldError::new(
            "email",
            format!("must contain at most {MAX_EMAIL_CHARS} characters"),
        ));
    }
    if !email_regex().is_match(email) {
        return Err(FieldError::new(
            "email",
            "value is not a valid email address",
        ));
    }
    Ok(email.to_string())
}
