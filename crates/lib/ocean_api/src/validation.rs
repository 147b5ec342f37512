//! Custom validators and `validator` error conversion.
//!
//! Payload structs derive [`validator::Validate`] with field-level rules;
//! the functions here cover enum membership, dates and password strength.
//! [`field_errors`] flattens every violation into the envelope's error list.

use std::borrow::Cow;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use ocean_core::auth::password::meets_policy;
use ocean_core::models::identity::Role;
use ocean_core::models::resource::{GradeLevel, ResourceType};
use validator::{ValidationError, ValidationErrors};

use crate::envelope::FieldError;

/// Params key that lets a schema-level error name its field.
const FIELD_PARAM: &str = "field";

/// Struct fields whose wire name is not their camelCase form.
const WIRE_NAMES: &[(&str, &str)] = &[("resourceType", "type")];

fn invalid(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Error attributed to `field` from a schema-level check.
pub fn field_error(field: &'static str, code: &'static str, message: &'static str) -> ValidationError {
    let mut err = invalid(code, message);
    err.add_param(Cow::Borrowed(FIELD_PARAM), &field);
    err
}

pub fn password_strength(password: &str) -> Result<(), ValidationError> {
    if meets_policy(password) {
        Ok(())
    } else {
        Err(invalid(
            "password_strength",
            "Password must contain at least one uppercase letter, one number, and one special character (!@#$%^&*)",
        ))
    }
}

fn one_of<T: FromStr>(value: &str, code: &'static str, allowed: &[&str]) -> Result<(), ValidationError> {
    value
        .parse::<T>()
        .map(|_| ())
        .map_err(|_| invalid(code, format!("Must be one of: {}", allowed.join(", "))))
}

pub fn resource_type(value: &str) -> Result<(), ValidationError> {
    let allowed: Vec<&str> = ResourceType::ALL.iter().map(|t| t.as_str()).collect();
    one_of::<ResourceType>(value, "resource_type", &allowed)
}

pub fn grade_level(value: &str) -> Result<(), ValidationError> {
    let allowed: Vec<&str> = GradeLevel::ALL.iter().map(|g| g.as_str()).collect();
    one_of::<GradeLevel>(value, "grade_level", &allowed)
}

pub fn role(value: &str) -> Result<(), ValidationError> {
    let allowed: Vec<&str> = Role::ALL.iter().map(|r| r.as_str()).collect();
    one_of::<Role>(value, "role", &allowed)
}

/// 1 to 100 characters once surrounding whitespace is trimmed.
pub fn display_name(name: &str) -> Result<(), ValidationError> {
    if (1..=100).contains(&name.trim().chars().count()) {
        Ok(())
    } else {
        Err(invalid("name", "Name must be between 1 and 100 characters"))
    }
}

/// Each tag is 2 to 50 characters.
pub fn tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.iter().all(|t| (2..=50).contains(&t.chars().count())) {
        Ok(())
    } else {
        Err(invalid("tags", "Each tag must be between 2 and 50 characters"))
    }
}

/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|d| d.and_utc())
        })
}

pub fn iso_date(value: &str) -> Result<(), ValidationError> {
    parse_date(value)
        .map(|_| ())
        .ok_or_else(|| invalid("iso_date", "Must be a valid ISO 8601 date"))
}

/// Struct field name to its wire name.
fn wire_name(field: &str) -> String {
    let camel = camel_case(field);
    WIRE_NAMES
        .iter()
        .find(|(from, _)| *from == camel)
        .map(|(_, to)| to.to_string())
        .unwrap_or(camel)
}

/// `snake_case` to `camelCase`.
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Flatten validation errors into envelope field errors, sorted by field.
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out = Vec::new();
    for (field, errs) in errors.field_errors() {
        let field = field.to_string();
        for err in errs.iter() {
            let name = err
                .params
                .get(FIELD_PARAM)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| wire_name(&field));
            let message = err
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("{name} is invalid"));
            out.push(FieldError::new(name, message));
        }
    }
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}
